//! Save workflows for a folder of images being worked through.
//!
//! ```text
//! shoot/
//! ├── _Completed/
//! │   ├── img1_1.png     # quick_save: edited result
//! │   └── img2_1.jpg     # skip: untouched copy, source extension kept
//! ├── _Original/
//! │   ├── img1.jpg       # sources moved out of the way
//! │   └── img2.jpg
//! └── img3.jpg           # still to do
//! ```
//!
//! Outputs are numbered (`{stem}_{n}.{ext}`) so nothing is overwritten. A
//! source whose name is already taken in `_Original` stays where it is.

use crate::config::SaveConfig;
use crate::imaging::{BackendError, ImageBackend, ImageBuffer, Quality, SaveParams};
use crate::metadata::{MetadataStatus, MosaicMetadata};
use crate::naming::{next_available_path, stem_and_extension};
use crate::session::Session;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Backend(#[from] BackendError),
    #[error("Source has no usable file name: {0}")]
    BadFileName(PathBuf),
}

/// Result of a completed folder workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    /// File written into the completed folder.
    pub output: PathBuf,
    pub metadata: MetadataStatus,
    /// Where the source went, or `None` when it was left in place.
    pub archived: Option<PathBuf>,
}

/// Metadata to embed for `session`, or `None` when embedding is off.
pub fn session_metadata(session: &Session, config: &SaveConfig) -> Option<MosaicMetadata> {
    config.embed_metadata.then(|| {
        session.metadata(
            Some(config.software.clone()).filter(|s| !s.is_empty()),
            Some(config.processing_note.clone()).filter(|s| !s.is_empty()),
        )
    })
}

fn source_parts(source: &Path) -> Result<(PathBuf, String, String), WorkflowError> {
    let (stem, ext) =
        stem_and_extension(source).ok_or_else(|| WorkflowError::BadFileName(source.to_path_buf()))?;
    let dir = match source.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, stem, ext))
}

/// Default "save as" target: `{stem}_{n}.png` beside the source.
pub fn default_save_as_path(source: &Path) -> Result<PathBuf, WorkflowError> {
    let (dir, stem, _) = source_parts(source)?;
    Ok(next_available_path(&dir, &stem, "png"))
}

/// Write `image` to `output`; the extension picks the format.
pub fn save_as(
    backend: &impl ImageBackend,
    image: &ImageBuffer,
    output: &Path,
    quality: Quality,
    metadata: Option<MosaicMetadata>,
) -> Result<MetadataStatus, WorkflowError> {
    let status = backend.save(&SaveParams {
        image,
        output: output.to_path_buf(),
        quality,
        metadata,
    })?;
    Ok(status)
}

/// Move `source` into `archive_dir` unless that name is already taken there.
fn archive_source(source: &Path, archive_dir: &Path) -> Result<Option<PathBuf>, WorkflowError> {
    let name = source
        .file_name()
        .ok_or_else(|| WorkflowError::BadFileName(source.to_path_buf()))?;
    let target = archive_dir.join(name);
    if target.exists() {
        log::warn!(
            "{} already exists, leaving {} in place",
            target.display(),
            source.display()
        );
        return Ok(None);
    }
    fs::rename(source, &target)?;
    log::info!("moved {} -> {}", source.display(), target.display());
    Ok(Some(target))
}

fn workflow_dirs(dir: &Path, config: &SaveConfig) -> Result<(PathBuf, PathBuf), WorkflowError> {
    let completed = dir.join(&config.completed_dir);
    let original = dir.join(&config.original_dir);
    fs::create_dir_all(&completed)?;
    fs::create_dir_all(&original)?;
    Ok((completed, original))
}

/// Save the edited image into the completed folder and archive the source.
pub fn quick_save(
    backend: &impl ImageBackend,
    source: &Path,
    image: &ImageBuffer,
    metadata: Option<MosaicMetadata>,
    config: &SaveConfig,
) -> Result<Completed, WorkflowError> {
    let (dir, stem, _) = source_parts(source)?;
    let (completed, original) = workflow_dirs(&dir, config)?;

    let output = next_available_path(&completed, &stem, config.format.extension());
    let status = save_as(backend, image, &output, config.quality(), metadata)?;
    let archived = archive_source(source, &original)?;

    Ok(Completed {
        output,
        metadata: status,
        archived,
    })
}

/// Pass an image through unedited: copy it into the completed folder under a
/// numbered name and archive the source.
pub fn skip(source: &Path, config: &SaveConfig) -> Result<Completed, WorkflowError> {
    let (dir, stem, ext) = source_parts(source)?;
    let (completed, original) = workflow_dirs(&dir, config)?;

    let output = next_available_path(&completed, &stem, &ext);
    fs::copy(source, &output)?;
    log::info!("copied {} -> {}", source.display(), output.display());
    let archived = archive_source(source, &original)?;

    Ok(Completed {
        output,
        metadata: MetadataStatus::Skipped,
        archived,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::session::SessionSettings;
    use crate::test_helpers::{gradient_rgb, touch_all};
    use tempfile::TempDir;

    fn config() -> SaveConfig {
        SaveConfig::default()
    }

    #[test]
    fn default_save_as_is_numbered_png_beside_source() {
        let tmp = TempDir::new().unwrap();
        touch_all(tmp.path(), &["shot.jpg", "shot_1.png"]);
        assert_eq!(
            default_save_as_path(&tmp.path().join("shot.jpg")).unwrap(),
            tmp.path().join("shot_2.png")
        );
    }

    #[test]
    fn quick_save_writes_completed_and_moves_source() {
        let tmp = TempDir::new().unwrap();
        touch_all(tmp.path(), &["shot.jpg"]);
        let source = tmp.path().join("shot.jpg");
        let backend = MockBackend::new();

        let done = quick_save(
            &backend,
            &source,
            &gradient_rgb(4, 4),
            Some(MosaicMetadata::default()),
            &config(),
        )
        .unwrap();

        assert_eq!(done.output, tmp.path().join("_Completed/shot_1.png"));
        assert_eq!(done.metadata, MetadataStatus::Embedded);
        assert_eq!(done.archived, Some(tmp.path().join("_Original/shot.jpg")));
        assert!(!source.exists());
        assert!(tmp.path().join("_Original/shot.jpg").exists());

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Save { width: 4, height: 4, quality: 95, .. }
        ));
    }

    #[test]
    fn quick_save_keeps_source_when_archive_name_taken() {
        let tmp = TempDir::new().unwrap();
        touch_all(tmp.path(), &["shot.jpg"]);
        fs::create_dir(tmp.path().join("_Original")).unwrap();
        touch_all(&tmp.path().join("_Original"), &["shot.jpg"]);

        let done = quick_save(
            &MockBackend::new(),
            &tmp.path().join("shot.jpg"),
            &gradient_rgb(2, 2),
            None,
            &config(),
        )
        .unwrap();

        assert_eq!(done.archived, None);
        assert_eq!(done.metadata, MetadataStatus::Skipped);
        assert!(tmp.path().join("shot.jpg").exists());
    }

    #[test]
    fn quick_save_uses_configured_format() {
        let tmp = TempDir::new().unwrap();
        touch_all(tmp.path(), &["shot.png"]);
        let mut cfg = config();
        cfg.format = crate::config::SaveFormat::Jpg;

        let done = quick_save(
            &MockBackend::new(),
            &tmp.path().join("shot.png"),
            &gradient_rgb(2, 2),
            Some(MosaicMetadata::default()),
            &cfg,
        )
        .unwrap();
        assert_eq!(done.output, tmp.path().join("_Completed/shot_1.jpg"));
        assert!(matches!(done.metadata, MetadataStatus::Unsupported(_)));
    }

    #[test]
    fn skip_copies_with_source_extension() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("raw.JPG"), b"not really a jpeg").unwrap();
        fs::create_dir(tmp.path().join("_Completed")).unwrap();
        touch_all(&tmp.path().join("_Completed"), &["raw_1.jpg"]);

        let done = skip(&tmp.path().join("raw.JPG"), &config()).unwrap();
        assert_eq!(done.output, tmp.path().join("_Completed/raw_2.jpg"));
        assert_eq!(fs::read(&done.output).unwrap(), b"not really a jpeg");
        assert_eq!(done.archived, Some(tmp.path().join("_Original/raw.JPG")));
    }

    #[test]
    fn session_metadata_respects_embed_flag() {
        let session = Session::new(gradient_rgb(500, 300), SessionSettings::default());
        let mut cfg = config();

        let meta = session_metadata(&session, &cfg).unwrap();
        assert_eq!(meta.mosaic_size, Some(5));
        assert_eq!(meta.software.as_deref(), Some("mosaic-brush"));

        cfg.processing_note.clear();
        assert_eq!(session_metadata(&session, &cfg).unwrap().processing_note, None);

        cfg.embed_metadata = false;
        assert_eq!(session_metadata(&session, &cfg), None);
    }

    #[test]
    fn missing_file_name_is_rejected() {
        assert!(matches!(
            default_save_as_path(Path::new("/")),
            Err(WorkflowError::BadFileName(_))
        ));
    }
}
