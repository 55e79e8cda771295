//! CLI output formatting for every subcommand.
//!
//! # Information-First Display
//!
//! Each report leads with the image it is about, followed by indented
//! context lines. Paths are shown relative to the source image's folder
//! when possible, so a batch run reads as an inventory of that folder.
//!
//! # Output Format
//!
//! ## Size
//!
//! ```text
//! photo.jpg 1200x800
//!     Mode: FANZA x2
//!     Block size: 24px
//! ```
//!
//! ## Apply
//!
//! ```text
//! photo.jpg: 3 edits at 12px
//!     Mask: (40,40)-(300,220)
//!     Saved: _Completed/photo_1.png
//!     Metadata: embedded
//!     Original: _Original/photo.jpg
//! ```
//!
//! ## List
//!
//! ```text
//! shoot/ (3 images)
//! 001 img1.jpg
//! 002 img2.png  <- current
//! 003 img10.jpg
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::imaging::{Dimensions, Multiplier, Rect, SizePolicy};
use crate::metadata::{MetadataStatus, MosaicMetadata};
use crate::scan::FolderCursor;
use crate::workflow::Completed;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// `path` relative to `base` when it lives below it, else as given.
fn relative_to(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}

fn format_rect(r: &Rect) -> String {
    format!("({},{})-({},{})", r.x1, r.y1, r.x2, r.y2)
}

fn format_policy(policy: SizePolicy, multiplier: Multiplier) -> String {
    let base = match policy {
        SizePolicy::Proportional => policy.label().to_string(),
        SizePolicy::Fixed(n) => format!("{} {n}px", policy.label()),
    };
    format!("{base} x{}", multiplier.value())
}

/// One-line description of what happened to the metadata.
pub fn format_metadata_status(status: &MetadataStatus) -> String {
    match status {
        MetadataStatus::Embedded => "embedded".to_string(),
        MetadataStatus::Skipped => "none".to_string(),
        MetadataStatus::Unsupported(format) => {
            format!("not supported by {format:?}, saved without it")
        }
    }
}

fn source_dir(source: &Path) -> &Path {
    source.parent().unwrap_or(Path::new(""))
}

// ============================================================================
// size
// ============================================================================

pub fn format_size_report(
    source: &Path,
    dims: Dimensions,
    policy: SizePolicy,
    multiplier: Multiplier,
    block_size: u32,
) -> Vec<String> {
    vec![
        format!("{} {}x{}", file_name(source), dims.width, dims.height),
        format!("{}Mode: {}", indent(1), format_policy(policy, multiplier)),
        format!("{}Block size: {}px", indent(1), block_size),
    ]
}

pub fn print_size_report(
    source: &Path,
    dims: Dimensions,
    policy: SizePolicy,
    multiplier: Multiplier,
    block_size: u32,
) {
    for line in format_size_report(source, dims, policy, multiplier, block_size) {
        println!("{}", line);
    }
}

// ============================================================================
// apply / skip
// ============================================================================

/// Header for an `apply` run: how many interactions changed the image.
pub fn format_apply_summary(
    source: &Path,
    edits: usize,
    block_size: u32,
    mask: Option<Rect>,
) -> Vec<String> {
    let noun = if edits == 1 { "edit" } else { "edits" };
    let mut lines = vec![format!(
        "{}: {} {} at {}px",
        file_name(source),
        edits,
        noun,
        block_size
    )];
    if let Some(mask) = mask {
        lines.push(format!("{}Mask: {}", indent(1), format_rect(&mask)));
    }
    lines
}

/// Lines for a plain save to an explicit path.
pub fn format_saved(source: &Path, output: &Path, status: &MetadataStatus) -> Vec<String> {
    let base = source_dir(source);
    vec![
        format!("{}Saved: {}", indent(1), relative_to(output, base)),
        format!("{}Metadata: {}", indent(1), format_metadata_status(status)),
    ]
}

/// Lines for a quick save or a skip.
pub fn format_completed(source: &Path, done: &Completed) -> Vec<String> {
    let base = source_dir(source);
    let mut lines = format_saved(source, &done.output, &done.metadata);
    lines.push(match &done.archived {
        Some(target) => format!("{}Original: {}", indent(1), relative_to(target, base)),
        None => format!("{}Original: left in place (name taken)", indent(1)),
    });
    lines
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// list
// ============================================================================

pub fn format_folder_listing(cursor: &FolderCursor) -> Vec<String> {
    let (current, total) = cursor.position();
    let mut lines = vec![format!("{}/ ({} images)", file_name(cursor.dir()), total)];
    for (i, path) in cursor.files().iter().enumerate() {
        let mut line = format!("{} {}", format_index(i + 1), file_name(path));
        if i + 1 == current {
            line.push_str("  <- current");
        }
        lines.push(line);
    }
    lines
}

pub fn print_folder_listing(cursor: &FolderCursor) {
    print_lines(&format_folder_listing(cursor));
}

// ============================================================================
// inspect
// ============================================================================

pub fn format_metadata(source: &Path, metadata: Option<&MosaicMetadata>) -> Vec<String> {
    let mut lines = vec![file_name(source)];
    let Some(meta) = metadata else {
        lines.push(format!("{}No mosaic metadata", indent(1)));
        return lines;
    };
    if let Some(software) = &meta.software {
        lines.push(format!("{}Software: {}", indent(1), software));
    }
    if let Some(note) = &meta.processing_note {
        lines.push(format!("{}Note: {}", indent(1), note));
    }
    if let Some(rp) = &meta.reference_point {
        lines.push(format!(
            "{}Reference point: ({},{}) at {}px",
            indent(1),
            rp.x,
            rp.y,
            rp.mosaic_size
        ));
    }
    if let Some(size) = meta.mosaic_size {
        lines.push(format!("{}Block size: {}px", indent(1), size));
    }
    lines
}

pub fn print_metadata(source: &Path, metadata: Option<&MosaicMetadata>) {
    print_lines(&format_metadata(source, metadata));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ReferencePoint;
    use crate::test_helpers::touch_all;
    use image::ImageFormat;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn size_report_fanza() {
        let lines = format_size_report(
            Path::new("/shoot/photo.jpg"),
            Dimensions {
                width: 1200,
                height: 800,
            },
            SizePolicy::Proportional,
            Multiplier::new(2),
            24,
        );
        assert_eq!(
            lines,
            vec!["photo.jpg 1200x800", "    Mode: FANZA x2", "    Block size: 24px"]
        );
    }

    #[test]
    fn size_report_custom_shows_size() {
        let lines = format_size_report(
            Path::new("a.png"),
            Dimensions {
                width: 10,
                height: 10,
            },
            SizePolicy::Fixed(7),
            Multiplier::default(),
            7,
        );
        assert_eq!(lines[1], "    Mode: custom 7px x1");
    }

    #[test]
    fn apply_summary_pluralises_and_shows_mask() {
        let one = format_apply_summary(Path::new("p.jpg"), 1, 5, None);
        assert_eq!(one, vec!["p.jpg: 1 edit at 5px"]);

        let many = format_apply_summary(Path::new("p.jpg"), 3, 5, Some(Rect::new(1, 2, 3, 4)));
        assert_eq!(many, vec!["p.jpg: 3 edits at 5px", "    Mask: (1,2)-(3,4)"]);
    }

    #[test]
    fn completed_paths_are_relative_to_source_folder() {
        let done = Completed {
            output: PathBuf::from("/shoot/_Completed/photo_1.png"),
            metadata: MetadataStatus::Unsupported(ImageFormat::Jpeg),
            archived: None,
        };
        let lines = format_completed(Path::new("/shoot/photo.jpg"), &done);
        assert_eq!(
            lines,
            vec![
                "    Saved: _Completed/photo_1.png",
                "    Metadata: not supported by Jpeg, saved without it",
                "    Original: left in place (name taken)",
            ]
        );
    }

    #[test]
    fn folder_listing_marks_current() {
        let tmp = TempDir::new().unwrap();
        touch_all(tmp.path(), &["img10.jpg", "img2.png", "img1.jpg"]);
        let cursor = FolderCursor::open(&tmp.path().join("img2.png")).unwrap();
        let lines = format_folder_listing(&cursor);
        assert!(lines[0].ends_with("(3 images)"));
        assert_eq!(
            &lines[1..],
            &["001 img1.jpg", "002 img2.png  <- current", "003 img10.jpg"]
        );
    }

    #[test]
    fn metadata_report() {
        let meta = MosaicMetadata {
            software: Some("mosaic-brush".into()),
            processing_note: None,
            reference_point: Some(ReferencePoint {
                x: 8,
                y: 4,
                mosaic_size: 4,
            }),
            mosaic_size: Some(4),
        };
        assert_eq!(
            format_metadata(Path::new("x.png"), Some(&meta)),
            vec![
                "x.png",
                "    Software: mosaic-brush",
                "    Reference point: (8,4) at 4px",
                "    Block size: 4px",
            ]
        );
        assert_eq!(
            format_metadata(Path::new("x.png"), None),
            vec!["x.png", "    No mosaic metadata"]
        );
    }
}
