//! Folder scanning and sibling navigation.
//!
//! Opening an image also opens its folder: every sibling with a supported
//! image extension is listed in natural order so the user can step through
//! a batch without leaving the editor.
//!
//! ```text
//! shoot/
//! ├── _Completed/        # not listed (directory)
//! ├── .thumbs.png        # not listed (hidden)
//! ├── img1.jpg           # 1
//! ├── img2.PNG           # 2  (extensions are case-insensitive)
//! ├── img10.jpg          # 3  (natural order: 2 < 10)
//! └── notes.txt          # not listed
//! ```
//!
//! The listing is a snapshot. After a workflow moves files around, call
//! [`FolderCursor::reload`]; when the current file has gone the cursor stays
//! at the same position, which is the file that followed it.

use crate::naming::natural_cmp;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions listed as images (compared lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tif", "tiff", "webp"];

#[derive(Error, Debug)]
pub enum FolderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Not a supported image file: {0}")]
    NotAnImage(PathBuf),
    #[error("Image not found in its folder: {0}")]
    NotFound(PathBuf),
    #[error("No images left in {0}")]
    Empty(PathBuf),
}

pub fn is_image(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

/// All images directly inside `dir`, naturally sorted by file name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, FolderError> {
    let mut images: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| !is_hidden(p) && is_image(p))
        .collect();
    images.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
    Ok(images)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Position within a folder of images.
#[derive(Debug, Clone)]
pub struct FolderCursor {
    dir: PathBuf,
    files: Vec<PathBuf>,
    index: usize,
}

impl FolderCursor {
    /// List the folder of `image` and point at `image`.
    pub fn open(image: &Path) -> Result<Self, FolderError> {
        if !is_image(image) {
            return Err(FolderError::NotAnImage(image.to_path_buf()));
        }
        let dir = match image.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let files = list_images(&dir)?;
        let name = image.file_name();
        let index = files
            .iter()
            .position(|f| f.file_name() == name)
            .ok_or_else(|| FolderError::NotFound(image.to_path_buf()))?;
        log::debug!("{}: {} images, at {}", dir.display(), files.len(), index + 1);
        Ok(Self { dir, files, index })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn current(&self) -> &Path {
        &self.files[self.index]
    }

    /// 1-based position and total count, e.g. `(3, 12)`.
    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, self.files.len())
    }

    /// Move to the next image. `None` (cursor unchanged) at the end.
    pub fn next(&mut self) -> Option<&Path> {
        if self.index + 1 >= self.files.len() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    /// Move to the previous image. `None` (cursor unchanged) at the start.
    pub fn previous(&mut self) -> Option<&Path> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    /// Re-read the folder.
    ///
    /// Keeps pointing at the same file when it still exists; otherwise keeps
    /// the numeric position, clamped to the new length.
    pub fn reload(&mut self) -> Result<(), FolderError> {
        let name = self.current().file_name().map(|n| n.to_os_string());
        let files = list_images(&self.dir)?;
        if files.is_empty() {
            return Err(FolderError::Empty(self.dir.clone()));
        }
        self.index = files
            .iter()
            .position(|f| f.file_name() == name.as_deref())
            .unwrap_or_else(|| self.index.min(files.len() - 1));
        self.files = files;
        Ok(())
    }
}
