//! Mosaic metadata carried inside saved images.
//!
//! A processed image can record where its mosaic grid was anchored and how
//! large the cells were, so a later session can pick up with the same
//! settings. The values travel as PNG text chunks:
//!
//! | Key | Value |
//! |---|---|
//! | `Software` | Tool name (Latin-1 `tEXt`) |
//! | `ProcessingInfo` | Free-text processing note (UTF-8 `iTXt`) |
//! | `ReferencePoint` | JSON `{"x": .., "y": .., "mosaic_size": ..}` |
//! | `MosaicSize` | Cell size in pixels, decimal |
//!
//! Older files wrote `ReferencePoint` as a bare `[x, y]` pair with the size
//! only in `MosaicSize`; both shapes are accepted on read.
//!
//! ## Format support
//!
//! Only PNG has text chunks we write. Saving any other format drops the
//! metadata and reports [`MetadataStatus::Unsupported`] so the caller can
//! warn; the pixels are still written.

use image::ImageFormat;
use serde::{Deserialize, Serialize};

pub const KEY_SOFTWARE: &str = "Software";
pub const KEY_PROCESSING_INFO: &str = "ProcessingInfo";
pub const KEY_REFERENCE_POINT: &str = "ReferencePoint";
pub const KEY_MOSAIC_SIZE: &str = "MosaicSize";

/// Grid anchor and cell size recorded for an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub x: i32,
    pub y: i32,
    pub mosaic_size: u32,
}

/// Everything embedded alongside the pixels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MosaicMetadata {
    pub software: Option<String>,
    pub processing_note: Option<String>,
    pub reference_point: Option<ReferencePoint>,
    pub mosaic_size: Option<u32>,
}

/// What happened to the metadata on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataStatus {
    /// Written into the file.
    Embedded,
    /// None was requested.
    Skipped,
    /// The target format has no text chunks; the image was saved without it.
    Unsupported(ImageFormat),
}

/// Whether metadata can be embedded in `format`.
pub fn supports_text_chunks(format: ImageFormat) -> bool {
    format == ImageFormat::Png
}

/// One text chunk: keyword plus value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub keyword: String,
    pub text: String,
    /// Needs the UTF-8 `iTXt` chunk rather than Latin-1 `tEXt`.
    pub utf8: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredReference {
    Full(ReferencePoint),
    Pair([i32; 2]),
}

impl MosaicMetadata {
    /// True when there is nothing to write.
    pub fn is_empty(&self) -> bool {
        self == &MosaicMetadata::default()
    }

    /// Encode as text chunks, in a fixed key order.
    pub fn to_text_chunks(&self) -> Vec<TextChunk> {
        let mut chunks = Vec::new();
        if let Some(software) = &self.software {
            chunks.push(TextChunk {
                keyword: KEY_SOFTWARE.to_string(),
                text: software.clone(),
                utf8: !is_latin1(software),
            });
        }
        if let Some(note) = &self.processing_note {
            chunks.push(TextChunk {
                keyword: KEY_PROCESSING_INFO.to_string(),
                text: note.clone(),
                utf8: true,
            });
        }
        if let Some(rp) = &self.reference_point {
            // ReferencePoint has only integer fields; serializing cannot fail.
            if let Ok(json) = serde_json::to_string(rp) {
                chunks.push(TextChunk {
                    keyword: KEY_REFERENCE_POINT.to_string(),
                    text: json,
                    utf8: false,
                });
            }
        }
        if let Some(size) = self.mosaic_size {
            chunks.push(TextChunk {
                keyword: KEY_MOSAIC_SIZE.to_string(),
                text: size.to_string(),
                utf8: false,
            });
        }
        chunks
    }

    /// Decode from `(keyword, text)` pairs. Unknown keys are ignored.
    ///
    /// Returns `None` when none of our keys is present. Malformed values are
    /// dropped individually with a warning rather than failing the load.
    pub fn from_text_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Option<Self> {
        let mut meta = MosaicMetadata::default();
        let mut found = false;
        let mut legacy_pair = None;

        for (key, text) in pairs {
            match key {
                KEY_SOFTWARE => {
                    meta.software = Some(text.to_string());
                    found = true;
                }
                KEY_PROCESSING_INFO => {
                    meta.processing_note = Some(text.to_string());
                    found = true;
                }
                KEY_REFERENCE_POINT | "reference_point" => {
                    found = true;
                    match serde_json::from_str::<StoredReference>(text) {
                        Ok(StoredReference::Full(rp)) => meta.reference_point = Some(rp),
                        Ok(StoredReference::Pair([x, y])) => legacy_pair = Some((x, y)),
                        Err(e) => log::warn!("ignoring malformed {key} chunk: {e}"),
                    }
                }
                KEY_MOSAIC_SIZE => {
                    found = true;
                    match text.trim().parse::<u32>() {
                        Ok(size) if size > 0 => meta.mosaic_size = Some(size),
                        _ => log::warn!("ignoring malformed {key} chunk: {text:?}"),
                    }
                }
                _ => {}
            }
        }

        if meta.reference_point.is_none() {
            if let (Some((x, y)), Some(mosaic_size)) = (legacy_pair, meta.mosaic_size) {
                meta.reference_point = Some(ReferencePoint { x, y, mosaic_size });
            }
        }
        if meta.mosaic_size.is_none() {
            meta.mosaic_size = meta.reference_point.map(|rp| rp.mosaic_size);
        }

        found.then_some(meta)
    }
}

fn is_latin1(s: &str) -> bool {
    s.chars().all(|c| (c as u32) < 0x100)
}
