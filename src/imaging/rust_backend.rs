//! Pure Rust I/O backend on the `image` and `png` crates.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` |
//! | Decode (JPEG, PNG, TIFF, WebP, BMP, GIF) | `image::ImageReader` |
//! | Encode PNG with text chunks | `png::Encoder` + `add_text_chunk` / `add_itxt_chunk` |
//! | Read PNG text chunks | `png::Decoder::read_info` |
//! | Encode JPEG | `image::codecs::jpeg::JpegEncoder` (alpha dropped) |
//! | Encode other formats | `DynamicImage::save_with_format` |
//!
//! Decoded images are normalised to 8-bit gray, RGB or RGBA; 16-bit and
//! float inputs are narrowed on load.

use super::backend::{BackendError, Dimensions, ImageBackend, LoadedImage};
use super::buffer::ImageBuffer;
use super::params::{Quality, SaveParams};
use crate::metadata::{MetadataStatus, MosaicMetadata, supports_text_chunks};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, RgbImage, RgbaImage};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions the folder scanner treats as images, paired with their format.
const IMAGE_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("bmp", ImageFormat::Bmp),
    ("gif", ImageFormat::Gif),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    IMAGE_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Backend using the `image` crate ecosystem.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }

    /// Read only the mosaic metadata of a file.
    ///
    /// # Errors
    /// [`BackendError::UnsupportedMetadataFormat`] for formats we never embed
    /// metadata in.
    pub fn read_metadata(&self, path: &Path) -> Result<Option<MosaicMetadata>, BackendError> {
        let format = format_of(path)?;
        if !supports_text_chunks(format) {
            return Err(BackendError::UnsupportedMetadataFormat(format));
        }
        read_png_text(path)
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn format_of(path: &Path) -> Result<ImageFormat, BackendError> {
    ImageFormat::from_path(path).map_err(|e| BackendError::UnsupportedFormat(e.to_string()))
}

fn decode_error(path: &Path, e: impl std::fmt::Display) -> BackendError {
    BackendError::Decode {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

fn encode_error(path: &Path, e: impl std::fmt::Display) -> BackendError {
    BackendError::Encode {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Narrow any decoded image to one of the buffer layouts.
pub fn buffer_from_dynamic(img: DynamicImage) -> Result<ImageBuffer, BackendError> {
    let (width, height) = (img.width(), img.height());
    let buffer = match img {
        DynamicImage::ImageLuma8(b) => ImageBuffer::from_raw(width, height, 1, b.into_raw())?,
        DynamicImage::ImageRgb8(b) => ImageBuffer::from_raw(width, height, 3, b.into_raw())?,
        DynamicImage::ImageRgba8(b) => ImageBuffer::from_raw(width, height, 4, b.into_raw())?,
        other if other.color().has_alpha() => {
            ImageBuffer::from_raw(width, height, 4, other.to_rgba8().into_raw())?
        }
        other if other.color().channel_count() == 1 => {
            ImageBuffer::from_raw(width, height, 1, other.to_luma8().into_raw())?
        }
        other => ImageBuffer::from_raw(width, height, 3, other.to_rgb8().into_raw())?,
    };
    Ok(buffer)
}

/// Wrap a buffer as a `DynamicImage` for encoding.
pub fn dynamic_from_buffer(buffer: &ImageBuffer) -> Option<DynamicImage> {
    let (w, h) = (buffer.width(), buffer.height());
    let data = buffer.as_raw().to_vec();
    match buffer.channels() {
        1 => GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
        3 => RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
        4 => RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
        _ => None,
    }
}

fn read_png_text(path: &Path) -> Result<Option<MosaicMetadata>, BackendError> {
    let file = File::open(path)?;
    let reader = png::Decoder::new(BufReader::new(file))
        .read_info()
        .map_err(|e| decode_error(path, e))?;
    let info = reader.info();

    let mut pairs: Vec<(String, String)> = info
        .uncompressed_latin1_text
        .iter()
        .map(|c| (c.keyword.clone(), c.text.clone()))
        .collect();
    for chunk in &info.compressed_latin1_text {
        match chunk.get_text() {
            Ok(text) => pairs.push((chunk.keyword.clone(), text)),
            Err(e) => log::warn!("{}: unreadable zTXt {}: {e}", path.display(), chunk.keyword),
        }
    }
    for chunk in &info.utf8_text {
        match chunk.get_text() {
            Ok(text) => pairs.push((chunk.keyword.clone(), text)),
            Err(e) => log::warn!("{}: unreadable iTXt {}: {e}", path.display(), chunk.keyword),
        }
    }

    Ok(MosaicMetadata::from_text_pairs(
        pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    ))
}

fn write_png_with_text(
    image: &ImageBuffer,
    path: &Path,
    metadata: &MosaicMetadata,
) -> Result<(), BackendError> {
    let file = File::create(path)?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), image.width(), image.height());
    encoder.set_color(match image.channels() {
        1 => png::ColorType::Grayscale,
        3 => png::ColorType::Rgb,
        _ => png::ColorType::Rgba,
    });
    encoder.set_depth(png::BitDepth::Eight);

    for chunk in metadata.to_text_chunks() {
        let added = if chunk.utf8 {
            encoder.add_itxt_chunk(chunk.keyword, chunk.text)
        } else {
            encoder.add_text_chunk(chunk.keyword, chunk.text)
        };
        added.map_err(|e| encode_error(path, e))?;
    }

    let mut writer = encoder.write_header().map_err(|e| encode_error(path, e))?;
    writer
        .write_image_data(image.as_raw())
        .map_err(|e| encode_error(path, e))?;
    writer.finish().map_err(|e| encode_error(path, e))
}

fn write_plain(
    image: &ImageBuffer,
    path: &Path,
    format: ImageFormat,
    quality: Quality,
) -> Result<(), BackendError> {
    let dynamic = dynamic_from_buffer(image)
        .ok_or_else(|| encode_error(path, "buffer does not match its shape"))?;

    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel.
            let flat = if image.channels() == 4 {
                DynamicImage::ImageRgb8(dynamic.to_rgb8())
            } else {
                dynamic
            };
            let file = BufWriter::new(File::create(path)?);
            let q = quality.value().min(100) as u8;
            flat.write_with_encoder(JpegEncoder::new_with_quality(file, q))
                .map_err(|e| encode_error(path, e))
        }
        ImageFormat::WebP if image.channels() == 1 => DynamicImage::ImageRgb8(dynamic.to_rgb8())
            .save_with_format(path, format)
            .map_err(|e| encode_error(path, e)),
        _ => dynamic
            .save_with_format(path, format)
            .map_err(|e| encode_error(path, e)),
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| decode_error(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn load(&self, path: &Path) -> Result<LoadedImage, BackendError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = reader
            .format()
            .ok_or_else(|| BackendError::UnsupportedFormat(path.display().to_string()))?;
        let decoded = reader.decode().map_err(|e| decode_error(path, e))?;
        let buffer = buffer_from_dynamic(decoded)?;

        let metadata = if supports_text_chunks(format) {
            read_png_text(path)?
        } else {
            None
        };
        log::debug!(
            "loaded {} ({}x{}, {} channels, {:?})",
            path.display(),
            buffer.width(),
            buffer.height(),
            buffer.channels(),
            format
        );

        Ok(LoadedImage {
            buffer,
            format,
            metadata,
        })
    }

    fn save(&self, params: &SaveParams<'_>) -> Result<MetadataStatus, BackendError> {
        let path = params.output.as_path();
        let format = format_of(path)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let metadata = params.metadata.as_ref().filter(|m| !m.is_empty());
        let status = match metadata {
            Some(meta) if supports_text_chunks(format) => {
                write_png_with_text(params.image, path, meta)?;
                MetadataStatus::Embedded
            }
            Some(_) => {
                write_plain(params.image, path, format, params.quality)?;
                log::warn!(
                    "{}: {:?} has no text chunks, saved without metadata",
                    path.display(),
                    format
                );
                MetadataStatus::Unsupported(format)
            }
            None => {
                write_plain(params.image, path, format, params.quality)?;
                MetadataStatus::Skipped
            }
        };
        log::info!("saved {}", path.display());
        Ok(status)
    }
}
