//! Filename ordering and output-name allocation.
//!
//! ## Natural order
//!
//! Folder listings are sorted the way people number their files: runs of
//! digits compare by value, everything else compares case-insensitively.
//! - `img2.png` < `img10.png`
//! - `Scan-007.jpg` < `scan-8.jpg`
//!
//! ## Numbered outputs
//!
//! Saved results never overwrite anything. An edit of `photo.jpg` becomes the
//! first free name in `photo_1.png`, `photo_2.png`, ...

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = None;
    for (i, c) in s.char_indices() {
        let digit = c.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != digit => {
                out.push(make_chunk(&s[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(digit);
    }
    if let Some(digit) = in_digits {
        out.push(make_chunk(&s[start..], digit));
    }
    out
}

fn make_chunk(s: &str, digits: bool) -> Chunk<'_> {
    if digits { Chunk::Digits(s) } else { Chunk::Text(s) }
}

/// Compare two digit runs by value without parsing (no overflow on long runs).
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Natural, case-insensitive ordering of file names.
///
/// Names that only differ in case or zero padding fall back to a plain
/// byte comparison so the order is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (ca, cb) = (chunks(a), chunks(b));
    for (x, y) in ca.iter().zip(cb.iter()) {
        let ord = match (x, y) {
            (Chunk::Digits(x), Chunk::Digits(y)) => cmp_digits(x, y),
            (Chunk::Text(x), Chunk::Text(y)) => cmp_text(x, y),
            // Digits sort before letters, as in a plain ASCII compare.
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ca.len().cmp(&cb.len()).then_with(|| a.cmp(b))
}

/// `{stem}_{n}.{ext}`
pub fn numbered_name(stem: &str, n: u32, ext: &str) -> String {
    format!("{stem}_{n}.{ext}")
}

/// First `dir/{stem}_{n}.{ext}` with `n >= 1` that does not exist yet.
pub fn next_available_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    (1..)
        .map(|n| dir.join(numbered_name(stem, n, ext)))
        .find(|p| !p.exists())
        .unwrap_or_else(|| dir.join(numbered_name(stem, u32::MAX, ext)))
}

/// File stem and lowercase extension of `path`, if it has both.
pub fn stem_and_extension(path: &Path) -> Option<(String, String)> {
    let stem = path.file_stem()?.to_string_lossy().to_string();
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    Some((stem, ext))
}
