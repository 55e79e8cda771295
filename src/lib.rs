//! # mosaic-brush
//!
//! Manual block-mosaic ("pixelation") redaction for still images. A user
//! clicks or drags over the parts of a picture that must be hidden and each
//! touched area is replaced by a grid of flat-coloured square cells.
//!
//! # Architecture: Pure Core, Thin Shell
//!
//! ```text
//!  CLI / UI events ──▶ Session ──▶ RegionCompositor ──▶ MosaicEngine
//!   (pixel coords)     (state,      (drag → grid of      (in-place cell
//!                       history,     virtual clicks,      averaging)
//!                       mask)        mask sub-buffer)
//!                        │
//!                        └──▶ workflow ──▶ ImageBackend (image + png)
//! ```
//!
//! The engine and compositor work on a caller-owned [`imaging::ImageBuffer`]
//! and never touch the filesystem. Everything with side effects (decoding,
//! encoding, moving files) sits behind [`imaging::ImageBackend`] and the
//! [`workflow`] functions, so the pixel logic is tested on synthetic buffers.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Buffers, FANZA sizing, the engine, the compositor and the `image`/`png` backend |
//! | [`session`] | Interaction state machine: press / drag / release, mask, undo, preview |
//! | [`history`] | Bounded undo/redo stack of buffer snapshots |
//! | [`metadata`] | Reference point and cell size stored in PNG text chunks |
//! | [`scan`] | Sibling image listing and next/previous navigation |
//! | [`naming`] | Natural filename order and `{stem}_{n}.{ext}` allocation |
//! | [`workflow`] | Save-as, quick save (`_Completed` / `_Original`) and skip |
//! | [`config`] | `mosaic.toml` loading, merging and validation |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## FANZA Cell Size
//!
//! The default cell edge follows a publication rule for adult content: at
//! least 4 px, and 1/100 of the longer image edge once that edge reaches
//! 400 px. See [`imaging::fanza_block_size`]. A fixed custom size and a 1–4
//! multiplier are available for stricter redaction.
//!
//! ## In-Place, Deterministic Pixel Work
//!
//! Every engine operation mutates the buffer it is given and reads only the
//! pixels inside its own rectangle. Cells are anchored to the rectangle's
//! corner and means round half up, so the same input always yields the same
//! bytes and re-applying an edit changes nothing.
//!
//! ## One Compositor Call per Drag
//!
//! A drag is only a rubber band until the pointer is released. The session
//! then calls the compositor once and pushes one undo entry, so undo steps
//! match what the user did.
//!
//! ## Metadata Only Where It Fits
//!
//! The grid anchor and cell size are written as PNG text chunks. Other
//! formats are saved without them and the caller is told so through
//! [`metadata::MetadataStatus::Unsupported`] instead of the save failing.

pub mod config;
pub mod history;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod scan;
pub mod session;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_helpers;
