//! Mosaic imaging: pixel buffers, cell averaging, drag composition and file I/O.
//!
//! | Operation | Where |
//! |---|---|
//! | **Block size** | [`fanza_block_size`], [`compute_block_size`] |
//! | **Pixelate a region / a click** | [`MosaicEngine`] |
//! | **Drag with optional mask** | [`RegionCompositor`] |
//! | **Load / save** | [`ImageBackend`] + [`RustBackend`] (`image` + `png`) |
//!
//! The module is split into:
//! - **Buffer**: [`ImageBuffer`] and the integer geometry it is addressed with
//! - **Calculations**: Pure functions for sizing and grid math (unit testable)
//! - **Parameters**: Data structures describing mosaic and save settings
//! - **Engine / Compositor**: In-place pixel work on a buffer
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
pub mod buffer;
mod calculations;
pub mod compositor;
pub mod engine;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, LoadedImage};
pub use buffer::{ImageBuffer, ImageBufferError, Point, Rect};
pub use calculations::{
    FANZA_MIN_BLOCK, FANZA_SCALE_FROM, drag_stride, fanza_block_size, interaction_area,
    interaction_points, snap_to_grid,
};
pub use compositor::RegionCompositor;
pub use engine::{MosaicEngine, MosaicError};
pub use params::{
    Averaging, CUSTOM_SIZE_RANGE, Multiplier, Quality, SaveParams, SizePolicy, compute_block_size,
};
pub use rust_backend::{RustBackend, supported_input_extensions};
