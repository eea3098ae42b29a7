//! # segbmp
//!
//! Converts between uncompressed 24-bit BMP region maps and a compact
//! row-wise run-length form in which each run is tagged with the entity
//! (region, impassable terrain, or ocean) its color stands for.
//!
//! ## Pipeline
//!
//! - [`BitmapDecoder`] validates the header and streams pixel rows
//!   bottom-to-top, reporting same-color runs.
//! - [`ColorEntityMap`] resolves each run's color to an [`Entity`]. Colors
//!   without an entry are a hard [`BitmapError::StrayColor`], never a
//!   silent default.
//! - [`ColorSegmentIndex`] stores the resolved runs per row.
//! - [`BitmapEncoder`] / [`encode_to_vec`] expand an index back into BMP
//!   bytes using the inverse [`EntityColorMap`].
//!
//! ## Non-Goals
//!
//! - Paletted, compressed, or non-24-bit bitmaps
//! - Resizing, filtering, or any editing beyond straight re-encoding
//!
//! ## Usage
//!
//! ```no_run
//! use segbmp::{BitmapDecoder, BitmapEncoder, ColorEntityMap, Unstoppable};
//! use rgb::RGB8;
//!
//! let map = ColorEntityMap::from_definitions([(1, RGB8::new(128, 34, 64))])?;
//!
//! let mut decoder = BitmapDecoder::open("provinces.bmp")?;
//! let index = decoder.decode_index(&map, "provinces bitmap", Unstoppable)?;
//!
//! let mut encoder = BitmapEncoder::create("provinces.out.bmp")?;
//! encoder.encode(index.width(), index.height(), &index, &map.inverse(), Unstoppable)?;
//! encoder.finish()?;
//! # Ok::<(), segbmp::BitmapError>(())
//! ```

#![forbid(unsafe_code)]

pub mod bmp;
mod entity;
mod error;
mod limits;
mod segments;

// Re-exports
pub use bmp::{BitmapDecoder, BitmapEncoder, BitmapHeader, encode_to_vec, row_stride};
pub use enough::{Stop, StopReason, Unstoppable};
pub use entity::{
    Color, ColorEntityMap, Entity, EntityColorMap, EntityId, IMPASSABLE_COLOR, OCEAN_COLOR,
    color_from_rgb,
};
pub use error::{BitmapError, Result, StrayColor};
pub use limits::Limits;
pub use segments::{ColorSegmentIndex, Row, Run};
