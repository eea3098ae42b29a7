use std::fmt;
use std::path::PathBuf;

use enough::StopReason;

use crate::entity::{Color, Entity};

/// Errors from bitmap decoding, segment indexing, and encoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BitmapError {
    #[error("{}: I/O error while {action}: {source}", .path.display())]
    Io {
        path: PathBuf,
        action: String,
        #[source]
        source: std::io::Error,
    },

    /// A read came up short without an OS error: the file is truncated.
    #[error("{}: unexpected end of file while {action} (file corruption)", .path.display())]
    UnexpectedEof { path: PathBuf, action: String },

    #[error("{}: unsupported bitmap format: {field} is {found}, but {requirement}", .path.display())]
    Format {
        path: PathBuf,
        field: &'static str,
        found: String,
        requirement: String,
    },

    #[error(transparent)]
    StrayColor(#[from] StrayColor),

    /// The decoder rejects 1-pixel-wide or 1-pixel-tall maps, so the
    /// encoder refuses to write them.
    #[error("dimensions too small: {width}x{height} (width and height must both be greater than 1)")]
    DimensionsTooSmall { width: u32, height: u32 },

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error(
        "color RGB({}, {}, {}) is claimed by both {existing} and {entity}",
        .color.r, .color.g, .color.b
    )]
    DuplicateColor {
        color: Color,
        existing: Entity,
        entity: Entity,
    },

    #[error(
        "{entity} is defined with both RGB({}, {}, {}) and RGB({}, {}, {})",
        .existing.r, .existing.g, .existing.b, .color.r, .color.g, .color.b
    )]
    DuplicateEntity {
        entity: Entity,
        existing: Color,
        color: Color,
    },

    #[error("no color is mapped to {0}")]
    UnmappedEntity(Entity),

    #[error("segment index is {actual_width}x{actual_height}, expected {width}x{height}")]
    DimensionsMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for BitmapError {
    fn from(r: StopReason) -> Self {
        BitmapError::Cancelled(r)
    }
}

pub type Result<T> = core::result::Result<T, BitmapError>;

/// A run of pixels whose color has no entity mapping.
///
/// `end_x` is exclusive, matching [`crate::Run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrayColor {
    pub color: Color,
    pub start_x: u32,
    pub end_x: u32,
    pub y: u32,
    pub description: String,
}

impl StrayColor {
    /// Number of stray pixels in the run.
    pub fn pixel_count(&self) -> u32 {
        self.end_x - self.start_x
    }

    pub fn is_single_pixel(&self) -> bool {
        self.pixel_count() == 1
    }
}

impl fmt::Display for StrayColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Color { r, g, b } = self.color;
        if self.is_single_pixel() {
            write!(
                f,
                "stray color RGB({r}, {g}, {b}) in {} at pixel (x, y) => ({}, {})",
                self.description, self.start_x, self.y
            )
        } else {
            write!(
                f,
                "stray color RGB({r}, {g}, {b}) in {} at pixels (x, y) => ({}-{}, {})",
                self.description,
                self.start_x,
                self.end_x - 1,
                self.y
            )
        }
    }
}

impl std::error::Error for StrayColor {}
