//! The fixed 54-byte BMP header: parsing, validation, and serialization.

use std::path::Path;

use super::{BITS_PER_PIXEL, HEADER_SIZE, MAGIC, MIN_DIB_HEADER_SIZE, pixel_array_size};
use crate::error::{BitmapError, Result};

/// Horizontal and vertical resolution written by the encoder (72 DPI).
const PIXELS_PER_METER: u32 = 2835;

/// A validated BITMAPFILEHEADER + BITMAPINFOHEADER.
///
/// Construction checks every field; the value cannot change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapHeader {
    file_size: u32,
    pixel_offset: u32,
    dib_header_size: u32,
    width: u32,
    height: u32,
    planes: u16,
    bpp: u16,
    compression: u32,
    declared_bitmap_size: u32,
    x_pixels_per_meter: u32,
    y_pixels_per_meter: u32,
    declared_colors: u32,
    important_colors: u32,
    stride: usize,
    bitmap_size: usize,
}

struct Fields<'a>(&'a [u8; HEADER_SIZE]);

impl Fields<'_> {
    fn u16_at(&self, off: usize) -> u16 {
        u16::from_le_bytes([self.0[off], self.0[off + 1]])
    }

    fn u32_at(&self, off: usize) -> u32 {
        u32::from_le_bytes([
            self.0[off],
            self.0[off + 1],
            self.0[off + 2],
            self.0[off + 3],
        ])
    }

    fn i32_at(&self, off: usize) -> i32 {
        self.u32_at(off) as i32
    }
}

fn invalid(
    path: &Path,
    field: &'static str,
    found: impl ToString,
    requirement: impl Into<String>,
) -> BitmapError {
    BitmapError::Format {
        path: path.to_path_buf(),
        field,
        found: found.to_string(),
        requirement: requirement.into(),
    }
}

impl BitmapHeader {
    /// Parse and validate raw header bytes read from `path`.
    ///
    /// Checks run in a fixed order and the first failure is returned.
    pub fn parse(raw: &[u8; HEADER_SIZE], path: &Path) -> Result<Self> {
        let f = Fields(raw);

        let magic = f.u16_at(0);
        if magic != MAGIC {
            return Err(invalid(
                path,
                "magic",
                format!("0x{magic:04X}"),
                format!("must be 0x{MAGIC:04X} (\"BM\")"),
            ));
        }

        let file_size = f.u32_at(2);
        // 6..10 reserved
        let pixel_offset = f.u32_at(10);

        let dib_header_size = f.u32_at(14);
        if dib_header_size < MIN_DIB_HEADER_SIZE {
            return Err(invalid(
                path,
                "DIB header size",
                dib_header_size,
                format!("must be at least {MIN_DIB_HEADER_SIZE} bytes"),
            ));
        }

        let width = f.i32_at(18);
        if width <= 0 {
            return Err(invalid(path, "width", width, "must be positive"));
        }
        if width == 1 {
            return Err(invalid(
                path,
                "width",
                width,
                "must be greater than 1 to support a map",
            ));
        }

        let height = f.i32_at(22);
        if height <= 0 {
            return Err(invalid(
                path,
                "height",
                height,
                "must be positive (top-down bitmaps are unsupported)",
            ));
        }
        if height == 1 {
            return Err(invalid(
                path,
                "height",
                height,
                "must be greater than 1 to support a map",
            ));
        }

        let planes = f.u16_at(26);
        if planes != 1 {
            return Err(invalid(path, "plane count", planes, "must be exactly 1"));
        }

        let bpp = f.u16_at(28);
        if bpp != BITS_PER_PIXEL {
            return Err(invalid(
                path,
                "bits per pixel",
                bpp,
                format!("must be {BITS_PER_PIXEL}"),
            ));
        }

        let compression = f.u32_at(30);
        if compression != 0 {
            return Err(invalid(
                path,
                "compression type",
                compression,
                "must be 0 (uncompressed)",
            ));
        }

        let declared_bitmap_size = f.u32_at(34);
        let x_pixels_per_meter = f.u32_at(38);
        let y_pixels_per_meter = f.u32_at(42);

        let declared_colors = f.u32_at(46);
        if declared_colors != 0 {
            return Err(invalid(
                path,
                "color count",
                declared_colors,
                "must be 0 (paletted images are unsupported)",
            ));
        }

        let important_colors = f.u32_at(50);
        if important_colors != 0 {
            tracing::warn!(
                path = %path.display(),
                important_colors,
                "bitmap declares important colors without a palette"
            );
        }

        let (width, height) = (width as u32, height as u32);
        let (stride, bitmap_size) = pixel_array_size(width, height)
            .ok_or(BitmapError::DimensionsTooLarge { width, height })?;

        if declared_bitmap_size == 0 {
            tracing::warn!(
                path = %path.display(),
                "bitmap declares no pixel data size; assuming {bitmap_size} bytes"
            );
        } else if declared_bitmap_size as usize != bitmap_size {
            return Err(invalid(
                path,
                "pixel data size",
                declared_bitmap_size,
                format!("must be 0 or {bitmap_size} for a {width}x{height} 24-bit image"),
            ));
        }

        Ok(Self {
            file_size,
            pixel_offset,
            dib_header_size,
            width,
            height,
            planes,
            bpp,
            compression,
            declared_bitmap_size,
            x_pixels_per_meter,
            y_pixels_per_meter,
            declared_colors,
            important_colors,
            stride,
            bitmap_size,
        })
    }

    /// Header for a freshly encoded `width` x `height` image.
    ///
    /// Pixel data starts right after the header; every size is recomputed.
    pub fn for_dimensions(width: u32, height: u32) -> Result<Self> {
        if width <= 1 || height <= 1 {
            return Err(BitmapError::DimensionsTooSmall { width, height });
        }
        let too_large = BitmapError::DimensionsTooLarge { width, height };
        if width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(too_large);
        }
        let (stride, bitmap_size) = pixel_array_size(width, height).ok_or(too_large)?;
        let declared_bitmap_size = u32::try_from(bitmap_size)
            .map_err(|_| BitmapError::DimensionsTooLarge { width, height })?;
        let file_size = declared_bitmap_size
            .checked_add(HEADER_SIZE as u32)
            .ok_or(BitmapError::DimensionsTooLarge { width, height })?;

        Ok(Self {
            file_size,
            pixel_offset: HEADER_SIZE as u32,
            dib_header_size: MIN_DIB_HEADER_SIZE,
            width,
            height,
            planes: 1,
            bpp: BITS_PER_PIXEL,
            compression: 0,
            declared_bitmap_size,
            x_pixels_per_meter: PIXELS_PER_METER,
            y_pixels_per_meter: PIXELS_PER_METER,
            declared_colors: 0,
            important_colors: 0,
            stride,
            bitmap_size,
        })
    }

    /// Serialize as a 54-byte header. The DIB header is always written as
    /// a plain 40-byte BITMAPINFOHEADER.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        let mut put = |off: usize, bytes: &[u8]| out[off..off + bytes.len()].copy_from_slice(bytes);

        // File header (14 bytes)
        put(0, &MAGIC.to_le_bytes());
        put(2, &self.file_size.to_le_bytes());
        // 6..10 reserved, left zero
        put(10, &self.pixel_offset.to_le_bytes());

        // BITMAPINFOHEADER (40 bytes)
        put(14, &MIN_DIB_HEADER_SIZE.to_le_bytes());
        put(18, &(self.width as i32).to_le_bytes());
        put(22, &(self.height as i32).to_le_bytes()); // positive = bottom-up
        put(26, &self.planes.to_le_bytes());
        put(28, &self.bpp.to_le_bytes());
        put(30, &self.compression.to_le_bytes());
        put(34, &self.declared_bitmap_size.to_le_bytes());
        put(38, &self.x_pixels_per_meter.to_le_bytes());
        put(42, &self.y_pixels_per_meter.to_le_bytes());
        put(46, &self.declared_colors.to_le_bytes());
        put(50, &self.important_colors.to_le_bytes());
        out
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bpp(&self) -> u16 {
        self.bpp
    }

    /// Bytes per stored row, padding included.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// File size as declared in the header (not checked against the file).
    pub fn file_size(&self) -> u32 {
        self.file_size
    }

    /// Byte offset of the pixel array.
    pub fn pixel_offset(&self) -> u32 {
        self.pixel_offset
    }

    pub fn dib_header_size(&self) -> u32 {
        self.dib_header_size
    }

    /// Pixel array size: the declared value, or the computed one when the
    /// header leaves it at 0. The two always agree otherwise.
    pub fn bitmap_size(&self) -> usize {
        self.bitmap_size
    }

    /// Colors representable by the image.
    pub fn color_count(&self) -> u64 {
        if self.declared_colors == 0 {
            1u64 << self.bpp
        } else {
            u64::from(self.declared_colors)
        }
    }

    pub fn important_colors(&self) -> u32 {
        self.important_colors
    }

    /// Pixels per meter, `(x, y)`.
    pub fn resolution(&self) -> (u32, u32) {
        (self.x_pixels_per_meter, self.y_pixels_per_meter)
    }
}
