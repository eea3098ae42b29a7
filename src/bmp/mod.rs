//! Uncompressed 24-bit BMP: header, streaming decoder, and run encoder.

mod decode;
mod encode;
mod header;

pub use decode::BitmapDecoder;
pub use encode::{BitmapEncoder, encode_to_vec};
pub use header::BitmapHeader;

/// `"BM"` read as a little-endian u16.
pub const MAGIC: u16 = 0x4D42;

/// File header (14 bytes) plus BITMAPINFOHEADER (40 bytes).
pub const HEADER_SIZE: usize = 54;

/// Smallest DIB header we can read all fields from.
pub const MIN_DIB_HEADER_SIZE: u32 = 40;

pub const BITS_PER_PIXEL: u16 = 24;

pub(crate) const BYTES_PER_PIXEL: usize = 3;

/// Stored row length in bytes: `width` pixels padded to a 32-bit boundary.
pub fn row_stride(width: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(BITS_PER_PIXEL as usize)?
        .checked_add(31)
        .map(|bits| 4 * (bits / 32))
}

/// `(stride, stride * height)`, or `None` on overflow.
pub(crate) fn pixel_array_size(width: u32, height: u32) -> Option<(usize, usize)> {
    let stride = row_stride(width)?;
    let total = stride.checked_mul(height as usize)?;
    Some((stride, total))
}
