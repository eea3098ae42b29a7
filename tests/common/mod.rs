//! Hand-built BMP fixtures, independent of the crate's own encoder.

#![allow(dead_code)]

use segbmp::Color;

pub const fn bgr(r: u8, g: u8, b: u8) -> Color {
    Color { b, g, r }
}

/// Serialize top-down `rows` as a 24-bit bottom-up BMP.
pub fn build_bmp(rows: &[Vec<Color>]) -> Vec<u8> {
    build_bmp_with(rows, |_| {})
}

/// Like [`build_bmp`], letting `patch` edit the 54 header bytes.
pub fn build_bmp_with(rows: &[Vec<Color>], patch: impl FnOnce(&mut [u8])) -> Vec<u8> {
    let height = rows.len();
    let width = rows.first().map_or(0, Vec::len);
    let stride = (width * 3).div_ceil(4) * 4;
    let data_size = stride * height;

    let mut out = Vec::with_capacity(54 + data_size);
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&((54 + data_size) as u32).to_le_bytes());
    out.extend_from_slice(&[0u8; 4]);
    out.extend_from_slice(&54u32.to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&(width as i32).to_le_bytes());
    out.extend_from_slice(&(height as i32).to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&24u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&(data_size as u32).to_le_bytes());
    out.extend_from_slice(&2835u32.to_le_bytes());
    out.extend_from_slice(&2835u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    patch(&mut out[..54]);

    for row in rows.iter().rev() {
        assert_eq!(row.len(), width);
        for px in row {
            out.extend_from_slice(&[px.b, px.g, px.r]);
        }
        out.extend(std::iter::repeat_n(0u8, stride - width * 3));
    }
    out
}

/// Write `bytes` to `name` inside `dir`.
pub fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
