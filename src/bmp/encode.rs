//! BMP encoder: expands a segment index back into uncompressed 24-bit rows.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use enough::Stop;

use super::BYTES_PER_PIXEL;
use super::decode::io_error;
use super::header::BitmapHeader;
use crate::entity::EntityColorMap;
use crate::error::{BitmapError, Result};
use crate::segments::{ColorSegmentIndex, Row};

/// Encode `index` to an in-memory BMP file.
pub fn encode_to_vec(
    index: &ColorSegmentIndex<'_>,
    colors: &EntityColorMap,
    stop: impl Stop,
) -> Result<Vec<u8>> {
    let header = BitmapHeader::for_dimensions(index.width(), index.height())?;
    let mut out = Vec::with_capacity(header.file_size() as usize);
    out.extend_from_slice(&header.to_bytes());
    write_rows(index, colors, header.stride(), &stop, |_, row| {
        out.extend_from_slice(row);
        Ok(())
    })?;
    Ok(out)
}

/// Writes a segment index to a BMP file on disk.
#[derive(Debug)]
pub struct BitmapEncoder {
    path: PathBuf,
    out: BufWriter<File>,
}

impl BitmapEncoder {
    /// Create (or truncate) `path` for writing.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| BitmapError::Io {
            path: path.to_path_buf(),
            action: "opening file for writing".into(),
            source: e,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write header and pixel rows for `index`, which must be
    /// `width` x `height`.
    pub fn encode(
        &mut self,
        width: u32,
        height: u32,
        index: &ColorSegmentIndex<'_>,
        colors: &EntityColorMap,
        stop: impl Stop,
    ) -> Result<()> {
        if index.width() != width || index.height() != height {
            return Err(BitmapError::DimensionsMismatch {
                width,
                height,
                actual_width: index.width(),
                actual_height: index.height(),
            });
        }

        let header = BitmapHeader::for_dimensions(width, height)?;
        let path = &self.path;
        let out = &mut self.out;

        out.write_all(&header.to_bytes())
            .map_err(|e| io_error(path, "writing bitmap header".into(), e))?;

        write_rows(index, colors, header.stride(), &stop, |file_row, bytes| {
            out.write_all(bytes).map_err(|e| {
                io_error(
                    path,
                    format!("writing scanline #{file_row} (bottom-to-top)"),
                    e,
                )
            })
        })?;

        tracing::debug!(
            path = %path.display(),
            width,
            height,
            runs = index.run_count(),
            "encoded bitmap"
        );
        Ok(())
    }

    /// Flush buffered rows and close the file.
    pub fn finish(self) -> Result<()> {
        let Self { path, out } = self;
        let file = out.into_inner().map_err(|e| BitmapError::Io {
            path: path.clone(),
            action: "flushing file".into(),
            source: e.into_error(),
        })?;
        file.sync_all().map_err(|e| BitmapError::Io {
            path,
            action: "completing file write".into(),
            source: e,
        })
    }
}

/// Expand every row, bottom-to-top, and hand each padded row to `sink`
/// along with its file-order row number.
fn write_rows<F>(
    index: &ColorSegmentIndex<'_>,
    colors: &EntityColorMap,
    stride: usize,
    stop: &dyn Stop,
    mut sink: F,
) -> Result<()>
where
    F: FnMut(u32, &[u8]) -> Result<()>,
{
    let width = index.width();
    let mut buf = vec![0u8; stride];

    for (file_row, y) in (0..index.height()).rev().enumerate() {
        if file_row % 16 == 0 {
            stop.check()?;
        }
        fill_row(index.row(y), width, y, colors, &mut buf)?;
        tracing::trace!(y, runs = index.row(y).len(), "row expanded");
        sink(file_row as u32, &buf)?;
    }
    Ok(())
}

/// Paint `row`'s runs into `buf`. Padding past `width * 3` is never touched.
///
/// # Panics
///
/// If the runs do not exactly and contiguously cover `[0, width)`; a
/// well-formed index cannot produce such a row.
fn fill_row(
    row: &Row,
    width: u32,
    y: u32,
    colors: &EntityColorMap,
    buf: &mut [u8],
) -> Result<()> {
    let mut prev_end = 0u32;
    for run in row.runs() {
        assert!(
            run.end_x > prev_end && run.end_x <= width,
            "row {y}: run ending at {} does not continue from {prev_end} within width {width}",
            run.end_x
        );
        let color = colors
            .color_of(run.entity)
            .ok_or(BitmapError::UnmappedEntity(run.entity))?;
        let start = prev_end as usize * BYTES_PER_PIXEL;
        let end = run.end_x as usize * BYTES_PER_PIXEL;
        for px in buf[start..end].chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&[color.b, color.g, color.r]);
        }
        prev_end = run.end_x;
    }
    assert!(
        prev_end == width,
        "row {y}: runs cover [0, {prev_end}) but width is {width}"
    );
    Ok(())
}
