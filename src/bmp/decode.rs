//! Streaming 24-bit BMP decoder.
//!
//! The header is read and validated once at open. Pixel rows are then
//! streamed bottom-to-top through a single reusable buffer and handed to one
//! of two independent consumers: [`BitmapDecoder::for_each_row`] (raw pixel
//! bytes) or [`BitmapDecoder::for_each_run`] (same-color runs).

use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use enough::Stop;

use super::header::BitmapHeader;
use super::{BYTES_PER_PIXEL, HEADER_SIZE};
use crate::entity::{Color, ColorEntityMap};
use crate::error::{BitmapError, Result};
use crate::limits::Limits;
use crate::segments::{ColorSegmentIndex, Row};

pub(crate) fn io_error(path: &Path, action: String, err: io::Error) -> BitmapError {
    if err.kind() == ErrorKind::UnexpectedEof {
        BitmapError::UnexpectedEof {
            path: path.to_path_buf(),
            action,
        }
    } else {
        BitmapError::Io {
            path: path.to_path_buf(),
            action,
            source: err,
        }
    }
}

/// An open, validated 24-bit bitmap ready to stream its pixel rows.
#[derive(Debug)]
pub struct BitmapDecoder<R = BufReader<File>> {
    path: PathBuf,
    header: BitmapHeader,
    limits: Limits,
    reader: R,
}

impl BitmapDecoder<BufReader<File>> {
    /// Open `path` and validate its header.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_limits(path, &Limits::default())
    }

    pub fn open_with_limits(path: impl AsRef<Path>, limits: &Limits) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| BitmapError::Io {
            path: path.to_path_buf(),
            action: "opening file".into(),
            source: e,
        })?;
        Self::from_reader_with_limits(BufReader::new(file), path, limits)
    }
}

impl<R: Read + Seek> BitmapDecoder<R> {
    /// Validate the header of an already-open stream positioned at its
    /// start. `label` names the source in errors.
    pub fn from_reader(reader: R, label: impl Into<PathBuf>) -> Result<Self> {
        Self::from_reader_with_limits(reader, label, &Limits::default())
    }

    pub fn from_reader_with_limits(
        mut reader: R,
        label: impl Into<PathBuf>,
        limits: &Limits,
    ) -> Result<Self> {
        let path = label.into();

        let mut raw = [0u8; HEADER_SIZE];
        reader
            .read_exact(&mut raw)
            .map_err(|e| io_error(&path, "reading bitmap file header".into(), e))?;

        let header = BitmapHeader::parse(&raw, &path)?;
        limits.check(header.width(), header.height())?;

        tracing::debug!(
            path = %path.display(),
            width = header.width(),
            height = header.height(),
            stride = header.stride(),
            pixel_offset = header.pixel_offset(),
            "opened bitmap"
        );

        Ok(Self {
            path,
            header,
            limits: limits.clone(),
            reader,
        })
    }

    pub fn header(&self) -> &BitmapHeader {
        &self.header
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.header.width()
    }

    pub fn height(&self) -> u32 {
        self.header.height()
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Fail with `UnexpectedEof` unless the stream holds the whole pixel
    /// array. Runs before any buffer sized from the header is allocated.
    fn check_stream_length(&mut self) -> Result<()> {
        let len = self
            .reader
            .seek(SeekFrom::End(0))
            .map_err(|e| io_error(&self.path, "measuring stream length".into(), e))?;
        let needed = u64::from(self.header.pixel_offset()) + self.header.bitmap_size() as u64;
        if len < needed {
            return Err(BitmapError::UnexpectedEof {
                path: self.path.clone(),
                action: format!(
                    "checking pixel data ({needed} bytes needed, stream holds {len})"
                ),
            });
        }
        Ok(())
    }

    fn rows(&mut self) -> Result<RowStream<'_, R>> {
        self.check_stream_length()?;
        self.limits.check_memory(self.header.stride())?;

        let offset = self.header.pixel_offset();
        self.reader
            .seek(SeekFrom::Start(u64::from(offset)))
            .map_err(|e| {
                io_error(
                    &self.path,
                    format!("seeking to pixel data (byte offset 0x{offset:08X} / {offset})"),
                    e,
                )
            })?;

        Ok(RowStream {
            reader: &mut self.reader,
            path: &self.path,
            buf: vec![0u8; self.header.stride()],
            pixel_bytes: self.header.width() as usize * BYTES_PER_PIXEL,
            height: self.header.height(),
            next: 0,
        })
    }

    /// Stream every row's pixel bytes (BGR, padding stripped) as
    /// `f(y, pixels)`, bottom row first.
    pub fn for_each_row<F>(&mut self, stop: impl Stop, f: F) -> Result<()>
    where
        F: FnMut(u32, &[u8]) -> Result<()>,
    {
        let mut rows = self.rows()?;
        stream_rows(&mut rows, &stop, f)
    }

    /// Stream every maximal same-color run as `f(color, start_x, end_x, y)`.
    ///
    /// Rows arrive in strictly descending `y` (bottom row first); runs within
    /// a row in strictly ascending `x`, contiguous, covering `[0, width)`.
    /// `end_x` is exclusive.
    pub fn for_each_run<F>(&mut self, stop: impl Stop, f: F) -> Result<()>
    where
        F: FnMut(Color, u32, u32, u32) -> Result<()>,
    {
        let mut rows = self.rows()?;
        stream_runs(&mut rows, &stop, f)
    }

    /// Decode the whole image into a [`ColorSegmentIndex`] resolved against
    /// `color_map`. `description` labels stray-color errors.
    pub fn decode_index<'m>(
        &mut self,
        color_map: &'m ColorEntityMap,
        description: &str,
        stop: impl Stop,
    ) -> Result<ColorSegmentIndex<'m>> {
        let (width, height) = (self.width(), self.height());
        let limits = self.limits.clone();
        let index_bytes = (height as usize)
            .checked_mul(size_of::<Row>())
            .ok_or(BitmapError::DimensionsTooLarge { width, height })?;
        limits.check_memory(index_bytes)?;

        let mut rows = self.rows()?;
        let mut index =
            ColorSegmentIndex::new(width, height, color_map).with_description(description);
        let mut runs = 0u64;

        stream_runs(&mut rows, &stop, |color, start_x, end_x, y| {
            runs += 1;
            limits.check_runs(runs)?;
            index.add_run(color, start_x, end_x, y)
        })?;

        tracing::debug!(
            path = %self.path.display(),
            description = index.description(),
            runs,
            "built segment index"
        );
        Ok(index)
    }
}

/// Sequential reader over the stored rows, bottom-to-top.
struct RowStream<'a, R> {
    reader: &'a mut R,
    path: &'a Path,
    buf: Vec<u8>,
    pixel_bytes: usize,
    height: u32,
    next: u32,
}

impl<R: Read> RowStream<'_, R> {
    /// Next row as `(row number in file order, image y, pixel bytes)`.
    fn next_row(&mut self) -> Result<Option<(u32, u32, &[u8])>> {
        if self.next == self.height {
            return Ok(None);
        }
        let row = self.next;
        self.reader.read_exact(&mut self.buf).map_err(|e| {
            io_error(
                self.path,
                format!("reading scanline #{row} (bottom-to-top)"),
                e,
            )
        })?;
        self.next += 1;
        let y = self.height - 1 - row;
        Ok(Some((row, y, &self.buf[..self.pixel_bytes])))
    }
}

fn stream_rows<R, F>(rows: &mut RowStream<'_, R>, stop: &dyn Stop, mut f: F) -> Result<()>
where
    R: Read,
    F: FnMut(u32, &[u8]) -> Result<()>,
{
    while let Some((row, y, pixels)) = rows.next_row()? {
        if row % 16 == 0 {
            stop.check()?;
        }
        f(y, pixels)?;
    }
    Ok(())
}

fn stream_runs<R, F>(rows: &mut RowStream<'_, R>, stop: &dyn Stop, mut f: F) -> Result<()>
where
    R: Read,
    F: FnMut(Color, u32, u32, u32) -> Result<()>,
{
    while let Some((row, y, pixels)) = rows.next_row()? {
        if row % 16 == 0 {
            stop.check()?;
        }

        let mut px = pixels.chunks_exact(BYTES_PER_PIXEL);
        // Width is validated > 1, so every row has a first pixel.
        let Some(first) = px.next() else {
            continue;
        };
        let mut cur = first;
        let mut start_x = 0u32;

        for (x, p) in (1u32..).zip(px) {
            if p != cur {
                f(to_color(cur), start_x, x, y)?;
                cur = p;
                start_x = x;
            }
        }

        // The last run of a row never sees a color change.
        let width = (pixels.len() / BYTES_PER_PIXEL) as u32;
        f(to_color(cur), start_x, width, y)?;
    }
    Ok(())
}

#[inline]
fn to_color(px: &[u8]) -> Color {
    Color {
        b: px[0],
        g: px[1],
        r: px[2],
    }
}
