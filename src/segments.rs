//! Row-wise run-length index of entity segments.

use crate::entity::{Color, ColorEntityMap, Entity};
use crate::error::{Result, StrayColor};

const DEFAULT_DESCRIPTION: &str = "bitmap";

/// A maximal span of one entity within a row.
///
/// The span starts where the previous run in the row ends (or at 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    pub entity: Entity,
    /// One past the last pixel of the run.
    pub end_x: u32,
}

/// The runs of one image row, in ascending x.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    runs: Vec<Run>,
}

impl Row {
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Iterate `(entity, start_x, end_x)` with explicit start coordinates.
    pub fn spans(&self) -> impl Iterator<Item = (Entity, u32, u32)> + '_ {
        self.runs.iter().scan(0u32, |start, run| {
            let span = (run.entity, *start, run.end_x);
            *start = run.end_x;
            Some(span)
        })
    }

    /// Total pixels covered by the runs.
    pub fn covered(&self) -> u32 {
        self.runs.last().map_or(0, |r| r.end_x)
    }

    /// Entity at column `x`, if the row covers it.
    pub fn entity_at(&self, x: u32) -> Option<Entity> {
        let idx = self.runs.partition_point(|r| r.end_x <= x);
        self.runs.get(idx).map(|r| r.entity)
    }
}

/// Per-row run lists for a whole image, keyed by entity rather than color.
///
/// Borrows the [`ColorEntityMap`] it resolves against, so the map must
/// outlive the index.
#[derive(Debug, Clone)]
pub struct ColorSegmentIndex<'m> {
    width: u32,
    height: u32,
    rows: Vec<Row>,
    color_map: &'m ColorEntityMap,
    description: String,
}

impl<'m> ColorSegmentIndex<'m> {
    pub fn new(width: u32, height: u32, color_map: &'m ColorEntityMap) -> Self {
        Self {
            width,
            height,
            rows: vec![Row::default(); height as usize],
            color_map,
            description: DEFAULT_DESCRIPTION.into(),
        }
    }

    /// Set the image description used in stray-color errors
    /// (e.g. "provinces bitmap"). An empty string keeps the default.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        if !description.is_empty() {
            self.description = description;
        }
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn color_map(&self) -> &'m ColorEntityMap {
        self.color_map
    }

    /// Runs of row `y` (0 = top).
    ///
    /// # Panics
    ///
    /// If `y >= height`.
    pub fn row(&self, y: u32) -> &Row {
        &self.rows[y as usize]
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Total number of runs across all rows.
    pub fn run_count(&self) -> usize {
        self.rows.iter().map(Row::len).sum()
    }

    pub fn entity_at(&self, x: u32, y: u32) -> Option<Entity> {
        self.rows.get(y as usize)?.entity_at(x)
    }

    /// Resolve `color` and append the run `[start_x, end_x)` to row `y`.
    ///
    /// Runs within a row must arrive left to right and contiguous; the
    /// decoder guarantees this and no reordering is done here.
    ///
    /// # Panics
    ///
    /// If `end_x <= start_x`, `end_x > width`, or `y >= height`.
    pub fn add_run(&mut self, color: Color, start_x: u32, end_x: u32, y: u32) -> Result<()> {
        assert!(y < self.height, "row {y} out of range (height {})", self.height);
        assert!(
            end_x <= self.width,
            "run end {end_x} out of range (width {})",
            self.width
        );
        assert!(end_x > start_x, "empty run [{start_x}, {end_x})");

        match self.color_map.lookup(color) {
            Some(entity) => {
                self.rows[y as usize].runs.push(Run { entity, end_x });
                Ok(())
            }
            None => Err(StrayColor {
                color,
                start_x,
                end_x,
                y,
                description: self.description.clone(),
            }
            .into()),
        }
    }
}
