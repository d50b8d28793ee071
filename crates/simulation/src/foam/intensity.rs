use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::grid_coords::cell_index;

use super::rows::{FoamRow, FoamSegment};

/// Foam intensity per cell, in `[0, 1]`. Row 0 is the horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntensityGrid {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl IntensityGrid {
    pub fn new(width: usize, height: usize) -> Result<Self, SimError> {
        if width == 0 || height == 0 {
            return Err(SimError::InvalidGridDimensions {
                what: "foam intensity grid",
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            values: vec![0.0; width * height],
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y.min(self.height - 1) * self.width + x.min(self.width - 1)
    }

    /// Cell value, with indices clamped into the grid.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        let idx = self.index(x, y);
        self.values[idx] = value;
    }

    /// Raise a cell to `value` if it is higher. Never sums.
    #[inline]
    pub fn raise(&mut self, x: usize, y: usize, value: f32) {
        let idx = self.index(x, y);
        if value > self.values[idx] {
            self.values[idx] = value;
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
    }

    /// Cell-wise max with another grid of the same size.
    pub fn max_assign(&mut self, other: &IntensityGrid) {
        for (a, &b) in self.values.iter_mut().zip(&other.values) {
            if b > *a {
                *a = b;
            }
        }
    }

    pub fn max_value(&self) -> f32 {
        self.values.iter().copied().fold(0.0, f32::max)
    }
}

/// Opacity-weighted intensity of one segment at `game_time`, in `[0, 1]`.
#[inline]
pub(crate) fn segment_value(intensity: f32, opacity: f32) -> f32 {
    (intensity * opacity).clamp(0.0, 1.0)
}

/// First and last cell covered by a segment on an axis of `width` cells.
#[inline]
pub(crate) fn span_cells(seg: &FoamSegment, width: usize) -> (usize, usize) {
    let a = cell_index(seg.start_x, width);
    let b = cell_index(seg.end_x, width);
    (a.min(b), a.max(b))
}

/// Rasterize a row's segments into `grid` with `max`, scaled by opacity.
pub(crate) fn rasterize_row(grid: &mut IntensityGrid, row: &FoamRow, game_time: f64, fade_ms: f64) {
    let opacity = row.opacity(game_time, fade_ms);
    if opacity <= 0.0 {
        return;
    }
    let y = cell_index(row.progress, grid.height);
    for seg in &row.segments {
        let value = segment_value(seg.intensity, opacity);
        if value <= 0.0 {
            continue;
        }
        let (x0, x1) = span_cells(seg, grid.width);
        for x in x0..=x1 {
            grid.raise(x, y, value);
        }
    }
}

/// Rasterize every row into a fresh `width x height` grid.
///
/// Overlapping spans combine with `max`, so values never exceed 1.
pub fn build_intensity_grid(
    rows: &[FoamRow],
    width: usize,
    height: usize,
    game_time: f64,
    fade_ms: f64,
) -> Result<IntensityGrid, SimError> {
    let mut grid = IntensityGrid::new(width, height)?;
    for row in rows {
        rasterize_row(&mut grid, row, game_time, fade_ms);
    }
    Ok(grid)
}
