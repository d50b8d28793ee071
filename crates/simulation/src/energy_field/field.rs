//! `EnergyField` storage, sampling, pulse injection and energy drain.

use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::grid_coords::{cell_index, lerp_cells, normalized_to_cell};

/// Rows at the horizon that receive swell forcing, with their weights.
pub(crate) const HORIZON_ROW_WEIGHTS: [f32; 2] = [1.0, 0.5];

/// Gaussian sigma, in cells, of a localized wave pulse.
const PULSE_SIGMA_CELLS: f32 = 1.2;

/// Cells beyond this many sigmas receive nothing from a pulse.
const PULSE_CUTOFF_SIGMAS: f32 = 3.0;

/// Grid of surface heights, row 0 = horizon, last row = shore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyField {
    pub(crate) width: usize,
    pub(crate) height: usize,
    /// Height per cell, row-major (`width * height`).
    pub(crate) heights: Vec<f32>,
    /// Swell forcing waiting to be applied to each row on the next update.
    pub(crate) swell_accumulator: Vec<f32>,
    /// Forcing clock in seconds, advanced only by `inject_swells`.
    pub(crate) forcing_time_s: f64,
    #[serde(skip)]
    pub(crate) scratch: Vec<f32>,
}

/// Build a zero-initialized field. Fails fast on a zero dimension.
pub fn create_energy_field(width: usize, height: usize) -> Result<EnergyField, SimError> {
    EnergyField::new(width, height)
}

impl EnergyField {
    pub fn new(width: usize, height: usize) -> Result<Self, SimError> {
        if width == 0 || height == 0 {
            return Err(SimError::InvalidGridDimensions {
                what: "energy field",
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            heights: vec![0.0; width * height],
            swell_accumulator: vec![0.0; height],
            forcing_time_s: 0.0,
            scratch: vec![0.0; width * height],
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
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Height of a cell; indices are clamped to the grid.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.heights[self.index(x, y)]
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    pub fn swell_accumulator(&self) -> &[f32] {
        &self.swell_accumulator
    }

    /// Bilinear height sample. Coordinates outside `[0, 1]` are clamped.
    pub fn get_height_at(&self, normalized_x: f32, progress: f32) -> f32 {
        let (x0, x1, tx) = lerp_cells(normalized_x, self.width);
        let (y0, y1, ty) = lerp_cells(progress, self.height);
        let top = self.get(x0, y0) * (1.0 - tx) + self.get(x1, y0) * tx;
        let bottom = self.get(x0, y1) * (1.0 - tx) + self.get(x1, y1) * tx;
        top * (1.0 - ty) + bottom * ty
    }

    /// Full-width pulse on the horizon rows, used when a discrete wave spawns.
    pub fn inject_wave_pulse(&mut self, amplitude: f32) {
        if !amplitude.is_finite() {
            return;
        }
        for (row, weight) in HORIZON_ROW_WEIGHTS.iter().enumerate() {
            if row >= self.height {
                break;
            }
            let start = row * self.width;
            for h in &mut self.heights[start..start + self.width] {
                *h += amplitude * weight;
            }
        }
    }

    /// Localized Gaussian pulse centred on a normalized position.
    pub fn inject_wave_pulse_at(&mut self, normalized_x: f32, progress: f32, amplitude: f32) {
        if !amplitude.is_finite() {
            return;
        }
        let cx = normalized_to_cell(normalized_x, self.width);
        let cy = normalized_to_cell(progress, self.height);
        let reach = PULSE_SIGMA_CELLS * PULSE_CUTOFF_SIGMAS;
        let two_sigma_sq = 2.0 * PULSE_SIGMA_CELLS * PULSE_SIGMA_CELLS;

        let x_min = (cx - reach).floor().max(0.0) as usize;
        let x_max = ((cx + reach).ceil() as usize).min(self.width - 1);
        let y_min = (cy - reach).floor().max(0.0) as usize;
        let y_max = ((cy + reach).ceil() as usize).min(self.height - 1);

        for y in y_min..=y_max {
            for x in x_min..=x_max {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let d2 = dx * dx + dy * dy;
                if d2 > reach * reach {
                    continue;
                }
                let idx = self.index(x, y);
                self.heights[idx] += amplitude * (-d2 / two_sigma_sq).exp();
            }
        }
    }

    /// Remove up to `amount` of energy at the nearest cell.
    ///
    /// Energy at a cell is its absolute height. The drain is clamped to what is
    /// available and the amount actually removed is returned; callers must use
    /// that value rather than the requested amount.
    pub fn drain_energy_at(&mut self, normalized_x: f32, progress: f32, amount: f32) -> f32 {
        if amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        let x = cell_index(normalized_x, self.width);
        let y = cell_index(progress, self.height);
        let idx = self.index(x, y);
        let h = self.heights[idx];
        let removed = amount.min(h.abs());
        self.heights[idx] = h - removed * h.signum();
        removed
    }

    /// Sum of squared heights; a proxy for total wave energy.
    pub fn total_energy(&self) -> f32 {
        self.heights.iter().map(|h| h * h).sum()
    }

    pub fn max_abs_height(&self) -> f32 {
        self.heights.iter().fold(0.0_f32, |m, h| m.max(h.abs()))
    }

    /// Zero heights and pending forcing. The forcing clock keeps running.
    pub fn clear(&mut self) {
        self.heights.iter_mut().for_each(|h| *h = 0.0);
        self.swell_accumulator.iter_mut().for_each(|a| *a = 0.0);
    }

    /// Fix up a field restored from a snapshot: buffers that do not match the
    /// dimensions are reset, non-finite values zeroed.
    pub fn repair(&mut self) {
        self.width = self.width.max(1);
        self.height = self.height.max(1);
        let cells = self.width * self.height;
        if self.heights.len() != cells {
            self.heights = vec![0.0; cells];
        }
        if self.swell_accumulator.len() != self.height {
            self.swell_accumulator = vec![0.0; self.height];
        }
        for h in self
            .heights
            .iter_mut()
            .chain(self.swell_accumulator.iter_mut())
        {
            if !h.is_finite() {
                *h = 0.0;
            }
        }
        if !self.forcing_time_s.is_finite() {
            self.forcing_time_s = 0.0;
        }
        self.scratch = vec![0.0; cells];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_rejects_zero_dimensions() {
        assert!(create_energy_field(0, 40).is_err());
        assert!(create_energy_field(60, 0).is_err());
    }

    #[test]
    fn test_create_is_zeroed() {
        let field = create_energy_field(60, 40).expect("valid dims");
        assert_eq!(field.heights().len(), 2400);
        assert!(field.heights().iter().all(|&h| h == 0.0));
        assert_eq!(field.swell_accumulator().len(), 40);
    }

    #[test]
    fn test_get_height_at_clamps_out_of_range() {
        let mut field = create_energy_field(4, 4).expect("valid dims");
        let idx = field.index(3, 3);
        field.heights[idx] = 2.0;
        assert!((field.get_height_at(5.0, 5.0) - 2.0).abs() < 1e-6);
        assert!((field.get_height_at(-1.0, -1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_get_height_at_bilinear_midpoint() {
        let mut field = create_energy_field(2, 2).expect("valid dims");
        field.heights = vec![0.0, 1.0, 2.0, 3.0];
        assert!((field.get_height_at(0.5, 0.5) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_pulse_at_is_local() {
        let mut field = create_energy_field(60, 40).expect("valid dims");
        field.inject_wave_pulse_at(0.5, 0.0, 1.0);
        assert!(field.get_height_at(0.5, 0.0) > 0.5);
        assert_eq!(field.get_height_at(0.0, 1.0), 0.0);
        assert_eq!(field.get_height_at(1.0, 0.5), 0.0);
    }

    #[test]
    fn test_full_width_pulse_hits_horizon_rows_only() {
        let mut field = create_energy_field(10, 10).expect("valid dims");
        field.inject_wave_pulse(0.8);
        assert!((field.get(3, 0) - 0.8).abs() < 1e-6);
        assert!((field.get(3, 1) - 0.4).abs() < 1e-6);
        assert_eq!(field.get(3, 2), 0.0);
    }

    #[test]
    fn test_drain_clamps_to_available_energy() {
        let mut field = create_energy_field(5, 5).expect("valid dims");
        let idx = field.index(2, 2);
        field.heights[idx] = 0.3;
        let removed = field.drain_energy_at(0.5, 0.5, 1.0);
        assert!((removed - 0.3).abs() < 1e-6, "removed {removed}");
        assert!(field.get(2, 2).abs() < 1e-6);
        assert_eq!(field.drain_energy_at(0.5, 0.5, 1.0), 0.0);
    }

    #[test]
    fn test_drain_preserves_sign_of_troughs() {
        let mut field = create_energy_field(5, 5).expect("valid dims");
        let idx = field.index(0, 0);
        field.heights[idx] = -0.5;
        let removed = field.drain_energy_at(0.0, 0.0, 0.2);
        assert!((removed - 0.2).abs() < 1e-6);
        assert!((field.get(0, 0) + 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_drain_rejects_negative_and_nan_amounts() {
        let mut field = create_energy_field(5, 5).expect("valid dims");
        field.inject_wave_pulse(1.0);
        assert_eq!(field.drain_energy_at(0.5, 0.0, -1.0), 0.0);
        assert_eq!(field.drain_energy_at(0.5, 0.0, f32::NAN), 0.0);
    }

    #[test]
    fn test_repair_resets_mismatched_buffers() {
        let mut field = create_energy_field(6, 4).expect("valid dims");
        field.heights.truncate(3);
        field.swell_accumulator.push(f32::NAN);
        field.repair();
        assert_eq!(field.heights().len(), 24);
        assert_eq!(field.swell_accumulator().len(), 4);
        assert_eq!(field.scratch.len(), 24);
    }
}
