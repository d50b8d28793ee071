use serde::{Deserialize, Serialize};

use crate::config::FoamConfig;
use crate::error::SimError;

use super::intensity::IntensityGrid;

/// Slow-decaying per-cell floor under the outer foam ring.
///
/// While a cell's core intensity is non-zero the floor latches the highest
/// value seen and records the time. Once the core has been zero for longer
/// than the hold time, the floor decays linearly. The outer contour is drawn
/// from `max(core, floor)`, so it cannot shrink while its cells still carry foam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaloFloor {
    width: usize,
    height: usize,
    values: Vec<f32>,
    /// Game time (ms) each cell's core was last non-zero, if ever.
    last_contribution_ms: Vec<Option<f64>>,
}

impl HaloFloor {
    pub fn new(width: usize, height: usize) -> Result<Self, SimError> {
        if width == 0 || height == 0 {
            return Err(SimError::InvalidGridDimensions {
                what: "foam halo",
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            values: vec![0.0; width * height],
            last_contribution_ms: vec![None; width * height],
        })
    }

    /// Whether this floor has the shape of a `width` x `height` foam grid.
    pub fn fits(&self, width: usize, height: usize) -> bool {
        let cells = width * height;
        self.width == width
            && self.height == height
            && self.values.len() == cells
            && self.last_contribution_ms.len() == cells
    }

    /// Zero negative or non-finite floors and pull timestamps back to
    /// `game_time`. Used after loading persisted values.
    pub fn repair(&mut self, game_time: f64) {
        for v in &mut self.values {
            if !v.is_finite() || *v < 0.0 {
                *v = 0.0;
            }
        }
        for last in &mut self.last_contribution_ms {
            *last = match *last {
                Some(t) if t.is_finite() => Some(t.min(game_time)),
                _ => None,
            };
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.values[y.min(self.height - 1) * self.width + x.min(self.width - 1)]
    }

    pub fn is_clear(&self) -> bool {
        self.values.iter().all(|&v| v <= 0.0)
    }

    /// Fold this tick's core intensities into the floor.
    pub fn update(&mut self, core: &IntensityGrid, game_time: f64, dt: f32, config: &FoamConfig) {
        let decay = if dt > 0.0 {
            config.halo_decay_per_s.max(0.0) * dt
        } else {
            0.0
        };
        let cells = self
            .values
            .iter_mut()
            .zip(self.last_contribution_ms.iter_mut())
            .zip(core.values());
        for ((floor, last), &c) in cells {
            if c > 0.0 {
                if c > *floor {
                    *floor = c;
                }
                *last = Some(game_time);
            } else if *floor > 0.0 && last.is_none_or(|t| game_time - t > config.halo_hold_ms) {
                *floor = (*floor - decay).max(0.0);
            }
        }
    }

    /// Cell-wise `max(core, floor)`.
    pub fn combine(&self, core: &IntensityGrid) -> IntensityGrid {
        let mut out = core.clone();
        for (v, &floor) in out.values_mut().iter_mut().zip(&self.values) {
            if floor > *v {
                *v = floor;
            }
        }
        out
    }

    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
        self.last_contribution_ms
            .iter_mut()
            .for_each(|t| *t = None);
    }
}
