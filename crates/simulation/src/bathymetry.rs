//! Bathymetry: pure depth lookup `depth(normalized_x, progress)`.
//!
//! Progress 0 is the horizon (deep water) and 1 is the shore. Implementations may
//! return negative values for dry sand; `clamped_depth` is what the simulation
//! reads, so negatives become 0 and out-of-range coordinates clamp to `[0, 1]`.

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use serde::{Deserialize, Serialize};

use crate::config::{GRAVITY, MIN_DEPTH, MIN_SPEED_RATIO};
use crate::grid_coords::{clamp_unit, lerp_cells};

/// Depth source consumed by the energy field and wave refraction.
pub trait Bathymetry {
    /// Raw depth at a normalized position. May be negative above the waterline.
    fn depth(&self, normalized_x: f32, progress: f32) -> f32;

    /// Depth of the open ocean at the horizon.
    fn deep_depth(&self) -> f32;

    /// Depth with clamped inputs; never negative, never NaN.
    fn clamped_depth(&self, normalized_x: f32, progress: f32) -> f32 {
        let d = self.depth(clamp_unit(normalized_x), clamp_unit(progress));
        if d.is_nan() {
            0.0
        } else {
            d.max(0.0)
        }
    }
}

/// Shallow-water wave speed `sqrt(g * depth)`.
#[inline]
pub fn shallow_water_speed(depth: f32) -> f32 {
    (GRAVITY * depth.max(0.0)).sqrt()
}

/// Local speed relative to deep water, clamped to `[MIN_SPEED_RATIO, 1]`.
#[inline]
pub fn speed_ratio(depth: f32, deep_depth: f32) -> f32 {
    let deep_speed = shallow_water_speed(deep_depth.max(MIN_DEPTH));
    (shallow_water_speed(depth) / deep_speed).clamp(MIN_SPEED_RATIO, 1.0)
}

// =============================================================================
// Flat
// =============================================================================

/// Constant depth everywhere. Useful for tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatBathymetry {
    pub depth: f32,
}

impl Bathymetry for FlatBathymetry {
    fn depth(&self, _normalized_x: f32, _progress: f32) -> f32 {
        self.depth
    }

    fn deep_depth(&self) -> f32 {
        self.depth
    }
}

// =============================================================================
// Closure adapter
// =============================================================================

/// Wraps a closure as a depth source.
pub struct DepthFn<F> {
    pub f: F,
    pub deep_depth: f32,
}

impl<F: Fn(f32, f32) -> f32> DepthFn<F> {
    pub fn new(deep_depth: f32, f: F) -> Self {
        Self { f, deep_depth }
    }
}

impl<F: Fn(f32, f32) -> f32> Bathymetry for DepthFn<F> {
    fn depth(&self, normalized_x: f32, progress: f32) -> f32 {
        (self.f)(normalized_x, progress)
    }

    fn deep_depth(&self) -> f32 {
        self.deep_depth
    }
}

// =============================================================================
// Shelf with sandbar and reef
// =============================================================================

/// Sloping shelf from `deep_depth` at the horizon to `shore_depth` at the beach,
/// with a shore-parallel sandbar and a reef that makes a point break.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShelfBathymetry {
    pub deep_depth: f32,
    /// Depth at progress 1. Negative means the beach is dry sand.
    pub shore_depth: f32,
    /// Shelf profile exponent; values above 1 keep water deep for longer.
    pub slope_exponent: f32,
    pub sandbar_progress: f32,
    pub sandbar_height: f32,
    pub sandbar_width: f32,
    pub reef_x: f32,
    pub reef_progress: f32,
    pub reef_height: f32,
    pub reef_radius: f32,
}

impl Default for ShelfBathymetry {
    fn default() -> Self {
        Self {
            deep_depth: 10.0,
            shore_depth: -0.5,
            slope_exponent: 1.6,
            sandbar_progress: 0.72,
            sandbar_height: 1.2,
            sandbar_width: 0.06,
            reef_x: 0.3,
            reef_progress: 0.55,
            reef_height: 3.5,
            reef_radius: 0.15,
        }
    }
}

impl Bathymetry for ShelfBathymetry {
    fn depth(&self, normalized_x: f32, progress: f32) -> f32 {
        let shelf = self.deep_depth
            + (self.shore_depth - self.deep_depth) * progress.powf(self.slope_exponent.max(0.1));

        let sandbar = if self.sandbar_width > 0.0 {
            let d = (progress - self.sandbar_progress) / self.sandbar_width;
            self.sandbar_height * (-d * d).exp()
        } else {
            0.0
        };

        let reef = if self.reef_radius > 0.0 {
            let dx = normalized_x - self.reef_x;
            let dy = progress - self.reef_progress;
            let r2 = (dx * dx + dy * dy) / (self.reef_radius * self.reef_radius);
            self.reef_height * (-r2).exp()
        } else {
            0.0
        };

        shelf - sandbar - reef
    }

    fn deep_depth(&self) -> f32 {
        self.deep_depth
    }
}

// =============================================================================
// Noise-perturbed shelf
// =============================================================================

/// Resolution of the precomputed perturbation table.
const NOISE_TABLE_SIZE: usize = 64;

/// A `ShelfBathymetry` with deterministic seabed irregularity.
///
/// The noise is sampled once into a table at construction and looked up
/// bilinearly, so `depth` stays cheap and pure. The perturbation fades out
/// towards the horizon so `deep_depth` stays exact at progress 0.
#[derive(Debug, Clone)]
pub struct NoisyBathymetry {
    pub base: ShelfBathymetry,
    pub amplitude: f32,
    table: Vec<f32>,
}

impl NoisyBathymetry {
    pub fn new(base: ShelfBathymetry, seed: i32, amplitude: f32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(0.08));
        noise.set_fractal_type(Some(FractalType::FBm));
        noise.set_fractal_octaves(Some(3));
        noise.set_fractal_gain(Some(0.5));
        noise.set_fractal_lacunarity(Some(2.0));

        let mut table = Vec::with_capacity(NOISE_TABLE_SIZE * NOISE_TABLE_SIZE);
        for y in 0..NOISE_TABLE_SIZE {
            for x in 0..NOISE_TABLE_SIZE {
                table.push(noise.get_noise_2d(x as f32, y as f32));
            }
        }

        Self {
            base,
            amplitude,
            table,
        }
    }

    fn perturbation(&self, normalized_x: f32, progress: f32) -> f32 {
        let (x0, x1, tx) = lerp_cells(normalized_x, NOISE_TABLE_SIZE);
        let (y0, y1, ty) = lerp_cells(progress, NOISE_TABLE_SIZE);
        let at = |x: usize, y: usize| self.table[y * NOISE_TABLE_SIZE + x];
        let top = at(x0, y0) * (1.0 - tx) + at(x1, y0) * tx;
        let bottom = at(x0, y1) * (1.0 - tx) + at(x1, y1) * tx;
        top * (1.0 - ty) + bottom * ty
    }
}

impl Bathymetry for NoisyBathymetry {
    fn depth(&self, normalized_x: f32, progress: f32) -> f32 {
        let x = clamp_unit(normalized_x);
        let p = clamp_unit(progress);
        self.base.depth(x, p) + self.amplitude * p * self.perturbation(x, p)
    }

    fn deep_depth(&self) -> f32 {
        self.base.deep_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_depth_never_negative() {
        let shelf = ShelfBathymetry::default();
        // The default beach is dry at the shore line.
        assert!(shelf.depth(0.9, 1.0) < 0.0);
        assert_eq!(shelf.clamped_depth(0.9, 1.0), 0.0);
    }

    #[test]
    fn test_clamped_depth_clamps_coordinates() {
        let bathy = DepthFn::new(5.0, |x, p| x * 10.0 + p);
        assert!((bathy.clamped_depth(2.0, 3.0) - 11.0).abs() < 1e-6);
        assert!((bathy.clamped_depth(-1.0, -1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_clamped_depth_maps_nan_to_zero() {
        let bathy = DepthFn::new(5.0, |_, _| f32::NAN);
        assert_eq!(bathy.clamped_depth(0.5, 0.5), 0.0);
    }

    #[test]
    fn test_shelf_is_deep_at_horizon() {
        let shelf = ShelfBathymetry::default();
        let d = shelf.depth(0.9, 0.0);
        assert!(
            (d - shelf.deep_depth).abs() < 0.05,
            "horizon depth should be ~deep_depth, got {d}"
        );
    }

    #[test]
    fn test_reef_is_shallower_than_open_shelf() {
        let shelf = ShelfBathymetry::default();
        let on_reef = shelf.depth(shelf.reef_x, shelf.reef_progress);
        let off_reef = shelf.depth(0.9, shelf.reef_progress);
        assert!(
            on_reef < off_reef - 1.0,
            "reef {on_reef} should be well above open shelf {off_reef}"
        );
    }

    #[test]
    fn test_speed_ratio_bounds() {
        assert!((speed_ratio(10.0, 10.0) - 1.0).abs() < 1e-6);
        assert!((speed_ratio(2.5, 10.0) - 0.5).abs() < 1e-4);
        assert_eq!(speed_ratio(0.0, 10.0), MIN_SPEED_RATIO);
        assert_eq!(speed_ratio(50.0, 10.0), 1.0);
    }

    #[test]
    fn test_noisy_bathymetry_is_deterministic() {
        let a = NoisyBathymetry::new(ShelfBathymetry::default(), 7, 0.8);
        let b = NoisyBathymetry::new(ShelfBathymetry::default(), 7, 0.8);
        for i in 0..20 {
            let x = i as f32 / 19.0;
            assert_eq!(a.depth(x, 0.6).to_bits(), b.depth(x, 0.6).to_bits());
        }
    }

    #[test]
    fn test_noisy_bathymetry_exact_at_horizon() {
        let noisy = NoisyBathymetry::new(ShelfBathymetry::default(), 3, 2.0);
        let base = ShelfBathymetry::default();
        assert_eq!(noisy.depth(0.4, 0.0), base.depth(0.4, 0.0));
    }
}
