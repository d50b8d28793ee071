//! Simulation constants and the per-session `SurfConfig`.
//!
//! Constants are physical or structural and never change at runtime. Everything a
//! session may tune lives in `SurfConfig`, supplied once at construction. Every
//! config struct uses `#[serde(default)]` so partially written config files load
//! with the missing fields filled in.

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Gravitational acceleration used by the shallow-water speed `sqrt(g * depth)`.
pub const GRAVITY: f32 = 9.81;

/// Height-to-depth ratio at which a wave breaks.
pub const DEFAULT_BREAKING_INDEX: f32 = 0.78;

/// Floor applied to depths before they divide or feed a root.
pub const MIN_DEPTH: f32 = 0.05;

/// Slowest a wave may travel relative to deep water, so it always reaches shore.
pub const MIN_SPEED_RATIO: f32 = 0.2;

/// Number of evenly spaced x-samples in `Wave::progress_per_x`.
pub const REFRACTION_SAMPLES: usize = 32;

/// Integration steps along the travel direction used by refraction.
pub const REFRACTION_STEPS: usize = 48;

/// Extra progress past the shore a wave stays alive for so its foam can finish.
pub const VISUAL_BUFFER: f32 = 0.2;

/// Default energy grid resolution.
pub const DEFAULT_GRID_WIDTH: usize = 60;
pub const DEFAULT_GRID_HEIGHT: usize = 40;

/// Default foam intensity grid resolution.
pub const DEFAULT_FOAM_GRID_WIDTH: usize = 48;
pub const DEFAULT_FOAM_GRID_HEIGHT: usize = 32;

/// Default time for a wave to travel from horizon to shore.
pub const DEFAULT_TRAVEL_DURATION_MS: f64 = 14_000.0;

// =============================================================================
// Depth damping
// =============================================================================

/// Depth-dependent energy damping: `coefficient * (1 - depth/deep)^exponent * dt`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthDamping {
    pub coefficient: f32,
    /// Higher exponents concentrate the fade close to shore.
    pub exponent: f32,
}

impl Default for DepthDamping {
    fn default() -> Self {
        Self {
            coefficient: 0.6,
            exponent: 2.0,
        }
    }
}

// =============================================================================
// Swell sources
// =============================================================================

/// A periodic energy source injected at the horizon. Read-only during a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwellSource {
    pub amplitude: f32,
    /// Period in seconds.
    pub period: f32,
    /// Phase offset in radians.
    pub phase: f32,
}

impl Default for SwellSource {
    fn default() -> Self {
        Self {
            amplitude: 0.3,
            period: 12.0,
            phase: 0.0,
        }
    }
}

fn default_swells() -> Vec<SwellSource> {
    vec![
        SwellSource {
            amplitude: 0.3,
            period: 12.0,
            phase: 0.0,
        },
        SwellSource {
            amplitude: 0.12,
            period: 7.5,
            phase: 1.3,
        },
    ]
}

// =============================================================================
// Set / lull timing
// =============================================================================

/// Timing and amplitude ranges for the set/lull state machine. Times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetLullConfig {
    pub wave_period_s: f32,
    pub wave_period_variation_s: f32,
    pub lull_duration_s: f32,
    pub lull_duration_variation_s: f32,
    pub min_set_waves: u32,
    pub max_set_waves: u32,
    pub set_amplitude_min: f32,
    pub set_amplitude_max: f32,
    pub lull_amplitude_min: f32,
    pub lull_amplitude_max: f32,
    /// Fraction of the way through a set where the envelope peaks.
    pub envelope_peak: f32,
    /// Set time cap, as a multiple of the longest possible wave spacing per wave.
    pub set_time_cap_factor: f32,
}

impl Default for SetLullConfig {
    fn default() -> Self {
        Self {
            wave_period_s: 15.0,
            wave_period_variation_s: 5.0,
            lull_duration_s: 30.0,
            lull_duration_variation_s: 5.0,
            min_set_waves: 4,
            max_set_waves: 8,
            set_amplitude_min: 0.6,
            set_amplitude_max: 1.2,
            lull_amplitude_min: 0.2,
            lull_amplitude_max: 0.4,
            envelope_peak: 0.4,
            set_time_cap_factor: 1.5,
        }
    }
}

// =============================================================================
// Foam
// =============================================================================

/// Which dispersion strategy turns foam rows into an intensity grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FoamStrategyKind {
    #[default]
    Blur,
    ExpandBounds,
    Radius,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoamConfig {
    pub grid_width: usize,
    pub grid_height: usize,
    /// Contour thresholds, lowest (outer halo) first.
    pub thresholds: Vec<f32>,
    /// Age at which a foam row's opacity reaches zero.
    pub fade_ms: f64,
    /// How long a cell's halo holds after its core last contributed.
    pub halo_hold_ms: f64,
    /// Halo decay once the hold expires, in intensity per second.
    pub halo_decay_per_s: f32,
    /// Blur passes for fresh foam.
    pub base_blur_passes: u32,
    /// Foam age per additional blur pass.
    pub blur_pass_interval_ms: f64,
    pub max_blur_passes: u32,
    /// Minimum spacing between foam rows deposited by one wave.
    pub deposit_interval_ms: f64,
    pub strategy: FoamStrategyKind,
}

impl Default for FoamConfig {
    fn default() -> Self {
        Self {
            grid_width: DEFAULT_FOAM_GRID_WIDTH,
            grid_height: DEFAULT_FOAM_GRID_HEIGHT,
            thresholds: vec![0.15, 0.3, 0.5],
            fade_ms: 8_000.0,
            halo_hold_ms: 2_000.0,
            halo_decay_per_s: 0.1,
            base_blur_passes: 1,
            blur_pass_interval_ms: 1_500.0,
            max_blur_passes: 5,
            deposit_interval_ms: 250.0,
            strategy: FoamStrategyKind::Blur,
        }
    }
}

impl FoamConfig {
    /// Blur passes for foam of the given age.
    pub fn blur_passes_for_age(&self, age_ms: f64) -> u32 {
        let extra = if self.blur_pass_interval_ms > 0.0 {
            (age_ms.max(0.0) / self.blur_pass_interval_ms) as u32
        } else {
            0
        };
        (self.base_blur_passes + extra).min(self.max_blur_passes.max(self.base_blur_passes))
    }
}

// =============================================================================
// Feature toggles
// =============================================================================

/// Performance short-circuits. Toggling only skips derived output; simulation
/// state advances identically either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    /// Extract foam contours each tick.
    pub contours: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self { contours: true }
    }
}

// =============================================================================
// SurfConfig
// =============================================================================

/// Session configuration, supplied once when the simulation is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfConfig {
    pub grid_width: usize,
    pub grid_height: usize,
    pub travel_duration_ms: f64,
    pub breaking_index: f32,
    pub damping: DepthDamping,
    pub swells: Vec<SwellSource>,
    pub set_lull: SetLullConfig,
    pub foam: FoamConfig,
    pub toggles: FeatureToggles,
    pub seed: u64,
}

impl Default for SurfConfig {
    fn default() -> Self {
        Self {
            grid_width: DEFAULT_GRID_WIDTH,
            grid_height: DEFAULT_GRID_HEIGHT,
            travel_duration_ms: DEFAULT_TRAVEL_DURATION_MS,
            breaking_index: DEFAULT_BREAKING_INDEX,
            damping: DepthDamping::default(),
            swells: default_swells(),
            set_lull: SetLullConfig::default(),
            foam: FoamConfig::default(),
            toggles: FeatureToggles::default(),
            seed: 42,
        }
    }
}

impl SurfConfig {
    /// Fails on non-positive grid dimensions. Every other field is clamped where
    /// it is used, so it cannot make the simulation misbehave.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(SimError::InvalidGridDimensions {
                what: "energy field",
                width: self.grid_width,
                height: self.grid_height,
            });
        }
        if self.foam.grid_width == 0 || self.foam.grid_height == 0 {
            return Err(SimError::InvalidGridDimensions {
                what: "foam intensity grid",
                width: self.foam.grid_width,
                height: self.foam.grid_height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SurfConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_grid_rejected() {
        let config = SurfConfig {
            grid_width: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidGridDimensions { width: 0, .. })
        ));
    }

    #[test]
    fn test_zero_foam_grid_rejected() {
        let mut config = SurfConfig::default();
        config.foam.grid_height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: SurfConfig =
            serde_json::from_str(r#"{ "grid_width": 80, "set_lull": { "min_set_waves": 5 } }"#)
                .expect("partial config should parse");
        assert_eq!(config.grid_width, 80);
        assert_eq!(config.grid_height, DEFAULT_GRID_HEIGHT);
        assert_eq!(config.set_lull.min_set_waves, 5);
        assert_eq!(config.set_lull.max_set_waves, 8);
        assert_eq!(config.foam.thresholds, vec![0.15, 0.3, 0.5]);
    }

    #[test]
    fn test_blur_passes_grow_with_age_and_cap() {
        let foam = FoamConfig::default();
        assert_eq!(foam.blur_passes_for_age(0.0), 1);
        assert_eq!(foam.blur_passes_for_age(1_600.0), 2);
        assert_eq!(foam.blur_passes_for_age(60_000.0), foam.max_blur_passes);
        assert_eq!(foam.blur_passes_for_age(-500.0), 1);
    }
}
