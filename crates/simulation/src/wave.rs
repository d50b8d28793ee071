//! Discrete wave objects.
//!
//! A wave's position is never stored: progress is always recomputed from
//! `game_time - spawn_time`, so it cannot drift. Refraction writes a per-x
//! progress profile that bends the crest over shoals. The wave list must be
//! reaped every tick with `get_active_waves` to stay bounded.

use serde::{Deserialize, Serialize};

use crate::bathymetry::{speed_ratio, Bathymetry};
use crate::config::{DEFAULT_BREAKING_INDEX, REFRACTION_SAMPLES, REFRACTION_STEPS, VISUAL_BUFFER};
use crate::grid_coords::{cell_to_normalized, lerp_cells};

/// Opaque tag distinguishing set waves from background (lull) waves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WaveType {
    Set,
    #[default]
    Background,
}

/// Hands out monotonically increasing wave ids. Owned by the simulation world.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveIdAllocator {
    next: u64,
}

impl WaveIdAllocator {
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next = self.next.saturating_add(1);
        id
    }

    /// True once no fresh id is left to hand out.
    pub fn is_exhausted(&self) -> bool {
        self.next == u64::MAX
    }

    /// Make sure future ids are above every id already in use.
    pub fn reserve_past(&mut self, used: u64) {
        self.next = self.next.max(used.saturating_add(1));
    }

    pub fn peek(&self) -> u64 {
        self.next
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    pub id: u64,
    /// Spawn time in milliseconds of game time.
    pub spawn_time: f64,
    /// Fixed at spawn.
    amplitude: f32,
    #[serde(default)]
    pub wave_type: WaveType,
    /// Progress at `REFRACTION_SAMPLES` evenly spaced x positions, written by
    /// `update_wave_refraction`. Empty until the first refraction pass.
    #[serde(default)]
    pub progress_per_x: Vec<f32>,
    /// Game time of the last foam row this wave deposited.
    #[serde(default)]
    pub last_foam_time: Option<f64>,
}

/// Build a wave with the next id. The amplitude cannot change afterwards.
pub fn create_wave(
    ids: &mut WaveIdAllocator,
    spawn_time: f64,
    amplitude: f32,
    wave_type: WaveType,
) -> Wave {
    Wave {
        id: ids.next_id(),
        spawn_time,
        amplitude: if amplitude.is_finite() {
            amplitude.max(0.0)
        } else {
            0.0
        },
        wave_type,
        progress_per_x: Vec::new(),
        last_foam_time: None,
    }
}

impl Wave {
    #[inline]
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Refracted progress at a normalized x, falling back to `nominal` before the
    /// first refraction pass.
    pub fn progress_at(&self, normalized_x: f32, nominal: f32) -> f32 {
        let n = self.progress_per_x.len();
        if n == 0 {
            return nominal;
        }
        let (i0, i1, t) = lerp_cells(normalized_x, n);
        self.progress_per_x[i0] * (1.0 - t) + self.progress_per_x[i1] * t
    }
}

/// Elapsed fraction of the travel, unclamped. Zero or negative travel times count
/// as already arrived.
fn raw_progress(spawn_time: f64, game_time: f64, travel_duration_ms: f64) -> f64 {
    if travel_duration_ms.is_nan() || travel_duration_ms <= 0.0 {
        return if game_time >= spawn_time {
            f64::INFINITY
        } else {
            0.0
        };
    }
    ((game_time - spawn_time) / travel_duration_ms).max(0.0)
}

/// `clamp((game_time - spawn_time) / travel_duration, 0, 1)`.
pub fn get_wave_progress(wave: &Wave, game_time: f64, travel_duration_ms: f64) -> f32 {
    let p = raw_progress(wave.spawn_time, game_time, travel_duration_ms);
    if p.is_nan() {
        0.0
    } else {
        p.min(1.0) as f32
    }
}

/// Recompute `progress_per_x` for the wave at `game_time`.
///
/// Each x-sample walks shoreward in `REFRACTION_STEPS` increments, spending the
/// elapsed time at the local speed `sqrt(g * depth)` relative to deep water.
/// Slower water over shoals holds that part of the crest back.
pub fn update_wave_refraction<B: Bathymetry + ?Sized>(
    wave: &mut Wave,
    game_time: f64,
    travel_duration_ms: f64,
    bathymetry: &B,
    deep_depth: f32,
) {
    let budget = raw_progress(wave.spawn_time, game_time, travel_duration_ms).min(2.0) as f32;
    let step = 1.0 / REFRACTION_STEPS as f32;

    wave.progress_per_x.resize(REFRACTION_SAMPLES, 0.0);
    for (i, slot) in wave.progress_per_x.iter_mut().enumerate() {
        let x = cell_to_normalized(i, REFRACTION_SAMPLES);
        let mut p = 0.0_f32;
        let mut remaining = budget;
        while p < 1.0 && remaining > 0.0 {
            let ratio = speed_ratio(bathymetry.clamped_depth(x, p), deep_depth);
            let cost = step / ratio;
            if cost <= remaining {
                p += step;
                remaining -= cost;
            } else {
                p += remaining * ratio;
                remaining = 0.0;
            }
        }
        *slot = p.min(1.0);
    }
}

/// Shared breaking test: `2 * height > index * depth`, depth clamped to >= 0.
#[inline]
pub fn exceeds_breaking_index(height: f32, depth: f32, breaking_index: f32) -> bool {
    2.0 * height > breaking_index * depth.max(0.0)
}

/// True iff `2 * amplitude > 0.78 * depth`.
pub fn is_wave_breaking(wave: &Wave, depth: f32) -> bool {
    exceeds_breaking_index(wave.amplitude, depth, DEFAULT_BREAKING_INDEX)
}

/// Grid-aware variant: the measured energy at the point replaces the nominal
/// amplitude.
pub fn is_wave_breaking_with_energy(_wave: &Wave, depth: f32, energy_at_point: f32) -> bool {
    exceeds_breaking_index(energy_at_point.abs(), depth, DEFAULT_BREAKING_INDEX)
}

/// Drop waves whose progress has passed `1 + VISUAL_BUFFER`. Must run every tick.
pub fn get_active_waves(waves: &mut Vec<Wave>, game_time: f64, travel_duration_ms: f64) {
    let limit = 1.0 + VISUAL_BUFFER as f64;
    waves.retain(|w| raw_progress(w.spawn_time, game_time, travel_duration_ms) <= limit);
}
