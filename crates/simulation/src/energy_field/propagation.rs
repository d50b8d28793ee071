//! Swell injection and the per-tick propagation step.

use crate::bathymetry::{speed_ratio, Bathymetry};
use crate::config::{DepthDamping, SwellSource, MIN_DEPTH};
use crate::grid_coords::cell_to_normalized;

use super::field::{EnergyField, HORIZON_ROW_WEIGHTS};

/// Height added per second per unit of swell amplitude.
const SWELL_FORCING_GAIN: f32 = 2.0;

/// Sideways spreading rate, in cells^2 per second.
const LATERAL_DIFFUSION: f32 = 0.6;

/// Upper bound on the explicit diffusion weight, keeps the pass stable.
const MAX_DIFFUSION_WEIGHT: f32 = 0.25;

/// Cap on shoaling growth within a single step.
const MAX_SHOAL_STEP: f32 = 1.5;

/// Add sinusoidal forcing for each swell to the horizon-row accumulators.
///
/// Purely additive: nothing downstream feeds back into the forcing. The
/// accumulated forcing lands in the grid on the next non-zero update.
pub fn inject_swells(field: &mut EnergyField, swells: &[SwellSource], dt: f32) {
    if dt.is_nan() || dt <= 0.0 {
        return;
    }

    let t = field.forcing_time_s;
    let mut forcing = 0.0_f32;
    for swell in swells {
        if swell.period <= 0.0 || !swell.amplitude.is_finite() {
            continue;
        }
        let omega = std::f64::consts::TAU / swell.period as f64;
        let phase = (omega * t) % std::f64::consts::TAU;
        forcing += swell.amplitude * (phase as f32 + swell.phase).sin();
    }
    let forcing = forcing * SWELL_FORCING_GAIN * dt;

    for (row, weight) in HORIZON_ROW_WEIGHTS.iter().enumerate() {
        if row >= field.height {
            break;
        }
        field.swell_accumulator[row] += forcing * weight;
    }
    field.forcing_time_s += dt as f64;
}

/// Advance the field by `dt` seconds. `dt <= 0` leaves the field untouched.
///
/// In deep water a crest crosses the grid in `travel_duration_ms`; elsewhere it
/// moves at `sqrt(g * depth)` relative to that. Heights grow by Green's law as
/// depth shrinks and lose `coefficient * (1 - depth/deep)^exponent * dt` of
/// their value each step. Dry cells (depth 0) hold no energy.
pub fn update_energy_field<B: Bathymetry + ?Sized>(
    field: &mut EnergyField,
    bathymetry: &B,
    dt: f32,
    travel_duration_ms: f64,
    damping: DepthDamping,
) {
    if dt.is_nan() || dt <= 0.0 {
        return;
    }

    let w = field.width;
    let h = field.height;

    // --- Step 1: flush pending swell forcing ---
    for y in 0..h {
        let pending = field.swell_accumulator[y];
        if pending != 0.0 {
            let start = y * w;
            for v in &mut field.heights[start..start + w] {
                *v += pending;
            }
            field.swell_accumulator[y] = 0.0;
        }
    }

    let deep = bathymetry.deep_depth().max(MIN_DEPTH);
    let travel_s = (travel_duration_ms / 1000.0).max(1e-3) as f32;
    let deep_rows_per_step = h.saturating_sub(1) as f32 / travel_s * dt;
    let coefficient = damping.coefficient.max(0.0);
    let exponent = damping.exponent.max(0.0);

    if field.scratch.len() != w * h {
        field.scratch = vec![0.0; w * h];
    }

    // --- Steps 2-4: advect, shoal, damp into scratch ---
    for y in 0..h {
        let progress = cell_to_normalized(y, h);
        for x in 0..w {
            let nx = cell_to_normalized(x, w);
            let idx = y * w + x;
            let depth = bathymetry.clamped_depth(nx, progress);
            if depth <= 0.0 {
                field.scratch[idx] = 0.0;
                continue;
            }

            let src_y = y as f32 - deep_rows_per_step * speed_ratio(depth, deep);
            let carried = sample_column(&field.heights, w, h, x, src_y);

            let src_progress = if h > 1 {
                src_y / (h - 1) as f32
            } else {
                0.0
            };
            let src_depth = bathymetry.clamped_depth(nx, src_progress).max(MIN_DEPTH);
            let shoal = (src_depth / depth.max(MIN_DEPTH))
                .powf(0.25)
                .min(MAX_SHOAL_STEP);

            let shallowness = (1.0 - depth / deep).clamp(0.0, 1.0);
            let loss = coefficient * shallowness.powf(exponent) * dt;
            let keep = (1.0 - loss).clamp(0.0, 1.0);

            field.scratch[idx] = carried * shoal * keep;
        }
    }

    // --- Step 5: lateral diffusion back into heights ---
    let k = (LATERAL_DIFFUSION * dt).min(MAX_DIFFUSION_WEIGHT);
    for y in 0..h {
        let row = y * w;
        for x in 0..w {
            let c = field.scratch[row + x];
            let left = if x > 0 { field.scratch[row + x - 1] } else { c };
            let right = if x + 1 < w {
                field.scratch[row + x + 1]
            } else {
                c
            };
            field.heights[row + x] = c + k * (left + right - 2.0 * c);
        }
    }
}

/// Linear sample down a column at a fractional row. Rows above the horizon are
/// open ocean with zero height, so a crest leaving row 0 fades in smoothly.
fn sample_column(heights: &[f32], w: usize, h: usize, x: usize, src_y: f32) -> f32 {
    if src_y <= -1.0 {
        return 0.0;
    }
    if src_y < 0.0 {
        return heights[x] * (src_y + 1.0);
    }
    let sy = src_y.min((h - 1) as f32);
    let y0 = sy.floor() as usize;
    let y1 = (y0 + 1).min(h - 1);
    let t = sy - y0 as f32;
    heights[y0 * w + x] * (1.0 - t) + heights[y1 * w + x] * t
}
