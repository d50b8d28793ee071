//! Dispersion strategies: how aging foam rows spread across the intensity grid.
//!
//! All strategies combine contributions with `max`, scale by row opacity, and
//! widen a row's footprint as it ages following the blur schedule in
//! `FoamConfig`. They differ in the spreading kernel.

use std::collections::BTreeMap;

use crate::config::{FoamConfig, FoamStrategyKind};
use crate::grid_coords::cell_index;

use super::blur::box_blur;
use super::intensity::{rasterize_row, segment_value, span_cells, IntensityGrid};
use super::rows::FoamRow;

pub trait FoamDispersion {
    fn name(&self) -> &'static str;

    /// Write the dispersed intensity of `rows` into `grid`, which arrives cleared.
    fn disperse(&self, rows: &[FoamRow], grid: &mut IntensityGrid, game_time: f64, config: &FoamConfig);
}

// =============================================================================
// Blur
// =============================================================================

/// Rasterize rows grouped by age, blur each group by its pass count, then
/// max-combine. Older foam gets more passes and spreads further.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlurDispersion;

impl FoamDispersion for BlurDispersion {
    fn name(&self) -> &'static str {
        "blur"
    }

    fn disperse(&self, rows: &[FoamRow], grid: &mut IntensityGrid, game_time: f64, config: &FoamConfig) {
        let mut groups: BTreeMap<u32, IntensityGrid> = BTreeMap::new();
        for row in rows {
            let passes = config.blur_passes_for_age(row.age_ms(game_time));
            let layer = groups.entry(passes).or_insert_with(|| {
                let mut layer = grid.clone();
                layer.clear();
                layer
            });
            rasterize_row(layer, row, game_time, config.fade_ms);
        }
        for (passes, mut layer) in groups {
            box_blur(&mut layer, passes);
            grid.max_assign(&layer);
        }
    }
}

// =============================================================================
// Expand bounds
// =============================================================================

/// Grow each span into a rectangle whose margin widens with age. Intensity falls
/// off linearly to half at the rectangle edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandBoundsDispersion;

impl FoamDispersion for ExpandBoundsDispersion {
    fn name(&self) -> &'static str {
        "expand_bounds"
    }

    fn disperse(&self, rows: &[FoamRow], grid: &mut IntensityGrid, game_time: f64, config: &FoamConfig) {
        let (w, h) = (grid.width(), grid.height());
        for row in rows {
            let opacity = row.opacity(game_time, config.fade_ms);
            if opacity <= 0.0 {
                continue;
            }
            let margin = config.blur_passes_for_age(row.age_ms(game_time)) as usize;
            let cy = cell_index(row.progress, h);
            for seg in &row.segments {
                let value = segment_value(seg.intensity, opacity);
                if value <= 0.0 {
                    continue;
                }
                let (x0, x1) = span_cells(seg, w);
                let (ex0, ex1) = (x0.saturating_sub(margin), (x1 + margin).min(w - 1));
                let (ey0, ey1) = (cy.saturating_sub(margin), (cy + margin).min(h - 1));
                for y in ey0..=ey1 {
                    for x in ex0..=ex1 {
                        let dx = x0.saturating_sub(x).max(x.saturating_sub(x1));
                        let dy = cy.abs_diff(y);
                        let d = dx.max(dy) as f32;
                        let falloff = 1.0 - 0.5 * d / (margin as f32 + 1.0);
                        grid.raise(x, y, value * falloff);
                    }
                }
            }
        }
    }
}

// =============================================================================
// Radius
// =============================================================================

/// Stamp a round kernel around every cell of each span. The radius grows with
/// age and intensity falls off linearly with distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RadiusDispersion;

impl FoamDispersion for RadiusDispersion {
    fn name(&self) -> &'static str {
        "radius"
    }

    fn disperse(&self, rows: &[FoamRow], grid: &mut IntensityGrid, game_time: f64, config: &FoamConfig) {
        let (w, h) = (grid.width(), grid.height());
        for row in rows {
            let opacity = row.opacity(game_time, config.fade_ms);
            if opacity <= 0.0 {
                continue;
            }
            let radius = config.blur_passes_for_age(row.age_ms(game_time)) as usize;
            let reach = radius as f32 + 1.0;
            let cy = cell_index(row.progress, h);
            for seg in &row.segments {
                let value = segment_value(seg.intensity, opacity);
                if value <= 0.0 {
                    continue;
                }
                let (x0, x1) = span_cells(seg, w);
                for y in cy.saturating_sub(radius)..=(cy + radius).min(h - 1) {
                    for x in x0.saturating_sub(radius)..=(x1 + radius).min(w - 1) {
                        // Distance to the nearest cell of the span.
                        let nearest_x = x.clamp(x0, x1);
                        let dx = x.abs_diff(nearest_x) as f32;
                        let dy = cy.abs_diff(y) as f32;
                        let d = (dx * dx + dy * dy).sqrt();
                        if d < reach {
                            grid.raise(x, y, value * (1.0 - d / reach));
                        }
                    }
                }
            }
        }
    }
}

// =============================================================================
// Selection
// =============================================================================

/// The configured strategy, dispatched by match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispersionStrategy {
    Blur(BlurDispersion),
    ExpandBounds(ExpandBoundsDispersion),
    Radius(RadiusDispersion),
}

impl Default for DispersionStrategy {
    fn default() -> Self {
        DispersionStrategy::Blur(BlurDispersion)
    }
}

impl From<FoamStrategyKind> for DispersionStrategy {
    fn from(kind: FoamStrategyKind) -> Self {
        match kind {
            FoamStrategyKind::Blur => DispersionStrategy::Blur(BlurDispersion),
            FoamStrategyKind::ExpandBounds => DispersionStrategy::ExpandBounds(ExpandBoundsDispersion),
            FoamStrategyKind::Radius => DispersionStrategy::Radius(RadiusDispersion),
        }
    }
}

impl FoamDispersion for DispersionStrategy {
    fn name(&self) -> &'static str {
        match self {
            DispersionStrategy::Blur(s) => s.name(),
            DispersionStrategy::ExpandBounds(s) => s.name(),
            DispersionStrategy::Radius(s) => s.name(),
        }
    }

    fn disperse(&self, rows: &[FoamRow], grid: &mut IntensityGrid, game_time: f64, config: &FoamConfig) {
        match self {
            DispersionStrategy::Blur(s) => s.disperse(rows, grid, game_time, config),
            DispersionStrategy::ExpandBounds(s) => s.disperse(rows, grid, game_time, config),
            DispersionStrategy::Radius(s) => s.disperse(rows, grid, game_time, config),
        }
    }
}
