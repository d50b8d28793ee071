use crate::config::FoamConfig;
use crate::error::SimError;

use super::halo::HaloFloor;
use super::intensity::IntensityGrid;
use super::marching_squares::{extract_line_segments, marching_squares, ContourLevel};
use super::rows::FoamRow;
use super::strategy::{DispersionStrategy, FoamDispersion};

/// Contours for every configured threshold, lowest (outer halo) first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourSet {
    pub levels: Vec<ContourLevel>,
}

impl ContourSet {
    pub fn outer(&self) -> Option<&ContourLevel> {
        self.levels.first()
    }

    pub fn inner(&self) -> &[ContourLevel] {
        self.levels.get(1..).unwrap_or(&[])
    }

    pub fn segment_count(&self) -> usize {
        self.levels.iter().map(|l| l.segments.len()).sum()
    }
}

/// Per-tick foam processing: disperse rows into the core grid, fold the core
/// into the halo floor, then extract contours at each threshold.
#[derive(Debug, Clone)]
pub struct FoamPipeline {
    strategy: DispersionStrategy,
    core: IntensityGrid,
    halo: HaloFloor,
    contours: ContourSet,
}

impl FoamPipeline {
    pub fn new(config: &FoamConfig) -> Result<Self, SimError> {
        Ok(Self {
            strategy: DispersionStrategy::from(config.strategy),
            core: IntensityGrid::new(config.grid_width, config.grid_height)?,
            halo: HaloFloor::new(config.grid_width, config.grid_height)?,
            contours: ContourSet::default(),
        })
    }

    pub fn strategy(&self) -> DispersionStrategy {
        self.strategy
    }

    pub fn core(&self) -> &IntensityGrid {
        &self.core
    }

    pub fn halo(&self) -> &HaloFloor {
        &self.halo
    }

    pub fn contours(&self) -> &ContourSet {
        &self.contours
    }

    /// Grid the outer ring is extracted from: `max(core, halo)`.
    pub fn outer_grid(&self) -> IntensityGrid {
        self.halo.combine(&self.core)
    }

    /// Advance to `game_time`. The grids always update; contour extraction is
    /// skipped when `extract_contours` is false, leaving the set empty.
    pub fn update(
        &mut self,
        rows: &[FoamRow],
        game_time: f64,
        dt: f32,
        config: &FoamConfig,
        extract_contours: bool,
    ) {
        self.core.clear();
        self.strategy.disperse(rows, &mut self.core, game_time, config);
        self.halo.update(&self.core, game_time, dt, config);

        self.contours.levels.clear();
        if !extract_contours {
            return;
        }

        let mut thresholds = config.thresholds.clone();
        thresholds.retain(|t| t.is_finite() && *t > 0.0);
        thresholds.sort_by(f32::total_cmp);

        let (w, h) = (self.core.width(), self.core.height());
        let outer = self.outer_grid();
        for (i, &threshold) in thresholds.iter().enumerate() {
            let source = if i == 0 { &outer } else { &self.core };
            let raw = marching_squares(source, threshold);
            self.contours.levels.push(ContourLevel {
                threshold,
                segments: extract_line_segments(&raw, w, h),
            });
        }
    }

    /// Replace the halo floor with persisted values. The core and contours are
    /// rebuilt on the next `update`. Returns false, leaving the pipeline
    /// reset, if `halo` does not match the foam grid.
    pub fn restore_halo(&mut self, halo: HaloFloor) -> bool {
        self.reset();
        if !halo.fits(self.core.width(), self.core.height()) {
            return false;
        }
        self.halo = halo;
        true
    }

    /// Drop all dispersed state.
    pub fn reset(&mut self) {
        self.core.clear();
        self.halo.clear();
        self.contours.levels.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FoamStrategyKind;
    use crate::foam::rows::FoamSegment;

    /// A foam patch deposited at t=0 and never refreshed.
    fn aging_pattern() -> Vec<FoamRow> {
        [0.45, 0.5, 0.55]
            .iter()
            .map(|&progress| FoamRow {
                progress,
                spawn_time: 0.0,
                segments: vec![FoamSegment::new(0.35, 0.65, 0.9)],
            })
            .collect()
    }

    fn run_until(kind: FoamStrategyKind, end_ms: f64) -> Vec<(f64, ContourSet)> {
        let config = FoamConfig {
            strategy: kind,
            ..Default::default()
        };
        let rows = aging_pattern();
        let mut pipeline = FoamPipeline::new(&config).expect("valid dims");
        let mut snapshots = Vec::new();
        let dt = 0.1_f32;
        let mut t = 0.0;
        while t <= end_ms + 1e-6 {
            pipeline.update(&rows, t, dt, &config, true);
            snapshots.push((t, pipeline.contours().clone()));
            t += dt as f64 * 1000.0;
        }
        snapshots
    }

    #[test]
    fn test_outer_ring_never_shrinks_while_foam_ages() {
        for kind in [
            FoamStrategyKind::Blur,
            FoamStrategyKind::ExpandBounds,
            FoamStrategyKind::Radius,
        ] {
            let snapshots = run_until(kind, 6_000.0);
            let first = snapshots[0].1.outer().and_then(|l| l.bounds()).expect("outer ring at t=0");
            let last = snapshots
                .last()
                .and_then(|(_, c)| c.outer())
                .and_then(|l| l.bounds())
                .expect("outer ring at t=6s");
            assert!(
                last.width() >= first.width() - 1e-5 && last.height() >= first.height() - 1e-5,
                "{kind:?}: outer ring shrank from {first:?} to {last:?}"
            );
            let mut prev = first;
            for (t, set) in &snapshots {
                let b = set.outer().and_then(|l| l.bounds()).expect("outer ring present");
                assert!(b.contains(&prev, 1e-5), "{kind:?}: outer ring shrank at {t}ms");
                prev = b;
            }
        }
    }

    #[test]
    fn test_inner_ring_may_contract_as_core_fades() {
        let snapshots = run_until(FoamStrategyKind::Blur, 6_000.0);
        let inner_at = |i: usize| {
            snapshots[i]
                .1
                .levels
                .last()
                .map(|l| l.segments.len())
                .unwrap_or(0)
        };
        let last = snapshots.len() - 1;
        assert!(inner_at(0) > 0, "dense core ring present when fresh");
        assert_eq!(inner_at(last), 0, "dense core ring gone after 6s of fading");
    }

    #[test]
    fn test_toggle_skips_contours_but_not_grids() {
        let config = FoamConfig::default();
        let rows = aging_pattern();
        let mut on = FoamPipeline::new(&config).expect("valid dims");
        let mut off = FoamPipeline::new(&config).expect("valid dims");
        for step in 0..20 {
            let t = step as f64 * 100.0;
            on.update(&rows, t, 0.1, &config, true);
            off.update(&rows, t, 0.1, &config, step >= 19);
        }
        assert_eq!(on.core(), off.core());
        assert_eq!(on.halo(), off.halo());
        assert_eq!(on.contours(), off.contours());
    }

    #[test]
    fn test_levels_follow_sorted_thresholds() {
        let config = FoamConfig {
            thresholds: vec![0.5, f32::NAN, 0.15, 0.3, -1.0],
            ..Default::default()
        };
        let mut pipeline = FoamPipeline::new(&config).expect("valid dims");
        pipeline.update(&aging_pattern(), 0.0, 0.1, &config, true);
        let thresholds: Vec<f32> = pipeline.contours().levels.iter().map(|l| l.threshold).collect();
        assert_eq!(thresholds, vec![0.15, 0.3, 0.5]);
        assert_eq!(pipeline.contours().inner().len(), 2);
    }
}
