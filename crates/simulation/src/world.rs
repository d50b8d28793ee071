//! `SimulationWorld`: the single owner of all mutable simulation state.

use bevy::log::info;
use rand::Rng;

use crate::bathymetry::Bathymetry;
use crate::config::SurfConfig;
use crate::energy_field::{create_energy_field, EnergyField};
use crate::error::SimError;
use crate::events::{reduce, SimEvent};
use crate::foam::{ContourSet, FoamPipeline, FoamRow};
use crate::set_lull::{self, SetLullState};
use crate::wave::{get_wave_progress, Wave, WaveIdAllocator};

/// Energy field, set/lull state, live waves and foam for one session.
///
/// Nothing here is global: two worlds built from the same config and driven
/// with the same `(game_time, dt, rng)` sequence stay bit-identical.
#[derive(Debug, Clone)]
pub struct SimulationWorld {
    pub(crate) config: SurfConfig,
    pub(crate) field: EnergyField,
    pub(crate) set_lull: SetLullState,
    pub(crate) waves: Vec<Wave>,
    pub(crate) wave_ids: WaveIdAllocator,
    pub(crate) foam_rows: Vec<FoamRow>,
    pub(crate) foam: FoamPipeline,
    /// Game time (ms) of the last background update.
    pub(crate) game_time_ms: f64,
}

/// Sessions open with a lull of the configured nominal length.
fn initial_lull(config: &SurfConfig) -> SetLullState {
    SetLullState::new_lull(
        0.0,
        config.set_lull.lull_duration_s as f64 * 1000.0,
        config.set_lull.wave_period_s as f64 * 1000.0,
    )
}

impl SimulationWorld {
    /// Build a world at game time 0. Fails only on invalid grid dimensions.
    pub fn new(config: SurfConfig) -> Result<Self, SimError> {
        config.validate()?;
        let field = create_energy_field(config.grid_width, config.grid_height)?;
        let foam = FoamPipeline::new(&config.foam)?;
        let set_lull = initial_lull(&config);
        info!(
            "Surf simulation: {}x{} energy field, {}x{} foam grid, {:.0}ms travel",
            config.grid_width,
            config.grid_height,
            config.foam.grid_width,
            config.foam.grid_height,
            config.travel_duration_ms
        );
        Ok(Self {
            config,
            field,
            set_lull,
            waves: Vec::new(),
            wave_ids: WaveIdAllocator::default(),
            foam_rows: Vec::new(),
            foam,
            game_time_ms: 0.0,
        })
    }

    /// Advance to `game_time` (ms) by `dt` (s). Returns the events applied, in
    /// order: `SetLullUpdate`, optional `WaveSpawn`, `WavesUpdate`,
    /// `BackgroundUpdate`.
    pub fn tick<B: Bathymetry + ?Sized, R: Rng + ?Sized>(
        &mut self,
        bathymetry: &B,
        rng: &mut R,
        game_time: f64,
        dt: f32,
    ) -> Vec<SimEvent> {
        let outcome = set_lull::update(&self.set_lull, game_time, &self.config.set_lull, rng);

        let mut events = Vec::with_capacity(4);
        let spawn = outcome.should_spawn_wave.then_some(SimEvent::WaveSpawn {
            spawn_time: game_time,
            amplitude: outcome.amplitude,
            wave_type: outcome.wave_type,
        });
        events.push(SimEvent::SetLullUpdate(outcome.state));
        events.extend(spawn);
        events.push(SimEvent::WavesUpdate { game_time });
        events.push(SimEvent::BackgroundUpdate {
            game_time,
            delta_time: dt,
        });

        for event in &events {
            reduce(self, event, bathymetry);
        }
        events
    }

    /// Return to a fresh session at game time 0 with the same config.
    pub fn reset(&mut self) {
        self.field.clear();
        self.field.forcing_time_s = 0.0;
        self.set_lull = initial_lull(&self.config);
        self.waves.clear();
        self.wave_ids = WaveIdAllocator::default();
        self.foam_rows.clear();
        self.foam.reset();
        self.game_time_ms = 0.0;
    }

    pub fn config(&self) -> &SurfConfig {
        &self.config
    }

    pub fn field(&self) -> &EnergyField {
        &self.field
    }

    pub fn set_lull(&self) -> &SetLullState {
        &self.set_lull
    }

    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }

    pub fn foam_rows(&self) -> &[FoamRow] {
        &self.foam_rows
    }

    pub fn foam(&self) -> &FoamPipeline {
        &self.foam
    }

    pub fn contours(&self) -> &ContourSet {
        self.foam.contours()
    }

    pub fn game_time_ms(&self) -> f64 {
        self.game_time_ms
    }

    pub fn next_wave_id(&self) -> u64 {
        self.wave_ids.peek()
    }

    /// Bilinear energy-field height at a normalized position.
    pub fn get_height_at(&self, normalized_x: f32, progress: f32) -> f32 {
        self.field.get_height_at(normalized_x, progress)
    }

    /// Nominal progress of a wave at the world's current time.
    pub fn wave_progress(&self, wave: &Wave) -> f32 {
        get_wave_progress(wave, self.game_time_ms, self.config.travel_duration_ms)
    }
}
