//! Closed set of simulation events and the reducer that applies them.
//!
//! `SimulationWorld::tick` builds one `SetLullUpdate`, an optional `WaveSpawn`,
//! one `WavesUpdate` and one `BackgroundUpdate` per tick, in that order, and
//! folds them through `reduce`. Embedders can observe the same list (the Bevy
//! plugin re-emits it as `SurfEvent`s) or replay it against another world.

use bevy::log::debug;
use serde::{Deserialize, Serialize};

use crate::bathymetry::Bathymetry;
use crate::config::REFRACTION_SAMPLES;
use crate::energy_field::{inject_swells, update_energy_field};
use crate::foam::{reap_foam_rows, spans_from_samples, FoamRow};
use crate::grid_coords::cell_to_normalized;
use crate::set_lull::SetLullState;
use crate::wave::{
    create_wave, exceeds_breaking_index, get_active_waves, get_wave_progress,
    update_wave_refraction, WaveType,
};
use crate::world::SimulationWorld;

/// Fraction of the measured height a breaking sample drains from the field.
const BREAK_DRAIN_FRACTION: f32 = 0.5;

/// Foam intensity for a break that drained nothing.
const FOAM_BASE_INTENSITY: f32 = 0.35;

/// Extra foam intensity per unit of drained energy.
const FOAM_ENERGY_GAIN: f32 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Spawn a wave and inject its pulse at the horizon.
    WaveSpawn {
        spawn_time: f64,
        amplitude: f32,
        wave_type: WaveType,
    },
    /// Replace the set/lull state with the machine's latest output.
    SetLullUpdate(SetLullState),
    /// Advance the energy field and foam by `delta_time` seconds.
    BackgroundUpdate { game_time: f64, delta_time: f32 },
    /// Refract live waves, detect breaking, deposit foam and reap old waves.
    WavesUpdate { game_time: f64 },
}

impl SimEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SimEvent::WaveSpawn { .. } => "WaveSpawn",
            SimEvent::SetLullUpdate(_) => "SetLullUpdate",
            SimEvent::BackgroundUpdate { .. } => "BackgroundUpdate",
            SimEvent::WavesUpdate { .. } => "WavesUpdate",
        }
    }
}

/// Apply one event to the world.
pub fn reduce<B: Bathymetry + ?Sized>(world: &mut SimulationWorld, event: &SimEvent, bathymetry: &B) {
    match event {
        SimEvent::WaveSpawn {
            spawn_time,
            amplitude,
            wave_type,
        } => {
            let wave = create_wave(&mut world.wave_ids, *spawn_time, *amplitude, *wave_type);
            world.field.inject_wave_pulse(wave.amplitude());
            debug!(
                "Wave {} spawned at {:.0}ms: {:?}, amplitude {:.2}",
                wave.id,
                spawn_time,
                wave_type,
                wave.amplitude()
            );
            world.waves.push(wave);
        }
        SimEvent::SetLullUpdate(state) => {
            world.set_lull = state.clone();
        }
        SimEvent::BackgroundUpdate {
            game_time,
            delta_time,
        } => apply_background_update(world, *game_time, *delta_time, bathymetry),
        SimEvent::WavesUpdate { game_time } => apply_waves_update(world, *game_time, bathymetry),
    }
}

fn apply_background_update<B: Bathymetry + ?Sized>(
    world: &mut SimulationWorld,
    game_time: f64,
    dt: f32,
    bathymetry: &B,
) {
    let config = &world.config;
    inject_swells(&mut world.field, &config.swells, dt);
    update_energy_field(
        &mut world.field,
        bathymetry,
        dt,
        config.travel_duration_ms,
        config.damping,
    );
    reap_foam_rows(&mut world.foam_rows, game_time, config.foam.fade_ms);
    world.foam.update(
        &world.foam_rows,
        game_time,
        dt,
        &config.foam,
        config.toggles.contours,
    );
    world.game_time_ms = game_time;
}

fn apply_waves_update<B: Bathymetry + ?Sized>(world: &mut SimulationWorld, game_time: f64, bathymetry: &B) {
    let config = &world.config;
    let travel = config.travel_duration_ms;
    let deep = bathymetry.deep_depth();
    // Neighbouring breaking samples closer than this share a foam segment.
    let max_gap = 1.5 / (REFRACTION_SAMPLES - 1) as f32;

    for wave in world.waves.iter_mut() {
        update_wave_refraction(wave, game_time, travel, bathymetry, deep);

        let nominal = get_wave_progress(wave, game_time, travel);
        if nominal <= 0.0 || nominal >= 1.0 {
            continue;
        }
        if let Some(last) = wave.last_foam_time {
            if game_time - last < config.foam.deposit_interval_ms {
                continue;
            }
        }

        let mut samples = Vec::new();
        let mut progress_sum = 0.0_f32;
        for (i, &p) in wave.progress_per_x.iter().enumerate() {
            let x = cell_to_normalized(i, REFRACTION_SAMPLES);
            let depth = bathymetry.clamped_depth(x, p);
            let measured = world.field.get_height_at(x, p).abs();
            let breaking = exceeds_breaking_index(wave.amplitude(), depth, config.breaking_index)
                || exceeds_breaking_index(measured, depth, config.breaking_index);
            if !breaking {
                continue;
            }
            let drained = world
                .field
                .drain_energy_at(x, p, measured * BREAK_DRAIN_FRACTION);
            let intensity = (FOAM_BASE_INTENSITY + drained * FOAM_ENERGY_GAIN).min(1.0);
            samples.push((x, intensity));
            progress_sum += p;
        }

        if samples.is_empty() {
            continue;
        }
        world.foam_rows.push(FoamRow {
            progress: progress_sum / samples.len() as f32,
            spawn_time: game_time,
            segments: spans_from_samples(&samples, max_gap),
        });
        wave.last_foam_time = Some(game_time);
    }

    get_active_waves(&mut world.waves, game_time, travel);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bathymetry::{FlatBathymetry, ShelfBathymetry};
    use crate::config::SurfConfig;

    fn world() -> SimulationWorld {
        SimulationWorld::new(SurfConfig::default()).expect("default config is valid")
    }

    #[test]
    fn test_wave_spawn_adds_wave_and_pulse() {
        let mut w = world();
        let bathy = ShelfBathymetry::default();
        reduce(
            &mut w,
            &SimEvent::WaveSpawn {
                spawn_time: 0.0,
                amplitude: 0.8,
                wave_type: WaveType::Set,
            },
            &bathy,
        );
        assert_eq!(w.waves().len(), 1);
        assert!(w.field().get(10, 0) > 0.0, "horizon pulse injected");
    }

    #[test]
    fn test_set_lull_update_replaces_state() {
        let mut w = world();
        let mut state = SetLullState::new_lull(5_000.0, 12_000.0, 9_000.0);
        state.waves_spawned = 3;
        reduce(&mut w, &SimEvent::SetLullUpdate(state.clone()), &ShelfBathymetry::default());
        assert_eq!(w.set_lull(), &state);
    }

    #[test]
    fn test_breaking_wave_deposits_foam_and_drains_field() {
        let mut w = world();
        // Shallow everywhere so a 0.8 wave breaks as soon as it moves.
        let bathy = FlatBathymetry { depth: 1.0 };
        reduce(
            &mut w,
            &SimEvent::WaveSpawn {
                spawn_time: 0.0,
                amplitude: 0.8,
                wave_type: WaveType::Set,
            },
            &bathy,
        );
        reduce(&mut w, &SimEvent::WavesUpdate { game_time: 500.0 }, &bathy);
        assert_eq!(w.foam_rows().len(), 1);
        let row = &w.foam_rows()[0];
        assert!(!row.segments.is_empty());
        assert!(row
            .segments
            .iter()
            .all(|s| s.intensity >= FOAM_BASE_INTENSITY && s.intensity <= 1.0));

        // Throttled: no second row inside the deposit interval.
        reduce(&mut w, &SimEvent::WavesUpdate { game_time: 600.0 }, &bathy);
        assert_eq!(w.foam_rows().len(), 1);
        reduce(&mut w, &SimEvent::WavesUpdate { game_time: 800.0 }, &bathy);
        assert_eq!(w.foam_rows().len(), 2);
    }

    #[test]
    fn test_deep_water_wave_does_not_break() {
        let mut w = world();
        let bathy = FlatBathymetry { depth: 10.0 };
        reduce(
            &mut w,
            &SimEvent::WaveSpawn {
                spawn_time: 0.0,
                amplitude: 0.5,
                wave_type: WaveType::Background,
            },
            &bathy,
        );
        reduce(&mut w, &SimEvent::WavesUpdate { game_time: 3_000.0 }, &bathy);
        assert!(w.foam_rows().is_empty());
    }

    #[test]
    fn test_waves_update_reaps_finished_waves() {
        let mut w = world();
        let bathy = ShelfBathymetry::default();
        reduce(
            &mut w,
            &SimEvent::WaveSpawn {
                spawn_time: 0.0,
                amplitude: 0.8,
                wave_type: WaveType::Set,
            },
            &bathy,
        );
        reduce(&mut w, &SimEvent::WavesUpdate { game_time: 19_000.0 }, &bathy);
        assert!(w.waves().is_empty());
    }

    #[test]
    fn test_background_update_advances_clock_and_reaps_foam() {
        let mut w = world();
        w.foam_rows.push(FoamRow {
            progress: 0.8,
            spawn_time: 0.0,
            segments: vec![crate::foam::FoamSegment::new(0.2, 0.4, 0.9)],
        });
        let bathy = ShelfBathymetry::default();
        reduce(
            &mut w,
            &SimEvent::BackgroundUpdate {
                game_time: 9_000.0,
                delta_time: 1.0 / 60.0,
            },
            &bathy,
        );
        assert_eq!(w.game_time_ms(), 9_000.0);
        assert!(w.foam_rows().is_empty(), "faded rows reaped");
    }
}
