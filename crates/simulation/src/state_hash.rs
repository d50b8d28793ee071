//! Deterministic state hashing for replay verification.
//!
//! `compute_world_hash` folds a `SimulationWorld` into 64 bits in a fixed order:
//!
//! 1. Game time (f64 bits)
//! 2. Energy field heights in row-major order (f32 bits)
//! 3. Set/lull state: phase, timestamps, durations, wave counters
//! 4. Waves in spawn order: id, spawn time, amplitude, type, refracted progress
//! 5. Foam rows in deposit order: progress, spawn time, segments
//! 6. Foam halo floor values
//!
//! Floats are hashed through their bit patterns and enums through explicit
//! tags, so the result is identical across platforms and compiler versions.

use std::hash::{Hash, Hasher};

use bevy::prelude::*;

use crate::plugin::{SurfClock, SurfWorld};
use crate::set_lull::SetState;
use crate::sim_rng::SimRng;
use crate::wave::WaveType;
use crate::world::SimulationWorld;

/// Hash of the world after the most recent fixed tick.
#[derive(Resource, Default, Clone, Debug)]
pub struct StateHash {
    /// The tick at which this hash was computed.
    pub tick: u64,
    /// FNV-1a hash of the world plus the RNG position.
    pub hash: u64,
}

// ---------------------------------------------------------------------------
// FNV-1a hasher (deterministic, no random seed)
// ---------------------------------------------------------------------------

/// FNV-1a produces the same output on every platform. Unlike `DefaultHasher`,
/// it is not randomized per process.
struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x00000100000001B3;

    fn new() -> Self {
        Self {
            state: Self::FNV_OFFSET_BASIS,
        }
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= byte as u64;
            self.state = self.state.wrapping_mul(Self::FNV_PRIME);
        }
    }
}

fn set_state_tag(state: SetState) -> u8 {
    match state {
        SetState::Lull => 0,
        SetState::Set => 1,
    }
}

fn wave_type_tag(wave_type: WaveType) -> u8 {
    match wave_type {
        WaveType::Set => 0,
        WaveType::Background => 1,
    }
}

fn hash_f32s(values: &[f32], hasher: &mut Fnv1aHasher) {
    (values.len() as u64).hash(hasher);
    for v in values {
        v.to_bits().hash(hasher);
    }
}

fn hash_world(world: &SimulationWorld, hasher: &mut Fnv1aHasher) {
    // 1. Game time
    world.game_time_ms().to_bits().hash(hasher);

    // 2. Energy field
    (world.field().width() as u64).hash(hasher);
    (world.field().height() as u64).hash(hasher);
    hash_f32s(world.field().heights(), hasher);

    // 3. Set/lull state
    let s = world.set_lull();
    set_state_tag(s.set_state).hash(hasher);
    s.state_start_time.to_bits().hash(hasher);
    s.last_wave_spawn_time.to_bits().hash(hasher);
    s.set_duration.to_bits().hash(hasher);
    s.next_wave_time.to_bits().hash(hasher);
    s.current_set_waves.hash(hasher);
    s.waves_spawned.hash(hasher);

    // 4. Waves
    (world.waves().len() as u64).hash(hasher);
    for wave in world.waves() {
        wave.id.hash(hasher);
        wave.spawn_time.to_bits().hash(hasher);
        wave.amplitude().to_bits().hash(hasher);
        wave_type_tag(wave.wave_type).hash(hasher);
        hash_f32s(&wave.progress_per_x, hasher);
    }

    // 5. Foam rows
    (world.foam_rows().len() as u64).hash(hasher);
    for row in world.foam_rows() {
        row.progress.to_bits().hash(hasher);
        row.spawn_time.to_bits().hash(hasher);
        (row.segments.len() as u64).hash(hasher);
        for seg in &row.segments {
            seg.start_x.to_bits().hash(hasher);
            seg.end_x.to_bits().hash(hasher);
            seg.intensity.to_bits().hash(hasher);
        }
    }

    // 6. Foam halo floor
    hash_f32s(world.foam().halo().values(), hasher);
}

// ---------------------------------------------------------------------------
// Public convenience functions
// ---------------------------------------------------------------------------

/// Deterministic hash of the simulation state. Two worlds driven by the same
/// config, bathymetry and `(game_time, dt, rng)` sequence hash equal.
pub fn compute_world_hash(world: &SimulationWorld) -> u64 {
    let mut hasher = Fnv1aHasher::new();
    hash_world(world, &mut hasher);
    hasher.finish()
}

/// World hash extended with the tick counter and the RNG position, so a
/// replay that diverges only in unconsumed randomness is still caught.
pub fn compute_state_hash(tick: u64, world: &SimulationWorld, rng_word_pos: u128) -> u64 {
    let mut hasher = Fnv1aHasher::new();
    tick.hash(&mut hasher);
    rng_word_pos.hash(&mut hasher);
    hash_world(world, &mut hasher);
    hasher.finish()
}

// ---------------------------------------------------------------------------
// ECS system
// ---------------------------------------------------------------------------

pub(crate) fn update_state_hash(
    clock: Res<SurfClock>,
    world: Res<SurfWorld>,
    rng: Res<SimRng>,
    mut state_hash: ResMut<StateHash>,
) {
    state_hash.tick = clock.tick;
    state_hash.hash = compute_state_hash(clock.tick, &world.0, rng.word_pos());
}
