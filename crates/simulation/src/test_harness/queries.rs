//! Tick driving and read-only queries for `TestBeach`.

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::events::SimEvent;
use crate::foam::{ContourSet, FoamRow};
use crate::plugin::{SurfClock, SurfEvent, SurfWorld};
use crate::set_lull::SetLullState;
use crate::state_hash::{compute_world_hash, StateHash};
use crate::wave::Wave;
use crate::world::SimulationWorld;
use crate::SaveableRegistry;

use super::{TestBeach, TEST_STEP};

impl TestBeach {
    // -----------------------------------------------------------------------
    // Simulation control
    // -----------------------------------------------------------------------

    /// Run N fixed ticks by executing the `FixedUpdate` schedule directly, so
    /// wall-clock time never leaks into the run.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.world_mut().run_schedule(FixedUpdate);
        }
    }

    /// Run whole seconds of game time at the harness step.
    pub fn run_secs(&mut self, seconds: u32) {
        let per_sec = (1000 / TEST_STEP.as_millis()) as u32;
        self.tick(seconds * per_sec);
    }

    /// Tick until `pred` holds or `max_ticks` run out. Returns ticks used.
    pub fn tick_until(
        &mut self,
        max_ticks: u32,
        mut pred: impl FnMut(&SimulationWorld) -> bool,
    ) -> Option<u32> {
        for n in 0..=max_ticks {
            if pred(self.world()) {
                return Some(n);
            }
            if n < max_ticks {
                self.tick(1);
            }
        }
        None
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn world(&self) -> &SimulationWorld {
        &self.app.world().resource::<SurfWorld>().0
    }

    pub fn set_lull(&self) -> &SetLullState {
        self.world().set_lull()
    }

    pub fn waves(&self) -> &[Wave] {
        self.world().waves()
    }

    pub fn wave_count(&self) -> usize {
        self.waves().len()
    }

    pub fn foam_rows(&self) -> &[FoamRow] {
        self.world().foam_rows()
    }

    pub fn contours(&self) -> &ContourSet {
        self.world().contours()
    }

    pub fn game_time_ms(&self) -> f64 {
        self.world().game_time_ms()
    }

    pub fn tick_count(&self) -> u64 {
        self.app.world().resource::<SurfClock>().tick
    }

    pub fn state_hash(&self) -> &StateHash {
        self.app.world().resource::<StateHash>()
    }

    pub fn world_hash(&self) -> u64 {
        compute_world_hash(self.world())
    }

    /// Take every `SurfEvent` sent since the last drain, in send order.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.app
            .world_mut()
            .resource_mut::<Events<SurfEvent>>()
            .drain()
            .map(|e| e.0)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Save / load through the registry
    // -----------------------------------------------------------------------

    pub fn save(&self) -> BTreeMap<String, Vec<u8>> {
        let world = self.app.world();
        world.resource::<SaveableRegistry>().save_all(world)
    }

    pub fn load(&mut self, extensions: &BTreeMap<String, Vec<u8>>) {
        self.app
            .world_mut()
            .resource_scope(|world, registry: Mut<SaveableRegistry>| {
                registry.load_all(world, extensions);
            });
    }

    pub fn reset(&mut self) {
        self.app
            .world_mut()
            .resource_scope(|world, registry: Mut<SaveableRegistry>| {
                registry.reset_all(world);
            });
    }
}
