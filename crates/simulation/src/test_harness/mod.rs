//! # TestBeach: headless harness for surf simulation tests
//!
//! Wraps a `bevy::app::App` with `SurfSimulationPlugin` so tests can drive
//! fixed ticks and assert on the world without a window or renderer.

mod assertions;
mod queries;

use std::time::Duration;

use bevy::app::App;
use bevy::prelude::*;

use crate::bathymetry::Bathymetry;
use crate::config::SurfConfig;
use crate::plugin::{SurfBathymetry, SurfSimulationPlugin, SurfWorld};
use crate::sim_rng::SimRng;
use crate::world::SimulationWorld;

/// Fixed timestep used by the harness (10 Hz).
pub const TEST_STEP: Duration = Duration::from_millis(100);

/// A headless Bevy App running `SurfSimulationPlugin`.
///
/// Build with `new()` plus `with_*` methods, then call `tick()` to advance
/// and query or assert on the resulting state.
pub struct TestBeach {
    app: App,
}

impl Default for TestBeach {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBeach {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Default config, default shelf bathymetry, 100ms fixed step.
    pub fn new() -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.add_plugins(SurfSimulationPlugin::default());
        app.insert_resource(Time::<Fixed>::from_duration(TEST_STEP));
        Self { app }
    }

    // -----------------------------------------------------------------------
    // Setup (builder pattern, consumes and returns Self)
    // -----------------------------------------------------------------------

    /// Rebuild the world and RNG from `config`. Invalid configs panic here,
    /// unlike the plugin which falls back to the default.
    pub fn with_config(mut self, config: SurfConfig) -> Self {
        let rng = SimRng::from_config(&config);
        let world = SimulationWorld::new(config).expect("test config must be valid");
        self.app.insert_resource(SurfWorld(world));
        self.app.insert_resource(rng);
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        let config = SurfConfig {
            seed,
            ..self.world().config().clone()
        };
        self.with_config(config)
    }

    pub fn with_bathymetry<B: Bathymetry + Send + Sync + 'static>(mut self, bathymetry: B) -> Self {
        self.app.insert_resource(SurfBathymetry::new(bathymetry));
        self
    }

    pub fn with_contours(mut self, enabled: bool) -> Self {
        if let Some(mut world) = self.app.world_mut().get_resource_mut::<SurfWorld>() {
            world.0.config.toggles.contours = enabled;
        }
        self
    }
}
