//! Bevy integration: resources, events and the fixed-step driver.
//!
//! `SurfSimulationPlugin` owns one `SimulationWorld` as the `SurfWorld`
//! resource and advances it once per `FixedUpdate`. Game time advances by the
//! fixed timestep, so a session replays identically regardless of frame rate.
//! Every event applied during a tick is re-emitted as a `SurfEvent` for
//! renderers and audio.

use bevy::prelude::*;

use crate::bathymetry::{Bathymetry, ShelfBathymetry};
use crate::config::SurfConfig;
use crate::events::SimEvent;
use crate::persistence::{load_snapshot, save_snapshot, SnapshotLoad};
use crate::sim_rng::SimRng;
use crate::state_hash::{update_state_hash, StateHash};
use crate::world::SimulationWorld;
use crate::{Saveable, SaveableRegistry};

// =============================================================================
// Resources and events
// =============================================================================

/// The simulation world as a Bevy resource.
#[derive(Resource, Debug, Clone)]
pub struct SurfWorld(pub SimulationWorld);

/// Depth source for the session. Insert one before adding the plugin to
/// override the default shelf.
#[derive(Resource)]
pub struct SurfBathymetry(pub Box<dyn Bathymetry + Send + Sync>);

impl SurfBathymetry {
    pub fn new<B: Bathymetry + Send + Sync + 'static>(bathymetry: B) -> Self {
        Self(Box::new(bathymetry))
    }
}

/// Fixed ticks run since the plugin was built.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct SurfClock {
    pub tick: u64,
}

/// A `SimEvent` applied during the last fixed tick.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct SurfEvent(pub SimEvent);

// =============================================================================
// Saveable
// =============================================================================

impl Saveable for SurfWorld {
    const SAVE_KEY: &'static str = "surf_world";

    fn save_to_bytes(&self) -> Option<Vec<u8>> {
        match save_snapshot(&self.0) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!("SurfWorld: snapshot failed, session will not be saved: {}", e);
                None
            }
        }
    }

    fn load_from_bytes(&mut self, bytes: &[u8]) {
        if load_snapshot(&mut self.0, bytes) == SnapshotLoad::Legacy {
            info!("SurfWorld: loaded a headerless snapshot");
        }
    }

    fn reset(&mut self) {
        self.0.reset();
    }
}

// =============================================================================
// Systems
// =============================================================================

/// Advance the world by one fixed timestep and forward the applied events.
pub fn advance_surf_simulation(
    fixed: Res<Time<Fixed>>,
    bathymetry: Res<SurfBathymetry>,
    mut clock: ResMut<SurfClock>,
    mut world: ResMut<SurfWorld>,
    mut rng: ResMut<SimRng>,
    mut events: EventWriter<SurfEvent>,
) {
    let step = fixed.timestep();
    let game_time = world.0.game_time_ms() + step.as_secs_f64() * 1000.0;
    let dt = step.as_secs_f32();

    let applied = world.0.tick(bathymetry.0.as_ref(), &mut rng.0, game_time, dt);
    clock.tick += 1;
    for event in applied {
        events.send(SurfEvent(event));
    }
}

// =============================================================================
// Plugin
// =============================================================================

#[derive(Default)]
pub struct SurfSimulationPlugin {
    pub config: SurfConfig,
}

impl Plugin for SurfSimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = match self.config.validate() {
            Ok(()) => self.config.clone(),
            Err(e) => {
                error!("SurfSimulationPlugin: {}; using the default config", e);
                SurfConfig::default()
            }
        };
        let world = match SimulationWorld::new(config.clone()) {
            Ok(world) => world,
            Err(e) => {
                error!("SurfSimulationPlugin: could not build the world: {}", e);
                return;
            }
        };

        if !app.world().contains_resource::<SurfBathymetry>() {
            app.insert_resource(SurfBathymetry::new(ShelfBathymetry::default()));
        }

        app.insert_resource(SurfWorld(world))
            .insert_resource(SimRng::from_config(&config))
            .init_resource::<SurfClock>()
            .init_resource::<StateHash>()
            .add_event::<SurfEvent>()
            .add_systems(
                FixedUpdate,
                (advance_surf_simulation, update_state_hash).chain(),
            );

        // Register for save/load via the SaveableRegistry.
        app.init_resource::<SaveableRegistry>();
        let mut registry = app.world_mut().resource_mut::<SaveableRegistry>();
        registry.register::<SurfWorld>();
        registry.register::<SimRng>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bathymetry::FlatBathymetry;

    #[test]
    fn test_invalid_config_falls_back_to_default() {
        let mut app = App::new();
        app.add_plugins(SurfSimulationPlugin {
            config: SurfConfig {
                grid_width: 0,
                ..Default::default()
            },
        });
        let world = app.world().resource::<SurfWorld>();
        assert_eq!(world.0.config(), &SurfConfig::default());
    }

    #[test]
    fn test_user_bathymetry_is_kept() {
        let mut app = App::new();
        app.insert_resource(SurfBathymetry::new(FlatBathymetry { depth: 3.0 }));
        app.add_plugins(SurfSimulationPlugin::default());
        let bathy = app.world().resource::<SurfBathymetry>();
        assert_eq!(bathy.0.deep_depth(), 3.0);
    }

    #[test]
    fn test_world_and_rng_are_registered() {
        let mut app = App::new();
        app.add_plugins(SurfSimulationPlugin::default());
        let registry = app.world().resource::<SaveableRegistry>();
        let keys: Vec<&str> = registry.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["surf_world", "surf_rng"]);
    }
}
