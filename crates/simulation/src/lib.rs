use bevy::prelude::*;
use std::collections::BTreeMap;

pub mod bathymetry;
pub mod config;
pub mod energy_field;
pub mod error;
pub mod events;
pub mod foam;
pub mod grid_coords;
pub mod persistence;
pub mod plugin;
pub mod set_lull;
pub mod sim_rng;
pub mod state_hash;
pub mod wave;
pub mod world;


#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

pub use bathymetry::{Bathymetry, FlatBathymetry, NoisyBathymetry, ShelfBathymetry};
pub use config::SurfConfig;
pub use error::SimError;
pub use events::SimEvent;
pub use plugin::{SurfEvent, SurfSimulationPlugin, SurfWorld};
pub use world::SimulationWorld;

// ---------------------------------------------------------------------------
// Saveable trait + registry for the extension map save pattern
// ---------------------------------------------------------------------------

/// Trait for resources that can be saved/loaded via the extension map.
///
/// Loading and resetting happen in place so a resource can keep state that is
/// not part of the save (the world keeps its session config, the RNG its seed).
pub trait Saveable: Resource + Send + Sync + 'static {
    /// Unique key for this resource in the extension map.
    /// Must be stable across versions (used for deserialization lookup).
    const SAVE_KEY: &'static str;

    /// Serialize this resource to bytes.
    /// Return `None` to skip saving (e.g. when there is nothing worth keeping).
    fn save_to_bytes(&self) -> Option<Vec<u8>>;

    /// Restore from bytes. Must not fail: unreadable input falls back to a
    /// fresh state with a warning.
    fn load_from_bytes(&mut self, bytes: &[u8]);

    /// Return to the state of a new session.
    fn reset(&mut self);
}

/// Type alias for the save function stored in a `SaveableEntry`.
pub type SaveFn = Box<dyn Fn(&World) -> Option<Vec<u8>> + Send + Sync>;
/// Type alias for the load function stored in a `SaveableEntry`.
pub type LoadFn = Box<dyn Fn(&mut World, &[u8]) + Send + Sync>;
/// Type alias for the reset function stored in a `SaveableEntry`.
pub type ResetFn = Box<dyn Fn(&mut World) + Send + Sync>;

/// Type-erased save/load/reset operations for a single registered resource.
pub struct SaveableEntry {
    pub key: String,
    pub save_fn: SaveFn,
    pub load_fn: LoadFn,
    pub reset_fn: ResetFn,
}

/// Registry of all saveable resources, populated during plugin setup.
#[derive(Resource, Default)]
pub struct SaveableRegistry {
    pub entries: Vec<SaveableEntry>,
}

impl SaveableRegistry {
    /// Register a resource type that implements `Saveable`.
    ///
    /// Panics in debug builds if a resource with the same `SAVE_KEY` is already
    /// registered, preventing silent data loss from duplicate registrations.
    pub fn register<T: Saveable>(&mut self) {
        let key = T::SAVE_KEY.to_string();
        if self.entries.iter().any(|e| e.key == key) {
            warn!(
                "SaveableRegistry: duplicate key '{}', ignoring second registration",
                key
            );
            debug_assert!(false, "SaveableRegistry: duplicate key '{}'", key);
            return;
        }
        let missing_key = key.clone();
        self.entries.push(SaveableEntry {
            key,
            save_fn: Box::new(|world: &World| {
                world.get_resource::<T>().and_then(|r| r.save_to_bytes())
            }),
            load_fn: Box::new(move |world: &mut World, bytes: &[u8]| {
                match world.get_resource_mut::<T>() {
                    Some(mut resource) => resource.load_from_bytes(bytes),
                    None => warn!(
                        "SaveableRegistry: '{}' has save data but no resource to load into",
                        missing_key
                    ),
                }
            }),
            reset_fn: Box::new(|world: &mut World| {
                if let Some(mut resource) = world.get_resource_mut::<T>() {
                    resource.reset();
                }
            }),
        });
    }

    /// Save all registered resources into an extension map.
    pub fn save_all(&self, world: &World) -> BTreeMap<String, Vec<u8>> {
        let mut extensions = BTreeMap::new();
        for entry in &self.entries {
            if let Some(bytes) = (entry.save_fn)(world) {
                extensions.insert(entry.key.clone(), bytes);
            }
        }
        extensions
    }

    /// Load registered resources from an extension map.
    /// Resources whose key is absent are left unchanged.
    pub fn load_all(&self, world: &mut World, extensions: &BTreeMap<String, Vec<u8>>) {
        for entry in &self.entries {
            if let Some(bytes) = extensions.get(&entry.key) {
                (entry.load_fn)(world, bytes);
            }
        }
    }

    /// Reset all registered resources (used when a new session starts).
    pub fn reset_all(&self, world: &mut World) {
        for entry in &self.entries {
            (entry.reset_fn)(world);
        }
    }
}
