// ---------------------------------------------------------------------------
// persistence – JSON world snapshots with a checksummed header
// ---------------------------------------------------------------------------
//
// Snapshot format:
//   [0..4]   Magic bytes: "SURF"
//   [4..8]   Snapshot format version (u32, little-endian)
//   [8..12]  xxHash32 checksum of the JSON payload
//   [12..]   JSON-encoded `WorldSnapshot`
//
// On save: encode snapshot -> prepend header.
// On load: bytes without the magic are treated as bare JSON (older saves).
// Anything unreadable falls back to a fresh world with a warning; loading
// never fails.

use bevy::log::warn;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh32::xxh32;

use crate::energy_field::EnergyField;
use crate::error::SimError;
use crate::foam::{FoamRow, HaloFloor};
use crate::set_lull::PersistedSetLullState;
use crate::wave::{Wave, WaveIdAllocator};
use crate::world::SimulationWorld;

pub const MAGIC: [u8; 4] = *b"SURF";
pub const HEADER_SIZE: usize = 12;
pub const SNAPSHOT_VERSION: u32 = 1;
const XXHASH_SEED: u32 = 0;

/// Serialized form of a `SimulationWorld`. Every field has a default so older or
/// partial snapshots still load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSnapshot {
    pub version: u32,
    #[serde(alias = "gameTime")]
    pub game_time_ms: f64,
    #[serde(alias = "setLull")]
    pub set_lull: PersistedSetLullState,
    pub waves: Vec<Wave>,
    pub wave_ids: Option<WaveIdAllocator>,
    #[serde(alias = "foamRows")]
    pub foam_rows: Vec<FoamRow>,
    pub field: Option<EnergyField>,
    /// Absent in older snapshots, which restart with a clear halo.
    #[serde(alias = "foamHalo")]
    pub foam_halo: Option<HaloFloor>,
}

/// How `load_snapshot` resolved its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotLoad {
    /// Header verified and payload decoded.
    Restored,
    /// No header; payload decoded as bare JSON.
    Legacy,
    /// Input was unusable; the world was reset to a fresh session.
    Fallback,
}

impl WorldSnapshot {
    pub fn capture(world: &SimulationWorld) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            game_time_ms: world.game_time_ms,
            set_lull: PersistedSetLullState::from(&world.set_lull),
            waves: world.waves.clone(),
            wave_ids: Some(world.wave_ids.clone()),
            foam_rows: world.foam_rows.clone(),
            field: Some(world.field.clone()),
            foam_halo: Some(world.foam.halo().clone()),
        }
    }
}

/// Encode the world as a headered JSON snapshot.
pub fn save_snapshot(world: &SimulationWorld) -> Result<Vec<u8>, SimError> {
    let payload = serde_json::to_vec(&WorldSnapshot::capture(world))?;
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
    out.extend_from_slice(&xxh32(&payload, XXHASH_SEED).to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Split the header off and verify it. `Ok(None)` means no header.
fn unwrap_header(bytes: &[u8]) -> Result<Option<&[u8]>, String> {
    if bytes.len() < 4 || bytes[..4] != MAGIC {
        return Ok(None);
    }
    if bytes.len() < HEADER_SIZE {
        return Err(format!(
            "snapshot has magic bytes but is too short ({} bytes)",
            bytes.len()
        ));
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version > SNAPSHOT_VERSION {
        return Err(format!(
            "snapshot version {version} is newer than supported version {SNAPSHOT_VERSION}"
        ));
    }
    let checksum = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    let payload = &bytes[HEADER_SIZE..];
    let computed = xxh32(payload, XXHASH_SEED);
    if computed != checksum {
        return Err(format!(
            "checksum mismatch (expected {checksum:#010X}, got {computed:#010X})"
        ));
    }
    Ok(Some(payload))
}

/// Restore `world` from snapshot bytes, keeping its config.
pub fn load_snapshot(world: &mut SimulationWorld, bytes: &[u8]) -> SnapshotLoad {
    let (payload, kind) = match unwrap_header(bytes) {
        Ok(Some(payload)) => (payload, SnapshotLoad::Restored),
        Ok(None) => (bytes, SnapshotLoad::Legacy),
        Err(e) => {
            warn!("Surf snapshot rejected: {e}; starting a fresh session");
            world.reset();
            return SnapshotLoad::Fallback;
        }
    };
    match serde_json::from_slice::<WorldSnapshot>(payload) {
        Ok(snapshot) => {
            apply_snapshot(world, snapshot);
            kind
        }
        Err(e) => {
            warn!("Surf snapshot could not be decoded: {e}; starting a fresh session");
            world.reset();
            SnapshotLoad::Fallback
        }
    }
}

fn apply_snapshot(world: &mut SimulationWorld, snapshot: WorldSnapshot) {
    let game_time = if snapshot.game_time_ms.is_finite() {
        snapshot.game_time_ms.max(0.0)
    } else {
        0.0
    };

    world.game_time_ms = game_time;
    world.set_lull = snapshot.set_lull.restore(game_time, &world.config.set_lull);

    let mut ids = snapshot.wave_ids.unwrap_or_default();
    let mut waves = snapshot.waves;
    if let Some(max_id) = waves.iter().map(|w| w.id).max() {
        ids.reserve_past(max_id);
    }
    if ids.is_exhausted() {
        warn!(
            "Surf snapshot: wave ids exhausted; renumbering {} live waves",
            waves.len()
        );
        ids = WaveIdAllocator::default();
        for wave in &mut waves {
            wave.id = ids.next_id();
        }
    }
    world.wave_ids = ids;
    world.waves = waves;
    world.foam_rows = snapshot.foam_rows;

    let (w, h) = (world.config.grid_width, world.config.grid_height);
    match snapshot.field {
        Some(mut field) if field.width == w && field.height == h => {
            field.repair();
            world.field = field;
        }
        Some(field) => {
            warn!(
                "Surf snapshot: energy field is {}x{}, expected {}x{}; starting calm",
                field.width, field.height, w, h
            );
            world.field.clear();
        }
        None => world.field.clear(),
    }

    match snapshot.foam_halo {
        Some(mut halo) => {
            halo.repair(game_time);
            if !world.foam.restore_halo(halo) {
                warn!("Surf snapshot: foam halo does not match the foam grid; clearing it");
            }
        }
        None => world.foam.reset(),
    }
}
