//! Forward-compatible save format for `SetLullState`.
//!
//! Every field is optional. Missing fields are filled from the config,
//! timestamps from the future are rebased to the load time, and older saves
//! that stored accumulated timers (`time_in_state`, `time_since_last_wave`) are
//! converted into timestamps. The restored state therefore always satisfies
//! `remaining <= total` for every derived countdown.

use bevy::log::warn;
use serde::{Deserialize, Serialize};

use crate::config::SetLullConfig;
use crate::error::SimError;

use super::state::{SetLullState, SetState};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedSetLullState {
    #[serde(alias = "setState")]
    pub set_state: Option<SetState>,
    #[serde(alias = "stateStartTime")]
    pub state_start_time: Option<f64>,
    #[serde(alias = "lastWaveSpawnTime")]
    pub last_wave_spawn_time: Option<f64>,
    #[serde(alias = "setDuration")]
    pub set_duration: Option<f64>,
    #[serde(alias = "nextWaveTime")]
    pub next_wave_time: Option<f64>,
    #[serde(alias = "currentSetWaves")]
    pub current_set_waves: Option<u32>,
    #[serde(alias = "wavesSpawned")]
    pub waves_spawned: Option<u32>,
    /// Legacy accumulated timer, ms spent in the current state.
    #[serde(alias = "timeInState", skip_serializing_if = "Option::is_none")]
    pub time_in_state: Option<f64>,
    /// Legacy accumulated timer, ms since the last spawn.
    #[serde(alias = "timeSinceLastWave", skip_serializing_if = "Option::is_none")]
    pub time_since_last_wave: Option<f64>,
}

impl From<&SetLullState> for PersistedSetLullState {
    fn from(state: &SetLullState) -> Self {
        Self {
            set_state: Some(state.set_state),
            state_start_time: Some(state.state_start_time),
            last_wave_spawn_time: Some(state.last_wave_spawn_time),
            set_duration: Some(state.set_duration),
            next_wave_time: Some(state.next_wave_time),
            current_set_waves: Some(state.current_set_waves),
            waves_spawned: Some(state.waves_spawned),
            time_in_state: None,
            time_since_last_wave: None,
        }
    }
}

/// Resolve a timestamp: explicit value, else `game_time - legacy elapsed`, else
/// `game_time`. Never later than `game_time`.
fn resolve_timestamp(explicit: Option<f64>, legacy_elapsed: Option<f64>, game_time: f64) -> f64 {
    let t = match (explicit, legacy_elapsed) {
        (Some(t), _) if t.is_finite() => t,
        (_, Some(elapsed)) if elapsed.is_finite() => game_time - elapsed.max(0.0),
        _ => game_time,
    };
    if t > game_time {
        warn!(
            "Set/lull restore: timestamp {:.0}ms is after load time {:.0}ms, rebasing",
            t, game_time
        );
        game_time
    } else {
        t
    }
}

/// A present but unusable duration counts as already elapsed.
fn resolve_duration(value: Option<f64>, fallback: f64) -> f64 {
    match value {
        Some(ms) if ms.is_finite() && ms >= 0.0 => ms,
        Some(ms) => {
            warn!("Set/lull restore: invalid duration {ms}, treating as elapsed");
            0.0
        }
        None => fallback,
    }
}

impl PersistedSetLullState {
    /// Rebuild a live state at `game_time` (ms).
    pub fn restore(&self, game_time: f64, config: &SetLullConfig) -> SetLullState {
        let set_state = self.set_state.unwrap_or_default();
        let planned_waves = config.min_set_waves.max(1);

        let default_state_ms = match set_state {
            SetState::Lull => config.lull_duration_s as f64 * 1000.0,
            SetState::Set => {
                planned_waves as f64
                    * (config.wave_period_s + config.wave_period_variation_s.max(0.0)) as f64
                    * config.set_time_cap_factor.max(1.0) as f64
                    * 1000.0
            }
        };

        let current_set_waves = match set_state {
            SetState::Lull => self.current_set_waves.unwrap_or(0),
            SetState::Set => self.current_set_waves.unwrap_or(planned_waves),
        };

        SetLullState {
            set_state,
            state_start_time: resolve_timestamp(self.state_start_time, self.time_in_state, game_time),
            last_wave_spawn_time: resolve_timestamp(
                self.last_wave_spawn_time,
                self.time_since_last_wave,
                game_time,
            ),
            set_duration: resolve_duration(self.set_duration, default_state_ms.max(0.0)),
            next_wave_time: resolve_duration(
                self.next_wave_time,
                (config.wave_period_s as f64 * 1000.0).max(0.0),
            ),
            current_set_waves,
            waves_spawned: self.waves_spawned.unwrap_or(0),
        }
    }
}

pub fn set_lull_to_json(state: &SetLullState) -> Result<String, SimError> {
    Ok(serde_json::to_string(&PersistedSetLullState::from(state))?)
}

/// Parse and restore. Unreadable input falls back to a fresh lull at
/// `game_time` instead of failing the load.
pub fn set_lull_from_json(json: &str, game_time: f64, config: &SetLullConfig) -> SetLullState {
    match serde_json::from_str::<PersistedSetLullState>(json) {
        Ok(persisted) => persisted.restore(game_time, config),
        Err(e) => {
            warn!("Set/lull restore: could not parse saved state, starting a new lull: {e}");
            PersistedSetLullState::default().restore(game_time, config)
        }
    }
}
