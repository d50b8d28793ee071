//! `SetLullState` and its derived read-outs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SetState {
    #[default]
    #[serde(rename = "LULL", alias = "Lull", alias = "lull")]
    Lull,
    #[serde(rename = "SET", alias = "Set", alias = "set")]
    Set,
}

impl SetState {
    pub fn name(self) -> &'static str {
        match self {
            SetState::Lull => "LULL",
            SetState::Set => "SET",
        }
    }
}

/// Timing state of the set/lull machine. All times in milliseconds.
///
/// Only absolute timestamps (`state_start_time`, `last_wave_spawn_time`) and
/// planned durations (`set_duration`, `next_wave_time`) are stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetLullState {
    pub set_state: SetState,
    /// Game time the current state was entered.
    pub state_start_time: f64,
    /// Game time of the most recent wave spawn.
    pub last_wave_spawn_time: f64,
    /// Planned length of the current state: the lull length while in `Lull`,
    /// the set time cap while in `Set`.
    pub set_duration: f64,
    /// Planned spacing between the last spawn and the next one.
    pub next_wave_time: f64,
    /// Number of waves planned for the current set.
    pub current_set_waves: u32,
    /// Set waves spawned since the current set began.
    pub waves_spawned: u32,
}

impl Default for SetLullState {
    fn default() -> Self {
        Self::new_lull(0.0, 30_000.0, 15_000.0)
    }
}

/// A remaining/total pair for display. `remaining <= total` always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    pub remaining_ms: f64,
    pub total_ms: f64,
}

impl Countdown {
    fn new(elapsed_ms: f64, total_ms: f64) -> Self {
        let total_ms = sanitize_duration(total_ms);
        let elapsed_ms = if elapsed_ms.is_nan() {
            0.0
        } else {
            elapsed_ms.max(0.0)
        };
        Self {
            remaining_ms: (total_ms - elapsed_ms).clamp(0.0, total_ms),
            total_ms,
        }
    }

    /// Fraction complete in `[0, 1]`. A zero-length countdown is complete.
    pub fn progress(&self) -> f32 {
        if self.total_ms <= 0.0 {
            1.0
        } else {
            (1.0 - self.remaining_ms / self.total_ms).clamp(0.0, 1.0) as f32
        }
    }
}

/// Non-finite or negative durations count as zero ("already elapsed").
#[inline]
pub(crate) fn sanitize_duration(ms: f64) -> f64 {
    if ms.is_finite() {
        ms.max(0.0)
    } else {
        0.0
    }
}

impl SetLullState {
    pub fn new_lull(game_time: f64, set_duration: f64, next_wave_time: f64) -> Self {
        Self {
            set_state: SetState::Lull,
            state_start_time: game_time,
            last_wave_spawn_time: game_time,
            set_duration,
            next_wave_time,
            current_set_waves: 0,
            waves_spawned: 0,
        }
    }

    /// Time spent in the current state, never negative.
    pub fn elapsed_in_state(&self, game_time: f64) -> f64 {
        let elapsed = game_time - self.state_start_time;
        if elapsed.is_nan() {
            0.0
        } else {
            elapsed.max(0.0)
        }
    }

    pub fn state_countdown(&self, game_time: f64) -> Countdown {
        Countdown::new(self.elapsed_in_state(game_time), self.set_duration)
    }

    pub fn remaining_in_state(&self, game_time: f64) -> f64 {
        self.state_countdown(game_time).remaining_ms
    }

    /// Fraction of the planned state length elapsed, in `[0, 1]`.
    pub fn state_progress(&self, game_time: f64) -> f32 {
        self.state_countdown(game_time).progress()
    }

    pub fn time_since_last_wave(&self, game_time: f64) -> f64 {
        let elapsed = game_time - self.last_wave_spawn_time;
        if elapsed.is_nan() {
            0.0
        } else {
            elapsed.max(0.0)
        }
    }

    pub fn wave_countdown(&self, game_time: f64) -> Countdown {
        Countdown::new(self.time_since_last_wave(game_time), self.next_wave_time)
    }

    pub fn time_until_next_wave(&self, game_time: f64) -> f64 {
        self.wave_countdown(game_time).remaining_ms
    }

    pub fn wave_timer_progress(&self, game_time: f64) -> f32 {
        self.wave_countdown(game_time).progress()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_lull_at_zero() {
        let s = SetLullState::default();
        assert_eq!(s.set_state, SetState::Lull);
        assert_eq!(s.state_start_time, 0.0);
        assert_eq!(s.set_duration, 30_000.0);
    }

    #[test]
    fn test_countdowns_derive_from_timestamps() {
        let s = SetLullState::new_lull(10_000.0, 30_000.0, 15_000.0);
        assert_eq!(s.elapsed_in_state(22_000.0), 12_000.0);
        assert_eq!(s.remaining_in_state(22_000.0), 18_000.0);
        assert!((s.state_progress(25_000.0) - 0.5).abs() < 1e-6);
        assert_eq!(s.time_until_next_wave(20_000.0), 5_000.0);
    }

    #[test]
    fn test_zero_duration_is_already_elapsed() {
        let s = SetLullState::new_lull(0.0, 0.0, 0.0);
        assert_eq!(s.state_progress(0.0), 1.0);
        assert_eq!(s.wave_timer_progress(0.0), 1.0);
        assert_eq!(s.remaining_in_state(0.0), 0.0);
    }

    #[test]
    fn test_non_finite_duration_never_produces_nan() {
        let s = SetLullState::new_lull(0.0, f64::NAN, f64::INFINITY);
        let p = s.state_progress(1_000.0);
        assert!(p.is_finite());
        assert_eq!(p, 1.0);
        assert!(s.wave_timer_progress(1_000.0).is_finite());
    }

    #[test]
    fn test_clock_before_start_clamps_elapsed() {
        let s = SetLullState::new_lull(50_000.0, 30_000.0, 15_000.0);
        assert_eq!(s.elapsed_in_state(10_000.0), 0.0);
        let c = s.state_countdown(10_000.0);
        assert!(c.remaining_ms <= c.total_ms);
    }

    #[test]
    fn test_overrun_state_reports_zero_remaining() {
        // 120s into a 106s lull: remaining must not exceed the total.
        let s = SetLullState::new_lull(0.0, 106_000.0, 15_000.0);
        let c = s.state_countdown(120_000.0);
        assert_eq!(c.remaining_ms, 0.0);
        assert_eq!(c.total_ms, 106_000.0);
    }

    #[test]
    fn test_set_state_serde_names() {
        assert_eq!(serde_json::to_string(&SetState::Set).unwrap(), "\"SET\"");
        let lull: SetState = serde_json::from_str("\"lull\"").unwrap();
        assert_eq!(lull, SetState::Lull);
    }
}
