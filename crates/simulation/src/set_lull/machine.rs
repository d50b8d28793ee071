use bevy::log::debug;
use rand::Rng;

use crate::config::SetLullConfig;
use crate::wave::WaveType;

use super::state::{sanitize_duration, SetLullState, SetState};

/// Result of one `update` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SetLullOutcome {
    pub state: SetLullState,
    pub should_spawn_wave: bool,
    /// Amplitude for the spawned wave. Zero when nothing spawns.
    pub amplitude: f32,
    pub wave_type: WaveType,
    /// The state entered this tick, if a transition happened.
    pub transitioned_to: Option<SetState>,
}

// =============================================================================
// Random draws
// =============================================================================

/// `base +- variation`, uniformly. A non-positive variation, or a range with
/// non-finite bounds, returns `base`.
fn jitter<R: Rng + ?Sized>(rng: &mut R, base: f32, variation: f32) -> f32 {
    let (lo, hi) = (base - variation, base + variation);
    if variation > 0.0 && lo.is_finite() && hi.is_finite() {
        rng.gen_range(lo..=hi)
    } else {
        base
    }
}

/// Uniform draw from `[lo, hi]`, tolerating a reversed or empty range.
fn draw_between<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if hi > lo && lo.is_finite() && hi.is_finite() {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}

fn seconds_to_ms(s: f32) -> f64 {
    sanitize_duration(s as f64 * 1000.0)
}

fn draw_lull_duration_ms<R: Rng + ?Sized>(config: &SetLullConfig, rng: &mut R) -> f64 {
    seconds_to_ms(jitter(
        rng,
        config.lull_duration_s,
        config.lull_duration_variation_s,
    ))
}

fn draw_wave_period_ms<R: Rng + ?Sized>(config: &SetLullConfig, rng: &mut R) -> f64 {
    seconds_to_ms(jitter(
        rng,
        config.wave_period_s,
        config.wave_period_variation_s,
    ))
}

fn draw_set_size<R: Rng + ?Sized>(config: &SetLullConfig, rng: &mut R) -> u32 {
    let lo = config.min_set_waves.min(config.max_set_waves).max(1);
    let hi = config.max_set_waves.max(lo);
    rng.gen_range(lo..=hi)
}

/// Longest a set may last before it is cut off, for `waves` planned waves.
fn set_time_cap_ms(config: &SetLullConfig, waves: u32) -> f64 {
    let longest_spacing = (config.wave_period_s + config.wave_period_variation_s.max(0.0)) as f64;
    sanitize_duration(
        waves as f64 * longest_spacing * config.set_time_cap_factor.max(1.0) as f64 * 1000.0,
    )
}

/// Build-peak-fade envelope over a set, in `[0.5, 1]`.
///
/// `t` is the fraction of the set completed; the envelope peaks at `peak`.
pub fn set_envelope(t: f32, peak: f32) -> f32 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let peak = if peak.is_nan() {
        0.4
    } else {
        peak.clamp(0.01, 0.99)
    };
    let shape = if t <= peak {
        t / peak
    } else {
        1.0 - (t - peak) / (1.0 - peak)
    };
    0.5 + 0.5 * shape
}

fn draw_set_amplitude<R: Rng + ?Sized>(state: &SetLullState, config: &SetLullConfig, rng: &mut R) -> f32 {
    let waves = state.current_set_waves.max(1) as f32;
    let t = (state.waves_spawned as f32 + 0.5) / waves;
    let envelope = set_envelope(t, config.envelope_peak);
    let factor = (envelope * rng.gen_range(0.9..=1.1_f32)).clamp(0.0, 1.0);
    let (lo, hi) = ordered(config.set_amplitude_min, config.set_amplitude_max);
    (lo + (hi - lo) * factor).min(hi)
}

fn draw_lull_amplitude<R: Rng + ?Sized>(config: &SetLullConfig, rng: &mut R) -> f32 {
    draw_between(rng, config.lull_amplitude_min, config.lull_amplitude_max).max(0.0)
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a.max(0.0), b.max(0.0))
    } else {
        (b.max(0.0), a.max(0.0))
    }
}

// =============================================================================
// Update
// =============================================================================

/// Advance the state machine to `game_time` (ms).
///
/// Transitions are evaluated before spawning, so a wave spawned on the same tick
/// as LULL -> SET is the first wave of the new set.
pub fn update<R: Rng + ?Sized>(
    state: &SetLullState,
    game_time: f64,
    config: &SetLullConfig,
    rng: &mut R,
) -> SetLullOutcome {
    let mut next = state.clone();
    let mut transitioned_to = None;

    match next.set_state {
        SetState::Lull => {
            if next.elapsed_in_state(game_time) >= sanitize_duration(next.set_duration) {
                let waves = draw_set_size(config, rng);
                next.set_state = SetState::Set;
                next.state_start_time = game_time;
                next.current_set_waves = waves;
                next.waves_spawned = 0;
                next.set_duration = set_time_cap_ms(config, waves);
                transitioned_to = Some(SetState::Set);
                debug!(
                    "Set/lull: LULL -> SET at {:.0}ms, {} waves planned",
                    game_time, waves
                );
            }
        }
        SetState::Set => {
            let all_spawned = next.waves_spawned >= next.current_set_waves;
            let capped = next.elapsed_in_state(game_time) >= sanitize_duration(next.set_duration);
            if all_spawned || capped {
                let lull_ms = draw_lull_duration_ms(config, rng);
                debug!(
                    "Set/lull: SET -> LULL at {:.0}ms after {}/{} waves{}",
                    game_time,
                    next.waves_spawned,
                    next.current_set_waves,
                    if capped && !all_spawned { " (time cap)" } else { "" }
                );
                next.set_state = SetState::Lull;
                next.state_start_time = game_time;
                next.set_duration = lull_ms;
                next.current_set_waves = 0;
                next.waves_spawned = 0;
                transitioned_to = Some(SetState::Lull);
            }
        }
    }

    let due = next.time_since_last_wave(game_time) >= sanitize_duration(next.next_wave_time);
    if !due {
        return SetLullOutcome {
            state: next,
            should_spawn_wave: false,
            amplitude: 0.0,
            wave_type: WaveType::Background,
            transitioned_to,
        };
    }

    let (amplitude, wave_type) = match next.set_state {
        SetState::Set => {
            let amplitude = draw_set_amplitude(&next, config, rng);
            next.waves_spawned += 1;
            (amplitude, WaveType::Set)
        }
        SetState::Lull => (draw_lull_amplitude(config, rng), WaveType::Background),
    };
    next.last_wave_spawn_time = game_time;
    next.next_wave_time = draw_wave_period_ms(config, rng);

    SetLullOutcome {
        state: next,
        should_spawn_wave: true,
        amplitude,
        wave_type,
        transitioned_to,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn test_draws_with_non_finite_ranges_return_base() {
        let mut rng = rng();
        assert!(jitter(&mut rng, f32::NAN, 1.0).is_nan());
        assert_eq!(jitter(&mut rng, f32::MAX, f32::MAX), f32::MAX);
        assert_eq!(jitter(&mut rng, 10.0, f32::INFINITY), 10.0);
        assert_eq!(draw_between(&mut rng, f32::NEG_INFINITY, 1.0), f32::NEG_INFINITY);
        let v = jitter(&mut rng, 10.0, 2.0);
        assert!((8.0..=12.0).contains(&v));
    }

    #[test]
    fn test_non_finite_config_does_not_panic() {
        let config = SetLullConfig {
            lull_duration_s: f32::NAN,
            wave_period_s: f32::MAX,
            wave_period_variation_s: f32::MAX,
            ..Default::default()
        };
        let mut rng = rng();
        let mut state = SetLullState::new_lull(0.0, 30_000.0, 15_000.0);
        for tick in 1..=120 {
            state = update(&state, tick as f64 * 1000.0, &config, &mut rng).state;
            assert!((0.0..=1.0).contains(&state.state_progress(tick as f64 * 1000.0)));
        }
    }

    #[test]
    fn test_lull_becomes_set_after_thirty_five_seconds() {
        let config = SetLullConfig::default();
        let mut rng = rng();
        let mut state = SetLullState::new_lull(0.0, 30_000.0, 15_000.0);
        for tick in 1..=35 {
            state = update(&state, tick as f64 * 1000.0, &config, &mut rng).state;
        }
        assert_eq!(state.set_state, SetState::Set);
        assert!((4..=8).contains(&state.current_set_waves));
    }

    #[test]
    fn test_no_transition_before_lull_ends() {
        let config = SetLullConfig::default();
        let mut rng = rng();
        let state = SetLullState::new_lull(0.0, 30_000.0, 15_000.0);
        let out = update(&state, 29_999.0, &config, &mut rng);
        assert_eq!(out.state.set_state, SetState::Lull);
        assert!(out.transitioned_to.is_none());
    }

    #[test]
    fn test_wave_spawns_when_spacing_elapses() {
        let config = SetLullConfig::default();
        let mut rng = rng();
        let state = SetLullState::new_lull(0.0, 30_000.0, 15_000.0);

        let early = update(&state, 14_000.0, &config, &mut rng);
        assert!(!early.should_spawn_wave);
        assert_eq!(early.amplitude, 0.0);

        let due = update(&state, 15_000.0, &config, &mut rng);
        assert!(due.should_spawn_wave);
        assert_eq!(due.wave_type, WaveType::Background);
        assert!(
            (0.2..=0.4).contains(&due.amplitude),
            "lull amplitude out of range: {}",
            due.amplitude
        );
        assert_eq!(due.state.last_wave_spawn_time, 15_000.0);
        assert!(
            (10_000.0..=20_000.0).contains(&due.state.next_wave_time),
            "period redrawn within 15s +- 5s, got {}",
            due.state.next_wave_time
        );
    }

    #[test]
    fn test_set_ends_after_all_waves_spawn() {
        let config = SetLullConfig {
            min_set_waves: 4,
            max_set_waves: 4,
            ..Default::default()
        };
        let mut rng = rng();
        let mut state = SetLullState::new_lull(0.0, 0.0, 0.0);
        let mut set_waves = 0;
        let mut t = 0.0;
        let mut returned_to_lull = false;
        while t < 200_000.0 {
            let out = update(&state, t, &config, &mut rng);
            if out.wave_type == WaveType::Set && out.should_spawn_wave {
                set_waves += 1;
            }
            if out.transitioned_to == Some(SetState::Lull) {
                returned_to_lull = true;
                break;
            }
            state = out.state;
            t += 500.0;
        }
        assert!(returned_to_lull, "set should end");
        assert_eq!(set_waves, 4);
    }

    #[test]
    fn test_set_time_cap_forces_lull() {
        let config = SetLullConfig::default();
        let mut rng = rng();
        let state = SetLullState {
            set_state: SetState::Set,
            state_start_time: 0.0,
            last_wave_spawn_time: 0.0,
            set_duration: 60_000.0,
            next_wave_time: 1.0e9,
            current_set_waves: 8,
            waves_spawned: 1,
        };
        let out = update(&state, 60_000.0, &config, &mut rng);
        assert_eq!(out.state.set_state, SetState::Lull);
        assert_eq!(out.transitioned_to, Some(SetState::Lull));
        assert!((25_000.0..=35_000.0).contains(&out.state.set_duration));
    }

    #[test]
    fn test_set_amplitudes_stay_in_range() {
        let config = SetLullConfig::default();
        let mut rng = rng();
        for spawned in 0..8 {
            let state = SetLullState {
                set_state: SetState::Set,
                state_start_time: 0.0,
                last_wave_spawn_time: 0.0,
                set_duration: 1.0e9,
                next_wave_time: 0.0,
                current_set_waves: 8,
                waves_spawned: spawned,
            };
            let out = update(&state, 1.0, &config, &mut rng);
            assert!(out.should_spawn_wave);
            assert_eq!(out.wave_type, WaveType::Set);
            assert!(
                (0.6..=1.2).contains(&out.amplitude),
                "set amplitude out of range: {}",
                out.amplitude
            );
        }
    }

    #[test]
    fn test_envelope_builds_peaks_and_fades() {
        let start = set_envelope(0.0, 0.4);
        let peak = set_envelope(0.4, 0.4);
        let end = set_envelope(1.0, 0.4);
        assert_eq!(peak, 1.0);
        assert!(start < peak && end < peak);
        assert!((0.5..=1.0).contains(&start));
        assert!((0.5..=1.0).contains(&end));
        assert!(set_envelope(0.2, 0.4) < set_envelope(0.3, 0.4));
        assert!(set_envelope(0.8, 0.4) < set_envelope(0.6, 0.4));
    }

    #[test]
    fn test_update_is_deterministic_for_a_seed() {
        let config = SetLullConfig::default();
        let run = || {
            let mut rng = rng();
            let mut state = SetLullState::default();
            let mut spawns = Vec::new();
            for tick in 0..600 {
                let out = update(&state, tick as f64 * 1000.0, &config, &mut rng);
                if out.should_spawn_wave {
                    spawns.push((tick, out.amplitude.to_bits()));
                }
                state = out.state;
            }
            spawns
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_reversed_config_ranges_do_not_panic() {
        let config = SetLullConfig {
            min_set_waves: 9,
            max_set_waves: 2,
            lull_amplitude_min: 0.5,
            lull_amplitude_max: 0.1,
            wave_period_variation_s: -3.0,
            ..Default::default()
        };
        let mut rng = rng();
        let mut state = SetLullState::new_lull(0.0, 0.0, 0.0);
        for tick in 0..200 {
            state = update(&state, tick as f64 * 1000.0, &config, &mut rng).state;
        }
        assert!(state.next_wave_time >= 0.0);
    }
}
