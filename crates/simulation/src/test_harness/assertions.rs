//! Assertion helpers for `TestBeach` integration tests.

use crate::set_lull::SetState;

use super::TestBeach;

impl TestBeach {
    pub fn assert_state(&self, expected: SetState) {
        let actual = self.set_lull().set_state;
        assert_eq!(
            actual,
            expected,
            "Expected {} at {:.0}ms, found {}",
            expected.name(),
            self.game_time_ms(),
            actual.name()
        );
    }

    /// Assert live wave count is at most `max`.
    pub fn assert_wave_count_at_most(&self, max: usize) {
        let count = self.wave_count();
        assert!(
            count <= max,
            "Expected at most {max} live waves at {:.0}ms, got {count}",
            self.game_time_ms()
        );
    }

    /// Every field height, wave progress and foam value is finite.
    pub fn assert_all_finite(&self) {
        let world = self.world();
        assert!(
            world.field().heights().iter().all(|h| h.is_finite()),
            "non-finite energy field height at {:.0}ms",
            self.game_time_ms()
        );
        for wave in world.waves() {
            assert!(
                wave.progress_per_x.iter().all(|p| p.is_finite()),
                "wave {} has non-finite progress",
                wave.id
            );
        }
        assert!(
            world.foam().core().values().iter().all(|v| v.is_finite()),
            "non-finite foam intensity"
        );
    }

    /// Both countdowns satisfy `0 <= remaining <= total`.
    pub fn assert_countdowns_sane(&self) {
        let now = self.game_time_ms();
        for (what, c) in [
            ("state", self.set_lull().state_countdown(now)),
            ("wave", self.set_lull().wave_countdown(now)),
        ] {
            assert!(
                c.remaining_ms >= 0.0 && c.remaining_ms <= c.total_ms,
                "{what} countdown out of range at {now:.0}ms: {c:?}"
            );
        }
    }

    pub fn assert_outer_ring_present(&self) {
        let segments = self.contours().outer().map(|l| l.segments.len()).unwrap_or(0);
        assert!(
            segments > 0,
            "Expected an outer foam ring at {:.0}ms, found none",
            self.game_time_ms()
        );
    }
}
