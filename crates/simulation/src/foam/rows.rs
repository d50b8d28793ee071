use serde::{Deserialize, Serialize};

/// One breaking span along a foam row, in normalized x.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoamSegment {
    pub start_x: f32,
    pub end_x: f32,
    /// Peak intensity at deposit time, in `[0, 1]`.
    pub intensity: f32,
}

impl FoamSegment {
    pub fn new(start_x: f32, end_x: f32, intensity: f32) -> Self {
        let (start_x, end_x) = if start_x <= end_x {
            (start_x, end_x)
        } else {
            (end_x, start_x)
        };
        Self {
            start_x,
            end_x,
            intensity: if intensity.is_nan() {
                0.0
            } else {
                intensity.clamp(0.0, 1.0)
            },
        }
    }
}

/// Foam deposited by one breaking event, at a fixed progress (normalized y).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoamRow {
    pub progress: f32,
    /// Deposit time in ms of game time.
    pub spawn_time: f64,
    #[serde(default)]
    pub segments: Vec<FoamSegment>,
}

impl FoamRow {
    pub fn age_ms(&self, game_time: f64) -> f64 {
        (game_time - self.spawn_time).max(0.0)
    }

    /// `clamp(1 - age / fade, 0, 1)`. A non-positive fade time means instant fade.
    pub fn opacity(&self, game_time: f64, fade_ms: f64) -> f32 {
        if fade_ms.is_nan() || fade_ms <= 0.0 {
            return 0.0;
        }
        (1.0 - self.age_ms(game_time) / fade_ms).clamp(0.0, 1.0) as f32
    }
}

/// Group breaking x-samples into contiguous segments.
///
/// `samples` are `(normalized_x, intensity)` pairs sorted by x. Neighbours no
/// further apart than `max_gap` join one segment carrying the peak intensity.
pub fn spans_from_samples(samples: &[(f32, f32)], max_gap: f32) -> Vec<FoamSegment> {
    let mut segments: Vec<FoamSegment> = Vec::new();
    for &(x, intensity) in samples {
        match segments.last_mut() {
            Some(last) if x - last.end_x <= max_gap => {
                last.end_x = x;
                last.intensity = last.intensity.max(intensity.clamp(0.0, 1.0));
            }
            _ => segments.push(FoamSegment::new(x, x, intensity)),
        }
    }
    segments
}

/// Drop rows that have fully faded. Must run every tick to keep the list bounded.
pub fn reap_foam_rows(rows: &mut Vec<FoamRow>, game_time: f64, fade_ms: f64) {
    rows.retain(|row| row.opacity(game_time, fade_ms) > 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(spawn_time: f64) -> FoamRow {
        FoamRow {
            progress: 0.8,
            spawn_time,
            segments: vec![FoamSegment::new(0.2, 0.4, 0.9)],
        }
    }

    #[test]
    fn test_opacity_fades_linearly() {
        let r = row(1_000.0);
        assert_eq!(r.opacity(1_000.0, 8_000.0), 1.0);
        assert!((r.opacity(5_000.0, 8_000.0) - 0.5).abs() < 1e-6);
        assert_eq!(r.opacity(9_000.0, 8_000.0), 0.0);
        assert_eq!(r.opacity(500.0, 8_000.0), 1.0, "clock before deposit");
    }

    #[test]
    fn test_zero_fade_is_instant() {
        assert_eq!(row(0.0).opacity(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_reap_removes_faded_rows() {
        let mut rows = vec![row(0.0), row(5_000.0), row(9_000.0)];
        reap_foam_rows(&mut rows, 10_000.0, 8_000.0);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.spawn_time >= 5_000.0));
    }

    #[test]
    fn test_segment_normalizes_order_and_intensity() {
        let s = FoamSegment::new(0.7, 0.3, 4.0);
        assert_eq!((s.start_x, s.end_x), (0.3, 0.7));
        assert_eq!(s.intensity, 1.0);
        assert_eq!(FoamSegment::new(0.1, 0.2, f32::NAN).intensity, 0.0);
    }

    #[test]
    fn test_spans_join_neighbouring_samples() {
        let samples = [(0.1, 0.3), (0.13, 0.5), (0.16, 0.2), (0.6, 0.7)];
        let spans = spans_from_samples(&samples, 0.05);
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start_x, spans[0].end_x), (0.1, 0.16));
        assert_eq!(spans[0].intensity, 0.5);
        assert_eq!(spans[1].start_x, 0.6);
    }
}
