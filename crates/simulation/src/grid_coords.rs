//! Mapping between normalized coordinates and grid cells.
//!
//! Normalized x runs 0..1 across the beach, normalized y ("progress") runs from
//! the horizon (0) to the shore (1). Everything here clamps instead of failing,
//! so boundary samples never index out of bounds.

/// Clamp a normalized coordinate to `[0, 1]`. NaN maps to 0.
#[inline]
pub fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Continuous cell coordinate for a normalized value on an axis of `len` cells.
#[inline]
pub fn normalized_to_cell(value: f32, len: usize) -> f32 {
    if len <= 1 {
        return 0.0;
    }
    clamp_unit(value) * (len - 1) as f32
}

/// Nearest valid cell index for a normalized value.
#[inline]
pub fn cell_index(value: f32, len: usize) -> usize {
    let cell = normalized_to_cell(value, len).round() as usize;
    cell.min(len.saturating_sub(1))
}

/// Normalized coordinate of a cell centre. A single-cell axis maps to 0.5.
#[inline]
pub fn cell_to_normalized(index: usize, len: usize) -> f32 {
    if len <= 1 {
        return 0.5;
    }
    (index.min(len - 1)) as f32 / (len - 1) as f32
}

/// Lower cell, upper cell and blend factor for linear interpolation along an axis.
#[inline]
pub fn lerp_cells(value: f32, len: usize) -> (usize, usize, f32) {
    let cell = normalized_to_cell(value, len);
    let lo = (cell.floor() as usize).min(len.saturating_sub(1));
    let hi = (lo + 1).min(len.saturating_sub(1));
    (lo, hi, cell - lo as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_unit_handles_out_of_range_and_nan() {
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(1.5), 1.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert_eq!(clamp_unit(f32::NAN), 0.0);
    }

    #[test]
    fn test_cell_index_clamps_to_bounds() {
        assert_eq!(cell_index(-3.0, 60), 0);
        assert_eq!(cell_index(7.0, 60), 59);
        assert_eq!(cell_index(0.5, 61), 30);
        assert_eq!(cell_index(0.5, 1), 0);
    }

    #[test]
    fn test_cell_to_normalized_roundtrip_at_edges() {
        assert_eq!(cell_to_normalized(0, 40), 0.0);
        assert_eq!(cell_to_normalized(39, 40), 1.0);
        assert_eq!(cell_to_normalized(100, 40), 1.0);
        assert_eq!(cell_to_normalized(0, 1), 0.5);
    }

    #[test]
    fn test_lerp_cells_at_upper_edge() {
        let (lo, hi, t) = lerp_cells(1.0, 10);
        assert_eq!(lo, 9);
        assert_eq!(hi, 9);
        assert!(t.abs() < 1e-6);
    }
}
