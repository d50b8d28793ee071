//! Marching squares contour extraction over an `IntensityGrid`.
//!
//! The grid is padded with a one-cell zero border before marching, so every
//! contour closes into a ring even when foam touches the grid edge. Each 2x2
//! cell block is classified by which corners are `>= threshold`
//! (tl = 8, tr = 4, br = 2, bl = 1), and crossings are placed by linear
//! interpolation along the cell edges. The ambiguous saddle cases (5 and 10)
//! are resolved by the average of the four corners.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::intensity::IntensityGrid;

/// A contour segment. `marching_squares` emits cell coordinates,
/// `extract_line_segments` converts them to normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Edge pairs crossed by the contour for a corner case.
fn case_edges(case: u8, center_inside: bool) -> &'static [(Edge, Edge)] {
    use Edge::*;
    match case {
        1 => &[(Left, Bottom)],
        2 => &[(Bottom, Right)],
        3 => &[(Left, Right)],
        4 => &[(Top, Right)],
        5 if center_inside => &[(Left, Top), (Bottom, Right)],
        5 => &[(Top, Right), (Left, Bottom)],
        6 => &[(Top, Bottom)],
        7 => &[(Left, Top)],
        8 => &[(Left, Top)],
        9 => &[(Top, Bottom)],
        10 if center_inside => &[(Top, Right), (Left, Bottom)],
        10 => &[(Left, Top), (Bottom, Right)],
        11 => &[(Top, Right)],
        12 => &[(Left, Right)],
        13 => &[(Bottom, Right)],
        14 => &[(Left, Bottom)],
        _ => &[],
    }
}

/// Fraction along `a -> b` where the value crosses `threshold`.
#[inline]
fn crossing(a: f32, b: f32, threshold: f32) -> f32 {
    let d = b - a;
    if d.abs() < 1e-9 {
        0.5
    } else {
        ((threshold - a) / d).clamp(0.0, 1.0)
    }
}

/// Run marching squares at one threshold.
///
/// Returns segments in cell coordinates of the unpadded grid, so points on the
/// padding sit between -1 and 0 (or between the last cell and one past it).
/// A non-positive or NaN threshold yields nothing.
pub fn marching_squares(grid: &IntensityGrid, threshold: f32) -> Vec<LineSegment> {
    let mut out = Vec::new();
    if threshold.is_nan() || threshold <= 0.0 {
        return out;
    }

    let (w, h) = (grid.width() as isize, grid.height() as isize);
    let sample = |x: isize, y: isize| -> f32 {
        if x < 0 || y < 0 || x >= w || y >= h {
            0.0
        } else {
            grid.get(x as usize, y as usize)
        }
    };

    // Block (cx, cy) has its top-left corner at cell (cx, cy), starting one
    // cell outside the grid.
    for cy in -1..h {
        for cx in -1..w {
            let tl = sample(cx, cy);
            let tr = sample(cx + 1, cy);
            let br = sample(cx + 1, cy + 1);
            let bl = sample(cx, cy + 1);

            let case = ((tl >= threshold) as u8) << 3
                | ((tr >= threshold) as u8) << 2
                | ((br >= threshold) as u8) << 1
                | (bl >= threshold) as u8;
            if case == 0 || case == 15 {
                continue;
            }
            let center_inside = (tl + tr + br + bl) * 0.25 >= threshold;

            let (x0, y0) = (cx as f32, cy as f32);
            let point = |edge: Edge| -> (f32, f32) {
                match edge {
                    Edge::Top => (x0 + crossing(tl, tr, threshold), y0),
                    Edge::Right => (x0 + 1.0, y0 + crossing(tr, br, threshold)),
                    Edge::Bottom => (x0 + crossing(bl, br, threshold), y0 + 1.0),
                    Edge::Left => (x0, y0 + crossing(tl, bl, threshold)),
                }
            };

            for &(a, b) in case_edges(case, center_inside) {
                let (x1, y1) = point(a);
                let (x2, y2) = point(b);
                out.push(LineSegment { x1, y1, x2, y2 });
            }
        }
    }
    out
}

#[inline]
fn cell_to_unit(value: f32, len: usize) -> f32 {
    if len <= 1 {
        return 0.5;
    }
    (value / (len - 1) as f32).clamp(0.0, 1.0)
}

/// Convert cell-space segments from a `width x height` grid to normalized
/// `[0, 1]` coordinates. Padding crossings clamp onto the grid edge.
pub fn extract_line_segments(
    segments: &[LineSegment],
    width: usize,
    height: usize,
) -> Vec<LineSegment> {
    segments
        .iter()
        .map(|s| LineSegment {
            x1: cell_to_unit(s.x1, width),
            y1: cell_to_unit(s.y1, height),
            x2: cell_to_unit(s.x2, width),
            y2: cell_to_unit(s.y2, height),
        })
        .collect()
}

// =============================================================================
// Contour levels and polylines
// =============================================================================

/// Axis-aligned bounding box in normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// True when `other` lies entirely inside `self`, within `eps`.
    pub fn contains(&self, other: &Bounds, eps: f32) -> bool {
        other.min_x >= self.min_x - eps
            && other.min_y >= self.min_y - eps
            && other.max_x <= self.max_x + eps
            && other.max_y <= self.max_y + eps
    }
}

/// Normalized segments extracted at one threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContourLevel {
    pub threshold: f32,
    pub segments: Vec<LineSegment>,
}

impl ContourLevel {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let first = self.segments.first()?;
        let mut b = Bounds {
            min_x: first.x1,
            min_y: first.y1,
            max_x: first.x1,
            max_y: first.y1,
        };
        for s in &self.segments {
            for (x, y) in [(s.x1, s.y1), (s.x2, s.y2)] {
                b.min_x = b.min_x.min(x);
                b.min_y = b.min_y.min(y);
                b.max_x = b.max_x.max(x);
                b.max_y = b.max_y.max(y);
            }
        }
        Some(b)
    }

    pub fn polylines(&self) -> Vec<Polyline> {
        chain_segments(&self.segments)
    }
}

/// Connected run of contour points. `closed` rings end where they start.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<(f32, f32)>,
    pub closed: bool,
}

type PointKey = (i64, i64);

#[inline]
fn point_key(x: f32, y: f32) -> PointKey {
    ((x as f64 * 1e5).round() as i64, (y as f64 * 1e5).round() as i64)
}

/// Join segments that share endpoints into polylines.
///
/// Endpoints are matched after quantizing to 1e-5, so neighbouring cells that
/// computed the same crossing independently still connect.
pub fn chain_segments(segments: &[LineSegment]) -> Vec<Polyline> {
    let mut by_point: BTreeMap<PointKey, Vec<usize>> = BTreeMap::new();
    for (i, s) in segments.iter().enumerate() {
        by_point.entry(point_key(s.x1, s.y1)).or_default().push(i);
        by_point.entry(point_key(s.x2, s.y2)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut lines = Vec::new();

    // Follow unused segments away from `from`, returning the points visited.
    let walk = |from: (f32, f32), used: &mut Vec<bool>| -> Vec<(f32, f32)> {
        let mut points = Vec::new();
        let mut cursor = from;
        loop {
            let key = point_key(cursor.0, cursor.1);
            let next = by_point
                .get(&key)
                .and_then(|ids| ids.iter().copied().find(|&i| !used[i]));
            let Some(i) = next else { break };
            used[i] = true;
            let s = segments[i];
            cursor = if point_key(s.x1, s.y1) == key {
                (s.x2, s.y2)
            } else {
                (s.x1, s.y1)
            };
            points.push(cursor);
        }
        points
    };

    for i in 0..segments.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let s = segments[i];
        let mut points: VecDeque<(f32, f32)> = VecDeque::from([(s.x1, s.y1), (s.x2, s.y2)]);
        for p in walk((s.x2, s.y2), &mut used) {
            points.push_back(p);
        }
        for p in walk((s.x1, s.y1), &mut used) {
            points.push_front(p);
        }

        let points: Vec<(f32, f32)> = points.into_iter().collect();
        let closed = points.len() > 2
            && points.first().map(|&(x, y)| point_key(x, y))
                == points.last().map(|&(x, y)| point_key(x, y));
        lines.push(Polyline { points, closed });
    }
    lines
}
