//! Ray casting against the board outline.

use serde::Serialize;

use crate::geometry::{Point, EPSILON};
use crate::model::BoardOutline;

/// Tolerance for accepting hits at the ray origin or on an edge corner.
const RAY_EPSILON: f64 = 1e-6;

/// Where a ray leaves the board.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EdgeHit {
    /// Intersection point.
    pub point: Point,
    /// Ray parameter in units of `heading` (distance for a unit heading).
    pub t: f64,
}

/// Casts a ray from `origin` along `heading` and returns the first board edge
/// it reaches.
///
/// All four edges are tested. Hits behind the ray or outside the edge's extent
/// are discarded, and the smallest remaining parameter wins. A ray starting on
/// an edge and heading into the board ignores that edge and runs to the far
/// side. Returns `None` for
/// an empty outline, a zero heading, or a ray that never meets an edge (for
/// example one starting outside the board and pointing away from it).
#[must_use]
pub fn intersect_board_edge(origin: Point, heading: Point, outline: &BoardOutline) -> Option<EdgeHit> {
    if outline.is_empty() || !(origin.x.is_finite() && origin.y.is_finite()) {
        return None;
    }

    let hw = outline.half_width();
    let hh = outline.half_height();
    let mut best: Option<f64> = None;
    // `outward` is the heading's component along the edge's outward normal.
    let mut consider = |t: f64, outward: f64| {
        let entering_at_origin = t.abs() <= RAY_EPSILON && outward < 0.0;
        if t >= -RAY_EPSILON && !entering_at_origin && best.map_or(true, |b| t < b) {
            best = Some(t);
        }
    };

    if heading.x.abs() > EPSILON {
        for (edge_x, outward) in [(-hw, -heading.x), (hw, heading.x)] {
            let t = (edge_x - origin.x) / heading.x;
            let y = heading.y.mul_add(t, origin.y);
            if y.abs() <= hh + RAY_EPSILON {
                consider(t, outward);
            }
        }
    }

    if heading.y.abs() > EPSILON {
        for (edge_y, outward) in [(-hh, -heading.y), (hh, heading.y)] {
            let t = (edge_y - origin.y) / heading.y;
            let x = heading.x.mul_add(t, origin.x);
            if x.abs() <= hw + RAY_EPSILON {
                consider(t, outward);
            }
        }
    }

    best.map(|t| {
        let t = t.max(0.0);
        EdgeHit {
            point: origin + heading * t,
            t,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> BoardOutline {
        BoardOutline::new(400.0, 200.0)
    }

    #[test]
    fn hits_right_edge() {
        let hit = intersect_board_edge(Point::ZERO, Point::new(1.0, 0.0), &board()).unwrap();
        assert!(hit.point.approx_eq(Point::new(200.0, 0.0), 1e-9));
        assert!((hit.t - 200.0).abs() < 1e-9);
    }

    #[test]
    fn picks_nearest_edge_on_diagonal() {
        let dir = Point::new(1.0, 1.0).normalize();
        let hit = intersect_board_edge(Point::ZERO, dir, &board()).unwrap();
        // Top edge (y = 100) is reached before the right edge.
        assert!(hit.point.approx_eq(Point::new(100.0, 100.0), 1e-9));
    }

    #[test]
    fn origin_on_edge_gives_zero_length_hit() {
        let hit = intersect_board_edge(Point::new(0.0, 100.0), Point::new(0.0, 1.0), &board()).unwrap();
        assert!(hit.t.abs() < 1e-9);
        assert!(hit.point.approx_eq(Point::new(0.0, 100.0), 1e-9));
    }

    #[test]
    fn origin_on_edge_heading_inward_reaches_far_edge() {
        let hit = intersect_board_edge(Point::new(0.0, -100.0), Point::new(0.0, 1.0), &board()).unwrap();
        assert!(hit.point.approx_eq(Point::new(0.0, 100.0), 1e-9));
        assert!((hit.t - 200.0).abs() < 1e-9);

        // From a corner heading along the bottom edge, the far side ends it.
        let hit = intersect_board_edge(Point::new(-200.0, -100.0), Point::new(1.0, 0.0), &board()).unwrap();
        assert!(hit.point.approx_eq(Point::new(200.0, -100.0), 1e-9));
    }

    #[test]
    fn outside_and_pointing_away_misses() {
        assert!(intersect_board_edge(Point::new(300.0, 0.0), Point::new(1.0, 0.0), &board()).is_none());
    }

    #[test]
    fn outside_and_pointing_inward_hits_near_edge() {
        let hit = intersect_board_edge(Point::new(300.0, 0.0), Point::new(-1.0, 0.0), &board()).unwrap();
        assert!(hit.point.approx_eq(Point::new(200.0, 0.0), 1e-9));
        assert!((hit.t - 100.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_inputs_miss() {
        assert!(intersect_board_edge(Point::ZERO, Point::ZERO, &board()).is_none());
        assert!(intersect_board_edge(Point::ZERO, Point::new(1.0, 0.0), &BoardOutline::new(0.0, 0.0)).is_none());
    }
}
