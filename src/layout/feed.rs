//! Feed trace construction.
//!
//! A feed leaves a via along (feed-out) or against (feed-in) the arrow
//! direction. The centreline is a straight run, an optional circular turn and
//! a terminal run that either has an explicit length or extends to the board
//! edge. Differential pairs offset the centreline into two rails and bend
//! each via onto its rail with a short jog.

use serde::Serialize;

use crate::geometry::{deg_to_rad, finite_or, sample_arc, Point, ARC_STEPS, EPSILON};
use crate::layout::edge::intersect_board_edge;
use crate::model::{ArrowDirection, BoardOutline, DiffPair, Design, FeedSide, FeedSpec, InstanceKind, PlacedInstance};

/// Tolerance below which a jog is not drawn and rail points are considered
/// coincident.
const JOG_EPSILON: f64 = 1e-6;

/// An open polyline in board coordinates.
pub type Polyline = Vec<Point>;

/// Feed traces of one instance.
///
/// Single vias have at most one polyline per side; pairs have two (negative
/// member's rail first). A disabled side is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedPaths {
    /// Incoming traces.
    pub feed_in: Vec<Polyline>,
    /// Outgoing traces.
    pub feed_out: Vec<Polyline>,
}

impl FeedPaths {
    /// Returns true if neither side produced a trace.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.feed_in.is_empty() && self.feed_out.is_empty()
    }
}

/// Builds the feed traces of an instance.
///
/// Only single vias and differential pairs have feeds; every other kind
/// returns empty paths.
#[must_use]
pub fn build_feed_paths(instance: &PlacedInstance, design: &Design) -> FeedPaths {
    let build = |side: FeedSide| -> Vec<Polyline> {
        match &instance.kind {
            InstanceKind::Single(via) => single_feed(instance, via.arrow_direction, side, via.feed(side), &design.outline)
                .into_iter()
                .collect(),
            InstanceKind::Differential(pair) | InstanceKind::DiffGround { pair, .. } => {
                differential_feed(instance, pair, side, &design.outline)
            }
            _ => Vec::new(),
        }
    };

    FeedPaths {
        feed_in: build(FeedSide::In),
        feed_out: build(FeedSide::Out),
    }
}

/// Length of the 45° jog that moves a via onto its rail.
#[must_use]
pub fn jog_length(via_pitch: f64, trace_pitch: f64) -> f64 {
    (finite_or(via_pitch, 0.0) - trace_pitch).abs() / 2.0
}

/// Builds a centreline from `origin` heading along `heading`.
///
/// `straight` is the initial run (d1, already clamped by the caller). The
/// turn and terminal run come from `spec`. When the terminal run goes to the
/// board edge and the ray misses, the line stops at its last point.
#[must_use]
pub fn centerline(origin: Point, heading: Point, straight: f64, spec: &FeedSpec, outline: &BoardOutline) -> Polyline {
    let mut heading = heading.normalize();
    let mut cursor = origin;
    let mut points = vec![origin];

    if straight > EPSILON {
        cursor = cursor + heading * straight;
        points.push(cursor);
    }

    let angle = deg_to_rad(finite_or(spec.turn_angle, 0.0));
    let radius = finite_or(spec.turn_radius, 0.0);
    if angle.abs() > EPSILON && radius > EPSILON {
        // Centre sits on the side the turn bends towards.
        let center = cursor + heading.perp() * (radius * angle.signum());
        let spoke = cursor - center;
        let arc = sample_arc(center, radius, spoke.y.atan2(spoke.x), angle, ARC_STEPS);
        points.extend(arc.into_iter().skip(1));
        if let Some(&end) = points.last() {
            cursor = end;
        }
        heading = heading.rotate(angle);
    }

    match spec.end_length.filter(|d2| d2.is_finite() && *d2 > EPSILON) {
        Some(d2) => points.push(cursor + heading * d2),
        None => match intersect_board_edge(cursor, heading, outline) {
            Some(hit) if hit.t > EPSILON => points.push(hit.point),
            Some(_) => {}
            None => tracing::trace!(x = cursor.x, y = cursor.y, "Feed ray misses the board edge"),
        },
    }

    points
}

/// Offsets a centreline sideways by `half_pitch` on both sides.
///
/// Returns `(left, right)` where left is on the +90° side of the direction
/// of travel. Each vertex uses its outgoing segment's direction, the last
/// vertex its incoming one and a lone vertex `heading`.
#[must_use]
pub fn offset_rails(line: &[Point], heading: Point, half_pitch: f64) -> (Polyline, Polyline) {
    let n = line.len();
    line.iter()
        .enumerate()
        .map(|(i, &p)| {
            let direction = if i == 0 {
                heading.normalize()
            } else if i + 1 == n {
                (p - line[i - 1]).normalize()
            } else {
                (line[i + 1] - p).normalize()
            };
            let normal = direction.perp() * half_pitch;
            (p + normal, p - normal)
        })
        .unzip()
}

fn single_feed(
    instance: &PlacedInstance,
    arrow: ArrowDirection,
    side: FeedSide,
    spec: &FeedSpec,
    outline: &BoardOutline,
) -> Option<Polyline> {
    if !spec.is_enabled() {
        tracing::trace!(name = %instance.name, ?side, "Feed disabled");
        return None;
    }

    let heading = side.direction(arrow).heading();
    let straight = finite_or(spec.straight_length, 0.0).max(0.0);
    Some(centerline(instance.position, heading, straight, spec, outline))
}

fn differential_feed(instance: &PlacedInstance, pair: &DiffPair, side: FeedSide, outline: &BoardOutline) -> Vec<Polyline> {
    let spec = pair.feed(side);
    if !spec.is_enabled() || !(spec.spacing.is_finite() && spec.spacing >= 0.0) {
        tracing::trace!(name = %instance.name, ?side, "Feed disabled");
        return Vec::new();
    }

    let trace_pitch = spec.trace_pitch();
    let jog = jog_length(pair.pitch, trace_pitch);
    let straight = finite_or(spec.straight_length, 0.0).max(jog);
    let heading = side.direction(pair.arrow_direction).heading();

    let line = centerline(instance.position, heading, straight, spec, outline);
    let (left, right) = offset_rails(&line, heading, trace_pitch / 2.0);

    let offset = pair.member_offset();
    let negative = instance.position - offset;
    let positive = instance.position + offset;

    // Pick the assignment with the shorter total reach so the rails never cross.
    let straight_cost = negative.distance(left[0]) + positive.distance(right[0]);
    let swapped_cost = negative.distance(right[0]) + positive.distance(left[0]);
    let (negative_rail, positive_rail) = if straight_cost <= swapped_cost {
        (left, right)
    } else {
        (right, left)
    };

    tracing::trace!(name = %instance.name, ?side, jog, trace_pitch, "Built differential feed");
    vec![
        attach_via(negative, &negative_rail, heading, jog),
        attach_via(positive, &positive_rail, heading, jog),
    ]
}

/// Replaces the rail's start with the via and inserts the jog point.
fn attach_via(via: Point, rail: &[Point], heading: Point, jog: f64) -> Polyline {
    let mut path = Vec::with_capacity(rail.len() + 1);
    path.push(via);

    let mut rest = rail.get(1..).unwrap_or_default();
    if jog > JOG_EPSILON {
        if let Some(&start) = rail.first() {
            let knee = start + heading * jog;
            path.push(knee);
            if rest.first().is_some_and(|p| p.approx_eq(knee, JOG_EPSILON)) {
                rest = &rest[1..];
            }
        }
    }
    path.extend_from_slice(rest);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Orientation, SingleVia};

    fn board() -> Design {
        Design::new(BoardOutline::new(400.0, 200.0))
    }

    fn single(arrow: ArrowDirection, feed_in: FeedSpec, feed_out: FeedSpec) -> PlacedInstance {
        PlacedInstance::new(
            "V",
            Point::ZERO,
            InstanceKind::Single(SingleVia {
                arrow_direction: arrow,
                feed_in,
                feed_out,
            }),
        )
    }

    fn pair(pitch: f64, orientation: Orientation, feed_out: FeedSpec) -> PlacedInstance {
        let mut pair = DiffPair::new(pitch, orientation);
        pair.feed_out = feed_out;
        PlacedInstance::new("P", Point::ZERO, InstanceKind::Differential(pair))
    }

    fn assert_path(actual: &[Point], expected: &[(f64, f64)]) {
        assert_eq!(actual.len(), expected.len(), "path {actual:?}");
        for (p, &(x, y)) in actual.iter().zip(expected) {
            assert!(p.approx_eq(Point::new(x, y), 1e-9), "{p:?} != ({x}, {y}) in {actual:?}");
        }
    }

    #[test]
    fn single_feed_out_runs_to_edge() {
        let inst = single(ArrowDirection::Up, FeedSpec::default(), FeedSpec::with_width(10.0));
        let paths = build_feed_paths(&inst, &board());

        assert!(paths.feed_in.is_empty());
        assert_eq!(paths.feed_out.len(), 1);
        assert_path(&paths.feed_out[0], &[(0.0, 0.0), (0.0, 100.0)]);
    }

    #[test]
    fn single_feed_in_heads_against_arrow() {
        let inst = single(
            ArrowDirection::Right,
            FeedSpec::with_width(10.0).straight(20.0).end_length(30.0),
            FeedSpec::default(),
        );
        let paths = build_feed_paths(&inst, &board());
        assert_path(&paths.feed_in[0], &[(0.0, 0.0), (-20.0, 0.0), (-50.0, 0.0)]);
    }

    #[test]
    fn turn_bends_counter_clockwise() {
        let spec = FeedSpec::with_width(10.0).straight(10.0).turn(90.0, 20.0).end_length(5.0);
        let line = centerline(Point::ZERO, Point::new(0.0, 1.0), 10.0, &spec, &BoardOutline::new(400.0, 200.0));

        // origin, d1, 10 arc segments, d2
        assert_eq!(line.len(), 2 + ARC_STEPS + 1);
        assert!(line[1].approx_eq(Point::new(0.0, 10.0), 1e-9));
        let arc_end = line[1 + ARC_STEPS];
        assert!(arc_end.approx_eq(Point::new(-20.0, 30.0), 1e-9));
        assert!(line[line.len() - 1].approx_eq(Point::new(-25.0, 30.0), 1e-9));

        // Every arc sample stays on the turn circle.
        let center = Point::new(-20.0, 10.0);
        for p in &line[1..=1 + ARC_STEPS] {
            assert!((p.distance(center) - 20.0).abs() < 1e-9);
        }
    }

    #[test]
    fn negative_turn_bends_clockwise() {
        let spec = FeedSpec::with_width(10.0).turn(-90.0, 10.0).end_length(1.0);
        let line = centerline(Point::ZERO, Point::new(0.0, 1.0), 0.0, &spec, &BoardOutline::new(400.0, 200.0));
        assert!(line[ARC_STEPS].approx_eq(Point::new(10.0, 10.0), 1e-9));
        assert!(line[ARC_STEPS + 1].approx_eq(Point::new(11.0, 10.0), 1e-9));
    }

    #[test]
    fn degenerate_specs_disable_or_zero_out() {
        let d = board();
        let zero_width = single(ArrowDirection::Up, FeedSpec::with_width(0.0), FeedSpec::with_width(f64::NAN));
        assert!(build_feed_paths(&zero_width, &d).is_empty());

        let mut nan_turn = FeedSpec::with_width(10.0).turn(f64::NAN, 20.0);
        nan_turn.straight_length = f64::INFINITY;
        nan_turn.end_length = Some(f64::NAN);
        let inst = single(ArrowDirection::Up, FeedSpec::default(), nan_turn);
        assert_path(&build_feed_paths(&inst, &d).feed_out[0], &[(0.0, 0.0), (0.0, 100.0)]);

        let bad_spacing = pair(40.0, Orientation::Horizontal, FeedSpec::with_width(5.0).spacing(-1.0));
        assert!(build_feed_paths(&bad_spacing, &d).feed_out.is_empty());
    }

    #[test]
    fn explicit_zero_end_length_extends_to_edge() {
        let inst = single(ArrowDirection::Left, FeedSpec::default(), FeedSpec::with_width(5.0).end_length(0.0));
        assert_path(&build_feed_paths(&inst, &board()).feed_out[0], &[(0.0, 0.0), (-200.0, 0.0)]);
    }

    #[test]
    fn jog_clamps_straight_run() {
        assert!((jog_length(40.0, 10.0) - 15.0).abs() < 1e-12);

        let inst = pair(40.0, Orientation::Horizontal, FeedSpec::with_width(5.0).spacing(5.0).straight(5.0));
        let paths = build_feed_paths(&inst, &board());
        assert_eq!(paths.feed_out.len(), 2);

        // Via, jog knee (which coincides with the clamped d1 point), edge.
        assert_path(&paths.feed_out[0], &[(-20.0, 0.0), (-5.0, 15.0), (-5.0, 100.0)]);
        assert_path(&paths.feed_out[1], &[(20.0, 0.0), (5.0, 15.0), (5.0, 100.0)]);
    }

    #[test]
    fn longer_straight_keeps_rail_point() {
        let inst = pair(40.0, Orientation::Horizontal, FeedSpec::with_width(5.0).spacing(5.0).straight(30.0));
        let paths = build_feed_paths(&inst, &board());
        assert_path(&paths.feed_out[0], &[(-20.0, 0.0), (-5.0, 15.0), (-5.0, 30.0), (-5.0, 100.0)]);
    }

    #[test]
    fn matching_pitch_has_no_jog() {
        let inst = pair(10.0, Orientation::Vertical, FeedSpec::with_width(5.0).spacing(5.0));
        let paths = build_feed_paths(&inst, &board());
        // Vertical pair points Right by default.
        assert_path(&paths.feed_out[0], &[(0.0, -5.0), (200.0, -5.0)]);
        assert_path(&paths.feed_out[1], &[(0.0, 5.0), (200.0, 5.0)]);
    }

    #[test]
    fn rails_follow_turn_without_crossing() {
        let spec = FeedSpec::with_width(5.0).spacing(5.0).straight(20.0).turn(-45.0, 30.0).end_length(40.0);
        let inst = pair(40.0, Orientation::Horizontal, spec);
        let paths = build_feed_paths(&inst, &board());
        let [neg, pos] = [&paths.feed_out[0], &paths.feed_out[1]];
        assert_eq!(neg.len(), pos.len());

        // Corresponding points stay roughly one trace pitch apart.
        for (a, b) in neg.iter().zip(pos.iter()).skip(1) {
            let gap = a.distance(*b);
            assert!(gap > 5.0 && gap < 15.0, "gap {gap} between {a:?} and {b:?}");
        }
    }

    #[test]
    fn offset_rails_use_forward_differences() {
        let line = [Point::ZERO, Point::new(0.0, 10.0), Point::new(10.0, 10.0)];
        let (left, right) = offset_rails(&line, Point::new(0.0, 1.0), 1.0);
        assert!(left[0].approx_eq(Point::new(-1.0, 0.0), 1e-12));
        // Interior vertex uses the outgoing (+x) segment.
        assert!(left[1].approx_eq(Point::new(0.0, 11.0), 1e-12));
        assert!(right[2].approx_eq(Point::new(10.0, 9.0), 1e-12));
    }

    #[test]
    fn non_feed_kinds_are_empty() {
        let ground = PlacedInstance::new("G", Point::ZERO, InstanceKind::Ground);
        assert!(build_feed_paths(&ground, &board()).is_empty());
    }
}
