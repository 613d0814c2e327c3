//! Hit-testing and snapping against placed instances.

use std::f64::consts::FRAC_PI_4;

use crate::geometry::{point_to_segment_distance_squared, Point};
use crate::layout::anchors::{dogbone_segments, is_connected, resolve_anchors, signal_pair};
use crate::model::{Design, InstanceId, InstanceKind, PlacedInstance};

/// Half side of the square marker drawn for a disconnected dependent.
pub const PLACEHOLDER_HALF_SIZE: f64 = 5.0;

/// Returns the instance under `point`, if any.
///
/// Instances are tested newest first. A dogbone only wins when nothing else
/// is hit, so a stub lying over its parent never steals the click.
#[must_use]
pub fn hit_test(point: Point, design: &Design) -> Option<InstanceId> {
    let mut dogbone_hit = None;
    for instance in design.instances.iter().rev() {
        if !hits_instance(point, instance, design) {
            continue;
        }
        if !instance.is_dogbone() {
            return Some(instance.id);
        }
        dogbone_hit.get_or_insert(instance.id);
    }
    dogbone_hit
}

/// Returns true if `point` lies on the instance's geometry.
#[must_use]
pub fn hits_instance(point: Point, instance: &PlacedInstance, design: &Design) -> bool {
    if !is_connected(instance, design) {
        // Disconnected placeholder: a fixed box around the stored position.
        let d = point - instance.position;
        return d.x.abs() <= PLACEHOLDER_HALF_SIZE && d.y.abs() <= PLACEHOLDER_HALF_SIZE;
    }

    if resolve_anchors(instance, design)
        .iter()
        .any(|a| point.distance(a.position) <= a.radius)
    {
        return true;
    }

    if let InstanceKind::Dogbone(dogbone) = &instance.kind {
        let half_width = dogbone.width.max(0.0) / 2.0;
        if dogbone_segments(instance, design)
            .iter()
            .any(|s| s.distance_squared_to(point) <= half_width * half_width)
        {
            return true;
        }
    }

    if let Some([negative, positive]) = signal_pair(instance, design) {
        let tolerance = negative.radius;
        if point_to_segment_distance_squared(point, negative.position, positive.position) <= tolerance * tolerance {
            return true;
        }
    }

    false
}

/// Snaps `point` to the nearest anchor feature within reach.
///
/// Candidates are every anchor centre plus eight points at 45° steps on each
/// anchor's circumference. The reach is `max_screen_distance` pixels at the
/// given `scale` (pixels per board unit). Without a candidate in reach the
/// input point is returned.
#[must_use]
pub fn snap(point: Point, max_screen_distance: f64, scale: f64, design: &Design) -> Point {
    snap_excluding(point, max_screen_distance, scale, design, None)
}

/// Like [`snap`], ignoring one instance (typically the one being dragged).
#[must_use]
pub fn snap_excluding(
    point: Point,
    max_screen_distance: f64,
    scale: f64,
    design: &Design,
    exclude: Option<InstanceId>,
) -> Point {
    if !(scale.is_finite() && scale > 0.0 && max_screen_distance.is_finite() && max_screen_distance >= 0.0) {
        return point;
    }
    let reach = max_screen_distance / scale;

    let best = snap_candidates(design, exclude)
        .into_iter()
        .map(|candidate| (candidate, candidate.distance(point)))
        .min_by(|a, b| a.1.total_cmp(&b.1));

    match best {
        Some((candidate, distance)) if distance <= reach => {
            tracing::trace!(x = candidate.x, y = candidate.y, distance, "Snapped");
            candidate
        }
        _ => point,
    }
}

/// Every snap target in the design.
#[must_use]
pub fn snap_candidates(design: &Design, exclude: Option<InstanceId>) -> Vec<Point> {
    let mut candidates = Vec::new();
    for instance in design.instances.iter().filter(|i| Some(i.id) != exclude) {
        for anchor in resolve_anchors(instance, design) {
            candidates.push(anchor.position);
            if anchor.radius > 0.0 {
                candidates.extend(
                    (0..8_u8).map(|k| anchor.position + Point::from_angle(f64::from(k) * FRAC_PI_4) * anchor.radius),
                );
            }
        }
    }
    candidates
}
