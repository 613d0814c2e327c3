//! Resolution of an instance's physical anchor points.
//!
//! An anchor is a circle the canvas draws and the picker hits: a signal via,
//! a ground via or a dogbone end pad. Anchors are derived fresh from the
//! instance, its padstack and (for dependent kinds) its parent.

use std::f64::consts::PI;

use serde::Serialize;

use crate::geometry::{deg_to_rad, finite_or, sample_arc, Point, Segment, ARC_STEPS};
use crate::model::{DiffPair, Dogbone, Design, GroundRing, InstanceKind, Orientation, Padstack, PlacedInstance};

/// What an anchor represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorRole {
    /// Signal via.
    Signal,
    /// Ground via.
    Ground,
    /// End pad of a dogbone stub.
    DogboneEnd,
}

/// A resolved via or pad circle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Anchor {
    /// Centre.
    pub position: Point,
    /// Radius; zero when the padstack is missing.
    pub radius: f64,
    /// What the anchor is.
    pub role: AnchorRole,
}

impl Anchor {
    /// Creates an anchor.
    #[must_use]
    pub const fn new(position: Point, radius: f64, role: AnchorRole) -> Self {
        Self { position, radius, role }
    }
}

/// Returns the anchors of an instance.
///
/// Differential kinds list the negative member first, then the positive one,
/// then any ground-ring vias. Dependent kinds whose parent does not resolve
/// (or is of the wrong kind) return an empty list.
#[must_use]
pub fn resolve_anchors(instance: &PlacedInstance, design: &Design) -> Vec<Anchor> {
    match &instance.kind {
        InstanceKind::Single(_) => vec![Anchor::new(
            instance.position,
            design.via_radius(instance.padstack),
            AnchorRole::Signal,
        )],
        InstanceKind::Ground => vec![Anchor::new(
            instance.position,
            design.via_radius(instance.padstack),
            AnchorRole::Ground,
        )],
        InstanceKind::Differential(pair) => {
            pair_anchors(instance.position, pair, design.via_radius(instance.padstack)).to_vec()
        }
        InstanceKind::DiffGround { pair, ring } => {
            let signals = pair_anchors(instance.position, pair, design.via_radius(instance.padstack));
            let mut anchors = signals.to_vec();
            anchors.extend(ring_anchors(&signals, pair.orientation, ring, design));
            anchors
        }
        InstanceKind::Dogbone(dogbone) => dogbone_geometry(instance, dogbone, design)
            .into_iter()
            .map(|(_, end)| end)
            .collect(),
        InstanceKind::SurroundViaArray(ring) => match parent_pair(instance, design) {
            Some((parent, pair)) => {
                let signals = pair_anchors(parent.position, pair, design.via_radius(parent.padstack));
                ring_anchors(&signals, pair.orientation, ring, design)
            }
            None => {
                tracing::trace!(name = %instance.name, "Via array has no differential parent");
                Vec::new()
            }
        },
    }
}

/// The two signal anchors whose connecting segment is hit-testable.
///
/// Differential kinds return their own pair; a surround array returns its
/// parent's pair. Everything else has no link.
#[must_use]
pub fn signal_pair(instance: &PlacedInstance, design: &Design) -> Option<[Anchor; 2]> {
    match &instance.kind {
        InstanceKind::Differential(pair) | InstanceKind::DiffGround { pair, .. } => Some(pair_anchors(
            instance.position,
            pair,
            design.via_radius(instance.padstack),
        )),
        InstanceKind::SurroundViaArray(_) => parent_pair(instance, design)
            .map(|(parent, pair)| pair_anchors(parent.position, pair, design.via_radius(parent.padstack))),
        _ => None,
    }
}

/// Returns false for a dogbone or surround array whose parent does not
/// resolve to an instance it can attach to. Other kinds are always connected.
#[must_use]
pub fn is_connected(instance: &PlacedInstance, design: &Design) -> bool {
    match &instance.kind {
        InstanceKind::Dogbone(_) => design
            .parent_of(instance)
            .is_some_and(|parent| !parent.kind.is_dependent()),
        InstanceKind::SurroundViaArray(_) => parent_pair(instance, design).is_some(),
        _ => true,
    }
}

/// Stub segments from each parent via centre to its dogbone end.
///
/// Empty for anything but a connected dogbone.
#[must_use]
pub fn dogbone_segments(instance: &PlacedInstance, design: &Design) -> Vec<Segment> {
    match &instance.kind {
        InstanceKind::Dogbone(dogbone) => dogbone_geometry(instance, dogbone, design)
            .into_iter()
            .map(|(via, end)| Segment::new(via, end.position))
            .collect(),
        _ => Vec::new(),
    }
}

/// Most vias a ground ring places around one signal via.
pub const MAX_RING_VIAS: u32 = 360;

/// Angle offsets (degrees) of a ground ring around the outward axis.
///
/// Odd counts put one via on the axis and pair the rest symmetrically
/// (`0, +s, -s, +2s, -2s, …`); even counts straddle it
/// (`+s/2, -s/2, +3s/2, -3s/2, …`). Counts above [`MAX_RING_VIAS`] are
/// clamped.
#[must_use]
pub fn ring_angles(count: u32, step: f64) -> Vec<f64> {
    if count > MAX_RING_VIAS {
        tracing::debug!(count, max = MAX_RING_VIAS, "Clamping ground ring count");
    }
    let count = count.min(MAX_RING_VIAS) as usize;
    let mut angles = Vec::with_capacity(count);
    if count % 2 == 1 {
        angles.push(0.0);
    }
    let mut k = 1_u32;
    while angles.len() < count {
        let magnitude = if count % 2 == 1 {
            f64::from(k) * step
        } else {
            f64::from(2 * k - 1) * step / 2.0
        };
        angles.push(magnitude);
        if angles.len() < count {
            angles.push(-magnitude);
        }
        k += 1;
    }
    angles
}

/// Closed outline of the antipad clearance around the instance's signal vias.
///
/// A circle for single vias, an oblong enclosing both members for pairs.
/// Ground vias and dependent kinds have none, and a zero antipad diameter
/// gives an empty outline.
#[must_use]
pub fn antipad_outline(instance: &PlacedInstance, design: &Design) -> Vec<Point> {
    let radius = design.padstack(instance.padstack).map_or(0.0, Padstack::antipad_radius);
    if radius <= 0.0 {
        return Vec::new();
    }

    match &instance.kind {
        InstanceKind::Single(_) => sample_arc(instance.position, radius, 0.0, 2.0 * PI, 2 * ARC_STEPS),
        InstanceKind::Differential(pair) | InstanceKind::DiffGround { pair, .. } => {
            let offset = pair.member_offset();
            let axis = pair.orientation.pitch_axis();
            let axis_angle = axis.y.atan2(axis.x);

            let mut outline = sample_arc(instance.position + offset, radius, axis_angle - PI / 2.0, PI, ARC_STEPS);
            outline.extend(sample_arc(
                instance.position - offset,
                radius,
                axis_angle + PI / 2.0,
                PI,
                ARC_STEPS,
            ));
            if let Some(&first) = outline.first() {
                outline.push(first);
            }
            outline
        }
        _ => Vec::new(),
    }
}

/// Signal anchors of a pair centred at `center`, negative member first.
fn pair_anchors(center: Point, pair: &DiffPair, radius: f64) -> [Anchor; 2] {
    let offset = pair.member_offset();
    [
        Anchor::new(center - offset, radius, AnchorRole::Signal),
        Anchor::new(center + offset, radius, AnchorRole::Signal),
    ]
}

/// Base angle (degrees) pointing away from the pair for each member.
const fn outward_base(orientation: Orientation) -> [f64; 2] {
    match orientation {
        Orientation::Vertical => [270.0, 90.0],
        Orientation::Horizontal => [180.0, 0.0],
    }
}

fn ring_anchors(signals: &[Anchor; 2], orientation: Orientation, ring: &GroundRing, design: &Design) -> Vec<Anchor> {
    let distance = finite_or(ring.radius, 0.0);
    let step = finite_or(ring.angle_step, 0.0);
    let via_radius = design.via_radius(ring.padstack);
    let offsets = ring_angles(ring.count, step);

    signals
        .iter()
        .zip(outward_base(orientation))
        .flat_map(|(signal, base)| {
            offsets.iter().map(move |offset| {
                let angle = deg_to_rad(base + offset);
                Anchor::new(
                    signal.position + Point::from_angle(angle) * distance,
                    via_radius,
                    AnchorRole::Ground,
                )
            })
        })
        .collect()
}

/// Resolves a dependent instance's parent as a differential pair.
fn parent_pair<'a>(instance: &PlacedInstance, design: &'a Design) -> Option<(&'a PlacedInstance, &'a DiffPair)> {
    let parent = design.parent_of(instance)?;
    parent.kind.diff_pair().map(|pair| (parent, pair))
}

/// Pairs of (parent via centre, dogbone end anchor).
fn dogbone_geometry(instance: &PlacedInstance, dogbone: &Dogbone, design: &Design) -> Vec<(Point, Anchor)> {
    let Some(parent) = design.parent_of(instance) else {
        tracing::trace!(name = %instance.name, parent = ?instance.parent, "Dogbone is disconnected");
        return Vec::new();
    };

    let length = finite_or(dogbone.length, 0.0);
    let end_radius = finite_or(dogbone.diameter, 0.0).max(0.0) / 2.0;
    let stub = |via: Point, angle: f64| {
        let end = via + Point::from_angle(deg_to_rad(finite_or(angle, 0.0))) * length;
        (via, Anchor::new(end, end_radius, AnchorRole::DogboneEnd))
    };

    match &parent.kind {
        InstanceKind::Single(_) | InstanceKind::Ground => vec![stub(parent.position, dogbone.angle)],
        InstanceKind::Differential(pair) | InstanceKind::DiffGround { pair, .. } => {
            let offset = pair.member_offset();
            vec![
                stub(parent.position - offset, dogbone.neg_angle),
                stub(parent.position + offset, dogbone.pos_angle),
            ]
        }
        InstanceKind::Dogbone(_) | InstanceKind::SurroundViaArray(_) => {
            tracing::trace!(name = %instance.name, parent = %parent.name, "Dogbone parent has no vias");
            Vec::new()
        }
    }
}
