//! Derived geometry for placed instances.
//!
//! Everything in this module is recomputed on demand from a [`Design`]
//! snapshot: anchors, feed paths, board-edge rays, picking and propagation.
//! Nothing is cached, so callers can mutate the design freely between calls.
//!
//! Invalid input never fails here. A dangling parent, a missing padstack or
//! a ray that misses the board simply yields less geometry.

pub mod anchors;
pub mod edge;
pub mod feed;
pub mod picking;
pub mod propagate;
pub mod validate;
pub mod view;

pub use anchors::{
    antipad_outline, dogbone_segments, is_connected, resolve_anchors, ring_angles, signal_pair, Anchor, AnchorRole,
    MAX_RING_VIAS,
};
pub use edge::{intersect_board_edge, EdgeHit};
pub use feed::{build_feed_paths, FeedPaths, Polyline};
pub use picking::{hit_test, snap, snap_excluding, PLACEHOLDER_HALF_SIZE};
pub use propagate::propagate;
pub use validate::{check_references, ReferenceIssue};
pub use view::ViewTransform;

use serde::Serialize;

use crate::geometry::Segment;
use crate::model::{Design, InstanceId, InstanceType, PlacedInstance};

/// All derived geometry of one instance, as handed to an exporter.
#[derive(Debug, Clone, Serialize)]
pub struct RoutedInstance {
    /// Instance id.
    pub id: InstanceId,
    /// Instance name.
    pub name: String,
    /// Instance kind.
    pub kind: InstanceType,
    /// Resolved anchors.
    pub anchors: Vec<Anchor>,
    /// Feed traces.
    pub feeds: FeedPaths,
    /// Dogbone stubs, if any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stubs: Vec<Segment>,
    /// Antipad clearance outline, if any.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub antipad: Polyline,
}

/// Resolves every derived shape of a single instance.
#[must_use]
pub fn route_instance(instance: &PlacedInstance, design: &Design) -> RoutedInstance {
    RoutedInstance {
        id: instance.id,
        name: instance.name.clone(),
        kind: instance.instance_type(),
        anchors: resolve_anchors(instance, design),
        feeds: build_feed_paths(instance, design),
        stubs: dogbone_segments(instance, design),
        antipad: antipad_outline(instance, design),
    }
}

/// Routes every instance in placement order.
#[must_use]
pub fn route_design(design: &Design) -> Vec<RoutedInstance> {
    let routed: Vec<_> = design.instances.iter().map(|inst| route_instance(inst, design)).collect();
    tracing::debug!(instances = routed.len(), "Routed design");
    routed
}
