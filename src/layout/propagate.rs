//! Keeps differential children in step with their parent pair.
//!
//! A `Differential` or `DiffGround` instance linked to another pair follows
//! it: position, pitch, orientation and arrow direction are copied down the
//! parent→child graph after every edit. Dogbones, ground vias and surround
//! arrays are never written to; they derive their geometry from the parent
//! at read time.
//!
//! The edit helpers here ([`move_instance`], [`set_pitch`],
//! [`set_orientation`], [`toggle_arrow_direction`]) apply one change and run
//! the propagation, returning how many descendants were updated.

use std::collections::{HashSet, VecDeque};

use crate::geometry::Point;
use crate::model::{ArrowDirection, Design, DiffPair, InstanceId, InstanceKind, Orientation, StoreError, StoreResult};

/// The pair geometry that synced children inherit.
#[derive(Debug, Clone, Copy)]
struct PairGeometry {
    position: Point,
    pitch: f64,
    orientation: Orientation,
    arrow_direction: ArrowDirection,
}

/// Copies the geometry of `changed` onto all synced descendants.
///
/// Walks the parent→children graph breadth first. Only `Differential` and
/// `DiffGround` children are updated, and only through those does the walk
/// continue. A visited set guards against cyclic links. Returns the number
/// of instances updated; zero when `changed` is unknown or not a pair.
pub fn propagate(design: &mut Design, changed: InstanceId) -> usize {
    let store = &mut design.instances;
    if store.get(changed).and_then(|i| i.kind.diff_pair()).is_none() {
        return 0;
    }

    let children = store.children_map();
    let mut visited = HashSet::from([changed]);
    let mut queue = VecDeque::from([changed]);
    let mut synced = 0;

    while let Some(parent_id) = queue.pop_front() {
        let Some(source) = store.get(parent_id).and_then(|parent| {
            parent.kind.diff_pair().map(|pair| PairGeometry {
                position: parent.position,
                pitch: pair.pitch,
                orientation: pair.orientation,
                arrow_direction: pair.arrow_direction,
            })
        }) else {
            continue;
        };

        for &child_id in children.get(&parent_id).into_iter().flatten() {
            if !visited.insert(child_id) {
                continue;
            }
            let Some(child) = store.get_mut(child_id) else {
                continue;
            };
            let Some(pair) = child.kind.diff_pair_mut() else {
                continue;
            };

            pair.pitch = source.pitch;
            pair.orientation = source.orientation;
            pair.arrow_direction = source.arrow_direction;
            child.position = source.position;
            synced += 1;
            queue.push_back(child_id);
        }
    }

    tracing::debug!(%changed, synced, "Propagated pair geometry");
    synced
}

/// Returns true if the instance is a pair that follows a parent pair.
///
/// Such an instance's geometry is owned by its parent and local edits to it
/// are ignored.
#[must_use]
pub fn is_synced_child(design: &Design, id: InstanceId) -> bool {
    design.instances.get(id).is_some_and(|inst| {
        inst.kind.is_differential_family()
            && design
                .parent_of(inst)
                .is_some_and(|parent| parent.kind.is_differential_family())
    })
}

/// Moves an instance and propagates.
///
/// # Errors
///
/// Returns [`StoreError::InstanceNotFound`] if `id` is unknown.
pub fn move_instance(design: &mut Design, id: InstanceId, to: Point) -> StoreResult<usize> {
    if skip_synced_edit(design, id, "move")? {
        return Ok(0);
    }
    if let Some(inst) = design.instances.get_mut(id) {
        inst.position = to;
    }
    Ok(propagate(design, id))
}

/// Changes a pair's via pitch and propagates. Non-pair instances are left
/// unchanged.
///
/// # Errors
///
/// Returns [`StoreError::InstanceNotFound`] if `id` is unknown.
pub fn set_pitch(design: &mut Design, id: InstanceId, pitch: f64) -> StoreResult<usize> {
    edit_pair(design, id, "pitch", |pair| pair.pitch = pitch)
}

/// Changes a pair's orientation, resets its arrow to the orientation's
/// default and propagates.
///
/// # Errors
///
/// Returns [`StoreError::InstanceNotFound`] if `id` is unknown.
pub fn set_orientation(design: &mut Design, id: InstanceId, orientation: Orientation) -> StoreResult<usize> {
    edit_pair(design, id, "orientation", |pair| {
        pair.orientation = orientation;
        pair.arrow_direction = orientation.default_arrow();
    })
}

/// Advances the arrow direction the way a double-click does.
///
/// Single vias cycle clockwise through all four directions. Pairs flip
/// between the two directions perpendicular to their pitch axis. Other kinds
/// have no arrow and are left unchanged.
///
/// # Errors
///
/// Returns [`StoreError::InstanceNotFound`] if `id` is unknown.
pub fn toggle_arrow_direction(design: &mut Design, id: InstanceId) -> StoreResult<usize> {
    if skip_synced_edit(design, id, "arrow")? {
        return Ok(0);
    }
    let Some(inst) = design.instances.get_mut(id) else {
        return Err(StoreError::InstanceNotFound { id });
    };

    match &mut inst.kind {
        InstanceKind::Single(via) => {
            via.arrow_direction = via.arrow_direction.next_clockwise();
            Ok(0)
        }
        InstanceKind::Differential(pair) | InstanceKind::DiffGround { pair, .. } => {
            let default = pair.orientation.default_arrow();
            pair.arrow_direction = if pair.arrow_direction == default {
                default.reversed()
            } else {
                default
            };
            Ok(propagate(design, id))
        }
        _ => Ok(0),
    }
}

fn edit_pair(
    design: &mut Design,
    id: InstanceId,
    what: &'static str,
    apply: impl FnOnce(&mut DiffPair),
) -> StoreResult<usize> {
    if skip_synced_edit(design, id, what)? {
        return Ok(0);
    }
    let Some(pair) = design.instances.get_mut(id).and_then(|i| i.kind.diff_pair_mut()) else {
        tracing::debug!(%id, what, "Not a differential pair, edit ignored");
        return Ok(0);
    };
    apply(pair);
    Ok(propagate(design, id))
}

/// Checks that `id` exists and reports whether the edit must be skipped
/// because the instance follows a parent pair.
fn skip_synced_edit(design: &Design, id: InstanceId, what: &'static str) -> StoreResult<bool> {
    if design.instances.get(id).is_none() {
        return Err(StoreError::InstanceNotFound { id });
    }
    let synced = is_synced_child(design, id);
    if synced {
        tracing::debug!(%id, what, "Instance follows its parent pair, edit ignored");
    }
    Ok(synced)
}
