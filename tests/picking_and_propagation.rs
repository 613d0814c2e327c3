//! Placement, hit-testing, snapping and propagation on a populated design.

use via_fanout::geometry::Point;
use via_fanout::layout::propagate::{move_instance, set_orientation, set_pitch, toggle_arrow_direction};
use via_fanout::layout::{hit_test, propagate, resolve_anchors, snap, snap_excluding, ViewTransform};
use via_fanout::model::{
    ArrowDirection, BoardOutline, Design, GroundRing, InstanceId, InstanceKind, InstanceType, Orientation, Padstack,
    PlacedInstance, PlacementOptions, StoreError,
};

fn design() -> Design {
    let mut design = Design::new(BoardOutline::new(400.0, 200.0));
    design.padstacks.push(Padstack::new("VIA10", 10.0, 6.0, 20.0));
    design
}

fn place(design: &mut Design, kind: InstanceType, at: Point) -> InstanceId {
    design
        .instances
        .place(kind, at, None, Some(0), &PlacementOptions::default())
        .expect("placement failed")
}

// =============================================================================
// Hit Testing
// =============================================================================

#[test]
fn test_single_beats_dogbone_on_same_spot() {
    let mut d = design();
    let via = place(&mut d, InstanceType::Single, Point::ZERO);
    let stub = place(&mut d, InstanceType::Dogbone, Point::ZERO);
    d.instances.connect(stub, Some(via)).expect("connect failed");

    // The dogbone is newer, but the via underneath wins.
    assert_eq!(hit_test(Point::new(0.5, 0.5), &d), Some(via));

    // Out on the stub's end pad only the dogbone is hit.
    let end = resolve_anchors(d.instances.get(stub).expect("stub"), &d)[0].position;
    assert_eq!(hit_test(end, &d), Some(stub));
}

#[test]
fn test_deleted_parent_leaves_placeholder() {
    let mut d = design();
    let via = place(&mut d, InstanceType::Single, Point::new(50.0, 0.0));
    let stub = place(&mut d, InstanceType::Dogbone, Point::new(-50.0, 0.0));
    d.instances.connect(stub, Some(via)).expect("connect failed");

    d.instances.remove(via).expect("remove failed");

    let orphan = d.instances.get(stub).expect("stub survives");
    assert_eq!(orphan.parent, Some(via));
    assert!(resolve_anchors(orphan, &d).is_empty());
    assert_eq!(hit_test(Point::new(-47.0, 3.0), &d), Some(stub));
    assert_eq!(hit_test(Point::new(50.0, 0.0), &d), None);
}

#[test]
fn test_surround_array_hits_on_parent_link() {
    let mut d = design();
    let pair = place(&mut d, InstanceType::Differential, Point::ZERO);

    // A fresh array has no ring padstack; its link is as thick as the
    // parent's signal vias and, being newer, it takes the click.
    let array = place(&mut d, InstanceType::SurroundViaArray, Point::new(100.0, 100.0));
    d.instances.connect(array, Some(pair)).expect("connect failed");
    assert_eq!(hit_test(Point::new(0.0, 3.0), &d), Some(array));
    assert_eq!(hit_test(Point::new(0.0, 6.0), &d), None);

    // Connected, so the stored position is not a placeholder.
    assert_eq!(hit_test(Point::new(100.0, 100.0), &d), None);

    // Removing the array hands the link back to the pair.
    d.instances.remove(array).expect("remove failed");
    assert_eq!(hit_test(Point::new(0.0, 3.0), &d), Some(pair));
}

#[test]
fn test_empty_ring_array_is_not_a_placeholder() {
    let mut d = design();
    let pair = place(&mut d, InstanceType::Differential, Point::ZERO);
    let ring = GroundRing {
        count: 0,
        ..GroundRing::default()
    };
    let array = d
        .instances
        .insert(PlacedInstance::new("ViaArray_1", Point::new(100.0, 100.0), InstanceKind::SurroundViaArray(ring)).with_parent(pair))
        .expect("insert failed");

    assert!(resolve_anchors(d.instances.get(array).expect("array"), &d).is_empty());
    assert_eq!(hit_test(Point::new(102.0, 98.0), &d), None);
    assert_eq!(hit_test(Point::new(0.0, 2.0), &d), Some(array));
}

// =============================================================================
// Snapping
// =============================================================================

#[test]
fn test_snap_uses_screen_distance() {
    let mut d = design();
    place(&mut d, InstanceType::Differential, Point::ZERO);

    let view = ViewTransform::default();
    let reach_px = 10.0;

    // 0.8 units from the negative via centre is within 10 px at 10 px/unit.
    let snapped = snap(Point::new(-19.2, 0.0), reach_px, view.scale, &d);
    assert!(snapped.approx_eq(Point::new(-20.0, 0.0), 1e-9));

    // Zoomed out to 1 px/unit the reach grows to 10 units: the rim point wins.
    let snapped = snap(Point::new(-12.0, 0.0), reach_px, 1.0, &d);
    assert!(snapped.approx_eq(Point::new(-15.0, 0.0), 1e-9));

    // Zoomed in far enough nothing is in reach.
    let p = Point::new(-19.2, 0.0);
    assert_eq!(snap(p, reach_px, 100.0, &d), p);
}

#[test]
fn test_snap_excluding_dragged_pair() {
    let mut d = design();
    let left = place(&mut d, InstanceType::Single, Point::new(-100.0, 0.0));
    let dragged = place(&mut d, InstanceType::Single, Point::ZERO);

    let p = Point::new(0.5, 0.0);
    assert_eq!(snap_excluding(p, 10.0, 10.0, &d, Some(dragged)), p);
    assert_eq!(snap_excluding(Point::new(-99.5, 0.0), 10.0, 10.0, &d, Some(dragged)), Point::new(-100.0, 0.0));
    assert!(d.instances.get(left).is_some());
}

// =============================================================================
// Propagation
// =============================================================================

#[test]
fn test_orientation_propagates_through_chain() {
    let mut d = design();
    let root = place(&mut d, InstanceType::Differential, Point::ZERO);
    let mid = place(&mut d, InstanceType::DiffGround, Point::new(100.0, 0.0));
    let leaf = place(&mut d, InstanceType::Differential, Point::new(-100.0, 0.0));
    let stub = place(&mut d, InstanceType::Dogbone, Point::new(0.0, 50.0));
    let gnd = place(&mut d, InstanceType::Ground, Point::new(0.0, -50.0));

    d.instances.connect(mid, Some(root)).expect("connect");
    d.instances.connect(leaf, Some(mid)).expect("connect");
    d.instances.connect(stub, Some(leaf)).expect("connect");
    d.instances.connect(gnd, Some(root)).expect("connect");

    let synced = set_orientation(&mut d, root, Orientation::Vertical).expect("edit");
    assert_eq!(synced, 2);

    for id in [root, mid, leaf] {
        let inst = d.instances.get(id).expect("present");
        let pair = inst.kind.diff_pair().expect("pair");
        assert_eq!(pair.orientation, Orientation::Vertical);
        assert_eq!(pair.arrow_direction, ArrowDirection::Right);
        assert_eq!(inst.position, Point::ZERO);
    }

    assert_eq!(d.instances.get(stub).expect("stub").position, Point::new(0.0, 50.0));
    assert_eq!(d.instances.get(gnd).expect("gnd").position, Point::new(0.0, -50.0));
    assert!(d.instances.get(stub).expect("stub").is_dogbone());
}

#[test]
fn test_dogbone_follows_moved_parent_without_being_written() {
    let mut d = design();
    let root = place(&mut d, InstanceType::Differential, Point::ZERO);
    let stub = place(&mut d, InstanceType::Dogbone, Point::new(5.0, 5.0));
    d.instances.connect(stub, Some(root)).expect("connect");

    let before = resolve_anchors(d.instances.get(stub).expect("stub"), &d);
    move_instance(&mut d, root, Point::new(10.0, 0.0)).expect("move");
    let after = resolve_anchors(d.instances.get(stub).expect("stub"), &d);

    assert_eq!(d.instances.get(stub).expect("stub").position, Point::new(5.0, 5.0));
    for (b, a) in before.iter().zip(&after) {
        assert!((a.position - b.position).approx_eq(Point::new(10.0, 0.0), 1e-9));
    }
}

#[test]
fn test_pitch_and_arrow_edits() {
    let mut d = design();
    let root = place(&mut d, InstanceType::Differential, Point::ZERO);
    let child = place(&mut d, InstanceType::Differential, Point::ZERO);
    d.instances.connect(child, Some(root)).expect("connect");

    assert_eq!(set_pitch(&mut d, root, 24.0).expect("pitch"), 1);
    assert_eq!(toggle_arrow_direction(&mut d, root).expect("arrow"), 1);

    let pair = d.instances.get(child).and_then(|i| i.kind.diff_pair()).expect("pair");
    assert!((pair.pitch - 24.0).abs() < f64::EPSILON);
    assert_eq!(pair.arrow_direction, ArrowDirection::Down);

    // The child follows its parent; direct edits are ignored.
    assert_eq!(set_pitch(&mut d, child, 99.0).expect("pitch"), 0);
    let pair = d.instances.get(child).and_then(|i| i.kind.diff_pair()).expect("pair");
    assert!((pair.pitch - 24.0).abs() < f64::EPSILON);

    // Re-running propagation on an unchanged root is idempotent.
    assert_eq!(propagate(&mut d, root), 1);
}

#[test]
fn test_edits_on_unknown_instance_fail() {
    let mut d = design();
    let ghost = InstanceId::new();
    assert_eq!(
        set_orientation(&mut d, ghost, Orientation::Vertical),
        Err(StoreError::InstanceNotFound { id: ghost })
    );
    assert!(toggle_arrow_direction(&mut d, ghost).is_err());
}
