//! Loading configuration and design files from disk.

use std::fs;

use tempfile::tempdir;
use via_fanout::config::{load_config, load_or_default};
use via_fanout::error::{ConfigError, ProjectError};
use via_fanout::layout::{build_feed_paths, check_references, ReferenceIssue};
use via_fanout::project::{load_design, verify_references};

const DESIGN: &str = r#"{
    "outline": { "width": 400.0, "height": 200.0 },
    "padstacks": [
        { "name": "VIA10", "pad_diameter": 10.0, "hole_diameter": 6.0, "antipad_diameter": 20.0 }
    ],
    "instances": [
        {
            "id": "0b7c6f2e-1d2a-4c3b-9e8f-0123456789ab",
            "name": "DiffPair_1",
            "position": { "x": 0.0, "y": 0.0 },
            "padstack": 0,
            "kind": "differential",
            "pitch": 40.0,
            "orientation": "horizontal",
            "arrow_direction": 0,
            "feed_out": { "layer": "TOP", "width": 5.0, "spacing": 5.0, "straight_length": 5.0 }
        },
        {
            "name": "Dogbone_1",
            "position": { "x": 0.0, "y": 0.0 },
            "kind": "dogbone",
            "connected_parent_id": "0b7c6f2e-1d2a-4c3b-9e8f-0123456789ab"
        }
    ]
}"#;

// =============================================================================
// Design Files
// =============================================================================

#[test]
fn test_load_design_from_file() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("board.json");
    fs::write(&path, DESIGN).expect("Failed to write design");

    let design = load_design(&path).expect("Failed to load design");
    assert_eq!(design.instances.len(), 2);
    assert!(check_references(&design).is_empty());

    let pair = design.instances.find_by_name("DiffPair_1").expect("pair missing");
    let paths = build_feed_paths(pair, &design);
    assert_eq!(paths.feed_out.len(), 2);
    assert!(paths.feed_in.is_empty());
}

#[test]
fn test_missing_design_file() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let result = load_design(&temp_dir.path().join("nope.json"));
    assert!(matches!(result, Err(ProjectError::ReadError { .. })));
}

#[test]
fn test_malformed_design_file() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("broken.json");
    fs::write(&path, r#"{ "outline": { "width": "wide" } }"#).expect("Failed to write design");

    let err = load_design(&path).expect_err("should fail to parse");
    assert!(matches!(err, ProjectError::ParseError { .. }));
    assert!(err.to_string().contains("broken.json"));
}

#[test]
fn test_repeated_instance_id_is_rejected() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("twins.json");
    let twins = DESIGN.replace(
        "\"name\": \"Dogbone_1\",",
        "\"id\": \"0b7c6f2e-1d2a-4c3b-9e8f-0123456789ab\",\n            \"name\": \"Dogbone_1\",",
    );
    assert_ne!(twins, DESIGN);
    fs::write(&path, twins).expect("Failed to write design");

    let err = load_design(&path).expect_err("repeated id should not load");
    assert!(matches!(err, ProjectError::ParseError { .. }));
    let source = std::error::Error::source(&err).map(ToString::to_string).unwrap_or_default();
    assert!(source.contains("more than once"), "unexpected error: {source}");
}

#[test]
fn test_strict_mode_rejects_orphans() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("orphans.json");
    let orphaned = DESIGN.replace(
        "\"connected_parent_id\": \"0b7c6f2e",
        "\"connected_parent_id\": \"ffffffff",
    );
    fs::write(&path, orphaned).expect("Failed to write design");

    let design = load_design(&path).expect("Failed to load design");
    let issues = verify_references(&design, false).expect("permissive mode never fails");
    assert_eq!(issues.len(), 1);
    assert!(matches!(issues[0], ReferenceIssue::DanglingParent { .. }));

    assert!(matches!(
        verify_references(&design, true),
        Err(ProjectError::StrictReferences { count: 1 })
    ));
}

// =============================================================================
// Configuration Files
// =============================================================================

#[test]
fn test_load_config_file() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.json");
    fs::write(
        &path,
        r#"{ "placement": { "grid_spacing": 1.0 }, "validation": { "strict_references": true } }"#,
    )
    .expect("Failed to write config");

    let config = load_config(&path).expect("Failed to load config");
    assert!((config.placement_options().grid_spacing - 1.0).abs() < f64::EPSILON);
    assert!((config.placement_options().default_pitch - 40.0).abs() < f64::EPSILON);
    assert!(config.validation.strict_references);
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("config.json");
    fs::write(&path, r#"{ "picking": { "zoom_scale": -2.0 } }"#).expect("Failed to write config");

    assert!(matches!(load_config(&path), Err(ConfigError::ValidationError { .. })));
}

#[test]
fn test_explicit_config_must_exist() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("missing.json");
    assert!(matches!(load_or_default(Some(&path)), Err(ConfigError::NotFound { .. })));
}
