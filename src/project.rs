//! Design file loading.
//!
//! A design file is plain JSON in the serde shape of [`Design`]:
//!
//! ```json
//! {
//!   "outline": { "width": 400.0, "height": 200.0 },
//!   "padstacks": [{ "name": "VIA10", "pad_diameter": 10.0, "hole_diameter": 6.0, "antipad_diameter": 20.0 }],
//!   "instances": [{ "name": "Via_1", "position": { "x": 0.0, "y": 0.0 }, "padstack": 0, "kind": "single" }]
//! }
//! ```

use std::path::Path;

use crate::error::ProjectError;
use crate::layout::{check_references, ReferenceIssue};
use crate::model::Design;

/// Reads and parses a design file.
///
/// # Errors
///
/// Returns [`ProjectError::ReadError`] if the file cannot be read and
/// [`ProjectError::ParseError`] if it is not a valid design.
pub fn load_design(path: &Path) -> Result<Design, ProjectError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ProjectError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let design = parse_design(&contents).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(
        path = %path.display(),
        instances = design.instances.len(),
        padstacks = design.padstacks.len(),
        "Loaded design"
    );
    Ok(design)
}

/// Parses a design from a JSON string.
///
/// # Errors
///
/// Returns the JSON error if the text is not a valid design.
pub fn parse_design(json: &str) -> Result<Design, serde_json::Error> {
    serde_json::from_str(json)
}

/// Runs the reference check, failing in strict mode if anything is wrong.
///
/// In permissive mode the issues are logged and returned.
///
/// # Errors
///
/// Returns [`ProjectError::StrictReferences`] when `strict` is set and at
/// least one issue was found.
pub fn verify_references(design: &Design, strict: bool) -> Result<Vec<ReferenceIssue>, ProjectError> {
    let issues = check_references(design);
    for issue in &issues {
        tracing::warn!(%issue, "Reference issue");
    }
    if strict && !issues.is_empty() {
        return Err(ProjectError::StrictReferences { count: issues.len() });
    }
    Ok(issues)
}
