//! Reference checks for strict mode.
//!
//! The layout engine tolerates every broken reference. These checks report
//! them instead so a caller can refuse to export a design that would silently
//! lose geometry.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::model::{Design, InstanceId, InstanceKind, InstanceType, PlacedInstance};

/// A reference problem found in a design.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ReferenceIssue {
    /// The parent id does not match any instance.
    #[error("'{instance}' links to missing parent {parent}")]
    DanglingParent {
        /// Instance name.
        instance: String,
        /// The unresolved id.
        parent: InstanceId,
    },

    /// A dependent instance has no parent link at all.
    #[error("'{instance}' ({kind:?}) is not connected to a parent")]
    Unconnected {
        /// Instance name.
        instance: String,
        /// Its kind.
        kind: InstanceType,
    },

    /// The parent exists but cannot carry this kind of dependent.
    #[error("'{instance}' ({kind:?}) cannot hang off '{parent}' ({parent_kind:?})")]
    WrongParentKind {
        /// Instance name.
        instance: String,
        /// Its kind.
        kind: InstanceType,
        /// Parent name.
        parent: String,
        /// Parent kind.
        parent_kind: InstanceType,
    },

    /// A padstack index is past the end of the padstack list.
    #[error("'{instance}' uses padstack {index} but only {available} are defined")]
    MissingPadstack {
        /// Instance name.
        instance: String,
        /// The out-of-range index.
        index: usize,
        /// Number of padstacks defined.
        available: usize,
    },

    /// The name is empty or whitespace.
    #[error("Instance {id} has a blank name")]
    BlankName {
        /// Instance id.
        id: InstanceId,
    },

    /// Several instances share a name.
    #[error("Name '{name}' is used by {count} instances")]
    DuplicateName {
        /// The shared name.
        name: String,
        /// How many instances use it.
        count: usize,
    },
}

/// Collects every reference problem in the design, in placement order.
#[must_use]
pub fn check_references(design: &Design) -> Vec<ReferenceIssue> {
    let mut issues = Vec::new();
    let mut name_counts: HashMap<&str, usize> = HashMap::new();

    for instance in design.instances.iter() {
        if instance.name.trim().is_empty() {
            issues.push(ReferenceIssue::BlankName { id: instance.id });
        } else {
            *name_counts.entry(instance.name.as_str()).or_default() += 1;
        }

        check_padstacks(instance, design, &mut issues);
        check_parent(instance, design, &mut issues);
    }

    let mut seen = Vec::new();
    for instance in design.instances.iter() {
        let count = name_counts.get(instance.name.as_str()).copied().unwrap_or(0);
        if count > 1 && !seen.contains(&instance.name.as_str()) {
            seen.push(instance.name.as_str());
            issues.push(ReferenceIssue::DuplicateName {
                name: instance.name.clone(),
                count,
            });
        }
    }

    tracing::debug!(issues = issues.len(), "Checked design references");
    issues
}

fn check_padstacks(instance: &PlacedInstance, design: &Design, issues: &mut Vec<ReferenceIssue>) {
    let ring_padstack = match &instance.kind {
        InstanceKind::DiffGround { ring, .. } | InstanceKind::SurroundViaArray(ring) => ring.padstack,
        _ => None,
    };

    for index in [instance.padstack, ring_padstack].into_iter().flatten() {
        if index >= design.padstacks.len() {
            issues.push(ReferenceIssue::MissingPadstack {
                instance: instance.name.clone(),
                index,
                available: design.padstacks.len(),
            });
        }
    }
}

fn check_parent(instance: &PlacedInstance, design: &Design, issues: &mut Vec<ReferenceIssue>) {
    let kind = instance.instance_type();
    let Some(parent_id) = instance.parent else {
        if instance.kind.is_dependent() {
            issues.push(ReferenceIssue::Unconnected {
                instance: instance.name.clone(),
                kind,
            });
        }
        return;
    };

    let Some(parent) = design.instances.get(parent_id) else {
        issues.push(ReferenceIssue::DanglingParent {
            instance: instance.name.clone(),
            parent: parent_id,
        });
        return;
    };

    let parent_kind = parent.instance_type();
    let accepted = match kind {
        InstanceType::Dogbone => !matches!(parent_kind, InstanceType::Dogbone | InstanceType::SurroundViaArray),
        InstanceType::SurroundViaArray => parent.kind.is_differential_family(),
        _ => true,
    };
    if !accepted {
        issues.push(ReferenceIssue::WrongParentKind {
            instance: instance.name.clone(),
            kind,
            parent: parent.name.clone(),
            parent_kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::{Dogbone, GroundRing, InstanceStore, Padstack, SingleVia};

    fn via(name: &str) -> PlacedInstance {
        PlacedInstance::new(name, Point::ZERO, InstanceKind::Single(SingleVia::default())).with_padstack(0)
    }

    #[test]
    fn clean_design_has_no_issues() {
        let mut design = Design::default();
        design.padstacks.push(Padstack::new("VIA", 10.0, 6.0, 20.0));
        let parent = design.instances.insert(via("V")).unwrap();
        design
            .instances
            .insert(PlacedInstance::new("D", Point::ZERO, InstanceKind::Dogbone(Dogbone::default())).with_parent(parent))
            .unwrap();

        assert!(check_references(&design).is_empty());
    }

    #[test]
    fn reports_each_kind_of_problem() {
        let mut design = Design::default();
        design.padstacks.push(Padstack::new("VIA", 10.0, 6.0, 20.0));
        let ghost = InstanceId::new();

        let single = via("V");
        let single_id = single.id;
        let ring = GroundRing {
            padstack: Some(4),
            ..GroundRing::default()
        };
        // Built directly so the store's name checks don't get in the way.
        let instances = vec![
            single,
            via("V"),
            via("   "),
            PlacedInstance::new("D", Point::ZERO, InstanceKind::Dogbone(Dogbone::default())).with_parent(ghost),
            PlacedInstance::new("A", Point::ZERO, InstanceKind::SurroundViaArray(ring)).with_parent(single_id),
            PlacedInstance::new("Lonely", Point::ZERO, InstanceKind::Dogbone(Dogbone::default())),
        ];
        design.instances = InstanceStore::try_from(instances).unwrap();

        let issues = check_references(&design);
        assert!(issues.iter().any(|i| matches!(i, ReferenceIssue::BlankName { .. })));
        assert!(issues.contains(&ReferenceIssue::DuplicateName {
            name: "V".to_string(),
            count: 2
        }));
        assert!(issues.contains(&ReferenceIssue::DanglingParent {
            instance: "D".to_string(),
            parent: ghost
        }));
        assert!(issues.contains(&ReferenceIssue::WrongParentKind {
            instance: "A".to_string(),
            kind: InstanceType::SurroundViaArray,
            parent: "V".to_string(),
            parent_kind: InstanceType::Single,
        }));
        assert!(issues.contains(&ReferenceIssue::MissingPadstack {
            instance: "A".to_string(),
            index: 4,
            available: 1
        }));
        assert!(issues.contains(&ReferenceIssue::Unconnected {
            instance: "Lonely".to_string(),
            kind: InstanceType::Dogbone
        }));
        assert_eq!(issues.len(), 6);
    }

    #[test]
    fn issue_messages_name_the_instance() {
        let issue = ReferenceIssue::MissingPadstack {
            instance: "Via_3".to_string(),
            index: 2,
            available: 1,
        };
        assert_eq!(issue.to_string(), "'Via_3' uses padstack 2 but only 1 are defined");
    }
}
