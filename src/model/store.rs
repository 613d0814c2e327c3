//! Ordered store of placed instances.
//!
//! Placement order matters: hit-testing walks the store backwards so the
//! most recently placed instance wins. Deleting an instance never touches
//! its dependents; their parent links simply stop resolving.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::model::error::{StoreError, StoreResult};
use crate::model::{InstanceId, InstanceKind, InstanceType, PlacedInstance};

/// Defaults applied when placing a new instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementOptions {
    /// Placement grid; positions are rounded to it.
    pub grid_spacing: f64,
    /// Pitch given to newly placed differential pairs.
    pub default_pitch: f64,
}

impl Default for PlacementOptions {
    fn default() -> Self {
        Self {
            grid_spacing: 5.0,
            default_pitch: 40.0,
        }
    }
}

/// Instances keyed by id, iterated in placement order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PlacedInstance>", into = "Vec<PlacedInstance>")]
pub struct InstanceStore {
    instances: IndexMap<InstanceId, PlacedInstance>,
}

impl InstanceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns true if nothing has been placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Iterates instances in placement order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &PlacedInstance> {
        self.instances.values()
    }

    /// Looks up an instance by id.
    #[must_use]
    pub fn get(&self, id: InstanceId) -> Option<&PlacedInstance> {
        self.instances.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: InstanceId) -> Option<&mut PlacedInstance> {
        self.instances.get_mut(&id)
    }

    /// Looks up an instance by name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&PlacedInstance> {
        self.instances.values().find(|i| i.name == name)
    }

    /// Adds a fully built instance after validating its name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateId`] if the id is already stored,
    /// [`StoreError::EmptyName`] for a blank name and
    /// [`StoreError::DuplicateName`] if another instance already uses it.
    pub fn insert(&mut self, mut instance: PlacedInstance) -> StoreResult<InstanceId> {
        let id = instance.id;
        if self.instances.contains_key(&id) {
            return Err(StoreError::DuplicateId { id });
        }
        instance.name = self.validate_name(&instance.name, None)?;
        tracing::debug!(%id, name = %instance.name, kind = ?instance.instance_type(), "Inserted instance");
        self.instances.insert(id, instance);
        Ok(id)
    }

    /// Places a new instance with default properties for its type.
    ///
    /// The position is rounded to the placement grid. When `name` is `None`
    /// (or blank) a name like `Via_3` is generated from the first free index.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateName`] if an explicit name is taken.
    pub fn place(
        &mut self,
        instance_type: InstanceType,
        at: Point,
        name: Option<&str>,
        padstack: Option<usize>,
        options: &PlacementOptions,
    ) -> StoreResult<InstanceId> {
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => self.next_free_name(instance_type.name_prefix()),
        };

        let mut instance = PlacedInstance::new(
            name,
            at.snap_to_grid(options.grid_spacing),
            InstanceKind::defaults_for(instance_type, options),
        );
        instance.padstack = padstack;
        self.insert(instance)
    }

    /// Renames an instance.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::EmptyName`], [`StoreError::DuplicateName`] or
    /// [`StoreError::InstanceNotFound`]; the store is unchanged on error.
    pub fn rename(&mut self, id: InstanceId, name: &str) -> StoreResult<()> {
        if !self.instances.contains_key(&id) {
            return Err(StoreError::InstanceNotFound { id });
        }
        let name = self.validate_name(name, Some(id))?;
        if let Some(inst) = self.instances.get_mut(&id) {
            inst.name = name;
        }
        Ok(())
    }

    /// Sets or clears an instance's parent link.
    ///
    /// The parent is not required to exist; an unresolvable link is a valid
    /// "disconnected" state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InstanceNotFound`] if `id` is unknown.
    pub fn connect(&mut self, id: InstanceId, parent: Option<InstanceId>) -> StoreResult<()> {
        let inst = self
            .instances
            .get_mut(&id)
            .ok_or(StoreError::InstanceNotFound { id })?;
        inst.parent = parent;
        Ok(())
    }

    /// Removes an instance, keeping the order of the rest.
    ///
    /// Dependents are orphaned, not deleted: they keep their last values.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InstanceNotFound`] if `id` is unknown.
    pub fn remove(&mut self, id: InstanceId) -> StoreResult<PlacedInstance> {
        let removed = self
            .instances
            .shift_remove(&id)
            .ok_or(StoreError::InstanceNotFound { id })?;
        let orphans = self.iter().filter(|i| i.parent == Some(id)).count();
        tracing::debug!(%id, name = %removed.name, orphans, "Removed instance");
        Ok(removed)
    }

    /// Maps each parent id to the ids of instances linking to it.
    #[must_use]
    pub fn children_map(&self) -> HashMap<InstanceId, Vec<InstanceId>> {
        let mut map: HashMap<InstanceId, Vec<InstanceId>> = HashMap::new();
        for inst in self.instances.values() {
            if let Some(parent) = inst.parent {
                map.entry(parent).or_default().push(inst.id);
            }
        }
        map
    }

    /// First `{prefix}_{n}` (n ≥ 1) not used by any instance.
    #[must_use]
    pub fn next_free_name(&self, prefix: &str) -> String {
        (1..)
            .map(|n| format!("{prefix}_{n}"))
            .find(|candidate| self.find_by_name(candidate).is_none())
            .unwrap_or_else(|| prefix.to_string())
    }

    fn validate_name(&self, name: &str, exclude: Option<InstanceId>) -> StoreResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName);
        }
        if self
            .instances
            .values()
            .any(|i| Some(i.id) != exclude && i.name == name)
        {
            return Err(StoreError::DuplicateName {
                name: name.to_string(),
            });
        }
        Ok(name.to_string())
    }
}

/// Builds a store from a loaded instance list without name checks.
///
/// Names are left for [`check_references`](crate::layout::check_references)
/// to report, but a repeated id cannot be represented and is rejected.
impl TryFrom<Vec<PlacedInstance>> for InstanceStore {
    type Error = StoreError;

    fn try_from(list: Vec<PlacedInstance>) -> StoreResult<Self> {
        let mut instances = IndexMap::with_capacity(list.len());
        for instance in list {
            let id = instance.id;
            if instances.insert(id, instance).is_some() {
                return Err(StoreError::DuplicateId { id });
            }
        }
        Ok(Self { instances })
    }
}

impl From<InstanceStore> for Vec<PlacedInstance> {
    fn from(store: InstanceStore) -> Self {
        store.instances.into_values().collect()
    }
}
