//! Error types for instance store mutations.
//!
//! These are the only hard failures the core surfaces to callers. Geometry
//! problems (dangling parents, missing padstacks, rays that never reach an
//! edge) degrade silently instead.

use thiserror::Error;

use crate::model::InstanceId;

/// Result type for store mutations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors rejected by the instance store before any mutation happens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The requested name was empty or whitespace only.
    #[error("Instance name cannot be empty")]
    EmptyName,

    /// Another instance already uses this name.
    #[error("Instance name '{name}' already exists")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    /// Another instance already has this id.
    #[error("Instance id {id} is used more than once")]
    DuplicateId {
        /// The repeated id.
        id: InstanceId,
    },

    /// No instance with this id exists in the store.
    #[error("Instance not found: {id}")]
    InstanceNotFound {
        /// The id that was looked up.
        id: InstanceId,
    },
}
