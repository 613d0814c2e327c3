//! via-fanout: fan-out trace geometry for PCB via design
//!
//! This library computes the derived geometry of vias placed on a board:
//! where each via and its dependents physically sit, how feed traces leave
//! them and run to the board edge, which instance a click lands on, and how
//! edits to a differential pair flow down to the pairs linked to it.
//!
//! # Architecture
//!
//! The core is pure and synchronous. Every computation takes a [`model::Design`]
//! snapshot (board outline, padstacks and placed instances) by reference and
//! derives geometry from it on demand:
//!
//! - **Anchors**: via, ground-ring and dogbone pad circles
//! - **Feed paths**: straight run, optional arc turn, terminal run to the edge
//! - **Picking**: hit-testing and snapping in board coordinates
//! - **Propagation**: keeping linked differential pairs in step
//!
//! Broken references degrade to empty geometry rather than errors.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading and validation
//! - [`error`] - Error types
//! - [`geometry`] - Points, segments and arc sampling
//! - [`layout`] - Anchors, feed paths, picking and propagation
//! - [`model`] - Board, padstack and instance data
//! - [`project`] - Design file loading

pub mod config;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod project;
