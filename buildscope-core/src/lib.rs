//! Buildscope Core
//!
//! Core types and pure logic for inspecting builds of a CI project.
//!
//! This crate contains:
//! - Domain types: Build records as served by the CI service
//! - Selection: Turning user constraints into a concrete build id range
//! - View: Derived, read-only accessors over a single build record

pub mod domain;
pub mod project;
pub mod selection;
pub mod view;

pub use domain::build::{Action, BuildId, BuildRecord, Outcome, Step};
pub use domain::timestamp::parse_timestamp;
pub use project::ProjectUrls;
pub use selection::{
    DateFiltered, DateWindow, ResolvedRange, SelectionCriteria, SelectionError, resolve_range,
};
pub use view::BuildView;
