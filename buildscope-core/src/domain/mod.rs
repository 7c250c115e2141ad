//! Core domain types
//!
//! Structures mirroring what the CI service returns for a build. They are
//! shared between the client (fetches and caches them) and the CLI (reports them).

pub mod build;
pub mod timestamp;
