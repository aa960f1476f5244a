//! In-memory build cache
//!
//! Holds the compiled output of each source file per render flavor, so a
//! component is compiled once and then served to every request with only
//! its props varying.
//!
//! # Keys
//!
//! | Store | Key | Value |
//! |-------|-----|-------|
//! | server | normalized absolute path | `BuildArtifact` |
//! | client | normalized absolute path | `BuildArtifact` |
//! | client-raw | normalized absolute path | `BuildArtifact` |
//!
//! # Invalidation
//!
//! There is no TTL or size limit. Entries are dropped when a file changes:
//! the file's own entries go, and so does every file whose most recent
//! client build listed it as a dependency, transitively.

pub mod artifact;
pub mod graph;
pub mod store;

pub use artifact::{BuildArtifact, Flavor};
pub use graph::DependencyGraph;
pub use store::{BuildCache, CacheStats};
