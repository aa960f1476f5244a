//! Rendr - server-side rendering for React components
//!
//! Bundles components with esbuild, evaluates the server bundle in a
//! JavaScript runtime and caches every build per file and flavor until a
//! source it depends on changes.

pub mod build;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod paths;
pub mod render;
pub mod sandbox;
pub mod watch;

pub use error::{RendrError, RendrResult};
