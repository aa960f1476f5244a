//! Component bundling
//!
//! A [`Builder`] turns generated entry source into a bundled script, an
//! optional stylesheet, and the list of files the bundle was compiled from.
//! Builds never see request props, so their output is cacheable per file.

pub mod entry;
mod esbuild;

pub use entry::{EntryOptions, LOCATION_GLOBAL, SERVER_OUTPUT_GLOBAL};
pub use esbuild::EsbuildBuilder;

use crate::cache::{BuildArtifact, Flavor};
use crate::error::RendrResult;
use async_trait::async_trait;
use std::path::Path;

/// Max number of output lines to include in build error messages.
const BUILD_ERROR_TAIL_LINES: usize = 50;

/// Inputs for a single build
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    /// Flavor being produced
    pub flavor: Flavor,
    /// Generated entry source (see [`entry`])
    pub entry_source: &'a str,
    /// Frontend root, used to resolve bare imports
    pub frontend_dir: &'a Path,
    /// URL prefix for emitted assets
    pub asset_route: &'a str,
}

/// Abstract bundler interface
///
/// Implementations must be deterministic for identical inputs, and client
/// builds must list every project file the entry imports, directly or
/// transitively, as dependencies.
#[async_trait]
pub trait Builder: Send + Sync {
    /// Bundle the entry source for the requested flavor
    async fn build(&self, request: BuildRequest<'_>) -> RendrResult<BuildArtifact>;

    /// Check if the bundler can be run on this system
    async fn is_available(&self) -> bool;

    /// Get the human-readable builder name for display
    fn name(&self) -> &'static str;
}

/// Extract the useful tail of build output for error diagnostics.
///
/// Combines stdout and stderr, then returns the last `BUILD_ERROR_TAIL_LINES`
/// lines so error messages are actionable without being overwhelming.
pub(crate) fn build_error_output(stdout: &str, stderr: &str) -> String {
    let lines: Vec<&str> = stdout
        .lines()
        .chain(stderr.lines())
        .filter(|line| !line.trim().is_empty())
        .collect();
    let total = lines.len();
    let tail: Vec<&str> = if total > BUILD_ERROR_TAIL_LINES {
        lines[total - BUILD_ERROR_TAIL_LINES..].to_vec()
    } else {
        lines
    };
    tail.join("\n")
}
