//! Sandbox factory
//!
//! Picks the single sandbox implementation used for the lifetime of the
//! process from configuration.

use crate::config::schema::{SandboxConfig, SandboxRuntime};
use crate::sandbox::process::ProcessSandbox;
use crate::sandbox::Sandbox;
use std::sync::Arc;
use std::time::Duration;

impl SandboxRuntime {
    /// Default executable for this runtime
    pub fn default_command(&self) -> &'static str {
        match self {
            SandboxRuntime::Node => "node",
            SandboxRuntime::Deno => "deno",
        }
    }

    /// Arguments that make the runtime read a program from stdin
    pub fn stdin_args(&self) -> &'static [&'static str] {
        match self {
            SandboxRuntime::Node => &["-"],
            SandboxRuntime::Deno => &["run", "--quiet", "--no-prompt", "-"],
        }
    }

    /// Get a human-readable runtime name
    pub fn name(&self) -> &'static str {
        match self {
            SandboxRuntime::Node => "node",
            SandboxRuntime::Deno => "deno",
        }
    }
}

/// Create the sandbox described by `config`
pub fn create_sandbox(config: &SandboxConfig) -> Arc<dyn Sandbox> {
    let command = config
        .command
        .clone()
        .unwrap_or_else(|| config.runtime.default_command().to_string());

    Arc::new(ProcessSandbox::new(
        config.runtime,
        command,
        Duration::from_millis(config.timeout_ms),
    ))
}
