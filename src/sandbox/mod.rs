//! Script sandbox abstraction
//!
//! Server bundles are evaluated in an isolated JavaScript runtime whose
//! completion value is the rendered markup:
//! - Node.js (default)
//! - Deno

mod factory;
mod process;

pub use factory::create_sandbox;
pub use process::ProcessSandbox;

use crate::error::RendrResult;
use async_trait::async_trait;

/// Abstract script execution interface
///
/// Every call runs in a fresh environment: no globals survive from one
/// evaluation to the next. `atob` must be available to the script.
#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Evaluate a script and return its completion value as a string
    async fn evaluate(&self, script: &str) -> RendrResult<String>;

    /// Check if the runtime is available on this system
    async fn is_available(&self) -> bool;

    /// Get the human-readable runtime name for display
    fn name(&self) -> &'static str;
}
