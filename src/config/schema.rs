//! Configuration schema for rendr
//!
//! Global configuration lives at `~/.config/rendr/config.toml`; a project
//! `rendr.toml` overrides it key by key.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Render engine settings
    pub engine: EngineConfig,

    /// Bundler settings
    pub builder: BuilderConfig,

    /// Script sandbox settings
    pub sandbox: SandboxConfig,

    /// File watcher settings
    pub watch: WatchConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Render engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory containing the component sources and node_modules
    pub frontend_dir: PathBuf,

    /// URL prefix under which emitted assets are served
    pub asset_route: String,

    /// Layout component wrapping every page (relative to frontend_dir)
    pub layout_file: Option<PathBuf>,

    /// Stylesheet imported ahead of every page (relative to frontend_dir)
    pub layout_css_file: Option<PathBuf>,

    /// Wrap pages in react-router's StaticRouter / BrowserRouter
    pub router: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frontend_dir: PathBuf::from("frontend"),
            asset_route: "/assets/".to_string(),
            layout_file: None,
            layout_css_file: None,
            router: false,
        }
    }
}

/// Bundler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// esbuild executable
    pub command: String,

    /// Output directory for emitted assets (relative to frontend_dir)
    pub out_dir: PathBuf,

    /// Minify client bundles
    pub minify: bool,

    /// Maximum time for a single build
    pub timeout_secs: u64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            command: "esbuild".to_string(),
            out_dir: PathBuf::from(".rendr"),
            minify: true,
            timeout_secs: 60,
        }
    }
}

/// JavaScript runtime used to evaluate server bundles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxRuntime {
    #[default]
    Node,
    Deno,
}

/// Script sandbox settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Which runtime evaluates server bundles
    pub runtime: SandboxRuntime,

    /// Executable override (defaults to the runtime's own name)
    pub command: Option<String>,

    /// Maximum time for a single evaluation
    pub timeout_ms: u64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            runtime: SandboxRuntime::Node,
            command: None,
            timeout_ms: 5000,
        }
    }
}

/// File watcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period before a batch of changes is applied
    pub debounce_ms: u64,

    /// Extra path segments to ignore (node_modules, .git and the builder
    /// out_dir are always ignored)
    pub ignore: Vec<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            ignore: vec![],
        }
    }
}
