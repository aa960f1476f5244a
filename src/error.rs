//! Error types for rendr
//!
//! All modules use `RendrResult<T>` as their return type.

use crate::cache::Flavor;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rendr operations
pub type RendrResult<T> = Result<T, RendrError>;

/// All errors that can occur in rendr
#[derive(Error, Debug)]
pub enum RendrError {
    // Request errors
    #[error("Failed to serialize props: {0}")]
    Props(#[source] serde_json::Error),

    // Build errors
    #[error("Compilation failed: {0}")]
    Compile(String),

    #[error("Builder timed out after {0} seconds")]
    BuilderTimeout(u64),

    #[error("Failed to build {} for {flavor}: {source}", .file.display())]
    Build {
        file: PathBuf,
        flavor: Flavor,
        #[source]
        source: Box<RendrError>,
    },

    // Execution errors
    #[error("Script execution failed: {0}")]
    Execution(String),

    #[error("Script execution timed out after {0} ms")]
    ExecutionTimeout(u64),

    #[error("Failed to render {} on the server: {source}", .file.display())]
    Render {
        file: PathBuf,
        #[source]
        source: Box<RendrError>,
    },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Frontend directory not found: {0}")]
    FrontendDirNotFound(PathBuf),

    // Watch errors
    #[error("File watcher error: {0}")]
    Watch(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Render task aborted: {0}")]
    TaskJoin(String),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

/// Broad classification of a render failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Props could not be turned into JSON
    Serialization,
    /// The builder rejected the source
    Compilation,
    /// The compiled script failed inside the sandbox
    Execution,
    /// Anything else (config, IO, process plumbing)
    Internal,
}

impl ErrorKind {
    /// Human-readable label, used as the error page heading
    pub fn label(&self) -> &'static str {
        match self {
            Self::Serialization => "Serialization error",
            Self::Compilation => "Compilation error",
            Self::Execution => "Execution error",
            Self::Internal => "Internal error",
        }
    }
}

impl RendrError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Wrap a builder failure with the file and flavor being built
    pub fn build(file: impl Into<PathBuf>, flavor: Flavor, source: RendrError) -> Self {
        Self::Build {
            file: file.into(),
            flavor,
            source: Box::new(source),
        }
    }

    /// Wrap a sandbox failure with the file being rendered
    pub fn render(file: impl Into<PathBuf>, source: RendrError) -> Self {
        Self::Render {
            file: file.into(),
            source: Box::new(source),
        }
    }

    /// Classify the error, looking through context wrappers
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Props(_) => ErrorKind::Serialization,
            Self::Compile(_) | Self::BuilderTimeout(_) => ErrorKind::Compilation,
            Self::Execution(_) | Self::ExecutionTimeout(_) => ErrorKind::Execution,
            Self::Build { source, .. } => match source.kind() {
                ErrorKind::Internal => ErrorKind::Compilation,
                kind => kind,
            },
            Self::Render { source, .. } => match source.kind() {
                ErrorKind::Internal => ErrorKind::Execution,
                kind => kind,
            },
            _ => ErrorKind::Internal,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::FrontendDirNotFound(_) => {
                Some("Set engine.frontend_dir in rendr.toml or pass --frontend-dir")
            }
            Self::BuilderTimeout(_) => Some("Raise builder.timeout_secs in rendr.toml"),
            Self::ExecutionTimeout(_) => {
                Some("Check the component for infinite loops or raise sandbox.timeout_ms")
            }
            Self::CommandFailed { command, .. } if command.starts_with("esbuild") => {
                Some("Install esbuild: npm install --save-dev esbuild")
            }
            Self::CommandFailed { command, .. } if command.starts_with("node") => {
                Some("Install Node.js from https://nodejs.org")
            }
            Self::Build { source, .. } | Self::Render { source, .. } => source.hint(),
            _ => None,
        }
    }
}
