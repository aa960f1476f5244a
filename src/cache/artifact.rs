//! Build flavors and compiled artifacts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;

/// Which compiled variant of a source file is being built or cached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flavor {
    /// Evaluated in the sandbox to produce markup
    Server,
    /// Hydration script, wrapped in the layout when one is configured
    Client,
    /// Hydration script without layout wrapping
    ClientRaw,
}

impl Flavor {
    /// All flavors, in store order
    pub fn all() -> &'static [Self] {
        &[Self::Server, Self::Client, Self::ClientRaw]
    }

    /// Whether builds of this flavor run in the browser
    pub fn is_client(&self) -> bool {
        matches!(self, Self::Client | Self::ClientRaw)
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Self::Server => 0,
            Self::Client => 1,
            Self::ClientRaw => 2,
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Server => "server",
            Self::Client => "client",
            Self::ClientRaw => "client-raw",
        };
        write!(f, "{}", name)
    }
}

/// Compiled output of one source file for one flavor
///
/// Built without props, so the same script serves every request for the
/// file. Shared behind `Arc` once stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    /// Bundled script text
    pub script: String,
    /// Extracted stylesheet, empty when the bundle imports no CSS
    pub stylesheet: String,
    /// Files the bundle was compiled from, in builder order
    pub dependencies: Vec<PathBuf>,
    /// When the builder produced this artifact
    pub built_at: DateTime<Utc>,
}

impl BuildArtifact {
    /// Create an artifact stamped with the current time
    pub fn new(
        script: impl Into<String>,
        stylesheet: impl Into<String>,
        dependencies: Vec<PathBuf>,
    ) -> Self {
        Self {
            script: script.into(),
            stylesheet: stylesheet.into(),
            dependencies,
            built_at: Utc::now(),
        }
    }

    /// Milliseconds since the artifact was built
    pub fn age_ms(&self) -> i64 {
        (Utc::now() - self.built_at).num_milliseconds().max(0)
    }

    /// SHA256 of the script, first 12 hex chars
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.script.as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..6])
    }
}
