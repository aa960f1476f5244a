//! esbuild-backed builder
//!
//! Runs the esbuild CLI once per build with the entry fed on stdin. Output
//! lands in `<frontend>/<out_dir>/<flavor>/` under a unique name; the script,
//! stylesheet and metafile are read back and removed, emitted assets stay
//! for static serving.

use crate::build::entry::SERVER_OUTPUT_GLOBAL;
use crate::build::{build_error_output, BuildRequest, Builder};
use crate::cache::{BuildArtifact, Flavor};
use crate::config::schema::BuilderConfig;
use crate::error::{RendrError, RendrResult};
use crate::paths;
use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

/// Asset extensions bundled with the `file` loader
const FILE_LOADER_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".woff", ".woff2", ".ttf",
];

/// Builder that shells out to esbuild
pub struct EsbuildBuilder {
    command: String,
    out_dir: PathBuf,
    minify: bool,
    timeout: Duration,
}

/// The slice of esbuild's metafile we read
#[derive(Debug, Deserialize)]
struct Metafile {
    #[serde(default)]
    inputs: BTreeMap<String, IgnoredAny>,
}

impl EsbuildBuilder {
    /// Create a builder from configuration
    pub fn new(config: &BuilderConfig) -> Self {
        Self {
            command: config.command.clone(),
            out_dir: config.out_dir.clone(),
            minify: config.minify,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Command-line arguments for one build
    fn args(&self, request: &BuildRequest<'_>, outfile: &Path, metafile: &Path) -> Vec<String> {
        let mut args = vec![
            "--bundle".to_string(),
            "--format=iife".to_string(),
            "--platform=browser".to_string(),
            "--charset=utf8".to_string(),
            "--log-level=error".to_string(),
            "--loader=jsx".to_string(),
            format!("--sourcefile={}-entry.jsx", request.flavor),
            format!("--resolve-dir={}", request.frontend_dir.display()),
            format!("--outfile={}", outfile.display()),
            format!("--metafile={}", metafile.display()),
            format!("--public-path={}", request.asset_route),
            "--asset-names=[name]-[hash]".to_string(),
            "--define:process.env.NODE_ENV=\"production\"".to_string(),
        ];
        args.extend(
            FILE_LOADER_EXTENSIONS
                .iter()
                .map(|ext| format!("--loader:{ext}=file")),
        );

        match request.flavor {
            Flavor::Server => args.push(format!("--footer:js={SERVER_OUTPUT_GLOBAL};")),
            Flavor::Client | Flavor::ClientRaw if self.minify => args.push("--minify".to_string()),
            Flavor::Client | Flavor::ClientRaw => {}
        }

        args
    }

    async fn run(&self, request: &BuildRequest<'_>, args: &[String]) -> RendrResult<()> {
        debug!("Executing: {} {:?}", self.command, args);

        let mut child = Command::new(&self.command)
            .args(args)
            .current_dir(request.frontend_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RendrError::command_failed(format!("{} --bundle", self.command), e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.entry_source.as_bytes())
                .await
                .map_err(|e| RendrError::io("writing entry source to esbuild", e))?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RendrError::BuilderTimeout(self.timeout.as_secs()))?
            .map_err(|e| RendrError::command_failed(format!("{} --bundle", self.command), e))?;

        if output.status.success() {
            Ok(())
        } else {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(RendrError::Compile(build_error_output(&stdout, &stderr)))
        }
    }
}

#[async_trait]
impl Builder for EsbuildBuilder {
    async fn build(&self, request: BuildRequest<'_>) -> RendrResult<BuildArtifact> {
        let out_dir = request
            .frontend_dir
            .join(&self.out_dir)
            .join(request.flavor.to_string());
        fs::create_dir_all(&out_dir)
            .await
            .map_err(|e| RendrError::io(format!("creating {}", out_dir.display()), e))?;

        let name = output_name(request.flavor, request.entry_source);
        let outfile = out_dir.join(format!("{name}.js"));
        let stylesheet_file = out_dir.join(format!("{name}.css"));
        let metafile = out_dir.join(format!("{name}.meta.json"));
        let generated = [&outfile, &stylesheet_file, &metafile];

        let args = self.args(&request, &outfile, &metafile);
        let result = match self.run(&request, &args).await {
            Ok(()) => read_outputs(request.frontend_dir, &outfile, &stylesheet_file, &metafile).await,
            Err(e) => Err(e),
        };

        for path in generated {
            if let Err(e) = fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!("Failed to remove {}: {}", path.display(), e);
                }
            }
        }

        result
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "esbuild"
    }
}

/// Unique output name: flavor, entry hash, then a random suffix so two
/// concurrent builds of the same entry never share files
fn output_name(flavor: Flavor, entry_source: &str) -> String {
    let digest = Sha256::digest(entry_source.as_bytes());
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", flavor, hex::encode(&digest[..6]), &suffix[..8])
}

async fn read_outputs(
    frontend_dir: &Path,
    outfile: &Path,
    stylesheet_file: &Path,
    metafile: &Path,
) -> RendrResult<BuildArtifact> {
    let script = fs::read_to_string(outfile)
        .await
        .map_err(|e| RendrError::io(format!("reading {}", outfile.display()), e))?;

    let stylesheet = match fs::read_to_string(stylesheet_file).await {
        Ok(css) => css,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(RendrError::io(
                format!("reading {}", stylesheet_file.display()),
                e,
            ))
        }
    };

    let meta = fs::read_to_string(metafile)
        .await
        .map_err(|e| RendrError::io(format!("reading {}", metafile.display()), e))?;
    let dependencies = parse_dependencies(frontend_dir, &meta)?;

    Ok(BuildArtifact::new(script, stylesheet, dependencies))
}

/// Project files listed in an esbuild metafile
///
/// Input keys are relative to esbuild's working directory (the frontend
/// root). The stdin entry and anything under node_modules are skipped.
fn parse_dependencies(frontend_dir: &Path, metafile: &str) -> RendrResult<Vec<PathBuf>> {
    let meta: Metafile = serde_json::from_str(metafile)?;
    Ok(meta
        .inputs
        .keys()
        .filter(|input| !input.starts_with('<'))
        .map(Path::new)
        .filter(|input| !paths::has_segment(input, &["node_modules".to_string()]))
        .map(|input| paths::resolve(frontend_dir, input))
        .collect())
}
