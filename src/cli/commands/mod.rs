//! CLI command implementations

pub mod client;
pub mod config;
pub mod dev;
pub mod render;
pub mod status;

pub use client::execute as client;
pub use config::execute as config;
pub use dev::execute as dev;
pub use render::execute as render;
pub use status::execute as status;

use crate::cli::args::{RenderArgs, TargetArgs};
use crate::error::{RendrError, RendrResult};
use crate::paths;
use crate::render::RenderRequest;
use std::io::Write;
use std::path::Path;
use tokio::fs;

/// Request for a bare target: route id, file and props
fn target_request(target: &TargetArgs) -> RendrResult<RenderRequest> {
    let route_id = target
        .route
        .clone()
        .unwrap_or_else(|| paths::to_slash(&target.file));
    let mut request = RenderRequest::new(route_id, target.file.clone());

    if let Some(json) = &target.props {
        let props: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| RendrError::User(format!("Invalid --props JSON: {e}")))?;
        request = request.props(props);
    }
    Ok(request)
}

/// Full page request from render arguments
fn page_request(args: &RenderArgs) -> RendrResult<RenderRequest> {
    let mut request = target_request(&args.target)?.title(args.title.clone());
    for (key, value) in parse_meta(&args.meta)? {
        request = request.meta(key, value);
    }
    if let Some(location) = &args.location {
        request = request.location(location.clone());
    }
    Ok(request)
}

fn parse_meta(pairs: &[String]) -> RendrResult<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(RendrError::User(format!(
                "Invalid --meta value '{}': expected KEY=VALUE",
                pair
            ))),
        })
        .collect()
}

/// Write rendered bytes to a file, or to stdout when no file is given
async fn write_output(bytes: &[u8], output: Option<&Path>) -> RendrResult<()> {
    match output {
        Some(path) => fs::write(path, bytes)
            .await
            .map_err(|e| RendrError::io(format!("writing {}", path.display()), e)),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(bytes)
                .map_err(|e| RendrError::io("writing to stdout", e))?;
            stdout
                .flush()
                .map_err(|e| RendrError::io("flushing stdout", e))
        }
    }
}
