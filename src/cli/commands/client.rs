//! Client command - build the standalone hydration script for a component

use super::{target_request, write_output};
use crate::cache::BuildCache;
use crate::cli::args::ClientArgs;
use crate::config::Config;
use crate::error::RendrResult;
use crate::render::Engine;
use std::sync::Arc;

/// Execute the client command
pub async fn execute(args: ClientArgs, config: &Config) -> RendrResult<()> {
    let engine = Engine::from_config(config, Arc::new(BuildCache::new()))?;
    let request = target_request(&args.target)?;

    let script = engine.try_client_render_route(&request).await?;
    engine.settle().await;

    write_output(&script, args.output.as_deref()).await
}
