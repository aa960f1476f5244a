//! Render command - render a component to an HTML document

use super::{page_request, write_output};
use crate::cache::BuildCache;
use crate::cli::args::RenderArgs;
use crate::config::Config;
use crate::error::RendrResult;
use crate::render::Engine;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Execute the render command
pub async fn execute(args: RenderArgs, config: &Config) -> RendrResult<()> {
    let engine = Engine::from_config(config, Arc::new(BuildCache::new()))?;
    let request = page_request(&args)?;

    let started = Instant::now();
    let html = engine.try_render_route(&request).await?;
    engine.settle().await;
    info!(
        route_id = %request.route_id,
        bytes = html.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Rendered"
    );

    write_output(&html, args.output.as_deref()).await
}
