//! Dev command - render, then watch the frontend and re-render on change

use super::{page_request, write_output};
use crate::cache::BuildCache;
use crate::cli::args::DevArgs;
use crate::config::Config;
use crate::error::RendrResult;
use crate::render::{Engine, RenderRequest};
use crate::watch::FileWatcher;
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Execute the dev command
pub async fn execute(args: DevArgs, config: &Config) -> RendrResult<()> {
    let cache = Arc::new(BuildCache::new());
    let engine = Engine::from_config(config, Arc::clone(&cache))?;
    let request = page_request(&args.render)?;
    let output = args.render.output.as_deref();

    let mut healthy = render_once(&engine, &request, output).await?;

    let settings = engine.settings();
    let layout: Vec<PathBuf> = [&settings.layout_file, &settings.layout_css_file]
        .into_iter()
        .flatten()
        .cloned()
        .collect();

    let mut watcher = FileWatcher::spawn(
        &settings.frontend_dir,
        Arc::clone(&cache),
        &config.watch,
        &config.builder.out_dir,
    )?;
    eprintln!(
        "{} {} (Ctrl-C to stop)",
        style("Watching").cyan().bold(),
        settings.frontend_dir.display()
    );

    loop {
        tokio::select! {
            batch = watcher.next() => {
                let Some(batch) = batch else { break };

                if batch.changed.iter().any(|path| layout.contains(path)) {
                    cache.clear();
                    eprintln!("{} layout changed, cache cleared", style("~").yellow());
                } else if batch.invalidated.is_empty() && healthy {
                    debug!(changed = batch.changed.len(), "No cached build affected");
                    continue;
                }

                for file in &batch.invalidated {
                    eprintln!("{} {}", style("invalidated").yellow(), file.display());
                }
                healthy = render_once(&engine, &request, output).await?;
                debug!(stats = ?cache.stats(), "Cache state after re-render");
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    engine.settle().await;
    Ok(())
}

/// Render and report; a failed render is reported, not returned
async fn render_once(
    engine: &Engine,
    request: &RenderRequest,
    output: Option<&Path>,
) -> RendrResult<bool> {
    let started = Instant::now();
    let result = engine.try_render_route(request).await;
    engine.settle().await;

    match result {
        Ok(html) => {
            write_output(&html, output).await?;
            eprintln!(
                "{} {} in {} ms",
                style("Rendered").green().bold(),
                request.file.display(),
                started.elapsed().as_millis()
            );
            Ok(true)
        }
        Err(e) => {
            eprintln!("{} {}", style("Render failed:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            Ok(false)
        }
    }
}
