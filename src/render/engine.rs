//! Render engine: the long-lived entry point for render requests

use crate::build::{Builder, EntryOptions, EsbuildBuilder};
use crate::cache::BuildCache;
use crate::config::schema::EngineConfig;
use crate::config::Config;
use crate::error::{RendrError, RendrResult};
use crate::paths;
use crate::render::html::{self, Page};
use crate::render::request::RenderRequest;
use crate::render::task::RenderTask;
use crate::render::write_behind::WriteBehind;
use crate::sandbox::{create_sandbox, Sandbox};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

/// Engine configuration with every path resolved to an absolute one
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Frontend root
    pub frontend_dir: PathBuf,
    /// URL prefix for emitted assets
    pub asset_route: String,
    /// Layout component
    pub layout_file: Option<PathBuf>,
    /// Layout stylesheet
    pub layout_css_file: Option<PathBuf>,
    /// Wrap pages in react-router
    pub router: bool,
}

impl EngineSettings {
    /// Resolve configured paths; layout paths are relative to the frontend root
    pub fn from_config(config: &EngineConfig) -> RendrResult<Self> {
        let frontend_dir = paths::absolutize(&config.frontend_dir)?;
        let resolve = |p: &PathBuf| paths::resolve(&frontend_dir, p);

        Ok(Self {
            layout_file: config.layout_file.as_ref().map(resolve),
            layout_css_file: config.layout_css_file.as_ref().map(resolve),
            asset_route: config.asset_route.clone(),
            router: config.router,
            frontend_dir,
        })
    }

    /// Resolve a caller-relative component path to its cache key
    pub fn resolve_file(&self, file: &Path) -> PathBuf {
        paths::resolve(&self.frontend_dir, file)
    }

    pub(crate) fn entry_options<'a>(&'a self, component: &'a Path) -> EntryOptions<'a> {
        EntryOptions {
            component,
            layout: self.layout_file.as_deref(),
            layout_css: self.layout_css_file.as_deref(),
            router: self.router,
        }
    }
}

/// Process-wide renderer
///
/// Construct once at startup and share; the cache is injected so the file
/// watcher (or anything else) can hold the same instance.
pub struct Engine {
    settings: Arc<EngineSettings>,
    cache: Arc<BuildCache>,
    builder: Arc<dyn Builder>,
    sandbox: Arc<dyn Sandbox>,
    writes: Arc<WriteBehind>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine from explicit collaborators
    pub fn new(
        settings: EngineSettings,
        cache: Arc<BuildCache>,
        builder: Arc<dyn Builder>,
        sandbox: Arc<dyn Sandbox>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            cache,
            builder,
            sandbox,
            writes: Arc::new(WriteBehind::new()),
        }
    }

    /// Create an engine with the esbuild builder and the configured sandbox
    pub fn from_config(config: &Config, cache: Arc<BuildCache>) -> RendrResult<Self> {
        let settings = EngineSettings::from_config(&config.engine)?;
        if !settings.frontend_dir.is_dir() {
            return Err(RendrError::FrontendDirNotFound(settings.frontend_dir));
        }
        debug!(
            frontend_dir = %settings.frontend_dir.display(),
            sandbox = config.sandbox.runtime.name(),
            "Render engine configured"
        );

        Ok(Self::new(
            settings,
            cache,
            Arc::new(EsbuildBuilder::new(&config.builder)),
            create_sandbox(&config.sandbox),
        ))
    }

    /// Shared build cache
    pub fn cache(&self) -> &Arc<BuildCache> {
        &self.cache
    }

    /// Resolved settings
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Builder in use
    pub fn builder(&self) -> &dyn Builder {
        &*self.builder
    }

    /// Sandbox in use
    pub fn sandbox(&self) -> &dyn Sandbox {
        &*self.sandbox
    }

    /// Render a route to a full HTML document, or to an error page
    pub async fn render_route<P: Serialize>(&self, request: &RenderRequest<P>) -> Vec<u8> {
        match self.try_render_route(request).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.log_failure(request, &e);
                html::render_error_page(&e, &request.route_id).into_bytes()
            }
        }
    }

    /// Render a route to a full HTML document
    pub async fn try_render_route<P: Serialize>(
        &self,
        request: &RenderRequest<P>,
    ) -> RendrResult<Vec<u8>> {
        let output = self.task(request)?.start().await?;

        Ok(html::render_page(&Page {
            title: &request.title,
            meta_tags: &request.meta_tags,
            stylesheet: &output.stylesheet,
            server_html: &output.html,
            script: &output.script,
            route_id: &request.route_id,
        })
        .into_bytes())
    }

    /// Render only the hydration script for a route, or an error script
    pub async fn client_render_route<P: Serialize>(&self, request: &RenderRequest<P>) -> Vec<u8> {
        match self.try_client_render_route(request).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.log_failure(request, &e);
                html::render_error_script(&e, &request.route_id).into_bytes()
            }
        }
    }

    /// Render only the hydration script for a route
    pub async fn try_client_render_route<P: Serialize>(
        &self,
        request: &RenderRequest<P>,
    ) -> RendrResult<Vec<u8>> {
        let script = self.task(request)?.start_client_only().await?;
        Ok(script.into_bytes())
    }

    /// Wait for detached cache bookkeeping from earlier renders
    pub async fn settle(&self) {
        self.writes.settle().await;
    }

    fn task<P: Serialize>(&self, request: &RenderRequest<P>) -> RendrResult<RenderTask> {
        let props = request.props_script()?;
        Ok(RenderTask::new(
            Arc::clone(&self.cache),
            Arc::clone(&self.builder),
            Arc::clone(&self.sandbox),
            Arc::clone(&self.settings),
            Arc::clone(&self.writes),
            request.route_id.clone(),
            self.settings.resolve_file(&request.file),
            props,
            request.location.clone(),
        ))
    }

    fn log_failure<P>(&self, request: &RenderRequest<P>, err: &RendrError) {
        error!(
            route_id = %request.route_id,
            file = %self.settings.resolve_file(&request.file).display(),
            kind = ?err.kind(),
            "Render failed: {}",
            err
        );
    }
}
