//! Per-request render coordination
//!
//! A render task resolves one request against the shared cache: it runs
//! the server and client sub-builds as separate tasks, builds on a miss,
//! injects the request's props into the cached script, evaluates the
//! server script in the sandbox, and joins the two results fail-fast.
//!
//! Every fresh artifact reports its dependencies as soon as it is cached,
//! whatever happens to the rest of the request, so a later change to any
//! file it was built from still invalidates it.

use crate::build::entry::{self, js_string, LOCATION_GLOBAL};
use crate::build::{BuildRequest, Builder};
use crate::cache::{BuildArtifact, BuildCache, Flavor};
use crate::error::{RendrError, RendrResult};
use crate::render::engine::EngineSettings;
use crate::render::write_behind::WriteBehind;
use crate::sandbox::Sandbox;
use futures_util::future::try_join;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Result of a full render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    /// Markup produced by the server bundle
    pub html: String,
    /// Stylesheet of the server bundle
    pub stylesheet: String,
    /// Client hydration script with props injected
    pub script: String,
}

struct ServerResult {
    html: String,
    stylesheet: String,
}

/// State shared by a task's sub-builds
struct SubBuilds {
    cache: Arc<BuildCache>,
    builder: Arc<dyn Builder>,
    sandbox: Arc<dyn Sandbox>,
    settings: Arc<EngineSettings>,
    writes: Arc<WriteBehind>,
    file: PathBuf,
    props: String,
    location: String,
}

/// Coordinates the builds for one render request
pub struct RenderTask {
    shared: Arc<SubBuilds>,
    route_id: String,
}

impl RenderTask {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        cache: Arc<BuildCache>,
        builder: Arc<dyn Builder>,
        sandbox: Arc<dyn Sandbox>,
        settings: Arc<EngineSettings>,
        writes: Arc<WriteBehind>,
        route_id: String,
        file: PathBuf,
        props: String,
        location: Option<String>,
    ) -> Self {
        Self {
            shared: Arc::new(SubBuilds {
                cache,
                builder,
                sandbox,
                settings,
                writes,
                file,
                props,
                location: location.unwrap_or_else(|| "/".to_string()),
            }),
            route_id,
        }
    }

    /// Render server markup and client script concurrently
    ///
    /// Returns the first error from either side; the other result is
    /// discarded and nothing partial is returned.
    pub async fn start(self) -> RendrResult<RenderOutput> {
        self.register_route();

        let server = {
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move { shared.server().await })
        };
        let client = {
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move { shared.client(Flavor::Client).await })
        };

        let (server, script) = try_join(joined(server), joined(client)).await?;

        Ok(RenderOutput {
            html: server.html,
            stylesheet: server.stylesheet,
            script,
        })
    }

    /// Render only the hydration script, without layout wrapping
    pub async fn start_client_only(self) -> RendrResult<String> {
        self.register_route();

        let client = {
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move { shared.client(Flavor::ClientRaw).await })
        };
        joined(client).await
    }

    fn register_route(&self) {
        let cache = Arc::clone(&self.shared.cache);
        let route_id = self.route_id.clone();
        let file = self.shared.file.clone();
        self.shared
            .writes
            .spawn(async move { cache.register_route(&route_id, &file) });
    }
}

impl SubBuilds {
    async fn server(&self) -> RendrResult<ServerResult> {
        let artifact = self.artifact(Flavor::Server).await?;
        let script = inject_props(&artifact.script, &self.props, Some(&self.location));

        let started = Instant::now();
        let html = self
            .sandbox
            .evaluate(&script)
            .await
            .map_err(|e| RendrError::render(&self.file, e))?;
        debug!(
            file = %self.file.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Evaluated server bundle"
        );

        Ok(ServerResult {
            html,
            stylesheet: artifact.stylesheet.clone(),
        })
    }

    async fn client(&self, flavor: Flavor) -> RendrResult<String> {
        let artifact = self.artifact(flavor).await?;
        Ok(inject_props(&artifact.script, &self.props, None))
    }

    /// Cached artifact for `flavor`, building it on a miss
    ///
    /// Failed builds are never stored, so the next request retries.
    async fn artifact(&self, flavor: Flavor) -> RendrResult<Arc<BuildArtifact>> {
        if let Some(artifact) = self.cache.get(&self.file, flavor) {
            debug!(
                file = %self.file.display(),
                %flavor,
                age_ms = artifact.age_ms(),
                "Cache hit"
            );
            return Ok(artifact);
        }

        let source = entry::generate(flavor, &self.settings.entry_options(&self.file));
        let started = Instant::now();
        let artifact = self
            .builder
            .build(BuildRequest {
                flavor,
                entry_source: &source,
                frontend_dir: &self.settings.frontend_dir,
                asset_route: &self.settings.asset_route,
            })
            .await
            .map_err(|e| RendrError::build(&self.file, flavor, e))?;

        info!(
            file = %self.file.display(),
            %flavor,
            elapsed_ms = started.elapsed().as_millis() as u64,
            dependencies = artifact.dependencies.len(),
            "Built"
        );
        let artifact = self.cache.put(&self.file, flavor, artifact);
        self.record_dependencies(flavor, &artifact);
        Ok(artifact)
    }

    // Concurrent builds of the same file race here; the last write wins.
    fn record_dependencies(&self, flavor: Flavor, artifact: &BuildArtifact) {
        let cache = Arc::clone(&self.cache);
        let file = self.file.clone();
        let dependencies = artifact.dependencies.clone();
        self.writes
            .spawn(async move { cache.set_dependencies(&file, flavor, &dependencies) });
    }
}

async fn joined<T>(handle: JoinHandle<RendrResult<T>>) -> RendrResult<T> {
    handle
        .await
        .map_err(|e| RendrError::TaskJoin(e.to_string()))?
}

/// Prefix a cached bundle with this request's props (and location)
pub(crate) fn inject_props(script: &str, props: &str, location: Option<&str>) -> String {
    let mut out = format!("var props = {props};\n");
    if let Some(location) = location {
        out.push_str(&format!("var {LOCATION_GLOBAL} = {};\n", js_string(location)));
    }
    out.push_str(script);
    out
}
