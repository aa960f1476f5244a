//! Engine orchestration against in-process builder and sandbox doubles

use async_trait::async_trait;
use rendr::build::{BuildRequest, Builder};
use rendr::cache::{BuildArtifact, BuildCache, Flavor};
use rendr::render::{Engine, EngineSettings, RenderRequest};
use rendr::sandbox::Sandbox;
use rendr::{RendrError, RendrResult};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const FRONTEND: &str = "/app/frontend";

fn frontend(file: &str) -> PathBuf {
    Path::new(FRONTEND).join(file)
}

/// Builds every component it is asked for, except ones named `Broken`
///
/// Components named `Fragile` build on the server but fail for both
/// client flavors, after the client delay.
#[derive(Default)]
struct FakeBuilder {
    calls: Mutex<Vec<(String, Flavor)>>,
    dependencies: Mutex<HashMap<String, Vec<PathBuf>>>,
    client_delay: Mutex<Option<Duration>>,
}

impl FakeBuilder {
    fn calls(&self, flavor: Flavor) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, f)| *f == flavor)
            .count()
    }

    fn depends(&self, component: &str, deps: &[&str]) {
        self.dependencies.lock().unwrap().insert(
            component.to_string(),
            deps.iter().map(|d| frontend(d)).collect(),
        );
    }
}

fn component_of(entry_source: &str) -> String {
    let line = entry_source
        .lines()
        .find(|line| line.starts_with("import App from "))
        .expect("entry imports the component");
    let path = line
        .trim_start_matches("import App from ")
        .trim_end_matches(';');
    let path: String = serde_json::from_str(path).unwrap();
    Path::new(&path)
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned()
}

#[async_trait]
impl Builder for FakeBuilder {
    async fn build(&self, request: BuildRequest<'_>) -> RendrResult<BuildArtifact> {
        let component = component_of(request.entry_source);
        self.calls
            .lock()
            .unwrap()
            .push((component.clone(), request.flavor));

        if component.starts_with("Broken") {
            return Err(RendrError::Compile(format!(
                "{component}:3:0: ERROR: Unexpected end of file"
            )));
        }
        if request.flavor.is_client() {
            let delay = *self.client_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if component.starts_with("Fragile") {
                return Err(RendrError::Compile(format!(
                    "{component}:1:0: ERROR: Could not resolve \"window-only\""
                )));
            }
        }

        let mut deps = vec![frontend(&component)];
        if request.entry_source.contains("import Layout from ") {
            deps.push(frontend("Layout.tsx"));
        }
        if let Some(extra) = self.dependencies.lock().unwrap().get(&component) {
            deps.extend(extra.iter().cloned());
        }

        let script = match request.flavor {
            Flavor::Server => format!("render({component});"),
            Flavor::Client => format!("hydrate({component});"),
            Flavor::ClientRaw => format!("hydrateRaw({component});"),
        };
        Ok(BuildArtifact::new(script, "h1{color:red}", deps))
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Greets `props.name`; throws for components named `Crash`
#[derive(Default)]
struct FakeSandbox {
    calls: AtomicUsize,
}

#[async_trait]
impl Sandbox for FakeSandbox {
    async fn evaluate(&self, script: &str) -> RendrResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if script.contains("render(Crash") {
            return Err(RendrError::Execution(
                "TypeError: Cannot read properties of undefined".to_string(),
            ));
        }

        let first = script.lines().next().unwrap_or_default();
        let json = first
            .trim_start_matches("var props = ")
            .trim_end_matches(';');
        let props: serde_json::Value = serde_json::from_str(json).unwrap();
        let name = props["name"].as_str().unwrap_or("nobody");
        Ok(format!("<h1>Hello {name}</h1>"))
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct Harness {
    engine: Engine,
    cache: Arc<BuildCache>,
    builder: Arc<FakeBuilder>,
    sandbox: Arc<FakeSandbox>,
}

fn harness() -> Harness {
    harness_with_layout(None)
}

fn harness_with_layout(layout: Option<&str>) -> Harness {
    let cache = Arc::new(BuildCache::new());
    let builder = Arc::new(FakeBuilder::default());
    let sandbox = Arc::new(FakeSandbox::default());
    let settings = EngineSettings {
        frontend_dir: PathBuf::from(FRONTEND),
        asset_route: "/assets/".to_string(),
        layout_file: layout.map(frontend),
        layout_css_file: None,
        router: false,
    };
    let engine = Engine::new(
        settings,
        Arc::clone(&cache),
        builder.clone(),
        sandbox.clone(),
    );
    Harness {
        engine,
        cache,
        builder,
        sandbox,
    }
}

#[derive(Serialize)]
struct Greeting {
    name: &'static str,
}

fn home(name: &'static str) -> RenderRequest<Greeting> {
    RenderRequest::new("home", "Home.tsx")
        .title("Home")
        .props(Greeting { name })
}

fn text(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap()
}

#[tokio::test]
async fn home_renders_each_request_with_its_own_props() {
    let h = harness();

    let ann = text(h.engine.render_route(&home("Ann")).await);
    let bo = text(h.engine.render_route(&home("Bo")).await);

    assert!(ann.contains("<h1>Hello Ann</h1>"));
    assert!(ann.contains(r#"var props = {"name":"Ann"};"#));
    assert!(ann.contains("<title>Home</title>"));
    assert!(ann.contains("<style>h1{color:red}</style>"));

    assert!(bo.contains("<h1>Hello Bo</h1>"));
    assert!(bo.contains(r#"var props = {"name":"Bo"};"#));
    assert!(!bo.contains("Ann"));

    assert_eq!(h.builder.calls(Flavor::Server), 1);
    assert_eq!(h.builder.calls(Flavor::Client), 1);
    assert_eq!(h.sandbox.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn cached_artifacts_never_carry_props() {
    let h = harness();
    h.engine.render_route(&home("Ann")).await;
    h.engine.render_route(&home("Bo")).await;

    let server = h.cache.get(&frontend("Home.tsx"), Flavor::Server).unwrap();
    let client = h.cache.get(&frontend("Home.tsx"), Flavor::Client).unwrap();
    assert_eq!(server.script, "render(Home.tsx);");
    assert_eq!(client.script, "hydrate(Home.tsx);");
}

#[tokio::test]
async fn client_only_uses_its_own_flavor() {
    let h = harness();
    h.engine.render_route(&home("Ann")).await;

    let script = text(h.engine.client_render_route(&home("Bo")).await);
    h.engine.client_render_route(&home("Cy")).await;

    assert_eq!(script, "var props = {\"name\":\"Bo\"};\nhydrateRaw(Home.tsx);");
    assert_eq!(h.builder.calls(Flavor::ClientRaw), 1);
    assert_eq!(h.builder.calls(Flavor::Client), 1);
    assert_eq!(h.builder.calls(Flavor::Server), 1);
    assert_eq!(h.sandbox.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn broken_component_yields_error_page_and_no_cache_entry() {
    let h = harness();
    let request = RenderRequest::new("broken", "Broken.tsx");

    let page = text(h.engine.render_route(&request).await);
    assert!(!page.is_empty());
    assert!(page.contains("Compilation error"));
    assert!(page.contains("Broken.tsx"));
    assert!(page.contains("Unexpected end of file"));

    for flavor in Flavor::all() {
        assert!(h.cache.get(&frontend("Broken.tsx"), *flavor).is_none());
    }

    // Failures are not cached, so the next request builds again
    h.engine.render_route(&request).await;
    assert_eq!(h.builder.calls(Flavor::Server), 2);
}

#[tokio::test]
async fn server_failure_does_not_wait_for_client() {
    let h = harness();
    *h.builder.client_delay.lock().unwrap() = Some(Duration::from_secs(5));

    let started = Instant::now();
    let err = h
        .engine
        .try_render_route(&RenderRequest::new("crash", "Crash.tsx"))
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(matches!(err, RendrError::Render { .. }));
    assert_eq!(err.kind().label(), "Execution error");
}

#[tokio::test]
async fn error_page_names_execution_failures() {
    let h = harness();
    let page = text(
        h.engine
            .render_route(&RenderRequest::new("crash", "Crash.tsx"))
            .await,
    );
    assert!(page.contains("<h1>Execution error</h1>"));
    assert!(page.contains("Cannot read properties of undefined"));
}

#[tokio::test]
async fn changed_dependency_invalidates_dependents() {
    let h = harness();
    h.builder.depends("Home.tsx", &["components/Card.tsx"]);

    h.engine.render_route(&home("Ann")).await;
    h.engine.settle().await;

    let card = frontend("components/Card.tsx");
    assert_eq!(h.cache.dependents_of(&card), vec![frontend("Home.tsx")]);
    assert_eq!(h.cache.file_for_route("home"), Some(frontend("Home.tsx")));

    let removed = h.cache.invalidate(&card);
    assert_eq!(removed, vec![frontend("Home.tsx")]);
    assert!(h.cache.get(&frontend("Home.tsx"), Flavor::Server).is_none());

    h.engine.render_route(&home("Bo")).await;
    assert_eq!(h.builder.calls(Flavor::Server), 2);
    assert_eq!(h.builder.calls(Flavor::Client), 2);
}

#[tokio::test]
async fn unserializable_props_fail_before_building() {
    let h = harness();
    let mut props = HashMap::new();
    props.insert((1, 2), "tuple keys");
    let request = RenderRequest::new("home", "Home.tsx").props(props);

    let page = text(h.engine.render_route(&request).await);
    assert!(page.contains("Serialization error"));
    assert_eq!(h.builder.calls(Flavor::Server), 0);

    let script = text(h.engine.client_render_route(&request).await);
    assert!(script.starts_with("console.error("));
}

#[tokio::test]
async fn concurrent_renders_share_one_cache() {
    let h = harness();
    h.engine.render_route(&home("Ann")).await;

    let (ann, bo) = (home("Ann"), home("Bo"));
    let (a, b) = tokio::join!(h.engine.render_route(&ann), h.engine.render_route(&bo));
    assert!(text(a).contains("Hello Ann"));
    assert!(text(b).contains("Hello Bo"));
    assert_eq!(h.builder.calls(Flavor::Server), 1);
}

#[tokio::test]
async fn client_only_render_keeps_layout_edges() {
    let h = harness_with_layout(Some("Layout.tsx"));
    let page = frontend("Home.tsx");
    let layout = frontend("Layout.tsx");

    h.engine.render_route(&home("Ann")).await;
    h.engine.settle().await;
    h.engine.client_render_route(&home("Bo")).await;
    h.engine.settle().await;

    assert_eq!(h.cache.dependents_of(&layout), vec![page.clone()]);

    let removed = h.cache.invalidate(&layout);
    assert_eq!(removed, vec![page.clone()]);
    for flavor in Flavor::all() {
        assert!(h.cache.get(&page, *flavor).is_none());
    }

    let html = text(h.engine.render_route(&home("Cy")).await);
    assert!(html.contains("Hello Cy"));
    assert_eq!(h.builder.calls(Flavor::Server), 2);
    assert_eq!(h.builder.calls(Flavor::Client), 2);
}

#[tokio::test]
async fn failed_render_still_tracks_dependencies() {
    let h = harness();
    h.builder.depends("Crash.tsx", &["components/Card.tsx"]);
    let request = RenderRequest::new("crash", "Crash.tsx");

    let page = text(h.engine.render_route(&request).await);
    assert!(page.contains("Execution error"));
    h.engine.settle().await;

    let card = frontend("components/Card.tsx");
    assert!(h.cache.dependents_of(&card).contains(&frontend("Crash.tsx")));
    assert_eq!(h.cache.invalidate(&card), vec![frontend("Crash.tsx")]);
    assert!(h.cache.get(&frontend("Crash.tsx"), Flavor::Server).is_none());

    h.engine.render_route(&request).await;
    assert_eq!(h.builder.calls(Flavor::Server), 2);
}

#[tokio::test]
async fn client_build_failure_keeps_server_artifact() {
    let h = harness();
    *h.builder.client_delay.lock().unwrap() = Some(Duration::from_millis(50));
    h.builder.depends("Fragile.tsx", &["components/Card.tsx"]);
    let fragile = frontend("Fragile.tsx");

    let page = text(
        h.engine
            .render_route(&RenderRequest::new("fragile", "Fragile.tsx"))
            .await,
    );
    assert!(page.contains("<h1>Compilation error</h1>"));
    assert!(page.contains("window-only"));
    h.engine.settle().await;

    assert!(h.cache.get(&fragile, Flavor::Server).is_some());
    assert!(h.cache.get(&fragile, Flavor::Client).is_none());

    let card = frontend("components/Card.tsx");
    assert_eq!(h.cache.dependents_of(&card), vec![fragile.clone()]);
    assert_eq!(h.cache.invalidate(&card), vec![fragile.clone()]);
    assert!(h.cache.get(&fragile, Flavor::Server).is_none());
}
