//! Shared build cache
//!
//! One store per flavor, the dependency graph and the route table each sit
//! behind their own lock. Artifacts go in fully built behind an `Arc`, so a
//! reader sees either the previous artifact or the new one.

use crate::cache::artifact::{BuildArtifact, Flavor};
use crate::cache::graph::DependencyGraph;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

type Store = RwLock<HashMap<PathBuf, Arc<BuildArtifact>>>;

/// Dependency lists as last reported by each flavor's build of a file
type FlavorDependencies = HashMap<PathBuf, [Vec<PathBuf>; 3]>;

/// Entry counts, for status output and logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub server: usize,
    pub client: usize,
    pub client_raw: usize,
    pub routes: usize,
    pub tracked_files: usize,
    pub dependency_edges: usize,
}

/// Compiled artifacts keyed by (file, flavor), plus dependency and route
/// bookkeeping used to invalidate them
///
/// Unbounded: entries leave only through [`BuildCache::invalidate`],
/// [`BuildCache::invalidate_route`] or [`BuildCache::clear`].
#[derive(Debug, Default)]
pub struct BuildCache {
    stores: [Store; 3],
    recorded: RwLock<FlavorDependencies>,
    graph: RwLock<DependencyGraph>,
    routes: RwLock<HashMap<String, PathBuf>>,
}

impl BuildCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the artifact for `file` and `flavor`
    pub fn get(&self, file: &Path, flavor: Flavor) -> Option<Arc<BuildArtifact>> {
        read(self.store(flavor)).get(file).cloned()
    }

    /// Store an artifact, replacing any previous one for the same key
    pub fn put(&self, file: &Path, flavor: Flavor, artifact: BuildArtifact) -> Arc<BuildArtifact> {
        let artifact = Arc::new(artifact);
        write(self.store(flavor)).insert(file.to_path_buf(), Arc::clone(&artifact));
        debug!(
            file = %file.display(),
            %flavor,
            fingerprint = %artifact.fingerprint(),
            built_at = %artifact.built_at.to_rfc3339(),
            "Cached build"
        );
        artifact
    }

    /// Replace the dependencies reported by `flavor`'s build of `file`
    ///
    /// The graph edges of `file` become the union over its flavors, so a
    /// layout-free client-raw build never hides the layout edge recorded by
    /// the server and client builds.
    pub fn set_dependencies(&self, file: &Path, flavor: Flavor, dependencies: &[PathBuf]) {
        let mut recorded = write(&self.recorded);
        let lists = recorded.entry(file.to_path_buf()).or_default();
        lists[flavor.index()] = dependencies.to_vec();

        let mut union: Vec<PathBuf> = lists.iter().flatten().cloned().collect();
        union.sort();
        union.dedup();
        write(&self.graph).set(file, &union);

        debug!(
            file = %file.display(),
            %flavor,
            count = dependencies.len(),
            edges = union.len(),
            "Recorded dependencies"
        );
    }

    /// Map a route to the file it renders
    pub fn register_route(&self, route_id: &str, file: &Path) {
        write(&self.routes).insert(route_id.to_string(), file.to_path_buf());
    }

    /// Drop every cached flavor of `file` and of every file that depends on it
    ///
    /// Returns the files that actually had entries removed.
    pub fn invalidate(&self, file: &Path) -> Vec<PathBuf> {
        let mut targets = vec![file.to_path_buf()];
        targets.extend(read(&self.graph).transitive_dependents(file));

        let mut removed = Vec::new();
        for target in targets {
            let mut dropped = false;
            for flavor in Flavor::all() {
                if write(self.store(*flavor)).remove(&target).is_some() {
                    dropped = true;
                }
            }
            if dropped {
                removed.push(target);
            }
        }

        debug!(
            file = %file.display(),
            removed = removed.len(),
            "Invalidated cache entries"
        );
        removed
    }

    /// Invalidate the file a route renders, if the route is known
    pub fn invalidate_route(&self, route_id: &str) -> Vec<PathBuf> {
        match self.file_for_route(route_id) {
            Some(file) => self.invalidate(&file),
            None => Vec::new(),
        }
    }

    /// File registered for a route
    pub fn file_for_route(&self, route_id: &str) -> Option<PathBuf> {
        read(&self.routes).get(route_id).cloned()
    }

    /// Routes that render `file`, sorted
    pub fn routes_for_file(&self, file: &Path) -> Vec<String> {
        let mut routes: Vec<String> = read(&self.routes)
            .iter()
            .filter(|(_, path)| path.as_path() == file)
            .map(|(route, _)| route.clone())
            .collect();
        routes.sort();
        routes
    }

    /// Recorded direct dependencies of `file`
    pub fn dependencies_of(&self, file: &Path) -> Vec<PathBuf> {
        read(&self.graph).dependencies_of(file)
    }

    /// Files that directly depend on `file`
    pub fn dependents_of(&self, file: &Path) -> Vec<PathBuf> {
        read(&self.graph).dependents_of(file)
    }

    /// Current entry counts
    pub fn stats(&self) -> CacheStats {
        let graph = read(&self.graph);
        CacheStats {
            server: read(self.store(Flavor::Server)).len(),
            client: read(self.store(Flavor::Client)).len(),
            client_raw: read(self.store(Flavor::ClientRaw)).len(),
            routes: read(&self.routes).len(),
            tracked_files: graph.len(),
            dependency_edges: graph.edge_count(),
        }
    }

    /// Drop all artifacts, edges and routes
    pub fn clear(&self) {
        for store in &self.stores {
            write(store).clear();
        }
        write(&self.recorded).clear();
        write(&self.graph).clear();
        write(&self.routes).clear();
    }

    fn store(&self, flavor: Flavor) -> &Store {
        &self.stores[flavor.index()]
    }
}

// The maps are never left half-updated, so a poisoned lock is still usable.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
