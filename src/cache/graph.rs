//! File dependency graph used for cascading invalidation

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Direct file → dependency edges, indexed in both directions
///
/// Forward edges come from the most recent client build of each file.
/// The reverse index answers "who embeds this file" during invalidation.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    forward: HashMap<PathBuf, HashSet<PathBuf>>,
    reverse: HashMap<PathBuf, HashSet<PathBuf>>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the dependency set of `file`
    ///
    /// Edges recorded by an earlier build are dropped, not merged.
    pub fn set(&mut self, file: &Path, dependencies: &[PathBuf]) {
        if let Some(old) = self.forward.remove(file) {
            for dep in old {
                self.unlink_reverse(&dep, file);
            }
        }

        let deps: HashSet<PathBuf> = dependencies
            .iter()
            .filter(|dep| dep.as_path() != file)
            .cloned()
            .collect();

        for dep in &deps {
            self.reverse
                .entry(dep.clone())
                .or_default()
                .insert(file.to_path_buf());
        }

        if !deps.is_empty() {
            self.forward.insert(file.to_path_buf(), deps);
        }
    }

    /// Direct dependencies of `file`, sorted
    pub fn dependencies_of(&self, file: &Path) -> Vec<PathBuf> {
        sorted(self.forward.get(file))
    }

    /// Files whose dependency set directly contains `file`, sorted
    pub fn dependents_of(&self, file: &Path) -> Vec<PathBuf> {
        sorted(self.reverse.get(file))
    }

    /// Every file that depends on `file`, directly or through other files
    ///
    /// Breadth-first over the reverse index; cycles are visited once and
    /// `file` itself is never included.
    pub fn transitive_dependents(&self, file: &Path) -> Vec<PathBuf> {
        let mut seen: HashSet<&Path> = HashSet::new();
        seen.insert(file);

        let mut queue: VecDeque<&Path> = VecDeque::from([file]);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            let Some(parents) = self.reverse.get(current) else {
                continue;
            };
            for parent in parents {
                if seen.insert(parent.as_path()) {
                    out.push(parent.clone());
                    queue.push_back(parent.as_path());
                }
            }
        }

        out
    }

    /// Number of files with recorded dependencies
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Whether no edges are recorded
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Total number of recorded edges
    pub fn edge_count(&self) -> usize {
        self.forward.values().map(HashSet::len).sum()
    }

    /// Drop all edges
    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }

    fn unlink_reverse(&mut self, dep: &Path, file: &Path) {
        if let Some(parents) = self.reverse.get_mut(dep) {
            parents.remove(file);
            if parents.is_empty() {
                self.reverse.remove(dep);
            }
        }
    }
}

fn sorted(set: Option<&HashSet<PathBuf>>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = set.map(|s| s.iter().cloned().collect()).unwrap_or_default();
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn set_replaces_previous_edges() {
        let mut graph = DependencyGraph::new();
        graph.set(&p("/app/Home.tsx"), &[p("/app/Button.tsx"), p("/app/Nav.tsx")]);
        graph.set(&p("/app/Home.tsx"), &[p("/app/Nav.tsx")]);

        assert_eq!(graph.dependencies_of(&p("/app/Home.tsx")), vec![p("/app/Nav.tsx")]);
        assert!(graph.dependents_of(&p("/app/Button.tsx")).is_empty());
        assert_eq!(graph.dependents_of(&p("/app/Nav.tsx")), vec![p("/app/Home.tsx")]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn empty_dependency_list_removes_file() {
        let mut graph = DependencyGraph::new();
        graph.set(&p("/app/Home.tsx"), &[p("/app/Button.tsx")]);
        graph.set(&p("/app/Home.tsx"), &[]);

        assert!(graph.is_empty());
        assert!(graph.dependents_of(&p("/app/Button.tsx")).is_empty());
    }

    #[test]
    fn self_edges_are_ignored() {
        let mut graph = DependencyGraph::new();
        graph.set(&p("/app/Home.tsx"), &[p("/app/Home.tsx"), p("/app/Button.tsx")]);

        assert_eq!(graph.dependencies_of(&p("/app/Home.tsx")), vec![p("/app/Button.tsx")]);
    }

    #[test]
    fn transitive_dependents_walks_up() {
        let mut graph = DependencyGraph::new();
        graph.set(&p("/app/Page.tsx"), &[p("/app/Card.tsx")]);
        graph.set(&p("/app/Card.tsx"), &[p("/app/Icon.tsx")]);
        graph.set(&p("/app/Other.tsx"), &[p("/app/Unrelated.tsx")]);

        let mut dependents = graph.transitive_dependents(&p("/app/Icon.tsx"));
        dependents.sort();
        assert_eq!(dependents, vec![p("/app/Card.tsx"), p("/app/Page.tsx")]);
    }

    #[test]
    fn transitive_dependents_survives_cycles() {
        let mut graph = DependencyGraph::new();
        graph.set(&p("/a.tsx"), &[p("/b.tsx")]);
        graph.set(&p("/b.tsx"), &[p("/a.tsx")]);

        assert_eq!(graph.transitive_dependents(&p("/a.tsx")), vec![p("/b.tsx")]);
    }
}
