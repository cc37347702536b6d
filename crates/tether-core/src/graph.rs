//! Bidirectional file dependency graph

use crate::model::SourceFile;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeMap, BTreeSet};

/// A set of files, ordered by identity.
pub type FileSet = BTreeSet<SourceFile>;

/// File → set of related files.
pub type AdjacencyMap = BTreeMap<SourceFile, FileSet>;

/// File-level dependency graph with both edge directions materialized.
///
/// `upstream[a]` holds the files whose types `a` depends on; `downstream[b]`
/// holds the files depending on `b`. Graphs produced by this crate keep the
/// two maps exact transposes, never contain self-edges, and give every
/// referenced file an entry in both maps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    upstream: AdjacencyMap,
    downstream: AdjacencyMap,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a graph from raw maps without validation.
    pub(crate) fn from_maps(upstream: AdjacencyMap, downstream: AdjacencyMap) -> Self {
        DependencyGraph {
            upstream,
            downstream,
        }
    }

    /// Register a file with empty entries in both maps.
    pub(crate) fn add_file(&mut self, file: &SourceFile) {
        self.upstream.entry(file.clone()).or_default();
        self.downstream.entry(file.clone()).or_default();
    }

    /// Add an edge: `dependent` depends on `dependency`. Self-edges are ignored.
    pub(crate) fn add_edge(&mut self, dependent: &SourceFile, dependency: &SourceFile) -> bool {
        self.add_file(dependent);
        self.add_file(dependency);
        if dependent == dependency {
            return false;
        }
        if let Some(set) = self.downstream.get_mut(dependency) {
            set.insert(dependent.clone());
        }
        self.upstream
            .get_mut(dependent)
            .is_some_and(|set| set.insert(dependency.clone()))
    }

    /// Files `file` depends on.
    pub fn upstream(&self, file: &SourceFile) -> impl Iterator<Item = &SourceFile> + '_ {
        self.upstream.get(file).into_iter().flat_map(|set| set.iter())
    }

    /// Files depending on `file`.
    pub fn downstream(&self, file: &SourceFile) -> impl Iterator<Item = &SourceFile> + '_ {
        self.downstream.get(file).into_iter().flat_map(|set| set.iter())
    }

    pub fn upstream_count(&self, file: &SourceFile) -> usize {
        self.upstream.get(file).map_or(0, |s| s.len())
    }

    pub fn downstream_count(&self, file: &SourceFile) -> usize {
        self.downstream.get(file).map_or(0, |s| s.len())
    }

    pub fn upstream_map(&self) -> &AdjacencyMap {
        &self.upstream
    }

    pub fn downstream_map(&self) -> &AdjacencyMap {
        &self.downstream
    }

    /// Whether the graph has an entry for `file`.
    pub fn contains(&self, file: &SourceFile) -> bool {
        self.upstream.contains_key(file) || self.downstream.contains_key(file)
    }

    /// All files known to the graph, in identity order.
    pub fn files(&self) -> impl Iterator<Item = &SourceFile> + '_ {
        let all: BTreeSet<&SourceFile> = self
            .upstream
            .keys()
            .chain(self.downstream.keys())
            .collect();
        all.into_iter()
    }

    pub fn file_count(&self) -> usize {
        self.files().count()
    }

    /// Number of distinct dependency edges.
    pub fn edge_count(&self) -> usize {
        self.upstream.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.upstream.is_empty() && self.downstream.is_empty()
    }

    /// Check the structural invariants: exact transpose, no self-edges,
    /// and an entry in both maps for every referenced file.
    pub fn is_consistent(&self) -> bool {
        let entries_match = self.upstream.keys().eq(self.downstream.keys());
        if !entries_match {
            return false;
        }
        let no_self_edges = self
            .upstream
            .iter()
            .chain(self.downstream.iter())
            .all(|(file, set)| !set.contains(file));
        if !no_self_edges {
            return false;
        }
        let forward = self.upstream.iter().all(|(file, deps)| {
            deps.iter().all(|dep| {
                self.downstream
                    .get(dep)
                    .is_some_and(|set| set.contains(file))
            })
        });
        let backward = self.downstream.iter().all(|(file, dependents)| {
            dependents.iter().all(|dependent| {
                self.upstream
                    .get(dependent)
                    .is_some_and(|set| set.contains(file))
            })
        });
        forward && backward
    }

    /// Groups of files that depend on each other in a cycle.
    ///
    /// Each group is sorted and the groups are sorted, so the output is stable.
    pub fn cycles(&self) -> Vec<Vec<SourceFile>> {
        let mut graph: DiGraph<&SourceFile, ()> = DiGraph::new();
        let mut indices: BTreeMap<&SourceFile, NodeIndex> = BTreeMap::new();

        for file in self.upstream.keys() {
            indices.insert(file, graph.add_node(file));
        }
        for (file, deps) in &self.upstream {
            for dep in deps {
                if let (Some(&from), Some(&to)) = (indices.get(file), indices.get(dep)) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        let mut cycles: Vec<Vec<SourceFile>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut files: Vec<SourceFile> =
                    component.into_iter().map(|idx| graph[idx].clone()).collect();
                files.sort();
                files
            })
            .collect();
        cycles.sort();
        cycles
    }
}
