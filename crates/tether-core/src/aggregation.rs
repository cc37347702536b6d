//! Aggregation of per-declaration dependencies into whole graphs

use crate::graph::{AdjacencyMap, DependencyGraph, FileSet};
use crate::model::{ProjectRoot, SourceFile};

/// Direct dependencies discovered for one type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectDependencies {
    /// File declaring the type.
    pub file: SourceFile,
    /// Fully qualified name of the declared type.
    pub type_name: String,
    /// Files declaring the types it references.
    pub dependencies: FileSet,
}

impl DependencyGraph {
    /// Union direct dependencies by declaring file and derive the downstream transpose.
    pub fn from_direct_dependencies<I>(items: I) -> Self
    where
        I: IntoIterator<Item = DirectDependencies>,
    {
        let mut graph = DependencyGraph::new();
        for item in items {
            graph.add_file(&item.file);
            for dependency in &item.dependencies {
                graph.add_edge(&item.file, dependency);
            }
        }
        graph
    }

    /// Key-wise union of two graphs.
    pub fn merge(&self, other: &DependencyGraph) -> DependencyGraph {
        let mut upstream = self.upstream_map().clone();
        let mut downstream = self.downstream_map().clone();
        union_into(&mut upstream, other.upstream_map());
        union_into(&mut downstream, other.downstream_map());
        DependencyGraph::from_maps(upstream, downstream)
    }

    /// Drop every file and edge target lying outside `root`.
    pub fn filter(&self, root: &ProjectRoot) -> DependencyGraph {
        DependencyGraph::from_maps(
            filter_map(self.upstream_map(), root),
            filter_map(self.downstream_map(), root),
        )
    }
}

fn union_into(target: &mut AdjacencyMap, source: &AdjacencyMap) {
    for (file, related) in source {
        target
            .entry(file.clone())
            .or_default()
            .extend(related.iter().cloned());
    }
}

fn filter_map(map: &AdjacencyMap, root: &ProjectRoot) -> AdjacencyMap {
    map.iter()
        .filter(|(file, _)| file.is_within(root))
        .map(|(file, related)| {
            let kept: FileSet = related
                .iter()
                .filter(|other| other.is_within(root))
                .cloned()
                .collect();
            (file.clone(), kept)
        })
        .collect()
}
