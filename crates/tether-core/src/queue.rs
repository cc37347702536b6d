//! Analysis queue ordering for per-file context generation

use crate::graph::DependencyGraph;
use crate::model::SourceFile;
use std::collections::BTreeSet;

/// A file waiting for analysis, with its dependency context attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedFile {
    pub file: SourceFile,
    /// Files this one depends on, sorted.
    pub upstream: Vec<SourceFile>,
    /// Files depending on this one, sorted.
    pub downstream: Vec<SourceFile>,
}

/// Order `files` so those with fewer upstream dependencies come first.
///
/// Ties break on path. Files unknown to the graph get empty context and sort
/// with the dependency-free files.
pub fn build_queue<I>(graph: &DependencyGraph, files: I) -> Vec<QueuedFile>
where
    I: IntoIterator<Item = SourceFile>,
{
    let unique: BTreeSet<SourceFile> = files.into_iter().collect();
    let mut queue: Vec<QueuedFile> = unique
        .into_iter()
        .map(|file| QueuedFile {
            upstream: graph.upstream(&file).cloned().collect(),
            downstream: graph.downstream(&file).cloned().collect(),
            file,
        })
        .collect();

    queue.sort_by(|a, b| {
        a.upstream
            .len()
            .cmp(&b.upstream.len())
            .then_with(|| a.file.cmp(&b.file))
    });
    queue
}
