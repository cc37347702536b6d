//! Graph persistence: versioned, root-relative, existence-validated

use crate::error::StoreError;
use crate::graph::{AdjacencyMap, DependencyGraph, FileSet};
use crate::model::{ProjectRoot, SourceFile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

/// Cache directory: .tether/
pub const CACHE_DIR: &str = ".tether";

/// Metadata subdirectory holding derived artifacts
pub const METADATA_DIR: &str = "metadata";

/// Graph artifact file
pub const GRAPH_FILE: &str = "graph.json";

/// Current persisted format. Any other value forces a rebuild.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphDocument {
    format_version: u32,
    upstream: BTreeMap<String, Vec<String>>,
    downstream: BTreeMap<String, Vec<String>>,
}

/// Only the version, so an incompatible document is reported as such
/// rather than as a shape mismatch.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionProbe {
    format_version: u32,
}

/// Get cache directory path
pub fn cache_dir(root: &ProjectRoot) -> PathBuf {
    root.path().join(CACHE_DIR)
}

/// Get graph artifact path
pub fn graph_cache_path(root: &ProjectRoot) -> PathBuf {
    cache_dir(root).join(METADATA_DIR).join(GRAPH_FILE)
}

/// Convert a graph to its persisted text form.
///
/// Paths become root-relative with forward slashes; lists are sorted. Every
/// file must lie within `root`; filter the graph first.
pub fn serialize(graph: &DependencyGraph, root: &ProjectRoot) -> Result<String, StoreError> {
    let document = GraphDocument {
        format_version: FORMAT_VERSION,
        upstream: relativize(graph.upstream_map(), root)?,
        downstream: relativize(graph.downstream_map(), root)?,
    };
    Ok(serde_json::to_string(&document)?)
}

/// Rebuild a graph from its persisted text form.
///
/// Fails closed: an unknown version, a path escaping the root, a referenced
/// file missing from disk, or maps that are not transposes reject the whole
/// document.
pub fn deserialize(text: &str, root: &ProjectRoot) -> Result<DependencyGraph, StoreError> {
    if !root.path().is_dir() {
        return Err(StoreError::InvalidRoot(root.path().to_path_buf()));
    }

    let probe: VersionProbe = serde_json::from_str(text)?;
    if probe.format_version != FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion {
            found: probe.format_version,
            expected: FORMAT_VERSION,
        });
    }

    let document: GraphDocument = serde_json::from_str(text)?;
    let upstream = absolutize(&document.upstream, root)?;
    let downstream = absolutize(&document.downstream, root)?;

    let graph = DependencyGraph::from_maps(upstream, downstream);
    if !graph.is_consistent() {
        return Err(StoreError::Inconsistent);
    }
    Ok(graph)
}

/// Persist the graph under `<root>/.tether/metadata/graph.json`.
///
/// Written to a uniquely named temporary sibling first and renamed into
/// place, so readers see either the previous artifact or a complete new one,
/// and concurrent writers never share a temporary file.
pub fn save_graph(graph: &DependencyGraph, root: &ProjectRoot) -> Result<(), StoreError> {
    let text = serialize(graph, root)?;
    let path = graph_cache_path(root);
    let dir = cache_dir(root).join(METADATA_DIR);
    std::fs::create_dir_all(&dir)?;

    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{GRAPH_FILE}."))
        .suffix(".tmp")
        .tempfile_in(&dir)?;
    temp.write_all(text.as_bytes())?;
    temp.persist(&path).map_err(|err| err.error)?;

    tracing::info!(
        path = %path.display(),
        files = graph.file_count(),
        edges = graph.edge_count(),
        "Saved dependency graph"
    );
    Ok(())
}

/// Load a previously saved graph.
///
/// `Ok(None)` means there is no usable cache: either nothing was saved or the
/// artifact no longer matches the project. Read failures are errors.
pub fn load_graph(root: &ProjectRoot) -> Result<Option<DependencyGraph>, StoreError> {
    let path = graph_cache_path(root);
    if !path.exists() {
        return Ok(None);
    }

    let text = std::fs::read_to_string(&path)?;
    match deserialize(&text, root) {
        Ok(graph) => {
            tracing::debug!(path = %path.display(), files = graph.file_count(), "Loaded dependency graph");
            Ok(Some(graph))
        }
        Err(err) if err.is_stale_cache() => {
            tracing::info!(path = %path.display(), reason = %err, "Cached graph is stale, rebuilding");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Clear cache directory
pub fn clear_cache(root: &ProjectRoot) -> std::io::Result<()> {
    let cache = cache_dir(root);
    if cache.exists() {
        std::fs::remove_dir_all(&cache)?;
    }
    Ok(())
}

fn relativize(
    map: &AdjacencyMap,
    root: &ProjectRoot,
) -> Result<BTreeMap<String, Vec<String>>, StoreError> {
    let relative = |file: &SourceFile| {
        file.relative_to(root).ok_or_else(|| StoreError::OutsideRoot {
            file: file.path().to_path_buf(),
            root: root.path().to_path_buf(),
        })
    };

    let mut result = BTreeMap::new();
    for (file, related) in map {
        let mut values = related.iter().map(relative).collect::<Result<Vec<_>, _>>()?;
        values.sort();
        result.insert(relative(file)?, values);
    }
    Ok(result)
}

fn absolutize(
    map: &BTreeMap<String, Vec<String>>,
    root: &ProjectRoot,
) -> Result<AdjacencyMap, StoreError> {
    let resolve = |relative: &str| -> Result<SourceFile, StoreError> {
        let file = root
            .resolve(relative)
            .ok_or_else(|| StoreError::EscapesRoot(relative.to_string()))?;
        if !file.exists() {
            return Err(StoreError::MissingFile(file.path().to_path_buf()));
        }
        Ok(file)
    };

    let mut result = AdjacencyMap::new();
    for (key, values) in map {
        let file = resolve(key)?;
        let related = values
            .iter()
            .map(|value| resolve(value))
            .collect::<Result<FileSet, _>>()?;
        result.entry(file).or_default().extend(related);
    }
    Ok(result)
}
