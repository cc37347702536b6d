//! CLI command implementations

use crate::config::Config;
use anyhow::Context;
use globset::{Glob, GlobMatcher};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tether_core::{CACHE_DIR, DependencyGraph, ProjectRoot, build_queue, load_graph, save_graph};
use tether_indexer::{Coordinator, ExportResolver, IndexError};

/// Resolve the `--root` argument into an absolute, existing project root.
pub fn project_root(root: &Path) -> anyhow::Result<ProjectRoot> {
    let absolute = std::path::absolute(root)
        .with_context(|| format!("Cannot resolve root {}", root.display()))?;
    if !absolute.is_dir() {
        anyhow::bail!("Project root is not a directory: {}", absolute.display());
    }
    Ok(ProjectRoot::new(absolute)?)
}

pub async fn index(root: PathBuf, force: bool) -> anyhow::Result<()> {
    let root = project_root(&root)?;
    let graph = index_graph(&root, force).await?;
    println!(
        "Indexed {} files, {} dependency edges",
        graph.file_count(),
        graph.edge_count()
    );
    Ok(())
}

/// Load the cached graph, or rebuild it from symbol exports and save it.
async fn index_graph(root: &ProjectRoot, force: bool) -> anyhow::Result<DependencyGraph> {
    if !force {
        if let Some(graph) = load_graph(root)? {
            tracing::info!("Using cached dependency graph");
            return Ok(graph);
        }
    }

    let config = Config::load(root.path())?;
    let exports = discover_exports(root.path(), &config.export_glob)?;
    if exports.is_empty() {
        tracing::warn!(glob = %config.export_glob, "No symbol exports found under {}", root);
    }
    tracing::info!("Building dependency graph from {} symbol exports", exports.len());

    let coordinator = Coordinator::new(config.coordinator_options());
    let cancellation = coordinator.cancellation();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling build");
            cancellation.cancel();
        }
    });

    let build_root = root.clone();
    let result = tokio::task::spawn_blocking(move || {
        coordinator.build_from_exports(&build_root, &ExportResolver, &exports)
    })
    .await
    .context("Graph build task failed")?;
    interrupt.abort();

    let graph = match result {
        Ok(graph) => graph,
        Err(IndexError::Cancelled) => anyhow::bail!("Index cancelled, cache left unchanged"),
        Err(err) => return Err(err.into()),
    };

    save_graph(&graph, root)?;
    Ok(graph)
}

/// Find symbol export files under `root`, honoring ignore files.
pub fn discover_exports(root: &Path, pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let matcher: GlobMatcher = Glob::new(pattern)
        .with_context(|| format!("Invalid export glob {pattern:?}"))?
        .compile_matcher();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .filter_entry(|entry| entry.file_name() != CACHE_DIR && entry.file_name() != ".git")
        .build();

    let mut exports = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Cannot read entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        if matcher.is_match(relative) {
            tracing::debug!("Found symbol export: {}", entry.path().display());
            exports.push(entry.into_path());
        }
    }
    exports.sort();
    Ok(exports)
}

pub async fn queue(root: PathBuf) -> anyhow::Result<()> {
    let root = project_root(&root)?;
    let graph = index_graph(&root, false).await?;

    for queued in build_queue(&graph, graph.files().cloned()) {
        println!(
            "{:>4}  {}",
            queued.upstream.len(),
            display_relative(&root, queued.file.path())
        );
    }
    Ok(())
}

pub async fn show(root: PathBuf, file: PathBuf) -> anyhow::Result<()> {
    let root = project_root(&root)?;
    let graph = index_graph(&root, false).await?;

    let target = root.path().join(&file);
    let target = tether_core::SourceFile::new(&target)?;
    if !graph.contains(&target) {
        anyhow::bail!("{} is not part of the dependency graph", file.display());
    }

    println!("{}", display_relative(&root, target.path()));
    println!("  upstream:");
    for dependency in graph.upstream(&target) {
        println!("    {}", display_relative(&root, dependency.path()));
    }
    println!("  downstream:");
    for dependent in graph.downstream(&target) {
        println!("    {}", display_relative(&root, dependent.path()));
    }
    Ok(())
}

pub async fn cycles(root: PathBuf) -> anyhow::Result<()> {
    let root = project_root(&root)?;
    let graph = index_graph(&root, false).await?;

    let cycles = graph.cycles();
    if cycles.is_empty() {
        println!("No dependency cycles");
        return Ok(());
    }
    for (i, group) in cycles.iter().enumerate() {
        println!("cycle {} ({} files)", i + 1, group.len());
        for file in group {
            println!("  {}", display_relative(&root, file.path()));
        }
    }
    Ok(())
}

pub fn clear(root: PathBuf) -> anyhow::Result<()> {
    let root = project_root(&root)?;
    tracing::info!("Clearing cache for: {}", root);

    tether_core::clear_cache(&root)?;

    tracing::info!("Cache cleared");
    Ok(())
}

fn display_relative(root: &ProjectRoot, path: &Path) -> String {
    tether_core::SourceFile::new(path)
        .ok()
        .and_then(|file| file.relative_to(root))
        .unwrap_or_else(|| path.display().to_string())
}
