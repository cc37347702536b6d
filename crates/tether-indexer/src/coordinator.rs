//! Orchestrates parallel dependency graph builds
//!
//! Compilation units are analyzed on a rayon pool; their direct dependencies
//! are aggregated single-threaded once every unit is done, then restricted to
//! the project root.

use crate::builder::GraphBuilder;
use crate::error::IndexError;
use crate::resolver::{CompilationUnit, SymbolResolver};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tether_core::{DependencyGraph, DirectDependencies, ProjectRoot, SourceFile};

/// Default extensions of markup files that compile to generated code.
pub const DEFAULT_MARKUP_EXTENSIONS: &[&str] = &["razor", "cshtml"];

/// Build options
#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    /// Additional files with these extensions are candidate markup sources.
    pub markup_extensions: Vec<String>,
    /// Worker threads; `None` uses the global rayon pool.
    pub workers: Option<usize>,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            markup_extensions: DEFAULT_MARKUP_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            workers: None,
        }
    }
}

/// Shared flag for aborting a build in progress.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Coordinator {
    options: CoordinatorOptions,
    cancellation: CancellationFlag,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new(CoordinatorOptions::default())
    }
}

impl Coordinator {
    pub fn new(options: CoordinatorOptions) -> Self {
        Coordinator {
            options,
            cancellation: CancellationFlag::default(),
        }
    }

    /// Handle that cancels builds run by this coordinator.
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    /// Open every export with `resolver` and merge the per-export graphs.
    pub fn build_from_exports<R: SymbolResolver>(
        &self,
        root: &ProjectRoot,
        resolver: &R,
        exports: &[PathBuf],
    ) -> Result<DependencyGraph, IndexError> {
        let mut graph = DependencyGraph::new();
        for export in exports {
            self.check_cancelled()?;
            let units = resolver.open(export)?;
            graph = graph.merge(&self.build_graph(root, &units)?);
        }
        Ok(graph)
    }

    /// Build the dependency graph of a set of compilation units.
    ///
    /// Every edge in the result lies within `root`.
    pub fn build_graph<U: CompilationUnit>(
        &self,
        root: &ProjectRoot,
        units: &[U],
    ) -> Result<DependencyGraph, IndexError> {
        if !root.path().is_dir() {
            return Err(IndexError::RootNotFound(root.path().to_path_buf()));
        }
        self.check_cancelled()?;

        let analyze = || {
            units
                .par_iter()
                .map(|unit| self.analyze_unit(unit))
                .collect::<Result<Vec<_>, _>>()
        };
        let per_unit = match self.options.workers {
            Some(workers) => rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()?
                .install(analyze)?,
            None => analyze()?,
        };

        let graph = DependencyGraph::from_direct_dependencies(per_unit.into_iter().flatten()).filter(root);
        tracing::info!(
            units = units.len(),
            files = graph.file_count(),
            edges = graph.edge_count(),
            "Built dependency graph"
        );
        Ok(graph)
    }

    fn analyze_unit<U: CompilationUnit>(&self, unit: &U) -> Result<Vec<DirectDependencies>, IndexError> {
        self.check_cancelled()?;

        let markup_files = self.markup_files(unit);
        let builder = GraphBuilder::new(unit, &markup_files);
        let dependencies = builder.build_direct_dependencies();

        tracing::debug!(
            unit = unit.name(),
            types = dependencies.len(),
            markup_files = markup_files.len(),
            "Analyzed compilation unit"
        );
        Ok(dependencies)
    }

    /// Existing additional files with a markup extension.
    fn markup_files<U: CompilationUnit>(&self, unit: &U) -> HashSet<SourceFile> {
        unit.additional_files()
            .into_iter()
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        self.options
                            .markup_extensions
                            .iter()
                            .any(|known| known.eq_ignore_ascii_case(ext))
                    })
            })
            .filter_map(|path| SourceFile::new(path).ok())
            .filter(SourceFile::exists)
            .collect()
    }

    fn check_cancelled(&self) -> Result<(), IndexError> {
        if self.cancellation.is_cancelled() {
            return Err(IndexError::Cancelled);
        }
        Ok(())
    }
}
