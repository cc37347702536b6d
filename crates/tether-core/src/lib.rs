//! Tether Core — file dependency graph model, aggregation, and persistence

pub mod aggregation;
pub mod error;
pub mod graph;
pub mod model;
pub mod queue;
pub mod store;


#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregation::DirectDependencies;
pub use error::{CoreError, StoreError};
pub use graph::{AdjacencyMap, DependencyGraph, FileSet};
pub use model::{ProjectRoot, SourceFile, normalize_path};
pub use queue::{QueuedFile, build_queue};
pub use store::{
    CACHE_DIR, FORMAT_VERSION, GRAPH_FILE, METADATA_DIR, cache_dir, clear_cache, deserialize,
    graph_cache_path, load_graph, save_graph, serialize,
};
