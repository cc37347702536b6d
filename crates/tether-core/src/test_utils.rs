//! Test utilities for Tether

use std::fs;
use tempfile::TempDir;

use crate::model::{ProjectRoot, SourceFile};

/// Create a temporary project containing empty files at the given relative paths.
pub fn create_project(files: &[&str]) -> TempDir {
    let structure: Vec<(&str, &str)> = files.iter().map(|path| (*path, "")).collect();
    create_repo_with_structure(&structure)
}

/// Create a repository with a specific file structure
pub fn create_repo_with_structure(structure: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for (path, content) in structure {
        let full_path = root.join(path);

        // Create parent directories if needed
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }

        fs::write(&full_path, content).unwrap();
    }

    temp_dir
}

/// Project root handle for a temporary directory.
pub fn project_root(dir: &TempDir) -> ProjectRoot {
    ProjectRoot::new(dir.path()).unwrap()
}

/// File handle for a path relative to a temporary directory.
pub fn project_file(dir: &TempDir, relative: &str) -> SourceFile {
    SourceFile::new(dir.path().join(relative)).unwrap()
}
