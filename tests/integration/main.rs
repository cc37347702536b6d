//! Integration tests for Tether
//!
//! These tests run symbol exports through the indexer, the store, and the CLI.

use std::path::Path;
use std::process::Command;
use tether_core::test_utils::{create_repo_with_structure, project_file, project_root};
use tether_core::{build_queue, graph_cache_path, load_graph, save_graph};
use tether_indexer::{Coordinator, ExportResolver, SymbolResolver};

const EXPORT: &str = r#"{
  "units": [{
    "name": "Shop",
    "files": [
      { "path": "src/Entity.cs", "declarations": [{ "symbol": 1 }] },
      { "path": "src/Order.cs", "declarations": [{ "symbol": 2 }] },
      { "path": "src/Customer.cs", "declarations": [{ "symbol": 3 }] },
      { "path": "obj/Cart.razor.g.cs", "declarations": [{ "symbol": 4 }],
        "markers": ["Pages/Cart.razor"] }
    ],
    "additionalFiles": ["Pages/Cart.razor"],
    "symbols": [
      { "id": 1, "name": "Shop.Entity", "declaringFile": "src/Entity.cs",
        "kind": { "type": "type" } },
      { "id": 2, "name": "Shop.Order", "declaringFile": "src/Order.cs",
        "kind": { "type": "type", "base": 1, "members": [5] } },
      { "id": 3, "name": "Shop.Customer", "declaringFile": "src/Customer.cs",
        "kind": { "type": "type", "base": 1, "members": [6] } },
      { "id": 4, "name": "Shop.Pages.Cart", "declaringFile": "obj/Cart.razor.g.cs",
        "kind": { "type": "type", "members": [7] } },
      { "id": 5, "name": "Shop.Order.Buyer", "declaringFile": "src/Order.cs",
        "kind": { "type": "property", "ty": 3 } },
      { "id": 6, "name": "Shop.Customer.LastOrder", "declaringFile": "src/Customer.cs",
        "kind": { "type": "field", "ty": 2 } },
      { "id": 7, "name": "Shop.Pages.Cart.Render", "declaringFile": "obj/Cart.razor.g.cs",
        "kind": { "type": "method", "returnType": 8 },
        "body": [{ "kind": "objectCreation", "symbol": 2 }] },
      { "id": 8, "name": "System.String", "isExternal": true,
        "kind": { "type": "type" } }
    ]
  }]
}"#;

fn sample_project() -> tempfile::TempDir {
    create_repo_with_structure(&[
        ("src/Entity.cs", ""),
        ("src/Order.cs", ""),
        ("src/Customer.cs", ""),
        ("Pages/Cart.razor", ""),
        ("shop.symbols.json", EXPORT),
    ])
}

fn run_cli(root: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_tether"))
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
        .expect("Failed to execute tether")
}

#[test]
fn test_export_to_cached_graph() {
    let dir = sample_project();
    let root = project_root(&dir);
    let file = |rel: &str| project_file(&dir, rel);

    let units = ExportResolver.open(&dir.path().join("shop.symbols.json")).unwrap();
    let graph = Coordinator::default().build_graph(&root, &units).unwrap();

    assert_eq!(
        graph.upstream(&file("src/Order.cs")).cloned().collect::<Vec<_>>(),
        vec![file("src/Customer.cs"), file("src/Entity.cs")]
    );
    assert_eq!(
        graph.upstream(&file("Pages/Cart.razor")).cloned().collect::<Vec<_>>(),
        vec![file("src/Order.cs")]
    );
    assert_eq!(graph.cycles(), vec![vec![file("src/Customer.cs"), file("src/Order.cs")]]);

    save_graph(&graph, &root).unwrap();
    let loaded = load_graph(&root).unwrap().unwrap();
    assert_eq!(loaded, graph);

    let queue = build_queue(&loaded, loaded.files().cloned());
    let order: Vec<_> = queue.iter().map(|q| q.file.relative_to(&root).unwrap()).collect();
    assert_eq!(
        order,
        vec!["src/Entity.cs", "Pages/Cart.razor", "src/Customer.cs", "src/Order.cs"]
    );
}

#[test]
fn test_deleted_file_invalidates_cache() {
    let dir = sample_project();
    let root = project_root(&dir);

    let units = ExportResolver.open(&dir.path().join("shop.symbols.json")).unwrap();
    let graph = Coordinator::default().build_graph(&root, &units).unwrap();
    save_graph(&graph, &root).unwrap();

    std::fs::remove_file(dir.path().join("Pages/Cart.razor")).unwrap();
    assert!(load_graph(&root).unwrap().is_none());
}

#[test]
fn test_cli_index_and_show() {
    let dir = sample_project();

    let output = run_cli(dir.path(), &["index"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Indexed 4 files"));
    assert!(graph_cache_path(&project_root(&dir)).exists());

    let output = run_cli(dir.path(), &["show", "src/Order.cs"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("upstream:"));
    assert!(stdout.contains("src/Customer.cs"));
    assert!(stdout.contains("Pages/Cart.razor"));

    let output = run_cli(dir.path(), &["clear"]);
    assert!(output.status.success());
    assert!(!dir.path().join(".tether").exists());
}

#[test]
fn test_cli_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_tether"))
        .arg("version")
        .output()
        .expect("Failed to execute tether");

    assert!(String::from_utf8_lossy(&output.stdout).contains("Tether v"));
}
