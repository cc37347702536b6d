//! Symbol export resolver
//!
//! Reads the JSON document a compiler frontend writes after type-checking a
//! workspace (`*.symbols.json`). Relative paths inside the document resolve
//! against the directory holding it.

use crate::error::IndexError;
use crate::resolver::{BodyReference, CompilationUnit, ReferenceVisitor, Symbol, SymbolId, SymbolResolver};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tether_core::normalize_path;

/// A whole workspace export: one entry per compilation unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolExport {
    #[serde(default)]
    pub units: Vec<ExportedUnit>,
}

impl SymbolExport {
    /// Parse export text, resolving relative paths against `base`.
    pub fn from_json(text: &str, base: &Path) -> Result<Self, serde_json::Error> {
        let mut export: SymbolExport = serde_json::from_str(text)?;
        for unit in &mut export.units {
            unit.rebase(base);
        }
        Ok(export)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedFile {
    pub path: PathBuf,
    #[serde(default)]
    pub declarations: Vec<TypeDeclaration>,
    /// Original-file markers, for generated files.
    #[serde(default)]
    pub markers: Vec<PathBuf>,
}

/// A type declaration site. `symbol` is absent when the frontend could not bind it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDeclaration {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<SymbolId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedSymbol {
    #[serde(flatten)]
    pub symbol: Symbol,
    /// Body references, for methods, local functions, and lambdas.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<BodyReference>,
}

impl From<Symbol> for ExportedSymbol {
    fn from(symbol: Symbol) -> Self {
        Self { symbol, body: Vec::new() }
    }
}

/// One compilation unit of a [`SymbolExport`].
///
/// Contents are fixed at construction; every way of building a unit,
/// deserialization included, goes through [`ExportedUnit::new`] so the
/// lookup tables always match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawUnit")]
pub struct ExportedUnit {
    name: String,
    files: Vec<ExportedFile>,
    additional_files: Vec<PathBuf>,
    symbols: Vec<ExportedSymbol>,
    #[serde(skip)]
    symbol_index: HashMap<SymbolId, usize>,
    #[serde(skip)]
    file_index: HashMap<PathBuf, usize>,
}

/// Wire shape of [`ExportedUnit`], before lookups are built.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUnit {
    name: String,
    #[serde(default)]
    files: Vec<ExportedFile>,
    #[serde(default)]
    additional_files: Vec<PathBuf>,
    #[serde(default)]
    symbols: Vec<ExportedSymbol>,
}

impl From<RawUnit> for ExportedUnit {
    fn from(raw: RawUnit) -> Self {
        ExportedUnit::new(raw.name, raw.files, raw.additional_files, raw.symbols)
    }
}

impl ExportedUnit {
    pub fn new(
        name: impl Into<String>,
        files: Vec<ExportedFile>,
        additional_files: Vec<PathBuf>,
        symbols: Vec<ExportedSymbol>,
    ) -> Self {
        let mut unit = Self {
            name: name.into(),
            files,
            additional_files,
            symbols,
            ..Default::default()
        };
        unit.reindex();
        unit
    }

    pub fn files(&self) -> &[ExportedFile] {
        &self.files
    }

    pub fn symbols(&self) -> &[ExportedSymbol] {
        &self.symbols
    }

    /// Make every path absolute relative to `base`, then rebuild lookups.
    fn rebase(&mut self, base: &Path) {
        let absolute = |path: &Path| normalize_path(&base.join(path));

        for file in &mut self.files {
            file.path = absolute(&file.path);
            for marker in &mut file.markers {
                *marker = absolute(marker);
            }
        }
        for path in &mut self.additional_files {
            *path = absolute(path);
        }
        for exported in &mut self.symbols {
            if let Some(file) = &exported.symbol.declaring_file {
                exported.symbol.declaring_file = Some(absolute(file));
            }
        }
        self.reindex();
    }

    fn reindex(&mut self) {
        self.symbol_index = self
            .symbols
            .iter()
            .enumerate()
            .map(|(i, exported)| (exported.symbol.id, i))
            .collect();
        self.file_index = self
            .files
            .iter()
            .enumerate()
            .map(|(i, file)| (file.path.clone(), i))
            .collect();
    }

    fn file(&self, path: &Path) -> Option<&ExportedFile> {
        self.file_index.get(path).map(|&i| &self.files[i])
    }

    fn exported(&self, id: SymbolId) -> Option<&ExportedSymbol> {
        self.symbol_index.get(&id).map(|&i| &self.symbols[i])
    }
}

impl CompilationUnit for ExportedUnit {
    type Declaration = TypeDeclaration;

    fn name(&self) -> &str {
        &self.name
    }

    fn source_files(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    fn type_declarations(&self, file: &Path) -> Vec<TypeDeclaration> {
        self.file(file)
            .map(|f| f.declarations.clone())
            .unwrap_or_default()
    }

    fn declared_symbol(&self, declaration: &TypeDeclaration) -> Option<SymbolId> {
        declaration.symbol
    }

    fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.exported(id).map(|e| &e.symbol)
    }

    fn file_markers(&self, file: &Path) -> Vec<PathBuf> {
        self.file(file).map(|f| f.markers.clone()).unwrap_or_default()
    }

    fn additional_files(&self) -> Vec<PathBuf> {
        self.additional_files.clone()
    }

    fn walk_body(&self, method: SymbolId, visitor: &mut dyn ReferenceVisitor) {
        if let Some(exported) = self.exported(method) {
            for reference in &exported.body {
                visitor.visit(*reference);
            }
        }
    }
}

/// Resolver over symbol export files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportResolver;

impl SymbolResolver for ExportResolver {
    type Unit = ExportedUnit;

    fn open(&self, path: &Path) -> Result<Vec<ExportedUnit>, IndexError> {
        let text = std::fs::read_to_string(path).map_err(|source| IndexError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("/"));
        let export = SymbolExport::from_json(&text, base).map_err(|source| IndexError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), units = export.units.len(), "Opened symbol export");
        Ok(export.units)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{PatternKind, SymbolKind};

    const EXPORT: &str = r#"{
        "units": [{
            "name": "App",
            "files": [
                { "path": "src/Order.cs", "declarations": [{ "name": "App.Order", "symbol": 1 }] },
                { "path": "obj/Index.g.cs", "declarations": [{ "symbol": 3 }], "markers": ["Pages/Index.razor"] }
            ],
            "additionalFiles": ["Pages/Index.razor"],
            "symbols": [
                { "id": 1, "name": "App.Order", "declaringFile": "src/Order.cs",
                  "kind": { "type": "type", "members": [2] } },
                { "id": 2, "name": "App.Order.Load", "declaringFile": "src/Order.cs",
                  "kind": { "type": "method", "returnType": 4 },
                  "body": [
                      { "kind": "objectCreation", "symbol": 4 },
                      { "kind": "pattern", "pattern": "declaration", "symbol": 1 }
                  ] },
                { "id": 3, "name": "App.Pages.Index", "declaringFile": "obj/Index.g.cs",
                  "kind": { "type": "type" } },
                { "id": 4, "name": "System.String", "isExternal": true,
                  "kind": { "type": "type" } }
            ]
        }]
    }"#;

    #[test]
    fn test_parse_and_rebase() {
        let export = SymbolExport::from_json(EXPORT, Path::new("/work/app")).unwrap();
        let unit = &export.units[0];

        assert_eq!(unit.name(), "App");
        assert_eq!(
            unit.source_files(),
            vec![
                PathBuf::from("/work/app/src/Order.cs"),
                PathBuf::from("/work/app/obj/Index.g.cs"),
            ]
        );
        assert_eq!(
            unit.file_markers(Path::new("/work/app/obj/Index.g.cs")),
            vec![PathBuf::from("/work/app/Pages/Index.razor")]
        );
        assert_eq!(unit.additional_files(), vec![PathBuf::from("/work/app/Pages/Index.razor")]);
        assert_eq!(
            unit.symbol(SymbolId(1)).unwrap().declaring_file,
            Some(PathBuf::from("/work/app/src/Order.cs"))
        );
        assert!(unit.symbol(SymbolId(4)).unwrap().is_external);
        assert!(unit.symbol(SymbolId(99)).is_none());
    }

    #[test]
    fn test_declarations_and_kinds() {
        let export = SymbolExport::from_json(EXPORT, Path::new("/work/app")).unwrap();
        let unit = &export.units[0];

        let declarations = unit.type_declarations(Path::new("/work/app/src/Order.cs"));
        assert_eq!(declarations.len(), 1);
        assert_eq!(unit.declared_symbol(&declarations[0]), Some(SymbolId(1)));
        assert!(unit.type_declarations(Path::new("/work/app/Missing.cs")).is_empty());

        assert!(matches!(
            unit.symbol(SymbolId(2)).unwrap().kind,
            SymbolKind::Method { return_type: Some(SymbolId(4)), .. }
        ));
    }

    #[test]
    fn test_walk_body() {
        let export = SymbolExport::from_json(EXPORT, Path::new("/work/app")).unwrap();
        let unit = &export.units[0];

        let mut references = Vec::new();
        unit.walk_body(SymbolId(2), &mut references);
        assert_eq!(
            references,
            vec![
                BodyReference::ObjectCreation { symbol: SymbolId(4) },
                BodyReference::Pattern { pattern: PatternKind::Declaration, symbol: SymbolId(1) },
            ]
        );

        let mut none = Vec::new();
        unit.walk_body(SymbolId(1), &mut none);
        assert!(none.is_empty());
    }

    #[test]
    fn test_plain_serde_builds_lookups() {
        let export: SymbolExport = serde_json::from_str(EXPORT).unwrap();
        let unit = &export.units[0];

        let declarations = unit.type_declarations(Path::new("src/Order.cs"));
        assert_eq!(declarations.len(), 1);
        assert_eq!(unit.declared_symbol(&declarations[0]), Some(SymbolId(1)));
        assert_eq!(unit.symbol(SymbolId(3)).unwrap().name, "App.Pages.Index");
        assert_eq!(
            unit.file_markers(Path::new("obj/Index.g.cs")),
            vec![PathBuf::from("Pages/Index.razor")]
        );
    }

    #[test]
    fn test_serialized_unit_reloads() {
        let export = SymbolExport::from_json(EXPORT, Path::new("/work/app")).unwrap();
        let text = serde_json::to_string(&export.units[0]).unwrap();

        let reloaded: ExportedUnit = serde_json::from_str(&text).unwrap();
        assert_eq!(reloaded.files().len(), 2);
        assert_eq!(reloaded.symbols(), export.units[0].symbols());
        assert!(reloaded.symbol(SymbolId(2)).is_some());
        assert_eq!(
            reloaded.type_declarations(Path::new("/work/app/obj/Index.g.cs")).len(),
            1
        );
    }

    #[test]
    fn test_open_missing_file() {
        let err = ExportResolver.open(Path::new("/no/such/app.symbols.json")).unwrap_err();
        assert!(matches!(err, IndexError::Read { .. }));
    }

    #[test]
    fn test_open_invalid_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("broken.symbols.json");
        std::fs::write(&path, r#"{ "units": [ { "files": 3 } ] }"#).unwrap();

        let err = ExportResolver.open(&path).unwrap_err();
        assert!(matches!(err, IndexError::Parse { .. }));
    }
}
