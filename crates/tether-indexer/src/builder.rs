//! Per-compilation-unit dependency discovery
//!
//! For each type declared in a source file, collect the files declaring every
//! source type it mentions: base types, interfaces, generic constraints and
//! arguments, member signatures, attributes, and types used in method bodies.

use crate::resolver::{BodyReference, CompilationUnit, Symbol, SymbolId, SymbolKind};
use dashmap::DashMap;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tether_core::{DirectDependencies, FileSet, SourceFile};
use tracing::{debug, trace};

/// Builds direct dependencies for every type declared in one compilation unit.
pub struct GraphBuilder<'a, U: CompilationUnit> {
    unit: &'a U,
    markup_files: &'a HashSet<SourceFile>,
    resolved: DashMap<PathBuf, Option<SourceFile>>,
}

impl<'a, U: CompilationUnit> GraphBuilder<'a, U> {
    /// `markup_files` lists the existing markup sources that generated files
    /// may be mapped back to.
    pub fn new(unit: &'a U, markup_files: &'a HashSet<SourceFile>) -> Self {
        Self {
            unit,
            markup_files,
            resolved: DashMap::new(),
        }
    }

    /// One record per resolvable type declaration, in no particular order.
    pub fn build_direct_dependencies(&self) -> Vec<DirectDependencies> {
        self.unit
            .source_files()
            .par_iter()
            .flat_map_iter(|file| self.analyze_file(file))
            .collect()
    }

    fn analyze_file(&self, file: &Path) -> Vec<DirectDependencies> {
        let declarations = self.unit.type_declarations(file);
        if declarations.is_empty() {
            return Vec::new();
        }

        let Some(subject) = self.resolve_source_file(file) else {
            debug!(file = %file.display(), "No source file on disk for declarations, skipping");
            return Vec::new();
        };

        declarations
            .iter()
            .filter_map(|declaration| self.analyze_declaration(declaration, &subject))
            .collect()
    }

    fn analyze_declaration(
        &self,
        declaration: &U::Declaration,
        subject: &SourceFile,
    ) -> Option<DirectDependencies> {
        let Some(id) = self.unit.declared_symbol(declaration) else {
            debug!(?declaration, file = %subject, "Unresolvable type declaration, skipping");
            return None;
        };
        let Some(symbol) = self.unit.symbol(id) else {
            debug!(symbol = %id, file = %subject, "Declared symbol missing from unit, skipping");
            return None;
        };

        let mut walker = TypeWalker::new(self.unit);
        walker.visit_type(id);

        let dependencies: FileSet = walker
            .into_files()
            .iter()
            .filter_map(|path| self.resolve_source_file(path))
            .filter(|dependency| dependency != subject)
            .collect();

        trace!(type_name = %symbol.name, file = %subject, dependencies = dependencies.len(), "Analyzed type");
        Some(DirectDependencies {
            file: subject.clone(),
            type_name: symbol.name.clone(),
            dependencies,
        })
    }

    /// Map a reported path to the file on disk that should carry its edges.
    ///
    /// Existing files map to themselves. A generated file maps to the first of
    /// its original-file markers that is a known, existing markup file.
    pub fn resolve_source_file(&self, path: &Path) -> Option<SourceFile> {
        self.resolved
            .entry(path.to_path_buf())
            .or_insert_with(|| self.locate(path))
            .value()
            .clone()
    }

    fn locate(&self, path: &Path) -> Option<SourceFile> {
        let file = SourceFile::new(path).ok()?;
        if file.exists() {
            return Some(file);
        }

        self.unit
            .file_markers(path)
            .into_iter()
            .filter_map(|marker| SourceFile::new(marker).ok())
            .find(|marker| self.markup_files.contains(marker) && marker.exists())
    }
}

/// Walks one root type, accumulating declaring files of referenced source types.
///
/// `visited` guards declarations (types, members, methods) and `expanded`
/// guards type references, so recursive and mutually referencing types
/// terminate.
pub struct TypeWalker<'a, U: CompilationUnit + ?Sized> {
    unit: &'a U,
    visited: HashSet<SymbolId>,
    expanded: HashSet<SymbolId>,
    files: BTreeSet<PathBuf>,
}

impl<'a, U: CompilationUnit + ?Sized> TypeWalker<'a, U> {
    pub fn new(unit: &'a U) -> Self {
        Self {
            unit,
            visited: HashSet::new(),
            expanded: HashSet::new(),
            files: BTreeSet::new(),
        }
    }

    /// Declaring files found so far, as reported by the unit.
    pub fn into_files(self) -> BTreeSet<PathBuf> {
        self.files
    }

    pub fn visit_type(&mut self, id: SymbolId) {
        if !self.visited.insert(id) {
            return;
        }
        let unit = self.unit;
        let Some(symbol) = unit.symbol(id) else {
            return;
        };

        if let SymbolKind::Type {
            base,
            interfaces,
            type_parameters,
            type_arguments,
            members,
        } = &symbol.kind
        {
            if let Some(base) = base {
                self.visit_type_reference(*base);
            }
            for &interface in interfaces {
                self.visit_type_reference(interface);
            }
            for &parameter in type_parameters {
                self.visit_constraints(parameter);
            }
            for &argument in type_arguments {
                self.visit_type_reference(argument);
            }
            for &member in members {
                self.visit_member(member);
            }
        }
        self.visit_attributes(symbol);
    }

    fn visit_member(&mut self, id: SymbolId) {
        let unit = self.unit;
        let Some(symbol) = unit.symbol(id) else {
            return;
        };

        match &symbol.kind {
            // Nested types are analyzed in full as part of the containing type.
            SymbolKind::Type { .. } => self.visit_type(id),
            SymbolKind::Method { .. } => self.visit_method(id),
            kind => {
                if !self.visited.insert(id) {
                    return;
                }
                match kind {
                    SymbolKind::Field { ty } | SymbolKind::Event { ty } => {
                        self.visit_type_reference(*ty);
                    }
                    SymbolKind::Property { ty, parameters } => {
                        self.visit_type_reference(*ty);
                        for &parameter in parameters {
                            self.visit_type_reference(parameter);
                        }
                    }
                    _ => {}
                }
                self.visit_attributes(symbol);
            }
        }
    }

    fn visit_method(&mut self, id: SymbolId) {
        if !self.visited.insert(id) {
            return;
        }
        let unit = self.unit;
        let Some(symbol) = unit.symbol(id) else {
            return;
        };

        if let SymbolKind::Method {
            return_type,
            parameters,
            type_parameters,
        } = &symbol.kind
        {
            if let Some(return_type) = return_type {
                self.visit_type_reference(*return_type);
            }
            for &parameter in parameters {
                self.visit_type_reference(parameter);
            }
            for &parameter in type_parameters {
                self.visit_constraints(parameter);
            }

            let mut references = Vec::new();
            unit.walk_body(id, &mut references);
            for reference in references {
                self.visit_body_reference(reference);
            }
        }
        self.visit_attributes(symbol);
    }

    fn visit_body_reference(&mut self, reference: BodyReference) {
        match reference {
            BodyReference::TypeReference { symbol }
            | BodyReference::ObjectCreation { symbol }
            | BodyReference::Cast { symbol }
            | BodyReference::Pattern { symbol, .. } => self.visit_type_reference(symbol),
            BodyReference::LocalFunction { symbol } | BodyReference::Lambda { symbol } => {
                self.visit_method(symbol)
            }
        }
    }

    fn visit_constraints(&mut self, parameter: SymbolId) {
        let unit = self.unit;
        if let Some(Symbol {
            kind: SymbolKind::TypeParameter { constraints },
            ..
        }) = unit.symbol(parameter)
        {
            for &constraint in constraints {
                self.visit_type_reference(constraint);
            }
        }
    }

    fn visit_attributes(&mut self, symbol: &Symbol) {
        for &attribute in &symbol.attributes {
            self.visit_type_reference(attribute);
        }
    }

    /// Record the declaring file of a referenced type and unwrap its shape.
    ///
    /// External types add no file, but their type arguments and elements are
    /// still unwrapped: `List<Order>` depends on `Order`.
    fn visit_type_reference(&mut self, id: SymbolId) {
        if !self.expanded.insert(id) {
            return;
        }
        let unit = self.unit;
        let Some(symbol) = unit.symbol(id) else {
            return;
        };
        self.record(symbol);

        match &symbol.kind {
            SymbolKind::Type { type_arguments, .. } => {
                for &argument in type_arguments {
                    self.visit_type_reference(argument);
                }
            }
            SymbolKind::Array { element } => self.visit_type_reference(*element),
            SymbolKind::Pointer { pointee } => self.visit_type_reference(*pointee),
            SymbolKind::Tuple { elements } => {
                for &element in elements {
                    self.visit_type_reference(element);
                }
            }
            SymbolKind::FunctionPointer {
                return_type,
                parameters,
            } => {
                if let Some(return_type) = return_type {
                    self.visit_type_reference(*return_type);
                }
                for &parameter in parameters {
                    self.visit_type_reference(parameter);
                }
            }
            _ => {}
        }
    }

    /// Constructed generics record the file of their generic definition.
    fn record(&mut self, symbol: &Symbol) {
        let unit = self.unit;
        let definition = symbol
            .original_definition
            .and_then(|id| unit.symbol(id))
            .unwrap_or(symbol);
        if !definition.is_source() {
            return;
        }
        if let Some(file) = &definition.declaring_file {
            self.files.insert(file.clone());
        }
    }
}
