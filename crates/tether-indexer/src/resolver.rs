//! Symbol resolver seam
//!
//! The dependency builder never parses source text. A compiler frontend that
//! has already type-checked a compilation unit answers the questions below,
//! and the builder walks the answers.

use crate::error::IndexError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Stable, resolver-issued identity of a symbol within one compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(pub u64);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A resolved program entity: a type, a type shape, or a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub id: SymbolId,
    /// Fully qualified display name.
    pub name: String,
    /// First source location, if the symbol is declared in analyzed source.
    #[serde(default)]
    pub declaring_file: Option<PathBuf>,
    /// Declared in a pre-built dependency rather than the analyzed source.
    #[serde(default)]
    pub is_external: bool,
    /// Generic definition this symbol was constructed from (`Repo<Order>` → `Repo<T>`).
    #[serde(default)]
    pub original_definition: Option<SymbolId>,
    /// Attribute classes applied to the symbol.
    #[serde(default)]
    pub attributes: Vec<SymbolId>,
    pub kind: SymbolKind,
}

impl Symbol {
    /// Whether a reference to this symbol can produce a file edge.
    pub fn is_source(&self) -> bool {
        !self.is_external && self.declaring_file.is_some()
    }
}

/// Shape of a symbol, as far as dependency discovery cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SymbolKind {
    /// Named type: class, struct, interface, record, enum, delegate.
    Type {
        #[serde(default)]
        base: Option<SymbolId>,
        #[serde(default)]
        interfaces: Vec<SymbolId>,
        #[serde(default)]
        type_parameters: Vec<SymbolId>,
        /// Type arguments of a constructed generic.
        #[serde(default)]
        type_arguments: Vec<SymbolId>,
        #[serde(default)]
        members: Vec<SymbolId>,
    },
    TypeParameter {
        #[serde(default)]
        constraints: Vec<SymbolId>,
    },
    Array {
        element: SymbolId,
    },
    Pointer {
        pointee: SymbolId,
    },
    Tuple {
        elements: Vec<SymbolId>,
    },
    FunctionPointer {
        #[serde(default)]
        return_type: Option<SymbolId>,
        #[serde(default)]
        parameters: Vec<SymbolId>,
    },
    Field {
        ty: SymbolId,
    },
    /// Property or indexer; `parameters` are the indexer parameter types.
    Property {
        ty: SymbolId,
        #[serde(default)]
        parameters: Vec<SymbolId>,
    },
    Event {
        ty: SymbolId,
    },
    /// Method, constructor, accessor, local function, or lambda.
    Method {
        #[serde(default)]
        return_type: Option<SymbolId>,
        #[serde(default)]
        parameters: Vec<SymbolId>,
        #[serde(default)]
        type_parameters: Vec<SymbolId>,
    },
}

/// Pattern construct a type was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKind {
    Type,
    Declaration,
    Recursive,
    Constant,
    Binary,
    Switch,
}

/// A type-bearing occurrence inside a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BodyReference {
    /// Explicitly written type name.
    TypeReference { symbol: SymbolId },
    ObjectCreation { symbol: SymbolId },
    /// Cast target type.
    Cast { symbol: SymbolId },
    Pattern { pattern: PatternKind, symbol: SymbolId },
    /// Local function declared in the body; analyzed as a method.
    LocalFunction { symbol: SymbolId },
    /// Lambda or anonymous method; analyzed as a method.
    Lambda { symbol: SymbolId },
}

/// Receives body references during a body walk.
pub trait ReferenceVisitor {
    fn visit(&mut self, reference: BodyReference);
}

impl ReferenceVisitor for Vec<BodyReference> {
    fn visit(&mut self, reference: BodyReference) {
        self.push(reference);
    }
}

/// One fully type-checked compilation unit.
pub trait CompilationUnit: Send + Sync {
    /// Handle for a type declaration site.
    type Declaration: fmt::Debug;

    fn name(&self) -> &str;

    /// Source files as reported by the frontend. Generated files may not exist on disk.
    fn source_files(&self) -> Vec<PathBuf>;

    fn type_declarations(&self, file: &Path) -> Vec<Self::Declaration>;

    fn declared_symbol(&self, declaration: &Self::Declaration) -> Option<SymbolId>;

    fn symbol(&self, id: SymbolId) -> Option<&Symbol>;

    /// "Original file" markers from the leading metadata of a generated file.
    fn file_markers(&self, file: &Path) -> Vec<PathBuf>;

    /// Non-compiled project files, the candidates for markup-backed sources.
    fn additional_files(&self) -> Vec<PathBuf>;

    /// Report every type-bearing occurrence in the body of `method`.
    fn walk_body(&self, method: SymbolId, visitor: &mut dyn ReferenceVisitor);
}

/// Opens compilation units from a frontend artifact.
pub trait SymbolResolver {
    type Unit: CompilationUnit;

    fn open(&self, path: &Path) -> Result<Vec<Self::Unit>, IndexError>;
}
