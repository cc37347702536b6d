//! Symbol-driven dependency discovery and parallel graph builds

pub mod builder;
pub mod coordinator;
pub mod error;
pub mod export;
pub mod resolver;


pub use builder::{GraphBuilder, TypeWalker};
pub use coordinator::{
    CancellationFlag, Coordinator, CoordinatorOptions, DEFAULT_MARKUP_EXTENSIONS,
};
pub use error::IndexError;
pub use export::{ExportResolver, ExportedFile, ExportedSymbol, ExportedUnit, SymbolExport, TypeDeclaration};
pub use resolver::{
    BodyReference, CompilationUnit, PatternKind, ReferenceVisitor, Symbol, SymbolId, SymbolKind,
    SymbolResolver,
};
