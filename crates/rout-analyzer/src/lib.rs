//! Semantic analysis for the Rout language.
//!
//! Two passes over the parsed program: pass 1 records top-level variables,
//! routine signatures, and type aliases; pass 2 walks bodies checking
//! declarations-before-use, call arity, and return placement. Errors are
//! accumulated; the first is surfaced as the fatal result. The populated
//! [`SymbolContext`] survives analysis so the code generator can resolve
//! user-defined type names and routine signatures.

pub mod analyzer;
pub mod context;

pub use analyzer::{SemanticAnalyzer, SemanticError};
pub use context::{RoutineInfo, SymbolContext, VarInfo};
