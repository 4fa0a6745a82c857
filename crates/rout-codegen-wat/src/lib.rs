//! WebAssembly text-format (WAT) code generation for the Rout language.
//!
//! Takes the checked (and usually optimized) AST plus the analyzer's
//! [`SymbolContext`](rout_analyzer::SymbolContext) and produces one
//! self-contained WAT module string. Aggregates (arrays, records) live in
//! linear memory behind a bump allocator; strings are deduplicated into the
//! data section at offset 0.

pub mod codegen;

pub use codegen::{CodegenError, WatCodegen};
