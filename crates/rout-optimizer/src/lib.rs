//! AST-to-AST optimizer for the Rout language.
//!
//! One bottom-up pass over the checked tree: constant folding on closed
//! literal operands, if-simplification on literal conditions, and dead-code
//! removal after `return`. The input tree is consumed; unchanged subtrees
//! are moved into the result unmodified.

pub mod optimizer;

pub use optimizer::Optimizer;
