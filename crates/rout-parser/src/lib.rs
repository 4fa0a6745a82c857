//! Recursive-descent parser for the Rout language.
//!
//! Consumes the token stream produced by `rout-lexer` and builds the AST
//! defined in [`ast`]. Single-token lookahead; the first syntax error aborts
//! parsing with a located [`ParseError`].

pub mod ast;
pub mod parser;

pub use ast::*;
pub use parser::{ParseError, Parser};
