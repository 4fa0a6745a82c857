//! Lexer for the Rout imperative language.
//!
//! Turns a UTF-8 source string into a stream of tokens with 1-based
//! line/column spans. Statement separators may be written as explicit `;`
//! or as line breaks: the lexer synthesizes a `Semicolon` token whenever a
//! newline is crossed outside brackets after a token that can end a
//! statement.

pub mod lexer;
pub mod token;

pub use lexer::Lexer;
pub use token::{Span, Token, TokenKind};
