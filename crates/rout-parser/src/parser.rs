use rout_lexer::{Span, Token, TokenKind};

use crate::ast::*;

mod decls;
mod exprs;
mod stmts;
mod types;
#[cfg(test)]
mod tests;

/// Recursive-descent parser for the Rout language
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse the whole token stream into a Program.
    ///
    /// Top level: declarations until EOF, skipping stray semicolons.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let span = self.current_span();
        let mut declarations = Vec::new();

        while self.current_kind() != TokenKind::Eof {
            if self.current_kind() == TokenKind::Semicolon {
                self.advance();
                continue;
            }
            declarations.push(self.declaration()?);
        }

        Ok(Program { declarations, span })
    }

    // ── Token navigation ─────────────────────────────────────

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it has the given kind.
    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.current_kind() == kind {
            self.advance();
            return true;
        }
        false
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, ParseError> {
        let token = self.current().clone();
        if token.kind != expected {
            return Err(self.error_at(
                token.span,
                format!(
                    "expected {:?}, found {:?} '{}'",
                    expected, token.kind, token.lexeme
                ),
            ));
        }
        Ok(self.advance())
    }

    /// Statement terminator: an explicit or inserted ';'. A closing 'end',
    /// 'else', or EOF also terminates the statement without being consumed,
    /// so `... print x end` parses on a single line.
    fn expect_terminator(&mut self) -> Result<(), ParseError> {
        if self.matches(TokenKind::Semicolon) {
            return Ok(());
        }
        match self.current_kind() {
            TokenKind::End | TokenKind::Else | TokenKind::Eof => Ok(()),
            _ => {
                let token = self.current().clone();
                Err(self.error_at(
                    token.span,
                    format!("expected ';', found {:?} '{}'", token.kind, token.lexeme),
                ))
            }
        }
    }

    fn error_at(&self, span: Span, message: String) -> ParseError {
        ParseError::Error {
            line: span.line,
            column: span.column,
            message,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Parse error at line {line}, column {column}: {message}")]
    Error {
        line: usize,
        column: usize,
        message: String,
    },
}
