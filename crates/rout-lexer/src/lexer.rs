use crate::token::{Token, TokenKind};

/// Lexer for Rout source code.
///
/// `next_token` hands out one token at a time and keeps returning `Eof`
/// after the input is exhausted. Lexing never fails: an unknown character
/// becomes an `Error` token that the parser rejects later.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,

    // Bracket depths for automatic semicolon insertion
    paren_depth: usize,
    bracket_depth: usize,
    brace_depth: usize,
    last_emitted: Option<TokenKind>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            paren_depth: 0,
            bracket_depth: 0,
            brace_depth: 0,
            last_emitted: None,
        }
    }

    /// Tokenize the whole input, collecting through the first `Eof`.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    // ── Cursor helpers ───────────────────────────────────────

    fn peek(&self) -> char {
        self.source.get(self.pos).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source.get(self.pos + 1).copied().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        if c == '\0' {
            return c;
        }
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() != expected {
            return false;
        }
        self.advance();
        true
    }

    fn skip_spaces_and_comments(&mut self) {
        loop {
            let mut consumed = false;

            while self.peek() != '\n' && self.peek() != '\0' && self.peek().is_whitespace() {
                self.advance();
                consumed = true;
            }

            // Line comment: -- to end of line
            if self.peek() == '-' && self.peek_next() == '-' {
                self.advance();
                self.advance();
                while self.peek() != '\n' && self.peek() != '\0' {
                    self.advance();
                }
                consumed = true;
            }

            if !consumed {
                break;
            }
        }
    }

    /// Tokens after which a crossed newline acts as a statement separator.
    fn last_token_allows_semicolon(&self) -> bool {
        matches!(
            self.last_emitted,
            Some(
                TokenKind::Identifier
                    | TokenKind::IntLiteral
                    | TokenKind::RealLiteral
                    | TokenKind::BoolLiteral
                    | TokenKind::StringLiteral
                    | TokenKind::RParen
                    | TokenKind::RBracket
                    | TokenKind::RBrace
                    | TokenKind::End
                    | TokenKind::Integer
                    | TokenKind::Real
                    | TokenKind::Boolean
                    | TokenKind::String
            )
        )
    }

    fn emit(&mut self, kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) -> Token {
        self.last_emitted = Some(kind);
        Token::new(kind, lexeme, line, column)
    }

    // ── Scanning ─────────────────────────────────────────────

    /// Return the next token and advance past it.
    pub fn next_token(&mut self) -> Token {
        let mut saw_newline = false;
        loop {
            if self.peek() == '\n' {
                self.advance();
                saw_newline = true;
            } else {
                let before = self.pos;
                self.skip_spaces_and_comments();
                if self.pos == before {
                    break;
                }
            }
        }

        // Automatic semicolon insertion: only at bracket depth zero and
        // only after a token that can end a statement.
        if saw_newline
            && self.paren_depth == 0
            && self.bracket_depth == 0
            && self.brace_depth == 0
            && self.last_token_allows_semicolon()
        {
            return self.emit(TokenKind::Semicolon, ";", self.line, self.column);
        }

        let line = self.line;
        let start_col = self.column;
        let c = self.advance();

        if c == '\0' {
            return self.emit(TokenKind::Eof, "", line, start_col);
        }

        // Identifier / keyword / bool literal
        if c.is_alphabetic() || c == '_' {
            let mut lexeme = String::new();
            lexeme.push(c);
            while self.peek().is_alphanumeric() || self.peek() == '_' {
                lexeme.push(self.advance());
            }

            let low = lexeme.to_lowercase();
            if low == "true" || low == "false" {
                return self.emit(TokenKind::BoolLiteral, lexeme, line, start_col);
            }
            let kind = keyword_kind(&low).unwrap_or(TokenKind::Identifier);
            return self.emit(kind, lexeme, line, start_col);
        }

        // Number: INT or REAL. A REAL needs '.' followed by a digit, so
        // '1..10' lexes as INT RANGE INT.
        if c.is_ascii_digit() {
            let mut lexeme = String::new();
            lexeme.push(c);
            let mut is_real = false;

            while self.peek().is_ascii_digit() {
                lexeme.push(self.advance());
            }

            if self.peek() == '.' && self.peek_next().is_ascii_digit() {
                is_real = true;
                lexeme.push(self.advance()); // '.'
                while self.peek().is_ascii_digit() {
                    lexeme.push(self.advance());
                }
            }

            let kind = if is_real {
                TokenKind::RealLiteral
            } else {
                TokenKind::IntLiteral
            };
            return self.emit(kind, lexeme, line, start_col);
        }

        // String literal: verbatim to the closing quote or EOF, no escapes
        if c == '"' {
            let mut lexeme = String::new();
            while self.peek() != '"' && self.peek() != '\0' {
                lexeme.push(self.advance());
            }
            if self.peek() == '"' {
                self.advance();
            }
            return self.emit(TokenKind::StringLiteral, lexeme, line, start_col);
        }

        // Operators and delimiters
        match c {
            '+' => self.emit(TokenKind::Plus, "+", line, start_col),
            '-' => self.emit(TokenKind::Minus, "-", line, start_col),
            '*' => self.emit(TokenKind::Multiply, "*", line, start_col),
            '/' => {
                if self.match_char('=') {
                    self.emit(TokenKind::NotEquals, "/=", line, start_col)
                } else {
                    self.emit(TokenKind::Divide, "/", line, start_col)
                }
            }
            '%' => self.emit(TokenKind::Modulo, "%", line, start_col),
            '=' => {
                if self.match_char('>') {
                    self.emit(TokenKind::FatArrow, "=>", line, start_col)
                } else {
                    self.emit(TokenKind::Equals, "=", line, start_col)
                }
            }
            '<' => {
                if self.match_char('=') {
                    self.emit(TokenKind::LessEqual, "<=", line, start_col)
                } else {
                    self.emit(TokenKind::Less, "<", line, start_col)
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.emit(TokenKind::GreaterEqual, ">=", line, start_col)
                } else {
                    self.emit(TokenKind::Greater, ">", line, start_col)
                }
            }
            ':' => {
                if self.match_char('=') {
                    self.emit(TokenKind::Assign, ":=", line, start_col)
                } else {
                    self.emit(TokenKind::Colon, ":", line, start_col)
                }
            }
            ';' => self.emit(TokenKind::Semicolon, ";", line, start_col),
            ',' => self.emit(TokenKind::Comma, ",", line, start_col),
            '.' => {
                if self.match_char('.') {
                    self.emit(TokenKind::Range, "..", line, start_col)
                } else {
                    self.emit(TokenKind::Dot, ".", line, start_col)
                }
            }
            '(' => {
                self.paren_depth += 1;
                self.emit(TokenKind::LParen, "(", line, start_col)
            }
            ')' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                self.emit(TokenKind::RParen, ")", line, start_col)
            }
            '[' => {
                self.bracket_depth += 1;
                self.emit(TokenKind::LBracket, "[", line, start_col)
            }
            ']' => {
                self.bracket_depth = self.bracket_depth.saturating_sub(1);
                self.emit(TokenKind::RBracket, "]", line, start_col)
            }
            '{' => {
                self.brace_depth += 1;
                self.emit(TokenKind::LBrace, "{", line, start_col)
            }
            '}' => {
                self.brace_depth = self.brace_depth.saturating_sub(1);
                self.emit(TokenKind::RBrace, "}", line, start_col)
            }
            _ => self.emit(TokenKind::Error, c.to_string(), line, start_col),
        }
    }
}

fn keyword_kind(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "routine" => TokenKind::Routine,
        "is" => TokenKind::Is,
        "end" => TokenKind::End,
        "var" => TokenKind::Var,
        "type" => TokenKind::Type,
        "integer" => TokenKind::Integer,
        "real" => TokenKind::Real,
        "boolean" => TokenKind::Boolean,
        "string" => TokenKind::String,
        "array" => TokenKind::Array,
        "record" => TokenKind::Record,
        "if" => TokenKind::If,
        "then" => TokenKind::Then,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "loop" => TokenKind::Loop,
        "for" => TokenKind::For,
        "in" => TokenKind::In,
        "reverse" => TokenKind::Reverse,
        "print" => TokenKind::Print,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "xor" => TokenKind::Xor,
        "not" => TokenKind::Not,
        "return" => TokenKind::Return,
        "ref" => TokenKind::Ref,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests;
