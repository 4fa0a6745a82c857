use super::*;
use crate::token::TokenKind;

fn lex(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}

fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|t| t.kind).collect()
}

#[test]
fn empty_source() {
    let tokens = lex("");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);
}

#[test]
fn integer_literal() {
    let tokens = lex("42");
    assert_eq!(kinds(&tokens), vec![TokenKind::IntLiteral, TokenKind::Eof]);
    assert_eq!(tokens[0].lexeme, "42");
}

#[test]
fn real_literal() {
    let tokens = lex("3.14");
    assert_eq!(kinds(&tokens), vec![TokenKind::RealLiteral, TokenKind::Eof]);
    assert_eq!(tokens[0].lexeme, "3.14");
}

#[test]
fn range_is_not_a_real() {
    // '1..10' must lex as INT RANGE INT, not REAL DOT INT
    let tokens = lex("1..10");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::IntLiteral,
            TokenKind::Range,
            TokenKind::IntLiteral,
            TokenKind::Eof,
        ]
    );
    assert_eq!(tokens[0].lexeme, "1");
    assert_eq!(tokens[2].lexeme, "10");
}

#[test]
fn string_literal() {
    let tokens = lex("\"hello\"");
    assert_eq!(kinds(&tokens), vec![TokenKind::StringLiteral, TokenKind::Eof]);
    assert_eq!(tokens[0].lexeme, "hello");
}

#[test]
fn unterminated_string_runs_to_eof() {
    let tokens = lex("\"hello");
    assert_eq!(kinds(&tokens), vec![TokenKind::StringLiteral, TokenKind::Eof]);
    assert_eq!(tokens[0].lexeme, "hello");
}

#[test]
fn bool_literals() {
    let tokens = lex("true false TRUE False");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::BoolLiteral,
            TokenKind::BoolLiteral,
            TokenKind::BoolLiteral,
            TokenKind::BoolLiteral,
            TokenKind::Eof,
        ]
    );
    assert_eq!(tokens[2].lexeme, "TRUE");
}

#[test]
fn keywords() {
    let tokens = lex("routine is end var type if then else while loop for in reverse print return ref");
    let expected = vec![
        TokenKind::Routine,
        TokenKind::Is,
        TokenKind::End,
        TokenKind::Var,
        TokenKind::Type,
        TokenKind::If,
        TokenKind::Then,
        TokenKind::Else,
        TokenKind::While,
        TokenKind::Loop,
        TokenKind::For,
        TokenKind::In,
        TokenKind::Reverse,
        TokenKind::Print,
        TokenKind::Return,
        TokenKind::Ref,
        TokenKind::Eof,
    ];
    assert_eq!(kinds(&tokens), expected);
}

#[test]
fn logical_keywords() {
    // xor is reserved by the lexer even though the grammar never uses it
    let tokens = lex("and or xor not");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Xor,
            TokenKind::Not,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn keywords_are_case_insensitive() {
    let tokens = lex("ROUTINE Is End");
    assert_eq!(
        kinds(&tokens),
        vec![TokenKind::Routine, TokenKind::Is, TokenKind::End, TokenKind::Eof]
    );
    // original spelling survives in the lexeme
    assert_eq!(tokens[0].lexeme, "ROUTINE");
}

#[test]
fn type_keywords_and_identifiers() {
    let tokens = lex("integer real boolean string array record foo _bar x123");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::Integer,
            TokenKind::Real,
            TokenKind::Boolean,
            TokenKind::String,
            TokenKind::Array,
            TokenKind::Record,
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn identifier_starting_with_keyword_prefix() {
    // "format" starts with "for" but is a whole identifier
    let tokens = lex("format");
    assert_eq!(kinds(&tokens), vec![TokenKind::Identifier, TokenKind::Eof]);
    assert_eq!(tokens[0].lexeme, "format");
}

#[test]
fn single_char_operators() {
    let tokens = lex("+ - * / % = < > : , .");
    let expected = vec![
        TokenKind::Plus,
        TokenKind::Minus,
        TokenKind::Multiply,
        TokenKind::Divide,
        TokenKind::Modulo,
        TokenKind::Equals,
        TokenKind::Less,
        TokenKind::Greater,
        TokenKind::Colon,
        TokenKind::Comma,
        TokenKind::Dot,
        TokenKind::Eof,
    ];
    assert_eq!(kinds(&tokens), expected);
}

#[test]
fn multi_char_operators() {
    let tokens = lex(":= <= >= /= .. =>");
    let expected = vec![
        TokenKind::Assign,
        TokenKind::LessEqual,
        TokenKind::GreaterEqual,
        TokenKind::NotEquals,
        TokenKind::Range,
        TokenKind::FatArrow,
        TokenKind::Eof,
    ];
    assert_eq!(kinds(&tokens), expected);
}

#[test]
fn assign_vs_colon() {
    let tokens = lex("x : integer := 5");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Integer,
            TokenKind::Assign,
            TokenKind::IntLiteral,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn delimiters() {
    let tokens = lex("( ) [ ] { }");
    let expected = vec![
        TokenKind::LParen,
        TokenKind::RParen,
        TokenKind::LBracket,
        TokenKind::RBracket,
        TokenKind::LBrace,
        TokenKind::RBrace,
        TokenKind::Eof,
    ];
    assert_eq!(kinds(&tokens), expected);
}

#[test]
fn line_comment() {
    let tokens = lex("1 -- this is a comment\n2");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::IntLiteral,
            TokenKind::Semicolon, // inserted at the newline after '1'
            TokenKind::IntLiteral,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn comment_only_line_does_not_separate() {
    // newline after 'var' (a non-terminating token) inserts nothing
    let tokens = lex("var\n-- note\nx");
    assert_eq!(
        kinds(&tokens),
        vec![TokenKind::Var, TokenKind::Identifier, TokenKind::Eof]
    );
}

#[test]
fn unknown_character_becomes_error_token() {
    let tokens = lex("@");
    assert_eq!(kinds(&tokens), vec![TokenKind::Error, TokenKind::Eof]);
    assert_eq!(tokens[0].lexeme, "@");
}

#[test]
fn line_and_column_tracking() {
    let tokens = lex("ab + c");
    assert_eq!(tokens[0].span.column, 1);
    assert_eq!(tokens[1].span.column, 4);
    assert_eq!(tokens[2].span.column, 6);

    let tokens = lex("a\nb");
    assert_eq!(tokens[0].span.line, 1);
    // tokens[1] is the inserted semicolon
    assert_eq!(tokens[2].span.line, 2);
    assert_eq!(tokens[2].span.column, 1);
}

#[test]
fn eof_repeats() {
    let mut lexer = Lexer::new("x");
    assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    assert_eq!(lexer.next_token().kind, TokenKind::Eof);
}

// ── Automatic semicolon insertion ────────────────────────────

#[test]
fn asi_after_identifier() {
    let tokens = lex("x\ny");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn asi_after_literal_and_end() {
    let tokens = lex("5\nend\nx");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::IntLiteral,
            TokenKind::Semicolon,
            TokenKind::End,
            TokenKind::Semicolon,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn asi_after_type_keyword() {
    let tokens = lex("var x : integer\nvar y : integer");
    let ks = kinds(&tokens);
    // the newline after 'integer' separates the two declarations
    assert_eq!(ks[4], TokenKind::Semicolon);
}

#[test]
fn no_asi_after_operator() {
    let tokens = lex("1 +\n2");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::IntLiteral,
            TokenKind::Plus,
            TokenKind::IntLiteral,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn no_asi_inside_parens() {
    let tokens = lex("f(1,\n2)");
    assert!(!kinds(&tokens).contains(&TokenKind::Semicolon));
}

#[test]
fn no_asi_inside_brackets() {
    let tokens = lex("[1,\n2,\n3]");
    assert!(!kinds(&tokens).contains(&TokenKind::Semicolon));
}

#[test]
fn no_asi_inside_braces() {
    let tokens = lex("{a: 1,\nb: 2}");
    assert!(!kinds(&tokens).contains(&TokenKind::Semicolon));
}

#[test]
fn asi_resumes_after_bracket_closes() {
    let tokens = lex("[1,\n2]\nx");
    let ks = kinds(&tokens);
    // exactly one inserted semicolon, after the ']'
    assert_eq!(ks.iter().filter(|k| **k == TokenKind::Semicolon).count(), 1);
    let semi_pos = ks.iter().position(|k| *k == TokenKind::Semicolon).unwrap();
    assert_eq!(ks[semi_pos - 1], TokenKind::RBracket);
}

#[test]
fn blank_lines_insert_one_semicolon() {
    let tokens = lex("x\n\n\ny");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn explicit_semicolons_still_emitted() {
    let tokens = lex("x; y;");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn crlf_line_endings() {
    let tokens = lex("x\r\ny");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::Identifier,
            TokenKind::Semicolon,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
    assert_eq!(tokens[2].span.line, 2);
}

#[test]
fn lexing_is_deterministic() {
    let src = "routine main() is\n    var x : integer is 5\n    print x + 1\nend\n";
    let first = lex(src);
    let second = lex(src);
    assert_eq!(first, second);
}
