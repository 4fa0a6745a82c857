use super::*;

impl Parser {
    // ── Types ────────────────────────────────────────────────
    // primitive | array '[' Expr? ']' Type | record VarDecl* end | IDENTIFIER

    pub(super) fn parse_type(&mut self) -> Result<Type, ParseError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Integer => {
                self.advance();
                Ok(Type::Primitive(PrimitiveKind::Integer, token.span))
            }
            TokenKind::Real => {
                self.advance();
                Ok(Type::Primitive(PrimitiveKind::Real, token.span))
            }
            TokenKind::Boolean => {
                self.advance();
                Ok(Type::Primitive(PrimitiveKind::Boolean, token.span))
            }
            TokenKind::String => {
                self.advance();
                Ok(Type::Primitive(PrimitiveKind::String, token.span))
            }
            TokenKind::Array => {
                self.advance();
                self.expect(TokenKind::LBracket)?;
                let size = if self.matches(TokenKind::RBracket) {
                    None
                } else {
                    let size = self.expression()?;
                    self.expect(TokenKind::RBracket)?;
                    Some(Box::new(size))
                };
                let element = Box::new(self.parse_type()?);
                Ok(Type::Array {
                    size,
                    element,
                    span: token.span,
                })
            }
            TokenKind::Record => {
                self.advance();
                let mut fields = Vec::new();
                while self.current_kind() != TokenKind::End {
                    if self.current_kind() == TokenKind::Semicolon {
                        self.advance();
                        continue;
                    }
                    fields.push(self.variable_declaration()?);
                }
                self.expect(TokenKind::End)?;
                Ok(Type::Record {
                    fields,
                    span: token.span,
                })
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Type::User {
                    name: token.lexeme,
                    span: token.span,
                })
            }
            _ => Err(self.error_at(
                token.span,
                format!("expected type, found {:?} '{}'", token.kind, token.lexeme),
            )),
        }
    }
}
