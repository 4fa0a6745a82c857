use super::*;

impl Parser {
    // ── Declarations ─────────────────────────────────────────
    // Dispatch on the first token: var / type / routine

    pub(super) fn declaration(&mut self) -> Result<Declaration, ParseError> {
        match self.current_kind() {
            TokenKind::Var => Ok(Declaration::Var(self.variable_declaration()?)),
            TokenKind::Type => Ok(Declaration::TypeAlias(self.type_declaration()?)),
            TokenKind::Routine => Ok(Declaration::Routine(self.routine_declaration()?)),
            _ => {
                let token = self.current().clone();
                Err(self.error_at(
                    token.span,
                    format!("expected declaration, found {:?} '{}'", token.kind, token.lexeme),
                ))
            }
        }
    }

    // var NAME (':' Type)? ('is' Expression)? ';'

    pub(super) fn variable_declaration(&mut self) -> Result<VarDecl, ParseError> {
        let span = self.current_span();
        self.expect(TokenKind::Var)?;
        let name = self.expect(TokenKind::Identifier)?.lexeme;

        let ty = if self.matches(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let initializer = if self.matches(TokenKind::Is) {
            Some(self.expression()?)
        } else {
            None
        };

        self.expect_terminator()?;
        Ok(VarDecl {
            name,
            ty,
            initializer,
            span,
        })
    }

    // type NAME 'is' Type ';'

    fn type_declaration(&mut self) -> Result<TypeDecl, ParseError> {
        let span = self.current_span();
        self.expect(TokenKind::Type)?;
        let name = self.expect(TokenKind::Identifier)?.lexeme;
        self.expect(TokenKind::Is)?;
        let aliased = self.parse_type()?;
        self.expect_terminator()?;
        Ok(TypeDecl { name, aliased, span })
    }

    // routine NAME '(' Params? ')' (':' Type)? ('=>' Expr ';' | 'is' Body 'end')

    fn routine_declaration(&mut self) -> Result<RoutineDecl, ParseError> {
        let span = self.current_span();
        self.expect(TokenKind::Routine)?;
        let name = self.expect(TokenKind::Identifier)?.lexeme;
        self.expect(TokenKind::LParen)?;

        let mut parameters = Vec::new();
        if !self.matches(TokenKind::RParen) {
            loop {
                parameters.push(self.parameter()?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen)?;
        }

        let return_type = if self.matches(TokenKind::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };

        // Expression-body form: routine f(x) => expr;
        if self.matches(TokenKind::FatArrow) {
            let expression_body = self.expression()?;
            self.expect_terminator()?;
            return Ok(RoutineDecl {
                name,
                parameters,
                return_type,
                body: None,
                expression_body: Some(expression_body),
                span,
            });
        }

        self.expect(TokenKind::Is)?;
        let body = self.body()?;
        self.expect(TokenKind::End)?;
        Ok(RoutineDecl {
            name,
            parameters,
            return_type,
            body: Some(body),
            expression_body: None,
            span,
        })
    }

    // ('ref')? NAME ':' Type

    fn parameter(&mut self) -> Result<Parameter, ParseError> {
        let span = self.current_span();
        let by_ref = self.matches(TokenKind::Ref);
        let name = self.expect(TokenKind::Identifier)?.lexeme;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        Ok(Parameter { name, ty, by_ref, span })
    }

    // Alternating declarations and statements until 'end' or 'else'

    pub(super) fn body(&mut self) -> Result<Body, ParseError> {
        let span = self.current_span();
        let mut elements = Vec::new();

        while self.current_kind() != TokenKind::End && self.current_kind() != TokenKind::Else {
            if self.current_kind() == TokenKind::Semicolon {
                self.advance();
                continue;
            }
            match self.current_kind() {
                TokenKind::Var | TokenKind::Type | TokenKind::Routine => {
                    elements.push(BodyElement::Declaration(self.declaration()?));
                }
                _ => elements.push(BodyElement::Statement(self.statement()?)),
            }
        }

        Ok(Body { elements, span })
    }
}
