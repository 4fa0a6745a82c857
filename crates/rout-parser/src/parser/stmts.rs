use super::*;

impl Parser {
    // ── Statements ───────────────────────────────────────────
    // Dispatch on the first token

    pub(super) fn statement(&mut self) -> Result<Statement, ParseError> {
        match self.current_kind() {
            TokenKind::Identifier => self.assignment_or_call(),
            TokenKind::Print => self.print_statement(),
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Return => self.return_statement(),
            _ => {
                let token = self.current().clone();
                Err(self.error_at(
                    token.span,
                    format!("expected statement, found {:?} '{}'", token.kind, token.lexeme),
                ))
            }
        }
    }

    // IDENTIFIER '(' args? ')' ';'              — routine call
    // IDENTIFIER ('[' e ']' | '.' name)* ':=' Expression ';'  — assignment

    fn assignment_or_call(&mut self) -> Result<Statement, ParseError> {
        let span = self.current_span();
        let name = self.expect(TokenKind::Identifier)?.lexeme;

        if self.matches(TokenKind::LParen) {
            let mut arguments = Vec::new();
            if !self.matches(TokenKind::RParen) {
                loop {
                    arguments.push(self.expression()?);
                    if !self.matches(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen)?;
            }
            self.expect_terminator()?;
            return Ok(Statement::RoutineCall(RoutineCall {
                name,
                arguments,
                span,
            }));
        }

        let accesses = self.access_chain()?;
        self.expect(TokenKind::Assign)?;
        let value = self.expression()?;
        self.expect_terminator()?;

        Ok(Statement::Assignment(Assignment {
            target: ModifiablePrimary {
                base: name,
                accesses,
                span,
            },
            value,
            span,
        }))
    }

    /// Parse a chain of `[expr]` and `.name` accesses (possibly empty).
    pub(super) fn access_chain(&mut self) -> Result<Vec<Access>, ParseError> {
        let mut accesses = Vec::new();
        loop {
            match self.current_kind() {
                TokenKind::LBracket => {
                    let span = self.current_span();
                    self.advance();
                    let index = self.expression()?;
                    self.expect(TokenKind::RBracket)?;
                    accesses.push(Access::Index { index, span });
                }
                TokenKind::Dot => {
                    let span = self.current_span();
                    self.advance();
                    let name = self.expect(TokenKind::Identifier)?.lexeme;
                    accesses.push(Access::Field { name, span });
                }
                _ => break,
            }
        }
        Ok(accesses)
    }

    // print Expr (, Expr)* ';'   — parentheses around the list are optional

    fn print_statement(&mut self) -> Result<Statement, ParseError> {
        let span = self.current_span();
        self.expect(TokenKind::Print)?;
        let mut expressions = Vec::new();

        if self.matches(TokenKind::LParen) {
            if !self.matches(TokenKind::RParen) {
                loop {
                    expressions.push(self.expression()?);
                    if !self.matches(TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(TokenKind::RParen)?;
            }
        } else {
            expressions.push(self.expression()?);
            while self.matches(TokenKind::Comma) {
                expressions.push(self.expression()?);
            }
        }

        self.expect_terminator()?;
        Ok(Statement::Print(PrintStmt { expressions, span }))
    }

    // if Expr then Body (else Body)? end

    fn if_statement(&mut self) -> Result<Statement, ParseError> {
        let span = self.current_span();
        self.expect(TokenKind::If)?;
        let condition = self.expression()?;
        self.expect(TokenKind::Then)?;
        let then_branch = self.body()?;
        let else_branch = if self.matches(TokenKind::Else) {
            Some(self.body()?)
        } else {
            None
        };
        self.expect(TokenKind::End)?;
        Ok(Statement::If(IfStmt {
            condition,
            then_branch,
            else_branch,
            span,
        }))
    }

    // while Expr loop Body end

    fn while_statement(&mut self) -> Result<Statement, ParseError> {
        let span = self.current_span();
        self.expect(TokenKind::While)?;
        let condition = self.expression()?;
        self.expect(TokenKind::Loop)?;
        let body = self.body()?;
        self.expect(TokenKind::End)?;
        Ok(Statement::While(WhileLoop {
            condition,
            body,
            span,
        }))
    }

    // for NAME in Expr ('..' Expr)? ('reverse')? loop Body end
    //
    // With a '..' this is a range loop; without one the iterated expression
    // must be an identifier naming an array (for-each form).

    fn for_statement(&mut self) -> Result<Statement, ParseError> {
        let span = self.current_span();
        self.expect(TokenKind::For)?;
        let variable = self.expect(TokenKind::Identifier)?.lexeme;
        self.expect(TokenKind::In)?;

        let first = self.expression()?;
        let source = if self.matches(TokenKind::Range) {
            let end = self.expression()?;
            ForSource::Range { start: first, end }
        } else {
            match first {
                Expr::Identifier(array, id_span) => ForSource::Each {
                    array,
                    span: id_span,
                },
                other => {
                    return Err(self.error_at(
                        other.span(),
                        "for-each loop must iterate over an array variable".to_string(),
                    ))
                }
            }
        };

        let reverse = self.matches(TokenKind::Reverse);
        self.expect(TokenKind::Loop)?;
        let body = self.body()?;
        self.expect(TokenKind::End)?;

        Ok(Statement::For(ForLoop {
            variable,
            source,
            reverse,
            body,
            span,
        }))
    }

    // return Expr? ';'

    fn return_statement(&mut self) -> Result<Statement, ParseError> {
        let span = self.current_span();
        self.expect(TokenKind::Return)?;
        let value = match self.current_kind() {
            TokenKind::Semicolon | TokenKind::End | TokenKind::Else | TokenKind::Eof => None,
            _ => Some(self.expression()?),
        };
        self.expect_terminator()?;
        Ok(Statement::Return(ReturnStmt { value, span }))
    }
}
