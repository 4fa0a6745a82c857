use super::*;

impl Parser {
    // ── Expressions ──────────────────────────────────────────
    // Precedence cascade, lowest to highest:
    //   or -> and -> comparison -> additive -> multiplicative
    //   -> unary -> primary
    // Every binary level is left-associative and built iteratively.

    pub(super) fn expression(&mut self) -> Result<Expr, ParseError> {
        self.or_expression()
    }

    fn or_expression(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.and_expression()?;
        while self.current_kind() == TokenKind::Or {
            let span = self.current_span();
            self.advance();
            let right = self.and_expression()?;
            left = Expr::Binary {
                left: Box::new(left),
                op: BinaryOp::Or,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn and_expression(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.comparison()?;
        while self.current_kind() == TokenKind::And {
            let span = self.current_span();
            self.advance();
            let right = self.comparison()?;
            left = Expr::Binary {
                left: Box::new(left),
                op: BinaryOp::And,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.additive()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEqual => BinaryOp::LessEq,
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::GreaterEqual => BinaryOp::GreaterEq,
                TokenKind::Equals => BinaryOp::Eq,
                TokenKind::NotEquals => BinaryOp::NotEq,
                _ => break,
            };
            let span = self.current_span();
            self.advance();
            let right = self.additive()?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let span = self.current_span();
            self.advance();
            let right = self.multiplicative()?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.current_kind() {
                TokenKind::Multiply => BinaryOp::Mul,
                TokenKind::Divide => BinaryOp::Div,
                TokenKind::Modulo => BinaryOp::Mod,
                _ => break,
            };
            let span = self.current_span();
            self.advance();
            let right = self.unary()?;
            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current_kind() {
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            _ => return self.primary(),
        };
        let span = self.current_span();
        self.advance();
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            span,
        })
    }

    // Primaries: literals, parenthesized expressions, identifier usages
    // (bare, call, or access chain), array literals, record literals.

    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::IntLiteral => {
                self.advance();
                let value = token.lexeme.parse::<i32>().map_err(|_| {
                    self.error_at(
                        token.span,
                        format!("integer literal '{}' out of range", token.lexeme),
                    )
                })?;
                Ok(Expr::Int(value, token.span))
            }
            TokenKind::RealLiteral => {
                self.advance();
                let value = token.lexeme.parse::<f64>().map_err(|_| {
                    self.error_at(
                        token.span,
                        format!("malformed real literal '{}'", token.lexeme),
                    )
                })?;
                Ok(Expr::Real(value, token.span))
            }
            TokenKind::BoolLiteral => {
                self.advance();
                let value = token.lexeme.eq_ignore_ascii_case("true");
                Ok(Expr::Bool(value, token.span))
            }
            TokenKind::StringLiteral => {
                self.advance();
                Ok(Expr::Str(token.lexeme, token.span))
            }
            TokenKind::Identifier => {
                self.advance();
                let name = token.lexeme;

                // function call in expression position
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
                    return Ok(Expr::Call(RoutineCall {
                        name,
                        arguments,
                        span: token.span,
                    }));
                }

                let accesses = self.access_chain()?;
                if accesses.is_empty() {
                    Ok(Expr::Identifier(name, token.span))
                } else {
                    Ok(Expr::Primary(ModifiablePrimary {
                        base: name,
                        accesses,
                        span: token.span,
                    }))
                }
            }
            TokenKind::LBracket => {
                // array literal [e1, ..., eN]
                self.advance();
                let mut elements = Vec::new();
                if !self.matches(TokenKind::RBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.matches(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RBracket)?;
                }
                Ok(Expr::ArrayLit {
                    elements,
                    span: token.span,
                })
            }
            TokenKind::LBrace => {
                // record literal {name: expr, ...}
                self.advance();
                let mut fields = Vec::new();
                if !self.matches(TokenKind::RBrace) {
                    loop {
                        let name = self.expect(TokenKind::Identifier)?.lexeme;
                        self.expect(TokenKind::Colon)?;
                        let value = self.expression()?;
                        fields.push(RecordField { name, value });
                        if !self.matches(TokenKind::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenKind::RBrace)?;
                }
                Ok(Expr::RecordLit {
                    fields,
                    span: token.span,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => Err(self.error_at(
                token.span,
                format!(
                    "unexpected {:?} '{}' in expression",
                    token.kind, token.lexeme
                ),
            )),
        }
    }
}
