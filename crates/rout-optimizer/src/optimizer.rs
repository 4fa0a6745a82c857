use rout_lexer::Span;
use rout_parser::*;

/// Optimizer over the checked AST.
///
/// Transformations, applied in one bottom-up pass:
/// 1. Constant folding on binary expressions with two literal operands.
///    Integer arithmetic wraps like two's-complement i32; division and
///    modulo by zero are left unfolded.
/// 2. Unary folding: `not` on a bool literal, and `-(-x)` to `x`.
/// 3. If-simplification: a literal `true` condition is replaced by the
///    then-branch, a literal `false` by the else-branch or nothing.
/// 4. Dead code elimination: body elements after a `return` are dropped.
///
/// Rewritten nodes keep the span of the node they replace.
pub struct Optimizer {
    count: usize,
}

impl Optimizer {
    pub fn new() -> Self {
        Self { count: 0 }
    }

    /// Number of optimizations applied by the last `optimize` call.
    pub fn optimization_count(&self) -> usize {
        self.count
    }

    pub fn optimize(&mut self, program: Program) -> Program {
        self.count = 0;
        let declarations = program
            .declarations
            .into_iter()
            .map(|decl| self.optimize_declaration(decl))
            .collect();
        Program {
            declarations,
            span: program.span,
        }
    }

    // ── Declarations and bodies ──────────────────────────────

    fn optimize_declaration(&mut self, decl: Declaration) -> Declaration {
        match decl {
            Declaration::Var(v) => {
                let VarDecl {
                    name,
                    ty,
                    initializer,
                    span,
                } = v;
                Declaration::Var(VarDecl {
                    name,
                    ty,
                    initializer: initializer.map(|init| self.optimize_expression(init)),
                    span,
                })
            }
            Declaration::Routine(r) => {
                let RoutineDecl {
                    name,
                    parameters,
                    return_type,
                    body,
                    expression_body,
                    span,
                } = r;
                Declaration::Routine(RoutineDecl {
                    name,
                    parameters,
                    return_type,
                    body: body.map(|body| self.optimize_body(body)),
                    expression_body: expression_body.map(|expr| self.optimize_expression(expr)),
                    span,
                })
            }
            Declaration::TypeAlias(t) => Declaration::TypeAlias(t),
        }
    }

    fn optimize_body(&mut self, body: Body) -> Body {
        let span = body.span;
        let mut elements = Vec::new();

        let mut iter = body.elements.into_iter();
        'outer: for element in iter.by_ref() {
            let replacements = match element {
                BodyElement::Declaration(decl) => {
                    vec![BodyElement::Declaration(self.optimize_declaration(decl))]
                }
                BodyElement::Statement(stmt) => self.optimize_statement(stmt),
            };
            for replacement in replacements {
                let is_return =
                    matches!(replacement, BodyElement::Statement(Statement::Return(_)));
                elements.push(replacement);
                if is_return {
                    // Everything after a return is unreachable
                    break 'outer;
                }
            }
        }

        Body { elements, span }
    }

    // ── Statements ───────────────────────────────────────────

    /// Optimize one statement. The result is a list because
    /// if-simplification replaces the statement with the surviving branch's
    /// elements (possibly none).
    fn optimize_statement(&mut self, stmt: Statement) -> Vec<BodyElement> {
        match stmt {
            Statement::Assignment(a) => {
                let ModifiablePrimary {
                    base,
                    accesses,
                    span,
                } = a.target;
                let target = ModifiablePrimary {
                    base,
                    accesses: self.optimize_accesses(accesses),
                    span,
                };
                vec![BodyElement::Statement(Statement::Assignment(Assignment {
                    target,
                    value: self.optimize_expression(a.value),
                    span: a.span,
                }))]
            }
            Statement::RoutineCall(call) => {
                vec![BodyElement::Statement(Statement::RoutineCall(
                    self.optimize_call(call),
                ))]
            }
            Statement::Print(p) => {
                let expressions = p
                    .expressions
                    .into_iter()
                    .map(|e| self.optimize_expression(e))
                    .collect();
                vec![BodyElement::Statement(Statement::Print(PrintStmt {
                    expressions,
                    span: p.span,
                }))]
            }
            Statement::If(if_stmt) => self.optimize_if(if_stmt),
            Statement::While(w) => {
                vec![BodyElement::Statement(Statement::While(WhileLoop {
                    condition: self.optimize_expression(w.condition),
                    body: self.optimize_body(w.body),
                    span: w.span,
                }))]
            }
            Statement::For(f) => {
                let ForLoop {
                    variable,
                    source,
                    reverse,
                    body,
                    span,
                } = f;
                let source = match source {
                    ForSource::Range { start, end } => ForSource::Range {
                        start: self.optimize_expression(start),
                        end: self.optimize_expression(end),
                    },
                    each @ ForSource::Each { .. } => each,
                };
                vec![BodyElement::Statement(Statement::For(ForLoop {
                    variable,
                    source,
                    reverse,
                    body: self.optimize_body(body),
                    span,
                }))]
            }
            Statement::Return(ret) => {
                vec![BodyElement::Statement(Statement::Return(ReturnStmt {
                    value: ret.value.map(|v| self.optimize_expression(v)),
                    span: ret.span,
                }))]
            }
        }
    }

    fn optimize_if(&mut self, if_stmt: IfStmt) -> Vec<BodyElement> {
        let condition = self.optimize_expression(if_stmt.condition);
        let then_branch = self.optimize_body(if_stmt.then_branch);
        let else_branch = if_stmt.else_branch.map(|b| self.optimize_body(b));

        if let Expr::Bool(value, _) = condition {
            self.count += 1;
            return if value {
                then_branch.elements
            } else {
                else_branch.map(|b| b.elements).unwrap_or_default()
            };
        }

        vec![BodyElement::Statement(Statement::If(IfStmt {
            condition,
            then_branch,
            else_branch,
            span: if_stmt.span,
        }))]
    }

    // ── Expressions ──────────────────────────────────────────

    fn optimize_call(&mut self, call: RoutineCall) -> RoutineCall {
        let RoutineCall {
            name,
            arguments,
            span,
        } = call;
        RoutineCall {
            name,
            arguments: arguments
                .into_iter()
                .map(|a| self.optimize_expression(a))
                .collect(),
            span,
        }
    }

    fn optimize_accesses(&mut self, accesses: Vec<Access>) -> Vec<Access> {
        accesses
            .into_iter()
            .map(|access| match access {
                Access::Index { index, span } => Access::Index {
                    index: self.optimize_expression(index),
                    span,
                },
                field @ Access::Field { .. } => field,
            })
            .collect()
    }

    fn optimize_expression(&mut self, expr: Expr) -> Expr {
        match expr {
            Expr::Binary {
                left,
                op,
                right,
                span,
            } => {
                let left = self.optimize_expression(*left);
                let right = self.optimize_expression(*right);
                if let Some(folded) = fold_binary(op, &left, &right, span) {
                    self.count += 1;
                    return folded;
                }
                Expr::Binary {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                    span,
                }
            }
            Expr::Unary { op, operand, span } => {
                let operand = self.optimize_expression(*operand);

                // -(-x) -> x
                if op == UnaryOp::Neg {
                    if let Expr::Unary {
                        op: UnaryOp::Neg,
                        operand: inner,
                        ..
                    } = operand
                    {
                        self.count += 1;
                        return *inner;
                    }
                    // fall through with the (possibly rewritten) operand
                    return Expr::Unary {
                        op,
                        operand: Box::new(operand),
                        span,
                    };
                }

                // not true -> false, not false -> true
                if let Expr::Bool(value, _) = operand {
                    self.count += 1;
                    return Expr::Bool(!value, span);
                }
                Expr::Unary {
                    op,
                    operand: Box::new(operand),
                    span,
                }
            }
            Expr::Call(call) => Expr::Call(self.optimize_call(call)),
            Expr::Primary(primary) => {
                let ModifiablePrimary {
                    base,
                    accesses,
                    span,
                } = primary;
                Expr::Primary(ModifiablePrimary {
                    base,
                    accesses: self.optimize_accesses(accesses),
                    span,
                })
            }
            Expr::ArrayLit { elements, span } => Expr::ArrayLit {
                elements: elements
                    .into_iter()
                    .map(|e| self.optimize_expression(e))
                    .collect(),
                span,
            },
            Expr::RecordLit { fields, span } => Expr::RecordLit {
                fields: fields
                    .into_iter()
                    .map(|f| RecordField {
                        name: f.name,
                        value: self.optimize_expression(f.value),
                    })
                    .collect(),
                span,
            },
            // Literals and identifiers are left as is
            other => other,
        }
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

// ── Constant folding ─────────────────────────────────────────

/// Fold a binary expression whose operands are both literals. Returns None
/// when the operator/operand combination is outside the folding set (or
/// would divide by zero), in which case the original expression is kept.
fn fold_binary(op: BinaryOp, left: &Expr, right: &Expr, span: Span) -> Option<Expr> {
    use BinaryOp::*;

    // Integer × integer
    if let (Expr::Int(l, _), Expr::Int(r, _)) = (left, right) {
        let (l, r) = (*l, *r);
        return match op {
            Add => Some(Expr::Int(l.wrapping_add(r), span)),
            Sub => Some(Expr::Int(l.wrapping_sub(r), span)),
            Mul => Some(Expr::Int(l.wrapping_mul(r), span)),
            Div if r != 0 => Some(Expr::Int(l.wrapping_div(r), span)),
            Mod if r != 0 => Some(Expr::Int(l.wrapping_rem(r), span)),
            Less => Some(Expr::Bool(l < r, span)),
            LessEq => Some(Expr::Bool(l <= r, span)),
            Greater => Some(Expr::Bool(l > r, span)),
            GreaterEq => Some(Expr::Bool(l >= r, span)),
            Eq => Some(Expr::Bool(l == r, span)),
            NotEq => Some(Expr::Bool(l != r, span)),
            _ => None,
        };
    }

    // Boolean × boolean
    if let (Expr::Bool(l, _), Expr::Bool(r, _)) = (left, right) {
        let (l, r) = (*l, *r);
        return match op {
            And => Some(Expr::Bool(l && r, span)),
            Or => Some(Expr::Bool(l || r, span)),
            Eq => Some(Expr::Bool(l == r, span)),
            NotEq => Some(Expr::Bool(l != r, span)),
            _ => None,
        };
    }

    // Numeric with at least one real operand: promote to real
    if let (Some(l), Some(r)) = (as_real(left), as_real(right)) {
        return match op {
            Add => Some(Expr::Real(l + r, span)),
            Sub => Some(Expr::Real(l - r, span)),
            Mul => Some(Expr::Real(l * r, span)),
            Div if r != 0.0 => Some(Expr::Real(l / r, span)),
            Less => Some(Expr::Bool(l < r, span)),
            LessEq => Some(Expr::Bool(l <= r, span)),
            Greater => Some(Expr::Bool(l > r, span)),
            GreaterEq => Some(Expr::Bool(l >= r, span)),
            Eq => Some(Expr::Bool(l == r, span)),
            NotEq => Some(Expr::Bool(l != r, span)),
            _ => None,
        };
    }

    None
}

/// Numeric literal value, promoting integers; used only when the pair has
/// at least one real side (the int/int case is handled before this).
fn as_real(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Real(v, _) => Some(*v),
        Expr::Int(v, _) => Some(*v as f64),
        _ => None,
    }
}
