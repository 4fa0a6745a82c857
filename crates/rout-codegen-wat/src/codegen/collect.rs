use rout_parser::*;

use super::{FuncCtx, WatCodegen, WatType};

impl<'a> WatCodegen<'a> {
    // ── String collection ────────────────────────────────────
    // Pre-pass: every string literal in the program is interned into the
    // data section before any code is emitted.

    pub(crate) fn collect_strings(&mut self, program: &Program) {
        for decl in &program.declarations {
            self.collect_strings_decl(decl);
        }
    }

    fn collect_strings_decl(&mut self, decl: &Declaration) {
        match decl {
            Declaration::Var(v) => {
                if let Some(init) = &v.initializer {
                    self.collect_strings_expr(init);
                }
            }
            Declaration::Routine(r) => {
                if let Some(body) = &r.body {
                    self.collect_strings_body(body);
                }
                if let Some(expr) = &r.expression_body {
                    self.collect_strings_expr(expr);
                }
            }
            Declaration::TypeAlias(_) => {}
        }
    }

    fn collect_strings_body(&mut self, body: &Body) {
        for element in &body.elements {
            match element {
                BodyElement::Declaration(decl) => self.collect_strings_decl(decl),
                BodyElement::Statement(stmt) => self.collect_strings_stmt(stmt),
            }
        }
    }

    fn collect_strings_stmt(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Assignment(a) => {
                self.collect_strings_expr(&a.value);
                for access in &a.target.accesses {
                    if let Access::Index { index, .. } = access {
                        self.collect_strings_expr(index);
                    }
                }
            }
            Statement::RoutineCall(call) => {
                for arg in &call.arguments {
                    self.collect_strings_expr(arg);
                }
            }
            Statement::Print(p) => {
                for expr in &p.expressions {
                    self.collect_strings_expr(expr);
                }
            }
            Statement::If(i) => {
                self.collect_strings_expr(&i.condition);
                self.collect_strings_body(&i.then_branch);
                if let Some(else_branch) = &i.else_branch {
                    self.collect_strings_body(else_branch);
                }
            }
            Statement::While(w) => {
                self.collect_strings_expr(&w.condition);
                self.collect_strings_body(&w.body);
            }
            Statement::For(f) => {
                if let ForSource::Range { start, end } = &f.source {
                    self.collect_strings_expr(start);
                    self.collect_strings_expr(end);
                }
                self.collect_strings_body(&f.body);
            }
            Statement::Return(ret) => {
                if let Some(value) = &ret.value {
                    self.collect_strings_expr(value);
                }
            }
        }
    }

    fn collect_strings_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Str(value, _) => {
                self.intern_string(value);
            }
            Expr::Binary { left, right, .. } => {
                self.collect_strings_expr(left);
                self.collect_strings_expr(right);
            }
            Expr::Unary { operand, .. } => self.collect_strings_expr(operand),
            Expr::Call(call) => {
                for arg in &call.arguments {
                    self.collect_strings_expr(arg);
                }
            }
            Expr::Primary(primary) => {
                for access in &primary.accesses {
                    if let Access::Index { index, .. } = access {
                        self.collect_strings_expr(index);
                    }
                }
            }
            Expr::ArrayLit { elements, .. } => {
                for element in elements {
                    self.collect_strings_expr(element);
                }
            }
            Expr::RecordLit { fields, .. } => {
                for field in fields {
                    self.collect_strings_expr(&field.value);
                }
            }
            _ => {}
        }
    }

    // ── Local collection ─────────────────────────────────────
    // WAT requires every local declared in the function header, so variable
    // declarations are gathered recursively through if/while/for bodies
    // before any instruction is emitted. Loop variables bring their helper
    // locals along.

    pub(crate) fn collect_locals(&self, ctx: &mut FuncCtx, body: &Body) {
        for element in &body.elements {
            match element {
                BodyElement::Declaration(Declaration::Var(v)) => {
                    let wat = v
                        .ty
                        .as_ref()
                        .map(|ty| self.lower_type_in(ctx, ty))
                        .or_else(|| {
                            v.initializer.as_ref().map(|init| self.infer_type(ctx, init))
                        })
                        .unwrap_or(WatType::I32);
                    ctx.add_local(&v.name, wat, v.ty.clone());
                }
                BodyElement::Declaration(Declaration::TypeAlias(t)) => {
                    ctx.local_types
                        .entry(t.name.clone())
                        .or_insert_with(|| t.aliased.clone());
                }
                // Nested routine declarations produce no code
                BodyElement::Declaration(Declaration::Routine(_)) => {}
                BodyElement::Statement(stmt) => self.collect_locals_stmt(ctx, stmt),
            }
        }
    }

    fn collect_locals_stmt(&self, ctx: &mut FuncCtx, stmt: &Statement) {
        match stmt {
            Statement::If(i) => {
                self.collect_locals(ctx, &i.then_branch);
                if let Some(else_branch) = &i.else_branch {
                    self.collect_locals(ctx, else_branch);
                }
            }
            Statement::While(w) => self.collect_locals(ctx, &w.body),
            Statement::For(f) => {
                ctx.add_local(&f.variable, WatType::I32, None);
                if matches!(f.source, ForSource::Each { .. }) {
                    ctx.add_local(&format!("{}_idx", f.variable), WatType::I32, None);
                    ctx.add_local(&format!("{}_size", f.variable), WatType::I32, None);
                }
                self.collect_locals(ctx, &f.body);
            }
            _ => {}
        }
    }

    // ── Real-modulo scan ─────────────────────────────────────
    // WAT has no f64 remainder instruction; a real-typed `%` is expanded
    // through two f64 scratch locals, declared only when needed.

    pub(crate) fn scan_real_mod_body(&self, ctx: &FuncCtx, body: &Body) -> bool {
        body.elements.iter().any(|element| match element {
            BodyElement::Declaration(Declaration::Var(v)) => v
                .initializer
                .as_ref()
                .is_some_and(|init| self.scan_real_mod_expr(ctx, init)),
            BodyElement::Declaration(_) => false,
            BodyElement::Statement(stmt) => self.scan_real_mod_stmt(ctx, stmt),
        })
    }

    fn scan_real_mod_stmt(&self, ctx: &FuncCtx, stmt: &Statement) -> bool {
        match stmt {
            Statement::Assignment(a) => {
                self.scan_real_mod_expr(ctx, &a.value)
                    || a.target.accesses.iter().any(|access| match access {
                        Access::Index { index, .. } => self.scan_real_mod_expr(ctx, index),
                        Access::Field { .. } => false,
                    })
            }
            Statement::RoutineCall(call) => call
                .arguments
                .iter()
                .any(|arg| self.scan_real_mod_expr(ctx, arg)),
            Statement::Print(p) => p
                .expressions
                .iter()
                .any(|expr| self.scan_real_mod_expr(ctx, expr)),
            Statement::If(i) => {
                self.scan_real_mod_expr(ctx, &i.condition)
                    || self.scan_real_mod_body(ctx, &i.then_branch)
                    || i.else_branch
                        .as_ref()
                        .is_some_and(|b| self.scan_real_mod_body(ctx, b))
            }
            Statement::While(w) => {
                self.scan_real_mod_expr(ctx, &w.condition) || self.scan_real_mod_body(ctx, &w.body)
            }
            Statement::For(f) => {
                let in_source = match &f.source {
                    ForSource::Range { start, end } => {
                        self.scan_real_mod_expr(ctx, start) || self.scan_real_mod_expr(ctx, end)
                    }
                    ForSource::Each { .. } => false,
                };
                in_source || self.scan_real_mod_body(ctx, &f.body)
            }
            Statement::Return(ret) => ret
                .value
                .as_ref()
                .is_some_and(|value| self.scan_real_mod_expr(ctx, value)),
        }
    }

    pub(crate) fn scan_real_mod_expr(&self, ctx: &FuncCtx, expr: &Expr) -> bool {
        match expr {
            Expr::Binary { left, op, right, .. } => {
                if *op == BinaryOp::Mod
                    && (self.infer_type(ctx, left).is_f64()
                        || self.infer_type(ctx, right).is_f64())
                {
                    return true;
                }
                self.scan_real_mod_expr(ctx, left) || self.scan_real_mod_expr(ctx, right)
            }
            Expr::Unary { operand, .. } => self.scan_real_mod_expr(ctx, operand),
            Expr::Call(call) => call
                .arguments
                .iter()
                .any(|arg| self.scan_real_mod_expr(ctx, arg)),
            Expr::Primary(primary) => primary.accesses.iter().any(|access| match access {
                Access::Index { index, .. } => self.scan_real_mod_expr(ctx, index),
                Access::Field { .. } => false,
            }),
            Expr::ArrayLit { elements, .. } => elements
                .iter()
                .any(|element| self.scan_real_mod_expr(ctx, element)),
            Expr::RecordLit { fields, .. } => fields
                .iter()
                .any(|field| self.scan_real_mod_expr(ctx, &field.value)),
            _ => false,
        }
    }
}
