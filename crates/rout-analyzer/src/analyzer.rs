use rout_lexer::Span;
use rout_parser::*;

use crate::context::SymbolContext;

/// Semantic checks over the parsed program.
///
/// Pass 1 records only the top-level declarations so routines may be called
/// before their textual definition. Pass 2 walks declarations in source
/// order, descending into bodies. Every error is collected; `analyze`
/// returns the first one as the fatal result and leaves the rest
/// retrievable through [`SemanticAnalyzer::errors`].
pub struct SemanticAnalyzer {
    context: SymbolContext,
    warnings: Vec<String>,
    errors: Vec<SemanticError>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self {
            context: SymbolContext::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn analyze(&mut self, program: &Program) -> Result<(), SemanticError> {
        // Pass 1: collect only top-level declarations
        for decl in &program.declarations {
            self.collect_global_declaration(decl);
        }

        // Pass 2: check each top-level declaration and its body in order
        for decl in &program.declarations {
            self.check_declaration(decl);
        }

        // Unused variables of the global scope
        for info in self.context.unused_in_current_scope() {
            self.warn_unused(&info.name, info.span);
        }

        match self.errors.first() {
            Some(first) => Err(first.clone()),
            None => Ok(()),
        }
    }

    /// Symbol tables populated by analysis; the code generator reads type
    /// aliases and routine signatures from here.
    pub fn context(&self) -> &SymbolContext {
        &self.context
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[SemanticError] {
        &self.errors
    }

    fn error(&mut self, message: String, span: Span) {
        self.errors.push(SemanticError::new(message, span));
    }

    fn warn_unused(&mut self, name: &str, span: Span) {
        self.warnings.push(format!(
            "Variable '{name}' declared at {}:{} is never used",
            span.line, span.column
        ));
    }

    fn drain_scope_warnings(&mut self, unused: Vec<crate::context::VarInfo>) {
        for info in unused {
            self.warn_unused(&info.name, info.span);
        }
    }

    // ── Pass 1 ───────────────────────────────────────────────

    fn collect_global_declaration(&mut self, decl: &Declaration) {
        let result = match decl {
            Declaration::Var(v) => {
                self.context
                    .declare_variable(&v.name, v.ty.clone(), v.span)
            }
            Declaration::Routine(r) => self.context.declare_routine(
                &r.name,
                r.parameters.clone(),
                r.return_type.clone(),
                r.span,
            ),
            Declaration::TypeAlias(t) => {
                self.context.declare_type(&t.name, t.aliased.clone(), t.span)
            }
        };
        if let Err(e) = result {
            self.errors.push(e);
        }
    }

    // ── Pass 2 ───────────────────────────────────────────────

    fn check_declaration(&mut self, decl: &Declaration) {
        match decl {
            Declaration::Var(v) => {
                // Top-level variables were declared in pass 1; only the
                // initializer needs checking here.
                if let Some(init) = &v.initializer {
                    self.check_expression(init);
                }
            }
            Declaration::Routine(r) => self.check_routine(r),
            Declaration::TypeAlias(_) => {}
        }
    }

    fn check_routine(&mut self, routine: &RoutineDecl) {
        self.context.enter_routine(&routine.name);

        // Parameters are visible inside the body
        for param in &routine.parameters {
            if let Err(e) =
                self.context
                    .declare_variable(&param.name, Some(param.ty.clone()), param.span)
            {
                self.errors.push(e);
            }
        }

        if let Some(body) = &routine.body {
            self.check_body(body);
        } else if let Some(expr) = &routine.expression_body {
            self.check_expression(expr);
        }

        let unused = self.context.exit_routine();
        self.drain_scope_warnings(unused);
    }

    fn check_body(&mut self, body: &Body) {
        for element in &body.elements {
            match element {
                BodyElement::Declaration(Declaration::Var(v)) => {
                    // The initializer is checked before the variable is
                    // declared: a variable cannot refer to itself.
                    if let Some(init) = &v.initializer {
                        self.check_expression(init);
                    }
                    if let Err(e) = self.context.declare_variable(&v.name, v.ty.clone(), v.span) {
                        self.errors.push(e);
                    }
                }
                BodyElement::Declaration(Declaration::TypeAlias(t)) => {
                    if let Err(e) = self.context.declare_type(&t.name, t.aliased.clone(), t.span) {
                        self.errors.push(e);
                    }
                }
                BodyElement::Declaration(decl @ Declaration::Routine(_)) => {
                    self.check_declaration(decl);
                }
                BodyElement::Statement(stmt) => self.check_statement(stmt),
            }
        }
    }

    fn check_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Assignment(a) => self.check_assignment(a),
            Statement::RoutineCall(call) => self.check_routine_call(call),
            Statement::Print(p) => {
                for expr in &p.expressions {
                    self.check_expression(expr);
                }
            }
            Statement::If(if_stmt) => self.check_if(if_stmt),
            Statement::While(while_loop) => self.check_while(while_loop),
            Statement::For(for_loop) => self.check_for(for_loop),
            Statement::Return(ret) => {
                if !self.context.is_in_routine() {
                    self.error("return statement outside of routine".to_string(), ret.span);
                }
                if let Some(value) = &ret.value {
                    self.check_expression(value);
                }
            }
        }
    }

    fn check_routine_call(&mut self, call: &RoutineCall) {
        if !self.context.is_declared_routine(&call.name) {
            self.error(format!("Routine '{}' is not declared", call.name), call.span);
        } else {
            self.check_call_arity(call);
        }
        for arg in &call.arguments {
            self.check_expression(arg);
        }
    }

    fn check_call_arity(&mut self, call: &RoutineCall) {
        let expected = self
            .context
            .routine_info(&call.name)
            .map(|info| info.parameters.len())
            .unwrap_or(0);
        let given = call.arguments.len();
        if given != expected {
            self.error(
                format!(
                    "Routine '{}' expects {expected} argument(s) but got {given}",
                    call.name
                ),
                call.span,
            );
        }
    }

    fn check_assignment(&mut self, assignment: &Assignment) {
        // Right-hand side first
        self.check_expression(&assignment.value);

        let target = &assignment.target;
        if !self.context.is_declared_variable(&target.base) {
            self.error(
                format!("Variable '{}' is not declared", target.base),
                target.span,
            );
        } else {
            self.context.mark_variable_used(&target.base);
        }
        for access in &target.accesses {
            if let Access::Index { index, .. } = access {
                self.check_expression(index);
            }
        }
    }

    fn check_if(&mut self, if_stmt: &IfStmt) {
        self.check_expression(&if_stmt.condition);

        self.context.enter_scope();
        self.check_body(&if_stmt.then_branch);
        let unused = self.context.exit_scope();
        self.drain_scope_warnings(unused);

        if let Some(else_branch) = &if_stmt.else_branch {
            self.context.enter_scope();
            self.check_body(else_branch);
            let unused = self.context.exit_scope();
            self.drain_scope_warnings(unused);
        }
    }

    fn check_while(&mut self, while_loop: &WhileLoop) {
        self.check_expression(&while_loop.condition);

        self.context.enter_loop();
        self.context.enter_scope();
        self.check_body(&while_loop.body);
        let unused = self.context.exit_scope();
        self.drain_scope_warnings(unused);
        self.context.exit_loop();
    }

    fn check_for(&mut self, for_loop: &ForLoop) {
        self.context.enter_loop();
        self.context.enter_scope();

        // Iteration bounds are checked before the loop variable exists
        match &for_loop.source {
            ForSource::Range { start, end } => {
                self.check_expression(start);
                self.check_expression(end);
            }
            ForSource::Each { array, span } => {
                if !self.context.is_declared_variable(array) {
                    self.error(format!("Variable '{array}' is not declared"), *span);
                } else {
                    self.context.mark_variable_used(array);
                }
            }
        }

        if let Err(e) = self
            .context
            .declare_variable(&for_loop.variable, None, for_loop.span)
        {
            self.errors.push(e);
        }

        self.check_body(&for_loop.body);

        let unused = self.context.exit_scope();
        self.drain_scope_warnings(unused);
        self.context.exit_loop();
    }

    fn check_expression(&mut self, expr: &Expr) {
        match expr {
            Expr::Int(..) | Expr::Real(..) | Expr::Bool(..) | Expr::Str(..) => {}
            Expr::Identifier(name, span) => {
                if !self.context.is_declared_variable(name) {
                    self.error(format!("Variable '{name}' is not declared"), *span);
                } else {
                    self.context.mark_variable_used(name);
                }
            }
            Expr::Binary { left, right, .. } => {
                self.check_expression(left);
                self.check_expression(right);
            }
            Expr::Unary { operand, .. } => self.check_expression(operand),
            Expr::Call(call) => {
                // Expression calls are arity-checked when the name is a
                // known routine; unknown names are left to the generator's
                // surrounding context.
                if self.context.is_declared_routine(&call.name) {
                    self.check_call_arity(call);
                }
                for arg in &call.arguments {
                    self.check_expression(arg);
                }
            }
            Expr::Primary(primary) => {
                if !self.context.is_declared_variable(&primary.base) {
                    self.error(
                        format!("Variable '{}' is not declared", primary.base),
                        primary.span,
                    );
                } else {
                    self.context.mark_variable_used(&primary.base);
                }
                for access in &primary.accesses {
                    if let Access::Index { index, .. } = access {
                        self.check_expression(index);
                    }
                }
            }
            Expr::ArrayLit { elements, .. } => {
                for element in elements {
                    self.check_expression(element);
                }
            }
            Expr::RecordLit { fields, .. } => {
                for field in fields {
                    self.check_expression(&field.value);
                }
            }
        }
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Semantic error at line {line}, column {column}: {message}")]
pub struct SemanticError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl SemanticError {
    pub fn new(message: String, span: Span) -> Self {
        Self {
            line: span.line,
            column: span.column,
            message,
        }
    }
}
