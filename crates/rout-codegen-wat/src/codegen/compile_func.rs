use rout_parser::*;

use super::{CodegenError, FuncCtx, VarTypeInfo, WatCodegen, WatType};

impl<'a> WatCodegen<'a> {
    /// Compile one routine declaration into a `(func ...)` entry.
    pub(crate) fn compile_routine(&mut self, routine: &RoutineDecl) -> Result<(), CodegenError> {
        let mut ctx = FuncCtx::new();

        for param in &routine.parameters {
            ctx.params.push(param.name.clone());
            ctx.var_types.insert(
                param.name.clone(),
                VarTypeInfo {
                    wat: self.lower_type(&param.ty),
                    decl: Some(param.ty.clone()),
                },
            );
        }
        ctx.return_type = routine.return_type.as_ref().map(|ty| self.lower_type(ty));

        if let Some(body) = &routine.body {
            self.collect_locals(&mut ctx, body);
            ctx.needs_fmod_temps = self.scan_real_mod_body(&ctx, body);
        } else if let Some(expr) = &routine.expression_body {
            ctx.needs_fmod_temps = self.scan_real_mod_expr(&ctx, expr);
        }

        // Signature
        let mut signature = format!("  (func ${}", routine.name);
        for param in &routine.parameters {
            let wat = self.lower_type(&param.ty);
            signature.push_str(&format!(" (param ${} {})", param.name, wat.wat_name()));
        }
        if let Some(wat) = ctx.return_type {
            signature.push_str(&format!(" (result {})", wat.wat_name()));
        }
        self.push(&signature);

        // Locals, helpers last
        for (name, wat) in &ctx.locals {
            self.instr(&format!("(local ${name} {})", wat.wat_name()));
        }
        if !ctx.knows("temp") {
            self.instr("(local $temp i32)");
        }
        if ctx.needs_fmod_temps {
            self.instr("(local $fmod_a f64)");
            self.instr("(local $fmod_b f64)");
        }

        if let Some(body) = &routine.body {
            self.compile_body(&ctx, body);

            // A value-returning body must not fall off the end
            if ctx.return_type.is_some() && !ends_with_return(body) {
                self.instr("unreachable");
            }
        } else if let Some(expr) = &routine.expression_body {
            let inferred = self.infer_type(&ctx, expr);
            self.compile_expression(&ctx, expr);
            match ctx.return_type {
                Some(expected) => self.emit_conversion(inferred, expected),
                None => self.instr("drop"),
            }
        }

        self.push("  )");
        self.push("");
        Ok(())
    }

    /// Emit a body's declarations and statements in source order.
    pub(crate) fn compile_body(&mut self, ctx: &FuncCtx, body: &Body) {
        for element in &body.elements {
            match element {
                BodyElement::Declaration(Declaration::Var(v)) => {
                    self.compile_var_init(ctx, v);
                }
                BodyElement::Declaration(_) => {}
                BodyElement::Statement(stmt) => self.compile_statement(ctx, stmt),
            }
        }
    }

    /// A body-level variable declaration: evaluate the initializer into the
    /// collected local (locals default to zero otherwise).
    fn compile_var_init(&mut self, ctx: &FuncCtx, var: &VarDecl) {
        let Some(init) = &var.initializer else { return };

        let target = ctx
            .var_types
            .get(&var.name)
            .map(|info| info.wat)
            .unwrap_or(WatType::I32);
        let inferred = self.infer_type(ctx, init);

        self.compile_expression(ctx, init);
        self.emit_conversion(inferred, target);
        self.emit_set_var(ctx, &var.name);
    }
}

/// Whether the last element of a body is a return statement.
fn ends_with_return(body: &Body) -> bool {
    matches!(
        body.elements.last(),
        Some(BodyElement::Statement(Statement::Return(_)))
    )
}
