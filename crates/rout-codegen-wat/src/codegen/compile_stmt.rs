use rout_parser::*;

use super::{FuncCtx, WatCodegen, WatType};

impl<'a> WatCodegen<'a> {
    pub(crate) fn compile_statement(&mut self, ctx: &FuncCtx, stmt: &Statement) {
        match stmt {
            Statement::Assignment(a) => self.compile_assignment(ctx, a),
            Statement::Print(p) => self.compile_print(ctx, p),
            Statement::If(i) => self.compile_if(ctx, i),
            Statement::While(w) => self.compile_while(ctx, w),
            Statement::For(f) => match &f.source {
                ForSource::Range { start, end } => self.compile_for_range(ctx, f, start, end),
                ForSource::Each { array, .. } => self.compile_for_each(ctx, f, array),
            },
            Statement::RoutineCall(call) => {
                self.compile_call(ctx, call);
                // a value-returning routine used as a statement leaves its
                // result on the stack
                let returns_value = self
                    .context
                    .routine_info(&call.name)
                    .is_some_and(|info| info.return_type.is_some());
                if returns_value {
                    self.instr("drop");
                }
            }
            Statement::Return(ret) => {
                if let Some(value) = &ret.value {
                    let inferred = self.infer_type(ctx, value);
                    self.compile_expression(ctx, value);
                    if let Some(expected) = ctx.return_type {
                        self.emit_conversion(inferred, expected);
                    }
                }
                self.instr("return");
            }
        }
    }

    // ── Assignment ───────────────────────────────────────────

    fn compile_assignment(&mut self, ctx: &FuncCtx, assignment: &Assignment) {
        let target = &assignment.target;

        if target.accesses.is_empty() {
            let target_wat = self.var_wat_type(ctx, &target.base);
            let inferred = self.infer_type(ctx, &assignment.value);

            self.compile_expression(ctx, &assignment.value);
            self.emit_conversion(inferred, target_wat);
            self.emit_set_var(ctx, &target.base);

            // Assigning an array literal to an array global also records
            // its element count in the `_size` twin
            if !ctx.knows(&target.base) && self.global_arrays.contains(&target.base) {
                if let Expr::ArrayLit { elements, .. } = &assignment.value {
                    self.instr(&format!("i32.const {}", elements.len()));
                    self.instr(&format!("global.set ${}_size", target.base));
                }
            }
            return;
        }

        // Compound target: evaluate the value into $temp, compute the cell
        // address, then store
        let inferred = self.infer_type(ctx, &assignment.value);
        self.compile_expression(ctx, &assignment.value);
        self.emit_conversion(inferred, WatType::I32);
        self.instr("local.set $temp");

        self.emit_access_path(ctx, target, false);

        self.instr("local.get $temp");
        self.instr("i32.store");
    }

    // ── Print ────────────────────────────────────────────────

    fn compile_print(&mut self, ctx: &FuncCtx, print: &PrintStmt) {
        for expr in &print.expressions {
            self.compile_expression(ctx, expr);
            let import = match self.infer_type(ctx, expr) {
                WatType::F64 => "$printFloat",
                WatType::Str => "$printString",
                WatType::Bool => "$printBool",
                WatType::I32 => "$printInt",
            };
            self.instr(&format!("call {import}"));
        }
        self.instr("call $printNewline");
    }

    // ── Control flow ─────────────────────────────────────────

    fn compile_if(&mut self, ctx: &FuncCtx, if_stmt: &IfStmt) {
        self.compile_expression(ctx, &if_stmt.condition);
        self.instr("if");
        self.compile_body(ctx, &if_stmt.then_branch);
        if let Some(else_branch) = &if_stmt.else_branch {
            self.instr("else");
            self.compile_body(ctx, else_branch);
        }
        self.instr("end");
    }

    fn compile_while(&mut self, ctx: &FuncCtx, while_loop: &WhileLoop) {
        let label = self.next_label();

        self.instr(&format!("block ${label}_end"));
        self.instr(&format!("loop ${label}_start"));

        self.compile_expression(ctx, &while_loop.condition);
        self.instr("i32.eqz");
        self.instr(&format!("br_if ${label}_end"));

        self.compile_body(ctx, &while_loop.body);

        self.instr(&format!("br ${label}_start"));
        self.instr("end");
        self.instr("end");
    }

    fn compile_for_range(&mut self, ctx: &FuncCtx, for_loop: &ForLoop, start: &Expr, end: &Expr) {
        let label = self.next_label();
        let var = &for_loop.variable;

        let start_ty = self.infer_type(ctx, start);
        self.compile_expression(ctx, start);
        self.emit_conversion(start_ty, WatType::I32);
        self.instr(&format!("local.set ${var}"));

        self.instr(&format!("block ${label}_end"));
        self.instr(&format!("loop ${label}_start"));

        // Forward loops exit when var > end, reverse loops when var < end
        self.instr(&format!("local.get ${var}"));
        let end_ty = self.infer_type(ctx, end);
        self.compile_expression(ctx, end);
        self.emit_conversion(end_ty, WatType::I32);
        if for_loop.reverse {
            self.instr("i32.lt_s");
        } else {
            self.instr("i32.gt_s");
        }
        self.instr(&format!("br_if ${label}_end"));

        self.compile_body(ctx, &for_loop.body);

        self.instr(&format!("local.get ${var}"));
        self.instr("i32.const 1");
        if for_loop.reverse {
            self.instr("i32.sub");
        } else {
            self.instr("i32.add");
        }
        self.instr(&format!("local.set ${var}"));

        self.instr(&format!("br ${label}_start"));
        self.instr("end");
        self.instr("end");
    }

    /// For-each over an array: the element count sits in the header word,
    /// elements are 1-indexed behind it.
    fn compile_for_each(&mut self, ctx: &FuncCtx, for_loop: &ForLoop, array: &str) {
        let label = self.next_label();
        let var = &for_loop.variable;
        let idx = format!("{var}_idx");
        let size = format!("{var}_size");

        // size <- header word
        self.emit_get_var(ctx, array);
        self.instr("i32.load");
        self.instr(&format!("local.set ${size}"));

        // idx <- 1
        self.instr("i32.const 1");
        self.instr(&format!("local.set ${idx}"));

        self.instr(&format!("block ${label}_end"));
        self.instr(&format!("loop ${label}_start"));

        // exit when idx > size
        self.instr(&format!("local.get ${idx}"));
        self.instr(&format!("local.get ${size}"));
        self.instr("i32.gt_s");
        self.instr(&format!("br_if ${label}_end"));

        // var <- element at base + 4 + (idx - 1) * 4
        self.emit_get_var(ctx, array);
        self.instr("i32.const 4");
        self.instr("i32.add");
        self.instr(&format!("local.get ${idx}"));
        self.instr("i32.const 1");
        self.instr("i32.sub");
        self.instr("i32.const 4");
        self.instr("i32.mul");
        self.instr("i32.add");
        self.instr("i32.load");
        self.instr(&format!("local.set ${var}"));

        self.compile_body(ctx, &for_loop.body);

        self.instr(&format!("local.get ${idx}"));
        self.instr("i32.const 1");
        self.instr("i32.add");
        self.instr(&format!("local.set ${idx}"));

        self.instr(&format!("br ${label}_start"));
        self.instr("end");
        self.instr("end");
    }
}
