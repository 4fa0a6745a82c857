use rout_parser::*;

use super::{FuncCtx, WatCodegen, WatType};

impl<'a> WatCodegen<'a> {
    pub(crate) fn compile_expression(&mut self, ctx: &FuncCtx, expr: &Expr) {
        match expr {
            Expr::Int(value, _) => self.instr(&format!("i32.const {value}")),
            Expr::Real(value, _) => self.instr(&format!("f64.const {value:?}")),
            Expr::Bool(value, _) => {
                self.instr(&format!("i32.const {}", if *value { 1 } else { 0 }))
            }
            Expr::Str(value, _) => {
                let offset = self.string_offset(value);
                self.instr(&format!("i32.const {offset}"));
            }
            Expr::Identifier(name, _) => self.emit_get_var(ctx, name),
            Expr::Binary { left, op, right, .. } => self.compile_binary(ctx, left, *op, right),
            Expr::Unary { op, operand, .. } => self.compile_unary(ctx, *op, operand),
            Expr::Call(call) => self.compile_call(ctx, call),
            Expr::Primary(primary) => {
                if primary.accesses.is_empty() {
                    self.emit_get_var(ctx, &primary.base);
                } else {
                    self.emit_access_path(ctx, primary, true);
                }
            }
            Expr::ArrayLit { elements, .. } => self.compile_array_literal(ctx, elements),
            Expr::RecordLit { fields, .. } => self.compile_record_literal(ctx, fields),
        }
    }

    // ── Operators ────────────────────────────────────────────

    fn compile_binary(&mut self, ctx: &FuncCtx, left: &Expr, op: BinaryOp, right: &Expr) {
        // Logical connectives work on the i32 representation directly
        if let BinaryOp::And | BinaryOp::Or = op {
            self.compile_expression(ctx, left);
            self.compile_expression(ctx, right);
            self.instr(if op == BinaryOp::And {
                "i32.and"
            } else {
                "i32.or"
            });
            return;
        }

        // The effective operand type is f64 if either side infers to f64
        let left_ty = self.infer_type(ctx, left);
        let right_ty = self.infer_type(ctx, right);
        let f64_op = left_ty.is_f64() || right_ty.is_f64();

        self.compile_expression(ctx, left);
        if f64_op && !left_ty.is_f64() {
            self.instr("f64.convert_i32_s");
        }
        self.compile_expression(ctx, right);
        if f64_op && !right_ty.is_f64() {
            self.instr("f64.convert_i32_s");
        }

        if op == BinaryOp::Mod {
            if f64_op {
                self.emit_f64_remainder();
            } else {
                self.instr("i32.rem_s");
            }
            return;
        }

        let instruction = if f64_op {
            match op {
                BinaryOp::Add => "f64.add",
                BinaryOp::Sub => "f64.sub",
                BinaryOp::Mul => "f64.mul",
                BinaryOp::Div => "f64.div",
                BinaryOp::Less => "f64.lt",
                BinaryOp::LessEq => "f64.le",
                BinaryOp::Greater => "f64.gt",
                BinaryOp::GreaterEq => "f64.ge",
                BinaryOp::Eq => "f64.eq",
                BinaryOp::NotEq => "f64.ne",
                _ => unreachable!("handled above"),
            }
        } else {
            match op {
                BinaryOp::Add => "i32.add",
                BinaryOp::Sub => "i32.sub",
                BinaryOp::Mul => "i32.mul",
                BinaryOp::Div => "i32.div_s",
                BinaryOp::Less => "i32.lt_s",
                BinaryOp::LessEq => "i32.le_s",
                BinaryOp::Greater => "i32.gt_s",
                BinaryOp::GreaterEq => "i32.ge_s",
                BinaryOp::Eq => "i32.eq",
                BinaryOp::NotEq => "i32.ne",
                _ => unreachable!("handled above"),
            }
        };
        self.instr(instruction);
    }

    /// a % b for f64: a - trunc(a / b) * b, via the two scratch locals.
    fn emit_f64_remainder(&mut self) {
        self.instr("local.set $fmod_b");
        self.instr("local.set $fmod_a");
        self.instr("local.get $fmod_a");
        self.instr("local.get $fmod_a");
        self.instr("local.get $fmod_b");
        self.instr("f64.div");
        self.instr("f64.trunc");
        self.instr("local.get $fmod_b");
        self.instr("f64.mul");
        self.instr("f64.sub");
    }

    fn compile_unary(&mut self, ctx: &FuncCtx, op: UnaryOp, operand: &Expr) {
        match op {
            UnaryOp::Not => {
                self.compile_expression(ctx, operand);
                self.instr("i32.eqz");
            }
            UnaryOp::Neg => {
                if self.infer_type(ctx, operand).is_f64() {
                    self.compile_expression(ctx, operand);
                    self.instr("f64.neg");
                } else {
                    // i32 has no neg instruction
                    self.instr("i32.const 0");
                    self.compile_expression(ctx, operand);
                    self.instr("i32.sub");
                }
            }
        }
    }

    // ── Calls ────────────────────────────────────────────────

    pub(crate) fn compile_call(&mut self, ctx: &FuncCtx, call: &RoutineCall) {
        let param_types: Vec<Option<WatType>> = match self.context.routine_info(&call.name) {
            Some(info) => info
                .parameters
                .iter()
                .map(|p| Some(self.lower_type(&p.ty)))
                .collect(),
            None => Vec::new(),
        };

        for (index, arg) in call.arguments.iter().enumerate() {
            let inferred = self.infer_type(ctx, arg);
            self.compile_expression(ctx, arg);
            if let Some(Some(expected)) = param_types.get(index) {
                self.emit_conversion(inferred, *expected);
            }
        }
        self.instr(&format!("call ${}", call.name));
    }

    // ── Aggregate literals ───────────────────────────────────

    /// `[e1..eN]`: a header word holding N, then N element words. The value
    /// of the expression is the header pointer.
    fn compile_array_literal(&mut self, ctx: &FuncCtx, elements: &[Expr]) {
        if elements.is_empty() {
            self.instr("i32.const 0");
            return;
        }

        let count = elements.len() as u32;
        let base = self.alloc(4 + 4 * count);

        self.instr(&format!("i32.const {base}"));
        self.instr(&format!("i32.const {count}"));
        self.instr("i32.store");

        for (index, element) in elements.iter().enumerate() {
            let address = base + 4 + 4 * index as u32;
            self.instr(&format!("i32.const {address}"));
            let inferred = self.infer_type(ctx, element);
            self.compile_expression(ctx, element);
            self.emit_conversion(inferred, WatType::I32);
            self.instr("i32.store");
        }

        self.instr(&format!("i32.const {base}"));
    }

    /// `{f1: v1, .., fk: vk}`: k words in declaration order, no header. The
    /// value of the expression is the base pointer.
    fn compile_record_literal(&mut self, ctx: &FuncCtx, fields: &[RecordField]) {
        if fields.is_empty() {
            self.instr("i32.const 0");
            return;
        }

        let base = self.alloc(4 * fields.len() as u32);

        for (index, field) in fields.iter().enumerate() {
            let address = base + 4 * index as u32;
            self.instr(&format!("i32.const {address}"));
            let inferred = self.infer_type(ctx, &field.value);
            self.compile_expression(ctx, &field.value);
            self.emit_conversion(inferred, WatType::I32);
            self.instr("i32.store");
        }

        self.instr(&format!("i32.const {base}"));
    }

    // ── Access chains ────────────────────────────────────────

    /// Emit the address computation for a base-plus-accesses chain.
    /// With `load_final` the value of the last cell is loaded; without it
    /// the address is left on the stack for a store.
    ///
    /// Layout rules: arrays are 1-indexed with the element count in the
    /// header word (`base + 4 + (i - 1) * 4`); record fields sit at 4-byte
    /// offsets in declaration order; `.size` on an array loads the header.
    pub(crate) fn emit_access_path(
        &mut self,
        ctx: &FuncCtx,
        primary: &ModifiablePrimary,
        load_final: bool,
    ) {
        self.emit_get_var(ctx, &primary.base);

        let mut current: Option<Type> = self.declared_type(ctx, &primary.base).cloned();

        for (position, access) in primary.accesses.iter().enumerate() {
            let last = position + 1 == primary.accesses.len();
            let resolved: Option<Type> = current
                .as_ref()
                .map(|ty| self.resolve_type(ctx, ty).clone());

            match access {
                Access::Field { name, .. } => {
                    let record_field = match &resolved {
                        Some(Type::Record { fields, .. }) => fields
                            .iter()
                            .position(|f| &f.name == name)
                            .map(|idx| (idx, fields[idx].ty.clone())),
                        _ => None,
                    };

                    match record_field {
                        Some((field_index, field_ty)) => {
                            self.instr(&format!("i32.const {}", 4 * field_index as u32));
                            self.instr("i32.add");
                            current = field_ty;
                        }
                        None if name == "size" => {
                            // array header word
                            self.instr("i32.load");
                            current = None;
                            continue;
                        }
                        None => {
                            // unknown layout: offset 0
                            self.instr("i32.const 0");
                            self.instr("i32.add");
                            current = None;
                        }
                    }
                }
                Access::Index { index, .. } => {
                    self.instr("i32.const 4");
                    self.instr("i32.add");
                    let inferred = self.infer_type(ctx, index);
                    self.compile_expression(ctx, index);
                    self.emit_conversion(inferred, WatType::I32);
                    self.instr("i32.const 1");
                    self.instr("i32.sub");
                    self.instr("i32.const 4");
                    self.instr("i32.mul");
                    self.instr("i32.add");
                    current = match resolved {
                        Some(Type::Array { element, .. }) => Some(*element),
                        _ => None,
                    };
                }
            }

            if !last {
                // the cell holds a pointer to the nested aggregate
                self.instr("i32.load");
            } else if load_final {
                self.instr("i32.load");
            }
        }
    }

    // ── Variable access and conversions ──────────────────────

    /// Read a variable. Locals and parameters shadow globals; an unknown
    /// name degrades to zero (cannot happen on a checked tree).
    pub(crate) fn emit_get_var(&mut self, ctx: &FuncCtx, name: &str) {
        if ctx.knows(name) {
            self.instr(&format!("local.get ${name}"));
        } else if self.globals.contains_key(name) || self.global_arrays.iter().any(|g| g == name) {
            self.instr(&format!("global.get ${name}"));
        } else {
            self.instr("i32.const 0");
        }
    }

    pub(crate) fn emit_set_var(&mut self, ctx: &FuncCtx, name: &str) {
        if ctx.knows(name) {
            self.instr(&format!("local.set ${name}"));
        } else if self.globals.contains_key(name) || self.global_arrays.iter().any(|g| g == name) {
            self.instr(&format!("global.set ${name}"));
        } else {
            self.instr("drop");
        }
    }

    /// WAT-level type of a variable as an assignment target.
    pub(crate) fn var_wat_type(&self, ctx: &FuncCtx, name: &str) -> WatType {
        if let Some(info) = ctx.var_types.get(name) {
            info.wat
        } else if let Some(&wat) = self.globals.get(name) {
            wat
        } else {
            WatType::I32
        }
    }

    /// Numeric conversion between the i32 and f64 stack classes; bool and
    /// string share the i32 class, so only the int/real pair converts.
    pub(crate) fn emit_conversion(&mut self, from: WatType, to: WatType) {
        if from.is_f64() && !to.is_f64() {
            self.instr("i32.trunc_f64_s");
        } else if !from.is_f64() && to.is_f64() {
            self.instr("f64.convert_i32_s");
        }
    }
}
