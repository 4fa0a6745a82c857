use std::collections::HashMap;

use rout_parser::*;

use super::WatCodegen;

/// WAT-level value categories. `Bool` and `Str` share the i32
/// representation but select different print imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WatType {
    I32,
    F64,
    Bool,
    Str,
}

impl WatType {
    pub(crate) fn wat_name(self) -> &'static str {
        match self {
            WatType::F64 => "f64",
            _ => "i32",
        }
    }

    /// Whether the value sits in an f64 stack slot.
    pub(crate) fn is_f64(self) -> bool {
        self == WatType::F64
    }
}

/// Declared type information for one variable inside a function.
#[derive(Debug, Clone)]
pub(crate) struct VarTypeInfo {
    pub wat: WatType,
    /// Declared source type, kept for record-field and array-element layout
    pub decl: Option<Type>,
}

/// Per-function compilation context: parameters, collected locals, and the
/// declared types used to resolve access chains.
pub(crate) struct FuncCtx {
    pub params: Vec<String>,
    /// Locals in declaration order (helper locals included)
    pub locals: Vec<(String, WatType)>,
    pub var_types: HashMap<String, VarTypeInfo>,
    /// Type aliases declared inside this routine's body
    pub local_types: HashMap<String, Type>,
    pub return_type: Option<WatType>,
    /// Whether the function contains a real-typed modulo (needs f64 scratch)
    pub needs_fmod_temps: bool,
}

impl FuncCtx {
    pub fn new() -> Self {
        Self {
            params: Vec::new(),
            locals: Vec::new(),
            var_types: HashMap::new(),
            local_types: HashMap::new(),
            return_type: None,
            needs_fmod_temps: false,
        }
    }

    pub fn is_param(&self, name: &str) -> bool {
        self.params.iter().any(|p| p == name)
    }

    pub fn is_local(&self, name: &str) -> bool {
        self.locals.iter().any(|(n, _)| n == name)
    }

    pub fn knows(&self, name: &str) -> bool {
        self.is_param(name) || self.is_local(name)
    }

    pub fn add_local(&mut self, name: &str, wat: WatType, decl: Option<Type>) {
        if self.knows(name) {
            return;
        }
        self.locals.push((name.to_string(), wat));
        self.var_types
            .insert(name.to_string(), VarTypeInfo { wat, decl });
    }
}

fn lower_resolved(resolved: &Type) -> WatType {
    match resolved {
        Type::Primitive(PrimitiveKind::Integer, _) => WatType::I32,
        Type::Primitive(PrimitiveKind::Real, _) => WatType::F64,
        Type::Primitive(PrimitiveKind::Boolean, _) => WatType::Bool,
        Type::Primitive(PrimitiveKind::String, _) => WatType::Str,
        Type::Array { .. } | Type::Record { .. } | Type::User { .. } => WatType::I32,
    }
}

impl<'a> WatCodegen<'a> {
    // ── Type lowering ────────────────────────────────────────

    /// integer, boolean -> i32; real -> f64; string, arrays, records -> i32
    /// pointers. User types are resolved through the symbol context.
    pub(crate) fn lower_type(&self, ty: &Type) -> WatType {
        lower_resolved(self.resolve_global_type(ty))
    }

    /// Like [`lower_type`], but aware of the routine's local type aliases.
    pub(crate) fn lower_type_in(&self, ctx: &FuncCtx, ty: &Type) -> WatType {
        lower_resolved(self.resolve_type(ctx, ty))
    }

    /// Resolve type aliases through the global symbol context. A bounded
    /// walk: malformed alias cycles give up and fall back to i32 lowering.
    pub(crate) fn resolve_global_type<'t>(&'t self, ty: &'t Type) -> &'t Type {
        let mut current = ty;
        for _ in 0..32 {
            match current {
                Type::User { name, .. } => match self.context.resolve_type(name) {
                    Some(aliased) => current = aliased,
                    None => return current,
                },
                _ => return current,
            }
        }
        current
    }

    /// Like [`resolve_global_type`], but checks the routine's local type
    /// aliases before the global ones.
    pub(crate) fn resolve_type<'t>(&'t self, ctx: &'t FuncCtx, ty: &'t Type) -> &'t Type {
        let mut current = ty;
        for _ in 0..32 {
            match current {
                Type::User { name, .. } => {
                    if let Some(aliased) = ctx.local_types.get(name) {
                        current = aliased;
                    } else if let Some(aliased) = self.context.resolve_type(name) {
                        current = aliased;
                    } else {
                        return current;
                    }
                }
                _ => return current,
            }
        }
        current
    }

    // ── Expression type inference ────────────────────────────

    /// Infer the WAT-level result type of an expression. Access chains
    /// produce i32 (aggregate cells are 4-byte words).
    pub(crate) fn infer_type(&self, ctx: &FuncCtx, expr: &Expr) -> WatType {
        match expr {
            Expr::Int(..) => WatType::I32,
            Expr::Real(..) => WatType::F64,
            Expr::Bool(..) => WatType::Bool,
            Expr::Str(..) => WatType::Str,
            Expr::Identifier(name, _) => {
                if let Some(info) = ctx.var_types.get(name) {
                    info.wat
                } else if let Some(&wat) = self.globals.get(name) {
                    wat
                } else {
                    WatType::I32
                }
            }
            Expr::Binary { left, op, right, .. } => match op {
                BinaryOp::Less
                | BinaryOp::LessEq
                | BinaryOp::Greater
                | BinaryOp::GreaterEq
                | BinaryOp::Eq
                | BinaryOp::NotEq => WatType::Bool,
                BinaryOp::And | BinaryOp::Or => WatType::Bool,
                _ => {
                    if self.infer_type(ctx, left).is_f64() || self.infer_type(ctx, right).is_f64() {
                        WatType::F64
                    } else {
                        WatType::I32
                    }
                }
            },
            Expr::Unary { op, operand, .. } => match op {
                UnaryOp::Not => WatType::Bool,
                UnaryOp::Neg => self.infer_type(ctx, operand),
            },
            Expr::Call(call) => self
                .context
                .routine_info(&call.name)
                .and_then(|info| info.return_type.as_ref())
                .map(|ty| self.lower_type(ty))
                .unwrap_or(WatType::I32),
            Expr::Primary(_) => WatType::I32,
            Expr::ArrayLit { .. } | Expr::RecordLit { .. } => WatType::I32,
        }
    }

    /// Declared source type of a variable, from the function context or the
    /// global table.
    pub(crate) fn declared_type<'t>(&'t self, ctx: &'t FuncCtx, name: &str) -> Option<&'t Type> {
        if let Some(info) = ctx.var_types.get(name) {
            return info.decl.as_ref();
        }
        self.global_types.get(name)
    }
}
