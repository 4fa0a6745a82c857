use std::collections::HashMap;

use rout_analyzer::SymbolContext;
use rout_parser::*;

mod collect;
mod compile_expr;
mod compile_func;
mod compile_stmt;
mod types;

pub(crate) use types::{FuncCtx, VarTypeInfo, WatType};

/// One linear-memory page, the whole address space of a generated module.
const PAGE_SIZE: u32 = 65536;

/// Lowest bump-allocator base; the string table may push it higher.
const MIN_HEAP_BASE: u32 = 256;

/// WAT code generator: compiles the AST into a WebAssembly text module.
///
/// Phases inside [`generate`](WatCodegen::generate):
/// 1. Collect and deduplicate every string literal into the data section.
/// 2. Emit globals for top-level variable declarations.
/// 3. Emit one function per routine, with locals collected up front.
///
/// The generator is reusable: all interning tables and the memory bump
/// counter are reset at the start of each call.
pub struct WatCodegen<'a> {
    context: &'a SymbolContext,
    code: String,

    /// String pool: literal value -> byte offset in the data section
    string_offsets: HashMap<String, u32>,
    /// Interned strings in first-appearance order
    string_order: Vec<String>,
    /// Next free byte in the data section
    string_end: u32,

    /// Bump allocator for aggregate literals
    memory_offset: u32,

    /// Scalar globals with their WAT-level types
    pub(crate) globals: HashMap<String, WatType>,
    /// Names of array-typed globals (these get a `_size` twin)
    pub(crate) global_arrays: Vec<String>,
    /// Declared source types of globals, for field-offset resolution
    pub(crate) global_types: HashMap<String, Type>,

    label_counter: u32,
}

impl<'a> WatCodegen<'a> {
    pub fn new(context: &'a SymbolContext) -> Self {
        Self {
            context,
            code: String::new(),
            string_offsets: HashMap::new(),
            string_order: Vec::new(),
            string_end: 0,
            memory_offset: 0,
            globals: HashMap::new(),
            global_arrays: Vec::new(),
            global_types: HashMap::new(),
            label_counter: 0,
        }
    }

    /// Generate the WAT module for a checked program.
    pub fn generate(&mut self, program: &Program) -> Result<String, CodegenError> {
        self.code.clear();
        self.string_offsets.clear();
        self.string_order.clear();
        self.string_end = 0;
        self.globals.clear();
        self.global_arrays.clear();
        self.global_types.clear();
        self.label_counter = 0;

        self.push("(module");

        // Imports from the JavaScript / host environment
        self.push("  (import \"env\" \"printInt\" (func $printInt (param i32)))");
        self.push("  (import \"env\" \"printFloat\" (func $printFloat (param f64)))");
        self.push("  (import \"env\" \"printString\" (func $printString (param i32)))");
        self.push("  (import \"env\" \"printBool\" (func $printBool (param i32)))");
        self.push("  (import \"env\" \"printNewline\" (func $printNewline))");
        self.push("");

        // One 64 KiB page of linear memory
        self.push("  (memory $memory 1)");
        self.push("  (export \"memory\" (memory $memory))");
        self.push("");

        // String literals occupy the front of memory; aggregates are bump
        // allocated after them
        self.collect_strings(program);
        self.emit_string_data();
        self.memory_offset = MIN_HEAP_BASE.max(align4(self.string_end));

        self.emit_globals(program);

        let mut has_main = false;
        for decl in &program.declarations {
            if let Declaration::Routine(routine) = decl {
                self.compile_routine(routine)?;
                if routine.name == "main" {
                    has_main = true;
                }
            }
        }

        if has_main {
            self.push("  (export \"main\" (func $main))");
        }
        self.push(")");

        if self.memory_offset > PAGE_SIZE {
            return Err(CodegenError::OutOfMemory {
                needed: self.memory_offset,
            });
        }

        Ok(std::mem::take(&mut self.code))
    }

    // ── Output helpers ───────────────────────────────────────

    /// Append one line of module-level text.
    pub(crate) fn push(&mut self, line: &str) {
        self.code.push_str(line);
        self.code.push('\n');
    }

    /// Append one instruction line (function-body indentation).
    pub(crate) fn instr(&mut self, text: &str) {
        self.code.push_str("    ");
        self.code.push_str(text);
        self.code.push('\n');
    }

    pub(crate) fn next_label(&mut self) -> String {
        let label = format!("loop_{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    // ── Strings ──────────────────────────────────────────────

    /// Intern a string literal, returning its data-section offset.
    pub(crate) fn intern_string(&mut self, value: &str) -> u32 {
        if let Some(&offset) = self.string_offsets.get(value) {
            return offset;
        }
        let offset = self.string_end;
        self.string_offsets.insert(value.to_string(), offset);
        self.string_order.push(value.to_string());
        self.string_end += value.len() as u32 + 1; // NUL terminator
        offset
    }

    pub(crate) fn string_offset(&self, value: &str) -> u32 {
        self.string_offsets.get(value).copied().unwrap_or(0)
    }

    fn emit_string_data(&mut self) {
        if self.string_order.is_empty() {
            return;
        }
        self.push("  ;; String literals");
        for value in self.string_order.clone() {
            let offset = self.string_offset(&value);
            let escaped = escape_wat_string(&value);
            self.push(&format!(
                "  (data (i32.const {offset}) \"{escaped}\\00\")"
            ));
        }
        self.push("");
    }

    // ── Globals ──────────────────────────────────────────────

    /// One mutable global per top-level scalar variable; array variables
    /// get a pointer global plus a `_size` twin, both zero until assigned.
    fn emit_globals(&mut self, program: &Program) {
        let mut emitted_any = false;

        for decl in &program.declarations {
            let Declaration::Var(var) = decl else { continue };

            let declared = var.ty.clone();
            if let Some(ty) = &declared {
                self.global_types.insert(var.name.clone(), ty.clone());
            }

            let is_array = declared
                .as_ref()
                .map(|ty| matches!(self.resolve_global_type(ty), Type::Array { .. }))
                .unwrap_or(false);

            if is_array {
                self.push(&format!("  (global ${} (mut i32) (i32.const 0))", var.name));
                self.push(&format!(
                    "  (global ${}_size (mut i32) (i32.const 0))",
                    var.name
                ));
                self.global_arrays.push(var.name.clone());
                emitted_any = true;
                continue;
            }

            let wat = declared
                .as_ref()
                .map(|ty| self.lower_type(ty))
                .or_else(|| var.initializer.as_ref().map(|e| self.infer_literal(e)))
                .unwrap_or(WatType::I32);

            let init = match &var.initializer {
                Some(Expr::Int(v, _)) => {
                    if wat == WatType::F64 {
                        format!("{:?}", *v as f64)
                    } else {
                        v.to_string()
                    }
                }
                Some(Expr::Real(v, _)) => {
                    if wat == WatType::F64 {
                        format!("{v:?}")
                    } else {
                        (*v as i32).to_string()
                    }
                }
                Some(Expr::Bool(v, _)) => (if *v { 1 } else { 0 }).to_string(),
                Some(Expr::Str(s, _)) => self.string_offset(s).to_string(),
                // non-literal initializers fall back to the zero default
                _ => {
                    if wat == WatType::F64 {
                        "0.0".to_string()
                    } else {
                        "0".to_string()
                    }
                }
            };

            self.push(&format!(
                "  (global ${} (mut {}) ({}.const {init}))",
                var.name,
                wat.wat_name(),
                wat.wat_name()
            ));
            self.globals.insert(var.name.clone(), wat);
            emitted_any = true;
        }

        if emitted_any {
            self.push("");
        }
    }

    /// WAT-level type of a literal initializer (globals with no declared type).
    fn infer_literal(&self, expr: &Expr) -> WatType {
        match expr {
            Expr::Real(..) => WatType::F64,
            Expr::Bool(..) => WatType::Bool,
            Expr::Str(..) => WatType::Str,
            _ => WatType::I32,
        }
    }

    // ── Bump allocator ───────────────────────────────────────

    /// Reserve `bytes` of linear memory, returning the base address.
    pub(crate) fn alloc(&mut self, bytes: u32) -> u32 {
        let base = self.memory_offset;
        self.memory_offset += bytes;
        base
    }
}

pub(crate) fn align4(value: u32) -> u32 {
    (value + 3) & !3
}

fn escape_wat_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'\\' => escaped.push_str("\\\\"),
            b'"' => escaped.push_str("\\\""),
            b'\n' => escaped.push_str("\\n"),
            b'\r' => escaped.push_str("\\r"),
            b'\t' => escaped.push_str("\\t"),
            0x20..=0x7e => escaped.push(byte as char),
            other => escaped.push_str(&format!("\\{other:02x}")),
        }
    }
    escaped
}

#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("generated module needs {needed} bytes of linear memory, more than one 64 KiB page")]
    OutOfMemory { needed: u32 },
}
