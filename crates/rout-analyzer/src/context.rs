use std::collections::HashMap;

use rout_lexer::Span;
use rout_parser::{Parameter, Type};

use crate::analyzer::SemanticError;

/// Information about a declared variable
#[derive(Debug, Clone)]
pub struct VarInfo {
    pub name: String,
    pub ty: Option<Type>,
    pub span: Span,
    pub used: bool,
}

/// Information about a declared routine
#[derive(Debug, Clone)]
pub struct RoutineInfo {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<Type>,
    pub span: Span,
}

/// Symbol tables and analysis context.
///
/// Variable scopes and type scopes nest together; routines live in one flat
/// table because they are only declared at program top level. The global
/// scope is never popped, so type aliases and routine signatures remain
/// resolvable during code generation.
pub struct SymbolContext {
    scopes: Vec<HashMap<String, VarInfo>>,
    type_scopes: Vec<HashMap<String, Type>>,
    routines: HashMap<String, RoutineInfo>,
    current_routine: Option<String>,
    in_loop: bool,
}

impl SymbolContext {
    pub fn new() -> Self {
        Self {
            // Global scope and global type scope
            scopes: vec![HashMap::new()],
            type_scopes: vec![HashMap::new()],
            routines: HashMap::new(),
            current_routine: None,
            in_loop: false,
        }
    }

    // ── Scope management ─────────────────────────────────────

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
        self.type_scopes.push(HashMap::new());
    }

    /// Pop the innermost scope and return its never-used variables.
    /// The global scope is never popped.
    pub fn exit_scope(&mut self) -> Vec<VarInfo> {
        let mut unused = Vec::new();
        if self.scopes.len() > 1 {
            let scope = self.scopes.pop().unwrap();
            let mut vars: Vec<VarInfo> = scope.into_values().filter(|v| !v.used).collect();
            vars.sort_by_key(|v| (v.span.line, v.span.column));
            unused = vars;
        }
        if self.type_scopes.len() > 1 {
            self.type_scopes.pop();
        }
        unused
    }

    pub fn enter_routine(&mut self, name: &str) {
        self.current_routine = Some(name.to_string());
        self.enter_scope();
    }

    pub fn exit_routine(&mut self) -> Vec<VarInfo> {
        self.current_routine = None;
        self.exit_scope()
    }

    pub fn enter_loop(&mut self) {
        self.in_loop = true;
    }

    pub fn exit_loop(&mut self) {
        self.in_loop = false;
    }

    pub fn is_in_loop(&self) -> bool {
        self.in_loop
    }

    pub fn is_in_routine(&self) -> bool {
        self.current_routine.is_some()
    }

    pub fn current_routine(&self) -> Option<&str> {
        self.current_routine.as_deref()
    }

    /// Current nesting depth (1 = only the global scope). Used to check the
    /// scope-restoration property in tests.
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    // ── Variables ────────────────────────────────────────────

    pub fn declare_variable(
        &mut self,
        name: &str,
        ty: Option<Type>,
        span: Span,
    ) -> Result<(), SemanticError> {
        let current = self.scopes.last_mut().unwrap();
        if current.contains_key(name) {
            return Err(SemanticError::new(
                format!("Variable '{name}' is already declared in this scope"),
                span,
            ));
        }
        current.insert(
            name.to_string(),
            VarInfo {
                name: name.to_string(),
                ty,
                span,
                used: false,
            },
        );
        Ok(())
    }

    /// Walk the scope stack inside-out for a variable.
    pub fn is_declared_variable(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|s| s.contains_key(name))
    }

    pub fn variable_info(&self, name: &str) -> Option<&VarInfo> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }

    pub fn variable_type(&self, name: &str) -> Option<&Type> {
        self.variable_info(name).and_then(|info| info.ty.as_ref())
    }

    pub fn mark_variable_used(&mut self, name: &str) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(info) = scope.get_mut(name) {
                info.used = true;
                return;
            }
        }
    }

    /// Never-used variables of the innermost scope, in declaration order.
    pub fn unused_in_current_scope(&self) -> Vec<VarInfo> {
        let mut vars: Vec<VarInfo> = self
            .scopes
            .last()
            .unwrap()
            .values()
            .filter(|v| !v.used)
            .cloned()
            .collect();
        vars.sort_by_key(|v| (v.span.line, v.span.column));
        vars
    }

    // ── Routines ─────────────────────────────────────────────

    pub fn declare_routine(
        &mut self,
        name: &str,
        parameters: Vec<Parameter>,
        return_type: Option<Type>,
        span: Span,
    ) -> Result<(), SemanticError> {
        if self.routines.contains_key(name) {
            return Err(SemanticError::new(
                format!("Routine '{name}' is already declared"),
                span,
            ));
        }
        self.routines.insert(
            name.to_string(),
            RoutineInfo {
                name: name.to_string(),
                parameters,
                return_type,
                span,
            },
        );
        Ok(())
    }

    pub fn is_declared_routine(&self, name: &str) -> bool {
        self.routines.contains_key(name)
    }

    pub fn routine_info(&self, name: &str) -> Option<&RoutineInfo> {
        self.routines.get(name)
    }

    // ── Types ────────────────────────────────────────────────

    pub fn declare_type(&mut self, name: &str, ty: Type, span: Span) -> Result<(), SemanticError> {
        let current = self.type_scopes.last_mut().unwrap();
        if current.contains_key(name) {
            return Err(SemanticError::new(
                format!("Type '{name}' is already declared"),
                span,
            ));
        }
        current.insert(name.to_string(), ty);
        Ok(())
    }

    pub fn is_declared_type(&self, name: &str) -> bool {
        self.type_scopes.iter().rev().any(|s| s.contains_key(name))
    }

    /// Walk the type-scope stack inside-out for an alias.
    pub fn resolve_type(&self, name: &str) -> Option<&Type> {
        self.type_scopes.iter().rev().find_map(|s| s.get(name))
    }
}

impl Default for SymbolContext {
    fn default() -> Self {
        Self::new()
    }
}
