//! The main type checker implementation.
//!
//! Checking runs in two passes over the program: declarations first, so every
//! type, variant, field and function signature is known, then bodies. Errors
//! are accumulated and checking continues with [`TypeRef::Unknown`] wherever a
//! rule fails.

mod access;
mod control_flow;
mod declarations;
mod expr;
mod operators;
mod pattern;
mod resolve;

use indexmap::IndexMap;
use miette::SourceSpan;
use reef_syntax::ast::Ident;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::def_id::DefId;
use crate::definitions::{Definitions, FunctionDef, FunctionKind, FunctionOwner, Variable, VariableKind, VariantKind};
use crate::error::TypeCheckerError;
use crate::inference::InferenceTable;
use crate::typed::TypedProgram;
use crate::types::{FunctionId, GenericParam, TypeDefId, TypeRef, VariableId};
use crate::TypeCheckResult;

pub(crate) use resolve::InstantiationCache;

/// One lexical scope.
#[derive(Debug, Default)]
pub(crate) struct Scope {
    pub(crate) variables: FxHashMap<String, VariableId>,
    pub(crate) functions: FxHashMap<String, FunctionId>,
    pub(crate) generics: FxHashMap<String, GenericParam>,
}

/// What the checker knows about the function whose body it is in.
#[derive(Debug, Clone)]
pub(crate) struct FunctionContext {
    pub(crate) function: FunctionId,
    pub(crate) return_type: TypeRef,
    /// The class or union whose members are in scope unqualified
    pub(crate) owner_type: Option<TypeDefId>,
    pub(crate) is_static: bool,
    pub(crate) is_mutable: bool,
    pub(crate) loop_depth: u32,
    /// `this` as seen from this function. Local functions see the enclosing one.
    pub(crate) this_variable: Option<VariableId>,
}

/// The main structure orchestrating the type checking process.
pub(crate) struct TypeChecker {
    pub(crate) module_id: String,
    pub(crate) defs: Definitions,
    pub(crate) table: InferenceTable,
    /// Built-in and user types by name
    pub(crate) type_names: IndexMap<String, TypeDefId>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) context: FunctionContext,
    /// Contexts of the functions enclosing `context`, outermost first
    pub(crate) enclosing: Vec<FunctionContext>,
    /// Variables definitely assigned at the current point
    pub(crate) instantiated: FxHashSet<VariableId>,
    pub(crate) cache: InstantiationCache,
    pub(crate) errors: Vec<TypeCheckerError>,
    pub(crate) main: FunctionId,
    pub(crate) classes: Vec<TypeDefId>,
    pub(crate) unions: Vec<TypeDefId>,
    pub(crate) functions: Vec<FunctionId>,
}

impl TypeChecker {
    pub(crate) fn new(module_id: &str) -> Self {
        let mut defs = Definitions::with_builtins();
        let type_names = defs
            .types
            .iter()
            .enumerate()
            .filter(|(_, ty)| ty.name != "!")
            .map(|(index, ty)| (ty.name.clone(), TypeDefId(index as u32)))
            .collect();

        let main = FunctionId(defs.functions.len() as u32);
        defs.functions.push(FunctionDef {
            id: DefId::main(module_id),
            name: "_Main".to_owned(),
            kind: FunctionKind::Main,
            owner: FunctionOwner::Global,
            type_parameters: Vec::new(),
            parameters: Vec::new(),
            return_type: TypeRef::unit(),
            is_static: true,
            is_mutable: false,
            is_public: false,
            this_variable: None,
            locals: Vec::new(),
            local_functions: Vec::new(),
            accessed_outer_variables: Vec::new(),
            body: Vec::new(),
            span: None,
        });

        // `ok` and `error` construct results and live in the root scope.
        let mut root = Scope::default();
        if let Some(variants) = defs.union_variants(TypeDefId::RESULT) {
            for variant in variants {
                if let VariantKind::Tuple { create_function, .. } = variant.kind {
                    root.functions.insert(variant.name.to_lowercase(), create_function);
                }
            }
        }

        Self {
            module_id: module_id.to_owned(),
            defs,
            table: InferenceTable::new(),
            type_names,
            scopes: vec![root],
            context: FunctionContext {
                function: main,
                return_type: TypeRef::unit(),
                owner_type: None,
                is_static: true,
                is_mutable: false,
                loop_depth: 0,
                this_variable: None,
            },
            enclosing: Vec::new(),
            instantiated: FxHashSet::default(),
            cache: InstantiationCache::default(),
            errors: Vec::new(),
            main,
            classes: Vec::new(),
            unions: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Records a type error.
    pub(crate) fn report_error(&mut self, error: TypeCheckerError) {
        log::debug!("type error: {error}");
        self.errors.push(error);
    }

    /// Runs `f` inside a fresh lexical scope. The scope is popped on return.
    pub(crate) fn with_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scopes.push(Scope::default());
        let result = f(self);
        self.scopes.pop();
        result
    }

    /// Runs `f` with `context` as the current function.
    pub(crate) fn with_function<R>(&mut self, context: FunctionContext, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = std::mem::replace(&mut self.context, context);
        self.enclosing.push(previous);
        let result = f(self);
        if let Some(previous) = self.enclosing.pop() {
            self.context = previous;
        }
        result
    }

    pub(crate) fn current_scope(&mut self) -> &mut Scope {
        if self.scopes.is_empty() {
            self.scopes.push(Scope::default());
        }
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub(crate) fn lookup_variable(&self, name: &str) -> Option<VariableId> {
        self.scopes.iter().rev().find_map(|s| s.variables.get(name).copied())
    }

    pub(crate) fn lookup_function(&self, name: &str) -> Option<FunctionId> {
        self.scopes.iter().rev().find_map(|s| s.functions.get(name).copied())
    }

    pub(crate) fn lookup_generic(&self, name: &str) -> Option<GenericParam> {
        self.scopes.iter().rev().find_map(|s| s.generics.get(name).cloned())
    }

    /// Declares a local of the current function in the innermost scope.
    ///
    /// Returns `None`, after reporting, when a variable of the same name is
    /// already visible.
    pub(crate) fn declare_variable(&mut self, name: &Ident, ty: TypeRef, mutable: bool) -> Option<VariableId> {
        if self.lookup_variable(&name.name).is_some() {
            self.report_error(TypeCheckerError::DuplicateVariableDeclaration {
                name: name.name.clone(),
                span: name.span,
            });
            return None;
        }
        let function = self.context.function;
        let id = self.defs.add_variable(Variable {
            name: name.name.clone(),
            ty,
            kind: VariableKind::Local { function },
            mutable,
            referenced_in_closure: false,
            span: name.span,
        });
        self.defs.function_mut(function).locals.push(id);
        self.current_scope().variables.insert(name.name.clone(), id);
        log::trace!("declared local '{}' as {:?}", name.name, id);
        Some(id)
    }

    /// Records that the current function reads or writes `variable`.
    ///
    /// Every function between the current one and the variable's owner
    /// captures it. Returns false when one of them is static.
    pub(crate) fn capture(&mut self, variable: VariableId, span: SourceSpan) -> bool {
        let owner = self.defs.variable(variable).function();
        if owner == self.context.function {
            return true;
        }

        let mut path = Vec::new();
        for context in std::iter::once(&self.context).chain(self.enclosing.iter().rev()) {
            if context.function == owner {
                break;
            }
            path.push(context.function);
        }

        if path.iter().any(|f| self.defs.function(*f).is_static) {
            let name = self.defs.variable(variable).name.clone();
            self.report_error(TypeCheckerError::StaticLocalFunctionAccessesOuterVariable { name, span });
            return false;
        }

        for function in path {
            let accessed = &mut self.defs.function_mut(function).accessed_outer_variables;
            if !accessed.contains(&variable) {
                accessed.push(variable);
            }
        }
        self.defs.variable_mut(variable).referenced_in_closure = true;
        true
    }

    /// Locals visible here that are not yet definitely assigned.
    pub(crate) fn uninstantiated_locals(&self) -> Vec<VariableId> {
        let mut locals: Vec<VariableId> = self
            .scopes
            .iter()
            .flat_map(|s| s.variables.values().copied())
            .filter(|v| {
                matches!(self.defs.variable(*v).kind, VariableKind::Local { .. }) && !self.instantiated.contains(v)
            })
            .collect();
        locals.sort();
        locals
    }

    /// The members of `snapshot` assigned since the snapshot was taken.
    pub(crate) fn assigned_among(&self, snapshot: &[VariableId]) -> FxHashSet<VariableId> {
        snapshot
            .iter()
            .copied()
            .filter(|v| self.instantiated.contains(v))
            .collect()
    }

    /// Forgets assignments made to `snapshot` in a branch.
    pub(crate) fn reset_assignments(&mut self, snapshot: &[VariableId]) {
        for variable in snapshot {
            self.instantiated.remove(variable);
        }
    }

    /// Unifies `actual` with `expected`, reporting a mismatch at `span`.
    pub(crate) fn expect_type(&mut self, actual: &TypeRef, expected: &TypeRef, span: SourceSpan) -> bool {
        if self.table.unify(actual, expected) {
            return true;
        }
        let error = TypeCheckerError::MismatchedTypes {
            expected: self.display(expected),
            found: self.display(actual),
            span,
        };
        self.report_error(error);
        false
    }

    pub(crate) fn display(&self, ty: &TypeRef) -> String {
        self.defs.display_type(&self.table.resolve(ty), &self.table)
    }

    /// Produces the checked program, resolving every inferred type.
    pub(crate) fn finish(mut self) -> TypeCheckResult {
        for variable in &self.defs.variables {
            if matches!(variable.kind, VariableKind::Local { .. }) && self.table.is_unbound_general(&variable.ty) {
                self.errors.push(TypeCheckerError::UnresolvedInferredVariableType {
                    name: variable.name.clone(),
                    span: variable.span,
                });
            }
        }

        let table = &self.table;
        let mut finalize = |ty: &mut TypeRef| *ty = table.finalize(ty);
        for variable in &mut self.defs.variables {
            finalize(&mut variable.ty);
        }
        for function in &mut self.defs.functions {
            for parameter in &mut function.parameters {
                finalize(&mut parameter.ty);
            }
            finalize(&mut function.return_type);
            for expression in &mut function.body {
                expression.visit_types_mut(&mut finalize);
            }
        }

        log::info!(
            "checked module '{}': {} functions, {} variables, {} errors",
            self.module_id,
            self.defs.functions.len(),
            self.defs.variables.len(),
            self.errors.len()
        );
        log::debug!(
            "instantiation cache: {} entries, {} hits",
            self.cache.len(),
            self.cache.hits()
        );

        TypeCheckResult {
            program: TypedProgram {
                module_id: self.module_id,
                definitions: self.defs,
                main: self.main,
                classes: self.classes,
                unions: self.unions,
                functions: self.functions,
                inference: self.table,
            },
            errors: self.errors,
        }
    }
}
