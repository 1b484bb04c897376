//! Closure capture analysis.
//!
//! Runs before any code is emitted and decides, once per variable, whether it
//! lives in a plain local or in a field of its function's locals object.
//! Lowering then never has to rewrite statements it already produced.

use indexmap::IndexSet;
use rustc_hash::FxHashMap;

use super::*;

/// The locals object of a function whose variables are captured.
#[derive(Debug, Clone)]
pub struct LocalsLayout {
    /// `<Function>__Locals`
    pub id: DefId,
    /// Captured parameters first, then captured locals in registration order
    pub fields: Vec<(VariableId, String)>,
}

impl LocalsLayout {
    pub fn field_name(&self, variable: VariableId) -> Option<&str> {
        self.fields
            .iter()
            .find(|(v, _)| *v == variable)
            .map(|(_, name)| name.as_str())
    }
}

/// The closure object a local function receives as its first parameter.
#[derive(Debug, Clone)]
pub struct ClosureLayout {
    /// `<Function>__Closure`
    pub id: DefId,
    /// The instance method whose `this` is captured
    pub this_owner: Option<FunctionId>,
    /// Enclosing functions whose locals objects are reached, outermost first
    pub locals: Vec<FunctionId>,
}

/// Result of the pre-pass for a whole program.
#[derive(Debug, Default)]
pub struct ClosureSpecialization {
    pub locals: FxHashMap<FunctionId, LocalsLayout>,
    pub closures: FxHashMap<FunctionId, ClosureLayout>,
}

impl ClosureSpecialization {
    pub fn analyze(program: &TypedProgram) -> Self {
        let defs = &program.definitions;
        let mut result = Self::default();

        for index in 0..defs.functions.len() {
            let function = FunctionId(index as u32);
            if let Some(layout) = locals_layout(defs, function) {
                log::trace!("{} keeps {} captured variables", layout.id, layout.fields.len());
                result.locals.insert(function, layout);
            }
        }

        // Direct requirements, from the variables each local function touches.
        let mut this_owners: FxHashMap<FunctionId, FunctionId> = FxHashMap::default();
        let mut required: FxHashMap<FunctionId, IndexSet<FunctionId>> = FxHashMap::default();
        let mut referenced: FxHashMap<FunctionId, IndexSet<FunctionId>> = FxHashMap::default();
        for (index, def) in defs.functions.iter().enumerate() {
            let function = FunctionId(index as u32);
            let mut references = IndexSet::new();
            for expr in &def.body {
                collect_local_function_references(defs, expr, &mut references);
            }
            referenced.insert(function, references);

            if !matches!(def.owner, FunctionOwner::Local(_)) {
                continue;
            }
            let entry = required.entry(function).or_default();
            for variable in &def.accessed_outer_variables {
                let variable = defs.variable(*variable);
                match variable.kind {
                    VariableKind::This { function: owner } => {
                        this_owners.insert(function, owner);
                    }
                    _ => {
                        entry.insert(variable.function());
                    }
                }
            }
        }

        // Creating a closure object needs everything that closure needs, so
        // requirements flow from the referenced function to the referencing one.
        let mut changed = true;
        while changed {
            changed = false;
            for (index, def) in defs.functions.iter().enumerate() {
                let function = FunctionId(index as u32);
                if !matches!(def.owner, FunctionOwner::Local(_)) {
                    continue;
                }
                let Some(references) = referenced.get(&function) else {
                    continue;
                };
                for callee in references {
                    let needed: Vec<FunctionId> = required
                        .get(callee)
                        .map(|set| set.iter().copied().filter(|f| *f != function).collect())
                        .unwrap_or_default();
                    let this_owner = this_owners.get(callee).copied();
                    let entry = required.entry(function).or_default();
                    for outer in needed {
                        changed |= entry.insert(outer);
                    }
                    if let Some(owner) = this_owner {
                        if def.this_variable.is_none() && !this_owners.contains_key(&function) {
                            this_owners.insert(function, owner);
                            changed = true;
                        }
                    }
                }
            }
        }

        for (function, needed) in required {
            let this_owner = this_owners.get(&function).copied();
            if needed.is_empty() && this_owner.is_none() {
                continue;
            }
            let locals = enclosing_functions(defs, function)
                .into_iter()
                .filter(|outer| needed.contains(outer))
                .collect();
            let id = defs.function(function).id.nested("Closure");
            log::trace!("{id} captures this: {}", this_owner.is_some());
            result.closures.insert(
                function,
                ClosureLayout {
                    id,
                    this_owner,
                    locals,
                },
            );
        }
        result
    }

    pub fn closure(&self, function: FunctionId) -> Option<&ClosureLayout> {
        self.closures.get(&function)
    }

    pub fn locals_of(&self, function: FunctionId) -> Option<&LocalsLayout> {
        self.locals.get(&function)
    }

    /// The locals object field holding `variable`, if it is captured.
    pub fn captured_field(&self, defs: &Definitions, variable: VariableId) -> Option<(FunctionId, &str)> {
        let owner = defs.variable(variable).function();
        self.locals
            .get(&owner)
            .and_then(|layout| layout.field_name(variable))
            .map(|name| (owner, name))
    }
}

fn locals_layout(defs: &Definitions, function: FunctionId) -> Option<LocalsLayout> {
    let def = defs.function(function);
    let captured = def
        .parameters
        .iter()
        .map(|p| p.variable)
        .chain(def.locals.iter().copied())
        .filter(|v| {
            let variable = defs.variable(*v);
            variable.referenced_in_closure && !matches!(variable.kind, VariableKind::This { .. })
        });

    let mut fields: Vec<(VariableId, String)> = Vec::new();
    for variable in captured {
        if fields.iter().any(|(v, _)| *v == variable) {
            continue;
        }
        let base = &defs.variable(variable).name;
        let mut name = base.clone();
        let mut suffix = 1;
        while fields.iter().any(|(_, existing)| *existing == name) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        fields.push((variable, name));
    }
    if fields.is_empty() {
        return None;
    }
    Some(LocalsLayout {
        id: def.id.nested("Locals"),
        fields,
    })
}

/// The functions enclosing a local function, outermost first.
pub fn enclosing_functions(defs: &Definitions, function: FunctionId) -> Vec<FunctionId> {
    let mut chain = Vec::new();
    let mut current = defs.function(function).owner;
    while let FunctionOwner::Local(parent) = current {
        chain.push(parent);
        current = defs.function(parent).owner;
    }
    chain.reverse();
    chain
}

fn collect_local_function_references(defs: &Definitions, expr: &TypedExpr, found: &mut IndexSet<FunctionId>) {
    walk_expr(expr, &mut |e| {
        if let TypedExprKind::FunctionReference { function, .. } = &e.kind {
            if matches!(defs.function(function.function).owner, FunctionOwner::Local(_)) {
                found.insert(function.function);
            }
        }
    });
}

/// Calls `f` on `expr` and every expression nested in it, parents first.
pub fn walk_expr(expr: &TypedExpr, f: &mut impl FnMut(&TypedExpr)) {
    f(expr);
    match &expr.kind {
        TypedExprKind::IntLiteral(_)
        | TypedExprKind::StringLiteral(_)
        | TypedExprKind::BoolLiteral(_)
        | TypedExprKind::Todo
        | TypedExprKind::Variable(_)
        | TypedExprKind::StaticFieldAccess { .. }
        | TypedExprKind::UnitVariant { .. }
        | TypedExprKind::Break
        | TypedExprKind::Continue
        | TypedExprKind::Unknown => {}
        TypedExprKind::FunctionReference { receiver, .. } => {
            if let Some(receiver) = receiver {
                walk_expr(receiver, f);
            }
        }
        TypedExprKind::Binary { left, right, .. } => {
            walk_expr(left, f);
            walk_expr(right, f);
        }
        TypedExprKind::Assignment { target, value } => {
            walk_expr(target, f);
            walk_expr(value, f);
        }
        TypedExprKind::Not(operand) | TypedExprKind::FallOut(operand) => walk_expr(operand, f),
        TypedExprKind::VariableDeclaration { value, .. } | TypedExprKind::Return(value) => {
            if let Some(value) = value {
                walk_expr(value, f);
            }
        }
        TypedExprKind::Call { callee, arguments } => {
            walk_expr(callee, f);
            arguments.iter().for_each(|a| walk_expr(a, f));
        }
        TypedExprKind::FieldAccess { owner, .. } => walk_expr(owner, f),
        TypedExprKind::ObjectInitializer { fields, .. } | TypedExprKind::UnionClassVariantInitializer { fields, .. } => {
            fields.iter().for_each(|field| walk_expr(&field.value, f));
        }
        TypedExprKind::Tuple(expressions) | TypedExprKind::Block { expressions, .. } => {
            expressions.iter().for_each(|e| walk_expr(e, f));
        }
        TypedExprKind::If {
            condition,
            body,
            else_ifs,
            else_body,
        } => {
            walk_expr(condition, f);
            walk_expr(body, f);
            for else_if in else_ifs {
                walk_expr(&else_if.condition, f);
                walk_expr(&else_if.body, f);
            }
            if let Some(else_body) = else_body {
                walk_expr(else_body, f);
            }
        }
        TypedExprKind::Match { value, arms } => {
            walk_expr(value, f);
            arms.iter().for_each(|arm| walk_expr(&arm.expression, f));
        }
        TypedExprKind::Matches { value, .. } => walk_expr(value, f),
        TypedExprKind::While { condition, body } => {
            walk_expr(condition, f);
            walk_expr(body, f);
        }
    }
}
