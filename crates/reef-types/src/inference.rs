//! Inference variables and unification.

use crate::types::{FunctionParameterType, FunctionType, TypeRef, TypeVarId};

/// What an unbound variable may still become.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    /// Any type
    General,
    /// One of the sized integer types. Defaults to `i32`.
    Integer,
}

#[derive(Debug, Clone)]
struct VarState {
    kind: VarKind,
    value: Option<TypeRef>,
}

/// Substitution table for the inference variables of one checking pass.
#[derive(Debug, Clone, Default)]
pub struct InferenceTable {
    vars: Vec<VarState>,
}

impl InferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fresh(&mut self, kind: VarKind) -> TypeRef {
        let id = TypeVarId(self.vars.len() as u32);
        self.vars.push(VarState { kind, value: None });
        TypeRef::Var(id)
    }

    pub fn fresh_var(&mut self) -> TypeRef {
        self.fresh(VarKind::General)
    }

    pub fn fresh_int(&mut self) -> TypeRef {
        self.fresh(VarKind::Integer)
    }

    pub fn kind(&self, var: TypeVarId) -> VarKind {
        self.vars[var.0 as usize].kind
    }

    pub fn probe(&self, var: TypeVarId) -> Option<&TypeRef> {
        self.vars[var.0 as usize].value.as_ref()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Follows bound variables until reaching a non-variable type or an
    /// unbound variable.
    pub fn shallow_resolve(&self, ty: &TypeRef) -> TypeRef {
        let mut current = ty.clone();
        while let TypeRef::Var(var) = current {
            match self.probe(var) {
                Some(value) => current = value.clone(),
                None => break,
            }
        }
        current
    }

    /// Resolves every bound variable inside `ty`. Unbound variables remain.
    pub fn resolve(&self, ty: &TypeRef) -> TypeRef {
        self.resolve_with(ty, &|var| TypeRef::Var(var))
    }

    /// Resolves `ty` completely. Unbound integer variables default to `i32`,
    /// any other unbound variable becomes [`TypeRef::Unknown`].
    pub fn finalize(&self, ty: &TypeRef) -> TypeRef {
        self.resolve_with(ty, &|var| match self.kind(var) {
            VarKind::Integer => TypeRef::i32(),
            VarKind::General => TypeRef::Unknown,
        })
    }

    /// Whether `ty` is, or resolves to, an unbound general variable.
    pub fn is_unbound_general(&self, ty: &TypeRef) -> bool {
        matches!(self.shallow_resolve(ty), TypeRef::Var(var) if self.kind(var) == VarKind::General)
    }

    fn resolve_with(&self, ty: &TypeRef, unbound: &impl Fn(TypeVarId) -> TypeRef) -> TypeRef {
        match ty {
            TypeRef::Var(var) => match self.probe(*var) {
                Some(value) => self.resolve_with(value, unbound),
                None => unbound(*var),
            },
            TypeRef::Named { def, arguments } => TypeRef::Named {
                def: *def,
                arguments: arguments.iter().map(|a| self.resolve_with(a, unbound)).collect(),
            },
            TypeRef::Function(function) => TypeRef::Function(Box::new(FunctionType {
                parameters: function
                    .parameters
                    .iter()
                    .map(|p| FunctionParameterType {
                        ty: self.resolve_with(&p.ty, unbound),
                        mutable: p.mutable,
                    })
                    .collect(),
                return_type: self.resolve_with(&function.return_type, unbound),
            })),
            TypeRef::Tuple(members) => TypeRef::Tuple(members.iter().map(|m| self.resolve_with(m, unbound)).collect()),
            TypeRef::Generic(_) | TypeRef::Unknown => ty.clone(),
        }
    }

    /// Makes `actual` and `expected` equal, binding variables as needed.
    ///
    /// `Never` and `Unknown` are compatible with every type. Returns false on
    /// a mismatch; bindings made before the mismatch was found are kept.
    pub fn unify(&mut self, actual: &TypeRef, expected: &TypeRef) -> bool {
        let actual = self.shallow_resolve(actual);
        let expected = self.shallow_resolve(expected);

        match (&actual, &expected) {
            (TypeRef::Unknown, _) | (_, TypeRef::Unknown) => true,
            (a, b) if a.is_never() || b.is_never() => true,
            (TypeRef::Var(a), TypeRef::Var(b)) => {
                if a == b {
                    return true;
                }
                match (self.kind(*a), self.kind(*b)) {
                    (VarKind::General, _) => self.bind(*a, expected.clone()),
                    (VarKind::Integer, VarKind::General) => self.bind(*b, actual.clone()),
                    (VarKind::Integer, VarKind::Integer) => self.bind(*a, expected.clone()),
                }
            }
            (TypeRef::Var(var), other) | (other, TypeRef::Var(var)) => self.bind(*var, other.clone()),
            (
                TypeRef::Named { def: a, arguments: a_args },
                TypeRef::Named { def: b, arguments: b_args },
            ) => {
                if a != b || a_args.len() != b_args.len() {
                    return false;
                }
                let mut ok = true;
                for (a_arg, b_arg) in a_args.iter().zip(b_args) {
                    ok &= self.unify(a_arg, b_arg);
                }
                ok
            }
            (TypeRef::Tuple(a), TypeRef::Tuple(b)) => {
                if a.len() != b.len() {
                    return false;
                }
                let mut ok = true;
                for (a_member, b_member) in a.iter().zip(b) {
                    ok &= self.unify(a_member, b_member);
                }
                ok
            }
            (TypeRef::Function(a), TypeRef::Function(b)) => {
                if a.parameters.len() != b.parameters.len() {
                    return false;
                }
                let mut ok = self.unify(&a.return_type, &b.return_type);
                for (a_param, b_param) in a.parameters.iter().zip(&b.parameters) {
                    ok &= a_param.mutable == b_param.mutable;
                    ok &= self.unify(&a_param.ty, &b_param.ty);
                }
                ok
            }
            (TypeRef::Generic(a), TypeRef::Generic(b)) => a == b,
            _ => false,
        }
    }

    fn bind(&mut self, var: TypeVarId, ty: TypeRef) -> bool {
        if self.kind(var) == VarKind::Integer {
            let accepted = match &ty {
                TypeRef::Named { def, .. } => def.is_integer(),
                TypeRef::Var(other) => self.kind(*other) == VarKind::Integer,
                _ => false,
            };
            if !accepted {
                return false;
            }
        }
        if self.occurs(var, &ty) {
            return false;
        }
        log::trace!("binding ?{} to {:?}", var.0, ty);
        self.vars[var.0 as usize].value = Some(ty);
        true
    }

    fn occurs(&self, var: TypeVarId, ty: &TypeRef) -> bool {
        match self.shallow_resolve(ty) {
            TypeRef::Var(other) => other == var,
            TypeRef::Named { arguments, .. } => arguments.iter().any(|a| self.occurs(var, a)),
            TypeRef::Tuple(members) => members.iter().any(|m| self.occurs(var, m)),
            TypeRef::Function(function) => {
                function.parameters.iter().any(|p| self.occurs(var, &p.ty)) || self.occurs(var, &function.return_type)
            }
            TypeRef::Generic(_) | TypeRef::Unknown => false,
        }
    }
}

impl TypeRef {
    /// Whether `self` is an integer type or an integer variable.
    pub fn is_integer_in(&self, table: &InferenceTable) -> bool {
        match table.shallow_resolve(self) {
            TypeRef::Named { def, .. } => def.is_integer(),
            TypeRef::Var(var) => table.kind(var) == VarKind::Integer,
            _ => false,
        }
    }
}
