//! Resolution of written types and instantiation of generic members.

use miette::SourceSpan;
use reef_syntax::ast::{Ident, TypeIdentifier};
use rustc_hash::FxHashMap;

use super::TypeChecker;
use crate::definitions::FunctionOwner;
use crate::error::TypeCheckerError;
use crate::typed::InstantiatedFunction;
use crate::types::{FunctionId, FunctionParameterType, FunctionType, GenericOwner, GenericParam, TypeDefId, TypeRef};

/// A member of a type whose declared type mentions the type's generics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum MemberKey {
    Field(String),
    Function(String),
    VariantField { variant: String, field: String },
    VariantMember { variant: String, index: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct InstantiationKey {
    owner: TypeDefId,
    member: MemberKey,
    arguments: Vec<TypeRef>,
}

/// Member types already instantiated for concrete type arguments.
///
/// Lives for one checking pass. Keys containing inference variables are never
/// cached since the variables may still be bound differently.
#[derive(Debug, Default)]
pub(crate) struct InstantiationCache {
    entries: FxHashMap<InstantiationKey, TypeRef>,
    hits: usize,
}

impl InstantiationCache {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn hits(&self) -> usize {
        self.hits
    }
}

impl TypeChecker {
    /// Resolves a type written in source.
    ///
    /// When `infer_missing` is set, a generic type written without arguments
    /// gets fresh inference variables instead of an error.
    pub(crate) fn resolve_type(&mut self, ty: &TypeIdentifier, infer_missing: bool) -> TypeRef {
        match ty {
            TypeIdentifier::Named {
                name,
                type_arguments,
                span,
            } => self.resolve_named_type(name, type_arguments, *span, infer_missing),
            TypeIdentifier::Tuple { members, .. } => match members.as_slice() {
                [] => TypeRef::unit(),
                [single] => self.resolve_type(single, infer_missing),
                members => TypeRef::Tuple(members.iter().map(|m| self.resolve_type(m, infer_missing)).collect()),
            },
            TypeIdentifier::Unit { .. } => TypeRef::unit(),
            TypeIdentifier::Function {
                parameters,
                return_type,
                ..
            } => {
                let parameters = parameters
                    .iter()
                    .map(|p| FunctionParameterType {
                        ty: self.resolve_type(&p.ty, infer_missing),
                        mutable: p.mutable,
                    })
                    .collect();
                let return_type = match return_type {
                    Some(return_type) => self.resolve_type(return_type, infer_missing),
                    None => TypeRef::unit(),
                };
                TypeRef::Function(Box::new(FunctionType {
                    parameters,
                    return_type,
                }))
            }
        }
    }

    fn resolve_named_type(
        &mut self,
        name: &Ident,
        type_arguments: &[TypeIdentifier],
        span: SourceSpan,
        infer_missing: bool,
    ) -> TypeRef {
        let Some(def) = self.type_names.get(&name.name).copied() else {
            if let Some(param) = self.lookup_generic(&name.name) {
                if !type_arguments.is_empty() {
                    self.report_error(TypeCheckerError::IncorrectNumberOfTypeArguments {
                        expected: 0,
                        found: type_arguments.len(),
                        span,
                    });
                }
                return TypeRef::Generic(param);
            }
            self.report_error(TypeCheckerError::SymbolNotFound {
                name: name.name.clone(),
                span: name.span,
            });
            return TypeRef::Unknown;
        };

        let expected = self.defs.ty(def).type_parameters.len();
        let mut arguments: Vec<TypeRef> = type_arguments
            .iter()
            .map(|a| self.resolve_type(a, infer_missing))
            .collect();
        if arguments.len() != expected {
            if !(arguments.is_empty() && infer_missing) {
                self.report_error(TypeCheckerError::IncorrectNumberOfTypeArguments {
                    expected,
                    found: arguments.len(),
                    span,
                });
            }
            arguments = (0..expected)
                .map(|_| {
                    if infer_missing {
                        self.table.fresh_var()
                    } else {
                        TypeRef::Unknown
                    }
                })
                .collect();
        }
        TypeRef::Named { def, arguments }
    }

    /// Validates the generic parameter names of a declaration.
    pub(crate) fn declare_generics(&mut self, parameters: &[Ident]) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            if names.contains(&parameter.name) {
                self.report_error(TypeCheckerError::DuplicateGenericParameter {
                    name: parameter.name.clone(),
                    span: parameter.span,
                });
                continue;
            }
            if self.type_names.contains_key(&parameter.name) {
                self.report_error(TypeCheckerError::TypeParameterConflictsWithType {
                    name: parameter.name.clone(),
                    span: parameter.span,
                });
            } else if self.lookup_generic(&parameter.name).is_some() {
                self.report_error(TypeCheckerError::ConflictingTypeParameter {
                    name: parameter.name.clone(),
                    span: parameter.span,
                });
            }
            names.push(parameter.name.clone());
        }
        names
    }

    /// Brings generic parameters into the innermost scope.
    pub(crate) fn enter_generics(&mut self, owner: GenericOwner, names: &[String]) {
        for (index, name) in names.iter().enumerate() {
            let param = GenericParam {
                owner,
                index: index as u32,
                name: name.clone(),
            };
            self.current_scope().generics.insert(name.clone(), param);
        }
    }

    /// The declared type of a member of `owner`, with the type's generic
    /// parameters replaced by `arguments`.
    pub(crate) fn instantiate_member(
        &mut self,
        owner: TypeDefId,
        member: MemberKey,
        arguments: &[TypeRef],
        declared: &TypeRef,
    ) -> TypeRef {
        let arguments: Vec<TypeRef> = arguments.iter().map(|a| self.table.resolve(a)).collect();
        let substitute = |ty: &TypeRef| {
            ty.substitute(&|param| match param.owner {
                GenericOwner::Type(def) if def == owner => arguments.get(param.index as usize).cloned(),
                _ => None,
            })
        };
        if arguments.iter().any(TypeRef::has_vars) {
            return substitute(declared);
        }

        let key = InstantiationKey {
            owner,
            member,
            arguments: arguments.clone(),
        };
        if let Some(cached) = self.cache.entries.get(&key) {
            self.cache.hits += 1;
            return cached.clone();
        }
        let instantiated = substitute(declared);
        log::trace!("instantiated {:?} of {:?} for {:?}", key.member, owner, key.arguments);
        self.cache.entries.insert(key, instantiated.clone());
        instantiated
    }

    /// Fresh inference variables for the generics of the type owning `function`.
    pub(crate) fn fresh_owner_arguments(&mut self, function: FunctionId) -> Vec<TypeRef> {
        match self.defs.function(function).owner {
            FunctionOwner::Type(owner) => {
                let count = self.defs.ty(owner).type_parameters.len();
                (0..count).map(|_| self.table.fresh_var()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Instantiates `function` for use as a value.
    ///
    /// Explicit type arguments are used when their count matches; otherwise
    /// every type parameter becomes a fresh inference variable.
    pub(crate) fn instantiate_function(
        &mut self,
        function: FunctionId,
        owner_type_arguments: Vec<TypeRef>,
        explicit: Option<&[TypeIdentifier]>,
        span: SourceSpan,
    ) -> (InstantiatedFunction, TypeRef) {
        let def = self.defs.function(function);
        let count = def.type_parameters.len();
        let owner = def.owner;
        let name = def.name.clone();
        let signature = TypeRef::Function(Box::new(def.signature()));

        let type_arguments: Vec<TypeRef> = match explicit {
            Some(arguments) if arguments.len() == count => {
                arguments.iter().map(|a| self.resolve_type(a, true)).collect()
            }
            Some(arguments) => {
                self.report_error(TypeCheckerError::IncorrectNumberOfTypeArguments {
                    expected: count,
                    found: arguments.len(),
                    span,
                });
                (0..count).map(|_| self.table.fresh_var()).collect()
            }
            None => (0..count).map(|_| self.table.fresh_var()).collect(),
        };

        let owner_substituted = match owner {
            FunctionOwner::Type(owner) => self.instantiate_member(
                owner,
                MemberKey::Function(name),
                &owner_type_arguments,
                &signature,
            ),
            FunctionOwner::Global | FunctionOwner::Local(_) => signature,
        };
        let ty = owner_substituted.substitute(&|param| match param.owner {
            GenericOwner::Function(f) if f == function => type_arguments.get(param.index as usize).cloned(),
            _ => None,
        });

        (
            InstantiatedFunction {
                function,
                owner_type_arguments,
                type_arguments,
            },
            ty,
        )
    }
}
