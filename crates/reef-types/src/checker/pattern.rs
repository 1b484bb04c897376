//! Patterns of `match` arms and `matches` expressions.

use miette::SourceSpan;
use reef_syntax::ast::{FieldPattern, Ident, Pattern, PatternBinding, PatternKind, TypeIdentifier};

use super::resolve::MemberKey;
use super::TypeChecker;
use crate::definitions::{FieldDef, VariantKind};
use crate::error::TypeCheckerError;
use crate::typed::{TypedFieldPattern, TypedPattern, TypedPatternKind};
use crate::types::{TypeDefId, TypeRef, VariableId};

/// How the fields named by a class-like pattern are looked up.
struct FieldSource<'a> {
    owner: TypeDefId,
    arguments: &'a [TypeRef],
    fields: &'a [FieldDef],
    /// Set for union class variants, which have no private or static fields
    variant: Option<&'a str>,
    /// Used in diagnostics
    description: String,
}

impl TypeChecker {
    /// Checks `pattern` against a value of type `expected`.
    ///
    /// Every variable the pattern binds is declared, unassigned, in the
    /// innermost scope and appended to `variables`.
    pub(crate) fn check_pattern(
        &mut self,
        pattern: &Pattern,
        expected: &TypeRef,
        variables: &mut Vec<VariableId>,
    ) -> TypedPattern {
        let span = pattern.span;
        let kind = match &pattern.kind {
            PatternKind::Discard => TypedPatternKind::Discard,
            PatternKind::Variable(binding) => match self.bind_pattern_variable(binding, expected, variables) {
                Some(variable) => TypedPatternKind::Variable(variable),
                None => TypedPatternKind::Unknown,
            },
            PatternKind::Type { ty, binding } => {
                let resolved = self.resolve_pattern_type(ty, expected, span);
                let binding = self.bind_optional(binding.as_ref(), &resolved, variables);
                return TypedPattern {
                    kind: TypedPatternKind::Type { binding },
                    ty: resolved,
                    span,
                };
            }
            PatternKind::UnionVariant { ty, variant, binding } => {
                let Some(variant) = variant else {
                    return unknown_pattern(span);
                };
                let Some((union, _, index, _)) = self.resolve_variant(ty, variant, expected, span) else {
                    return unknown_pattern(span);
                };
                let binding = self.bind_optional(binding.as_ref(), expected, variables);
                TypedPatternKind::UnionVariant {
                    union,
                    variant: index,
                    binding,
                }
            }
            PatternKind::UnionTupleVariant {
                ty,
                variant,
                members,
                binding,
            } => {
                let Some((union, arguments, index, kind)) = self.resolve_variant(ty, variant, expected, span) else {
                    return unknown_pattern(span);
                };
                let VariantKind::Tuple { members: member_types, .. } = kind else {
                    self.report_error(TypeCheckerError::VariantPatternKindMismatch {
                        variant: variant.name.clone(),
                        expected: "tuple",
                        span: variant.span,
                    });
                    return unknown_pattern(span);
                };
                if member_types.len() != members.len() {
                    self.report_error(TypeCheckerError::IncorrectNumberOfPatternsInTupleVariantUnionPattern {
                        expected: member_types.len(),
                        found: members.len(),
                        span,
                    });
                }

                let mut typed_members = Vec::with_capacity(members.len());
                for (member_index, member) in members.iter().enumerate() {
                    let member_type = match member_types.get(member_index) {
                        Some(declared) => {
                            let key = MemberKey::VariantMember {
                                variant: variant.name.clone(),
                                index: member_index,
                            };
                            self.instantiate_member(union, key, &arguments, declared)
                        }
                        None => TypeRef::Unknown,
                    };
                    typed_members.push(self.check_pattern(member, &member_type, variables));
                }
                let binding = self.bind_optional(binding.as_ref(), expected, variables);
                TypedPatternKind::UnionTupleVariant {
                    union,
                    variant: index,
                    members: typed_members,
                    binding,
                }
            }
            PatternKind::UnionClassVariant {
                ty,
                variant,
                fields,
                discard_remaining,
                binding,
            } => {
                let Some((union, arguments, index, kind)) = self.resolve_variant(ty, variant, expected, span) else {
                    return unknown_pattern(span);
                };
                let VariantKind::Class { fields: declared } = kind else {
                    self.report_error(TypeCheckerError::VariantPatternKindMismatch {
                        variant: variant.name.clone(),
                        expected: "class",
                        span: variant.span,
                    });
                    return unknown_pattern(span);
                };

                let source = FieldSource {
                    owner: union,
                    arguments: &arguments,
                    fields: &declared,
                    variant: Some(&variant.name),
                    description: format!("{}::{}", self.defs.ty(union).name, variant.name),
                };
                let (typed_fields, missing) = self.check_field_patterns(&source, fields, variables);
                if !missing.is_empty() && !discard_remaining {
                    self.report_error(TypeCheckerError::MissingFieldsInUnionClassVariantPattern {
                        fields: missing,
                        span,
                    });
                }
                let binding = self.bind_optional(binding.as_ref(), expected, variables);
                TypedPatternKind::UnionClassVariant {
                    union,
                    variant: index,
                    fields: typed_fields,
                    binding,
                }
            }
            PatternKind::Class {
                ty,
                fields,
                discard_remaining,
                binding,
            } => {
                let resolved = self.resolve_type(ty, true);
                let (class, arguments) = match &resolved {
                    TypeRef::Named { def, arguments } if self.defs.class_fields(*def).is_some() => {
                        (*def, arguments.clone())
                    }
                    TypeRef::Unknown => return unknown_pattern(span),
                    other => {
                        let ty = self.display(other);
                        self.report_error(TypeCheckerError::NonClassUsedInClassPattern { ty, span });
                        return unknown_pattern(span);
                    }
                };
                self.expect_type(expected, &resolved, span);

                let declared: Vec<FieldDef> = self.defs.class_fields(class).map(<[FieldDef]>::to_vec).unwrap_or_default();
                let source = FieldSource {
                    owner: class,
                    arguments: &arguments,
                    fields: &declared,
                    variant: None,
                    description: format!("class {}", self.defs.ty(class).name),
                };
                let (typed_fields, missing) = self.check_field_patterns(&source, fields, variables);
                if !missing.is_empty() && !discard_remaining {
                    self.report_error(TypeCheckerError::MissingFieldsInClassPattern { fields: missing, span });
                }
                let binding = self.bind_optional(binding.as_ref(), &resolved, variables);
                return TypedPattern {
                    kind: TypedPatternKind::Class {
                        class,
                        fields: typed_fields,
                        binding,
                    },
                    ty: resolved,
                    span,
                };
            }
        };
        TypedPattern {
            kind,
            ty: expected.clone(),
            span,
        }
    }

    /// Checks the fields named by a class or class-variant pattern. Returns
    /// them in the order written, along with the fields that were not named.
    fn check_field_patterns(
        &mut self,
        source: &FieldSource<'_>,
        fields: &[FieldPattern],
        variables: &mut Vec<VariableId>,
    ) -> (Vec<TypedFieldPattern>, Vec<String>) {
        let inside_owner = self.context.owner_type == Some(source.owner);
        let mut typed = Vec::with_capacity(fields.len());
        for field_pattern in fields {
            let name = &field_pattern.name;
            let Some((index, field)) = source.fields.iter().enumerate().find(|(_, f)| f.name == name.name) else {
                self.report_error(TypeCheckerError::UnknownField {
                    field: name.name.clone(),
                    owner: source.description.clone(),
                    span: name.span,
                });
                continue;
            };
            if field.is_static {
                self.report_error(TypeCheckerError::StaticFieldInClassPattern {
                    field: field.name.clone(),
                    span: name.span,
                });
                continue;
            }
            if !field.is_public && !inside_owner {
                self.report_error(TypeCheckerError::PrivateFieldReferenced {
                    field: field.name.clone(),
                    span: name.span,
                });
            }

            let key = match source.variant {
                Some(variant) => MemberKey::VariantField {
                    variant: variant.to_owned(),
                    field: field.name.clone(),
                },
                None => MemberKey::Field(field.name.clone()),
            };
            let field_type = self.instantiate_member(source.owner, key, source.arguments, &field.ty);
            let pattern = match &field_pattern.pattern {
                Some(pattern) => self.check_pattern(pattern, &field_type, variables),
                None => self.bare_field_pattern(name, field_type, variables),
            };
            typed.push(TypedFieldPattern {
                index,
                name: field.name.clone(),
                pattern,
            });
        }

        let missing = source
            .fields
            .iter()
            .enumerate()
            .filter(|(index, f)| {
                !f.is_static && (f.is_public || inside_owner) && !typed.iter().any(|t: &TypedFieldPattern| t.index == *index)
            })
            .map(|(_, f)| f.name.clone())
            .collect();
        (typed, missing)
    }

    /// A field written without a sub-pattern binds a variable of the same name.
    fn bare_field_pattern(&mut self, name: &Ident, ty: TypeRef, variables: &mut Vec<VariableId>) -> TypedPattern {
        let binding = PatternBinding {
            name: name.clone(),
            mutable: false,
        };
        let kind = match self.bind_pattern_variable(&binding, &ty, variables) {
            Some(variable) => TypedPatternKind::Variable(variable),
            None => TypedPatternKind::Unknown,
        };
        TypedPattern {
            kind,
            ty,
            span: name.span,
        }
    }

    fn bind_pattern_variable(
        &mut self,
        binding: &PatternBinding,
        ty: &TypeRef,
        variables: &mut Vec<VariableId>,
    ) -> Option<VariableId> {
        let variable = self.declare_variable(&binding.name, ty.clone(), binding.mutable)?;
        variables.push(variable);
        Some(variable)
    }

    fn bind_optional(
        &mut self,
        binding: Option<&PatternBinding>,
        ty: &TypeRef,
        variables: &mut Vec<VariableId>,
    ) -> Option<VariableId> {
        binding.and_then(|binding| self.bind_pattern_variable(binding, ty, variables))
    }

    /// Resolves the type of a type pattern and checks it against the matched value.
    fn resolve_pattern_type(&mut self, ty: &TypeIdentifier, expected: &TypeRef, span: SourceSpan) -> TypeRef {
        let resolved = self.resolve_type(ty, true);
        self.expect_type(expected, &resolved, span);
        resolved
    }

    /// Resolves `Union::Variant` in a pattern to the union, its type
    /// arguments, the variant index and the variant's declared shape.
    fn resolve_variant(
        &mut self,
        ty: &TypeIdentifier,
        variant: &Ident,
        expected: &TypeRef,
        span: SourceSpan,
    ) -> Option<(TypeDefId, Vec<TypeRef>, usize, VariantKind)> {
        let resolved = self.resolve_type(ty, true);
        let (union, arguments) = match &resolved {
            TypeRef::Named { def, arguments } if self.defs.union_variants(*def).is_some() => (*def, arguments.clone()),
            TypeRef::Unknown => return None,
            other => {
                let found = self.display(other);
                self.report_error(TypeCheckerError::ExpectedUnionType { ty: found, span: ty.span() });
                return None;
            }
        };
        self.expect_type(expected, &resolved, span);

        let found = self
            .defs
            .union_variants(union)
            .and_then(|variants| variants.iter().enumerate().find(|(_, v)| v.name == variant.name))
            .map(|(index, v)| (index, v.kind.clone()));
        match found {
            Some((index, kind)) => {
                log::trace!("pattern on {} variant {}", kind.describe(), variant.name);
                Some((union, arguments, index, kind))
            }
            None => {
                let ty = self.display(&resolved);
                self.report_error(TypeCheckerError::UnknownTypeMember {
                    member: variant.name.clone(),
                    ty,
                    span: variant.span,
                });
                None
            }
        }
    }
}

fn unknown_pattern(span: SourceSpan) -> TypedPattern {
    TypedPattern {
        kind: TypedPatternKind::Unknown,
        ty: TypeRef::Unknown,
        span,
    }
}
