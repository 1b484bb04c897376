//! Member access and object construction.

use miette::SourceSpan;
use reef_syntax::ast::{Expr, FieldInitializer, Ident, TypeIdentifier};

use super::resolve::MemberKey;
use super::TypeChecker;
use crate::definitions::{FieldDef, VariantKind};
use crate::error::TypeCheckerError;
use crate::typed::{TypedExpr, TypedExprKind, TypedFieldValue};
use crate::types::{TypeDefId, TypeRef};

impl TypeChecker {
    /// `owner.member`
    pub(crate) fn check_member_access(
        &mut self,
        owner: &Expr,
        member: Option<&Ident>,
        type_arguments: Option<&[TypeIdentifier]>,
        span: SourceSpan,
    ) -> TypedExpr {
        let owner = self.check_expr(owner, true);
        let Some(member) = member else {
            return TypedExpr::unknown(span);
        };
        let diverges = owner.diverges;
        let owner_type = self.table.shallow_resolve(&owner.ty);

        let mut typed = match owner_type {
            TypeRef::Unknown => TypedExpr::unknown(span),
            TypeRef::Generic(_) => {
                self.report_error(TypeCheckerError::MemberAccessOnGenericExpression { span });
                TypedExpr::unknown(span)
            }
            TypeRef::Tuple(members) => {
                let index = member
                    .name
                    .strip_prefix("Item")
                    .and_then(|i| i.parse::<usize>().ok())
                    .filter(|i| *i < members.len());
                match index {
                    Some(index) => {
                        if type_arguments.is_some() {
                            self.report_error(TypeCheckerError::GenericTypeArgumentsOnNonFunctionValue { span });
                        }
                        let ty = members[index].clone();
                        let kind = TypedExprKind::FieldAccess {
                            owner: Box::new(owner),
                            name: member.name.clone(),
                            index,
                        };
                        TypedExpr::new(kind, ty, span)
                    }
                    None => self.unknown_member(member, &TypeRef::Tuple(members), span),
                }
            }
            TypeRef::Named { def, arguments } => {
                self.check_named_member_access(owner, def, arguments, member, type_arguments, span)
            }
            other => self.unknown_member(member, &other, span),
        };
        typed.diverges |= diverges;
        typed
    }

    fn check_named_member_access(
        &mut self,
        owner: TypedExpr,
        def: TypeDefId,
        arguments: Vec<TypeRef>,
        member: &Ident,
        type_arguments: Option<&[TypeIdentifier]>,
        span: SourceSpan,
    ) -> TypedExpr {
        if let Some(function) = self.defs.type_function(def, &member.name) {
            let function_def = self.defs.function(function);
            let (is_instance, is_mutable) = (function_def.is_instance(), function_def.is_mutable);
            if !is_instance {
                self.report_error(TypeCheckerError::InstanceMemberAccessOnStaticMember { span });
                return TypedExpr::unknown(span);
            }
            if is_mutable {
                self.expect_assignable(&owner);
            }
            return self.function_reference(function, arguments, type_arguments, Some(owner), span);
        }

        let field = self
            .defs
            .class_fields(def)
            .and_then(|fields| fields.iter().enumerate().find(|(_, f)| f.name == member.name))
            .map(|(index, f)| (index, f.clone()));
        let Some((index, field)) = field else {
            let ty = TypeRef::Named { def, arguments };
            return self.unknown_member(member, &ty, span);
        };

        if type_arguments.is_some() {
            self.report_error(TypeCheckerError::GenericTypeArgumentsOnNonFunctionValue { span });
        }
        if !field.is_public && self.context.owner_type != Some(def) {
            self.report_error(TypeCheckerError::PrivateFieldReferenced {
                field: field.name.clone(),
                span: member.span,
            });
        }
        if field.is_static {
            self.report_error(TypeCheckerError::InstanceMemberAccessOnStaticMember { span });
            return TypedExpr::unknown(span);
        }

        let ty = self.instantiate_member(def, MemberKey::Field(field.name.clone()), &arguments, &field.ty);
        let kind = TypedExprKind::FieldAccess {
            owner: Box::new(owner),
            name: field.name,
            index,
        };
        TypedExpr::new(kind, ty, span)
    }

    fn unknown_member(&mut self, member: &Ident, ty: &TypeRef, span: SourceSpan) -> TypedExpr {
        let ty = self.display(ty);
        self.report_error(TypeCheckerError::UnknownTypeMember {
            member: member.name.clone(),
            ty,
            span: member.span,
        });
        TypedExpr::unknown(span)
    }

    /// `Type::member`
    pub(crate) fn check_static_member_access(
        &mut self,
        ty: &TypeIdentifier,
        member: Option<&Ident>,
        type_arguments: Option<&[TypeIdentifier]>,
        span: SourceSpan,
    ) -> TypedExpr {
        let owner_type = self.resolve_type(ty, true);
        let Some(member) = member else {
            return TypedExpr::unknown(span);
        };
        let (def, arguments) = match owner_type {
            TypeRef::Named { def, arguments } => (def, arguments),
            TypeRef::Generic(_) => {
                self.report_error(TypeCheckerError::StaticMemberAccessOnGenericReference { span });
                return TypedExpr::unknown(span);
            }
            TypeRef::Unknown => return TypedExpr::unknown(span),
            other => return self.unknown_member(member, &other, span),
        };

        let variant = self
            .defs
            .union_variants(def)
            .and_then(|variants| variants.iter().enumerate().find(|(_, v)| v.name == member.name))
            .map(|(index, v)| (index, v.kind.clone()));
        if let Some((index, kind)) = variant {
            match kind {
                VariantKind::Unit => {
                    if type_arguments.is_some() {
                        self.report_error(TypeCheckerError::GenericTypeArgumentsOnNonFunctionValue { span });
                    }
                    let kind = TypedExprKind::UnitVariant { union: def, variant: index };
                    return TypedExpr::new(kind, TypeRef::Named { def, arguments }, span);
                }
                VariantKind::Tuple { create_function, .. } => {
                    return self.function_reference(create_function, arguments, type_arguments, None, span);
                }
                VariantKind::Class { .. } => {
                    self.report_error(TypeCheckerError::UnionClassVariantWithoutInitializer { span });
                    return TypedExpr::unknown(span);
                }
            }
        }

        if let Some(function) = self.defs.type_function(def, &member.name) {
            if self.defs.function(function).is_instance() {
                self.report_error(TypeCheckerError::StaticMemberAccessOnInstanceMember { span });
                return TypedExpr::unknown(span);
            }
            return self.function_reference(function, arguments, type_arguments, None, span);
        }

        let field = self
            .defs
            .class_fields(def)
            .and_then(|fields| fields.iter().enumerate().find(|(_, f)| f.name == member.name))
            .map(|(index, f)| (index, f.clone()));
        if let Some((index, field)) = field {
            if type_arguments.is_some() {
                self.report_error(TypeCheckerError::GenericTypeArgumentsOnNonFunctionValue { span });
            }
            if !field.is_static {
                self.report_error(TypeCheckerError::StaticMemberAccessOnInstanceMember { span });
                return TypedExpr::unknown(span);
            }
            if !field.is_public && self.context.owner_type != Some(def) {
                self.report_error(TypeCheckerError::PrivateFieldReferenced {
                    field: field.name.clone(),
                    span: member.span,
                });
            }
            let ty = self.instantiate_member(def, MemberKey::Field(field.name.clone()), &arguments, &field.ty);
            let kind = TypedExprKind::StaticFieldAccess {
                owner: def,
                name: field.name,
                index,
            };
            return TypedExpr::new(kind, ty, span);
        }

        self.unknown_member(member, &TypeRef::Named { def, arguments }, span)
    }

    /// `new Class { field = value, ... }`
    ///
    /// Outside the class only public instance fields may be set. Every field
    /// that may be set must be set exactly once.
    pub(crate) fn check_object_initializer(
        &mut self,
        ty: &TypeIdentifier,
        fields: &[FieldInitializer],
        span: SourceSpan,
    ) -> TypedExpr {
        let class_type = self.resolve_type(ty, true);
        let (def, arguments) = match &class_type {
            TypeRef::Named { def, arguments } if self.defs.class_fields(*def).is_some() => (*def, arguments.clone()),
            TypeRef::Unknown => {
                self.check_unmatched_field_values(fields);
                return TypedExpr::unknown(span);
            }
            other => {
                let found = self.display(other);
                self.report_error(TypeCheckerError::ExpectedClassType { ty: found, span: ty.span() });
                self.check_unmatched_field_values(fields);
                return TypedExpr::unknown(span);
            }
        };

        let inside_class = self.context.owner_type == Some(def);
        let declared: Vec<FieldDef> = self.defs.class_fields(def).map(<[FieldDef]>::to_vec).unwrap_or_default();
        let owner_description = format!("class {}", self.defs.ty(def).name);
        let settable = |field: &FieldDef| !field.is_static && (field.is_public || inside_class);

        let mut values: Vec<TypedFieldValue> = Vec::new();
        for initializer in fields {
            let found = declared
                .iter()
                .enumerate()
                .find(|(_, f)| f.name == initializer.name.name && !f.is_static);
            let Some((index, field)) = found else {
                self.report_error(TypeCheckerError::UnknownField {
                    field: initializer.name.name.clone(),
                    owner: owner_description.clone(),
                    span: initializer.name.span,
                });
                self.check_unmatched_field_values(std::slice::from_ref(initializer));
                continue;
            };
            if !settable(field) {
                self.report_error(TypeCheckerError::PrivateFieldReferenced {
                    field: field.name.clone(),
                    span: initializer.name.span,
                });
            }
            let field_type = self.instantiate_member(def, MemberKey::Field(field.name.clone()), &arguments, &field.ty);
            if let Some(value) = self.check_field_value(initializer, index, &field_type, &values) {
                values.push(value);
            }
        }

        let missing: Vec<String> = declared
            .iter()
            .enumerate()
            .filter(|(index, f)| settable(f) && !values.iter().any(|v| v.index == *index))
            .map(|(_, f)| f.name.clone())
            .collect();
        if !missing.is_empty() {
            self.report_error(TypeCheckerError::FieldsLeftUnassignedInClassInitializer { fields: missing, span });
        }

        values.sort_by_key(|v| v.index);
        let diverges = values.iter().any(|v| v.value.diverges);
        TypedExpr {
            diverges,
            ..TypedExpr::new(TypedExprKind::ObjectInitializer { class: def, fields: values }, class_type, span)
        }
    }

    /// `new Union::Variant { field = value, ... }`
    pub(crate) fn check_union_class_variant_initializer(
        &mut self,
        ty: &TypeIdentifier,
        variant: &Ident,
        fields: &[FieldInitializer],
        span: SourceSpan,
    ) -> TypedExpr {
        let union_type = self.resolve_type(ty, true);
        let (def, arguments) = match &union_type {
            TypeRef::Named { def, arguments } if self.defs.union_variants(*def).is_some() => (*def, arguments.clone()),
            TypeRef::Unknown => {
                self.check_unmatched_field_values(fields);
                return TypedExpr::unknown(span);
            }
            other => {
                let found = self.display(other);
                self.report_error(TypeCheckerError::ExpectedUnionType { ty: found, span: ty.span() });
                self.check_unmatched_field_values(fields);
                return TypedExpr::unknown(span);
            }
        };

        let found = self
            .defs
            .union_variants(def)
            .and_then(|variants| variants.iter().enumerate().find(|(_, v)| v.name == variant.name))
            .map(|(index, v)| (index, v.kind.clone()));
        let declared = match found {
            Some((index, VariantKind::Class { fields })) => Some((index, fields)),
            Some(_) => {
                self.report_error(TypeCheckerError::UnionClassVariantInitializerNotClassVariant {
                    variant: variant.name.clone(),
                    span: variant.span,
                });
                None
            }
            None => {
                let union_name = self.display(&union_type);
                self.report_error(TypeCheckerError::UnknownTypeMember {
                    member: variant.name.clone(),
                    ty: union_name,
                    span: variant.span,
                });
                None
            }
        };
        let Some((variant_index, declared)) = declared else {
            self.check_unmatched_field_values(fields);
            return TypedExpr::unknown(span);
        };

        let owner_description = format!("{}::{}", self.defs.ty(def).name, variant.name);
        let mut values: Vec<TypedFieldValue> = Vec::new();
        for initializer in fields {
            let Some((index, field)) = declared.iter().enumerate().find(|(_, f)| f.name == initializer.name.name) else {
                self.report_error(TypeCheckerError::UnknownField {
                    field: initializer.name.name.clone(),
                    owner: owner_description.clone(),
                    span: initializer.name.span,
                });
                self.check_unmatched_field_values(std::slice::from_ref(initializer));
                continue;
            };
            let key = MemberKey::VariantField {
                variant: variant.name.clone(),
                field: field.name.clone(),
            };
            let field_type = self.instantiate_member(def, key, &arguments, &field.ty);
            if let Some(value) = self.check_field_value(initializer, index, &field_type, &values) {
                values.push(value);
            }
        }

        let missing: Vec<String> = declared
            .iter()
            .enumerate()
            .filter(|(index, _)| !values.iter().any(|v| v.index == *index))
            .map(|(_, f)| f.name.clone())
            .collect();
        if !missing.is_empty() {
            self.report_error(TypeCheckerError::FieldsLeftUnassignedInClassInitializer { fields: missing, span });
        }

        values.sort_by_key(|v| v.index);
        let diverges = values.iter().any(|v| v.value.diverges);
        let kind = TypedExprKind::UnionClassVariantInitializer {
            union: def,
            variant: variant_index,
            fields: values,
        };
        TypedExpr {
            diverges,
            ..TypedExpr::new(kind, union_type, span)
        }
    }

    /// Checks one `field = value`, rejecting a second assignment of the same field.
    fn check_field_value(
        &mut self,
        initializer: &FieldInitializer,
        index: usize,
        field_type: &TypeRef,
        assigned: &[TypedFieldValue],
    ) -> Option<TypedFieldValue> {
        let value = initializer
            .value
            .as_ref()
            .map(|value| self.check_expr_expecting(value, field_type));
        if assigned.iter().any(|v| v.index == index) {
            self.report_error(TypeCheckerError::ClassFieldSetMultipleTypesInInitializer {
                field: initializer.name.name.clone(),
                span: initializer.name.span,
            });
            return None;
        }
        Some(TypedFieldValue {
            index,
            name: initializer.name.name.clone(),
            value: value.unwrap_or_else(|| TypedExpr::unknown(initializer.name.span)),
        })
    }

    /// Checks field values that have no field to go to, for their own errors.
    fn check_unmatched_field_values(&mut self, fields: &[FieldInitializer]) {
        for field in fields {
            if let Some(value) = &field.value {
                self.check_expr(value, true);
            }
        }
    }
}
