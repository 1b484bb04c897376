use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Errors reported while type checking.
///
/// Checking never stops at the first error; every variant is recorded and the
/// offending expression continues with an unknown type.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum TypeCheckerError {
    /// A name that resolves to no variable, function or type.
    #[error("Symbol '{name}' not found")]
    #[diagnostic(code(reef_types::symbol_not_found))]
    SymbolNotFound {
        name: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Mismatched types: expected {expected}, found {found}")]
    #[diagnostic(code(reef_types::mismatched_types))]
    MismatchedTypes {
        expected: String,
        found: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Expression is not assignable")]
    #[diagnostic(code(reef_types::expression_not_assignable))]
    ExpressionNotAssignable {
        #[label("here")]
        span: SourceSpan,
    },

    /// Assignment to an immutable variable, parameter or field.
    #[error("Cannot assign to '{name}' because it is not mutable")]
    #[diagnostic(code(reef_types::non_mutable_assignment))]
    NonMutableAssignment {
        name: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Cannot assign to a member that is not mutable")]
    #[diagnostic(code(reef_types::non_mutable_member_assignment))]
    NonMutableMemberAssignment {
        #[label("here")]
        span: SourceSpan,
    },

    /// The field is mutable but the value it is reached through is not.
    #[error("Cannot assign to a member of a value that is not mutable")]
    #[diagnostic(code(reef_types::non_mutable_member_owner_assignment))]
    NonMutableMemberOwnerAssignment {
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Function '{function}' mutates its instance but is not marked 'mut'")]
    #[diagnostic(code(reef_types::mutating_instance_in_non_mutable_function))]
    MutatingInstanceInNonMutableFunction {
        function: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Type '{ty}' has no member named '{member}'")]
    #[diagnostic(code(reef_types::unknown_type_member))]
    UnknownTypeMember {
        member: String,
        ty: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Unknown field '{field}' in {owner}")]
    #[diagnostic(code(reef_types::unknown_field))]
    UnknownField {
        /// Field name
        field: String,
        /// What the field was looked up on
        owner: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Fields left unassigned in initializer: {}", fields.join(", "))]
    #[diagnostic(code(reef_types::fields_left_unassigned_in_class_initializer))]
    FieldsLeftUnassignedInClassInitializer {
        fields: Vec<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Field '{field}' is set more than once")]
    #[diagnostic(code(reef_types::class_field_set_multiple_types_in_initializer))]
    ClassFieldSetMultipleTypesInInitializer {
        field: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Field '{field}' is private")]
    #[diagnostic(code(reef_types::private_field_referenced))]
    PrivateFieldReferenced {
        /// Field name
        field: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Expected {expected} arguments, found {found}")]
    #[diagnostic(code(reef_types::incorrect_number_of_method_arguments))]
    IncorrectNumberOfMethodArguments {
        expected: usize,
        found: usize,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Instance member accessed through its type")]
    #[diagnostic(code(reef_types::static_member_access_on_instance_member))]
    StaticMemberAccessOnInstanceMember {
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Static member accessed through an instance")]
    #[diagnostic(code(reef_types::instance_member_access_on_static_member))]
    InstanceMemberAccessOnStaticMember {
        #[label("here")]
        span: SourceSpan,
    },

    /// A read of a local that is not definitely assigned at this point.
    #[error("Variable '{name}' is used before it is assigned")]
    #[diagnostic(code(reef_types::access_uninitialized_variable))]
    AccessUninitializedVariable {
        name: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("'break' used outside of a loop")]
    #[diagnostic(code(reef_types::break_used_outside_of_loop))]
    BreakUsedOutsideOfLoop {
        #[label("here")]
        span: SourceSpan,
    },

    #[error("'continue' used outside of a loop")]
    #[diagnostic(code(reef_types::continue_used_outside_of_loop))]
    ContinueUsedOutsideOfLoop {
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Type arguments can only be given to functions")]
    #[diagnostic(code(reef_types::generic_type_arguments_on_non_function_value))]
    GenericTypeArgumentsOnNonFunctionValue {
        #[label("here")]
        span: SourceSpan,
    },

    #[error("A type named '{name}' is already defined")]
    #[diagnostic(code(reef_types::conflicting_type_name))]
    ConflictingTypeName {
        name: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("A function named '{name}' is already defined")]
    #[diagnostic(code(reef_types::conflicting_function_name))]
    ConflictingFunctionName {
        /// Name as written
        name: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Variant '{name}' is declared more than once")]
    #[diagnostic(code(reef_types::duplicate_variant_name))]
    DuplicateVariantName {
        name: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Field '{field}' is declared more than once in {union}::{variant}")]
    #[diagnostic(code(reef_types::duplicate_field_in_union_class_variant))]
    DuplicateFieldInUnionClassVariant {
        union: String,
        variant: String,
        field: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Generic parameter '{name}' is declared more than once")]
    #[diagnostic(code(reef_types::duplicate_generic_parameter))]
    DuplicateGenericParameter {
        /// Name as written
        name: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Generic parameter '{name}' shadows a parameter of the enclosing declaration")]
    #[diagnostic(code(reef_types::conflicting_type_parameter))]
    ConflictingTypeParameter {
        name: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Parameter '{name}' is declared more than once in '{function}'")]
    #[diagnostic(code(reef_types::duplicate_function_parameter))]
    DuplicateFunctionParameter {
        name: String,
        function: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Generic parameter '{name}' has the same name as a type")]
    #[diagnostic(code(reef_types::type_parameter_conflicts_with_type))]
    TypeParameterConflictsWithType {
        /// Name as written
        name: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Static function '{function}' cannot be 'mut'")]
    #[diagnostic(code(reef_types::static_function_marked_as_mutable))]
    StaticFunctionMarkedAsMutable {
        function: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Global function '{function}' cannot be 'mut'")]
    #[diagnostic(code(reef_types::global_function_marked_as_mutable))]
    GlobalFunctionMarkedAsMutable {
        function: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Mutable function '{function}' cannot be declared inside a function that is not 'mut'")]
    #[diagnostic(code(reef_types::cannot_create_mutable_function_within_non_mutable_function))]
    CannotCreateMutableFunctionWithinNonMutableFunction {
        /// Function name
        function: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Variable '{name}' is already declared")]
    #[diagnostic(code(reef_types::duplicate_variable_declaration))]
    DuplicateVariableDeclaration {
        name: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Expected {expected} type arguments, found {found}")]
    #[diagnostic(code(reef_types::incorrect_number_of_type_arguments))]
    IncorrectNumberOfTypeArguments {
        expected: usize,
        found: usize,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("'this' is only available in instance functions")]
    #[diagnostic(code(reef_types::this_accessed_outside_of_instance_method))]
    ThisAccessedOutsideOfInstanceMethod {
        #[label("here")]
        span: SourceSpan,
    },

    #[error("The value of an if expression is used but it has no else branch")]
    #[diagnostic(code(reef_types::if_expression_value_used_without_else_branch))]
    IfExpressionValueUsedWithoutElseBranch {
        #[label("here")]
        span: SourceSpan,
    },

    #[error("The type of '{name}' could not be inferred")]
    #[diagnostic(code(reef_types::unresolved_inferred_variable_type))]
    UnresolvedInferredVariableType {
        name: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Expected {expected} patterns for tuple variant, found {found}")]
    #[diagnostic(code(reef_types::incorrect_number_of_patterns_in_tuple_variant_union_pattern))]
    IncorrectNumberOfPatternsInTupleVariantUnionPattern {
        /// Expected
        expected: usize,
        /// Found
        found: usize,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("'{ty}' is not a class")]
    #[diagnostic(code(reef_types::non_class_used_in_class_pattern))]
    NonClassUsedInClassPattern {
        ty: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Pattern does not list fields {}; add '_' to ignore them", fields.join(", "))]
    #[diagnostic(code(reef_types::missing_fields_in_union_class_variant_pattern))]
    MissingFieldsInUnionClassVariantPattern {
        fields: Vec<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Pattern does not list fields {}; add '_' to ignore them", fields.join(", "))]
    #[diagnostic(code(reef_types::missing_fields_in_class_pattern))]
    MissingFieldsInClassPattern {
        /// Field names
        fields: Vec<String>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Variant '{variant}' is not a class variant")]
    #[diagnostic(code(reef_types::union_class_variant_initializer_not_class_variant))]
    UnionClassVariantInitializerNotClassVariant {
        variant: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Members cannot be accessed on a value of generic type")]
    #[diagnostic(code(reef_types::member_access_on_generic_expression))]
    MemberAccessOnGenericExpression {
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Static members cannot be accessed on a generic type")]
    #[diagnostic(code(reef_types::static_member_access_on_generic_reference))]
    StaticMemberAccessOnGenericReference {
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Class variants must be created with an initializer")]
    #[diagnostic(code(reef_types::union_class_variant_without_initializer))]
    UnionClassVariantWithoutInitializer {
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Static field '{field}' cannot be matched in a pattern")]
    #[diagnostic(code(reef_types::static_field_in_class_pattern))]
    StaticFieldInClassPattern {
        field: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Instance member '{name}' is not available in a static function")]
    #[diagnostic(code(reef_types::access_instance_member_in_static_context))]
    AccessInstanceMemberInStaticContext {
        /// Name as written
        name: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Static local function accesses outer variable '{name}'")]
    #[diagnostic(code(reef_types::static_local_function_accesses_outer_variable))]
    StaticLocalFunctionAccessesOuterVariable {
        name: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("A value of type {ty} cannot be called")]
    #[diagnostic(code(reef_types::expression_not_callable))]
    ExpressionNotCallable {
        ty: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("The '?' operator can only be used in a function returning result")]
    #[diagnostic(code(reef_types::fall_out_operator_outside_result_function))]
    FallOutOperatorOutsideResultFunction {
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Static field '{field}' needs an initializer")]
    #[diagnostic(code(reef_types::static_field_without_initializer))]
    StaticFieldWithoutInitializer {
        field: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Instance field '{field}' cannot have an initializer")]
    #[diagnostic(code(reef_types::instance_field_with_initializer))]
    InstanceFieldWithInitializer {
        field: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Field '{field}' is declared more than once")]
    #[diagnostic(code(reef_types::duplicate_field))]
    DuplicateField {
        /// Field name
        field: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Expected a class, found '{ty}'")]
    #[diagnostic(code(reef_types::expected_class_type))]
    ExpectedClassType {
        ty: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Expected a union, found '{ty}'")]
    #[diagnostic(code(reef_types::expected_union_type))]
    ExpectedUnionType {
        ty: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Tuple variant {union}::{variant} has no members")]
    #[diagnostic(code(reef_types::empty_union_tuple_variant))]
    EmptyUnionTupleVariant {
        /// Union name
        union: String,
        /// Variant name
        variant: String,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("Variant '{variant}' is not a {expected} variant")]
    #[diagnostic(code(reef_types::variant_pattern_kind_mismatch))]
    VariantPatternKindMismatch {
        variant: String,
        expected: &'static str,
        #[label("here")]
        span: SourceSpan,
    },
}

/// Fieldless mirror of [`TypeCheckerError`] for exact assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCheckerErrorKind {
    SymbolNotFound,
    MismatchedTypes,
    ExpressionNotAssignable,
    NonMutableAssignment,
    NonMutableMemberAssignment,
    NonMutableMemberOwnerAssignment,
    MutatingInstanceInNonMutableFunction,
    UnknownTypeMember,
    UnknownField,
    FieldsLeftUnassignedInClassInitializer,
    ClassFieldSetMultipleTypesInInitializer,
    PrivateFieldReferenced,
    IncorrectNumberOfMethodArguments,
    StaticMemberAccessOnInstanceMember,
    InstanceMemberAccessOnStaticMember,
    AccessUninitializedVariable,
    BreakUsedOutsideOfLoop,
    ContinueUsedOutsideOfLoop,
    GenericTypeArgumentsOnNonFunctionValue,
    ConflictingTypeName,
    ConflictingFunctionName,
    DuplicateVariantName,
    DuplicateFieldInUnionClassVariant,
    DuplicateGenericParameter,
    ConflictingTypeParameter,
    DuplicateFunctionParameter,
    TypeParameterConflictsWithType,
    StaticFunctionMarkedAsMutable,
    GlobalFunctionMarkedAsMutable,
    CannotCreateMutableFunctionWithinNonMutableFunction,
    DuplicateVariableDeclaration,
    IncorrectNumberOfTypeArguments,
    ThisAccessedOutsideOfInstanceMethod,
    IfExpressionValueUsedWithoutElseBranch,
    UnresolvedInferredVariableType,
    IncorrectNumberOfPatternsInTupleVariantUnionPattern,
    NonClassUsedInClassPattern,
    MissingFieldsInUnionClassVariantPattern,
    MissingFieldsInClassPattern,
    UnionClassVariantInitializerNotClassVariant,
    MemberAccessOnGenericExpression,
    StaticMemberAccessOnGenericReference,
    UnionClassVariantWithoutInitializer,
    StaticFieldInClassPattern,
    AccessInstanceMemberInStaticContext,
    StaticLocalFunctionAccessesOuterVariable,
    ExpressionNotCallable,
    FallOutOperatorOutsideResultFunction,
    StaticFieldWithoutInitializer,
    InstanceFieldWithInitializer,
    DuplicateField,
    ExpectedClassType,
    ExpectedUnionType,
    EmptyUnionTupleVariant,
    VariantPatternKindMismatch,
}

impl TypeCheckerError {
    pub fn kind(&self) -> TypeCheckerErrorKind {
        match self {
            Self::SymbolNotFound { .. } => TypeCheckerErrorKind::SymbolNotFound,
            Self::MismatchedTypes { .. } => TypeCheckerErrorKind::MismatchedTypes,
            Self::ExpressionNotAssignable { .. } => TypeCheckerErrorKind::ExpressionNotAssignable,
            Self::NonMutableAssignment { .. } => TypeCheckerErrorKind::NonMutableAssignment,
            Self::NonMutableMemberAssignment { .. } => TypeCheckerErrorKind::NonMutableMemberAssignment,
            Self::NonMutableMemberOwnerAssignment { .. } => TypeCheckerErrorKind::NonMutableMemberOwnerAssignment,
            Self::MutatingInstanceInNonMutableFunction { .. } => TypeCheckerErrorKind::MutatingInstanceInNonMutableFunction,
            Self::UnknownTypeMember { .. } => TypeCheckerErrorKind::UnknownTypeMember,
            Self::UnknownField { .. } => TypeCheckerErrorKind::UnknownField,
            Self::FieldsLeftUnassignedInClassInitializer { .. } => TypeCheckerErrorKind::FieldsLeftUnassignedInClassInitializer,
            Self::ClassFieldSetMultipleTypesInInitializer { .. } => TypeCheckerErrorKind::ClassFieldSetMultipleTypesInInitializer,
            Self::PrivateFieldReferenced { .. } => TypeCheckerErrorKind::PrivateFieldReferenced,
            Self::IncorrectNumberOfMethodArguments { .. } => TypeCheckerErrorKind::IncorrectNumberOfMethodArguments,
            Self::StaticMemberAccessOnInstanceMember { .. } => TypeCheckerErrorKind::StaticMemberAccessOnInstanceMember,
            Self::InstanceMemberAccessOnStaticMember { .. } => TypeCheckerErrorKind::InstanceMemberAccessOnStaticMember,
            Self::AccessUninitializedVariable { .. } => TypeCheckerErrorKind::AccessUninitializedVariable,
            Self::BreakUsedOutsideOfLoop { .. } => TypeCheckerErrorKind::BreakUsedOutsideOfLoop,
            Self::ContinueUsedOutsideOfLoop { .. } => TypeCheckerErrorKind::ContinueUsedOutsideOfLoop,
            Self::GenericTypeArgumentsOnNonFunctionValue { .. } => TypeCheckerErrorKind::GenericTypeArgumentsOnNonFunctionValue,
            Self::ConflictingTypeName { .. } => TypeCheckerErrorKind::ConflictingTypeName,
            Self::ConflictingFunctionName { .. } => TypeCheckerErrorKind::ConflictingFunctionName,
            Self::DuplicateVariantName { .. } => TypeCheckerErrorKind::DuplicateVariantName,
            Self::DuplicateFieldInUnionClassVariant { .. } => TypeCheckerErrorKind::DuplicateFieldInUnionClassVariant,
            Self::DuplicateGenericParameter { .. } => TypeCheckerErrorKind::DuplicateGenericParameter,
            Self::ConflictingTypeParameter { .. } => TypeCheckerErrorKind::ConflictingTypeParameter,
            Self::DuplicateFunctionParameter { .. } => TypeCheckerErrorKind::DuplicateFunctionParameter,
            Self::TypeParameterConflictsWithType { .. } => TypeCheckerErrorKind::TypeParameterConflictsWithType,
            Self::StaticFunctionMarkedAsMutable { .. } => TypeCheckerErrorKind::StaticFunctionMarkedAsMutable,
            Self::GlobalFunctionMarkedAsMutable { .. } => TypeCheckerErrorKind::GlobalFunctionMarkedAsMutable,
            Self::CannotCreateMutableFunctionWithinNonMutableFunction { .. } => TypeCheckerErrorKind::CannotCreateMutableFunctionWithinNonMutableFunction,
            Self::DuplicateVariableDeclaration { .. } => TypeCheckerErrorKind::DuplicateVariableDeclaration,
            Self::IncorrectNumberOfTypeArguments { .. } => TypeCheckerErrorKind::IncorrectNumberOfTypeArguments,
            Self::ThisAccessedOutsideOfInstanceMethod { .. } => TypeCheckerErrorKind::ThisAccessedOutsideOfInstanceMethod,
            Self::IfExpressionValueUsedWithoutElseBranch { .. } => TypeCheckerErrorKind::IfExpressionValueUsedWithoutElseBranch,
            Self::UnresolvedInferredVariableType { .. } => TypeCheckerErrorKind::UnresolvedInferredVariableType,
            Self::IncorrectNumberOfPatternsInTupleVariantUnionPattern { .. } => TypeCheckerErrorKind::IncorrectNumberOfPatternsInTupleVariantUnionPattern,
            Self::NonClassUsedInClassPattern { .. } => TypeCheckerErrorKind::NonClassUsedInClassPattern,
            Self::MissingFieldsInUnionClassVariantPattern { .. } => TypeCheckerErrorKind::MissingFieldsInUnionClassVariantPattern,
            Self::MissingFieldsInClassPattern { .. } => TypeCheckerErrorKind::MissingFieldsInClassPattern,
            Self::UnionClassVariantInitializerNotClassVariant { .. } => TypeCheckerErrorKind::UnionClassVariantInitializerNotClassVariant,
            Self::MemberAccessOnGenericExpression { .. } => TypeCheckerErrorKind::MemberAccessOnGenericExpression,
            Self::StaticMemberAccessOnGenericReference { .. } => TypeCheckerErrorKind::StaticMemberAccessOnGenericReference,
            Self::UnionClassVariantWithoutInitializer { .. } => TypeCheckerErrorKind::UnionClassVariantWithoutInitializer,
            Self::StaticFieldInClassPattern { .. } => TypeCheckerErrorKind::StaticFieldInClassPattern,
            Self::AccessInstanceMemberInStaticContext { .. } => TypeCheckerErrorKind::AccessInstanceMemberInStaticContext,
            Self::StaticLocalFunctionAccessesOuterVariable { .. } => TypeCheckerErrorKind::StaticLocalFunctionAccessesOuterVariable,
            Self::ExpressionNotCallable { .. } => TypeCheckerErrorKind::ExpressionNotCallable,
            Self::FallOutOperatorOutsideResultFunction { .. } => TypeCheckerErrorKind::FallOutOperatorOutsideResultFunction,
            Self::StaticFieldWithoutInitializer { .. } => TypeCheckerErrorKind::StaticFieldWithoutInitializer,
            Self::InstanceFieldWithInitializer { .. } => TypeCheckerErrorKind::InstanceFieldWithInitializer,
            Self::DuplicateField { .. } => TypeCheckerErrorKind::DuplicateField,
            Self::ExpectedClassType { .. } => TypeCheckerErrorKind::ExpectedClassType,
            Self::ExpectedUnionType { .. } => TypeCheckerErrorKind::ExpectedUnionType,
            Self::EmptyUnionTupleVariant { .. } => TypeCheckerErrorKind::EmptyUnionTupleVariant,
            Self::VariantPatternKindMismatch { .. } => TypeCheckerErrorKind::VariantPatternKindMismatch,
        }
    }

    pub fn span(&self) -> SourceSpan {
        match self {
            Self::SymbolNotFound { span, .. }
            | Self::MismatchedTypes { span, .. }
            | Self::ExpressionNotAssignable { span, .. }
            | Self::NonMutableAssignment { span, .. }
            | Self::NonMutableMemberAssignment { span, .. }
            | Self::NonMutableMemberOwnerAssignment { span, .. }
            | Self::MutatingInstanceInNonMutableFunction { span, .. }
            | Self::UnknownTypeMember { span, .. }
            | Self::UnknownField { span, .. }
            | Self::FieldsLeftUnassignedInClassInitializer { span, .. }
            | Self::ClassFieldSetMultipleTypesInInitializer { span, .. }
            | Self::PrivateFieldReferenced { span, .. }
            | Self::IncorrectNumberOfMethodArguments { span, .. }
            | Self::StaticMemberAccessOnInstanceMember { span, .. }
            | Self::InstanceMemberAccessOnStaticMember { span, .. }
            | Self::AccessUninitializedVariable { span, .. }
            | Self::BreakUsedOutsideOfLoop { span, .. }
            | Self::ContinueUsedOutsideOfLoop { span, .. }
            | Self::GenericTypeArgumentsOnNonFunctionValue { span, .. }
            | Self::ConflictingTypeName { span, .. }
            | Self::ConflictingFunctionName { span, .. }
            | Self::DuplicateVariantName { span, .. }
            | Self::DuplicateFieldInUnionClassVariant { span, .. }
            | Self::DuplicateGenericParameter { span, .. }
            | Self::ConflictingTypeParameter { span, .. }
            | Self::DuplicateFunctionParameter { span, .. }
            | Self::TypeParameterConflictsWithType { span, .. }
            | Self::StaticFunctionMarkedAsMutable { span, .. }
            | Self::GlobalFunctionMarkedAsMutable { span, .. }
            | Self::CannotCreateMutableFunctionWithinNonMutableFunction { span, .. }
            | Self::DuplicateVariableDeclaration { span, .. }
            | Self::IncorrectNumberOfTypeArguments { span, .. }
            | Self::ThisAccessedOutsideOfInstanceMethod { span, .. }
            | Self::IfExpressionValueUsedWithoutElseBranch { span, .. }
            | Self::UnresolvedInferredVariableType { span, .. }
            | Self::IncorrectNumberOfPatternsInTupleVariantUnionPattern { span, .. }
            | Self::NonClassUsedInClassPattern { span, .. }
            | Self::MissingFieldsInUnionClassVariantPattern { span, .. }
            | Self::MissingFieldsInClassPattern { span, .. }
            | Self::UnionClassVariantInitializerNotClassVariant { span, .. }
            | Self::MemberAccessOnGenericExpression { span, .. }
            | Self::StaticMemberAccessOnGenericReference { span, .. }
            | Self::UnionClassVariantWithoutInitializer { span, .. }
            | Self::StaticFieldInClassPattern { span, .. }
            | Self::AccessInstanceMemberInStaticContext { span, .. }
            | Self::StaticLocalFunctionAccessesOuterVariable { span, .. }
            | Self::ExpressionNotCallable { span, .. }
            | Self::FallOutOperatorOutsideResultFunction { span, .. }
            | Self::StaticFieldWithoutInitializer { span, .. }
            | Self::InstanceFieldWithInitializer { span, .. }
            | Self::DuplicateField { span, .. }
            | Self::ExpectedClassType { span, .. }
            | Self::ExpectedUnionType { span, .. }
            | Self::EmptyUnionTupleVariant { span, .. }
            | Self::VariantPatternKindMismatch { span, .. }
            => *span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_items() {
        let error = TypeCheckerError::FieldsLeftUnassignedInClassInitializer {
            fields: vec!["A".to_owned(), "B".to_owned()],
            span: SourceSpan::from(0..3),
        };
        assert_eq!(error.to_string(), "Fields left unassigned in initializer: A, B");
        assert_eq!(error.kind(), TypeCheckerErrorKind::FieldsLeftUnassignedInClassInitializer);
        assert_eq!(error.span(), SourceSpan::from(0..3));
    }
}
