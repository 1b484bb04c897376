//! The typed program produced by the checker.
//!
//! Every node carries its resolved type and the references the checker
//! resolved for it, so lowering never needs to look at names again.

use miette::SourceSpan;
use reef_syntax::ast::BinaryOp;

use crate::definitions::Definitions;
use crate::inference::InferenceTable;
use crate::types::{FunctionId, TypeDefId, TypeRef, VariableId};

/// Output of a checking pass.
#[derive(Debug, Clone)]
pub struct TypedProgram {
    pub module_id: String,
    pub definitions: Definitions,
    /// Holds the top level expressions
    pub main: FunctionId,
    /// User classes in declaration order
    pub classes: Vec<TypeDefId>,
    /// User unions in declaration order
    pub unions: Vec<TypeDefId>,
    /// Global functions in declaration order
    pub functions: Vec<FunctionId>,
    pub inference: InferenceTable,
}

/// A reference to a function together with the type arguments it is used with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstantiatedFunction {
    pub function: FunctionId,
    /// Arguments for the generic parameters of the owning type
    pub owner_type_arguments: Vec<TypeRef>,
    pub type_arguments: Vec<TypeRef>,
}

#[derive(Debug, Clone)]
pub struct TypedExpr {
    pub kind: TypedExprKind,
    pub ty: TypeRef,
    pub span: SourceSpan,
    /// Whether the value of this expression is consumed by its parent
    pub value_useful: bool,
    /// Whether control never continues past this expression
    pub diverges: bool,
}

/// A field value written in an initializer.
#[derive(Debug, Clone)]
pub struct TypedFieldValue {
    /// Index of the field in its declaration
    pub index: usize,
    pub name: String,
    pub value: TypedExpr,
}

#[derive(Debug, Clone)]
pub struct TypedElseIf {
    pub condition: TypedExpr,
    pub body: TypedExpr,
}

#[derive(Debug, Clone)]
pub struct TypedMatchArm {
    pub pattern: TypedPattern,
    pub expression: TypedExpr,
    /// Variables bound by the pattern
    pub variables: Vec<VariableId>,
}

#[derive(Debug, Clone)]
pub enum TypedExprKind {
    IntLiteral(u64),
    StringLiteral(String),
    BoolLiteral(bool),
    Todo,
    Variable(VariableId),
    FunctionReference {
        function: InstantiatedFunction,
        /// The instance for instance functions
        receiver: Option<Box<TypedExpr>>,
    },
    Binary {
        op: BinaryOp,
        left: Box<TypedExpr>,
        right: Box<TypedExpr>,
    },
    Assignment {
        target: Box<TypedExpr>,
        value: Box<TypedExpr>,
    },
    Not(Box<TypedExpr>),
    FallOut(Box<TypedExpr>),
    VariableDeclaration {
        variable: VariableId,
        value: Option<Box<TypedExpr>>,
    },
    Call {
        callee: Box<TypedExpr>,
        arguments: Vec<TypedExpr>,
    },
    /// A class field or tuple member read through a value
    FieldAccess {
        owner: Box<TypedExpr>,
        name: String,
        index: usize,
    },
    StaticFieldAccess {
        owner: TypeDefId,
        name: String,
        index: usize,
    },
    UnitVariant {
        union: TypeDefId,
        variant: usize,
    },
    ObjectInitializer {
        class: TypeDefId,
        /// Sorted by field index
        fields: Vec<TypedFieldValue>,
    },
    UnionClassVariantInitializer {
        union: TypeDefId,
        variant: usize,
        /// Sorted by field index
        fields: Vec<TypedFieldValue>,
    },
    Tuple(Vec<TypedExpr>),
    Block {
        expressions: Vec<TypedExpr>,
        has_tail: bool,
    },
    If {
        condition: Box<TypedExpr>,
        body: Box<TypedExpr>,
        else_ifs: Vec<TypedElseIf>,
        else_body: Option<Box<TypedExpr>>,
    },
    Match {
        value: Box<TypedExpr>,
        arms: Vec<TypedMatchArm>,
    },
    Matches {
        value: Box<TypedExpr>,
        pattern: TypedPattern,
        declared_variables: Vec<VariableId>,
    },
    While {
        condition: Box<TypedExpr>,
        body: Box<TypedExpr>,
    },
    Break,
    Continue,
    Return(Option<Box<TypedExpr>>),
    /// Stands in for an expression that failed to check
    Unknown,
}

impl TypedExpr {
    pub fn new(kind: TypedExprKind, ty: TypeRef, span: SourceSpan) -> Self {
        Self {
            kind,
            ty,
            span,
            value_useful: false,
            diverges: false,
        }
    }

    pub fn unknown(span: SourceSpan) -> Self {
        Self {
            kind: TypedExprKind::Unknown,
            ty: TypeRef::Unknown,
            span,
            value_useful: false,
            diverges: false,
        }
    }

    /// Calls `f` on every type stored in this tree.
    pub fn visit_types_mut(&mut self, f: &mut impl FnMut(&mut TypeRef)) {
        f(&mut self.ty);
        match &mut self.kind {
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
            TypedExprKind::FunctionReference { function, receiver } => {
                function.owner_type_arguments.iter_mut().for_each(&mut *f);
                function.type_arguments.iter_mut().for_each(&mut *f);
                if let Some(receiver) = receiver {
                    receiver.visit_types_mut(f);
                }
            }
            TypedExprKind::Binary { left, right, .. } => {
                left.visit_types_mut(f);
                right.visit_types_mut(f);
            }
            TypedExprKind::Assignment { target, value } => {
                target.visit_types_mut(f);
                value.visit_types_mut(f);
            }
            TypedExprKind::Not(operand) | TypedExprKind::FallOut(operand) => operand.visit_types_mut(f),
            TypedExprKind::VariableDeclaration { value, .. } | TypedExprKind::Return(value) => {
                if let Some(value) = value {
                    value.visit_types_mut(f);
                }
            }
            TypedExprKind::Call { callee, arguments } => {
                callee.visit_types_mut(f);
                for argument in arguments {
                    argument.visit_types_mut(f);
                }
            }
            TypedExprKind::FieldAccess { owner, .. } => owner.visit_types_mut(f),
            TypedExprKind::ObjectInitializer { fields, .. }
            | TypedExprKind::UnionClassVariantInitializer { fields, .. } => {
                for field in fields {
                    field.value.visit_types_mut(f);
                }
            }
            TypedExprKind::Tuple(expressions) | TypedExprKind::Block { expressions, .. } => {
                for expression in expressions {
                    expression.visit_types_mut(f);
                }
            }
            TypedExprKind::If {
                condition,
                body,
                else_ifs,
                else_body,
            } => {
                condition.visit_types_mut(f);
                body.visit_types_mut(f);
                for else_if in else_ifs {
                    else_if.condition.visit_types_mut(f);
                    else_if.body.visit_types_mut(f);
                }
                if let Some(else_body) = else_body {
                    else_body.visit_types_mut(f);
                }
            }
            TypedExprKind::Match { value, arms } => {
                value.visit_types_mut(f);
                for arm in arms {
                    arm.pattern.visit_types_mut(f);
                    arm.expression.visit_types_mut(f);
                }
            }
            TypedExprKind::Matches { value, pattern, .. } => {
                value.visit_types_mut(f);
                pattern.visit_types_mut(f);
            }
            TypedExprKind::While { condition, body } => {
                condition.visit_types_mut(f);
                body.visit_types_mut(f);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TypedPattern {
    pub kind: TypedPatternKind,
    /// The type of the value this pattern is matched against
    pub ty: TypeRef,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct TypedFieldPattern {
    pub index: usize,
    pub name: String,
    pub pattern: TypedPattern,
}

#[derive(Debug, Clone)]
pub enum TypedPatternKind {
    Discard,
    Variable(VariableId),
    Type {
        binding: Option<VariableId>,
    },
    UnionVariant {
        union: TypeDefId,
        variant: usize,
        binding: Option<VariableId>,
    },
    UnionTupleVariant {
        union: TypeDefId,
        variant: usize,
        members: Vec<TypedPattern>,
        binding: Option<VariableId>,
    },
    UnionClassVariant {
        union: TypeDefId,
        variant: usize,
        /// In the order written
        fields: Vec<TypedFieldPattern>,
        binding: Option<VariableId>,
    },
    Class {
        class: TypeDefId,
        fields: Vec<TypedFieldPattern>,
        binding: Option<VariableId>,
    },
    Unknown,
}

impl TypedPattern {
    pub fn visit_types_mut(&mut self, f: &mut impl FnMut(&mut TypeRef)) {
        f(&mut self.ty);
        match &mut self.kind {
            TypedPatternKind::UnionTupleVariant { members, .. } => {
                for member in members {
                    member.visit_types_mut(f);
                }
            }
            TypedPatternKind::UnionClassVariant { fields, .. } | TypedPatternKind::Class { fields, .. } => {
                for field in fields {
                    field.pattern.visit_types_mut(f);
                }
            }
            _ => {}
        }
    }

    /// Whether this pattern matches every value of its type.
    pub fn is_irrefutable(&self) -> bool {
        match &self.kind {
            TypedPatternKind::Discard | TypedPatternKind::Variable(_) | TypedPatternKind::Type { .. } => true,
            TypedPatternKind::Class { fields, .. } => fields.iter().all(|f| f.pattern.is_irrefutable()),
            _ => false,
        }
    }
}
