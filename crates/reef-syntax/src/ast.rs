//! AST node definitions produced by the parser.
//!
//! The tree is immutable once parsed. Every expression and pattern carries a
//! unique id so later passes can attach information in side tables instead of
//! mutating nodes.

use miette::SourceSpan;

/// Identifies an expression node within one parsed program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

/// Identifies a pattern node within one parsed program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(pub u32);

/// An identifier together with where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: SourceSpan,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: SourceSpan) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A parsed compilation unit. Declaration order is preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangProgram {
    pub module_id: String,
    /// Top level expressions, in source order
    pub expressions: Vec<Expr>,
    pub functions: Vec<LangFunction>,
    pub classes: Vec<ProgramClass>,
    pub unions: Vec<ProgramUnion>,
}

/// Modifiers written before a declaration. Each holds the span of the first occurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub access: Option<SourceSpan>,
    pub static_: Option<SourceSpan>,
    pub mutability: Option<SourceSpan>,
}

impl Modifiers {
    pub fn is_public(&self) -> bool {
        self.access.is_some()
    }

    pub fn is_static(&self) -> bool {
        self.static_.is_some()
    }

    pub fn is_mutable(&self) -> bool {
        self.mutability.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangFunction {
    pub modifiers: Modifiers,
    pub name: Ident,
    pub type_parameters: Vec<Ident>,
    pub parameters: Vec<FunctionParameter>,
    pub return_type: Option<TypeIdentifier>,
    pub body: Block,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionParameter {
    pub name: Ident,
    pub ty: Option<TypeIdentifier>,
    pub mutable: bool,
}

/// A `{ ... }` scope: expressions plus functions declared inside it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Block {
    pub expressions: Vec<Expr>,
    pub functions: Vec<LangFunction>,
    /// The last expression was not followed by `;` and is the block's value.
    pub has_tail: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramClass {
    pub modifiers: Modifiers,
    pub name: Ident,
    pub type_parameters: Vec<Ident>,
    pub functions: Vec<LangFunction>,
    pub fields: Vec<ClassField>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassField {
    pub modifiers: Modifiers,
    pub name: Ident,
    pub ty: Option<TypeIdentifier>,
    /// Only meaningful for static fields
    pub initializer: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramUnion {
    pub modifiers: Modifiers,
    pub name: Ident,
    pub type_parameters: Vec<Ident>,
    pub functions: Vec<LangFunction>,
    pub variants: Vec<UnionVariant>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionVariant {
    pub name: Ident,
    pub kind: UnionVariantKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnionVariantKind {
    Unit,
    Tuple(Vec<TypeIdentifier>),
    Class(Vec<ClassField>),
}

/// A type written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeIdentifier {
    /// `Name` or `Name::<A, B>`
    Named {
        name: Ident,
        type_arguments: Vec<TypeIdentifier>,
        span: SourceSpan,
    },
    /// `(A, B)`
    Tuple {
        members: Vec<TypeIdentifier>,
        span: SourceSpan,
    },
    /// `()`
    Unit { span: SourceSpan },
    /// `Fn(mut A, B): C`
    Function {
        parameters: Vec<FnTypeParameter>,
        return_type: Option<Box<TypeIdentifier>>,
        span: SourceSpan,
    },
}

impl TypeIdentifier {
    pub fn span(&self) -> SourceSpan {
        match self {
            TypeIdentifier::Named { span, .. }
            | TypeIdentifier::Tuple { span, .. }
            | TypeIdentifier::Unit { span }
            | TypeIdentifier::Function { span, .. } => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FnTypeParameter {
    pub ty: TypeIdentifier,
    pub mutable: bool,
}

// --- Expressions ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Plus,
    Minus,
    Multiply,
    Divide,
    LessThan,
    GreaterThan,
    EqualityCheck,
    NegativeEqualityCheck,
    BooleanAnd,
    BooleanOr,
    ValueAssignment,
}

impl BinaryOp {
    /// Binding strength used by the precedence climbing parser. Higher binds tighter.
    pub fn binding_strength(self) -> u8 {
        match self {
            BinaryOp::Multiply | BinaryOp::Divide => 7,
            BinaryOp::Plus | BinaryOp::Minus => 6,
            BinaryOp::LessThan | BinaryOp::GreaterThan => 5,
            BinaryOp::EqualityCheck | BinaryOp::NegativeEqualityCheck => 4,
            BinaryOp::BooleanAnd | BinaryOp::BooleanOr => 2,
            BinaryOp::ValueAssignment => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Postfix `?`
    FallOut,
    /// Prefix `!`
    Not,
}

impl UnaryOp {
    pub fn binding_strength(self) -> u8 {
        match self {
            UnaryOp::FallOut => 10,
            UnaryOp::Not => 9,
        }
    }

    pub fn is_prefix(self) -> bool {
        matches!(self, UnaryOp::Not)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Int(u64),
    String(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    Literal(Literal),
    /// A name, optionally instantiated with explicit type arguments
    Variable {
        name: Ident,
        type_arguments: Option<Vec<TypeIdentifier>>,
    },
    /// `todo!`
    Todo,
    Binary {
        op: BinaryOp,
        op_span: SourceSpan,
        left: Option<Box<Expr>>,
        right: Option<Box<Expr>>,
    },
    Unary {
        op: UnaryOp,
        op_span: SourceSpan,
        operand: Option<Box<Expr>>,
    },
    VariableDeclaration {
        name: Ident,
        mutable: bool,
        ty: Option<TypeIdentifier>,
        value: Option<Box<Expr>>,
    },
    MethodCall {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    MemberAccess {
        owner: Box<Expr>,
        member: Option<Ident>,
        type_arguments: Option<Vec<TypeIdentifier>>,
    },
    StaticMemberAccess {
        ty: TypeIdentifier,
        member: Option<Ident>,
        type_arguments: Option<Vec<TypeIdentifier>>,
    },
    ObjectInitializer {
        ty: TypeIdentifier,
        fields: Vec<FieldInitializer>,
    },
    UnionClassVariantInitializer {
        ty: TypeIdentifier,
        variant: Ident,
        fields: Vec<FieldInitializer>,
    },
    Tuple(Vec<Expr>),
    Block(Block),
    If(IfExpr),
    Match {
        value: Box<Expr>,
        arms: Vec<MatchArm>,
    },
    Matches {
        value: Box<Expr>,
        pattern: Option<Pattern>,
    },
    While {
        condition: Box<Expr>,
        body: Option<Box<Expr>>,
    },
    Break,
    Continue,
    Return(Option<Box<Expr>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInitializer {
    pub name: Ident,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfExpr {
    pub condition: Box<Expr>,
    pub body: Option<Box<Expr>>,
    pub else_ifs: Vec<ElseIf>,
    pub else_body: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElseIf {
    pub condition: Box<Expr>,
    pub body: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub expression: Option<Expr>,
}

// --- Patterns ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub id: PatternId,
    pub kind: PatternKind,
    pub span: SourceSpan,
}

/// A trailing `var [mut] name` that binds the whole matched value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternBinding {
    pub name: Ident,
    pub mutable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternKind {
    /// `_`
    Discard,
    /// `var [mut] name`
    Variable(PatternBinding),
    /// `Type [var x]`
    Type {
        ty: TypeIdentifier,
        binding: Option<PatternBinding>,
    },
    /// `Union::Variant [var x]`
    UnionVariant {
        ty: TypeIdentifier,
        variant: Option<Ident>,
        binding: Option<PatternBinding>,
    },
    /// `Union::Variant(a, b) [var x]`
    UnionTupleVariant {
        ty: TypeIdentifier,
        variant: Ident,
        members: Vec<Pattern>,
        binding: Option<PatternBinding>,
    },
    /// `Union::Variant { a, b: pat, _ } [var x]`
    UnionClassVariant {
        ty: TypeIdentifier,
        variant: Ident,
        fields: Vec<FieldPattern>,
        discard_remaining: bool,
        binding: Option<PatternBinding>,
    },
    /// `Type { a, b: pat, _ } [var x]`
    Class {
        ty: TypeIdentifier,
        fields: Vec<FieldPattern>,
        discard_remaining: bool,
        binding: Option<PatternBinding>,
    },
}

/// `name` or `name: pattern` inside a class or class-variant pattern.
/// A bare `name` binds the field to a variable of the same name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPattern {
    pub name: Ident,
    pub pattern: Option<Pattern>,
}
