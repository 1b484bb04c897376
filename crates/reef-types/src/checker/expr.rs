//! Expression checking: dispatch, literals, names, calls, tuples and
//! variable declarations.

use miette::SourceSpan;
use reef_syntax::ast::{Expr, ExprKind, Ident, Literal, TypeIdentifier};

use super::TypeChecker;
use crate::error::TypeCheckerError;
use crate::inference::VarKind;
use crate::typed::{TypedExpr, TypedExprKind};
use crate::types::{FunctionId, FunctionParameterType, FunctionType, TypeRef};

impl TypeChecker {
    /// Checks `expr`. `value_useful` tells whether the parent consumes its value.
    pub(crate) fn check_expr(&mut self, expr: &Expr, value_useful: bool) -> TypedExpr {
        let span = expr.span;
        let mut typed = match &expr.kind {
            ExprKind::Literal(literal) => self.check_literal(literal, span),
            ExprKind::Variable { name, type_arguments } => {
                self.check_variable(name, type_arguments.as_deref(), span, false)
            }
            ExprKind::Todo => TypedExpr {
                diverges: true,
                ..TypedExpr::new(TypedExprKind::Todo, TypeRef::never(), span)
            },
            ExprKind::Binary { op, left, right, .. } => {
                self.check_binary(*op, left.as_deref(), right.as_deref(), span)
            }
            ExprKind::Unary { op, operand, .. } => self.check_unary(*op, operand.as_deref(), span),
            ExprKind::VariableDeclaration {
                name,
                mutable,
                ty,
                value,
            } => self.check_variable_declaration(name, *mutable, ty.as_ref(), value.as_deref(), span),
            ExprKind::MethodCall { callee, arguments } => self.check_call(callee, arguments, span),
            ExprKind::MemberAccess {
                owner,
                member,
                type_arguments,
            } => self.check_member_access(owner, member.as_ref(), type_arguments.as_deref(), span),
            ExprKind::StaticMemberAccess {
                ty,
                member,
                type_arguments,
            } => self.check_static_member_access(ty, member.as_ref(), type_arguments.as_deref(), span),
            ExprKind::ObjectInitializer { ty, fields } => self.check_object_initializer(ty, fields, span),
            ExprKind::UnionClassVariantInitializer { ty, variant, fields } => {
                self.check_union_class_variant_initializer(ty, variant, fields, span)
            }
            ExprKind::Tuple(elements) => self.check_tuple(elements, span, value_useful),
            ExprKind::Block(block) => self.check_block(block, span, value_useful),
            ExprKind::If(if_expr) => self.check_if(if_expr, span, value_useful),
            ExprKind::Match { value, arms } => self.check_match(value, arms, span, value_useful),
            ExprKind::Matches { value, pattern } => self.check_matches(value, pattern.as_ref(), span),
            ExprKind::While { condition, body } => self.check_while(condition, body.as_deref(), span),
            ExprKind::Break => self.check_loop_jump(true, span),
            ExprKind::Continue => self.check_loop_jump(false, span),
            ExprKind::Return(value) => self.check_return(value.as_deref(), span),
        };
        typed.value_useful = value_useful;
        typed
    }

    /// Checks `expr` as a used value of type `expected`.
    pub(crate) fn check_expr_expecting(&mut self, expr: &Expr, expected: &TypeRef) -> TypedExpr {
        let typed = self.check_expr(expr, true);
        self.expect_type(&typed.ty, expected, typed.span);
        typed
    }

    /// Checks an optional sub-expression the parser may have left out.
    pub(crate) fn check_optional(&mut self, expr: Option<&Expr>, value_useful: bool, span: SourceSpan) -> TypedExpr {
        match expr {
            Some(expr) => self.check_expr(expr, value_useful),
            None => TypedExpr::unknown(span),
        }
    }

    fn check_literal(&mut self, literal: &Literal, span: SourceSpan) -> TypedExpr {
        match literal {
            Literal::Int(value) => {
                let ty = self.table.fresh_int();
                TypedExpr::new(TypedExprKind::IntLiteral(*value), ty, span)
            }
            Literal::String(value) => TypedExpr::new(TypedExprKind::StringLiteral(value.clone()), TypeRef::string(), span),
            Literal::Bool(value) => TypedExpr::new(TypedExprKind::BoolLiteral(*value), TypeRef::bool(), span),
        }
    }

    /// Resolves a bare name.
    ///
    /// Functions in scope are found first, then functions of the enclosing
    /// type, then variables, then fields of the enclosing type.
    pub(crate) fn check_variable(
        &mut self,
        name: &Ident,
        type_arguments: Option<&[TypeIdentifier]>,
        span: SourceSpan,
        allow_uninstantiated: bool,
    ) -> TypedExpr {
        if name.name == "this" && self.lookup_variable("this").is_none() {
            if self.context.this_variable.is_none() {
                self.report_error(TypeCheckerError::ThisAccessedOutsideOfInstanceMethod { span });
                return TypedExpr::unknown(span);
            }
            return self.this_expr(span);
        }

        if let Some(function) = self.lookup_function(&name.name) {
            let owner_arguments = self.fresh_owner_arguments(function);
            return self.function_reference(function, owner_arguments, type_arguments, None, span);
        }

        if let Some(owner) = self.context.owner_type {
            if let Some(function) = self.defs.type_function(owner, &name.name) {
                let receiver = if self.defs.function(function).is_instance() {
                    if self.context.is_static || self.context.this_variable.is_none() {
                        self.report_error(TypeCheckerError::AccessInstanceMemberInStaticContext {
                            name: name.name.clone(),
                            span,
                        });
                        return TypedExpr::unknown(span);
                    }
                    Some(self.this_expr(span))
                } else {
                    None
                };
                let TypeRef::Named { arguments, .. } = self.defs.self_type(owner) else {
                    return TypedExpr::unknown(span);
                };
                return self.function_reference(function, arguments, type_arguments, receiver, span);
            }
        }

        if let Some(variable) = self.lookup_variable(&name.name) {
            if type_arguments.is_some() {
                self.report_error(TypeCheckerError::GenericTypeArgumentsOnNonFunctionValue { span });
            }
            let owned = self.defs.variable(variable).function() == self.context.function;
            if !self.capture(variable, span) {
                return TypedExpr::unknown(span);
            }
            if owned && !allow_uninstantiated && !self.instantiated.contains(&variable) {
                self.report_error(TypeCheckerError::AccessUninitializedVariable {
                    name: name.name.clone(),
                    span,
                });
            }
            let ty = self.defs.variable(variable).ty.clone();
            return TypedExpr::new(TypedExprKind::Variable(variable), ty, span);
        }

        if let Some(owner) = self.context.owner_type {
            let field = self.defs.class_fields(owner).and_then(|fields| {
                fields
                    .iter()
                    .enumerate()
                    .find(|(_, f)| f.name == name.name)
                    .map(|(index, f)| (index, f.is_static, f.ty.clone()))
            });
            if let Some((index, is_static, ty)) = field {
                if type_arguments.is_some() {
                    self.report_error(TypeCheckerError::GenericTypeArgumentsOnNonFunctionValue { span });
                }
                if is_static {
                    let kind = TypedExprKind::StaticFieldAccess {
                        owner,
                        name: name.name.clone(),
                        index,
                    };
                    return TypedExpr::new(kind, ty, span);
                }
                if self.context.is_static || self.context.this_variable.is_none() {
                    self.report_error(TypeCheckerError::AccessInstanceMemberInStaticContext {
                        name: name.name.clone(),
                        span,
                    });
                    return TypedExpr::unknown(span);
                }
                let this = self.this_expr(span);
                let kind = TypedExprKind::FieldAccess {
                    owner: Box::new(this),
                    name: name.name.clone(),
                    index,
                };
                return TypedExpr::new(kind, ty, span);
            }
        }

        self.report_error(TypeCheckerError::SymbolNotFound {
            name: name.name.clone(),
            span: name.span,
        });
        TypedExpr::unknown(span)
    }

    /// A read of `this`, captured when the current function is a local one.
    pub(crate) fn this_expr(&mut self, span: SourceSpan) -> TypedExpr {
        let Some(this) = self.context.this_variable else {
            return TypedExpr::unknown(span);
        };
        if !self.capture(this, span) {
            return TypedExpr::unknown(span);
        }
        let ty = self.defs.variable(this).ty.clone();
        TypedExpr::new(TypedExprKind::Variable(this), ty, span)
    }

    pub(crate) fn function_reference(
        &mut self,
        function: FunctionId,
        owner_type_arguments: Vec<TypeRef>,
        type_arguments: Option<&[TypeIdentifier]>,
        receiver: Option<TypedExpr>,
        span: SourceSpan,
    ) -> TypedExpr {
        let (function, ty) = self.instantiate_function(function, owner_type_arguments, type_arguments, span);
        let diverges = receiver.as_ref().is_some_and(|r| r.diverges);
        TypedExpr {
            diverges,
            ..TypedExpr::new(
                TypedExprKind::FunctionReference {
                    function,
                    receiver: receiver.map(Box::new),
                },
                ty,
                span,
            )
        }
    }

    fn check_call(&mut self, callee: &Expr, arguments: &[Expr], span: SourceSpan) -> TypedExpr {
        let callee = self.check_expr(callee, true);
        let mut callee_type = self.table.shallow_resolve(&callee.ty);

        // A callee of still unknown type is assumed to be a function of the
        // written arity.
        if let TypeRef::Var(var) = callee_type {
            if self.table.kind(var) == VarKind::General {
                let function = TypeRef::Function(Box::new(FunctionType {
                    parameters: arguments
                        .iter()
                        .map(|_| FunctionParameterType {
                            ty: self.table.fresh_var(),
                            mutable: false,
                        })
                        .collect(),
                    return_type: self.table.fresh_var(),
                }));
                self.table.unify(&callee_type, &function);
                callee_type = function;
            }
        }

        let (parameters, return_type) = match callee_type {
            TypeRef::Function(function) => {
                let FunctionType {
                    parameters,
                    return_type,
                } = *function;
                (Some(parameters), return_type)
            }
            TypeRef::Unknown => (None, TypeRef::Unknown),
            other => {
                let ty = self.display(&other);
                self.report_error(TypeCheckerError::ExpressionNotCallable { ty, span: callee.span });
                (None, TypeRef::Unknown)
            }
        };

        if let Some(parameters) = &parameters {
            if parameters.len() != arguments.len() {
                self.report_error(TypeCheckerError::IncorrectNumberOfMethodArguments {
                    expected: parameters.len(),
                    found: arguments.len(),
                    span,
                });
            }
        }

        let mut checked = Vec::with_capacity(arguments.len());
        for (index, argument) in arguments.iter().enumerate() {
            let parameter = parameters.as_ref().and_then(|p| p.get(index));
            let typed = match parameter {
                Some(parameter) => {
                    let typed = self.check_expr_expecting(argument, &parameter.ty);
                    if parameter.mutable {
                        self.expect_assignable(&typed);
                    }
                    typed
                }
                None => self.check_expr(argument, true),
            };
            checked.push(typed);
        }

        let diverges = callee.diverges || checked.iter().any(|a| a.diverges);
        TypedExpr {
            diverges,
            ..TypedExpr::new(
                TypedExprKind::Call {
                    callee: Box::new(callee),
                    arguments: checked,
                },
                return_type,
                span,
            )
        }
    }

    fn check_tuple(&mut self, elements: &[Expr], span: SourceSpan, value_useful: bool) -> TypedExpr {
        match elements {
            [single] => self.check_expr(single, value_useful),
            [] => TypedExpr::new(TypedExprKind::Tuple(Vec::new()), TypeRef::unit(), span),
            elements => {
                let elements: Vec<TypedExpr> = elements.iter().map(|e| self.check_expr(e, true)).collect();
                let ty = TypeRef::Tuple(elements.iter().map(|e| e.ty.clone()).collect());
                let diverges = elements.iter().any(|e| e.diverges);
                TypedExpr {
                    diverges,
                    ..TypedExpr::new(TypedExprKind::Tuple(elements), ty, span)
                }
            }
        }
    }

    fn check_variable_declaration(
        &mut self,
        name: &Ident,
        mutable: bool,
        ty: Option<&TypeIdentifier>,
        value: Option<&Expr>,
        span: SourceSpan,
    ) -> TypedExpr {
        let declared = ty.map(|ty| self.resolve_type(ty, true));
        let value = value.map(|value| match &declared {
            Some(declared) => self.check_expr_expecting(value, declared),
            None => self.check_expr(value, true),
        });

        let variable_type = match (&declared, &value) {
            (Some(declared), _) => declared.clone(),
            (None, Some(value)) => value.ty.clone(),
            (None, None) => self.table.fresh_var(),
        };
        let diverges = value.as_ref().is_some_and(|v| v.diverges);
        let Some(variable) = self.declare_variable(name, variable_type, mutable) else {
            return TypedExpr::unknown(span);
        };
        if value.is_some() {
            self.instantiated.insert(variable);
        }

        TypedExpr {
            diverges,
            ..TypedExpr::new(
                TypedExprKind::VariableDeclaration {
                    variable,
                    value: value.map(Box::new),
                },
                TypeRef::unit(),
                span,
            )
        }
    }
}
