//! Binary and unary operators, assignment and assignability.

use miette::SourceSpan;
use reef_syntax::ast::{BinaryOp, Expr, ExprKind, UnaryOp};

use super::control_flow::matched_variables;
use super::TypeChecker;
use crate::definitions::{TypeDefKind, VariableKind};
use crate::error::TypeCheckerError;
use crate::typed::{TypedExpr, TypedExprKind};
use crate::types::{TypeDefId, TypeRef};

impl TypeChecker {
    pub(crate) fn check_binary(
        &mut self,
        op: BinaryOp,
        left: Option<&Expr>,
        right: Option<&Expr>,
        span: SourceSpan,
    ) -> TypedExpr {
        let (left, right, ty) = match op {
            BinaryOp::BooleanAnd => {
                let left = self.check_operand(left, Some(&TypeRef::bool()), span);
                // `matches` bindings on the left hold while the right is evaluated
                let bound: Vec<_> = matched_variables(&left)
                    .into_iter()
                    .filter(|variable| self.instantiated.insert(*variable))
                    .collect();
                let right = self.check_operand(right, Some(&TypeRef::bool()), span);
                for variable in &bound {
                    self.instantiated.remove(variable);
                }
                (left, right, TypeRef::bool())
            }
            BinaryOp::BooleanOr => {
                let left = self.check_operand(left, Some(&TypeRef::bool()), span);
                let right = self.check_operand(right, Some(&TypeRef::bool()), span);
                (left, right, TypeRef::bool())
            }
            BinaryOp::EqualityCheck | BinaryOp::NegativeEqualityCheck => {
                let left = self.check_operand(left, None, span);
                let resolved = self.table.shallow_resolve(&left.ty);
                if !resolved.is_integer_in(&self.table) && !resolved.is_named(TypeDefId::BOOL) {
                    self.report_operand_mismatch("integer or bool", &left);
                }
                let right = self.check_operand(right, Some(&left.ty), span);
                (left, right, TypeRef::bool())
            }
            BinaryOp::LessThan | BinaryOp::GreaterThan => {
                let left = self.check_integer_operand(left, span);
                let right = self.check_operand(right, Some(&left.ty), span);
                (left, right, TypeRef::bool())
            }
            BinaryOp::Plus | BinaryOp::Minus | BinaryOp::Multiply | BinaryOp::Divide => {
                let left = self.check_integer_operand(left, span);
                let right = self.check_operand(right, Some(&left.ty), span);
                let ty = if left.ty.is_integer_in(&self.table) {
                    left.ty.clone()
                } else {
                    TypeRef::i32()
                };
                (left, right, ty)
            }
            BinaryOp::ValueAssignment => return self.check_assignment(left, right, span),
        };

        let diverges = left.diverges || right.diverges;
        TypedExpr {
            diverges,
            ..TypedExpr::new(
                TypedExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                ty,
                span,
            )
        }
    }

    fn check_operand(&mut self, operand: Option<&Expr>, expected: Option<&TypeRef>, span: SourceSpan) -> TypedExpr {
        match (operand, expected) {
            (Some(operand), Some(expected)) => self.check_expr_expecting(operand, expected),
            (Some(operand), None) => self.check_expr(operand, true),
            (None, _) => TypedExpr::unknown(span),
        }
    }

    fn check_integer_operand(&mut self, operand: Option<&Expr>, span: SourceSpan) -> TypedExpr {
        let operand = self.check_operand(operand, None, span);
        if !operand.ty.is_integer_in(&self.table) {
            self.report_operand_mismatch("integer", &operand);
        }
        operand
    }

    fn report_operand_mismatch(&mut self, expected: &str, operand: &TypedExpr) {
        let resolved = self.table.shallow_resolve(&operand.ty);
        if resolved.is_unknown() || resolved.is_never() {
            return;
        }
        let found = self.display(&resolved);
        self.report_error(TypeCheckerError::MismatchedTypes {
            expected: expected.to_owned(),
            found,
            span: operand.span,
        });
    }

    /// `target = value`.
    ///
    /// Assigning a declared but unassigned local counts as its first
    /// assignment, after which the local is definitely assigned.
    fn check_assignment(&mut self, left: Option<&Expr>, right: Option<&Expr>, span: SourceSpan) -> TypedExpr {
        let Some(left) = left else {
            let value = self.check_operand(right, None, span);
            return TypedExpr::unknown(value.span);
        };

        let target = match &left.kind {
            ExprKind::Variable { name, type_arguments } => {
                self.check_variable(name, type_arguments.as_deref(), left.span, true)
            }
            _ => self.check_expr(left, false),
        };

        let first_assignment = match target.kind {
            TypedExprKind::Variable(variable)
                if matches!(self.defs.variable(variable).kind, VariableKind::Local { .. })
                    && !self.instantiated.contains(&variable) =>
            {
                Some(variable)
            }
            _ => None,
        };

        if !target.ty.is_unknown() && first_assignment.is_none() {
            let bare_name = matches!(left.kind, ExprKind::Variable { .. });
            match &target.kind {
                TypedExprKind::FieldAccess { index, name, .. } if bare_name => {
                    let mutable = self
                        .context
                        .owner_type
                        .and_then(|owner| self.defs.class_fields(owner))
                        .and_then(|fields| fields.get(*index))
                        .is_some_and(|f| f.is_mutable);
                    if !mutable {
                        self.report_error(TypeCheckerError::NonMutableAssignment {
                            name: name.clone(),
                            span: left.span,
                        });
                    } else if !self.context.is_mutable {
                        let function = self.defs.function(self.context.function).name.clone();
                        self.report_error(TypeCheckerError::MutatingInstanceInNonMutableFunction {
                            function,
                            span: left.span,
                        });
                    }
                }
                TypedExprKind::StaticFieldAccess { owner, index, name } if bare_name => {
                    let mutable = self
                        .defs
                        .class_fields(*owner)
                        .and_then(|fields| fields.get(*index))
                        .is_some_and(|f| f.is_mutable);
                    if !mutable {
                        self.report_error(TypeCheckerError::NonMutableAssignment {
                            name: name.clone(),
                            span: left.span,
                        });
                    }
                }
                _ => self.expect_assignable(&target),
            }
        }

        let value = self.check_operand(right, Some(&target.ty), span);
        if let Some(variable) = first_assignment {
            self.instantiated.insert(variable);
            log::trace!("{:?} assigned for the first time", variable);
        }

        let ty = target.ty.clone();
        let diverges = target.diverges || value.diverges;
        TypedExpr {
            diverges,
            ..TypedExpr::new(
                TypedExprKind::Assignment {
                    target: Box::new(target),
                    value: Box::new(value),
                },
                ty,
                span,
            )
        }
    }

    pub(crate) fn check_unary(&mut self, op: UnaryOp, operand: Option<&Expr>, span: SourceSpan) -> TypedExpr {
        match op {
            UnaryOp::Not => {
                let operand = self.check_operand(operand, Some(&TypeRef::bool()), span);
                let diverges = operand.diverges;
                TypedExpr {
                    diverges,
                    ..TypedExpr::new(TypedExprKind::Not(Box::new(operand)), TypeRef::bool(), span)
                }
            }
            UnaryOp::FallOut => self.check_fall_out(operand, span),
        }
    }

    /// `value?` inside a function returning `result::<V, E>`: the operand must
    /// be a result with error type `E` and the expression has its value type.
    fn check_fall_out(&mut self, operand: Option<&Expr>, span: SourceSpan) -> TypedExpr {
        let return_type = self.table.resolve(&self.context.return_type);
        let (value_type, error_type) = match &return_type {
            TypeRef::Named { def, arguments } if *def == TypeDefId::RESULT && arguments.len() == 2 => {
                (arguments[0].clone(), arguments[1].clone())
            }
            _ => {
                self.report_error(TypeCheckerError::FallOutOperatorOutsideResultFunction { span });
                let operand = self.check_operand(operand, None, span);
                return TypedExpr::new(TypedExprKind::FallOut(Box::new(operand)), TypeRef::Unknown, span);
            }
        };

        let expected = TypeRef::result(self.table.fresh_var(), error_type);
        let operand = self.check_operand(operand, Some(&expected), span);
        let ty = match self.table.resolve(&operand.ty) {
            TypeRef::Named { def, mut arguments } if def == TypeDefId::RESULT && arguments.len() == 2 => {
                arguments.swap_remove(0)
            }
            _ => value_type,
        };
        let diverges = operand.diverges;
        TypedExpr {
            diverges,
            ..TypedExpr::new(TypedExprKind::FallOut(Box::new(operand)), ty, span)
        }
    }

    /// Reports an error unless `expr` denotes a place that may be written.
    pub(crate) fn expect_assignable(&mut self, expr: &TypedExpr) {
        if let Some(error) = self.assignability_error(expr) {
            self.report_error(error);
        }
    }

    fn assignability_error(&self, expr: &TypedExpr) -> Option<TypeCheckerError> {
        let span = expr.span;
        match &expr.kind {
            TypedExprKind::Variable(variable) => {
                let variable_def = self.defs.variable(*variable);
                let assignable = match variable_def.kind {
                    VariableKind::Local { .. } => variable_def.mutable || !self.instantiated.contains(variable),
                    VariableKind::Parameter { .. } => variable_def.mutable,
                    VariableKind::This { .. } => self.context.is_mutable,
                };
                (!assignable).then(|| TypeCheckerError::NonMutableAssignment {
                    name: variable_def.name.clone(),
                    span,
                })
            }
            TypedExprKind::FieldAccess { owner, index, .. } => {
                let def = match self.table.shallow_resolve(&owner.ty) {
                    TypeRef::Named { def, .. } => def,
                    TypeRef::Unknown => return None,
                    _ => return Some(TypeCheckerError::ExpressionNotAssignable { span }),
                };
                let TypeDefKind::Class { fields } = &self.defs.ty(def).kind else {
                    return Some(TypeCheckerError::ExpressionNotAssignable { span });
                };
                let field = fields.get(*index)?;
                if !field.is_mutable {
                    return Some(TypeCheckerError::NonMutableMemberAssignment { span });
                }
                self.assignability_error(owner)
                    .map(|_| TypeCheckerError::NonMutableMemberOwnerAssignment { span })
            }
            TypedExprKind::StaticFieldAccess { owner, index, .. } => {
                let mutable = self
                    .defs
                    .class_fields(*owner)
                    .and_then(|fields| fields.get(*index))
                    .is_some_and(|f| f.is_mutable);
                (!mutable).then_some(TypeCheckerError::NonMutableMemberAssignment { span })
            }
            TypedExprKind::Unknown => None,
            _ => Some(TypeCheckerError::ExpressionNotAssignable { span }),
        }
    }
}
