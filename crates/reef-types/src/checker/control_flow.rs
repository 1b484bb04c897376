//! Blocks, branches, loops and jumps, together with definite assignment
//! across them.

use miette::SourceSpan;
use reef_syntax::ast::{BinaryOp, Block, Expr, IfExpr, MatchArm, Pattern};
use rustc_hash::FxHashSet;

use super::TypeChecker;
use crate::error::TypeCheckerError;
use crate::typed::{TypedElseIf, TypedExpr, TypedExprKind, TypedMatchArm, TypedPattern, TypedPatternKind};
use crate::types::{TypeRef, VariableId};

impl TypeChecker {
    pub(crate) fn check_block(&mut self, block: &Block, span: SourceSpan, value_useful: bool) -> TypedExpr {
        let (expressions, diverges) = self.with_scope(|this| this.check_block_contents(block, value_useful));

        let tail_type = match expressions.last() {
            Some(tail) if block.has_tail && value_useful => Some(tail.ty.clone()),
            _ => None,
        };
        let ty = match tail_type {
            Some(ty) => ty,
            None if diverges => TypeRef::never(),
            None => TypeRef::unit(),
        };
        let kind = TypedExprKind::Block {
            expressions,
            has_tail: block.has_tail,
        };
        TypedExpr {
            diverges,
            ..TypedExpr::new(kind, ty, span)
        }
    }

    /// Checks the contents of a block in the current scope.
    ///
    /// Local functions are visible to every expression of the block. Their
    /// bodies are checked after the expressions. Returns the checked
    /// expressions and whether the block diverges.
    pub(crate) fn check_block_contents(&mut self, block: &Block, value_useful: bool) -> (Vec<TypedExpr>, bool) {
        let mut declared: FxHashSet<&str> = FxHashSet::default();
        let mut local_functions = Vec::with_capacity(block.functions.len());
        for function in &block.functions {
            if !declared.insert(function.name.name.as_str()) {
                self.report_error(TypeCheckerError::ConflictingFunctionName {
                    name: function.name.name.clone(),
                    span: function.name.span,
                });
                continue;
            }
            let id = self.declare_local_function(function);
            self.current_scope().functions.insert(function.name.name.clone(), id);
            local_functions.push((id, function));
        }

        let count = block.expressions.len();
        let mut diverges = false;
        let mut expressions = Vec::with_capacity(count);
        for (index, expression) in block.expressions.iter().enumerate() {
            let useful = value_useful && block.has_tail && index + 1 == count;
            let typed = self.check_expr(expression, useful);
            diverges |= typed.diverges;
            expressions.push(typed);
        }

        for (id, function) in local_functions {
            self.check_function_body(id, &function.body, function.name.span);
        }
        (expressions, diverges)
    }

    /// `if (cond) body else if (cond) body else body`
    ///
    /// A local unassigned before the chain is assigned after it only when
    /// the body, every `else if` and the `else` all assign it.
    pub(crate) fn check_if(&mut self, if_expr: &IfExpr, span: SourceSpan, value_useful: bool) -> TypedExpr {
        self.with_scope(|this| {
            let snapshot = this.uninstantiated_locals();
            let condition = this.check_expr_expecting(&if_expr.condition, &TypeRef::bool());
            let matched = matched_variables(&condition);
            let body = this.check_branch(if_expr.body.as_deref(), &matched, value_useful, span);
            let mut assigned = this.assigned_among(&snapshot);
            this.reset_assignments(&snapshot);

            let mut else_ifs = Vec::with_capacity(if_expr.else_ifs.len());
            for else_if in &if_expr.else_ifs {
                let (condition, body) = this.with_scope(|this| {
                    let condition = this.check_expr_expecting(&else_if.condition, &TypeRef::bool());
                    let matched = matched_variables(&condition);
                    let body = this.check_branch(else_if.body.as_deref(), &matched, value_useful, span);
                    (condition, body)
                });
                let branch_assigned = this.assigned_among(&snapshot);
                assigned.retain(|v| branch_assigned.contains(v));
                this.reset_assignments(&snapshot);
                else_ifs.push(TypedElseIf { condition, body });
            }

            let else_body = if_expr.else_body.as_deref().map(|else_body| {
                let else_body = this.with_scope(|this| this.check_expr(else_body, value_useful));
                let branch_assigned = this.assigned_among(&snapshot);
                assigned.retain(|v| branch_assigned.contains(v));
                this.reset_assignments(&snapshot);
                else_body
            });

            if else_body.is_some() {
                for variable in &assigned {
                    log::trace!("{:?} assigned on every branch of if", variable);
                    this.instantiated.insert(*variable);
                }
            } else if value_useful {
                this.report_error(TypeCheckerError::IfExpressionValueUsedWithoutElseBranch { span });
            }

            let branches_diverge = else_body.as_ref().is_some_and(|e| e.diverges)
                && body.diverges
                && else_ifs.iter().all(|e| e.body.diverges);
            let diverges = condition.diverges || branches_diverge;

            let ty = if value_useful && else_body.is_some() {
                let branches: Vec<&TypedExpr> = std::iter::once(&body)
                    .chain(else_ifs.iter().map(|e| &e.body))
                    .chain(else_body.iter())
                    .collect();
                this.join_branch_types(&branches)
            } else if branches_diverge {
                TypeRef::never()
            } else {
                TypeRef::unit()
            };

            let kind = TypedExprKind::If {
                condition: Box::new(condition),
                body: Box::new(body),
                else_ifs,
                else_body: else_body.map(Box::new),
            };
            TypedExpr {
                diverges,
                ..TypedExpr::new(kind, ty, span)
            }
        })
    }

    /// A branch taken when its condition holds. Variables bound by `matches`
    /// in the condition are assigned inside it.
    fn check_branch(
        &mut self,
        body: Option<&Expr>,
        matched: &[VariableId],
        value_useful: bool,
        span: SourceSpan,
    ) -> TypedExpr {
        let body = self.with_scope(|this| {
            this.instantiated.extend(matched.iter().copied());
            this.check_optional(body, value_useful, span)
        });
        for variable in matched {
            self.instantiated.remove(variable);
        }
        body
    }

    /// The type of a branching expression is the type of its first branch
    /// that completes. Every other branch must have that type.
    fn join_branch_types(&mut self, branches: &[&TypedExpr]) -> TypeRef {
        let Some(first) = branches.iter().find(|b| !self.table.resolve(&b.ty).is_never()) else {
            return TypeRef::never();
        };
        let ty = first.ty.clone();
        for branch in branches {
            self.expect_type(&branch.ty, &ty, branch.span);
        }
        ty
    }

    /// `match (value) { pattern => expression, ... }`
    pub(crate) fn check_match(&mut self, value: &Expr, arms: &[MatchArm], span: SourceSpan, value_useful: bool) -> TypedExpr {
        let value = self.check_expr(value, true);
        let snapshot = self.uninstantiated_locals();
        let mut assigned: Option<FxHashSet<VariableId>> = None;
        let mut binds_mutable = false;

        let mut typed_arms = Vec::with_capacity(arms.len());
        for arm in arms {
            let typed_arm = self.with_scope(|this| {
                let mut variables = Vec::new();
                let pattern = this.check_pattern(&arm.pattern, &value.ty, &mut variables);
                binds_mutable |= variables.iter().any(|v| this.defs.variable(*v).mutable);
                this.instantiated.extend(variables.iter().copied());
                let expression = this.check_optional(arm.expression.as_ref(), value_useful, arm.pattern.span);
                for variable in &variables {
                    this.instantiated.remove(variable);
                }
                TypedMatchArm {
                    pattern,
                    expression,
                    variables,
                }
            });
            let arm_assigned = self.assigned_among(&snapshot);
            match &mut assigned {
                Some(assigned) => assigned.retain(|v| arm_assigned.contains(v)),
                None => assigned = Some(arm_assigned),
            }
            self.reset_assignments(&snapshot);
            typed_arms.push(typed_arm);
        }
        for variable in assigned.into_iter().flatten() {
            self.instantiated.insert(variable);
        }
        if binds_mutable {
            self.expect_assignable(&value);
        }

        let arms_diverge = !typed_arms.is_empty() && typed_arms.iter().all(|a| a.expression.diverges);
        let ty = if value_useful {
            let branches: Vec<&TypedExpr> = typed_arms.iter().map(|a| &a.expression).collect();
            if branches.is_empty() {
                TypeRef::unit()
            } else {
                self.join_branch_types(&branches)
            }
        } else if arms_diverge {
            TypeRef::never()
        } else {
            TypeRef::unit()
        };

        let diverges = value.diverges || arms_diverge;
        let kind = TypedExprKind::Match {
            value: Box::new(value),
            arms: typed_arms,
        };
        TypedExpr {
            diverges,
            ..TypedExpr::new(kind, ty, span)
        }
    }

    /// `value matches pattern`
    ///
    /// The pattern's variables are declared in the current scope but stay
    /// unassigned; only a branch guarded by the expression sees them assigned.
    pub(crate) fn check_matches(&mut self, value: &Expr, pattern: Option<&Pattern>, span: SourceSpan) -> TypedExpr {
        let value = self.check_expr(value, true);
        let mut declared_variables = Vec::new();
        let pattern = match pattern {
            Some(pattern) => self.check_pattern(pattern, &value.ty, &mut declared_variables),
            None => TypedPattern {
                kind: TypedPatternKind::Unknown,
                ty: TypeRef::Unknown,
                span,
            },
        };
        if declared_variables.iter().any(|v| self.defs.variable(*v).mutable) {
            self.expect_assignable(&value);
        }

        let diverges = value.diverges;
        let kind = TypedExprKind::Matches {
            value: Box::new(value),
            pattern,
            declared_variables,
        };
        TypedExpr {
            diverges,
            ..TypedExpr::new(kind, TypeRef::bool(), span)
        }
    }

    /// `while (cond) body`. Assignments in the body do not count after the loop.
    pub(crate) fn check_while(&mut self, condition: &Expr, body: Option<&Expr>, span: SourceSpan) -> TypedExpr {
        let snapshot = self.uninstantiated_locals();
        let (condition, body) = self.with_scope(|this| {
            let condition = this.check_expr_expecting(condition, &TypeRef::bool());
            let matched = matched_variables(&condition);
            this.context.loop_depth += 1;
            let body = this.check_branch(body, &matched, false, span);
            this.context.loop_depth -= 1;
            (condition, body)
        });
        self.reset_assignments(&snapshot);

        let diverges = condition.diverges;
        let kind = TypedExprKind::While {
            condition: Box::new(condition),
            body: Box::new(body),
        };
        TypedExpr {
            diverges,
            ..TypedExpr::new(kind, TypeRef::unit(), span)
        }
    }

    /// `break` or `continue`
    pub(crate) fn check_loop_jump(&mut self, is_break: bool, span: SourceSpan) -> TypedExpr {
        if self.context.loop_depth == 0 {
            let error = if is_break {
                TypeCheckerError::BreakUsedOutsideOfLoop { span }
            } else {
                TypeCheckerError::ContinueUsedOutsideOfLoop { span }
            };
            self.report_error(error);
        }
        let kind = if is_break {
            TypedExprKind::Break
        } else {
            TypedExprKind::Continue
        };
        TypedExpr {
            diverges: true,
            ..TypedExpr::new(kind, TypeRef::never(), span)
        }
    }

    pub(crate) fn check_return(&mut self, value: Option<&Expr>, span: SourceSpan) -> TypedExpr {
        let return_type = self.context.return_type.clone();
        let value = match value {
            Some(value) => Some(self.check_expr_expecting(value, &return_type)),
            None => {
                let resolved = self.table.resolve(&return_type);
                if !resolved.is_unit() && !resolved.is_unknown() {
                    let expected = self.display(&resolved);
                    self.report_error(TypeCheckerError::MismatchedTypes {
                        expected,
                        found: "Unit".to_owned(),
                        span,
                    });
                }
                None
            }
        };
        TypedExpr {
            diverges: true,
            ..TypedExpr::new(TypedExprKind::Return(value.map(Box::new)), TypeRef::never(), span)
        }
    }
}

/// Variables bound by `matches` expressions that hold whenever `condition` is true.
pub(crate) fn matched_variables(condition: &TypedExpr) -> Vec<VariableId> {
    match &condition.kind {
        TypedExprKind::Matches { declared_variables, .. } => declared_variables.clone(),
        TypedExprKind::Binary {
            op: BinaryOp::BooleanAnd,
            left,
            right,
        } => {
            let mut variables = matched_variables(left);
            variables.extend(matched_variables(right));
            variables
        }
        _ => Vec::new(),
    }
}
