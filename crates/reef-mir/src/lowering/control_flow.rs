//! Branching expressions: `if`, `while`, `&&`/`||`, `return` and the
//! fallout operator.

use indexmap::IndexMap;
use reef_types::TypedElseIf;

use super::blocks::PendingTerminator;
use super::context::LoopTargets;
use super::types::tuple_member_name;
use super::*;

impl<'a> FunctionLoweringContext<'a> {
    /// Lowers an `if` chain. Every branch ends in one shared join block.
    pub(super) fn lower_if(
        &mut self,
        condition: &TypedExpr,
        body: &TypedExpr,
        else_ifs: &[TypedElseIf],
        else_body: Option<&TypedExpr>,
        destination: Option<Place>,
    ) -> Result<(), LoweringError> {
        let join = self.blocks.reserve();
        let branches = std::iter::once((condition, body)).chain(else_ifs.iter().map(|e| (&e.condition, &e.body)));
        let branch_count = else_ifs.len() + 1;

        for (index, (condition, body)) in branches.enumerate() {
            let condition = self.lower_operand(condition)?;
            let body_block = self.blocks.reserve();
            let is_last = index + 1 == branch_count;
            let next = if is_last && else_body.is_none() {
                join
            } else {
                self.blocks.reserve()
            };
            self.switch_on_bool(condition, next, body_block)?;

            self.blocks.place(body_block)?;
            self.lower_branch(body, destination.clone())?;
            self.blocks.goto_if_open(join)?;
            if next != join {
                self.blocks.place(next)?;
            }
        }
        if let Some(else_body) = else_body {
            self.lower_branch(else_body, destination)?;
            self.blocks.goto_if_open(join)?;
        }
        self.blocks.place(join)
    }

    fn lower_branch(&mut self, body: &TypedExpr, destination: Option<Place>) -> Result<(), LoweringError> {
        match destination {
            Some(destination) => self.lower_into(body, destination),
            None => self.lower_statement(body),
        }
    }

    /// Jumps to `if_false` when `condition` is zero and to `if_true` otherwise.
    pub(super) fn switch_on_bool(
        &mut self,
        condition: Operand,
        if_false: blocks::BlockRef,
        if_true: blocks::BlockRef,
    ) -> Result<(), LoweringError> {
        self.blocks.terminate(PendingTerminator::SwitchInt {
            operand: condition,
            cases: IndexMap::from([(0, if_false)]),
            otherwise: if_true,
        })
    }

    pub(super) fn lower_while(&mut self, condition: &TypedExpr, body: &TypedExpr) -> Result<(), LoweringError> {
        let condition_block = if self.blocks.is_open() && self.blocks.is_empty() {
            self.blocks.current()
        } else {
            let block = self.blocks.reserve();
            self.blocks.goto_if_open(block)?;
            self.blocks.place(block)?;
            block
        };
        let body_block = self.blocks.reserve();
        let exit = self.blocks.reserve();

        let condition = self.lower_operand(condition)?;
        self.switch_on_bool(condition, exit, body_block)?;

        self.blocks.place(body_block)?;
        self.loops.push(LoopTargets {
            condition: condition_block,
            exit,
        });
        let lowered = self.lower_statement(body);
        self.loops.pop();
        lowered?;
        self.blocks.goto_if_open(condition_block)?;
        self.blocks.place(exit)
    }

    pub(super) fn lower_break(&mut self) -> Result<(), LoweringError> {
        let target = self.innermost_loop("break")?.exit;
        self.blocks.terminate(PendingTerminator::GoTo(target))
    }

    pub(super) fn lower_continue(&mut self) -> Result<(), LoweringError> {
        let target = self.innermost_loop("continue")?.condition;
        self.blocks.terminate(PendingTerminator::GoTo(target))
    }

    fn innermost_loop(&self, keyword: &str) -> Result<LoopTargets, LoweringError> {
        self.loops
            .last()
            .copied()
            .ok_or_else(|| LoweringError::Internal(format!("'{keyword}' outside of a loop")))
    }

    pub(super) fn lower_return(&mut self, value: Option<&TypedExpr>) -> Result<(), LoweringError> {
        if let Some(value) = value {
            self.lower_into(value, Place::local(RETURN_VALUE_LOCAL))?;
        }
        self.emit_return()
    }

    /// `left && right` and `left || right`. The right operand is only
    /// evaluated when `left` does not decide the result.
    pub(super) fn lower_short_circuit(
        &mut self,
        left: &TypedExpr,
        right: &TypedExpr,
        is_and: bool,
        destination: Place,
    ) -> Result<(), LoweringError> {
        self.lower_into(left, destination.clone())?;
        let right_block = self.blocks.reserve();
        let join = self.blocks.reserve();
        let decided = Operand::Copy(destination.clone());
        if is_and {
            self.switch_on_bool(decided, join, right_block)?;
        } else {
            self.switch_on_bool(decided, right_block, join)?;
        }

        self.blocks.place(right_block)?;
        self.lower_into(right, destination)?;
        self.blocks.goto_if_open(join)?;
        self.blocks.place(join)
    }

    /// `value?`: returns the error of a `result` early, otherwise continues
    /// with the ok value.
    pub(super) fn lower_fall_out(
        &mut self,
        value: &TypedExpr,
        destination: Option<Place>,
    ) -> Result<(), LoweringError> {
        let result = self.lower_place(value)?;
        let (ok_name, error_name, create_error) = self.result_variants()?;

        let error_block = self.blocks.reserve();
        let ok_block = self.blocks.reserve();
        let discriminant = result.clone().field(VARIANT_IDENTIFIER_FIELD, ok_name.clone());
        self.blocks.terminate(PendingTerminator::SwitchInt {
            operand: Operand::Copy(discriminant),
            cases: IndexMap::from([(0, ok_block)]),
            otherwise: error_block,
        })?;

        self.blocks.place(error_block)?;
        let return_type = self.lower_type(&self.def().return_type)?;
        let function = FunctionReference {
            id: self.defs().function(create_error).id.clone(),
            type_arguments: return_type.type_arguments().to_vec(),
        };
        let error = Operand::Copy(result.clone().field(tuple_member_name(0), error_name));
        let return_label = self.return_label();
        self.blocks.terminate(PendingTerminator::MethodCall {
            function,
            arguments: vec![error],
            destination: Place::local(RETURN_VALUE_LOCAL),
            goto_after: return_label,
        })?;

        self.blocks.place(ok_block)?;
        if let Some(destination) = destination {
            let ok = Operand::Copy(result.field(tuple_member_name(0), ok_name));
            self.assign(destination, Rvalue::Use(ok))?;
        }
        Ok(())
    }

    /// Names of `result`'s variants and its `Error` constructor.
    fn result_variants(&self) -> Result<(String, String, FunctionId), LoweringError> {
        let variants = self
            .defs()
            .union_variants(TypeDefId::RESULT)
            .ok_or_else(|| LoweringError::Internal("result is not a union".into()))?;
        match variants {
            [ok, error @ VariantDef {
                kind: VariantKind::Tuple { create_function, .. },
                ..
            }] => Ok((ok.name.clone(), error.name.clone(), *create_function)),
            _ => Err(LoweringError::UnknownVariant {
                ty: "result".into(),
                variant: 1,
            }),
        }
    }
}
