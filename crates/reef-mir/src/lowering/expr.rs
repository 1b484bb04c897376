//! Expression lowering.
//!
//! Every expression is lowered in one of three ways:
//! - [`lower_operand`](FunctionLoweringContext::lower_operand) when the parent
//!   needs its value as an [`Operand`],
//! - [`lower_into`](FunctionLoweringContext::lower_into) when the parent chose
//!   the place the value goes to,
//! - [`lower_statement`](FunctionLoweringContext::lower_statement) when the value
//!   is not used.

use reef_syntax::ast::BinaryOp;
use reef_types::{InstantiatedFunction, TypeRef, TypedFieldValue};

use super::types::{
    function_call_id, integer_layout, tuple_member_name, FUNCTION_PARAMETER_FIELD, FUNCTION_REFERENCE_FIELD,
};
use super::*;

impl<'a> FunctionLoweringContext<'a> {
    /// Lowers a sequence of expressions as a function body.
    pub(super) fn lower_body(&mut self, body: &[TypedExpr]) -> Result<(), LoweringError> {
        self.lower_block(body, false, None)
    }

    /// Lowers `expr` and returns its value.
    ///
    /// Literals, variables and field reads are read in place. Everything else
    /// is stored in a fresh temporary first.
    pub(super) fn lower_operand(&mut self, expr: &TypedExpr) -> Result<Operand, LoweringError> {
        match &expr.kind {
            TypedExprKind::IntLiteral(value) => self.int_constant(&expr.ty, *value),
            TypedExprKind::StringLiteral(value) => Ok(Operand::StringConstant(value.clone())),
            TypedExprKind::BoolLiteral(value) => Ok(Operand::BoolConstant(*value)),
            TypedExprKind::Tuple(members) if members.is_empty() => Ok(Operand::UnitConstant),
            TypedExprKind::Variable(variable) => Ok(Operand::Copy(self.variable_place(*variable)?)),
            TypedExprKind::FieldAccess { owner, name, .. } => Ok(Operand::Copy(self.field_place(owner, name)?)),
            TypedExprKind::StaticFieldAccess { owner, name, .. } => {
                Ok(Operand::Copy(self.static_field_place(*owner, name)))
            }
            _ if expr.diverges || expr.ty.is_never() => {
                self.lower_statement(expr)?;
                Ok(Operand::UnitConstant)
            }
            _ => {
                let temp = self.new_temp_for(&expr.ty)?;
                self.lower_into(expr, temp.clone())?;
                Ok(Operand::Copy(temp))
            }
        }
    }

    /// Lowers `expr` to a place holding its value, so that its fields can be
    /// read without evaluating it again.
    pub(super) fn lower_place(&mut self, expr: &TypedExpr) -> Result<Place, LoweringError> {
        match self.lower_operand(expr)? {
            Operand::Copy(place) => Ok(place),
            operand => {
                let temp = self.new_temp_for(&expr.ty)?;
                self.assign(temp.clone(), Rvalue::Use(operand))?;
                Ok(temp)
            }
        }
    }

    /// Lowers `expr`, storing its value in `destination`.
    pub(super) fn lower_into(&mut self, expr: &TypedExpr, destination: Place) -> Result<(), LoweringError> {
        match &expr.kind {
            TypedExprKind::IntLiteral(_)
            | TypedExprKind::StringLiteral(_)
            | TypedExprKind::BoolLiteral(_)
            | TypedExprKind::Variable(_)
            | TypedExprKind::FieldAccess { .. }
            | TypedExprKind::StaticFieldAccess { .. } => {
                let operand = self.lower_operand(expr)?;
                self.assign(destination, Rvalue::Use(operand))
            }
            TypedExprKind::Todo => Ok(()),
            TypedExprKind::FunctionReference { function, receiver } => {
                self.lower_function_object(function, receiver.as_deref(), &expr.ty, destination)
            }
            TypedExprKind::Binary {
                op: BinaryOp::BooleanAnd,
                left,
                right,
            } => self.lower_short_circuit(left, right, true, destination),
            TypedExprKind::Binary {
                op: BinaryOp::BooleanOr,
                left,
                right,
            } => self.lower_short_circuit(left, right, false, destination),
            TypedExprKind::Binary { op, left, right } => {
                let kind = binary_operation_kind(*op)?;
                let left = self.lower_operand(left)?;
                let right = self.lower_operand(right)?;
                self.assign(destination, Rvalue::BinaryOperation { left, right, kind })
            }
            TypedExprKind::Not(operand) => {
                let operand = self.lower_operand(operand)?;
                self.assign(
                    destination,
                    Rvalue::UnaryOperation {
                        operand,
                        kind: UnaryOperationKind::Not,
                    },
                )
            }
            TypedExprKind::Assignment { target, value } => {
                let target = self.lower_assignment(target, value)?;
                self.assign(destination, Rvalue::Use(Operand::Copy(target)))
            }
            TypedExprKind::FallOut(operand) => self.lower_fall_out(operand, Some(destination)),
            TypedExprKind::Call { callee, arguments } => self.lower_call(callee, arguments, destination),
            TypedExprKind::UnitVariant { union, variant } => {
                self.create_variant(&destination, &expr.ty, *union, *variant)?;
                Ok(())
            }
            TypedExprKind::ObjectInitializer { fields, .. } => {
                let ty = self.lower_type(&expr.ty)?;
                self.assign(destination.clone(), Rvalue::CreateObject(ty))?;
                self.assign_fields(&destination, CLASS_VARIANT, fields)
            }
            TypedExprKind::UnionClassVariantInitializer { union, variant, fields } => {
                let variant = self.create_variant(&destination, &expr.ty, *union, *variant)?;
                self.assign_fields(&destination, &variant, fields)
            }
            TypedExprKind::Tuple(members) if members.is_empty() => {
                self.assign(destination, Rvalue::Use(Operand::UnitConstant))
            }
            TypedExprKind::Tuple(members) => {
                let ty = self.lower_type(&expr.ty)?;
                self.assign(destination.clone(), Rvalue::CreateObject(ty))?;
                for (index, member) in members.iter().enumerate() {
                    let value = self.lower_operand(member)?;
                    self.assign(
                        destination.clone().class_field(tuple_member_name(index)),
                        Rvalue::Use(value),
                    )?;
                }
                Ok(())
            }
            TypedExprKind::Block { expressions, has_tail } => {
                self.lower_block(expressions, *has_tail, Some(destination))
            }
            TypedExprKind::If {
                condition,
                body,
                else_ifs,
                else_body,
            } => self.lower_if(condition, body, else_ifs, else_body.as_deref(), Some(destination)),
            TypedExprKind::Match { value, arms } => self.lower_match(value, arms, Some(destination)),
            TypedExprKind::Matches { value, pattern, .. } => self.lower_matches(value, pattern, destination),
            TypedExprKind::VariableDeclaration { .. } => {
                self.lower_statement(expr)?;
                self.assign(destination, Rvalue::Use(Operand::UnitConstant))
            }
            TypedExprKind::While { .. }
            | TypedExprKind::Break
            | TypedExprKind::Continue
            | TypedExprKind::Return(_) => self.lower_statement(expr),
            TypedExprKind::Unknown => Err(unchecked_expression()),
        }
    }

    /// Lowers `expr` for its effects only.
    pub(super) fn lower_statement(&mut self, expr: &TypedExpr) -> Result<(), LoweringError> {
        match &expr.kind {
            TypedExprKind::IntLiteral(_)
            | TypedExprKind::StringLiteral(_)
            | TypedExprKind::BoolLiteral(_)
            | TypedExprKind::Todo
            | TypedExprKind::Variable(_)
            | TypedExprKind::FieldAccess { .. }
            | TypedExprKind::StaticFieldAccess { .. }
            | TypedExprKind::FunctionReference { .. }
            | TypedExprKind::UnitVariant { .. } => Ok(()),
            TypedExprKind::Tuple(members) if members.is_empty() => Ok(()),
            TypedExprKind::VariableDeclaration { variable, value } => {
                log::trace!("declaring '{}'", self.defs().variable(*variable).name);
                match value {
                    Some(value) => {
                        let place = self.variable_place(*variable)?;
                        self.lower_into(value, place)
                    }
                    None => Ok(()),
                }
            }
            TypedExprKind::Assignment { target, value } => {
                self.lower_assignment(target, value)?;
                Ok(())
            }
            TypedExprKind::FallOut(operand) => self.lower_fall_out(operand, None),
            TypedExprKind::Block { expressions, .. } => self.lower_block(expressions, false, None),
            TypedExprKind::If {
                condition,
                body,
                else_ifs,
                else_body,
            } => self.lower_if(condition, body, else_ifs, else_body.as_deref(), None),
            TypedExprKind::Match { value, arms } => self.lower_match(value, arms, None),
            TypedExprKind::While { condition, body } => self.lower_while(condition, body),
            TypedExprKind::Break => self.lower_break(),
            TypedExprKind::Continue => self.lower_continue(),
            TypedExprKind::Return(value) => self.lower_return(value.as_deref()),
            TypedExprKind::Unknown => Err(unchecked_expression()),
            TypedExprKind::Binary { .. }
            | TypedExprKind::Not(_)
            | TypedExprKind::Call { .. }
            | TypedExprKind::ObjectInitializer { .. }
            | TypedExprKind::UnionClassVariantInitializer { .. }
            | TypedExprKind::Tuple(_)
            | TypedExprKind::Matches { .. } => {
                let temp = self.new_temp_for(&expr.ty)?;
                self.lower_into(expr, temp)
            }
        }
    }

    /// Lowers the expressions of a block in order. With a destination, the
    /// tail expression is stored there.
    pub(super) fn lower_block(
        &mut self,
        expressions: &[TypedExpr],
        has_tail: bool,
        destination: Option<Place>,
    ) -> Result<(), LoweringError> {
        let tail = if has_tail { expressions.len().checked_sub(1) } else { None };
        for (index, expr) in expressions.iter().enumerate() {
            match &destination {
                Some(destination) if Some(index) == tail => self.lower_into(expr, destination.clone())?,
                _ => self.lower_statement(expr)?,
            }
            if expr.diverges {
                return Ok(());
            }
        }
        match destination {
            Some(destination) if tail.is_none() => self.assign(destination, Rvalue::Use(Operand::UnitConstant)),
            _ => Ok(()),
        }
    }

    fn lower_assignment(&mut self, target: &TypedExpr, value: &TypedExpr) -> Result<Place, LoweringError> {
        let place = match &target.kind {
            TypedExprKind::Variable(variable) => self.variable_place(*variable)?,
            TypedExprKind::FieldAccess { owner, name, .. } => self.field_place(owner, name)?,
            TypedExprKind::StaticFieldAccess { owner, name, .. } => self.static_field_place(*owner, name),
            _ => return Err(LoweringError::Internal("assignment to an expression that is not a place".into())),
        };
        if writes_in_one_step(value) {
            self.lower_into(value, place.clone())?;
        } else {
            let temp = self.lower_operand(value)?;
            self.assign(place.clone(), Rvalue::Use(temp))?;
        }
        Ok(place)
    }

    pub(super) fn field_place(&mut self, owner: &TypedExpr, field: &str) -> Result<Place, LoweringError> {
        Ok(self.lower_place(owner)?.class_field(field))
    }

    fn static_field_place(&self, owner: TypeDefId, field: &str) -> Place {
        let owner = self.defs().ty(owner);
        Place::StaticField {
            owner: TypeReference::concrete(owner.name.clone(), owner.id.clone(), Vec::new()),
            field: field.to_owned(),
        }
    }

    fn int_constant(&self, ty: &TypeRef, value: u64) -> Result<Operand, LoweringError> {
        let (size, signed) = integer_layout(self.program, ty).ok_or_else(|| LoweringError::MissingType {
            context: format!("integer literal {value}"),
        })?;
        Ok(if signed {
            Operand::IntConstant {
                value: value as i64,
                size,
            }
        } else {
            Operand::UIntConstant { value, size }
        })
    }

    /// Allocates a union value and sets its discriminant. Returns the variant name.
    pub(super) fn create_variant(
        &mut self,
        destination: &Place,
        ty: &TypeRef,
        union: TypeDefId,
        variant: usize,
    ) -> Result<String, LoweringError> {
        let name = self.variant_name(union, variant)?;
        let ty = self.lower_type(ty)?;
        self.assign(destination.clone(), Rvalue::CreateObject(ty))?;
        self.assign(
            destination.clone().field(VARIANT_IDENTIFIER_FIELD, name.clone()),
            Rvalue::Use(Operand::UIntConstant {
                value: variant as u64,
                size: 2,
            }),
        )?;
        Ok(name)
    }

    pub(super) fn variant_name(&self, union: TypeDefId, variant: usize) -> Result<String, LoweringError> {
        let defs = self.defs();
        defs.union_variants(union)
            .and_then(|variants| variants.get(variant))
            .map(|v| v.name.clone())
            .ok_or_else(|| LoweringError::UnknownVariant {
                ty: defs.ty(union).name.clone(),
                variant,
            })
    }

    /// Field values are stored in declaration order whatever order they were written in.
    fn assign_fields(
        &mut self,
        destination: &Place,
        variant: &str,
        fields: &[TypedFieldValue],
    ) -> Result<(), LoweringError> {
        let mut ordered: Vec<&TypedFieldValue> = fields.iter().collect();
        ordered.sort_by_key(|field| field.index);
        for field in ordered {
            let value = self.lower_operand(&field.value)?;
            self.assign(destination.clone().field(field.name.clone(), variant), Rvalue::Use(value))?;
        }
        Ok(())
    }

    fn lower_call(
        &mut self,
        callee: &TypedExpr,
        arguments: &[TypedExpr],
        destination: Place,
    ) -> Result<(), LoweringError> {
        if let TypedExprKind::FunctionReference { function, receiver } = &callee.kind {
            let mut operands = Vec::with_capacity(arguments.len() + 1);
            if let Some(receiver) = receiver {
                operands.push(self.lower_operand(receiver)?);
            } else if self.captures.closure(function.function).is_some() {
                operands.push(self.closure_object(function.function)?);
            }
            for argument in arguments {
                operands.push(self.lower_operand(argument)?);
            }
            let function = self.function_reference(function)?;
            log::trace!("direct call to {function}");
            return self.call(function, operands, destination);
        }

        let TypeRef::Function(signature) = self.program.inference.resolve(&callee.ty) else {
            return Err(LoweringError::Internal(format!("call of a non-function value {:?}", callee.ty)));
        };
        let mut operands = Vec::with_capacity(arguments.len() + 1);
        operands.push(self.lower_operand(callee)?);
        for argument in arguments {
            operands.push(self.lower_operand(argument)?);
        }
        let mut type_arguments = signature
            .parameters
            .iter()
            .map(|p| self.lower_type(&p.ty))
            .collect::<Result<Vec<_>, _>>()?;
        type_arguments.push(self.lower_type(&signature.return_type)?);
        let function = FunctionReference {
            id: function_call_id(signature.parameters.len()),
            type_arguments,
        };
        self.call(function, operands, destination)
    }

    /// Stores a function object for `function` in `destination`.
    fn lower_function_object(
        &mut self,
        function: &InstantiatedFunction,
        receiver: Option<&TypedExpr>,
        ty: &TypeRef,
        destination: Place,
    ) -> Result<(), LoweringError> {
        let parameter = match receiver {
            Some(receiver) => Some(self.lower_operand(receiver)?),
            None if self.captures.closure(function.function).is_some() => {
                Some(self.closure_object(function.function)?)
            }
            None => None,
        };
        let pointer = self.function_reference(function)?;
        let object_type = self.lower_type(ty)?;
        self.assign(destination.clone(), Rvalue::CreateObject(object_type))?;
        self.assign(
            destination.clone().class_field(FUNCTION_REFERENCE_FIELD),
            Rvalue::Use(Operand::FunctionPointer(pointer)),
        )?;
        if let Some(parameter) = parameter {
            self.assign(destination.class_field(FUNCTION_PARAMETER_FIELD), Rvalue::Use(parameter))?;
        }
        Ok(())
    }
}

fn binary_operation_kind(op: BinaryOp) -> Result<BinaryOperationKind, LoweringError> {
    Ok(match op {
        BinaryOp::Plus => BinaryOperationKind::Add,
        BinaryOp::Minus => BinaryOperationKind::Subtract,
        BinaryOp::Multiply => BinaryOperationKind::Multiply,
        BinaryOp::Divide => BinaryOperationKind::Divide,
        BinaryOp::LessThan => BinaryOperationKind::LessThan,
        BinaryOp::GreaterThan => BinaryOperationKind::GreaterThan,
        BinaryOp::EqualityCheck => BinaryOperationKind::Equal,
        BinaryOp::NegativeEqualityCheck => BinaryOperationKind::NotEqual,
        BinaryOp::BooleanAnd | BinaryOp::BooleanOr | BinaryOp::ValueAssignment => {
            return Err(LoweringError::Internal(format!("{op:?} is not a value operator")));
        }
    })
}

/// Values that can be written to their target without a temporary.
fn writes_in_one_step(value: &TypedExpr) -> bool {
    matches!(
        value.kind,
        TypedExprKind::IntLiteral(_)
            | TypedExprKind::StringLiteral(_)
            | TypedExprKind::BoolLiteral(_)
            | TypedExprKind::Variable(_)
            | TypedExprKind::FieldAccess { .. }
            | TypedExprKind::StaticFieldAccess { .. }
            | TypedExprKind::Not(_)
            | TypedExprKind::Call { .. }
    ) || matches!(
        &value.kind,
        TypedExprKind::Binary { op, .. } if !matches!(op, BinaryOp::BooleanAnd | BinaryOp::BooleanOr)
    )
}

fn unchecked_expression() -> LoweringError {
    LoweringError::Internal("expression failed type checking".into())
}
