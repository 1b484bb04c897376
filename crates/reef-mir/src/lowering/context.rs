//! Lowering Context
//!
//! Defines the state used while lowering a single method body, along with
//! helpers for locals, places of variables, closures and returns.

use reef_types::{InstantiatedFunction, TypeRef};
use rustc_hash::FxHashMap;

use super::blocks::{BlockBuilder, BlockRef, PendingTerminator};
use super::prepass::ClosureSpecialization;
use super::types::{lower_type, lower_types, method_generics};
use super::*;

/// Jump targets of the innermost enclosing loop.
#[derive(Debug, Clone, Copy)]
pub(super) struct LoopTargets {
    pub(super) condition: BlockRef,
    pub(super) exit: BlockRef,
}

/// Context for lowering one function into a [`LoweredMethod`].
///
/// Holds:
/// - the program and the capture analysis shared by every method,
/// - the block arena of the body being built,
/// - the parameter and local tables, in the order compiler names were handed out,
/// - the places of variables kept in plain locals,
/// - the shared return block and the loop stack.
pub(super) struct FunctionLoweringContext<'a> {
    pub(super) program: &'a TypedProgram,
    pub(super) captures: &'a ClosureSpecialization,
    pub(super) function: FunctionId,
    pub(super) blocks: BlockBuilder,
    pub(super) parameters: Vec<MethodLocal>,
    pub(super) locals: Vec<MethodLocal>,
    pub(super) return_value: MethodLocal,
    /// Variables stored in a parameter or plain local
    pub(super) variable_places: FxHashMap<VariableId, Place>,
    /// Target of `return` once the body has one that is not the final block
    pub(super) return_block: Option<BlockRef>,
    pub(super) loops: Vec<LoopTargets>,
}

impl<'a> FunctionLoweringContext<'a> {
    /// Creates the context for `function`, allocating its parameters and
    /// locals and emitting the locals object setup into `bb0`.
    pub(super) fn new(
        program: &'a TypedProgram,
        captures: &'a ClosureSpecialization,
        function: FunctionId,
    ) -> Result<Self, LoweringError> {
        let def = program.definitions.function(function);
        let mut context = Self {
            program,
            captures,
            function,
            blocks: BlockBuilder::new(),
            parameters: Vec::new(),
            locals: Vec::new(),
            return_value: MethodLocal::new(RETURN_VALUE_LOCAL, None, lower_type(program, &def.return_type)?),
            variable_places: FxHashMap::default(),
            return_block: None,
            loops: Vec::new(),
        };

        if let Some(this) = def.this_variable {
            let FunctionOwner::Type(owner) = def.owner else {
                return Err(LoweringError::Internal(format!("instance function {} has no owning type", def.id)));
            };
            let ty = lower_type(program, &program.definitions.self_type(owner))?;
            let place = context.add_parameter(Some("this".to_owned()), ty);
            context.variable_places.insert(this, place);
        } else if captures.closure(function).is_some() {
            let ty = context.closure_type(function)?;
            context.add_parameter(Some("closure".to_owned()), ty);
        }

        let own_locals = captures.locals_of(function);
        let mut captured_parameters = Vec::new();
        for parameter in &def.parameters {
            let ty = lower_type(program, &parameter.ty)?;
            let place = context.add_parameter(Some(parameter.name.clone()), ty);
            match own_locals.and_then(|layout| layout.field_name(parameter.variable)) {
                Some(field) => captured_parameters.push((field.to_owned(), place)),
                None => {
                    context.variable_places.insert(parameter.variable, place);
                }
            }
        }

        if let Some(layout) = own_locals {
            let ty = context.locals_type(function)?;
            context.locals.push(MethodLocal::new(LOCALS_OBJECT_LOCAL, None, ty.clone()));
            let object = Place::local(LOCALS_OBJECT_LOCAL);
            context.assign(object.clone(), Rvalue::CreateObject(ty))?;
            for (field, parameter) in captured_parameters {
                context.assign(object.clone().class_field(field), Rvalue::Use(Operand::Copy(parameter)))?;
            }
            log::trace!("{} stores {} variables in its locals object", def.id, layout.fields.len());
        }

        for variable in &def.locals {
            if own_locals.is_some_and(|layout| layout.field_name(*variable).is_some()) {
                continue;
            }
            let local = program.definitions.variable(*variable);
            let ty = lower_type(program, &local.ty)?;
            let place = context.new_local(Some(local.name.clone()), ty);
            context.variable_places.insert(*variable, place);
        }
        Ok(context)
    }

    pub(super) fn defs(&self) -> &'a Definitions {
        &self.program.definitions
    }

    pub(super) fn def(&self) -> &'a FunctionDef {
        self.program.definitions.function(self.function)
    }

    pub(super) fn lower_type(&self, ty: &reef_types::TypeRef) -> Result<TypeReference, LoweringError> {
        lower_type(self.program, ty)
    }

    fn add_parameter(&mut self, user_name: Option<String>, ty: TypeReference) -> Place {
        let name = parameter_name(self.parameters.len());
        self.parameters.push(MethodLocal::new(name.clone(), user_name, ty));
        Place::Local(name)
    }

    fn new_local(&mut self, user_name: Option<String>, ty: TypeReference) -> Place {
        let name = local_name(self.locals.len());
        self.locals.push(MethodLocal::new(name.clone(), user_name, ty));
        Place::Local(name)
    }

    /// A fresh compiler temporary.
    pub(super) fn new_temp(&mut self, ty: TypeReference) -> Place {
        self.new_local(None, ty)
    }

    pub(super) fn new_temp_for(&mut self, ty: &TypeRef) -> Result<Place, LoweringError> {
        let ty = self.lower_type(ty)?;
        Ok(self.new_temp(ty))
    }

    pub(super) fn assign(&mut self, place: Place, rvalue: Rvalue) -> Result<(), LoweringError> {
        self.blocks.push(Statement::Assign(place, rvalue))
    }

    /// Where the value of `variable` lives when read from this function.
    pub(super) fn variable_place(&self, variable: VariableId) -> Result<Place, LoweringError> {
        let defs = self.defs();
        if let VariableKind::This { function } = defs.variable(variable).kind {
            if function == self.function {
                return Ok(Place::local(parameter_name(0)));
            }
            return match self.captures.closure(self.function) {
                Some(closure) if closure.this_owner.is_some() => {
                    Ok(Place::local(parameter_name(0)).class_field("this"))
                }
                _ => Err(LoweringError::Internal(format!(
                    "{} reads 'this' without capturing it",
                    self.def().id
                ))),
            };
        }
        if let Some((owner, field)) = self.captures.captured_field(defs, variable) {
            return Ok(self.locals_object_place(owner)?.class_field(field));
        }
        self.variable_places.get(&variable).cloned().ok_or_else(|| {
            LoweringError::Internal(format!(
                "variable '{}' is not available in {}",
                defs.variable(variable).name,
                self.def().id
            ))
        })
    }

    /// The locals object of `owner`, reached from this function.
    pub(super) fn locals_object_place(&self, owner: FunctionId) -> Result<Place, LoweringError> {
        if owner == self.function {
            return Ok(Place::local(LOCALS_OBJECT_LOCAL));
        }
        let reachable = self
            .captures
            .closure(self.function)
            .is_some_and(|closure| closure.locals.contains(&owner));
        if !reachable {
            return Err(LoweringError::Internal(format!(
                "{} cannot reach the locals of {}",
                self.def().id,
                self.defs().function(owner).id
            )));
        }
        let field = self.locals_type_id(owner)?.name().to_owned();
        Ok(Place::local(parameter_name(0)).class_field(field))
    }

    /// `this` of the enclosing instance method, as seen from this function.
    pub(super) fn this_operand(&self) -> Result<Operand, LoweringError> {
        if self.def().this_variable.is_some() {
            return Ok(Operand::Copy(Place::local(parameter_name(0))));
        }
        match self.captures.closure(self.function) {
            Some(closure) if closure.this_owner.is_some() => {
                Ok(Operand::Copy(Place::local(parameter_name(0)).class_field("this")))
            }
            _ => Err(LoweringError::Internal(format!("{} has no 'this'", self.def().id))),
        }
    }

    fn locals_type_id(&self, owner: FunctionId) -> Result<&'a DefId, LoweringError> {
        self.captures
            .locals_of(owner)
            .map(|layout| &layout.id)
            .ok_or_else(|| LoweringError::Internal(format!("{} has no locals object", self.defs().function(owner).id)))
    }

    /// `<Function>__Locals`, seen from inside `owner` or its local functions.
    pub(super) fn locals_type(&self, owner: FunctionId) -> Result<TypeReference, LoweringError> {
        let id = self.locals_type_id(owner)?.clone();
        Ok(TypeReference::concrete(id.name().to_owned(), id, method_generics(self.defs(), owner)))
    }

    /// `<Function>__Closure` of the local function `function`.
    pub(super) fn closure_type(&self, function: FunctionId) -> Result<TypeReference, LoweringError> {
        closure_type(self.program, self.captures, function)
    }

    /// Builds the closure object `function` expects as its first argument.
    pub(super) fn closure_object(&mut self, function: FunctionId) -> Result<Operand, LoweringError> {
        let captures = self.captures;
        let closure = captures.closure(function).ok_or_else(|| {
            LoweringError::Internal(format!("{} is not a closure", self.defs().function(function).id))
        })?;
        let ty = self.closure_type(function)?;
        let object = self.new_temp(ty.clone());
        self.assign(object.clone(), Rvalue::CreateObject(ty))?;
        if closure.this_owner.is_some() {
            let this = self.this_operand()?;
            self.assign(object.clone().class_field("this"), Rvalue::Use(this))?;
        }
        for owner in &closure.locals {
            let value = self.locals_object_place(*owner)?;
            let field = self.locals_type_id(*owner)?.name().to_owned();
            self.assign(object.clone().class_field(field), Rvalue::Use(Operand::Copy(value)))?;
        }
        Ok(Operand::Copy(object))
    }

    /// The method a reference to `function` calls, with its type arguments.
    pub(super) fn function_reference(&self, function: &InstantiatedFunction) -> Result<FunctionReference, LoweringError> {
        let defs = self.defs();
        let def = defs.function(function.function);
        let mut type_arguments = match def.owner {
            FunctionOwner::Global => Vec::new(),
            FunctionOwner::Type(_) => lower_types(self.program, &function.owner_type_arguments)?,
            FunctionOwner::Local(parent) => method_generics(defs, parent),
        };
        type_arguments.extend(lower_types(self.program, &function.type_arguments)?);
        Ok(FunctionReference {
            id: def.id.clone(),
            type_arguments,
        })
    }

    /// Ends the current block with a call and continues in a new one.
    pub(super) fn call(
        &mut self,
        function: FunctionReference,
        arguments: Vec<Operand>,
        destination: Place,
    ) -> Result<(), LoweringError> {
        let next = self.blocks.reserve();
        self.blocks.terminate(PendingTerminator::MethodCall {
            function,
            arguments,
            destination,
            goto_after: next,
        })?;
        self.blocks.place(next)
    }

    /// The label `return` jumps to, reserving it on first use.
    pub(super) fn return_label(&mut self) -> BlockRef {
        match self.return_block {
            Some(label) => label,
            None => {
                let label = self.blocks.reserve();
                self.return_block = Some(label);
                label
            }
        }
    }

    /// Leaves the method. An empty current block becomes the return block
    /// itself unless a return block was already placed.
    pub(super) fn emit_return(&mut self) -> Result<(), LoweringError> {
        if self.blocks.is_open() && self.blocks.is_empty() {
            let current = self.blocks.current();
            match self.return_block {
                Some(label) if self.blocks.is_placed(label) => {
                    return self.blocks.terminate(PendingTerminator::GoTo(label));
                }
                Some(label) => self.blocks.alias(label, current)?,
                None => {}
            }
            self.return_block = Some(current);
            return self.blocks.terminate(PendingTerminator::Return);
        }
        let label = self.return_label();
        self.blocks.terminate(PendingTerminator::GoTo(label))
    }

    /// Terminates the body and assembles the method.
    pub(super) fn finish(mut self) -> Result<LoweredMethod, LoweringError> {
        if self.blocks.is_open() {
            match self.return_block {
                None => self.blocks.terminate(PendingTerminator::Return)?,
                Some(label) if self.blocks.is_placed(label) || !self.blocks.is_empty() => {
                    self.blocks.terminate(PendingTerminator::GoTo(label))?;
                }
                Some(_) => self.emit_return()?,
            }
        }
        if let Some(label) = self.return_block {
            if self.blocks.only_current_jumps_to(label) {
                self.blocks.replace_terminator(PendingTerminator::Return)?;
            } else if !self.blocks.is_placed(label) {
                self.blocks.place(label)?;
                self.blocks.terminate(PendingTerminator::Return)?;
            }
        }

        let def = self.def();
        let basic_blocks = self.blocks.finish()?;
        log::debug!("lowered {} into {} blocks", def.id, basic_blocks.len());
        Ok(LoweredMethod {
            id: def.id.clone(),
            name: def.id.name().to_owned(),
            type_parameters: types::method_type_parameters(&self.program.definitions, self.function),
            basic_blocks,
            return_value: self.return_value,
            parameters: self.parameters,
            locals: self.locals,
        })
    }
}

/// `<Function>__Closure`, generic over the parameters in scope where the
/// closure object is built.
pub(super) fn closure_type(
    program: &TypedProgram,
    captures: &ClosureSpecialization,
    function: FunctionId,
) -> Result<TypeReference, LoweringError> {
    let defs = &program.definitions;
    let closure = captures
        .closure(function)
        .ok_or_else(|| LoweringError::Internal(format!("{} is not a closure", defs.function(function).id)))?;
    let type_arguments = match defs.function(function).owner {
        FunctionOwner::Local(parent) => method_generics(defs, parent),
        _ => Vec::new(),
    };
    Ok(TypeReference::concrete(
        closure.id.name().to_owned(),
        closure.id.clone(),
        type_arguments,
    ))
}
