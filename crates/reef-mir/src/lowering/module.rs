//! Module-level lowering: data types, method assembly and the entry points.

use indexmap::IndexSet;
use reef_types::{FieldDef, TypeDefKind, TypeRef};

use super::context::closure_type;
use super::prepass::ClosureSpecialization;
use super::types::{
    function_call_id, function_type_id, lower_type, method_generics, method_type_parameters, tuple_member_name,
    tuple_type_id, FUNCTION_PARAMETER_FIELD, FUNCTION_REFERENCE_FIELD,
};
use super::*;

/// Lowers a checked program with the default [`LoweringOptions`].
///
/// The program must have checked without errors.
pub fn lower_program(program: &TypedProgram) -> Result<LoweredModule, LoweringError> {
    lower_program_with_options(program, LoweringOptions::default())
}

pub fn lower_program_with_options(
    program: &TypedProgram,
    options: LoweringOptions,
) -> Result<LoweredModule, LoweringError> {
    log::info!("lowering module '{}'", program.module_id);
    let captures = ClosureSpecialization::analyze(program);
    let mut lowering = ModuleLowering {
        program,
        captures: &captures,
        module: LoweredModule::default(),
    };

    let defs = &program.definitions;
    let mut roots: Vec<FunctionId> = Vec::new();
    for ty in program.unions.iter().chain(&program.classes) {
        roots.extend(defs.ty(*ty).functions.iter().copied());
    }
    let main = defs.function(program.main);
    let emit_main = !main.body.is_empty();
    if emit_main {
        roots.push(program.main);
    }
    roots.extend(program.functions.iter().copied());

    for union in &program.unions {
        let data_type = lowering.lower_union(*union)?;
        lowering.module.data_types.push(data_type);
    }
    for class in &program.classes {
        let data_type = lowering.lower_class(*class)?;
        lowering.module.data_types.push(data_type);
    }
    for root in &roots {
        lowering.lower_synthesized_types(*root)?;
    }

    for union in &program.unions {
        for function in &defs.ty(*union).functions {
            lowering.lower_function_tree(*function)?;
        }
        lowering.lower_create_functions(*union)?;
    }
    for class in &program.classes {
        for function in &defs.ty(*class).functions {
            lowering.lower_function_tree(*function)?;
        }
    }
    if emit_main {
        lowering.lower_function_tree(program.main)?;
    }
    for function in &program.functions {
        lowering.lower_function_tree(*function)?;
    }

    if options.emit_builtin_types {
        lowering.lower_builtin_types()?;
    }
    log::info!(
        "lowered '{}': {} data types, {} methods",
        program.module_id,
        lowering.module.data_types.len(),
        lowering.module.methods.len()
    );
    Ok(lowering.module)
}

struct ModuleLowering<'a> {
    program: &'a TypedProgram,
    captures: &'a ClosureSpecialization,
    module: LoweredModule,
}

impl<'a> ModuleLowering<'a> {
    fn defs(&self) -> &'a Definitions {
        &self.program.definitions
    }

    fn lower_function(&self, function: FunctionId) -> Result<LoweredMethod, LoweringError> {
        let def = self.defs().function(function);
        log::debug!("lowering function {}", def.id);
        let mut context = FunctionLoweringContext::new(self.program, self.captures, function)?;
        context.lower_body(&def.body)?;
        context.finish()
    }

    /// Lowers the local functions of `function` before `function` itself.
    fn lower_function_tree(&mut self, function: FunctionId) -> Result<(), LoweringError> {
        for local in &self.defs().function(function).local_functions {
            self.lower_function_tree(*local)?;
        }
        let method = self.lower_function(function)?;
        self.module.methods.push(Method::Lowered(method));
        Ok(())
    }

    /// `<Union>__Create__<Variant>` for every tuple variant.
    fn lower_create_functions(&mut self, union: TypeDefId) -> Result<(), LoweringError> {
        let variants = self.defs().union_variants(union).unwrap_or_default();
        for variant in variants {
            if let VariantKind::Tuple { create_function, .. } = &variant.kind {
                let method = self.lower_create_function(*create_function)?;
                self.module.methods.push(Method::Lowered(method));
            }
        }
        Ok(())
    }

    fn lower_create_function(&self, function: FunctionId) -> Result<LoweredMethod, LoweringError> {
        let def = self.defs().function(function);
        let FunctionKind::VariantConstructor { union, variant } = def.kind else {
            return Err(LoweringError::Internal(format!("{} is not a variant constructor", def.id)));
        };
        let mut context = FunctionLoweringContext::new(self.program, self.captures, function)?;
        let result = Place::local(RETURN_VALUE_LOCAL);
        let variant_name = context.create_variant(&result, &def.return_type, union, variant)?;
        for index in 0..def.parameters.len() {
            context.assign(
                result.clone().field(tuple_member_name(index), variant_name.clone()),
                Rvalue::Use(Operand::Copy(Place::local(parameter_name(index)))),
            )?;
        }
        context.finish()
    }

    fn lower_union(&self, union: TypeDefId) -> Result<DataType, LoweringError> {
        let defs = self.defs();
        let ty = defs.ty(union);
        let discriminant = lower_type(self.program, &TypeRef::named(TypeDefId::U16))?;
        let mut variants = Vec::new();
        for variant in defs.union_variants(union).unwrap_or_default() {
            let mut fields = vec![DataTypeField {
                name: VARIANT_IDENTIFIER_FIELD.to_owned(),
                ty: discriminant.clone(),
            }];
            match &variant.kind {
                VariantKind::Unit => {}
                VariantKind::Tuple { members, .. } => {
                    for (index, member) in members.iter().enumerate() {
                        fields.push(DataTypeField {
                            name: tuple_member_name(index),
                            ty: lower_type(self.program, member)?,
                        });
                    }
                }
                VariantKind::Class { fields: declared } => fields.extend(self.instance_fields(declared)?),
            }
            variants.push(DataTypeVariant {
                name: variant.name.clone(),
                fields,
            });
        }
        log::trace!("union {} has {} variants", ty.id, variants.len());
        Ok(DataType {
            id: ty.id.clone(),
            name: ty.name.clone(),
            type_parameters: ty.type_parameters.clone(),
            variants,
            static_fields: Vec::new(),
        })
    }

    fn lower_class(&self, class: TypeDefId) -> Result<DataType, LoweringError> {
        let defs = self.defs();
        let ty = defs.ty(class);
        let TypeDefKind::Class { fields } = &ty.kind else {
            return Err(LoweringError::Internal(format!("{} is not a class", ty.id)));
        };
        let mut static_fields = Vec::new();
        for field in fields.iter().filter(|f| f.is_static) {
            static_fields.push(self.lower_static_field(field)?);
        }
        Ok(DataType {
            id: ty.id.clone(),
            name: ty.name.clone(),
            type_parameters: ty.type_parameters.clone(),
            variants: vec![DataTypeVariant {
                name: CLASS_VARIANT.to_owned(),
                fields: self.instance_fields(fields)?,
            }],
            static_fields,
        })
    }

    fn instance_fields(&self, fields: &[FieldDef]) -> Result<Vec<DataTypeField>, LoweringError> {
        fields
            .iter()
            .filter(|f| !f.is_static)
            .map(|f| {
                Ok(DataTypeField {
                    name: f.name.clone(),
                    ty: lower_type(self.program, &f.ty)?,
                })
            })
            .collect()
    }

    fn lower_static_field(&self, field: &FieldDef) -> Result<StaticField, LoweringError> {
        let ty = lower_type(self.program, &field.ty)?;
        let Some(initializer) = field.static_initializer else {
            return Err(LoweringError::Internal(format!("static field '{}' has no initializer", field.name)));
        };
        let method = self.lower_function(initializer)?;
        Ok(StaticField {
            name: field.name.clone(),
            ty,
            initializer: method.basic_blocks,
            locals: method.locals,
            return_value: method.return_value,
        })
    }

    /// `<Function>__Locals` and `<Function>__Closure` types, enclosing
    /// functions first.
    fn lower_synthesized_types(&mut self, function: FunctionId) -> Result<(), LoweringError> {
        let defs = self.defs();
        if let Some(layout) = self.captures.locals_of(function) {
            let mut fields = Vec::with_capacity(layout.fields.len());
            for (variable, name) in &layout.fields {
                fields.push(DataTypeField {
                    name: name.clone(),
                    ty: lower_type(self.program, &defs.variable(*variable).ty)?,
                });
            }
            self.module.data_types.push(DataType {
                id: layout.id.clone(),
                name: layout.id.name().to_owned(),
                type_parameters: method_type_parameters(defs, function),
                variants: vec![DataTypeVariant {
                    name: CLASS_VARIANT.to_owned(),
                    fields,
                }],
                static_fields: Vec::new(),
            });
        }

        if let Some(closure) = self.captures.closure(function) {
            let mut fields = Vec::new();
            if let Some(owner) = closure.this_owner {
                let FunctionOwner::Type(ty) = defs.function(owner).owner else {
                    return Err(LoweringError::Internal(format!("{} captures 'this' of a non-method", closure.id)));
                };
                fields.push(DataTypeField {
                    name: "this".to_owned(),
                    ty: lower_type(self.program, &defs.self_type(ty))?,
                });
            }
            for outer in &closure.locals {
                let layout = self.captures.locals_of(*outer).ok_or_else(|| {
                    LoweringError::Internal(format!("{} has no locals object", defs.function(*outer).id))
                })?;
                fields.push(DataTypeField {
                    name: layout.id.name().to_owned(),
                    ty: TypeReference::concrete(layout.id.name(), layout.id.clone(), method_generics(defs, *outer)),
                });
            }
            let type_parameters = match closure_type(self.program, self.captures, function)? {
                TypeReference::Concrete { type_arguments, .. } => type_arguments
                    .into_iter()
                    .filter_map(|argument| match argument {
                        TypeReference::Generic { name, .. } => Some(name),
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            self.module.data_types.push(DataType {
                id: closure.id.clone(),
                name: closure.id.name().to_owned(),
                type_parameters,
                variants: vec![DataTypeVariant {
                    name: CLASS_VARIANT.to_owned(),
                    fields,
                }],
                static_fields: Vec::new(),
            });
        }

        for local in &defs.function(function).local_functions {
            self.lower_synthesized_types(*local)?;
        }
        Ok(())
    }

    /// Appends the built-in generic types the module refers to.
    fn lower_builtin_types(&mut self) -> Result<(), LoweringError> {
        let referenced = referenced_core_types(&self.module);
        let mut result_referenced = false;
        let mut tuples = IndexSet::new();
        let mut functions = IndexSet::new();
        for name in &referenced {
            match name.split_once('`') {
                Some(("Tuple", arity)) => {
                    if let Ok(arity) = arity.parse::<usize>() {
                        tuples.insert(arity);
                    }
                }
                Some(("Function", arity)) => {
                    if let Ok(arity) = arity.parse::<usize>() {
                        functions.insert(arity);
                    }
                }
                _ if name == "result" => result_referenced = true,
                _ => {}
            }
        }

        if result_referenced {
            let data_type = self.lower_union(TypeDefId::RESULT)?;
            self.module.data_types.push(data_type);
            self.lower_create_functions(TypeDefId::RESULT)?;
        }
        for arity in tuples {
            self.module.data_types.push(tuple_data_type(arity));
        }
        for arity in functions {
            if arity == 0 {
                continue;
            }
            let (data_type, call) = function_object_type(arity - 1);
            self.module.data_types.push(data_type);
            self.module.methods.push(Method::Extern(call));
        }
        Ok(())
    }
}

fn generic(owner: &DefId, name: String) -> TypeReference {
    TypeReference::Generic {
        owner: owner.clone(),
        name,
    }
}

fn tuple_data_type(arity: usize) -> DataType {
    let id = tuple_type_id(arity);
    let type_parameters: Vec<String> = (0..arity).map(|i| format!("T{i}")).collect();
    let fields = type_parameters
        .iter()
        .enumerate()
        .map(|(index, name)| DataTypeField {
            name: tuple_member_name(index),
            ty: generic(&id, name.clone()),
        })
        .collect();
    DataType {
        name: id.name().to_owned(),
        id,
        type_parameters,
        variants: vec![DataTypeVariant {
            name: CLASS_VARIANT.to_owned(),
            fields,
        }],
        static_fields: Vec::new(),
    }
}

/// ``Function`N`` and its `Call` method. The function parameter field holds
/// the receiver or closure object, whose type is erased.
fn function_object_type(parameter_count: usize) -> (DataType, ExternMethod) {
    let id = function_type_id(parameter_count);
    let mut type_parameters: Vec<String> = (0..parameter_count).map(|i| format!("TParam{i}")).collect();
    type_parameters.push("TReturn".to_owned());
    let parameters: Vec<TypeReference> = type_parameters[..parameter_count]
        .iter()
        .map(|name| generic(&id, name.clone()))
        .collect();
    let return_type = generic(&id, "TReturn".to_owned());
    let self_type = TypeReference::concrete(
        id.name(),
        id.clone(),
        type_parameters.iter().map(|name| generic(&id, name.clone())).collect(),
    );
    let unit = TypeReference::concrete("Unit", DefId::core("Unit"), Vec::new());

    let data_type = DataType {
        id: id.clone(),
        name: id.name().to_owned(),
        type_parameters: type_parameters.clone(),
        variants: vec![DataTypeVariant {
            name: CLASS_VARIANT.to_owned(),
            fields: vec![
                DataTypeField {
                    name: FUNCTION_REFERENCE_FIELD.to_owned(),
                    ty: TypeReference::FunctionPointer {
                        parameters: parameters.clone(),
                        return_type: Box::new(return_type.clone()),
                    },
                },
                DataTypeField {
                    name: FUNCTION_PARAMETER_FIELD.to_owned(),
                    ty: unit,
                },
            ],
        }],
        static_fields: Vec::new(),
    };

    let call_id = function_call_id(parameter_count);
    let mut call_parameters = vec![MethodLocal::new(parameter_name(0), None, self_type)];
    for (index, ty) in parameters.into_iter().enumerate() {
        call_parameters.push(MethodLocal::new(parameter_name(index + 1), None, ty));
    }
    let call = ExternMethod {
        name: call_id.name().to_owned(),
        id: call_id,
        type_parameters,
        parameters: call_parameters,
        return_type,
    };
    (data_type, call)
}

/// Names of the built-in types mentioned anywhere in `module`.
fn referenced_core_types(module: &LoweredModule) -> IndexSet<String> {
    let mut found = IndexSet::new();
    let mut visit = |ty: &TypeReference| visit_type(ty, &mut found);

    for data_type in &module.data_types {
        for variant in &data_type.variants {
            variant.fields.iter().for_each(|f| visit(&f.ty));
        }
        for field in &data_type.static_fields {
            visit(&field.ty);
            visit(&field.return_value.ty);
            field.locals.iter().for_each(|l| visit(&l.ty));
            for block in &field.initializer {
                visit_block(block, &mut visit);
            }
        }
    }
    for method in &module.methods {
        if let Method::Lowered(method) = method {
            visit(&method.return_value.ty);
            method.parameters.iter().chain(&method.locals).for_each(|l| visit(&l.ty));
            for block in &method.basic_blocks {
                visit_block(block, &mut visit);
            }
        }
    }
    found
}

fn visit_type(ty: &TypeReference, found: &mut IndexSet<String>) {
    match ty {
        TypeReference::Concrete {
            name, id, type_arguments, ..
        } => {
            if id.is_core() {
                found.insert(name.clone());
            }
            type_arguments.iter().for_each(|a| visit_type(a, found));
        }
        TypeReference::Generic { .. } => {}
        TypeReference::FunctionPointer {
            parameters,
            return_type,
        } => {
            parameters.iter().for_each(|p| visit_type(p, found));
            visit_type(return_type, found);
        }
    }
}

fn visit_block(block: &BasicBlock, visit: &mut impl FnMut(&TypeReference)) {
    for Statement::Assign(place, rvalue) in &block.statements {
        if let Place::StaticField { owner, .. } = place {
            visit(owner);
        }
        match rvalue {
            Rvalue::CreateObject(ty) => visit(ty),
            Rvalue::Use(operand) | Rvalue::UnaryOperation { operand, .. } => visit_operand(operand, visit),
            Rvalue::BinaryOperation { left, right, .. } => {
                visit_operand(left, visit);
                visit_operand(right, visit);
            }
        }
    }
    if let Terminator::MethodCall { function, .. } = &block.terminator {
        function.type_arguments.iter().for_each(|a| visit(a));
    }
}

fn visit_operand(operand: &Operand, visit: &mut impl FnMut(&TypeReference)) {
    if let Operand::FunctionPointer(function) = operand {
        function.type_arguments.iter().for_each(|a| visit(a));
    }
}
