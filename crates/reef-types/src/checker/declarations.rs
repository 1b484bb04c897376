//! Declaration pass: types, variants, fields and function signatures, followed
//! by the order in which bodies are checked.

use miette::SourceSpan;
use reef_syntax::ast::{Block, Expr, Ident, LangFunction, LangProgram, Modifiers, ProgramClass, ProgramUnion, UnionVariantKind};

use super::{FunctionContext, TypeChecker};
use crate::def_id::DefId;
use crate::definitions::{
    FieldDef, FunctionDef, FunctionKind, FunctionOwner, ParameterDef, TypeDef, TypeDefKind, Variable, VariableKind,
    VariantDef, VariantKind,
};
use crate::error::TypeCheckerError;
use crate::typed::{TypedExpr, TypedExprKind};
use crate::types::{FunctionId, GenericOwner, TypeDefId, TypeRef};

impl TypeChecker {
    /// Checks a whole program.
    ///
    /// Union bodies are checked first, then class bodies, then the top level
    /// expressions and finally the bodies of global functions.
    pub(crate) fn check_program(&mut self, program: &LangProgram) {
        log::debug!("checking module '{}'", program.module_id);

        let mut unions = Vec::new();
        for union in &program.unions {
            let kind = TypeDefKind::Union { variants: Vec::new() };
            if let Some(id) = self.register_type(&union.name, &union.type_parameters, &union.modifiers, union.span, kind) {
                unions.push((id, union));
            }
        }
        let mut classes = Vec::new();
        for class in &program.classes {
            let kind = TypeDefKind::Class { fields: Vec::new() };
            if let Some(id) = self.register_type(&class.name, &class.type_parameters, &class.modifiers, class.span, kind) {
                classes.push((id, class));
            }
        }

        let union_functions: Vec<_> = unions
            .iter()
            .map(|(id, union)| self.declare_union_members(*id, union))
            .collect();
        let class_functions: Vec<_> = classes
            .iter()
            .map(|(id, class)| self.declare_class_members(*id, class))
            .collect();

        let mut functions = Vec::new();
        for function in &program.functions {
            if let Some(id) = self.declare_global_function(function) {
                functions.push((id, function));
            }
        }

        for ((id, _), declared) in unions.iter().zip(&union_functions) {
            self.check_type_bodies(*id, None, declared);
        }
        for ((id, class), declared) in classes.iter().zip(&class_functions) {
            self.check_type_bodies(*id, Some(class), declared);
        }

        self.check_main(&program.expressions);

        for (id, function) in &functions {
            self.check_function_body(*id, &function.body, function.name.span);
        }

        self.unions = unions.iter().map(|(id, _)| *id).collect();
        self.classes = classes.iter().map(|(id, _)| *id).collect();
        self.functions = functions.iter().map(|(id, _)| *id).collect();
    }

    fn register_type(
        &mut self,
        name: &Ident,
        type_parameters: &[Ident],
        modifiers: &Modifiers,
        span: SourceSpan,
        kind: TypeDefKind,
    ) -> Option<TypeDefId> {
        if self.type_names.contains_key(&name.name) {
            self.report_error(TypeCheckerError::ConflictingTypeName {
                name: name.name.clone(),
                span: name.span,
            });
            return None;
        }

        let mut parameters: Vec<String> = Vec::new();
        for parameter in type_parameters {
            if !parameters.contains(&parameter.name) {
                parameters.push(parameter.name.clone());
            }
        }

        let id = TypeDefId(self.defs.types.len() as u32);
        self.defs.types.push(TypeDef {
            id: DefId::in_module(&self.module_id, &name.name),
            name: name.name.clone(),
            type_parameters: parameters,
            kind,
            functions: Vec::new(),
            is_public: modifiers.is_public(),
            span: Some(span),
        });
        self.type_names.insert(name.name.clone(), id);
        log::trace!("registered type '{}' as {:?}", name.name, id);
        Some(id)
    }

    fn declare_union_members<'p>(&mut self, id: TypeDefId, union: &'p ProgramUnion) -> Vec<(FunctionId, &'p LangFunction)> {
        self.with_scope(|this| {
            let names = this.declare_generics(&union.type_parameters);
            this.enter_generics(GenericOwner::Type(id), &names);
            let declared = this.declare_type_functions(id, &union.functions);

            let union_id = this.defs.ty(id).id.clone();
            let self_type = this.defs.self_type(id);
            let mut variants: Vec<VariantDef> = Vec::new();
            for variant in &union.variants {
                if variants.iter().any(|v| v.name == variant.name.name) {
                    this.report_error(TypeCheckerError::DuplicateVariantName {
                        name: variant.name.name.clone(),
                        span: variant.name.span,
                    });
                    continue;
                }

                let kind = match &variant.kind {
                    UnionVariantKind::Unit => VariantKind::Unit,
                    UnionVariantKind::Tuple(members) => {
                        if members.is_empty() {
                            this.report_error(TypeCheckerError::EmptyUnionTupleVariant {
                                union: union.name.name.clone(),
                                variant: variant.name.name.clone(),
                                span: variant.name.span,
                            });
                        }
                        let members: Vec<TypeRef> = members.iter().map(|m| this.resolve_type(m, false)).collect();
                        let create_function = this.defs.add_variant_constructor(
                            &union_id,
                            id,
                            variants.len(),
                            &variant.name.name,
                            members.clone(),
                            self_type.clone(),
                            Some(variant.name.span),
                        );
                        VariantKind::Tuple {
                            members,
                            create_function,
                        }
                    }
                    UnionVariantKind::Class(fields) => {
                        let mut defs: Vec<FieldDef> = Vec::new();
                        for field in fields {
                            if defs.iter().any(|f| f.name == field.name.name) {
                                this.report_error(TypeCheckerError::DuplicateFieldInUnionClassVariant {
                                    union: union.name.name.clone(),
                                    variant: variant.name.name.clone(),
                                    field: field.name.name.clone(),
                                    span: field.name.span,
                                });
                                continue;
                            }
                            let ty = field.ty.as_ref().map_or(TypeRef::Unknown, |t| this.resolve_type(t, false));
                            defs.push(FieldDef {
                                name: field.name.name.clone(),
                                ty,
                                is_public: true,
                                is_static: false,
                                is_mutable: field.modifiers.is_mutable(),
                                static_initializer: None,
                                span: field.name.span,
                            });
                        }
                        VariantKind::Class { fields: defs }
                    }
                };
                variants.push(VariantDef {
                    name: variant.name.name.clone(),
                    kind,
                    span: Some(variant.name.span),
                });
            }
            this.defs.ty_mut(id).kind = TypeDefKind::Union { variants };
            declared
        })
    }

    fn declare_class_members<'p>(&mut self, id: TypeDefId, class: &'p ProgramClass) -> Vec<(FunctionId, &'p LangFunction)> {
        self.with_scope(|this| {
            let names = this.declare_generics(&class.type_parameters);
            this.enter_generics(GenericOwner::Type(id), &names);
            let declared = this.declare_type_functions(id, &class.functions);

            let mut fields: Vec<FieldDef> = Vec::new();
            for field in &class.fields {
                if fields.iter().any(|f| f.name == field.name.name) {
                    this.report_error(TypeCheckerError::DuplicateField {
                        field: field.name.name.clone(),
                        span: field.name.span,
                    });
                    continue;
                }
                let ty = field.ty.as_ref().map_or(TypeRef::Unknown, |t| this.resolve_type(t, false));
                let is_static = field.modifiers.is_static();
                let static_initializer = match (is_static, &field.initializer) {
                    (true, Some(_)) => Some(this.declare_static_initializer(id, fields.len(), &field.name, ty.clone())),
                    (true, None) => {
                        this.report_error(TypeCheckerError::StaticFieldWithoutInitializer {
                            field: field.name.name.clone(),
                            span: field.name.span,
                        });
                        None
                    }
                    (false, Some(initializer)) => {
                        this.report_error(TypeCheckerError::InstanceFieldWithInitializer {
                            field: field.name.name.clone(),
                            span: initializer.span,
                        });
                        None
                    }
                    (false, None) => None,
                };
                fields.push(FieldDef {
                    name: field.name.name.clone(),
                    ty,
                    is_public: field.modifiers.is_public(),
                    is_static,
                    is_mutable: field.modifiers.is_mutable(),
                    static_initializer,
                    span: field.name.span,
                });
            }
            this.defs.ty_mut(id).kind = TypeDefKind::Class { fields };
            declared
        })
    }

    fn declare_type_functions<'p>(
        &mut self,
        owner: TypeDefId,
        functions: &'p [LangFunction],
    ) -> Vec<(FunctionId, &'p LangFunction)> {
        let mut declared = Vec::new();
        for function in functions {
            if self.defs.type_function(owner, &function.name.name).is_some() {
                self.report_error(TypeCheckerError::ConflictingFunctionName {
                    name: function.name.name.clone(),
                    span: function.name.span,
                });
                continue;
            }
            let id = self.defs.ty(owner).id.nested(&function.name.name);
            let function_id = self.declare_function(function, FunctionOwner::Type(owner), id);
            self.defs.ty_mut(owner).functions.push(function_id);
            declared.push((function_id, function));
        }
        declared
    }

    fn declare_global_function(&mut self, function: &LangFunction) -> Option<FunctionId> {
        if self.lookup_function(&function.name.name).is_some() {
            self.report_error(TypeCheckerError::ConflictingFunctionName {
                name: function.name.name.clone(),
                span: function.name.span,
            });
            return None;
        }
        let id = DefId::in_module(&self.module_id, &function.name.name);
        let function_id = self.declare_function(function, FunctionOwner::Global, id);
        self.current_scope().functions.insert(function.name.name.clone(), function_id);
        Some(function_id)
    }

    /// Declares a function local to the current function.
    pub(crate) fn declare_local_function(&mut self, function: &LangFunction) -> FunctionId {
        let parent = self.context.function;
        let id = self.defs.function(parent).id.nested(&function.name.name);
        let function_id = self.declare_function(function, FunctionOwner::Local(parent), id);
        self.defs.function_mut(parent).local_functions.push(function_id);
        function_id
    }

    /// Registers the signature of `function`.
    ///
    /// Parameters become variables of the new function. Instance functions of
    /// a type additionally get a `this` variable.
    fn declare_function(&mut self, function: &LangFunction, owner: FunctionOwner, id: DefId) -> FunctionId {
        let name = function.name.name.clone();
        let is_mutable = function.modifiers.is_mutable();
        let is_static = match owner {
            FunctionOwner::Global => true,
            FunctionOwner::Type(_) | FunctionOwner::Local(_) => function.modifiers.is_static(),
        };
        let mutability_span = function.modifiers.mutability.unwrap_or(function.name.span);
        if is_mutable {
            match owner {
                FunctionOwner::Global => self.report_error(TypeCheckerError::GlobalFunctionMarkedAsMutable {
                    function: name.clone(),
                    span: mutability_span,
                }),
                _ if is_static => self.report_error(TypeCheckerError::StaticFunctionMarkedAsMutable {
                    function: name.clone(),
                    span: mutability_span,
                }),
                FunctionOwner::Local(_) if !self.context.is_mutable => {
                    self.report_error(TypeCheckerError::CannotCreateMutableFunctionWithinNonMutableFunction {
                        function: name.clone(),
                        span: mutability_span,
                    })
                }
                _ => {}
            }
        }

        let function_id = FunctionId(self.defs.functions.len() as u32);
        let type_parameters = self.declare_generics(&function.type_parameters);
        self.defs.functions.push(FunctionDef {
            id,
            name: name.clone(),
            kind: FunctionKind::User,
            owner,
            type_parameters: type_parameters.clone(),
            parameters: Vec::new(),
            return_type: TypeRef::unit(),
            is_static,
            is_mutable,
            is_public: function.modifiers.is_public(),
            this_variable: None,
            locals: Vec::new(),
            local_functions: Vec::new(),
            accessed_outer_variables: Vec::new(),
            body: Vec::new(),
            span: Some(function.span),
        });

        let (parameters, return_type) = self.with_scope(|this| {
            this.enter_generics(GenericOwner::Function(function_id), &type_parameters);
            let mut parameters: Vec<ParameterDef> = Vec::new();
            for parameter in &function.parameters {
                if parameters.iter().any(|p| p.name == parameter.name.name) {
                    this.report_error(TypeCheckerError::DuplicateFunctionParameter {
                        name: parameter.name.name.clone(),
                        function: name.clone(),
                        span: parameter.name.span,
                    });
                    continue;
                }
                let ty = parameter.ty.as_ref().map_or(TypeRef::Unknown, |t| this.resolve_type(t, false));
                let variable = this.defs.add_variable(Variable {
                    name: parameter.name.name.clone(),
                    ty: ty.clone(),
                    kind: VariableKind::Parameter {
                        function: function_id,
                        index: parameters.len(),
                    },
                    mutable: parameter.mutable,
                    referenced_in_closure: false,
                    span: parameter.name.span,
                });
                parameters.push(ParameterDef {
                    name: parameter.name.name.clone(),
                    ty,
                    mutable: parameter.mutable,
                    variable,
                });
            }
            let return_type = function
                .return_type
                .as_ref()
                .map_or_else(TypeRef::unit, |t| this.resolve_type(t, false));
            (parameters, return_type)
        });

        let this_variable = match owner {
            FunctionOwner::Type(owner) if !is_static => Some(self.defs.add_variable(Variable {
                name: "this".to_owned(),
                ty: self.defs.self_type(owner),
                kind: VariableKind::This { function: function_id },
                mutable: is_mutable,
                referenced_in_closure: false,
                span: function.name.span,
            })),
            _ => None,
        };

        let def = self.defs.function_mut(function_id);
        def.parameters = parameters;
        def.return_type = return_type;
        def.this_variable = this_variable;
        log::trace!("declared function '{}' as {:?}", def.id, function_id);
        function_id
    }

    fn declare_static_initializer(&mut self, owner: TypeDefId, field: usize, name: &Ident, ty: TypeRef) -> FunctionId {
        let function_id = FunctionId(self.defs.functions.len() as u32);
        let id = self.defs.ty(owner).id.nested(&format!("{}__Initializer", name.name));
        self.defs.functions.push(FunctionDef {
            id,
            name: format!("{}__Initializer", name.name),
            kind: FunctionKind::StaticInitializer { owner, field },
            owner: FunctionOwner::Type(owner),
            type_parameters: Vec::new(),
            parameters: Vec::new(),
            return_type: ty,
            is_static: true,
            is_mutable: false,
            is_public: false,
            this_variable: None,
            locals: Vec::new(),
            local_functions: Vec::new(),
            accessed_outer_variables: Vec::new(),
            body: Vec::new(),
            span: Some(name.span),
        });
        function_id
    }

    fn check_type_bodies(&mut self, owner: TypeDefId, class: Option<&ProgramClass>, functions: &[(FunctionId, &LangFunction)]) {
        let names = self.defs.ty(owner).type_parameters.clone();
        self.with_scope(|this| {
            this.enter_generics(GenericOwner::Type(owner), &names);
            if let Some(class) = class {
                this.check_static_initializers(owner, class);
            }
            for (id, function) in functions {
                this.check_function_body(*id, &function.body, function.name.span);
            }
        });
    }

    fn check_static_initializers(&mut self, owner: TypeDefId, class: &ProgramClass) {
        let initializers: Vec<(FunctionId, TypeRef, String)> = self
            .defs
            .class_fields(owner)
            .unwrap_or_default()
            .iter()
            .filter_map(|f| f.static_initializer.map(|i| (i, f.ty.clone(), f.name.clone())))
            .collect();

        for (function, ty, name) in initializers {
            let Some(expr) = class
                .fields
                .iter()
                .find(|f| f.name.name == name)
                .and_then(|f| f.initializer.as_ref())
            else {
                continue;
            };
            let context = FunctionContext {
                function,
                return_type: ty.clone(),
                owner_type: Some(owner),
                is_static: true,
                is_mutable: false,
                loop_depth: 0,
                this_variable: None,
            };
            let value = self.with_function(context, |this| this.with_scope(|this| this.check_expr_expecting(expr, &ty)));
            let span = value.span;
            let body = TypedExpr {
                diverges: true,
                ..TypedExpr::new(TypedExprKind::Return(Some(Box::new(value))), TypeRef::never(), span)
            };
            self.defs.function_mut(function).body = vec![body];
        }
    }

    fn check_main(&mut self, expressions: &[Expr]) {
        let main = self.main;
        let body: Vec<TypedExpr> = self.with_scope(|this| expressions.iter().map(|e| this.check_expr(e, false)).collect());
        self.defs.function_mut(main).body = body;
    }

    /// Checks the body of a declared function.
    ///
    /// A function with a non-unit return type must not complete normally.
    pub(crate) fn check_function_body(&mut self, function: FunctionId, body: &Block, name_span: SourceSpan) {
        let def = self.defs.function(function);
        let is_static = def.is_static;
        let (owner_type, this_variable) = match def.owner {
            FunctionOwner::Type(owner) => (Some(owner), def.this_variable),
            FunctionOwner::Local(_) if !is_static => (self.context.owner_type, self.context.this_variable),
            FunctionOwner::Local(_) => (self.context.owner_type, None),
            FunctionOwner::Global => (None, None),
        };
        let context = FunctionContext {
            function,
            return_type: def.return_type.clone(),
            owner_type,
            is_static,
            is_mutable: def.is_mutable,
            loop_depth: 0,
            this_variable,
        };
        let return_type = def.return_type.clone();
        let type_parameters = def.type_parameters.clone();
        let parameters: Vec<_> = def.parameters.iter().map(|p| (p.name.clone(), p.variable)).collect();
        let own_this = def.this_variable;
        log::debug!("checking body of '{}'", def.id);

        let (expressions, diverges) = self.with_function(context, |this| {
            this.with_scope(|this| {
                this.enter_generics(GenericOwner::Function(function), &type_parameters);
                for (name, variable) in &parameters {
                    this.current_scope().variables.insert(name.clone(), *variable);
                    this.instantiated.insert(*variable);
                }
                if let Some(variable) = own_this {
                    this.instantiated.insert(variable);
                }
                this.check_block_contents(body, false)
            })
        });

        let resolved = self.table.resolve(&return_type);
        if !diverges && !resolved.is_unit() && !resolved.is_unknown() {
            let expected = self.display(&return_type);
            self.report_error(TypeCheckerError::MismatchedTypes {
                expected,
                found: "Unit".to_owned(),
                span: name_span,
            });
        }
        self.defs.function_mut(function).body = expressions;
    }
}
