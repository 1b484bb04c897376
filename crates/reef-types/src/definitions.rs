//! Signatures of every type, function and variable known to one checking pass.

use miette::SourceSpan;

use crate::def_id::DefId;
use crate::inference::{InferenceTable, VarKind};
use crate::typed::TypedExpr;
use crate::types::{FunctionId, FunctionParameterType, FunctionType, GenericOwner, GenericParam, TypeDefId, TypeRef, VariableId};

/// Information about a class, union or primitive type
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// Fully qualified identity, e.g. `Main.MyUnion`
    pub id: DefId,
    /// The name as written in source
    pub name: String,
    pub type_parameters: Vec<String>,
    pub kind: TypeDefKind,
    /// Functions declared inside the type body, in declaration order
    pub functions: Vec<FunctionId>,
    pub is_public: bool,
    /// `None` for built-in types
    pub span: Option<SourceSpan>,
}

#[derive(Debug, Clone)]
pub enum TypeDefKind {
    Primitive,
    Class { fields: Vec<FieldDef> },
    Union { variants: Vec<VariantDef> },
}

/// A field of a class or of a union class variant.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
    pub is_public: bool,
    pub is_static: bool,
    pub is_mutable: bool,
    /// Function computing the value of a static field
    pub static_initializer: Option<FunctionId>,
    pub span: SourceSpan,
}

#[derive(Debug, Clone)]
pub struct VariantDef {
    pub name: String,
    pub kind: VariantKind,
    pub span: Option<SourceSpan>,
}

#[derive(Debug, Clone)]
pub enum VariantKind {
    Unit,
    /// Members are named `Item0`, `Item1`, ... once lowered
    Tuple {
        members: Vec<TypeRef>,
        create_function: FunctionId,
    },
    Class { fields: Vec<FieldDef> },
}

impl VariantKind {
    pub fn describe(&self) -> &'static str {
        match self {
            VariantKind::Unit => "unit",
            VariantKind::Tuple { .. } => "tuple",
            VariantKind::Class { .. } => "class",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Declared in source
    User,
    /// The top level expressions of a module
    Main,
    /// Creates a union tuple variant from its members
    VariantConstructor { union: TypeDefId, variant: usize },
    /// Computes the value of a static field
    StaticInitializer { owner: TypeDefId, field: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionOwner {
    Global,
    Type(TypeDefId),
    /// Declared inside the body of another function
    Local(FunctionId),
}

#[derive(Debug, Clone)]
pub struct ParameterDef {
    pub name: String,
    pub ty: TypeRef,
    pub mutable: bool,
    pub variable: VariableId,
}

/// Signature and checked body of a function.
#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub id: DefId,
    pub name: String,
    pub kind: FunctionKind,
    pub owner: FunctionOwner,
    pub type_parameters: Vec<String>,
    pub parameters: Vec<ParameterDef>,
    pub return_type: TypeRef,
    pub is_static: bool,
    pub is_mutable: bool,
    pub is_public: bool,
    /// The implicit `this` parameter of instance functions
    pub this_variable: Option<VariableId>,
    /// Locals declared in the body, in registration order
    pub locals: Vec<VariableId>,
    pub local_functions: Vec<FunctionId>,
    /// Variables of enclosing functions read or written by this function
    pub accessed_outer_variables: Vec<VariableId>,
    pub body: Vec<TypedExpr>,
    pub span: Option<SourceSpan>,
}

impl FunctionDef {
    /// The type of this function as a value, seen from inside its declaration.
    pub fn signature(&self) -> FunctionType {
        FunctionType {
            parameters: self
                .parameters
                .iter()
                .map(|p| FunctionParameterType {
                    ty: p.ty.clone(),
                    mutable: p.mutable,
                })
                .collect(),
            return_type: self.return_type.clone(),
        }
    }

    pub fn is_instance(&self) -> bool {
        self.this_variable.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Local { function: FunctionId },
    Parameter { function: FunctionId, index: usize },
    This { function: FunctionId },
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub ty: TypeRef,
    pub kind: VariableKind,
    pub mutable: bool,
    /// Set when a local function reads or writes this variable
    pub referenced_in_closure: bool,
    pub span: SourceSpan,
}

impl Variable {
    /// The function whose frame holds this variable.
    pub fn function(&self) -> FunctionId {
        match self.kind {
            VariableKind::Local { function }
            | VariableKind::Parameter { function, .. }
            | VariableKind::This { function } => function,
        }
    }
}

/// Arena of all definitions, indexed by [`TypeDefId`], [`FunctionId`] and [`VariableId`].
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    pub types: Vec<TypeDef>,
    pub functions: Vec<FunctionDef>,
    pub variables: Vec<Variable>,
}

impl Definitions {
    /// Definitions holding only the built-in types and functions.
    pub fn with_builtins() -> Self {
        let mut defs = Self::default();
        let primitives = ["i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "bool", "string", "Unit", "!"];
        for name in primitives {
            defs.types.push(TypeDef {
                id: DefId::core(name),
                name: name.to_owned(),
                type_parameters: Vec::new(),
                kind: TypeDefKind::Primitive,
                functions: Vec::new(),
                is_public: true,
                span: None,
            });
        }

        let result_id = DefId::core("result");
        defs.types.push(TypeDef {
            id: result_id.clone(),
            name: "result".to_owned(),
            type_parameters: vec!["TValue".to_owned(), "TError".to_owned()],
            kind: TypeDefKind::Union { variants: Vec::new() },
            functions: Vec::new(),
            is_public: true,
            span: None,
        });
        debug_assert_eq!(defs.types.len() - 1, TypeDefId::RESULT.0 as usize);

        let generic = |index: u32, name: &str| {
            TypeRef::Generic(GenericParam {
                owner: GenericOwner::Type(TypeDefId::RESULT),
                index,
                name: name.to_owned(),
            })
        };
        let members = [generic(0, "TValue"), generic(1, "TError")];
        let result_type = TypeRef::result(members[0].clone(), members[1].clone());
        let mut variants = Vec::new();
        for (index, (name, member)) in ["Ok", "Error"].into_iter().zip(members).enumerate() {
            let create_function = defs.add_variant_constructor(
                &result_id,
                TypeDefId::RESULT,
                index,
                name,
                vec![member.clone()],
                result_type.clone(),
                None,
            );
            variants.push(VariantDef {
                name: name.to_owned(),
                kind: VariantKind::Tuple {
                    members: vec![member],
                    create_function,
                },
                span: None,
            });
        }
        defs.types[TypeDefId::RESULT.0 as usize].kind = TypeDefKind::Union { variants };
        defs
    }

    /// Registers the `<Union>__Create__<Variant>` function of a tuple variant.
    pub fn add_variant_constructor(
        &mut self,
        union_id: &DefId,
        union: TypeDefId,
        variant: usize,
        variant_name: &str,
        members: Vec<TypeRef>,
        return_type: TypeRef,
        span: Option<SourceSpan>,
    ) -> FunctionId {
        let function = FunctionId(self.functions.len() as u32);
        let parameters = members
            .into_iter()
            .enumerate()
            .map(|(index, ty)| {
                let name = format!("Item{index}");
                let variable = self.add_variable(Variable {
                    name: name.clone(),
                    ty: ty.clone(),
                    kind: VariableKind::Parameter { function, index },
                    mutable: false,
                    referenced_in_closure: false,
                    span: span.unwrap_or_else(|| SourceSpan::from(0..0)),
                });
                ParameterDef {
                    name,
                    ty,
                    mutable: false,
                    variable,
                }
            })
            .collect();
        self.functions.push(FunctionDef {
            id: union_id.nested(&format!("Create__{variant_name}")),
            name: format!("Create__{variant_name}"),
            kind: FunctionKind::VariantConstructor { union, variant },
            owner: FunctionOwner::Type(union),
            type_parameters: Vec::new(),
            parameters,
            return_type,
            is_static: true,
            is_mutable: false,
            is_public: true,
            this_variable: None,
            locals: Vec::new(),
            local_functions: Vec::new(),
            accessed_outer_variables: Vec::new(),
            body: Vec::new(),
            span,
        });
        function
    }

    pub fn add_variable(&mut self, variable: Variable) -> VariableId {
        let id = VariableId(self.variables.len() as u32);
        self.variables.push(variable);
        id
    }

    pub fn ty(&self, id: TypeDefId) -> &TypeDef {
        &self.types[id.0 as usize]
    }

    pub fn ty_mut(&mut self, id: TypeDefId) -> &mut TypeDef {
        &mut self.types[id.0 as usize]
    }

    pub fn function(&self, id: FunctionId) -> &FunctionDef {
        &self.functions[id.0 as usize]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionDef {
        &mut self.functions[id.0 as usize]
    }

    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.0 as usize]
    }

    pub fn variable_mut(&mut self, id: VariableId) -> &mut Variable {
        &mut self.variables[id.0 as usize]
    }

    pub fn class_fields(&self, id: TypeDefId) -> Option<&[FieldDef]> {
        match &self.ty(id).kind {
            TypeDefKind::Class { fields } => Some(fields),
            _ => None,
        }
    }

    pub fn union_variants(&self, id: TypeDefId) -> Option<&[VariantDef]> {
        match &self.ty(id).kind {
            TypeDefKind::Union { variants } => Some(variants),
            _ => None,
        }
    }

    /// A function declared in the body of `owner`, looked up by name.
    pub fn type_function(&self, owner: TypeDefId, name: &str) -> Option<FunctionId> {
        self.ty(owner)
            .functions
            .iter()
            .copied()
            .find(|f| self.function(*f).name == name)
    }

    /// The type `owner` as seen from inside its own declaration.
    pub fn self_type(&self, owner: TypeDefId) -> TypeRef {
        let arguments = self
            .ty(owner)
            .type_parameters
            .iter()
            .enumerate()
            .map(|(index, name)| {
                TypeRef::Generic(GenericParam {
                    owner: GenericOwner::Type(owner),
                    index: index as u32,
                    name: name.clone(),
                })
            })
            .collect();
        TypeRef::Named { def: owner, arguments }
    }

    /// Renders `ty` the way it is written in source. Unbound variables render
    /// as `?` or `{integer}`.
    pub fn display_type(&self, ty: &TypeRef, table: &InferenceTable) -> String {
        match table.shallow_resolve(ty) {
            TypeRef::Named { def, arguments } => {
                let name = &self.ty(def).name;
                if arguments.is_empty() {
                    name.clone()
                } else {
                    let arguments: Vec<_> = arguments.iter().map(|a| self.display_type(a, table)).collect();
                    format!("{name}::<{}>", arguments.join(", "))
                }
            }
            TypeRef::Function(function) => {
                let parameters: Vec<_> = function
                    .parameters
                    .iter()
                    .map(|p| {
                        let ty = self.display_type(&p.ty, table);
                        if p.mutable {
                            format!("mut {ty}")
                        } else {
                            ty
                        }
                    })
                    .collect();
                format!(
                    "Fn({}): {}",
                    parameters.join(", "),
                    self.display_type(&function.return_type, table)
                )
            }
            TypeRef::Tuple(members) => {
                let members: Vec<_> = members.iter().map(|m| self.display_type(m, table)).collect();
                format!("({})", members.join(", "))
            }
            TypeRef::Generic(param) => param.name,
            TypeRef::Var(var) => match table.kind(var) {
                VarKind::Integer => "{integer}".to_owned(),
                VarKind::General => "?".to_owned(),
            },
            TypeRef::Unknown => "{unknown}".to_owned(),
        }
    }
}
