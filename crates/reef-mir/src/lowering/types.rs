//! Translation of checked [`TypeRef`]s into [`TypeReference`]s.

use reef_types::{FunctionOwner, GenericOwner, TypeRef};

use super::*;

/// Name and identity of the built-in ``Tuple`N`` type.
pub fn tuple_type_id(arity: usize) -> DefId {
    DefId::core(&format!("Tuple`{arity}"))
}

/// Name and identity of the built-in ``Function`N`` type, where `N` counts
/// the parameters plus the return type.
pub fn function_type_id(parameter_count: usize) -> DefId {
    DefId::core(&format!("Function`{}", parameter_count + 1))
}

/// The method invoking a function object of `parameter_count` parameters.
pub fn function_call_id(parameter_count: usize) -> DefId {
    function_type_id(parameter_count).nested("Call")
}

/// Field of a function object holding the function pointer.
pub const FUNCTION_REFERENCE_FIELD: &str = "FunctionReference";
/// Field of a function object holding `this` or the closure object.
pub const FUNCTION_PARAMETER_FIELD: &str = "FunctionParameter";

pub fn tuple_member_name(index: usize) -> String {
    format!("Item{index}")
}

/// Lowers a fully inferred type.
pub fn lower_type(program: &TypedProgram, ty: &TypeRef) -> Result<TypeReference, LoweringError> {
    let defs = &program.definitions;
    match program.inference.resolve(ty) {
        TypeRef::Named { def, arguments } => {
            let type_def = defs.ty(def);
            Ok(TypeReference::concrete(
                type_def.name.clone(),
                type_def.id.clone(),
                lower_types(program, &arguments)?,
            ))
        }
        TypeRef::Function(function) => {
            let mut arguments = function
                .parameters
                .iter()
                .map(|p| lower_type(program, &p.ty))
                .collect::<Result<Vec<_>, _>>()?;
            arguments.push(lower_type(program, &function.return_type)?);
            let id = function_type_id(function.parameters.len());
            Ok(TypeReference::concrete(id.name().to_owned(), id, arguments))
        }
        TypeRef::Tuple(members) => {
            let id = tuple_type_id(members.len());
            Ok(TypeReference::concrete(
                id.name().to_owned(),
                id,
                lower_types(program, &members)?,
            ))
        }
        TypeRef::Generic(param) => {
            let owner = match param.owner {
                GenericOwner::Type(owner) => defs.ty(owner).id.clone(),
                GenericOwner::Function(owner) => defs.function(owner).id.clone(),
            };
            Ok(TypeReference::Generic {
                owner,
                name: param.name,
            })
        }
        other @ (TypeRef::Var(_) | TypeRef::Unknown) => Err(LoweringError::MissingType {
            context: format!("{other:?}"),
        }),
    }
}

pub fn lower_types(program: &TypedProgram, types: &[TypeRef]) -> Result<Vec<TypeReference>, LoweringError> {
    types.iter().map(|ty| lower_type(program, ty)).collect()
}

/// The generic parameters in scope inside `function`, as seen from inside it:
/// those of the owning type or enclosing function first, then its own.
pub fn method_generics(defs: &Definitions, function: FunctionId) -> Vec<TypeReference> {
    let def = defs.function(function);
    let mut generics = match def.owner {
        FunctionOwner::Global => Vec::new(),
        FunctionOwner::Type(owner) => {
            let owner = defs.ty(owner);
            owner
                .type_parameters
                .iter()
                .map(|name| TypeReference::Generic {
                    owner: owner.id.clone(),
                    name: name.clone(),
                })
                .collect()
        }
        FunctionOwner::Local(parent) => method_generics(defs, parent),
    };
    generics.extend(def.type_parameters.iter().map(|name| TypeReference::Generic {
        owner: def.id.clone(),
        name: name.clone(),
    }));
    generics
}

/// Names of [`method_generics`].
pub fn method_type_parameters(defs: &Definitions, function: FunctionId) -> Vec<String> {
    method_generics(defs, function)
        .into_iter()
        .filter_map(|generic| match generic {
            TypeReference::Generic { name, .. } => Some(name),
            _ => None,
        })
        .collect()
}

/// Size in bytes and signedness of an integer type.
pub fn integer_layout(program: &TypedProgram, ty: &TypeRef) -> Option<(u8, bool)> {
    program.inference.resolve(ty).def().and_then(TypeDefId::integer_layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_generic_names() {
        assert_eq!(tuple_type_id(2).full_name, "System.Tuple`2");
        assert_eq!(function_type_id(0).name(), "Function`1");
        assert_eq!(function_call_id(2).name(), "Function`3__Call");
        assert_eq!(tuple_member_name(1), "Item1");
    }
}
