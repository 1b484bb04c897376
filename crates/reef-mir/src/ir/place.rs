use std::fmt;

use super::{TypeReference, CLASS_VARIANT, VARIANT_IDENTIFIER_FIELD};

/// A memory location: a method local, a field reached through another
/// place, or a static field of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Place {
    /// A parameter, local or the return value, by compiler name
    Local(String),
    /// A field of the object stored at `owner`, read as `variant`
    Field {
        owner: Box<Place>,
        field: String,
        variant: String,
    },
    StaticField { owner: TypeReference, field: String },
}

impl Place {
    pub fn local(name: impl Into<String>) -> Self {
        Place::Local(name.into())
    }

    /// The field `field` of the `variant` variant stored at `self`.
    pub fn field(self, field: impl Into<String>, variant: impl Into<String>) -> Self {
        Place::Field {
            owner: Box::new(self),
            field: field.into(),
            variant: variant.into(),
        }
    }

    /// A field of a class instance.
    pub fn class_field(self, field: impl Into<String>) -> Self {
        self.field(field, CLASS_VARIANT)
    }

    /// The local this place is rooted at, if any.
    pub fn root_local(&self) -> Option<&str> {
        match self {
            Place::Local(name) => Some(name),
            Place::Field { owner, .. } => owner.root_local(),
            Place::StaticField { .. } => None,
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Local(name) => write!(f, "{name}"),
            Place::Field { owner, field, variant } => {
                if variant == CLASS_VARIANT || field == VARIANT_IDENTIFIER_FIELD {
                    write!(f, "{owner}.{field}")
                } else {
                    write!(f, "({owner} as {variant}).{field}")
                }
            }
            Place::StaticField { owner, field } => write!(f, "{owner}::{field}"),
        }
    }
}
