use std::fmt;

use reef_types::DefId;

use super::{BasicBlock, MethodLocal, TypeReference};

/// A class or union, modelled as a list of variants. A class has the single
/// variant `_classVariant`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataType {
    pub id: DefId,
    pub name: String,
    pub type_parameters: Vec<String>,
    pub variants: Vec<DataTypeVariant>,
    pub static_fields: Vec<StaticField>,
}

impl DataType {
    pub fn variant(&self, name: &str) -> Option<&DataTypeVariant> {
        self.variants.iter().find(|v| v.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeVariant {
    pub name: String,
    pub fields: Vec<DataTypeField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeField {
    pub name: String,
    pub ty: TypeReference,
}

/// A static field and the blocks computing its initial value into
/// `return_value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticField {
    pub name: String,
    pub ty: TypeReference,
    pub initializer: Vec<BasicBlock>,
    pub locals: Vec<MethodLocal>,
    pub return_value: MethodLocal,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type {}", self.name)?;
        if !self.type_parameters.is_empty() {
            write!(f, "<{}>", self.type_parameters.join(", "))?;
        }
        writeln!(f, " {{")?;
        for variant in &self.variants {
            write!(f, "    {} {{", variant.name)?;
            for (i, field) in variant.fields.iter().enumerate() {
                let separator = if i == 0 { " " } else { ", " };
                write!(f, "{separator}{}: {}", field.name, field.ty)?;
            }
            writeln!(f, " }}")?;
        }
        for field in &self.static_fields {
            writeln!(f, "    static {}: {} = {{", field.name, field.ty)?;
            for local in &field.locals {
                writeln!(f, "    let {local}")?;
            }
            for block in &field.initializer {
                write!(f, "{block}")?;
            }
            writeln!(f, "    }}")?;
        }
        writeln!(f, "}}")
    }
}
