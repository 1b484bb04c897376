use std::fmt;

/// Stable identity of a type or function: the module it lives in and its
/// fully qualified name, e.g. `Main.MyUnion__Create__B`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId {
    pub module_id: String,
    pub full_name: String,
}

impl DefId {
    pub const CORE_MODULE: &'static str = "Reef.Core";
    pub const CORE_NAMESPACE: &'static str = "System";

    pub fn new(module_id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            module_id: module_id.into(),
            full_name: full_name.into(),
        }
    }

    /// A definition inside `module_id`, named `<module_id>.<name>`.
    pub fn in_module(module_id: &str, name: &str) -> Self {
        Self::new(module_id, format!("{module_id}.{name}"))
    }

    pub fn core(name: &str) -> Self {
        Self::new(Self::CORE_MODULE, format!("{}.{name}", Self::CORE_NAMESPACE))
    }

    pub fn main(module_id: &str) -> Self {
        Self::in_module(module_id, "_Main")
    }

    /// A definition nested under this one, named `<full_name>__<suffix>`.
    pub fn nested(&self, suffix: &str) -> Self {
        Self::new(self.module_id.clone(), format!("{}__{suffix}", self.full_name))
    }

    /// The part of the full name after the namespace.
    pub fn name(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map_or(self.full_name.as_str(), |(_, name)| name)
    }

    pub fn is_core(&self) -> bool {
        self.module_id == Self::CORE_MODULE
    }
}

impl fmt::Display for DefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_names_keep_the_module() {
        let union = DefId::in_module("Main", "MyUnion");
        let create = union.nested("Create__B");
        assert_eq!(create.full_name, "Main.MyUnion__Create__B");
        assert_eq!(create.name(), "MyUnion__Create__B");
        assert_eq!(create.module_id, "Main");
    }

    #[test]
    fn core_definitions_live_in_the_system_namespace() {
        let result = DefId::core("result");
        assert!(result.is_core());
        assert_eq!(result.full_name, "System.result");
        assert_eq!(result.name(), "result");
    }
}
