//! Qualified method identifiers and JVM descriptor conversion.
//!
//! Work items carry method identifiers in source surface syntax, e.g.
//! `com.example.Foo.bar(int,java.lang.String)`. Coverage reports identify
//! the same methods by internal class name (`com/example/Foo`) and JVM
//! descriptor (`(ILjava/lang/String;)V`). This module parses the former and
//! computes the descriptor *prefix* used to match against the latter. The
//! prefix deliberately omits the return type, which the surface syntax does
//! not encode; matching is therefore `starts_with`, not equality.

use crate::result::{VerificarError, VerificarResult};

/// A parsed method identifier: class, method name, and raw parameter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodId {
    raw: String,
    class_name: String,
    method_name: String,
    params: String,
}

impl MethodId {
    /// Parse an identifier of the form `pkg.Class.method(type,type)`.
    ///
    /// The parameter list must be present (possibly empty) and the method
    /// must be class-qualified. Anything else is malformed; callers skip
    /// malformed identifiers rather than aborting the surrounding commit.
    pub fn parse(raw: &str) -> VerificarResult<Self> {
        let open = raw
            .find('(')
            .ok_or_else(|| VerificarError::method_id(raw, "missing parameter list"))?;
        let method_part = &raw[..open];
        let params = raw[open + 1..].trim_end_matches(')').to_string();

        let dot = method_part
            .rfind('.')
            .ok_or_else(|| VerificarError::method_id(raw, "missing class qualifier"))?;
        let class_name = &method_part[..dot];
        let method_name = &method_part[dot + 1..];
        if class_name.is_empty() || method_name.is_empty() {
            return Err(VerificarError::method_id(
                raw,
                "empty class or method name",
            ));
        }

        Ok(Self {
            raw: raw.to_string(),
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            params,
        })
    }

    /// The identifier as it appeared in the work item.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Fully qualified class name in source form (`com.example.Foo`).
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Bare method name.
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Raw comma-separated parameter list, without parentheses.
    pub fn params(&self) -> &str {
        &self.params
    }

    /// Class name in internal slashed form (`com/example/Foo`), as coverage
    /// reports spell it.
    pub fn internal_class_name(&self) -> String {
        self.class_name.replace('.', "/")
    }

    /// JVM descriptor prefix for the parameter list, e.g. `(ILjava/lang/String;)`.
    pub fn descriptor_prefix(&self) -> String {
        params_to_descriptor_prefix(&self.params)
    }

    /// Selector accepted by the build tool's single-test switch
    /// (`Class#method`).
    pub fn test_selector(&self) -> String {
        format!("{}#{}", self.class_name, self.method_name)
    }
}

impl std::fmt::Display for MethodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Convert a single source-syntax type to its JVM descriptor form.
///
/// Primitives map to single-letter codes; anything else is treated as a
/// reference type and wrapped in object-descriptor syntax.
pub fn java_type_descriptor(java_type: &str) -> String {
    let java_type = java_type.trim();
    match java_type {
        "boolean" => "Z".to_string(),
        "byte" => "B".to_string(),
        "char" => "C".to_string(),
        "double" => "D".to_string(),
        "float" => "F".to_string(),
        "int" => "I".to_string(),
        "long" => "J".to_string(),
        "short" => "S".to_string(),
        "void" => "V".to_string(),
        other => format!("L{};", other.replace('.', "/")),
    }
}

/// Convert a comma-separated parameter list to a descriptor prefix.
///
/// An empty list yields `"()"`.
pub fn params_to_descriptor_prefix(params: &str) -> String {
    if params.trim().is_empty() {
        return "()".to_string();
    }
    let descriptors: String = params.split(',').map(java_type_descriptor).collect();
    format!("({descriptors})")
}
