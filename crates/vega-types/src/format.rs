//! Java-like renderings of types and signatures.
//!
//! The formatters here are stable and intentionally source-like, intended
//! for diagnostics and tests. Resolution results themselves never embed
//! strings; a reporting layer applies these on demand.

use crate::members::Candidate;
use crate::subtyping::canonicalize_named;
use crate::{ClassType, Type, TypeEnv};

/// Render `ty` in Java-like syntax, e.g. `Comparable<String>[]`.
/// Class names are shortened to their simple names.
pub fn format_type(env: &dyn TypeEnv, ty: &Type) -> String {
    match canonicalize_named(env, ty) {
        Type::Primitive(p) => p.name().to_string(),
        Type::Class(ClassType { def, args }) => {
            let name = env
                .class(def)
                .map(|c| simple_name(&c.name).to_string())
                .unwrap_or_else(|| format!("<class#{}>", def.0));
            if args.is_empty() {
                name
            } else {
                let args: Vec<String> = args.iter().map(|a| format_type(env, a)).collect();
                format!("{}<{}>", name, args.join(", "))
            }
        }
        Type::Array(elem) => format!("{}[]", format_type(env, &elem)),
        Type::TypeVar(id) => env
            .type_param(id)
            .map(|tp| tp.name.clone())
            .unwrap_or_else(|| format!("<tv#{}>", id.0)),
        Type::Named(name) => name,
        Type::Null => "null".to_string(),
        Type::Void => "void".to_string(),
        Type::Unknown => "?".to_string(),
        Type::Error => "<error>".to_string(),
    }
}

/// Render a candidate as a Java-like signature, with the trailing array
/// of a variable-arity declaration shown as `C...`.
pub fn format_signature(env: &dyn TypeEnv, candidate: &Candidate) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(candidate.params.len());
    for (idx, param) in candidate.params.iter().enumerate() {
        let is_last = idx + 1 == candidate.params.len();
        if is_last && candidate.is_varargs {
            if let Type::Array(component) = param {
                parts.push(format!("{}...", format_type(env, component)));
                continue;
            }
        }
        parts.push(format_type(env, param));
    }
    format!("{}({})", candidate.name, parts.join(", "))
}

fn simple_name(binary_name: &str) -> &str {
    binary_name
        .rsplit_once('.')
        .map_or(binary_name, |(_, simple)| simple)
}
