//! Declaration-site legality checks for variable-arity methods:
//! `@SafeVarargs` placement (JLS 9.6.4.7) and heap-pollution advisories.
//!
//! These run against declarations, independently of any call site; the
//! call-site half (component accessibility, unchecked warnings on the
//! expanded form) lives in the resolver.

use serde::{Deserialize, Serialize};

use crate::members::{class_accessible, AccessScope};
use crate::subtyping::canonicalize_named;
use crate::{ClassId, ClassType, MethodDef, Severity, Type, TypeEnv};

/// Structured declaration-site diagnostics. Formatting into user-facing
/// messages belongs to the reporting layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclarationDiagnostic {
    /// `@SafeVarargs` on a declaration that is not variable-arity.
    SafeVarargsOnFixedArity { owner: ClassId, method: String },
    /// `@SafeVarargs` on an instance method that is neither `static` nor
    /// `final` (and not a constructor), so the safety claim does not
    /// survive overriding.
    SafeVarargsOnOverridable { owner: ClassId, method: String },
    /// A variable-arity parameter whose component type is non-reifiable,
    /// without a legal `@SafeVarargs`.
    PossibleHeapPollution {
        owner: ClassId,
        method: String,
        component: Type,
    },
}

impl DeclarationDiagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            DeclarationDiagnostic::SafeVarargsOnFixedArity { .. }
            | DeclarationDiagnostic::SafeVarargsOnOverridable { .. } => Severity::Error,
            DeclarationDiagnostic::PossibleHeapPollution { .. } => Severity::Warning,
        }
    }
}

/// A type is reifiable when it is fully available at run time (JLS 4.7):
/// primitives, raw or non-generic classes, and arrays of reifiable types.
/// Type variables and parameterized types are not.
pub fn is_reifiable(env: &dyn TypeEnv, ty: &Type) -> bool {
    match canonicalize_named(env, ty) {
        Type::TypeVar(_) => false,
        Type::Class(ClassType { args, .. }) => args.is_empty(),
        Type::Array(elem) => is_reifiable(env, &elem),
        _ => true,
    }
}

/// Whether the vararg component type can be named at a call site in
/// `scope`; the expanded form synthesizes a `new C[]` there.
pub(crate) fn component_accessible(
    env: &dyn TypeEnv,
    component: &Type,
    scope: &AccessScope,
) -> bool {
    match canonicalize_named(env, component) {
        Type::Class(ClassType { def, args }) => {
            class_accessible(env, def, scope)
                && args.iter().all(|arg| component_accessible(env, arg, scope))
        }
        Type::Array(elem) => component_accessible(env, &elem, scope),
        _ => true,
    }
}

/// Check every declaration of `class` for variable-arity legality.
pub fn check_varargs_declarations(env: &dyn TypeEnv, class: ClassId) -> Vec<DeclarationDiagnostic> {
    let Some(class_def) = env.class(class) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for ctor in &class_def.constructors {
        check_declaration(env, class, ctor, true, &mut out);
    }
    for method in &class_def.methods {
        check_declaration(env, class, method, false, &mut out);
    }
    out
}

fn check_declaration(
    env: &dyn TypeEnv,
    owner: ClassId,
    method: &MethodDef,
    is_constructor: bool,
    out: &mut Vec<DeclarationDiagnostic>,
) {
    let safe_varargs_legal =
        method.is_varargs && (is_constructor || method.is_static || method.is_final);

    if method.is_safe_varargs {
        if !method.is_varargs {
            out.push(DeclarationDiagnostic::SafeVarargsOnFixedArity {
                owner,
                method: method.name.clone(),
            });
        } else if !safe_varargs_legal {
            out.push(DeclarationDiagnostic::SafeVarargsOnOverridable {
                owner,
                method: method.name.clone(),
            });
        }
    }

    if method.is_varargs {
        let Some(Type::Array(component)) = method.params.last() else {
            debug_assert!(
                false,
                "variable-arity declaration `{}` must end with an array parameter",
                method.name
            );
            return;
        };
        let suppressed = method.is_safe_varargs && safe_varargs_legal;
        if !is_reifiable(env, component) && !suppressed {
            out.push(DeclarationDiagnostic::PossibleHeapPollution {
                owner,
                method: method.name.clone(),
                component: (**component).clone(),
            });
        }
    }
}
