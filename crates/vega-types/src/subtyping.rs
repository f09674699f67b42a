//! Subtyping and primitive-widening queries (JLS 4.10).
//!
//! Everything here is pure and total: cyclic supertype graphs terminate
//! through visited sets, and missing class metadata degrades to a
//! conservative answer.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::{ClassKind, ClassType, PrimitiveType, Type, TypeEnv, TypeVarId};

/// Resolve a `Named` spelling against the environment. Other types pass
/// through unchanged.
pub(crate) fn canonicalize_named(env: &dyn TypeEnv, ty: &Type) -> Type {
    match ty {
        Type::Named(name) => match env.lookup_class(name) {
            Some(id) => Type::class(id, vec![]),
            None => ty.clone(),
        },
        _ => ty.clone(),
    }
}

/// Apply a type-parameter substitution to `ty`.
pub(crate) fn substitute(ty: &Type, subst: &HashMap<TypeVarId, Type>) -> Type {
    match ty {
        Type::TypeVar(id) => subst.get(id).cloned().unwrap_or_else(|| ty.clone()),
        Type::Class(ClassType { def, args }) => {
            Type::class(*def, args.iter().map(|a| substitute(a, subst)).collect())
        }
        Type::Array(elem) => Type::array(substitute(elem, subst)),
        _ => ty.clone(),
    }
}

/// Strict primitive widening (JLS 5.1.2): `from` converts to a wider `to`.
/// `boolean` is incomparable to every numeric kind; identity is excluded.
pub fn widening_primitive(from: PrimitiveType, to: PrimitiveType) -> bool {
    use PrimitiveType::*;
    match from {
        Byte => matches!(to, Short | Int | Long | Float | Double),
        Short => matches!(to, Int | Long | Float | Double),
        Char => matches!(to, Int | Long | Float | Double),
        Int => matches!(to, Long | Float | Double),
        Long => matches!(to, Float | Double),
        Float => matches!(to, Double),
        Double | Boolean => false,
    }
}

/// Is `a` a subtype of `b` (JLS 4.10)?
///
/// Primitive subtyping follows the widening lattice (JLS 4.10.1);
/// parameterized types are invariant in their arguments; arrays are
/// covariant for reference element types only.
pub fn is_subtype(env: &dyn TypeEnv, a: &Type, b: &Type) -> bool {
    let mut seen_vars = HashSet::new();
    is_subtype_inner(env, a, b, &mut seen_vars)
}

fn is_subtype_inner(
    env: &dyn TypeEnv,
    a: &Type,
    b: &Type,
    seen_vars: &mut HashSet<TypeVarId>,
) -> bool {
    let a = canonicalize_named(env, a);
    let b = canonicalize_named(env, b);
    if a == b {
        return true;
    }
    if a.is_errorish() || b.is_errorish() {
        return true;
    }

    match (&a, &b) {
        (Type::Null, _) => b.is_reference(),
        (Type::Primitive(pa), Type::Primitive(pb)) => widening_primitive(*pa, *pb),
        (Type::Primitive(_), _) | (_, Type::Primitive(_)) => false,
        (Type::Array(ea), Type::Array(eb)) => {
            // Covariance applies to reference element types only; primitive
            // array types relate by identity (handled above).
            if ea.is_primitive() || eb.is_primitive() {
                false
            } else {
                is_subtype_inner(env, ea, eb, seen_vars)
            }
        }
        (Type::Array(_), Type::Class(ct)) => {
            let wk = env.well_known();
            ct.args.is_empty()
                && (ct.def == wk.object || ct.def == wk.cloneable || ct.def == wk.serializable)
        }
        (Type::TypeVar(id), _) => {
            // A type variable is below each of its upper bounds.
            if !seen_vars.insert(*id) {
                return false;
            }
            let result = env
                .type_param(*id)
                .map(|tp| {
                    tp.upper_bounds
                        .iter()
                        .any(|bound| is_subtype_inner(env, bound, &b, seen_vars))
                })
                .unwrap_or(false);
            seen_vars.remove(id);
            result
        }
        (_, Type::TypeVar(_)) => {
            // An uninstantiated type variable on the right stands for its
            // erasure here; instantiating it is the inference layer's job.
            let erased = erasure(env, &b);
            is_subtype_inner(env, &a, &erased, seen_vars)
        }
        (Type::Class(start), Type::Class(target)) => class_subtype(env, start, target),
        _ => false,
    }
}

/// Walk the declared supertype graph from `start`, applying type-argument
/// substitution along each edge, looking for an instantiation of
/// `target.def` compatible with `target`.
fn class_subtype(env: &dyn TypeEnv, start: &ClassType, target: &ClassType) -> bool {
    let mut queue: VecDeque<Type> = VecDeque::new();
    let mut seen: HashSet<(crate::ClassId, Vec<Type>)> = HashSet::new();
    queue.push_back(Type::class(start.def, start.args.clone()));

    while let Some(current) = queue.pop_front() {
        let Type::Class(ClassType { def, args }) = current else {
            continue;
        };
        if !seen.insert((def, args.clone())) {
            continue;
        }

        if def == target.def {
            if instantiation_compatible(&args, &target.args) {
                return true;
            }
            // A different instantiation of the target class; other paths
            // cannot produce a second one, but keep walking defensively.
            continue;
        }

        let Some(class_def) = env.class(def) else {
            continue;
        };

        // Raw uses of a generic class erase the supertype instantiations.
        let raw = args.is_empty() && !class_def.type_params.is_empty();
        if raw {
            if let Some(sc) = &class_def.super_class {
                if let Type::Class(ClassType { def, .. }) = canonicalize_named(env, sc) {
                    queue.push_back(Type::class(def, vec![]));
                }
            }
            for iface in &class_def.interfaces {
                if let Type::Class(ClassType { def, .. }) = canonicalize_named(env, iface) {
                    queue.push_back(Type::class(def, vec![]));
                }
            }
            if class_def.kind == ClassKind::Interface {
                queue.push_back(Type::class(env.well_known().object, vec![]));
            }
            continue;
        }

        let mut subst: HashMap<TypeVarId, Type> =
            HashMap::with_capacity(class_def.type_params.len());
        for (idx, formal) in class_def.type_params.iter().copied().enumerate() {
            subst.insert(formal, args.get(idx).cloned().unwrap_or(Type::Unknown));
        }

        if let Some(sc) = &class_def.super_class {
            queue.push_back(canonicalize_named(env, &substitute(sc, &subst)));
        }
        for iface in &class_def.interfaces {
            queue.push_back(canonicalize_named(env, &substitute(iface, &subst)));
        }
        // Every interface implicitly has `Object` as a supertype (JLS 4.10.2).
        if class_def.kind == ClassKind::Interface {
            queue.push_back(Type::class(env.well_known().object, vec![]));
        }
    }

    false
}

/// Invariant type-argument compatibility, tolerating raw uses and
/// errorish placeholders on either side.
fn instantiation_compatible(args: &[Type], target_args: &[Type]) -> bool {
    if args.is_empty() || target_args.is_empty() {
        return true;
    }
    args.len() == target_args.len()
        && args
            .iter()
            .zip(target_args)
            .all(|(a, b)| a == b || a.is_errorish() || b.is_errorish())
}

/// Erasure of a type (JLS 4.6): type arguments drop, a type variable
/// erases to its leftmost bound (or `Object`).
pub fn erasure(env: &dyn TypeEnv, ty: &Type) -> Type {
    let mut seen_vars = HashSet::new();
    erasure_inner(env, ty, &mut seen_vars)
}

fn erasure_inner(env: &dyn TypeEnv, ty: &Type, seen_vars: &mut HashSet<TypeVarId>) -> Type {
    match ty {
        Type::Class(ClassType { def, .. }) => Type::class(*def, vec![]),
        Type::Array(elem) => Type::array(erasure_inner(env, elem, seen_vars)),
        Type::TypeVar(id) => {
            if !seen_vars.insert(*id) {
                return Type::class(env.well_known().object, vec![]);
            }
            let erased = match env.type_param(*id).and_then(|tp| tp.upper_bounds.first()) {
                Some(bound) => erasure_inner(env, &bound.clone(), seen_vars),
                None => Type::class(env.well_known().object, vec![]),
            };
            seen_vars.remove(id);
            erased
        }
        Type::Named(_) => {
            let canonical = canonicalize_named(env, ty);
            match canonical {
                Type::Class(ClassType { def, .. }) => Type::class(def, vec![]),
                other => other,
            }
        }
        other => other.clone(),
    }
}

/// The primitive behind a box class use, if any.
pub(crate) fn unboxed_primitive(env: &dyn TypeEnv, ty: &Type) -> Option<PrimitiveType> {
    match canonicalize_named(env, ty) {
        Type::Class(ClassType { def, args }) if args.is_empty() => env.well_known().unboxed(def),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TypeStore;

    #[test]
    fn boolean_is_incomparable_to_numerics() {
        use PrimitiveType::*;
        for other in [Byte, Short, Char, Int, Long, Float, Double] {
            assert!(!widening_primitive(Boolean, other));
            assert!(!widening_primitive(other, Boolean));
        }
    }

    #[test]
    fn char_widens_to_int_but_not_short() {
        use PrimitiveType::*;
        assert!(widening_primitive(Char, Int));
        assert!(!widening_primitive(Char, Short));
        assert!(!widening_primitive(Byte, Char));
    }

    #[test]
    fn null_is_below_references_not_primitives() {
        let env = TypeStore::default();
        let string = Type::class(env.well_known().string, vec![]);
        assert!(is_subtype(&env, &Type::Null, &string));
        assert!(is_subtype(&env, &Type::Null, &Type::array(Type::int())));
        assert!(!is_subtype(&env, &Type::Null, &Type::int()));
    }

    #[test]
    fn array_covariance_is_reference_only() {
        let env = TypeStore::default();
        let object = Type::class(env.well_known().object, vec![]);
        let string = Type::class(env.well_known().string, vec![]);

        assert!(is_subtype(
            &env,
            &Type::array(string.clone()),
            &Type::array(object.clone())
        ));
        assert!(!is_subtype(
            &env,
            &Type::array(Type::int()),
            &Type::array(Type::long())
        ));
        assert!(!is_subtype(
            &env,
            &Type::array(Type::int()),
            &Type::array(object)
        ));
    }

    #[test]
    fn erasure_drops_arguments_and_follows_bounds() {
        let mut env = TypeStore::default();
        let number = env.well_known().number;
        let comparable = env.well_known().comparable;

        let t = env.add_type_param("T", vec![Type::class(number, vec![])]);
        assert_eq!(erasure(&env, &Type::TypeVar(t)), Type::class(number, vec![]));

        let parameterized = Type::class(comparable, vec![Type::TypeVar(t)]);
        assert_eq!(
            erasure(&env, &parameterized),
            Type::class(comparable, vec![])
        );
    }
}
