//! Method invocation conversions (JLS 5.3) and their classification.

use serde::{Deserialize, Serialize};

use crate::subtyping::{canonicalize_named, is_subtype, unboxed_primitive, widening_primitive};
use crate::{Type, TypeEnv};

/// How one actual argument reached its formal parameter type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversionKind {
    Identity,
    WideningPrimitive,
    WideningReference,
    Boxing,
    Unboxing,
    /// Converted to the vararg component type as one expanded element.
    VarargElement,
    /// An array passed directly in the vararg position.
    VarargArrayPassthrough,
}

/// Strict-phase conversion (JLS 15.12.2.2): identity and widening only,
/// no boxing or unboxing.
pub fn strict_conversion(env: &dyn TypeEnv, from: &Type, to: &Type) -> Option<ConversionKind> {
    let from = canonicalize_named(env, from);
    let to = canonicalize_named(env, to);
    if from == to || from.is_errorish() || to.is_errorish() {
        return Some(ConversionKind::Identity);
    }
    match (&from, &to) {
        (Type::Primitive(a), Type::Primitive(b)) => {
            widening_primitive(*a, *b).then_some(ConversionKind::WideningPrimitive)
        }
        (Type::Primitive(_), _) | (_, Type::Primitive(_)) => None,
        _ => is_subtype(env, &from, &to).then_some(ConversionKind::WideningReference),
    }
}

/// Loose-phase conversion (JLS 15.12.2.3): strict conversions, plus
/// boxing/unboxing composed with at most one widening step on the far
/// side of the box (`int -> Integer -> Number`, `Integer -> int -> long`).
/// Widening *before* boxing is not a thing: `int` never boxes to `Long`.
pub fn loose_conversion(env: &dyn TypeEnv, from: &Type, to: &Type) -> Option<ConversionKind> {
    if let Some(kind) = strict_conversion(env, from, to) {
        return Some(kind);
    }
    let from = canonicalize_named(env, from);
    let to = canonicalize_named(env, to);
    match (&from, &to) {
        (Type::Primitive(p), _) if !to.is_primitive() => {
            let boxed = Type::class(env.well_known().box_of(*p), vec![]);
            is_subtype(env, &boxed, &to).then_some(ConversionKind::Boxing)
        }
        (_, Type::Primitive(target)) => {
            let unboxed = unboxed_primitive(env, &from)?;
            (unboxed == *target || widening_primitive(unboxed, *target))
                .then_some(ConversionKind::Unboxing)
        }
        _ => None,
    }
}

/// Assignment compatibility: anything a loose invocation conversion
/// accepts.
pub fn is_assignable(env: &dyn TypeEnv, from: &Type, to: &Type) -> bool {
    loose_conversion(env, from, to).is_some()
}
