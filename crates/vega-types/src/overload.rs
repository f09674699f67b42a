//! Overload resolution (JLS 15.12.2): three-phase applicability search,
//! the most-specific partial order, and the structured results the
//! diagnostics layer consumes.
//!
//! Resolution is a pure function of the environment and the call: no
//! global state is read or written, so independent call sites may resolve
//! concurrently. It never panics on well-formed inputs; a variable-arity
//! candidate whose last parameter is not an array type is a collaborator
//! bug and is skipped (with a `debug_assert!` in debug builds).

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::convert::{loose_conversion, strict_conversion, ConversionKind};
use crate::members::{collect_constructors, collect_methods, AccessScope, CallKind, Candidate};
use crate::subtyping::is_subtype;
use crate::varargs::{component_accessible, is_reifiable};
use crate::{ClassId, Type, TypeEnv};

/// The phases of the applicability search, attempted strictly in order
/// (JLS 15.12.2.2 through 15.12.2.4). The first phase that yields a
/// non-empty applicable set terminates the search; ambiguity at that
/// phase is reported there and never masked by a later phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InvocationPhase {
    Strict,
    Loose,
    VariableArity,
}

/// A method call site: receiver, member name, argument types, and the
/// access context the call appears in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodCall<'a> {
    pub receiver: Type,
    pub call_kind: CallKind,
    pub name: &'a str,
    pub args: Vec<Type>,
    pub scope: AccessScope,
}

/// Tie-break rules active during specificity ranking. Resolution behavior
/// differs slightly across language levels, so the active rules are an
/// explicit input rather than a compile-time choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionProfile {
    /// Between two otherwise-tied variable-arity candidates, prefer the
    /// one with more fixed parameters before its vararg.
    pub prefer_longer_fixed_prefix: bool,
}

impl Default for ResolutionProfile {
    fn default() -> Self {
        Self {
            prefer_longer_fixed_prefix: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UncheckedReason {
    /// Possible heap pollution from a non-reifiable vararg component.
    UncheckedVarargs,
}

/// Advisory diagnostics attached to a successful resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeWarning {
    Unchecked(UncheckedReason),
    /// A `null` final argument fits both the vararg array and a single
    /// element; the array form was chosen.
    InexactVarargsCall,
}

/// A successfully resolved invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMethod {
    pub owner: ClassId,
    pub name: String,
    /// Declared (substituted) formal parameter types.
    pub params: Vec<Type>,
    pub return_type: Type,
    pub is_static: bool,
    pub phase: InvocationPhase,
    /// Conversion used for each actual argument, in order.
    pub conversions: Vec<ConversionKind>,
    /// Whether the call used the expanded (element-wise) vararg form.
    pub used_varargs: bool,
    pub warnings: Vec<TypeWarning>,
}

/// Two or more maximal candidates at the terminating phase, in
/// first-collected order. `candidates[0]` is the deterministic
/// representative for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousCall {
    pub phase: InvocationPhase,
    pub candidates: Vec<ResolvedMethod>,
}

/// No candidate survived any phase. `candidates` lists the declarations
/// that matched by name, closest arity first, for diagnostic quality.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedCall {
    pub receiver: Type,
    pub name: String,
    pub args: Vec<Type>,
    pub candidates: Vec<Candidate>,
}

/// A unique winner exists, but its vararg component type is not
/// accessible from the call site, so the expanded call cannot be
/// compiled there.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InaccessibleVarargsCall {
    pub method: ResolvedMethod,
    pub component: Type,
}

/// The outcome of resolving one call site.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodResolution {
    Found(ResolvedMethod),
    Ambiguous(AmbiguousCall),
    NotFound(UnresolvedCall),
    InaccessibleVarargs(InaccessibleVarargsCall),
}

/// Resolve a method call with the default [`ResolutionProfile`].
pub fn resolve_method_call(env: &dyn TypeEnv, call: &MethodCall<'_>) -> MethodResolution {
    resolve_method_call_with(env, call, &ResolutionProfile::default())
}

/// Resolve a method call under an explicit profile.
pub fn resolve_method_call_with(
    env: &dyn TypeEnv,
    call: &MethodCall<'_>,
    profile: &ResolutionProfile,
) -> MethodResolution {
    let candidates = collect_methods(env, &call.receiver, call.name, call.call_kind, &call.scope);
    resolve_from_candidates(
        env,
        &call.receiver,
        call.name,
        &call.args,
        &call.scope,
        &candidates,
        profile,
    )
}

/// Resolve a constructor invocation `new class(args)`.
pub fn resolve_constructor_call(
    env: &dyn TypeEnv,
    class: ClassId,
    args: &[Type],
    scope: Option<&AccessScope>,
) -> MethodResolution {
    let default_scope = AccessScope::default();
    let scope = scope.unwrap_or(&default_scope);
    let candidates = collect_constructors(env, class, scope);
    resolve_from_candidates(
        env,
        &Type::class(class, vec![]),
        "<init>",
        args,
        scope,
        &candidates,
        &ResolutionProfile::default(),
    )
}

/// One candidate that survived applicability in some phase.
#[derive(Clone, Debug)]
struct Applicable {
    candidate: Candidate,
    conversions: Vec<ConversionKind>,
    /// True when the expanded (element-wise) vararg form was used.
    expansion: bool,
}

pub(crate) fn resolve_from_candidates(
    env: &dyn TypeEnv,
    receiver: &Type,
    name: &str,
    args: &[Type],
    scope: &AccessScope,
    candidates: &[Candidate],
    profile: &ResolutionProfile,
) -> MethodResolution {
    for phase in [
        InvocationPhase::Strict,
        InvocationPhase::Loose,
        InvocationPhase::VariableArity,
    ] {
        let applicable: Vec<Applicable> = candidates
            .iter()
            .filter_map(|candidate| applicable_in_phase(env, candidate, args, phase))
            .collect();
        if applicable.is_empty() {
            continue;
        }
        trace!(name, ?phase, count = applicable.len(), "applicable set found");
        return select_most_specific(env, args, scope, phase, applicable, profile);
    }

    let mut near: Vec<Candidate> = candidates.to_vec();
    near.sort_by_key(|c| c.params.len().abs_diff(args.len()));
    MethodResolution::NotFound(UnresolvedCall {
        receiver: receiver.clone(),
        name: name.to_string(),
        args: args.to_vec(),
        candidates: near,
    })
}

fn applicable_in_phase(
    env: &dyn TypeEnv,
    candidate: &Candidate,
    args: &[Type],
    phase: InvocationPhase,
) -> Option<Applicable> {
    match phase {
        // In the fixed-arity phases a variable-arity declaration's last
        // parameter is taken literally as its array type.
        InvocationPhase::Strict | InvocationPhase::Loose => {
            if args.len() != candidate.params.len() {
                return None;
            }
            let convert = if phase == InvocationPhase::Strict {
                strict_conversion
            } else {
                loose_conversion
            };
            let mut conversions = Vec::with_capacity(args.len());
            for (arg, param) in args.iter().zip(&candidate.params) {
                conversions.push(convert(env, arg, param)?);
            }
            Some(Applicable {
                candidate: candidate.clone(),
                conversions,
                expansion: false,
            })
        }
        InvocationPhase::VariableArity => {
            if !candidate.is_varargs {
                return None;
            }
            let (last, prefix) = candidate.params.split_last()?;
            let Type::Array(component) = last else {
                debug_assert!(
                    false,
                    "variable-arity candidate `{}` must end with an array parameter",
                    candidate.name
                );
                warn!(
                    name = candidate.name.as_str(),
                    "skipping malformed variable-arity candidate"
                );
                return None;
            };

            // Passing an array directly must be tried before assuming
            // expansion: for `N == |P|` a final argument that is
            // array-convertible to `C[]` is forwarded as-is.
            if args.len() == candidate.params.len() {
                let prefix_conversions: Option<Vec<ConversionKind>> = prefix
                    .iter()
                    .zip(args)
                    .map(|(param, arg)| loose_conversion(env, arg, param))
                    .collect();
                if let Some(mut conversions) = prefix_conversions {
                    if let Some(last_arg) = args.last() {
                        if strict_conversion(env, last_arg, last).is_some() {
                            conversions.push(ConversionKind::VarargArrayPassthrough);
                            return Some(Applicable {
                                candidate: candidate.clone(),
                                conversions,
                                expansion: false,
                            });
                        }
                    }
                }
            }

            // Expanded form: `N >= k` with every trailing argument
            // converting to the component type individually. `N == k`
            // (zero elements) is applicable.
            if args.len() < prefix.len() {
                return None;
            }
            let mut conversions = Vec::with_capacity(args.len());
            for (arg, param) in args[..prefix.len()].iter().zip(prefix) {
                conversions.push(loose_conversion(env, arg, param)?);
            }
            for arg in &args[prefix.len()..] {
                loose_conversion(env, arg, component)?;
                conversions.push(ConversionKind::VarargElement);
            }
            Some(Applicable {
                candidate: candidate.clone(),
                conversions,
                expansion: true,
            })
        }
    }
}

fn select_most_specific(
    env: &dyn TypeEnv,
    args: &[Type],
    scope: &AccessScope,
    phase: InvocationPhase,
    applicable: Vec<Applicable>,
    profile: &ResolutionProfile,
) -> MethodResolution {
    let maximal: Vec<&Applicable> = applicable
        .iter()
        .enumerate()
        .filter(|(i, a)| {
            !applicable.iter().enumerate().any(|(j, b)| {
                j != *i
                    && more_specific(env, b, a, args.len(), profile)
                    && !more_specific(env, a, b, args.len(), profile)
            })
        })
        .map(|(_, a)| a)
        .collect();

    // A domination cycle would empty the maximal set; report the whole
    // applicable set deterministically rather than inventing a winner.
    if maximal.len() != 1 {
        let listed = if maximal.is_empty() {
            applicable.iter().collect::<Vec<_>>()
        } else {
            maximal
        };
        return MethodResolution::Ambiguous(AmbiguousCall {
            phase,
            candidates: listed
                .into_iter()
                .map(|a| resolved_method(a, phase, Vec::new()))
                .collect(),
        });
    }

    let winner = maximal[0];
    let mut warnings = Vec::new();

    if winner.expansion {
        if let Some(component) = winner.candidate.vararg_component() {
            if !component_accessible(env, component, scope) {
                return MethodResolution::InaccessibleVarargs(InaccessibleVarargsCall {
                    component: component.clone(),
                    method: resolved_method(winner, phase, warnings),
                });
            }
            if !is_reifiable(env, component) && !winner.candidate.is_safe_varargs {
                warnings.push(TypeWarning::Unchecked(UncheckedReason::UncheckedVarargs));
            }
        }
    }

    // A `null` final argument is formally ambiguous between the array and
    // the single-element form; the array form wins, with a hint.
    if winner.candidate.is_varargs
        && args.len() == winner.candidate.params.len()
        && matches!(args.last(), Some(Type::Null))
        && winner.conversions.last() != Some(&ConversionKind::VarargElement)
    {
        warnings.push(TypeWarning::InexactVarargsCall);
    }

    MethodResolution::Found(resolved_method(winner, phase, warnings))
}

fn resolved_method(
    applicable: &Applicable,
    phase: InvocationPhase,
    warnings: Vec<TypeWarning>,
) -> ResolvedMethod {
    ResolvedMethod {
        owner: applicable.candidate.owner,
        name: applicable.candidate.name.clone(),
        params: applicable.candidate.params.clone(),
        return_type: applicable.candidate.return_type.clone(),
        is_static: applicable.candidate.is_static,
        phase,
        conversions: applicable.conversions.clone(),
        used_varargs: applicable.expansion,
        warnings,
    }
}

/// The formal type a variable-arity method presents at argument position
/// `i`: its declared parameter inside the fixed prefix, the vararg
/// component beyond it.
fn vararg_type_at(params: &[Type], i: usize) -> Type {
    if i + 1 < params.len() {
        params[i].clone()
    } else {
        match params.last() {
            Some(Type::Array(component)) => (**component).clone(),
            Some(other) => other.clone(),
            None => Type::Error,
        }
    }
}

/// The `more specific` partial order over two applicable candidates
/// (JLS 15.12.2.5). `n` is the call's argument count.
fn more_specific(
    env: &dyn TypeEnv,
    a: &Applicable,
    b: &Applicable,
    n: usize,
    profile: &ResolutionProfile,
) -> bool {
    // A candidate applicable without vararg expansion always beats one
    // that needed it, independent of parameter shapes.
    if a.expansion != b.expansion {
        return !a.expansion;
    }
    if !a.expansion {
        return more_specific_fixed(env, &a.candidate, &b.candidate)
            || (mutually_convertible(env, &a.candidate.params, &b.candidate.params)
                && owner_more_derived(env, a.candidate.owner, b.candidate.owner));
    }
    more_specific_varargs(env, &a.candidate, &b.candidate, n, profile)
}

/// Pairwise strict convertibility of `a`'s parameters into `b`'s.
fn dominates(env: &dyn TypeEnv, a: &[Type], b: &[Type]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| strict_conversion(env, x, y).is_some())
}

fn mutually_convertible(env: &dyn TypeEnv, a: &[Type], b: &[Type]) -> bool {
    dominates(env, a, b) && dominates(env, b, a)
}

fn more_specific_fixed(env: &dyn TypeEnv, a: &Candidate, b: &Candidate) -> bool {
    dominates(env, &a.params, &b.params) && !dominates(env, &b.params, &a.params)
}

fn owner_more_derived(env: &dyn TypeEnv, a: ClassId, b: ClassId) -> bool {
    a != b
        && is_subtype(
            env,
            &Type::class(a, vec![]),
            &Type::class(b, vec![]),
        )
}

fn more_specific_varargs(
    env: &dyn TypeEnv,
    a: &Candidate,
    b: &Candidate,
    n: usize,
    profile: &ResolutionProfile,
) -> bool {
    let a_dominates = (0..n).all(|i| {
        strict_conversion(env, &vararg_type_at(&a.params, i), &vararg_type_at(&b.params, i))
            .is_some()
    });
    let b_dominates = (0..n).all(|i| {
        strict_conversion(env, &vararg_type_at(&b.params, i), &vararg_type_at(&a.params, i))
            .is_some()
    });

    if a_dominates && !b_dominates {
        return true;
    }
    if !a_dominates {
        // Positionwise-incomparable pairs stay incomparable: a genuinely
        // novel tie must surface as an ambiguity, not a guess.
        return false;
    }

    // Mutually tied over the call's positions; apply the ordered
    // tie-breaks.
    let a_prefix = a.params.len().saturating_sub(1);
    let b_prefix = b.params.len().saturating_sub(1);
    if a_prefix != b_prefix {
        // The longer fixed prefix matches the leading arguments exactly
        // where the shorter candidate must expand; it is the more
        // specific match.
        return profile.prefer_longer_fixed_prefix && a_prefix > b_prefix;
    }

    let (Some(ca), Some(cb)) = (a.vararg_component(), b.vararg_component()) else {
        return false;
    };
    let ca_dominates = strict_conversion(env, ca, cb).is_some();
    let cb_dominates = strict_conversion(env, cb, ca).is_some();
    if ca_dominates && !cb_dominates {
        return true;
    }
    if ca_dominates && cb_dominates {
        return owner_more_derived(env, a.owner, b.owner);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Visibility;

    fn candidate(params: Vec<Type>, is_varargs: bool) -> Candidate {
        Candidate {
            owner: ClassId(0),
            name: "m".to_string(),
            params,
            return_type: Type::Void,
            visibility: Visibility::Public,
            is_static: false,
            is_final: false,
            is_varargs,
            is_safe_varargs: false,
        }
    }

    fn applicable(params: Vec<Type>, is_varargs: bool, expansion: bool) -> Applicable {
        Applicable {
            candidate: candidate(params, is_varargs),
            conversions: vec![],
            expansion,
        }
    }

    #[test]
    fn fixed_arity_beats_variable_arity_when_merged() {
        // Phase ordering normally keeps these apart; the ranker must
        // still prefer the fixed-arity form if they ever meet.
        let env = crate::TypeStore::default();
        let profile = ResolutionProfile::default();

        let fixed = applicable(vec![Type::int(), Type::int()], false, false);
        let varargs = applicable(vec![Type::array(Type::int())], true, true);

        assert!(more_specific(&env, &fixed, &varargs, 2, &profile));
        assert!(!more_specific(&env, &varargs, &fixed, 2, &profile));
    }

    #[test]
    fn longer_fixed_prefix_requires_profile_opt_in() {
        let env = crate::TypeStore::default();
        let object = Type::class(env.well_known().object, vec![]);

        let long_prefix = applicable(
            vec![object.clone(), Type::array(object.clone())],
            true,
            true,
        );
        let short_prefix = applicable(vec![Type::array(object)], true, true);

        let modern = ResolutionProfile::default();
        assert!(more_specific(&env, &long_prefix, &short_prefix, 1, &modern));
        assert!(!more_specific(&env, &short_prefix, &long_prefix, 1, &modern));

        let legacy = ResolutionProfile {
            prefer_longer_fixed_prefix: false,
        };
        assert!(!more_specific(&env, &long_prefix, &short_prefix, 1, &legacy));
        assert!(!more_specific(&env, &short_prefix, &long_prefix, 1, &legacy));
    }

    #[test]
    fn component_comparison_applies_with_zero_elements() {
        // `f(int...)` vs `f(double...)` for `f()`: the narrower component
        // wins even though no argument exercises it.
        let env = crate::TypeStore::default();
        let profile = ResolutionProfile::default();

        let ints = applicable(vec![Type::array(Type::int())], true, true);
        let doubles = applicable(vec![Type::array(Type::double())], true, true);

        assert!(more_specific(&env, &ints, &doubles, 0, &profile));
        assert!(!more_specific(&env, &doubles, &ints, 0, &profile));
    }

    #[test]
    fn positionwise_incomparable_candidates_stay_incomparable() {
        // `b(boolean, Object...)` vs `b(Boolean...)` with one `boolean`
        // argument: neither converts to the other without boxing.
        let env = crate::TypeStore::default();
        let profile = ResolutionProfile::default();
        let object = Type::class(env.well_known().object, vec![]);
        let boolean_box = Type::class(env.well_known().boolean_box, vec![]);

        let a = applicable(vec![Type::boolean(), Type::array(object)], true, true);
        let b = applicable(vec![Type::array(boolean_box)], true, true);

        assert!(!more_specific(&env, &a, &b, 1, &profile));
        assert!(!more_specific(&env, &b, &a, 1, &profile));
    }
}
