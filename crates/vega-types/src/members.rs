//! Candidate collection: the visible, accessible method and constructor
//! declarations a call site can possibly mean.
//!
//! Collection walks the receiver's supertype graph in declaration order
//! (superclass edge before interface edges, members in source order),
//! applying type-argument substitution along the way. Overridden
//! declarations are shadowed by erased-signature identity, most-derived
//! first. The resulting candidate order is deterministic and feeds the
//! resolver's ambiguity reporting, so it must never depend on hashing or
//! thread scheduling.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::overload::{resolve_from_candidates, MethodCall, MethodResolution, ResolutionProfile};
use crate::subtyping::{canonicalize_named, erasure, is_subtype, substitute};
use crate::{ClassId, ClassKind, ClassType, Type, TypeEnv, TypeVarId, Visibility};

/// Whether a call is qualified by an instance or by a type name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    Instance,
    Static,
}

/// The compilation context a call site appears in, for accessibility
/// judgments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessScope {
    /// Package of the call site; `""` is the unnamed package.
    pub package: String,
    /// Enclosing class, when known. Enables `private` and subclass
    /// `protected` access.
    pub enclosing: Option<ClassId>,
}

impl AccessScope {
    pub fn package(package: &str) -> Self {
        Self {
            package: package.to_string(),
            enclosing: None,
        }
    }

    /// Scope of code written inside `class_id`.
    pub fn in_class(env: &dyn TypeEnv, class_id: ClassId) -> Self {
        Self {
            package: env
                .class(class_id)
                .map(|def| def.package().to_string())
                .unwrap_or_default(),
            enclosing: Some(class_id),
        }
    }
}

/// One declaration a call site could resolve to, with the receiver's
/// type arguments already substituted in. Immutable once collected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub owner: ClassId,
    pub name: String,
    pub params: Vec<Type>,
    pub return_type: Type,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    pub is_varargs: bool,
    pub is_safe_varargs: bool,
}

impl Candidate {
    /// Element type of the trailing array parameter, for variable-arity
    /// candidates.
    pub fn vararg_component(&self) -> Option<&Type> {
        if !self.is_varargs {
            return None;
        }
        match self.params.last() {
            Some(Type::Array(component)) => Some(component),
            _ => None,
        }
    }
}

/// Is a member with `visibility`, declared on `owner`, accessible from
/// `scope` (JLS 6.6.1)?
pub(crate) fn member_accessible(
    env: &dyn TypeEnv,
    owner: ClassId,
    visibility: Visibility,
    scope: &AccessScope,
) -> bool {
    match visibility {
        Visibility::Public => true,
        Visibility::Private => scope.enclosing == Some(owner),
        Visibility::Package => env
            .class(owner)
            .is_some_and(|def| def.package() == scope.package),
        Visibility::Protected => {
            let same_package = env
                .class(owner)
                .is_some_and(|def| def.package() == scope.package);
            same_package
                || scope.enclosing.is_some_and(|from| {
                    is_subtype(env, &Type::class(from, vec![]), &Type::class(owner, vec![]))
                })
        }
    }
}

/// Is the class itself accessible from `scope`?
pub(crate) fn class_accessible(env: &dyn TypeEnv, id: ClassId, scope: &AccessScope) -> bool {
    let Some(def) = env.class(id) else {
        return true;
    };
    match def.visibility {
        Visibility::Public => true,
        Visibility::Protected | Visibility::Package => def.package() == scope.package,
        Visibility::Private => scope.enclosing == Some(id),
    }
}

/// Collect the candidate set for `receiver.name(...)`.
pub fn collect_methods(
    env: &dyn TypeEnv,
    receiver: &Type,
    name: &str,
    call_kind: CallKind,
    scope: &AccessScope,
) -> Vec<Candidate> {
    let receiver = canonicalize_named(env, receiver);
    let start = match &receiver {
        Type::Class(ct) => ct.clone(),
        // Array members come from `Object`; a type-variable receiver is
        // viewed through its erased bound.
        Type::Array(_) => ClassType {
            def: env.well_known().object,
            args: vec![],
        },
        Type::TypeVar(_) => match erasure(env, &receiver) {
            Type::Class(ct) => ct,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let mut out: Vec<Candidate> = Vec::new();
    // Erased signatures already claimed by a more derived declaration.
    let mut shadowed: HashSet<Vec<Type>> = HashSet::new();

    let mut queue: VecDeque<Type> = VecDeque::new();
    let mut seen: HashSet<(ClassId, Vec<Type>)> = HashSet::new();
    queue.push_back(Type::Class(start));

    while let Some(current) = queue.pop_front() {
        let Type::Class(ClassType { def, args }) = current else {
            continue;
        };
        if !seen.insert((def, args.clone())) {
            continue;
        }
        let Some(class_def) = env.class(def) else {
            continue;
        };

        // Missing arguments (raw or malformed uses) substitute as
        // `Unknown` so downstream queries still get a stable shape.
        let mut subst: HashMap<TypeVarId, Type> =
            HashMap::with_capacity(class_def.type_params.len());
        for (idx, formal) in class_def.type_params.iter().copied().enumerate() {
            subst.insert(formal, args.get(idx).cloned().unwrap_or(Type::Unknown));
        }

        for method in &class_def.methods {
            if method.name != name {
                continue;
            }
            if call_kind == CallKind::Static && !method.is_static {
                continue;
            }
            if !member_accessible(env, def, method.visibility, scope) {
                continue;
            }

            let params: Vec<Type> = method
                .params
                .iter()
                .map(|p| substitute(p, &subst))
                .collect();
            let erased: Vec<Type> = params.iter().map(|p| erasure(env, p)).collect();
            if !shadowed.insert(erased) {
                continue;
            }

            out.push(Candidate {
                owner: def,
                name: method.name.clone(),
                params,
                return_type: substitute(&method.return_type, &subst),
                visibility: method.visibility,
                is_static: method.is_static,
                is_final: method.is_final,
                is_varargs: method.is_varargs,
                is_safe_varargs: method.is_safe_varargs,
            });
        }

        if let Some(sc) = &class_def.super_class {
            queue.push_back(canonicalize_named(env, &substitute(sc, &subst)));
        }
        for iface in &class_def.interfaces {
            queue.push_back(canonicalize_named(env, &substitute(iface, &subst)));
        }
        if class_def.kind == ClassKind::Interface {
            queue.push_back(Type::class(env.well_known().object, vec![]));
        }
    }

    trace!(name, count = out.len(), "collected method candidates");
    out
}

/// Collect the constructor candidates of `class`. Constructors are not
/// inherited; when none is declared the implicit no-arg constructor is
/// synthesized (JLS 8.8.9).
pub fn collect_constructors(env: &dyn TypeEnv, class: ClassId, scope: &AccessScope) -> Vec<Candidate> {
    let Some(class_def) = env.class(class) else {
        return Vec::new();
    };

    if class_def.constructors.is_empty() {
        return vec![Candidate {
            owner: class,
            name: "<init>".to_string(),
            params: vec![],
            return_type: Type::class(class, vec![]),
            visibility: class_def.visibility,
            is_static: false,
            is_final: false,
            is_varargs: false,
            is_safe_varargs: false,
        }];
    }

    class_def
        .constructors
        .iter()
        .filter(|ctor| member_accessible(env, class, ctor.visibility, scope))
        .map(|ctor| Candidate {
            owner: class,
            name: "<init>".to_string(),
            params: ctor.params.clone(),
            return_type: Type::class(class, vec![]),
            visibility: ctor.visibility,
            is_static: false,
            is_final: false,
            is_varargs: ctor.is_varargs,
            is_safe_varargs: ctor.is_safe_varargs,
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct MemberKey {
    receiver: Type,
    name: String,
    call_kind: CallKind,
    scope: AccessScope,
}

/// A shared, memoized view of per-receiver candidate lists.
///
/// A compilation pipeline resolving many call sites against the same
/// types can share one table across threads: entries are computed once
/// (single writer per key), published behind an `Arc`, and immutable
/// afterwards. Cached lists preserve declaration order, so memoized
/// resolution is indistinguishable from the uncached path.
#[derive(Debug, Default)]
pub struct MemberTable {
    cache: RwLock<HashMap<MemberKey, Arc<Vec<Candidate>>>>,
}

impl MemberTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The candidate list for `receiver.name(...)` as seen from `scope`.
    pub fn methods_of(
        &self,
        env: &dyn TypeEnv,
        receiver: &Type,
        name: &str,
        call_kind: CallKind,
        scope: &AccessScope,
    ) -> Arc<Vec<Candidate>> {
        let key = MemberKey {
            receiver: receiver.clone(),
            name: name.to_string(),
            call_kind,
            scope: scope.clone(),
        };
        if let Ok(cache) = self.cache.read() {
            if let Some(hit) = cache.get(&key) {
                return Arc::clone(hit);
            }
        }
        let computed = Arc::new(collect_methods(env, receiver, name, call_kind, scope));
        match self.cache.write() {
            Ok(mut cache) => Arc::clone(cache.entry(key).or_insert(computed)),
            Err(_) => computed,
        }
    }

    /// Memoized equivalent of [`crate::resolve_method_call`].
    pub fn resolve(&self, env: &dyn TypeEnv, call: &MethodCall<'_>) -> MethodResolution {
        self.resolve_with(env, call, &ResolutionProfile::default())
    }

    /// Memoized equivalent of [`crate::resolve_method_call_with`].
    pub fn resolve_with(
        &self,
        env: &dyn TypeEnv,
        call: &MethodCall<'_>,
        profile: &ResolutionProfile,
    ) -> MethodResolution {
        let candidates =
            self.methods_of(env, &call.receiver, call.name, call.call_kind, &call.scope);
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
}
