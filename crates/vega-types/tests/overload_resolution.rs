use vega_types::{
    resolve_method_call, AccessScope, CallKind, ClassDef, ClassKind, ConversionKind,
    InvocationPhase, MethodCall, MethodDef, MethodResolution, Type, TypeEnv, TypeStore,
    Visibility,
};

use pretty_assertions::assert_eq;

fn method(name: &str, params: Vec<Type>) -> MethodDef {
    MethodDef {
        name: name.to_string(),
        visibility: Visibility::Public,
        type_params: vec![],
        params,
        return_type: Type::Void,
        is_static: false,
        is_final: false,
        is_abstract: false,
        is_varargs: false,
        is_safe_varargs: false,
    }
}

fn class(name: &str, super_class: Option<Type>, methods: Vec<MethodDef>) -> ClassDef {
    ClassDef {
        name: name.to_string(),
        kind: ClassKind::Class,
        visibility: Visibility::Public,
        type_params: vec![],
        super_class,
        interfaces: vec![],
        constructors: vec![],
        methods,
    }
}

fn call<'a>(receiver: Type, name: &'a str, args: Vec<Type>) -> MethodCall<'a> {
    MethodCall {
        receiver,
        call_kind: CallKind::Instance,
        name,
        args,
        scope: AccessScope::default(),
    }
}

#[test]
fn widening_in_strict_phase_shadows_boxing_overload() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = env.well_known().object;
    let integer = Type::class(env.well_known().integer, vec![]);

    // `m(long)` is strict-applicable for an `int` argument, so the
    // boxing overload `m(Integer)` must never be considered.
    let test = env.add_class(class(
        "com.example.Widening",
        Some(Type::class(object, vec![])),
        vec![method("m", vec![Type::long()]), method("m", vec![integer])],
    ));

    let MethodResolution::Found(found) =
        resolve_method_call(&env, &call(Type::class(test, vec![]), "m", vec![Type::int()]))
    else {
        panic!("expected method resolution success");
    };

    assert_eq!(found.params, vec![Type::long()]);
    assert_eq!(found.phase, InvocationPhase::Strict);
    assert_eq!(found.conversions, vec![ConversionKind::WideningPrimitive]);
    assert!(!found.used_varargs);
}

#[test]
fn exact_match_is_most_specific() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = env.well_known().object;

    let test = env.add_class(class(
        "com.example.Exact",
        Some(Type::class(object, vec![])),
        vec![
            method("m", vec![Type::long()]),
            method("m", vec![Type::int()]),
        ],
    ));

    let MethodResolution::Found(found) =
        resolve_method_call(&env, &call(Type::class(test, vec![]), "m", vec![Type::int()]))
    else {
        panic!("expected method resolution success");
    };

    assert_eq!(found.params, vec![Type::int()]);
    assert_eq!(found.conversions, vec![ConversionKind::Identity]);
}

#[test]
fn boxing_is_reached_in_loose_phase() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = env.well_known().object;
    let integer = Type::class(env.well_known().integer, vec![]);

    let test = env.add_class(class(
        "com.example.Boxing",
        Some(Type::class(object, vec![])),
        vec![method("m", vec![integer.clone()])],
    ));

    let MethodResolution::Found(found) =
        resolve_method_call(&env, &call(Type::class(test, vec![]), "m", vec![Type::int()]))
    else {
        panic!("expected method resolution success");
    };

    assert_eq!(found.phase, InvocationPhase::Loose);
    assert_eq!(found.conversions, vec![ConversionKind::Boxing]);
}

#[test]
fn unboxing_is_reached_in_loose_phase() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = env.well_known().object;
    let integer = Type::class(env.well_known().integer, vec![]);

    let test = env.add_class(class(
        "com.example.Unboxing",
        Some(Type::class(object, vec![])),
        vec![method("m", vec![Type::long()])],
    ));

    let MethodResolution::Found(found) =
        resolve_method_call(&env, &call(Type::class(test, vec![]), "m", vec![integer]))
    else {
        panic!("expected method resolution success");
    };

    assert_eq!(found.phase, InvocationPhase::Loose);
    assert_eq!(found.conversions, vec![ConversionKind::Unboxing]);
}

#[test]
fn subclass_override_takes_precedence() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = env.well_known().object;
    let string = Type::class(env.well_known().string, vec![]);

    let base = env.add_class(class(
        "com.example.Base",
        Some(Type::class(object, vec![])),
        vec![method("m", vec![string.clone()])],
    ));
    let derived = env.add_class(class(
        "com.example.Derived",
        Some(Type::class(base, vec![])),
        vec![method("m", vec![string.clone()])],
    ));

    let MethodResolution::Found(found) = resolve_method_call(
        &env,
        &call(Type::class(derived, vec![]), "m", vec![string]),
    ) else {
        panic!("expected method resolution success");
    };

    assert_eq!(found.owner, derived);
}

#[test]
fn ambiguity_is_symmetric_in_declaration_order() {
    let mut env = TypeStore::with_minimal_jdk();
    let object_id = env.well_known().object;
    let object = Type::class(object_id, vec![]);
    let string = Type::class(env.well_known().string, vec![]);

    let ab = env.add_class(class(
        "com.example.AB",
        Some(object.clone()),
        vec![
            method("m", vec![string.clone(), object.clone()]),
            method("m", vec![object.clone(), string.clone()]),
        ],
    ));
    let ba = env.add_class(class(
        "com.example.BA",
        Some(object.clone()),
        vec![
            method("m", vec![object.clone(), string.clone()]),
            method("m", vec![string.clone(), object.clone()]),
        ],
    ));

    let args = vec![string.clone(), string.clone()];

    let MethodResolution::Ambiguous(amb_ab) =
        resolve_method_call(&env, &call(Type::class(ab, vec![]), "m", args.clone()))
    else {
        panic!("expected ambiguity");
    };
    let MethodResolution::Ambiguous(amb_ba) =
        resolve_method_call(&env, &call(Type::class(ba, vec![]), "m", args))
    else {
        panic!("expected ambiguity");
    };

    assert_eq!(amb_ab.candidates.len(), 2);
    assert_eq!(amb_ba.candidates.len(), 2);

    // The representative is deterministic: first in declaration order.
    assert_eq!(
        amb_ab.candidates[0].params,
        vec![string.clone(), object.clone()]
    );
    assert_eq!(amb_ba.candidates[0].params, vec![object, string]);
}

#[test]
fn not_found_lists_candidates_closest_arity_first() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = env.well_known().object;

    let test = env.add_class(class(
        "com.example.Arity",
        Some(Type::class(object, vec![])),
        vec![
            method("m", vec![Type::int(), Type::int(), Type::int(), Type::int()]),
            method("m", vec![Type::int()]),
        ],
    ));

    let MethodResolution::NotFound(not_found) = resolve_method_call(
        &env,
        &call(
            Type::class(test, vec![]),
            "m",
            vec![Type::int(), Type::int()],
        ),
    ) else {
        panic!("expected no applicable method");
    };

    assert_eq!(not_found.name, "m");
    assert_eq!(not_found.args.len(), 2);
    assert_eq!(not_found.candidates.len(), 2);
    // Arity 1 is closer to 2 than arity 4.
    assert_eq!(not_found.candidates[0].params.len(), 1);
    assert_eq!(not_found.candidates[1].params.len(), 4);
}

#[test]
fn static_qualification_hides_instance_members() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = env.well_known().object;

    let util = env.add_class(class(
        "com.example.Util",
        Some(Type::class(object, vec![])),
        vec![method("m", vec![])],
    ));

    let static_call = MethodCall {
        receiver: Type::class(util, vec![]),
        call_kind: CallKind::Static,
        name: "m",
        args: vec![],
        scope: AccessScope::default(),
    };

    assert!(matches!(
        resolve_method_call(&env, &static_call),
        MethodResolution::NotFound(_)
    ));
}

#[test]
fn object_methods_resolve_through_interface_receivers() {
    let env = TypeStore::with_minimal_jdk();
    let char_sequence = Type::class(env.well_known().char_sequence, vec![]);

    let MethodResolution::Found(found) =
        resolve_method_call(&env, &call(char_sequence, "hashCode", vec![]))
    else {
        panic!("expected method resolution success");
    };

    assert_eq!(found.owner, env.well_known().object);
    assert_eq!(found.return_type, Type::int());
}

#[test]
fn generic_receiver_substitutes_parameters_before_resolution() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = env.well_known().object;
    let string = Type::class(env.well_known().string, vec![]);
    let integer = Type::class(env.well_known().integer, vec![]);

    let t = env.add_type_param("T", vec![Type::class(object, vec![])]);
    let boxed = env.add_class(ClassDef {
        name: "com.example.Box".to_string(),
        kind: ClassKind::Class,
        visibility: Visibility::Public,
        type_params: vec![t],
        super_class: Some(Type::class(object, vec![])),
        interfaces: vec![],
        constructors: vec![],
        methods: vec![MethodDef {
            return_type: Type::TypeVar(t),
            ..method("set", vec![Type::TypeVar(t)])
        }],
    });

    let receiver = Type::class(boxed, vec![string.clone()]);

    let MethodResolution::Found(found) =
        resolve_method_call(&env, &call(receiver.clone(), "set", vec![string.clone()]))
    else {
        panic!("expected method resolution success");
    };
    assert_eq!(found.params, vec![string.clone()]);
    assert_eq!(found.return_type, string);

    // `Box<String>.set(Integer)` does not type-check.
    assert!(matches!(
        resolve_method_call(&env, &call(receiver, "set", vec![integer])),
        MethodResolution::NotFound(_)
    ));
}

#[test]
fn resolution_is_idempotent() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = env.well_known().object;

    let test = env.add_class(class(
        "com.example.Idem",
        Some(Type::class(object, vec![])),
        vec![
            method("m", vec![Type::long()]),
            method("m", vec![Type::double()]),
        ],
    ));

    let call = call(Type::class(test, vec![]), "m", vec![Type::int()]);
    let first = resolve_method_call(&env, &call);
    let second = resolve_method_call(&env, &call);
    assert_eq!(first, second);
}

#[test]
fn resolution_results_serialize_for_the_diagnostics_sink() {
    let mut env = TypeStore::with_minimal_jdk();
    let object = env.well_known().object;

    let test = env.add_class(class(
        "com.example.Serial",
        Some(Type::class(object, vec![])),
        vec![method("m", vec![Type::int()])],
    ));

    let resolution =
        resolve_method_call(&env, &call(Type::class(test, vec![]), "m", vec![Type::int()]));

    let json = serde_json::to_string(&resolution).expect("resolution should serialize");
    let round_tripped: MethodResolution =
        serde_json::from_str(&json).expect("resolution should deserialize");
    assert_eq!(resolution, round_tripped);
}
