use proptest::prelude::*;

use vega_types::{
    strict_conversion, widening_primitive, ConversionKind, PrimitiveType, Type, TypeStore,
};

fn arb_primitive() -> impl Strategy<Value = PrimitiveType> {
    prop::sample::select(vec![
        PrimitiveType::Boolean,
        PrimitiveType::Byte,
        PrimitiveType::Short,
        PrimitiveType::Char,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
    ])
}

proptest! {
    #[test]
    fn widening_is_irreflexive(p in arb_primitive()) {
        prop_assert!(!widening_primitive(p, p));
    }

    #[test]
    fn widening_is_antisymmetric(a in arb_primitive(), b in arb_primitive()) {
        prop_assert!(!(widening_primitive(a, b) && widening_primitive(b, a)));
    }

    #[test]
    fn widening_is_transitive(
        a in arb_primitive(),
        b in arb_primitive(),
        c in arb_primitive(),
    ) {
        if widening_primitive(a, b) && widening_primitive(b, c) {
            prop_assert!(widening_primitive(a, c));
        }
    }

    #[test]
    fn boolean_stays_incomparable(p in arb_primitive()) {
        if p != PrimitiveType::Boolean {
            prop_assert!(!widening_primitive(PrimitiveType::Boolean, p));
            prop_assert!(!widening_primitive(p, PrimitiveType::Boolean));
        }
    }

    #[test]
    fn strict_conversion_agrees_with_the_lattice(
        a in arb_primitive(),
        b in arb_primitive(),
    ) {
        let env = TypeStore::with_minimal_jdk();
        let got = strict_conversion(&env, &Type::Primitive(a), &Type::Primitive(b));
        let expected = if a == b {
            Some(ConversionKind::Identity)
        } else if widening_primitive(a, b) {
            Some(ConversionKind::WideningPrimitive)
        } else {
            None
        };
        prop_assert_eq!(got, expected);
    }
}
