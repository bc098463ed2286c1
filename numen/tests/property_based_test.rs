use numen::{Bounds, Engine, Id, Oper, ResetCycle};
use proptest::prelude::*;

fn engine_with(names: &[&str]) -> Engine {
    let mut engine = Engine::new();
    for name in names {
        engine.registry_mut().register_name("stat", name, 0).unwrap();
    }
    engine
}

/// Names that accept negative values
fn signed_engine_with(names: &[&str]) -> Engine {
    let mut engine = Engine::new();
    for name in names {
        engine
            .registry_mut()
            .register_name_by_info("stat", name, 0, ResetCycle::Temp, Bounds::new(0.0, f64::NEG_INFINITY, 0.0))
            .unwrap();
    }
    engine
}

fn id(engine: &Engine, name: &str) -> Id {
    engine.registry().id_by_name(name).unwrap()
}

fn evaluate(engine: &Engine, text: &str, values: &[(&str, f64)]) -> f64 {
    let formula = engine.parse_formula(text).unwrap();
    let mut store = engine.storehouse();
    for (name, value) in values {
        store.set(id(engine, name), *value);
    }
    formula.evaluate(&store)
}

fn oper_strategy() -> impl Strategy<Value = Oper> {
    prop_oneof![
        Just(Oper::Set),
        Just(Oper::Inc),
        Just(Oper::Dec),
        Just(Oper::Mul),
        Just(Oper::Div),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_multiplication_binds_tighter_than_addition(a in -1000i32..1000, b in -1000i32..1000, c in -1000i32..1000) {
        let engine = signed_engine_with(&["a", "b", "c"]);
        let (a, b, c) = (f64::from(a), f64::from(b), f64::from(c));
        let values = [("a", a), ("b", b), ("c", c)];

        prop_assert_eq!(evaluate(&engine, "a+b*c", &values), a + b * c);
        prop_assert_eq!(evaluate(&engine, "a*b+c", &values), a * b + c);
        prop_assert_eq!(evaluate(&engine, "(a+b)*c", &values), (a + b) * c);
    }

    #[test]
    fn prop_same_precedence_is_left_associative(a in -1000i32..1000, b in -1000i32..1000, c in -1000i32..1000, d in 1i32..100) {
        let engine = signed_engine_with(&["a", "b", "c", "d"]);
        let (a, b, c, d) = (f64::from(a), f64::from(b), f64::from(c), f64::from(d));
        let values = [("a", a), ("b", b), ("c", c), ("d", d)];

        prop_assert_eq!(evaluate(&engine, "a-b-c", &values), (a - b) - c);
        prop_assert_eq!(evaluate(&engine, "a-b+c", &values), (a - b) + c);
        prop_assert_eq!(evaluate(&engine, "a/d*c", &values), (a / d) * c);
        prop_assert_eq!(evaluate(&engine, "a-b*c-d", &values), (a - b * c) - d);
    }

    #[test]
    fn prop_random_stays_in_range(low in 0i32..1000, span in 1i32..1000) {
        let engine = Engine::new();
        let high = low + span;
        let formula = engine.parse_formula(&format!("Random({},{})", low, high)).unwrap();
        let store = engine.storehouse();

        for _ in 0..20 {
            let value = formula.evaluate(&store);
            prop_assert!(value >= f64::from(low) && value < f64::from(high), "{} not in [{}, {})", value, low, high);
            prop_assert_eq!(value.fract(), 0.0);
        }
    }

    #[test]
    fn prop_every_write_is_clamped(
        min in -100i32..0,
        max in 1i32..100,
        steps in prop::collection::vec((oper_strategy(), -200i32..200), 1..20),
    ) {
        let mut engine = Engine::new();
        let bounds = Bounds::new(0.0, f64::from(min), f64::from(max));
        let hp = engine
            .registry_mut()
            .register_name_by_info("stat", "hp", 0, ResetCycle::Temp, bounds)
            .unwrap();
        let mut store = engine.storehouse();

        let mut expected = 0.0;
        for (op, operand) in steps {
            expected = bounds.clamp(op.apply(expected, f64::from(operand)));
            let retained = store.oper(hp, op, f64::from(operand));
            prop_assert_eq!(retained, expected);
            prop_assert!(retained >= f64::from(min) && retained <= f64::from(max));
        }
        prop_assert_eq!(store.get(hp), expected);
    }

    #[test]
    fn prop_and_groups_everything_to_its_right(x: bool, y: bool, z: bool) {
        let engine = engine_with(&["x", "y", "z"]);
        let condition = engine.parse_condition("x>0 && y>0 || z>0").unwrap();
        let mut store = engine.storehouse();
        for (name, flag) in [("x", x), ("y", y), ("z", z)] {
            store.set(id(&engine, name), if flag { 1.0 } else { 0.0 });
        }

        prop_assert_eq!(condition.check(&store), x && (y || z));
    }

    #[test]
    fn prop_operation_set_matches_sequential_application(
        start in -100i32..100,
        steps in prop::collection::vec((oper_strategy(), 1i32..50), 1..8),
    ) {
        let engine = engine_with(&["x"]);
        let x = id(&engine, "x");
        let text = steps
            .iter()
            .map(|(op, operand)| format!("x{}{}", op.symbol(), operand))
            .collect::<Vec<_>>()
            .join(" ");
        let operations = engine.parse_operations(&text).unwrap();
        let mut store = engine.storehouse();
        store.set(x, f64::from(start));

        // Default bounds floor every write at 0
        let bounds = Bounds::default();
        let expected = steps.iter().fold(bounds.clamp(f64::from(start)), |value, (op, operand)| {
            bounds.clamp(op.apply(value, f64::from(*operand)))
        });
        engine.workstation().exec_oper(&mut store, &operations, false);
        prop_assert_eq!(store.get(x), expected);
    }
}
