use super::{engine_with, id};
use crate::engine::Engine;
use crate::error::{NumenError, Stage};
use std::cell::Cell;
use std::rc::Rc;

fn check(text: &str) -> bool {
    let engine = Engine::new();
    let condition = engine.parse_condition(text).unwrap();
    condition.check(&engine.storehouse())
}

fn parse_error(engine: &Engine, text: &str) -> String {
    match engine.parse_condition(text) {
        Err(NumenError::Parse(details)) => {
            assert_eq!(details.stage, Stage::Condition);
            details.message
        }
        Err(other) => panic!("Expected Parse error, got {:?}", other),
        Ok(condition) => panic!("Expected error for '{}', parsed '{}'", text, condition),
    }
}

#[test]
fn test_comparisons() {
    assert!(check("2>1"));
    assert!(!check("1>2"));
    assert!(check("1<2"));
    assert!(check("2>=2"));
    assert!(check("2<=2"));
    assert!(check("3=3"));
    assert!(check("3!=4"));
    assert!(!check("3!=3"));
}

#[test]
fn test_formula_operands() {
    assert!(check("1+2*3 = 7"));
    assert!(check("(1+2)*3 = 9"));
    assert!(check("Max(1,5) > (2+2)"));
}

#[test]
fn test_literals() {
    assert!(check("true"));
    assert!(!check("false"));
    assert!(check("TRUE"));
    assert!(!check("true && false"));
}

#[test]
fn test_logic_right_operand_takes_the_rest() {
    let engine = engine_with(&["a", "b", "c"]);
    let condition = engine.parse_condition("a=1&&b=1||c=1").unwrap();
    assert_eq!(condition.to_string(), "((a=1)&&((b=1)||(c=1)))");

    let mut store = engine.storehouse();
    for bits in 0..8u8 {
        let (a, b, c) = (bits & 1 != 0, bits & 2 != 0, bits & 4 != 0);
        store.set(id(&engine, "a"), f64::from(u8::from(a)));
        store.set(id(&engine, "b"), f64::from(u8::from(b)));
        store.set(id(&engine, "c"), f64::from(u8::from(c)));

        assert_eq!(condition.check(&store), a && (b || c), "a={} b={} c={}", a, b, c);
    }
}

#[test]
fn test_false_and_true_or_true_is_false() {
    assert!(!check("1>2 && 1<2 || 1<2"));
}

#[test]
fn test_parenthesised_groups() {
    let engine = engine_with(&["a", "b", "c"]);
    let condition = engine.parse_condition("(a>1||b>1)&&c>1").unwrap();
    assert_eq!(condition.to_string(), "(((a>1)||(b>1))&&(c>1))");

    let mut store = engine.storehouse();
    store.set(id(&engine, "b"), 2.0);
    assert!(!condition.check(&store));
    store.set(id(&engine, "c"), 2.0);
    assert!(condition.check(&store));
}

#[test]
fn test_parenthesised_formula_operand() {
    let engine = engine_with(&["a", "b"]);
    let condition = engine.parse_condition("(a+b)*2>10").unwrap();
    assert_eq!(condition.to_string(), "(((a+b)*2)>10)");
}

#[test]
fn test_short_circuit() {
    let mut engine = Engine::new();
    let calls = Rc::new(Cell::new(0u32));
    let counter = calls.clone();
    engine
        .functions_mut()
        .register("Tick", 0, move |_| {
            counter.set(counter.get() + 1);
            1.0
        })
        .unwrap();
    let store = engine.storehouse();

    assert!(!engine.parse_condition("1>2 && Tick()>0").unwrap().check(&store));
    assert!(engine.parse_condition("1<2 || Tick()>0").unwrap().check(&store));
    assert_eq!(calls.get(), 0);

    assert!(engine.parse_condition("1<2 && Tick()>0").unwrap().check(&store));
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_value_form() {
    let engine = engine_with(&["hp"]);
    let condition = engine.parse_condition("hp<=0 || hp>100").unwrap();
    let mut store = engine.storehouse();
    store.set(id(&engine, "hp"), 42.0);

    assert_eq!(condition.render_values(&store), "((42<=0)||(42>100))");
}

#[test]
fn test_referenced_ids_in_source_order() {
    let engine = engine_with(&["a", "b", "c"]);
    let condition = engine.parse_condition("a>b && If(a<c, 1, 0)=1").unwrap();
    let (a, b, c) = (id(&engine, "a"), id(&engine, "b"), id(&engine, "c"));
    assert_eq!(condition.referenced_ids(), vec![a, b, a, c]);
}

#[test]
fn test_missing_operands() {
    let engine = engine_with(&["a"]);
    assert_eq!(
        parse_error(&engine, "a>"),
        "comparison operator '>' is missing its right operand"
    );
    assert_eq!(
        parse_error(&engine, "a>1&&"),
        "logic operator '&&' is missing its right operand"
    );
    assert_eq!(
        parse_error(&engine, "&&a>1"),
        "logic operator '&&' is missing its left operand"
    );
    assert_eq!(parse_error(&engine, ""), "empty condition");
}

#[test]
fn test_missing_comparison() {
    let engine = engine_with(&["a"]);
    assert_eq!(parse_error(&engine, "a"), "missing comparison operator after 'a'");
}

#[test]
fn test_single_logic_symbol() {
    let engine = engine_with(&["a", "b"]);
    assert_eq!(parse_error(&engine, "a>1&b>1"), "expected '&&'");
    assert_eq!(parse_error(&engine, "a>1|b>1"), "expected '||'");
}

#[test]
fn test_invalid_comparison_symbol() {
    let engine = engine_with(&["a"]);
    assert_eq!(parse_error(&engine, "a=>1"), "invalid comparison operator '=>'");
}

#[test]
fn test_unbalanced_parentheses() {
    let engine = engine_with(&["a"]);
    assert_eq!(parse_error(&engine, "(a>1"), "missing right parenthesis");
    assert_eq!(parse_error(&engine, "a>1)"), "unmatched right parenthesis");
}

#[test]
fn test_extra_symbol_after_group() {
    let engine = engine_with(&["a"]);
    assert_eq!(parse_error(&engine, "(a>1) a>2"), "extra symbol after condition");
}

#[test]
fn test_formula_errors_report_condition_stage() {
    let engine = Engine::new();
    let message = parse_error(&engine, "ghost>1");
    assert!(message.contains("unknown name 'ghost'"), "{}", message);
}
