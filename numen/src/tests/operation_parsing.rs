use super::{engine_with, id};
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::{NumenError, Stage};
use crate::evaluator::Oper;
use crate::registry::{Bounds, ResetCycle};

fn parse_error(engine: &Engine, text: &str) -> String {
    match engine.parse_operations(text) {
        Err(NumenError::Parse(details)) => {
            assert_eq!(details.stage, Stage::Operation);
            details.message
        }
        Err(other) => panic!("Expected Parse error, got {:?}", other),
        Ok(operations) => panic!("Expected error for '{}', parsed '{}'", text, operations),
    }
}

fn run(engine: &Engine, text: &str, name: &str) -> f64 {
    let operations = engine.parse_operations(text).unwrap();
    let mut store = engine.storehouse();
    operations.execute(&mut store);
    store.get(id(engine, name))
}

#[test]
fn test_statements_run_in_order() {
    let engine = engine_with(&["x"]);
    assert_eq!(run(&engine, "x=5 x+=3 x*=2", "x"), 16.0);
}

#[test]
fn test_compound_operators() {
    let engine = engine_with(&["x"]);
    assert_eq!(run(&engine, "x=10 x-=4 x/=2", "x"), 3.0);
    assert_eq!(run(&engine, "x=10 x/=0", "x"), 10.0);
    assert_eq!(run(&engine, "x:7", "x"), 7.0);
}

#[test]
fn test_parsed_operators() {
    let engine = engine_with(&["a", "b", "c", "d", "e"]);
    let operations = engine.parse_operations("a=1 b+=1 c-=1 d*=1 e/=1").unwrap();
    let opers: Vec<Oper> = operations.operations.iter().map(|operation| operation.op).collect();
    assert_eq!(opers, vec![Oper::Set, Oper::Inc, Oper::Dec, Oper::Mul, Oper::Div]);
}

#[test]
fn test_compound_operator_needs_adjacent_equals() {
    let engine = engine_with(&["x"]);
    assert_eq!(parse_error(&engine, "x+ =1"), "operator '+' must be followed by '='");
    assert_eq!(parse_error(&engine, "x*"), "operator '*' must be followed by '='");
    assert_eq!(run(&engine, "x=3 x*=2 x+=1", "x"), 7.0);
}

#[test]
fn test_spaces_around_operators() {
    let engine = engine_with(&["x", "y"]);
    let operations = engine.parse_operations("x = 1 + 2 y = x * 2").unwrap();
    assert_eq!(operations.operations.len(), 2);
    assert_eq!(operations.to_string(), "x=(1+2) y=(x*2)");
}

#[test]
fn test_newlines_and_comments() {
    let engine = engine_with(&["x", "y"]);
    let text = "x = 1 // start\n// a full-line comment\ny += x + 2\n";
    let operations = engine.parse_operations(text).unwrap();
    let mut store = engine.storehouse();
    operations.execute(&mut store);

    assert_eq!(store.get(id(&engine, "x")), 1.0);
    assert_eq!(store.get(id(&engine, "y")), 3.0);
}

#[test]
fn test_trailing_operator_continues_on_next_line() {
    let engine = engine_with(&["x"]);
    assert_eq!(run(&engine, "x = 1 +\n  2", "x"), 3.0);
}

#[test]
fn test_function_arguments_with_spaces() {
    let engine = engine_with(&["x", "y"]);
    let operations = engine.parse_operations("x=Max(1, 2) y=3").unwrap();
    assert_eq!(operations.to_string(), "x=Max(1,2) y=3");
}

#[test]
fn test_negative_values() {
    let mut engine = Engine::new();
    engine
        .registry_mut()
        .register_name_by_info("stat", "x", 0, ResetCycle::Temp, Bounds::new(0.0, -10.0, 0.0))
        .unwrap();
    assert_eq!(run(&engine, "x=-3", "x"), -3.0);
    assert_eq!(run(&engine, "x=-30", "x"), -10.0);

    let engine = engine_with(&["y"]);
    assert_eq!(run(&engine, "y=-3", "y"), 0.0);
}

#[test]
fn test_value_form() {
    let engine = engine_with(&["x"]);
    let operations = engine.parse_operations("x+=x*2").unwrap();
    let mut store = engine.storehouse();
    store.set(id(&engine, "x"), 5.0);

    assert_eq!(operations.render_values(&store), "5+=(5*2)");
}

#[test]
fn test_custom_step_separator() {
    let config = EngineConfig {
        step_separator: ';',
        ..EngineConfig::default()
    };
    let mut engine = Engine::with_config(config);
    engine.registry_mut().register_name("stat", "x", 0).unwrap();
    engine.registry_mut().register_name("stat", "y", 0).unwrap();

    let operations = engine.parse_operations("x = 1 + 1; y = x * 3").unwrap();
    assert_eq!(operations.to_string(), "x=(1+1);y=(x*3)");

    let mut store = engine.storehouse();
    operations.execute(&mut store);
    assert_eq!(store.get(id(&engine, "y")), 6.0);
}

#[test]
fn test_extra_symbol_after_closed_value() {
    let config = EngineConfig {
        step_separator: ';',
        ..EngineConfig::default()
    };
    let mut engine = Engine::with_config(config);
    engine.registry_mut().register_name("stat", "x", 0).unwrap();

    assert_eq!(parse_error(&engine, "x=1 2;x=3"), "extra symbol after expression");
}

#[test]
fn test_space_between_operands_in_parentheses() {
    let engine = engine_with(&["x"]);
    assert_eq!(parse_error(&engine, "x=(1 2)"), "unexpected space between operands");
}

#[test]
fn test_missing_pieces() {
    let engine = engine_with(&["x"]);
    assert_eq!(parse_error(&engine, "x="), "'x' is missing its value expression");
    assert_eq!(parse_error(&engine, "=5"), "missing name before '='");
    assert_eq!(parse_error(&engine, "x"), "statement 'x' is missing an assignment operator");
    assert_eq!(parse_error(&engine, "x+5"), "operator '+' must be followed by '='");
    assert_eq!(parse_error(&engine, ""), "empty operation list");
    assert_eq!(parse_error(&engine, "// only a comment"), "empty operation list");
}

#[test]
fn test_unknown_target() {
    let engine = engine_with(&["x"]);
    assert_eq!(parse_error(&engine, "x=1 ghost=2"), "unknown name 'ghost'");
}

#[test]
fn test_return_is_not_an_operation() {
    let engine = engine_with(&["x"]);
    let message = parse_error(&engine, "x=1 Return(x)");
    assert!(message.contains("only Return(...) may be called here"), "{}", message);
}

#[test]
fn test_unmatched_parenthesis() {
    let engine = engine_with(&["x"]);
    assert_eq!(parse_error(&engine, "x=1)"), "unmatched right parenthesis");
}

#[test]
fn test_error_line_in_multiline_source() {
    let engine = engine_with(&["x"]);
    let err = engine.parse_operations("x=1\nx+=2\nghost=3").unwrap_err();
    let details = err.details().unwrap();
    assert_eq!(details.span.line, 3);
    assert_eq!(details.span.col, 1);
    assert_eq!(details.remaining, "ghost=3");
}
