use pebble_lang::environment::Environment;
use pebble_lang::evaluator::{execute_program, RuntimeError, Value};
use pebble_lang::lexer::tokenize;
use pebble_lang::parser::parse;

fn run(source: &str) -> (Value, pebble_lang::environment::EnvRef) {
    let env = Environment::new_global();
    let program = parse(tokenize(source).unwrap()).unwrap();
    let (value, _) = execute_program(&program, &env).unwrap();
    (value, env)
}

#[test]
fn a_program_evaluates_to_its_last_statements_value() {
    let (value, _) = run("1+2+3");
    assert_eq!(value, Value::Integer(6));
}

#[test]
fn a_while_loop_leaves_the_expected_bindings_in_the_environment() {
    let (_, env) = run("x=1; while(x<5){x=x+1}; y=3");
    assert_eq!(env.borrow().get("x"), Some(Value::Integer(5)));
    assert_eq!(env.borrow().get("y"), Some(Value::Integer(3)));
}

#[test]
fn a_function_sees_the_scope_live_at_its_call_site() {
    let (value, _) = run("function g(q){return 2}; g(4)");
    assert_eq!(value, Value::Integer(2));

    let (value, _) = run("x=3; function g(q){return [1,2,3,q]}; g(4)");
    assert_eq!(
        value,
        Value::Array(std::rc::Rc::new(std::cell::RefCell::new(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
            Value::Integer(4),
        ])))
    );
}

#[test]
fn return_unwinds_across_an_if_block() {
    let (value, _) =
        run("function f(x){if(x>1){return 123}; return 2+2}; f(7)+f(0)");
    assert_eq!(value, Value::Integer(127));
}

#[test]
fn compound_assignment_through_an_array_index() {
    let (_, env) = run("x = [1,2,3]; x[1]=4");
    assert_eq!(
        env.borrow().get("x"),
        Some(Value::Array(std::rc::Rc::new(std::cell::RefCell::new(vec![
            Value::Integer(1),
            Value::Integer(4),
            Value::Integer(3),
        ]))))
    );
}

#[test]
fn compound_assignment_through_a_dotted_object_field() {
    let (value, _) = run(r#"x = {"a":1,"b":2}; x.b=4; x.b"#);
    assert_eq!(value, Value::Integer(4));
}

#[test]
fn builtins_match_their_documented_behavior() {
    assert_eq!(run("head([1,2,3])").0, Value::Integer(1));
    assert_eq!(run("tail([])").0, Value::Array(std::rc::Rc::new(std::cell::RefCell::new(vec![]))));
    assert_eq!(run(r#"length("hello")"#).0, Value::Integer(5));
    assert_eq!(
        run(r#"keys({"a":1,"b":2})"#).0,
        Value::Array(std::rc::Rc::new(std::cell::RefCell::new(vec![
            Value::Str("a".to_string()),
            Value::Str("b".to_string()),
        ])))
    );
}

#[test]
fn head_of_an_empty_array_is_null() {
    assert_eq!(run("head([])").0, Value::Null);
}

#[test]
fn dividing_by_zero_is_a_division_by_zero_error() {
    let env = Environment::new_global();
    let program = parse(tokenize("1/0").unwrap()).unwrap();
    match execute_program(&program, &env) {
        Err(RuntimeError::DivisionByZero) => {}
        other => panic!("expected DivisionByZero, got {other:?}"),
    }
}

#[test]
fn referencing_an_unbound_name_fails() {
    let env = Environment::new_global();
    let program = parse(tokenize("nope").unwrap()).unwrap();
    match execute_program(&program, &env) {
        Err(RuntimeError::UndefinedVariable(name)) => assert_eq!(name, "nope"),
        other => panic!("expected UndefinedVariable, got {other:?}"),
    }
}

#[test]
fn adding_incompatible_types_fails() {
    let env = Environment::new_global();
    let program = parse(tokenize("1 + true").unwrap()).unwrap();
    assert!(matches!(execute_program(&program, &env), Err(RuntimeError::TypeMismatch(_))));
}

#[test]
fn assigning_inside_a_function_never_mutates_the_callers_binding() {
    // reads walk the environment chain, but writes always land in the innermost frame
    let (value, _) = run("x = 3; function f() { x = x + 1; return x } f(); x");
    assert_eq!(value, Value::Integer(3));
}

#[test]
fn an_integer_valued_float_is_a_valid_array_index() {
    let (value, _) = run("x=[10,20,30]; x[1.0]");
    assert_eq!(value, Value::Integer(20));
}

#[test]
fn a_fractional_index_is_rejected() {
    let env = Environment::new_global();
    let program = parse(tokenize("x=[10,20,30]; x[1.5]").unwrap()).unwrap();
    assert!(execute_program(&program, &env).is_err());
}

#[test]
fn string_repetition_accepts_an_integer_valued_float_multiplier() {
    let (value, _) = run(r#""ab"*4.0"#);
    assert_eq!(value, Value::Str("abababab".to_string()));
}
