use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::environment::{EnvRef, Environment};
use crate::lexer::Literal;
use super::builtins;
use crate::parser::{BinaryOp, Expr, Program, Stmt};

/*
Runtime values. Arrays and objects are `Rc<RefCell<_>>` so that aliasing two variables to the
same array and mutating through one is visible through the other, matching the language's
in-place mutation semantics (a Python list/dict, not a Rust `Vec` moved by value).
*/
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<IndexMap<String, Value>>>),
    Function(Rc<FunctionValue>),
    Builtin(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionValue {
    pub parameters: Vec<String>,
    pub body: Vec<Stmt>,
}

/// What a statement did, besides whatever value it produced.
#[derive(Debug, Clone)]
pub enum Signal {
    Normal,
    Return(Value),
    Break,
    Continue,
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum RuntimeError {
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
    #[error("undefined property '{0}'")]
    UndefinedProperty(String),
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("'{0}' is not callable")]
    NotCallable(String),
    #[error("expected {expected} argument(s), found {found}")]
    WrongArity { expected: usize, found: usize },
    #[error("index out of bounds: {0}")]
    IndexOutOfBounds(i64),
    #[error("division by zero")]
    DivisionByZero,
    #[error("assertion failed{}", explanation.as_ref().map(|s| format!(": {s}")).unwrap_or_default())]
    AssertionFailed { explanation: Option<String> },
    /// Not a failure: the distinguished signal that `exit` raises. Only the interpreter/driver
    /// boundary should ever match on this variant instead of reporting it as an error.
    #[error("exit({0:?})")]
    Exit(Value),
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Integer(n) => *n != 0,
        Value::Number(n) => *n != 0.0,
        Value::Str(s) => !s.is_empty(),
        Value::Array(a) => !a.borrow().is_empty(),
        Value::Object(o) => !o.borrow().is_empty(),
        Value::Function(_) | Value::Builtin(_) => true,
    }
}

/// Top-level readable rendering used by `print`; nested container elements use `repr_value` so
/// strings inside a list or object show their quotes.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Str(s) => s.clone(),
        other => repr_value(other),
    }
}

fn repr_value(value: &Value) -> String {
    match value {
        Value::Integer(n) => n.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Str(s) => format!("\"{s}\""),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(a) => {
            let items: Vec<String> = a.borrow().iter().map(repr_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(o) => {
            let items: Vec<String> =
                o.borrow().iter().map(|(k, v)| format!("\"{k}\": {}", repr_value(v))).collect();
            format!("{{{}}}", items.join(", "))
        }
        Value::Function(_) => "<function>".to_string(),
        Value::Builtin(name) => format!("<builtin {name}>"),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(x), Value::Number(y)) => (*x as f64) == *y,
        (Value::Number(x), Value::Integer(y)) => *x == (*y as f64),
        _ => a == b,
    }
}

/// An index/count must be an integer, or a float with no fractional part (`2.0` is fine, `2.5`
/// is not) — matches the reference evaluator's `assert int(index) == index` guard.
fn as_exact_integer(value: &Value, what: &str) -> Result<i64, RuntimeError> {
    match value {
        Value::Integer(n) => Ok(*n),
        Value::Number(n) if n.fract() == 0.0 => Ok(*n as i64),
        other => Err(RuntimeError::TypeMismatch(format!("{what} must be an integer, found {}", repr_value(other)))),
    }
}

/// Runs a statement list, threading the value of the last-executed statement alongside whatever
/// control-flow signal it produced — the pair spec.md's evaluator is built around (e.g. `"1+2+3"`
/// in an empty environment evaluates to `6`, not just "ran without error").
pub fn execute_program(program: &Program, env: &EnvRef) -> Result<(Value, Signal), RuntimeError> {
    define_builtins(env);
    execute_block(&program.statements, env)
}

fn define_builtins(env: &EnvRef) {
    let mut scope = env.borrow_mut();
    for name in builtins::NAMES {
        scope.define(name.to_string(), Value::Builtin(name));
    }
}

fn execute_block(statements: &[Stmt], env: &EnvRef) -> Result<(Value, Signal), RuntimeError> {
    let mut last = Value::Null;
    for statement in statements {
        let (value, signal) = execute_stmt(statement, env)?;
        last = value;
        if !matches!(signal, Signal::Normal) {
            return Ok((last, signal));
        }
    }
    Ok((last, Signal::Normal))
}

fn execute_stmt(statement: &Stmt, env: &EnvRef) -> Result<(Value, Signal), RuntimeError> {
    match statement {
        Stmt::Expression(expr) => Ok((evaluate(expr, env)?, Signal::Normal)),
        Stmt::If { condition, then_branch, else_branch } => {
            if is_truthy(&evaluate(condition, env)?) {
                execute_block(then_branch, env)
            } else if let Some(else_branch) = else_branch {
                execute_block(else_branch, env)
            } else {
                Ok((Value::Null, Signal::Normal))
            }
        }
        Stmt::While { condition, body } => {
            while is_truthy(&evaluate(condition, env)?) {
                let (value, signal) = execute_block(body, env)?;
                match signal {
                    Signal::Break => break,
                    Signal::Return(_) => return Ok((value, signal)),
                    Signal::Normal | Signal::Continue => continue,
                }
            }
            Ok((Value::Null, Signal::Normal))
        }
        Stmt::Return(expr) => {
            let value = evaluate_optional(expr, env)?;
            Ok((value.clone(), Signal::Return(value)))
        }
        Stmt::Print(expr) => {
            let value = evaluate_optional(expr, env)?;
            println!("{}", display_value(&value));
            Ok((Value::Null, Signal::Normal))
        }
        Stmt::Exit(expr) => {
            let value = evaluate_optional(expr, env)?;
            Err(RuntimeError::Exit(value))
        }
        Stmt::Assert { condition, explanation } => {
            if is_truthy(&evaluate(condition, env)?) {
                Ok((Value::Null, Signal::Normal))
            } else {
                let explanation = match explanation {
                    Some(expr) => Some(display_value(&evaluate(expr, env)?)),
                    None => None,
                };
                Err(RuntimeError::AssertionFailed { explanation })
            }
        }
        Stmt::Import(expr) => {
            evaluate(expr, env)?;
            Ok((Value::Null, Signal::Normal))
        }
        Stmt::Break => Ok((Value::Null, Signal::Break)),
        Stmt::Continue => Ok((Value::Null, Signal::Continue)),
    }
}

fn evaluate_optional(expr: &Option<Expr>, env: &EnvRef) -> Result<Value, RuntimeError> {
    match expr {
        Some(expr) => evaluate(expr, env),
        None => Ok(Value::Null),
    }
}

fn evaluate(expr: &Expr, env: &EnvRef) -> Result<Value, RuntimeError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Integer(n) => Ok(Value::Integer(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Null => Ok(Value::Null),
        Expr::Identifier(name) => {
            env.borrow().get(name).ok_or_else(|| RuntimeError::UndefinedVariable(name.clone()))
        }
        Expr::List(items) => {
            let values = items.iter().map(|e| evaluate(e, env)).collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(Rc::new(RefCell::new(values))))
        }
        Expr::Object(entries) => {
            let mut map = IndexMap::new();
            for (key_expr, value_expr) in entries {
                let key = object_key(key_expr, env)?;
                let value = evaluate(value_expr, env)?;
                map.insert(key, value);
            }
            Ok(Value::Object(Rc::new(RefCell::new(map))))
        }
        Expr::Negate(inner) => match evaluate(inner, env)? {
            Value::Integer(n) => Ok(Value::Integer(-n)),
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(RuntimeError::TypeMismatch(format!("cannot negate {}", repr_value(&other)))),
        },
        Expr::Not(inner) => Ok(Value::Bool(!is_truthy(&evaluate(inner, env)?))),
        Expr::Binary { op, left, right } => evaluate_binary(op, left, right, env),
        Expr::Index { base, index } => {
            let base_value = evaluate(base, env)?;
            let index_value = evaluate(index, env)?;
            index_into(&base_value, &index_value)
        }
        Expr::Call { function, arguments } => {
            let callee = evaluate(function, env)?;
            let args = arguments.iter().map(|e| evaluate(e, env)).collect::<Result<Vec<_>, _>>()?;
            call(&callee, args, env)
        }
        Expr::Function { parameters, body } => {
            let parameters = parameters
                .iter()
                .map(|token| match &token.value {
                    Literal::Identifier(name) => name.clone(),
                    _ => unreachable!("function parameter token without identifier value"),
                })
                .collect();
            Ok(Value::Function(Rc::new(FunctionValue { parameters, body: body.clone() })))
        }
        Expr::Assign { target, value } => {
            let value = evaluate(value, env)?;
            assign(target, value.clone(), env)?;
            Ok(value)
        }
    }
}

/// `x.name` lowers to `Index{base, index: Str(name)}` at parse time, so both `x.name` and
/// `x["name"]` reach this same evaluation path.
fn object_key(expr: &Expr, env: &EnvRef) -> Result<String, RuntimeError> {
    match evaluate(expr, env)? {
        Value::Str(s) => Ok(s),
        other => Err(RuntimeError::TypeMismatch(format!(
            "object keys must be strings, found {}",
            repr_value(&other)
        ))),
    }
}

fn index_into(base: &Value, index: &Value) -> Result<Value, RuntimeError> {
    match base {
        Value::Array(items) => {
            let i = as_exact_integer(index, "array index")?;
            let items = items.borrow();
            usize::try_from(i).ok().and_then(|i| items.get(i)).cloned().ok_or(RuntimeError::IndexOutOfBounds(i))
        }
        Value::Object(map) => match index {
            Value::Str(key) => {
                map.borrow().get(key).cloned().ok_or_else(|| RuntimeError::UndefinedProperty(key.clone()))
            }
            other => Err(RuntimeError::TypeMismatch(format!("object key must be a string, found {}", repr_value(other)))),
        },
        other => Err(RuntimeError::TypeMismatch(format!("cannot index into {}", repr_value(other)))),
    }
}

/// Assignment always writes into the *current* (innermost) frame, never an ancestor: this
/// language's scoping is dynamic, so `x = ...` inside a function shadows a caller's `x` locally
/// instead of reaching back up and mutating it.
fn assign(target: &Expr, value: Value, env: &EnvRef) -> Result<(), RuntimeError> {
    match target {
        Expr::Identifier(name) => {
            env.borrow_mut().define(name.clone(), value);
            Ok(())
        }
        Expr::Index { base, index } => {
            let base_value = evaluate(base, env)?;
            let index_value = evaluate(index, env)?;
            match &base_value {
                Value::Array(items) => {
                    let i = as_exact_integer(&index_value, "array index")?;
                    let mut items = items.borrow_mut();
                    match usize::try_from(i).ok().filter(|u| *u < items.len()) {
                        Some(u) => {
                            items[u] = value;
                            Ok(())
                        }
                        None => Err(RuntimeError::IndexOutOfBounds(i)),
                    }
                }
                Value::Object(map) => match &index_value {
                    Value::Str(key) => {
                        map.borrow_mut().insert(key.clone(), value);
                        Ok(())
                    }
                    other => Err(RuntimeError::TypeMismatch(format!(
                        "object key must be a string, found {}",
                        repr_value(other)
                    ))),
                },
                other => Err(RuntimeError::TypeMismatch(format!(
                    "cannot assign into {} with index {}",
                    repr_value(other),
                    repr_value(&index_value)
                ))),
            }
        }
        other => Err(RuntimeError::TypeMismatch(format!("{:?} is not an assignable target", other))),
    }
}

fn call(callee: &Value, arguments: Vec<Value>, env: &EnvRef) -> Result<Value, RuntimeError> {
    match callee {
        Value::Builtin(name) => builtins::call(name, arguments),
        Value::Function(function) => {
            if arguments.len() != function.parameters.len() {
                return Err(RuntimeError::WrongArity {
                    expected: function.parameters.len(),
                    found: arguments.len(),
                });
            }
            // Dynamic scoping: the call's activation record is parented on the caller's live
            // environment, not on whatever environment was active where the function literal
            // was written.
            let call_env = Environment::new_child(env);
            {
                let mut scope = call_env.borrow_mut();
                for (parameter, argument) in function.parameters.iter().zip(arguments) {
                    scope.define(parameter.clone(), argument);
                }
            }
            match execute_block(&function.body, &call_env)? {
                (value, Signal::Return(_)) => Ok(value),
                _ => Ok(Value::Null),
            }
        }
        other => Err(RuntimeError::NotCallable(repr_value(other))),
    }
}

fn evaluate_binary(op: &BinaryOp, left: &Expr, right: &Expr, env: &EnvRef) -> Result<Value, RuntimeError> {
    // `&&`/`||` never short-circuit here: both sides are always evaluated.
    let lv = evaluate(left, env)?;
    let rv = evaluate(right, env)?;
    match op {
        BinaryOp::Add => add(&lv, &rv),
        BinaryOp::Sub => numeric(&lv, &rv, |a, b| a - b, |a, b| a - b),
        BinaryOp::Mul => mul(&lv, &rv),
        BinaryOp::Div => divide(&lv, &rv),
        BinaryOp::Less => compare(&lv, &rv, |o| o == std::cmp::Ordering::Less),
        BinaryOp::Greater => compare(&lv, &rv, |o| o == std::cmp::Ordering::Greater),
        BinaryOp::LessEqual => compare(&lv, &rv, |o| o != std::cmp::Ordering::Greater),
        BinaryOp::GreaterEqual => compare(&lv, &rv, |o| o != std::cmp::Ordering::Less),
        BinaryOp::Equal => Ok(Value::Bool(values_equal(&lv, &rv))),
        BinaryOp::NotEqual => Ok(Value::Bool(!values_equal(&lv, &rv))),
        BinaryOp::And => Ok(Value::Bool(is_truthy(&lv) && is_truthy(&rv))),
        BinaryOp::Or => Ok(Value::Bool(is_truthy(&lv) || is_truthy(&rv))),
    }
}

fn add(a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(Value::Str(format!("{x}{y}"))),
        _ => numeric(a, b, |x, y| x + y, |x, y| x + y),
    }
}

/// String repetition (`"ab" * 3` or `3 * "ab"`); the count may be an integer-valued float
/// (`4.0`, truncated toward zero) but not a fractional one. A non-positive count yields `""`.
fn mul(a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Value::Str(s), count @ (Value::Integer(_) | Value::Number(_)))
        | (count @ (Value::Integer(_) | Value::Number(_)), Value::Str(s)) => {
            let n = as_exact_integer(count, "string repetition count")?;
            Ok(Value::Str(if n <= 0 { String::new() } else { s.repeat(n as usize) }))
        }
        _ => numeric(a, b, |x, y| x * y, |x, y| x * y),
    }
}

fn divide(a: &Value, b: &Value) -> Result<Value, RuntimeError> {
    // Division always promotes to float, matching true division rather than integer floor division.
    let (x, y) = (as_f64(a)?, as_f64(b)?);
    if y == 0.0 {
        return Err(RuntimeError::DivisionByZero);
    }
    Ok(Value::Number(x / y))
}

fn numeric(
    a: &Value,
    b: &Value,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => Ok(Value::Integer(int_op(*x, *y))),
        (Value::Integer(_) | Value::Number(_), Value::Integer(_) | Value::Number(_)) => {
            Ok(Value::Number(float_op(as_f64(a)?, as_f64(b)?)))
        }
        _ => Err(RuntimeError::TypeMismatch(format!(
            "cannot apply arithmetic to {} and {}",
            repr_value(a),
            repr_value(b)
        ))),
    }
}

fn as_f64(value: &Value) -> Result<f64, RuntimeError> {
    match value {
        Value::Integer(n) => Ok(*n as f64),
        Value::Number(n) => Ok(*n),
        other => Err(RuntimeError::TypeMismatch(format!("expected a number, found {}", repr_value(other)))),
    }
}

fn compare(a: &Value, b: &Value, accept: impl Fn(std::cmp::Ordering) -> bool) -> Result<Value, RuntimeError> {
    let ordering = match (a, b) {
        (Value::Integer(_) | Value::Number(_), Value::Integer(_) | Value::Number(_)) => {
            as_f64(a)?.partial_cmp(&as_f64(b)?)
        }
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        _ => {
            return Err(RuntimeError::TypeMismatch(format!(
                "cannot compare {} and {}",
                repr_value(a),
                repr_value(b)
            )))
        }
    };
    match ordering {
        Some(ordering) => Ok(Value::Bool(accept(ordering))),
        None => Ok(Value::Bool(false)), // NaN comparisons
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::parse;

    /// Exercises the real `execute_program` path end to end, returning the value of the last
    /// executed statement (the same pair a driver would see).
    fn eval_program(source: &str) -> Value {
        let env = Environment::new_global();
        let program = parse(tokenize(source).unwrap()).unwrap();
        execute_program(&program, &env).unwrap().0
    }

    #[test]
    fn a_program_evaluates_to_its_last_statement_value() {
        assert_eq!(eval_program("1+2+3"), Value::Integer(6));
    }

    #[test]
    fn integer_arithmetic_stays_exact() {
        assert_eq!(eval_program("1+2*3"), Value::Integer(7));
    }

    #[test]
    fn mixed_arithmetic_promotes_to_float() {
        assert_eq!(eval_program("1+2.5"), Value::Number(3.5));
    }

    #[test]
    fn division_always_produces_a_float() {
        assert_eq!(eval_program("4/2"), Value::Number(2.0));
    }

    #[test]
    fn dividing_by_zero_is_a_runtime_error() {
        let env = Environment::new_global();
        let program = parse(tokenize("1/0").unwrap()).unwrap();
        match execute_program(&program, &env) {
            Err(RuntimeError::DivisionByZero) => {}
            other => panic!("expected DivisionByZero, got {other:?}"),
        }
    }

    #[test]
    fn string_concatenation_and_repetition() {
        assert_eq!(eval_program("\"a\"+\"b\""), Value::Str("ab".to_string()));
        assert_eq!(eval_program("\"ab\"*3"), Value::Str("ababab".to_string()));
    }

    #[test]
    fn string_repetition_accepts_an_integer_valued_float_count() {
        assert_eq!(eval_program("\"ab\"*4.0"), Value::Str("abababab".to_string()));
    }

    #[test]
    fn string_repetition_rejects_a_fractional_count() {
        let env = Environment::new_global();
        let program = parse(tokenize("\"ab\"*2.5").unwrap()).unwrap();
        assert!(execute_program(&program, &env).is_err());
    }

    #[test]
    fn falsy_values_match_the_truthiness_rule() {
        assert!(!is_truthy(&Value::Integer(0)));
        assert!(!is_truthy(&Value::Str(String::new())));
        assert!(!is_truthy(&Value::Null));
        assert!(is_truthy(&Value::Integer(-1)));
    }

    #[test]
    fn logical_operators_do_not_short_circuit() {
        // if `&&` short-circuited, the assignment on the right would never run and `x` would
        // stay 0; it evaluates to 5, so both sides always run.
        assert_eq!(eval_program("x = 0; 0 && (x = 5); x"), Value::Integer(5));
    }

    #[test]
    fn dotted_and_bracket_indices_read_the_same_value() {
        let value = eval_program("x={\"a\": 1}; y=x.a; z=x[\"a\"]; y == z");
        assert_eq!(value, Value::Bool(true));
    }

    #[test]
    fn a_float_with_no_fractional_part_is_a_valid_array_index() {
        assert_eq!(eval_program("x=[10,20,30]; x[1.0]"), Value::Integer(20));
    }

    #[test]
    fn a_fractional_array_index_is_a_type_error() {
        let env = Environment::new_global();
        let program = parse(tokenize("x=[10,20,30]; x[1.5]").unwrap()).unwrap();
        assert!(execute_program(&program, &env).is_err());
    }

    #[test]
    fn functions_see_the_callers_scope_not_their_definition_site() {
        let value = eval_program(
            "function f() { return x } function g() { x = 99; return f() } y = g(); y",
        );
        assert_eq!(value, Value::Integer(99));
    }

    #[test]
    fn assigning_inside_a_function_shadows_the_callers_binding_locally() {
        // writes always land in the innermost frame; they never climb back up and mutate a
        // caller's variable of the same name.
        let value = eval_program("x = 3; function f() { x = x + 1; return x } f(); x");
        assert_eq!(value, Value::Integer(3));
    }

    #[test]
    fn while_loop_honors_break_and_continue() {
        let value = eval_program(
            "i=0; total=0; while(i<5) { i=i+1; if (i==3) { continue } if (i==5) { break } total=total+i } total",
        );
        assert_eq!(value, Value::Integer(1 + 2 + 4));
    }

    #[test]
    fn exit_bubbles_up_as_a_distinguished_error() {
        let env = Environment::new_global();
        let program = parse(tokenize("exit 42").unwrap()).unwrap();
        match execute_program(&program, &env) {
            Err(RuntimeError::Exit(Value::Integer(42))) => {}
            other => panic!("expected Exit(42), got {other:?}"),
        }
    }

    #[test]
    fn assignment_to_an_undefined_name_declares_it() {
        assert_eq!(eval_program("x = 5; x"), Value::Integer(5));
    }
}
