use std::cell::RefCell;
use std::rc::Rc;

use super::evaluator::{RuntimeError, Value};

pub const NAMES: &[&str] = &["head", "tail", "length", "keys"];

pub fn call(name: &str, mut arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    if arguments.len() != 1 {
        return Err(RuntimeError::WrongArity { expected: 1, found: arguments.len() });
    }
    let argument = arguments.remove(0);
    match name {
        "head" => head(argument),
        "tail" => tail(argument),
        "length" => length(argument),
        "keys" => keys(argument),
        _ => unreachable!("builtin dispatched with unknown name {name:?}"),
    }
}

fn head(value: Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Array(items) => Ok(items.borrow().first().cloned().unwrap_or(Value::Null)),
        other => Err(RuntimeError::TypeMismatch(format!("head() expects an array, found {other:?}"))),
    }
}

fn tail(value: Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Array(items) => {
            let items = items.borrow();
            let rest = if items.is_empty() { Vec::new() } else { items[1..].to_vec() };
            Ok(Value::Array(Rc::new(RefCell::new(rest))))
        }
        other => Err(RuntimeError::TypeMismatch(format!("tail() expects an array, found {other:?}"))),
    }
}

fn length(value: Value) -> Result<Value, RuntimeError> {
    let n = match value {
        Value::Array(items) => items.borrow().len(),
        Value::Object(map) => map.borrow().len(),
        Value::Str(s) => s.chars().count(),
        other => return Err(RuntimeError::TypeMismatch(format!(
            "length() expects an array, object, or string, found {other:?}"
        ))),
    };
    Ok(Value::Integer(n as i64))
}

fn keys(value: Value) -> Result<Value, RuntimeError> {
    match value {
        Value::Object(map) => {
            let keys = map.borrow().keys().cloned().map(Value::Str).collect();
            Ok(Value::Array(Rc::new(RefCell::new(keys))))
        }
        other => Err(RuntimeError::TypeMismatch(format!("keys() expects an object, found {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn array(values: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(values)))
    }

    #[test]
    fn head_and_tail_split_an_array() {
        let xs = array(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        assert_eq!(call("head", vec![xs.clone()]).unwrap(), Value::Integer(1));
        assert_eq!(call("tail", vec![xs]).unwrap(), array(vec![Value::Integer(2), Value::Integer(3)]));
    }

    #[test]
    fn head_and_tail_on_an_empty_array_are_total() {
        assert_eq!(call("head", vec![array(vec![])]).unwrap(), Value::Null);
        assert_eq!(call("tail", vec![array(vec![])]).unwrap(), array(vec![]));
    }

    #[test]
    fn length_supports_strings_arrays_and_objects() {
        assert_eq!(call("length", vec![Value::Str("abc".to_string())]).unwrap(), Value::Integer(3));
        assert_eq!(
            call("length", vec![array(vec![Value::Null, Value::Null])]).unwrap(),
            Value::Integer(2)
        );
    }

    #[test]
    fn keys_preserves_insertion_order() {
        let mut map = IndexMap::new();
        map.insert("b".to_string(), Value::Integer(1));
        map.insert("a".to_string(), Value::Integer(2));
        let object = Value::Object(Rc::new(RefCell::new(map)));
        assert_eq!(
            call("keys", vec![object]).unwrap(),
            array(vec![Value::Str("b".to_string()), Value::Str("a".to_string())])
        );
    }

    #[test]
    fn wrong_arity_is_rejected() {
        assert!(call("length", vec![]).is_err());
        assert!(call("length", vec![Value::Null, Value::Null]).is_err());
    }
}
