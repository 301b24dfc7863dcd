use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::evaluator::Value;

/*
Scoping here is dynamic, not lexical: a function's activation record is parented to the
*caller's* environment at call time, never to the environment where the function literal was
written. So `enclosing` simply points at whatever environment was live when this one was
created — there is no resolver pass and no notion of a captured closure.
*/
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

pub type EnvRef = Rc<RefCell<Environment>>;

impl Environment {
    pub fn new_global() -> EnvRef {
        Rc::new(RefCell::new(Environment { values: HashMap::new(), enclosing: None }))
    }

    /// A fresh frame parented on whatever environment is live at the call/entry site.
    pub fn new_child(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(Rc::clone(enclosing)),
        }))
    }

    pub fn define(&mut self, name: String, value: Value) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }
        self.enclosing.as_ref().and_then(|parent| parent.borrow().get(name))
    }
}
