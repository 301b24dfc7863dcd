mod builtins;
mod evaluator;

pub use evaluator::{
    display_value, execute_program, is_truthy, FunctionValue, RuntimeError, Signal, Value,
};
