mod interpreter;

pub use interpreter::{run, InterpreterError, Outcome};
