use crate::environment::EnvRef;
use crate::evaluator::{execute_program, RuntimeError, Value};
use crate::lexer::{tokenize, ScanError};
use crate::parser::{parse, ParseError};

#[derive(thiserror::Error, Debug, Clone)]
pub enum InterpreterError {
    #[error("{0}")]
    Scan(#[from] ScanError),
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Runtime(RuntimeError),
}

/// What running a chunk of source produced, distinguishing a normal finish from a program that
/// hit `exit` — the only two outcomes a driver needs to branch on.
pub enum Outcome {
    Completed,
    Exited(Value),
}

/// Scan, parse, and evaluate one chunk of source against a live environment. The environment is
/// threaded in by the caller so a REPL can persist bindings across successive calls.
pub fn run(source: &str, env: &EnvRef) -> Result<Outcome, InterpreterError> {
    log::debug!("scanning {} byte(s) of source", source.len());
    let tokens = tokenize(source)?;
    log::debug!("produced {} token(s)", tokens.len());
    let program = parse(tokens)?;
    log::debug!("parsed {} top-level statement(s)", program.statements.len());
    match execute_program(&program, env) {
        Ok(_) => Ok(Outcome::Completed),
        Err(RuntimeError::Exit(value)) => Ok(Outcome::Exited(value)),
        Err(err) => Err(InterpreterError::Runtime(err)),
    }
}
