use std::io::{self, Write};

use anyhow::Context;
use clap::Parser as ClapParser;

use crate::environment::Environment;
use crate::interpreter::{self, Outcome};

#[derive(ClapParser, Debug)]
#[command(name = "pebble", about = "Scan, parse, and evaluate pebble source")]
pub struct Cli {
    /// Script to run; omit to start an interactive prompt
    pub script: Option<String>,
}

pub fn run_file(path: &str) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(path).with_context(|| format!("could not read '{path}'"))?;
    let env = Environment::new_global();
    match interpreter::run(&source, &env) {
        Ok(Outcome::Completed) => Ok(()),
        Ok(Outcome::Exited(_)) => std::process::exit(0),
        Err(err) => {
            println!("Error: {err}");
            std::process::exit(70);
        }
    }
}

pub fn run_prompt() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let env = Environment::new_global();

    loop {
        print!(">> ");
        stdout.flush().unwrap();

        let mut line = String::new();
        let bytes_read = stdin.read_line(&mut line).unwrap();
        if bytes_read == 0 {
            break; // EOF or Control-D
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "exit" || trimmed == "quit" {
            break;
        }

        match interpreter::run(&line, &env) {
            Ok(Outcome::Completed) => {}
            Ok(Outcome::Exited(_)) => std::process::exit(0),
            Err(err) => println!("Error: {err}"),
        }
    }
}

pub fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.script {
        Some(path) => run_file(&path),
        None => {
            run_prompt();
            Ok(())
        }
    }
}
