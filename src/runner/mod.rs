mod runner;

pub use runner::{main, run_file, run_prompt, Cli};
