mod environment;

pub use environment::{EnvRef, Environment};
