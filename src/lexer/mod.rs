mod lexer;

pub use lexer::{tokenize, Literal, Scanner, ScanError, Token, TokenTag};
