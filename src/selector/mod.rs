//! Selection expressions.
//!
//! Subscriptions filter messages with small boolean/arithmetic predicates over
//! message properties (`exists(a.b) && x >= -42`). This module turns the
//! expression text into tokens for the predicate parser.

pub mod lexer;
pub mod token;

pub use lexer::{tokenize, Lexer};
pub use token::{Position, Token, TokenKind};
