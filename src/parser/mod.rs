//! Fir source code parser
//!
//! This module transforms Fir source bytes into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (bytes → tokens, including INDENT/UNINDENT)
//! - [`unicode`]: NFKC normalization of identifiers
//! - [`parse`]: Parsing (tokens → AST), error reporting and recovery
//! - [`ast`]: AST node definitions
//! - [`writer`]: AST → canonical source text
//!
//! # Language
//!
//! Blocks are introduced by `:` at the end of a line and continue while the
//! following lines stay indented. Top-level lines are `const`, `var`, `proc`,
//! `import`, `module` or comments; procedure bodies hold declarations,
//! nested procedures and `return`. Expressions have integer, boolean and
//! `nil` literals, names, `.member` access and the arithmetic operators.
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary operators.
//! No external parser generator dependencies.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;
pub mod unicode;
pub mod writer;

pub use parse::{parse_expr, parse_file, parse_source, ParseError, Parser};
