//! # Introduction
//!
//! `firc` is the front end of the Fir compiler. It turns UTF-8 source into a
//! located syntax tree, reporting every syntax error it finds rather than
//! stopping at the first one, and can write the tree back out as canonical
//! source.
//!
//! ## Pipeline
//!
//! ```text
//! Source bytes → Lexer → Parser → FileAst → Writer
//! ```
//!
//! 1. [`parser::lexer`]: produces tokens one at a time, tracking indentation
//!    and normalizing identifiers to NFKC (see [`parser::unicode`]).
//! 2. [`parser::parse`]: recursive descent over the token stream; errors go
//!    to a caller-supplied handler and parsing resumes on the next line.
//! 3. [`parser::ast`]: the tree. Text borrows the input buffer or a
//!    [`bumpalo::Bump`] arena owned by the caller.
//! 4. [`parser::writer`]: `Display` for every node.
//! 5. [`compiler`]: finds `.fir` files and parses them in parallel.
//!
//! ## Example
//!
//! ```
//! use bumpalo::Bump;
//! use firc::parser::parse_source;
//!
//! let arena = Bump::new();
//! let (file, errors) = parse_source("proc Foo():\n return\n", &arena);
//! assert!(errors.is_empty());
//! assert_eq!(file.to_string(), "proc Foo():\n    return\n");
//! ```

pub mod compiler;
pub mod parser;
