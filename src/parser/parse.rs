//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure:
//! the token window, expectation helpers, error reporting and recovery, and
//! the public entry points.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: procedures, declaration clauses, types, imports
//! - `statements`: top-level and block statements
//! - `expressions`: expressions with precedence climbing
//!
//! # Errors
//!
//! Parsing never stops at the first error. Each grammar deviation is passed
//! to the caller's error handler with the location of the offending token,
//! then the parser skips the rest of the broken line (and any block indented
//! under it) and carries on. Grammar methods return `None` after they have
//! reported; callers only decide where to resume.

use bumpalo::Bump;
use thiserror::Error;

use crate::parser::ast::*;
use crate::parser::lexer::{Lexer, Lookahead, Token, TokenKind};

/// A diagnostic collected by [`parse_source`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at line {}, column {}: {message}", .location.line, .location.column)]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

/// Recursive descent parser for Fir
pub struct Parser<'a, E>
where
    E: FnMut(&str, SourceLocation),
{
    pub(crate) lexer: Lexer<'a>,
    pub(crate) previous: TokenKind,
    /// Open indentation levels consumed so far
    pub(crate) depth: usize,
    on_error: E,
    last_error: Option<SourceLocation>,
    error_count: usize,
}

/// Parse a whole file.
///
/// `filename` and `directory` are recorded on the result; all text in the
/// tree borrows `buffer` or `arena`. Errors go to `on_error` in source order
/// and the returned tree holds everything that could be parsed.
pub fn parse_file<'a>(
    filename: &'a str,
    directory: &'a str,
    buffer: &'a [u8],
    arena: &'a Bump,
    on_error: impl FnMut(&str, SourceLocation),
) -> FileAst<'a> {
    let mut parser = Parser::new(Lexer::new(buffer, arena), on_error);
    let mut file = FileAst::new(filename, directory, arena);
    file.body = parser.parse_file_body();
    file
}

/// Parse in-memory source, collecting diagnostics instead of reporting them.
pub fn parse_source<'a>(source: &'a str, arena: &'a Bump) -> (FileAst<'a>, Vec<ParseError>) {
    let mut errors = Vec::new();
    let file = parse_file("", "", source.as_bytes(), arena, |message, location| {
        errors.push(ParseError {
            message: message.to_string(),
            location,
        })
    });
    (file, errors)
}

/// Parse one expression occupying the whole of `source`.
pub fn parse_expr<'a>(
    source: &'a str,
    arena: &'a Bump,
    on_error: impl FnMut(&str, SourceLocation),
) -> Option<Expr<'a>> {
    let mut parser = Parser::new(Lexer::new(source.as_bytes(), arena), on_error);
    let expr = parser.parse_expression()?;
    parser.expect_line_end()?;
    Some(expr)
}

impl<'a, E> Parser<'a, E>
where
    E: FnMut(&str, SourceLocation),
{
    pub fn new(mut lexer: Lexer<'a>, on_error: E) -> Self {
        lexer.advance();
        Self {
            lexer,
            previous: TokenKind::Eof,
            depth: 0,
            on_error,
            last_error: None,
            error_count: 0,
        }
    }

    /// Number of diagnostics reported so far
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    // ===== Helper methods =====

    fn window(&self) -> Lookahead<'a> {
        self.lexer.window()
    }

    pub(crate) fn current(&self) -> Token<'a> {
        self.window().current
    }

    pub(crate) fn peek(&self) -> Token<'a> {
        self.window().next
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.window().current.kind == kind
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.window().current.location
    }

    /// Consume the current token, keeping `depth` in step with the
    /// indentation tokens that pass by.
    pub(crate) fn advance(&mut self) -> Token<'a> {
        let token = self.window().current;
        match token.kind {
            TokenKind::Eof => return token,
            TokenKind::Indent => self.depth += 1,
            TokenKind::Unindent | TokenKind::IndentMismatch => {
                self.depth = self.depth.saturating_sub(1)
            }
            _ => {}
        }
        self.previous = token.kind;
        self.lexer.advance();
        token
    }

    pub(crate) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Report an error unless one was already reported at `location`.
    pub(crate) fn error_at(&mut self, location: SourceLocation, message: &str) {
        if self.last_error == Some(location) {
            return;
        }
        self.last_error = Some(location);
        self.error_count += 1;
        (self.on_error)(message, location);
    }

    /// Report "Expected {what}, found {current token}" at the current token.
    pub(crate) fn error_expected(&mut self, what: &str) {
        let found = self.current();
        self.error_at(found.location, &format!("Expected {what}, found {found}"));
    }

    pub(crate) fn expect_token(&mut self, kind: TokenKind) -> Option<Token<'a>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            self.error_expected(&kind.expectation());
            None
        }
    }

    pub(crate) fn expect_name(&mut self) -> Option<Name<'a>> {
        let token = self.expect_token(TokenKind::Identifier)?;
        Some(Name::new(token.text, token.location))
    }

    /// Whether the current token ends a line.
    ///
    /// A file whose last line has no terminator ends with the synthetic
    /// unindents directly after the line's last token.
    pub(crate) fn at_line_end(&self) -> bool {
        match self.current().kind {
            TokenKind::Newline | TokenKind::Eof => true,
            TokenKind::Unindent => {
                !matches!(self.previous, TokenKind::Newline | TokenKind::Unindent)
            }
            _ => false,
        }
    }

    pub(crate) fn expect_line_end(&mut self) -> Option<()> {
        if !self.at_line_end() {
            self.error_expected(&TokenKind::Newline.expectation());
            return None;
        }
        self.match_token(TokenKind::Newline);
        Some(())
    }

    /// Optional trailing comment, then end of line
    pub(crate) fn finish_line(&mut self) -> Option<Option<&'a str>> {
        let comment = if self.check(TokenKind::Comment) {
            Some(self.advance().text)
        } else {
            None
        };
        self.expect_line_end()?;
        Some(comment)
    }

    // ===== Recovery =====

    /// Discard the rest of a broken line that started at indentation `depth`,
    /// together with any block indented beneath it.
    ///
    /// Stops in front of a mismatch that would close the last skipped level,
    /// so the caller can report that line too.
    pub(crate) fn skip_line(&mut self, depth: usize) {
        loop {
            match self.current().kind {
                TokenKind::Eof => return,
                TokenKind::Unindent if self.depth <= depth => return,
                TokenKind::IndentMismatch if self.depth <= depth + 1 => return,
                TokenKind::Newline if self.depth == depth => {
                    self.advance();
                    if !self.check(TokenKind::Indent) {
                        return;
                    }
                }
                TokenKind::Unindent => {
                    self.advance();
                    if self.depth == depth {
                        return;
                    }
                }
                TokenKind::IndentMismatch => {
                    self.error_expected(&TokenKind::Unindent.expectation());
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(source: &str) -> Vec<(String, usize, usize)> {
        let arena = Bump::new();
        let (_, errors) = parse_source(source, &arena);
        errors
            .into_iter()
            .map(|e| (e.message, e.location.line, e.location.column))
            .collect()
    }

    #[test]
    fn test_parse_simple_procedure() {
        let arena = Bump::new();
        let (file, errors) = parse_source("proc Foo():\n return\n", &arena);

        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(file.body.len(), 1);
        match &file.body[0] {
            Statement::Procedure(proc) => {
                assert_eq!(proc.name.text, "Foo");
                assert!(proc.params.is_empty());
                assert!(!proc.result.is_specified());
                assert!(matches!(
                    proc.body.as_slice(),
                    [Statement::Return { value: None, .. }]
                ));
            }
            other => panic!("Expected procedure, got {other:?}"),
        }
    }

    #[test]
    fn test_file_metadata() {
        let arena = Bump::new();
        let file = parse_file("main.fir", "src", b"var x\n", &arena, |_, _| {});
        assert_eq!(file.filename, "main.fir");
        assert_eq!(file.directory, "src");
        assert_eq!(file.body.len(), 1);
    }

    #[test]
    fn test_const_needs_value() {
        assert_eq!(
            errors("const i\n"),
            vec![("Constant “i” must have a value".to_string(), 1, 7)]
        );
    }

    #[test]
    fn test_statement_error_location() {
        assert_eq!(
            errors("proc P():\n    12\n"),
            vec![("Expected a statement".to_string(), 2, 5)]
        );
    }

    #[test]
    fn test_expected_token_message() {
        assert_eq!(
            errors("proc P(:\n    return\n"),
            vec![("Expected an identifier, found ‘:’".to_string(), 1, 8)]
        );
        assert_eq!(
            errors("proc P()\n    return\n"),
            vec![("Expected ‘:’, found end of line".to_string(), 1, 9)]
        );
    }

    #[test]
    fn test_handler_sees_errors_in_order() {
        let arena = Bump::new();
        let mut seen = Vec::new();
        parse_file(
            "f.fir",
            "",
            b"1\nconst a\nvar\n",
            &arena,
            |message, location| seen.push((message.to_string(), location.line)),
        );
        assert_eq!(
            seen,
            vec![
                ("Expected const, proc, var, or comment".to_string(), 1),
                ("Constant “a” must have a value".to_string(), 2),
                ("Expected an identifier, found end of line".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_mismatch_after_skipped_block_is_reported() {
        let arena = Bump::new();
        let (file, errors) = parse_source("var a\n    var b\n  var c\nvar d\n", &arena);
        assert_eq!(
            errors
                .iter()
                .map(|e| (e.message.as_str(), e.location.line, e.location.column))
                .collect::<Vec<_>>(),
            vec![
                ("Expected const, proc, var, or comment", 2, 5),
                (
                    "Expected un-indentation, found mismatched indentation",
                    3,
                    3
                ),
            ]
        );
        assert_eq!(file.to_string(), "var a\nvar d\n");
    }

    #[test]
    fn test_mismatch_deep_inside_skipped_block() {
        // Line 4 closes only the innermost of the skipped levels
        assert_eq!(
            errors("oops\n  a\n      b\n    c\nvar d\n"),
            vec![
                ("Expected const, proc, var, or comment".to_string(), 1, 1),
                (
                    "Expected un-indentation, found mismatched indentation".to_string(),
                    4,
                    5
                ),
            ]
        );
    }

    #[test]
    fn test_parser_error_count() {
        let arena = Bump::new();
        let mut parser = Parser::new(
            Lexer::new(b"x\ny\n", &arena),
            |_: &str, _: SourceLocation| {},
        );
        let body = parser.parse_file_body();
        assert!(body.is_empty());
        assert_eq!(parser.error_count(), 2);
    }

    #[test]
    fn test_parse_error_display() {
        let error = ParseError {
            message: "Expected a statement".to_string(),
            location: SourceLocation::new(2, 5),
        };
        assert_eq!(
            error.to_string(),
            "Parse error at line 2, column 5: Expected a statement"
        );
    }
}
