//! Statement parsing implementation
//!
//! This module handles the top level of a file and the statements inside
//! procedure bodies:
//!
//! - Declarations: `const a = 1; b = 2`, `var i, j: Int`
//! - Procedures (at any depth)
//! - `return [expression]`
//! - Comment-only lines
//! - `import` and `module` lines (top level only)
//!
//! # Grammar
//!
//! ```text
//! file       ::= (top_level | NEWLINE)*
//! top_level  ::= const_stmt | var_stmt | procedure | comment_line
//!              | import_stmt | module_stmt
//! statement  ::= const_stmt | var_stmt | procedure | return_stmt | comment_line
//! const_stmt ::= "const" var_decl (";" var_decl)* line_end
//! var_stmt   ::= "var" var_decl (";" var_decl)* line_end
//! return_stmt ::= "return" [expression] line_end
//! module_stmt ::= "module" dotted_name line_end
//! line_end   ::= [COMMENT] NEWLINE
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::declarations::DeclContext;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::Parser;

impl<'a, E> Parser<'a, E>
where
    E: FnMut(&str, SourceLocation),
{
    /// Parse the whole file (top-level statements)
    pub fn parse_file_body(&mut self) -> Vec<Statement<'a>> {
        let mut body = Vec::new();

        loop {
            let depth = self.depth;
            let token = self.current();
            let parsed = match token.kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance();
                    continue;
                }
                TokenKind::IndentMismatch => {
                    self.error_expected(&TokenKind::Unindent.expectation());
                    self.advance();
                    self.skip_line(self.depth);
                    continue;
                }
                TokenKind::Comment
                | TokenKind::Const
                | TokenKind::Var
                | TokenKind::Proc
                | TokenKind::Import => self.parse_statement_at_top(),
                TokenKind::Identifier
                    if token.text == "module" && self.peek().kind == TokenKind::Identifier =>
                {
                    self.parse_module()
                }
                _ => {
                    self.error_at(token.location, "Expected const, proc, var, or comment");
                    None
                }
            };

            match parsed {
                Some(stmt) => body.push(stmt),
                None => self.skip_line(depth),
            }

            // Stray un-indentation at the top level
            if self.depth == depth && self.check(TokenKind::Unindent) {
                self.advance();
            }
        }

        body
    }

    fn parse_statement_at_top(&mut self) -> Option<Statement<'a>> {
        if self.check(TokenKind::Import) {
            let location = self.advance().location;
            let imports = self.parse_imports()?;
            let comment = self.finish_line()?;
            return Some(Statement::Import {
                imports,
                comment,
                location,
            });
        }
        self.parse_statement()
    }

    /// `module a.b`; `module` is not reserved, so it is recognized only
    /// when another identifier follows it.
    fn parse_module(&mut self) -> Option<Statement<'a>> {
        let location = self.advance().location;
        let name = self.parse_dotted_name()?;
        let comment = self.finish_line()?;
        Some(Statement::Module {
            name,
            comment,
            location,
        })
    }

    /// Parse an indented block; the current token is its INDENT.
    pub(crate) fn parse_block(&mut self) -> Vec<Statement<'a>> {
        let mut statements = Vec::new();
        self.advance();
        let depth = self.depth;

        loop {
            match self.current().kind {
                TokenKind::Eof => break,
                TokenKind::Unindent => {
                    self.advance();
                    break;
                }
                TokenKind::IndentMismatch => {
                    self.error_expected(&TokenKind::Unindent.expectation());
                    self.advance();
                    self.skip_line(self.depth);
                    // Only a mismatch at this block's own level closes it
                    if self.depth < depth {
                        break;
                    }
                }
                TokenKind::Newline => {
                    self.advance();
                }
                _ => match self.parse_statement() {
                    Some(stmt) => statements.push(stmt),
                    None => self.skip_line(depth),
                },
            }
        }

        statements
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Option<Statement<'a>> {
        let token = self.current();
        match token.kind {
            TokenKind::Const => {
                self.advance();
                let decls = self.parse_decl_list(DeclContext::Const)?;
                let comment = self.finish_line()?;
                Some(Statement::Const {
                    decls,
                    comment,
                    location: token.location,
                })
            }
            TokenKind::Var => {
                self.advance();
                let decls = self.parse_decl_list(DeclContext::Var)?;
                let comment = self.finish_line()?;
                Some(Statement::Var {
                    decls,
                    comment,
                    location: token.location,
                })
            }
            TokenKind::Proc => {
                let procedure = self.parse_procedure()?;
                Some(Statement::Procedure(Box::new(procedure)))
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.current().kind.starts_expression() {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                let comment = self.finish_line()?;
                Some(Statement::Return {
                    value,
                    comment,
                    location: token.location,
                })
            }
            TokenKind::Comment => {
                self.advance();
                self.expect_line_end()?;
                Some(Statement::Empty {
                    comment: Some(token.text),
                    location: token.location,
                })
            }
            _ => {
                self.error_at(token.location, "Expected a statement");
                None
            }
        }
    }

    /// `;`-separated declaration clauses
    fn parse_decl_list(&mut self, context: DeclContext) -> Option<Vec<VarDecl<'a>>> {
        let mut decls = vec![self.parse_var_decl(context)?];
        while self.match_token(TokenKind::Semicolon) {
            decls.push(self.parse_var_decl(context)?);
        }
        Some(decls)
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::{parse_source, ParseError};
    use bumpalo::Bump;

    fn messages(errors: &[ParseError]) -> Vec<(&str, usize, usize)> {
        errors
            .iter()
            .map(|e| (e.message.as_str(), e.location.line, e.location.column))
            .collect()
    }

    #[test]
    fn test_comment_lines_become_empty_statements() {
        let arena = Bump::new();
        let (file, errors) = parse_source("# header\n\nvar x  # trailing\n", &arena);

        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(file.body.len(), 2);
        assert!(matches!(
            file.body[0],
            Statement::Empty {
                comment: Some("header"),
                ..
            }
        ));
        assert!(matches!(
            file.body[1],
            Statement::Var {
                comment: Some("trailing"),
                ..
            }
        ));
    }

    #[test]
    fn test_const_and_var_clauses() {
        let arena = Bump::new();
        let (file, errors) = parse_source("const a = 1; b: Int = 2\nvar i, j: Int; k\n", &arena);

        assert!(errors.is_empty(), "{errors:?}");
        match (&file.body[0], &file.body[1]) {
            (Statement::Const { decls: consts, .. }, Statement::Var { decls: vars, .. }) => {
                assert_eq!(consts.len(), 2);
                assert_eq!(vars.len(), 2);
                assert_eq!(vars[0].names.len(), 2);
                assert!(!vars[1].type_ref.is_specified());
            }
            other => panic!("Unexpected statements {other:?}"),
        }
    }

    #[test]
    fn test_module_line() {
        let arena = Bump::new();
        let (file, errors) = parse_source("module app.main\nvar module\n", &arena);

        assert!(errors.is_empty(), "{errors:?}");
        match &file.body[0] {
            Statement::Module { name, .. } => {
                let parts: Vec<_> = name.names.iter().map(|n| n.text).collect();
                assert_eq!(parts, vec!["app", "main"]);
            }
            other => panic!("Expected module, got {other:?}"),
        }
        assert!(matches!(file.body[1], Statement::Var { .. }));
    }

    #[test]
    fn test_bad_top_level_line_keeps_later_diagnostics() {
        let arena = Bump::new();
        let (file, errors) = parse_source("x = 1\nconst i\n", &arena);

        assert_eq!(
            messages(&errors),
            vec![
                ("Expected const, proc, var, or comment", 1, 1),
                ("Constant “i” must have a value", 2, 7),
            ]
        );
        assert_eq!(file.body.len(), 1);
    }

    #[test]
    fn test_bad_top_level_line_skips_its_block() {
        let arena = Bump::new();
        let (file, errors) = parse_source("oops:\n    return\n    return\nvar ok\n", &arena);

        assert_eq!(
            messages(&errors),
            vec![("Expected const, proc, var, or comment", 1, 1)]
        );
        assert_eq!(file.body.len(), 1);
        assert!(matches!(file.body[0], Statement::Var { .. }));
    }

    #[test]
    fn test_bad_statement_recovers_inside_block() {
        let arena = Bump::new();
        let (file, errors) =
            parse_source("proc P():\n    12\n    return 3 3\n    return\n", &arena);

        assert_eq!(
            messages(&errors),
            vec![
                ("Expected a statement", 2, 5),
                ("Expected end of line, found ‘3’", 3, 14),
            ]
        );
        match &file.body[0] {
            Statement::Procedure(proc) => assert_eq!(proc.body.len(), 1),
            other => panic!("Expected procedure, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_final_newline() {
        let arena = Bump::new();
        let (file, errors) = parse_source("proc P():\n    return 1", &arena);

        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(file.procedures().count(), 1);
    }

    #[test]
    fn test_indent_mismatch_in_body() {
        let arena = Bump::new();
        let (file, errors) = parse_source(
            "proc P():\n    proc Q():\n        return\n  var x\nvar y\n",
            &arena,
        );

        assert_eq!(
            messages(&errors),
            vec![(
                "Expected un-indentation, found mismatched indentation",
                4,
                3
            )]
        );
        assert_eq!(file.body.len(), 2);
        assert!(matches!(file.body[1], Statement::Var { .. }));
    }

    #[test]
    fn test_unexpected_character_is_reported() {
        let arena = Bump::new();
        let (_, errors) = parse_source("var x = §\n", &arena);

        assert_eq!(
            messages(&errors),
            vec![("Expected an expression, found ‘§’", 1, 9)]
        );
    }
}
