//! Declaration parsing implementation
//!
//! This module handles procedures and the pieces shared by `var`, `const`
//! and parameter lists.
//!
//! # Grammar
//!
//! ```text
//! procedure  ::= "proc" IDENTIFIER "(" [var_decl (";" var_decl)*] ")" ":"
//!                [type_ref] [COMMENT] NEWLINE INDENT statement* UNINDENT
//! var_decl   ::= IDENTIFIER ("," IDENTIFIER)* [":" type_ref] ["=" expression]
//! type_ref   ::= ["optional"] dotted_name
//! dotted_name ::= IDENTIFIER ("." IDENTIFIER)*
//! import     ::= "import" dotted_name ("," dotted_name)*
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::Parser;

/// Where a declaration clause appears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclContext {
    Parameter,
    Var,
    Const,
}

impl<'a, E> Parser<'a, E>
where
    E: FnMut(&str, SourceLocation),
{
    /// Parse `proc Name(params): Result` and its indented body
    pub(crate) fn parse_procedure(&mut self) -> Option<Procedure<'a>> {
        let location = self.current_location();
        self.expect_token(TokenKind::Proc)?;
        let name = self.expect_name()?;

        self.expect_token(TokenKind::LeftParen)?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(self.parse_var_decl(DeclContext::Parameter)?);
                if !self.match_token(TokenKind::Semicolon) {
                    break;
                }
            }
        }
        self.expect_token(TokenKind::RightParen)?;
        self.expect_token(TokenKind::Colon)?;

        let result = if matches!(
            self.current().kind,
            TokenKind::Identifier | TokenKind::Optional
        ) {
            self.parse_type_ref()?
        } else {
            TypeRef::unspecified()
        };
        let comment = self.finish_line()?;

        let mut procedure = Procedure {
            name,
            params,
            result,
            comment,
            body: Vec::new(),
            location,
        };

        // A missing body is reported but the header is kept, so the next
        // line is parsed on its own.
        if self.check(TokenKind::Indent) {
            procedure.body = self.parse_block();
        } else {
            self.error_expected(&TokenKind::Indent.expectation());
        }
        Some(procedure)
    }

    /// Parse one clause: `a, b: T = value`
    pub(crate) fn parse_var_decl(&mut self, context: DeclContext) -> Option<VarDecl<'a>> {
        let first = self.expect_name()?;
        let mut names = vec![first];

        while self.check(TokenKind::Comma) {
            let comma = self.advance();
            if context == DeclContext::Const {
                self.error_at(
                    comma.location,
                    "Constants must be separated by ‘;’, not ‘,’",
                );
            }
            names.push(self.expect_name()?);
        }

        let type_ref = if self.match_token(TokenKind::Colon) {
            self.parse_type_ref()?
        } else {
            TypeRef::unspecified()
        };

        let value = if self.match_token(TokenKind::Equal) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        if context == DeclContext::Const && names.len() == 1 && value.is_none() {
            self.error_at(
                first.location,
                &format!("Constant “{}” must have a value", first.text),
            );
        }

        Some(VarDecl {
            names,
            type_ref,
            value,
            location: first.location,
        })
    }

    /// Parse `[optional] a.b.c`
    pub(crate) fn parse_type_ref(&mut self) -> Option<TypeRef<'a>> {
        let location = self.current_location();
        let optional = self.match_token(TokenKind::Optional);
        let path = self.parse_dotted_name()?;
        Some(TypeRef {
            optional,
            segments: path.names.iter().map(|name| name.text).collect(),
            location,
        })
    }

    pub(crate) fn parse_dotted_name(&mut self) -> Option<DottedName<'a>> {
        let mut names = vec![self.expect_name()?];
        while self.match_token(TokenKind::Dot) {
            names.push(self.expect_name()?);
        }
        Some(DottedName { names })
    }

    /// Parse the paths of an `import` line (after the keyword)
    pub(crate) fn parse_imports(&mut self) -> Option<Vec<ImportDecl<'a>>> {
        let mut imports = Vec::new();
        loop {
            let path = self.parse_dotted_name()?;
            imports.push(ImportDecl {
                location: path.location(),
                path,
            });
            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }
        Some(imports)
    }
}
