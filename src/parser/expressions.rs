//! Expression parsing implementation
//!
//! Primaries are handled by recursive descent; binary operators by
//! precedence climbing.
//!
//! # Grammar
//!
//! ```text
//! expression ::= primary (binop primary)*
//! primary    ::= atom ("." IDENTIFIER)*
//! atom       ::= "(" expression ")" | IDENTIFIER | INTEGER | "nil"
//! binop      ::= "+" | "-"              (precedence 20)
//!              | "*" | "/" | "%"        (precedence 40)
//! ```
//!
//! The identifiers `true` and `false` parse as boolean literals.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use num_bigint::BigInt;

use crate::parser::ast::*;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::Parser;

impl TokenKind {
    /// Binary operator spelled by this token, if any
    pub fn binary_op(self) -> Option<BinOp> {
        match self {
            TokenKind::Plus => Some(BinOp::Add),
            TokenKind::Minus => Some(BinOp::Sub),
            TokenKind::Asterisk => Some(BinOp::Mul),
            TokenKind::Slash => Some(BinOp::Div),
            TokenKind::Percent => Some(BinOp::Mod),
            _ => None,
        }
    }

    pub fn precedence(self) -> i32 {
        self.binary_op().map_or(NO_PRECEDENCE, BinOp::precedence)
    }

    /// Whether an expression can begin with this token
    pub fn starts_expression(self) -> bool {
        matches!(
            self,
            TokenKind::LeftParen | TokenKind::Identifier | TokenKind::Integer | TokenKind::Nil
        )
    }
}

impl<'a, E> Parser<'a, E>
where
    E: FnMut(&str, SourceLocation),
{
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Option<Expr<'a>> {
        let lhs = self.parse_primary()?;
        self.parse_binary_rhs(0, lhs)
    }

    /// Fold operators binding at least as tightly as `min_precedence` onto `lhs`
    fn parse_binary_rhs(&mut self, min_precedence: i32, mut lhs: Expr<'a>) -> Option<Expr<'a>> {
        while let Some(op) = self.current().kind.binary_op() {
            if op.precedence() < min_precedence {
                break;
            }
            let location = self.advance().location;
            let mut rhs = self.parse_primary()?;

            if op.precedence() < self.current().kind.precedence() {
                rhs = self.parse_binary_rhs(op.precedence() + 1, rhs)?;
            }

            lhs = Expr::Binary {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                location,
            };
        }
        Some(lhs)
    }

    /// Parse an atom and any `.member` suffixes
    fn parse_primary(&mut self) -> Option<Expr<'a>> {
        let mut expr = self.parse_atom()?;
        while self.check(TokenKind::Dot) {
            let location = self.advance().location;
            let member = self.expect_name()?;
            expr = Expr::Dot {
                receiver: Box::new(expr),
                member,
                location,
            };
        }
        Some(expr)
    }

    fn parse_atom(&mut self) -> Option<Expr<'a>> {
        let token = self.current();
        match token.kind {
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_token(TokenKind::RightParen)?;
                Some(expr)
            }
            TokenKind::Identifier => {
                self.advance();
                let location = token.location;
                Some(match token.text {
                    "true" => Expr::Bool {
                        value: true,
                        location,
                    },
                    "false" => Expr::Bool {
                        value: false,
                        location,
                    },
                    text => Expr::Name(Name::new(text, location)),
                })
            }
            TokenKind::Integer => {
                // The lexer only produces an optional sign and digits
                let Ok(value) = token.text.trim_start_matches('+').parse::<BigInt>() else {
                    self.error_at(token.location, &format!("Invalid integer ‘{}’", token.text));
                    return None;
                };
                self.advance();
                Some(Expr::Int {
                    value,
                    location: token.location,
                })
            }
            TokenKind::Nil => {
                self.advance();
                Some(Expr::Nil {
                    location: token.location,
                })
            }
            _ => {
                self.error_expected("an expression");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::parse_expr;
    use bumpalo::Bump;

    fn parse_ok<'a>(source: &'a str, arena: &'a Bump) -> Expr<'a> {
        let mut errors = Vec::new();
        let expr = parse_expr(source, arena, |message: &str, _| {
            errors.push(message.to_string())
        });
        assert!(errors.is_empty(), "{errors:?}");
        expr.expect("expression")
    }

    fn int(expr: &Expr<'_>) -> i64 {
        match expr {
            Expr::Int { value, .. } => value.to_string().parse().unwrap(),
            other => panic!("Expected integer, got {other:?}"),
        }
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        let arena = Bump::new();
        match parse_ok("1 + 2 * 3", &arena) {
            Expr::Binary {
                op, left, right, ..
            } => {
                assert_eq!(op, BinOp::Add);
                assert_eq!(int(&left), 1);
                assert!(matches!(*right, Expr::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("Expected binary, got {other:?}"),
        }
    }

    #[test]
    fn test_equal_precedence_is_left_associative() {
        let arena = Bump::new();
        match parse_ok("8 - 4 - 2", &arena) {
            Expr::Binary {
                op, left, right, ..
            } => {
                assert_eq!(op, BinOp::Sub);
                assert!(matches!(*left, Expr::Binary { op: BinOp::Sub, .. }));
                assert_eq!(int(&right), 2);
            }
            other => panic!("Expected binary, got {other:?}"),
        }
    }

    #[test]
    fn test_tighter_suffix_after_lower_operator() {
        let arena = Bump::new();
        // (1 + (2 * 3)) - 4
        match parse_ok("1 + 2 * 3 - 4", &arena) {
            Expr::Binary { op, left, .. } => {
                assert_eq!(op, BinOp::Sub);
                match *left {
                    Expr::Binary { op, right, .. } => {
                        assert_eq!(op, BinOp::Add);
                        assert_eq!(right.precedence(), 40);
                    }
                    other => panic!("Expected binary, got {other:?}"),
                }
            }
            other => panic!("Expected binary, got {other:?}"),
        }
    }

    #[test]
    fn test_parentheses_group() {
        let arena = Bump::new();
        let expr = parse_ok("(1 + 2) * 3", &arena);
        assert_eq!(expr.precedence(), 40);
        match expr {
            Expr::Binary { left, .. } => assert_eq!(left.precedence(), 20),
            other => panic!("Expected binary, got {other:?}"),
        }
    }

    #[test]
    fn test_literals() {
        let arena = Bump::new();
        assert!(matches!(parse_ok("nil", &arena), Expr::Nil { .. }));
        assert!(matches!(
            parse_ok("true", &arena),
            Expr::Bool { value: true, .. }
        ));
        assert!(matches!(
            parse_ok("false", &arena),
            Expr::Bool { value: false, .. }
        ));
        assert_eq!(int(&parse_ok("-42", &arena)), -42);
        assert_eq!(int(&parse_ok("+7", &arena)), 7);
        assert!(matches!(
            parse_ok("x", &arena),
            Expr::Name(Name { text: "x", .. })
        ));
    }

    #[test]
    fn test_big_integer() {
        let arena = Bump::new();
        match parse_ok("123456789012345678901234567890", &arena) {
            Expr::Int { value, .. } => {
                assert_eq!(value.to_string(), "123456789012345678901234567890")
            }
            other => panic!("Expected integer, got {other:?}"),
        }
    }

    #[test]
    fn test_dot_chain() {
        let arena = Bump::new();
        match parse_ok("a.b.c", &arena) {
            Expr::Dot {
                receiver, member, ..
            } => {
                assert_eq!(member.text, "c");
                assert!(matches!(
                    *receiver,
                    Expr::Dot {
                        member: Name { text: "b", .. },
                        ..
                    }
                ));
            }
            other => panic!("Expected dot, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_operand() {
        let arena = Bump::new();
        let mut errors = Vec::new();
        let expr = parse_expr("1 +", &arena, |message: &str, location| {
            errors.push((message.to_string(), location.column))
        });
        assert!(expr.is_none());
        assert_eq!(
            errors,
            vec![("Expected an expression, found end of file".to_string(), 4)]
        );
    }

    #[test]
    fn test_unclosed_parenthesis() {
        let arena = Bump::new();
        let mut errors = Vec::new();
        let expr = parse_expr("(a * b\n", &arena, |message: &str, _| {
            errors.push(message.to_string())
        });
        assert!(expr.is_none());
        assert_eq!(errors, vec!["Expected ‘)’, found end of line".to_string()]);
    }
}
