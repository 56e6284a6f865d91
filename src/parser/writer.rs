//! Source writer
//!
//! Regenerates Fir source from a tree. The output is canonical rather than
//! byte-identical: four spaces per level, one space around operators and
//! `=`, no redundant parentheses, and consecutive declaration clauses that
//! share a type merged into one clause. Writing a tree, reparsing the
//! result and writing again yields the same text.

use std::fmt::{self, Write};

use crate::parser::ast::*;

const INDENT: &str = "    ";

impl fmt::Display for Name<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

impl fmt::Display for DottedName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                f.write_char('.')?;
            }
            write!(f, "{name}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            f.write_str("optional ")?;
        }
        f.write_str(&self.segments.join("."))
    }
}

impl fmt::Display for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Bool { value, .. } => write!(f, "{value}"),
            Expr::Int { value, .. } => write!(f, "{value}"),
            Expr::Nil { .. } => f.write_str("nil"),
            Expr::Name(name) => write!(f, "{name}"),
            Expr::Dot {
                receiver, member, ..
            } => match receiver.as_ref() {
                // "1.x" would read as a decimal point
                Expr::Int { value, .. } => write!(f, "{value} .{member}"),
                Expr::Binary { .. } => write!(f, "({receiver}).{member}"),
                _ => write!(f, "{receiver}.{member}"),
            },
            Expr::Binary {
                op, left, right, ..
            } => {
                let precedence = op.precedence();
                write_operand(f, left, left.precedence() < precedence)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, right, right.precedence() <= precedence)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr<'_>, wrap: bool) -> fmt::Result {
    if wrap && expr.precedence() >= 0 {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

impl fmt::Display for VarDecl<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.names.iter().collect();
        write_clause(f, &names, &self.type_ref, self.value.as_ref())
    }
}

fn write_clause(
    f: &mut impl Write,
    names: &[&Name<'_>],
    type_ref: &TypeRef<'_>,
    value: Option<&Expr<'_>>,
) -> fmt::Result {
    for (i, name) in names.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{name}")?;
    }
    if type_ref.is_specified() {
        write!(f, ": {type_ref}")?;
    }
    if let Some(value) = value {
        write!(f, " = {value}")?;
    }
    Ok(())
}

/// Write `;`-separated clauses, merging neighbours with the same type and no
/// initializer into one comma-joined clause.
fn write_decls(f: &mut impl Write, decls: &[VarDecl<'_>]) -> fmt::Result {
    let mut groups: Vec<(Vec<&Name<'_>>, &TypeRef<'_>, Option<&Expr<'_>>)> = Vec::new();
    for decl in decls {
        if let Some((names, type_ref, None)) = groups.last_mut() {
            if decl.value.is_none() && type_ref.same_type(&decl.type_ref) {
                names.extend(&decl.names);
                continue;
            }
        }
        groups.push((
            decl.names.iter().collect(),
            &decl.type_ref,
            decl.value.as_ref(),
        ));
    }

    for (i, (names, type_ref, value)) in groups.iter().enumerate() {
        if i > 0 {
            f.write_str("; ")?;
        }
        write_clause(f, names, type_ref, *value)?;
    }
    Ok(())
}

fn write_comment(f: &mut impl Write, comment: Option<&str>) -> fmt::Result {
    match comment {
        Some("") => f.write_str("  #"),
        Some(text) => write!(f, "  # {text}"),
        None => Ok(()),
    }
}

impl Statement<'_> {
    /// Write this statement at `level` levels of indentation.
    pub fn write(&self, f: &mut impl Write, level: usize) -> fmt::Result {
        let indent = INDENT.repeat(level);
        match self {
            Statement::Empty { comment, .. } => match comment {
                Some("") => writeln!(f, "{indent}#"),
                Some(text) => writeln!(f, "{indent}# {text}"),
                None => writeln!(f),
            },
            Statement::Return { value, comment, .. } => {
                write!(f, "{indent}return")?;
                if let Some(value) = value {
                    write!(f, " {value}")?;
                }
                write_comment(f, *comment)?;
                writeln!(f)
            }
            Statement::Const { decls, comment, .. } => {
                write!(f, "{indent}const ")?;
                write_decls(f, decls)?;
                write_comment(f, *comment)?;
                writeln!(f)
            }
            Statement::Var { decls, comment, .. } => {
                write!(f, "{indent}var ")?;
                write_decls(f, decls)?;
                write_comment(f, *comment)?;
                writeln!(f)
            }
            Statement::Import {
                imports, comment, ..
            } => {
                write!(f, "{indent}import ")?;
                for (i, import) in imports.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", import.path)?;
                }
                write_comment(f, *comment)?;
                writeln!(f)
            }
            Statement::Module { name, comment, .. } => {
                write!(f, "{indent}module {name}")?;
                write_comment(f, *comment)?;
                writeln!(f)
            }
            Statement::Procedure(proc) => proc.write(f, level),
        }
    }
}

impl Procedure<'_> {
    pub fn write(&self, f: &mut impl Write, level: usize) -> fmt::Result {
        write!(f, "{}proc {}(", INDENT.repeat(level), self.name)?;
        write_decls(f, &self.params)?;
        f.write_str("):")?;
        if self.result.is_specified() {
            write!(f, " {}", self.result)?;
        }
        write_comment(f, self.comment)?;
        writeln!(f)?;
        for stmt in &self.body {
            stmt.write(f, level + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Statement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, 0)
    }
}

impl fmt::Display for FileAst<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.body {
            stmt.write(f, 0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse::{parse_expr, parse_source};
    use bumpalo::Bump;

    fn format(source: &str) -> String {
        let arena = Bump::new();
        let (file, errors) = parse_source(source, &arena);
        assert!(errors.is_empty(), "{errors:?}");
        file.to_string()
    }

    fn format_expr(source: &str) -> String {
        let arena = Bump::new();
        parse_expr(source, &arena, |message: &str, _| panic!("{message}"))
            .map(|expr| expr.to_string())
            .unwrap_or_default()
    }

    #[test]
    fn test_procedure_layout() {
        assert_eq!(
            format("proc Foo():\n return\n"),
            "proc Foo():\n    return\n"
        );
        assert_eq!(
            format("proc F(x:Int=-1; y:Int=7):\n return\n"),
            "proc F(x: Int = -1; y: Int = 7):\n    return\n"
        );
    }

    #[test]
    fn test_nested_procedure_layout() {
        assert_eq!(
            format("proc A(): Int  #outer\n  proc B():\n      return   nil\n  return 1\n"),
            "proc A(): Int  # outer\n    proc B():\n        return nil\n    return 1\n"
        );
    }

    #[test]
    fn test_declarations_coalesce() {
        assert_eq!(format("var i, j: Int; k: Int\n"), "var i, j, k: Int\n");
        assert_eq!(format("var a; b\n"), "var a, b\n");
        assert_eq!(format("var a: Int; b: Str\n"), "var a: Int; b: Str\n");
        assert_eq!(format("var a = 1; b = 1\n"), "var a = 1; b = 1\n");
        assert_eq!(
            format("var a: Int; b: Int = 2\n"),
            "var a: Int; b: Int = 2\n"
        );
        assert_eq!(
            format("proc F(a: T; b: T; c: optional T):\n return\n"),
            "proc F(a, b: T; c: optional T):\n    return\n"
        );
    }

    #[test]
    fn test_const_and_comments() {
        assert_eq!(
            format("const a=1;b : x.Y=a*2 # two\n#\n"),
            "const a = 1; b: x.Y = a * 2  # two\n#\n"
        );
    }

    #[test]
    fn test_imports_and_module() {
        assert_eq!(
            format("module  app.main\nimport std.io,net\n"),
            "module app.main\nimport std.io, net\n"
        );
    }

    #[test]
    fn test_expression_parentheses() {
        assert_eq!(format_expr("1 + 2 * 3"), "1 + 2 * 3");
        assert_eq!(format_expr("(1 + 2) * 3"), "(1 + 2) * 3");
        assert_eq!(format_expr("(1 * 2) + 3"), "1 * 2 + 3");
        assert_eq!(format_expr("((a))"), "a");
        assert_eq!(format_expr("a - (b - c)"), "a - (b - c)");
        assert_eq!(format_expr("(a - b) - c"), "a - b - c");
        assert_eq!(format_expr("a % (b * c)"), "a % (b * c)");
    }

    #[test]
    fn test_dot_spacing() {
        assert_eq!(format_expr("1 .foo"), "1 .foo");
        assert_eq!(format_expr("1.foo"), "1 .foo");
        assert_eq!(format_expr("a.b.c"), "a.b.c");
        assert_eq!(format_expr("(a + b).c"), "(a + b).c");
        assert_eq!(format_expr("(x).y"), "x.y");
    }
}
