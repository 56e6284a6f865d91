// AST (Abstract Syntax Tree) definitions for Fir source files

use bumpalo::Bump;
use num_bigint::BigInt;

/// Source location information for error reporting
///
/// Line and column are 1-based; columns count code points. A location does
/// not name its file: one parse covers one file, whose name is kept on
/// [`FileAst::filename`], and the lexer is therefore built from the buffer
/// alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Identifier text plus where it was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Name<'a> {
    pub text: &'a str,
    pub location: SourceLocation,
}

impl<'a> Name<'a> {
    pub fn new(text: &'a str, location: SourceLocation) -> Self {
        Self { text, location }
    }
}

/// `a.b.c`; never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DottedName<'a> {
    pub names: Vec<Name<'a>>,
}

impl DottedName<'_> {
    pub fn location(&self) -> SourceLocation {
        self.names.first().map(|n| n.location).unwrap_or_default()
    }
}

/// A (possibly `optional`) qualified type name.
///
/// An empty segment list means the type was not written in the source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeRef<'a> {
    pub optional: bool,
    pub segments: Vec<&'a str>,
    pub location: SourceLocation,
}

impl<'a> TypeRef<'a> {
    pub fn unspecified() -> Self {
        Self::default()
    }

    pub fn is_specified(&self) -> bool {
        !self.segments.is_empty()
    }

    /// Same written type, ignoring where it was written
    pub fn same_type(&self, other: &TypeRef<'_>) -> bool {
        self.optional == other.optional && self.segments == other.segments
    }
}

/// Precedence of anything that is not a binary operator
pub const NO_PRECEDENCE: i32 = -1;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    pub fn precedence(self) -> i32 {
        match self {
            BinOp::Add | BinOp::Sub => 20,
            BinOp::Mul | BinOp::Div | BinOp::Mod => 40,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    Bool {
        value: bool,
        location: SourceLocation,
    },
    Int {
        value: BigInt,
        location: SourceLocation,
    },
    Nil {
        location: SourceLocation,
    },
    Name(Name<'a>),
    Dot {
        receiver: Box<Expr<'a>>,
        member: Name<'a>,
        location: SourceLocation,
    },
    Binary {
        op: BinOp,
        left: Box<Expr<'a>>,
        right: Box<Expr<'a>>,
        location: SourceLocation,
    },
}

impl Expr<'_> {
    pub fn location(&self) -> SourceLocation {
        match self {
            Expr::Bool { location, .. }
            | Expr::Int { location, .. }
            | Expr::Nil { location }
            | Expr::Dot { location, .. }
            | Expr::Binary { location, .. } => *location,
            Expr::Name(name) => name.location,
        }
    }

    /// Operator precedence for `Binary`, [`NO_PRECEDENCE`] otherwise
    pub fn precedence(&self) -> i32 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            _ => NO_PRECEDENCE,
        }
    }
}

/// One declaration clause: `a, b: optional T = value`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl<'a> {
    pub names: Vec<Name<'a>>, // never empty
    pub type_ref: TypeRef<'a>,
    pub value: Option<Expr<'a>>,
    pub location: SourceLocation,
}

/// One imported module path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl<'a> {
    pub path: DottedName<'a>,
    pub location: SourceLocation,
}

/// `proc Name(params): Result` followed by an indented body
#[derive(Debug, Clone, PartialEq)]
pub struct Procedure<'a> {
    pub name: Name<'a>,
    pub params: Vec<VarDecl<'a>>,
    pub result: TypeRef<'a>,
    pub comment: Option<&'a str>,
    pub body: Vec<Statement<'a>>,
    pub location: SourceLocation,
}

/// Statements. Each single-line form keeps its trailing comment.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement<'a> {
    Empty {
        comment: Option<&'a str>,
        location: SourceLocation,
    },
    Return {
        value: Option<Expr<'a>>,
        comment: Option<&'a str>,
        location: SourceLocation,
    },
    Const {
        decls: Vec<VarDecl<'a>>,
        comment: Option<&'a str>,
        location: SourceLocation,
    },
    Var {
        decls: Vec<VarDecl<'a>>,
        comment: Option<&'a str>,
        location: SourceLocation,
    },
    Import {
        imports: Vec<ImportDecl<'a>>,
        comment: Option<&'a str>,
        location: SourceLocation,
    },
    Module {
        name: DottedName<'a>,
        comment: Option<&'a str>,
        location: SourceLocation,
    },
    Procedure(Box<Procedure<'a>>),
}

impl Statement<'_> {
    /// Get the source location of this statement
    pub fn location(&self) -> SourceLocation {
        match self {
            Statement::Empty { location, .. }
            | Statement::Return { location, .. }
            | Statement::Const { location, .. }
            | Statement::Var { location, .. }
            | Statement::Import { location, .. }
            | Statement::Module { location, .. } => *location,
            Statement::Procedure(proc) => proc.location,
        }
    }
}

/// A parsed source file.
///
/// Identifier text borrows either the input buffer or `arena`, so both must
/// outlive the tree.
#[derive(Debug)]
pub struct FileAst<'a> {
    pub filename: &'a str,
    pub directory: &'a str,
    pub arena: &'a Bump,
    pub body: Vec<Statement<'a>>,
}

impl<'a> FileAst<'a> {
    pub fn new(filename: &'a str, directory: &'a str, arena: &'a Bump) -> Self {
        Self {
            filename,
            directory,
            arena,
            body: Vec::new(),
        }
    }

    /// Top-level procedures, in source order
    pub fn procedures(&self) -> impl Iterator<Item = &Procedure<'a>> {
        self.body.iter().filter_map(|stmt| match stmt {
            Statement::Procedure(proc) => Some(proc.as_ref()),
            _ => None,
        })
    }
}
