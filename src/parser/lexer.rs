//! Lexer (tokenizer) for Fir source code
//!
//! Converts a UTF-8 byte buffer into located [`Token`]s one at a time. Block
//! structure is carried by indentation, so the lexer keeps a stack of open
//! indentation widths and synthesizes [`TokenKind::Indent`] and
//! [`TokenKind::Unindent`] tokens at the start of each line (and one
//! `Unindent` per open level at end of input).
//!
//! Lexical errors are ordinary token kinds with negative discriminants. The
//! lexer never fails; the parser reports error tokens through its normal
//! "expected X, found Y" path.
//!
//! Identifiers are NFKC-normalized. Text that is already normalized is
//! borrowed straight from the input; normalized text is copied into the
//! arena so it lives as long as the tree.

use bumpalo::Bump;
use rustc_hash::FxHashMap;
use std::fmt;

use super::ast::SourceLocation;
use super::unicode::{is_certainly_nfkc, to_nfkc};

const BYTE_ORDER_MARK: &[u8] = b"\xEF\xBB\xBF";

/// All token kinds produced by the lexer.
#[repr(i8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Errors
    UnexpectedChar = -3,
    MalformedUnicode = -2,
    IndentMismatch = -1,

    // Layout
    Eof = 0,
    Newline,
    Indent,
    Unindent,
    Comment,

    // Literals
    Identifier,
    Integer,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Colon,
    Semicolon,
    Comma,
    Dot,
    Equal,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,

    // Keywords
    And = 100,
    Class,
    Const,
    Else,
    For,
    If,
    Import,
    In,
    Is,
    Nil,
    Not,
    Optional,
    Or,
    Proc,
    Return,
    Var,
    While,
    With,
    Yield,
}

impl TokenKind {
    pub fn is_error(self) -> bool {
        (self as i8) < 0
    }

    /// Fixed source spelling of punctuation and keywords
    pub fn spelling(self) -> Option<&'static str> {
        use TokenKind::*;
        let text = match self {
            LeftParen => "(",
            RightParen => ")",
            LeftBracket => "[",
            RightBracket => "]",
            Colon => ":",
            Semicolon => ";",
            Comma => ",",
            Dot => ".",
            Equal => "=",
            Plus => "+",
            Minus => "-",
            Asterisk => "*",
            Slash => "/",
            Percent => "%",
            And => "and",
            Class => "class",
            Const => "const",
            Else => "else",
            For => "for",
            If => "if",
            Import => "import",
            In => "in",
            Is => "is",
            Nil => "nil",
            Not => "not",
            Optional => "optional",
            Or => "or",
            Proc => "proc",
            Return => "return",
            Var => "var",
            While => "while",
            With => "with",
            Yield => "yield",
            _ => return None,
        };
        Some(text)
    }

    /// How an expectation of this kind reads in an error message
    pub fn expectation(self) -> String {
        match self {
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Indent => "indentation".to_string(),
            TokenKind::Unindent => "un-indentation".to_string(),
            TokenKind::Identifier => "an identifier".to_string(),
            TokenKind::Integer => "an integer".to_string(),
            TokenKind::Comment => "a comment".to_string(),
            TokenKind::Eof => "end of file".to_string(),
            other => match other.spelling() {
                Some(text) => format!("‘{text}’"),
                None => "a valid token".to_string(),
            },
        }
    }
}

/// A token: kind, source text, and where its first character was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub location: SourceLocation,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, location: SourceLocation) -> Self {
        Self {
            kind,
            text,
            location,
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Newline => write!(f, "end of line"),
            TokenKind::Indent => write!(f, "indentation"),
            TokenKind::Unindent => write!(f, "un-indentation"),
            TokenKind::Comment => write!(f, "comment"),
            TokenKind::Eof => write!(f, "end of file"),
            TokenKind::IndentMismatch => write!(f, "mismatched indentation"),
            TokenKind::MalformedUnicode => write!(f, "malformed Unicode"),
            _ => write!(f, "‘{}’", self.text),
        }
    }
}

/// The parser's view of the stream: the token being looked at and the one
/// after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookahead<'a> {
    pub current: Token<'a>,
    pub next: Token<'a>,
}

impl Lookahead<'_> {
    /// Whether `current` is a real token rather than end of input
    pub fn more(&self) -> bool {
        self.current.kind != TokenKind::Eof
    }
}

/// Lexer for Fir source code
pub struct Lexer<'a> {
    input: &'a [u8],
    arena: &'a Bump,
    normalized: FxHashMap<&'a [u8], &'a str>,

    // Two code points of lookahead; `None` is end of input
    cur: Option<char>,
    cur_pos: usize,
    next: Option<char>,
    next_pos: usize,
    next_end: usize,
    line: usize,
    column: usize,

    indents: Vec<usize>,
    at_line_start: bool,
    window: Lookahead<'a>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `input`, skipping one leading byte order mark.
    pub fn new(input: &'a [u8], arena: &'a Bump) -> Self {
        let start = if input.starts_with(BYTE_ORDER_MARK) {
            BYTE_ORDER_MARK.len()
        } else {
            0
        };
        let eof = Token::new(TokenKind::Eof, "", SourceLocation::new(1, 1));
        let mut lexer = Self {
            input,
            arena,
            normalized: FxHashMap::default(),
            cur: None,
            cur_pos: start,
            next: None,
            next_pos: start,
            next_end: start,
            line: 1,
            column: 1,
            indents: Vec::new(),
            at_line_start: true,
            window: Lookahead {
                current: eof,
                next: eof,
            },
        };
        lexer.fill();
        lexer.cur = lexer.next;
        lexer.cur_pos = lexer.next_pos;
        lexer.fill();
        lexer.window.next = lexer.scan_token();
        lexer
    }

    /// Shift the token window by one and return it.
    ///
    /// Once the input is exhausted, every further call yields `Eof`.
    pub fn advance(&mut self) -> Lookahead<'a> {
        self.window.current = self.window.next;
        self.window.next = self.scan_token();
        self.window
    }

    pub fn window(&self) -> Lookahead<'a> {
        self.window
    }

    // ===== Token scanning =====

    fn scan_token(&mut self) -> Token<'a> {
        if self.at_line_start {
            if let Some(token) = self.indentation() {
                return token;
            }
        }

        self.skip_whitespace();
        let location = self.current_location();
        let start = self.cur_pos;

        let Some(c) = self.cur else {
            return match self.indents.pop() {
                Some(_) => Token::new(TokenKind::Unindent, "", location),
                None => Token::new(TokenKind::Eof, "", location),
            };
        };

        if self.is_line_terminator() {
            self.bump();
            self.at_line_start = true;
            return Token::new(TokenKind::Newline, "", location);
        }

        if c.is_ascii_digit()
            || (matches!(c, '+' | '-') && self.next.is_some_and(|n| n.is_ascii_digit()))
        {
            self.bump();
            while self.cur.is_some_and(|d| d.is_ascii_digit()) {
                self.bump();
            }
            return Token::new(TokenKind::Integer, self.text(start, self.cur_pos), location);
        }

        if c == '#' {
            return self.comment(location);
        }

        if self.at_malformed() {
            self.bump();
            let text = self.text(start, self.cur_pos);
            return Token::new(TokenKind::MalformedUnicode, text, location);
        }

        if is_identifier_start(c) {
            return self.identifier(location);
        }

        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            '=' => TokenKind::Equal,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Asterisk,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            _ => TokenKind::UnexpectedChar,
        };
        self.bump();
        Token::new(kind, self.text(start, self.cur_pos), location)
    }

    /// Compare a new line's indentation with the open levels. Emits at most
    /// one layout token per call; the line stays "at start" while levels
    /// are still being closed.
    fn indentation(&mut self) -> Option<Token<'a>> {
        // Blank lines never count
        while self.cur.is_some_and(char::is_whitespace) {
            self.bump();
        }
        self.cur?;

        let location = self.current_location();
        let width = self.column - 1;
        let top = self.indents.last().copied().unwrap_or(0);

        if width > top {
            self.indents.push(width);
            self.at_line_start = false;
            return Some(Token::new(TokenKind::Indent, "", location));
        }

        if width < top {
            self.indents.pop();
            if width != 0 && !self.indents.contains(&width) {
                self.at_line_start = false;
                return Some(Token::new(TokenKind::IndentMismatch, "", location));
            }
            return Some(Token::new(TokenKind::Unindent, "", location));
        }

        self.at_line_start = false;
        None
    }

    fn comment(&mut self, location: SourceLocation) -> Token<'a> {
        self.bump(); // '#'
        self.skip_whitespace();
        let start = self.cur_pos;
        while self.cur.is_some() && !self.is_line_terminator() {
            self.bump();
        }
        let text = self.text(start, self.cur_pos).trim_end();
        Token::new(TokenKind::Comment, text, location)
    }

    fn identifier(&mut self, location: SourceLocation) -> Token<'a> {
        let start = self.cur_pos;
        let mut normalized = true;
        // Invalid bytes stay inside the run so normalization can reject it
        loop {
            let malformed = self.at_malformed();
            match self.cur {
                Some(c) if malformed || is_identifier_part(c) => {
                    normalized &= !malformed && is_certainly_nfkc(c);
                    self.bump();
                }
                _ => break,
            }
        }

        let raw = &self.input[start..self.cur_pos];
        if normalized {
            let kind = keyword(raw).unwrap_or(TokenKind::Identifier);
            return Token::new(kind, self.text(start, self.cur_pos), location);
        }

        let text: &'a str = match self.normalized.get(raw) {
            Some(&text) => text,
            None => match to_nfkc(raw) {
                Ok(text) => {
                    let text: &'a str = self.arena.alloc_str(&text);
                    self.normalized.insert(raw, text);
                    text
                }
                Err(_) => {
                    let text = self.text(start, self.cur_pos);
                    return Token::new(TokenKind::MalformedUnicode, text, location);
                }
            },
        };
        // Compatibility spellings of keywords are still keywords
        let kind = keyword(text.as_bytes()).unwrap_or(TokenKind::Identifier);
        Token::new(kind, text, location)
    }

    // ===== Character helpers =====

    /// Decode the code point after `cur` into `next`
    fn fill(&mut self) {
        self.next_pos = self.next_end;
        let (next, len) = decode(&self.input[self.next_pos..]);
        self.next = next;
        self.next_end = self.next_pos + len;
    }

    /// Advance to next character
    fn bump(&mut self) {
        if self.cur.is_none() {
            return;
        }
        if self.is_line_terminator() {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.cur = self.next;
        self.cur_pos = self.next_pos;
        self.fill();
    }

    /// Whether `cur` stands for undecodable input rather than a real U+FFFD
    fn at_malformed(&self) -> bool {
        self.cur == Some(char::REPLACEMENT_CHARACTER)
            && !self.input[self.cur_pos..].starts_with("\u{FFFD}".as_bytes())
    }

    fn is_line_terminator(&self) -> bool {
        match self.cur {
            Some('\n' | '\u{0B}' | '\u{0C}' | '\u{85}' | '\u{2028}' | '\u{2029}') => true,
            Some('\r') => self.next != Some('\n'),
            _ => false,
        }
    }

    /// Skip whitespace up to (not including) the end of the line
    fn skip_whitespace(&mut self) {
        while self.cur.is_some_and(char::is_whitespace) && !self.is_line_terminator() {
            self.bump();
        }
    }

    fn current_location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    /// Source text for a byte range, copied into the arena only when the
    /// input there is not valid UTF-8.
    fn text(&self, start: usize, end: usize) -> &'a str {
        let bytes: &'a [u8] = &self.input[start..end];
        match std::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => self.arena.alloc_str(&String::from_utf8_lossy(bytes)),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let window = self.advance();
        window.more().then_some(window.current)
    }
}

/// Decode one code point. Invalid sequences decode to U+FFFD and consume the
/// bytes the decoder rejected.
fn decode(bytes: &[u8]) -> (Option<char>, usize) {
    if bytes.is_empty() {
        return (None, 0);
    }
    let head = &bytes[..bytes.len().min(4)];
    let valid = match std::str::from_utf8(head) {
        Ok(text) => text,
        Err(err) if err.valid_up_to() > 0 => {
            std::str::from_utf8(&head[..err.valid_up_to()]).unwrap_or_default()
        }
        Err(err) => {
            let len = err.error_len().unwrap_or(head.len());
            return (Some(char::REPLACEMENT_CHARACTER), len);
        }
    };
    match valid.chars().next() {
        Some(c) => (Some(c), c.len_utf8()),
        None => (Some(char::REPLACEMENT_CHARACTER), 1),
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || (!c.is_ascii() && unicode_ident::is_xid_start(c))
}

fn is_identifier_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || (!c.is_ascii() && unicode_ident::is_xid_continue(c))
}

/// Keyword lookup, dispatched on the first byte
fn keyword(text: &[u8]) -> Option<TokenKind> {
    use TokenKind::*;
    let candidates: &[(&[u8], TokenKind)] = match text.first()? {
        b'a' => &[(b"and", And)],
        b'c' => &[(b"class", Class), (b"const", Const)],
        b'e' => &[(b"else", Else)],
        b'f' => &[(b"for", For)],
        b'i' => &[(b"if", If), (b"import", Import), (b"in", In), (b"is", Is)],
        b'n' => &[(b"nil", Nil), (b"not", Not)],
        b'o' => &[(b"optional", Optional), (b"or", Or)],
        b'p' => &[(b"proc", Proc)],
        b'r' => &[(b"return", Return)],
        b'v' => &[(b"var", Var)],
        b'w' => &[(b"while", While), (b"with", With)],
        b'y' => &[(b"yield", Yield)],
        _ => return None,
    };
    candidates
        .iter()
        .find(|(word, _)| *word == text)
        .map(|&(_, kind)| kind)
}
