use std::fmt;

/// Location of a token's first character. Line and column are 1-based;
/// `offset` is the byte offset into the scanned input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Classified lexical unit of a selection expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    True,
    False,
    /// The `exists` keyword, carrying its lexeme.
    Exists(String),
    /// Identifier or dotted property path.
    Property(String),
    Integer(i64),
    /// Numeral that does not fit in an `i64`, kept verbatim.
    Overflow(String),
    /// Inner text of a double-quoted literal; escapes are not interpreted.
    StringLit(String),
    LPar,
    RPar,
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `!` or `~`.
    Not,
    Plus,
    Minus,
    Times,
    Divides,
    Modulus,
    Invalid(char),
    End,
}

impl TokenKind {
    pub fn is_error(&self) -> bool {
        matches!(self, TokenKind::Invalid(_) | TokenKind::Overflow(_))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::True => write!(f, "TRUE"),
            TokenKind::False => write!(f, "FALSE"),
            TokenKind::Exists(s) => write!(f, "EXISTS({s})"),
            TokenKind::Property(s) => write!(f, "PROPERTY({s})"),
            TokenKind::Integer(n) => write!(f, "INTEGER({n})"),
            TokenKind::Overflow(s) => write!(f, "OVERFLOW({s})"),
            TokenKind::StringLit(s) => write!(f, "STRING({s:?})"),
            TokenKind::LPar => write!(f, "LPAR"),
            TokenKind::RPar => write!(f, "RPAR"),
            TokenKind::Or => write!(f, "OR"),
            TokenKind::And => write!(f, "AND"),
            TokenKind::Eq => write!(f, "EQ"),
            TokenKind::Ne => write!(f, "NE"),
            TokenKind::Lt => write!(f, "LT"),
            TokenKind::Le => write!(f, "LE"),
            TokenKind::Gt => write!(f, "GT"),
            TokenKind::Ge => write!(f, "GE"),
            TokenKind::Not => write!(f, "NOT"),
            TokenKind::Plus => write!(f, "PLUS"),
            TokenKind::Minus => write!(f, "MINUS"),
            TokenKind::Times => write!(f, "TIMES"),
            TokenKind::Divides => write!(f, "DIVIDES"),
            TokenKind::Modulus => write!(f, "MODULUS"),
            TokenKind::Invalid(c) => write!(f, "INVALID({c:?})"),
            TokenKind::End => write!(f, "END"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self { kind, position }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.kind, self.position)
    }
}
