use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Floating-point number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 95.0
    /// ```
    Float(f64),

    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 0
    /// ```
    Integer(i64),

    /// String literal enclosed in double or single quotes
    ///
    /// # Examples
    /// ```text
    /// "Author A"
    /// 'c'
    /// ```
    String(String),

    /// `true` or `false`
    Boolean(bool),

    Null,

    // Identifiers and References
    /// Stage name, method name, or field name inside an accessor
    ///
    /// Starts with a letter or underscore, followed by letters, digits, or underscores.
    Identifier(String),

    /// The source collection (`$`)
    Dollar,

    /// The current record (`@`)
    ///
    /// # Examples
    /// ```text
    /// filter(@[age] > 5)
    /// filter(@[books].any(@[published]))
    /// ```
    At,

    /// Stage separator
    ///
    /// # Examples
    /// ```text
    /// $ | filter(@[active]) | count
    /// ```
    Pipe,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,

    // Arithmetic
    /// Addition or string concatenation
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Logical (words, not symbols)
    And,
    Or,
    Not,

    // Delimiters
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    /// Method call or field access
    Dot,
    Comma,
    /// Object literal key-value separator
    Colon,

    /// End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Float(n) => write!(f, "{}", n),
            Token::Integer(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "\"{}\"", s),
            Token::Boolean(b) => write!(f, "{}", b),
            Token::Null => write!(f, "null"),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Dollar => write!(f, "$"),
            Token::At => write!(f, "@"),
            Token::Pipe => write!(f, "|"),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::LtEq => write!(f, "<="),
            Token::GtEq => write!(f, ">="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Dot => write!(f, "."),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}
