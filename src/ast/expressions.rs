use crate::ast::BinOp;

/// Parsed expression, evaluated once per record.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    // Literals
    Float(f64),
    Integer(i64),
    String(String),
    Boolean(bool),
    Null,

    // References
    /// The whole source collection (`$`)
    Root,

    /// The current record (`@`)
    ///
    /// Inside a method argument such as `.any(...)`, `@` rebinds to the
    /// element being tested.
    Current,

    /// Field name used as the key of an [`Expr::Access`].
    /// Produced from identifiers and quoted strings inside `[...]` or after `.`.
    Key(String),

    // Access
    /// Field or index access
    ///
    /// # Examples
    /// ```text
    /// @[name]
    /// @.name
    /// @[books][0]
    /// ```
    Access {
        object: Box<Expr>,
        key: Box<Expr>,
    },

    // Operations
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Logical negation (`not`)
    Not(Box<Expr>),

    /// Method call
    ///
    /// # Examples
    /// ```text
    /// @[name].length()
    /// @[books].any(@[published])
    /// ```
    MethodCall {
        object: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },

    // Object and Array Literals
    /// Object literal
    ///
    /// # Example
    /// ```text
    /// {name: @[name], age: @[age]}
    /// ```
    Object(Vec<(String, Expr)>),

    Array(Vec<Expr>),
}
