/// A literal value as it renders into SQL text.
///
/// Strings are wrapped in single quotes verbatim (values are assumed
/// pre-escaped or literal), booleans and `null` render lowercase, numbers
/// render bare. `Numeric` carries an oversized base-10 integer literal that
/// does not fit a native integer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Numeric(String),
    Null,
}

/// Binary comparison and arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Like,
}

impl BinaryOp {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Like => "LIKE",
        }
    }
}

/// How a cast renders: `CAST(expr AS type)` or `expr::type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastStyle {
    Function,
    DoubleColon,
}

/// A node of the expression tree. Nodes own their children; trees are
/// immutable once built and compile deterministically.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference, optionally qualified with a table or alias.
    Column { table: Option<String>, name: String },
    /// `*` or `table.*`.
    Star { table: Option<String> },
    /// Literal value.
    Value(Value),
    /// Verbatim SQL fragment. Escape hatch: the caller asserts correctness.
    Raw(String),
    /// `expr['key']`.
    MapAccess { expr: Box<Expr>, key: String },
    /// `expr[index]`, 1-based as in the source dialect.
    ArrayIndex { expr: Box<Expr>, index: i64 },
    /// `name(args, ...)`; the distinct flag renders `name(DISTINCT args, ...)`.
    FunctionCall { name: String, args: Vec<Expr>, distinct: bool },
    /// Cast to a dialect type name.
    Cast { expr: Box<Expr>, ty: String, style: CastStyle },
    /// `left op right`.
    BinaryOp { left: Box<Expr>, op: BinaryOp, right: Box<Expr> },
    /// Conjunction, joined by ` AND ` without wrapping parens.
    And(Vec<Expr>),
    /// Disjunction, joined by ` OR ` and wrapped in parens.
    Or(Vec<Expr>),
    /// `NOT expr`.
    Not(Box<Expr>),
    /// `expr BETWEEN low AND high`.
    Between { expr: Box<Expr>, low: Box<Expr>, high: Box<Expr> },
    /// `expr [NOT ]IN (v, ...)`.
    InList { expr: Box<Expr>, list: Vec<Expr>, negated: bool },
    /// `expr IS [NOT ]NULL`.
    IsNull { expr: Box<Expr>, negated: bool },
    /// `(expr)`.
    Parens(Box<Expr>),
    /// `expr AS alias`.
    Alias { expr: Box<Expr>, alias: String },
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Self::Column { table: None, name: name.into() }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Column { table: Some(table.into()), name: name.into() }
    }

    pub fn star() -> Self {
        Self::Star { table: None }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Value(Value::String(value.into()))
    }

    pub const fn int(value: i64) -> Self {
        Self::Value(Value::Int(value))
    }

    pub const fn bool(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }

    pub fn numeric(value: impl Into<String>) -> Self {
        Self::Value(Value::Numeric(value.into()))
    }

    pub const fn null() -> Self {
        Self::Value(Value::Null)
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::FunctionCall { name: name.into(), args, distinct: false }
    }

    pub fn binary(self, op: BinaryOp, right: Expr) -> Self {
        Self::BinaryOp { left: Box::new(self), op, right: Box::new(right) }
    }

    pub fn eq(self, right: Expr) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    pub fn not_eq(self, right: Expr) -> Self {
        self.binary(BinaryOp::NotEq, right)
    }

    pub fn lt(self, right: Expr) -> Self {
        self.binary(BinaryOp::Lt, right)
    }

    pub fn lt_eq(self, right: Expr) -> Self {
        self.binary(BinaryOp::LtEq, right)
    }

    pub fn gt(self, right: Expr) -> Self {
        self.binary(BinaryOp::Gt, right)
    }

    pub fn gt_eq(self, right: Expr) -> Self {
        self.binary(BinaryOp::GtEq, right)
    }

    pub fn like(self, pattern: Expr) -> Self {
        self.binary(BinaryOp::Like, pattern)
    }

    /// Extend a conjunction. An existing `And` absorbs the new condition.
    pub fn and(self, right: Expr) -> Self {
        match self {
            Self::And(mut conditions) => {
                conditions.push(right);
                Self::And(conditions)
            }
            left => Self::And(vec![left, right]),
        }
    }

    /// Extend a disjunction. An existing `Or` absorbs the new condition.
    pub fn or(self, right: Expr) -> Self {
        match self {
            Self::Or(mut conditions) => {
                conditions.push(right);
                Self::Or(conditions)
            }
            left => Self::Or(vec![left, right]),
        }
    }

    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    pub fn between(self, low: Expr, high: Expr) -> Self {
        Self::Between { expr: Box::new(self), low: Box::new(low), high: Box::new(high) }
    }

    pub fn in_list(self, list: Vec<Expr>) -> Self {
        Self::InList { expr: Box::new(self), list, negated: false }
    }

    pub fn not_in_list(self, list: Vec<Expr>) -> Self {
        Self::InList { expr: Box::new(self), list, negated: true }
    }

    pub fn is_null(self) -> Self {
        Self::IsNull { expr: Box::new(self), negated: false }
    }

    pub fn is_not_null(self) -> Self {
        Self::IsNull { expr: Box::new(self), negated: true }
    }

    pub fn map_key(self, key: impl Into<String>) -> Self {
        Self::MapAccess { expr: Box::new(self), key: key.into() }
    }

    pub fn index(self, index: i64) -> Self {
        Self::ArrayIndex { expr: Box::new(self), index }
    }

    pub fn cast(self, ty: impl Into<String>) -> Self {
        Self::Cast { expr: Box::new(self), ty: ty.into(), style: CastStyle::Function }
    }

    pub fn cast_colon(self, ty: impl Into<String>) -> Self {
        Self::Cast { expr: Box::new(self), ty: ty.into(), style: CastStyle::DoubleColon }
    }

    pub fn parens(self) -> Self {
        Self::Parens(Box::new(self))
    }

    pub fn alias(self, alias: impl Into<String>) -> Self {
        Self::Alias { expr: Box::new(self), alias: alias.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fluent_chaining() {
        let expr = Expr::column("block_number")
            .gt(Expr::int(1000))
            .and(Expr::column("miner").eq(Expr::string("0xabc")));

        match expr {
            Expr::And(conditions) => assert_eq!(conditions.len(), 2),
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn test_and_absorbs_further_conditions() {
        let expr = Expr::column("a")
            .is_null()
            .and(Expr::column("b").is_null())
            .and(Expr::column("c").is_null());

        match expr {
            Expr::And(conditions) => assert_eq!(conditions.len(), 3),
            other => panic!("expected And, got {other:?}"),
        }
    }
}
