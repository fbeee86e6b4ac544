//! Canonical SQL serialization. Rendering is a pure, total function over a
//! well-formed tree: the same tree always yields byte-identical text.

use std::fmt;

use crate::ast::{CastStyle, Expr, SelectQuery, Value};

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // no internal escaping: values are assumed pre-escaped or literal
            Value::String(s) => write!(f, "'{s}'"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Numeric(n) => write!(f, "{n}"),
            Value::Null => write!(f, "null"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column { table: Some(table), name } => write!(f, "{table}.{name}"),
            Expr::Column { table: None, name } => write!(f, "{name}"),
            Expr::Star { table: Some(table) } => write!(f, "{table}.*"),
            Expr::Star { table: None } => write!(f, "*"),
            Expr::Value(value) => write!(f, "{value}"),
            Expr::Raw(sql) => write!(f, "{sql}"),
            Expr::MapAccess { expr, key } => write!(f, "{expr}['{key}']"),
            Expr::ArrayIndex { expr, index } => write!(f, "{expr}[{index}]"),
            Expr::FunctionCall { name, args, distinct } => {
                write!(f, "{name}(")?;
                if *distinct {
                    write!(f, "DISTINCT ")?;
                }
                write_joined(f, args, ", ")?;
                write!(f, ")")
            }
            Expr::Cast { expr, ty, style: CastStyle::Function } => {
                write!(f, "CAST({expr} AS {ty})")
            }
            Expr::Cast { expr, ty, style: CastStyle::DoubleColon } => write!(f, "{expr}::{ty}"),
            Expr::BinaryOp { left, op, right } => write!(f, "{left} {} {right}", op.as_str()),
            Expr::And(conditions) => write_joined(f, conditions, " AND "),
            Expr::Or(conditions) => {
                write!(f, "(")?;
                write_joined(f, conditions, " OR ")?;
                write!(f, ")")
            }
            Expr::Not(expr) => write!(f, "NOT {expr}"),
            Expr::Between { expr, low, high } => write!(f, "{expr} BETWEEN {low} AND {high}"),
            Expr::InList { expr, list, negated } => {
                write!(f, "{expr} {}IN (", if *negated { "NOT " } else { "" })?;
                write_joined(f, list, ", ")?;
                write!(f, ")")
            }
            Expr::IsNull { expr, negated } => {
                write!(f, "{expr} IS {}NULL", if *negated { "NOT " } else { "" })
            }
            Expr::Parens(expr) => write!(f, "({expr})"),
            Expr::Alias { expr, alias } => write!(f, "{expr} AS {alias}"),
        }
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.ctes.is_empty() {
            write!(f, "WITH ")?;
            for (i, cte) in self.ctes.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} AS ({})", cte.name, cte.query)?;
            }
            write!(f, " ")?;
        }

        write!(f, "SELECT ")?;
        if self.distinct {
            write!(f, "DISTINCT ")?;
        }
        if self.items.is_empty() {
            write!(f, "*")?;
        } else {
            write_joined(f, &self.items, ", ")?;
        }

        write!(f, " FROM {}", self.from.name)?;
        if let Some(alias) = &self.from.alias {
            write!(f, " AS {alias}")?;
        }

        for join in &self.joins {
            write!(f, " {} JOIN {}", join.kind.as_str(), join.table.name)?;
            if let Some(alias) = &join.table.alias {
                write!(f, " AS {alias}")?;
            }
            if let Some(on) = &join.on {
                write!(f, " ON {on}")?;
            }
        }

        if !self.where_conditions.is_empty() {
            write!(f, " WHERE ")?;
            write_joined(f, &self.where_conditions, " AND ")?;
        }

        if !self.group_by.is_empty() {
            write!(f, " GROUP BY ")?;
            write_joined(f, &self.group_by, ", ")?;
        }

        if !self.having.is_empty() {
            write!(f, " HAVING ")?;
            write_joined(f, &self.having, " AND ")?;
        }

        if !self.order_by.is_empty() {
            write!(f, " ORDER BY ")?;
            for (i, item) in self.order_by.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item.expr)?;
                if let Some(direction) = item.direction {
                    write!(f, " {}", direction.as_str())?;
                }
            }
        }

        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }

        Ok(())
    }
}

impl SelectQuery {
    /// Compile the tree into canonical SQL text.
    pub fn to_sql(&self) -> String {
        self.to_string()
    }
}

fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    separator: &str,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, "{separator}")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}
