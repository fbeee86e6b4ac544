use indexmap::IndexMap;

use crate::abi::{resolve_parameter, AbiEvent};
use crate::ast::{
    Expr, Join, JoinKind, OrderByItem, OrderDirection, SelectQuery, Table, Value,
};
use crate::builder::{BuilderError, QueryScope};
use crate::catalog::{QueryShape, ResolvedRow, ResponseType, SchemaCatalog, TableSchema};
use crate::parser::splitter::split_qualifier;

/// An expression paired with the wire kind it resolves to. Produced by the
/// builder's expression constructors, which run the same ordered resolution
/// rules as the text path, at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub expr: Expr,
    pub ty: ResponseType,
}

impl TypedExpr {
    pub fn new(expr: Expr, ty: ResponseType) -> Self {
        Self { expr, ty }
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }
}

/// An incrementally assembled query. Every method returns a fresh value;
/// forked builders never observe each other's later calls.
#[derive(Debug, Clone)]
pub struct QueryBuilder<'a> {
    catalog: &'a SchemaCatalog,
    events: Vec<AbiEvent>,
    virtual_tables: IndexMap<String, TableSchema>,
    query: SelectQuery,
    /// Active schema: the FROM table, merged with the joined table when a
    /// join has been added.
    schema: TableSchema,
    shape: ResolvedRow,
    /// Event signature captured from a `WHERE event_signature = <literal>`
    /// condition. Construction history, not part of the tree: it only feeds
    /// later parameter lookups.
    narrowed: Option<String>,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn open(scope: &QueryScope<'a>, query: SelectQuery, schema: TableSchema) -> Self {
        Self {
            catalog: scope.catalog,
            events: scope.events.clone(),
            virtual_tables: scope.virtual_tables.clone(),
            query,
            schema,
            shape: ResolvedRow::new(),
            narrowed: None,
        }
    }

    // ---- projection -------------------------------------------------------

    /// Select a column by (optionally qualified) name; the alias is the bare
    /// column name. An unknown name selects with kind `Unknown`.
    pub fn select(&self, column: &str) -> Self {
        let (expr, bare, ty) = self.column_parts(column);
        let mut next = self.clone();
        next.query.items.push(expr);
        next.shape.insert(bare, ty);
        next
    }

    /// Select a column under an explicit alias.
    pub fn select_as(&self, column: &str, alias: &str) -> Self {
        let (expr, _, ty) = self.column_parts(column);
        let mut next = self.clone();
        next.query.items.push(expr.alias(alias));
        next.shape.insert(alias, ty);
        next
    }

    /// Select a constructed expression under an alias.
    pub fn select_expr(&self, expr: TypedExpr, alias: &str) -> Self {
        let mut next = self.clone();
        next.query.items.push(expr.expr.alias(alias));
        next.shape.insert(alias, expr.ty);
        next
    }

    /// Select every column of the active schema.
    pub fn select_all(&self) -> Self {
        let mut next = self.clone();
        next.query.items.push(Expr::star());
        for (column, ty) in &self.schema.columns {
            next.shape.insert(column.clone(), ty.clone());
        }
        next
    }

    pub fn distinct(&self) -> Self {
        let mut next = self.clone();
        next.query.distinct = true;
        next
    }

    // ---- joins ------------------------------------------------------------

    /// Join a second table. The joined schema merges into the active schema
    /// for all subsequent expression construction.
    pub fn join(&self, table: &str, on: Expr) -> Result<Self, BuilderError> {
        self.add_join(JoinKind::Inner, table, None, Some(on))
    }

    /// As [`join`](Self::join), binding an alias for the joined table.
    pub fn join_as(&self, table: &str, alias: &str, on: Expr) -> Result<Self, BuilderError> {
        self.add_join(JoinKind::Inner, table, Some(alias), Some(on))
    }

    pub fn left_join(&self, table: &str, on: Expr) -> Result<Self, BuilderError> {
        self.add_join(JoinKind::Left, table, None, Some(on))
    }

    pub fn left_join_as(&self, table: &str, alias: &str, on: Expr) -> Result<Self, BuilderError> {
        self.add_join(JoinKind::Left, table, Some(alias), Some(on))
    }

    pub fn cross_join(&self, table: &str) -> Result<Self, BuilderError> {
        self.add_join(JoinKind::Cross, table, None, None)
    }

    fn add_join(
        &self,
        kind: JoinKind,
        table: &str,
        alias: Option<&str>,
        on: Option<Expr>,
    ) -> Result<Self, BuilderError> {
        if !self.query.joins.is_empty() {
            return Err(BuilderError::JoinLimit);
        }
        let name = table.trim().to_ascii_lowercase();
        let joined = self
            .virtual_tables
            .get(&name)
            .cloned()
            .or_else(|| self.catalog.resolve(&name).cloned())
            .ok_or_else(|| BuilderError::UnknownTable(name.clone()))?;

        let mut next = self.clone();
        next.schema = self.schema.merge(&joined);
        next.query.joins.push(Join {
            kind,
            table: Table { name, alias: alias.map(|a| a.trim().to_ascii_lowercase()) },
            on,
        });
        Ok(next)
    }

    // ---- conditions and trailing clauses ----------------------------------

    /// Append a condition to the WHERE conjunction. A condition of the exact
    /// shape `event_signature = '<literal>'` additionally narrows later
    /// parameter lookups to that event.
    pub fn filter(&self, condition: Expr) -> Self {
        let mut next = self.clone();
        if let Some(signature) = narrowed_signature(&condition) {
            next.narrowed = Some(signature);
        }
        next.query.where_conditions.push(condition);
        next
    }

    /// Convenience for `filter(column = value)`.
    pub fn filter_eq(&self, column: &str, value: Value) -> Self {
        let (expr, _, _) = self.column_parts(column);
        self.filter(expr.eq(Expr::Value(value)))
    }

    /// Narrow to one event: appends `event_signature = '<signature>'` and
    /// records the signature for ABI-aware parameter resolution.
    pub fn where_event_signature(&self, signature: &str) -> Self {
        self.filter(Expr::column("event_signature").eq(Expr::string(signature)))
    }

    pub fn group_by(&self, expr: TypedExpr) -> Self {
        let mut next = self.clone();
        next.query.group_by.push(expr.expr);
        next
    }

    pub fn having(&self, condition: Expr) -> Self {
        let mut next = self.clone();
        next.query.having.push(condition);
        next
    }

    pub fn order_by(&self, expr: TypedExpr) -> Self {
        self.push_order(expr.expr, None)
    }

    pub fn order_by_asc(&self, expr: TypedExpr) -> Self {
        self.push_order(expr.expr, Some(OrderDirection::Asc))
    }

    pub fn order_by_desc(&self, expr: TypedExpr) -> Self {
        self.push_order(expr.expr, Some(OrderDirection::Desc))
    }

    fn push_order(&self, expr: Expr, direction: Option<OrderDirection>) -> Self {
        let mut next = self.clone();
        next.query.order_by.push(OrderByItem { expr, direction });
        next
    }

    pub fn limit(&self, limit: u64) -> Self {
        let mut next = self.clone();
        next.query.limit = Some(limit);
        next
    }

    // ---- typed expression constructors ------------------------------------

    /// A column reference, resolved against the active schema.
    pub fn col(&self, column: &str) -> TypedExpr {
        let (expr, _, ty) = self.column_parts(column);
        TypedExpr::new(expr, ty)
    }

    /// `column['key']`. When the column is a map of `Variant` values, a
    /// previously narrowed event signature resolves the key through the
    /// supplied event interfaces.
    pub fn map_key(&self, column: &str, key: &str) -> TypedExpr {
        let (expr, _, base_ty) = self.column_parts(column);
        let ty = match base_ty {
            ResponseType::Map(_, value) if *value == ResponseType::Variant => {
                resolve_parameter(&self.events, self.narrowed.as_deref(), key)
            }
            ResponseType::Map(_, value) => *value,
            _ => ResponseType::Unknown,
        };
        TypedExpr::new(expr.map_key(key), ty)
    }

    /// The decoded event parameter `parameters['name']`.
    pub fn parameter(&self, name: &str) -> TypedExpr {
        self.map_key("parameters", name)
    }

    /// `CAST(expr AS type)`. The target type decides the kind, as in the
    /// text path; an unrecognized type name casts to `Unknown`.
    pub fn cast(&self, expr: TypedExpr, type_name: &str) -> TypedExpr {
        let ty = ResponseType::parse(type_name).unwrap_or(ResponseType::Unknown);
        TypedExpr::new(expr.expr.cast(type_name), ty)
    }

    /// `expr::type`.
    pub fn cast_colon(&self, expr: TypedExpr, type_name: &str) -> TypedExpr {
        let ty = ResponseType::parse(type_name).unwrap_or(ResponseType::Unknown);
        TypedExpr::new(expr.expr.cast_colon(type_name), ty)
    }

    pub fn count(&self, expr: TypedExpr) -> TypedExpr {
        TypedExpr::new(
            Expr::function("count", vec![expr.expr]),
            ResponseType::NumericString,
        )
    }

    pub fn count_star(&self) -> TypedExpr {
        TypedExpr::new(Expr::function("count", vec![Expr::star()]), ResponseType::NumericString)
    }

    pub fn count_distinct(&self, expr: TypedExpr) -> TypedExpr {
        TypedExpr::new(
            Expr::FunctionCall { name: "count".into(), args: vec![expr.expr], distinct: true },
            ResponseType::NumericString,
        )
    }

    pub fn sum(&self, expr: TypedExpr) -> TypedExpr {
        TypedExpr::new(Expr::function("sum", vec![expr.expr]), ResponseType::NumericString)
    }

    pub fn avg(&self, expr: TypedExpr) -> TypedExpr {
        TypedExpr::new(Expr::function("avg", vec![expr.expr]), ResponseType::SmallInt)
    }

    /// Passthrough aggregate: the result kind is the argument's kind.
    pub fn min(&self, expr: TypedExpr) -> TypedExpr {
        let ty = expr.ty.clone();
        TypedExpr::new(Expr::function("min", vec![expr.expr]), ty)
    }

    pub fn max(&self, expr: TypedExpr) -> TypedExpr {
        let ty = expr.ty.clone();
        TypedExpr::new(Expr::function("max", vec![expr.expr]), ty)
    }

    /// Escape hatch: verbatim SQL with a caller-declared kind. The caller
    /// asserts correctness; nothing here verifies it.
    pub fn raw(&self, sql: &str, ty: ResponseType) -> TypedExpr {
        TypedExpr::new(Expr::raw(sql), ty)
    }

    // ---- terminal ---------------------------------------------------------

    /// Compile to canonical SQL text.
    pub fn compile(&self) -> String {
        self.query.to_sql()
    }

    /// The row shape accumulated from construction history.
    pub fn shape(&self) -> &ResolvedRow {
        &self.shape
    }

    /// The shape wrapped as the engine's `{ result: [row, ...] }` descriptor.
    pub fn query_shape(&self) -> QueryShape {
        QueryShape::known(self.shape.clone())
    }

    pub fn ast(&self) -> &SelectQuery {
        &self.query
    }

    pub(crate) fn into_parts(self) -> (SelectQuery, ResolvedRow) {
        (self.query, self.shape)
    }

    /// Split `t.name` / `name`, build the column expression and resolve its
    /// kind against the active schema.
    fn column_parts(&self, column: &str) -> (Expr, String, ResponseType) {
        let column = column.trim();
        let (expr, bare) = match split_qualifier(column) {
            Some((qualifier, rest)) => (Expr::qualified(qualifier, rest), rest.to_string()),
            None => (Expr::column(column), column.to_string()),
        };
        let ty = self.schema.get(&bare).cloned().unwrap_or(ResponseType::Unknown);
        (expr, bare, ty)
    }
}

fn narrowed_signature(condition: &Expr) -> Option<String> {
    use crate::ast::BinaryOp;
    match condition {
        Expr::BinaryOp { left, op: BinaryOp::Eq, right } => match (left.as_ref(), right.as_ref()) {
            (Expr::Column { name, .. }, Expr::Value(Value::String(signature)))
                if name == "event_signature" =>
            {
                Some(signature.clone())
            }
            _ => None,
        },
        _ => None,
    }
}
