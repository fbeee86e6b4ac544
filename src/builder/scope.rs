use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::abi::AbiEvent;
use crate::ast::{Cte, SelectQuery, Table};
use crate::builder::{BuilderError, QueryBuilder};
use crate::catalog::{SchemaCatalog, TableSchema};
use crate::parser::splitter::MAX_CTE_CHAIN;

static TABLE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z_][a-z0-9_]*(\.[a-z_][a-z0-9_]*)?$").expect("table name pattern")
});
static BARE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("bare name pattern"));

/// Entry point of the structured path: the catalog, optional event
/// interfaces, and any chained named sub-queries defined so far.
#[derive(Debug, Clone)]
pub struct QueryScope<'a> {
    pub(crate) catalog: &'a SchemaCatalog,
    pub(crate) events: Vec<AbiEvent>,
    pub(crate) ctes: Vec<Cte>,
    pub(crate) virtual_tables: IndexMap<String, TableSchema>,
}

impl<'a> QueryScope<'a> {
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        Self {
            catalog,
            events: Vec::new(),
            ctes: Vec::new(),
            virtual_tables: IndexMap::new(),
        }
    }

    /// Supply event interfaces for ABI-aware parameter resolution.
    pub fn with_abi(&self, events: Vec<AbiEvent>) -> Self {
        let mut next = self.clone();
        next.events = events;
        next
    }

    /// Define a named sub-query. The closure builds the inner query against a
    /// scope that already sees every earlier sub-query; the result registers
    /// `name` as a virtual table for all subsequent clauses.
    pub fn with<F>(&self, name: &str, build: F) -> Result<Self, BuilderError>
    where
        F: FnOnce(QueryScope<'a>) -> Result<QueryBuilder<'a>, BuilderError>,
    {
        let name = name.trim().to_ascii_lowercase();
        if !BARE_NAME.is_match(&name) {
            return Err(BuilderError::InvalidName(name));
        }
        if self.virtual_tables.contains_key(&name) {
            return Err(BuilderError::DuplicateCte(name));
        }
        if self.ctes.len() >= MAX_CTE_CHAIN {
            return Err(BuilderError::CteChainTooLong);
        }

        // the inner query renders inside its own parens; earlier sub-queries
        // are visible as tables but their definitions stay with the outer
        // statement
        let mut inner = self.clone();
        inner.ctes = Vec::new();
        let built = build(inner)?;
        let (query, row) = built.into_parts();

        let mut next = self.clone();
        next.virtual_tables.insert(name.clone(), TableSchema::from_row(&name, &row));
        next.ctes.push(Cte { name, query: Box::new(query) });
        Ok(next)
    }

    /// Open the terminal builder on a catalog table or a previously defined
    /// sub-query.
    pub fn select_from(&self, table: &str) -> Result<QueryBuilder<'a>, BuilderError> {
        self.open(table, None)
    }

    /// As [`select_from`](Self::select_from), binding an alias.
    pub fn select_from_as(
        &self,
        table: &str,
        alias: &str,
    ) -> Result<QueryBuilder<'a>, BuilderError> {
        let alias = alias.trim().to_ascii_lowercase();
        if !BARE_NAME.is_match(&alias) {
            return Err(BuilderError::InvalidName(alias));
        }
        self.open(table, Some(alias))
    }

    fn open(&self, table: &str, alias: Option<String>) -> Result<QueryBuilder<'a>, BuilderError> {
        let name = table.trim().to_ascii_lowercase();
        if !TABLE_NAME.is_match(&name) {
            return Err(BuilderError::InvalidName(name));
        }
        let schema = self.lookup(&name).ok_or_else(|| BuilderError::UnknownTable(name.clone()))?;

        let from = Table { name, alias };
        let mut query = SelectQuery::new(from);
        query.ctes = self.ctes.clone();
        Ok(QueryBuilder::open(self, query, schema))
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<TableSchema> {
        self.virtual_tables
            .get(name)
            .cloned()
            .or_else(|| self.catalog.resolve(name).cloned())
    }
}
