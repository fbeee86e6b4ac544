use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::catalog::TableSchema;

/// Immutable registry of the tables a query may reference.
///
/// Every table is reachable under both its namespaced (`base.blocks`) and its
/// bare (`blocks`) name. Chained sub-queries register additional virtual
/// tables under their bare name only, scoped to one resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaCatalog {
    tables: IndexMap<String, TableSchema>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a catalog from table schemas, registering each under
    /// `<namespace>.<table>` and `<table>`.
    pub fn from_tables(namespace: &str, tables: Vec<TableSchema>) -> Self {
        let mut catalog = SchemaCatalog::new();
        for table in tables {
            catalog.register(Some(namespace), table);
        }
        catalog
    }

    /// Register a table, optionally under a namespace as well.
    pub fn register(&mut self, namespace: Option<&str>, table: TableSchema) {
        if let Some(namespace) = namespace {
            let qualified = format!("{}.{}", namespace, table.name);
            self.tables.insert(qualified, table.clone());
        }
        self.tables.insert(table.name.clone(), table);
    }

    /// Register a virtual table under its bare name (CTE scope).
    pub fn register_virtual(&mut self, table: TableSchema) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Look a table up by namespaced or bare name, case-insensitively.
    pub fn resolve(&self, name: &str) -> Option<&TableSchema> {
        let name = name.trim().to_ascii_lowercase();
        self.tables.get(&name)
    }

    /// The built-in blockchain-indexing catalog: five tables under the `base`
    /// namespace.
    pub fn base() -> &'static SchemaCatalog {
        static BASE: Lazy<SchemaCatalog> = Lazy::new(|| {
            SchemaCatalog::from_tables(
                "base",
                vec![
                    TableSchema::from_columns(
                        "blocks",
                        &[
                            ("block_number", "uint64"),
                            ("block_hash", "hash"),
                            ("parent_hash", "hash"),
                            ("timestamp", "timestamp"),
                            ("miner", "address"),
                            ("gas_used", "uint64"),
                            ("gas_limit", "uint64"),
                            ("base_fee_per_gas", "nullable(uint64)"),
                            ("transaction_count", "int"),
                        ],
                    ),
                    TableSchema::from_columns(
                        "transactions",
                        &[
                            ("transaction_hash", "hash"),
                            ("block_number", "uint64"),
                            ("transaction_index", "int"),
                            ("nonce", "uint64"),
                            ("from_address", "address"),
                            ("to_address", "nullable(address)"),
                            ("value", "uint256"),
                            ("gas", "uint64"),
                            ("gas_price", "nullable(uint64)"),
                            ("input", "bytes"),
                            ("status", "int"),
                        ],
                    ),
                    TableSchema::from_columns(
                        "events",
                        &[
                            ("block_number", "uint64"),
                            ("transaction_hash", "hash"),
                            ("log_index", "int"),
                            ("address", "address"),
                            ("event_name", "string"),
                            ("event_signature", "string"),
                            ("topics", "array(hash)"),
                            ("parameters", "map(string, variant)"),
                        ],
                    ),
                    TableSchema::from_columns(
                        "logs",
                        &[
                            ("block_number", "uint64"),
                            ("transaction_hash", "hash"),
                            ("log_index", "int"),
                            ("address", "address"),
                            ("topics", "array(hash)"),
                            ("data", "bytes"),
                        ],
                    ),
                    TableSchema::from_columns(
                        "transfers",
                        &[
                            ("block_number", "uint64"),
                            ("transaction_hash", "hash"),
                            ("log_index", "int"),
                            ("token_address", "address"),
                            ("from_address", "address"),
                            ("to_address", "address"),
                            ("amount", "uint256"),
                        ],
                    ),
                ],
            )
        });
        &BASE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ResponseType;

    #[test]
    fn test_resolves_namespaced_and_bare_names() {
        let catalog = SchemaCatalog::base();
        assert!(catalog.resolve("base.blocks").is_some());
        assert!(catalog.resolve("blocks").is_some());
        assert_eq!(catalog.resolve("blocks"), catalog.resolve("base.blocks"));
        assert!(catalog.resolve("mempool").is_none());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = SchemaCatalog::base();
        assert!(catalog.resolve("Base.Blocks").is_some());
        assert!(catalog.resolve(" TRANSFERS ").is_some());
    }

    #[test]
    fn test_base_catalog_declares_wire_kinds() {
        let catalog = SchemaCatalog::base();
        let events = catalog.resolve("base.events").unwrap();
        assert_eq!(events.get("event_name"), Some(&ResponseType::PlainString));
        assert_eq!(
            events.get("topics"),
            Some(&ResponseType::Array(Box::new(ResponseType::HexString)))
        );
        assert_eq!(
            events.get("parameters"),
            Some(&ResponseType::Map(
                Box::new(ResponseType::PlainString),
                Box::new(ResponseType::Variant)
            ))
        );

        let blocks = catalog.resolve("blocks").unwrap();
        assert_eq!(blocks.get("block_number"), Some(&ResponseType::NumericString));
        assert_eq!(blocks.get("transaction_count"), Some(&ResponseType::SmallInt));
    }
}
