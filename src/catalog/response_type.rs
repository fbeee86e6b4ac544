use serde::{Deserialize, Serialize};

/// Semantic kind of a value as it crosses the wire from the query engine.
///
/// The remote engine returns JSON rows; every column is declared here as the
/// JSON shape the caller will actually observe: big integers arrive as base-10
/// strings, addresses and hashes as `0x`-prefixed hex strings, timestamps as
/// plain text. `Variant` is the loosely-typed kind of a stored event parameter
/// before ABI narrowing, and `OneOf` is the union produced when a two-table
/// join exposes the same column name with different declared types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseType {
    /// Base-10 integer rendered as a string (64/256-bit integers).
    NumericString,
    /// `0x`-prefixed lowercase hex string (addresses, hashes, byte blobs).
    HexString,
    /// Plain text, including timestamps.
    PlainString,
    /// JSON boolean.
    Boolean,
    /// Small integer within native numeric range.
    SmallInt,
    /// Un-narrowed stored value: boolean, numeric string or plain string.
    Variant,
    /// Value that may be JSON null.
    Nullable(Box<ResponseType>),
    /// Homogeneous array.
    Array(Box<ResponseType>),
    /// Map with homogeneous key and value kinds.
    Map(Box<ResponseType>, Box<ResponseType>),
    /// Union of kinds from a join-induced column collision. Constituent order
    /// follows merge order; compare as a set.
    OneOf(Vec<ResponseType>),
    /// Anything the resolver could not classify.
    Unknown,
}

impl ResponseType {
    /// Map a dialect type name to a kind, case-insensitively.
    ///
    /// This single mapping serves catalog column declarations and both cast
    /// forms (`cast(x as numeric)`, `x::numeric`). The parameterized names
    /// `nullable(t)`, `array(t)` and `map(k, v)` nest recursively.
    pub fn parse(name: &str) -> Option<ResponseType> {
        let name = name.trim().to_ascii_lowercase();

        if let Some(inner) = unwrap_parameter(&name, "nullable") {
            return ResponseType::parse(inner).map(|t| ResponseType::Nullable(Box::new(t)));
        }
        if let Some(inner) = unwrap_parameter(&name, "array") {
            return ResponseType::parse(inner).map(|t| ResponseType::Array(Box::new(t)));
        }
        if let Some(inner) = unwrap_parameter(&name, "map") {
            let (key, value) = split_pair(inner)?;
            let key = ResponseType::parse(key)?;
            let value = ResponseType::parse(value)?;
            return Some(ResponseType::Map(Box::new(key), Box::new(value)));
        }

        match name.as_str() {
            "uint64" | "uint128" | "uint256" | "int64" | "int128" | "int256" | "numeric"
            | "decimal" | "bigint" => Some(ResponseType::NumericString),
            "address" | "hash" | "bytes" | "hex" | "bytea" => Some(ResponseType::HexString),
            "string" | "text" | "varchar" | "timestamp" | "datetime" | "date" => {
                Some(ResponseType::PlainString)
            }
            "bool" | "boolean" => Some(ResponseType::Boolean),
            "int" | "integer" | "smallint" | "tinyint" | "int8" | "int16" | "int32" | "uint8"
            | "uint16" | "uint32" => Some(ResponseType::SmallInt),
            "variant" | "json" => Some(ResponseType::Variant),
            _ => None,
        }
    }

    /// Merge two kinds for a join-induced column collision.
    ///
    /// Equal kinds collapse to themselves; different kinds produce `OneOf` of
    /// the flattened, deduplicated constituents. Coverage is commutative even
    /// though the constituent order follows merge order.
    pub fn union(a: ResponseType, b: ResponseType) -> ResponseType {
        if a == b {
            return a;
        }
        let mut constituents: Vec<ResponseType> = Vec::new();
        for ty in a.into_constituents().into_iter().chain(b.into_constituents()) {
            if !constituents.contains(&ty) {
                constituents.push(ty);
            }
        }
        if constituents.len() == 1 {
            constituents.remove(0)
        } else {
            ResponseType::OneOf(constituents)
        }
    }

    /// The kinds this value may take: the members of a `OneOf`, or the type
    /// itself.
    pub fn constituents(&self) -> Vec<ResponseType> {
        match self {
            ResponseType::OneOf(types) => types.clone(),
            other => vec![other.clone()],
        }
    }

    fn into_constituents(self) -> Vec<ResponseType> {
        match self {
            ResponseType::OneOf(types) => types,
            other => vec![other],
        }
    }

    /// Value kind behind a map, if this is a map.
    pub fn map_value(&self) -> Option<&ResponseType> {
        match self {
            ResponseType::Map(_, value) => Some(value),
            _ => None,
        }
    }
}

/// `unwrap_parameter("array(hash)", "array")` -> `Some("hash")`.
fn unwrap_parameter<'a>(name: &'a str, wrapper: &str) -> Option<&'a str> {
    let rest = name.strip_prefix(wrapper)?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner)
}

/// Split `k, v` at the top-level comma, respecting nested parentheses.
fn split_pair(inner: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, ch) in inner.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => return Some((&inner[..i], &inner[i + 1..])),
            _ => {}
        }
    }
    None
}
