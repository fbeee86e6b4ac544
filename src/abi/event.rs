use serde::{Deserialize, Serialize};

use crate::catalog::ResponseType;

/// One named, typed parameter of an event interface. Compatible with a
/// standard JSON ABI event input entry; tuple-typed parameters carry their
/// component list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbiParam {
    pub name: String,
    /// Declared Solidity type, e.g. `uint256`, `address`, `tuple[2]`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<AbiParam>,
}

impl AbiParam {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { name: name.into(), kind: kind.into(), components: Vec::new() }
    }

    /// The canonical-signature rendering of this parameter's type. Tuples
    /// render their components recursively as `(a,b,...)`, keeping any array
    /// suffix: `tuple[2]` with components `address, uint256` becomes
    /// `(address,uint256)[2]`.
    pub fn canonical_type(&self) -> String {
        match self.kind.strip_prefix("tuple") {
            Some(array_suffix) => {
                let inner: Vec<String> =
                    self.components.iter().map(AbiParam::canonical_type).collect();
                format!("({}){}", inner.join(","), array_suffix)
            }
            None => self.kind.clone(),
        }
    }

    /// The wire kind a value of this Solidity type arrives as.
    pub fn response_type(&self) -> ResponseType {
        let kind = self.kind.as_str();
        if kind == "address" {
            ResponseType::HexString
        } else if kind == "bool" {
            ResponseType::Boolean
        } else if kind.starts_with("uint") || kind.starts_with("int") {
            ResponseType::NumericString
        } else if kind == "string" {
            ResponseType::PlainString
        } else if kind.starts_with("bytes") {
            ResponseType::HexString
        } else {
            ResponseType::PlainString
        }
    }
}

/// An event interface: name plus ordered parameters. Supplied once as plain
/// runtime data (e.g. deserialized from a JSON ABI) and treated as immutable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbiEvent {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
}

impl AbiEvent {
    pub fn new(name: impl Into<String>, inputs: Vec<AbiParam>) -> Self {
        Self { name: name.into(), inputs }
    }

    /// Canonical signature: `name(type1,type2,...)`.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(AbiParam::canonical_type).collect();
        format!("{}({})", self.name, types.join(","))
    }
}
