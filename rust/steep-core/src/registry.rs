//! The contract registry: per-member access policy and type signature.
//!
//! The JSON shape is what the compiler emits as the `__metadata` literal and
//! what the dispatcher consumes:
//!
//! ```json
//! {
//!   "__on_received": "receive",
//!   "total": { "decorators": ["state", "view"], "kind": "property", "fieldType": "number" },
//!   "transfer": {
//!     "decorators": ["transaction", "payable"],
//!     "kind": "method",
//!     "returnType": "any",
//!     "params": [{ "name": "to", "type": "any" }, { "name": "amount", "type": "number" }]
//!   }
//! }
//! ```

use crate::decorators::{Decorator, DecoratorSet};
use crate::names;
use crate::types::TypeSpec;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One declared parameter of a method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeSpec,
    /// Literal default, if the source gave one. `Some(Null)` is a real `null`.
    #[serde(
        rename = "defaultValue",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_present"
    )]
    pub default_value: Option<serde_json::Value>,
}

fn deserialize_present<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<serde_json::Value>, D::Error> {
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Kind-specific part of a member's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MemberKind {
    Property {
        #[serde(rename = "fieldType")]
        field_type: TypeSpec,
    },
    Method {
        #[serde(rename = "returnType")]
        return_type: TypeSpec,
        params: Vec<ParamInfo>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub decorators: DecoratorSet,
    #[serde(flatten)]
    pub kind: MemberKind,
}

impl MemberInfo {
    pub fn property(decorators: DecoratorSet, field_type: TypeSpec) -> Self {
        Self { decorators, kind: MemberKind::Property { field_type } }
    }

    pub fn method(decorators: DecoratorSet, return_type: TypeSpec, params: Vec<ParamInfo>) -> Self {
        Self { decorators, kind: MemberKind::Method { return_type, params } }
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, MemberKind::Method { .. })
    }

    pub fn has(&self, decorator: &Decorator) -> bool {
        self.decorators.contains(decorator)
    }

    pub fn params(&self) -> &[ParamInfo] {
        match &self.kind {
            MemberKind::Method { params, .. } => params,
            MemberKind::Property { .. } => &[],
        }
    }

    pub fn return_type(&self) -> Option<&TypeSpec> {
        match &self.kind {
            MemberKind::Method { return_type, .. } => Some(return_type),
            MemberKind::Property { .. } => None,
        }
    }

    pub fn field_type(&self) -> Option<&TypeSpec> {
        match &self.kind {
            MemberKind::Property { field_type } => Some(field_type),
            MemberKind::Method { .. } => None,
        }
    }
}

/// A registry value: either a member's metadata or the name of the method an
/// event alias (`__on_received`) resolves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegistryEntry {
    Alias(String),
    Member(MemberInfo),
}

/// Compiled mapping from member name to metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    pub fn member(&self, name: &str) -> Option<&MemberInfo> {
        match self.entries.get(name) {
            Some(RegistryEntry::Member(info)) => Some(info),
            _ => None,
        }
    }

    /// Target method of an alias entry such as `__on_received`.
    pub fn alias(&self, name: &str) -> Option<&str> {
        match self.entries.get(name) {
            Some(RegistryEntry::Alias(target)) => Some(target),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Insert a member unless the name is already taken; the first writer wins.
    /// Returns whether the entry was inserted.
    pub fn insert_member(&mut self, name: impl Into<String>, info: MemberInfo) -> bool {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return false;
        }
        self.entries.insert(name, RegistryEntry::Member(info));
        true
    }

    /// Point the inbound-message alias at `target`.
    pub fn set_receive_handler(&mut self, target: impl Into<String>) {
        self.entries.insert(names::ON_RECEIVED.to_string(), RegistryEntry::Alias(target.into()));
    }

    /// Fill in every entry of `ancestor` this registry does not define itself.
    pub fn inherit(&mut self, ancestor: &ContractRegistry) {
        for (name, entry) in &ancestor.entries {
            self.entries.entry(name.clone()).or_insert_with(|| entry.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegistryEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &MemberInfo)> {
        self.entries.iter().filter_map(|(k, v)| match v {
            RegistryEntry::Member(info) => Some((k.as_str(), info)),
            RegistryEntry::Alias(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
