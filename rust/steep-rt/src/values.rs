//! Runtime values exchanged between the dispatcher and contract instances.

use chrono::{DateTime, SecondsFormat, Utc};
use num_bigint::BigInt;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use steep_core::TypeTag;
use strum::{AsRefStr, Display};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(BigInt),
    String(String),
    /// Reference to a callable, by name.
    Function(String),
    Array(Vec<Value>),
    /// Insertion-ordered entries.
    Map(Vec<(Value, Value)>),
    Set(Vec<Value>),
    Date(DateTime<Utc>),
    /// Pattern source, already validated as a regular expression.
    RegExp(String),
    /// A settled promise and its value.
    Promise(Box<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// A regular expression value. The pattern must compile.
    pub fn regexp(pattern: &str) -> Result<Value, regex::Error> {
        Regex::new(pattern)?;
        Ok(Value::RegExp(pattern.to_string()))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self { Value::String(s) => Some(s), _ => None }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self { Value::Number(n) => Some(*n), _ => None }
    }

    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self { Value::BigInt(n) => Some(n), _ => None }
    }

    /// JSON form for hosts. Values without a JSON counterpart are encoded as
    /// strings (bigint digits, RFC 3339 dates, `/pattern/`).
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Value::Undefined | Value::Null => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n).map(J::Number).unwrap_or(J::Null),
            Value::BigInt(n) => J::String(n.to_string()),
            Value::String(s) => J::String(s.clone()),
            Value::Function(name) => J::String(format!("[Function: {}]", name)),
            Value::Array(items) | Value::Set(items) => J::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => J::Array(
                entries.iter().map(|(k, v)| J::Array(vec![k.to_json(), v.to_json()])).collect(),
            ),
            Value::Date(d) => J::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::RegExp(src) => J::String(format!("/{}/", src)),
            Value::Promise(inner) => inner.to_json(),
            Value::Object(map) => J::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match json {
            J::Null => Value::Null,
            J::Bool(b) => Value::Bool(b),
            J::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            J::String(s) => Value::String(s),
            J::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            J::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Value::Number(n) }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self { Value::Number(f64::from(n)) }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::String(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::String(s) }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self { Value::BigInt(n) }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::String(s) => write!(f, "{}", s),
            Value::BigInt(n) => write!(f, "{}n", n),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

/// Runtime category of a value, in the vocabulary of declared types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum RuntimeKind {
    Undefined,
    Null,
    Boolean,
    Number,
    Bigint,
    String,
    Function,
    Object,
    Array,
    Map,
    Set,
    Date,
    Regexp,
    Promise,
}

impl RuntimeKind {
    /// Primary category. Every container is `Object` at this tier.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Undefined => RuntimeKind::Undefined,
            Value::Null => RuntimeKind::Null,
            Value::Bool(_) => RuntimeKind::Boolean,
            Value::Number(_) => RuntimeKind::Number,
            Value::BigInt(_) => RuntimeKind::Bigint,
            Value::String(_) => RuntimeKind::String,
            Value::Function(_) => RuntimeKind::Function,
            Value::Array(_) | Value::Map(_) | Value::Set(_) | Value::Date(_) | Value::RegExp(_)
            | Value::Promise(_) | Value::Object(_) => RuntimeKind::Object,
        }
    }

    /// Container category of an object value; non-objects keep their
    /// primary category.
    pub fn refine(value: &Value) -> Self {
        match value {
            Value::Array(_) => RuntimeKind::Array,
            Value::Map(_) => RuntimeKind::Map,
            Value::Set(_) => RuntimeKind::Set,
            Value::Date(_) => RuntimeKind::Date,
            Value::RegExp(_) => RuntimeKind::Regexp,
            Value::Promise(_) => RuntimeKind::Promise,
            other => RuntimeKind::of(other),
        }
    }

    /// The declared-type tag naming this category. Plain objects have none.
    pub fn tag(self) -> Option<TypeTag> {
        match self {
            RuntimeKind::Undefined => Some(TypeTag::Undefined),
            RuntimeKind::Null => Some(TypeTag::Null),
            RuntimeKind::Boolean => Some(TypeTag::Boolean),
            RuntimeKind::Number => Some(TypeTag::Number),
            RuntimeKind::Bigint => Some(TypeTag::Bigint),
            RuntimeKind::String => Some(TypeTag::String),
            RuntimeKind::Function => Some(TypeTag::Function),
            RuntimeKind::Array => Some(TypeTag::Array),
            RuntimeKind::Map => Some(TypeTag::Map),
            RuntimeKind::Set => Some(TypeTag::Set),
            RuntimeKind::Date => Some(TypeTag::Date),
            RuntimeKind::Regexp => Some(TypeTag::Regexp),
            RuntimeKind::Promise => Some(TypeTag::Promise),
            RuntimeKind::Object => None,
        }
    }
}
