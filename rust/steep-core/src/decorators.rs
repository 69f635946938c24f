//! Policy decorators and inbound call types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use strum::{AsRefStr, Display, EnumString};

/// A decorator attached to a class member.
///
/// Names the compiler does not know are carried through as `Custom` so that a
/// registry round-trips without loss.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Decorator {
    State,
    Pure,
    View,
    Transaction,
    Payable,
    OnReceived,
    Internal,
    Custom(String),
}

impl Decorator {
    pub fn name(&self) -> &str {
        match self {
            Decorator::State => "state",
            Decorator::Pure => "pure",
            Decorator::View => "view",
            Decorator::Transaction => "transaction",
            Decorator::Payable => "payable",
            Decorator::OnReceived => "onReceived",
            Decorator::Internal => "internal",
            Decorator::Custom(name) => name,
        }
    }

    /// One of `transaction`, `view`, `pure`, `payable`.
    pub fn is_call_type(&self) -> bool {
        matches!(self, Decorator::Transaction | Decorator::View | Decorator::Pure | Decorator::Payable)
    }

    /// Decorators whose meaning lives only in the registry. These are removed
    /// from emitted member syntax.
    pub fn is_policy(&self) -> bool {
        !matches!(self, Decorator::Custom(_))
    }
}

impl From<&str> for Decorator {
    fn from(name: &str) -> Self {
        match name {
            "state" => Decorator::State,
            "pure" => Decorator::Pure,
            "view" => Decorator::View,
            "transaction" => Decorator::Transaction,
            "payable" => Decorator::Payable,
            "onReceived" => Decorator::OnReceived,
            "internal" => Decorator::Internal,
            other => Decorator::Custom(other.to_string()),
        }
    }
}

impl From<CallType> for Decorator {
    fn from(call_type: CallType) -> Self {
        match call_type {
            CallType::View => Decorator::View,
            CallType::Pure => Decorator::Pure,
            CallType::Transaction => Decorator::Transaction,
            CallType::Payable => Decorator::Payable,
        }
    }
}

impl fmt::Display for Decorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for Decorator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Decorator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Decorator::from(name.as_str()))
    }
}

/// Ordered set of decorators. Insertion order is kept for stable output;
/// membership is what matters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Decorator>", into = "Vec<Decorator>")]
pub struct DecoratorSet(Vec<Decorator>);

impl DecoratorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless already present. Returns whether it was added.
    pub fn insert(&mut self, decorator: Decorator) -> bool {
        if self.0.contains(&decorator) {
            return false;
        }
        self.0.push(decorator);
        true
    }

    pub fn contains(&self, decorator: &Decorator) -> bool {
        self.0.contains(decorator)
    }

    pub fn has_call_type(&self) -> bool {
        self.0.iter().any(Decorator::is_call_type)
    }

    pub fn call_types(&self) -> impl Iterator<Item = &Decorator> {
        self.0.iter().filter(|d| d.is_call_type())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Decorator> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Decorator> for DecoratorSet {
    fn from_iter<I: IntoIterator<Item = Decorator>>(iter: I) -> Self {
        let mut set = DecoratorSet::new();
        for d in iter {
            set.insert(d);
        }
        set
    }
}

impl From<Vec<Decorator>> for DecoratorSet {
    fn from(list: Vec<Decorator>) -> Self {
        list.into_iter().collect()
    }
}

impl From<DecoratorSet> for Vec<Decorator> {
    fn from(set: DecoratorSet) -> Self {
        set.0
    }
}

/// Mode an inbound call is made in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CallType {
    View,
    Pure,
    Transaction,
    Payable,
}

impl CallType {
    pub fn parse(name: &str) -> Option<Self> {
        CallType::from_str(name).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decorator_names_round_trip() {
        for name in ["state", "pure", "view", "transaction", "payable", "onReceived", "internal", "logged"] {
            assert_eq!(Decorator::from(name).name(), name);
        }
        assert_eq!(Decorator::from("logged"), Decorator::Custom("logged".into()));
    }

    #[test]
    fn test_set_rejects_duplicates() {
        let mut set = DecoratorSet::new();
        assert!(set.insert(Decorator::View));
        assert!(!set.insert(Decorator::View));
        assert!(set.insert(Decorator::Payable));
        assert_eq!(set.len(), 2);
        assert_eq!(set.call_types().count(), 2);
    }

    #[test]
    fn test_call_type_parse() {
        assert_eq!(CallType::parse("transaction"), Some(CallType::Transaction));
        assert_eq!(CallType::parse("bogus"), None);
        assert_eq!(CallType::Payable.to_string(), "payable");
        assert_eq!(Decorator::from(CallType::Pure), Decorator::Pure);
    }
}
