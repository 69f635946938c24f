//! Canonical type tags and declared-type specifications.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display, EnumString};

/// A canonical runtime category a declared type can name.
///
/// `Address` is not produced by default normalization; it appears only when the
/// compiler is configured to recognize it, or in hand-written registries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TypeTag {
    Number,
    String,
    Boolean,
    Bigint,
    Null,
    Undefined,
    Function,
    Array,
    Map,
    Set,
    Date,
    Regexp,
    Promise,
    Address,
}

impl TypeTag {
    /// Tags a type annotation may normalize to without extra configuration.
    pub const SUPPORTED: [TypeTag; 13] = [
        TypeTag::Number,
        TypeTag::String,
        TypeTag::Boolean,
        TypeTag::Bigint,
        TypeTag::Null,
        TypeTag::Undefined,
        TypeTag::Function,
        TypeTag::Array,
        TypeTag::Map,
        TypeTag::Set,
        TypeTag::Date,
        TypeTag::Regexp,
        TypeTag::Promise,
    ];

    pub fn is_supported(self) -> bool {
        Self::SUPPORTED.contains(&self)
    }
}

/// Declared type of a field, parameter, or return value.
///
/// Serializes as `"any"`, a single tag string, or an array of tags, which is
/// the shape the emitted registry literal carries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeSpec {
    #[default]
    Any,
    Single(TypeTag),
    Union(Vec<TypeTag>),
}

impl TypeSpec {
    /// Build a spec from tags in order, dropping duplicates after the first.
    /// An empty list is `Any`; one tag is returned unwrapped.
    pub fn from_tags(tags: impl IntoIterator<Item = TypeTag>) -> Self {
        let mut unique: Vec<TypeTag> = Vec::new();
        for tag in tags {
            if !unique.contains(&tag) {
                unique.push(tag);
            }
        }
        match unique.len() {
            0 => TypeSpec::Any,
            1 => TypeSpec::Single(unique[0]),
            _ => TypeSpec::Union(unique),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, TypeSpec::Any)
    }

    /// Tags a value may match, or `None` when unconstrained.
    pub fn allowed(&self) -> Option<&[TypeTag]> {
        match self {
            TypeSpec::Any => None,
            TypeSpec::Single(tag) => Some(std::slice::from_ref(tag)),
            TypeSpec::Union(tags) => Some(tags),
        }
    }

    pub fn tags(&self) -> Vec<TypeTag> {
        self.allowed().map(|t| t.to_vec()).unwrap_or_default()
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Any => write!(f, "any"),
            TypeSpec::Single(tag) => write!(f, "{}", tag),
            TypeSpec::Union(tags) => {
                let names: Vec<&str> = tags.iter().map(|t| t.as_ref()).collect();
                write!(f, "{}", names.join(" | "))
            }
        }
    }
}

impl Serialize for TypeSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TypeSpec::Any => serializer.serialize_str("any"),
            TypeSpec::Single(tag) => serializer.serialize_str(tag.as_ref()),
            TypeSpec::Union(tags) => {
                let mut seq = serializer.serialize_seq(Some(tags.len()))?;
                for tag in tags {
                    seq.serialize_element(tag)?;
                }
                seq.end()
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TypeSpecRepr {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for TypeSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match TypeSpecRepr::deserialize(deserializer)? {
            TypeSpecRepr::One(name) if name == "any" => Ok(TypeSpec::Any),
            TypeSpecRepr::One(name) => name
                .parse::<TypeTag>()
                .map(TypeSpec::Single)
                .map_err(|_| de::Error::custom(format!("unknown type tag '{}'", name))),
            TypeSpecRepr::Many(names) => {
                // A stray "any" inside a list poisons it, same as at compile time.
                let mut tags = Vec::with_capacity(names.len());
                for name in names {
                    match name.parse::<TypeTag>() {
                        Ok(tag) => tags.push(tag),
                        Err(_) if name == "any" => return Ok(TypeSpec::Any),
                        Err(_) => {
                            return Err(de::Error::custom(format!("unknown type tag '{}'", name)))
                        }
                    }
                }
                Ok(TypeSpec::from_tags(tags))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tags_dedupes_in_order() {
        let spec = TypeSpec::from_tags([TypeTag::Undefined, TypeTag::Null, TypeTag::Undefined, TypeTag::Number]);
        assert_eq!(spec, TypeSpec::Union(vec![TypeTag::Undefined, TypeTag::Null, TypeTag::Number]));
        assert_eq!(TypeSpec::from_tags([TypeTag::String]), TypeSpec::Single(TypeTag::String));
        assert_eq!(TypeSpec::from_tags([]), TypeSpec::Any);
    }

    #[test]
    fn test_serialized_shape() {
        assert_eq!(serde_json::to_string(&TypeSpec::Any).unwrap(), r#""any""#);
        assert_eq!(serde_json::to_string(&TypeSpec::Single(TypeTag::Regexp)).unwrap(), r#""regexp""#);
        let union = TypeSpec::Union(vec![TypeTag::Null, TypeTag::Bigint]);
        assert_eq!(serde_json::to_string(&union).unwrap(), r#"["null","bigint"]"#);
        let back: TypeSpec = serde_json::from_str(r#"["null","bigint"]"#).unwrap();
        assert_eq!(back, union);
    }

    #[test]
    fn test_any_inside_list_collapses() {
        let spec: TypeSpec = serde_json::from_str(r#"["number","any"]"#).unwrap();
        assert!(spec.is_any());
    }

    #[test]
    fn test_display() {
        let union = TypeSpec::Union(vec![TypeTag::Number, TypeTag::String]);
        assert_eq!(union.to_string(), "number | string");
        assert_eq!(TypeSpec::Any.to_string(), "any");
    }
}
