//! Typed node and mark attributes

use crate::error::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute map. Ordered so serialization is deterministic.
pub type Attrs = BTreeMap<String, AttrValue>;

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => Ok(()),
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Int(n) => write!(f, "{}", n),
            AttrValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(AttrValue::Null)
    }
}

/// Value shape an attribute accepts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttrKind {
    Bool,
    Int { min: i64, max: i64 },
    Str,
    OneOf(&'static [&'static str]),
}

/// Schema default for an attribute
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttrDefault {
    Null,
    Bool(bool),
    Int(i64),
    Str(&'static str),
}

impl AttrDefault {
    pub fn to_value(self) -> AttrValue {
        match self {
            AttrDefault::Null => AttrValue::Null,
            AttrDefault::Bool(b) => AttrValue::Bool(b),
            AttrDefault::Int(n) => AttrValue::Int(n),
            AttrDefault::Str(s) => AttrValue::String(s.to_string()),
        }
    }
}

/// Declaration of one attribute in the schema
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttrSpec {
    pub name: &'static str,
    pub kind: AttrKind,
    pub nullable: bool,
    pub default: AttrDefault,
}

impl AttrSpec {
    pub const fn new(name: &'static str, kind: AttrKind, default: AttrDefault) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            default,
        }
    }

    pub const fn nullable(name: &'static str, kind: AttrKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
            default: AttrDefault::Null,
        }
    }

    pub fn accepts(&self, value: &AttrValue) -> bool {
        match (value, self.kind) {
            (AttrValue::Null, _) => self.nullable,
            (AttrValue::Bool(_), AttrKind::Bool) => true,
            (AttrValue::Int(n), AttrKind::Int { min, max }) => (min..=max).contains(n),
            (AttrValue::String(_), AttrKind::Str) => true,
            (AttrValue::String(s), AttrKind::OneOf(options)) => options.contains(&s.as_str()),
            _ => false,
        }
    }

    /// Parse a raw markup string into the value this attribute expects
    pub fn parse(&self, raw: &str) -> Option<AttrValue> {
        let value = match self.kind {
            AttrKind::Bool => match raw {
                "true" => AttrValue::Bool(true),
                "false" => AttrValue::Bool(false),
                _ => return None,
            },
            AttrKind::Int { .. } => AttrValue::Int(raw.trim().parse().ok()?),
            AttrKind::Str | AttrKind::OneOf(_) => AttrValue::String(raw.to_string()),
        };
        self.accepts(&value).then_some(value)
    }
}

/// Build the full attribute map for `specs`, overriding defaults with `given`
pub fn complete_attrs(owner: &str, specs: &[AttrSpec], given: &Attrs) -> ModelResult<Attrs> {
    let mut attrs = Attrs::new();
    for spec in specs {
        attrs.insert(spec.name.to_string(), spec.default.to_value());
    }
    for (name, value) in given {
        let spec = specs
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| ModelError::invalid_attr(owner, name.as_str(), "unknown attribute"))?;
        if !spec.accepts(value) {
            return Err(ModelError::invalid_attr(
                owner,
                name.as_str(),
                format!("value {:?} not accepted", value),
            ));
        }
        attrs.insert(name.clone(), value.clone());
    }
    Ok(attrs)
}

/// Check that `attrs` holds exactly the attributes in `specs` with accepted values
pub fn validate_attrs(owner: &str, specs: &[AttrSpec], attrs: &Attrs) -> ModelResult<()> {
    for spec in specs {
        match attrs.get(spec.name) {
            Some(value) if spec.accepts(value) => {}
            Some(value) => {
                return Err(ModelError::invalid_attr(
                    owner,
                    spec.name,
                    format!("value {:?} not accepted", value),
                ))
            }
            None => return Err(ModelError::invalid_attr(owner, spec.name, "missing")),
        }
    }
    if let Some(extra) = attrs.keys().find(|k| !specs.iter().any(|s| s.name == k.as_str())) {
        return Err(ModelError::invalid_attr(owner, extra.as_str(), "unknown attribute"));
    }
    Ok(())
}
