use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A stored document or table item.
pub type Item = BTreeMap<String, Attribute>;

/// A value as it is held by a store.
///
/// Both stores share this representation. `Decimal` carries a number in
/// its decimal string form, the way wide-column stores hand numbers back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Attribute {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(String),
    Text(String),
    List(Vec<Attribute>),
    Map(BTreeMap<String, Attribute>),
}

/// How JSON numbers are written into a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberEncoding {
    /// Integers stay integers, everything else is a float.
    Native,
    /// Every number becomes a `Decimal`.
    Decimal,
}

impl Attribute {
    /// Convert a JSON value into its stored form.
    pub fn from_json(value: &Value, encoding: NumberEncoding) -> Self {
        match value {
            Value::Null => Attribute::Null,
            Value::Bool(b) => Attribute::Bool(*b),
            Value::Number(n) => match encoding {
                NumberEncoding::Native => match n.as_i64() {
                    Some(i) => Attribute::Int(i),
                    None => Attribute::Float(n.as_f64().unwrap_or(f64::NAN)),
                },
                NumberEncoding::Decimal => Attribute::Decimal(decimal_string(n)),
            },
            Value::String(s) => Attribute::Text(s.clone()),
            Value::Array(values) => Attribute::List(
                values
                    .iter()
                    .map(|v| Attribute::from_json(v, encoding))
                    .collect(),
            ),
            Value::Object(map) => Attribute::Map(item_from_json(map, encoding)),
        }
    }

    /// Convert a stored value back to JSON.
    ///
    /// Decimals always come back as floats, and nested maps and lists are
    /// normalized the same way.
    pub fn normalize(&self) -> Value {
        match self {
            Attribute::Null => Value::Null,
            Attribute::Bool(b) => Value::Bool(*b),
            Attribute::Int(i) => Value::Number((*i).into()),
            Attribute::Float(f) => float_value(*f),
            Attribute::Decimal(d) => match d.parse::<f64>() {
                Ok(f) => float_value(f),
                Err(_) => Value::String(d.clone()),
            },
            Attribute::Text(s) => Value::String(s.clone()),
            Attribute::List(values) => Value::Array(values.iter().map(Attribute::normalize).collect()),
            Attribute::Map(map) => Value::Object(normalize_item(map)),
        }
    }

    /// Equality used by filtered scans: numbers compare by value regardless
    /// of how they were encoded.
    pub fn loosely_eq(&self, other: &Attribute) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Attribute::Int(i) => Some(*i as f64),
            Attribute::Float(f) => Some(*f),
            Attribute::Decimal(d) => d.parse().ok(),
            _ => None,
        }
    }

    /// The attribute rendered as an identity string, if it can be one.
    pub fn as_key(&self) -> Option<String> {
        match self {
            Attribute::Text(s) if !s.is_empty() => Some(s.clone()),
            Attribute::Int(i) => Some(i.to_string()),
            Attribute::Decimal(d) => Some(d.clone()),
            _ => None,
        }
    }
}

fn decimal_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().unwrap_or(f64::NAN).to_string()
    }
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Convert a JSON object into a stored item.
pub fn item_from_json(map: &Map<String, Value>, encoding: NumberEncoding) -> Item {
    map.iter()
        .map(|(k, v)| (k.clone(), Attribute::from_json(v, encoding)))
        .collect()
}

/// Normalize every attribute of a stored item.
pub fn normalize_item(item: &Item) -> Map<String, Value> {
    item.iter().map(|(k, v)| (k.clone(), v.normalize())).collect()
}

/// Keep only the named fields of an item.
pub fn project(item: Item, fields: &[&str]) -> Item {
    item.into_iter()
        .filter(|(k, _)| fields.contains(&k.as_str()))
        .collect()
}

/// Equality filter for table scans. An item matches when its attribute
/// equals any of the candidate values.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub attribute: String,
    pub values: Vec<Attribute>,
}

impl Filter {
    pub fn eq(attribute: impl Into<String>, value: Attribute) -> Self {
        Self::one_of(attribute, vec![value])
    }

    pub fn one_of(attribute: impl Into<String>, values: Vec<Attribute>) -> Self {
        Self {
            attribute: attribute.into(),
            values,
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        item.get(&self.attribute)
            .is_some_and(|v| self.values.iter().any(|c| v.loosely_eq(c)))
    }
}
