use std::collections::BTreeMap;
use std::fmt;

// ─── Attribute Envelope ─────────────────────────────────────────────────────

/// A single attribute value as delivered by the host: either null, not yet
/// known (computed at apply time), or a concrete value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    /// Placeholder for a value that will only be known after apply.
    Unknown,
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    /// Null or unknown — no concrete value available.
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Null | Value::Unknown)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Wrap an optional server field, mapping absence to null.
    pub fn from_opt_string(v: Option<String>) -> Value {
        match v {
            Some(s) => Value::String(s),
            None => Value::Null,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            // Unknown has no JSON representation; exported as null.
            Value::Unknown => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::json!(*i),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json()).collect())
            }
            Value::Map(entries) => {
                let map: serde_json::Map<String, serde_json::Value> = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect();
                serde_json::Value::Object(map)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Unknown => write!(f, "(known after apply)"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::String(s) => write!(f, "{}", s),
            Value::List(_) | Value::Map(_) => {
                write!(f, "{}", serde_json::to_string(&self.to_json()).unwrap_or_default())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// ─── Resource Data ──────────────────────────────────────────────────────────

/// The attribute map for one resource instance, in one of its three roles:
/// config (what the user wrote), plan (post-planning expected values), or
/// state (persisted from the last apply).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    attrs: BTreeMap<String, Value>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Value {
        self.attrs.get(name).cloned().unwrap_or(Value::Null)
    }

    /// Concrete string value, or None when the attribute is null/unknown.
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.attrs.get(name).and_then(|v| v.as_str()).map(String::from)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.attrs.get(name).and_then(|v| v.as_i64())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.attrs.get(name).and_then(|v| v.as_bool())
    }

    /// String elements of a list attribute; empty when unset.
    pub fn get_str_list(&self, name: &str) -> Vec<String> {
        self.attrs
            .get(name)
            .and_then(|v| v.as_list())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.attrs.insert(name.to_string(), value.into());
    }

    /// Set from an optional server field, leaving null when absent.
    pub fn set_opt(&mut self, name: &str, value: Option<String>) {
        self.attrs
            .insert(name.to_string(), Value::from_opt_string(value));
    }

    /// The opaque remote ID, empty when the instance is absent.
    pub fn id(&self) -> String {
        self.get_str("id").unwrap_or_default()
    }

    pub fn set_id(&mut self, id: &str) {
        self.set("id", id);
    }

    /// Clear the ID — instructs the host to drop the instance from state.
    pub fn clear_id(&mut self) {
        self.set("id", "");
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attrs.iter()
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .attrs
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}
