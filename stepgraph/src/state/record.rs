//! StateRecord: the mutable shared record of one graph run.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{SchemaViolation, StateSchema};

/// Field name -> value mapping threaded through a graph run.
///
/// Serializes as a plain JSON object. Node return values are also `StateRecord`s
/// (partial updates) and are folded in with [`merge`](Self::merge).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateRecord(BTreeMap<String, Value>);

impl StateRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chained insert, handy for building inputs and updates.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Builds a record from a JSON object.
    pub fn from_json(value: Value) -> Result<Self, SchemaViolation> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(SchemaViolation::NotAnObject {
                kind: json_kind(&other).to_string(),
            }),
        }
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.0.into_iter().collect())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Returns the field as a list of strings; `None` if absent or not all strings.
    pub fn get_str_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key)?
            .as_array()?
            .iter()
            .map(|v| v.as_str().map(String::from))
            .collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies a node update: each key goes through its field's reducer.
    ///
    /// Fails with [`SchemaViolation::UnknownField`] if the update names a field the
    /// schema does not declare; `self` is never partially updated.
    pub fn merge(&self, schema: &StateSchema, update: StateRecord) -> Result<Self, SchemaViolation> {
        schema.check_fields(&update)?;
        let mut next = self.clone();
        for (key, value) in update {
            let merged = match schema.get(&key) {
                Some(spec) => spec.reducer.apply(next.get(&key), value),
                None => value,
            };
            next.0.insert(key, merged);
        }
        Ok(next)
    }

    /// Like [`merge`](Self::merge) but every field is overwritten, bypassing reducers.
    ///
    /// Used for sub-graph results, which already went through the child's reducers
    /// starting from the parent's values.
    pub fn merge_replacing(
        &self,
        schema: &StateSchema,
        update: StateRecord,
    ) -> Result<Self, SchemaViolation> {
        schema.check_fields(&update)?;
        let mut next = self.clone();
        next.0.extend(update.0);
        Ok(next)
    }

    /// Input record for a sub-graph: shared fields are copied from `self`, every other
    /// child field starts from the child's declared default.
    pub fn project(&self, shared: &[String], child: &StateSchema) -> StateRecord {
        let mut record = child.defaults();
        for name in shared {
            if let Some(v) = self.get(name) {
                record.insert(name.clone(), v.clone());
            }
        }
        record
    }

    /// Parent update from a finished sub-graph: only shared fields are copied back.
    pub fn lift(child: &StateRecord, shared: &[String]) -> StateRecord {
        shared
            .iter()
            .filter_map(|name| child.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl TryFrom<Value> for StateRecord {
    type Error = SchemaViolation;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(value)
    }
}

impl FromIterator<(String, Value)> for StateRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for StateRecord {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a StateRecord {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
