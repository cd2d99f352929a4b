//! State schema: declared fields, defaults and per-field reducers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::StateRecord;

/// Custom merge function: `(current value, update) -> new value`.
pub type ReducerFn = Arc<dyn Fn(Option<&Value>, Value) -> Value + Send + Sync>;

/// How an update to one field is combined with the current value.
///
/// Per-field strategy: `Replace` for plain values, `Append` for logs and
/// message lists, `Custom` for anything else (counters, dedup, ...).
#[derive(Clone, Default)]
pub enum Reducer {
    /// The update overwrites the current value.
    #[default]
    Replace,
    /// Lists are extended; a scalar update is pushed as one element.
    Append,
    /// User supplied merge function.
    Custom(ReducerFn),
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reducer::Replace => f.write_str("Replace"),
            Reducer::Append => f.write_str("Append"),
            Reducer::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Reducer {
    /// Builds a custom reducer from a closure.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(Option<&Value>, Value) -> Value + Send + Sync + 'static,
    {
        Reducer::Custom(Arc::new(f))
    }

    /// Combines `current` with `update` according to this reducer.
    pub fn apply(&self, current: Option<&Value>, update: Value) -> Value {
        match self {
            Reducer::Replace => update,
            Reducer::Append => {
                let mut items = match current {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items.clone(),
                    Some(other) => vec![other.clone()],
                };
                match update {
                    Value::Array(more) => items.extend(more),
                    Value::Null => {}
                    one => items.push(one),
                }
                Value::Array(items)
            }
            Reducer::Custom(f) => f(current, update),
        }
    }
}

/// Declaration of one state field.
#[derive(Clone, Debug, Default)]
pub struct FieldSpec {
    /// A required field without a default must be present in the initial input.
    pub required: bool,
    /// Value used when the field is absent from the input (or private to a sub-graph).
    pub default: Option<Value>,
    /// Merge policy for updates to this field.
    pub reducer: Reducer,
}

/// A state update or input did not match the declared schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaViolation {
    /// The record contains a key the schema does not declare.
    #[error("unknown state field: {field}")]
    UnknownField { field: String },

    /// A required field without default was missing from the initial input.
    #[error("missing required state field: {field}")]
    MissingRequired { field: String },

    /// A JSON value used as a record was not an object.
    #[error("state must be a JSON object, got {kind}")]
    NotAnObject { kind: String },
}

/// Declared fields of a graph's state.
///
/// Build with the chained methods, then pass to `StateGraph::new`. Every node update
/// is checked against this declaration; unknown keys are rejected.
#[derive(Clone, Debug, Default)]
pub struct StateSchema {
    fields: BTreeMap<String, FieldSpec>,
}

impl StateSchema {
    /// Creates an empty schema. An empty schema accepts no fields.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a required field with the replace reducer.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(
            name.into(),
            FieldSpec {
                required: true,
                ..FieldSpec::default()
            },
        );
        self
    }

    /// Declares an optional field with the replace reducer.
    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), FieldSpec::default());
        self
    }

    /// Sets the default of a field, declaring it as optional if it is new.
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.entry(name.into()).or_default().default = Some(value.into());
        self
    }

    /// Sets the reducer of a field, declaring it as optional if it is new.
    pub fn with_reducer(mut self, name: impl Into<String>, reducer: Reducer) -> Self {
        self.fields.entry(name.into()).or_default().reducer = reducer;
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names declared by both schemas, sorted.
    pub fn shared_fields(&self, other: &StateSchema) -> Vec<String> {
        self.fields
            .keys()
            .filter(|k| other.contains(k))
            .cloned()
            .collect()
    }

    /// Record holding every declared default.
    pub fn defaults(&self) -> StateRecord {
        self.fields
            .iter()
            .filter_map(|(k, spec)| spec.default.clone().map(|v| (k.clone(), v)))
            .collect()
    }

    /// Rejects any key not declared in this schema.
    pub fn check_fields(&self, record: &StateRecord) -> Result<(), SchemaViolation> {
        match record.keys().find(|k| !self.contains(k)) {
            Some(field) => Err(SchemaViolation::UnknownField {
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Builds the initial record of a run from caller input.
    ///
    /// Unknown keys are rejected, absent fields take their defaults, and a required
    /// field with neither input nor default is an error.
    pub fn initial(&self, input: StateRecord) -> Result<StateRecord, SchemaViolation> {
        self.check_fields(&input)?;
        let mut record = self.defaults();
        for (k, v) in input {
            record.insert(k, v);
        }
        if let Some((name, _)) = self
            .fields
            .iter()
            .find(|(name, spec)| spec.required && !record.contains_key(name))
        {
            return Err(SchemaViolation::MissingRequired {
                field: name.clone(),
            });
        }
        Ok(record)
    }
}
