//! Property-level comparers over the host's JSON value representation.
//!
//! The change tracker keeps property values as `serde_json::Value` and asks a
//! [`ValueComparer`] whether a property changed since its original snapshot.

use crate::element::{ElementComparator, JsonComparator};
use crate::error::CompareResult;
use crate::structural::{PropertyValue, StructuralMapComparator};
use serde_json::Value;
use std::fmt;

/// Compares, hashes and snapshots whole property values.
pub trait ValueComparer: Send + Sync + fmt::Debug {
    fn equals(&self, a: &Value, b: &Value) -> CompareResult<bool>;

    fn hash(&self, value: &Value) -> CompareResult<u64>;

    fn snapshot(&self, value: &Value) -> CompareResult<Value>;
}

/// Default comparer: deep JSON equality.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonValueComparer;

impl ValueComparer for JsonValueComparer {
    fn equals(&self, a: &Value, b: &Value) -> CompareResult<bool> {
        Ok(JsonComparator.equals(a, b))
    }

    fn hash(&self, value: &Value) -> CompareResult<u64> {
        Ok(JsonComparator.hash(value))
    }

    fn snapshot(&self, value: &Value) -> CompareResult<Value> {
        Ok(JsonComparator.snapshot(value))
    }
}

impl PropertyValue<Value> {
    /// Lifts a JSON value into the comparer boundary type.
    ///
    /// Objects become maps and arrays become lists; JSON nulls inside either
    /// become null elements.
    pub fn from_json(value: &Value) -> Self {
        fn element(value: &Value) -> Option<Value> {
            (!value.is_null()).then(|| value.clone())
        }

        match value {
            Value::Null => Self::Null,
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(key, item)| (key.clone(), element(item)))
                    .collect(),
            ),
            Value::Array(items) => Self::List(items.iter().map(element).collect()),
            other => Self::Scalar(other.clone()),
        }
    }

    /// Lowers the boundary value back to JSON.
    pub fn into_json(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Scalar(value) => value,
            Self::List(items) => {
                Value::Array(items.into_iter().map(|i| i.unwrap_or(Value::Null)).collect())
            }
            Self::Map(map) => Value::Object(
                map.into_iter()
                    .map(|(key, item)| (key, item.unwrap_or(Value::Null)))
                    .collect(),
            ),
        }
    }
}

impl ValueComparer for StructuralMapComparator<Value> {
    fn equals(&self, a: &Value, b: &Value) -> CompareResult<bool> {
        StructuralMapComparator::equals(self, &PropertyValue::from_json(a), &PropertyValue::from_json(b))
    }

    fn hash(&self, value: &Value) -> CompareResult<u64> {
        StructuralMapComparator::hash(self, &PropertyValue::from_json(value))
    }

    fn snapshot(&self, value: &Value) -> CompareResult<Value> {
        StructuralMapComparator::snapshot(self, &PropertyValue::from_json(value))
            .map(PropertyValue::into_json)
    }
}
