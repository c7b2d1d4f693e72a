//! Deep comparison of string-keyed map values.
//!
//! [`StructuralMapComparator`] implements equality, hashing and snapshots for
//! map-valued properties on top of an [`ElementComparator`] for the values.
//! The host hands values over as [`PropertyValue`]; anything that is not a
//! map (or null) is rejected with [`CompareError::TypeMismatch`].

use crate::element::ElementComparator;
use crate::error::{CompareError, CompareResult};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A string-keyed map whose elements may be null.
pub type StructuralMap<T> = HashMap<String, Option<T>>;

/// The host's generic property value, as presented to a comparer.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue<T> {
    /// No value.
    Null,
    /// A single element.
    Scalar(T),
    /// An ordered sequence of elements.
    List(Vec<Option<T>>),
    /// A string-keyed map of elements.
    Map(StructuralMap<T>),
}

impl<T> PropertyValue<T> {
    /// Short name of the value's shape, used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Scalar(_) => "scalar",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the map if this value is map-shaped.
    pub fn as_map(&self) -> Option<&StructuralMap<T>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the map mutably if this value is map-shaped.
    pub fn as_map_mut(&mut self) -> Option<&mut StructuralMap<T>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl<T> From<StructuralMap<T>> for PropertyValue<T> {
    fn from(map: StructuralMap<T>) -> Self {
        Self::Map(map)
    }
}

/// Equality, hash and snapshot for map-valued properties.
pub struct StructuralMapComparator<T> {
    element: Arc<dyn ElementComparator<T>>,
}

impl<T> StructuralMapComparator<T> {
    /// Creates a comparator that compares map elements with `element`.
    pub fn new(element: Arc<dyn ElementComparator<T>>) -> Self {
        Self { element }
    }

    /// Returns the element comparator this map comparator delegates to.
    pub fn element_comparator(&self) -> &Arc<dyn ElementComparator<T>> {
        &self.element
    }

    /// Deep equality of two map values.
    ///
    /// Two nulls are equal and a null never equals a map. Maps are equal when
    /// they have the same number of entries and every key of `a` maps to an
    /// element-equal value in `b`; equal cardinality makes the reverse check
    /// redundant.
    pub fn equals(&self, a: &PropertyValue<T>, b: &PropertyValue<T>) -> CompareResult<bool> {
        if std::ptr::eq(a, b) {
            return Ok(true);
        }

        match (a, b) {
            (PropertyValue::Null, PropertyValue::Null) => Ok(true),
            (PropertyValue::Null, _) | (_, PropertyValue::Null) => Ok(false),
            (PropertyValue::Map(left), PropertyValue::Map(right)) => {
                Ok(self.maps_equal(left, right))
            }
            (PropertyValue::Map(_), other) | (other, _) => Err(self.mismatch(other)),
        }
    }

    /// Order-independent hash of a map value. Null hashes to zero.
    pub fn hash(&self, source: &PropertyValue<T>) -> CompareResult<u64> {
        match source {
            PropertyValue::Null => Ok(0),
            PropertyValue::Map(map) => Ok(map.iter().fold(0u64, |acc, (key, value)| {
                acc.wrapping_add(self.entry_hash(key, value.as_ref()))
            })),
            other => Err(self.mismatch(other)),
        }
    }

    /// Independent copy of a map value; each element goes through the
    /// element comparator's snapshot and null elements stay null.
    pub fn snapshot(&self, source: &PropertyValue<T>) -> CompareResult<PropertyValue<T>> {
        match source {
            PropertyValue::Null => Ok(PropertyValue::Null),
            PropertyValue::Map(map) => Ok(PropertyValue::Map(
                map.iter()
                    .map(|(key, value)| {
                        let copy = value.as_ref().map(|v| self.element.snapshot(v));
                        (key.clone(), copy)
                    })
                    .collect(),
            )),
            other => Err(self.mismatch(other)),
        }
    }

    fn maps_equal(&self, a: &StructuralMap<T>, b: &StructuralMap<T>) -> bool {
        if a.len() != b.len() {
            return false;
        }

        a.iter().all(|(key, left)| match b.get(key) {
            Some(right) => self.elements_equal(left.as_ref(), right.as_ref()),
            None => false,
        })
    }

    fn elements_equal(&self, a: Option<&T>, b: Option<&T>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(left), Some(right)) => self.element.equals(left, right),
            _ => false,
        }
    }

    // Mixes key and element within one entry; entries are then summed so the
    // total does not depend on iteration order.
    fn entry_hash(&self, key: &str, value: Option<&T>) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        value
            .map_or(0, |v| self.element.hash(v))
            .hash(&mut hasher);
        hasher.finish()
    }

    fn mismatch(&self, actual: &PropertyValue<T>) -> CompareError {
        CompareError::TypeMismatch {
            expected: format!("map<string, {}>", self.element.type_name()),
            actual: format!("{}<{}>", actual.shape(), self.element.type_name()),
        }
    }
}

impl<T> Clone for StructuralMapComparator<T> {
    fn clone(&self) -> Self {
        Self {
            element: Arc::clone(&self.element),
        }
    }
}

impl<T> fmt::Debug for StructuralMapComparator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuralMapComparator")
            .field("element", &self.element.type_name())
            .finish()
    }
}
