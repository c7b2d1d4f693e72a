//! Per-element comparison strategies.
//!
//! An [`ElementComparator`] knows how to compare, hash and snapshot one value
//! type. Comparators are supplied by the host's type mapping and captured as
//! trait objects by the structural comparers, so one generic map engine can
//! serve any element type.

use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

/// Equality, hash and snapshot strategy for a single element type.
///
/// Implementations must uphold:
/// - `equals(a, a)` for every `a`
/// - `equals(a, b)` implies `hash(a) == hash(b)`
/// - `snapshot(a)` is equal to `a` and shares no mutable storage with it
pub trait ElementComparator<T>: Send + Sync {
    /// Whether two elements are equal for change-detection purposes.
    fn equals(&self, a: &T, b: &T) -> bool;

    /// Hash consistent with [`equals`](Self::equals).
    fn hash(&self, value: &T) -> u64;

    /// Independent copy of `value`.
    fn snapshot(&self, value: &T) -> T;

    /// Name of the native element type, used in error messages.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// Comparator for types whose `PartialEq`, `Hash` and `Clone` already have
/// the right semantics.
pub struct DefaultComparator<T>(PhantomData<fn() -> T>);

impl<T> DefaultComparator<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for DefaultComparator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ElementComparator<T> for DefaultComparator<T>
where
    T: PartialEq + Hash + Clone,
{
    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }

    fn hash(&self, value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    fn snapshot(&self, value: &T) -> T {
        value.clone()
    }
}

/// Comparator for `f64` elements.
///
/// NaN equals NaN and `-0.0` equals `0.0`, so a snapshot of a value always
/// compares equal to the value it was taken from.
#[derive(Debug, Default, Clone, Copy)]
pub struct FloatComparator;

impl FloatComparator {
    fn canonical_bits(value: f64) -> u64 {
        if value.is_nan() {
            f64::NAN.to_bits()
        } else if value == 0.0 {
            0.0f64.to_bits()
        } else {
            value.to_bits()
        }
    }
}

impl ElementComparator<f64> for FloatComparator {
    fn equals(&self, a: &f64, b: &f64) -> bool {
        a == b || (a.is_nan() && b.is_nan())
    }

    fn hash(&self, value: &f64) -> u64 {
        let mut hasher = DefaultHasher::new();
        Self::canonical_bits(*value).hash(&mut hasher);
        hasher.finish()
    }

    fn snapshot(&self, value: &f64) -> f64 {
        *value
    }
}

/// Deep comparator for arbitrary JSON values.
///
/// Object hashes are combined commutatively so they never depend on the
/// iteration order of the underlying map.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonComparator;

impl JsonComparator {
    fn hash_into(value: &Value, hasher: &mut DefaultHasher) {
        match value {
            Value::Null => 0u8.hash(hasher),
            Value::Bool(b) => {
                1u8.hash(hasher);
                b.hash(hasher);
            }
            Value::Number(n) => {
                // `Number`'s own hash treats 0.0 and -0.0 alike, as `==` does.
                2u8.hash(hasher);
                n.hash(hasher);
            }
            Value::String(s) => {
                3u8.hash(hasher);
                s.hash(hasher);
            }
            Value::Array(items) => {
                4u8.hash(hasher);
                items.len().hash(hasher);
                for item in items {
                    Self::hash_into(item, hasher);
                }
            }
            Value::Object(map) => {
                5u8.hash(hasher);
                let combined = map.iter().fold(0u64, |acc, (key, item)| {
                    let mut entry = DefaultHasher::new();
                    key.hash(&mut entry);
                    Self::hash_into(item, &mut entry);
                    acc.wrapping_add(entry.finish())
                });
                combined.hash(hasher);
            }
        }
    }
}

impl ElementComparator<Value> for JsonComparator {
    fn equals(&self, a: &Value, b: &Value) -> bool {
        a == b
    }

    fn hash(&self, value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        Self::hash_into(value, &mut hasher);
        hasher.finish()
    }

    fn snapshot(&self, value: &Value) -> Value {
        value.clone()
    }

    fn type_name(&self) -> &'static str {
        "json"
    }
}

type ToNative<T, N> = Box<dyn Fn(&T) -> N + Send + Sync>;
type FromNative<N, T> = Box<dyn Fn(N) -> T + Send + Sync>;

/// Adapts a comparator over a native type `N` to a declared element type `T`.
///
/// Used when the element type a property declares differs from the type the
/// registered comparator operates on. Both operands are converted to `N`
/// before delegating, and snapshots are converted back to `T`.
pub struct ConvertingComparator<T, N> {
    inner: Arc<dyn ElementComparator<N>>,
    to_native: ToNative<T, N>,
    from_native: FromNative<N, T>,
}

impl<T, N> ConvertingComparator<T, N> {
    pub fn new(
        inner: Arc<dyn ElementComparator<N>>,
        to_native: impl Fn(&T) -> N + Send + Sync + 'static,
        from_native: impl Fn(N) -> T + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner,
            to_native: Box::new(to_native),
            from_native: Box::new(from_native),
        }
    }

    /// Returns the wrapped native comparator.
    pub fn inner(&self) -> &Arc<dyn ElementComparator<N>> {
        &self.inner
    }
}

impl<T, N> ConvertingComparator<T, N>
where
    T: Clone + Into<N> + 'static,
    N: Into<T> + 'static,
{
    /// Builds an adapter from `Into` conversions in both directions.
    pub fn lossless(inner: Arc<dyn ElementComparator<N>>) -> Self {
        Self::new(inner, |value: &T| value.clone().into(), Into::into)
    }
}

impl<T, N> ElementComparator<T> for ConvertingComparator<T, N> {
    fn equals(&self, a: &T, b: &T) -> bool {
        self.inner.equals(&(self.to_native)(a), &(self.to_native)(b))
    }

    fn hash(&self, value: &T) -> u64 {
        self.inner.hash(&(self.to_native)(value))
    }

    fn snapshot(&self, value: &T) -> T {
        (self.from_native)(self.inner.snapshot(&(self.to_native)(value)))
    }

    fn type_name(&self) -> &'static str {
        self.inner.type_name()
    }
}
