//! Structural value comparison for change detection.
//!
//! The change tracker decides whether a property changed by comparing its
//! current value with a snapshot taken when the entry was attached. For
//! map-valued properties that comparison has to be structural:
//! - [`ElementComparator`]: equality/hash/snapshot for one element type
//! - [`ConvertingComparator`]: adapts a comparator over a native type to a
//!   different declared element type
//! - [`StructuralMapComparator`]: deep map comparison built on an element comparator
//! - [`ValueComparer`]: property-level comparer over JSON values, used by the tracker

mod element;
mod error;
mod structural;
mod value;

pub use element::{
    ConvertingComparator, DefaultComparator, ElementComparator, FloatComparator, JsonComparator,
};
pub use error::{CompareError, CompareResult};
pub use structural::{PropertyValue, StructuralMap, StructuralMapComparator};
pub use value::{JsonValueComparer, ValueComparer};
