//! Entity metadata for docbridge.
//!
//! Defines how tracked entities map onto documents:
//! - [`EntityKind`]: a structural type with its properties, ownership and storage settings
//! - [`Property`]: a mapped property with its JSON name and change comparer
//! - [`Ownership`]: how an owned kind is embedded in its principal's document
//! - [`Model`]: the validated set of kinds, shared immutably by every batch
//!
//! Every configuration problem (ownership that never reaches a root, a root
//! without a target, colliding JSON names, ...) is reported by
//! [`ModelBuilder::build`], before any batch is processed.

mod error;
mod kind;
mod model;

pub use error::{ModelError, ModelResult};
pub use kind::{EntityKind, Ownership, Property};
pub use model::{Model, ModelBuilder};
