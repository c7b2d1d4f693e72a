use docbridge_compare::{
    ElementComparator, JsonValueComparer, StructuralMapComparator, ValueComparer,
};
use serde_json::Value;
use std::sync::Arc;

/// Describes one entity kind: its properties and how it is stored.
///
/// A kind without ownership is a document root. An owned kind is embedded in
/// its principal's document under `ownership.navigation`, unless it also has
/// an explicit target, in which case it is stored as its own document.
#[derive(Debug, Clone)]
pub struct EntityKind {
    pub name: String,
    /// Base kind in a type hierarchy. Storage settings come from the
    /// hierarchy root.
    pub base: Option<String>,
    pub ownership: Option<Ownership>,
    /// Container the kind's documents live in.
    pub target: Option<String>,
    pub properties: Vec<Property>,
    /// JSON property holding the discriminator. Only valid on a hierarchy root.
    pub discriminator_property: Option<String>,
    pub discriminator_value: Option<Value>,
}

impl EntityKind {
    fn blank(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: None,
            ownership: None,
            target: None,
            properties: Vec::new(),
            discriminator_property: None,
            discriminator_value: None,
        }
    }

    /// A standalone kind stored as its own document.
    pub fn root(name: impl Into<String>) -> Self {
        Self::blank(name)
    }

    /// A kind embedded in `principal`'s document under `navigation`.
    pub fn owned(
        name: impl Into<String>,
        principal: impl Into<String>,
        navigation: impl Into<String>,
    ) -> Self {
        Self {
            ownership: Some(Ownership {
                principal: principal.into(),
                navigation: navigation.into(),
                collection: false,
            }),
            ..Self::blank(name)
        }
    }

    /// A kind deriving from `base`.
    pub fn derived(name: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            base: Some(base.into()),
            ..Self::blank(name)
        }
    }

    /// Embeds the kind as an array instead of a single object.
    pub fn collection(mut self) -> Self {
        if let Some(ownership) = self.ownership.as_mut() {
            ownership.collection = true;
        }
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_property(mut self, property: Property) -> Self {
        self.properties.push(property);
        self
    }

    /// Shorthand for adding a key property.
    pub fn with_key(self, name: &str) -> Self {
        self.with_property(Property::key(name))
    }

    /// Shorthand for adding a plain property.
    pub fn with_field(self, name: &str) -> Self {
        self.with_property(Property::new(name))
    }

    pub fn with_discriminator(mut self, json_name: impl Into<String>) -> Self {
        self.discriminator_property = Some(json_name.into());
        self
    }

    pub fn with_discriminator_value(mut self, value: impl Into<Value>) -> Self {
        self.discriminator_value = Some(value.into());
        self
    }

    /// Looks up a property declared directly on this kind.
    pub fn declared_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// How an owned kind is embedded in its principal's document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    /// Owning kind.
    pub principal: String,
    /// JSON property of the owner's document holding the embedded value.
    pub navigation: String,
    /// Embedded as an array of objects.
    pub collection: bool,
}

/// A scalar or structured property of an entity kind.
#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    /// Name used in the stored document.
    pub json_name: String,
    /// Part of the document identity.
    pub key: bool,
    /// Decides whether the property changed between snapshots.
    pub comparer: Arc<dyn ValueComparer>,
}

impl Property {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            json_name: name.to_string(),
            key: false,
            comparer: Arc::new(JsonValueComparer),
        }
    }

    /// Shorthand for a key property.
    pub fn key(name: &str) -> Self {
        Self {
            key: true,
            ..Self::new(name)
        }
    }

    /// Shorthand for a string-keyed map property compared element by element.
    pub fn map(name: &str, element: Arc<dyn ElementComparator<Value>>) -> Self {
        Self::new(name).with_comparer(Arc::new(StructuralMapComparator::new(element)))
    }

    pub fn with_json_name(mut self, json_name: &str) -> Self {
        self.json_name = json_name.to_string();
        self
    }

    pub fn with_comparer(mut self, comparer: Arc<dyn ValueComparer>) -> Self {
        self.comparer = comparer;
        self
    }
}
