use crate::error::{ModelError, ModelResult};
use crate::kind::{EntityKind, Ownership, Property};
use serde_json::Value;
use std::collections::HashMap;

/// Collects entity kinds and validates them into a [`Model`].
#[derive(Debug, Default)]
pub struct ModelBuilder {
    kinds: Vec<EntityKind>,
    default_target: Option<String>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: EntityKind) -> Self {
        self.kinds.push(kind);
        self
    }

    /// Target used by document roots that do not name their own.
    pub fn default_target(mut self, target: impl Into<String>) -> Self {
        self.default_target = Some(target.into());
        self
    }

    /// Validates the configuration and freezes it.
    pub fn build(self) -> ModelResult<Model> {
        let mut kinds = HashMap::with_capacity(self.kinds.len());
        let mut order = Vec::with_capacity(self.kinds.len());
        for kind in self.kinds {
            if kinds.contains_key(&kind.name) {
                return Err(ModelError::DuplicateKind(kind.name));
            }
            order.push(kind.name.clone());
            kinds.insert(kind.name.clone(), kind);
        }

        let mut model = Model {
            kinds,
            order,
            default_target: self.default_target,
            max_ownership_depth: 0,
        };
        model.max_ownership_depth = model.validate()?;
        Ok(model)
    }
}

/// The validated, immutable set of entity kinds shared by every batch.
#[derive(Debug, Clone)]
pub struct Model {
    kinds: HashMap<String, EntityKind>,
    order: Vec<String>,
    default_target: Option<String>,
    max_ownership_depth: usize,
}

impl Model {
    pub fn builder() -> ModelBuilder {
        ModelBuilder::new()
    }

    pub fn kind(&self, name: &str) -> Option<&EntityKind> {
        self.kinds.get(name)
    }

    /// Looks up a kind, failing if the model does not know it.
    pub fn require(&self, name: &str) -> ModelResult<&EntityKind> {
        self.kinds
            .get(name)
            .ok_or_else(|| ModelError::UnknownKind(name.to_string()))
    }

    /// All kinds in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = &EntityKind> {
        self.order.iter().filter_map(|name| self.kinds.get(name))
    }

    pub fn default_target(&self) -> Option<&str> {
        self.default_target.as_deref()
    }

    /// Longest chain of ownership hops from any kind to its document root.
    pub fn max_ownership_depth(&self) -> usize {
        self.max_ownership_depth
    }

    /// The kind followed by its base kinds, most derived first.
    pub fn lineage(&self, name: &str) -> ModelResult<Vec<&EntityKind>> {
        let mut chain = vec![self.require(name)?];
        while let Some(base) = chain.last().copied().and_then(|k| k.base.as_deref()) {
            if chain.len() > self.kinds.len() {
                return Err(ModelError::InheritanceCycle {
                    kind: name.to_string(),
                });
            }
            chain.push(self.require(base)?);
        }
        Ok(chain)
    }

    /// The root of the kind's type hierarchy, which carries storage settings.
    pub fn hierarchy_root(&self, name: &str) -> ModelResult<&EntityKind> {
        let lineage = self.lineage(name)?;
        lineage
            .last()
            .copied()
            .ok_or_else(|| ModelError::UnknownKind(name.to_string()))
    }

    /// Whether `kind` is `ancestor` or derives from it.
    pub fn is_assignable_to(&self, kind: &str, ancestor: &str) -> bool {
        self.lineage(kind)
            .map(|chain| chain.iter().any(|k| k.name == ancestor))
            .unwrap_or(false)
    }

    pub fn is_document_root(&self, name: &str) -> ModelResult<bool> {
        let root = self.hierarchy_root(name)?;
        Ok(root.ownership.is_none() || root.target.is_some())
    }

    pub fn ownership(&self, name: &str) -> ModelResult<Option<&Ownership>> {
        Ok(self.hierarchy_root(name)?.ownership.as_ref())
    }

    /// Container holding the documents of a root kind.
    pub fn target_name(&self, name: &str) -> ModelResult<&str> {
        if !self.is_document_root(name)? {
            return Err(ModelError::NotDocumentRoot {
                kind: name.to_string(),
            });
        }
        let root = self.hierarchy_root(name)?;
        root.target
            .as_deref()
            .or(self.default_target.as_deref())
            .ok_or_else(|| ModelError::MissingTargetName {
                kind: root.name.clone(),
            })
    }

    /// Declared and inherited properties, base properties first.
    pub fn properties(&self, name: &str) -> ModelResult<Vec<&Property>> {
        let lineage = self.lineage(name)?;
        Ok(lineage
            .iter()
            .rev()
            .flat_map(|kind| kind.properties.iter())
            .collect())
    }

    pub fn property(&self, kind: &str, property: &str) -> ModelResult<Option<&Property>> {
        Ok(self
            .properties(kind)?
            .into_iter()
            .find(|p| p.name == property))
    }

    pub fn key_properties(&self, name: &str) -> ModelResult<Vec<&Property>> {
        Ok(self
            .properties(name)?
            .into_iter()
            .filter(|p| p.key)
            .collect())
    }

    /// Kinds embedded directly in documents of `name` (or of its base kinds).
    pub fn embedded_kinds(&self, name: &str) -> ModelResult<Vec<&EntityKind>> {
        let lineage = self.lineage(name)?;
        let mut embedded = Vec::new();
        for kind in self.kinds() {
            let Some(ownership) = kind.ownership.as_ref() else {
                continue;
            };
            if kind.base.is_some() || kind.target.is_some() {
                continue;
            }
            if lineage.iter().any(|k| k.name == ownership.principal) {
                embedded.push(kind);
            }
        }
        Ok(embedded)
    }

    /// Discriminator JSON property and value for a kind in a hierarchy.
    pub fn discriminator(&self, name: &str) -> ModelResult<Option<(&str, &Value)>> {
        let kind = self.require(name)?;
        let root = self.hierarchy_root(name)?;
        Ok(root
            .discriminator_property
            .as_deref()
            .zip(kind.discriminator_value.as_ref()))
    }

    /// Number of ownership hops from `name` to its document root.
    pub fn ownership_depth(&self, name: &str) -> ModelResult<usize> {
        let mut current = name;
        let mut depth = 0;
        while !self.is_document_root(current)? {
            let Some(ownership) = self.ownership(current)? else {
                break;
            };
            current = self.require(&ownership.principal)?.name.as_str();
            depth += 1;
            if depth > self.kinds.len() {
                return Err(ModelError::OwnershipCycle {
                    kind: name.to_string(),
                });
            }
        }
        Ok(depth)
    }

    // Returns the deepest ownership chain on success.
    fn validate(&self) -> ModelResult<usize> {
        for name in &self.order {
            self.lineage(name)?;
        }

        let mut max_depth = 0;
        for name in &self.order {
            let kind = &self.kinds[name];
            self.validate_derived(kind)?;
            max_depth = max_depth.max(self.ownership_depth(name)?);

            if kind.base.is_none() && self.is_document_root(name)? {
                self.target_name(name)?;
                if self.key_properties(name)?.is_empty() {
                    return Err(ModelError::MissingKey { kind: name.clone() });
                }
            }

            self.validate_json_names(name)?;

            if kind.discriminator_value.is_some()
                && self.hierarchy_root(name)?.discriminator_property.is_none()
            {
                return Err(ModelError::MissingDiscriminatorProperty { kind: name.clone() });
            }
        }
        Ok(max_depth)
    }

    fn validate_derived(&self, kind: &EntityKind) -> ModelResult<()> {
        if kind.base.is_none() {
            return Ok(());
        }
        let root = self.hierarchy_root(&kind.name)?;
        let settings = [
            (kind.ownership.is_some(), "ownership"),
            (kind.target.is_some(), "a target name"),
            (kind.discriminator_property.is_some(), "the discriminator property"),
        ];
        match settings.into_iter().find(|(set, _)| *set) {
            Some((_, setting)) => Err(ModelError::DerivedKindMapping {
                kind: kind.name.clone(),
                root: root.name.clone(),
                setting,
            }),
            None => Ok(()),
        }
    }

    fn validate_json_names(&self, name: &str) -> ModelResult<()> {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        let properties = self
            .properties(name)?
            .into_iter()
            .map(|p| (p.json_name.as_str(), p.name.as_str()));
        let navigations = self
            .embedded_kinds(name)?
            .into_iter()
            .filter_map(|k| {
                k.ownership
                    .as_ref()
                    .map(|o| (o.navigation.as_str(), k.name.as_str()))
            });

        for (json_name, member) in properties.chain(navigations) {
            if let Some(other) = seen.insert(json_name, member) {
                return Err(ModelError::JsonPropertyCollision {
                    kind: name.to_string(),
                    property: member.to_string(),
                    other: other.to_string(),
                    json_name: json_name.to_string(),
                });
            }
        }
        Ok(())
    }
}
