//! Projection of tracked entries onto document bodies.

use crate::error::{ProjectionError, ProjectionResult};
use crate::options::SaveOptions;
use docbridge_model::{EntityKind, Model};
use docbridge_tracking::{EntryTracker, TrackedEntry};
use docbridge_types::{Document, EntryState};
use serde_json::Value;
use std::sync::Arc;

const ESCAPE: char = '^';

/// Builds document bodies and identities from tracked entries.
///
/// Property values are written under their JSON names and owned entries are
/// embedded under their navigation names, recursively.
#[derive(Debug, Clone)]
pub struct DocumentProjector {
    model: Arc<Model>,
    options: SaveOptions,
}

impl DocumentProjector {
    pub fn new(model: Arc<Model>, options: SaveOptions) -> Self {
        Self { model, options }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn options(&self) -> &SaveOptions {
        &self.options
    }

    /// Container the documents of a root kind are written to.
    pub fn target_name(&self, kind: &str) -> ProjectionResult<&str> {
        Ok(self.model.target_name(kind)?)
    }

    /// Document id: the entry's key values joined with the key separator.
    ///
    /// The separator and the escape character `^` are escaped with `^`
    /// inside values, so distinct key tuples never produce the same id.
    /// Values are rendered untyped: the string `"7"` and the number `7`
    /// both yield `7`. Objects and arrays are rejected.
    pub fn identity(&self, entry: &TrackedEntry) -> ProjectionResult<String> {
        let separator = self.options.key_separator;
        let mut id = String::new();
        for (i, property) in self.model.key_properties(entry.kind())?.iter().enumerate() {
            let value = match entry.value(&property.name) {
                None | Some(Value::Null) => {
                    return Err(ProjectionError::MissingKeyValue {
                        kind: entry.kind().to_string(),
                        property: property.name.clone(),
                    });
                }
                Some(Value::String(s)) => s.clone(),
                Some(Value::Array(_) | Value::Object(_)) => {
                    return Err(ProjectionError::NonScalarKeyValue {
                        kind: entry.kind().to_string(),
                        property: property.name.clone(),
                    });
                }
                Some(other) => other.to_string(),
            };
            if i > 0 {
                id.push(separator);
            }
            for c in value.chars() {
                if c == separator || c == ESCAPE {
                    id.push(ESCAPE);
                }
                id.push(c);
            }
        }
        Ok(id)
    }

    /// Renders an entry's key values (or all values if the kind has no
    /// key) for diagnostics.
    pub fn describe_keys(&self, entry: &TrackedEntry) -> String {
        let keys = self.model.key_properties(entry.kind()).unwrap_or_default();
        let pairs: Vec<String> = if keys.is_empty() {
            entry
                .values()
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .collect()
        } else {
            keys.iter()
                .map(|p| {
                    let value = entry.value(&p.name).unwrap_or(&Value::Null);
                    format!("{}: {}", p.name, value)
                })
                .collect()
        };
        format!("{{{}}}", pairs.join(", "))
    }

    /// Body last written for the entry.
    pub fn current_body<'e>(&self, entry: &'e TrackedEntry) -> Option<&'e Document> {
        entry.document()
    }

    /// Projects the full body of an entry and its embedded entries.
    pub fn build_body(
        &self,
        tracker: &EntryTracker,
        entry: &TrackedEntry,
    ) -> ProjectionResult<Document> {
        let mut body = Document::new();
        for property in self.model.properties(entry.kind())? {
            if let Some(value) = entry.value(&property.name) {
                body.insert(property.json_name.clone(), value.clone());
            }
        }

        for embedded in self.model.embedded_kinds(entry.kind())? {
            if let Some(ownership) = embedded.ownership.as_ref() {
                let value = self.project_navigation(tracker, entry, embedded)?;
                body.insert(ownership.navigation.clone(), value);
            }
        }

        if let Some((property, value)) = self.root_discriminator(entry.kind())? {
            body.insert(property.to_string(), value.clone());
        }
        Ok(body)
    }

    /// Applies an entry's pending changes to a previously written body.
    ///
    /// Returns `None` when the body already reflects the entry.
    pub fn merge_body(
        &self,
        tracker: &EntryTracker,
        existing: &Document,
        entry: &TrackedEntry,
    ) -> ProjectionResult<Option<Document>> {
        let mut body = existing.clone();
        let mut changed = false;

        for property in self.model.properties(entry.kind())? {
            if entry.state() != EntryState::Added && !entry.is_modified(&property.name) {
                continue;
            }
            let value = entry.value(&property.name).cloned().unwrap_or(Value::Null);
            changed |= set_if_different(&mut body, &property.json_name, value);
        }

        for embedded in self.model.embedded_kinds(entry.kind())? {
            let Some(ownership) = embedded.ownership.as_ref() else {
                continue;
            };
            let dirty = tracker
                .children_of(entry.id(), &embedded.name)
                .into_iter()
                .any(|child| self.subtree_changed(tracker, child));
            if dirty {
                let value = self.project_navigation(tracker, entry, embedded)?;
                changed |= set_if_different(&mut body, &ownership.navigation, value);
            }
        }

        if let Some((property, value)) = self.root_discriminator(entry.kind())? {
            changed |= set_if_different(&mut body, property, value.clone());
        }

        Ok(changed.then_some(body))
    }

    fn project_navigation(
        &self,
        tracker: &EntryTracker,
        owner: &TrackedEntry,
        embedded: &EntityKind,
    ) -> ProjectionResult<Value> {
        let collection = embedded.ownership.as_ref().is_some_and(|o| o.collection);
        let mut children = tracker
            .children_of(owner.id(), &embedded.name)
            .into_iter()
            .filter(|child| child.state() != EntryState::Deleted);

        if collection {
            let items = children
                .map(|child| self.build_body(tracker, child).map(Value::Object))
                .collect::<ProjectionResult<Vec<_>>>()?;
            Ok(Value::Array(items))
        } else {
            match children.next() {
                Some(child) => Ok(Value::Object(self.build_body(tracker, child)?)),
                None => Ok(Value::Null),
            }
        }
    }

    fn subtree_changed(&self, tracker: &EntryTracker, entry: &TrackedEntry) -> bool {
        entry.state().has_pending_changes()
            || tracker
                .entries()
                .filter(|e| e.principal() == Some(entry.id()))
                .any(|child| self.subtree_changed(tracker, child))
    }

    fn root_discriminator(&self, kind: &str) -> ProjectionResult<Option<(&str, &Value)>> {
        if !self.model.is_document_root(kind)? {
            return Ok(None);
        }
        Ok(self.model.discriminator(kind)?)
    }
}

fn set_if_different(body: &mut Document, name: &str, value: Value) -> bool {
    if body.get(name) == Some(&value) {
        return false;
    }
    body.insert(name.to_string(), value);
    true
}
