//! Weight-ordered step container.

use super::StepDefinition;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    sequence: u64,
    definition: StepDefinition,
}

/// Step definitions keyed by uuid, in insertion order until sorted.
///
/// [`sort`](Self::sort) orders by ascending weight; equal weights keep their
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<StepDefinition>", into = "Vec<StepDefinition>")]
pub struct StepCollection {
    entries: Vec<Entry>,
    next_sequence: u64,
}

impl StepCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition under `uuid`, replacing in place when it exists.
    pub fn add_instance_id(&mut self, uuid: impl Into<String>, mut definition: StepDefinition) {
        let uuid = uuid.into();
        definition.uuid.clone_from(&uuid);

        if let Some(entry) = self.entries.iter_mut().find(|e| e.definition.uuid == uuid) {
            entry.definition = definition;
            return;
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.push(Entry {
            sequence,
            definition,
        });
    }

    /// Adds a definition under its own uuid.
    pub fn push(&mut self, definition: StepDefinition) {
        let uuid = definition.uuid.clone();
        self.add_instance_id(uuid, definition);
    }

    /// Removes and returns the definition under `uuid`.
    pub fn remove_instance_id(&mut self, uuid: &str) -> Option<StepDefinition> {
        let index = self.entries.iter().position(|e| e.definition.uuid == uuid)?;
        Some(self.entries.remove(index).definition)
    }

    /// Returns the definition under `uuid`.
    #[must_use]
    pub fn get(&self, uuid: &str) -> Option<&StepDefinition> {
        self.entries
            .iter()
            .find(|e| e.definition.uuid == uuid)
            .map(|e| &e.definition)
    }

    /// Returns the definition under `uuid` mutably.
    pub fn get_mut(&mut self, uuid: &str) -> Option<&mut StepDefinition> {
        self.entries
            .iter_mut()
            .find(|e| e.definition.uuid == uuid)
            .map(|e| &mut e.definition)
    }

    /// Whether `uuid` is present.
    #[must_use]
    pub fn contains(&self, uuid: &str) -> bool {
        self.get(uuid).is_some()
    }

    /// Orders by ascending weight, ties by insertion order.
    pub fn sort(&mut self) {
        self.entries
            .sort_by_key(|e| (e.definition.weight, e.sequence));
    }

    /// Iterates in current order.
    pub fn iter(&self) -> impl Iterator<Item = &StepDefinition> {
        self.entries.iter().map(|e| &e.definition)
    }

    /// Uuids in current order.
    #[must_use]
    pub fn uuids(&self) -> Vec<String> {
        self.iter().map(|d| d.uuid.clone()).collect()
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<StepDefinition>> for StepCollection {
    fn from(definitions: Vec<StepDefinition>) -> Self {
        let mut collection = Self::new();
        for definition in definitions {
            collection.push(definition);
        }
        collection
    }
}

impl From<StepCollection> for Vec<StepDefinition> {
    fn from(collection: StepCollection) -> Self {
        collection.entries.into_iter().map(|e| e.definition).collect()
    }
}

impl FromIterator<StepDefinition> for StepCollection {
    fn from_iter<I: IntoIterator<Item = StepDefinition>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}
