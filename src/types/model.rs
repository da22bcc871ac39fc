//! Process-model graph elements and snapshots
//!
//! Elements carry a surrogate [`ElementId`] that is never derived from their
//! content. Set membership is decided by [`ModelElement::key`] alone: the name
//! for places and transitions, the `(source, target)` pair for edges.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Stable surrogate identifier of a model element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Generate a fresh, unique id
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A graph element whose equality is an explicit key, independent of its id
pub trait ModelElement: Clone {
    /// Semantic key used for set membership
    type Key: Ord + Clone + fmt::Debug;

    fn key(&self) -> Self::Key;
    fn id(&self) -> ElementId;
    /// Same element with a different id
    fn with_id(self, id: ElementId) -> Self;
}

/// State node of the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub id: ElementId,
    pub name: String,
}

impl Place {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ElementId::generate(),
            name: name.into(),
        }
    }
}

impl ModelElement for Place {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn id(&self) -> ElementId {
        self.id
    }

    fn with_id(self, id: ElementId) -> Self {
        Self { id, ..self }
    }
}

/// Activity node of the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub id: ElementId,
    pub name: String,
}

impl Transition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ElementId::generate(),
            name: name.into(),
        }
    }
}

impl ModelElement for Transition {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn id(&self) -> ElementId {
        self.id
    }

    fn with_id(self, id: ElementId) -> Self {
        Self { id, ..self }
    }
}

/// Flow connection between two nodes, referenced by name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: ElementId,
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: ElementId::generate(),
            source: source.into(),
            target: target.into(),
        }
    }
}

impl ModelElement for Edge {
    type Key = (String, String);

    fn key(&self) -> (String, String) {
        (self.source.clone(), self.target.clone())
    }

    fn id(&self) -> ElementId {
        self.id
    }

    fn with_id(self, id: ElementId) -> Self {
        Self { id, ..self }
    }
}

/// Set of elements keyed by [`ModelElement::key`]
///
/// Iteration follows key order, so serialized output is deterministic.
#[derive(Debug, Clone)]
pub struct ElementSet<T: ModelElement> {
    items: BTreeMap<T::Key, T>,
}

impl<T: ModelElement> Default for ElementSet<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<T: ModelElement> ElementSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an element; returns false and keeps the present one if its key exists
    pub fn insert(&mut self, element: T) -> bool {
        let key = element.key();
        if self.items.contains_key(&key) {
            return false;
        }
        self.items.insert(key, element);
        true
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.items.get(key)
    }

    pub fn contains(&self, element: &T) -> bool {
        self.items.contains_key(&element.key())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }

    /// Elements of `self` whose key is absent from `other`
    pub fn difference(&self, other: &ElementSet<T>) -> Vec<T> {
        self.items
            .iter()
            .filter(|(key, _)| !other.items.contains_key(*key))
            .map(|(_, element)| element.clone())
            .collect()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.values().cloned().collect()
    }
}

impl<T: ModelElement> FromIterator<T> for ElementSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for element in iter {
            set.insert(element);
        }
        set
    }
}

impl<T: ModelElement> IntoIterator for ElementSet<T> {
    type Item = T;
    type IntoIter = std::collections::btree_map::IntoValues<T::Key, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_values()
    }
}

impl<T: ModelElement + Serialize> Serialize for ElementSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.values())
    }
}

impl<'de, T: ModelElement + Deserialize<'de>> Deserialize<'de> for ElementSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<T>::deserialize(deserializer)?;
        Ok(items.into_iter().collect())
    }
}

/// The model of one log at one rebuild
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub places: ElementSet<Place>,
    pub transitions: ElementSet<Transition>,
    pub edges: ElementSet<Edge>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_place(&mut self, name: impl Into<String>) -> bool {
        self.places.insert(Place::new(name))
    }

    pub fn add_transition(&mut self, name: impl Into<String>) -> bool {
        self.transitions.insert(Transition::new(name))
    }

    pub fn add_edge(&mut self, source: impl Into<String>, target: impl Into<String>) -> bool {
        self.edges.insert(Edge::new(source, target))
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty() && self.transitions.is_empty() && self.edges.is_empty()
    }
}
