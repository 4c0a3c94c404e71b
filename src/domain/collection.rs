//! Insertion-ordered, deduplicated child records attached to a request.

use std::collections::HashSet;

use serde::{Serialize, Serializer};

/// A child record identified by its name.
pub trait NamedRecord {
    fn with_name(name: &str) -> Self;

    fn name(&self) -> &str;
}

/// CPU architecture a request builds for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Architecture {
    pub name: String,
}

impl NamedRecord for Architecture {
    fn with_name(name: &str) -> Self {
        Architecture {
            name: name.to_string(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Extra tag applied to the built index image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BuildTag {
    pub name: String,
}

impl NamedRecord for BuildTag {
    fn with_name(name: &str) -> Self {
        BuildTag {
            name: name.to_string(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Grow-only set of named records that remembers first-insertion order.
///
/// Serializes as the list of names.
#[derive(Debug, Clone)]
pub struct OrderedUnique<T: NamedRecord> {
    items: Vec<T>,
    index: HashSet<String>,
}

impl<T: NamedRecord> OrderedUnique<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            index: HashSet::new(),
        }
    }

    /// Add a record named `name`. Returns false if it was already present.
    pub fn add(&mut self, name: &str) -> bool {
        if self.index.contains(name) {
            return false;
        }
        self.index.insert(name.to_string());
        self.items.push(T::with_name(name));
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains(name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.name()).collect()
    }
}

impl<T: NamedRecord> Default for OrderedUnique<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NamedRecord> std::ops::Index<usize> for OrderedUnique<T> {
    type Output = T;

    fn index(&self, idx: usize) -> &T {
        &self.items[idx]
    }
}

impl<'a, T: NamedRecord> IntoIterator for &'a OrderedUnique<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: NamedRecord> Serialize for OrderedUnique<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.iter().map(|i| i.name()))
    }
}
