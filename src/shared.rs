use std::collections::{btree_map, BTreeMap};

use crate::any::Instance;

/// Pre-existing instances keyed by type or alias name.
///
/// Every generated locator receives these instances in its shared slots,
/// so a dependency declared with one of these names is served by identity instead of being constructed.
#[derive(Clone, Default)]
pub struct SharedInstances {
    map: BTreeMap<String, Instance>,
}

impl SharedInstances {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { map: BTreeMap::new() }
    }

    /// Inserts an instance, returning the previous one with the same name.
    #[inline]
    pub fn insert(&mut self, name: impl Into<String>, instance: Instance) -> Option<Instance> {
        self.map.insert(name.into(), instance)
    }

    #[inline]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, instance: Instance) -> Self {
        self.insert(name, instance);
        self
    }

    /// Merges `other` into `self`. Names from `other` override existing ones.
    #[inline]
    pub fn merge(&mut self, other: SharedInstances) {
        self.map.extend(other.map);
    }

    /// Merges `other` into `self`, keeping the existing instance when a name is already present.
    pub(crate) fn merge_missing(&mut self, other: SharedInstances) {
        for (name, instance) in other.map {
            if let btree_map::Entry::Vacant(entry) = self.map.entry(name) {
                entry.insert(instance);
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.map.get(name)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Instance)> {
        self.map.iter().map(|(name, instance)| (name.as_str(), instance))
    }
}

impl<N: Into<String>> FromIterator<(N, Instance)> for SharedInstances {
    fn from_iter<I: IntoIterator<Item = (N, Instance)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().map(|(name, instance)| (name.into(), instance)).collect(),
        }
    }
}
