use std::collections::BTreeMap;

use crate::any::Instance;

/// Instances of shared types created by a generated locator.
#[derive(Clone, Default)]
pub(crate) struct Cache {
    map: BTreeMap<String, Instance>,
}

impl Cache {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self { map: BTreeMap::new() }
    }

    #[inline]
    pub(crate) fn insert(&mut self, name: String, instance: Instance) -> Option<Instance> {
        self.map.insert(name, instance)
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, name: &str) -> Option<Instance> {
        self.map.get(name).cloned()
    }

    /// Copies instances of `other`, keeping the ones already present.
    pub(crate) fn inherit(&mut self, other: &Cache) {
        for (name, instance) in &other.map {
            self.map.entry(name.clone()).or_insert_with(|| instance.clone());
        }
    }

    #[inline]
    #[must_use]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}
