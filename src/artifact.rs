use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
    sync::Arc,
};
use tracing::{debug, debug_span, warn};

use crate::{
    any::{Instance, Params},
    cache::Cache,
    definition::{Definition, DefinitionSet},
    errors::{InstantiateErrorKind, LoadErrorKind},
    generator::ArtifactSource,
    preference::TypePreferences,
    recovery::{classify, Lookup},
    shared::SharedInstances,
    source::{Arguments, Catalog},
};

/// Binds loaded artifacts to the process.
///
/// A symbol can be bound only once, like a type that can't be redefined after it's loaded.
pub struct ArtifactLoader {
    catalog: Catalog,
    preferences: TypePreferences,
    bound: BTreeSet<String>,
}

impl ArtifactLoader {
    #[inline]
    #[must_use]
    pub fn new(catalog: Catalog, preferences: TypePreferences) -> Self {
        Self {
            catalog,
            preferences,
            bound: BTreeSet::new(),
        }
    }

    /// Reads the artifact at `path` and binds its symbol.
    ///
    /// # Errors
    /// - Returns [`LoadErrorKind::SymbolAlreadyBound`] if the artifact symbol is already bound.
    /// - Returns [`LoadErrorKind::Io`] or [`LoadErrorKind::Parse`] if the artifact can't be read.
    pub fn load(&mut self, path: &Path) -> Result<GeneratedLocator, LoadErrorKind> {
        let source = ArtifactSource::read(path)?;
        let symbol = source.symbol();
        if self.bound.contains(&symbol) {
            return Err(LoadErrorKind::SymbolAlreadyBound { symbol });
        }
        self.bound.insert(symbol);

        let locator = GeneratedLocator::new(source, self.catalog.clone(), self.preferences.clone());
        debug!(symbol = locator.symbol(), definitions = locator.definitions.len(), "Artifact loaded");
        Ok(locator)
    }

    #[inline]
    #[must_use]
    pub fn is_bound(&self, symbol: &str) -> bool {
        self.bound.contains(symbol)
    }
}

/// Locator built from a loaded artifact.
pub struct GeneratedLocator {
    symbol: String,
    definitions: DefinitionSet,
    shared_targets: Vec<String>,
    shared: BTreeMap<String, Instance>,
    cache: Mutex<Cache>,
    catalog: Catalog,
    preferences: TypePreferences,
}

impl GeneratedLocator {
    #[must_use]
    fn new(source: ArtifactSource, catalog: Catalog, preferences: TypePreferences) -> Self {
        Self {
            symbol: source.symbol(),
            definitions: source.definitions,
            shared_targets: source.shared_targets,
            shared: BTreeMap::new(),
            cache: Mutex::new(Cache::new()),
            catalog,
            preferences,
        }
    }

    #[inline]
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Fills the shared slot for `name`.
    #[inline]
    pub fn set_shared(&mut self, name: impl Into<String>, instance: Instance) {
        self.shared.insert(name.into(), instance);
    }

    pub(crate) fn inject_shared(&mut self, shared: &SharedInstances) {
        for (name, instance) in shared.iter() {
            self.set_shared(name, instance.clone());
        }
        for target in &self.shared_targets {
            if !self.shared.contains_key(target) {
                warn!(shared_target = target.as_str(), "Shared target has no instance");
            }
        }
    }

    /// Copies instances cached by `previous`, so shared objects survive the swap of locators.
    pub(crate) fn inherit_cache(&self, previous: &GeneratedLocator) {
        let previous = previous.cache.lock();
        self.cache.lock().inherit(&previous);
        debug!(inherited = previous.len(), "Cache inherited");
    }

    /// Count of cached instances of shared types
    #[inline]
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache.lock().len()
    }

    /// Looks up an instance by name.
    ///
    /// `params` override the constructor arguments of the requested type by parameter name,
    /// a lookup with params neither reads nor fills the cache.
    /// With `new_instance` a shared type is constructed again and the result isn't cached.
    ///
    /// # Errors
    /// Returns an error if a constructor fails for a reason other than a signature mismatch.
    pub fn lookup(&self, name: &str, params: &Params, new_instance: bool) -> Result<Lookup, InstantiateErrorKind> {
        let mut resolving = Vec::new();
        self.resolve(name, Some(params), new_instance, &mut resolving)
    }

    fn resolve(
        &self,
        name: &str,
        params: Option<&Params>,
        new_instance: bool,
        resolving: &mut Vec<String>,
    ) -> Result<Lookup, InstantiateErrorKind> {
        let span = debug_span!("resolve", dependency = name);
        let _guard = span.enter();

        let definition = self.definitions.get(name);
        // A fresh instance of a compiled type is constructed even if a shared slot is filled
        let constructs_fresh = new_instance && params.is_some() && definition.is_some();
        if !constructs_fresh {
            if let Some(instance) = self.shared.get(name) {
                debug!("Found in shared slots");
                return Ok(Lookup::Found(instance.clone()));
            }
        }

        let Some(definition) = definition else {
            debug!("Not found in definitions");
            return Ok(Lookup::NotFound { name: name.to_owned() });
        };

        let cacheable = definition.shared && !new_instance && params.map_or(true, Params::is_empty);
        if cacheable {
            if let Some(instance) = self.cache.lock().get(name) {
                debug!("Found in cache");
                return Ok(Lookup::Found(instance));
            }
        }

        if resolving.iter().any(|resolving_name| resolving_name == name) {
            let mut path = resolving.clone();
            path.push(name.to_owned());
            return Err(InstantiateErrorKind::CyclicDependency { path });
        }

        resolving.push(name.to_owned());
        let lookup = self.instantiate(definition, params, resolving);
        resolving.pop();

        let instance = match lookup? {
            Lookup::Found(instance) => instance,
            stale => return Ok(stale),
        };
        if cacheable {
            self.cache.lock().insert(name.to_owned(), instance.clone());
            debug!("Cached");
        }
        Ok(Lookup::Found(instance))
    }

    fn resolve_dependency(&self, declared_type: &str, resolving: &mut Vec<String>) -> Result<Lookup, InstantiateErrorKind> {
        if let Some(instance) = self.shared.get(declared_type) {
            return Ok(Lookup::Found(instance.clone()));
        }
        self.resolve(self.preferences.resolve(declared_type), None, false, resolving)
    }

    fn instantiate(
        &self,
        definition: &Definition,
        params: Option<&Params>,
        resolving: &mut Vec<String>,
    ) -> Result<Lookup, InstantiateErrorKind> {
        let mut values = Vec::with_capacity(definition.parameters.len());
        for parameter in &definition.parameters {
            if let Some(value) = params.and_then(|params| params.get(&parameter.name)) {
                values.push(Some(value.clone()));
                continue;
            }
            if parameter.is_array {
                values.push(Some(Arc::new(Vec::<Instance>::new()) as Instance));
                continue;
            }
            let Some(declared_type) = &parameter.declared_type else {
                values.push(None);
                continue;
            };
            match self.resolve_dependency(declared_type, resolving)? {
                Lookup::Found(instance) => values.push(Some(instance)),
                Lookup::NotFound { .. } if parameter.optional => values.push(None),
                stale => return Ok(stale),
            }
        }

        let Some(source) = self.catalog.get(&definition.name) else {
            return Err(InstantiateErrorKind::MissingConstructor {
                name: definition.name.clone(),
            });
        };
        classify(source.construct(&Arguments::new(values)))
    }
}
