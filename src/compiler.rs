use std::{collections::BTreeSet, path::PathBuf};
use tracing::{debug, debug_span};

use crate::{
    definition::{Definition, DefinitionSet},
    errors::CompileErrorKind,
    preference::TypePreferences,
    source::{Catalog, TypeSource},
};

/// Decides which scanned types get definitions and whether their instances are shared.
pub trait IntrospectionStrategy: Send + Sync {
    #[must_use]
    fn include(&self, source: &TypeSource) -> bool {
        let _ = source;
        true
    }

    #[must_use]
    fn is_shared(&self, source: &TypeSource) -> bool {
        source.is_shared()
    }
}

/// Includes every scanned type and keeps the shared marker it's declared with.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultIntrospectionStrategy;

impl IntrospectionStrategy for DefaultIntrospectionStrategy {}

/// Result of a scan.
///
/// Types with reflection errors are left out of `definitions`, it's up to the caller to decide
/// whether the errors are fatal.
#[derive(Debug, Default)]
pub struct Compilation {
    pub definitions: DefinitionSet,
    pub reflection_errors: Vec<CompileErrorKind>,
}

pub trait DefinitionCompiler {
    /// Names of pre-existing instances. Parameters declared with these names are resolvable.
    fn set_shared_instances(&mut self, names: BTreeSet<String>);

    fn set_type_preferences(&mut self, preferences: TypePreferences) {
        let _ = preferences;
    }

    /// Scans types declared under `scan_directories` (all types if it's empty).
    ///
    /// # Errors
    /// Returns an error if the scan itself fails, reflection errors of single types are reported in [`Compilation`].
    fn compile(&self, scan_directories: &[PathBuf], strategy: &dyn IntrospectionStrategy) -> Result<Compilation, CompileErrorKind>;
}

/// Compiles definitions from the types registered in a [`Catalog`].
#[derive(Clone)]
pub struct CatalogCompiler {
    catalog: Catalog,
    shared: BTreeSet<String>,
    preferences: TypePreferences,
}

impl CatalogCompiler {
    #[inline]
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            shared: BTreeSet::new(),
            preferences: TypePreferences::default(),
        }
    }

    /// Whether a parameter declared with `declared_type` can be served by a shared instance or an included type.
    fn is_resolvable(&self, declared_type: &str, included: &BTreeSet<String>) -> bool {
        let preferred = self.preferences.resolve(declared_type);
        self.shared.contains(declared_type) || self.shared.contains(preferred) || included.contains(preferred)
    }

    fn check(&self, source: &TypeSource, included: &BTreeSet<String>) -> Result<(), CompileErrorKind> {
        for parameter in source.parameters() {
            if parameter.optional || parameter.is_array {
                continue;
            }
            let Some(declared_type) = &parameter.declared_type else {
                continue;
            };
            if !self.is_resolvable(declared_type, included) {
                return Err(CompileErrorKind::UnresolvableParameter {
                    name: source.name().to_owned(),
                    parameter: parameter.name.clone(),
                    declared_type: declared_type.clone(),
                });
            }
        }
        Ok(())
    }
}

fn in_scan_directories(source: &TypeSource, scan_directories: &[PathBuf]) -> bool {
    scan_directories.is_empty() || scan_directories.iter().any(|directory| source.origin().starts_with(directory))
}

impl DefinitionCompiler for CatalogCompiler {
    fn set_shared_instances(&mut self, names: BTreeSet<String>) {
        self.shared = names;
    }

    fn set_type_preferences(&mut self, preferences: TypePreferences) {
        self.preferences = preferences;
    }

    fn compile(&self, scan_directories: &[PathBuf], strategy: &dyn IntrospectionStrategy) -> Result<Compilation, CompileErrorKind> {
        let span = debug_span!("compile", directories = scan_directories.len());
        let _guard = span.enter();

        let mut sources: Vec<TypeSource> = self
            .catalog
            .snapshot()
            .into_iter()
            .filter(|source| in_scan_directories(source, scan_directories) && strategy.include(source))
            .collect();

        // Rejecting a type can make its dependents unresolvable, so checks repeat until nothing is rejected
        let mut reflection_errors = Vec::new();
        loop {
            let included: BTreeSet<String> = sources.iter().map(|source| source.name().to_owned()).collect();
            let rejected = reflection_errors.len();
            sources.retain(|source| match self.check(source, &included) {
                Ok(()) => true,
                Err(err) => {
                    reflection_errors.push(err);
                    false
                }
            });
            if reflection_errors.len() == rejected {
                break;
            }
        }

        let definitions: Vec<Definition> = sources
            .iter()
            .map(|source| Definition::compile(source, strategy.is_shared(source)))
            .collect();

        debug!(definitions = definitions.len(), errors = reflection_errors.len(), "Compiled");

        Ok(Compilation {
            definitions: definitions.into_iter().collect(),
            reflection_errors,
        })
    }
}
