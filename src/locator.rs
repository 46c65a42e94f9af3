use std::{
    any::type_name,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};
use tracing::{debug, error, info_span, warn};
use uuid::Uuid;

use crate::{
    any::{Instance, Params},
    artifact::{ArtifactLoader, GeneratedLocator},
    compiler::{CatalogCompiler, Compilation, DefaultIntrospectionStrategy, DefinitionCompiler, IntrospectionStrategy},
    config::{artifact_path, Config},
    errors::{LocatorErrorKind, LookupErrorKind, RegenerateErrorKind, WriteErrorKind},
    generator::{symbol, ArtifactGenerator, JsonArtifactGenerator},
    host::{Host, LocatorHandle, SERVICE_LOCATOR},
    preference::TypePreferences,
    recovery::Lookup,
    shared::SharedInstances,
    source::Catalog,
};

/// Service locator backed by a generated artifact.
///
/// The locator owns the lifecycle of a single process:
/// [`Self::init`] loads the primary artifact (or builds it if it's missing),
/// and [`Self::get`] serves instances from it.
/// When a lookup shows that the artifact is outdated, the definitions are compiled again,
/// a fresh primary artifact is written and the lookup is retried once against a new locator.
///
/// The primary artifact symbol is bound for the whole process after it's loaded,
/// so the new locator of an in-request recovery is loaded from a uniquely named temporary artifact,
/// which is removed right after loading.
pub struct Locator<C = CatalogCompiler, G = JsonArtifactGenerator> {
    config: Config,
    preferences: TypePreferences,
    shared: SharedInstances,
    strategy: Box<dyn IntrospectionStrategy>,
    compiler: C,
    generator: G,
    loader: ArtifactLoader,
    current: Option<GeneratedLocator>,
    initialized: bool,
    regenerations: usize,
}

impl Locator {
    /// Creates locator which compiles definitions from `catalog` and renders JSON artifacts
    #[inline]
    #[must_use]
    pub fn new(config: Config, catalog: Catalog) -> Self {
        let compiler = CatalogCompiler::new(catalog.clone());
        Self::with_collaborators(config, catalog, compiler, JsonArtifactGenerator)
    }
}

impl<C, G> Locator<C, G>
where
    C: DefinitionCompiler,
    G: ArtifactGenerator,
{
    #[must_use]
    pub fn with_collaborators(config: Config, catalog: Catalog, compiler: C, generator: G) -> Self {
        let preferences = config.type_preferences();
        Self {
            loader: ArtifactLoader::new(catalog, preferences.clone()),
            preferences,
            config,
            shared: SharedInstances::new(),
            strategy: Box::new(DefaultIntrospectionStrategy),
            compiler,
            generator,
            current: None,
            initialized: false,
            regenerations: 0,
        }
    }

    /// Initializes the locator, it should be called once per process before any [`Self::get`].
    ///
    /// Default instances of the `host` are shared unless the caller already added instances with the same names.
    /// The primary artifact is loaded if it exists, otherwise it's compiled and written first.
    ///
    /// # Errors
    /// - Returns [`LocatorErrorKind::AlreadyInitialized`] if the locator is already initialized.
    /// - Returns [`LocatorErrorKind::Lookup`] if the primary artifact can't be loaded or regenerated.
    ///   The locator stays uninitialized in this case.
    pub fn init(&mut self, host: &impl Host) -> Result<(), LocatorErrorKind> {
        let span = info_span!("init", symbol = %self.primary_symbol());
        let _guard = span.enter();

        if self.initialized {
            let err = LocatorErrorKind::AlreadyInitialized;
            error!("{}", err);
            return Err(err);
        }

        let mut defaults = host.default_instances();
        defaults.insert(SERVICE_LOCATOR, self.handle().into_instance());
        self.shared.merge_missing(defaults);

        let path = self.config.primary_artifact_path();
        let locator = if path.exists() {
            debug!("Primary artifact found");
            self.loader
                .load(&path)
                .map(|mut locator| {
                    locator.inject_shared(&self.shared);
                    locator
                })
                .map_err(RegenerateErrorKind::from)
        } else {
            debug!("Primary artifact not found");
            self.regenerate(false)
        };
        let locator = locator.map_err(|err| {
            let err = LocatorErrorKind::from(err);
            error!("{}", err);
            err
        })?;

        self.current = Some(locator);
        self.initialized = true;
        debug!("Initialized");
        Ok(())
    }

    /// Adds instances shared with generated locators. Later calls override earlier ones for the same name.
    ///
    /// # Errors
    /// Returns [`LocatorErrorKind::NotAllowed`] if the locator is already initialized.
    pub fn add_shared_instances(&mut self, shared: SharedInstances) -> Result<(), LocatorErrorKind> {
        if self.initialized {
            let err = LocatorErrorKind::NotAllowed;
            error!("{}", err);
            return Err(err);
        }
        self.shared.merge(shared);
        Ok(())
    }

    /// Replaces the strategy used to scan types.
    ///
    /// # Warning
    /// The strategy is used only when definitions are compiled.
    /// If it's set after [`Self::init`], it applies to the next regeneration only.
    pub fn set_introspection_strategy(&mut self, strategy: impl IntrospectionStrategy + 'static) {
        if self.initialized {
            warn!("Introspection strategy set after init, it applies to the next regeneration only");
        }
        self.strategy = Box::new(strategy);
    }

    /// Returns the preferred type name for `name`, or `name` itself if there is no preference.
    #[inline]
    #[must_use]
    pub fn get_type_preference<'a>(&'a self, name: &'a str) -> &'a str {
        self.preferences.resolve(name)
    }

    /// Gets an instance by type or alias name.
    ///
    /// - `params` override constructor arguments of the requested type by parameter name.
    /// - If `new_instance` is `true`, a new instance is constructed even for shared types.
    ///   Otherwise instances of shared types are cached and reused.
    ///
    /// Outdated definitions are detected and regenerated transparently, the lookup is retried once.
    ///
    /// # Errors
    /// - Returns [`LocatorErrorKind::NotInitialized`] if the locator isn't initialized.
    /// - Returns [`LocatorErrorKind::Lookup`] if the type can't be resolved even after regeneration,
    ///   or the regeneration itself fails.
    /// - Returns [`LocatorErrorKind::Instantiate`] if a constructor fails.
    pub fn get(&mut self, name: &str, params: &Params, new_instance: bool) -> Result<Instance, LocatorErrorKind> {
        let span = info_span!("get", dependency = name, new_instance);
        let _guard = span.enter();

        let Some(current) = self.current.as_ref().filter(|_| self.initialized) else {
            let err = LocatorErrorKind::NotInitialized;
            error!("{}", err);
            return Err(err);
        };

        let resolved = self.preferences.resolve(name).to_owned();
        match Self::lookup(current, &resolved, params, new_instance)? {
            Lookup::Found(instance) => return Ok(instance),
            Lookup::NotFound { name } => debug!(missing = name.as_str(), "Not found in definitions, regenerating"),
            Lookup::SignatureMismatch => debug!("Signature mismatch, regenerating"),
        }

        let locator = self.regenerate(true).map_err(|err| {
            let err = LocatorErrorKind::from(err);
            error!("{}", err);
            err
        })?;
        let current = self.current.insert(locator);

        let err = match Self::lookup(current, &resolved, params, new_instance)? {
            Lookup::Found(instance) => return Ok(instance),
            Lookup::NotFound { name } => LookupErrorKind::NotFound { name },
            Lookup::SignatureMismatch => LookupErrorKind::Outdated { name: resolved },
        };
        error!("{}", err);
        Err(err.into())
    }

    /// Gets an instance with default params and downcasts it.
    ///
    /// # Errors
    /// - Returns [`LocatorErrorKind::IncorrectType`] if the instance isn't of type `T`.
    /// - Returns errors of [`Self::get`].
    pub fn get_as<T: Send + Sync + 'static>(&mut self, name: &str) -> Result<Arc<T>, LocatorErrorKind> {
        self.get(name, &Params::new(), false)?.downcast::<T>().map_err(|_| {
            let err = LocatorErrorKind::IncorrectType {
                name: name.to_owned(),
                expected: type_name::<T>(),
            };
            error!("{}", err);
            err
        })
    }

    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Count of regenerations made by this locator
    #[inline]
    #[must_use]
    pub fn regeneration_count(&self) -> usize {
        self.regenerations
    }

    #[inline]
    #[must_use]
    pub fn primary_artifact_path(&self) -> PathBuf {
        self.config.primary_artifact_path()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Symbol of the currently bound generated locator
    #[inline]
    #[must_use]
    pub fn current_symbol(&self) -> Option<&str> {
        self.current.as_ref().map(GeneratedLocator::symbol)
    }
}

impl<C, G> Locator<C, G>
where
    C: DefinitionCompiler,
    G: ArtifactGenerator,
{
    fn lookup(current: &GeneratedLocator, name: &str, params: &Params, new_instance: bool) -> Result<Lookup, LocatorErrorKind> {
        current.lookup(name, params, new_instance).map_err(|err| {
            error!("{}", err);
            err.into()
        })
    }

    fn primary_symbol(&self) -> String {
        symbol(&self.config.namespace, &self.config.class_name)
    }

    fn handle(&self) -> LocatorHandle {
        LocatorHandle {
            symbol: self.primary_symbol(),
            primary_artifact_path: self.config.primary_artifact_path(),
            preferences: self.preferences.clone(),
        }
    }

    /// Compiles definitions, writes a fresh primary artifact and loads a new locator.
    ///
    /// With `recover_from_outdated_definitions` the primary artifact symbol is considered bound already,
    /// so the locator is loaded from a temporary artifact and inherits the cache of the current one.
    fn regenerate(&mut self, recover_from_outdated_definitions: bool) -> Result<GeneratedLocator, RegenerateErrorKind> {
        let span = info_span!("regenerate", recover = recover_from_outdated_definitions);
        let _guard = span.enter();

        let started = Instant::now();
        self.regenerations += 1;

        let shared_targets: Vec<String> = self.shared.names().map(ToOwned::to_owned).collect();
        self.compiler.set_shared_instances(shared_targets.iter().cloned().collect());
        self.compiler.set_type_preferences(self.preferences.clone());

        let Compilation {
            definitions,
            reflection_errors,
        } = self.compiler.compile(&self.config.scan_directories, self.strategy.as_ref())?;
        for err in reflection_errors {
            if !self.config.tolerate_reflection_errors {
                return Err(err.into());
            }
            warn!(%err, "Reflection error tolerated, definition skipped");
        }
        debug!(definitions = definitions.len(), elapsed = ?started.elapsed(), "Definitions compiled");

        let write_path = &self.config.write_path;
        fs::create_dir_all(write_path).map_err(|source| WriteErrorKind::Io {
            path: write_path.clone(),
            source,
        })?;

        let primary_path = self.config.primary_artifact_path();
        self.generator
            .render(&definitions, &shared_targets, &self.config.class_name, &self.config.namespace)
            .write(&primary_path)?;

        let mut locator = if recover_from_outdated_definitions {
            let class_name = format!("{}_{}", self.config.class_name, Uuid::new_v4().simple());
            let temporary = TemporaryArtifact::new(artifact_path(write_path, &class_name));

            self.generator
                .render(&definitions, &shared_targets, &class_name, &self.config.namespace)
                .write(temporary.path())?;
            let locator = self.loader.load(temporary.path())?;
            if let Some(previous) = &self.current {
                locator.inherit_cache(previous);
            }
            temporary.remove();
            locator
        } else {
            self.loader.load(&primary_path)?
        };
        locator.inject_shared(&self.shared);

        debug!(symbol = locator.symbol(), elapsed = ?started.elapsed(), "Regenerated");
        Ok(locator)
    }
}

/// Artifact file removed when the guard is dropped, on every exit path.
struct TemporaryArtifact {
    path: PathBuf,
}

impl TemporaryArtifact {
    #[inline]
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[inline]
    fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    fn remove(self) {
        drop(self);
    }
}

impl Drop for TemporaryArtifact {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Temporary artifact removed"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.path.display(), %err, "Failed to remove temporary artifact"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Locator;
    use crate::{
        any::{instance, Instance, Params},
        compiler::{DefaultIntrospectionStrategy, IntrospectionStrategy},
        config::Config,
        errors::{CompileErrorKind, LocatorErrorKind, LookupErrorKind, RegenerateErrorKind, WriteErrorKind},
        host::{LocatorHandle, NoHost, StaticHost, REQUEST, SERVICE_LOCATOR},
        shared::SharedInstances,
        source::{Catalog, Parameter, TypeSource},
    };

    use std::{fs, path::Path, sync::Arc};
    use tempfile::TempDir;
    use tracing_test::traced_test;

    struct Db;
    struct Repo(Arc<Db>);

    fn catalog() -> Catalog {
        Catalog::new()
            .with(TypeSource::new("Db", |_| Ok(Db)).shared())
            .with(TypeSource::new("Repo", |arguments| Ok(Repo(arguments.get::<Db>(0)?))).with_parameter(Parameter::typed("db", "Db")))
    }

    fn artifacts(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    #[traced_test]
    fn test_get_before_init() {
        let dir = TempDir::new().unwrap();
        let mut locator = Locator::new(Config::new(dir.path()), catalog());

        assert!(matches!(
            locator.get("Db", &Params::new(), false),
            Err(LocatorErrorKind::NotInitialized)
        ));
        assert_eq!(locator.regeneration_count(), 0);
    }

    #[test]
    #[traced_test]
    fn test_init_builds_primary_artifact() {
        let dir = TempDir::new().unwrap();
        let mut locator = Locator::new(Config::new(dir.path()), catalog());

        locator.init(&NoHost).unwrap();

        assert!(locator.is_initialized());
        assert_eq!(locator.regeneration_count(), 1);
        assert_eq!(artifacts(dir.path()), ["ApplicationLocator.json"]);
        assert_eq!(locator.current_symbol(), Some("generated::ApplicationLocator"));
        assert!(matches!(locator.init(&NoHost), Err(LocatorErrorKind::AlreadyInitialized)));
    }

    #[test]
    #[traced_test]
    fn test_init_reuses_primary_artifact() {
        let dir = TempDir::new().unwrap();
        Locator::new(Config::new(dir.path()), catalog()).init(&NoHost).unwrap();

        let mut locator = Locator::new(Config::new(dir.path()), catalog());
        locator.init(&NoHost).unwrap();

        assert_eq!(locator.regeneration_count(), 0);
        assert!(locator.get_as::<Repo>("Repo").is_ok());
    }

    #[test]
    #[traced_test]
    fn test_init_failure_leaves_uninitialized() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog().with(TypeSource::new("Mailer", |_| Ok(())).with_parameter(Parameter::typed("transport", "Transport")));
        let mut locator = Locator::new(Config::new(dir.path()), catalog);

        let err = locator.init(&NoHost).unwrap_err();

        assert!(matches!(
            err,
            LocatorErrorKind::Lookup(LookupErrorKind::Regenerate(RegenerateErrorKind::Compile(
                CompileErrorKind::UnresolvableParameter { .. }
            )))
        ));
        assert!(!locator.is_initialized());
        assert!(matches!(locator.get("Db", &Params::new(), false), Err(LocatorErrorKind::NotInitialized)));
        assert!(artifacts(dir.path()).is_empty());
    }

    #[test]
    #[traced_test]
    fn test_init_tolerates_reflection_errors() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog().with(TypeSource::new("Mailer", |_| Ok(())).with_parameter(Parameter::typed("transport", "Transport")));
        let mut locator = Locator::new(Config::new(dir.path()).with_tolerate_reflection_errors(true), catalog);

        locator.init(&NoHost).unwrap();

        assert!(locator.get_as::<Db>("Db").is_ok());
        assert!(logs_contain("Reflection error tolerated"));
    }

    #[test]
    #[traced_test]
    fn test_add_shared_instances() {
        let dir = TempDir::new().unwrap();
        let mut locator = Locator::new(Config::new(dir.path()), catalog());
        let db = instance(Db);

        locator.add_shared_instances(SharedInstances::new().with("Db", instance(Db))).unwrap();
        locator.add_shared_instances(SharedInstances::new().with("Db", db.clone())).unwrap();
        locator.init(&NoHost).unwrap();

        let repo = locator.get_as::<Repo>("Repo").unwrap();
        assert!(Arc::ptr_eq(&(repo.0.clone() as Instance), &db));

        assert!(matches!(
            locator.add_shared_instances(SharedInstances::new()),
            Err(LocatorErrorKind::NotAllowed)
        ));
        assert!(matches!(
            locator.add_shared_instances(SharedInstances::new().with("Clock", instance(()))),
            Err(LocatorErrorKind::NotAllowed)
        ));
    }

    #[test]
    #[traced_test]
    fn test_host_default_instances() {
        let dir = TempDir::new().unwrap();
        let caller_request = instance("caller");
        let host = StaticHost {
            request: Some(instance("host")),
            ..StaticHost::default()
        };
        let mut locator = Locator::new(Config::new(dir.path()).with_preference("Storage", "Db"), catalog());

        locator
            .add_shared_instances(SharedInstances::new().with(REQUEST, caller_request.clone()))
            .unwrap();
        locator.init(&host).unwrap();

        let request = locator.get(REQUEST, &Params::new(), false).unwrap();
        assert!(Arc::ptr_eq(&request, &caller_request));

        let handle = locator.get_as::<LocatorHandle>(SERVICE_LOCATOR).unwrap();
        assert_eq!(handle.symbol, "generated::ApplicationLocator");
        assert_eq!(handle.get_type_preference("Storage"), "Db");
    }

    #[test]
    #[traced_test]
    fn test_get_type_preference() {
        let dir = TempDir::new().unwrap();
        let mut locator = Locator::new(Config::new(dir.path()).with_preference("Storage", "Db"), catalog());

        assert_eq!(locator.get_type_preference("Storage"), "Db");
        assert_eq!(locator.get_type_preference("Storage"), "Db");
        assert_eq!(locator.get_type_preference("Repo"), "Repo");

        locator.init(&NoHost).unwrap();
        let db = locator.get("Db", &Params::new(), false).unwrap();
        let storage = locator.get("Storage", &Params::new(), false).unwrap();
        assert!(Arc::ptr_eq(&db, &storage));
    }

    #[test]
    #[traced_test]
    fn test_get_shared_and_new_instance() {
        let dir = TempDir::new().unwrap();
        let mut locator = Locator::new(Config::new(dir.path()), catalog());
        locator.init(&NoHost).unwrap();

        let first = locator.get("Db", &Params::new(), false).unwrap();
        let second = locator.get("Db", &Params::new(), false).unwrap();
        let fresh = locator.get("Db", &Params::new(), true).unwrap();
        let other_fresh = locator.get("Db", &Params::new(), true).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &fresh));
        assert!(!Arc::ptr_eq(&fresh, &other_fresh));
        assert_eq!(locator.regeneration_count(), 1);
    }

    #[test]
    #[traced_test]
    fn test_get_missing_type() {
        let dir = TempDir::new().unwrap();
        let mut locator = Locator::new(Config::new(dir.path()), catalog());
        locator.init(&NoHost).unwrap();

        let err = locator.get("Widget", &Params::new(), false).unwrap_err();

        assert!(matches!(err, LocatorErrorKind::Lookup(LookupErrorKind::NotFound { name }) if name == "Widget"));
        assert_eq!(locator.regeneration_count(), 2);
        assert_eq!(artifacts(dir.path()), ["ApplicationLocator.json"]);
    }

    #[test]
    #[traced_test]
    fn test_get_regeneration_compile_failure() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog();
        let mut locator = Locator::new(Config::new(dir.path()), catalog.clone());
        locator.init(&NoHost).unwrap();

        catalog.register(TypeSource::new("Mailer", |_| Ok(())).with_parameter(Parameter::typed("transport", "Transport")));
        let err = locator.get("Mailer", &Params::new(), false).unwrap_err();

        assert!(matches!(
            err,
            LocatorErrorKind::Lookup(LookupErrorKind::Regenerate(RegenerateErrorKind::Compile(
                CompileErrorKind::UnresolvableParameter { name, .. }
            ))) if name == "Mailer"
        ));
        assert_eq!(locator.regeneration_count(), 2);
        assert_eq!(artifacts(dir.path()), ["ApplicationLocator.json"]);
        assert_eq!(locator.current_symbol(), Some("generated::ApplicationLocator"));
        assert!(locator.get_as::<Repo>("Repo").is_ok());
    }

    #[test]
    #[traced_test]
    fn test_get_regeneration_write_failure() {
        let dir = TempDir::new().unwrap();
        let write_path = dir.path().join("locator");
        let catalog = catalog();
        let mut locator = Locator::new(Config::new(&write_path), catalog.clone());
        locator.init(&NoHost).unwrap();

        fs::remove_dir_all(&write_path).unwrap();
        fs::write(&write_path, b"").unwrap();
        catalog.register(TypeSource::new("Clock", |_| Ok(())));
        let err = locator.get("Clock", &Params::new(), false).unwrap_err();

        assert!(matches!(
            err,
            LocatorErrorKind::Lookup(LookupErrorKind::Regenerate(RegenerateErrorKind::Write(WriteErrorKind::Io { .. })))
        ));
        assert_eq!(artifacts(dir.path()), ["locator"]);
        assert!(locator.get_as::<Db>("Db").is_ok());
    }

    #[test]
    #[traced_test]
    fn test_get_instantiate_error_skips_regeneration() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog().with(TypeSource::new("Mailer", |_| Err::<(), _>(anyhow::anyhow!("transport unavailable").into())));
        let mut locator = Locator::new(Config::new(dir.path()), catalog);
        locator.init(&NoHost).unwrap();

        assert!(matches!(
            locator.get("Mailer", &Params::new(), false),
            Err(LocatorErrorKind::Instantiate(_))
        ));
        assert_eq!(locator.regeneration_count(), 1);
    }

    #[test]
    #[traced_test]
    fn test_strategy_set_after_init_applies_to_next_regeneration() {
        struct Excluding(&'static str);

        impl IntrospectionStrategy for Excluding {
            fn include(&self, source: &TypeSource) -> bool {
                source.name() != self.0
            }
        }

        let dir = TempDir::new().unwrap();
        let mut locator = Locator::new(Config::new(dir.path()), catalog());
        locator.set_introspection_strategy(Excluding("Repo"));
        locator.init(&NoHost).unwrap();

        assert!(locator.get("Repo", &Params::new(), false).is_err());

        locator.set_introspection_strategy(DefaultIntrospectionStrategy);
        assert!(logs_contain("applies to the next regeneration only"));

        assert!(locator.get_as::<Repo>("Repo").is_ok());
        assert_eq!(locator.regeneration_count(), 3);
    }
}
