use std::path::PathBuf;

use crate::{
    any::{instance, Instance},
    preference::TypePreferences,
    shared::SharedInstances,
};

pub const REQUEST: &str = "Request";
pub const ROUTER: &str = "Router";
pub const VIEW_RENDERER: &str = "ViewRenderer";
pub const FACTORY: &str = "Factory";
pub const SERVICE_LOCATOR: &str = "ServiceLocator";

/// Process the locator is bootstrapped in.
pub trait Host {
    /// Ambient runtime objects, shared with every generated locator unless the caller already supplied the same name.
    #[must_use]
    fn default_instances(&self) -> SharedInstances;
}

/// Host without ambient objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHost;

impl Host for NoHost {
    #[inline]
    fn default_instances(&self) -> SharedInstances {
        SharedInstances::new()
    }
}

/// Host with a fixed set of ambient objects.
#[derive(Clone, Default)]
pub struct StaticHost {
    pub request: Option<Instance>,
    pub router: Option<Instance>,
    pub view_renderer: Option<Instance>,
    pub factory: Option<Instance>,
}

impl Host for StaticHost {
    fn default_instances(&self) -> SharedInstances {
        [
            (REQUEST, &self.request),
            (ROUTER, &self.router),
            (VIEW_RENDERER, &self.view_renderer),
            (FACTORY, &self.factory),
        ]
        .into_iter()
        .filter_map(|(name, instance)| instance.clone().map(|instance| (name, instance)))
        .collect()
    }
}

/// Read-only view of the locator, shared as [`SERVICE_LOCATOR`].
#[derive(Debug, Clone)]
pub struct LocatorHandle {
    pub symbol: String,
    pub primary_artifact_path: PathBuf,
    pub preferences: TypePreferences,
}

impl LocatorHandle {
    #[inline]
    #[must_use]
    pub fn get_type_preference<'a>(&'a self, name: &'a str) -> &'a str {
        self.preferences.resolve(name)
    }

    #[inline]
    #[must_use]
    pub(crate) fn into_instance(self) -> Instance {
        instance(self)
    }
}
