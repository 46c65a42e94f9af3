use serde::Deserialize;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::preference::TypePreferences;

/// Locator config
/// ## Fields
/// - `write_path`:
///   Directory the primary artifact is written to and loaded from.
///   Temporary artifacts of in-request recoveries are written there too, and removed right after loading.
/// - `class_name`, `namespace`:
///   Name of the primary artifact and the symbol it's bound with, `namespace::class_name`.
/// - `scan_directories`:
///   Only types declared under these directories get definitions. All types are scanned if it's empty.
/// - `preferences`:
///   Alias to concrete type name substitutions.
/// - `tolerate_reflection_errors`:
///   If `true`, types with unresolvable parameters are skipped instead of failing the compilation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub write_path: PathBuf,
    pub class_name: String,
    pub namespace: String,
    pub scan_directories: Vec<PathBuf>,
    pub preferences: BTreeMap<String, String>,
    pub tolerate_reflection_errors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            write_path: PathBuf::from("data/locator"),
            class_name: "ApplicationLocator".to_owned(),
            namespace: "generated".to_owned(),
            scan_directories: Vec::new(),
            preferences: BTreeMap::new(),
            tolerate_reflection_errors: false,
        }
    }
}

impl Config {
    #[inline]
    #[must_use]
    pub fn new(write_path: impl Into<PathBuf>) -> Self {
        Self {
            write_path: write_path.into(),
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_scan_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.scan_directories.push(directory.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_preference(mut self, alias: impl Into<String>, concrete: impl Into<String>) -> Self {
        self.preferences.insert(alias.into(), concrete.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_tolerate_reflection_errors(mut self, tolerate: bool) -> Self {
        self.tolerate_reflection_errors = tolerate;
        self
    }

    #[inline]
    #[must_use]
    pub fn type_preferences(&self) -> TypePreferences {
        TypePreferences::new(self.preferences.clone())
    }

    #[inline]
    #[must_use]
    pub fn primary_artifact_path(&self) -> PathBuf {
        artifact_path(&self.write_path, &self.class_name)
    }
}

#[inline]
#[must_use]
pub(crate) fn artifact_path(write_path: &Path, class_name: &str) -> PathBuf {
    write_path.join(format!("{class_name}.json"))
}
