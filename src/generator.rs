use serde::{Deserialize, Serialize};
use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    definition::DefinitionSet,
    errors::{LoadErrorKind, WriteErrorKind},
};

/// Rendered locator artifact, ready to be written and loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSource {
    pub class_name: String,
    pub namespace: String,
    /// Names served from shared slots instead of being constructed.
    #[serde(default)]
    pub shared_targets: Vec<String>,
    pub definitions: DefinitionSet,
}

impl ArtifactSource {
    /// Name the artifact is bound with in the process.
    #[inline]
    #[must_use]
    pub fn symbol(&self) -> String {
        symbol(&self.namespace, &self.class_name)
    }

    /// Persists the artifact, replacing the file at `path`.
    ///
    /// The content is written to a sibling file first and renamed over `path`,
    /// so a concurrent reader sees either the previous artifact or the new one.
    ///
    /// # Errors
    /// Returns an error if the artifact can't be serialized or written.
    pub fn write(&self, path: &Path) -> Result<(), WriteErrorKind> {
        let content = serde_json::to_vec_pretty(self).map_err(|source| WriteErrorKind::Serialize {
            symbol: self.symbol(),
            source,
        })?;

        let staging = staging_path(path);
        fs::write(&staging, content)
            .and_then(|()| fs::rename(&staging, path))
            .map_err(|source| {
                if let Err(err) = fs::remove_file(&staging) {
                    debug!(path = %staging.display(), %err, "Staging file not removed");
                }
                WriteErrorKind::Io {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        debug!(path = %path.display(), "Artifact written");
        Ok(())
    }

    /// Reads a previously written artifact.
    ///
    /// # Errors
    /// Returns an error if the file can't be read or parsed.
    pub fn read(path: &Path) -> Result<Self, LoadErrorKind> {
        let content = fs::read(path).map_err(|source| LoadErrorKind::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&content).map_err(|source| LoadErrorKind::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut file_name = path.file_name().map(OsStr::to_os_string).unwrap_or_default();
    file_name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    path.with_file_name(file_name)
}

#[inline]
#[must_use]
pub(crate) fn symbol(namespace: &str, class_name: &str) -> String {
    if namespace.is_empty() {
        class_name.to_owned()
    } else {
        format!("{namespace}::{class_name}")
    }
}

pub trait ArtifactGenerator {
    #[must_use]
    fn render(&self, definitions: &DefinitionSet, shared_targets: &[String], class_name: &str, namespace: &str) -> ArtifactSource;
}

/// Renders artifacts as JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonArtifactGenerator;

impl ArtifactGenerator for JsonArtifactGenerator {
    fn render(&self, definitions: &DefinitionSet, shared_targets: &[String], class_name: &str, namespace: &str) -> ArtifactSource {
        ArtifactSource {
            class_name: class_name.to_owned(),
            namespace: namespace.to_owned(),
            shared_targets: shared_targets.to_vec(),
            definitions: definitions.clone(),
        }
    }
}
