use serde::{Deserialize, Serialize};
use std::collections::{btree_map, BTreeMap};

use crate::source::{Parameter, TypeSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub optional: bool,
}

impl From<&Parameter> for ParameterDefinition {
    fn from(parameter: &Parameter) -> Self {
        Self {
            name: parameter.name.clone(),
            declared_type: parameter.declared_type.clone(),
            is_array: parameter.is_array,
            optional: parameter.optional,
        }
    }
}

/// Compiled constructor metadata of a single type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
}

impl Definition {
    #[must_use]
    pub fn compile(source: &TypeSource, shared: bool) -> Self {
        Self {
            name: source.name().to_owned(),
            shared,
            parameters: source.parameters().iter().map(Into::into).collect(),
        }
    }
}

/// Compiled metadata of every scanned type, immutable once produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefinitionSet {
    definitions: BTreeMap<String, Definition>,
}

impl DefinitionSet {
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> btree_map::Values<'_, String, Definition> {
        self.definitions.values()
    }
}

impl FromIterator<Definition> for DefinitionSet {
    fn from_iter<I: IntoIterator<Item = Definition>>(iter: I) -> Self {
        Self {
            definitions: iter.into_iter().map(|definition| (definition.name.clone(), definition)).collect(),
        }
    }
}
