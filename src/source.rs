//! Live constructors the definitions are compiled from.
//!
//! A [`Catalog`] plays the role of the source code: types can be added, removed or have their
//! constructor replaced while a [`crate::Locator`] is running, and the compiled definitions
//! become outdated until the next regeneration.

use parking_lot::RwLock;
use std::{
    any::type_name,
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{any::Instance, errors::ConstructError};

/// Declared constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    /// Name of the type this parameter is resolved with. `None` for parameters that can only be passed explicitly.
    pub declared_type: Option<String>,
    pub is_array: bool,
    pub optional: bool,
}

impl Parameter {
    /// Parameter without a declared type, it can only be passed explicitly.
    #[inline]
    #[must_use]
    pub fn value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            is_array: false,
            optional: false,
        }
    }

    /// Parameter resolved by the locator with the declared type name.
    #[inline]
    #[must_use]
    pub fn typed(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: Some(declared_type.into()),
            is_array: false,
            optional: false,
        }
    }

    /// Array-typed parameter, an empty array is passed when it isn't supplied.
    #[inline]
    #[must_use]
    pub fn array(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            is_array: true,
            optional: true,
        }
    }

    #[inline]
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

pub(crate) type BoxedConstructor = Arc<dyn Fn(&Arguments) -> Result<Instance, ConstructError> + Send + Sync>;

/// Constructible type as currently declared.
#[derive(Clone)]
pub struct TypeSource {
    name: String,
    origin: PathBuf,
    parameters: Vec<Parameter>,
    shared: bool,
    constructor: BoxedConstructor,
}

impl TypeSource {
    /// Creates a non-shared type with no parameters.
    /// Add parameters in the order the constructor reads them from [`Arguments`].
    #[must_use]
    pub fn new<T, F>(name: impl Into<String>, constructor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Arguments) -> Result<T, ConstructError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            origin: PathBuf::new(),
            parameters: Vec::new(),
            shared: false,
            constructor: Arc::new(move |arguments| constructor(arguments).map(|value| Arc::new(value) as Instance)),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Sets the path the type is declared in, scan directories are matched against it.
    #[inline]
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<PathBuf>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Marks the type as shared, so the locator caches its instances.
    #[inline]
    #[must_use]
    pub fn shared(mut self) -> Self {
        self.shared = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    #[inline]
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    #[inline]
    #[must_use]
    pub fn is_shared(&self) -> bool {
        self.shared
    }

    #[inline]
    pub(crate) fn construct(&self, arguments: &Arguments) -> Result<Instance, ConstructError> {
        (self.constructor)(arguments)
    }
}

/// Positional constructor arguments.
#[derive(Clone, Default)]
pub struct Arguments {
    values: Vec<Option<Instance>>,
}

impl Arguments {
    #[inline]
    #[must_use]
    pub(crate) fn new(values: Vec<Option<Instance>>) -> Self {
        Self { values }
    }

    /// Gets a required argument.
    ///
    /// # Errors
    /// Returns [`ConstructError::ArgumentMismatch`] if the argument is missing or has another type.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>, ConstructError> {
        self.optional(index)?.ok_or(ConstructError::ArgumentMismatch {
            index,
            expected: type_name::<T>(),
        })
    }

    /// Gets an optional argument.
    ///
    /// # Errors
    /// Returns [`ConstructError::ArgumentMismatch`] if the argument is present but has another type.
    pub fn optional<T: Send + Sync + 'static>(&self, index: usize) -> Result<Option<Arc<T>>, ConstructError> {
        match self.values.get(index).cloned().flatten() {
            Some(value) => value.downcast::<T>().map(Some).map_err(|_| ConstructError::ArgumentMismatch {
                index,
                expected: type_name::<T>(),
            }),
            None => Ok(None),
        }
    }

    /// Gets an array argument.
    ///
    /// # Errors
    /// Returns [`ConstructError::ArgumentMismatch`] if the argument is missing or isn't an array.
    #[inline]
    pub fn array(&self, index: usize) -> Result<Arc<Vec<Instance>>, ConstructError> {
        self.get::<Vec<Instance>>(index)
    }
}

/// Shared handle to the set of constructible types.
#[derive(Clone, Default)]
pub struct Catalog {
    types: Arc<RwLock<BTreeMap<String, TypeSource>>>,
}

impl Catalog {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type, replacing the previous declaration with the same name.
    #[inline]
    pub fn register(&self, source: TypeSource) -> Option<TypeSource> {
        self.types.write().insert(source.name.clone(), source)
    }

    #[inline]
    #[must_use]
    pub fn with(self, source: TypeSource) -> Self {
        self.register(source);
        self
    }

    #[inline]
    pub fn remove(&self, name: &str) -> Option<TypeSource> {
        self.types.write().remove(name)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<TypeSource> {
        self.types.read().get(name).cloned()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    /// Copies the current declarations, so a scan sees a consistent set of types.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Vec<TypeSource> {
        self.types.read().values().cloned().collect()
    }
}
