pub(crate) mod any;
pub(crate) mod artifact;
pub(crate) mod cache;
pub(crate) mod compiler;
pub(crate) mod config;
pub(crate) mod definition;
pub(crate) mod errors;
pub(crate) mod generator;
pub(crate) mod host;
pub(crate) mod locator;
pub(crate) mod preference;
pub(crate) mod recovery;
pub(crate) mod shared;
pub(crate) mod source;

pub use any::{downcast, instance, Instance, Params};
pub use artifact::{ArtifactLoader, GeneratedLocator};
pub use compiler::{CatalogCompiler, Compilation, DefaultIntrospectionStrategy, DefinitionCompiler, IntrospectionStrategy};
pub use config::Config;
pub use definition::{Definition, DefinitionSet, ParameterDefinition};
pub use errors::{
    CompileErrorKind, ConstructError, InstantiateErrorKind, LoadErrorKind, LocatorErrorKind, LookupErrorKind, RegenerateErrorKind,
    WriteErrorKind,
};
pub use generator::{ArtifactGenerator, ArtifactSource, JsonArtifactGenerator};
pub use host::{Host, LocatorHandle, NoHost, StaticHost, FACTORY, REQUEST, ROUTER, SERVICE_LOCATOR, VIEW_RENDERER};
pub use locator::Locator;
pub use preference::TypePreferences;
pub use recovery::Lookup;
pub use shared::SharedInstances;
pub use source::{Arguments, Catalog, Parameter, TypeSource};
