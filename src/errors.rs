mod artifact;
mod compile;
mod construct;
mod instantiate;
mod locator;
mod lookup;

pub use artifact::{LoadErrorKind, WriteErrorKind};
pub use compile::CompileErrorKind;
pub use construct::ConstructError;
pub use instantiate::InstantiateErrorKind;
pub use locator::LocatorErrorKind;
pub use lookup::{LookupErrorKind, RegenerateErrorKind};
