use super::{
    instantiate::InstantiateErrorKind,
    lookup::{LookupErrorKind, RegenerateErrorKind},
};

#[derive(thiserror::Error, Debug)]
pub enum LocatorErrorKind {
    #[error("Locator isn't initialized, call `init` first")]
    NotInitialized,
    #[error("Locator is already initialized")]
    AlreadyInitialized,
    #[error("Shared instances can't be added after the locator is initialized")]
    NotAllowed,
    #[error("Instance of `{name}` has incorrect type, expected `{expected}`")]
    IncorrectType { name: String, expected: &'static str },
    #[error(transparent)]
    Lookup(#[from] LookupErrorKind),
    #[error(transparent)]
    Instantiate(#[from] InstantiateErrorKind),
}

impl From<RegenerateErrorKind> for LocatorErrorKind {
    #[inline]
    fn from(err: RegenerateErrorKind) -> Self {
        Self::Lookup(LookupErrorKind::Regenerate(err))
    }
}
