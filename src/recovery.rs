//! Recovery signal channel.
//!
//! A constructor that can't be called with the arguments built from the compiled definitions
//! fails with [`ConstructError::ArgumentMismatch`]. That's reclassified here into
//! [`Lookup::SignatureMismatch`], so the locator can regenerate the definitions instead of
//! failing. Every other construction error passes through unchanged.

use tracing::debug;

use crate::{
    any::Instance,
    errors::{ConstructError, InstantiateErrorKind},
};

/// Outcome of a lookup in a generated locator.
#[derive(Clone)]
pub enum Lookup {
    Found(Instance),
    /// `name` isn't present in the compiled definitions, it's either the requested name or one of its dependencies.
    NotFound { name: String },
    /// A constructor no longer matches its compiled definition.
    SignatureMismatch,
}

impl Lookup {
    #[inline]
    #[must_use]
    pub fn found(self) -> Option<Instance> {
        match self {
            Self::Found(instance) => Some(instance),
            Self::NotFound { .. } | Self::SignatureMismatch => None,
        }
    }
}

pub(crate) fn classify(result: Result<Instance, ConstructError>) -> Result<Lookup, InstantiateErrorKind> {
    match result {
        Ok(instance) => Ok(Lookup::Found(instance)),
        Err(err @ ConstructError::ArgumentMismatch { .. }) => {
            debug!(%err, "Signature mismatch");
            Ok(Lookup::SignatureMismatch)
        }
        Err(ConstructError::Failed(err)) => Err(InstantiateErrorKind::Custom(err)),
    }
}
