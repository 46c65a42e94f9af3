use std::{any::Any, collections::BTreeMap, sync::Arc};

/// Type-erased object served by the locator.
///
/// Two instances are the same object if [`Arc::ptr_eq`] holds for them.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Constructor arguments supplied by the caller of [`crate::Locator::get`], keyed by parameter name.
pub type Params = BTreeMap<String, Instance>;

/// Wraps a value into an [`Instance`].
#[inline]
#[must_use]
pub fn instance<T: Send + Sync + 'static>(value: T) -> Instance {
    Arc::new(value)
}

/// Downcasts an [`Instance`] into a concrete type, keeping the shared ownership.
#[inline]
pub fn downcast<T: Send + Sync + 'static>(instance: Instance) -> Result<Arc<T>, Instance> {
    instance.downcast::<T>()
}
