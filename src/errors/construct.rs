/// Failure of a constructor registered in a [`crate::Catalog`].
#[derive(thiserror::Error, Debug)]
pub enum ConstructError {
    /// The supplied arguments don't match what the constructor declares.
    /// The locator treats it as a sign of outdated compiled definitions.
    #[error("Argument {index} doesn't match the constructor signature, expected `{expected}`")]
    ArgumentMismatch { index: usize, expected: &'static str },
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}
