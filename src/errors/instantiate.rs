#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error("Constructor of `{name}` not found in catalog")]
    MissingConstructor { name: String },
    #[error("Cyclic dependency detected: {}", path.join(" -> "))]
    CyclicDependency { path: Vec<String> },
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}
