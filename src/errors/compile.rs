#[derive(thiserror::Error, Debug)]
pub enum CompileErrorKind {
    #[error("Parameter `{parameter}` of `{name}` has unresolvable type `{declared_type}`")]
    UnresolvableParameter {
        name: String,
        parameter: String,
        declared_type: String,
    },
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}
