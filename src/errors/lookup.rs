use super::{
    artifact::{LoadErrorKind, WriteErrorKind},
    compile::CompileErrorKind,
};

#[derive(thiserror::Error, Debug)]
pub enum LookupErrorKind {
    #[error("`{name}` not found in definitions, even after regeneration")]
    NotFound { name: String },
    #[error("Constructor of `{name}` doesn't match its definition, even after regeneration")]
    Outdated { name: String },
    #[error(transparent)]
    Regenerate(#[from] RegenerateErrorKind),
}

#[derive(thiserror::Error, Debug)]
pub enum RegenerateErrorKind {
    #[error(transparent)]
    Compile(#[from] CompileErrorKind),
    #[error(transparent)]
    Write(#[from] WriteErrorKind),
    #[error(transparent)]
    Load(#[from] LoadErrorKind),
}
