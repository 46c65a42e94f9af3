use std::{io, path::PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum WriteErrorKind {
    #[error("Failed to serialize artifact `{symbol}`: {source}")]
    Serialize { symbol: String, source: serde_json::Error },
    #[error("Failed to write artifact to {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

#[derive(thiserror::Error, Debug)]
pub enum LoadErrorKind {
    #[error("Failed to read artifact from {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to parse artifact from {}: {source}", path.display())]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("Symbol `{symbol}` is already bound in this process and can't be redefined")]
    SymbolAlreadyBound { symbol: String },
}
