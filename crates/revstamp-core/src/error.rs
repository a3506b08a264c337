use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Every row of the revision table is occupied; nothing was created.
    #[error("revision table is full")]
    TableFull,

    #[error("document accessor failed: {0}")]
    Accessor(String),

    #[error("invalid revision label: {0}")]
    InvalidLabel(String),
}

impl EngineError {
    pub fn accessor(err: impl std::fmt::Display) -> Self {
        EngineError::Accessor(err.to_string())
    }
}
