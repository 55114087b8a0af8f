pub type TexcompResult<T> = Result<T, TexcompError>;

#[derive(thiserror::Error, Debug)]
pub enum TexcompError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("allocation error: {0}")]
    Allocation(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TexcompError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether the error is a resource failure the caller may degrade around.
    pub fn is_allocation(&self) -> bool {
        matches!(self, Self::Allocation(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
