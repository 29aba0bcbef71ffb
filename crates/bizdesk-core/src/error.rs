//! Error types shared by every BizDesk crate.

/// Top-level error type.
///
/// `Validation` and `NotFound` are the only kinds the stores produce; callers
/// render them as "bad request" and "not found" respectively.
#[derive(Debug, thiserror::Error)]
pub enum BizDeskError {
    /// Malformed or out-of-range input.
    #[error("{0}")]
    Validation(String),

    /// Unknown department, tool, or task id.
    #[error("{0}")]
    NotFound(String),

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl BizDeskError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, BizDeskError>;
