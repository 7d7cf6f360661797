use thiserror::Error;

use crate::db::StoreError;
use crate::external::price_provider::ProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Wrong date format passed.")]
    InvalidDateFormat(String),
    #[error("required `{0}` missing.")]
    MissingParameter(String),
    #[error("Wrong type in parameter")]
    WrongType(String),
    #[error("{0}")]
    Provider(#[from] ProviderError),
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation failures are reported to the caller verbatim; anything else
    /// is replaced by a generic message.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::InvalidDateFormat(_) | AppError::MissingParameter(_) | AppError::WrongType(_)
        )
    }

    pub fn public_message(&self) -> String {
        if self.is_validation() {
            self.to_string()
        } else {
            "internal error occurred".to_string()
        }
    }
}
