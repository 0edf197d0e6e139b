//! Error taxonomy shared by the store, the sequence generator and master expansion

use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur during inventory operations
#[derive(Debug, Error, Diagnostic)]
pub enum InventoryError {
    #[error("{kind} {id} not found")]
    #[diagnostic(code(lilerp::store::not_found))]
    NotFound { kind: &'static str, id: String },

    #[error("test number {0} is already in use")]
    #[diagnostic(
        code(lilerp::store::duplicate_test_number),
        help("generate a fresh number with `next-number` or omit --test-number")
    )]
    DuplicateTestNumber(String),

    #[error("a raw material master named '{0}' already exists")]
    #[diagnostic(code(lilerp::store::duplicate_master_name))]
    DuplicateMasterName(String),

    #[error("invalid input: {0}")]
    #[diagnostic(code(lilerp::store::validation))]
    Validation(String),

    #[error("no test numbers left for {prefix} (the daily counter stops at 99)")]
    #[diagnostic(code(lilerp::store::capacity_exceeded))]
    CapacityExceeded { prefix: String },

    #[error("database schema version {found} is not supported (expected {expected})")]
    #[diagnostic(
        code(lilerp::store::schema),
        help("open the database with the version of lilerp that created it")
    )]
    UnsupportedSchema { found: i32, expected: i32 },

    #[error("database error: {0}")]
    #[diagnostic(code(lilerp::store::database))]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    #[diagnostic(code(lilerp::io))]
    Io(#[from] std::io::Error),
}

impl InventoryError {
    /// Stable kind name used on the bridge
    pub fn kind(&self) -> &'static str {
        match self {
            InventoryError::NotFound { .. } => "NotFound",
            InventoryError::DuplicateTestNumber(_) | InventoryError::DuplicateMasterName(_) => {
                "DuplicateIdentifier"
            }
            InventoryError::Validation(_) => "ValidationFailure",
            InventoryError::CapacityExceeded { .. } => "CapacityExceeded",
            InventoryError::UnsupportedSchema { .. }
            | InventoryError::Database(_)
            | InventoryError::Io(_) => "Storage",
        }
    }

    /// Whether regenerating the test number and resubmitting may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, InventoryError::DuplicateTestNumber(_))
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        InventoryError::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, InventoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let err = InventoryError::NotFound {
            kind: "raw material",
            id: "7".to_string(),
        };
        assert_eq!(err.kind(), "NotFound");
        assert_eq!(err.to_string(), "raw material 7 not found");

        assert_eq!(
            InventoryError::DuplicateTestNumber("AR25060101".into()).kind(),
            "DuplicateIdentifier"
        );
        assert_eq!(
            InventoryError::DuplicateMasterName("Sugar".into()).kind(),
            "DuplicateIdentifier"
        );
        assert_eq!(
            InventoryError::CapacityExceeded {
                prefix: "AR250601".into()
            }
            .kind(),
            "CapacityExceeded"
        );
    }

    #[test]
    fn test_only_duplicate_test_number_is_retryable() {
        assert!(InventoryError::DuplicateTestNumber("AP25060101".into()).is_retryable());
        assert!(!InventoryError::DuplicateMasterName("Salt".into()).is_retryable());
        assert!(!InventoryError::validation("name is required").is_retryable());
    }
}
