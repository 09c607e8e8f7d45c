//! Unified error types for the allocation manager.
//!
//! Validation failures (duplicate email, duplicate subject code, ...) are
//! rejected form submissions: they leave the store untouched and are shown to
//! the user as a notice. Everything else is an infrastructure failure that is
//! logged and propagated.

use crate::core::models::{AllocationStatus, Role};
use thiserror::Error;

/// Errors produced by the store, the storage backends and the view-model.
#[derive(Debug, Error)]
pub enum Error {
    /// Registration with an email that is already taken
    #[error("An account with email '{email}' already exists")]
    DuplicateEmail {
        /// The conflicting email
        email: String,
    },

    /// No user matches the given email and password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Another subject already uses this code
    #[error("A subject with code '{code}' already exists")]
    DuplicateCode {
        /// The conflicting subject code
        code: String,
    },

    /// Manual allocation submitted without a student or a subject
    #[error("Both a student and a subject must be selected")]
    MissingSelection,

    /// Manual allocation for a pair that already has an allocation
    #[error("Student '{email}' is already allocated '{code}' (status: {status})")]
    AlreadyAllocated {
        /// Student email
        email: String,
        /// Subject code
        code: String,
        /// Status of the existing allocation
        status: AllocationStatus,
    },

    /// Self-request for a pair that already has an allocation
    #[error("Student '{email}' has already requested '{code}' (status: {status})")]
    AlreadyRequested {
        /// Student email
        email: String,
        /// Subject code
        code: String,
        /// Status of the existing allocation
        status: AllocationStatus,
    },

    /// No subject with the given id or code
    #[error("Subject not found: {key}")]
    SubjectNotFound {
        /// The id or code that was looked up
        key: String,
    },

    /// No student with the given email
    #[error("Student not found: {email}")]
    StudentNotFound {
        /// The email that was looked up
        email: String,
    },

    /// No allocation with the given id
    #[error("Allocation not found: {id}")]
    AllocationNotFound {
        /// The allocation id that was looked up
        id: String,
    },

    /// The allocation is not in a status that permits the action
    #[error("Allocation '{id}' is {actual}, expected {expected}")]
    StatusMismatch {
        /// Allocation id
        id: String,
        /// Human-readable description of the accepted statuses
        expected: &'static str,
        /// The status the allocation actually has
        actual: AllocationStatus,
    },

    /// The allocation belongs to another student
    #[error("Allocation '{id}' does not belong to the current student")]
    NotOwner {
        /// Allocation id
        id: String,
    },

    /// The action requires a logged-in user
    #[error("Not logged in")]
    NotAuthenticated,

    /// The action or view is not available to this role
    #[error("Not permitted for role {role}")]
    Forbidden {
        /// Role of the current session
        role: Role,
    },

    /// No view with this identifier exists
    #[error("Unknown view: {id}")]
    UnknownView {
        /// The requested view id
        id: String,
    },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Storage database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A stored collection could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Terminal input/output failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for rejected user input, `false` for infrastructure failures.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            Self::Config { .. } | Self::Database(_) | Self::Serialization(_) | Self::Io(_)
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_user_facing() {
        assert!(Error::InvalidCredentials.is_user_facing());
        assert!(Error::MissingSelection.is_user_facing());
        assert!(
            Error::DuplicateCode {
                code: "CS101".to_string()
            }
            .is_user_facing()
        );
    }

    #[test]
    fn test_infrastructure_errors_are_not_user_facing() {
        let io = Error::from(std::io::Error::other("disk gone"));
        assert!(!io.is_user_facing());
        assert!(
            !Error::Config {
                message: "bad".to_string()
            }
            .is_user_facing()
        );
    }

    #[test]
    fn test_already_allocated_message_includes_status() {
        let err = Error::AlreadyAllocated {
            email: "a@x.com".to_string(),
            code: "CS101".to_string(),
            status: AllocationStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Student 'a@x.com' is already allocated 'CS101' (status: pending)"
        );
    }
}
