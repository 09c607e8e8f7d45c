//! Records held by the store.
//!
//! These are serialized as-is into the key-value storage, so field names use
//! camelCase and enum values are lowercase.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a registered user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages subjects and allocations
    Admin,
    /// Requests and drops subjects
    Student,
}

impl Role {
    /// Lowercase name as stored
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered account. Passwords are compared in plain text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Generated identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Login identifier, unique across users
    pub email: String,
    /// Plain-text password
    pub password: String,
    /// Admin or student
    pub role: Role,
}

/// A subject students can be allocated to
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Generated identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Short code, unique across subjects
    pub code: String,
    /// Teacher's name
    pub teacher: String,
}

/// Approval state of an allocation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStatus {
    /// Requested by a student, awaiting an admin decision
    Pending,
    /// Approved by an admin or allocated manually
    Approved,
    /// Rejected by an admin
    Rejected,
}

impl AllocationStatus {
    /// Lowercase name as stored
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AllocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Links one student to one subject.
///
/// Student name and subject name/code are copies taken when the allocation is
/// created; subject edits refresh the subject fields, user fields are never
/// refreshed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    /// Generated identifier
    pub id: String,
    /// Email of the allocated student
    pub student_email: String,
    /// Student name at creation time
    pub student_name: String,
    /// Code of the allocated subject
    pub subject_code: String,
    /// Subject name at creation or last subject edit
    pub subject_name: String,
    /// Approval state
    pub status: AllocationStatus,
}

impl Allocation {
    /// Whether this allocation links `email` to `code`.
    #[must_use]
    pub fn is_for(&self, email: &str, code: &str) -> bool {
        self.student_email == email && self.subject_code == code
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_allocation_serializes_with_camel_case_fields() {
        let allocation = Allocation {
            id: "abc".to_string(),
            student_email: "a@x.com".to_string(),
            student_name: "A".to_string(),
            subject_code: "CS101".to_string(),
            subject_name: "Intro".to_string(),
            status: AllocationStatus::Pending,
        };
        let json = serde_json::to_value(&allocation).unwrap();
        assert_eq!(json["studentEmail"], "a@x.com");
        assert_eq!(json["subjectCode"], "CS101");
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn test_user_parses_stored_record() {
        let json = r#"{"id":"u1","name":"Ada","email":"ada@x.com","password":"pw","role":"admin"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.email, "ada@x.com");
    }

    #[test]
    fn test_role_value_names() {
        assert_eq!(Role::from_str("student", false).unwrap(), Role::Student);
        assert_eq!(Role::from_str("Admin", true).unwrap(), Role::Admin);
        assert!(Role::from_str("teacher", true).is_err());
        for role in Role::value_variants() {
            let value = role.to_possible_value().unwrap();
            assert_eq!(value.get_name(), role.as_str());
        }
    }
}
