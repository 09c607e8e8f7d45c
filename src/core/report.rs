//! Dashboard and report projections.
//!
//! Every function here is a pure projection of the store. Nothing is cached:
//! callers recompute the projection whenever a view is shown. The structs are
//! display models, formatted by the view layer.

pub use crate::core::allocation::WithdrawAction;

use crate::core::{
    Store,
    models::{Allocation, AllocationStatus, Role, Subject, User},
};

/// Counters shown on the admin dashboard
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AdminStats {
    /// Number of subjects
    pub subjects: usize,
    /// Number of pending allocations across all students
    pub pending: usize,
    /// Number of users with the student role
    pub students: usize,
}

/// Counters shown on a student's dashboard
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StudentStats {
    /// Approved allocations of the student
    pub approved: usize,
    /// Pending allocations of the student
    pub pending: usize,
    /// Rejected allocations of the student
    pub rejected: usize,
}

/// One row of a report card
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRow {
    /// Student name as snapshotted on the allocation
    pub student_name: String,
    /// Student email
    pub student_email: String,
    /// Allocation status
    pub status: AllocationStatus,
}

/// All allocations of one subject
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportCard {
    /// Subject name
    pub subject_name: String,
    /// Subject code
    pub subject_code: String,
    /// One row per allocation referencing the subject code
    pub rows: Vec<ReportRow>,
}

/// Entry of a dropdown: the submitted value and its label
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectOption {
    /// Submitted value (email or subject code)
    pub value: String,
    /// Human-readable label
    pub label: String,
}

/// Choices offered by the manual allocation form
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ManualAllocationOptions {
    /// Students, valued by email
    pub students: Vec<SelectOption>,
    /// Subjects, valued by code
    pub subjects: Vec<SelectOption>,
}

/// What a student can do with a subject in the catalogue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestAction {
    /// No allocation yet, a request can be sent
    Request,
    /// Approved
    Enrolled,
    /// Pending
    RequestSent,
    /// Rejected
    Rejected,
}

impl From<AllocationStatus> for RequestAction {
    fn from(status: AllocationStatus) -> Self {
        match status {
            AllocationStatus::Approved => Self::Enrolled,
            AllocationStatus::Pending => Self::RequestSent,
            AllocationStatus::Rejected => Self::Rejected,
        }
    }
}

/// A subject as listed to a student
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogueEntry {
    /// The subject
    pub subject: Subject,
    /// Derived from the student's first allocation for this subject
    pub action: RequestAction,
}

/// A row of the student's "my allocations" list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MyAllocationRow {
    /// The allocation
    pub allocation: Allocation,
    /// Removal action offered for it
    pub action: WithdrawAction,
}

/// Profile of the logged-in user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    /// Display name
    pub name: String,
    /// Email
    pub email: String,
    /// Role
    pub role: Role,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Counts subjects, pending allocations and students.
#[must_use]
pub fn admin_stats(store: &Store) -> AdminStats {
    AdminStats {
        subjects: store.subjects().len(),
        pending: count_status(store.allocations().iter(), AllocationStatus::Pending),
        students: store
            .users()
            .iter()
            .filter(|u| u.role == Role::Student)
            .count(),
    }
}

/// Counts the allocations of one student by status.
#[must_use]
pub fn student_stats(store: &Store, email: &str) -> StudentStats {
    StudentStats {
        approved: count_status(store.allocations_for(email), AllocationStatus::Approved),
        pending: count_status(store.allocations_for(email), AllocationStatus::Pending),
        rejected: count_status(store.allocations_for(email), AllocationStatus::Rejected),
    }
}

fn count_status<'a>(
    allocations: impl Iterator<Item = &'a Allocation>,
    status: AllocationStatus,
) -> usize {
    allocations.filter(|a| a.status == status).count()
}

/// Pending allocations awaiting an admin decision, in request order.
#[must_use]
pub fn pending_requests(store: &Store) -> Vec<&Allocation> {
    store
        .allocations()
        .iter()
        .filter(|a| a.status == AllocationStatus::Pending)
        .collect()
}

/// Builds one card per subject, in subject order.
#[must_use]
pub fn full_report(store: &Store) -> Vec<ReportCard> {
    store
        .subjects()
        .iter()
        .map(|subject| ReportCard {
            subject_name: subject.name.clone(),
            subject_code: subject.code.clone(),
            rows: store
                .allocations()
                .iter()
                .filter(|a| a.subject_code == subject.code)
                .map(|a| ReportRow {
                    student_name: a.student_name.clone(),
                    student_email: a.student_email.clone(),
                    status: a.status,
                })
                .collect(),
        })
        .collect()
}

/// Options for the manual allocation form.
#[must_use]
pub fn manual_allocation_options(store: &Store) -> ManualAllocationOptions {
    ManualAllocationOptions {
        students: store
            .users()
            .iter()
            .filter(|u| u.role == Role::Student)
            .map(|u| SelectOption {
                value: u.email.clone(),
                label: format!("{} ({})", u.name, u.email),
            })
            .collect(),
        subjects: store
            .subjects()
            .iter()
            .map(|s| SelectOption {
                value: s.code.clone(),
                label: format!("{} ({})", s.name, s.code),
            })
            .collect(),
    }
}

/// Lists every subject with the action available to the student.
#[must_use]
pub fn subject_catalogue(store: &Store, email: &str) -> Vec<CatalogueEntry> {
    store
        .subjects()
        .iter()
        .map(|subject| CatalogueEntry {
            subject: subject.clone(),
            action: store
                .allocations_for(email)
                .find(|a| a.subject_code == subject.code)
                .map_or(RequestAction::Request, |a| a.status.into()),
        })
        .collect()
}

/// Lists the student's allocations with their removal action.
#[must_use]
pub fn my_allocations(store: &Store, email: &str) -> Vec<MyAllocationRow> {
    store
        .allocations_for(email)
        .map(|a| MyAllocationRow {
            allocation: a.clone(),
            action: a.status.into(),
        })
        .collect()
}
