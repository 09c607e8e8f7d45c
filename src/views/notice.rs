//! Notices shown after a form submission.
//!
//! A notice hides itself once its display duration has elapsed, or is
//! replaced by the notice of the next action.

use crate::errors::Error;
use std::time::{Duration, Instant};

/// Form that produced a notice; some failures read differently per form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Form {
    /// Login form
    Login,
    /// Registration form
    Register,
    /// Subject creation form
    CreateSubject,
    /// Subject edit dialog
    EditSubject,
    /// Subject list actions (delete)
    ManageSubjects,
    /// Manual allocation form
    ManualAllocation,
    /// Approve/reject buttons
    AllocationRequests,
    /// Request buttons in the subject catalogue
    RequestSubject,
    /// Drop/delete buttons in "my allocations"
    MyAllocations,
    /// Navigation
    Navigation,
}

/// Whether a notice reports a failure or a success
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    /// Shown in the rejected colour
    Error,
    /// Shown in the approved colour
    Success,
}

/// A transient message
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// Error or success
    pub kind: NoticeKind,
    /// Message text
    pub text: String,
    shown_at: Instant,
    duration: Duration,
}

impl Notice {
    /// Creates an error notice.
    #[must_use]
    pub fn error(text: impl Into<String>, duration: Duration) -> Self {
        Self::new(NoticeKind::Error, text.into(), duration)
    }

    /// Creates a success notice.
    #[must_use]
    pub fn success(text: impl Into<String>, duration: Duration) -> Self {
        Self::new(NoticeKind::Success, text.into(), duration)
    }

    /// Creates the error notice for a rejected submission of `form`.
    #[must_use]
    pub fn for_error(form: Form, error: &Error, duration: Duration) -> Self {
        Self::error(error_text(form, error), duration)
    }

    fn new(kind: NoticeKind, text: String, duration: Duration) -> Self {
        Self {
            kind,
            text,
            shown_at: Instant::now(),
            duration,
        }
    }

    /// Whether the notice is still displayed at `now`.
    #[must_use]
    pub fn is_visible_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) < self.duration
    }

    /// Whether the notice is still displayed.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.is_visible_at(Instant::now())
    }
}

/// User-facing wording of a rejected submission.
#[must_use]
pub fn error_text(form: Form, error: &Error) -> String {
    match (form, error) {
        (_, Error::DuplicateEmail { .. }) => "An account with this email already exists.".to_string(),
        (_, Error::InvalidCredentials) => "Invalid email or password.".to_string(),
        (Form::EditSubject, Error::DuplicateCode { .. }) => {
            "This subject code is already used.".to_string()
        }
        (_, Error::DuplicateCode { .. }) => "A subject with this code already exists.".to_string(),
        (_, Error::MissingSelection) => "Please select both a student and a subject.".to_string(),
        (_, Error::AlreadyAllocated { status, .. }) => {
            format!("This student is already allocated this subject (Status: {status}).")
        }
        (_, Error::AlreadyRequested { status, .. }) => {
            format!("You have already requested this subject (Status: {status}).")
        }
        (_, other) => other.to_string(),
    }
}

/// Text of the success notice after a manual allocation
pub const ALLOCATION_CREATED: &str = "Allocation created successfully!";
