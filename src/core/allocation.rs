//! Allocation business logic - student requests, admin decisions, manual
//! allocation and student withdrawals.

use crate::{
    core::{
        Collection, Store,
        id::generate_id,
        models::{Allocation, AllocationStatus, Role, User},
    },
    errors::{Error, Result},
};
use serde::Deserialize;
use tracing::warn;

/// How a student request for a subject they already have an allocation for
/// is handled. Manual allocation always rejects such pairs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateRequestPolicy {
    /// Create another pending allocation (logged as a warning)
    #[default]
    Allow,
    /// Fail with [`Error::AlreadyRequested`]
    Reject,
}

/// Creates a pending allocation of `student` to the subject with `code`.
///
/// # Errors
/// Returns [`Error::SubjectNotFound`] for an unknown code, and
/// [`Error::AlreadyRequested`] when the policy is `Reject` and the student
/// already has an allocation for this subject.
pub fn request_subject(
    store: &mut Store,
    student: &User,
    code: &str,
    policy: DuplicateRequestPolicy,
) -> Result<Allocation> {
    let subject = store
        .subject_by_code(code)
        .ok_or_else(|| Error::SubjectNotFound {
            key: code.to_string(),
        })?;

    if let Some(existing) = store
        .allocations
        .iter()
        .find(|a| a.is_for(&student.email, code))
    {
        match policy {
            DuplicateRequestPolicy::Reject => {
                return Err(Error::AlreadyRequested {
                    email: student.email.clone(),
                    code: code.to_string(),
                    status: existing.status,
                });
            }
            DuplicateRequestPolicy::Allow => {
                warn!(
                    email = %student.email,
                    code,
                    existing_status = %existing.status,
                    "Creating duplicate allocation request"
                );
            }
        }
    }

    let allocation = Allocation {
        id: generate_id(),
        student_email: student.email.clone(),
        student_name: student.name.clone(),
        subject_code: subject.code.clone(),
        subject_name: subject.name.clone(),
        status: AllocationStatus::Pending,
    };
    store.allocations.push(allocation.clone());
    store.mark(Collection::Allocations);
    Ok(allocation)
}

/// Sets the status of allocation `id`. Any status may follow any other.
///
/// # Errors
/// Returns [`Error::AllocationNotFound`] if `id` is unknown.
pub fn set_status(store: &mut Store, id: &str, status: AllocationStatus) -> Result<Allocation> {
    let allocation = store
        .allocations
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or_else(|| Error::AllocationNotFound { id: id.to_string() })?;
    allocation.status = status;
    let updated = allocation.clone();
    store.mark(Collection::Allocations);
    Ok(updated)
}

/// Approves allocation `id`.
///
/// # Errors
/// Returns [`Error::AllocationNotFound`] if `id` is unknown.
pub fn approve(store: &mut Store, id: &str) -> Result<Allocation> {
    set_status(store, id, AllocationStatus::Approved)
}

/// Rejects allocation `id`.
///
/// # Errors
/// Returns [`Error::AllocationNotFound`] if `id` is unknown.
pub fn reject(store: &mut Store, id: &str) -> Result<Allocation> {
    set_status(store, id, AllocationStatus::Rejected)
}

/// Allocates a student to a subject directly in the approved state.
///
/// # Errors
/// - [`Error::MissingSelection`] if either argument is empty
/// - [`Error::AlreadyAllocated`] if any allocation exists for the pair
/// - [`Error::StudentNotFound`] / [`Error::SubjectNotFound`] for unknown keys
pub fn manual_allocate(store: &mut Store, student_email: &str, code: &str) -> Result<Allocation> {
    if student_email.trim().is_empty() || code.trim().is_empty() {
        return Err(Error::MissingSelection);
    }

    if let Some(existing) = store
        .allocations
        .iter()
        .find(|a| a.is_for(student_email, code))
    {
        return Err(Error::AlreadyAllocated {
            email: student_email.to_string(),
            code: code.to_string(),
            status: existing.status,
        });
    }

    let student = store
        .users
        .iter()
        .find(|u| u.email == student_email && u.role == Role::Student)
        .ok_or_else(|| Error::StudentNotFound {
            email: student_email.to_string(),
        })?;
    let subject = store
        .subject_by_code(code)
        .ok_or_else(|| Error::SubjectNotFound {
            key: code.to_string(),
        })?;

    let allocation = Allocation {
        id: generate_id(),
        student_email: student.email.clone(),
        student_name: student.name.clone(),
        subject_code: subject.code.clone(),
        subject_name: subject.name.clone(),
        status: AllocationStatus::Approved,
    };
    store.allocations.push(allocation.clone());
    store.mark(Collection::Allocations);
    Ok(allocation)
}

/// How a student can remove one of their allocations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WithdrawAction {
    /// Approved allocation
    Drop,
    /// Pending or rejected allocation
    DeleteRequest,
}

impl WithdrawAction {
    /// Whether an allocation in `status` can be removed this way.
    #[must_use]
    pub fn accepts(self, status: AllocationStatus) -> bool {
        Self::from(status) == self
    }

    const fn expected(self) -> &'static str {
        match self {
            Self::Drop => "approved",
            Self::DeleteRequest => "pending or rejected",
        }
    }
}

impl From<AllocationStatus> for WithdrawAction {
    fn from(status: AllocationStatus) -> Self {
        match status {
            AllocationStatus::Approved => Self::Drop,
            AllocationStatus::Pending | AllocationStatus::Rejected => Self::DeleteRequest,
        }
    }
}

/// Checks that `student_email` may remove allocation `id` with `action`,
/// without changing the store.
///
/// # Errors
/// [`Error::AllocationNotFound`], [`Error::NotOwner`], or
/// [`Error::StatusMismatch`] if `action` does not fit the allocation status.
pub fn check_withdrawal<'a>(
    store: &'a Store,
    student_email: &str,
    id: &str,
    action: WithdrawAction,
) -> Result<&'a Allocation> {
    find_own(store, student_email, id, action).map(|index| &store.allocations[index])
}

/// Removes allocation `id` of `student_email` with `action`.
///
/// # Errors
/// Same as [`check_withdrawal`]; the store is unchanged on error.
pub fn withdraw(
    store: &mut Store,
    student_email: &str,
    id: &str,
    action: WithdrawAction,
) -> Result<Allocation> {
    let index = find_own(store, student_email, id, action)?;
    let removed = store.allocations.remove(index);
    store.mark(Collection::Allocations);
    Ok(removed)
}

/// Removes an approved allocation owned by `student_email`.
///
/// # Errors
/// [`Error::AllocationNotFound`], [`Error::NotOwner`], or
/// [`Error::StatusMismatch`] if the allocation is not approved.
pub fn drop_subject(store: &mut Store, student_email: &str, id: &str) -> Result<Allocation> {
    withdraw(store, student_email, id, WithdrawAction::Drop)
}

/// Removes a pending or rejected allocation owned by `student_email`.
///
/// # Errors
/// [`Error::AllocationNotFound`], [`Error::NotOwner`], or
/// [`Error::StatusMismatch`] if the allocation is approved.
pub fn delete_request(store: &mut Store, student_email: &str, id: &str) -> Result<Allocation> {
    withdraw(store, student_email, id, WithdrawAction::DeleteRequest)
}

fn find_own(
    store: &Store,
    student_email: &str,
    id: &str,
    action: WithdrawAction,
) -> Result<usize> {
    let index = store
        .allocations
        .iter()
        .position(|a| a.id == id)
        .ok_or_else(|| Error::AllocationNotFound { id: id.to_string() })?;
    let allocation = &store.allocations[index];

    if allocation.student_email != student_email {
        return Err(Error::NotOwner { id: id.to_string() });
    }
    if !action.accepts(allocation.status) {
        return Err(Error::StatusMismatch {
            id: id.to_string(),
            expected: action.expected(),
            actual: allocation.status,
        });
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{auth, subject};

    fn seeded() -> Result<(Store, User, User)> {
        let mut store = Store::default();
        subject::create_subject(&mut store, "Intro to CS", "CS101", "Turing")?;
        subject::create_subject(&mut store, "Calculus", "MA101", "Noether")?;
        auth::register(&mut store, "Root", "root@x.com", "pw", Role::Admin)?;
        let a = auth::register(&mut store, "A", "a@x.com", "pw", Role::Student)?;
        let b = auth::register(&mut store, "B", "b@x.com", "pw", Role::Student)?;
        store.take_dirty();
        Ok((store, a, b))
    }

    #[test]
    fn test_request_snapshots_names() -> Result<()> {
        let (mut store, a, _) = seeded()?;
        let allocation = request_subject(&mut store, &a, "CS101", DuplicateRequestPolicy::Allow)?;

        assert_eq!(allocation.status, AllocationStatus::Pending);
        assert_eq!(allocation.student_name, "A");
        assert_eq!(allocation.subject_name, "Intro to CS");
        assert_eq!(store.take_dirty(), vec![Collection::Allocations]);
        Ok(())
    }

    #[test]
    fn test_second_request_allowed_produces_duplicate() -> Result<()> {
        let (mut store, a, _) = seeded()?;
        let first = request_subject(&mut store, &a, "CS101", DuplicateRequestPolicy::Allow)?;
        let second = request_subject(&mut store, &a, "CS101", DuplicateRequestPolicy::Allow)?;

        assert_ne!(first.id, second.id);
        assert_eq!(store.allocations_for("a@x.com").count(), 2);
        Ok(())
    }

    #[test]
    fn test_second_request_rejected_under_reject_policy() -> Result<()> {
        let (mut store, a, _) = seeded()?;
        request_subject(&mut store, &a, "CS101", DuplicateRequestPolicy::Reject)?;
        let result = request_subject(&mut store, &a, "CS101", DuplicateRequestPolicy::Reject);

        assert!(matches!(
            result,
            Err(Error::AlreadyRequested {
                status: AllocationStatus::Pending,
                ..
            })
        ));
        assert_eq!(store.allocations_for("a@x.com").count(), 1);
        Ok(())
    }

    #[test]
    fn test_request_unknown_subject() -> Result<()> {
        let (mut store, a, _) = seeded()?;
        let result = request_subject(&mut store, &a, "XX999", DuplicateRequestPolicy::Allow);
        assert!(matches!(result, Err(Error::SubjectNotFound { .. })));
        assert!(store.take_dirty().is_empty());
        Ok(())
    }

    #[test]
    fn test_status_transitions_are_unguarded() -> Result<()> {
        let (mut store, a, _) = seeded()?;
        let request = request_subject(&mut store, &a, "CS101", DuplicateRequestPolicy::Allow)?;

        assert_eq!(reject(&mut store, &request.id)?.status, AllocationStatus::Rejected);
        assert_eq!(approve(&mut store, &request.id)?.status, AllocationStatus::Approved);
        assert_eq!(reject(&mut store, &request.id)?.status, AllocationStatus::Rejected);
        assert!(matches!(
            approve(&mut store, "nope"),
            Err(Error::AllocationNotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_manual_allocate_creates_approved() -> Result<()> {
        let (mut store, _, _) = seeded()?;
        let allocation = manual_allocate(&mut store, "b@x.com", "MA101")?;
        assert_eq!(allocation.status, AllocationStatus::Approved);
        assert_eq!(allocation.student_name, "B");
        assert_eq!(allocation.subject_name, "Calculus");
        Ok(())
    }

    #[test]
    fn test_manual_allocate_rejects_existing_pair_of_any_status() -> Result<()> {
        let (mut store, a, _) = seeded()?;
        let request = request_subject(&mut store, &a, "CS101", DuplicateRequestPolicy::Allow)?;
        reject(&mut store, &request.id)?;

        let result = manual_allocate(&mut store, "a@x.com", "CS101");
        assert!(matches!(
            result,
            Err(Error::AlreadyAllocated {
                status: AllocationStatus::Rejected,
                ..
            })
        ));
        assert_eq!(store.allocations().len(), 1);

        // same student, different subject is fine
        manual_allocate(&mut store, "a@x.com", "MA101")?;
        Ok(())
    }

    #[test]
    fn test_manual_allocate_validation() -> Result<()> {
        let (mut store, _, _) = seeded()?;
        assert!(matches!(
            manual_allocate(&mut store, "", "CS101"),
            Err(Error::MissingSelection)
        ));
        assert!(matches!(
            manual_allocate(&mut store, "a@x.com", " "),
            Err(Error::MissingSelection)
        ));
        assert!(matches!(
            manual_allocate(&mut store, "ghost@x.com", "CS101"),
            Err(Error::StudentNotFound { .. })
        ));
        assert!(matches!(
            manual_allocate(&mut store, "root@x.com", "CS101"),
            Err(Error::StudentNotFound { .. })
        ));
        assert!(matches!(
            manual_allocate(&mut store, "a@x.com", "XX999"),
            Err(Error::SubjectNotFound { .. })
        ));
        assert!(store.allocations().is_empty());
        Ok(())
    }

    #[test]
    fn test_drop_requires_approved_and_ownership() -> Result<()> {
        let (mut store, a, _) = seeded()?;
        let pending = request_subject(&mut store, &a, "CS101", DuplicateRequestPolicy::Allow)?;
        let approved = manual_allocate(&mut store, "a@x.com", "MA101")?;

        assert!(matches!(
            drop_subject(&mut store, "a@x.com", &pending.id),
            Err(Error::StatusMismatch { .. })
        ));
        assert!(matches!(
            drop_subject(&mut store, "b@x.com", &approved.id),
            Err(Error::NotOwner { .. })
        ));

        let dropped = drop_subject(&mut store, "a@x.com", &approved.id)?;
        assert_eq!(dropped.id, approved.id);
        assert_eq!(store.allocations(), &[pending]);
        Ok(())
    }

    #[test]
    fn test_delete_request_accepts_pending_and_rejected() -> Result<()> {
        let (mut store, a, _) = seeded()?;
        let pending = request_subject(&mut store, &a, "CS101", DuplicateRequestPolicy::Allow)?;
        let rejected = request_subject(&mut store, &a, "MA101", DuplicateRequestPolicy::Allow)?;
        reject(&mut store, &rejected.id)?;

        delete_request(&mut store, "a@x.com", &pending.id)?;
        delete_request(&mut store, "a@x.com", &rejected.id)?;
        assert!(store.allocations().is_empty());

        let approved = manual_allocate(&mut store, "a@x.com", "CS101")?;
        assert!(matches!(
            delete_request(&mut store, "a@x.com", &approved.id),
            Err(Error::StatusMismatch {
                actual: AllocationStatus::Approved,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn test_check_withdrawal_leaves_store_unchanged() -> Result<()> {
        let (mut store, a, _) = seeded()?;
        let pending = request_subject(&mut store, &a, "CS101", DuplicateRequestPolicy::Allow)?;
        store.take_dirty();

        let found = check_withdrawal(&store, "a@x.com", &pending.id, WithdrawAction::DeleteRequest)?;
        assert_eq!(found.id, pending.id);
        assert!(matches!(
            check_withdrawal(&store, "a@x.com", &pending.id, WithdrawAction::Drop),
            Err(Error::StatusMismatch { expected: "approved", .. })
        ));
        assert!(matches!(
            check_withdrawal(&store, "a@x.com", "nope", WithdrawAction::Drop),
            Err(Error::AllocationNotFound { .. })
        ));
        assert_eq!(store.allocations().len(), 1);
        assert!(store.take_dirty().is_empty());
        Ok(())
    }
}
