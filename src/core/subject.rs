//! Subject business logic - create, edit and delete subjects.
//!
//! Subject edits and deletions cascade onto allocations through the subject
//! code, which is the only link an allocation keeps to its subject.

use crate::{
    core::{Collection, Store, id::generate_id, models::Subject},
    errors::{Error, Result},
};
use tracing::debug;

/// Creates a subject and returns it.
///
/// # Errors
/// Returns [`Error::DuplicateCode`] if another subject already uses `code`.
pub fn create_subject(store: &mut Store, name: &str, code: &str, teacher: &str) -> Result<Subject> {
    if store.subject_by_code(code).is_some() {
        return Err(Error::DuplicateCode {
            code: code.to_string(),
        });
    }

    let subject = Subject {
        id: generate_id(),
        name: name.to_string(),
        code: code.to_string(),
        teacher: teacher.to_string(),
    };
    store.subjects.push(subject.clone());
    store.mark(Collection::Subjects);
    Ok(subject)
}

/// Replaces the name, code and teacher of subject `id`.
///
/// Allocations referencing the previous code receive the new code and name
/// when either of them changed. Their ids and statuses are kept.
///
/// # Errors
/// Returns [`Error::DuplicateCode`] if a different subject already uses
/// `code`, or [`Error::SubjectNotFound`] if `id` is unknown.
pub fn edit_subject(
    store: &mut Store,
    id: &str,
    name: &str,
    code: &str,
    teacher: &str,
) -> Result<Subject> {
    if store.subjects.iter().any(|s| s.code == code && s.id != id) {
        return Err(Error::DuplicateCode {
            code: code.to_string(),
        });
    }

    let subject = store
        .subjects
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| Error::SubjectNotFound { key: id.to_string() })?;

    let previous_code = std::mem::replace(&mut subject.code, code.to_string());
    let name_changed = subject.name != name;
    subject.name = name.to_string();
    subject.teacher = teacher.to_string();
    let updated = subject.clone();
    store.mark(Collection::Subjects);

    if previous_code != code || name_changed {
        let mut refreshed = 0usize;
        for allocation in store
            .allocations
            .iter_mut()
            .filter(|a| a.subject_code == previous_code)
        {
            allocation.subject_code = code.to_string();
            allocation.subject_name = name.to_string();
            refreshed += 1;
        }
        debug!(%previous_code, code, refreshed, "Refreshed allocations after subject edit");
        if refreshed > 0 {
            store.mark(Collection::Allocations);
        }
    }

    Ok(updated)
}

/// Deletes subject `id` and every allocation referencing its code.
///
/// Returns the deleted subject and the number of allocations removed with it.
///
/// # Errors
/// Returns [`Error::SubjectNotFound`] if `id` is unknown.
pub fn delete_subject(store: &mut Store, id: &str) -> Result<(Subject, usize)> {
    let index = store
        .subjects
        .iter()
        .position(|s| s.id == id)
        .ok_or_else(|| Error::SubjectNotFound { key: id.to_string() })?;
    let subject = store.subjects.remove(index);
    store.mark(Collection::Subjects);

    let before = store.allocations.len();
    store.allocations.retain(|a| a.subject_code != subject.code);
    let removed = before - store.allocations.len();
    if removed > 0 {
        store.mark(Collection::Allocations);
    }

    Ok((subject, removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        allocation::{self, DuplicateRequestPolicy},
        auth,
        models::{AllocationStatus, Role},
    };

    fn seeded() -> Result<(Store, Subject, Subject)> {
        let mut store = Store::default();
        let cs = create_subject(&mut store, "Intro to CS", "CS101", "Turing")?;
        let ma = create_subject(&mut store, "Calculus", "MA101", "Noether")?;
        let a = auth::register(&mut store, "A", "a@x.com", "pw", Role::Student)?;
        let b = auth::register(&mut store, "B", "b@x.com", "pw", Role::Student)?;
        allocation::request_subject(&mut store, &a, "CS101", DuplicateRequestPolicy::Allow)?;
        allocation::manual_allocate(&mut store, "b@x.com", "CS101")?;
        allocation::request_subject(&mut store, &b, "MA101", DuplicateRequestPolicy::Allow)?;
        store.take_dirty();
        Ok((store, cs, ma))
    }

    #[test]
    fn test_create_subject_duplicate_code_fails() -> Result<()> {
        let mut store = Store::default();
        create_subject(&mut store, "Intro", "CS101", "Turing")?;
        let result = create_subject(&mut store, "Other", "CS101", "Hopper");
        assert!(matches!(result, Err(Error::DuplicateCode { ref code }) if code == "CS101"));
        assert_eq!(store.subjects().len(), 1);
        Ok(())
    }

    #[test]
    fn test_edit_subject_code_cascades_to_allocations() -> Result<()> {
        let (mut store, cs, _) = seeded()?;
        let before: Vec<_> = store
            .allocations()
            .iter()
            .map(|a| (a.id.clone(), a.status))
            .collect();

        edit_subject(&mut store, &cs.id, "Computing I", "CS110", "Turing")?;

        let after: Vec<_> = store
            .allocations()
            .iter()
            .map(|a| (a.id.clone(), a.status))
            .collect();
        assert_eq!(before, after);

        let moved: Vec<_> = store
            .allocations()
            .iter()
            .filter(|a| a.subject_code == "CS110")
            .collect();
        assert_eq!(moved.len(), 2);
        assert!(moved.iter().all(|a| a.subject_name == "Computing I"));
        assert!(store.allocations().iter().all(|a| a.subject_code != "CS101"));
        // MA101 allocation untouched
        assert_eq!(
            store
                .allocations()
                .iter()
                .filter(|a| a.subject_code == "MA101")
                .count(),
            1
        );
        assert_eq!(
            store.take_dirty(),
            vec![Collection::Subjects, Collection::Allocations]
        );
        Ok(())
    }

    #[test]
    fn test_edit_subject_name_only_refreshes_allocation_names() -> Result<()> {
        let (mut store, cs, _) = seeded()?;
        let before: Vec<_> = store
            .allocations()
            .iter()
            .map(|a| (a.id.clone(), a.status, a.subject_code.clone()))
            .collect();

        edit_subject(&mut store, &cs.id, "Computing I", "CS101", "Turing")?;

        let after: Vec<_> = store
            .allocations()
            .iter()
            .map(|a| (a.id.clone(), a.status, a.subject_code.clone()))
            .collect();
        assert_eq!(before, after);
        for allocation in store.allocations() {
            let expected = if allocation.subject_code == "CS101" {
                "Computing I"
            } else {
                "Calculus"
            };
            assert_eq!(allocation.subject_name, expected);
        }
        assert_eq!(
            store.take_dirty(),
            vec![Collection::Subjects, Collection::Allocations]
        );
        Ok(())
    }

    #[test]
    fn test_edit_subject_teacher_only_leaves_allocations_clean() -> Result<()> {
        let (mut store, cs, _) = seeded()?;
        edit_subject(&mut store, &cs.id, "Intro to CS", "CS101", "Lovelace")?;
        assert_eq!(store.subject_by_id(&cs.id).map(|s| s.teacher.as_str()), Some("Lovelace"));
        assert_eq!(store.take_dirty(), vec![Collection::Subjects]);
        Ok(())
    }

    #[test]
    fn test_edit_subject_rejects_code_of_other_subject() -> Result<()> {
        let (mut store, cs, _) = seeded()?;
        let result = edit_subject(&mut store, &cs.id, "Intro", "MA101", "Turing");
        assert!(matches!(result, Err(Error::DuplicateCode { .. })));
        assert_eq!(store.subject_by_id(&cs.id).map(|s| s.code.as_str()), Some("CS101"));
        assert!(store.take_dirty().is_empty());

        // keeping its own code is fine
        edit_subject(&mut store, &cs.id, "Intro", "CS101", "Turing")?;
        Ok(())
    }

    #[test]
    fn test_edit_unknown_subject() {
        let mut store = Store::default();
        let result = edit_subject(&mut store, "missing", "X", "X1", "Y");
        assert!(matches!(result, Err(Error::SubjectNotFound { .. })));
    }

    #[test]
    fn test_delete_subject_cascades_only_matching_allocations() -> Result<()> {
        let (mut store, cs, ma) = seeded()?;
        let (deleted, removed) = delete_subject(&mut store, &cs.id)?;

        assert_eq!(deleted.code, "CS101");
        assert_eq!(removed, 2);
        assert_eq!(store.subjects(), &[ma]);
        assert_eq!(store.allocations().len(), 1);
        assert_eq!(store.allocations()[0].subject_code, "MA101");
        assert_eq!(store.allocations()[0].status, AllocationStatus::Pending);
        Ok(())
    }

    #[test]
    fn test_delete_subject_without_allocations() -> Result<()> {
        let mut store = Store::default();
        let s = create_subject(&mut store, "Art", "AR100", "Kahlo")?;
        store.take_dirty();
        let (_, removed) = delete_subject(&mut store, &s.id)?;
        assert_eq!(removed, 0);
        assert_eq!(store.take_dirty(), vec![Collection::Subjects]);
        Ok(())
    }
}
