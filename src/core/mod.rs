//! Core business logic - framework-agnostic state transitions and projections.
//!
//! The [`Store`] holds the three collections in memory. The sibling modules
//! mutate it through plain functions that validate their input first, so a
//! failed call leaves the store exactly as it was. Every mutation records the
//! collections it touched; the caller drains them with [`Store::take_dirty`]
//! and writes each one back to storage.

use std::collections::BTreeSet;

pub mod allocation;
pub mod auth;
pub mod id;
pub mod models;
pub mod report;
pub mod subject;

use models::{Allocation, Subject, User};

/// One of the three persisted collections
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    /// Registered users
    Users,
    /// Subjects offered
    Subjects,
    /// Student/subject allocations
    Allocations,
}

impl Collection {
    /// Name used in storage keys
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Subjects => "subjects",
            Self::Allocations => "allocations",
        }
    }
}

/// In-memory state: users, subjects and allocations in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Store {
    users: Vec<User>,
    subjects: Vec<Subject>,
    allocations: Vec<Allocation>,
    dirty: BTreeSet<Collection>,
}

impl Store {
    /// Builds a store from previously persisted collections. Nothing is dirty.
    #[must_use]
    pub const fn from_parts(
        users: Vec<User>,
        subjects: Vec<Subject>,
        allocations: Vec<Allocation>,
    ) -> Self {
        Self {
            users,
            subjects,
            allocations,
            dirty: BTreeSet::new(),
        }
    }

    /// All registered users
    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// All subjects
    #[must_use]
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// All allocations
    #[must_use]
    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    /// Finds a user by email.
    #[must_use]
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email == email)
    }

    /// Finds a subject by id.
    #[must_use]
    pub fn subject_by_id(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    /// Finds a subject by code.
    #[must_use]
    pub fn subject_by_code(&self, code: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.code == code)
    }

    /// Finds an allocation by id.
    #[must_use]
    pub fn allocation_by_id(&self, id: &str) -> Option<&Allocation> {
        self.allocations.iter().find(|a| a.id == id)
    }

    /// Allocations belonging to one student, in insertion order.
    pub fn allocations_for<'a>(&'a self, email: &'a str) -> impl Iterator<Item = &'a Allocation> {
        self.allocations
            .iter()
            .filter(move |a| a.student_email == email)
    }

    /// Returns the collections changed since the last call and clears the set.
    pub fn take_dirty(&mut self) -> Vec<Collection> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    /// Flags `collections` for the next [`Store::take_dirty`] again, e.g.
    /// after writing them back failed.
    pub fn mark_dirty(&mut self, collections: &[Collection]) {
        self.dirty.extend(collections.iter().copied());
    }

    fn mark(&mut self, collection: Collection) {
        self.dirty.insert(collection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{AllocationStatus, Role};
    use crate::errors::Result;

    #[test]
    fn test_take_dirty_drains_in_collection_order() -> Result<()> {
        let mut store = Store::default();
        subject::create_subject(&mut store, "Intro", "CS101", "Turing")?;
        auth::register(&mut store, "A", "a@x.com", "pw", Role::Student)?;

        assert_eq!(
            store.take_dirty(),
            vec![Collection::Users, Collection::Subjects]
        );
        assert!(store.take_dirty().is_empty());
        Ok(())
    }

    #[test]
    fn test_allocations_for_filters_by_student() -> Result<()> {
        let mut store = Store::default();
        subject::create_subject(&mut store, "Intro", "CS101", "Turing")?;
        let a = auth::register(&mut store, "A", "a@x.com", "pw", Role::Student)?;
        let b = auth::register(&mut store, "B", "b@x.com", "pw", Role::Student)?;
        allocation::request_subject(&mut store, &a, "CS101", allocation::DuplicateRequestPolicy::Allow)?;
        allocation::request_subject(&mut store, &b, "CS101", allocation::DuplicateRequestPolicy::Allow)?;

        let mine: Vec<_> = store.allocations_for("a@x.com").collect();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].student_name, "A");
        assert_eq!(mine[0].status, AllocationStatus::Pending);
        Ok(())
    }

    #[test]
    fn test_mark_dirty_requeues_collections() {
        let mut store = Store::default();
        store.mark_dirty(&[Collection::Allocations, Collection::Subjects]);
        store.mark_dirty(&[Collection::Subjects]);
        assert_eq!(
            store.take_dirty(),
            vec![Collection::Subjects, Collection::Allocations]
        );
    }
}
