//! Application view-model.
//!
//! [`App`] owns the in-memory [`Store`], the session, the view router and the
//! two storage scopes. Each public action checks the session role, applies a
//! state transition from [`crate::core`], writes the touched collections back
//! to durable storage and records a notice for the view layer. Display models
//! are recomputed from the store on every call.

use crate::{
    config::AppConfig,
    core::{
        Store, allocation,
        allocation::{DuplicateRequestPolicy, WithdrawAction},
        auth,
        models::{Allocation, Role, Subject, User},
        report::{
            self, AdminStats, CatalogueEntry, ManualAllocationOptions, MyAllocationRow, Profile,
            ReportCard, StudentStats,
        },
        subject,
    },
    errors::{Error, Result},
    storage::{self, KeyValueStore, StorageKeys},
    views::{
        NavLink, Router, View,
        notice::{self, Form, Notice},
    },
};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

/// Prompt shown before deleting a subject
pub const CONFIRM_DELETE_SUBJECT: &str =
    "Are you sure? This will delete the subject AND all student allocations for it.";
/// Prompt shown before dropping an approved subject
pub const CONFIRM_DROP_SUBJECT: &str = "Are you sure you want to drop this approved subject?";
/// Prompt shown before deleting a pending or rejected request
pub const CONFIRM_DELETE_REQUEST: &str = "Are you sure you want to delete this request?";

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    /// Returns `true` if the user accepts `prompt`.
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Result of an action that asks for confirmation
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The action ran
    Done(T),
    /// The user declined; nothing changed
    Cancelled,
}

/// The view-model driving every view.
#[derive(Debug)]
pub struct App<L, S> {
    store: Store,
    session: Option<User>,
    router: Router,
    local: L,
    session_store: S,
    keys: StorageKeys,
    policy: DuplicateRequestPolicy,
    notice_duration: Duration,
    notice: Option<Notice>,
}

impl<L: KeyValueStore, S: KeyValueStore> App<L, S> {
    /// Loads the store from `local` and restores a session from
    /// `session_store` if one is recorded for a known user.
    pub async fn load(local: L, session_store: S, config: &AppConfig) -> Result<Self> {
        let keys = StorageKeys::from_config(&config.storage);
        let store = storage::load_store(&local, &keys).await?;
        let mut app = Self {
            store,
            session: None,
            router: Router::default(),
            local,
            session_store,
            keys,
            policy: config.allocation.duplicate_requests,
            notice_duration: config.ui.notice_duration(),
            notice: None,
        };
        app.restore_session().await?;
        Ok(app)
    }

    /// Re-authenticates silently from the session marker.
    ///
    /// Returns `true` if a session was restored. A marker that does not parse
    /// or names an unknown email leaves the app logged out.
    pub async fn restore_session(&mut self) -> Result<bool> {
        let Some(text) = self.session_store.get(self.keys.current_user()).await? else {
            return Ok(false);
        };

        let marker: User = match serde_json::from_str(&text) {
            Ok(user) => user,
            Err(e) => {
                warn!("Ignoring unreadable session marker: {e}");
                return Ok(false);
            }
        };

        match auth::resolve_session(&self.store, &marker) {
            Some(user) => {
                info!(email = %user.email, "Restored session");
                self.start_session(user).await?;
                Ok(true)
            }
            None => {
                warn!(email = %marker.email, "Session marker names an unknown user");
                Ok(false)
            }
        }
    }

    // --- Authentication ---

    /// Registers a new account and logs in as it.
    #[instrument(skip(self, password))]
    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User> {
        let result = auth::register(&mut self.store, name, email, password, role);
        let user = self.settle(Form::Register, result).await?;
        info!(email = %user.email, role = %user.role, "Registered user");
        self.start_session(user.clone()).await?;
        Ok(user)
    }

    /// Logs in with an exact email and password match.
    #[instrument(skip(self, password))]
    pub async fn login(&mut self, email: &str, password: &str) -> Result<User> {
        let result = auth::authenticate(&self.store, email, password);
        let user = self.settle(Form::Login, result).await?;
        info!(email = %user.email, "Logged in");
        self.start_session(user.clone()).await?;
        Ok(user)
    }

    /// Clears the session and hides every view.
    pub async fn logout(&mut self) -> Result<()> {
        if let Some(user) = self.session.take() {
            info!(email = %user.email, "Logged out");
        }
        self.router.clear();
        self.notice = None;
        self.session_store.remove(self.keys.current_user()).await
    }

    async fn start_session(&mut self, user: User) -> Result<()> {
        storage::set_json(&self.session_store, self.keys.current_user(), &user).await?;
        self.router.enter(user.role);
        self.session = Some(user);
        Ok(())
    }

    // --- Subject management (admin) ---

    /// Creates a subject.
    #[instrument(skip(self))]
    pub async fn create_subject(&mut self, name: &str, code: &str, teacher: &str) -> Result<Subject> {
        let result = self
            .require(Role::Admin)
            .and_then(|_| subject::create_subject(&mut self.store, name, code, teacher));
        let created = self.settle(Form::CreateSubject, result).await?;
        info!(code = %created.code, "Created subject");
        Ok(created)
    }

    /// Edits a subject, refreshing the allocations that reference it.
    #[instrument(skip(self))]
    pub async fn edit_subject(
        &mut self,
        id: &str,
        name: &str,
        code: &str,
        teacher: &str,
    ) -> Result<Subject> {
        let result = self
            .require(Role::Admin)
            .and_then(|_| subject::edit_subject(&mut self.store, id, name, code, teacher));
        let edited = self.settle(Form::EditSubject, result).await?;
        info!(id, code = %edited.code, "Edited subject");
        Ok(edited)
    }

    /// Deletes a subject and its allocations after confirmation.
    #[instrument(skip(self, confirm))]
    pub async fn delete_subject(
        &mut self,
        id: &str,
        confirm: &mut impl Confirm,
    ) -> Result<Outcome<Subject>> {
        let check = self.require(Role::Admin).and_then(|_| {
            self.store
                .subject_by_id(id)
                .map(|_| ())
                .ok_or_else(|| Error::SubjectNotFound { key: id.to_string() })
        });
        self.settle(Form::ManageSubjects, check).await?;
        if !confirm.confirm(CONFIRM_DELETE_SUBJECT) {
            return Ok(Outcome::Cancelled);
        }

        let result = subject::delete_subject(&mut self.store, id);
        let (deleted, removed) = self.settle(Form::ManageSubjects, result).await?;
        info!(code = %deleted.code, removed, "Deleted subject");
        Ok(Outcome::Done(deleted))
    }

    // --- Allocations ---

    /// Sends a pending request for the subject with `code`.
    #[instrument(skip(self))]
    pub async fn request_subject(&mut self, code: &str) -> Result<Allocation> {
        let policy = self.policy;
        let result = self.require(Role::Student).and_then(|student| {
            allocation::request_subject(&mut self.store, &student, code, policy)
        });
        let created = self.settle(Form::RequestSubject, result).await?;
        info!(id = %created.id, code, "Requested subject");
        Ok(created)
    }

    /// Approves a request.
    #[instrument(skip(self))]
    pub async fn approve(&mut self, id: &str) -> Result<Allocation> {
        let result = self
            .require(Role::Admin)
            .and_then(|_| allocation::approve(&mut self.store, id));
        let updated = self.settle(Form::AllocationRequests, result).await?;
        info!(id, "Approved allocation");
        Ok(updated)
    }

    /// Rejects a request.
    #[instrument(skip(self))]
    pub async fn reject(&mut self, id: &str) -> Result<Allocation> {
        let result = self
            .require(Role::Admin)
            .and_then(|_| allocation::reject(&mut self.store, id));
        let updated = self.settle(Form::AllocationRequests, result).await?;
        info!(id, "Rejected allocation");
        Ok(updated)
    }

    /// Allocates a student to a subject directly as approved.
    #[instrument(skip(self))]
    pub async fn manual_allocate(&mut self, student_email: &str, code: &str) -> Result<Allocation> {
        let result = self
            .require(Role::Admin)
            .and_then(|_| allocation::manual_allocate(&mut self.store, student_email, code));
        let created = self.settle(Form::ManualAllocation, result).await?;
        info!(id = %created.id, student_email, code, "Allocated subject manually");
        self.notice = Some(Notice::success(
            notice::ALLOCATION_CREATED,
            self.notice_duration,
        ));
        Ok(created)
    }

    /// Drops an approved subject of the current student after confirmation.
    #[instrument(skip(self, confirm))]
    pub async fn drop_subject(
        &mut self,
        id: &str,
        confirm: &mut impl Confirm,
    ) -> Result<Outcome<Allocation>> {
        self.withdraw(id, confirm, CONFIRM_DROP_SUBJECT, WithdrawAction::Drop)
            .await
    }

    /// Deletes a pending or rejected request of the current student after
    /// confirmation.
    #[instrument(skip(self, confirm))]
    pub async fn delete_request(
        &mut self,
        id: &str,
        confirm: &mut impl Confirm,
    ) -> Result<Outcome<Allocation>> {
        self.withdraw(id, confirm, CONFIRM_DELETE_REQUEST, WithdrawAction::DeleteRequest)
            .await
    }

    async fn withdraw(
        &mut self,
        id: &str,
        confirm: &mut impl Confirm,
        prompt: &str,
        action: WithdrawAction,
    ) -> Result<Outcome<Allocation>> {
        let check = self.require(Role::Student).and_then(|student| {
            allocation::check_withdrawal(&self.store, &student.email, id, action)?;
            Ok(student)
        });
        let student = self.settle(Form::MyAllocations, check).await?;
        if !confirm.confirm(prompt) {
            return Ok(Outcome::Cancelled);
        }

        let result = allocation::withdraw(&mut self.store, &student.email, id, action);
        let removed = self.settle(Form::MyAllocations, result).await?;
        info!(id, code = %removed.subject_code, "Removed allocation");
        Ok(Outcome::Done(removed))
    }

    // --- Navigation ---

    /// Shows the view with identifier `view_id`.
    pub fn show(&mut self, view_id: &str) -> Result<View> {
        let result = self.route(view_id);
        self.notice = result
            .as_ref()
            .err()
            .map(|e| Notice::for_error(Form::Navigation, e, self.notice_duration));
        result
    }

    fn route(&mut self, view_id: &str) -> Result<View> {
        let view = View::from_id(view_id)?;
        let role = self
            .session
            .as_ref()
            .map(|user| user.role)
            .ok_or(Error::NotAuthenticated)?;
        self.router.show(role, view)?;
        Ok(view)
    }

    /// Currently shown view, `None` when logged out
    #[must_use]
    pub const fn active_view(&self) -> Option<View> {
        self.router.active()
    }

    /// Navigation entries of the logged-in role
    #[must_use]
    pub fn nav(&self) -> &'static [NavLink] {
        self.current_user()
            .map(|user| View::nav_for(user.role))
            .unwrap_or_default()
    }

    // --- Projections ---

    /// The logged-in user
    #[must_use]
    pub const fn current_user(&self) -> Option<&User> {
        self.session.as_ref()
    }

    /// The in-memory store
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// The latest notice, if it is still visible
    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| n.is_visible())
    }

    /// `Welcome, <name> (<role>)`
    #[must_use]
    pub fn welcome(&self) -> Option<String> {
        self.current_user()
            .map(|u| format!("Welcome, {} ({})", u.name, u.role))
    }

    /// Admin dashboard counters.
    pub fn admin_stats(&self) -> Result<AdminStats> {
        self.require(Role::Admin)?;
        Ok(report::admin_stats(&self.store))
    }

    /// Dashboard counters of the logged-in student.
    pub fn student_stats(&self) -> Result<StudentStats> {
        let student = self.require(Role::Student)?;
        Ok(report::student_stats(&self.store, &student.email))
    }

    /// Pending requests awaiting a decision.
    pub fn pending_requests(&self) -> Result<Vec<&Allocation>> {
        self.require(Role::Admin)?;
        Ok(report::pending_requests(&self.store))
    }

    /// Subjects in management order.
    pub fn subjects(&self) -> Result<&[Subject]> {
        self.require(Role::Admin)?;
        Ok(self.store.subjects())
    }

    /// Choices of the manual allocation form.
    pub fn manual_allocation_options(&self) -> Result<ManualAllocationOptions> {
        self.require(Role::Admin)?;
        Ok(report::manual_allocation_options(&self.store))
    }

    /// Full per-subject report.
    pub fn full_report(&self) -> Result<Vec<ReportCard>> {
        self.require(Role::Admin)?;
        Ok(report::full_report(&self.store))
    }

    /// Subject catalogue of the logged-in student.
    pub fn subject_catalogue(&self) -> Result<Vec<CatalogueEntry>> {
        let student = self.require(Role::Student)?;
        Ok(report::subject_catalogue(&self.store, &student.email))
    }

    /// Allocations of the logged-in student.
    pub fn my_allocations(&self) -> Result<Vec<MyAllocationRow>> {
        let student = self.require(Role::Student)?;
        Ok(report::my_allocations(&self.store, &student.email))
    }

    /// Profile of the logged-in user.
    pub fn profile(&self) -> Result<Profile> {
        self.current_user()
            .map(Profile::from)
            .ok_or(Error::NotAuthenticated)
    }

    // --- Internals ---

    fn require(&self, role: Role) -> Result<User> {
        let user = self.session.as_ref().ok_or(Error::NotAuthenticated)?;
        if user.role == role {
            Ok(user.clone())
        } else {
            Err(Error::Forbidden { role: user.role })
        }
    }

    /// Persists the touched collections of a successful action, or records
    /// the notice of a failed one.
    async fn settle<T>(&mut self, form: Form, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.persist().await?;
                self.notice = None;
                Ok(value)
            }
            Err(e) if e.is_user_facing() => {
                self.notice = Some(Notice::for_error(form, &e, self.notice_duration));
                Err(e)
            }
            Err(e) => {
                error!("Action failed: {e}");
                Err(e)
            }
        }
    }

    /// Writes every dirty collection. Collections not written because of a
    /// failure stay dirty and are retried by the next action.
    async fn persist(&mut self) -> Result<()> {
        let dirty = self.store.take_dirty();
        for (index, &collection) in dirty.iter().enumerate() {
            if let Err(e) =
                storage::save_collection(&self.local, &self.keys, &self.store, collection).await
            {
                error!("Failed to save {}: {e}", collection.as_str());
                self.store.mark_dirty(&dirty[index..]);
                return Err(e);
            }
        }
        Ok(())
    }
}
