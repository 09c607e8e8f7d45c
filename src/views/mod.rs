//! View layer - view routing, notices and text rendering.
//!
//! Exactly one view is active at a time, and the views available depend on
//! the role of the logged-in user.

/// Transient messages shown after a form submission
pub mod notice;
/// Text rendering of the display models
pub mod render;

use crate::{
    core::models::Role,
    errors::{Error, Result},
};
use std::fmt;

/// A named screen of the application
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    /// Admin counters
    AdminDashboard,
    /// Pending requests awaiting approval
    AdminAllocationRequests,
    /// Direct allocation form
    AdminManualAllocation,
    /// Subject create/edit/delete
    AdminManageSubjects,
    /// Per-subject allocation report
    AdminReport,
    /// Student counters
    StudentDashboard,
    /// Subject catalogue with request buttons
    StudentAllSubjects,
    /// The student's allocations
    StudentMyAllocations,
    /// The student's profile
    StudentProfile,
}

/// A navigation entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavLink {
    /// Target view
    pub view: View,
    /// Label shown in the navigation
    pub label: &'static str,
}

const ADMIN_NAV: &[NavLink] = &[
    NavLink {
        view: View::AdminDashboard,
        label: "Dashboard",
    },
    NavLink {
        view: View::AdminAllocationRequests,
        label: "Allocation Requests",
    },
    NavLink {
        view: View::AdminManualAllocation,
        label: "Manual Allocation",
    },
    NavLink {
        view: View::AdminManageSubjects,
        label: "Manage Subjects",
    },
    NavLink {
        view: View::AdminReport,
        label: "Full Report",
    },
];

const STUDENT_NAV: &[NavLink] = &[
    NavLink {
        view: View::StudentDashboard,
        label: "Dashboard",
    },
    NavLink {
        view: View::StudentAllSubjects,
        label: "Request Subjects",
    },
    NavLink {
        view: View::StudentMyAllocations,
        label: "My Allocations",
    },
    NavLink {
        view: View::StudentProfile,
        label: "My Profile",
    },
];

impl View {
    /// Every view, admin views first
    pub const ALL: [Self; 9] = [
        Self::AdminDashboard,
        Self::AdminAllocationRequests,
        Self::AdminManualAllocation,
        Self::AdminManageSubjects,
        Self::AdminReport,
        Self::StudentDashboard,
        Self::StudentAllSubjects,
        Self::StudentMyAllocations,
        Self::StudentProfile,
    ];

    /// Stable identifier, e.g. `view-admin-dashboard`
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::AdminDashboard => "view-admin-dashboard",
            Self::AdminAllocationRequests => "view-admin-allocation-requests",
            Self::AdminManualAllocation => "view-admin-manual-allocation",
            Self::AdminManageSubjects => "view-admin-manage-subjects",
            Self::AdminReport => "view-admin-report",
            Self::StudentDashboard => "view-student-dashboard",
            Self::StudentAllSubjects => "view-student-all-subjects",
            Self::StudentMyAllocations => "view-student-my-allocations",
            Self::StudentProfile => "view-student-profile",
        }
    }

    /// Role allowed to see this view
    #[must_use]
    pub const fn role(self) -> Role {
        match self {
            Self::AdminDashboard
            | Self::AdminAllocationRequests
            | Self::AdminManualAllocation
            | Self::AdminManageSubjects
            | Self::AdminReport => Role::Admin,
            Self::StudentDashboard
            | Self::StudentAllSubjects
            | Self::StudentMyAllocations
            | Self::StudentProfile => Role::Student,
        }
    }

    /// Parses a view identifier.
    ///
    /// # Errors
    /// Returns [`Error::UnknownView`] if no view has this id.
    pub fn from_id(id: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.id() == id)
            .ok_or_else(|| Error::UnknownView { id: id.to_string() })
    }

    /// Navigation entries of a role, home view first
    #[must_use]
    pub const fn nav_for(role: Role) -> &'static [NavLink] {
        match role {
            Role::Admin => ADMIN_NAV,
            Role::Student => STUDENT_NAV,
        }
    }

    /// View shown right after login
    #[must_use]
    pub const fn home(role: Role) -> Self {
        match role {
            Role::Admin => Self::AdminDashboard,
            Role::Student => Self::StudentDashboard,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Tracks the single active view
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Router {
    active: Option<View>,
}

impl Router {
    /// Currently shown view, `None` when logged out
    #[must_use]
    pub const fn active(&self) -> Option<View> {
        self.active
    }

    /// Shows the home view of `role`.
    pub fn enter(&mut self, role: Role) -> View {
        let home = View::home(role);
        self.active = Some(home);
        home
    }

    /// Shows `view` if it belongs to `role`.
    ///
    /// # Errors
    /// Returns [`Error::Forbidden`] for a view of the other role; the active
    /// view is kept.
    pub fn show(&mut self, role: Role, view: View) -> Result<()> {
        if view.role() != role {
            return Err(Error::Forbidden { role });
        }
        self.active = Some(view);
        Ok(())
    }

    /// Hides every view.
    pub fn clear(&mut self) {
        self.active = None;
    }
}
