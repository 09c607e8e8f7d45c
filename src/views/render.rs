//! Text rendering of the views.
//!
//! Each function formats one display model from [`crate::core::report`];
//! [`render_active`] picks the one for the active view.

use crate::{
    app::App,
    core::{
        models::{Allocation, Subject},
        report::{
            AdminStats, CatalogueEntry, ManualAllocationOptions, MyAllocationRow, Profile,
            ReportCard, RequestAction, StudentStats, WithdrawAction,
        },
    },
    errors::Result,
    storage::KeyValueStore,
    views::{
        NavLink, View,
        notice::{Notice, NoticeKind},
    },
};
use std::fmt::Write;

/// Renders the header, navigation, active view and visible notice.
///
/// # Errors
/// Returns an error if the active view is not available to the session role.
pub fn render_active<L: KeyValueStore, S: KeyValueStore>(app: &App<L, S>) -> Result<String> {
    let mut out = String::new();
    let Some(view) = app.active_view() else {
        out.push_str("Not logged in. Use `login` or `register` (type `help` for usage).\n");
        if let Some(notice) = app.notice() {
            out.push_str(&notice_line(notice));
        }
        return Ok(out);
    };

    if let Some(welcome) = app.welcome() {
        writeln!(out, "{welcome}").ok();
    }
    out.push_str(&nav(app.nav(), view));
    out.push('\n');

    let body = match view {
        View::AdminDashboard => admin_dashboard(&app.admin_stats()?),
        View::AdminAllocationRequests => pending_requests(&app.pending_requests()?),
        View::AdminManualAllocation => manual_allocation(&app.manual_allocation_options()?),
        View::AdminManageSubjects => manage_subjects(app.subjects()?),
        View::AdminReport => full_report(&app.full_report()?),
        View::StudentDashboard => student_dashboard(&app.student_stats()?),
        View::StudentAllSubjects => subject_catalogue(&app.subject_catalogue()?),
        View::StudentMyAllocations => my_allocations(&app.my_allocations()?),
        View::StudentProfile => profile(&app.profile()?),
    };
    out.push_str(&body);

    if let Some(notice) = app.notice() {
        out.push_str(&notice_line(notice));
    }
    Ok(out)
}

/// Navigation bar with the active entry marked.
#[must_use]
pub fn nav(links: &[NavLink], active: View) -> String {
    let entries: Vec<String> = links
        .iter()
        .map(|link| {
            if link.view == active {
                format!("[{}]", link.label)
            } else {
                link.label.to_string()
            }
        })
        .collect();
    format!("{}\n", entries.join(" | "))
}

/// Admin counters.
#[must_use]
pub fn admin_dashboard(stats: &AdminStats) -> String {
    format!(
        "== Dashboard ==\nSubjects: {}\nPending requests: {}\nStudents: {}\n",
        stats.subjects, stats.pending, stats.students
    )
}

/// Student counters.
#[must_use]
pub fn student_dashboard(stats: &StudentStats) -> String {
    format!(
        "== Dashboard ==\nApproved: {}\nPending: {}\nRejected: {}\n",
        stats.approved, stats.pending, stats.rejected
    )
}

/// Pending requests with their ids for approve/reject.
#[must_use]
pub fn pending_requests(pending: &[&Allocation]) -> String {
    let mut out = String::from("== Allocation Requests ==\n");
    if pending.is_empty() {
        out.push_str("No pending requests.\n");
        return out;
    }
    for allocation in pending {
        writeln!(
            out,
            "- {} requesting: {} ({})  [id: {}]",
            allocation.student_name, allocation.subject_name, allocation.subject_code, allocation.id
        )
        .ok();
    }
    out
}

/// Dropdown choices of the manual allocation form.
#[must_use]
pub fn manual_allocation(options: &ManualAllocationOptions) -> String {
    let mut out = String::from("== Manual Allocation ==\nStudents:\n");
    if options.students.is_empty() {
        out.push_str("  (none)\n");
    }
    for student in &options.students {
        writeln!(out, "  {}", student.label).ok();
    }
    out.push_str("Subjects:\n");
    if options.subjects.is_empty() {
        out.push_str("  (none)\n");
    }
    for subject in &options.subjects {
        writeln!(out, "  {}", subject.label).ok();
    }
    out.push_str("Use `allocate <email> <code>`.\n");
    out
}

/// Subject list with ids for edit/delete.
#[must_use]
pub fn manage_subjects(subjects: &[Subject]) -> String {
    let mut out = String::from("== Manage Subjects ==\n");
    if subjects.is_empty() {
        out.push_str("No subjects created yet.\n");
        return out;
    }
    for subject in subjects {
        writeln!(
            out,
            "- {} {} • {}  [id: {}]",
            subject.name, subject.code, subject.teacher, subject.id
        )
        .ok();
    }
    out
}

/// One card per subject listing its allocations.
#[must_use]
pub fn full_report(cards: &[ReportCard]) -> String {
    let mut out = String::from("== Full Report ==\n");
    if cards.is_empty() {
        out.push_str("No subjects exist to report on.\n");
        return out;
    }
    for card in cards {
        writeln!(out, "{} ({})", card.subject_name, card.subject_code).ok();
        if card.rows.is_empty() {
            out.push_str("  No students allocated.\n");
        }
        for row in &card.rows {
            writeln!(
                out,
                "  {:<20} {:<28} {}",
                row.student_name,
                row.student_email,
                row.status.as_str().to_uppercase()
            )
            .ok();
        }
    }
    out
}

/// Subject catalogue with the request state of each subject.
#[must_use]
pub fn subject_catalogue(entries: &[CatalogueEntry]) -> String {
    let mut out = String::from("== Request Subjects ==\n");
    if entries.is_empty() {
        out.push_str("No subjects are available right now.\n");
        return out;
    }
    for entry in entries {
        let action = match entry.action {
            RequestAction::Request => format!("request {}", entry.subject.code),
            RequestAction::Enrolled => "Enrolled".to_string(),
            RequestAction::RequestSent => "Request Sent".to_string(),
            RequestAction::Rejected => "Rejected".to_string(),
        };
        writeln!(
            out,
            "- {} {} • {}  [{action}]",
            entry.subject.name, entry.subject.code, entry.subject.teacher
        )
        .ok();
    }
    out
}

/// The student's allocations with the available removal command.
#[must_use]
pub fn my_allocations(rows: &[MyAllocationRow]) -> String {
    let mut out = String::from("== My Allocations ==\n");
    if rows.is_empty() {
        out.push_str("You have not requested any subjects.\n");
        return out;
    }
    for row in rows {
        let command = match row.action {
            WithdrawAction::Drop => "drop",
            WithdrawAction::DeleteRequest => "withdraw",
        };
        writeln!(
            out,
            "- {} ({}) {}  [{command} {}]",
            row.allocation.subject_name,
            row.allocation.subject_code,
            row.allocation.status.as_str().to_uppercase(),
            row.allocation.id
        )
        .ok();
    }
    out
}

/// Profile fields.
#[must_use]
pub fn profile(profile: &Profile) -> String {
    format!(
        "== My Profile ==\nName: {}\nEmail: {}\nRole: {}\n",
        profile.name, profile.email, profile.role
    )
}

/// A notice as a single line.
#[must_use]
pub fn notice_line(notice: &Notice) -> String {
    match notice.kind {
        NoticeKind::Error => format!("! {}\n", notice.text),
        NoticeKind::Success => format!("✓ {}\n", notice.text),
    }
}
