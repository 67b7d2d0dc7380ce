//! Shared status-display vocabulary.
//!
//! Each dashboard used to carry its own synonym table with slightly
//! different defaults; they are unified here. An absent or blank status is
//! always treated as the pending lifecycle state and rendered with the
//! viewer's pending label. Viewer parameterization only changes labels,
//! never the underlying state.

use shared::domain::{CaseStatus, Role};

/// Which dashboard is rendering the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Claimant,
    Gp,
    Qa,
    Admin,
}

impl From<Role> for Viewer {
    fn from(role: Role) -> Self {
        match role {
            Role::Claimant => Viewer::Claimant,
            Role::Gp => Viewer::Gp,
            Role::Qa => Viewer::Qa,
            Role::Admin => Viewer::Admin,
        }
    }
}

/// Turns a raw backend status into the label the given viewer displays.
///
/// Total over all inputs: every raw string (and the absent case) maps to a
/// non-empty label, unknown values fall back to title-casing fragments
/// split on underscores and whitespace.
pub fn display_status(raw: Option<&str>, viewer: Viewer) -> String {
    let trimmed = raw.map(str::trim).filter(|s| !s.is_empty());
    let Some(trimmed) = trimmed else {
        return pending_label(viewer).to_string();
    };

    let lower = trimmed.to_ascii_lowercase();
    if let Some(status) = CaseStatus::parse(Some(&lower)) {
        return lifecycle_label(status, viewer).to_string();
    }

    match (viewer, lower.as_str()) {
        (Viewer::Admin, "qa_pending") => "QA Pending".to_string(),
        (Viewer::Gp, "qa_pending") => "Pending Review".to_string(),
        (Viewer::Qa, "qa_pending") => "Submitted".to_string(),
        // Claimant badges only distinguish the lifecycle states; anything
        // else reads as a submitted case.
        (Viewer::Claimant, _) => "SUBMITTED".to_string(),
        _ => title_case(&lower),
    }
}

fn pending_label(viewer: Viewer) -> &'static str {
    match viewer {
        Viewer::Claimant => "SUBMITTED",
        Viewer::Gp => "Pending Review",
        Viewer::Qa => "Pending Review",
        Viewer::Admin => "Pending",
    }
}

fn lifecycle_label(status: CaseStatus, viewer: Viewer) -> &'static str {
    match viewer {
        Viewer::Claimant => match status {
            CaseStatus::Pending => "SUBMITTED",
            CaseStatus::Assigned => "ASSIGNED",
            CaseStatus::Completed => "APPROVED",
            CaseStatus::Returned => "DENIED",
        },
        Viewer::Gp => match status {
            CaseStatus::Pending => "Pending Review",
            CaseStatus::Assigned => "Assigned",
            CaseStatus::Completed => "Approved",
            CaseStatus::Returned => "Returned",
        },
        Viewer::Qa => match status {
            CaseStatus::Pending => "Pending Review",
            CaseStatus::Assigned => "Assigned",
            CaseStatus::Completed => "Approved",
            CaseStatus::Returned => "Needs Revision",
        },
        Viewer::Admin => match status {
            CaseStatus::Pending => "Pending",
            CaseStatus::Assigned => "Assigned",
            CaseStatus::Completed => "Closed",
            CaseStatus::Returned => "Returned",
        },
    }
}

fn title_case(lower: &str) -> String {
    lower
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| {
            let mut chars = fragment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
