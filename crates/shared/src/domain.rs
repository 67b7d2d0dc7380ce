use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(UserId);
id_newtype!(CaseId);
id_newtype!(DocumentId);
id_newtype!(MessageId);

/// The four actor roles. The role claim is the sole authorization input
/// on the client side; the backend re-validates every privileged call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Claimant,
    Gp,
    Qa,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Claimant => "claimant",
            Role::Gp => "gp",
            Role::Qa => "qa",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    // The backend is inconsistent about casing ("gp", "GP", "Admin"), so
    // parsing is case-insensitive.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "claimant" => Ok(Role::Claimant),
            "gp" => Ok(Role::Gp),
            "qa" => Ok(Role::Qa),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(raw.to_string())),
        }
    }
}

/// Canonical lifecycle states a case moves through:
/// pending -> assigned -> (completed | returned).
///
/// The wire format carries the status as a free-form string; this enum is
/// the vocabulary the client reasons in. Unknown strings stay raw and are
/// handled by the display-normalization layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseStatus {
    Pending,
    Assigned,
    Completed,
    Returned,
}

impl CaseStatus {
    /// Maps a raw backend status onto the canonical lifecycle state, when
    /// the raw value is one of the known synonyms. Absent and blank
    /// statuses are treated as `Pending`: a case the backend has not yet
    /// stamped is by definition awaiting review.
    pub fn parse(raw: Option<&str>) -> Option<CaseStatus> {
        let raw = raw.map(str::trim).unwrap_or_default();
        if raw.is_empty() {
            return Some(CaseStatus::Pending);
        }
        match raw.to_ascii_lowercase().as_str() {
            "pending" | "created" => Some(CaseStatus::Pending),
            "assigned" => Some(CaseStatus::Assigned),
            "completed" => Some(CaseStatus::Completed),
            "returned" => Some(CaseStatus::Returned),
            _ => None,
        }
    }
}
