use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::{
    domain::{CaseId, CaseStatus, UserId},
    protocol::{CaseRecord, GpSummary},
};
use tracing::debug;

use crate::{
    gateway::{ApiGateway, GatewayError},
    status::{display_status, Viewer},
};

/// A case as the current viewer sees it: the raw record plus the
/// viewer-specific display label and the resolved GP name.
#[derive(Debug, Clone)]
pub struct CaseView {
    pub record: CaseRecord,
    pub display_status: String,
    pub assigned_gp: Option<String>,
}

impl CaseView {
    pub fn id(&self) -> CaseId {
        self.record.id
    }

    pub fn status_is(&self, status: CaseStatus) -> bool {
        CaseStatus::parse(self.record.status.as_deref()) == Some(status)
    }

    pub fn is_allotted(&self) -> bool {
        self.record.assigned_gp_id.is_some()
    }

    /// Whole days left until the SLA deadline, clamped at zero; `None`
    /// when no deadline is attached.
    pub fn sla_days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        let deadline = self.record.sla_deadline?;
        Some((deadline - now).num_days().max(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimantTab {
    Created,
    Active,
    Closed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClaimantBuckets {
    pub created: usize,
    pub active: usize,
    pub closed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminFilter {
    All,
    Created,
    Allotted,
    Closed,
    Rework,
    ReadyToGo,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdminStats {
    pub total: usize,
    pub allotted: usize,
    pub ready_to_go: usize,
    pub rework: usize,
    pub closed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GpStats {
    pub allotted: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QaStats {
    pub total: usize,
    pub submitted: usize,
    pub rework: usize,
    pub ready_to_go: usize,
}

/// Locally cached view of the cases visible to the current actor.
///
/// Loads are explicit and full: every mutation elsewhere is followed by a
/// reload of the whole list rather than a local patch, so the cache never
/// diverges from what the last round trip returned.
pub struct CaseRepository {
    gateway: Arc<ApiGateway>,
    viewer: Viewer,
    gp_roster: Vec<GpSummary>,
    cases: Vec<CaseView>,
}

impl CaseRepository {
    pub fn new(gateway: Arc<ApiGateway>, viewer: Viewer) -> Self {
        Self {
            gateway,
            viewer,
            gp_roster: Vec::new(),
            cases: Vec::new(),
        }
    }

    pub fn viewer(&self) -> Viewer {
        self.viewer
    }

    pub fn gateway(&self) -> &Arc<ApiGateway> {
        &self.gateway
    }

    pub fn cases(&self) -> &[CaseView] {
        &self.cases
    }

    pub fn gp_roster(&self) -> &[GpSummary] {
        &self.gp_roster
    }

    pub fn find(&self, case_id: CaseId) -> Option<&CaseView> {
        self.cases.iter().find(|case| case.id() == case_id)
    }

    /// Resolves an assigned-GP id to a display name. Degrades to a
    /// `GP #<id>` placeholder while the roster has not loaded.
    pub fn gp_display_name(&self, gp_id: UserId) -> String {
        self.gp_roster
            .iter()
            .find(|gp| gp.id == gp_id)
            .map(|gp| gp.username.clone())
            .unwrap_or_else(|| format!("GP #{}", gp_id.0))
    }

    /// Loads the roster used to cross-reference assigned-GP ids. Called
    /// before the case load on dashboards that display GP names.
    pub async fn load_gp_roster(&mut self) -> Result<(), GatewayError> {
        self.gp_roster = self.gateway.admin_gps().await?;
        // Re-resolve names on already-loaded cases.
        let resolved: Vec<Option<String>> = self
            .cases
            .iter()
            .map(|case| {
                case.record
                    .assigned_gp_id
                    .map(|gp_id| self.gp_display_name(gp_id))
            })
            .collect();
        for (case, assigned_gp) in self.cases.iter_mut().zip(resolved) {
            case.assigned_gp = assigned_gp;
        }
        Ok(())
    }

    fn store(&mut self, records: Vec<CaseRecord>) {
        self.cases = records
            .into_iter()
            .map(|record| {
                let assigned_gp = record.assigned_gp_id.map(|gp_id| {
                    self.gp_roster
                        .iter()
                        .find(|gp| gp.id == gp_id)
                        .map(|gp| gp.username.clone())
                        .unwrap_or_else(|| format!("GP #{}", gp_id.0))
                });
                CaseView {
                    display_status: display_status(record.status.as_deref(), self.viewer),
                    assigned_gp,
                    record,
                }
            })
            .collect();
        debug!(count = self.cases.len(), viewer = ?self.viewer, "repository: cases loaded");
    }

    /// Claimant: GET /cases/my.
    pub async fn load_mine(&mut self) -> Result<(), GatewayError> {
        let records = self.gateway.my_cases().await?;
        self.store(records);
        Ok(())
    }

    /// GP: GET /gp/cases.
    pub async fn load_assigned(&mut self) -> Result<(), GatewayError> {
        let records = self.gateway.gp_cases().await?;
        self.store(records);
        Ok(())
    }

    /// QA: GET /qa/cases.
    pub async fn load_pool(&mut self) -> Result<(), GatewayError> {
        let records = self.gateway.qa_cases().await?;
        self.store(records);
        Ok(())
    }

    /// Admin: GET /admin/cases/all.
    pub async fn load_all(&mut self) -> Result<(), GatewayError> {
        let records = self.gateway.admin_cases().await?;
        self.store(records);
        Ok(())
    }

    /* claimant */

    pub fn claimant_tab(&self, tab: ClaimantTab) -> Vec<&CaseView> {
        self.cases
            .iter()
            .filter(|case| match tab {
                ClaimantTab::Created => case.status_is(CaseStatus::Pending),
                ClaimantTab::Active => case.status_is(CaseStatus::Assigned),
                ClaimantTab::Closed => {
                    case.status_is(CaseStatus::Completed) || case.status_is(CaseStatus::Returned)
                }
            })
            .collect()
    }

    pub fn claimant_buckets(&self) -> ClaimantBuckets {
        ClaimantBuckets {
            created: self.claimant_tab(ClaimantTab::Created).len(),
            active: self.claimant_tab(ClaimantTab::Active).len(),
            closed: self.claimant_tab(ClaimantTab::Closed).len(),
        }
    }

    /* admin */

    pub fn admin_filter(&self, filter: AdminFilter) -> Vec<&CaseView> {
        self.cases
            .iter()
            .filter(|case| match filter {
                AdminFilter::All => true,
                AdminFilter::Created => case.status_is(CaseStatus::Pending) && !case.is_allotted(),
                AdminFilter::Allotted => case.is_allotted(),
                AdminFilter::Closed => case.status_is(CaseStatus::Completed),
                AdminFilter::Rework => case.status_is(CaseStatus::Returned),
                AdminFilter::ReadyToGo => case.status_is(CaseStatus::Completed),
            })
            .collect()
    }

    pub fn admin_stats(&self) -> AdminStats {
        AdminStats {
            total: self.cases.len(),
            allotted: self.admin_filter(AdminFilter::Allotted).len(),
            ready_to_go: self.admin_filter(AdminFilter::ReadyToGo).len(),
            rework: self.admin_filter(AdminFilter::Rework).len(),
            closed: self.admin_filter(AdminFilter::Closed).len(),
        }
    }

    /* gp */

    pub fn gp_stats(&self) -> GpStats {
        let approved = self
            .cases
            .iter()
            .filter(|case| case.status_is(CaseStatus::Completed))
            .count();
        let rejected = self
            .cases
            .iter()
            .filter(|case| case.status_is(CaseStatus::Returned))
            .count();
        GpStats {
            allotted: self.cases.len(),
            pending: self.cases.len() - approved - rejected,
            approved,
            rejected,
        }
    }

    /* qa */

    pub fn qa_stats(&self) -> QaStats {
        QaStats {
            total: self.cases.len(),
            submitted: self
                .cases
                .iter()
                .filter(|case| {
                    case.record
                        .qa_feedback
                        .as_deref()
                        .is_some_and(|feedback| !feedback.trim().is_empty())
                })
                .count(),
            rework: self
                .cases
                .iter()
                .filter(|case| case.status_is(CaseStatus::Returned))
                .count(),
            ready_to_go: self
                .cases
                .iter()
                .filter(|case| case.status_is(CaseStatus::Completed))
                .count(),
        }
    }

    /// Pool cases a QA actor can still expand and audit: anything not yet
    /// moved to completed or returned.
    pub fn qa_pending_audit(&self) -> Vec<&CaseView> {
        self.cases
            .iter()
            .filter(|case| {
                !case.status_is(CaseStatus::Completed) && !case.status_is(CaseStatus::Returned)
            })
            .collect()
    }
}
