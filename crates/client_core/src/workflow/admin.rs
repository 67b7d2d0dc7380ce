use std::collections::HashSet;

use chrono::{Duration, Utc};
use shared::{
    domain::{CaseId, UserId},
    protocol::{AssignGpRequest, DocumentRecord},
};
use tracing::{info, warn};

use super::{require_non_empty, WorkflowError};
use crate::{
    documents::DocumentClient,
    repository::{AdminFilter, CaseRepository, CaseView},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminStep {
    List,
    Review,
    Assign,
}

/// Admin flow: `list -> review -> assign -> list`.
///
/// Rejection has no backend endpoint; a rejected case is removed from the
/// local pending queue for the rest of the session.
pub struct AdminWorkflow {
    repository: CaseRepository,
    documents: DocumentClient,
    step: AdminStep,
    selected: Option<CaseId>,
    selected_documents: Vec<DocumentRecord>,
    rejected: HashSet<CaseId>,
    review_comment: String,
    specialty: String,
    gp_id: Option<UserId>,
    sla_days: Option<i64>,
}

impl AdminWorkflow {
    pub fn new(repository: CaseRepository, documents: DocumentClient) -> Self {
        Self {
            repository,
            documents,
            step: AdminStep::List,
            selected: None,
            selected_documents: Vec::new(),
            rejected: HashSet::new(),
            review_comment: String::new(),
            specialty: String::new(),
            gp_id: None,
            sla_days: None,
        }
    }

    pub fn step(&self) -> AdminStep {
        self.step
    }

    pub fn repository(&self) -> &CaseRepository {
        &self.repository
    }

    pub fn selected_case(&self) -> Option<&CaseView> {
        self.selected.and_then(|id| self.repository.find(id))
    }

    pub fn selected_documents(&self) -> &[DocumentRecord] {
        &self.selected_documents
    }

    /// Cases still awaiting review and assignment: pending, unassigned,
    /// and not rejected this session.
    pub fn pending_queue(&self) -> Vec<&CaseView> {
        self.repository
            .admin_filter(AdminFilter::Created)
            .into_iter()
            .filter(|case| !self.rejected.contains(&case.id()))
            .collect()
    }

    /// Loads the GP roster first so case views resolve GP names, then the
    /// full case list.
    pub async fn refresh(&mut self) -> Result<(), WorkflowError> {
        self.repository.load_gp_roster().await?;
        self.repository.load_all().await?;
        Ok(())
    }

    /// `list -> review`. Fetches the case's documents; a failed document
    /// fetch degrades to an empty list rather than blocking review.
    pub async fn select_case(&mut self, case_id: CaseId) -> Result<(), WorkflowError> {
        if self.repository.find(case_id).is_none() {
            return Err(WorkflowError::Validation(format!(
                "Case #{} is not in the loaded list",
                case_id.0
            )));
        }
        self.selected = Some(case_id);
        self.step = AdminStep::Review;
        self.review_comment.clear();
        self.clear_assignment_draft();
        match self.documents.list(case_id).await {
            Ok(documents) => self.selected_documents = documents,
            Err(err) => {
                warn!(case_id = case_id.0, error = %err, "admin: failed to fetch documents");
                self.selected_documents = Vec::new();
            }
        }
        Ok(())
    }

    pub fn set_review_comment(&mut self, comment: impl Into<String>) {
        self.review_comment = comment.into();
    }

    pub fn set_specialty(&mut self, specialty: impl Into<String>) {
        self.specialty = specialty.into();
    }

    pub fn set_gp(&mut self, gp_id: UserId) {
        self.gp_id = Some(gp_id);
    }

    pub fn set_sla_days(&mut self, days: i64) {
        self.sla_days = Some(days);
    }

    /// `review -> assign`. Guard: a non-empty review comment.
    pub fn approve_review(&mut self) -> Result<(), WorkflowError> {
        self.expect_step(AdminStep::Review)?;
        require_non_empty(&self.review_comment, "Please add review comments")?;
        self.step = AdminStep::Assign;
        self.review_comment.clear();
        Ok(())
    }

    /// Terminal reject from `review`: removes the case from the pending
    /// queue and returns to `list`. Guard: a non-empty rejection reason.
    /// Local only; the backend keeps the case untouched.
    pub fn reject_review(&mut self) -> Result<(), WorkflowError> {
        self.expect_step(AdminStep::Review)?;
        require_non_empty(&self.review_comment, "Please add rejection reason")?;
        if let Some(case_id) = self.selected {
            self.rejected.insert(case_id);
            info!(case_id = case_id.0, "admin: case rejected and removed from queue");
        }
        self.back_to_list();
        Ok(())
    }

    /// `assign -> list`. Guard: specialty, GP, and SLA days all set. Posts
    /// the assignment, then reloads the full list.
    pub async fn assign(&mut self) -> Result<(), WorkflowError> {
        self.expect_step(AdminStep::Assign)?;
        let case_id = self
            .selected
            .ok_or_else(|| WorkflowError::Validation("No case selected".to_string()))?;
        require_non_empty(&self.specialty, "Please fill all assignment fields")?;
        let gp_id = self
            .gp_id
            .ok_or_else(|| WorkflowError::Validation("Please fill all assignment fields".to_string()))?;
        let sla_days = self
            .sla_days
            .filter(|days| *days >= 1)
            .ok_or_else(|| WorkflowError::Validation("Please fill all assignment fields".to_string()))?;

        let request = AssignGpRequest {
            gp_id,
            specialty: self.specialty.trim().to_string(),
            sla_deadline: Utc::now() + Duration::days(sla_days),
        };
        self.repository
            .gateway()
            .assign_gp(case_id, &request)
            .await?;
        info!(case_id = case_id.0, gp_id = gp_id.0, "admin: case assigned");

        self.repository.load_all().await?;
        self.back_to_list();
        Ok(())
    }

    /// `assign -> review` without discarding the selection.
    pub fn back_to_review(&mut self) -> Result<(), WorkflowError> {
        self.expect_step(AdminStep::Assign)?;
        self.step = AdminStep::Review;
        self.clear_assignment_draft();
        Ok(())
    }

    /// Explicit "Back" from any step: returns to `list`, discarding every
    /// in-progress edit.
    pub fn back_to_list(&mut self) {
        self.step = AdminStep::List;
        self.selected = None;
        self.selected_documents.clear();
        self.review_comment.clear();
        self.clear_assignment_draft();
    }

    fn clear_assignment_draft(&mut self) {
        self.specialty.clear();
        self.gp_id = None;
        self.sla_days = None;
    }

    fn expect_step(&self, expected: AdminStep) -> Result<(), WorkflowError> {
        if self.step != expected {
            return Err(WorkflowError::Validation(format!(
                "action not available in the {:?} step",
                self.step
            )));
        }
        Ok(())
    }
}
