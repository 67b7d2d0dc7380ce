use shared::{
    domain::CaseId,
    protocol::{DocumentRecord, QaFeedbackRequest},
};
use tracing::{info, warn};

use super::{require_non_empty, WorkflowError};
use crate::{
    documents::DocumentClient,
    repository::{CaseRepository, CaseView},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QaDecision {
    Good,
    Rework,
}

/// QA flow: `list -> expanded(case) -> commenting -> list`. Expanding a
/// case fetches its documents; the comment panel opens only on an
/// explicit toggle.
pub struct QaWorkflow {
    repository: CaseRepository,
    documents: DocumentClient,
    expanded: Option<CaseId>,
    expanded_documents: Vec<DocumentRecord>,
    commenting: bool,
    decision: Option<QaDecision>,
    comment: String,
}

impl QaWorkflow {
    pub fn new(repository: CaseRepository, documents: DocumentClient) -> Self {
        Self {
            repository,
            documents,
            expanded: None,
            expanded_documents: Vec::new(),
            commenting: false,
            decision: None,
            comment: String::new(),
        }
    }

    pub fn repository(&self) -> &CaseRepository {
        &self.repository
    }

    pub fn expanded_case(&self) -> Option<&CaseView> {
        self.expanded.and_then(|id| self.repository.find(id))
    }

    pub fn expanded_documents(&self) -> &[DocumentRecord] {
        &self.expanded_documents
    }

    pub fn is_commenting(&self) -> bool {
        self.commenting
    }

    /// Loads the GP roster (for the "GP: name" line on each pool entry),
    /// then the pool.
    pub async fn refresh(&mut self) -> Result<(), WorkflowError> {
        if let Err(err) = self.repository.load_gp_roster().await {
            // The pool is still auditable without resolved GP names.
            warn!(error = %err, "qa: failed to load GP roster");
        }
        self.repository.load_pool().await?;
        Ok(())
    }

    /// Expands a case (fetching its documents) or collapses it when it is
    /// already the expanded one. Collapsing resets the comment panel.
    pub async fn toggle_case(&mut self, case_id: CaseId) -> Result<(), WorkflowError> {
        if self.expanded == Some(case_id) {
            self.collapse();
            return Ok(());
        }
        if self.repository.find(case_id).is_none() {
            return Err(WorkflowError::Validation(format!(
                "Case #{} is not in the QA pool",
                case_id.0
            )));
        }
        self.collapse();
        self.expanded = Some(case_id);
        match self.documents.list(case_id).await {
            Ok(documents) => self.expanded_documents = documents,
            Err(err) => {
                warn!(case_id = case_id.0, error = %err, "qa: failed to load documents");
                self.expanded_documents = Vec::new();
            }
        }
        Ok(())
    }

    /// Explicit toggle into (or out of) the commenting sub-state.
    pub fn toggle_commenting(&mut self) -> Result<(), WorkflowError> {
        if self.expanded.is_none() {
            return Err(WorkflowError::Validation("No case selected".to_string()));
        }
        self.commenting = !self.commenting;
        Ok(())
    }

    pub fn set_decision(&mut self, decision: QaDecision) {
        self.decision = Some(decision);
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    /// Submits the audit. Guard: a decision in {good, rework} plus a
    /// non-empty comment. Posts feedback, reloads the pool, and collapses
    /// back to the list.
    pub async fn submit(&mut self) -> Result<(), WorkflowError> {
        let Some(case_id) = self.expanded else {
            return Err(WorkflowError::Validation("No case selected".to_string()));
        };
        let Some(decision) = self.decision else {
            return Err(WorkflowError::Validation(
                "QA comments and decision are required".to_string(),
            ));
        };
        require_non_empty(&self.comment, "QA comments and decision are required")?;

        let request = QaFeedbackRequest {
            feedback: self.comment.trim().to_string(),
            approved: decision == QaDecision::Good,
        };
        self.repository
            .gateway()
            .qa_feedback(case_id, &request)
            .await?;
        info!(case_id = case_id.0, approved = request.approved, "qa: feedback submitted");

        self.repository.load_pool().await?;
        self.collapse();
        Ok(())
    }

    /// Pulls a random case from the shared pool onto this QA actor, then
    /// reloads the pool.
    pub async fn pick_random_case(&mut self) -> Result<CaseId, WorkflowError> {
        let picked = self.repository.gateway().qa_assign_random().await?;
        info!(case_id = picked.id.0, "qa: pulled case from pool");
        self.repository.load_pool().await?;
        Ok(picked.id)
    }

    fn collapse(&mut self) {
        self.expanded = None;
        self.expanded_documents.clear();
        self.commenting = false;
        self.decision = None;
        self.comment.clear();
    }
}
