use shared::{
    domain::CaseId,
    protocol::{DocumentRecord, GpDecision, GpDecisionRequest, MessageRecord},
};
use tracing::{info, warn};

use super::{require_non_empty, WorkflowError};
use crate::{
    discussion::DiscussionClient,
    documents::DocumentClient,
    repository::{CaseRepository, CaseView},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpView {
    List,
    Detail,
}

/// GP flow: `list -> detail`, with two independent panels inside the
/// detail view: clarification (stays in detail) and final decision
/// (returns to list).
pub struct GpWorkflow {
    repository: CaseRepository,
    documents: DocumentClient,
    discussion: DiscussionClient,
    view: GpView,
    selected: Option<CaseId>,
    selected_documents: Vec<DocumentRecord>,
    thread: Vec<MessageRecord>,
    decision: Option<GpDecision>,
    decision_comment: String,
}

impl GpWorkflow {
    pub fn new(
        repository: CaseRepository,
        documents: DocumentClient,
        discussion: DiscussionClient,
    ) -> Self {
        Self {
            repository,
            documents,
            discussion,
            view: GpView::List,
            selected: None,
            selected_documents: Vec::new(),
            thread: Vec::new(),
            decision: None,
            decision_comment: String::new(),
        }
    }

    pub fn view(&self) -> GpView {
        self.view
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

    pub fn thread(&self) -> &[MessageRecord] {
        &self.thread
    }

    pub async fn refresh(&mut self) -> Result<(), WorkflowError> {
        self.repository.load_assigned().await?;
        Ok(())
    }

    /// `list -> detail`. Fetches documents and the clarification thread;
    /// either fetch failing degrades to an empty panel rather than
    /// blocking the view.
    pub async fn open_case(&mut self, case_id: CaseId) -> Result<(), WorkflowError> {
        if self.repository.find(case_id).is_none() {
            return Err(WorkflowError::Validation(format!(
                "Case #{} is not assigned to you",
                case_id.0
            )));
        }
        self.selected = Some(case_id);
        self.view = GpView::Detail;
        self.decision = None;
        self.decision_comment.clear();

        match self.documents.list(case_id).await {
            Ok(documents) => self.selected_documents = documents,
            Err(err) => {
                warn!(case_id = case_id.0, error = %err, "gp: failed to load documents");
                self.selected_documents = Vec::new();
            }
        }
        match self.discussion.thread(case_id).await {
            Ok(thread) => self.thread = thread,
            Err(err) => {
                warn!(case_id = case_id.0, error = %err, "gp: failed to load messages");
                self.thread = Vec::new();
            }
        }
        Ok(())
    }

    /// Clarification panel: posts a message and re-fetches the thread.
    /// Guard: non-empty message. Stays in the detail view.
    pub async fn send_clarification(&mut self, message: &str) -> Result<(), WorkflowError> {
        let case_id = self.expect_detail()?;
        require_non_empty(message, "Please enter a clarification comment")?;
        self.thread = self.discussion.post_and_refresh(case_id, message).await?;
        info!(case_id = case_id.0, "gp: clarification sent");
        Ok(())
    }

    pub fn set_decision(&mut self, decision: GpDecision) {
        self.decision = Some(decision);
    }

    pub fn set_decision_comment(&mut self, comment: impl Into<String>) {
        self.decision_comment = comment.into();
    }

    /// Final decision: guard is a chosen decision plus a non-empty
    /// comment. Posts the decision, reloads the assigned list, and
    /// returns to `list`.
    pub async fn submit_decision(&mut self) -> Result<(), WorkflowError> {
        let case_id = self.expect_detail()?;
        let Some(decision) = self.decision else {
            return Err(WorkflowError::Validation(
                "Decision and comments are required".to_string(),
            ));
        };
        require_non_empty(&self.decision_comment, "Decision and comments are required")?;

        let request = GpDecisionRequest {
            decision,
            comment: self.decision_comment.trim().to_string(),
        };
        self.repository
            .gateway()
            .gp_decision(case_id, &request)
            .await?;
        info!(case_id = case_id.0, decision = ?decision, "gp: decision submitted");

        self.repository.load_assigned().await?;
        self.back_to_list();
        Ok(())
    }

    /// Explicit close of the detail view; discards the decision draft.
    pub fn back_to_list(&mut self) {
        self.view = GpView::List;
        self.selected = None;
        self.selected_documents.clear();
        self.thread.clear();
        self.decision = None;
        self.decision_comment.clear();
    }

    fn expect_detail(&self) -> Result<CaseId, WorkflowError> {
        match (self.view, self.selected) {
            (GpView::Detail, Some(case_id)) => Ok(case_id),
            _ => Err(WorkflowError::Validation(
                "No case is open for review".to_string(),
            )),
        }
    }
}
