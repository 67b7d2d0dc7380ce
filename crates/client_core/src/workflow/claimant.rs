use std::collections::HashSet;

use chrono::NaiveDate;
use shared::{
    domain::{CaseId, CaseStatus, DocumentId},
    protocol::{CaseRecord, CreateCaseRequest, DocumentRecord, MessageRecord},
};
use tracing::{info, warn};

use super::{require_non_empty, WorkflowError};
use crate::{
    discussion::DiscussionClient,
    documents::{AttachmentUpload, DocumentClient},
    repository::{CaseRepository, CaseView},
};

/// Tabs of the read-only side panel in the case detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailTab {
    Discussion,
    QaComments,
    GpComments,
}

/// One attachment that did not make it during case submission. The case
/// itself exists regardless; failures are reported per file.
#[derive(Debug, Clone)]
pub struct UploadFailure {
    pub filename: String,
    pub error: String,
}

/// Outcome of a case submission: the created case plus any per-file
/// upload failures.
#[derive(Debug, Clone)]
pub struct CaseSubmission {
    pub case: CaseRecord,
    pub failed_uploads: Vec<UploadFailure>,
}

/// Claimant flow: list <-> detail toggling with an embedded discussion
/// thread and read-only QA/GP comment tabs. No multi-step approval
/// machine on this side.
pub struct ClaimantWorkflow {
    repository: CaseRepository,
    documents: DocumentClient,
    discussion: DiscussionClient,
    selected: Option<CaseId>,
    tab: DetailTab,
    case_documents: Vec<DocumentRecord>,
    thread: Vec<MessageRecord>,
    // View-state only: removals are never sent to the backend and come
    // back on the next document fetch.
    locally_removed: HashSet<DocumentId>,
}

impl ClaimantWorkflow {
    pub fn new(
        repository: CaseRepository,
        documents: DocumentClient,
        discussion: DiscussionClient,
    ) -> Self {
        Self {
            repository,
            documents,
            discussion,
            selected: None,
            tab: DetailTab::Discussion,
            case_documents: Vec::new(),
            thread: Vec::new(),
            locally_removed: HashSet::new(),
        }
    }

    pub fn repository(&self) -> &CaseRepository {
        &self.repository
    }

    pub fn selected_case(&self) -> Option<&CaseView> {
        self.selected.and_then(|id| self.repository.find(id))
    }

    pub fn active_tab(&self) -> DetailTab {
        self.tab
    }

    pub fn thread(&self) -> &[MessageRecord] {
        &self.thread
    }

    /// Documents of the open case, minus any local-only removals.
    pub fn case_documents(&self) -> Vec<&DocumentRecord> {
        self.case_documents
            .iter()
            .filter(|doc| !self.locally_removed.contains(&doc.id))
            .collect()
    }

    pub async fn refresh(&mut self) -> Result<(), WorkflowError> {
        self.repository.load_mine().await?;
        Ok(())
    }

    /// Creates a case, then uploads each attachment sequentially. An
    /// individual upload failing (validation or transport) is recorded
    /// and the batch continues; the created case is never rolled back.
    pub async fn submit_case(
        &mut self,
        description: &str,
        date_of_birth: NaiveDate,
        attachments: Vec<AttachmentUpload>,
    ) -> Result<CaseSubmission, WorkflowError> {
        require_non_empty(description, "All fields are required")?;

        let case = self
            .repository
            .gateway()
            .create_case(&CreateCaseRequest {
                description: description.trim().to_string(),
                date_of_birth,
            })
            .await?;
        info!(case_id = case.id.0, "claimant: case created");

        let mut failed_uploads = Vec::new();
        for attachment in attachments {
            let filename = attachment.filename.clone();
            if let Err(err) = self.documents.upload(case.id, attachment).await {
                warn!(case_id = case.id.0, filename = %filename, error = %err, "claimant: upload failed");
                failed_uploads.push(UploadFailure {
                    filename,
                    error: err.to_string(),
                });
            }
        }

        self.repository.load_mine().await?;
        Ok(CaseSubmission {
            case,
            failed_uploads,
        })
    }

    /// Opens the detail view: fetches the document list and a fresh copy
    /// of the discussion thread. Either fetch failing degrades to an
    /// empty panel.
    pub async fn open_case(&mut self, case_id: CaseId) -> Result<(), WorkflowError> {
        if self.repository.find(case_id).is_none() {
            return Err(WorkflowError::Validation(format!(
                "Case #{} is not one of your cases",
                case_id.0
            )));
        }
        self.selected = Some(case_id);
        self.tab = DetailTab::Discussion;
        self.locally_removed.clear();

        match self.documents.list(case_id).await {
            Ok(documents) => self.case_documents = documents,
            Err(err) => {
                warn!(case_id = case_id.0, error = %err, "claimant: failed to load documents");
                self.case_documents = Vec::new();
            }
        }
        match self.discussion.thread(case_id).await {
            Ok(thread) => self.thread = thread,
            Err(err) => {
                warn!(case_id = case_id.0, error = %err, "claimant: failed to load messages");
                self.thread = Vec::new();
            }
        }
        Ok(())
    }

    pub fn close_case(&mut self) {
        self.selected = None;
        self.tab = DetailTab::Discussion;
        self.case_documents.clear();
        self.thread.clear();
        self.locally_removed.clear();
    }

    /// QA/GP comment tabs exist only when the corresponding feedback is
    /// present on the case.
    pub fn available_tabs(&self) -> Vec<DetailTab> {
        let mut tabs = vec![DetailTab::Discussion];
        if let Some(case) = self.selected_case() {
            if case.record.qa_feedback.is_some() {
                tabs.push(DetailTab::QaComments);
            }
            if case.record.gp_decision_comment.is_some() {
                tabs.push(DetailTab::GpComments);
            }
        }
        tabs
    }

    pub fn select_tab(&mut self, tab: DetailTab) -> Result<(), WorkflowError> {
        if !self.available_tabs().contains(&tab) {
            return Err(WorkflowError::Validation(
                "That tab is not available for this case".to_string(),
            ));
        }
        self.tab = tab;
        Ok(())
    }

    /// Appends to the discussion thread, then re-fetches it so the view
    /// matches server state. Guard: non-empty message.
    pub async fn send_reply(&mut self, message: &str) -> Result<(), WorkflowError> {
        let case_id = self.expect_open()?;
        require_non_empty(message, "Please enter a reply message")?;
        self.thread = self.discussion.post_and_refresh(case_id, message).await?;
        Ok(())
    }

    /// Uploads another document to the open case and re-fetches the list.
    pub async fn upload_document(
        &mut self,
        attachment: AttachmentUpload,
    ) -> Result<DocumentRecord, WorkflowError> {
        let case_id = self.expect_open()?;
        let record = self.documents.upload(case_id, attachment).await?;
        self.case_documents = self.documents.list(case_id).await?;
        Ok(record)
    }

    pub async fn download_document(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<u8>, WorkflowError> {
        let case_id = self.expect_open()?;
        Ok(self.documents.download(case_id, document_id).await?)
    }

    /// Local-only, non-persistent removal: hides the document from this
    /// view until the next fetch. There is no backend delete endpoint for
    /// documents.
    pub fn remove_document_locally(&mut self, document_id: DocumentId) {
        self.locally_removed.insert(document_id);
    }

    /// Deletes a case. Guard: only cases still in the created/pending
    /// bucket may be deleted. Reloads the list afterwards.
    pub async fn delete_case(&mut self, case_id: CaseId) -> Result<(), WorkflowError> {
        let Some(case) = self.repository.find(case_id) else {
            return Err(WorkflowError::Validation(format!(
                "Case #{} is not one of your cases",
                case_id.0
            )));
        };
        if !case.status_is(CaseStatus::Pending) {
            return Err(WorkflowError::Validation(
                "Only pending cases can be deleted".to_string(),
            ));
        }
        self.repository.gateway().delete_case(case_id).await?;
        info!(case_id = case_id.0, "claimant: case deleted");
        if self.selected == Some(case_id) {
            self.close_case();
        }
        self.repository.load_mine().await?;
        Ok(())
    }

    fn expect_open(&self) -> Result<CaseId, WorkflowError> {
        self.selected
            .ok_or_else(|| WorkflowError::Validation("No case is open".to_string()))
    }
}
