use std::sync::Arc;

use shared::{
    domain::{CaseId, DocumentId},
    protocol::DocumentRecord,
};
use thiserror::Error;
use tracing::debug;

use crate::gateway::{ApiGateway, GatewayError};

/// File types a case may carry as evidence.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "jpg", "jpeg", "png"];
pub const ALLOWED_MIME_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

/// A file staged for upload.
#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum UploadError {
    /// Raised locally, before any network call.
    #[error("{filename} is not supported. Only PDF, JPG, and PNG files are allowed.")]
    UnsupportedFileType { filename: String },
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Accepts iff the filename ends in an allowed extension OR the MIME type
/// is on the allow-list. Matching is case-insensitive on the extension.
pub fn is_allowed_upload(filename: &str, mime_type: Option<&str>) -> bool {
    if let Some(mime_type) = mime_type {
        if ALLOWED_MIME_TYPES.contains(&mime_type) {
            return true;
        }
    }
    let lower = filename.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

/// Document operations scoped to a case: list, validated upload, and
/// full-materialize download.
pub struct DocumentClient {
    gateway: Arc<ApiGateway>,
}

impl DocumentClient {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, case_id: CaseId) -> Result<Vec<DocumentRecord>, GatewayError> {
        self.gateway.list_documents(case_id).await
    }

    /// Validates against the allow-list before touching the network; a
    /// rejected file never produces a request.
    pub async fn upload(
        &self,
        case_id: CaseId,
        attachment: AttachmentUpload,
    ) -> Result<DocumentRecord, UploadError> {
        if !is_allowed_upload(&attachment.filename, attachment.mime_type.as_deref()) {
            return Err(UploadError::UnsupportedFileType {
                filename: attachment.filename,
            });
        }
        debug!(
            case_id = case_id.0,
            filename = %attachment.filename,
            size_bytes = attachment.bytes.len(),
            "documents: uploading"
        );
        let record = self
            .gateway
            .upload_document(
                case_id,
                &attachment.filename,
                attachment.mime_type.as_deref(),
                attachment.bytes,
            )
            .await?;
        Ok(record)
    }

    /// Pulls the whole binary into memory before handing it to the caller.
    pub async fn download(
        &self,
        case_id: CaseId,
        document_id: DocumentId,
    ) -> Result<Vec<u8>, GatewayError> {
        self.gateway.download_document(case_id, document_id).await
    }
}
