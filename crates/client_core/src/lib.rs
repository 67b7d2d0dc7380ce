//! Client-side state and workflow layer for the case-management backend:
//! session/role resolution, the typed API gateway, per-role case
//! repositories, and the workflow state machines the dashboards drive.

pub mod discussion;
pub mod documents;
pub mod gateway;
pub mod repository;
pub mod session;
pub mod status;
pub mod workflow;

pub use discussion::DiscussionClient;
pub use documents::{AttachmentUpload, DocumentClient, UploadError};
pub use gateway::{ApiGateway, GatewayError};
pub use repository::CaseRepository;
pub use session::{Session, TokenDecodeError};
pub use status::Viewer;
pub use workflow::WorkflowError;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod gateway_tests;

#[cfg(test)]
#[path = "tests/repository_tests.rs"]
mod repository_tests;

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod workflow_tests;
