//! Role-specific state machines driving the multi-step flows. The common
//! shape is `list -> detail (-> sub-steps) -> back to list`; transitions
//! fire on explicit user action only.
//!
//! Guard violations are [`WorkflowError::Validation`] and never reach the
//! network. A gateway failure leaves the machine in its current state;
//! nothing was mutated locally before the call, so there is nothing to
//! roll back.

use thiserror::Error;

use crate::{documents::UploadError, gateway::GatewayError};

mod admin;
mod claimant;
mod gp;
mod qa;

pub use admin::{AdminStep, AdminWorkflow};
pub use claimant::{CaseSubmission, ClaimantWorkflow, DetailTab, UploadFailure};
pub use gp::{GpView, GpWorkflow};
pub use qa::{QaDecision, QaWorkflow};

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A guard rejected the transition. Local and synchronous.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

pub(crate) fn require_non_empty(value: &str, message: &str) -> Result<(), WorkflowError> {
    if value.trim().is_empty() {
        return Err(WorkflowError::Validation(message.to_string()));
    }
    Ok(())
}
