// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use thiserror::Error;
use veil_aggregator::AggregationError;
use veil_events::{CampaignId, Category, DecryptionHandle, RevealTarget, VeilErrorType};
use veil_fhe::FheError;
use veil_ledger::LedgerError;
use veil_request::CorrelationError;

/// Every way a boundary call on the coordinator can fail. Each failure leaves the store exactly
/// as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("{0} was never submitted")]
    CampaignNotFound(CampaignId),
    #[error("no decryption request registered under {0}")]
    UnknownRequest(DecryptionHandle),
    #[error("category '{0}' has no counter yet")]
    UnknownCategory(Category),
    #[error("{0} has already been revealed")]
    AlreadyRevealed(CampaignId),
    #[error("decryption request {0} has already been consumed")]
    RequestAlreadyConsumed(DecryptionHandle),
    #[error("decryption request {0} was abandoned")]
    RequestAbandoned(DecryptionHandle),
    #[error("a reveal of {target} is already in flight under {handle}")]
    RevealInProgress {
        target: RevealTarget,
        handle: DecryptionHandle,
    },
    #[error("handle {0} was issued twice by the ciphertext capability")]
    DuplicateHandle(DecryptionHandle),
    #[error("proof for {0} failed verification")]
    InvalidProof(DecryptionHandle),
    #[error("cleartext for {handle} could not be decoded: {reason}")]
    MalformedCleartext {
        handle: DecryptionHandle,
        reason: String,
    },
    #[error("ciphertext capability failed: {0}")]
    Capability(#[from] FheError),
}

impl CoordinatorError {
    pub(crate) fn malformed(handle: DecryptionHandle, reason: impl ToString) -> Self {
        CoordinatorError::MalformedCleartext {
            handle,
            reason: reason.to_string(),
        }
    }

    /// Which boundary this error is reported against on the event bus.
    pub fn err_type(&self) -> VeilErrorType {
        use CoordinatorError::*;
        match self {
            CampaignNotFound(_)
            | AlreadyRevealed(_)
            | UnknownCategory(_)
            | RevealInProgress { .. } => VeilErrorType::Reveal,
            UnknownRequest(_)
            | RequestAlreadyConsumed(_)
            | RequestAbandoned(_)
            | InvalidProof(_)
            | MalformedCleartext { .. } => VeilErrorType::Callback,
            DuplicateHandle(_) | Capability(_) => VeilErrorType::Capability,
        }
    }
}

impl From<LedgerError> for CoordinatorError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::CampaignNotFound(id) => CoordinatorError::CampaignNotFound(id),
            LedgerError::AlreadyRevealed(id) => CoordinatorError::AlreadyRevealed(id),
        }
    }
}

impl From<CorrelationError> for CoordinatorError {
    fn from(value: CorrelationError) -> Self {
        match value {
            CorrelationError::UnknownRequest(h) => CoordinatorError::UnknownRequest(h),
            CorrelationError::RequestAlreadyConsumed(h) => {
                CoordinatorError::RequestAlreadyConsumed(h)
            }
            CorrelationError::RequestAbandoned(h) => CoordinatorError::RequestAbandoned(h),
            CorrelationError::DuplicateHandle(h) => CoordinatorError::DuplicateHandle(h),
            CorrelationError::RevealInProgress { target, handle } => {
                CoordinatorError::RevealInProgress { target, handle }
            }
        }
    }
}

impl From<AggregationError> for CoordinatorError {
    fn from(value: AggregationError) -> Self {
        match value {
            AggregationError::UnknownCategory(category) => {
                CoordinatorError::UnknownCategory(category)
            }
            AggregationError::Capability(err) => CoordinatorError::Capability(err),
        }
    }
}
