// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DecryptionRequest, RequestStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, warn};
use veil_events::{DecryptionHandle, RevealTarget, Timestamp};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    #[error("no decryption request registered under {0}")]
    UnknownRequest(DecryptionHandle),
    #[error("decryption request {0} has already been consumed")]
    RequestAlreadyConsumed(DecryptionHandle),
    #[error("decryption request {0} was abandoned")]
    RequestAbandoned(DecryptionHandle),
    #[error("handle {0} was issued twice by the ciphertext capability")]
    DuplicateHandle(DecryptionHandle),
    #[error("a reveal of {target} is already in flight under {handle}")]
    RevealInProgress {
        target: RevealTarget,
        handle: DecryptionHandle,
    },
}

/// Maps oracle handles to the reveal they were issued for.
///
/// Entries are never removed. A consumed or abandoned entry stays around so that a replayed
/// callback can be told apart from one that was never issued. At most one pending entry exists
/// per target at any time.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CorrelationTable {
    requests: BTreeMap<DecryptionHandle, DecryptionRequest>,
    live: HashMap<RevealTarget, DecryptionHandle>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails when the handle is already known or the target already has a pending request.
    /// Both checks run before anything is stored.
    pub fn check_register(
        &self,
        handle: &DecryptionHandle,
        target: &RevealTarget,
    ) -> Result<(), CorrelationError> {
        if self.requests.contains_key(handle) {
            return Err(CorrelationError::DuplicateHandle(*handle));
        }
        self.check_target_idle(target)
    }

    pub fn check_target_idle(&self, target: &RevealTarget) -> Result<(), CorrelationError> {
        match self.live.get(target) {
            Some(handle) => Err(CorrelationError::RevealInProgress {
                target: target.clone(),
                handle: *handle,
            }),
            None => Ok(()),
        }
    }

    pub fn register(
        &mut self,
        handle: DecryptionHandle,
        target: RevealTarget,
        requested_at: Timestamp,
    ) -> Result<&DecryptionRequest, CorrelationError> {
        self.check_register(&handle, &target)?;
        debug!(%handle, %target, "registering decryption request");
        self.live.insert(target.clone(), handle);
        let request = self
            .requests
            .entry(handle)
            .or_insert(DecryptionRequest::new(handle, target, requested_at));
        Ok(request)
    }

    /// Returns the pending request for a handle without changing it.
    pub fn resolve(
        &self,
        handle: &DecryptionHandle,
    ) -> Result<&DecryptionRequest, CorrelationError> {
        let request = self
            .requests
            .get(handle)
            .ok_or(CorrelationError::UnknownRequest(*handle))?;
        match request.status {
            RequestStatus::Pending => Ok(request),
            RequestStatus::Consumed => Err(CorrelationError::RequestAlreadyConsumed(*handle)),
            RequestStatus::Abandoned => Err(CorrelationError::RequestAbandoned(*handle)),
        }
    }

    pub fn consume(
        &mut self,
        handle: &DecryptionHandle,
    ) -> Result<DecryptionRequest, CorrelationError> {
        self.transition(handle, RequestStatus::Consumed)
    }

    /// Gives up on a pending request so the target can be requested again. A callback that
    /// arrives later for this handle is rejected.
    pub fn abandon(
        &mut self,
        handle: &DecryptionHandle,
    ) -> Result<DecryptionRequest, CorrelationError> {
        let request = self.transition(handle, RequestStatus::Abandoned)?;
        warn!(%handle, target = %request.target, "decryption request abandoned");
        Ok(request)
    }

    fn transition(
        &mut self,
        handle: &DecryptionHandle,
        status: RequestStatus,
    ) -> Result<DecryptionRequest, CorrelationError> {
        self.resolve(handle)?;
        let request = self
            .requests
            .get_mut(handle)
            .ok_or(CorrelationError::UnknownRequest(*handle))?;
        request.status = status;
        let request = request.clone();
        self.live.remove(&request.target);
        Ok(request)
    }

    pub fn get(&self, handle: &DecryptionHandle) -> Option<&DecryptionRequest> {
        self.requests.get(handle)
    }

    pub fn live_handle_for(&self, target: &RevealTarget) -> Option<DecryptionHandle> {
        self.live.get(target).copied()
    }

    /// Pending requests ordered by the time they were issued.
    pub fn pending_requests(&self) -> Vec<DecryptionRequest> {
        let mut pending: Vec<_> = self
            .requests
            .values()
            .filter(|r| r.is_pending())
            .cloned()
            .collect();
        pending.sort_by_key(|r| (r.requested_at, r.handle));
        pending
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}
