// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use strum::Display;
use veil_events::{DecryptionHandle, RevealNamespace, RevealTarget, Timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum RequestStatus {
    Pending,
    Consumed,
    Abandoned,
}

/// A decryption request that has been handed to the oracle and the target it will reveal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionRequest {
    pub handle: DecryptionHandle,
    pub namespace: RevealNamespace,
    pub target: RevealTarget,
    pub status: RequestStatus,
    pub requested_at: Timestamp,
}

impl DecryptionRequest {
    pub fn new(handle: DecryptionHandle, target: RevealTarget, requested_at: Timestamp) -> Self {
        Self {
            handle,
            namespace: target.namespace(),
            target,
            status: RequestStatus::Pending,
            requested_at,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}
