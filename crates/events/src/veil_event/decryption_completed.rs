// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{DecryptionHandle, RevealTarget, Timestamp};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Emitted once per accepted callback, after the handle has been consumed.
#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct DecryptionCompleted {
    pub handle: DecryptionHandle,
    pub target: RevealTarget,
    pub completed_at: Timestamp,
}

impl Display for DecryptionCompleted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle: {}, target: {}", self.handle, self.target)
    }
}
