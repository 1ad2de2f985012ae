// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Timestamp;
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct VeilError {
    pub err_type: VeilErrorType,
    pub message: String,
    pub raised_at: Timestamp,
    /// Position among the errors raised by the same publisher. Keeps repeated rejections apart
    /// on the bus when message and timestamp coincide.
    pub seq: u64,
}

impl Display for VeilError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.err_type, self.message)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VeilErrorType {
    Submission,
    Reveal,
    Callback,
    Capability,
}

impl VeilError {
    pub fn new(err_type: VeilErrorType, message: &str, raised_at: Timestamp) -> Self {
        Self {
            err_type,
            message: message.to_string(),
            raised_at,
            seq: 0,
        }
    }

    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }
}
