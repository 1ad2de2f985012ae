// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Category, DecryptionHandle, Timestamp};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct CategoryRevealed {
    pub category: Category,
    /// The request the count was decrypted for
    pub handle: DecryptionHandle,
    pub count: u64,
    pub revealed_at: Timestamp,
}

impl Display for CategoryRevealed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "category: {}, count: {}", self.category, self.count)
    }
}
