// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use veil_events::{Category, Timestamp};
use veil_fhe::Ciphertext;

/// A decrypted counter value that has been published through a category reveal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedCount {
    pub count: u64,
    pub revealed_at: Timestamp,
}

/// Encrypted running count of revealed campaigns for one category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAggregate {
    category: Category,
    encrypted_count: Ciphertext,
    last_revealed: Option<RevealedCount>,
}

impl CategoryAggregate {
    pub(crate) fn new(category: Category, encrypted_count: Ciphertext) -> Self {
        Self {
            category,
            encrypted_count,
            last_revealed: None,
        }
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn encrypted_count(&self) -> &Ciphertext {
        &self.encrypted_count
    }

    pub fn last_revealed(&self) -> Option<RevealedCount> {
        self.last_revealed
    }

    pub(crate) fn set_encrypted_count(&mut self, encrypted_count: Ciphertext) {
        self.encrypted_count = encrypted_count;
    }

    pub(crate) fn set_last_revealed(&mut self, revealed: RevealedCount) {
        self.last_revealed = Some(revealed);
    }
}
