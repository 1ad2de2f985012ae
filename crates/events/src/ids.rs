// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum::Display;
use veil_optimizer::Objective;
use veil_utils::short_hex;

/// Identity of a submitted campaign. Assigned by the submission ledger, starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CampaignId(u64);

impl CampaignId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "campaign#{}", self.0)
    }
}

/// Plaintext grouping key for encrypted aggregates, eg. a campaign objective.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Category(String);

impl Category {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Objective> for Category {
    fn from(value: Objective) -> Self {
        Category(value.to_string())
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::new(value)
    }
}

/// Opaque correlation handle issued by the ciphertext capability when a decryption is requested.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DecryptionHandle([u8; 32]);

impl DecryptionHandle {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for DecryptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h:{}", short_hex(&self.0))
    }
}

impl fmt::Debug for DecryptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DecryptionHandle({})", short_hex(&self.0))
    }
}

/// Independent request flows. A handle always carries its namespace so that the lookup never
/// depends on a key derived from the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum RevealNamespace {
    CampaignReveal,
    CategoryReveal,
}

/// The logical entity waiting on a decryption
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevealTarget {
    Campaign(CampaignId),
    Category(Category),
}

impl RevealTarget {
    pub fn namespace(&self) -> RevealNamespace {
        match self {
            RevealTarget::Campaign(_) => RevealNamespace::CampaignReveal,
            RevealTarget::Category(_) => RevealNamespace::CategoryReveal,
        }
    }
}

impl fmt::Display for RevealTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevealTarget::Campaign(id) => write!(f, "{id}"),
            RevealTarget::Category(category) => write!(f, "category:{category}"),
        }
    }
}

impl From<CampaignId> for RevealTarget {
    fn from(value: CampaignId) -> Self {
        RevealTarget::Campaign(value)
    }
}

impl From<Category> for RevealTarget {
    fn from(value: Category) -> Self {
        RevealTarget::Category(value)
    }
}
