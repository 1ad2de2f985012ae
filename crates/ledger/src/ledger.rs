// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Campaign, CampaignPlaintext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;
use veil_events::{CampaignId, Timestamp};
use veil_fhe::Ciphertext;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{0} was never submitted")]
    CampaignNotFound(CampaignId),
    #[error("{0} has already been revealed")]
    AlreadyRevealed(CampaignId),
}

/// Stores every submitted campaign. Ids start at 1 and are never reused; ciphertexts are kept
/// after reveal for audit.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SubmissionLedger {
    campaigns: BTreeMap<CampaignId, Campaign>,
    last_id: u64,
}

impl SubmissionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(
        &mut self,
        encrypted_budget: Ciphertext,
        encrypted_objective: Ciphertext,
        encrypted_constraints: Ciphertext,
        submitted_at: Timestamp,
    ) -> CampaignId {
        self.last_id += 1;
        let id = CampaignId::new(self.last_id);
        self.campaigns.insert(
            id,
            Campaign::new(
                id,
                encrypted_budget,
                encrypted_objective,
                encrypted_constraints,
                submitted_at,
            ),
        );
        info!(campaign_id = %id, "campaign stored");
        id
    }

    pub fn get(&self, id: CampaignId) -> Option<&Campaign> {
        self.campaigns.get(&id)
    }

    pub fn try_get(&self, id: CampaignId) -> Result<&Campaign, LedgerError> {
        self.get(id).ok_or(LedgerError::CampaignNotFound(id))
    }

    /// The single sealed -> revealed transition.
    pub fn reveal(
        &mut self,
        id: CampaignId,
        plaintext: CampaignPlaintext,
        revealed_at: Timestamp,
    ) -> Result<(), LedgerError> {
        let campaign = self
            .campaigns
            .get_mut(&id)
            .ok_or(LedgerError::CampaignNotFound(id))?;
        if campaign.is_revealed() {
            return Err(LedgerError::AlreadyRevealed(id));
        }
        campaign.set_revealed(plaintext, revealed_at);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.campaigns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Campaign> {
        self.campaigns.values()
    }
}
