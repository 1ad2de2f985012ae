// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::CampaignPlaintext;
use serde::{Deserialize, Serialize};
use veil_events::{CampaignId, Timestamp};
use veil_fhe::Ciphertext;

/// Reveal state of a campaign. Plaintext can only exist inside the `Revealed` variant so a
/// half-revealed campaign is unrepresentable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignState {
    Sealed,
    Revealed {
        plaintext: CampaignPlaintext,
        revealed_at: Timestamp,
    },
}

impl CampaignState {
    pub fn get_name(&self) -> &'static str {
        match self {
            CampaignState::Sealed => "Sealed",
            CampaignState::Revealed { .. } => "Revealed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    id: CampaignId,
    encrypted_budget: Ciphertext,
    encrypted_objective: Ciphertext,
    encrypted_constraints: Ciphertext,
    submitted_at: Timestamp,
    state: CampaignState,
}

impl Campaign {
    pub(crate) fn new(
        id: CampaignId,
        encrypted_budget: Ciphertext,
        encrypted_objective: Ciphertext,
        encrypted_constraints: Ciphertext,
        submitted_at: Timestamp,
    ) -> Self {
        Self {
            id,
            encrypted_budget,
            encrypted_objective,
            encrypted_constraints,
            submitted_at,
            state: CampaignState::Sealed,
        }
    }

    pub fn id(&self) -> CampaignId {
        self.id
    }

    pub fn submitted_at(&self) -> Timestamp {
        self.submitted_at
    }

    pub fn state(&self) -> &CampaignState {
        &self.state
    }

    pub fn is_revealed(&self) -> bool {
        matches!(self.state, CampaignState::Revealed { .. })
    }

    pub fn plaintext(&self) -> Option<&CampaignPlaintext> {
        match &self.state {
            CampaignState::Revealed { plaintext, .. } => Some(plaintext),
            CampaignState::Sealed => None,
        }
    }

    /// Ciphertexts in the order the oracle decrypts them
    pub fn ciphertexts(&self) -> Vec<Ciphertext> {
        vec![
            self.encrypted_budget.clone(),
            self.encrypted_objective.clone(),
            self.encrypted_constraints.clone(),
        ]
    }

    pub fn view(&self) -> CampaignView {
        CampaignView {
            id: self.id,
            submitted_at: self.submitted_at,
            revealed: self.is_revealed(),
            plaintext: self.plaintext().cloned(),
        }
    }

    pub(crate) fn set_revealed(&mut self, plaintext: CampaignPlaintext, revealed_at: Timestamp) {
        self.state = CampaignState::Revealed {
            plaintext,
            revealed_at,
        };
    }
}

/// Read-side projection of a campaign for the submission boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignView {
    pub id: CampaignId,
    pub submitted_at: Timestamp,
    pub revealed: bool,
    pub plaintext: Option<CampaignPlaintext>,
}
