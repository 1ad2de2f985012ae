// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use veil_fhe::{Ciphertext, CiphertextCapability, FheError};
use veil_optimizer::{Constraints, Objective};

/// Number of ciphertexts a campaign is submitted as: budget, objective, constraints.
pub const CAMPAIGN_FIELDS: usize = 3;

/// The revealed content of a campaign.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CampaignPlaintext {
    pub budget: u64,
    pub objective: Objective,
    #[serde(default)]
    pub constraints: Constraints,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaintextError {
    #[error("expected {expected} decrypted values but got {found}")]
    WrongArity { expected: usize, found: usize },
    #[error("budget must be a little-endian u64, got {0} bytes")]
    Budget(usize),
    #[error("unknown objective: {0}")]
    Objective(String),
    #[error("constraints could not be decoded: {0}")]
    Constraints(String),
    #[error(transparent)]
    Encryption(#[from] FheError),
}

impl CampaignPlaintext {
    pub fn new(budget: u64, objective: Objective, constraints: Constraints) -> Self {
        Self {
            budget,
            objective,
            constraints,
        }
    }

    /// Field encodings a client encrypts before submitting, in ciphertext order.
    pub fn encode_fields(&self) -> Result<[Vec<u8>; CAMPAIGN_FIELDS], PlaintextError> {
        let constraints = bincode::serialize(&self.constraints)
            .map_err(|e| PlaintextError::Constraints(e.to_string()))?;
        Ok([
            self.budget.to_le_bytes().to_vec(),
            self.objective.to_string().into_bytes(),
            constraints,
        ])
    }

    /// Encrypt every field the way a client does before submitting.
    pub fn encrypt<C: CiphertextCapability + ?Sized>(
        &self,
        fhe: &C,
    ) -> Result<[Ciphertext; CAMPAIGN_FIELDS], PlaintextError> {
        let [budget, objective, constraints] = self.encode_fields()?;
        Ok([
            fhe.encrypt(&budget)?,
            fhe.encrypt(&objective)?,
            fhe.encrypt(&constraints)?,
        ])
    }

    /// Decode the oracle's decrypted values for the three campaign ciphertexts.
    pub fn decode_fields(values: &[Vec<u8>]) -> Result<Self, PlaintextError> {
        let [budget, objective, constraints] = values else {
            return Err(PlaintextError::WrongArity {
                expected: CAMPAIGN_FIELDS,
                found: values.len(),
            });
        };

        let budget: [u8; 8] = budget
            .as_slice()
            .try_into()
            .map_err(|_| PlaintextError::Budget(budget.len()))?;
        // a zero budget decodes; the optimizer rejects it
        let budget = u64::from_le_bytes(budget);

        let objective = std::str::from_utf8(objective)
            .ok()
            .and_then(|s| Objective::from_str(s).ok())
            .ok_or_else(|| PlaintextError::Objective(String::from_utf8_lossy(objective).into()))?;

        let constraints: Constraints = bincode::deserialize(constraints)
            .map_err(|e| PlaintextError::Constraints(e.to_string()))?;

        Ok(Self {
            budget,
            objective,
            constraints,
        })
    }
}
