// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use veil_aggregator::{AggregationEngine, CategoryAggregate};
use veil_events::{CampaignId, Category};
use veil_ledger::{CampaignView, SubmissionLedger};
use veil_optimizer::AllocationOutcome;
use veil_request::{CorrelationTable, DecryptionRequest};

/// All coordinator state. Operations on [`crate::Coordinator`] take the store explicitly so
/// that whoever owns it decides how transitions are serialized.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Store {
    pub(crate) ledger: SubmissionLedger,
    pub(crate) requests: CorrelationTable,
    pub(crate) aggregates: AggregationEngine,
    pub(crate) allocations: BTreeMap<CampaignId, AllocationOutcome>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> &SubmissionLedger {
        &self.ledger
    }

    pub fn requests(&self) -> &CorrelationTable {
        &self.requests
    }

    pub fn aggregates(&self) -> &AggregationEngine {
        &self.aggregates
    }

    pub fn campaign(&self, id: CampaignId) -> Option<CampaignView> {
        self.ledger.get(id).map(|c| c.view())
    }

    pub fn category(&self, category: &Category) -> Option<&CategoryAggregate> {
        self.aggregates.get(category)
    }

    pub fn allocation(&self, id: CampaignId) -> Option<&AllocationOutcome> {
        self.allocations.get(&id)
    }

    pub fn allocations(&self) -> &BTreeMap<CampaignId, AllocationOutcome> {
        &self.allocations
    }

    pub fn pending_requests(&self) -> Vec<DecryptionRequest> {
        self.requests.pending_requests()
    }
}
