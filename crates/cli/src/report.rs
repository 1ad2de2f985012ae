// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use veil_coordinator::Store;
use veil_events::{CampaignId, Category};
use veil_ledger::CampaignPlaintext;
use veil_optimizer::{AllocationOutcome, Channel, Objective};

/// Input for `veil simulate`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct CampaignBatch {
    pub campaigns: Vec<CampaignPlaintext>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CampaignReport {
    pub id: CampaignId,
    pub budget: u64,
    pub objective: Objective,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub shares: BTreeMap<Channel, u8>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub amounts: BTreeMap<Channel, u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rejected: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct SimulationReport {
    pub campaigns: Vec<CampaignReport>,
    /// Published count per category, `null` where the counter was never revealed
    pub categories: BTreeMap<Category, Option<u64>>,
    /// Campaigns that were submitted but are still sealed
    pub sealed: Vec<CampaignId>,
}

impl SimulationReport {
    pub fn from_store(store: &Store) -> Self {
        let mut report = SimulationReport::default();
        for campaign in store.ledger().iter() {
            let Some(plaintext) = campaign.plaintext() else {
                report.sealed.push(campaign.id());
                continue;
            };
            let mut entry = CampaignReport {
                id: campaign.id(),
                budget: plaintext.budget,
                objective: plaintext.objective,
                shares: BTreeMap::new(),
                amounts: BTreeMap::new(),
                rejected: None,
            };
            match store.allocation(campaign.id()) {
                Some(AllocationOutcome::Allocated(allocation)) => {
                    entry.shares = allocation.shares.clone();
                    entry.amounts = allocation.amounts.clone();
                }
                Some(AllocationOutcome::Rejected(err)) => entry.rejected = Some(err.to_string()),
                None => {}
            }
            report.campaigns.push(entry);
        }
        for aggregate in store.aggregates().categories() {
            report.categories.insert(
                aggregate.category().clone(),
                aggregate.last_revealed().map(|r| r.count),
            );
        }
        report
    }
}
