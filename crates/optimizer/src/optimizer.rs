// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Allocation, AllocationError, Channel, Constraints, Objective};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

const TOTAL: u32 = 100;

/// Turns a revealed (budget, objective, constraints) tuple into a channel split.
///
/// Implementations must be deterministic: the same input always yields the same split, and the
/// shares of a successful allocation are non-negative integers summing to exactly 100 that
/// honour every explicit bound.
pub trait AllocationOptimizer: Send + Sync + 'static {
    fn allocate(
        &self,
        budget: u64,
        objective: Objective,
        constraints: &Constraints,
    ) -> Result<Allocation, AllocationError>;
}

/// Relative preference of each channel for an objective.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveWeights(pub BTreeMap<Objective, BTreeMap<Channel, u32>>);

impl ObjectiveWeights {
    pub fn weight(&self, objective: Objective, channel: Channel) -> u32 {
        self.0
            .get(&objective)
            .and_then(|weights| weights.get(&channel))
            .copied()
            .unwrap_or(0)
    }

    /// Replace the weights of the given objective
    pub fn set(&mut self, objective: Objective, weights: BTreeMap<Channel, u32>) {
        self.0.insert(objective, weights);
    }
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        use Channel::*;
        let table: [(Objective, [u32; 5]); 5] = [
            //                       search social display video email
            (Objective::Branding, [10, 30, 25, 30, 5]),
            (Objective::Awareness, [15, 30, 30, 20, 5]),
            (Objective::Conversions, [45, 15, 10, 5, 25]),
            (Objective::Engagement, [10, 40, 10, 25, 15]),
            (Objective::Traffic, [40, 25, 20, 10, 5]),
        ];
        let channels = [Search, Social, Display, Video, Email];
        let mut weights = BTreeMap::new();
        for (objective, row) in table {
            weights.insert(objective, channels.iter().copied().zip(row).collect());
        }
        ObjectiveWeights(weights)
    }
}

/// Weighted water-filling over the channel minimums.
///
/// Every channel starts at its minimum. The remaining percentage points are handed out in
/// proportion to the objective's weights using largest-remainder rounding, with channels that
/// hit their maximum dropping out until all 100 points are placed.
#[derive(Clone, Debug, Default)]
pub struct WeightedOptimizer {
    weights: ObjectiveWeights,
}

impl WeightedOptimizer {
    pub fn new(weights: ObjectiveWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ObjectiveWeights {
        &self.weights
    }
}

impl AllocationOptimizer for WeightedOptimizer {
    fn allocate(
        &self,
        budget: u64,
        objective: Objective,
        constraints: &Constraints,
    ) -> Result<Allocation, AllocationError> {
        if budget == 0 {
            return Err(AllocationError::NonPositiveBudget);
        }
        let limits = validate(constraints)?;

        let mut shares: BTreeMap<Channel, u32> =
            limits.iter().map(|(c, (min, _))| (*c, *min)).collect();
        let mut remaining = TOTAL - shares.values().sum::<u32>();

        while remaining > 0 {
            let open: Vec<Channel> = limits
                .iter()
                .filter(|(c, (_, max))| shares[*c] < *max)
                .map(|(c, _)| *c)
                .collect();
            // prefer channels the objective actually wants; fall back to any open channel
            let weighted: Vec<(Channel, u32)> = open
                .iter()
                .map(|c| (*c, self.weights.weight(objective, *c)))
                .filter(|(_, w)| *w > 0)
                .collect();
            let candidates = if weighted.is_empty() {
                open.iter().map(|c| (*c, 1)).collect()
            } else {
                weighted
            };

            let mut placed = 0;
            for (channel, quota) in largest_remainder(remaining, &candidates) {
                let room = limits[&channel].1 - shares[&channel];
                let give = quota.min(room);
                if let Some(share) = shares.get_mut(&channel) {
                    *share += give;
                }
                placed += give;
            }
            remaining -= placed;
        }

        Ok(to_allocation(budget, &shares))
    }
}

fn validate(constraints: &Constraints) -> Result<BTreeMap<Channel, (u32, u32)>, AllocationError> {
    let mut limits = BTreeMap::new();
    for channel in Channel::iter() {
        let bounds = constraints.bounds_for(channel);
        for value in [bounds.min(), bounds.max()] {
            if value as u32 > TOTAL {
                return Err(AllocationError::BoundOutOfRange { channel, value });
            }
        }
        if bounds.min() > bounds.max() {
            return Err(AllocationError::InvalidBounds {
                channel,
                min: bounds.min(),
                max: bounds.max(),
            });
        }
        limits.insert(channel, (bounds.min() as u32, bounds.max() as u32));
    }

    let min_total: u32 = limits.values().map(|(min, _)| min).sum();
    if min_total > TOTAL {
        return Err(AllocationError::MinimumsExceedTotal { total: min_total });
    }
    let max_total: u32 = limits.values().map(|(_, max)| max).sum();
    if max_total < TOTAL {
        return Err(AllocationError::MaximumsBelowTotal { total: max_total });
    }
    Ok(limits)
}

/// Split `amount` across the candidates proportionally to their weights. The quotas always add
/// up to `amount`; leftover units go to the largest fractional parts, ties broken by channel
/// order.
fn largest_remainder(amount: u32, candidates: &[(Channel, u32)]) -> Vec<(Channel, u32)> {
    let total_weight: u64 = candidates.iter().map(|(_, w)| *w as u64).sum();
    if total_weight == 0 {
        return vec![];
    }
    let mut quotas: Vec<(Channel, u32, u64)> = candidates
        .iter()
        .map(|(c, w)| {
            let scaled = amount as u64 * *w as u64;
            (*c, (scaled / total_weight) as u32, scaled % total_weight)
        })
        .collect();
    let assigned: u32 = quotas.iter().map(|(_, q, _)| q).sum();
    let mut leftover = amount - assigned;

    let mut order: Vec<usize> = (0..quotas.len()).collect();
    order.sort_by(|a, b| quotas[*b].2.cmp(&quotas[*a].2).then(a.cmp(b)));
    for idx in order {
        if leftover == 0 {
            break;
        }
        quotas[idx].1 += 1;
        leftover -= 1;
    }
    quotas.into_iter().map(|(c, q, _)| (c, q)).collect()
}

fn to_allocation(budget: u64, shares: &BTreeMap<Channel, u32>) -> Allocation {
    let mut amounts: BTreeMap<Channel, u64> = shares
        .iter()
        .map(|(c, pct)| (*c, (budget as u128 * *pct as u128 / TOTAL as u128) as u64))
        .collect();

    // rounding dust goes to the largest share so the amounts add up to the budget
    let spent: u64 = amounts.values().sum();
    let largest = shares
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(c, _)| *c);
    if let Some(amount) = largest.and_then(|c| amounts.get_mut(&c)) {
        *amount += budget - spent;
    }

    Allocation {
        shares: shares.iter().map(|(c, pct)| (*c, *pct as u8)).collect(),
        amounts,
    }
}
