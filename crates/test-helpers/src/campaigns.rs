// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use strum::IntoEnumIterator;
use veil_ledger::CampaignPlaintext;
use veil_optimizer::{Channel, Constraints, Objective};

/// Deterministic batch of plausible campaigns. Roughly a third carry a channel cap.
pub fn generate_campaigns(seed: u64, count: usize) -> Vec<CampaignPlaintext> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let objectives: Vec<Objective> = Objective::iter().collect();
    let channels = Channel::all();
    (0..count)
        .map(|_| {
            let budget = rng.gen_range(1..=100u64) * 500;
            let objective = objectives[rng.gen_range(0..objectives.len())];
            let constraints = match channels.choose(&mut rng) {
                Some(channel) if rng.gen_bool(1.0 / 3.0) => {
                    Constraints::none().with_max(*channel, rng.gen_range(5..=40))
                }
                _ => Constraints::none(),
            };
            CampaignPlaintext::new(budget, objective, constraints)
        })
        .collect()
}
