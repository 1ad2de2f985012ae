// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CampaignId, Timestamp};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use veil_optimizer::Objective;

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub struct CampaignRevealed {
    pub campaign_id: CampaignId,
    pub budget: u64,
    pub objective: Objective,
    pub revealed_at: Timestamp,
}

impl Display for CampaignRevealed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "campaign_id: {}, budget: {}, objective: {}",
            self.campaign_id, self.budget, self.objective
        )
    }
}
