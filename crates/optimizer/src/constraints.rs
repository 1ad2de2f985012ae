// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Channel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inclusive percentage bounds for a single channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelBounds {
    #[serde(default)]
    pub min: Option<u8>,
    #[serde(default)]
    pub max: Option<u8>,
}

impl ChannelBounds {
    pub fn min(&self) -> u8 {
        self.min.unwrap_or(0)
    }

    pub fn max(&self) -> u8 {
        self.max.unwrap_or(100)
    }
}

/// Per-channel rules a campaign owner attaches to the budget. Channels without an entry are
/// unconstrained.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub bounds: BTreeMap<Channel, ChannelBounds>,
}

impl Constraints {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn with_min(mut self, channel: Channel, min: u8) -> Self {
        self.bounds.entry(channel).or_default().min = Some(min);
        self
    }

    pub fn with_max(mut self, channel: Channel, max: u8) -> Self {
        self.bounds.entry(channel).or_default().max = Some(max);
        self
    }

    pub fn bounds_for(&self, channel: Channel) -> ChannelBounds {
        self.bounds.get(&channel).copied().unwrap_or_default()
    }
}
