// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Channel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// A percentage split across every channel together with the budget amount each share buys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Allocation {
    pub shares: BTreeMap<Channel, u8>,
    pub amounts: BTreeMap<Channel, u64>,
}

impl Allocation {
    pub fn share(&self, channel: Channel) -> u8 {
        self.shares.get(&channel).copied().unwrap_or(0)
    }

    pub fn amount(&self, channel: Channel) -> u64 {
        self.amounts.get(&channel).copied().unwrap_or(0)
    }

    pub fn total_percent(&self) -> u32 {
        self.shares.values().map(|v| *v as u32).sum()
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .shares
            .iter()
            .map(|(channel, pct)| format!("{channel}={pct}%"))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

#[derive(Error, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocationError {
    #[error("budget must be positive")]
    NonPositiveBudget,
    #[error("bound {value} on {channel} is outside 0..=100")]
    BoundOutOfRange { channel: Channel, value: u8 },
    #[error("minimum {min} on {channel} is above its maximum {max}")]
    InvalidBounds { channel: Channel, min: u8, max: u8 },
    #[error("channel minimums add up to {total}%, above 100%")]
    MinimumsExceedTotal { total: u32 },
    #[error("channel maximums add up to {total}%, below 100%")]
    MaximumsBelowTotal { total: u32 },
}

/// What the optimizer produced for a revealed campaign. Infeasible constraint sets are kept as
/// a declared rejection rather than clamped into a split.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocationOutcome {
    Allocated(Allocation),
    Rejected(AllocationError),
}

impl AllocationOutcome {
    pub fn allocation(&self) -> Option<&Allocation> {
        match self {
            AllocationOutcome::Allocated(allocation) => Some(allocation),
            AllocationOutcome::Rejected(_) => None,
        }
    }
}

impl From<Result<Allocation, AllocationError>> for AllocationOutcome {
    fn from(value: Result<Allocation, AllocationError>) -> Self {
        match value {
            Ok(allocation) => AllocationOutcome::Allocated(allocation),
            Err(err) => AllocationOutcome::Rejected(err),
        }
    }
}

impl fmt::Display for AllocationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationOutcome::Allocated(allocation) => write!(f, "allocated({allocation})"),
            AllocationOutcome::Rejected(err) => write!(f, "rejected({err})"),
        }
    }
}
