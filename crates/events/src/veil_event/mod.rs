// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod allocation_computed;
mod campaign_revealed;
mod campaign_submitted;
mod category_revealed;
mod decryption_completed;
mod decryption_requested;
mod veil_error;

pub use allocation_computed::*;
pub use campaign_revealed::*;
pub use campaign_submitted::*;
pub use category_revealed::*;
pub use decryption_completed::*;
pub use decryption_requested::*;
pub use veil_error::*;

use crate::{ErrorEvent, Event, EventId, RevealTarget, Timestamp};
use actix::Message;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to help define From traits for VeilEvent
macro_rules! impl_from_event {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for VeilEvent {
                fn from(data: $variant) -> Self {
                    VeilEvent::$variant {
                        id: EventId::of(stringify!($variant), &data),
                        data,
                    }
                }
            }
        )*
    };
}

#[derive(Message, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[rtype(result = "()")]
pub enum VeilEvent {
    CampaignSubmitted {
        id: EventId,
        data: CampaignSubmitted,
    },
    DecryptionRequested {
        id: EventId,
        data: DecryptionRequested,
    },
    DecryptionCompleted {
        id: EventId,
        data: DecryptionCompleted,
    },
    CampaignRevealed {
        id: EventId,
        data: CampaignRevealed,
    },
    CategoryRevealed {
        id: EventId,
        data: CategoryRevealed,
    },
    AllocationComputed {
        id: EventId,
        data: AllocationComputed,
    },
    VeilError {
        id: EventId,
        data: VeilError,
    },
}

impl VeilEvent {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    pub fn get_id(&self) -> EventId {
        match self {
            VeilEvent::CampaignSubmitted { id, .. } => id.clone(),
            VeilEvent::DecryptionRequested { id, .. } => id.clone(),
            VeilEvent::DecryptionCompleted { id, .. } => id.clone(),
            VeilEvent::CampaignRevealed { id, .. } => id.clone(),
            VeilEvent::CategoryRevealed { id, .. } => id.clone(),
            VeilEvent::AllocationComputed { id, .. } => id.clone(),
            VeilEvent::VeilError { id, .. } => id.clone(),
        }
    }

    /// The record this event is about, when there is one
    pub fn get_target(&self) -> Option<RevealTarget> {
        match self {
            VeilEvent::CampaignSubmitted { data, .. } => Some(data.campaign_id.into()),
            VeilEvent::DecryptionRequested { data, .. } => Some(data.target.clone()),
            VeilEvent::DecryptionCompleted { data, .. } => Some(data.target.clone()),
            VeilEvent::CampaignRevealed { data, .. } => Some(data.campaign_id.into()),
            VeilEvent::CategoryRevealed { data, .. } => Some(data.category.clone().into()),
            VeilEvent::AllocationComputed { data, .. } => Some(data.campaign_id.into()),
            VeilEvent::VeilError { .. } => None,
        }
    }

    pub fn get_timestamp(&self) -> Timestamp {
        match self {
            VeilEvent::CampaignSubmitted { data, .. } => data.submitted_at,
            VeilEvent::DecryptionRequested { data, .. } => data.requested_at,
            VeilEvent::DecryptionCompleted { data, .. } => data.completed_at,
            VeilEvent::CampaignRevealed { data, .. } => data.revealed_at,
            VeilEvent::CategoryRevealed { data, .. } => data.revealed_at,
            VeilEvent::AllocationComputed { data, .. } => data.computed_at,
            VeilEvent::VeilError { data, .. } => data.raised_at,
        }
    }

    pub fn get_data(&self) -> String {
        match self {
            VeilEvent::CampaignSubmitted { data, .. } => format!("{}", data),
            VeilEvent::DecryptionRequested { data, .. } => format!("{}", data),
            VeilEvent::DecryptionCompleted { data, .. } => format!("{}", data),
            VeilEvent::CampaignRevealed { data, .. } => format!("{}", data),
            VeilEvent::CategoryRevealed { data, .. } => format!("{}", data),
            VeilEvent::AllocationComputed { data, .. } => format!("{}", data),
            VeilEvent::VeilError { data, .. } => format!("{}", data),
        }
    }
}

impl_from_event!(
    CampaignSubmitted,
    DecryptionRequested,
    DecryptionCompleted,
    CampaignRevealed,
    CategoryRevealed,
    AllocationComputed,
    VeilError
);

impl Event for VeilEvent {
    type Id = EventId;

    fn event_type(&self) -> String {
        let s = format!("{:?}", self);
        extract_event_name(&s).to_string()
    }

    fn event_id(&self) -> Self::Id {
        self.get_id()
    }
}

impl ErrorEvent for VeilEvent {
    type Error = VeilError;
    type ErrorType = VeilErrorType;

    fn as_error(&self) -> Option<&Self::Error> {
        match self {
            VeilEvent::VeilError { data, .. } => Some(data),
            _ => None,
        }
    }

    fn from_error(err_type: Self::ErrorType, message: impl Into<String>, ts: Timestamp) -> Self {
        VeilEvent::from(VeilError::new(err_type, &message.into(), ts))
    }
}

impl fmt::Display for VeilEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format!("{}({})", self.event_type(), self.get_data()))
    }
}

fn extract_event_name(s: &str) -> &str {
    let bytes = s.as_bytes();
    for (i, &item) in bytes.iter().enumerate() {
        if item == b' ' || item == b'(' || item == b'{' {
            return &s[..i];
        }
    }
    s
}
