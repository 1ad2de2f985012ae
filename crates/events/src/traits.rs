// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Message;
use std::fmt::Display;
use std::hash::Hash;

/// Trait that must be implemented by events used with EventBus
pub trait Event: Message<Result = ()> + Clone + Display + Send + Sync + Unpin + 'static {
    type Id: Hash + Eq + Clone + Unpin;

    fn event_type(&self) -> String;
    fn event_id(&self) -> Self::Id;
}

/// Trait for events that contain an error
pub trait ErrorEvent: Event {
    type Error: Clone + Send + 'static;
    type ErrorType;

    fn as_error(&self) -> Option<&Self::Error>;
    fn from_error(err_type: Self::ErrorType, message: impl Into<String>, ts: crate::Timestamp)
        -> Self;
}
