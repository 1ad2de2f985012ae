// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::Addr;
use veil_events::{EventBus, VeilEvent};

/// Where the coordinator reports what happened.
pub trait EventSink {
    fn emit(&mut self, event: VeilEvent);
}

impl EventSink for Vec<VeilEvent> {
    fn emit(&mut self, event: VeilEvent) {
        self.push(event);
    }
}

impl EventSink for Addr<EventBus<VeilEvent>> {
    fn emit(&mut self, event: VeilEvent) {
        self.do_send(event);
    }
}
