// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::{Actor, Addr, Context, Handler};
use std::marker::PhantomData;
use tracing::{error, info};
use veil_events::{prelude::Event, EventBus, Subscribe, VeilEvent};

pub trait EventLogging: Event {
    fn log(&self, logger_name: &str);
}

pub struct SimpleLogger<E: EventLogging> {
    name: String,
    _p: PhantomData<E>,
}

impl<E: EventLogging> SimpleLogger<E> {
    pub fn attach(name: &str, bus: Addr<EventBus<E>>) -> Addr<Self> {
        let addr = Self {
            name: name.to_owned(),
            _p: PhantomData,
        }
        .start();
        bus.do_send(Subscribe::<E>::new("*", addr.clone().recipient()));
        info!(node=%name, "READY!");
        addr
    }
}

impl<E: EventLogging> Actor for SimpleLogger<E> {
    type Context = Context<Self>;
}

impl<E: EventLogging> Handler<E> for SimpleLogger<E> {
    type Result = ();

    fn handle(&mut self, msg: E, _: &mut Self::Context) -> Self::Result {
        msg.log(&self.name);
    }
}

impl EventLogging for VeilEvent {
    fn log(&self, logger_name: &str) {
        match self {
            VeilEvent::VeilError { .. } => error!(me = logger_name, event = %self, "ERROR!"),
            _ => match self.get_target() {
                Some(target) => {
                    info!(me = logger_name, evt = %self, target = %target, "Event Broadcasted")
                }
                None => info!(me = logger_name, evt = %self, "Event Broadcasted"),
            },
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;
    use veil_events::{prelude::ErrorEvent, CampaignId, CampaignSubmitted, Timestamp, VeilErrorType};

    #[test]
    #[traced_test]
    fn events_are_logged_with_their_target() {
        VeilEvent::from(CampaignSubmitted {
            campaign_id: CampaignId::new(3),
            submitted_at: Timestamp(1),
        })
        .log("test");

        assert!(logs_contain("Event Broadcasted"));
        assert!(logs_contain("campaign#3"));
    }

    #[test]
    #[traced_test]
    fn errors_are_logged_as_errors() {
        VeilEvent::from_error(VeilErrorType::Callback, "proof did not verify", Timestamp(2))
            .log("test");

        assert!(logs_contain("ERROR!"));
        assert!(logs_contain("proof did not verify"));
    }
}
