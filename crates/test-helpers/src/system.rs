// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix::prelude::*;
use anyhow::{anyhow, Result};
use std::{sync::Arc, time::Duration};
use veil_coordinator::{
    Coordinator, CoordinatorActor, CoordinatorError, DecryptionCallback, GetStore, RequestReveal,
    RevealOutcome, Store, SubmitCampaign,
};
use veil_events::{
    CampaignId, Category, Clock, DecryptionHandle, Event, EventBus, EventBusConfig, GetErrors,
    GetEvents, HistoryCollector, ManualClock, RevealTarget, VeilError, VeilEvent,
};
use veil_fhe::SimulatedFhe;
use veil_ledger::CampaignPlaintext;
use veil_logger::SimpleLogger;
use veil_optimizer::{ObjectiveWeights, WeightedOptimizer};

pub type SimulatedCoordinator = CoordinatorActor<SimulatedFhe, WeightedOptimizer>;

/// Builds a coordinator wired to a bus with history and error collectors, using the simulated
/// backend as both capability and oracle.
/// ```ignore
/// let system = VeilSystemBuilder::new(42).with_logging().build()?;
/// let (id, outcome) = system.reveal_campaign(&plaintext).await?;
/// ```
pub struct VeilSystemBuilder {
    seed: u64,
    weights: ObjectiveWeights,
    bus_config: EventBusConfig,
    clock: Option<Arc<dyn Clock>>,
    logging: bool,
}

impl VeilSystemBuilder {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            weights: ObjectiveWeights::default(),
            bus_config: EventBusConfig::default(),
            clock: None,
            logging: false,
        }
    }

    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_bus_config(mut self, config: EventBusConfig) -> Self {
        self.bus_config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_logging(mut self) -> Self {
        self.logging = true;
        self
    }

    /// Must be called from within a running actix system.
    pub fn build(self) -> Result<VeilSystem> {
        let fhe = Arc::new(SimulatedFhe::from_seed(self.seed)?);
        let clock = self.clock.unwrap_or_else(|| {
            Arc::new(ManualClock::starting_at(1_700_000_000_000)) as Arc<dyn Clock>
        });
        let bus = EventBus::<VeilEvent>::new(self.bus_config).start();
        let history = EventBus::history(&bus);
        let errors = EventBus::<VeilEvent>::error(&bus);
        if self.logging {
            SimpleLogger::<VeilEvent>::attach("test", bus.clone());
        }
        let coordinator = Coordinator::new(
            fhe.clone(),
            Arc::new(WeightedOptimizer::new(self.weights)),
            clock,
        );
        let addr = CoordinatorActor::attach(coordinator, &bus);

        Ok(VeilSystem {
            fhe,
            bus,
            history,
            errors,
            addr,
        })
    }
}

pub struct VeilSystem {
    pub fhe: Arc<SimulatedFhe>,
    pub bus: Addr<EventBus<VeilEvent>>,
    pub history: Addr<HistoryCollector<VeilEvent>>,
    pub errors: Addr<HistoryCollector<VeilEvent>>,
    pub addr: Addr<SimulatedCoordinator>,
}

impl VeilSystem {
    pub async fn submit(&self, plaintext: &CampaignPlaintext) -> Result<CampaignId> {
        let [encrypted_budget, encrypted_objective, encrypted_constraints] =
            plaintext.encrypt(&*self.fhe)?;
        Ok(self
            .addr
            .send(SubmitCampaign {
                encrypted_budget,
                encrypted_objective,
                encrypted_constraints,
            })
            .await??)
    }

    pub async fn request_reveal(
        &self,
        target: impl Into<RevealTarget>,
    ) -> Result<Result<DecryptionHandle, CoordinatorError>> {
        Ok(self
            .addr
            .send(RequestReveal {
                target: target.into(),
            })
            .await?)
    }

    /// Have the oracle answer `handle` honestly and deliver the answer.
    pub async fn answer(
        &self,
        handle: DecryptionHandle,
    ) -> Result<Result<RevealOutcome, CoordinatorError>> {
        let response = self.fhe.respond(&handle)?;
        Ok(self.addr.send(DecryptionCallback::from(response)).await?)
    }

    pub async fn reveal_campaign(
        &self,
        plaintext: &CampaignPlaintext,
    ) -> Result<(CampaignId, RevealOutcome)> {
        let id = self.submit(plaintext).await?;
        let handle = self.request_reveal(id).await??;
        Ok((id, self.answer(handle).await??))
    }

    /// Reveal a category counter and return the decrypted count.
    pub async fn category_count(&self, category: impl Into<Category>) -> Result<u64> {
        let handle = self
            .request_reveal(RevealTarget::Category(category.into()))
            .await??;
        match self.answer(handle).await?? {
            RevealOutcome::Category { count, .. } => Ok(count),
            other => Err(anyhow!("expected a category reveal but got {:?}", other)),
        }
    }

    pub async fn store(&self) -> Result<Store> {
        Ok(self.addr.send(GetStore).await?)
    }

    /// Events published so far. Waits briefly so in-flight bus deliveries land first.
    pub async fn events(&self) -> Result<Vec<VeilEvent>> {
        actix::clock::sleep(Duration::from_millis(10)).await;
        Ok(self.history.send(GetEvents::new()).await?)
    }

    pub async fn event_types(&self) -> Result<Vec<String>> {
        Ok(self.events().await?.iter().map(|e| e.event_type()).collect())
    }

    pub async fn errors(&self) -> Result<Vec<VeilError>> {
        actix::clock::sleep(Duration::from_millis(10)).await;
        Ok(self.errors.send(GetErrors::new()).await?)
    }
}
