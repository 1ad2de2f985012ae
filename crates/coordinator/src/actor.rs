// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Coordinator, CoordinatorError, RevealOutcome, Store};
use actix::prelude::*;
use veil_aggregator::CategoryAggregate;
use veil_events::{
    CampaignId, Category, DecryptionHandle, EventBus, RevealTarget, VeilError, VeilEvent,
};
use veil_fhe::{Ciphertext, CiphertextCapability, Cleartext, DecryptionProof, DecryptionResponse};
use veil_ledger::CampaignView;
use veil_optimizer::{AllocationOptimizer, AllocationOutcome};
use veil_request::DecryptionRequest;

/// Message: store a new encrypted campaign.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<CampaignId, CoordinatorError>")]
pub struct SubmitCampaign {
    pub encrypted_budget: Ciphertext,
    pub encrypted_objective: Ciphertext,
    pub encrypted_constraints: Ciphertext,
}

/// Message: ask the oracle to decrypt a campaign or a category counter.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<DecryptionHandle, CoordinatorError>")]
pub struct RequestReveal {
    pub target: RevealTarget,
}

/// Message: the oracle's answer for a handle.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<RevealOutcome, CoordinatorError>")]
pub struct DecryptionCallback {
    pub handle: DecryptionHandle,
    pub cleartext: Cleartext,
    pub proof: DecryptionProof,
}

impl From<DecryptionResponse> for DecryptionCallback {
    fn from(value: DecryptionResponse) -> Self {
        Self {
            handle: value.handle,
            cleartext: value.cleartext,
            proof: value.proof,
        }
    }
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<DecryptionRequest, CoordinatorError>")]
pub struct AbandonRequest {
    pub handle: DecryptionHandle,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Result<CampaignView, CoordinatorError>")]
pub struct GetCampaign {
    pub campaign_id: CampaignId,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Vec<DecryptionRequest>")]
pub struct GetPendingRequests;

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<CategoryAggregate>")]
pub struct GetCategory {
    pub category: Category,
}

#[derive(Message, Clone, Debug)]
#[rtype(result = "Option<AllocationOutcome>")]
pub struct GetAllocation {
    pub campaign_id: CampaignId,
}

/// Message: a copy of the whole store.
#[derive(Message, Clone, Debug)]
#[rtype(result = "Store")]
pub struct GetStore;

/// Owns the [`Store`] and runs every transition as one message, so two callbacks racing on the
/// same handle are applied one after the other and the second sees the request consumed.
/// Events go to the bus; rejected mutations are also published as [`VeilEvent::VeilError`].
pub struct CoordinatorActor<C, O> {
    coordinator: Coordinator<C, O>,
    store: Store,
    bus: Addr<EventBus<VeilEvent>>,
    errors_raised: u64,
}

pub struct CoordinatorActorParams<C, O> {
    pub coordinator: Coordinator<C, O>,
    pub store: Store,
    pub bus: Addr<EventBus<VeilEvent>>,
}

impl<C: CiphertextCapability, O: AllocationOptimizer> CoordinatorActor<C, O> {
    pub fn new(params: CoordinatorActorParams<C, O>) -> Self {
        Self {
            coordinator: params.coordinator,
            store: params.store,
            bus: params.bus,
            errors_raised: 0,
        }
    }

    /// Start with an empty store.
    pub fn attach(coordinator: Coordinator<C, O>, bus: &Addr<EventBus<VeilEvent>>) -> Addr<Self> {
        Self::new(CoordinatorActorParams {
            coordinator,
            store: Store::new(),
            bus: bus.clone(),
        })
        .start()
    }

    fn report<T>(&mut self, result: Result<T, CoordinatorError>) -> Result<T, CoordinatorError> {
        if let Err(err) = &result {
            self.errors_raised += 1;
            let error = VeilError::new(err.err_type(), &err.to_string(), self.coordinator.now())
                .with_seq(self.errors_raised);
            self.bus.do_send(VeilEvent::from(error));
        }
        result
    }
}

impl<C: CiphertextCapability, O: AllocationOptimizer> Actor for CoordinatorActor<C, O> {
    type Context = Context<Self>;
}

impl<C: CiphertextCapability, O: AllocationOptimizer> Handler<SubmitCampaign>
    for CoordinatorActor<C, O>
{
    type Result = Result<CampaignId, CoordinatorError>;
    fn handle(&mut self, msg: SubmitCampaign, _: &mut Self::Context) -> Self::Result {
        let result = self.coordinator.submit(
            &mut self.store,
            &mut self.bus,
            msg.encrypted_budget,
            msg.encrypted_objective,
            msg.encrypted_constraints,
        );
        self.report(result)
    }
}

impl<C: CiphertextCapability, O: AllocationOptimizer> Handler<RequestReveal>
    for CoordinatorActor<C, O>
{
    type Result = Result<DecryptionHandle, CoordinatorError>;
    fn handle(&mut self, msg: RequestReveal, _: &mut Self::Context) -> Self::Result {
        let result = self
            .coordinator
            .register_for_reveal(&mut self.store, &mut self.bus, msg.target);
        self.report(result)
    }
}

impl<C: CiphertextCapability, O: AllocationOptimizer> Handler<DecryptionCallback>
    for CoordinatorActor<C, O>
{
    type Result = Result<RevealOutcome, CoordinatorError>;
    fn handle(&mut self, msg: DecryptionCallback, _: &mut Self::Context) -> Self::Result {
        let result = self.coordinator.on_decrypted(
            &mut self.store,
            &mut self.bus,
            msg.handle,
            &msg.cleartext,
            &msg.proof,
        );
        self.report(result)
    }
}

impl<C: CiphertextCapability, O: AllocationOptimizer> Handler<AbandonRequest>
    for CoordinatorActor<C, O>
{
    type Result = Result<DecryptionRequest, CoordinatorError>;
    fn handle(&mut self, msg: AbandonRequest, _: &mut Self::Context) -> Self::Result {
        let result = self.coordinator.abandon(&mut self.store, msg.handle);
        self.report(result)
    }
}

impl<C: CiphertextCapability, O: AllocationOptimizer> Handler<GetCampaign>
    for CoordinatorActor<C, O>
{
    type Result = Result<CampaignView, CoordinatorError>;
    fn handle(&mut self, msg: GetCampaign, _: &mut Self::Context) -> Self::Result {
        self.coordinator.campaign(&self.store, msg.campaign_id)
    }
}

impl<C: CiphertextCapability, O: AllocationOptimizer> Handler<GetPendingRequests>
    for CoordinatorActor<C, O>
{
    type Result = Vec<DecryptionRequest>;
    fn handle(&mut self, _: GetPendingRequests, _: &mut Self::Context) -> Self::Result {
        self.coordinator.pending_requests(&self.store)
    }
}

impl<C: CiphertextCapability, O: AllocationOptimizer> Handler<GetCategory>
    for CoordinatorActor<C, O>
{
    type Result = Option<CategoryAggregate>;
    fn handle(&mut self, msg: GetCategory, _: &mut Self::Context) -> Self::Result {
        self.store.category(&msg.category).cloned()
    }
}

impl<C: CiphertextCapability, O: AllocationOptimizer> Handler<GetAllocation>
    for CoordinatorActor<C, O>
{
    type Result = Option<AllocationOutcome>;
    fn handle(&mut self, msg: GetAllocation, _: &mut Self::Context) -> Self::Result {
        self.store.allocation(msg.campaign_id).cloned()
    }
}

impl<C: CiphertextCapability, O: AllocationOptimizer> Handler<GetStore> for CoordinatorActor<C, O> {
    type Result = MessageResult<GetStore>;
    fn handle(&mut self, _: GetStore, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.store.clone())
    }
}
