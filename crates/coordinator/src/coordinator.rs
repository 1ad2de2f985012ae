// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CoordinatorError, EventSink, Store};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use veil_aggregator::AggregationEngine;
use veil_events::{
    AllocationComputed, CampaignId, CampaignRevealed, CampaignSubmitted, Category,
    CategoryRevealed, Clock, DecryptionCompleted, DecryptionHandle, DecryptionRequested,
    RevealTarget, Timestamp,
};
use veil_fhe::{
    Ciphertext, CiphertextCapability, Cleartext, DecryptionProof, DecryptionResponse, FheError,
};
use veil_ledger::{CampaignPlaintext, CampaignView};
use veil_optimizer::{AllocationOptimizer, AllocationOutcome};
use veil_request::DecryptionRequest;

/// What a successful decryption callback did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevealOutcome {
    Campaign {
        campaign_id: CampaignId,
        plaintext: CampaignPlaintext,
        allocation: AllocationOutcome,
    },
    Category {
        category: Category,
        count: u64,
    },
}

/// Drives every transition of the coordination core over an explicit [`Store`].
///
/// Each operation either applies all of its effects or none of them: everything that can fail
/// (capability calls, decoding, optimization) runs before the store is touched. The
/// coordinator itself holds no state, so callers that share a store across threads must
/// serialize access to it. [`crate::CoordinatorActor`] does exactly that.
pub struct Coordinator<C, O> {
    fhe: Arc<C>,
    optimizer: Arc<O>,
    clock: Arc<dyn Clock>,
}

impl<C, O> Clone for Coordinator<C, O> {
    fn clone(&self) -> Self {
        Self {
            fhe: self.fhe.clone(),
            optimizer: self.optimizer.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<C: CiphertextCapability, O: AllocationOptimizer> Coordinator<C, O> {
    pub fn new(fhe: Arc<C>, optimizer: Arc<O>, clock: Arc<dyn Clock>) -> Self {
        Self {
            fhe,
            optimizer,
            clock,
        }
    }

    pub fn fhe(&self) -> &Arc<C> {
        &self.fhe
    }

    pub fn optimizer(&self) -> &Arc<O> {
        &self.optimizer
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn submit(
        &self,
        store: &mut Store,
        events: &mut impl EventSink,
        encrypted_budget: Ciphertext,
        encrypted_objective: Ciphertext,
        encrypted_constraints: Ciphertext,
    ) -> Result<CampaignId, CoordinatorError> {
        for ciphertext in [&encrypted_budget, &encrypted_objective, &encrypted_constraints] {
            if !self.fhe.is_initialized(ciphertext) {
                warn!("rejecting submission with an uninitialized ciphertext");
                return Err(FheError::MalformedCiphertext.into());
            }
        }
        let submitted_at = self.clock.now();
        let campaign_id = store.ledger.submit(
            encrypted_budget,
            encrypted_objective,
            encrypted_constraints,
            submitted_at,
        );
        events.emit(
            CampaignSubmitted {
                campaign_id,
                submitted_at,
            }
            .into(),
        );
        Ok(campaign_id)
    }

    pub fn campaign(
        &self,
        store: &Store,
        id: CampaignId,
    ) -> Result<CampaignView, CoordinatorError> {
        store.campaign(id).ok_or(CoordinatorError::CampaignNotFound(id))
    }

    pub fn request_campaign_reveal(
        &self,
        store: &mut Store,
        events: &mut impl EventSink,
        campaign_id: CampaignId,
    ) -> Result<DecryptionHandle, CoordinatorError> {
        self.register_for_reveal(store, events, RevealTarget::Campaign(campaign_id))
    }

    pub fn request_category_reveal(
        &self,
        store: &mut Store,
        events: &mut impl EventSink,
        category: &Category,
    ) -> Result<DecryptionHandle, CoordinatorError> {
        self.register_for_reveal(store, events, RevealTarget::Category(category.clone()))
    }

    /// Asks the oracle to decrypt whatever backs `target` and records the handle it returns.
    pub fn register_for_reveal(
        &self,
        store: &mut Store,
        events: &mut impl EventSink,
        target: RevealTarget,
    ) -> Result<DecryptionHandle, CoordinatorError> {
        let ciphertexts = match &target {
            RevealTarget::Campaign(id) => {
                let campaign = store.ledger.try_get(*id)?;
                if campaign.is_revealed() {
                    return Err(CoordinatorError::AlreadyRevealed(*id));
                }
                campaign.ciphertexts()
            }
            RevealTarget::Category(category) => vec![store.aggregates.counter_for(category)?],
        };
        store.requests.check_target_idle(&target)?;

        let handle = self.fhe.request_decryption(&ciphertexts).map_err(|err| {
            error!(%target, error = %err, "oracle refused decryption request");
            err
        })?;
        let requested_at = self.clock.now();
        let request = store
            .requests
            .register(handle, target, requested_at)?
            .clone();

        info!(%handle, target = %request.target, "reveal requested");
        events.emit(
            DecryptionRequested {
                handle,
                namespace: request.namespace,
                target: request.target,
                requested_at,
            }
            .into(),
        );
        Ok(handle)
    }

    pub fn on_response(
        &self,
        store: &mut Store,
        events: &mut impl EventSink,
        response: &DecryptionResponse,
    ) -> Result<RevealOutcome, CoordinatorError> {
        self.on_decrypted(
            store,
            events,
            response.handle,
            &response.cleartext,
            &response.proof,
        )
    }

    /// Oracle callback. Verifies the proof, finds the request, decodes the cleartext and applies
    /// the reveal. A decode failure leaves the request pending so the oracle can answer again.
    pub fn on_decrypted(
        &self,
        store: &mut Store,
        events: &mut impl EventSink,
        handle: DecryptionHandle,
        cleartext: &Cleartext,
        proof: &DecryptionProof,
    ) -> Result<RevealOutcome, CoordinatorError> {
        if !self.fhe.verify(&handle, cleartext, proof) {
            warn!(%handle, "rejecting callback with an invalid proof");
            return Err(CoordinatorError::InvalidProof(handle));
        }
        let request = store
            .requests
            .resolve(&handle)
            .map_err(|err| {
                warn!(%handle, error = %err, "rejecting callback");
                err
            })?
            .clone();
        let values = cleartext
            .values()
            .map_err(|err| CoordinatorError::malformed(handle, err))?;

        match request.target {
            RevealTarget::Campaign(campaign_id) => {
                self.reveal_campaign(store, events, handle, campaign_id, &values)
            }
            RevealTarget::Category(category) => {
                self.reveal_category(store, events, handle, category, &values)
            }
        }
    }

    fn reveal_campaign(
        &self,
        store: &mut Store,
        events: &mut impl EventSink,
        handle: DecryptionHandle,
        campaign_id: CampaignId,
        values: &[Vec<u8>],
    ) -> Result<RevealOutcome, CoordinatorError> {
        let plaintext = CampaignPlaintext::decode_fields(values).map_err(|err| {
            warn!(%handle, %campaign_id, error = %err, "campaign cleartext did not decode");
            CoordinatorError::malformed(handle, err)
        })?;
        if store.ledger.try_get(campaign_id)?.is_revealed() {
            return Err(CoordinatorError::AlreadyRevealed(campaign_id));
        }
        let category = Category::from(plaintext.objective);
        let next_count = store.aggregates.prepare_increment(&*self.fhe, &category)?;
        let allocation = AllocationOutcome::from(self.optimizer.allocate(
            plaintext.budget,
            plaintext.objective,
            &plaintext.constraints,
        ));
        if let AllocationOutcome::Rejected(err) = &allocation {
            warn!(%campaign_id, error = %err, "constraints admit no allocation");
        }

        // both checked above
        let now = self.clock.now();
        store.ledger.reveal(campaign_id, plaintext.clone(), now)?;
        store.requests.consume(&handle)?;
        store.aggregates.apply_increment(category, next_count);
        store.allocations.insert(campaign_id, allocation.clone());

        info!(%campaign_id, %handle, "campaign revealed");
        events.emit(
            DecryptionCompleted {
                handle,
                target: RevealTarget::Campaign(campaign_id),
                completed_at: now,
            }
            .into(),
        );
        events.emit(
            CampaignRevealed {
                campaign_id,
                budget: plaintext.budget,
                objective: plaintext.objective,
                revealed_at: now,
            }
            .into(),
        );
        events.emit(
            AllocationComputed {
                campaign_id,
                outcome: allocation.clone(),
                computed_at: now,
            }
            .into(),
        );

        Ok(RevealOutcome::Campaign {
            campaign_id,
            plaintext,
            allocation,
        })
    }

    fn reveal_category(
        &self,
        store: &mut Store,
        events: &mut impl EventSink,
        handle: DecryptionHandle,
        category: Category,
        values: &[Vec<u8>],
    ) -> Result<RevealOutcome, CoordinatorError> {
        let count = AggregationEngine::decode_counter(values).map_err(|err| {
            warn!(%handle, %category, error = %err, "counter cleartext did not decode");
            CoordinatorError::malformed(handle, err)
        })?;

        let now = self.clock.now();
        store.aggregates.publish(&category, count, now)?;
        store.requests.consume(&handle)?;

        events.emit(
            DecryptionCompleted {
                handle,
                target: RevealTarget::Category(category.clone()),
                completed_at: now,
            }
            .into(),
        );
        events.emit(
            CategoryRevealed {
                category: category.clone(),
                handle,
                count,
                revealed_at: now,
            }
            .into(),
        );

        Ok(RevealOutcome::Category { category, count })
    }

    /// Gives up on a pending request. The target may then be requested again.
    pub fn abandon(
        &self,
        store: &mut Store,
        handle: DecryptionHandle,
    ) -> Result<DecryptionRequest, CoordinatorError> {
        Ok(store.requests.abandon(&handle)?)
    }

    pub fn pending_requests(&self, store: &Store) -> Vec<DecryptionRequest> {
        store.pending_requests()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;
    use veil_aggregator::RevealedCount;
    use veil_events::{Event, ManualClock, RevealNamespace, VeilEvent};
    use veil_fhe::SimulatedFhe;
    use veil_optimizer::{AllocationError, Channel, Constraints, Objective, WeightedOptimizer};

    type TestCoordinator = Coordinator<SimulatedFhe, WeightedOptimizer>;

    struct Setup {
        fhe: Arc<SimulatedFhe>,
        coordinator: TestCoordinator,
        store: Store,
        events: Vec<VeilEvent>,
    }

    fn setup() -> Setup {
        let fhe = Arc::new(SimulatedFhe::from_seed(1234).unwrap());
        let coordinator = Coordinator::new(
            fhe.clone(),
            Arc::new(WeightedOptimizer::default()),
            Arc::new(ManualClock::starting_at(1_000)),
        );
        Setup {
            fhe,
            coordinator,
            store: Store::new(),
            events: vec![],
        }
    }

    impl Setup {
        fn submit(&mut self, plaintext: &CampaignPlaintext) -> CampaignId {
            let [budget, objective, constraints] = plaintext.encrypt(&*self.fhe).unwrap();
            self.coordinator
                .submit(&mut self.store, &mut self.events, budget, objective, constraints)
                .unwrap()
        }

        fn request(&mut self, id: CampaignId) -> Result<DecryptionHandle, CoordinatorError> {
            self.coordinator
                .request_campaign_reveal(&mut self.store, &mut self.events, id)
        }

        fn answer(&mut self, handle: DecryptionHandle) -> Result<RevealOutcome, CoordinatorError> {
            let response = self.fhe.respond(&handle).unwrap();
            self.coordinator
                .on_response(&mut self.store, &mut self.events, &response)
        }

        fn reveal(&mut self, plaintext: &CampaignPlaintext) -> CampaignId {
            let id = self.submit(plaintext);
            let handle = self.request(id).unwrap();
            self.answer(handle).unwrap();
            id
        }

        fn count(&mut self, category: &str) -> u64 {
            let handle = self
                .coordinator
                .request_category_reveal(
                    &mut self.store,
                    &mut self.events,
                    &Category::new(category),
                )
                .unwrap();
            match self.answer(handle).unwrap() {
                RevealOutcome::Category { count, .. } => count,
                other => panic!("expected a category reveal, got {other:?}"),
            }
        }

        fn event_types(&self) -> Vec<String> {
            self.events.iter().map(|e| e.event_type()).collect()
        }
    }

    fn branding() -> CampaignPlaintext {
        CampaignPlaintext::new(10_000, Objective::Branding, Constraints::none())
    }

    #[test]
    fn branding_campaign_end_to_end() {
        let mut s = setup();
        let id = s.submit(&branding());
        assert_eq!(id, CampaignId::new(1));
        assert!(!s.coordinator.campaign(&s.store, id).unwrap().revealed);

        let handle = s.request(id).unwrap();
        let outcome = s.answer(handle).unwrap();

        let RevealOutcome::Campaign {
            plaintext,
            allocation,
            ..
        } = outcome
        else {
            panic!("expected a campaign reveal");
        };
        assert_eq!(plaintext, branding());
        let allocation = allocation.allocation().unwrap().clone();
        assert_eq!(allocation.total_percent(), 100);
        assert_eq!(allocation.amounts.values().sum::<u64>(), 10_000);

        let view = s.coordinator.campaign(&s.store, id).unwrap();
        assert!(view.revealed);
        assert_eq!(view.plaintext, Some(branding()));
        assert_eq!(
            s.store.allocation(id),
            Some(&AllocationOutcome::Allocated(allocation))
        );
        assert_eq!(s.count("branding"), 1);

        assert_eq!(
            s.event_types()[..5],
            [
                "CampaignSubmitted",
                "DecryptionRequested",
                "DecryptionCompleted",
                "CampaignRevealed",
                "AllocationComputed"
            ]
        );
    }

    #[test]
    fn ids_are_never_reused() {
        let mut s = setup();
        let ids: Vec<_> = (0..4).map(|_| s.submit(&branding()).value()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn second_callback_is_rejected() {
        let mut s = setup();
        let id = s.submit(&branding());
        let handle = s.request(id).unwrap();
        s.answer(handle).unwrap();

        assert_eq!(
            s.answer(handle),
            Err(CoordinatorError::RequestAlreadyConsumed(handle))
        );
        assert_eq!(
            s.coordinator.campaign(&s.store, id).unwrap().plaintext,
            Some(branding())
        );
        assert_eq!(s.count("branding"), 1);
    }

    #[test]
    fn invalid_proof_changes_nothing() {
        let mut s = setup();
        let id = s.submit(&branding());
        let handle = s.request(id).unwrap();
        let response = s.fhe.respond(&handle).unwrap();

        let forged = DecryptionProof::from_bytes(vec![0; 32]);
        assert_eq!(
            s.coordinator.on_decrypted(
                &mut s.store,
                &mut s.events,
                handle,
                &response.cleartext,
                &forged
            ),
            Err(CoordinatorError::InvalidProof(handle))
        );
        assert!(!s.coordinator.campaign(&s.store, id).unwrap().revealed);
        assert!(s.store.category(&Category::new("branding")).is_none());
        assert_eq!(s.coordinator.pending_requests(&s.store).len(), 1);

        // the genuine answer still goes through
        s.answer(handle).unwrap();
        assert!(s.coordinator.campaign(&s.store, id).unwrap().revealed);
    }

    #[test]
    #[traced_test]
    fn rejected_callbacks_are_logged() {
        let mut s = setup();
        let id = s.submit(&branding());
        let handle = s.request(id).unwrap();
        s.answer(handle).unwrap();
        let _ = s.answer(handle);

        assert!(logs_contain("campaign revealed"));
        assert!(logs_contain("rejecting callback"));
    }

    #[test]
    fn malformed_cleartext_leaves_request_open() {
        let mut s = setup();
        let id = s.submit(&branding());
        let handle = s.request(id).unwrap();

        let garbage = s.fhe.respond_with(&handle, &[vec![1, 2, 3]]).unwrap();
        let err = s
            .coordinator
            .on_response(&mut s.store, &mut s.events, &garbage)
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::MalformedCleartext { .. }));
        assert!(s.store.requests().resolve(&handle).is_ok());
        assert!(!s.coordinator.campaign(&s.store, id).unwrap().revealed);

        s.answer(handle).unwrap();
        assert!(s.coordinator.campaign(&s.store, id).unwrap().revealed);
    }

    #[test]
    fn callback_for_unknown_handle() {
        let mut s = setup();
        let stranger = DecryptionHandle::from_bytes([9; 32]);
        let response = s.fhe.respond_with(&stranger, &[vec![0; 8]]).unwrap();
        assert_eq!(
            s.coordinator
                .on_response(&mut s.store, &mut s.events, &response),
            Err(CoordinatorError::UnknownRequest(stranger))
        );
    }

    #[test]
    fn reveals_are_guarded() {
        let mut s = setup();
        let id = s.submit(&branding());
        let first = s.request(id).unwrap();

        assert_eq!(
            s.request(id),
            Err(CoordinatorError::RevealInProgress {
                target: RevealTarget::Campaign(id),
                handle: first
            })
        );
        s.answer(first).unwrap();
        assert_eq!(s.request(id), Err(CoordinatorError::AlreadyRevealed(id)));
        assert_eq!(
            s.request(CampaignId::new(42)),
            Err(CoordinatorError::CampaignNotFound(CampaignId::new(42)))
        );
    }

    #[test]
    fn category_reveal_needs_a_member() {
        let mut s = setup();
        s.submit(&branding());
        let traffic = Category::new("traffic");
        assert_eq!(
            s.coordinator
                .request_category_reveal(&mut s.store, &mut s.events, &traffic),
            Err(CoordinatorError::UnknownCategory(traffic))
        );
    }

    #[test]
    fn category_counts_follow_reveals() {
        let mut s = setup();
        s.reveal(&branding());
        s.reveal(&CampaignPlaintext::new(50, Objective::Traffic, Constraints::none()));
        s.reveal(&branding());
        // submitted but never revealed
        s.submit(&branding());

        assert_eq!(s.count("branding"), 2);
        assert_eq!(s.count("traffic"), 1);

        let published = s
            .store
            .category(&Category::new("branding"))
            .unwrap()
            .last_revealed();
        assert!(matches!(published, Some(RevealedCount { count: 2, .. })));
        assert_eq!(s.event_types().last().unwrap(), "CategoryRevealed");
    }

    #[test]
    fn category_reveal_is_one_at_a_time() {
        let mut s = setup();
        s.reveal(&branding());
        let branding = Category::new("branding");
        s.coordinator
            .request_category_reveal(&mut s.store, &mut s.events, &branding)
            .unwrap();
        assert!(matches!(
            s.coordinator
                .request_category_reveal(&mut s.store, &mut s.events, &branding),
            Err(CoordinatorError::RevealInProgress { .. })
        ));
    }

    #[test]
    fn infeasible_constraints_still_reveal() {
        let mut s = setup();
        let plaintext = CampaignPlaintext::new(
            1_000,
            Objective::Conversions,
            Constraints::none()
                .with_min(Channel::Search, 60)
                .with_min(Channel::Social, 60),
        );
        let id = s.reveal(&plaintext);

        assert!(s.coordinator.campaign(&s.store, id).unwrap().revealed);
        assert!(matches!(
            s.store.allocation(id),
            Some(AllocationOutcome::Rejected(
                AllocationError::MinimumsExceedTotal { .. }
            ))
        ));
        assert_eq!(s.count("conversions"), 1);
    }

    #[test]
    fn zero_budget_reveals_without_an_allocation() {
        let mut s = setup();
        let plaintext = CampaignPlaintext::new(0, Objective::Branding, Constraints::none());
        let id = s.submit(&plaintext);
        let handle = s.request(id).unwrap();

        let RevealOutcome::Campaign {
            plaintext: revealed,
            allocation,
            ..
        } = s.answer(handle).unwrap()
        else {
            panic!("expected a campaign reveal");
        };
        assert_eq!(revealed, plaintext);
        assert_eq!(
            allocation,
            AllocationOutcome::Rejected(AllocationError::NonPositiveBudget)
        );
        assert_eq!(s.store.allocation(id), Some(&allocation));
        assert!(s.coordinator.campaign(&s.store, id).unwrap().revealed);
        assert!(s.store.pending_requests().is_empty());
        assert_eq!(s.count("branding"), 1);
    }

    #[test]
    fn abandoned_requests_can_be_retried() {
        let mut s = setup();
        let id = s.submit(&branding());
        let stale = s.request(id).unwrap();

        let abandoned = s.coordinator.abandon(&mut s.store, stale).unwrap();
        assert_eq!(abandoned.namespace, RevealNamespace::CampaignReveal);
        assert!(s.coordinator.pending_requests(&s.store).is_empty());

        let fresh = s.request(id).unwrap();
        assert_ne!(fresh, stale);
        assert_eq!(
            s.answer(stale),
            Err(CoordinatorError::RequestAbandoned(stale))
        );
        s.answer(fresh).unwrap();
        assert_eq!(s.count("branding"), 1);
    }

    #[test]
    fn uninitialized_ciphertexts_are_refused() {
        let mut s = setup();
        let [budget, objective, _] = branding().encrypt(&*s.fhe).unwrap();
        let result = s.coordinator.submit(
            &mut s.store,
            &mut s.events,
            budget,
            objective,
            Ciphertext::uninitialized(),
        );
        assert_eq!(
            result,
            Err(CoordinatorError::Capability(FheError::MalformedCiphertext))
        );
        assert!(s.store.ledger().is_empty());
        assert!(s.events.is_empty());
    }

    #[test]
    fn timestamps_come_from_the_clock() {
        let mut s = setup();
        let id = s.submit(&branding());
        let view = s.coordinator.campaign(&s.store, id).unwrap();
        assert_eq!(view.submitted_at, Timestamp(1_000));
    }

    /// A capability that hands out the same handle for every request.
    struct StuckOracle(SimulatedFhe);

    impl CiphertextCapability for StuckOracle {
        fn encrypt(&self, plaintext: &[u8]) -> Result<Ciphertext, FheError> {
            self.0.encrypt(plaintext)
        }

        fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext, FheError> {
            self.0.add(lhs, rhs)
        }

        fn is_initialized(&self, ciphertext: &Ciphertext) -> bool {
            self.0.is_initialized(ciphertext)
        }

        fn request_decryption(&self, _: &[Ciphertext]) -> Result<DecryptionHandle, FheError> {
            Ok(DecryptionHandle::from_bytes([1; 32]))
        }

        fn verify(&self, h: &DecryptionHandle, c: &Cleartext, p: &DecryptionProof) -> bool {
            self.0.verify(h, c, p)
        }
    }

    #[test]
    fn duplicate_handles_are_not_recorded() {
        let fhe = Arc::new(StuckOracle(SimulatedFhe::from_seed(5).unwrap()));
        let coordinator = Coordinator::new(
            fhe.clone(),
            Arc::new(WeightedOptimizer::default()),
            Arc::new(ManualClock::starting_at(0)),
        );
        let mut store = Store::new();
        let mut events = vec![];
        let submit = |store: &mut Store, events: &mut Vec<VeilEvent>| {
            let [b, o, c] = branding().encrypt(&*fhe).unwrap();
            coordinator.submit(store, events, b, o, c).unwrap()
        };
        let first = submit(&mut store, &mut events);
        let second = submit(&mut store, &mut events);

        let handle = coordinator
            .request_campaign_reveal(&mut store, &mut events, first)
            .unwrap();
        assert_eq!(
            coordinator.request_campaign_reveal(&mut store, &mut events, second),
            Err(CoordinatorError::DuplicateHandle(handle))
        );
        assert_eq!(store.pending_requests().len(), 1);
        assert_eq!(
            store.requests().get(&handle).unwrap().target,
            RevealTarget::Campaign(first)
        );
    }
}
