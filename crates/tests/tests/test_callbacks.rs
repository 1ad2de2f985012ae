// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{bail, Result};
use futures::future::join_all;
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::collections::BTreeMap;
use veil_coordinator::{
    AbandonRequest, CoordinatorError, DecryptionCallback, GetPendingRequests, RevealOutcome,
};
use veil_events::{Category, RevealTarget};
use veil_ledger::CampaignPlaintext;
use veil_optimizer::{Channel, Constraints, Objective, ObjectiveWeights};
use veil_test_helpers::{generate_campaigns, VeilSystemBuilder};

#[actix::test]
async fn test_out_of_order_callbacks() -> Result<()> {
    let system = VeilSystemBuilder::new(11).build()?;
    let campaigns = generate_campaigns(11, 20);

    let mut handles = Vec::new();
    for plaintext in &campaigns {
        let id = system.submit(plaintext).await?;
        handles.push((id, system.request_reveal(id).await??));
    }
    handles.shuffle(&mut ChaCha20Rng::seed_from_u64(7));

    let sends = handles
        .iter()
        .map(|(_, handle)| -> Result<_> {
            let response = system.fhe.respond(handle)?;
            Ok(system.addr.send(DecryptionCallback::from(response)))
        })
        .collect::<Result<Vec<_>>>()?;

    for result in join_all(sends).await {
        let RevealOutcome::Campaign {
            campaign_id,
            plaintext,
            ..
        } = result??
        else {
            bail!("expected a campaign reveal");
        };
        // ids are issued from 1 in submission order
        let index = (campaign_id.value() - 1) as usize;
        assert_eq!(plaintext, campaigns[index]);
    }

    let store = system.store().await?;
    assert!(store.pending_requests().is_empty());
    assert!(store.ledger().iter().all(|c| c.is_revealed()));

    let mut expected: BTreeMap<Category, u64> = BTreeMap::new();
    for plaintext in &campaigns {
        *expected.entry(plaintext.objective.into()).or_default() += 1;
    }
    for (category, count) in expected {
        assert_eq!(system.category_count(category).await?, count);
    }
    Ok(())
}

#[actix::test]
async fn test_racing_duplicate_callbacks() -> Result<()> {
    let system = VeilSystemBuilder::new(12).build()?;
    let plaintext = CampaignPlaintext::new(5_000, Objective::Traffic, Constraints::none());
    let id = system.submit(&plaintext).await?;
    let handle = system.request_reveal(id).await??;
    let response = system.fhe.respond(&handle)?;

    let results = join_all(
        (0..5).map(|_| system.addr.send(DecryptionCallback::from(response.clone()))),
    )
    .await;

    let mut applied = 0;
    for result in results {
        match result? {
            Ok(_) => applied += 1,
            Err(err) => assert_eq!(err, CoordinatorError::RequestAlreadyConsumed(handle)),
        }
    }
    assert_eq!(applied, 1);
    assert_eq!(system.category_count(Objective::Traffic).await?, 1);
    assert_eq!(system.errors().await?.len(), 4);
    Ok(())
}

#[actix::test]
async fn test_abandoned_request_can_be_retried() -> Result<()> {
    let system = VeilSystemBuilder::new(13).build()?;
    let plaintext = CampaignPlaintext::new(800, Objective::Engagement, Constraints::none());
    let id = system.submit(&plaintext).await?;
    let stale = system.request_reveal(id).await??;

    let abandoned = system.addr.send(AbandonRequest { handle: stale }).await??;
    assert_eq!(abandoned.target, RevealTarget::Campaign(id));
    assert!(system.addr.send(GetPendingRequests).await?.is_empty());

    let fresh = system.request_reveal(id).await??;
    assert_ne!(stale, fresh);

    // the oracle still answers the first request
    assert_eq!(
        system.answer(stale).await?,
        Err(CoordinatorError::RequestAbandoned(stale))
    );
    assert!(!system.store().await?.campaign(id).unwrap().revealed);

    system.answer(fresh).await??;
    assert!(system.store().await?.campaign(id).unwrap().revealed);
    assert_eq!(system.category_count(Objective::Engagement).await?, 1);
    Ok(())
}

#[actix::test]
async fn test_category_reveal_is_a_snapshot() -> Result<()> {
    let system = VeilSystemBuilder::new(14).build()?;
    let plaintext = CampaignPlaintext::new(1_000, Objective::Awareness, Constraints::none());
    system.reveal_campaign(&plaintext).await?;

    let second = system.submit(&plaintext).await?;
    let campaign_handle = system.request_reveal(second).await??;
    let category_handle = system
        .request_reveal(RevealTarget::Category(Objective::Awareness.into()))
        .await??;

    // the campaign lands first but the counter was captured before it
    system.answer(campaign_handle).await??;
    assert_eq!(
        system.answer(category_handle).await??,
        RevealOutcome::Category {
            category: Objective::Awareness.into(),
            count: 1,
        }
    );
    assert_eq!(system.category_count(Objective::Awareness).await?, 2);

    let store = system.store().await?;
    let aggregate = store.category(&Objective::Awareness.into()).unwrap();
    assert_eq!(aggregate.last_revealed().map(|r| r.count), Some(2));
    Ok(())
}

#[actix::test]
async fn test_custom_weights_drive_allocation() -> Result<()> {
    let mut weights = ObjectiveWeights::default();
    weights.set(
        Objective::Conversions,
        [(Channel::Search, 1), (Channel::Email, 1)].into_iter().collect(),
    );
    let system = VeilSystemBuilder::new(15).with_weights(weights).build()?;

    let plaintext = CampaignPlaintext::new(2_000, Objective::Conversions, Constraints::none());
    let (id, _) = system.reveal_campaign(&plaintext).await?;

    let store = system.store().await?;
    let Some(allocation) = store.allocation(id).and_then(|o| o.allocation()) else {
        bail!("conversions should be allocatable");
    };
    assert_eq!(allocation.share(Channel::Search), 50);
    assert_eq!(allocation.share(Channel::Email), 50);
    assert_eq!(allocation.share(Channel::Video), 0);
    assert_eq!(allocation.amount(Channel::Search), 1_000);
    Ok(())
}

#[actix::test]
async fn test_infeasible_constraints_still_reveal() -> Result<()> {
    let system = VeilSystemBuilder::new(16).build()?;
    let constraints = Constraints::none()
        .with_min(Channel::Search, 70)
        .with_min(Channel::Social, 70);
    let plaintext = CampaignPlaintext::new(3_000, Objective::Branding, constraints);

    let (id, outcome) = system.reveal_campaign(&plaintext).await?;
    let RevealOutcome::Campaign { allocation, .. } = outcome else {
        bail!("expected a campaign reveal");
    };
    assert!(allocation.allocation().is_none());
    assert!(system.store().await?.campaign(id).unwrap().revealed);
    assert_eq!(system.category_count(Objective::Branding).await?, 1);
    Ok(())
}
