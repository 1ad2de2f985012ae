// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{bail, Result};
use veil_coordinator::{CoordinatorError, GetCampaign, RevealOutcome};
use veil_events::{CampaignId, Category, RevealTarget, VeilErrorType, VeilEvent};
use veil_ledger::CampaignPlaintext;
use veil_optimizer::{Channel, Constraints, Objective};
use veil_test_helpers::VeilSystemBuilder;

fn branding() -> CampaignPlaintext {
    CampaignPlaintext::new(10_000, Objective::Branding, Constraints::none())
}

#[actix::test]
async fn test_branding_campaign() -> Result<()> {
    let system = VeilSystemBuilder::new(1).with_logging().build()?;

    let id = system.submit(&branding()).await?;
    assert_eq!(id, CampaignId::new(1));

    let handle = system.request_reveal(id).await??;
    let RevealOutcome::Campaign {
        plaintext,
        allocation,
        ..
    } = system.answer(handle).await??
    else {
        bail!("expected a campaign reveal");
    };
    assert_eq!(plaintext, branding());

    let Some(allocation) = allocation.allocation() else {
        bail!("branding without constraints must be allocatable");
    };
    assert_eq!(allocation.total_percent(), 100);
    assert_eq!(allocation.amounts.values().sum::<u64>(), 10_000);
    // branding leans on social and video
    assert!(allocation.share(Channel::Social) > allocation.share(Channel::Email));

    let view = system
        .addr
        .send(GetCampaign { campaign_id: id })
        .await??;
    assert!(view.revealed);
    assert_eq!(view.plaintext, Some(branding()));

    assert_eq!(system.category_count("branding").await?, 1);

    let expected: Vec<String> = [
        "CampaignSubmitted",
        "DecryptionRequested",
        "DecryptionCompleted",
        "CampaignRevealed",
        "AllocationComputed",
        "DecryptionRequested",
        "DecryptionCompleted",
        "CategoryRevealed",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    assert_eq!(system.event_types().await?, expected);
    assert!(system.errors().await?.is_empty());
    Ok(())
}

#[actix::test]
async fn test_double_reveal_is_rejected() -> Result<()> {
    let system = VeilSystemBuilder::new(2).build()?;
    let id = system.submit(&branding()).await?;
    let handle = system.request_reveal(id).await??;

    // a second reveal while the first is in flight
    assert!(matches!(
        system.request_reveal(id).await?,
        Err(CoordinatorError::RevealInProgress { .. })
    ));

    system.answer(handle).await??;
    assert_eq!(
        system.answer(handle).await?,
        Err(CoordinatorError::RequestAlreadyConsumed(handle))
    );
    assert_eq!(
        system.request_reveal(id).await?,
        Err(CoordinatorError::AlreadyRevealed(id))
    );
    assert_eq!(system.category_count("branding").await?, 1);

    let errors = system.errors().await?;
    assert_eq!(errors.len(), 3);
    assert_eq!(errors[1].err_type, VeilErrorType::Callback);
    Ok(())
}

#[actix::test]
async fn test_invalid_proof_is_harmless() -> Result<()> {
    let system = VeilSystemBuilder::new(3).build()?;
    let id = system.submit(&branding()).await?;
    let handle = system.request_reveal(id).await??;

    let mut response = system.fhe.respond(&handle)?;
    let tampered = system.fhe.respond_with(&handle, &[vec![0; 8]])?;
    response.proof = tampered.proof;

    let result = system
        .addr
        .send(veil_coordinator::DecryptionCallback::from(response))
        .await?;
    assert_eq!(result, Err(CoordinatorError::InvalidProof(handle)));

    let store = system.store().await?;
    assert!(!store.campaign(id).unwrap().revealed);
    assert!(store.category(&Category::new("branding")).is_none());
    assert_eq!(store.pending_requests().len(), 1);

    system.answer(handle).await??;
    assert!(system.store().await?.campaign(id).unwrap().revealed);
    Ok(())
}

#[actix::test]
async fn test_category_reveal_before_any_member() -> Result<()> {
    let system = VeilSystemBuilder::new(4).build()?;
    // submitted campaigns do not count until revealed
    system.submit(&branding()).await?;

    assert_eq!(
        system
            .request_reveal(RevealTarget::Category(Category::new("branding")))
            .await?,
        Err(CoordinatorError::UnknownCategory(Category::new("branding")))
    );
    Ok(())
}

#[actix::test]
async fn test_counts_match_revealed_objectives() -> Result<()> {
    let system = VeilSystemBuilder::new(5).build()?;
    let campaigns = veil_test_helpers::generate_campaigns(5, 12);

    for plaintext in &campaigns {
        system.reveal_campaign(plaintext).await?;
    }
    // never revealed
    system.submit(&branding()).await?;

    for objective in [
        Objective::Branding,
        Objective::Awareness,
        Objective::Conversions,
        Objective::Engagement,
        Objective::Traffic,
    ] {
        let expected = campaigns
            .iter()
            .filter(|c| c.objective == objective)
            .count() as u64;
        let category = Category::from(objective);
        if expected == 0 {
            assert!(system.store().await?.category(&category).is_none());
        } else {
            assert_eq!(system.category_count(category).await?, expected);
        }
    }

    let store = system.store().await?;
    assert_eq!(store.ledger().len(), 13);
    assert_eq!(store.allocations().len(), 12);
    Ok(())
}

#[actix::test]
async fn test_events_carry_targets() -> Result<()> {
    let system = VeilSystemBuilder::new(6).build()?;
    let (id, _) = system.reveal_campaign(&branding()).await?;

    for event in system.events().await? {
        match &event {
            VeilEvent::VeilError { .. } => bail!("unexpected error {}", event),
            _ => assert_eq!(event.get_target(), Some(id.into())),
        }
    }
    Ok(())
}
