// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::report::{CampaignBatch, SimulationReport};
use actix::prelude::*;
use anyhow::{Context, Result};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::{fs, path::Path, sync::Arc};
use tracing::info;
use veil_config::VeilConfig;
use veil_coordinator::{
    Coordinator, CoordinatorActor, DecryptionCallback, GetStore, RequestReveal, SubmitCampaign,
};
use veil_events::{EventBus, RevealTarget, SystemClock, VeilEvent};
use veil_fhe::SimulatedFhe;
use veil_logger::SimpleLogger;
use veil_optimizer::WeightedOptimizer;

pub fn load_batch(path: &Path) -> Result<CampaignBatch> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Could not read campaigns from {}", path.display()))?;
    serde_yaml::from_str(&content).context("Could not parse campaigns")
}

pub async fn execute(config: &VeilConfig, input: &Path, reveal_categories: bool) -> Result<()> {
    let batch = load_batch(input)?;
    let report = run(config, batch, reveal_categories).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Submit every campaign encrypted, reveal them all with callbacks delivered in a seeded random
/// order, then optionally reveal each category counter.
pub async fn run(
    config: &VeilConfig,
    batch: CampaignBatch,
    reveal_categories: bool,
) -> Result<SimulationReport> {
    let bus = EventBus::<VeilEvent>::new(config.event_bus()).start();
    SimpleLogger::<VeilEvent>::attach(config.name(), bus.clone());

    let fhe = Arc::new(SimulatedFhe::from_seed(config.seed())?);
    let coordinator = Coordinator::new(
        fhe.clone(),
        Arc::new(WeightedOptimizer::new(config.weights())),
        Arc::new(SystemClock),
    );
    let addr = CoordinatorActor::attach(coordinator, &bus);

    let mut ids = Vec::with_capacity(batch.campaigns.len());
    for plaintext in &batch.campaigns {
        let [encrypted_budget, encrypted_objective, encrypted_constraints] =
            plaintext.encrypt(&*fhe)?;
        ids.push(
            addr.send(SubmitCampaign {
                encrypted_budget,
                encrypted_objective,
                encrypted_constraints,
            })
            .await??,
        );
    }
    info!(count = ids.len(), "campaigns submitted");

    let mut handles = Vec::with_capacity(ids.len());
    for id in ids {
        handles.push(addr.send(RequestReveal { target: id.into() }).await??);
    }

    let mut rng = ChaCha20Rng::seed_from_u64(config.seed());
    handles.shuffle(&mut rng);
    for handle in handles {
        let response = fhe.respond(&handle)?;
        addr.send(DecryptionCallback::from(response)).await??;
    }

    if reveal_categories {
        let store = addr.send(GetStore).await?;
        let categories: Vec<_> = store
            .aggregates()
            .categories()
            .map(|a| a.category().clone())
            .collect();
        for category in categories {
            let handle = addr
                .send(RequestReveal {
                    target: RevealTarget::Category(category),
                })
                .await??;
            let response = fhe.respond(&handle)?;
            addr.send(DecryptionCallback::from(response)).await??;
        }
    }

    let store = addr.send(GetStore).await?;
    Ok(SimulationReport::from_store(&store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use veil_events::Category;
    use veil_ledger::CampaignPlaintext;
    use veil_optimizer::{Channel, Constraints, Objective};

    const BATCH: &str = r#"
campaigns:
  - budget: 10000
    objective: branding
  - budget: 2500
    objective: traffic
    constraints:
      bounds:
        search:
          max: 30
  - budget: 700
    objective: branding
  - budget: 900
    objective: conversions
    constraints:
      bounds:
        search:
          min: 70
        email:
          min: 70
"#;

    fn batch() -> CampaignBatch {
        serde_yaml::from_str(BATCH).unwrap()
    }

    #[test]
    fn loads_a_batch_from_disk() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(BATCH.as_bytes())?;
        let loaded = load_batch(file.path())?;
        assert_eq!(loaded.campaigns.len(), 4);
        assert_eq!(loaded.campaigns[1].objective, Objective::Traffic);
        assert_eq!(
            loaded.campaigns[1].constraints.bounds_for(Channel::Search).max(),
            30
        );
        assert!(load_batch(Path::new("/nope/campaigns.yaml")).is_err());
        Ok(())
    }

    #[actix::test]
    async fn simulation_reveals_everything() -> Result<()> {
        let report = run(&VeilConfig::default(), batch(), true).await?;

        assert!(report.sealed.is_empty());
        assert_eq!(report.campaigns.len(), 4);
        for campaign in &report.campaigns[..3] {
            assert_eq!(campaign.shares.values().map(|s| *s as u32).sum::<u32>(), 100);
            assert_eq!(campaign.amounts.values().sum::<u64>(), campaign.budget);
        }
        assert!(report.campaigns[1].shares.get(&Channel::Search).copied().unwrap_or(0) <= 30);
        // minimums over 100 cannot be honoured
        assert!(report.campaigns[3].rejected.is_some());

        assert_eq!(report.categories[&Category::new("branding")], Some(2));
        assert_eq!(report.categories[&Category::new("traffic")], Some(1));
        assert_eq!(report.categories[&Category::new("conversions")], Some(1));
        Ok(())
    }

    #[actix::test]
    async fn zero_budget_does_not_stop_the_batch() -> Result<()> {
        let mut batch = batch();
        batch
            .campaigns
            .push(CampaignPlaintext::new(0, Objective::Branding, Constraints::none()));
        let report = run(&VeilConfig::default(), batch, true).await?;

        assert!(report.sealed.is_empty());
        assert_eq!(report.campaigns.len(), 5);
        assert_eq!(report.campaigns[4].budget, 0);
        assert!(report.campaigns[4].shares.is_empty());
        assert!(report.campaigns[4].rejected.is_some());
        assert_eq!(report.categories[&Category::new("branding")], Some(3));
        Ok(())
    }

    #[actix::test]
    async fn counters_stay_sealed_unless_asked() -> Result<()> {
        let report = run(&VeilConfig::default(), batch(), false).await?;
        assert_eq!(report.categories[&Category::new("branding")], None);
        Ok(())
    }

    #[actix::test]
    async fn same_seed_same_report() -> Result<()> {
        let config = VeilConfig::default();
        let first = run(&config, batch(), true).await?;
        let second = run(&config, batch(), true).await?;
        assert_eq!(
            serde_json::to_string(&first)?,
            serde_json::to_string(&second)?
        );
        Ok(())
    }
}
