// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CategoryAggregate, RevealedCount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};
use veil_events::{Category, Timestamp};
use veil_fhe::{Ciphertext, CiphertextCapability, FheError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregationError {
    #[error("category '{0}' has no counter yet")]
    UnknownCategory(Category),
    #[error(transparent)]
    Capability(#[from] FheError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CounterDecodeError {
    #[error("expected a single counter value but found {0}")]
    Arity(usize),
    #[error("counter value must be 8 bytes but was {0}")]
    Width(usize),
}

/// Holds one encrypted counter per category. Counters only ever grow by homomorphic addition,
/// nothing in here decrypts.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AggregationEngine {
    aggregates: BTreeMap<Category, CategoryAggregate>,
}

impl AggregationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the counter that would result from adding one member to `category` without
    /// storing it. A missing or uninitialized counter starts from encrypted zero.
    pub fn prepare_increment<C: CiphertextCapability + ?Sized>(
        &self,
        fhe: &C,
        category: &Category,
    ) -> Result<Ciphertext, AggregationError> {
        let current = match self.aggregates.get(category) {
            Some(aggregate) if fhe.is_initialized(aggregate.encrypted_count()) => {
                aggregate.encrypted_count().clone()
            }
            _ => fhe.encrypt_u64(0)?,
        };
        let one = fhe.encrypt_u64(1)?;
        Ok(fhe.add(&current, &one)?)
    }

    /// Stores a counter produced by [`AggregationEngine::prepare_increment`].
    pub fn apply_increment(&mut self, category: Category, encrypted_count: Ciphertext) {
        debug!(%category, "category counter incremented");
        match self.aggregates.get_mut(&category) {
            Some(aggregate) => aggregate.set_encrypted_count(encrypted_count),
            None => {
                info!(%category, "category counter created");
                self.aggregates.insert(
                    category.clone(),
                    CategoryAggregate::new(category, encrypted_count),
                );
            }
        }
    }

    pub fn record_category_membership<C: CiphertextCapability + ?Sized>(
        &mut self,
        fhe: &C,
        category: &Category,
    ) -> Result<(), AggregationError> {
        let next = self.prepare_increment(fhe, category)?;
        self.apply_increment(category.clone(), next);
        Ok(())
    }

    pub fn get(&self, category: &Category) -> Option<&CategoryAggregate> {
        self.aggregates.get(category)
    }

    pub fn counter_for(&self, category: &Category) -> Result<Ciphertext, AggregationError> {
        self.aggregates
            .get(category)
            .map(|a| a.encrypted_count().clone())
            .ok_or_else(|| AggregationError::UnknownCategory(category.clone()))
    }

    /// Decodes the oracle's answer for a category reveal.
    pub fn decode_counter(values: &[Vec<u8>]) -> Result<u64, CounterDecodeError> {
        let [value] = values else {
            return Err(CounterDecodeError::Arity(values.len()));
        };
        let bytes: [u8; 8] = value
            .as_slice()
            .try_into()
            .map_err(|_| CounterDecodeError::Width(value.len()))?;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Records a decrypted counter as the published count for `category`.
    pub fn publish(
        &mut self,
        category: &Category,
        count: u64,
        revealed_at: Timestamp,
    ) -> Result<(), AggregationError> {
        let aggregate = self
            .aggregates
            .get_mut(category)
            .ok_or_else(|| AggregationError::UnknownCategory(category.clone()))?;
        aggregate.set_last_revealed(RevealedCount { count, revealed_at });
        info!(%category, count, "category count published");
        Ok(())
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryAggregate> {
        self.aggregates.values()
    }

    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }
}
