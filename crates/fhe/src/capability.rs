// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use veil_events::DecryptionHandle;
use veil_utils::ArcBytes;

/// Opaque encrypted value. Nothing outside the capability inspects its bytes.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ciphertext(ArcBytes);

impl Ciphertext {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(ArcBytes::from_bytes(bytes))
    }

    /// A ciphertext slot that was never written by the capability
    pub fn uninitialized() -> Self {
        Self::from_bytes(vec![])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ciphertext({} bytes)", self.0.size_bytes())
    }
}

/// Payload returned by the oracle: one decrypted value per requested ciphertext, in request
/// order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cleartext(ArcBytes);

impl Cleartext {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(ArcBytes::from_bytes(bytes))
    }

    pub fn from_values(values: &[Vec<u8>]) -> Result<Self, FheError> {
        let bytes =
            bincode::serialize(values).map_err(|e| FheError::MalformedCleartext(e.to_string()))?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn values(&self) -> Result<Vec<Vec<u8>>, FheError> {
        bincode::deserialize(&self.0).map_err(|e| FheError::MalformedCleartext(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Oracle proof that a cleartext is the decryption bound to a handle.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecryptionProof(ArcBytes);

impl DecryptionProof {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(ArcBytes::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Everything the oracle hands back for one handle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionResponse {
    pub handle: DecryptionHandle,
    pub cleartext: Cleartext,
    pub proof: DecryptionProof,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FheError {
    #[error("ciphertext was not produced by this capability")]
    MalformedCiphertext,
    #[error("ciphertext does not hold a 64 bit integer ({0} bytes)")]
    NotAnInteger(usize),
    #[error("homomorphic addition overflowed")]
    Overflow,
    #[error("a decryption request needs at least one ciphertext")]
    EmptyRequest,
    #[error("no decryption was requested for {0}")]
    UnknownHandle(DecryptionHandle),
    #[error("cleartext payload could not be decoded: {0}")]
    MalformedCleartext(String),
    #[error("capability backend failure: {0}")]
    Backend(String),
}

/// The homomorphic-encryption primitive and decryption oracle as seen by the coordinator.
///
/// Handles returned from [`CiphertextCapability::request_decryption`] must be unique for the
/// lifetime of the capability.
pub trait CiphertextCapability: Send + Sync + 'static {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Ciphertext, FheError>;

    fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext, FheError>;

    fn is_initialized(&self, ciphertext: &Ciphertext) -> bool;

    fn request_decryption(&self, ciphertexts: &[Ciphertext])
        -> Result<DecryptionHandle, FheError>;

    fn verify(
        &self,
        handle: &DecryptionHandle,
        cleartext: &Cleartext,
        proof: &DecryptionProof,
    ) -> bool;

    fn encrypt_u64(&self, value: u64) -> Result<Ciphertext, FheError> {
        self.encrypt(&value.to_le_bytes())
    }
}
