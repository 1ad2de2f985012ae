// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    Ciphertext, CiphertextCapability, Cleartext, DecryptionProof, DecryptionResponse, FheError,
};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, trace};
use veil_events::DecryptionHandle;

const MAGIC: &[u8; 4] = b"VEIL";
const NONCE_LEN: usize = 16;
const HEADER_LEN: usize = MAGIC.len() + NONCE_LEN;

pub type SharedRng = Arc<Mutex<ChaCha20Rng>>;

pub fn create_shared_rng_from_u64(seed: u64) -> SharedRng {
    Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed)))
}

#[derive(Default)]
struct OracleState {
    order: Vec<DecryptionHandle>,
    requests: HashMap<DecryptionHandle, Vec<Ciphertext>>,
}

/// Deterministic stand-in for the encryption library and the decryption oracle.
///
/// Ciphertexts are `MAGIC || nonce || plaintext ^ keystream` where the keystream is derived from
/// a secret key with SHA-256. Addition decrypts internally and re-encrypts, which is enough to
/// exercise the coordinator without a real homomorphic scheme. The same key authenticates the
/// oracle's proofs.
///
/// Not a cryptosystem. Seeded so that test and CLI runs are reproducible.
#[derive(Clone)]
pub struct SimulatedFhe {
    key: [u8; 32],
    rng: SharedRng,
    state: Arc<Mutex<OracleState>>,
}

impl SimulatedFhe {
    pub fn new(rng: SharedRng) -> Result<Self, FheError> {
        let mut key = [0u8; 32];
        lock(&rng)?.fill_bytes(&mut key);
        Ok(Self {
            key,
            rng,
            state: Arc::new(Mutex::new(OracleState::default())),
        })
    }

    pub fn from_seed(seed: u64) -> Result<Self, FheError> {
        Self::new(create_shared_rng_from_u64(seed))
    }

    fn keystream(&self, nonce: &[u8], len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        let mut block: u64 = 0;
        while out.len() < len {
            let mut hasher = Sha256::new();
            hasher.update(self.key);
            hasher.update(nonce);
            hasher.update(block.to_le_bytes());
            out.extend_from_slice(&hasher.finalize());
            block += 1;
        }
        out.truncate(len);
        out
    }

    fn decrypt(&self, ciphertext: &Ciphertext) -> Result<Vec<u8>, FheError> {
        let bytes = ciphertext.as_bytes();
        if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
            return Err(FheError::MalformedCiphertext);
        }
        let nonce = &bytes[MAGIC.len()..HEADER_LEN];
        let body = &bytes[HEADER_LEN..];
        let stream = self.keystream(nonce, body.len());
        Ok(body.iter().zip(stream).map(|(b, k)| b ^ k).collect())
    }

    fn decrypt_u64(&self, ciphertext: &Ciphertext) -> Result<u64, FheError> {
        let plain = self.decrypt(ciphertext)?;
        let bytes: [u8; 8] = plain
            .as_slice()
            .try_into()
            .map_err(|_| FheError::NotAnInteger(plain.len()))?;
        Ok(u64::from_le_bytes(bytes))
    }

    fn mac(&self, handle: &DecryptionHandle, cleartext: &Cleartext) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(b"veil-proof");
        hasher.update(self.key);
        hasher.update(handle.as_bytes());
        hasher.update(cleartext.as_bytes());
        hasher.finalize().to_vec()
    }

    /// Act as the oracle: decrypt every ciphertext registered under `handle` and sign the result.
    /// The same handle may be answered more than once, as a real oracle may redeliver.
    pub fn respond(&self, handle: &DecryptionHandle) -> Result<DecryptionResponse, FheError> {
        let ciphertexts = lock(&self.state)?
            .requests
            .get(handle)
            .cloned()
            .ok_or(FheError::UnknownHandle(*handle))?;
        let values = ciphertexts
            .iter()
            .map(|ct| self.decrypt(ct))
            .collect::<Result<Vec<_>, _>>()?;
        self.respond_with(handle, &values)
    }

    /// Sign arbitrary values for `handle`. Used to model an oracle that answers with data that
    /// authenticates but does not decode.
    pub fn respond_with(
        &self,
        handle: &DecryptionHandle,
        values: &[Vec<u8>],
    ) -> Result<DecryptionResponse, FheError> {
        let cleartext = Cleartext::from_values(values)?;
        let proof = DecryptionProof::from_bytes(self.mac(handle, &cleartext));
        trace!(handle = %handle, "oracle signed response");
        Ok(DecryptionResponse {
            handle: *handle,
            cleartext,
            proof,
        })
    }

    /// Handles issued so far, in issue order
    pub fn issued_handles(&self) -> Result<Vec<DecryptionHandle>, FheError> {
        Ok(lock(&self.state)?.order.clone())
    }

    fn derive_handle(&self, n: u64) -> DecryptionHandle {
        let mut hasher = Sha256::new();
        hasher.update(b"veil-handle");
        hasher.update(self.key);
        hasher.update(n.to_le_bytes());
        DecryptionHandle::from_bytes(hasher.finalize().into())
    }
}

impl CiphertextCapability for SimulatedFhe {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Ciphertext, FheError> {
        let mut nonce = [0u8; NONCE_LEN];
        lock(&self.rng)?.fill_bytes(&mut nonce);
        let stream = self.keystream(&nonce, plaintext.len());
        let mut bytes = Vec::with_capacity(HEADER_LEN + plaintext.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&nonce);
        bytes.extend(plaintext.iter().zip(stream).map(|(b, k)| b ^ k));
        Ok(Ciphertext::from_bytes(bytes))
    }

    fn add(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext, FheError> {
        let sum = self
            .decrypt_u64(lhs)?
            .checked_add(self.decrypt_u64(rhs)?)
            .ok_or(FheError::Overflow)?;
        self.encrypt_u64(sum)
    }

    fn is_initialized(&self, ciphertext: &Ciphertext) -> bool {
        let bytes = ciphertext.as_bytes();
        bytes.len() >= HEADER_LEN && &bytes[..MAGIC.len()] == MAGIC
    }

    fn request_decryption(
        &self,
        ciphertexts: &[Ciphertext],
    ) -> Result<DecryptionHandle, FheError> {
        if ciphertexts.is_empty() {
            return Err(FheError::EmptyRequest);
        }
        let mut state = lock(&self.state)?;
        let handle = self.derive_handle(state.order.len() as u64 + 1);
        state.order.push(handle);
        state.requests.insert(handle, ciphertexts.to_vec());
        info!(handle = %handle, count = ciphertexts.len(), "decryption requested from oracle");
        Ok(handle)
    }

    fn verify(
        &self,
        handle: &DecryptionHandle,
        cleartext: &Cleartext,
        proof: &DecryptionProof,
    ) -> bool {
        proof.as_bytes() == self.mac(handle, cleartext).as_slice()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, FheError> {
    mutex
        .lock()
        .map_err(|_| FheError::Backend("simulated backend lock poisoned".to_string()))
}
