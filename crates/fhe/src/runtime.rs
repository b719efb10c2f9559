// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{anyhow, Context, Result};
use fhe::bfv::{
    BfvParameters, Ciphertext, Encoding, EvaluationKey, EvaluationKeyBuilder, Plaintext,
    RelinearizationKey, SecretKey,
};
use fhe_traits::{FheDecoder, FheDecrypter, FheEncoder, FheEncrypter, Serialize};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::sync::Arc;

/// RNG for key generation. A seed makes the keys reproducible.
pub fn key_rng(seed: Option<u64>) -> ChaCha20Rng {
    match seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    }
}

/// Fhe library adaptor.
///
/// Holds every key needed to encrypt operands, evaluate circuits and
/// decrypt results. Immutable after construction; callers bring their own
/// RNG for encryption.
pub struct Fhe {
    params: Arc<BfvParameters>,
    secret_key: SecretKey,
    relin_key: RelinearizationKey,
    eval_key: EvaluationKey,
}

impl Fhe {
    pub fn generate(params: Arc<BfvParameters>, rng: &mut ChaCha20Rng) -> Result<Self> {
        let secret_key = SecretKey::random(&params, rng);
        let relin_key = RelinearizationKey::new(&secret_key, rng)
            .context("could not generate the relinearization key")?;
        let mut builder = EvaluationKeyBuilder::new(&secret_key)
            .context("could not create the evaluation key builder")?;
        builder.enable_inner_sum()?;
        let eval_key = builder
            .build(rng)
            .context("could not generate the inner sum key")?;

        Ok(Self {
            params,
            secret_key,
            relin_key,
            eval_key,
        })
    }

    pub fn params(&self) -> &Arc<BfvParameters> {
        &self.params
    }

    pub fn degree(&self) -> usize {
        self.params.degree()
    }

    /// Encrypt a single integer as the constant coefficient of a polynomial
    pub fn encrypt_scalar(&self, value: i64, rng: &mut ChaCha20Rng) -> Result<Ciphertext> {
        let pt = Plaintext::try_encode(&[value], Encoding::poly(), &self.params)?;
        Ok(self.secret_key.try_encrypt(&pt, rng)?)
    }

    /// Encrypt one value per SIMD slot
    pub fn encrypt_slots(&self, slots: &[u64], rng: &mut ChaCha20Rng) -> Result<Ciphertext> {
        let pt = Plaintext::try_encode(slots, Encoding::simd(), &self.params)?;
        Ok(self.secret_key.try_encrypt(&pt, rng)?)
    }

    pub fn decrypt_scalar(&self, ct: &Ciphertext) -> Result<i64> {
        let pt = self.secret_key.try_decrypt(ct)?;
        let coeffs = Vec::<i64>::try_decode(&pt, Encoding::poly())?;
        coeffs
            .first()
            .copied()
            .ok_or_else(|| anyhow!("decrypted plaintext has no coefficients"))
    }

    pub fn decrypt_slots(&self, ct: &Ciphertext) -> Result<Vec<u64>> {
        let pt = self.secret_key.try_decrypt(ct)?;
        Ok(Vec::<u64>::try_decode(&pt, Encoding::simd())?)
    }

    pub fn add(&self, a: &Ciphertext, b: &Ciphertext) -> Ciphertext {
        a + b
    }

    /// Multiply and relinearize back to a two part ciphertext
    pub fn multiply(&self, a: &Ciphertext, b: &Ciphertext) -> Result<Ciphertext> {
        let mut product = a * b;
        self.relin_key.relinearizes(&mut product)?;
        Ok(product)
    }

    /// Every slot of the output holds the sum of all input slots
    pub fn inner_sum(&self, ct: &Ciphertext) -> Result<Ciphertext> {
        Ok(self.eval_key.computes_inner_sum(ct)?)
    }

    pub fn ciphertext_size(ct: &Ciphertext) -> usize {
        ct.to_bytes().len()
    }
}
