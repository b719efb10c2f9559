// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{bail, Context, Result};
use fhe::bfv::{BfvParameters, BfvParametersBuilder};
use privagator_config::EngineConfig;
use std::sync::Arc;

pub fn build_bfv_params_arc(
    degree: usize,
    plaintext_modulus: u64,
    moduli_sizes: &[usize],
) -> Result<Arc<BfvParameters>> {
    if moduli_sizes.is_empty() {
        bail!("at least one ciphertext modulus size is required");
    }
    BfvParametersBuilder::new()
        .set_degree(degree)
        .set_plaintext_modulus(plaintext_modulus)
        .set_moduli_sizes(moduli_sizes)
        .build_arc()
        .with_context(|| {
            format!(
                "invalid BFV parameters (degree {degree}, plaintext modulus {plaintext_modulus}, moduli sizes {moduli_sizes:?})"
            )
        })
}

pub fn build_params_from_config(config: &EngineConfig) -> Result<Arc<BfvParameters>> {
    build_bfv_params_arc(
        config.degree,
        config.plaintext_modulus,
        &config.moduli_sizes,
    )
}

/// Largest magnitude a decoded plaintext coefficient can take
pub fn centered_bound(plaintext_modulus: u64) -> i128 {
    ((plaintext_modulus - 1) / 2) as i128
}
