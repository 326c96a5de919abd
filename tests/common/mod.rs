#![allow(dead_code)]

use tracing_subscriber::{fmt, EnvFilter};

use umbral_threshold::{
    encrypt, generate_kfrags, Capsule, PublicKey, SecretKey, Signer, VerifiedKeyFrag,
};

/// Installs a test subscriber driven by `RUST_LOG` (warnings only by default).
/// Repeated calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

pub struct Parties {
    pub delegating_sk: SecretKey,
    pub delegating_pk: PublicKey,
    pub signer: Signer,
    pub verifying_pk: PublicKey,
    pub receiving_sk: SecretKey,
    pub receiving_pk: PublicKey,
}

impl Parties {
    pub fn new() -> Self {
        let delegating_sk = SecretKey::random();
        let delegating_pk = delegating_sk.public_key();
        let signer = Signer::new(SecretKey::random());
        let verifying_pk = signer.verifying_key();
        let receiving_sk = SecretKey::random();
        let receiving_pk = receiving_sk.public_key();
        Self {
            delegating_sk,
            delegating_pk,
            signer,
            verifying_pk,
            receiving_sk,
            receiving_pk,
        }
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> (Capsule, Vec<u8>) {
        encrypt(&self.delegating_pk, plaintext).unwrap()
    }

    pub fn kfrags(&self, threshold: usize, shares: usize) -> Box<[VerifiedKeyFrag]> {
        generate_kfrags(
            &self.delegating_sk,
            &self.receiving_pk,
            &self.signer,
            threshold,
            shares,
            true,
            true,
        )
        .unwrap()
    }
}
