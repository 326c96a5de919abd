//! Rust benchmarks are located in an external module, and cannot access private functions.
//! This module re-exports some internals for the purposes of benchmarking.
//! Should not be used by regular users.

use rand_core::OsRng;

use crate::capsule::{Capsule, OpenReencryptedError};
use crate::capsule_frag::CapsuleFrag;
use crate::curve::CurvePoint;
use crate::keys::{PublicKey, SecretKey};
use crate::secret_box::SecretBox;
use crate::traits::SerializableToArray;

/// Serialized shared point, the seed of the symmetric key.
pub type KeySeed = [u8; 33];

fn to_key_seed(point: SecretBox<CurvePoint>) -> SecretBox<KeySeed> {
    let mut seed = SecretBox::new([0u8; 33]);
    seed.as_mut_secret()
        .copy_from_slice(&point.as_secret().to_array());
    seed
}

/// Exported `Capsule::from_public_key()` for benchmark purposes.
pub fn capsule_from_public_key(delegating_pk: &PublicKey) -> (Capsule, SecretBox<KeySeed>) {
    let (capsule, shared_point) = Capsule::from_public_key(&mut OsRng, delegating_pk);
    (capsule, to_key_seed(shared_point))
}

/// Exported `Capsule::open_original()` for benchmark purposes.
pub fn capsule_open_original(capsule: &Capsule, delegating_sk: &SecretKey) -> SecretBox<KeySeed> {
    to_key_seed(capsule.open_original(delegating_sk))
}

/// Exported `Capsule::open_reencrypted()` for benchmark purposes.
pub fn capsule_open_reencrypted(
    capsule: &Capsule,
    receiving_sk: &SecretKey,
    delegating_pk: &PublicKey,
    cfrags: &[CapsuleFrag],
) -> Result<SecretBox<KeySeed>, OpenReencryptedError> {
    capsule
        .open_reencrypted(receiving_sk, delegating_pk, cfrags)
        .map(to_key_seed)
}
