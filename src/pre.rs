//! The high-level functional reencryption API.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use rand_core::{CryptoRng, RngCore};
use tracing::{debug, trace};
use zeroize::Zeroize;

#[cfg(feature = "default-rng")]
use rand_core::OsRng;

use crate::capsule::{Capsule, OpenReencryptedError};
use crate::capsule_frag::{CapsuleFrag, VerifiedCapsuleFrag};
use crate::curve::CurvePoint;
use crate::dem::{DecryptionError, EncryptionError, DEM};
use crate::key_frag::{KeyFragBase, KeyFragGenerationError, VerifiedKeyFrag};
use crate::keys::{PublicKey, SecretKey, Signer};
use crate::secret_box::SecretBox;
use crate::traits::SerializableToArray;

/// Errors that can happen when decrypting a reencrypted ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReencryptionError {
    /// An error when opening a capsule. See [`OpenReencryptedError`] for the options.
    OnOpen(OpenReencryptedError),
    /// An error when decrypting the ciphertext. See [`DecryptionError`] for the options.
    OnDecryption(DecryptionError),
}

impl fmt::Display for ReencryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnOpen(err) => write!(f, "Re-encryption error on open: {}", err),
            Self::OnDecryption(err) => write!(f, "Re-encryption error on decryption: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ReencryptionError {}

fn dem_from_shared_point(shared_point: &SecretBox<CurvePoint>) -> DEM {
    let mut key_seed = shared_point.as_secret().to_array();
    let dem = DEM::new(&key_seed);
    key_seed.as_mut_slice().zeroize();
    dem
}

/// Encrypts the given plaintext message using a DEM scheme,
/// and encapsulates the key for later reencryption.
/// Returns the KEM [`Capsule`] and the ciphertext.
pub fn encrypt_with_rng(
    rng: &mut (impl CryptoRng + RngCore),
    delegating_pk: &PublicKey,
    plaintext: &[u8],
) -> Result<(Capsule, Vec<u8>), EncryptionError> {
    let (capsule, shared_point) = Capsule::from_public_key(rng, delegating_pk);
    let dem = dem_from_shared_point(&shared_point);
    let ciphertext = dem.encrypt(rng, plaintext, &capsule.to_array())?;
    trace!(plaintext_len = plaintext.len(), %capsule, "encrypted");
    Ok((capsule, ciphertext))
}

/// A synonym for [`encrypt_with_rng`] with the default RNG.
#[cfg(feature = "default-rng")]
#[cfg_attr(docsrs, doc(cfg(feature = "default-rng")))]
pub fn encrypt(
    delegating_pk: &PublicKey,
    plaintext: &[u8],
) -> Result<(Capsule, Vec<u8>), EncryptionError> {
    encrypt_with_rng(&mut OsRng, delegating_pk, plaintext)
}

/// Attempts to decrypt the ciphertext using the original encryptor's
/// secret key.
pub fn decrypt_original(
    delegating_sk: &SecretKey,
    capsule: &Capsule,
    ciphertext: impl AsRef<[u8]>,
) -> Result<Vec<u8>, DecryptionError> {
    let shared_point = capsule.open_original(delegating_sk);
    let dem = dem_from_shared_point(&shared_point);
    dem.decrypt(ciphertext, &capsule.to_array())
}

/// Creates `shares` fragments of `delegating_sk`,
/// which will be possible to reencrypt to allow the creator of `receiving_pk`
/// decrypt the ciphertext encrypted with `delegating_sk`.
///
/// `threshold` sets the number of fragments necessary for decryption.
/// It must satisfy `1 <= threshold <= shares`.
///
/// `signer` is used to sign the resulting [`KeyFrag`](`crate::KeyFrag`) objects,
/// which can be later verified by the associated public key.
///
/// If `sign_delegating_key` or `sign_receiving_key` are `true`,
/// the reencrypting party will be able to verify that a [`KeyFrag`](`crate::KeyFrag`)
/// corresponds to given delegating or receiving public keys
/// by supplying them to [`KeyFrag::verify()`](`crate::KeyFrag::verify`).
///
/// Returns a boxed slice of `shares` KeyFrags
#[allow(clippy::too_many_arguments)]
pub fn generate_kfrags_with_rng(
    rng: &mut (impl CryptoRng + RngCore),
    delegating_sk: &SecretKey,
    receiving_pk: &PublicKey,
    signer: &Signer,
    threshold: usize,
    shares: usize,
    sign_delegating_key: bool,
    sign_receiving_key: bool,
) -> Result<Box<[VerifiedKeyFrag]>, KeyFragGenerationError> {
    let invalid_threshold = KeyFragGenerationError::InvalidThreshold { threshold, shares };
    if threshold == 0 || threshold > shares {
        debug!(threshold, shares, "invalid threshold requested");
        return Err(invalid_threshold);
    }
    let threshold_u32 = u32::try_from(threshold).map_err(|_| invalid_threshold)?;

    let base = KeyFragBase::new(rng, delegating_sk, receiving_pk, signer, threshold_u32);

    let mut result = Vec::<VerifiedKeyFrag>::with_capacity(shares);
    for _ in 0..shares {
        result.push(VerifiedKeyFrag::from_base(
            rng,
            &base,
            sign_delegating_key,
            sign_receiving_key,
        ));
    }

    debug!(
        threshold,
        shares, sign_delegating_key, sign_receiving_key, "generated key fragments"
    );

    Ok(result.into_boxed_slice())
}

/// A synonym for [`generate_kfrags_with_rng`] with the default RNG.
#[cfg(feature = "default-rng")]
#[cfg_attr(docsrs, doc(cfg(feature = "default-rng")))]
#[allow(clippy::too_many_arguments)]
pub fn generate_kfrags(
    delegating_sk: &SecretKey,
    receiving_pk: &PublicKey,
    signer: &Signer,
    threshold: usize,
    shares: usize,
    sign_delegating_key: bool,
    sign_receiving_key: bool,
) -> Result<Box<[VerifiedKeyFrag]>, KeyFragGenerationError> {
    generate_kfrags_with_rng(
        &mut OsRng,
        delegating_sk,
        receiving_pk,
        signer,
        threshold,
        shares,
        sign_delegating_key,
        sign_receiving_key,
    )
}

/// Reencrypts a [`Capsule`] object with a key fragment, creating a capsule fragment.
///
/// Having `threshold` (see [`generate_kfrags()`](`crate::generate_kfrags()`))
/// distinct fragments (along with the original capsule and the corresponding secret key)
/// allows one to decrypt the original plaintext.
///
/// One can call [`KeyFrag::verify()`](`crate::KeyFrag::verify`)
/// before reencryption to check its integrity.
///
/// The result only depends on the capsule and the key fragment,
/// so reencrypting twice gives identical fragments.
pub fn reencrypt(capsule: &Capsule, verified_kfrag: VerifiedKeyFrag) -> VerifiedCapsuleFrag {
    VerifiedCapsuleFrag::reencrypted(capsule, verified_kfrag.as_kfrag())
}

/// Decrypts the ciphertext using previously reencrypted capsule fragments.
///
/// `receiving_sk` is the secret key whose associated public key was used in
/// [`generate_kfrags()`](`crate::generate_kfrags()`).
///
/// `delegating_pk` is the public key of the encrypting party.
/// Used to check the validity of decryption.
///
/// One can call [`CapsuleFrag::verify()`](`crate::CapsuleFrag::verify`)
/// before reencryption to check its integrity.
pub fn decrypt_reencrypted(
    receiving_sk: &SecretKey,
    delegating_pk: &PublicKey,
    capsule: &Capsule,
    verified_cfrags: impl IntoIterator<Item = VerifiedCapsuleFrag>,
    ciphertext: impl AsRef<[u8]>,
) -> Result<Vec<u8>, ReencryptionError> {
    let cfrags: Vec<CapsuleFrag> = verified_cfrags
        .into_iter()
        .map(VerifiedCapsuleFrag::unverify)
        .collect();
    let shared_point = capsule
        .open_reencrypted(receiving_sk, delegating_pk, &cfrags)
        .map_err(ReencryptionError::OnOpen)?;
    let dem = dem_from_shared_point(&shared_point);
    dem.decrypt(ciphertext, &capsule.to_array())
        .map_err(ReencryptionError::OnDecryption)
}
