use alloc::vec::Vec;
use core::fmt;

use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use generic_array::typenum::Unsigned;
use hkdf::Hkdf;
use rand_core::{CryptoRng, RngCore};
use sha2::Sha256;
use tracing::debug;

use crate::secret_box::SecretBox;

/// Size of the symmetric key.
pub(crate) const KEY_SIZE: usize = 32;

type NonceSize = <XChaCha20Poly1305 as AeadCore>::NonceSize;
type TagSize = <XChaCha20Poly1305 as AeadCore>::TagSize;

/// Errors that can happen during symmetric encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionError {
    /// Given plaintext is too large for the backend to handle.
    PlaintextTooLarge,
}

impl fmt::Display for EncryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlaintextTooLarge => write!(f, "Plaintext is too large to encrypt"),
        }
    }
}

/// Errors that can happen during symmetric decryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptionError {
    /// Ciphertext (which should be prepended by the nonce) is shorter than the nonce length.
    CiphertextTooShort,
    /// The ciphertext and the attached authentication data are inconsistent.
    /// This can happen if:
    /// - an incorrect key is used,
    /// - the ciphertext is modified or cut short,
    /// - an incorrect authentication data is provided on decryption.
    AuthenticationFailed,
}

impl fmt::Display for DecryptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CiphertextTooShort => write!(f, "The ciphertext must include the nonce"),
            Self::AuthenticationFailed => write!(
                f,
                "Decryption of ciphertext failed: \
                either someone tampered with the ciphertext or \
                you are using an incorrect decryption key."
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncryptionError {}

#[cfg(feature = "std")]
impl std::error::Error for DecryptionError {}

/// Derives a `KEY_SIZE`-byte secret from the input key material with HKDF-SHA256.
pub(crate) fn kdf(
    seed: &[u8],
    salt: Option<&[u8]>,
    info: Option<&[u8]>,
) -> SecretBox<[u8; KEY_SIZE]> {
    let hk = Hkdf::<Sha256>::new(salt, seed);

    let mut okm = SecretBox::new([0u8; KEY_SIZE]);

    let def_info = info.unwrap_or(&[]);

    // The output size is fixed and well below the HKDF limit of 255 hash lengths.
    hk.expand(def_info, okm.as_mut_secret())
        .expect("KEY_SIZE is a valid HKDF output length");

    okm
}

/// Data encapsulation mechanism: an AEAD keyed by a secret derived from a shared point.
#[allow(clippy::upper_case_acronyms)]
pub(crate) struct DEM {
    cipher: XChaCha20Poly1305,
}

impl DEM {
    pub fn new(key_seed: &[u8]) -> Self {
        let key_bytes = kdf(key_seed, None, Some(b"DEM_KEY".as_ref()));
        let key = Key::from_slice(key_bytes.as_secret());
        let cipher = XChaCha20Poly1305::new(key);
        Self { cipher }
    }

    pub fn encrypt(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
        data: &[u8],
        authenticated_data: &[u8],
    ) -> Result<Vec<u8>, EncryptionError> {
        let mut nonce = XNonce::default();
        rng.fill_bytes(&mut nonce);

        let payload = Payload {
            msg: data,
            aad: authenticated_data,
        };

        let encrypted = self
            .cipher
            .encrypt(&nonce, payload)
            .map_err(|_| EncryptionError::PlaintextTooLarge)?;

        let mut result = Vec::with_capacity(nonce.len() + encrypted.len());
        result.extend_from_slice(&nonce);
        result.extend_from_slice(&encrypted);
        Ok(result)
    }

    pub fn decrypt(
        &self,
        ciphertext: impl AsRef<[u8]>,
        authenticated_data: &[u8],
    ) -> Result<Vec<u8>, DecryptionError> {
        let nonce_size = NonceSize::to_usize();
        let buf_size = ciphertext.as_ref().len();

        if buf_size < nonce_size + TagSize::to_usize() {
            debug!(buf_size, "ciphertext is shorter than nonce and tag");
            return Err(DecryptionError::CiphertextTooShort);
        }

        let (nonce_bytes, encrypted) = ciphertext.as_ref().split_at(nonce_size);
        let nonce = XNonce::from_slice(nonce_bytes);
        let payload = Payload {
            msg: encrypted,
            aad: authenticated_data,
        };
        self.cipher.decrypt(nonce, payload).map_err(|_| {
            debug!("symmetric authentication failed");
            DecryptionError::AuthenticationFailed
        })
    }
}
