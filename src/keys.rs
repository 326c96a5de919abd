use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};

use generic_array::GenericArray;
use k256::ecdsa::signature::{DigestSigner, DigestVerifier};
use k256::ecdsa::{Signature as BackendSignature, SigningKey, VerifyingKey};
use rand_core::{CryptoRng, RngCore};
use typenum::{U32, U64};
use zeroize::Zeroize;

#[cfg(feature = "default-rng")]
use rand_core::OsRng;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[cfg(feature = "serde-support")]
use crate::serde::{serde_deserialize, serde_serialize, Representation};

use crate::curve::{CurvePoint, NonZeroCurveScalar};
use crate::dem::kdf;
use crate::hashing::Hash as DigestHash;
use crate::hashing_ds::signature_digest;
use crate::secret_box::SecretBox;
use crate::traits::{
    fmt_public, fmt_secret, ConstructionError, DeserializableFromArray, DeserializationError,
    HasTypeName, RepresentableAsArray, SerializableToArray, SizeMismatchError,
};

/// ECDSA signature object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signature(BackendSignature);

impl RepresentableAsArray for Signature {
    type Size = U64;
}

impl SerializableToArray for Signature {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        let mut arr = GenericArray::<u8, Self::Size>::default();
        arr.copy_from_slice(&self.0.to_bytes());
        arr
    }
}

impl DeserializableFromArray for Signature {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        BackendSignature::from_slice(arr.as_slice())
            .map(Self)
            .map_err(|_| ConstructionError::new("Signature", "Internal backend error"))
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_serialize(self, serializer, Representation::Base64)
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_deserialize(deserializer, Representation::Base64)
    }
}

impl HasTypeName for Signature {
    fn type_name() -> &'static str {
        "Signature"
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_public::<Self>(self, f)
    }
}

impl Signature {
    /// Verifies that the given message was signed with the secret counterpart of the given key.
    /// The message is hashed internally.
    pub fn verify(&self, verifying_pk: &PublicKey, message: &[u8]) -> bool {
        // A public key is never the identity, so this only fails on a malformed key.
        let verifying_key = match VerifyingKey::from_affine(verifying_pk.to_point().to_affine()) {
            Ok(key) => key,
            Err(_) => return false,
        };
        let digest = signature_digest(message).digest();
        verifying_key.verify_digest(digest, &self.0).is_ok()
    }
}

/// A secret key.
#[derive(Clone)]
pub struct SecretKey(SecretBox<NonZeroCurveScalar>);

impl SecretKey {
    fn new(scalar: SecretBox<NonZeroCurveScalar>) -> Self {
        Self(scalar)
    }

    /// Creates a secret key using the given RNG.
    pub fn random_with_rng(rng: &mut (impl CryptoRng + RngCore)) -> Self {
        Self::new(SecretBox::new(NonZeroCurveScalar::random(rng)))
    }

    /// Creates a secret key using the default RNG.
    #[cfg(feature = "default-rng")]
    #[cfg_attr(docsrs, doc(cfg(feature = "default-rng")))]
    pub fn random() -> Self {
        Self::random_with_rng(&mut OsRng)
    }

    /// Returns a public key corresponding to this secret key.
    pub fn public_key(&self) -> PublicKey {
        let g = CurvePoint::generator();
        PublicKey(&g * self.0.as_secret())
    }

    pub(crate) fn to_secret_scalar(&self) -> SecretBox<NonZeroCurveScalar> {
        self.0.clone()
    }

    /// Serializes the secret key into big-endian bytes.
    /// The result is wrapped so that it is zeroized once dropped.
    pub fn to_be_bytes(&self) -> SecretBox<[u8; 32]> {
        let mut arr = self.0.as_secret().to_array();
        let mut bytes = SecretBox::new([0u8; 32]);
        bytes.as_mut_secret().copy_from_slice(&arr);
        arr.as_mut_slice().zeroize();
        bytes
    }

    /// Restores a secret key from big-endian bytes.
    /// Fails if the bytes do not represent a non-zero scalar below the curve order.
    pub fn try_from_be_bytes(data: impl AsRef<[u8]>) -> Result<Self, DeserializationError> {
        let data = data.as_ref();
        if data.len() != NonZeroCurveScalar::serialized_size() {
            return Err(DeserializationError::SizeMismatch(SizeMismatchError::new(
                data.len(),
                NonZeroCurveScalar::serialized_size(),
            )));
        }
        let arr = GenericArray::<u8, U32>::from_slice(data);
        let scalar = NonZeroCurveScalar::from_array(arr)
            .map_err(DeserializationError::ConstructionFailure)?;
        Ok(Self::new(SecretBox::new(scalar)))
    }
}

impl HasTypeName for SecretKey {
    fn type_name() -> &'static str {
        "SecretKey"
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_secret::<Self>(f)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_secret::<Self>(f)
    }
}

/// An object used to sign messages.
/// For security reasons it cannot be serialized.
#[derive(Clone)]
pub struct Signer(SecretKey);

impl Signer {
    /// Creates a new signer out of a secret key.
    pub fn new(sk: SecretKey) -> Self {
        Self(sk)
    }

    /// Signs the given message.
    /// Nonces are derived deterministically (RFC 6979),
    /// so signing the same message twice produces the same signature.
    pub fn sign(&self, message: &[u8]) -> Signature {
        let signing_key = SigningKey::from(*self.0 .0.as_secret().as_backend_scalar());
        let digest = signature_digest(message).digest();
        let signature: BackendSignature = signing_key.sign_digest(digest);
        Signature(signature)
    }

    /// Returns the public key that can be used to verify the signatures produced by this signer.
    pub fn verifying_key(&self) -> PublicKey {
        self.0.public_key()
    }
}

impl HasTypeName for Signer {
    fn type_name() -> &'static str {
        "Signer"
    }
}

impl fmt::Display for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_secret::<Self>(f)
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_secret::<Self>(f)
    }
}

/// A public key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey(CurvePoint);

impl PublicKey {
    pub(crate) fn to_point(self) -> CurvePoint {
        self.0
    }

    /// Returns the key as a 33-byte SEC1 compressed point.
    pub fn to_compressed_bytes(&self) -> Box<[u8]> {
        self.to_array().as_slice().into()
    }

    /// Restores a key from a SEC1 compressed point.
    pub fn try_from_compressed_bytes(data: &[u8]) -> Result<Self, DeserializationError> {
        Self::from_bytes(data)
    }
}

impl RepresentableAsArray for PublicKey {
    type Size = <CurvePoint as RepresentableAsArray>::Size;
}

impl SerializableToArray for PublicKey {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.0.to_array()
    }
}

impl DeserializableFromArray for PublicKey {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        CurvePoint::from_array(arr).map(Self)
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_serialize(self, serializer, Representation::Hex)
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_deserialize(deserializer, Representation::Hex)
    }
}

impl HasTypeName for PublicKey {
    fn type_name() -> &'static str {
        "PublicKey"
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_public::<Self>(self, f)
    }
}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_array().as_slice().hash(state);
    }
}

const FACTORY_SEED_SIZE: usize = 32;

/// This class handles keyring material for Umbral, by allowing deterministic
/// derivation of [`SecretKey`] objects based on labels.
///
/// Don't use this key material directly as a key.
#[derive(Clone)]
pub struct SecretKeyFactory(SecretBox<[u8; FACTORY_SEED_SIZE]>);

impl SecretKeyFactory {
    /// Creates a secret key factory using the given RNG.
    pub fn random_with_rng(rng: &mut (impl CryptoRng + RngCore)) -> Self {
        let mut seed = SecretBox::new([0u8; FACTORY_SEED_SIZE]);
        rng.fill_bytes(seed.as_mut_secret());
        Self(seed)
    }

    /// Creates a secret key factory using the default RNG.
    #[cfg(feature = "default-rng")]
    #[cfg_attr(docsrs, doc(cfg(feature = "default-rng")))]
    pub fn random() -> Self {
        Self::random_with_rng(&mut OsRng)
    }

    /// Returns the seed size required by [`from_seed`](`Self::from_seed`).
    pub fn seed_size() -> usize {
        FACTORY_SEED_SIZE
    }

    /// Creates a secret key factory from secret key material.
    /// The seed must be exactly [`seed_size`](`Self::seed_size`) bytes long
    /// and come from a cryptographically secure source.
    pub fn from_seed(seed: &[u8]) -> Result<Self, SizeMismatchError> {
        if seed.len() != FACTORY_SEED_SIZE {
            return Err(SizeMismatchError::new(seed.len(), FACTORY_SEED_SIZE));
        }
        let mut stored = SecretBox::new([0u8; FACTORY_SEED_SIZE]);
        stored.as_mut_secret().copy_from_slice(seed);
        Ok(Self(stored))
    }

    fn derive_bytes(&self, prefix: &[u8], label: &[u8]) -> SecretBox<[u8; FACTORY_SEED_SIZE]> {
        let mut info = Vec::with_capacity(prefix.len() + label.len());
        info.extend_from_slice(prefix);
        info.extend_from_slice(label);
        kdf(self.0.as_secret(), None, Some(&info))
    }

    /// Creates a `SecretKey` deterministically from the given label.
    pub fn make_secret(&self, label: &[u8]) -> SecretKey {
        let key_bytes = self.derive_bytes(b"KEY_DERIVATION/", label);
        let digest = DigestHash::new_with_dst(b"KEY_DERIVATION")
            .chain_bytes(key_bytes.as_secret())
            .digest();
        SecretKey::new(SecretBox::new(NonZeroCurveScalar::from_digest(digest)))
    }

    /// Creates a `SecretKeyFactory` deterministically from the given label.
    pub fn make_factory(&self, label: &[u8]) -> Self {
        Self(self.derive_bytes(b"FACTORY_DERIVATION/", label))
    }
}

impl HasTypeName for SecretKeyFactory {
    fn type_name() -> &'static str {
        "SecretKeyFactory"
    }
}

impl fmt::Display for SecretKeyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_secret::<Self>(f)
    }
}

impl fmt::Debug for SecretKeyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_secret::<Self>(f)
    }
}
