use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use generic_array::sequence::Concat;
use generic_array::GenericArray;
use rand_core::{CryptoRng, RngCore};
use tracing::debug;
use typenum::{op, U1, U32};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[cfg(feature = "serde-support")]
use crate::serde::{serde_deserialize, serde_serialize, Representation};

use crate::curve::{CurvePoint, CurveScalar, NonZeroCurveScalar};
use crate::hashing_ds::{hash_to_polynomial_arg, hash_to_shared, kfrag_signature_message};
use crate::keys::{PublicKey, SecretKey, Signature, Signer};
use crate::params::Parameters;
use crate::secret_box::SecretBox;
use crate::traits::{
    fmt_public, ConstructionError, DeserializableFromArray, DeserializationError, HasTypeName,
    RepresentableAsArray, SerializableToArray,
};

/// A random identifier of a key fragment.
/// Also defines the position of the fragment on the delegation polynomial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyFragID([u8; 32]);

impl KeyFragID {
    pub(crate) fn random(rng: &mut (impl CryptoRng + RngCore)) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl AsRef<[u8]> for KeyFragID {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl RepresentableAsArray for KeyFragID {
    type Size = U32;
}

impl SerializableToArray for KeyFragID {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        GenericArray::<u8, Self::Size>::from(self.0)
    }
}

impl DeserializableFromArray for KeyFragID {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(arr.as_slice());
        Ok(Self(bytes))
    }
}

/// A proof that a [`KeyFrag`] was issued by the holder of the signing key.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyFragProof {
    pub(crate) commitment: CurvePoint,
    signature_for_proxy: Signature,
    pub(crate) signature_for_receiver: Signature,
    delegating_key_signed: bool,
    receiving_key_signed: bool,
}

type PointSize = <CurvePoint as RepresentableAsArray>::Size;
type ScalarSize = <CurveScalar as RepresentableAsArray>::Size;
type SignatureSize = <Signature as RepresentableAsArray>::Size;
type KeyFragIDSize = <KeyFragID as RepresentableAsArray>::Size;
type ThresholdSize = <u32 as RepresentableAsArray>::Size;
type KeyFragProofSize = <KeyFragProof as RepresentableAsArray>::Size;

impl RepresentableAsArray for KeyFragProof {
    type Size = op!(PointSize + SignatureSize + SignatureSize + U1 + U1);
}

impl SerializableToArray for KeyFragProof {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.commitment
            .to_array()
            .concat(self.signature_for_proxy.to_array())
            .concat(self.signature_for_receiver.to_array())
            .concat(self.delegating_key_signed.to_array())
            .concat(self.receiving_key_signed.to_array())
    }
}

impl DeserializableFromArray for KeyFragProof {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        let (commitment, rest) = CurvePoint::take(*arr)?;
        let (signature_for_proxy, rest) = Signature::take(rest)?;
        let (signature_for_receiver, rest) = Signature::take(rest)?;
        let (delegating_key_signed, rest) = bool::take(rest)?;
        let receiving_key_signed = bool::take_last(rest)?;
        Ok(Self {
            commitment,
            signature_for_proxy,
            signature_for_receiver,
            delegating_key_signed,
            receiving_key_signed,
        })
    }
}

impl KeyFragProof {
    fn from_base(
        base: &KeyFragBase<'_>,
        kfrag_id: &KeyFragID,
        kfrag_key: &CurveScalar,
        sign_delegating_key: bool,
        sign_receiving_key: bool,
    ) -> Self {
        let commitment = &base.params.u * kfrag_key;

        let signature_for_receiver = base.signer.sign(&kfrag_signature_message(
            kfrag_id,
            &commitment,
            &base.precursor,
            base.threshold,
            Some(&base.delegating_pk),
            Some(&base.receiving_pk),
        ));

        let maybe_delegating_pk = if sign_delegating_key {
            Some(&base.delegating_pk)
        } else {
            None
        };

        let maybe_receiving_pk = if sign_receiving_key {
            Some(&base.receiving_pk)
        } else {
            None
        };

        let signature_for_proxy = base.signer.sign(&kfrag_signature_message(
            kfrag_id,
            &commitment,
            &base.precursor,
            base.threshold,
            maybe_delegating_pk,
            maybe_receiving_pk,
        ));

        Self {
            commitment,
            signature_for_proxy,
            signature_for_receiver,
            delegating_key_signed: sign_delegating_key,
            receiving_key_signed: sign_receiving_key,
        }
    }
}

/// A fragment of the delegating party's key used to create a [`CapsuleFrag`](`crate::CapsuleFrag`).
#[derive(Clone, Debug, PartialEq)]
pub struct KeyFrag {
    pub(crate) params: Parameters,
    pub(crate) id: KeyFragID,
    pub(crate) key: CurveScalar,
    pub(crate) precursor: CurvePoint,
    pub(crate) threshold: u32,
    pub(crate) proof: KeyFragProof,
}

impl RepresentableAsArray for KeyFrag {
    type Size = op!(KeyFragIDSize + ScalarSize + PointSize + ThresholdSize + KeyFragProofSize);
}

impl SerializableToArray for KeyFrag {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.id
            .to_array()
            .concat(self.key.to_array())
            .concat(self.precursor.to_array())
            .concat(self.threshold.to_array())
            .concat(self.proof.to_array())
    }
}

impl DeserializableFromArray for KeyFrag {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        let params = Parameters::new();
        let (id, rest) = KeyFragID::take(*arr)?;
        let (key, rest) = CurveScalar::take(rest)?;
        let (precursor, rest) = CurvePoint::take(rest)?;
        let (threshold, rest) = u32::take(rest)?;
        let proof = KeyFragProof::take_last(rest)?;
        Ok(Self {
            params,
            id,
            key,
            precursor,
            threshold,
            proof,
        })
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl Serialize for KeyFrag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_serialize(self, serializer, Representation::Base64)
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl<'de> Deserialize<'de> for KeyFrag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_deserialize(deserializer, Representation::Base64)
    }
}

impl HasTypeName for KeyFrag {
    fn type_name() -> &'static str {
        "KeyFrag"
    }
}

impl fmt::Display for KeyFrag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_public::<Self>(self, f)
    }
}

/// Possible errors that can be returned by [`KeyFrag::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFragVerificationError {
    /// Inconsistent internal state leading to commitment verification failure.
    IncorrectCommitment,
    /// A delegating key was included in the signature when [`KeyFrag`] was created,
    /// but no delegating key was provided during verification.
    DelegatingKeyNotProvided,
    /// A receiving key was included in the signature when [`KeyFrag`] was created,
    /// but no receiving key was provided during verification.
    ReceivingKeyNotProvided,
    /// Inconsistent internal state leading to signature verification failure.
    IncorrectSignature,
}

impl fmt::Display for KeyFragVerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncorrectCommitment => write!(f, "Invalid kfrag commitment"),
            Self::DelegatingKeyNotProvided => write!(
                f,
                "A signature of a delegating key was included in this kfrag, {}",
                "but the key is not provided"
            ),
            Self::ReceivingKeyNotProvided => write!(
                f,
                "A signature of a receiving key was included in this kfrag, {}",
                "but the key is not provided"
            ),
            Self::IncorrectSignature => write!(f, "Failed to verify the kfrag signature"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KeyFragVerificationError {}

/// Possible errors that can be returned by [`generate_kfrags`](crate::generate_kfrags).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFragGenerationError {
    /// The threshold is zero, exceeds the number of shares,
    /// or does not fit into 32 bits.
    InvalidThreshold {
        /// The requested threshold.
        threshold: usize,
        /// The requested number of shares.
        shares: usize,
    },
}

impl fmt::Display for KeyFragGenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidThreshold { threshold, shares } => write!(
                f,
                "Invalid threshold {} for {} shares: must satisfy 1 <= threshold <= shares",
                threshold, shares
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KeyFragGenerationError {}

impl KeyFrag {
    /// Returns the identifier of this fragment.
    pub fn id(&self) -> KeyFragID {
        self.id
    }

    /// Returns the number of fragments required for decryption.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    fn from_base(
        rng: &mut (impl CryptoRng + RngCore),
        base: &KeyFragBase<'_>,
        sign_delegating_key: bool,
        sign_receiving_key: bool,
    ) -> Self {
        let kfrag_id = KeyFragID::random(rng);

        // The index of the re-encryption key share (which in Shamir's Secret
        // Sharing corresponds to x in the tuple (x, f(x)), with f being the
        // generating polynomial), is used to prevent reconstruction of the
        // re-encryption key without Bob's intervention
        let share_index = hash_to_polynomial_arg(
            &base.precursor,
            &base.receiving_pk.to_point(),
            base.dh_point.as_secret(),
            &kfrag_id,
        );

        // The re-encryption key share is the result of evaluating the generating
        // polynomial for the index value
        let rk = poly_eval(&base.coefficients, &share_index);

        let proof = KeyFragProof::from_base(
            base,
            &kfrag_id,
            &rk,
            sign_delegating_key,
            sign_receiving_key,
        );

        Self {
            params: base.params,
            id: kfrag_id,
            key: rk,
            precursor: base.precursor,
            threshold: base.threshold,
            proof,
        }
    }

    /// Verifies the integrity of the key fragment, given the signing key,
    /// and (optionally) the delegating party's and receiving party's keys.
    ///
    /// If [`generate_kfrags()`](`crate::generate_kfrags()`) was called with `true`
    /// for `sign_delegating_key` or `sign_receiving_key`, and the respective key
    /// is not provided, the verification fails.
    /// A key whose signing flag was `false` is ignored even if provided.
    pub fn verify(
        self,
        verifying_pk: &PublicKey,
        maybe_delegating_pk: Option<&PublicKey>,
        maybe_receiving_pk: Option<&PublicKey>,
    ) -> Result<VerifiedKeyFrag, (KeyFragVerificationError, Self)> {
        let u = self.params.u;

        let kfrag_id = self.id;
        let key = self.key;
        let commitment = self.proof.commitment;
        let precursor = self.precursor;

        // We check that the commitment is well-formed
        if commitment != &u * &key {
            debug!(kfrag = %self, "kfrag commitment mismatch");
            return Err((KeyFragVerificationError::IncorrectCommitment, self));
        }

        // A shortcut, perhaps not necessary

        if maybe_delegating_pk.is_none() && self.proof.delegating_key_signed {
            return Err((KeyFragVerificationError::DelegatingKeyNotProvided, self));
        }

        if maybe_receiving_pk.is_none() && self.proof.receiving_key_signed {
            return Err((KeyFragVerificationError::ReceivingKeyNotProvided, self));
        }

        // Check the signature

        let delegating_pk = if self.proof.delegating_key_signed {
            maybe_delegating_pk
        } else {
            None
        };

        let receiving_pk = if self.proof.receiving_key_signed {
            maybe_receiving_pk
        } else {
            None
        };

        let message = kfrag_signature_message(
            &kfrag_id,
            &commitment,
            &precursor,
            self.threshold,
            delegating_pk,
            receiving_pk,
        );
        if !self.proof.signature_for_proxy.verify(verifying_pk, &message) {
            debug!(kfrag = %self, "kfrag signature verification failed");
            return Err((KeyFragVerificationError::IncorrectSignature, self));
        }

        Ok(VerifiedKeyFrag { kfrag: self })
    }

    /// Explicitly skips verification.
    /// Useful in cases when the verifying keys are impossible to obtain independently.
    ///
    /// **Warning:** make sure you considered the implications of not enforcing verification.
    pub fn skip_verification(self) -> VerifiedKeyFrag {
        VerifiedKeyFrag { kfrag: self }
    }
}

/// Verified key fragment, good for reencryption.
/// Can be serialized, but cannot be deserialized directly.
/// It can only be obtained from [`KeyFrag::verify`] or [`KeyFrag::skip_verification`].
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedKeyFrag {
    kfrag: KeyFrag,
}

impl RepresentableAsArray for VerifiedKeyFrag {
    type Size = <KeyFrag as RepresentableAsArray>::Size;
}

impl SerializableToArray for VerifiedKeyFrag {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.kfrag.to_array()
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl Serialize for VerifiedKeyFrag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.kfrag.serialize(serializer)
    }
}

impl HasTypeName for VerifiedKeyFrag {
    fn type_name() -> &'static str {
        "VerifiedKeyFrag"
    }
}

impl fmt::Display for VerifiedKeyFrag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_public::<Self>(self, f)
    }
}

impl VerifiedKeyFrag {
    pub(crate) fn from_base(
        rng: &mut (impl CryptoRng + RngCore),
        base: &KeyFragBase<'_>,
        sign_delegating_key: bool,
        sign_receiving_key: bool,
    ) -> Self {
        Self {
            kfrag: KeyFrag::from_base(rng, base, sign_delegating_key, sign_receiving_key),
        }
    }

    /// Restores a verified keyfrag directly from serialized bytes,
    /// skipping [`KeyFrag::verify`] call.
    ///
    /// Intended for internal storage;
    /// make sure that the bytes come from a trusted source.
    pub fn from_verified_bytes(data: impl AsRef<[u8]>) -> Result<Self, DeserializationError> {
        KeyFrag::from_bytes(data).map(|kfrag| Self { kfrag })
    }

    /// Clears the verification status from the keyfrag.
    /// Useful for the cases where it needs to be put in the protocol structure
    /// containing [`KeyFrag`] types (since those are the ones
    /// that can be serialized/deserialized freely).
    pub fn unverify(self) -> KeyFrag {
        self.kfrag
    }

    pub(crate) fn as_kfrag(&self) -> &KeyFrag {
        &self.kfrag
    }
}

/// Everything shared between the fragments of a single delegation.
pub(crate) struct KeyFragBase<'a> {
    signer: &'a Signer,
    precursor: CurvePoint,
    dh_point: SecretBox<CurvePoint>,
    pub(crate) params: Parameters,
    delegating_pk: PublicKey,
    receiving_pk: PublicKey,
    threshold: u32,
    coefficients: Box<[SecretBox<CurveScalar>]>,
}

impl<'a> KeyFragBase<'a> {
    pub(crate) fn new(
        rng: &mut (impl CryptoRng + RngCore),
        delegating_sk: &SecretKey,
        receiving_pk: &PublicKey,
        signer: &'a Signer,
        threshold: u32,
    ) -> Self {
        let g = CurvePoint::generator();
        let params = Parameters::new();

        let delegating_pk = delegating_sk.public_key();

        let receiving_pk_point = receiving_pk.to_point();

        // The precursor point is used as an ephemeral public key in a DH key exchange,
        // and the resulting shared secret 'dh_point' is used to derive other secret values
        let private_precursor = SecretBox::new(NonZeroCurveScalar::random(rng));
        let precursor = &g * private_precursor.as_secret();

        let dh_point = SecretBox::new(&receiving_pk_point * private_precursor.as_secret());

        // Secret value 'd' allows to make Umbral non-interactive
        let d = SecretBox::new(hash_to_shared(
            &precursor,
            &receiving_pk_point,
            dh_point.as_secret(),
        ));

        // Coefficients of the generating polynomial
        // (the free term is the delegating key blinded by `d`)
        let inv_d = SecretBox::new(d.as_secret().invert());
        let delegating_sk_scalar = delegating_sk.to_secret_scalar();
        let coefficient0 = SecretBox::new(delegating_sk_scalar.as_secret() * inv_d.as_secret());

        let mut coefficients = Vec::<SecretBox<CurveScalar>>::with_capacity(threshold as usize);
        coefficients.push(coefficient0);
        for _i in 1..threshold {
            coefficients.push(SecretBox::new(CurveScalar::from(NonZeroCurveScalar::random(
                rng,
            ))));
        }

        Self {
            signer,
            precursor,
            dh_point,
            params,
            delegating_pk,
            receiving_pk: *receiving_pk,
            threshold,
            coefficients: coefficients.into_boxed_slice(),
        }
    }
}

// Evaluates the generating polynomial at `x` with Horner's method.
fn poly_eval(coeffs: &[SecretBox<CurveScalar>], x: &NonZeroCurveScalar) -> CurveScalar {
    let mut result: SecretBox<CurveScalar> = SecretBox::new(*coeffs[coeffs.len() - 1].as_secret());
    for i in (0..coeffs.len() - 1).rev() {
        // Keeping the intermediate results zeroized as well
        let temp = SecretBox::new(result.as_secret() * x);
        *result.as_mut_secret() = temp.as_secret() + coeffs[i].as_secret();
    }
    // This is not a secret anymore
    *result.as_secret()
}

#[cfg(test)]
mod tests {

    use alloc::boxed::Box;

    use super::{poly_eval, KeyFrag, KeyFragVerificationError, VerifiedKeyFrag};
    use crate::curve::{CurveScalar, NonZeroCurveScalar};
    use crate::secret_box::SecretBox;
    use crate::{
        generate_kfrags, DeserializableFromArray, PublicKey, RepresentableAsArray, SecretKey,
        SerializableToArray, Signer,
    };

    #[cfg(feature = "serde-support")]
    use crate::serde::tests::{check_deserialization, check_serialization};

    #[cfg(feature = "serde-support")]
    use crate::serde::Representation;

    fn prepare_kfrags(
        sign_delegating_key: bool,
        sign_receiving_key: bool,
    ) -> (PublicKey, PublicKey, PublicKey, Box<[VerifiedKeyFrag]>) {
        let delegating_sk = SecretKey::random();
        let delegating_pk = delegating_sk.public_key();

        let signer = Signer::new(SecretKey::random());
        let verifying_pk = signer.verifying_key();

        let receiving_sk = SecretKey::random();
        let receiving_pk = receiving_sk.public_key();

        let vkfrags = generate_kfrags(
            &delegating_sk,
            &receiving_pk,
            &signer,
            2,
            3,
            sign_delegating_key,
            sign_receiving_key,
        )
        .unwrap();

        (delegating_pk, receiving_pk, verifying_pk, vkfrags)
    }

    #[test]
    fn test_verify() {
        for sign_dk in [false, true].iter().copied() {
            for sign_rk in [false, true].iter().copied() {
                let (delegating_pk, receiving_pk, verifying_pk, vkfrags) =
                    prepare_kfrags(sign_dk, sign_rk);

                let kfrag_arr = vkfrags[0].to_array();
                let kfrag = KeyFrag::from_array(&kfrag_arr).unwrap();

                // Check that the kfrag serializes to the same thing as the verified kfrag
                assert_eq!(kfrag.to_array(), kfrag_arr);

                for supply_dk in [false, true].iter().copied() {
                    for supply_rk in [false, true].iter().copied() {
                        let maybe_dk = if supply_dk { Some(&delegating_pk) } else { None };
                        let maybe_rk = if supply_rk { Some(&receiving_pk) } else { None };
                        let res = kfrag.clone().verify(&verifying_pk, maybe_dk, maybe_rk);

                        let delegating_key_ok = (!sign_dk) || maybe_dk.is_some();
                        let receiving_key_ok = (!sign_rk) || maybe_rk.is_some();

                        if delegating_key_ok && receiving_key_ok {
                            assert_eq!(res.unwrap(), vkfrags[0]);
                        } else if !delegating_key_ok {
                            assert_eq!(
                                res.map_err(|(err, _)| err),
                                Err(KeyFragVerificationError::DelegatingKeyNotProvided)
                            );
                        } else {
                            assert_eq!(
                                res.map_err(|(err, _)| err),
                                Err(KeyFragVerificationError::ReceivingKeyNotProvided)
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_unsigned_keys_are_ignored() {
        let (_delegating_pk, _receiving_pk, verifying_pk, vkfrags) = prepare_kfrags(false, false);
        let kfrag = vkfrags[0].clone().unverify();
        let unrelated_pk = SecretKey::random().public_key();
        assert!(kfrag
            .verify(&verifying_pk, Some(&unrelated_pk), Some(&unrelated_pk))
            .is_ok());
    }

    #[test]
    fn test_wrong_keys() {
        let (delegating_pk, receiving_pk, verifying_pk, vkfrags) = prepare_kfrags(true, true);
        let kfrag = vkfrags[0].clone().unverify();
        let unrelated_pk = SecretKey::random().public_key();

        let res = kfrag
            .clone()
            .verify(&unrelated_pk, Some(&delegating_pk), Some(&receiving_pk));
        assert_eq!(
            res.map_err(|(err, _)| err),
            Err(KeyFragVerificationError::IncorrectSignature)
        );

        let res = kfrag
            .clone()
            .verify(&verifying_pk, Some(&unrelated_pk), Some(&receiving_pk));
        assert_eq!(
            res.map_err(|(err, _)| err),
            Err(KeyFragVerificationError::IncorrectSignature)
        );

        // The kfrag is handed back on failure
        let res = kfrag
            .clone()
            .verify(&verifying_pk, Some(&delegating_pk), Some(&unrelated_pk));
        let (_err, returned) = res.unwrap_err();
        assert_eq!(returned, kfrag);
    }

    #[test]
    fn test_tampered_key() {
        let (delegating_pk, receiving_pk, verifying_pk, vkfrags) = prepare_kfrags(true, true);
        let mut kfrag = vkfrags[0].clone().unverify();
        kfrag.key = &kfrag.key + &CurveScalar::one();
        let res = kfrag.verify(&verifying_pk, Some(&delegating_pk), Some(&receiving_pk));
        assert_eq!(
            res.map_err(|(err, _)| err),
            Err(KeyFragVerificationError::IncorrectCommitment)
        );
    }

    #[test]
    fn test_tampered_threshold() {
        let (delegating_pk, receiving_pk, verifying_pk, vkfrags) = prepare_kfrags(true, true);
        let mut kfrag = vkfrags[0].clone().unverify();
        kfrag.threshold = 1;
        let res = kfrag.verify(&verifying_pk, Some(&delegating_pk), Some(&receiving_pk));
        assert_eq!(
            res.map_err(|(err, _)| err),
            Err(KeyFragVerificationError::IncorrectSignature)
        );
    }

    #[test]
    fn test_serialized_size() {
        let (_delegating_pk, _receiving_pk, _verifying_pk, vkfrags) = prepare_kfrags(true, true);
        assert_eq!(KeyFrag::serialized_size(), 264);
        assert_eq!(vkfrags[0].to_array().len(), 264);
    }

    #[test]
    fn test_from_verified_bytes() {
        let (_delegating_pk, _receiving_pk, _verifying_pk, vkfrags) = prepare_kfrags(true, false);
        let bytes = vkfrags[1].to_array();
        let vkfrag_back = VerifiedKeyFrag::from_verified_bytes(&bytes).unwrap();
        assert_eq!(vkfrag_back, vkfrags[1]);
        assert!(VerifiedKeyFrag::from_verified_bytes(&bytes[1..]).is_err());
    }

    #[test]
    fn test_poly_eval() {
        // f(x) = 3 + 2x + x^2
        let coeffs = [3u32, 2, 1]
            .iter()
            .map(|c| SecretBox::new(CurveScalar::from_u32(*c)))
            .collect::<alloc::vec::Vec<_>>();
        let x = NonZeroCurveScalar::from_array(&CurveScalar::from_u32(2).to_array()).unwrap();
        assert_eq!(poly_eval(&coeffs, &x), CurveScalar::from_u32(11));
    }

    #[cfg(feature = "serde-support")]
    #[test]
    fn test_serde_serialization() {
        let (_delegating_pk, _receiving_pk, _verifying_pk, vkfrags) = prepare_kfrags(true, true);

        let vkfrag = vkfrags[0].clone();
        let kfrag = KeyFrag::from_array(&vkfrag.to_array()).unwrap();

        check_serialization(&kfrag, Representation::Base64);
        check_deserialization(&kfrag);

        // A verified kfrag is written the same way as an unverified one
        assert_eq!(
            serde_json::to_string(&vkfrag).unwrap(),
            serde_json::to_string(&kfrag).unwrap()
        );
    }
}
