use core::fmt;

use generic_array::sequence::Concat;
use generic_array::GenericArray;
use tracing::{debug, trace};
use typenum::op;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::capsule::Capsule;
use crate::curve::{CurvePoint, CurveScalar};
use crate::hashing_ds::{hash_to_cfrag_nonce, hash_to_cfrag_verification, kfrag_signature_message};
use crate::key_frag::{KeyFrag, KeyFragID};
use crate::keys::{PublicKey, Signature};
use crate::params::Parameters;
use crate::secret_box::SecretBox;
use crate::traits::{
    fmt_public, ConstructionError, DeserializableFromArray, DeserializationError, HasTypeName,
    RepresentableAsArray, SerializableToArray,
};

#[cfg(feature = "serde-support")]
use crate::serde::{serde_deserialize, serde_serialize, Representation};

/// A proof that a [`CapsuleFrag`] was produced from a genuine [`KeyFrag`].
#[derive(Clone, Debug, PartialEq)]
pub struct CapsuleFragProof {
    point_e2: CurvePoint,
    point_v2: CurvePoint,
    kfrag_commitment: CurvePoint,
    kfrag_pok: CurvePoint,
    signature: CurveScalar,
    kfrag_signature: Signature,
}

type PointSize = <CurvePoint as RepresentableAsArray>::Size;
type ScalarSize = <CurveScalar as RepresentableAsArray>::Size;
type SignatureSize = <Signature as RepresentableAsArray>::Size;
type KeyFragIDSize = <KeyFragID as RepresentableAsArray>::Size;
type ThresholdSize = <u32 as RepresentableAsArray>::Size;
type CapsuleFragProofSize =
    op!(PointSize + PointSize + PointSize + PointSize + ScalarSize + SignatureSize);

impl RepresentableAsArray for CapsuleFragProof {
    type Size = CapsuleFragProofSize;
}

impl SerializableToArray for CapsuleFragProof {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.point_e2
            .to_array()
            .concat(self.point_v2.to_array())
            .concat(self.kfrag_commitment.to_array())
            .concat(self.kfrag_pok.to_array())
            .concat(self.signature.to_array())
            .concat(self.kfrag_signature.to_array())
    }
}

impl DeserializableFromArray for CapsuleFragProof {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        let (point_e2, rest) = CurvePoint::take(*arr)?;
        let (point_v2, rest) = CurvePoint::take(rest)?;
        let (kfrag_commitment, rest) = CurvePoint::take(rest)?;
        let (kfrag_pok, rest) = CurvePoint::take(rest)?;
        let (signature, rest) = CurveScalar::take(rest)?;
        let kfrag_signature = Signature::take_last(rest)?;
        Ok(Self {
            point_e2,
            point_v2,
            kfrag_commitment,
            kfrag_pok,
            signature,
            kfrag_signature,
        })
    }
}

impl CapsuleFragProof {
    #[allow(clippy::many_single_char_names)]
    fn from_kfrag_and_cfrag(
        capsule: &Capsule,
        kfrag: &KeyFrag,
        cfrag_e1: &CurvePoint,
        cfrag_v1: &CurvePoint,
    ) -> Self {
        let params = kfrag.params;

        let rk = kfrag.key;
        let t = SecretBox::new(hash_to_cfrag_nonce(
            &rk,
            &kfrag.id,
            &capsule.point_e,
            &capsule.point_v,
        ));

        // Here are the formulaic constituents shared with `CapsuleFrag::verify()`.

        let e = capsule.point_e;
        let v = capsule.point_v;

        let e1 = cfrag_e1;
        let v1 = cfrag_v1;

        let u = params.u;
        let u1 = kfrag.proof.commitment;

        let e2 = &e * t.as_secret();
        let v2 = &v * t.as_secret();
        let u2 = &u * t.as_secret();

        let h = hash_to_cfrag_verification(&[&e, e1, &e2, &v, v1, &v2, &u, &u1, &u2]);

        let z3 = &(&rk * &h) + t.as_secret();

        Self {
            point_e2: e2,
            point_v2: v2,
            kfrag_commitment: u1,
            kfrag_pok: u2,
            signature: z3,
            kfrag_signature: kfrag.proof.signature_for_receiver.clone(),
        }
    }
}

/// Possible errors that can be returned by [`CapsuleFrag::verify`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CapsuleFragVerificationError {
    /// Inconsistent internal state leading to signature verification failure.
    IncorrectKeyFragSignature,
    /// Inconsistent internal state leading to commitment verification failure.
    IncorrectReencryption,
}

impl fmt::Display for CapsuleFragVerificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncorrectKeyFragSignature => write!(f, "Invalid KeyFrag signature"),
            Self::IncorrectReencryption => write!(f, "Failed to verify reencryption proof"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CapsuleFragVerificationError {}

/// A reencrypted fragment of a [`Capsule`] created by a proxy.
#[derive(Clone, Debug, PartialEq)]
pub struct CapsuleFrag {
    pub(crate) point_e1: CurvePoint,
    pub(crate) point_v1: CurvePoint,
    pub(crate) kfrag_id: KeyFragID,
    pub(crate) precursor: CurvePoint,
    pub(crate) threshold: u32,
    pub(crate) proof: CapsuleFragProof,
}

impl RepresentableAsArray for CapsuleFrag {
    type Size = op!(
        PointSize + PointSize + KeyFragIDSize + PointSize + ThresholdSize + CapsuleFragProofSize
    );
}

impl SerializableToArray for CapsuleFrag {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.point_e1
            .to_array()
            .concat(self.point_v1.to_array())
            .concat(self.kfrag_id.to_array())
            .concat(self.precursor.to_array())
            .concat(self.threshold.to_array())
            .concat(self.proof.to_array())
    }
}

impl DeserializableFromArray for CapsuleFrag {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        let (point_e1, rest) = CurvePoint::take(*arr)?;
        let (point_v1, rest) = CurvePoint::take(rest)?;
        let (kfrag_id, rest) = KeyFragID::take(rest)?;
        let (precursor, rest) = CurvePoint::take(rest)?;
        let (threshold, rest) = u32::take(rest)?;
        let proof = CapsuleFragProof::take_last(rest)?;
        Ok(Self {
            point_e1,
            point_v1,
            kfrag_id,
            precursor,
            threshold,
            proof,
        })
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl Serialize for CapsuleFrag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_serialize(self, serializer, Representation::Base64)
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl<'de> Deserialize<'de> for CapsuleFrag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_deserialize(deserializer, Representation::Base64)
    }
}

impl HasTypeName for CapsuleFrag {
    fn type_name() -> &'static str {
        "CapsuleFrag"
    }
}

impl fmt::Display for CapsuleFrag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_public::<Self>(self, f)
    }
}

impl CapsuleFrag {
    /// Returns the identifier of the key fragment this fragment was created with.
    pub fn kfrag_id(&self) -> KeyFragID {
        self.kfrag_id
    }

    fn reencrypted(capsule: &Capsule, kfrag: &KeyFrag) -> Self {
        let rk = kfrag.key;
        let e1 = &capsule.point_e * &rk;
        let v1 = &capsule.point_v * &rk;
        let proof = CapsuleFragProof::from_kfrag_and_cfrag(capsule, kfrag, &e1, &v1);

        trace!(threshold = kfrag.threshold, "capsule reencrypted");

        Self {
            point_e1: e1,
            point_v1: v1,
            kfrag_id: kfrag.id,
            precursor: kfrag.precursor,
            threshold: kfrag.threshold,
            proof,
        }
    }

    /// Verifies the integrity of the capsule fragment, given the original capsule,
    /// the delegating party's key, the receiving party's key, and the signing key.
    #[allow(clippy::many_single_char_names)]
    pub fn verify(
        self,
        capsule: &Capsule,
        verifying_pk: &PublicKey,
        delegating_pk: &PublicKey,
        receiving_pk: &PublicKey,
    ) -> Result<VerifiedCapsuleFrag, (CapsuleFragVerificationError, Self)> {
        let params = Parameters::new();

        // Here are the formulaic constituents shared with
        // `CapsuleFragProof::from_kfrag_and_cfrag`.

        let e = capsule.point_e;
        let v = capsule.point_v;

        let e1 = self.point_e1;
        let v1 = self.point_v1;

        let e2 = self.proof.point_e2;
        let v2 = self.proof.point_v2;

        let u = params.u;
        let u1 = self.proof.kfrag_commitment;
        let u2 = self.proof.kfrag_pok;

        // We check that the commitment to the reencryption key was signed
        // together with both keys, the precursor and the threshold.
        let kfrag_message = kfrag_signature_message(
            &self.kfrag_id,
            &u1,
            &self.precursor,
            self.threshold,
            Some(delegating_pk),
            Some(receiving_pk),
        );

        if !self.proof.kfrag_signature.verify(verifying_pk, &kfrag_message) {
            debug!(cfrag = %self, "kfrag signature in the cfrag is invalid");
            return Err((CapsuleFragVerificationError::IncorrectKeyFragSignature, self));
        }

        let h = hash_to_cfrag_verification(&[&e, &e1, &e2, &v, &v1, &v2, &u, &u1, &u2]);

        let z = self.proof.signature;

        let correct_reencryption_of_e = &e * &z == &e2 + &(&e1 * &h);
        let correct_reencryption_of_v = &v * &z == &v2 + &(&v1 * &h);
        let correct_rk_commitment = &u * &z == &u2 + &(&u1 * &h);

        if !(correct_reencryption_of_e & correct_reencryption_of_v & correct_rk_commitment) {
            debug!(cfrag = %self, "reencryption proof is invalid");
            return Err((CapsuleFragVerificationError::IncorrectReencryption, self));
        }

        Ok(VerifiedCapsuleFrag { cfrag: self })
    }

    /// Explicitly skips verification.
    /// Useful in cases when the verifying keys are impossible to obtain independently.
    ///
    /// **Warning:** make sure you considered the implications of not enforcing verification.
    pub fn skip_verification(self) -> VerifiedCapsuleFrag {
        VerifiedCapsuleFrag { cfrag: self }
    }
}

/// Verified capsule fragment, good for decryption.
/// Can be serialized, but cannot be deserialized directly.
/// It can only be obtained from [`CapsuleFrag::verify`] or [`CapsuleFrag::skip_verification`].
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedCapsuleFrag {
    cfrag: CapsuleFrag,
}

impl RepresentableAsArray for VerifiedCapsuleFrag {
    type Size = <CapsuleFrag as RepresentableAsArray>::Size;
}

impl SerializableToArray for VerifiedCapsuleFrag {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.cfrag.to_array()
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl Serialize for VerifiedCapsuleFrag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.cfrag.serialize(serializer)
    }
}

impl HasTypeName for VerifiedCapsuleFrag {
    fn type_name() -> &'static str {
        "VerifiedCapsuleFrag"
    }
}

impl fmt::Display for VerifiedCapsuleFrag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_public::<Self>(self, f)
    }
}

impl VerifiedCapsuleFrag {
    pub(crate) fn reencrypted(capsule: &Capsule, kfrag: &KeyFrag) -> Self {
        VerifiedCapsuleFrag {
            cfrag: CapsuleFrag::reencrypted(capsule, kfrag),
        }
    }

    /// Restores a verified capsule frag directly from serialized bytes,
    /// skipping [`CapsuleFrag::verify`] call.
    ///
    /// Intended for internal storage;
    /// make sure that the bytes come from a trusted source.
    pub fn from_verified_bytes(data: impl AsRef<[u8]>) -> Result<Self, DeserializationError> {
        CapsuleFrag::from_bytes(data).map(|cfrag| Self { cfrag })
    }

    /// Clears the verification status from the capsule frag.
    /// Useful for the cases where it needs to be put in the protocol structure
    /// containing [`CapsuleFrag`] types (since those are the ones
    /// that can be serialized/deserialized freely).
    pub fn unverify(self) -> CapsuleFrag {
        self.cfrag
    }
}

#[cfg(test)]
mod tests {

    use alloc::boxed::Box;
    use alloc::vec::Vec;

    use super::{CapsuleFrag, CapsuleFragVerificationError, VerifiedCapsuleFrag};
    use crate::curve::CurvePoint;
    use crate::{
        encrypt, generate_kfrags, reencrypt, Capsule, DeserializableFromArray, PublicKey,
        RepresentableAsArray, SecretKey, SerializableToArray, Signer, VerifiedKeyFrag,
    };

    #[cfg(feature = "serde-support")]
    use crate::serde::tests::{check_deserialization, check_serialization};

    #[cfg(feature = "serde-support")]
    use crate::serde::Representation;

    struct Setup {
        delegating_pk: PublicKey,
        receiving_pk: PublicKey,
        verifying_pk: PublicKey,
        capsule: Capsule,
        kfrags: Box<[VerifiedKeyFrag]>,
        cfrags: Vec<VerifiedCapsuleFrag>,
    }

    fn prepare_cfrags() -> Setup {
        let delegating_sk = SecretKey::random();
        let delegating_pk = delegating_sk.public_key();

        let signer = Signer::new(SecretKey::random());
        let verifying_pk = signer.verifying_key();

        let receiving_sk = SecretKey::random();
        let receiving_pk = receiving_sk.public_key();

        let plaintext = b"peace at dawn";
        let (capsule, _ciphertext) = encrypt(&delegating_pk, plaintext).unwrap();

        let kfrags =
            generate_kfrags(&delegating_sk, &receiving_pk, &signer, 2, 3, true, false).unwrap();

        let cfrags: Vec<_> = kfrags
            .iter()
            .map(|kfrag| reencrypt(&capsule, kfrag.clone()))
            .collect();

        Setup {
            delegating_pk,
            receiving_pk,
            verifying_pk,
            capsule,
            kfrags,
            cfrags,
        }
    }

    #[test]
    fn test_verify() {
        let setup = prepare_cfrags();

        for cfrag in setup.cfrags.iter() {
            let cfrag_arr = cfrag.to_array();
            let cfrag_back = CapsuleFrag::from_array(&cfrag_arr).unwrap();

            // Check that the cfrag serializes to the same thing as the verified cfrag
            assert_eq!(cfrag_back.to_array(), cfrag_arr);

            let verified_cfrag_back = cfrag_back
                .verify(
                    &setup.capsule,
                    &setup.verifying_pk,
                    &setup.delegating_pk,
                    &setup.receiving_pk,
                )
                .unwrap();

            assert_eq!(&verified_cfrag_back, cfrag);
        }
    }

    #[test]
    fn test_serialized_size() {
        let setup = prepare_cfrags();
        assert_eq!(CapsuleFrag::serialized_size(), 363);
        assert_eq!(setup.cfrags[0].to_array().len(), 363);
    }

    #[test]
    fn test_reencrypt_is_deterministic() {
        let setup = prepare_cfrags();
        let cfrag = reencrypt(&setup.capsule, setup.kfrags[0].clone());
        assert_eq!(cfrag, setup.cfrags[0]);
    }

    #[test]
    fn test_verify_with_wrong_keys() {
        let setup = prepare_cfrags();
        let cfrag = setup.cfrags[0].clone().unverify();
        let unrelated_pk = SecretKey::random().public_key();

        let wrong_keys = [
            (unrelated_pk, setup.delegating_pk, setup.receiving_pk),
            (setup.verifying_pk, unrelated_pk, setup.receiving_pk),
            (setup.verifying_pk, setup.delegating_pk, unrelated_pk),
        ];

        for (verifying_pk, delegating_pk, receiving_pk) in wrong_keys.iter() {
            let res = cfrag
                .clone()
                .verify(&setup.capsule, verifying_pk, delegating_pk, receiving_pk);
            assert_eq!(
                res.map_err(|(err, _)| err),
                Err(CapsuleFragVerificationError::IncorrectKeyFragSignature)
            );
        }
    }

    #[test]
    fn test_verify_with_wrong_capsule() {
        let setup = prepare_cfrags();
        let cfrag = setup.cfrags[0].clone().unverify();
        let (other_capsule, _ciphertext) = encrypt(&setup.delegating_pk, b"other").unwrap();

        let res = cfrag.clone().verify(
            &other_capsule,
            &setup.verifying_pk,
            &setup.delegating_pk,
            &setup.receiving_pk,
        );
        let (err, returned) = res.unwrap_err();
        assert_eq!(err, CapsuleFragVerificationError::IncorrectReencryption);
        assert_eq!(returned, cfrag);
    }

    #[test]
    fn test_tampered_points() {
        let setup = prepare_cfrags();
        let g = CurvePoint::generator();

        let mut cfrag = setup.cfrags[0].clone().unverify();
        cfrag.point_e1 = &cfrag.point_e1 + &g;
        let res = cfrag.verify(
            &setup.capsule,
            &setup.verifying_pk,
            &setup.delegating_pk,
            &setup.receiving_pk,
        );
        assert_eq!(
            res.map_err(|(err, _)| err),
            Err(CapsuleFragVerificationError::IncorrectReencryption)
        );

        let mut cfrag = setup.cfrags[0].clone().unverify();
        cfrag.point_v1 = &cfrag.point_v1 + &g;
        let res = cfrag.verify(
            &setup.capsule,
            &setup.verifying_pk,
            &setup.delegating_pk,
            &setup.receiving_pk,
        );
        assert_eq!(
            res.map_err(|(err, _)| err),
            Err(CapsuleFragVerificationError::IncorrectReencryption)
        );

        // The threshold is covered by the kfrag signature
        let mut cfrag = setup.cfrags[0].clone().unverify();
        cfrag.threshold = 3;
        let res = cfrag.verify(
            &setup.capsule,
            &setup.verifying_pk,
            &setup.delegating_pk,
            &setup.receiving_pk,
        );
        assert_eq!(
            res.map_err(|(err, _)| err),
            Err(CapsuleFragVerificationError::IncorrectKeyFragSignature)
        );
    }

    #[test]
    fn test_from_verified_bytes() {
        let setup = prepare_cfrags();
        let bytes = setup.cfrags[2].to_array();
        let cfrag_back = VerifiedCapsuleFrag::from_verified_bytes(&bytes).unwrap();
        assert_eq!(cfrag_back, setup.cfrags[2]);
    }

    #[cfg(feature = "serde-support")]
    #[test]
    fn test_serde_serialization() {
        let setup = prepare_cfrags();

        let vcfrag = setup.cfrags[0].clone();
        let cfrag = CapsuleFrag::from_array(&vcfrag.to_array()).unwrap();

        check_serialization(&cfrag, Representation::Base64);
        check_deserialization(&cfrag);
    }
}
