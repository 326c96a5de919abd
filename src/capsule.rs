use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::fmt;

use generic_array::sequence::Concat;
use generic_array::GenericArray;
use rand_core::{CryptoRng, RngCore};
use tracing::debug;
use typenum::op;

#[cfg(feature = "serde-support")]
use crate::serde::{serde_deserialize, serde_serialize, Representation};

use crate::capsule_frag::CapsuleFrag;
use crate::curve::{CurvePoint, CurveScalar, NonZeroCurveScalar};
use crate::hashing_ds::{hash_capsule_points, hash_to_polynomial_arg, hash_to_shared};
use crate::keys::{PublicKey, SecretKey};
use crate::secret_box::SecretBox;
use crate::traits::{
    fmt_public, ConstructionError, DeserializableFromArray, HasTypeName, RepresentableAsArray,
    SerializableToArray,
};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can happen when opening a `Capsule` using reencrypted `CapsuleFrag` objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenReencryptedError {
    /// An empty capsule fragment list is given.
    NoCapsuleFrags,
    /// Capsule fragments are mismatched (originated from [`KeyFrag`](crate::KeyFrag) objects
    /// generated by different [`generate_kfrags`](crate::generate_kfrags) calls).
    MismatchedCapsuleFrags,
    /// Some of the given capsule fragments are repeated.
    RepeatingCapsuleFrags,
    /// Fewer capsule fragments than the threshold they were generated with.
    InsufficientCapsuleFrags {
        /// The threshold the key fragments were generated with.
        threshold: u32,
        /// The number of capsule fragments given.
        received: usize,
    },
    /// An internal validation check failed: the capsule fragments were produced
    /// for a different capsule, delegating key or receiving key.
    ValidationFailed,
}

impl fmt::Display for OpenReencryptedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCapsuleFrags => write!(f, "Empty CapsuleFrag sequence"),
            Self::MismatchedCapsuleFrags => write!(f, "CapsuleFrags are not pairwise consistent"),
            Self::RepeatingCapsuleFrags => write!(f, "Some of the CapsuleFrags are repeated"),
            Self::InsufficientCapsuleFrags {
                threshold,
                received,
            } => write!(
                f,
                "Not enough CapsuleFrags: {} required, {} given",
                threshold, received
            ),
            Self::ValidationFailed => write!(f, "Internal validation failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OpenReencryptedError {}

/// Encapsulated symmetric key used to encrypt the plaintext.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Capsule {
    pub(crate) point_e: CurvePoint,
    pub(crate) point_v: CurvePoint,
    pub(crate) signature: CurveScalar,
}

type PointSize = <CurvePoint as RepresentableAsArray>::Size;
type ScalarSize = <CurveScalar as RepresentableAsArray>::Size;

impl RepresentableAsArray for Capsule {
    type Size = op!(PointSize + PointSize + ScalarSize);
}

impl SerializableToArray for Capsule {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.point_e
            .to_array()
            .concat(self.point_v.to_array())
            .concat(self.signature.to_array())
    }
}

impl DeserializableFromArray for Capsule {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        let (point_e, rest) = CurvePoint::take(*arr)?;
        let (point_v, rest) = CurvePoint::take(rest)?;
        let signature = CurveScalar::take_last(rest)?;
        Self::new_verified(point_e, point_v, signature)
            .ok_or_else(|| ConstructionError::new("Capsule", "Self-verification failed"))
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl Serialize for Capsule {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde_serialize(self, serializer, Representation::Base64)
    }
}

#[cfg(feature = "serde-support")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde-support")))]
impl<'de> Deserialize<'de> for Capsule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_deserialize(deserializer, Representation::Base64)
    }
}

impl HasTypeName for Capsule {
    fn type_name() -> &'static str {
        "Capsule"
    }
}

impl fmt::Display for Capsule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_public::<Self>(self, f)
    }
}

impl Capsule {
    fn new(point_e: CurvePoint, point_v: CurvePoint, signature: CurveScalar) -> Self {
        Self {
            point_e,
            point_v,
            signature,
        }
    }

    fn new_verified(
        point_e: CurvePoint,
        point_v: CurvePoint,
        signature: CurveScalar,
    ) -> Option<Self> {
        let capsule = Self::new(point_e, point_v, signature);
        if capsule.verify() {
            Some(capsule)
        } else {
            None
        }
    }

    /// Verifies the integrity of the capsule.
    fn verify(&self) -> bool {
        let g = CurvePoint::generator();
        let h = hash_capsule_points(&self.point_e, &self.point_v);
        &g * &self.signature == &self.point_v + &(&self.point_e * &h)
    }

    /// Generates a symmetric key and its associated KEM ciphertext, using the given RNG.
    pub(crate) fn from_public_key(
        rng: &mut (impl CryptoRng + RngCore),
        delegating_pk: &PublicKey,
    ) -> (Capsule, SecretBox<CurvePoint>) {
        let g = CurvePoint::generator();

        let priv_r = SecretBox::new(NonZeroCurveScalar::random(rng));
        let pub_r = &g * priv_r.as_secret();

        let priv_u = SecretBox::new(NonZeroCurveScalar::random(rng));
        let pub_u = &g * priv_u.as_secret();

        let h = hash_capsule_points(&pub_r, &pub_u);

        let s = &CurveScalar::from(priv_u.as_secret()) + &(priv_r.as_secret() * &h);

        let priv_sum = SecretBox::new(&CurveScalar::from(priv_r.as_secret()) + priv_u.as_secret());
        let shared_key = SecretBox::new(&delegating_pk.to_point() * priv_sum.as_secret());

        let capsule = Self::new(pub_r, pub_u, s);

        (capsule, shared_key)
    }

    /// Derive the same symmetric key
    pub(crate) fn open_original(&self, delegating_sk: &SecretKey) -> SecretBox<CurvePoint> {
        let sk = delegating_sk.to_secret_scalar();
        SecretBox::new(&(&self.point_e + &self.point_v) * sk.as_secret())
    }

    #[allow(clippy::many_single_char_names)]
    pub(crate) fn open_reencrypted(
        &self,
        receiving_sk: &SecretKey,
        delegating_pk: &PublicKey,
        cfrags: &[CapsuleFrag],
    ) -> Result<SecretBox<CurvePoint>, OpenReencryptedError> {
        let first = cfrags.first().ok_or(OpenReencryptedError::NoCapsuleFrags)?;
        let precursor = first.precursor;
        let threshold = first.threshold;

        if cfrags
            .iter()
            .any(|cfrag| cfrag.precursor != precursor || cfrag.threshold != threshold)
        {
            debug!("capsule fragments come from different delegations");
            return Err(OpenReencryptedError::MismatchedCapsuleFrags);
        }

        let distinct_ids: BTreeSet<_> = cfrags.iter().map(|cfrag| &cfrag.kfrag_id).collect();
        if distinct_ids.len() != cfrags.len() {
            return Err(OpenReencryptedError::RepeatingCapsuleFrags);
        }

        if cfrags.len() < threshold as usize {
            debug!(threshold, received = cfrags.len(), "not enough capsule fragments");
            return Err(OpenReencryptedError::InsufficientCapsuleFrags {
                threshold,
                received: cfrags.len(),
            });
        }

        let pub_key = receiving_sk.public_key().to_point();
        let sk = receiving_sk.to_secret_scalar();
        let dh_point = SecretBox::new(&precursor * sk.as_secret());

        // Positions of the fragments on the delegation polynomial.
        let xs: Vec<CurveScalar> = cfrags
            .iter()
            .map(|cfrag| {
                hash_to_polynomial_arg(&precursor, &pub_key, dh_point.as_secret(), &cfrag.kfrag_id)
                    .into()
            })
            .collect();

        let mut e_prime = CurvePoint::identity();
        let mut v_prime = CurvePoint::identity();
        for (i, cfrag) in cfrags.iter().enumerate() {
            // Identical indices would have been caught above,
            // unless there is a hash collision.
            let lambda_i = lambda_coeff(&xs, i).ok_or(OpenReencryptedError::RepeatingCapsuleFrags)?;
            e_prime = &e_prime + &(&cfrag.point_e1 * &lambda_i);
            v_prime = &v_prime + &(&cfrag.point_v1 * &lambda_i);
        }

        let d = SecretBox::new(hash_to_shared(
            &precursor,
            &pub_key,
            dh_point.as_secret(),
        ));

        let s = self.signature;
        let h = hash_capsule_points(&self.point_e, &self.point_v);

        let orig_pub_key = delegating_pk.to_point();

        // `PK_A * (s / d) == E' * h + V'` holds only if the fragments
        // re-encrypt this capsule under a delegation from `PK_A` to us.
        let inv_d = SecretBox::new(d.as_secret().invert());
        if &orig_pub_key * &(&s * inv_d.as_secret()) != &(&e_prime * &h) + &v_prime {
            debug!("reencrypted capsule failed the validation check");
            return Err(OpenReencryptedError::ValidationFailed);
        }

        Ok(SecretBox::new(&(&e_prime + &v_prime) * d.as_secret()))
    }
}

/// Computes the Lagrange basis coefficient for the `i`-th point, evaluated at zero.
/// Returns `None` if some of the points coincide.
fn lambda_coeff(xs: &[CurveScalar], i: usize) -> Option<CurveScalar> {
    let mut res = CurveScalar::one();
    for j in 0..xs.len() {
        if j != i {
            let inv_diff_opt: Option<CurveScalar> = (&xs[j] - &xs[i]).invert().into();
            let inv_diff = inv_diff_opt?;
            res = &(&res * &xs[j]) * &inv_diff;
        }
    }
    Some(res)
}
