//! This module is an adapter to the ECC backend.
//! `elliptic_curves` has a somewhat unstable API,
//! and we isolate all the related logic here.

use core::ops::{Add, Mul, Sub};

use digest::Digest;
use elliptic_curve::bigint::U256; // Note that this type is different from typenum::U256
use elliptic_curve::hash2curve::{ExpandMsgXmd, GroupDigest};
use elliptic_curve::ops::{Invert, Reduce};
use elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use elliptic_curve::PrimeField;
use generic_array::GenericArray;
use k256::{
    AffinePoint, EncodedPoint, FieldBytes, NonZeroScalar, ProjectivePoint, Scalar, Secp256k1,
};
use rand_core::{CryptoRng, RngCore};
use sha2::Sha256;
use subtle::CtOption;
use typenum::{U32, U33};
use zeroize::{DefaultIsZeroes, Zeroize};

use crate::traits::{
    ConstructionError, DeserializableFromArray, HasTypeName, RepresentableAsArray,
    SerializableToArray,
};

type BackendScalar = Scalar;
type BackendNonZeroScalar = NonZeroScalar;
type BackendPoint = ProjectivePoint;

/// A scalar of the curve group. May be zero.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct CurveScalar(BackendScalar);

impl CurveScalar {
    pub(crate) fn one() -> Self {
        Self(BackendScalar::ONE)
    }

    #[cfg(test)]
    pub(crate) fn from_u32(value: u32) -> Self {
        Self(BackendScalar::from(value))
    }

    pub(crate) fn invert(&self) -> CtOption<Self> {
        self.0.invert().map(Self)
    }

    #[cfg(test)]
    pub(crate) fn is_zero(&self) -> bool {
        bool::from(self.0.is_zero())
    }
}

impl DefaultIsZeroes for CurveScalar {}

impl RepresentableAsArray for CurveScalar {
    type Size = U32;
}

impl SerializableToArray for CurveScalar {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        self.0.to_bytes()
    }
}

impl DeserializableFromArray for CurveScalar {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        // Have to convert from subtle::CtOption here.
        let maybe_scalar: Option<BackendScalar> = BackendScalar::from_repr(*arr).into();
        maybe_scalar
            .map(Self)
            .ok_or_else(|| ConstructionError::new("CurveScalar", "Internal backend error"))
    }
}

impl HasTypeName for CurveScalar {
    fn type_name() -> &'static str {
        "CurveScalar"
    }
}

/// A scalar guaranteed to be non-zero.
/// Secret keys and all randomly sampled blinding values are of this type.
#[derive(Clone, Copy)]
pub struct NonZeroCurveScalar(BackendNonZeroScalar);

impl NonZeroCurveScalar {
    /// Generates a random non-zero scalar (in nearly constant-time).
    pub(crate) fn random(rng: &mut (impl CryptoRng + RngCore)) -> Self {
        Self(BackendNonZeroScalar::random(rng))
    }

    pub(crate) fn invert(&self) -> Self {
        // The inverse of a non-zero element of a prime field is non-zero.
        Self(Invert::invert(&self.0))
    }

    /// Reduces 32 bytes modulo the curve order.
    /// Returns `None` if the result is zero.
    pub(crate) fn from_reduced_bytes(bytes: &FieldBytes) -> Option<Self> {
        let scalar = <BackendScalar as Reduce<U256>>::reduce_bytes(bytes);
        Option::<BackendNonZeroScalar>::from(BackendNonZeroScalar::new(scalar)).map(Self)
    }

    /// Hashes a digest state (with a counter to skip the negligible zero case)
    /// into a non-zero scalar.
    pub(crate) fn from_digest(digest: Sha256) -> Self {
        let mut counter: u32 = 0;
        loop {
            let bytes = digest.clone().chain_update(counter.to_be_bytes()).finalize();
            if let Some(scalar) = Self::from_reduced_bytes(&bytes) {
                return scalar;
            }
            counter += 1;
        }
    }

    pub(crate) fn as_backend_scalar(&self) -> &BackendNonZeroScalar {
        &self.0
    }
}

impl Zeroize for NonZeroCurveScalar {
    fn zeroize(&mut self) {
        self.0.zeroize()
    }
}

impl From<NonZeroCurveScalar> for CurveScalar {
    fn from(source: NonZeroCurveScalar) -> Self {
        CurveScalar(*source.0)
    }
}

impl From<&NonZeroCurveScalar> for CurveScalar {
    fn from(source: &NonZeroCurveScalar) -> Self {
        CurveScalar(*source.0)
    }
}

impl RepresentableAsArray for NonZeroCurveScalar {
    type Size = U32;
}

impl SerializableToArray for NonZeroCurveScalar {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        (*self.0).to_bytes()
    }
}

impl DeserializableFromArray for NonZeroCurveScalar {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        let maybe_scalar: Option<BackendNonZeroScalar> =
            BackendNonZeroScalar::from_repr(*arr).into();
        maybe_scalar.map(Self).ok_or_else(|| {
            ConstructionError::new("NonZeroCurveScalar", "Zero or out-of-range scalar")
        })
    }
}

impl HasTypeName for NonZeroCurveScalar {
    fn type_name() -> &'static str {
        "NonZeroCurveScalar"
    }
}

/// A point of the curve group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CurvePoint(BackendPoint);

impl CurvePoint {
    pub(crate) fn generator() -> Self {
        Self(BackendPoint::GENERATOR)
    }

    pub(crate) fn identity() -> Self {
        Self(BackendPoint::IDENTITY)
    }

    pub(crate) fn to_affine(self) -> AffinePoint {
        self.0.to_affine()
    }

    /// Hashes arbitrary data with the given domain separation tag into a curve point.
    pub(crate) fn from_data(dst: &[u8], data: &[u8]) -> Option<Self> {
        Secp256k1::hash_from_bytes::<ExpandMsgXmd<Sha256>>(&[data], &[dst])
            .ok()
            .map(Self)
    }
}

impl DefaultIsZeroes for CurvePoint {}

impl RepresentableAsArray for CurvePoint {
    // Compressed SEC1 representation.
    type Size = U33;
}

impl SerializableToArray for CurvePoint {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        let mut arr = GenericArray::<u8, Self::Size>::default();
        let encoded = self.0.to_affine().to_encoded_point(true);
        // The identity has a one-byte encoding and is left as all zeros,
        // which `from_array()` rejects.
        if encoded.len() == arr.len() {
            arr.copy_from_slice(encoded.as_bytes());
        }
        arr
    }
}

impl DeserializableFromArray for CurvePoint {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        let encoded = EncodedPoint::from_bytes(arr.as_slice())
            .map_err(|_| ConstructionError::new("CurvePoint", "Invalid SEC1 encoding"))?;
        let maybe_point: Option<AffinePoint> = AffinePoint::from_encoded_point(&encoded).into();
        maybe_point
            .map(|point| Self(BackendPoint::from(point)))
            .ok_or_else(|| ConstructionError::new("CurvePoint", "Point is not on the curve"))
    }
}

impl HasTypeName for CurvePoint {
    fn type_name() -> &'static str {
        "CurvePoint"
    }
}

impl Add<&CurveScalar> for &CurveScalar {
    type Output = CurveScalar;

    fn add(self, other: &CurveScalar) -> CurveScalar {
        CurveScalar(self.0.add(&(other.0)))
    }
}

impl Add<&NonZeroCurveScalar> for &CurveScalar {
    type Output = CurveScalar;

    fn add(self, other: &NonZeroCurveScalar) -> CurveScalar {
        CurveScalar(self.0.add(&*other.0))
    }
}

impl Sub<&CurveScalar> for &CurveScalar {
    type Output = CurveScalar;

    fn sub(self, other: &CurveScalar) -> CurveScalar {
        CurveScalar(self.0.sub(&(other.0)))
    }
}

impl Mul<&CurveScalar> for &CurveScalar {
    type Output = CurveScalar;

    fn mul(self, other: &CurveScalar) -> CurveScalar {
        CurveScalar(self.0.mul(&(other.0)))
    }
}

impl Mul<&NonZeroCurveScalar> for &CurveScalar {
    type Output = CurveScalar;

    fn mul(self, other: &NonZeroCurveScalar) -> CurveScalar {
        CurveScalar(self.0.mul(&*other.0))
    }
}

impl Mul<&NonZeroCurveScalar> for &NonZeroCurveScalar {
    type Output = CurveScalar;

    fn mul(self, other: &NonZeroCurveScalar) -> CurveScalar {
        CurveScalar((*self.0).mul(&*other.0))
    }
}

impl Add<&CurvePoint> for &CurvePoint {
    type Output = CurvePoint;

    fn add(self, other: &CurvePoint) -> CurvePoint {
        CurvePoint(self.0.add(&(other.0)))
    }
}

impl Sub<&CurvePoint> for &CurvePoint {
    type Output = CurvePoint;

    fn sub(self, other: &CurvePoint) -> CurvePoint {
        CurvePoint(self.0.sub(&(other.0)))
    }
}

impl Mul<&CurveScalar> for &CurvePoint {
    type Output = CurvePoint;

    fn mul(self, other: &CurveScalar) -> CurvePoint {
        CurvePoint(self.0.mul(&(other.0)))
    }
}

impl Mul<&NonZeroCurveScalar> for &CurvePoint {
    type Output = CurvePoint;

    fn mul(self, other: &NonZeroCurveScalar) -> CurvePoint {
        CurvePoint(self.0.mul(&*other.0))
    }
}
