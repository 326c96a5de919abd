use digest::Digest;
use sha2::Sha256;

use crate::curve::{CurvePoint, CurveScalar, NonZeroCurveScalar};
use crate::traits::SerializableToArray;

/// Hashes arbitrary data with a domain separation tag into a message digest.
/// Every chained item of variable length is prefixed by its length,
/// so that different sequences of items cannot produce the same hash input.
pub(crate) struct Hash(Sha256);

impl Hash {
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    pub fn new_with_dst(dst: &[u8]) -> Self {
        Self::new().chain_bytes(dst)
    }

    pub fn chain_bytes<T: AsRef<[u8]>>(self, bytes: T) -> Self {
        let bytes = bytes.as_ref();
        let len = (bytes.len() as u32).to_be_bytes();
        Self(self.0.chain_update(len).chain_update(bytes))
    }

    pub fn digest(self) -> Sha256 {
        self.0
    }
}

/// A digest producing a non-zero curve scalar.
pub(crate) struct ScalarDigest(Hash);

impl ScalarDigest {
    pub fn new_with_dst(dst: &[u8]) -> Self {
        Self(Hash::new_with_dst(dst))
    }

    pub fn chain_bytes<T: AsRef<[u8]>>(self, bytes: T) -> Self {
        Self(self.0.chain_bytes(bytes))
    }

    pub fn chain_scalar(self, scalar: &CurveScalar) -> Self {
        self.chain_bytes(scalar.to_array())
    }

    pub fn chain_point(self, point: &CurvePoint) -> Self {
        self.chain_bytes(point.to_array())
    }

    pub fn chain_points(self, points: &[&CurvePoint]) -> Self {
        points
            .iter()
            .fold(self, |digest, point| digest.chain_point(point))
    }

    pub fn finalize(self) -> NonZeroCurveScalar {
        NonZeroCurveScalar::from_digest(self.0.digest())
    }
}
