//! This module contains hashing sequences with included domain separation tags
//! shared between different parts of the code.

use alloc::vec::Vec;

use crate::curve::{CurvePoint, CurveScalar, NonZeroCurveScalar};
use crate::hashing::{Hash, ScalarDigest};
use crate::key_frag::KeyFragID;
use crate::keys::PublicKey;
use crate::traits::SerializableToArray;

/// Tags the layout of the key fragment signature message.
/// Any change to the set of signed fields must come with a new tag.
const KFRAG_SIGNATURE_TAG: &[u8] = b"KFRAG_V1";

pub(crate) fn hash_to_polynomial_arg(
    precursor: &CurvePoint,
    pubkey: &CurvePoint,
    dh_point: &CurvePoint,
    kfrag_id: &KeyFragID,
) -> NonZeroCurveScalar {
    ScalarDigest::new_with_dst(b"POLYNOMIAL_ARG")
        .chain_point(precursor)
        .chain_point(pubkey)
        .chain_point(dh_point)
        .chain_bytes(kfrag_id)
        .finalize()
}

pub(crate) fn hash_to_shared(
    precursor: &CurvePoint,
    pubkey: &CurvePoint,
    dh_point: &CurvePoint,
) -> NonZeroCurveScalar {
    ScalarDigest::new_with_dst(b"SHARED_SECRET")
        .chain_point(precursor)
        .chain_point(pubkey)
        .chain_point(dh_point)
        .finalize()
}

pub(crate) fn hash_capsule_points(
    capsule_e: &CurvePoint,
    capsule_v: &CurvePoint,
) -> NonZeroCurveScalar {
    ScalarDigest::new_with_dst(b"CAPSULE_POINTS")
        .chain_point(capsule_e)
        .chain_point(capsule_v)
        .finalize()
}

pub(crate) fn hash_to_cfrag_verification(points: &[&CurvePoint]) -> NonZeroCurveScalar {
    ScalarDigest::new_with_dst(b"CFRAG_VERIFICATION")
        .chain_points(points)
        .finalize()
}

/// Derives the proof nonce for a capsule fragment from the re-encryption key share
/// and the public values it is bound to, so that re-encryption needs no RNG.
pub(crate) fn hash_to_cfrag_nonce(
    kfrag_key: &CurveScalar,
    kfrag_id: &KeyFragID,
    capsule_e: &CurvePoint,
    capsule_v: &CurvePoint,
) -> NonZeroCurveScalar {
    ScalarDigest::new_with_dst(b"CFRAG_PROOF_NONCE")
        .chain_scalar(kfrag_key)
        .chain_bytes(kfrag_id)
        .chain_point(capsule_e)
        .chain_point(capsule_v)
        .finalize()
}

pub(crate) fn signature_digest(message: &[u8]) -> Hash {
    Hash::new_with_dst(b"SIGNATURE").chain_bytes(message)
}

pub(crate) fn kfrag_signature_message(
    kfrag_id: &KeyFragID,
    commitment: &CurvePoint,
    precursor: &CurvePoint,
    threshold: u32,
    maybe_delegating_pk: Option<&PublicKey>,
    maybe_receiving_pk: Option<&PublicKey>,
) -> Vec<u8> {
    let mut message = Vec::new();
    message.extend_from_slice(KFRAG_SIGNATURE_TAG);
    message.extend_from_slice(kfrag_id.as_ref());
    message.extend_from_slice(&commitment.to_array());
    message.extend_from_slice(&precursor.to_array());
    message.extend_from_slice(&threshold.to_be_bytes());

    for maybe_pk in [maybe_delegating_pk, maybe_receiving_pk] {
        match maybe_pk {
            Some(pk) => {
                message.push(1);
                message.extend_from_slice(&pk.to_array());
            }
            None => message.push(0),
        }
    }

    message
}
