use core::fmt;
use core::marker::PhantomData;

use serde::{de, Deserializer, Serializer};

use crate::traits::{DeserializableFromArray, HasTypeName, SerializableToArray};

/// Text encoding used for human-readable serialization formats.
pub(crate) enum Representation {
    Base64,
    Hex,
}

/// A helper function that will serialize a byte array efficiently
/// depending on whether the target format is text or binary based.
pub(crate) fn serde_serialize<T, S>(
    obj: &T,
    serializer: S,
    representation: Representation,
) -> Result<S::Ok, S::Error>
where
    T: SerializableToArray,
    S: Serializer,
{
    let bytes = obj.to_array();
    if serializer.is_human_readable() {
        let repr = match representation {
            Representation::Base64 => base64::encode(bytes.as_slice()),
            Representation::Hex => hex::encode(bytes.as_slice()),
        };
        serializer.serialize_str(&repr)
    } else {
        serializer.serialize_bytes(bytes.as_slice())
    }
}

struct B64Visitor<T>(PhantomData<T>);

impl<'de, T> de::Visitor<'de> for B64Visitor<T>
where
    T: DeserializableFromArray + HasTypeName,
{
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "b64-encoded {} bytes", T::type_name())
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let bytes = base64::decode(v).map_err(de::Error::custom)?;
        T::from_bytes(&bytes).map_err(de::Error::custom)
    }
}

struct HexVisitor<T>(PhantomData<T>);

impl<'de, T> de::Visitor<'de> for HexVisitor<T>
where
    T: DeserializableFromArray + HasTypeName,
{
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "hex-encoded {} bytes", T::type_name())
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let bytes = hex::decode(v).map_err(de::Error::custom)?;
        T::from_bytes(&bytes).map_err(de::Error::custom)
    }
}

struct BytesVisitor<T>(PhantomData<T>);

impl<'de, T> de::Visitor<'de> for BytesVisitor<T>
where
    T: DeserializableFromArray + HasTypeName,
{
    type Value = T;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} bytes", T::type_name())
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        T::from_bytes(v).map_err(de::Error::custom)
    }
}

/// A helper function that will deserialize from a byte array,
/// matching the format used by [`serde_serialize`].
pub(crate) fn serde_deserialize<'de, T, D>(
    deserializer: D,
    representation: Representation,
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializableFromArray + HasTypeName,
{
    if deserializer.is_human_readable() {
        match representation {
            Representation::Base64 => deserializer.deserialize_str(B64Visitor::<T>(PhantomData)),
            Representation::Hex => deserializer.deserialize_str(HexVisitor::<T>(PhantomData)),
        }
    } else {
        deserializer.deserialize_bytes(BytesVisitor::<T>(PhantomData))
    }
}

#[cfg(test)]
pub(crate) mod tests {

    use alloc::format;
    use core::fmt;

    use serde::de::DeserializeOwned;
    use serde::Serialize;

    use super::Representation;
    use crate::traits::SerializableToArray;

    // `rmp_serde` writes `&[u8]` as an array of integers,
    // so a newtype is needed to produce a raw binary blob.
    struct BinaryBlob<'a>(&'a [u8]);

    impl<'a> Serialize for BinaryBlob<'a> {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_bytes(self.0)
        }
    }

    /// A helper function that checks that serialization to a human-readable format
    /// uses the given encoding, and to a binary one uses raw bytes.
    pub(crate) fn check_serialization<T>(obj: &T, expected_repr: Representation)
    where
        T: fmt::Debug + PartialEq + Serialize + DeserializeOwned + SerializableToArray,
    {
        let bytes = obj.to_array();

        // Check serialization to JSON (human-readable)

        let serialized = serde_json::to_string(obj).unwrap();
        let expected = match expected_repr {
            Representation::Base64 => base64::encode(bytes.as_slice()),
            Representation::Hex => hex::encode(bytes.as_slice()),
        };
        assert_eq!(serialized, format!("\"{}\"", expected));

        let deserialized: T = serde_json::from_str(&serialized).unwrap();
        assert_eq!(obj, &deserialized);

        // Check serialization to MessagePack (binary)

        let serialized = rmp_serde::to_vec(obj).unwrap();
        assert_eq!(serialized, rmp_serde::to_vec(&BinaryBlob(&bytes)).unwrap());
        let deserialized: T = rmp_serde::from_read_ref(&serialized).unwrap();
        assert_eq!(obj, &deserialized);
    }

    /// Checks that malformed payloads are rejected by both formats.
    pub(crate) fn check_deserialization<T>(obj: &T)
    where
        T: fmt::Debug + PartialEq + Serialize + DeserializeOwned + SerializableToArray,
    {
        let bytes = obj.to_array();

        let truncated = rmp_serde::to_vec(&BinaryBlob(&bytes[..bytes.len() - 1])).unwrap();
        assert!(rmp_serde::from_read_ref::<_, T>(&truncated).is_err());

        assert!(serde_json::from_str::<T>("\"?!\"").is_err());
        assert!(serde_json::from_str::<T>("1").is_err());
    }
}
