use alloc::string::String;
use core::fmt;
use core::ops::Sub;

use generic_array::sequence::Split;
use generic_array::{ArrayLength, GenericArray};
use typenum::{Diff, Unsigned, U1, U4};

/// Errors that can happen when deserializing an object from a byte array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructionError {
    /// The name of the type that was being deserialized
    /// (can be one of the nested fields).
    type_name: String,
    /// An associated error message.
    message: String,
}

impl ConstructionError {
    /// Creates a new `ConstructionError`.
    pub fn new(type_name: &str, message: &str) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConstructionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to construct a {} object: {}", self.type_name, self.message)
    }
}

/// The provided bytestring is of an incorrect size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMismatchError {
    received_size: usize,
    expected_size: usize,
}

impl SizeMismatchError {
    /// Creates a new `SizeMismatchError`.
    pub fn new(received_size: usize, expected_size: usize) -> Self {
        Self {
            received_size,
            expected_size,
        }
    }
}

impl fmt::Display for SizeMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bytestring size mismatch: expected {} bytes, got {}",
            self.expected_size, self.received_size
        )
    }
}

/// Errors that can happen during object deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeserializationError {
    /// Failed to construct the object from a given bytestring (with the correct length).
    ConstructionFailure(ConstructionError),
    /// The given bytestring is too short or too long.
    SizeMismatch(SizeMismatchError),
}

impl fmt::Display for DeserializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConstructionFailure(err) => write!(f, "{}", err),
            Self::SizeMismatch(err) => write!(f, "{}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConstructionError {}

#[cfg(feature = "std")]
impl std::error::Error for SizeMismatchError {}

#[cfg(feature = "std")]
impl std::error::Error for DeserializationError {}

/// A trait denoting that the object can be represented as an array of bytes
/// with size known at compile time.
pub trait RepresentableAsArray: Sized {
    /// Resulting array length.
    type Size: ArrayLength<u8>;

    /// Resulting array length exposed as a runtime method.
    fn serialized_size() -> usize {
        Self::Size::to_usize()
    }
}

/// A trait denoting that the object can be serialized to an array of bytes
/// with size known at compile time.
pub trait SerializableToArray: RepresentableAsArray {
    /// Produces a byte array with the object's contents.
    fn to_array(&self) -> GenericArray<u8, Self::Size>;
}

/// A trait denoting that the object can be deserialized from an array of bytes
/// with size known at compile time.
pub trait DeserializableFromArray: RepresentableAsArray {
    /// Attempts to produce the object back from the serialized form.
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError>;

    /// Attempts to produce the object back from a dynamically sized byte array,
    /// checking that its length is correct.
    fn from_bytes(data: impl AsRef<[u8]>) -> Result<Self, DeserializationError> {
        let data_slice = data.as_ref();
        let received_size = data_slice.len();
        let expected_size = Self::serialized_size();
        if received_size != expected_size {
            return Err(DeserializationError::SizeMismatch(SizeMismatchError::new(
                received_size,
                expected_size,
            )));
        }
        let arr = GenericArray::<u8, Self::Size>::from_slice(data_slice);
        Self::from_array(arr).map_err(DeserializationError::ConstructionFailure)
    }

    /// Used to implement [`from_array()`](`Self::from_array()`) for structs whose fields
    /// implement [`SerializableToArray`].
    ///
    /// Attempts to split off enough bytes from `arr` to call
    /// [`from_array()`](`Self::from_array()`),
    /// and if it succeeds, returns the resulting object and the rest of the array.
    #[allow(clippy::type_complexity)]
    fn take<U>(
        arr: GenericArray<u8, U>,
    ) -> Result<(Self, GenericArray<u8, Diff<U, Self::Size>>), ConstructionError>
    where
        U: ArrayLength<u8> + Sub<Self::Size>,
        Diff<U, Self::Size>: ArrayLength<u8>,
    {
        let (res_bytes, rest): (
            GenericArray<u8, Self::Size>,
            GenericArray<u8, Diff<U, Self::Size>>,
        ) = Split::<u8, Self::Size>::split(arr);
        let res = Self::from_array(&res_bytes)?;
        Ok((res, rest))
    }

    /// A variant of [`take()`](`Self::take()`) to be called for the last field of the struct,
    /// where no remainder of the array is expected.
    fn take_last(arr: GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        Self::from_array(&arr)
    }
}

/// A `fmt` implementation for types with secret data.
pub(crate) fn fmt_secret<T: HasTypeName>(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:...", T::type_name())
}

/// A `fmt` implementation for types with public data.
pub(crate) fn fmt_public<T>(obj: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result
where
    T: SerializableToArray + HasTypeName,
{
    let bytes = obj.to_array();
    let mut hex_repr = [b'*'; 16]; // exactly 16 bytes long, to fit the encode() result
    hex::encode_to_slice(&bytes[..8], &mut hex_repr).map_err(|_| fmt::Error)?;
    write!(
        f,
        "{}:{}",
        T::type_name(),
        String::from_utf8_lossy(&hex_repr)
    )
}

/// A trait providing a type name for error messages and `Display` output.
pub trait HasTypeName {
    /// Returns a string with the name of the type.
    fn type_name() -> &'static str;
}

impl RepresentableAsArray for bool {
    type Size = U1;
}

impl SerializableToArray for bool {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        GenericArray::<u8, Self::Size>::from([*self as u8])
    }
}

impl DeserializableFromArray for bool {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        match arr[0] {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ConstructionError::new("bool", "Expected 0x00 or 0x01")),
        }
    }
}

impl RepresentableAsArray for u32 {
    type Size = U4;
}

impl SerializableToArray for u32 {
    fn to_array(&self) -> GenericArray<u8, Self::Size> {
        GenericArray::<u8, Self::Size>::from(self.to_be_bytes())
    }
}

impl DeserializableFromArray for u32 {
    fn from_array(arr: &GenericArray<u8, Self::Size>) -> Result<Self, ConstructionError> {
        Ok(u32::from_be_bytes([arr[0], arr[1], arr[2], arr[3]]))
    }
}

#[cfg(test)]
mod tests {

    use generic_array::sequence::Concat;
    use generic_array::GenericArray;
    use typenum::{op, U1, U4};

    use super::{
        DeserializableFromArray, DeserializationError, RepresentableAsArray, SerializableToArray,
    };

    #[derive(Debug, PartialEq)]
    struct SomeStruct {
        flag: bool,
        number: u32,
        other_flag: bool,
    }

    impl RepresentableAsArray for SomeStruct {
        type Size = op!(U1 + U4 + U1);
    }

    impl SerializableToArray for SomeStruct {
        fn to_array(&self) -> GenericArray<u8, Self::Size> {
            self.flag
                .to_array()
                .concat(self.number.to_array())
                .concat(self.other_flag.to_array())
        }
    }

    impl DeserializableFromArray for SomeStruct {
        fn from_array(
            arr: &GenericArray<u8, Self::Size>,
        ) -> Result<Self, super::ConstructionError> {
            let (flag, rest) = bool::take(*arr)?;
            let (number, rest) = u32::take(rest)?;
            let other_flag = bool::take_last(rest)?;
            Ok(Self {
                flag,
                number,
                other_flag,
            })
        }
    }

    #[test]
    fn test_serialize() {
        let s = SomeStruct {
            flag: true,
            number: 0x01020304,
            other_flag: false,
        };
        let arr = s.to_array();
        assert_eq!(arr.as_slice(), &[1, 1, 2, 3, 4, 0]);
        assert_eq!(SomeStruct::from_bytes(&arr).unwrap(), s);
    }

    #[test]
    fn test_invalid_data() {
        // invalid value for `flag`
        let data = [2u8, 1, 2, 3, 4, 0];
        assert!(matches!(
            SomeStruct::from_bytes(&data),
            Err(DeserializationError::ConstructionFailure(_))
        ));

        // wrong length
        let data = [1u8, 1, 2, 3, 4];
        assert!(matches!(
            SomeStruct::from_bytes(&data),
            Err(DeserializationError::SizeMismatch(_))
        ));
    }
}
