//! Enum literal encoding.
//!
//! A literal is written as one byte holding `ordinal + 1`; `0` stands for
//! null. Types with more than [`MAX_ENUM_LITERALS`] literals are rejected
//! when their [`EnumCodec`] is built, so the check is a setup failure and
//! never a data error.

use crate::error::{Error, Result};
use std::fmt;
use std::marker::PhantomData;

/// Byte written for a null literal.
pub const ENUM_NULL: u8 = 0;

/// Offset added to every ordinal on the wire.
pub const ENUM_OFFSET: u8 = 1;

/// Largest number of literals an enum type may declare.
pub const MAX_ENUM_LITERALS: usize = 127;

/// An enum type whose literals can be written with the wire codec.
///
/// Usually implemented with [`wire_enum!`](crate::wire_enum).
pub trait WireEnum: Copy + PartialEq + 'static {
    /// All literals in ordinal order.
    const LITERALS: &'static [Self];

    /// Position of this literal in [`LITERALS`](Self::LITERALS).
    fn ordinal(self) -> Option<usize> {
        Self::LITERALS.iter().position(|literal| *literal == self)
    }
}

/// Implements [`WireEnum`] for a field-less enum, listing its literals in
/// ordinal order.
///
/// ```rust
/// use lexwire::wire_enum;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Status { Active, Retired }
///
/// wire_enum!(Status { Active, Retired });
/// ```
#[macro_export]
macro_rules! wire_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::codec::WireEnum for $ty {
            const LITERALS: &'static [Self] = &[$($ty::$variant),+];
        }
    };
}

/// Validated encoder/decoder for the literals of one enum type.
pub struct EnumCodec<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E: WireEnum> EnumCodec<E> {
    /// Create a codec, failing if `E` declares too many literals.
    pub fn new() -> Result<Self> {
        let count = E::LITERALS.len();
        if count > MAX_ENUM_LITERALS {
            log::warn!(
                "Rejecting enum {} with {} literals",
                std::any::type_name::<E>(),
                count
            );
            return Err(Error::configuration(format!(
                "enum {} has {} literals, at most {} are supported",
                std::any::type_name::<E>(),
                count,
                MAX_ENUM_LITERALS
            )));
        }
        Ok(Self { _marker: PhantomData })
    }

    /// Number of literals of `E`.
    pub fn literal_count(&self) -> usize {
        E::LITERALS.len()
    }

    /// Encode a literal into its wire byte.
    pub fn encode(&self, literal: Option<E>) -> Result<u8> {
        match literal {
            None => Ok(ENUM_NULL),
            Some(literal) => {
                let ordinal = literal.ordinal().ok_or_else(|| {
                    Error::invalid_argument(format!(
                        "literal missing from {}::LITERALS",
                        std::any::type_name::<E>()
                    ))
                })?;
                Ok(ordinal as u8 + ENUM_OFFSET)
            }
        }
    }

    /// Decode a wire byte into a literal.
    pub fn decode(&self, byte: u8) -> Result<Option<E>> {
        if byte == ENUM_NULL {
            return Ok(None);
        }
        let ordinal = (byte - ENUM_OFFSET) as usize;
        E::LITERALS.get(ordinal).copied().map(Some).ok_or_else(|| {
            Error::decode(format!(
                "enum ordinal {} out of range for {} ({} literals)",
                ordinal,
                std::any::type_name::<E>(),
                E::LITERALS.len()
            ))
        })
    }
}

impl<E> Clone for EnumCodec<E> {
    fn clone(&self) -> Self {
        Self { _marker: PhantomData }
    }
}

impl<E> fmt::Debug for EnumCodec<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumCodec").field("type", &std::any::type_name::<E>()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{WireRead, WireWrite};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Acceptability {
        Preferred,
        Acceptable,
        Unacceptable,
    }

    crate::wire_enum!(Acceptability { Preferred, Acceptable, Unacceptable });

    // Enum-like type with `$count` literals, built in a const block.
    macro_rules! numbered {
        ($name:ident, $count:expr) => {
            #[derive(Debug, Clone, Copy, PartialEq)]
            struct $name(u16);

            impl WireEnum for $name {
                const LITERALS: &'static [Self] = &{
                    let mut all = [$name(0); $count];
                    let mut i = 0;
                    while i < $count {
                        all[i] = $name(i as u16);
                        i += 1;
                    }
                    all
                };
            }
        };
    }

    numbered!(Widest, 127);
    numbered!(OneTooMany, 128);
    numbered!(Huge, 300);

    #[test]
    fn test_encode_offsets_ordinal() {
        let codec = EnumCodec::<Acceptability>::new().unwrap();
        assert_eq!(codec.encode(None).unwrap(), 0);
        assert_eq!(codec.encode(Some(Acceptability::Preferred)).unwrap(), 1);
        assert_eq!(codec.encode(Some(Acceptability::Unacceptable)).unwrap(), 3);
        assert_eq!(codec.literal_count(), 3);
    }

    #[test]
    fn test_round_trip_all_literals() {
        let codec = EnumCodec::<Acceptability>::new().unwrap();
        let mut buf = Vec::new();
        for literal in Acceptability::LITERALS {
            buf.write_enum(&codec, Some(*literal)).unwrap();
        }
        buf.write_enum(&codec, None).unwrap();

        let mut input = buf.as_slice();
        for literal in Acceptability::LITERALS {
            assert_eq!(input.read_enum(&codec).unwrap(), Some(*literal));
        }
        assert_eq!(input.read_enum(&codec).unwrap(), None);
    }

    #[test]
    fn test_out_of_range_ordinal() {
        let codec = EnumCodec::<Acceptability>::new().unwrap();
        assert!(codec.decode(4).unwrap_err().is_decode());
        assert!(codec.decode(255).unwrap_err().is_decode());
    }

    #[test]
    fn test_largest_allowed_enum() {
        let codec = EnumCodec::<Widest>::new().unwrap();
        assert_eq!(codec.literal_count(), MAX_ENUM_LITERALS);

        let last = Widest(126);
        assert_eq!(codec.encode(Some(last)).unwrap(), 127);

        let mut buf = Vec::new();
        buf.write_enum(&codec, Some(last)).unwrap();
        assert_eq!(buf, vec![127]);
        assert_eq!(buf.as_slice().read_enum(&codec).unwrap(), Some(last));
        assert!(codec.decode(128).unwrap_err().is_decode());
    }

    #[test]
    fn test_one_literal_over_limit_rejected() {
        let err = EnumCodec::<OneTooMany>::new().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_oversized_enum_rejected_at_setup() {
        let err = EnumCodec::<Huge>::new().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
