use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use static_assertions::assert_eq_size;

use crate::{Utf16String, Utf32String};

assert_eq_size!(Utf16String, Utf32String, Vec<u16>);

/// The tag of a value representation, on disk or in memory.
///
/// The `Custom*` tags describe storage types that have no direct in-memory counterpart, e.g. packed
/// sub-byte integers. They can be reported by an array but never requested as a memory type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum SVType {
    /// An opaque type.
    Custom = 0,
    /// A custom signed integer encoding.
    CustomInt,
    /// A custom unsigned integer encoding.
    CustomUInt,
    /// A custom floating point encoding.
    CustomFloat,
    /// A custom string encoding.
    CustomStr,
    /// An 8-bit signed integer.
    I8,
    /// An 8-bit unsigned integer.
    U8,
    /// A 16-bit signed integer.
    I16,
    /// A 16-bit unsigned integer.
    U16,
    /// A 32-bit signed integer.
    I32,
    /// A 32-bit unsigned integer.
    U32,
    /// A 64-bit signed integer.
    I64,
    /// A 64-bit unsigned integer.
    U64,
    /// A 32-bit floating point number.
    F32,
    /// A 64-bit floating point number.
    F64,
    /// A UTF-8 string.
    StrUtf8,
    /// A UTF-16 string.
    StrUtf16,
    /// A UTF-32 string.
    StrUtf32,
}

impl SVType {
    /// Returns `true` iff this is a signed or unsigned integer type, custom ones included.
    pub const fn is_int(self) -> bool {
        matches!(
            self,
            Self::CustomInt
                | Self::CustomUInt
                | Self::I8
                | Self::U8
                | Self::I16
                | Self::U16
                | Self::I32
                | Self::U32
                | Self::I64
                | Self::U64
        )
    }

    /// Returns `true` iff this is a signed integer type, custom ones included.
    pub const fn is_signed_int(self) -> bool {
        matches!(
            self,
            Self::CustomInt | Self::I8 | Self::I16 | Self::I32 | Self::I64
        )
    }

    /// Returns `true` iff this is a floating point type, custom ones included.
    pub const fn is_float(self) -> bool {
        matches!(self, Self::CustomFloat | Self::F32 | Self::F64)
    }

    /// Returns `true` iff this is a string type, custom ones included.
    pub const fn is_string(self) -> bool {
        matches!(
            self,
            Self::CustomStr | Self::StrUtf8 | Self::StrUtf16 | Self::StrUtf32
        )
    }

    /// Returns `true` iff this is one of the `Custom*` tags.
    pub const fn is_custom(self) -> bool {
        matches!(
            self,
            Self::Custom | Self::CustomInt | Self::CustomUInt | Self::CustomFloat | Self::CustomStr
        )
    }

    /// Returns `true` iff this is one of the ten fixed-width numeric types.
    pub const fn is_numeric(self) -> bool {
        !self.is_custom() && (self.is_int() || self.is_float())
    }

    /// Returns `true` iff values of this type can be produced in memory.
    pub const fn is_memory_type(self) -> bool {
        !self.is_custom()
    }

    /// The size of one fixed-width value in bytes, `None` for strings and custom types.
    pub const fn byte_width(self) -> Option<usize> {
        match self {
            Self::I8 | Self::U8 => Some(1),
            Self::I16 | Self::U16 => Some(2),
            Self::I32 | Self::U32 | Self::F32 => Some(4),
            Self::I64 | Self::U64 | Self::F64 => Some(8),
            _ => None,
        }
    }

    /// The number of bytes one value of this type occupies in a memory buffer.
    pub const fn memory_size(self) -> usize {
        match self.byte_width() {
            Some(width) => width,
            None => match self {
                Self::StrUtf8 => size_of::<String>(),
                Self::StrUtf16 | Self::StrUtf32 => size_of::<Vec<u16>>(),
                _ => 0,
            },
        }
    }

    /// The size of one fixed-width value in bits, `None` for strings and custom types.
    pub const fn bit_width(self) -> Option<u32> {
        match self.byte_width() {
            #[allow(clippy::cast_possible_truncation)]
            Some(width) => Some(width as u32 * 8),
            None => None,
        }
    }
}

impl Display for SVType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Custom => "custom",
            Self::CustomInt => "custom_int",
            Self::CustomUInt => "custom_uint",
            Self::CustomFloat => "custom_float",
            Self::CustomStr => "custom_str",
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::StrUtf8 => "utf8",
            Self::StrUtf16 => "utf16",
            Self::StrUtf32 => "utf32",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(SVType::I8, Some(1))]
    #[case(SVType::U16, Some(2))]
    #[case(SVType::F32, Some(4))]
    #[case(SVType::U64, Some(8))]
    #[case(SVType::StrUtf8, None)]
    #[case(SVType::CustomInt, None)]
    fn widths(#[case] sv: SVType, #[case] width: Option<usize>) {
        assert_eq!(sv.byte_width(), width);
        assert_eq!(sv.bit_width(), width.map(|w| w as u32 * 8));
    }

    #[test]
    fn classification() {
        assert!(SVType::CustomUInt.is_int());
        assert!(!SVType::CustomUInt.is_numeric());
        assert!(SVType::I64.is_numeric());
        assert!(SVType::I64.is_signed_int());
        assert!(!SVType::U64.is_signed_int());
        assert!(SVType::StrUtf16.is_string());
        assert!(SVType::StrUtf16.is_memory_type());
        assert!(!SVType::Custom.is_memory_type());
    }

    #[test]
    fn primitive_round_trip() {
        let raw: u8 = SVType::F64.into();
        assert_eq!(SVType::try_from(raw).ok(), Some(SVType::F64));
        assert!(SVType::try_from(200u8).is_err());
        assert_eq!(SVType::F64.to_string(), "f64");
    }
}
