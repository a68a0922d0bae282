use std::fmt::{Debug, Display};

use crate::{
    Convertible, InBuffer, OutBuffer, SVType, Utf16String, Utf32String, ValueVec,
};

/// A type that can be held in a memory buffer: the ten numeric types and the three string
/// encodings.
pub trait Element: Clone + Default + Debug + Send + Sync + 'static {
    /// The tag of this memory type.
    const SV_TYPE: SVType;

    /// Wrap a slice as a typed input buffer.
    fn in_buffer(values: &[Self]) -> InBuffer<'_>;

    /// Wrap a slice as a typed output buffer.
    fn out_buffer(values: &mut [Self]) -> OutBuffer<'_>;

    /// Wrap an owned vector as a [`ValueVec`].
    fn into_value_vec(values: Vec<Self>) -> ValueVec;

    /// View a [`ValueVec`] as a slice of this type, if its tag matches.
    fn from_value_vec(values: &ValueVec) -> Option<&[Self]>;
}

/// A fixed-width numeric type that can be used as an on-disk storage type.
///
/// Values are stored little-endian regardless of the host.
pub trait NativeType: Element + Copy + PartialEq + PartialOrd + Display + Convertible {
    /// Whether this is an integer type.
    const IS_INT: bool;

    /// Decode one value from the first `size_of::<Self>()` bytes of `bytes`.
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// Encode this value into the first `size_of::<Self>()` bytes of `out`.
    fn write_le_slice(self, out: &mut [u8]);

    /// Decode consecutive little-endian values into `dst`.
    fn decode_le(bytes: &[u8], dst: &mut [Self]) {
        bytes
            .chunks_exact(size_of::<Self>())
            .zip(dst.iter_mut())
            .for_each(|(chunk, value)| *value = Self::from_le_slice(chunk));
    }

    /// Encode `src` as consecutive little-endian values.
    fn encode_le(src: &[Self], bytes: &mut [u8]) {
        bytes
            .chunks_exact_mut(size_of::<Self>())
            .zip(src.iter())
            .for_each(|(chunk, value)| value.write_le_slice(chunk));
    }
}

macro_rules! element {
    ($T:ty, $sv:ident) => {
        impl Element for $T {
            const SV_TYPE: SVType = SVType::$sv;

            #[inline]
            fn in_buffer(values: &[Self]) -> InBuffer<'_> {
                InBuffer::$sv(values)
            }

            #[inline]
            fn out_buffer(values: &mut [Self]) -> OutBuffer<'_> {
                OutBuffer::$sv(values)
            }

            #[inline]
            fn into_value_vec(values: Vec<Self>) -> ValueVec {
                ValueVec::$sv(values)
            }

            #[inline]
            fn from_value_vec(values: &ValueVec) -> Option<&[Self]> {
                match values {
                    ValueVec::$sv(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

element!(i8, I8);
element!(u8, U8);
element!(i16, I16);
element!(u16, U16);
element!(i32, I32);
element!(u32, U32);
element!(i64, I64);
element!(u64, U64);
element!(f32, F32);
element!(f64, F64);
element!(String, StrUtf8);
element!(Utf16String, StrUtf16);
element!(Utf32String, StrUtf32);

macro_rules! native_type {
    ($T:ty, $is_int:expr) => {
        impl NativeType for $T {
            const IS_INT: bool = $is_int;

            #[inline]
            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut raw = [0u8; size_of::<$T>()];
                raw.copy_from_slice(&bytes[..size_of::<$T>()]);
                <$T>::from_le_bytes(raw)
            }

            #[inline]
            fn write_le_slice(self, out: &mut [u8]) {
                out[..size_of::<$T>()].copy_from_slice(&self.to_le_bytes());
            }
        }
    };
}

native_type!(i8, true);
native_type!(u8, true);
native_type!(i16, true);
native_type!(u16, true);
native_type!(i32, true);
native_type!(u32, true);
native_type!(i64, true);
native_type!(u64, true);
native_type!(f32, false);
native_type!(f64, false);

/// Dispatch on a numeric [`SVType`], binding the matching Rust type.
///
/// Panics when given a string or custom tag; check [`SVType::is_numeric`] first.
#[macro_export]
macro_rules! match_each_native_type {
    ($self:expr, | $_:tt $enc:ident | $($body:tt)*) => ({
        macro_rules! __with__ {( $_ $enc:ident ) => ( $($body)* )}
        use $crate::SVType;
        match $self {
            SVType::I8 => __with__! { i8 },
            SVType::U8 => __with__! { u8 },
            SVType::I16 => __with__! { i16 },
            SVType::U16 => __with__! { u16 },
            SVType::I32 => __with__! { i32 },
            SVType::U32 => __with__! { u32 },
            SVType::I64 => __with__! { i64 },
            SVType::U64 => __with__! { u64 },
            SVType::F32 => __with__! { f32 },
            SVType::F64 => __with__! { f64 },
            other => unreachable!("{other} is not a native type"),
        }
    })
}
