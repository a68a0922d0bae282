//! Typed memory buffers exchanged with arrays.

use gds_error::{GdsResult, gds_bail, gds_err};

use crate::{Element, SVType, Utf16String, Utf32String};

/// A borrowed input buffer of one memory type.
#[derive(Debug, Clone, Copy)]
pub enum InBuffer<'a> {
    /// 8-bit signed integers.
    I8(&'a [i8]),
    /// 8-bit unsigned integers.
    U8(&'a [u8]),
    /// 16-bit signed integers.
    I16(&'a [i16]),
    /// 16-bit unsigned integers.
    U16(&'a [u16]),
    /// 32-bit signed integers.
    I32(&'a [i32]),
    /// 32-bit unsigned integers.
    U32(&'a [u32]),
    /// 64-bit signed integers.
    I64(&'a [i64]),
    /// 64-bit unsigned integers.
    U64(&'a [u64]),
    /// 32-bit floats.
    F32(&'a [f32]),
    /// 64-bit floats.
    F64(&'a [f64]),
    /// UTF-8 strings.
    StrUtf8(&'a [String]),
    /// UTF-16 strings.
    StrUtf16(&'a [Utf16String]),
    /// UTF-32 strings.
    StrUtf32(&'a [Utf32String]),
}

/// A borrowed output buffer of one memory type.
#[derive(Debug)]
pub enum OutBuffer<'a> {
    /// 8-bit signed integers.
    I8(&'a mut [i8]),
    /// 8-bit unsigned integers.
    U8(&'a mut [u8]),
    /// 16-bit signed integers.
    I16(&'a mut [i16]),
    /// 16-bit unsigned integers.
    U16(&'a mut [u16]),
    /// 32-bit signed integers.
    I32(&'a mut [i32]),
    /// 32-bit unsigned integers.
    U32(&'a mut [u32]),
    /// 64-bit signed integers.
    I64(&'a mut [i64]),
    /// 64-bit unsigned integers.
    U64(&'a mut [u64]),
    /// 32-bit floats.
    F32(&'a mut [f32]),
    /// 64-bit floats.
    F64(&'a mut [f64]),
    /// UTF-8 strings.
    StrUtf8(&'a mut [String]),
    /// UTF-16 strings.
    StrUtf16(&'a mut [Utf16String]),
    /// UTF-32 strings.
    StrUtf32(&'a mut [Utf32String]),
}

/// An owned buffer of one memory type.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueVec {
    /// 8-bit signed integers.
    I8(Vec<i8>),
    /// 8-bit unsigned integers.
    U8(Vec<u8>),
    /// 16-bit signed integers.
    I16(Vec<i16>),
    /// 16-bit unsigned integers.
    U16(Vec<u16>),
    /// 32-bit signed integers.
    I32(Vec<i32>),
    /// 32-bit unsigned integers.
    U32(Vec<u32>),
    /// 64-bit signed integers.
    I64(Vec<i64>),
    /// 64-bit unsigned integers.
    U64(Vec<u64>),
    /// 32-bit floats.
    F32(Vec<f32>),
    /// 64-bit floats.
    F64(Vec<f64>),
    /// UTF-8 strings.
    StrUtf8(Vec<String>),
    /// UTF-16 strings.
    StrUtf16(Vec<Utf16String>),
    /// UTF-32 strings.
    StrUtf32(Vec<Utf32String>),
}

/// Match on every variant of a buffer enum, binding the inner slice or vector.
///
/// The body is instantiated once per memory type.
#[macro_export]
macro_rules! match_each_buffer {
    ($ty:ident, $self:expr, | $v:ident | $body:expr) => {{
        use $crate::$ty;
        match $self {
            $ty::I8($v) => $body,
            $ty::U8($v) => $body,
            $ty::I16($v) => $body,
            $ty::U16($v) => $body,
            $ty::I32($v) => $body,
            $ty::U32($v) => $body,
            $ty::I64($v) => $body,
            $ty::U64($v) => $body,
            $ty::F32($v) => $body,
            $ty::F64($v) => $body,
            $ty::StrUtf8($v) => $body,
            $ty::StrUtf16($v) => $body,
            $ty::StrUtf32($v) => $body,
        }
    }};
}

macro_rules! sv_type_of {
    ($ty:ident, $self:expr) => {
        match $self {
            $ty::I8(_) => SVType::I8,
            $ty::U8(_) => SVType::U8,
            $ty::I16(_) => SVType::I16,
            $ty::U16(_) => SVType::U16,
            $ty::I32(_) => SVType::I32,
            $ty::U32(_) => SVType::U32,
            $ty::I64(_) => SVType::I64,
            $ty::U64(_) => SVType::U64,
            $ty::F32(_) => SVType::F32,
            $ty::F64(_) => SVType::F64,
            $ty::StrUtf8(_) => SVType::StrUtf8,
            $ty::StrUtf16(_) => SVType::StrUtf16,
            $ty::StrUtf32(_) => SVType::StrUtf32,
        }
    };
}

impl InBuffer<'_> {
    /// The memory type of this buffer.
    pub fn sv_type(&self) -> SVType {
        sv_type_of!(InBuffer, self)
    }

    /// The number of values.
    pub fn len(&self) -> usize {
        match_each_buffer!(InBuffer, self, |v| v.len())
    }

    /// Returns `true` iff the buffer holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutBuffer<'_> {
    /// The memory type of this buffer.
    pub fn sv_type(&self) -> SVType {
        sv_type_of!(OutBuffer, self)
    }

    /// The number of values.
    pub fn len(&self) -> usize {
        match_each_buffer!(OutBuffer, self, |v| v.len())
    }

    /// Returns `true` iff the buffer holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reborrow the values from `offset` onwards.
    pub fn tail(&mut self, offset: usize) -> OutBuffer<'_> {
        match_each_buffer!(OutBuffer, self, |v| Element::out_buffer(&mut v[offset..]))
    }

    /// Clone `len` values of `src` starting at `src_offset` into this buffer at `dst_offset`.
    ///
    /// Both buffers must hold the same memory type.
    pub fn copy_from(
        &mut self,
        dst_offset: usize,
        src: &ValueVec,
        src_offset: usize,
        len: usize,
    ) -> GdsResult<()> {
        let dst = self;
        macro_rules! copy {
            ($($variant:ident),+) => {
                match (dst, src) {
                    $(
                        (OutBuffer::$variant(dst), ValueVec::$variant(src)) => {
                            dst[dst_offset..dst_offset + len]
                                .clone_from_slice(&src[src_offset..src_offset + len]);
                            Ok(())
                        }
                    )+
                    (dst, src) => Err(gds_err!(
                        "cannot copy {} values into a {} buffer",
                        src.sv_type(),
                        dst.sv_type()
                    )),
                }
            };
        }
        copy!(
            I8, U8, I16, U16, I32, U32, I64, U64, F32, F64, StrUtf8, StrUtf16, StrUtf32
        )
    }
}

impl ValueVec {
    /// Allocate `len` default values of the memory type `sv_type`.
    pub fn new(sv_type: SVType, len: usize) -> GdsResult<Self> {
        Ok(match sv_type {
            SVType::I8 => Self::I8(vec![0; len]),
            SVType::U8 => Self::U8(vec![0; len]),
            SVType::I16 => Self::I16(vec![0; len]),
            SVType::U16 => Self::U16(vec![0; len]),
            SVType::I32 => Self::I32(vec![0; len]),
            SVType::U32 => Self::U32(vec![0; len]),
            SVType::I64 => Self::I64(vec![0; len]),
            SVType::U64 => Self::U64(vec![0; len]),
            SVType::F32 => Self::F32(vec![0.0; len]),
            SVType::F64 => Self::F64(vec![0.0; len]),
            SVType::StrUtf8 => Self::StrUtf8(vec![String::new(); len]),
            SVType::StrUtf16 => Self::StrUtf16(vec![Utf16String::default(); len]),
            SVType::StrUtf32 => Self::StrUtf32(vec![Utf32String::default(); len]),
            other => gds_bail!(Conversion: "{} cannot be used as a memory type", other),
        })
    }

    /// The memory type of this buffer.
    pub fn sv_type(&self) -> SVType {
        sv_type_of!(ValueVec, self)
    }

    /// The number of values.
    pub fn len(&self) -> usize {
        match_each_buffer!(ValueVec, self, |v| v.len())
    }

    /// Returns `true` iff the buffer holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shorten the buffer to `len` values.
    pub fn truncate(&mut self, len: usize) {
        match_each_buffer!(ValueVec, self, |v| v.truncate(len))
    }

    /// Borrow as an input buffer.
    pub fn as_in(&self) -> InBuffer<'_> {
        match_each_buffer!(ValueVec, self, |v| Element::in_buffer(v.as_slice()))
    }

    /// Borrow as an output buffer.
    pub fn as_out(&mut self) -> OutBuffer<'_> {
        match_each_buffer!(ValueVec, self, |v| Element::out_buffer(v.as_mut_slice()))
    }

    /// View as a slice of `T`, if the memory type matches.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::from_value_vec(self)
    }
}

macro_rules! buffer_from {
    ($($T:ty),+) => {
        $(
            impl<'a> From<&'a [$T]> for InBuffer<'a> {
                fn from(value: &'a [$T]) -> Self {
                    Element::in_buffer(value)
                }
            }

            impl<'a> From<&'a Vec<$T>> for InBuffer<'a> {
                fn from(value: &'a Vec<$T>) -> Self {
                    Element::in_buffer(value.as_slice())
                }
            }

            impl<'a, const N: usize> From<&'a [$T; N]> for InBuffer<'a> {
                fn from(value: &'a [$T; N]) -> Self {
                    Element::in_buffer(value.as_slice())
                }
            }

            impl<'a> From<&'a mut [$T]> for OutBuffer<'a> {
                fn from(value: &'a mut [$T]) -> Self {
                    Element::out_buffer(value)
                }
            }

            impl<'a> From<&'a mut Vec<$T>> for OutBuffer<'a> {
                fn from(value: &'a mut Vec<$T>) -> Self {
                    Element::out_buffer(value.as_mut_slice())
                }
            }

            impl<'a, const N: usize> From<&'a mut [$T; N]> for OutBuffer<'a> {
                fn from(value: &'a mut [$T; N]) -> Self {
                    Element::out_buffer(value.as_mut_slice())
                }
            }

            impl From<Vec<$T>> for ValueVec {
                fn from(value: Vec<$T>) -> Self {
                    Element::into_value_vec(value)
                }
            }
        )+
    };
}

buffer_from!(
    i8,
    u8,
    i16,
    u16,
    i32,
    u32,
    i64,
    u64,
    f32,
    f64,
    String,
    Utf16String,
    Utf32String
);

#[cfg(test)]
mod test {
    use gds_error::ErrorKind;

    use super::*;

    #[test]
    fn custom_types_are_not_memory_types() {
        let err = ValueVec::new(SVType::CustomUInt, 4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
    }

    #[test]
    fn tags_follow_variants() {
        let mut values = ValueVec::new(SVType::StrUtf16, 3).unwrap();
        assert_eq!(values.sv_type(), SVType::StrUtf16);
        assert_eq!(values.as_out().sv_type(), SVType::StrUtf16);
        assert_eq!(values.as_in().len(), 3);
        assert!(values.as_slice::<Utf16String>().is_some());
        assert!(values.as_slice::<String>().is_none());
    }

    #[test]
    fn copy_between_matching_buffers() {
        let src = ValueVec::from(vec![1i32, 2, 3, 4]);
        let mut dst = [0i32; 3];
        let mut out = OutBuffer::from(&mut dst);
        out.copy_from(1, &src, 2, 2).unwrap();
        assert_eq!(dst, [0, 3, 4]);
    }

    #[test]
    fn copy_between_mismatched_buffers_fails() {
        let src = ValueVec::from(vec![1i32]);
        let mut dst = [0i64; 1];
        assert!(OutBuffer::from(&mut dst).copy_from(0, &src, 0, 1).is_err());
    }

    #[test]
    fn tail_reborrows() {
        let mut dst = [0u8; 4];
        let mut out = OutBuffer::from(&mut dst);
        assert_eq!(out.tail(3).len(), 1);
    }
}
