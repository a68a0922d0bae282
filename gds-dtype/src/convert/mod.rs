//! The value conversion matrix.
//!
//! [`CastFrom`] is implemented for every ordered pair of [`Element`] types. Numeric pairs follow
//! `as` semantics except that float to integer rounds half away from zero before saturating.
//! Numbers format as their canonical decimal text, text parses leniently back into numbers, and
//! the string encodings transcode into one another. The same-type pairs expose an identity view
//! so bulk transfers can skip the conversion loop entirely.

#![allow(clippy::cast_possible_truncation)]

mod parse;
pub mod simd;

pub use parse::{parse_float, parse_int};

use crate::{Element, Text, Utf16String, Utf32String};

/// Conversion of values of type `S` into `Self`.
pub trait CastFrom<S>: Sized {
    /// Convert one value.
    fn cast_from(src: &S) -> Self;

    /// Convert `min(dst.len(), src.len())` contiguous values, returning the count written.
    #[inline]
    fn cast_slice(dst: &mut [Self], src: &[S]) -> usize {
        dst.iter_mut()
            .zip(src)
            .map(|(d, s)| *d = Self::cast_from(s))
            .count()
    }

    /// Convert the values of `src` whose `sel` entry is set, packing them at the front of `dst`.
    ///
    /// Every entry of `sel` is inspected, one per source value. Returns the count written.
    #[inline]
    fn cast_slice_selected(dst: &mut [Self], src: &[S], sel: &[bool]) -> usize {
        debug_assert_eq!(src.len(), sel.len());
        let selected = src
            .iter()
            .zip(sel)
            .filter_map(|(s, &keep)| keep.then_some(s));
        dst.iter_mut()
            .zip(selected)
            .map(|(d, s)| *d = Self::cast_from(s))
            .count()
    }

    /// View a destination buffer as a source buffer when `S` and `Self` are the same type.
    #[inline]
    fn identity_mut(_dst: &mut [Self]) -> Option<&mut [S]> {
        None
    }

    /// View a source buffer as a destination buffer when `S` and `Self` are the same type.
    #[inline]
    fn identity_ref(_src: &[S]) -> Option<&[Self]> {
        None
    }
}

/// The reverse view of [`CastFrom`], implemented for every pair that has one.
///
/// Generic code that only knows its source type uses this to reach every destination.
pub trait CastInto<D>: Sized {
    /// Convert one value.
    fn cast_into(&self) -> D;

    /// See [`CastFrom::cast_slice`].
    fn cast_into_slice(src: &[Self], dst: &mut [D]) -> usize;

    /// See [`CastFrom::cast_slice_selected`].
    fn cast_into_selected(src: &[Self], dst: &mut [D], sel: &[bool]) -> usize;

    /// See [`CastFrom::identity_mut`].
    fn identity_of(dst: &mut [D]) -> Option<&mut [Self]>;
}

impl<S, D: CastFrom<S>> CastInto<D> for S {
    #[inline]
    fn cast_into(&self) -> D {
        D::cast_from(self)
    }

    #[inline]
    fn cast_into_slice(src: &[Self], dst: &mut [D]) -> usize {
        D::cast_slice(dst, src)
    }

    #[inline]
    fn cast_into_selected(src: &[Self], dst: &mut [D], sel: &[bool]) -> usize {
        D::cast_slice_selected(dst, src, sel)
    }

    #[inline]
    fn identity_of(dst: &mut [D]) -> Option<&mut [Self]> {
        D::identity_mut(dst)
    }
}

/// An element that converts to and from every other element type.
pub trait Convertible:
    CastFrom<i8>
    + CastFrom<u8>
    + CastFrom<i16>
    + CastFrom<u16>
    + CastFrom<i32>
    + CastFrom<u32>
    + CastFrom<i64>
    + CastFrom<u64>
    + CastFrom<f32>
    + CastFrom<f64>
    + CastFrom<String>
    + CastFrom<Utf16String>
    + CastFrom<Utf32String>
    + CastInto<i8>
    + CastInto<u8>
    + CastInto<i16>
    + CastInto<u16>
    + CastInto<i32>
    + CastInto<u32>
    + CastInto<i64>
    + CastInto<u64>
    + CastInto<f32>
    + CastInto<f64>
    + CastInto<String>
    + CastInto<Utf16String>
    + CastInto<Utf32String>
{
}

impl<T> Convertible for T where
    T: CastFrom<i8>
        + CastFrom<u8>
        + CastFrom<i16>
        + CastFrom<u16>
        + CastFrom<i32>
        + CastFrom<u32>
        + CastFrom<i64>
        + CastFrom<u64>
        + CastFrom<f32>
        + CastFrom<f64>
        + CastFrom<String>
        + CastFrom<Utf16String>
        + CastFrom<Utf32String>
        + CastInto<i8>
        + CastInto<u8>
        + CastInto<i16>
        + CastInto<u16>
        + CastInto<i32>
        + CastInto<u32>
        + CastInto<i64>
        + CastInto<u64>
        + CastInto<f32>
        + CastInto<f64>
        + CastInto<String>
        + CastInto<Utf16String>
        + CastInto<Utf32String>
{
}

/// Convert one value.
#[inline]
pub fn val_cvt<D: CastFrom<S>, S>(src: &S) -> D {
    D::cast_from(src)
}

/// Convert contiguous values, returning the count written.
#[inline]
pub fn cvt<D: CastFrom<S>, S>(dst: &mut [D], src: &[S]) -> usize {
    D::cast_slice(dst, src)
}

/// Convert the selected values, returning the count written.
#[inline]
pub fn cvt_sub<D: CastFrom<S>, S>(dst: &mut [D], src: &[S], sel: &[bool]) -> usize {
    D::cast_slice_selected(dst, src, sel)
}

macro_rules! impl_cast {
    ($src:ty => [$($dst:ty),+ $(,)?], |$v:ident| $conv:expr) => {
        $(
            impl CastFrom<$src> for $dst {
                #[inline]
                fn cast_from($v: &$src) -> Self {
                    $conv
                }
            }
        )+
    };
}

macro_rules! impl_cast_each {
    ([$($src:ty),+ $(,)?] => $dst:tt, |$v:ident| $conv:expr) => {
        $( impl_cast!($src => $dst, |$v| $conv); )+
    };
}

macro_rules! impl_identity {
    ($($T:ty),+ $(,)?) => {
        $(
            impl CastFrom<$T> for $T {
                #[inline]
                fn cast_from(src: &$T) -> Self {
                    src.clone()
                }

                #[inline]
                fn cast_slice(dst: &mut [Self], src: &[$T]) -> usize {
                    let n = dst.len().min(src.len());
                    dst[..n].clone_from_slice(&src[..n]);
                    n
                }

                #[inline]
                fn identity_mut(dst: &mut [Self]) -> Option<&mut [$T]> {
                    Some(dst)
                }

                #[inline]
                fn identity_ref(src: &[$T]) -> Option<&[Self]> {
                    Some(src)
                }
            }
        )+
    };
}

macro_rules! impl_narrow_simd {
    ($src:ty => [$($dst:ty),+]) => {
        $(
            impl CastFrom<$src> for $dst {
                #[inline]
                fn cast_from(src: &$src) -> Self {
                    *src as Self
                }

                #[inline]
                fn cast_slice(dst: &mut [Self], src: &[$src]) -> usize {
                    simd::narrow(dst, src)
                }

                #[inline]
                fn cast_slice_selected(dst: &mut [Self], src: &[$src], sel: &[bool]) -> usize {
                    simd::narrow_selected(dst, src, sel)
                }
            }
        )+
    };
}

impl_identity!(
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

// Integer sources.
impl_cast!(i8 => [u8, i16, u16, i32, u32, i64, u64, f32, f64], |v| *v as Self);
impl_cast!(u8 => [i8, i16, u16, i32, u32, i64, u64, f32, f64], |v| *v as Self);
impl_cast!(i16 => [i8, u8, u16, i32, u32, i64, u64, f32, f64], |v| *v as Self);
impl_cast!(u16 => [i8, u8, i16, i32, u32, i64, u64, f32, f64], |v| *v as Self);
impl_cast!(i32 => [i16, u16, u32, i64, u64, f32, f64], |v| *v as Self);
impl_cast!(u32 => [i16, u16, i32, i64, u64, f32, f64], |v| *v as Self);
impl_cast!(i64 => [i8, u8, i16, u16, i32, u32, u64, f32, f64], |v| *v as Self);
impl_cast!(u64 => [i8, u8, i16, u16, i32, u32, i64, f32, f64], |v| *v as Self);
impl_narrow_simd!(i32 => [i8, u8]);
impl_narrow_simd!(u32 => [i8, u8]);

// Float sources.
impl_cast_each!([f32, f64] => [i8, u8, i16, u16, i32, u32, i64, u64], |v| v.round() as Self);
impl_cast!(f32 => [f64], |v| *v as Self);
impl_cast!(f64 => [f32], |v| *v as Self);

// Numbers to text.
impl_cast_each!(
    [i8, u8, i16, u16, i32, u32, i64, u64, f32, f64] => [String, Utf16String, Utf32String],
    |v| Self::from_text(&v.to_string())
);

// Text to numbers.
impl_cast_each!(
    [String, Utf16String, Utf32String] => [i8, u8, i16, u16, i32, u32, i64, u64],
    |v| parse_int(&v.text())
);
impl_cast_each!(
    [String, Utf16String, Utf32String] => [f32, f64],
    |v| parse_float(&v.text())
);

// Text to text.
impl_cast!(String => [Utf16String, Utf32String], |v| Self::from_text(v));
impl_cast!(Utf16String => [String, Utf32String], |v| Self::from_text(&v.text()));
impl_cast!(Utf32String => [String, Utf16String], |v| Self::from_text(&v.text()));

/// Statically check that `T` reaches every element type in both directions.
#[allow(dead_code)]
const fn assert_convertible<T: Convertible + Element>() {}

const _: () = {
    assert_convertible::<i8>();
    assert_convertible::<u8>();
    assert_convertible::<i16>();
    assert_convertible::<u16>();
    assert_convertible::<i32>();
    assert_convertible::<u32>();
    assert_convertible::<i64>();
    assert_convertible::<u64>();
    assert_convertible::<f32>();
    assert_convertible::<f64>();
    assert_convertible::<String>();
    assert_convertible::<Utf16String>();
    assert_convertible::<Utf32String>();
};

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(2.5, 3)]
    #[case(-2.5, -3)]
    #[case(2.4999, 2)]
    #[case(-0.4, 0)]
    #[case(1e20, i32::MAX)]
    #[case(f64::NAN, 0)]
    fn float_to_int_rounds(#[case] value: f64, #[case] expected: i32) {
        assert_eq!(val_cvt::<i32, f64>(&value), expected);
    }

    #[test]
    fn integer_narrowing_wraps() {
        assert_eq!(val_cvt::<u8, i16>(&-1), 255);
        assert_eq!(val_cvt::<i8, u64>(&0x1_80), -128);
        assert_eq!(val_cvt::<u32, i64>(&-1), u32::MAX);
    }

    #[test]
    fn numbers_format_as_decimal_text() {
        assert_eq!(val_cvt::<String, i32>(&-42), "-42");
        assert_eq!(val_cvt::<String, f64>(&0.5), "0.5");
        assert_eq!(val_cvt::<String, f32>(&3.0), "3");
        assert_eq!(val_cvt::<Utf16String, u8>(&7), Utf16String::from("7"));
        assert_eq!(val_cvt::<Utf32String, i64>(&10), Utf32String::from("10"));
    }

    #[rstest]
    #[case("12", 12)]
    #[case("  -7 ", -7)]
    #[case("3.6", 4)]
    #[case("1e2", 100)]
    #[case("abc", 0)]
    #[case("", 0)]
    fn text_parses_leniently_to_int(#[case] text: &str, #[case] expected: i64) {
        assert_eq!(val_cvt::<i64, String>(&text.to_string()), expected);
        assert_eq!(val_cvt::<i64, Utf16String>(&Utf16String::from(text)), expected);
    }

    #[test]
    fn text_parses_leniently_to_float() {
        assert_eq!(val_cvt::<f64, String>(&"2.5".to_string()), 2.5);
        assert!(val_cvt::<f32, Utf32String>(&Utf32String::from("x")).is_nan());
    }

    #[test]
    fn text_transcodes() {
        let utf8 = "naïve".to_string();
        let utf16: Utf16String = val_cvt(&utf8);
        let utf32: Utf32String = val_cvt(&utf16);
        assert_eq!(utf32.len(), 5);
        assert_eq!(val_cvt::<String, Utf32String>(&utf32), utf8);
    }

    #[test]
    fn selected_conversion_packs_front() {
        let src = [1.4f32, 2.6, 3.5, 4.0];
        let mut dst = [0i16; 4];
        let n = cvt_sub(&mut dst, &src, &[true, false, true, true]);
        assert_eq!(n, 3);
        assert_eq!(&dst[..n], &[1, 4, 4]);
    }

    #[test]
    fn identity_views_only_for_same_type() {
        let mut buf = [0i32; 4];
        assert!(<i32 as CastFrom<i32>>::identity_mut(&mut buf).is_some());
        assert!(<i64 as CastFrom<i32>>::identity_ref(&buf).is_none());
        let mut wide = [0i64; 2];
        assert!(<i32 as CastInto<i64>>::identity_of(&mut wide).is_none());
    }

    #[test]
    fn cast_slice_truncates_to_shorter() {
        let mut dst = [0u16; 2];
        assert_eq!(cvt(&mut dst, &[1u8, 2, 3]), 2);
        assert_eq!(dst, [1, 2]);
    }
}
