//! Narrowing of 32-bit integers to their low byte, vectorised where the target allows.
//!
//! The vector kernels keep exactly the low eight bits of every source value, which is what `as`
//! does. [`scalar`] holds the element-at-a-time reference the vector paths must agree with.

#![allow(clippy::cast_possible_truncation)]

const LANES: usize = 16;

/// A 32-bit integer whose bits can be viewed as `i32`.
pub trait Word: Copy {
    /// The 32 bits of this value.
    fn bits(self) -> i32;
}

impl Word for i32 {
    #[inline(always)]
    fn bits(self) -> i32 {
        self
    }
}

impl Word for u32 {
    #[inline(always)]
    fn bits(self) -> i32 {
        self as i32
    }
}

/// An 8-bit integer built from a raw byte.
pub trait LowByte: Copy + Default {
    /// Reinterpret a byte.
    fn from_low_byte(byte: u8) -> Self;
}

impl LowByte for u8 {
    #[inline(always)]
    fn from_low_byte(byte: u8) -> Self {
        byte
    }
}

impl LowByte for i8 {
    #[inline(always)]
    fn from_low_byte(byte: u8) -> Self {
        byte as i8
    }
}

cfg_if::cfg_if! {
    if #[cfg(all(target_arch = "x86_64", target_feature = "sse2"))] {
        /// The name of the kernel selected for this build.
        pub const KERNEL: &str = "sse2";

        #[inline]
        fn low_bytes<S: Word>(src: &[S; LANES]) -> [u8; LANES] {
            use std::arch::x86_64::{
                __m128i, _mm_and_si128, _mm_loadu_si128, _mm_packs_epi32, _mm_packus_epi16,
                _mm_set1_epi32, _mm_storeu_si128,
            };

            let words: [i32; LANES] = src.map(Word::bits);
            let mut out = [0u8; LANES];
            let ptr = words.as_ptr().cast::<__m128i>();
            // SAFETY: sse2 is enabled for this target, and the unaligned loads and the store stay
            // within the 64 bytes of `words` and the 16 bytes of `out`.
            unsafe {
                let mask = _mm_set1_epi32(0xFF);
                let a = _mm_and_si128(_mm_loadu_si128(ptr), mask);
                let b = _mm_and_si128(_mm_loadu_si128(ptr.add(1)), mask);
                let c = _mm_and_si128(_mm_loadu_si128(ptr.add(2)), mask);
                let d = _mm_and_si128(_mm_loadu_si128(ptr.add(3)), mask);
                // Every lane is within 0..=255, so neither pack saturates.
                let packed = _mm_packus_epi16(_mm_packs_epi32(a, b), _mm_packs_epi32(c, d));
                _mm_storeu_si128(out.as_mut_ptr().cast::<__m128i>(), packed);
            }
            out
        }
    } else {
        /// The name of the kernel selected for this build.
        pub const KERNEL: &str = "scalar";

        #[inline]
        fn low_bytes<S: Word>(src: &[S; LANES]) -> [u8; LANES] {
            src.map(|v| v.bits() as u8)
        }
    }
}

/// Narrow `min(dst.len(), src.len())` values, returning the count written.
pub fn narrow<S: Word, D: LowByte>(dst: &mut [D], src: &[S]) -> usize {
    let n = dst.len().min(src.len());
    let (dst, src) = (&mut dst[..n], &src[..n]);

    let mut dst_chunks = dst.chunks_exact_mut(LANES);
    let mut src_chunks = src.chunks_exact(LANES);
    for (d, s) in (&mut dst_chunks).zip(&mut src_chunks) {
        if let Ok(lanes) = <&[S; LANES]>::try_from(s) {
            d.iter_mut()
                .zip(low_bytes(lanes))
                .for_each(|(d, b)| *d = D::from_low_byte(b));
        }
    }
    scalar::narrow(dst_chunks.into_remainder(), src_chunks.remainder());
    n
}

/// Narrow the values whose `sel` entry is set, packing them at the front of `dst`.
///
/// `sel` holds one entry per source value. Returns the count written.
pub fn narrow_selected<S: Word, D: LowByte>(dst: &mut [D], src: &[S], sel: &[bool]) -> usize {
    debug_assert_eq!(src.len(), sel.len());
    let mut written = 0;

    let mut src_chunks = src.chunks_exact(LANES);
    let mut sel_chunks = sel.chunks_exact(LANES);
    for (s, m) in (&mut src_chunks).zip(&mut sel_chunks) {
        if let Ok(lanes) = <&[S; LANES]>::try_from(s) {
            let bytes = low_bytes(lanes);
            for (b, _) in bytes.iter().zip(m).filter(|(_, keep)| **keep) {
                if written == dst.len() {
                    return written;
                }
                dst[written] = D::from_low_byte(*b);
                written += 1;
            }
        }
    }
    written
        + scalar::narrow_selected(
            &mut dst[written..],
            src_chunks.remainder(),
            sel_chunks.remainder(),
        )
}

/// The element-at-a-time reference kernels.
pub mod scalar {
    use super::{LowByte, Word};

    /// See [`super::narrow`].
    pub fn narrow<S: Word, D: LowByte>(dst: &mut [D], src: &[S]) -> usize {
        dst.iter_mut()
            .zip(src)
            .map(|(d, s)| *d = D::from_low_byte(s.bits() as u8))
            .count()
    }

    /// See [`super::narrow_selected`].
    pub fn narrow_selected<S: Word, D: LowByte>(dst: &mut [D], src: &[S], sel: &[bool]) -> usize {
        let selected = src
            .iter()
            .zip(sel)
            .filter_map(|(s, &keep)| keep.then_some(s));
        dst.iter_mut()
            .zip(selected)
            .map(|(d, s)| *d = D::from_low_byte(s.bits() as u8))
            .count()
    }
}
