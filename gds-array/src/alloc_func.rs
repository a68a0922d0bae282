//! Chunked transfer of elements between an [`Allocator`] and typed memory buffers.
//!
//! When the memory type differs from the storage type, values pass through a scratch buffer of at
//! most [`ALLOC_FUNC_BUFFER`] bytes and are converted one chunk at a time. Every operation advances
//! the iterator by `n` storage elements, where `n` is the number of elements scanned.

use gds_dtype::{CastFrom, CastInto, Element, NativeType};
use gds_error::GdsResult;
use gds_io::Allocator;
use static_assertions::const_assert;

use crate::BaseIterator;

/// The byte bound of the conversion scratch buffer.
pub const ALLOC_FUNC_BUFFER: usize = 0x10000;

const_assert!(ALLOC_FUNC_BUFFER % size_of::<u64>() == 0);

fn chunk_len<A>() -> usize {
    ALLOC_FUNC_BUFFER / size_of::<A>()
}

fn advance<A>(it: &mut BaseIterator, n: usize) {
    it.ptr += (n * size_of::<A>()) as u64;
}

/// Read `buf.len()` storage elements of type `A` at `it` into `buf`.
pub fn read<A, M>(alloc: &mut Allocator, it: &mut BaseIterator, buf: &mut [M]) -> GdsResult<usize>
where
    A: NativeType + CastInto<M>,
    M: Element,
{
    let n = buf.len();
    alloc.set_position(it.ptr);
    if let Some(direct) = A::identity_of(buf) {
        alloc.read_values(direct)?;
    } else {
        let mut scratch = vec![A::default(); chunk_len::<A>().min(n)];
        for out in buf.chunks_mut(scratch.len().max(1)) {
            let scratch = &mut scratch[..out.len()];
            alloc.read_values(scratch)?;
            A::cast_into_slice(scratch, out);
        }
    }
    advance::<A>(it, n);
    Ok(n)
}

/// Read `sel.len()` storage elements at `it`, keeping those whose `sel` entry is set.
///
/// The kept values are packed at the front of `buf`; returns how many there are.
pub fn read_ex<A, M>(
    alloc: &mut Allocator,
    it: &mut BaseIterator,
    buf: &mut [M],
    sel: &[bool],
) -> GdsResult<usize>
where
    A: NativeType + CastInto<M>,
    M: Element,
{
    let n = sel.len();
    alloc.set_position(it.ptr);
    let mut scratch = vec![A::default(); chunk_len::<A>().min(n)];
    let mut written = 0;
    for mask in sel.chunks(scratch.len().max(1)) {
        let scratch = &mut scratch[..mask.len()];
        alloc.read_values(scratch)?;
        written += A::cast_into_selected(scratch, &mut buf[written..], mask);
    }
    advance::<A>(it, n);
    Ok(written)
}

/// Write `buf` as storage elements of type `A` at `it`.
pub fn write<A, M>(alloc: &mut Allocator, it: &mut BaseIterator, buf: &[M]) -> GdsResult<usize>
where
    A: NativeType + CastFrom<M>,
    M: Element,
{
    let n = buf.len();
    alloc.set_position(it.ptr);
    if let Some(direct) = A::identity_ref(buf) {
        alloc.write_values(direct)?;
    } else {
        let mut scratch = vec![A::default(); chunk_len::<A>().min(n)];
        for input in buf.chunks(scratch.len().max(1)) {
            let scratch = &mut scratch[..input.len()];
            A::cast_slice(scratch, input);
            alloc.write_values(scratch)?;
        }
    }
    advance::<A>(it, n);
    Ok(n)
}

#[cfg(test)]
mod test {
    use gds_dtype::Utf16String;

    use super::*;

    fn filled(values: &[i32]) -> Allocator {
        let mut alloc = Allocator::memory();
        alloc.write_values(values).unwrap();
        alloc
    }

    #[test]
    fn same_type_direct() {
        let mut alloc = filled(&[5, 6, 7, 8]);
        let mut it = BaseIterator::new(4);
        let mut out = [0i32; 2];
        assert_eq!(read::<i32, i32>(&mut alloc, &mut it, &mut out).unwrap(), 2);
        assert_eq!(out, [6, 7]);
        assert_eq!(it.ptr, 12);
    }

    #[test]
    fn converting_read_spans_chunks() {
        let values: Vec<i32> = (0..50_000).collect();
        let mut alloc = filled(&values);
        let mut it = BaseIterator::new(0);
        let mut out = vec![0f64; values.len()];
        read::<i32, f64>(&mut alloc, &mut it, &mut out).unwrap();
        assert!(out.iter().zip(&values).all(|(&o, &v)| o == f64::from(v)));
        assert_eq!(it.ptr, 200_000);
    }

    #[test]
    fn masked_read_advances_by_scanned() {
        let mut alloc = filled(&[1, 2, 3, 4, 5]);
        let mut it = BaseIterator::new(0);
        let mut out = vec![String::new(); 5];
        let n = read_ex::<i32, String>(
            &mut alloc,
            &mut it,
            &mut out,
            &[false, true, false, true, true],
        )
        .unwrap();
        assert_eq!(n, 3);
        assert_eq!(&out[..n], &["2", "4", "5"]);
        assert_eq!(it.ptr, 20);
    }

    #[test]
    fn masked_read_selecting_nothing_still_advances() {
        let mut alloc = filled(&[1, 2]);
        let mut it = BaseIterator::new(0);
        let mut out = [0u8; 2];
        assert_eq!(
            read_ex::<i32, u8>(&mut alloc, &mut it, &mut out, &[false, false]).unwrap(),
            0
        );
        assert_eq!(it.ptr, 8);
    }

    #[test]
    fn converting_write() {
        let mut alloc = Allocator::memory();
        let mut it = BaseIterator::new(0);
        let input = [Utf16String::from("7"), Utf16String::from("2.5")];
        write::<i16, Utf16String>(&mut alloc, &mut it, &input).unwrap();
        assert_eq!(it.ptr, 4);

        let mut it = BaseIterator::new(0);
        let mut out = [0i16; 2];
        read::<i16, i16>(&mut alloc, &mut it, &mut out).unwrap();
        assert_eq!(out, [7, 3]);
    }
}
