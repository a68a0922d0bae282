//! Rectangular traversal of a region of an array.
//!
//! A region is walked depth first with the first axis varying slowest. Each visit covers one
//! contiguous run along the innermost axis, so every rectangular read, masked read, or write issues
//! one chunked transfer per run.

use gds_dtype::{CastFrom, CastInto, Element, NativeType};
use gds_error::GdsResult;
use gds_io::Allocator;

use crate::dim::{ArrayDim, DimItem, MAX_ARRAY_DIM, index_ptr};
use crate::{BaseIterator, Selection, alloc_func};

/// Visit every innermost run of the region `[start, start + length)`.
///
/// `visit` receives the multi-index of the first element of the run and the mask of the innermost
/// axis, if any. Indices deselected on an outer axis are skipped without a visit, as are runs whose
/// innermost mask selects nothing. The cursor lives on the stack, whatever the rank.
pub fn for_each_run(
    start: &[i32],
    length: &[i32],
    selection: Option<&Selection<'_>>,
    mut visit: impl FnMut(&[i32], Option<&[bool]>) -> GdsResult<()>,
) -> GdsResult<()> {
    let rank = start.len();
    debug_assert!(rank <= MAX_ARRAY_DIM && length.len() == rank);
    if rank == 0 || length.iter().any(|&len| len <= 0) {
        return Ok(());
    }

    let mask = |axis: usize| selection.and_then(|s| s.get(axis).copied().flatten());
    let last = rank - 1;
    let inner = mask(last);
    if inner.is_some_and(|m| !m.contains(&true)) {
        return Ok(());
    }

    let mut index: ArrayDim = [0; MAX_ARRAY_DIM];
    let mut remaining: ArrayDim = [0; MAX_ARRAY_DIM];
    index[..rank].copy_from_slice(start);
    remaining[..rank].copy_from_slice(length);

    let selected = |axis: usize, i: i32| {
        mask(axis).is_none_or(|m| m.get((i - start[axis]) as usize).copied().unwrap_or(false))
    };

    // Descend to the innermost axis, skipping deselected indices on the way down.
    let mut depth = 0;
    loop {
        if depth < last {
            if remaining[depth] == 0 {
                // This axis is exhausted: rewind it and step the enclosing one.
                index[depth] = start[depth];
                remaining[depth] = length[depth];
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
                index[depth] += 1;
                remaining[depth] -= 1;
                continue;
            }
            if selected(depth, index[depth]) {
                depth += 1;
            } else {
                index[depth] += 1;
                remaining[depth] -= 1;
            }
            continue;
        }

        visit(&index[..rank], inner)?;
        if depth == 0 {
            return Ok(());
        }
        depth -= 1;
        index[depth] += 1;
        remaining[depth] -= 1;
    }
}

/// Read the region into `out` as values of type `M`, returning the count written.
///
/// `out` must hold the product of `length`.
pub fn read_rect<A, M>(
    alloc: &mut Allocator,
    dims: &[DimItem],
    start: &[i32],
    length: &[i32],
    out: &mut [M],
) -> GdsResult<usize>
where
    A: NativeType + CastInto<M>,
    M: Element,
{
    read_rect_selected::<A, M>(alloc, dims, start, length, None, out)
}

/// Read the selected elements of the region into `out`, returning the count written.
///
/// `out` must hold the number of selected elements.
pub fn read_rect_selected<A, M>(
    alloc: &mut Allocator,
    dims: &[DimItem],
    start: &[i32],
    length: &[i32],
    selection: Option<&Selection<'_>>,
    out: &mut [M],
) -> GdsResult<usize>
where
    A: NativeType + CastInto<M>,
    M: Element,
{
    let Some(&run) = length.last() else {
        return Ok(0);
    };
    let run = usize::try_from(run).unwrap_or_default();
    let mut written = 0;
    for_each_run(start, length, selection, |index, mask| {
        let mut it = BaseIterator::new(index_ptr(dims, index));
        log::trace!("read run of {} at {}", run, it.ptr);
        written += match mask {
            None => alloc_func::read::<A, M>(alloc, &mut it, &mut out[written..written + run])?,
            Some(mask) => alloc_func::read_ex::<A, M>(alloc, &mut it, &mut out[written..], mask)?,
        };
        Ok(())
    })?;
    Ok(written)
}

/// Write `input` over the region, returning the count consumed.
///
/// `input` must hold the product of `length`.
pub fn write_rect<A, M>(
    alloc: &mut Allocator,
    dims: &[DimItem],
    start: &[i32],
    length: &[i32],
    input: &[M],
) -> GdsResult<usize>
where
    A: NativeType + CastFrom<M>,
    M: Element,
{
    let Some(&run) = length.last() else {
        return Ok(0);
    };
    let run = usize::try_from(run).unwrap_or_default();
    let mut consumed = 0;
    for_each_run(start, length, None, |index, _| {
        let mut it = BaseIterator::new(index_ptr(dims, index));
        consumed += alloc_func::write::<A, M>(alloc, &mut it, &input[consumed..consumed + run])?;
        Ok(())
    })?;
    Ok(consumed)
}
