//! Arrays whose elements live in an [`Allocator`].
//!
//! The shape is held in memory and handed to a [`MetadataSink`] when the array is synchronized
//! after a change. Elements are stored row-major and little-endian from position zero of the
//! stream. Only the first axis grows on append.

use gds_dtype::{CastFrom, CastInto, Element, NativeType, SVType};
use gds_error::{GdsResult, gds_bail, gds_err};
use gds_io::Allocator;

use crate::abstract_array::{check_rect, info_selection, resolve_region};
use crate::dim::{DimItem, check_shape, element_count, index_ptr, layout};
use crate::{ArrayMetadata, BaseIterator, MetadataSink, Selection, alloc_func, rect};

/// The stream buffer capacity for random access.
pub const SMALL_BUFFER_SIZE: usize = 4 << 10;

/// The stream buffer capacity while appending.
pub const LARGE_BUFFER_SIZE: usize = 1 << 20;

/// A validated region with its selection trimmed to the selected span of every axis.
struct RectPlan<'s> {
    start: Vec<i32>,
    length: Vec<i32>,
    masks: Option<Vec<Option<&'s [bool]>>>,
    count: usize,
}

/// The storage of a fixed-width numeric array over an [`Allocator`].
///
/// The typed operations take the storage type `A` as a parameter and fail with a `Consistency`
/// error when it is not the type the array was created with. [`Array`](crate::Array) fixes it
/// once and for all.
pub struct AllocArray {
    sv_type: SVType,
    elm_size: usize,
    bit_of: u32,
    alloc: Allocator,
    dims: Vec<DimItem>,
    total_count: i64,
    need_update: bool,
    appending: bool,
    sink: Option<Box<dyn MetadataSink>>,
}

impl AllocArray {
    /// Create a zero-filled array of shape `dims` at the start of `alloc`.
    pub fn new(mut alloc: Allocator, sv_type: SVType, dims: &[i32]) -> GdsResult<Self> {
        let (elm_size, bit_of) = Self::widths(sv_type)?;
        check_shape(dims)?;
        let total_count = element_count(dims);
        alloc.zero_fill(0, total_count as u64 * elm_size as u64)?;
        alloc.set_position(0);
        Ok(Self {
            sv_type,
            elm_size,
            bit_of,
            alloc,
            dims: layout(dims, elm_size),
            total_count,
            need_update: true,
            appending: false,
            sink: None,
        })
    }

    /// Reopen an array previously described by `metadata`.
    pub fn open(alloc: Allocator, metadata: &ArrayMetadata) -> GdsResult<Self> {
        let (elm_size, bit_of) = Self::widths(metadata.sv_type)?;
        check_shape(&metadata.dims)?;
        if bit_of != metadata.bit_of {
            gds_bail!(
                Consistency: "a {} array cannot hold {} bit elements",
                metadata.sv_type,
                metadata.bit_of
            );
        }
        let full = element_count(&metadata.dims);
        let row = layout(&metadata.dims, elm_size)[0].dim_elm_cnt;
        if metadata.total_count < full || (row > 0 && metadata.total_count >= full + row) {
            gds_bail!(
                Consistency: "{} elements do not fit the first axis length {}",
                metadata.total_count,
                metadata.dims[0]
            );
        }
        let needed = metadata.total_count as u64 * elm_size as u64;
        let size = alloc.size()?;
        if size < needed {
            gds_bail!(
                Consistency: "the stream holds {} bytes but the array needs {}",
                size,
                needed
            );
        }
        Ok(Self {
            sv_type: metadata.sv_type,
            elm_size,
            bit_of,
            alloc,
            dims: layout(&metadata.dims, elm_size),
            total_count: metadata.total_count,
            need_update: false,
            appending: false,
            sink: None,
        })
    }

    fn widths(sv_type: SVType) -> GdsResult<(usize, u32)> {
        match (sv_type.byte_width(), sv_type.bit_width()) {
            (Some(elm_size), Some(bit_of)) if sv_type.is_numeric() => Ok((elm_size, bit_of)),
            _ => Err(gds_err!(
                Conversion: "{} values cannot be stored in an allocator array",
                sv_type
            )),
        }
    }

    /// Send the metadata to `sink` whenever the array is synchronized after a change.
    pub fn with_metadata_sink(mut self, sink: impl MetadataSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn metadata(&self) -> ArrayMetadata {
        ArrayMetadata {
            sv_type: self.sv_type,
            bit_of: self.bit_of,
            dims: self.dims(),
            total_count: self.total_count,
        }
    }

    pub fn sv_type(&self) -> SVType {
        self.sv_type
    }

    /// The size of one element in bytes.
    pub fn elm_size(&self) -> usize {
        self.elm_size
    }

    pub fn bit_of(&self) -> u32 {
        self.bit_of
    }

    pub fn dim_items(&self) -> &[DimItem] {
        &self.dims
    }

    pub fn dims(&self) -> Vec<i32> {
        self.dims.iter().map(|d| d.dim_len).collect()
    }

    pub fn total_count(&self) -> i64 {
        self.total_count
    }

    /// Whether the metadata changed since the last synchronization.
    pub fn need_update(&self) -> bool {
        self.need_update
    }

    pub fn allocator(&self) -> &Allocator {
        &self.alloc
    }

    pub fn allocator_mut(&mut self) -> &mut Allocator {
        &mut self.alloc
    }

    /// Synchronize and give back the allocator.
    pub fn into_allocator(mut self) -> GdsResult<Allocator> {
        self.synchronize()?;
        Ok(self.alloc)
    }

    /// The byte position of a multi-index.
    pub fn index_ptr(&self, index: &[i32]) -> u64 {
        index_ptr(&self.dims, index)
    }

    /// Check that the `len` elements from the element offset `index` are stored.
    pub fn check_range(&self, index: i64, len: usize) -> GdsResult<()> {
        let end = index.saturating_add(len as i64);
        if index < 0 || end > self.total_count {
            gds_bail!(OutOfBounds: end, 0, self.total_count);
        }
        Ok(())
    }

    fn bytes(&self, count: i64) -> u64 {
        count as u64 * self.elm_size as u64
    }

    fn ptr(&self, index: i64) -> BaseIterator {
        BaseIterator::new(self.bytes(index))
    }

    fn check_storage<A: NativeType>(&self) -> GdsResult<()> {
        if A::SV_TYPE != self.sv_type {
            gds_bail!(
                Consistency: "{} storage accessed as {}",
                self.sv_type,
                A::SV_TYPE
            );
        }
        Ok(())
    }

    fn plan<'s>(
        &self,
        start: Option<&[i32]>,
        length: Option<&[i32]>,
        selection: Option<&Selection<'s>>,
    ) -> GdsResult<RectPlan<'s>> {
        let dims = self.dims();
        let info = info_selection(&dims, start, length, selection)?;
        let (region_start, _) = resolve_region(&dims, start, length)?;
        let count: i64 = info.iter().map(|axis| i64::from(axis.valid)).product();

        // Masks covering their whole trimmed span are dropped so those runs read directly.
        let masks = selection.map(|selection| {
            selection
                .iter()
                .copied()
                .zip(&info)
                .zip(&region_start)
                .map(|((mask, axis), &s)| {
                    mask.map(|m| &m[axis.offset_from(s)..][..axis.length as usize])
                        .filter(|m| !m.iter().all(|&keep| keep))
                })
                .collect::<Vec<_>>()
        });
        Ok(RectPlan {
            start: info.iter().map(|axis| axis.start).collect(),
            length: info.iter().map(|axis| axis.length).collect(),
            masks: masks.filter(|m| m.iter().any(Option::is_some)),
            count: usize::try_from(count).unwrap_or_default(),
        })
    }

    /// Read the selected elements of a region, returning the number written to `out`.
    pub fn read_region<A, M>(
        &mut self,
        start: Option<&[i32]>,
        length: Option<&[i32]>,
        selection: Option<&Selection<'_>>,
        out: &mut [M],
    ) -> GdsResult<usize>
    where
        A: NativeType + CastInto<M>,
        M: Element,
    {
        self.check_storage::<A>()?;
        let plan = self.plan(start, length, selection)?;
        if out.len() < plan.count {
            gds_bail!(
                "an output of {} values for a region of {} elements",
                out.len(),
                plan.count
            );
        }
        if plan.count == 0 {
            return Ok(0);
        }
        rect::read_rect_selected::<A, M>(
            &mut self.alloc,
            &self.dims,
            &plan.start,
            &plan.length,
            plan.masks.as_deref(),
            out,
        )
    }

    /// Overwrite a region with the first values of `input`.
    pub fn write_region<A, M>(
        &mut self,
        start: Option<&[i32]>,
        length: Option<&[i32]>,
        input: &[M],
    ) -> GdsResult<()>
    where
        A: NativeType + CastFrom<M>,
        M: Element,
    {
        self.check_storage::<A>()?;
        let dims = self.dims();
        let (start, length) = resolve_region(&dims, start, length)?;
        check_rect(&dims, &start, &length)?;
        let count = usize::try_from(element_count(&length)).unwrap_or_default();
        if input.len() < count {
            gds_bail!(
                "an input of {} values for a region of {} elements",
                input.len(),
                count
            );
        }
        rect::write_rect::<A, M>(&mut self.alloc, &self.dims, &start, &length, &input[..count])?;
        Ok(())
    }

    /// Append `input` after the last stored element.
    ///
    /// The first axis grows once the stored elements fill another whole row, so a trailing
    /// partial row counts towards [`total_count`](Self::total_count) but is not addressable by
    /// region operations until it is complete.
    pub fn append_values<A, M>(&mut self, input: &[M]) -> GdsResult<()>
    where
        A: NativeType + CastFrom<M>,
        M: Element,
    {
        self.check_storage::<A>()?;
        let row = self.dims[0].dim_elm_cnt;
        if row == 0 {
            gds_bail!("cannot append to an array whose rows hold no elements");
        }
        if input.is_empty() {
            return Ok(());
        }
        if !self.appending {
            self.alloc.set_buffer_capacity(LARGE_BUFFER_SIZE)?;
            self.appending = true;
        }

        let mut it = self.ptr(self.total_count);
        alloc_func::write::<A, M>(&mut self.alloc, &mut it, input)?;
        self.total_count += input.len() as i64;
        self.need_update = true;

        let len0 = i64::from(self.dims[0].dim_len);
        if self.total_count >= row * (len0 + 1) {
            let len0 = self.total_count / row;
            self.dims[0].dim_len = i32::try_from(len0)
                .map_err(|_| gds_err!(Bounds: "the first axis cannot grow to {}", len0))?;
            log::debug!("append grew the first axis to {}", len0);
        }
        Ok(())
    }

    /// Read `out.len()` elements from the element offset `index`.
    pub fn read_linear<A, M>(&mut self, index: i64, out: &mut [M]) -> GdsResult<usize>
    where
        A: NativeType + CastInto<M>,
        M: Element,
    {
        self.check_storage::<A>()?;
        self.check_range(index, out.len())?;
        let mut it = self.ptr(index);
        alloc_func::read::<A, M>(&mut self.alloc, &mut it, out)
    }

    /// Read the elements of the `sel.len()` from `index` whose `sel` entry is set.
    pub fn read_linear_selected<A, M>(
        &mut self,
        index: i64,
        out: &mut [M],
        sel: &[bool],
    ) -> GdsResult<usize>
    where
        A: NativeType + CastInto<M>,
        M: Element,
    {
        self.check_storage::<A>()?;
        self.check_range(index, sel.len())?;
        let selected = sel.iter().filter(|&&keep| keep).count();
        if out.len() < selected {
            gds_bail!(
                "an output of {} values for {} selected elements",
                out.len(),
                selected
            );
        }
        let mut it = self.ptr(index);
        alloc_func::read_ex::<A, M>(&mut self.alloc, &mut it, out, sel)
    }

    /// Overwrite stored elements from the element offset `index`.
    pub fn write_linear<A, M>(&mut self, index: i64, input: &[M]) -> GdsResult<usize>
    where
        A: NativeType + CastFrom<M>,
        M: Element,
    {
        self.check_storage::<A>()?;
        self.check_range(index, input.len())?;
        let mut it = self.ptr(index);
        alloc_func::write::<A, M>(&mut self.alloc, &mut it, input)
    }

    /// Resize one axis.
    ///
    /// Resizing the first axis grows or truncates the stream. Resizing an inner axis relays out
    /// every block of the outer axes in place; a trailing partial row is dropped first.
    pub fn set_dlen(&mut self, axis: usize, len: i32) -> GdsResult<()> {
        let mut lens = self.dims();
        if axis >= lens.len() {
            gds_bail!(OutOfBounds: axis, 0, lens.len());
        }
        let old = lens[axis];
        lens[axis] = len;
        check_shape(&lens)?;
        if old == len {
            return Ok(());
        }

        if axis == 0 {
            let new_total = i64::from(len) * self.dims[0].dim_elm_cnt;
            self.resize(new_total)?;
        } else {
            self.drop_partial_row()?;
            let outer = element_count(&lens[..axis]) as u64;
            let stride = self.dims[axis].dim_elm_size;
            let old_span = old as u64 * stride;
            let new_span = len as u64 * stride;
            if len > old {
                for o in (0..outer).rev() {
                    self.alloc.move_data(o * old_span, o * new_span, old_span)?;
                    self.alloc
                        .zero_fill(o * new_span + old_span, new_span - old_span)?;
                }
            } else {
                for o in 0..outer {
                    self.alloc.move_data(o * old_span, o * new_span, new_span)?;
                }
                self.alloc.set_size(outer * new_span)?;
            }
            self.total_count = element_count(&lens);
        }
        self.dims = layout(&lens, self.elm_size);
        self.need_update = true;
        Ok(())
    }

    /// Reshape to `lens`, keeping the linear order of the elements.
    pub fn reset_dim(&mut self, lens: &[i32]) -> GdsResult<()> {
        check_shape(lens)?;
        self.resize(element_count(lens))?;
        self.dims = layout(lens, self.elm_size);
        self.need_update = true;
        Ok(())
    }

    /// Drop every element and release the storage.
    pub fn clear(&mut self) -> GdsResult<()> {
        self.alloc.set_size(0)?;
        self.dims[0].dim_len = 0;
        self.total_count = 0;
        self.need_update = true;
        Ok(())
    }

    fn resize(&mut self, new_total: i64) -> GdsResult<()> {
        if new_total > self.total_count {
            self.alloc.zero_fill(
                self.bytes(self.total_count),
                self.bytes(new_total - self.total_count),
            )?;
        } else if new_total < self.total_count {
            self.alloc.set_size(self.bytes(new_total))?;
        }
        self.total_count = new_total;
        Ok(())
    }

    fn drop_partial_row(&mut self) -> GdsResult<()> {
        let full = element_count(&self.dims());
        if self.total_count > full {
            self.resize(full)?;
        }
        Ok(())
    }

    /// Hand changed metadata to the sink, leave append mode, and flush the stream.
    pub fn synchronize(&mut self) -> GdsResult<()> {
        if self.need_update {
            let metadata = self.metadata();
            if let Some(sink) = self.sink.as_mut() {
                sink.flush(&metadata)?;
                log::debug!(
                    "flushed metadata of a {} array with {} elements",
                    metadata.sv_type,
                    metadata.total_count
                );
            }
            self.need_update = false;
        }
        if self.appending {
            self.alloc.set_buffer_capacity(SMALL_BUFFER_SIZE)?;
            self.appending = false;
        }
        self.alloc.flush()
    }

    /// Synchronize, then finalize the stream so it can be read.
    pub fn close_writer(&mut self) -> GdsResult<()> {
        self.synchronize()?;
        self.alloc.close_writer()
    }

    pub fn stream_size(&mut self) -> GdsResult<u64> {
        self.synchronize()?;
        self.alloc.size()
    }
}

#[cfg(test)]
mod test {
    use gds_dtype::Utf32String;
    use gds_error::ErrorKind;
    use itertools::Itertools;
    use rstest::rstest;

    use super::*;
    use crate::SharedMetadata;

    fn grid(lens: &[i32]) -> AllocArray {
        let mut array = AllocArray::new(Allocator::memory(), SVType::I32, lens).unwrap();
        let count = i32::try_from(element_count(lens)).unwrap();
        array
            .write_region::<i32, i32>(None, None, &(0..count).collect_vec())
            .unwrap();
        array
    }

    fn contents(array: &mut AllocArray) -> Vec<i32> {
        let mut out = vec![0; usize::try_from(element_count(&array.dims())).unwrap()];
        array.read_region::<i32, i32>(None, None, None, &mut out).unwrap();
        out
    }

    #[test]
    fn new_array_is_zeroed() {
        let mut array = AllocArray::new(Allocator::memory(), SVType::U16, &[2, 3]).unwrap();
        assert_eq!(array.stream_size().unwrap(), 12);
        let mut out = [1u16; 6];
        array.read_region::<u16, u16>(None, None, None, &mut out).unwrap();
        assert_eq!(out, [0; 6]);
    }

    #[rstest]
    #[case(SVType::StrUtf8)]
    #[case(SVType::CustomFloat)]
    fn only_numbers_are_stored(#[case] sv_type: SVType) {
        let err = AllocArray::new(Allocator::memory(), sv_type, &[1]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Conversion);
    }

    #[test]
    fn wrong_storage_type_is_rejected() {
        let mut array = grid(&[2]);
        let mut out = [0i32; 2];
        let err = array
            .read_region::<u32, i32>(None, None, None, &mut out)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Consistency);
    }

    #[test]
    fn bounds_are_checked_before_io() {
        let mut array = grid(&[4, 3]);
        array.allocator_mut().set_position(7);
        let mut out = [0i32; 12];
        let err = array
            .read_region::<i32, i32>(Some(&[3, 0]), Some(&[2, 3]), None, &mut out)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);
        assert_eq!(array.allocator().position(), 7);
    }

    #[test]
    fn short_output_is_rejected() {
        let mut array = grid(&[4, 3]);
        let mut out = [0i32; 11];
        let err = array
            .read_region::<i32, i32>(None, None, None, &mut out)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn all_true_selection_matches_plain_read() {
        let mut array = grid(&[3, 4]);
        let rows = [true; 3];
        let cols = [true; 4];
        let selection = [Some(&rows[..]), Some(&cols[..])];
        let mut out = [0i32; 12];
        let n = array
            .read_region::<i32, i32>(None, None, Some(&selection), &mut out)
            .unwrap();
        assert_eq!(n, 12);
        assert_eq!(out.to_vec(), contents(&mut array));
    }

    #[test]
    fn selection_converts_to_text() {
        let mut array = grid(&[3, 4]);
        let rows = [false, true, true];
        let cols = [true, false, false, true];
        let selection = [Some(&rows[..]), Some(&cols[..])];
        let mut out = vec![Utf32String::default(); 4];
        let n = array
            .read_region::<i32, Utf32String>(None, None, Some(&selection), &mut out)
            .unwrap();
        assert_eq!(n, 4);
        assert_eq!(
            out.iter().map(|s| s.to_string()).collect_vec(),
            ["4", "7", "8", "11"]
        );
    }

    #[test]
    fn append_grows_first_axis_by_whole_rows() {
        let shared = SharedMetadata::new();
        let mut array = AllocArray::new(Allocator::memory(), SVType::I16, &[0, 3])
            .unwrap()
            .with_metadata_sink(shared.clone());
        array.synchronize().unwrap();
        assert_eq!(shared.flush_count(), 1);

        array.append_values::<i16, i64>(&[1, 2, 3, 4]).unwrap();
        assert_eq!(array.dims(), vec![1, 3]);
        assert_eq!(array.total_count(), 4);
        array.append_values::<i16, f64>(&[5.0, 6.4]).unwrap();
        assert_eq!(array.dims(), vec![2, 3]);
        assert_eq!(array.total_count(), 6);

        array.synchronize().unwrap();
        assert_eq!(shared.flush_count(), 2);
        assert_eq!(shared.latest().unwrap().dims, vec![2, 3]);

        let mut out = [0i16; 6];
        array.read_region::<i16, i16>(None, None, None, &mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn append_to_empty_rows_fails() {
        let mut array = AllocArray::new(Allocator::memory(), SVType::U8, &[0, 0]).unwrap();
        assert!(array.append_values::<u8, u8>(&[1]).is_err());
    }

    #[test]
    fn linear_access_is_bounded_by_stored_count() {
        let mut array = grid(&[2, 2]);
        let mut out = [0f64; 2];
        array.read_linear::<i32, f64>(2, &mut out).unwrap();
        assert_eq!(out, [2.0, 3.0]);
        let err = array.read_linear::<i32, f64>(3, &mut out).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bounds);

        array.write_linear::<i32, String>(0, &["9".to_string()]).unwrap();
        let mut out = [0i8; 2];
        let n = array
            .read_linear_selected::<i32, i8>(0, &mut out, &[true, false, false, true])
            .unwrap();
        assert_eq!(&out[..n], &[9, 3]);
    }

    #[test]
    fn grow_inner_axis_keeps_values() {
        let mut array = grid(&[3, 2]);
        array.set_dlen(1, 4).unwrap();
        assert_eq!(array.dims(), vec![3, 4]);
        assert_eq!(contents(&mut array), [0, 1, 0, 0, 2, 3, 0, 0, 4, 5, 0, 0]);
    }

    #[test]
    fn shrink_inner_axis_keeps_values() {
        let mut array = grid(&[2, 2, 3]);
        array.set_dlen(1, 1).unwrap();
        assert_eq!(contents(&mut array), [0, 1, 2, 6, 7, 8]);
        assert_eq!(array.stream_size().unwrap(), 24);
    }

    #[test]
    fn resize_first_axis() {
        let mut array = grid(&[3, 2]);
        array.set_dlen(0, 1).unwrap();
        assert_eq!(contents(&mut array), [0, 1]);
        array.set_dlen(0, 2).unwrap();
        assert_eq!(contents(&mut array), [0, 1, 0, 0]);
        assert_eq!(array.total_count(), 4);
    }

    #[test]
    fn reset_dim_keeps_linear_order() {
        let mut array = grid(&[2, 3]);
        array.reset_dim(&[4, 2]).unwrap();
        assert_eq!(contents(&mut array), [0, 1, 2, 3, 4, 5, 0, 0]);
        array.reset_dim(&[5]).unwrap();
        assert_eq!(contents(&mut array), [0, 1, 2, 3, 4]);
    }

    #[test]
    fn clear_releases_storage() {
        let mut array = grid(&[3, 2]);
        array.clear().unwrap();
        assert_eq!(array.dims(), vec![0, 2]);
        assert_eq!(array.total_count(), 0);
        assert_eq!(array.stream_size().unwrap(), 0);
    }

    #[test]
    fn reopen_from_metadata() {
        let mut array = grid(&[2, 3]);
        let metadata = array.metadata();
        let alloc = array.into_allocator().unwrap();
        let mut reopened = AllocArray::open(alloc, &metadata).unwrap();
        assert_eq!(contents(&mut reopened), [0, 1, 2, 3, 4, 5]);

        let mut bigger = metadata;
        bigger.dims = vec![3, 3];
        bigger.total_count = 9;
        let err = AllocArray::open(reopened.into_allocator().unwrap(), &bigger)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Consistency);
    }
}
