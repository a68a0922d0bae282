use gds_dtype::{InBuffer, OutBuffer, SVType, ValueVec};
use gds_error::{GdsResult, gds_bail, gds_err};

use crate::dim::{DimItem, element_count};
use crate::{ArrayIterator, AxisSelection, Selection};

/// Elements moved per round by [`AbstractArray::append_from`].
const APPEND_CHUNK: usize = 0x4000;

/// An N-dimensional array of one storage type.
///
/// Regions are described by an optional `start` and `length` per axis. A missing `start` means
/// the origin and a missing `length` the remaining extent of every axis, so passing neither
/// addresses the whole array. Region reads and writes convert between the storage type and the
/// memory type of the buffer.
pub trait AbstractArray: Send {
    /// The storage type.
    fn sv_type(&self) -> SVType;

    /// The number of bits one stored element occupies.
    fn bit_of(&self) -> u32;

    /// Whether the storage type is a plain number.
    fn is_primitive(&self) -> bool {
        self.sv_type().is_numeric()
    }

    /// The layout of every axis, slowest first.
    fn dim_items(&self) -> &[DimItem];

    /// The rank.
    fn dim_cnt(&self) -> usize {
        self.dim_items().len()
    }

    /// The length of every axis.
    fn dims(&self) -> Vec<i32> {
        self.dim_items().iter().map(|d| d.dim_len).collect()
    }

    /// The length of one axis.
    fn dlen(&self, axis: usize) -> GdsResult<i32> {
        self.dim_items()
            .get(axis)
            .map(|d| d.dim_len)
            .ok_or_else(|| gds_err!(OutOfBounds: axis, 0, self.dim_cnt()))
    }

    /// Resize one axis, keeping the values at every index that survives.
    fn set_dlen(&mut self, axis: usize, len: i32) -> GdsResult<()>;

    /// Reshape the array. Elements keep their linear order; growth is zero filled.
    fn reset_dim(&mut self, lens: &[i32]) -> GdsResult<()>;

    /// The number of elements addressable by region operations.
    fn total_array_count(&self) -> i64 {
        element_count(&self.dims())
    }

    /// The number of elements stored, including a trailing partial row left by appends.
    fn total_count(&self) -> i64;

    fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    /// Drop every element, leaving the first axis empty.
    fn clear(&mut self) -> GdsResult<()>;

    /// Read a region into `out`, returning the number of elements written.
    fn read_data(
        &mut self,
        start: Option<&[i32]>,
        length: Option<&[i32]>,
        out: OutBuffer<'_>,
    ) -> GdsResult<usize> {
        self.read_data_ex(start, length, None, out)
    }

    /// Read the selected elements of a region into `out`, returning the number written.
    ///
    /// The region is validated before any I/O. Exactly the product of the per-axis valid counts
    /// of [`get_info_selection`](Self::get_info_selection) is produced.
    fn read_data_ex(
        &mut self,
        start: Option<&[i32]>,
        length: Option<&[i32]>,
        selection: Option<&Selection<'_>>,
        out: OutBuffer<'_>,
    ) -> GdsResult<usize>;

    /// Overwrite a region with the values of `input`.
    fn write_data(
        &mut self,
        start: Option<&[i32]>,
        length: Option<&[i32]>,
        input: InBuffer<'_>,
    ) -> GdsResult<()>;

    /// Append `input` after the last stored element, growing the first axis.
    fn append(&mut self, input: InBuffer<'_>) -> GdsResult<()>;

    /// Append `count` elements of `src` starting at its element offset `start`.
    fn append_from(&mut self, src: &mut dyn AbstractArray, start: i64, count: i64) -> GdsResult<()> {
        let end = start
            .checked_add(count)
            .ok_or_else(|| gds_err!(OutOfBounds: start, 0, src.total_count()))?;
        if start < 0 || count < 0 || end > src.total_count() {
            gds_bail!(OutOfBounds: end, 0, src.total_count());
        }
        let total = usize::try_from(count).unwrap_or(usize::MAX);
        let mut buffer = ValueVec::new(src.sv_type(), total.min(APPEND_CHUNK))?;
        let mut index = start;
        let mut done = 0;
        while done < total {
            buffer.truncate(APPEND_CHUNK.min(total - done));
            index += src.iter_read(index, buffer.as_out())? as i64;
            self.append(buffer.as_in())?;
            done += buffer.len();
        }
        Ok(())
    }

    /// Read `out.len()` elements starting at the element offset `index`.
    fn iter_read(&mut self, index: i64, out: OutBuffer<'_>) -> GdsResult<usize>;

    /// Read the elements of the `sel.len()` starting at `index` whose `sel` entry is set.
    fn iter_read_ex(&mut self, index: i64, out: OutBuffer<'_>, sel: &[bool]) -> GdsResult<usize>;

    /// Overwrite the elements starting at the element offset `index`.
    fn iter_write(&mut self, index: i64, input: InBuffer<'_>) -> GdsResult<usize>;

    /// Flush pending metadata and buffered writes.
    fn synchronize(&mut self) -> GdsResult<()>;

    /// Finish writing, making a write-only stream readable.
    fn close_writer(&mut self) -> GdsResult<()>;

    /// The size of the backing stream in bytes, after synchronizing.
    fn stream_size(&mut self) -> GdsResult<u64>;

    /// Resolve a region and its selection into the effect on every axis.
    fn get_info_selection(
        &self,
        start: Option<&[i32]>,
        length: Option<&[i32]>,
        selection: Option<&Selection<'_>>,
    ) -> GdsResult<Vec<AxisSelection>> {
        info_selection(&self.dims(), start, length, selection)
    }

    /// Check that `[start, start + length)` lies within the array on every axis.
    fn check_rect(&self, start: &[i32], length: &[i32]) -> GdsResult<()> {
        check_rect(&self.dims(), start, length)
    }

    /// Read the selected elements of a region into a new buffer of memory type `sv_type`.
    fn read_values(
        &mut self,
        sv_type: SVType,
        start: Option<&[i32]>,
        length: Option<&[i32]>,
        selection: Option<&Selection<'_>>,
    ) -> GdsResult<ValueVec> {
        let count: i64 = self
            .get_info_selection(start, length, selection)?
            .iter()
            .map(|axis| i64::from(axis.valid))
            .product();
        let mut values = ValueVec::new(sv_type, usize::try_from(count).unwrap_or_default())?;
        let n = self.read_data_ex(start, length, selection, values.as_out())?;
        values.truncate(n);
        Ok(values)
    }

    fn iter_begin(&mut self) -> ArrayIterator<'_>
    where
        Self: Sized,
    {
        ArrayIterator::begin(self)
    }

    fn iter_end(&mut self) -> ArrayIterator<'_>
    where
        Self: Sized,
    {
        ArrayIterator::end(self)
    }

    /// A cursor at the element with the given multi-index.
    fn iterator(&mut self, index: &[i32]) -> GdsResult<ArrayIterator<'_>>
    where
        Self: Sized,
    {
        ArrayIterator::at(self, index)
    }
}

/// Fill in a missing `start` with the origin and a missing `length` with the remaining extent.
pub fn resolve_region(
    dims: &[i32],
    start: Option<&[i32]>,
    length: Option<&[i32]>,
) -> GdsResult<(Vec<i32>, Vec<i32>)> {
    let rank = dims.len();
    let start = match start {
        Some(start) if start.len() != rank => {
            gds_bail!(Bounds: "a start of rank {} for an array of rank {}", start.len(), rank)
        }
        Some(start) => start.to_vec(),
        None => vec![0; rank],
    };
    let length = match length {
        Some(length) if length.len() != rank => {
            gds_bail!(Bounds: "a length of rank {} for an array of rank {}", length.len(), rank)
        }
        Some(length) => length.to_vec(),
        None => dims.iter().zip(&start).map(|(d, s)| d.saturating_sub(*s)).collect(),
    };
    Ok((start, length))
}

/// Check that `[start, start + length)` lies within `dims` on every axis.
pub fn check_rect(dims: &[i32], start: &[i32], length: &[i32]) -> GdsResult<()> {
    if start.len() != dims.len() || length.len() != dims.len() {
        gds_bail!(
            Bounds: "a region of rank {} for an array of rank {}",
            start.len().max(length.len()),
            dims.len()
        );
    }
    for (axis, ((&d, &s), &l)) in dims.iter().zip(start).zip(length).enumerate() {
        if s < 0 || l < 0 || i64::from(s) + i64::from(l) > i64::from(d) {
            gds_bail!(
                Bounds: "region {}..{} of axis {} is outside 0..{}",
                s,
                i64::from(s) + i64::from(l),
                axis,
                d
            );
        }
    }
    Ok(())
}

/// Resolve and validate a region and its selection against `dims`.
pub fn info_selection(
    dims: &[i32],
    start: Option<&[i32]>,
    length: Option<&[i32]>,
    selection: Option<&Selection<'_>>,
) -> GdsResult<Vec<AxisSelection>> {
    let (start, length) = resolve_region(dims, start, length)?;
    check_rect(dims, &start, &length)?;
    if let Some(selection) = selection.filter(|s| s.len() != dims.len()) {
        gds_bail!(
            Bounds: "a selection of rank {} for an array of rank {}",
            selection.len(),
            dims.len()
        );
    }
    (0..dims.len())
        .map(|axis| {
            let mask = selection.and_then(|s| s[axis]);
            if let Some(mask) = mask.filter(|m| m.len() != length[axis] as usize) {
                gds_bail!(
                    Bounds: "the selection of axis {} has {} entries for a length of {}",
                    axis,
                    mask.len(),
                    length[axis]
                );
            }
            Ok(AxisSelection::new(start[axis], length[axis], mask))
        })
        .collect()
}
