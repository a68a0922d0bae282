//! Reading an array one slice at a time along a chosen axis.
//!
//! An [`ArrayRead`] walks the selected indices of its margin axis and delivers, for each, every
//! selected element of the other axes in row-major order. When the margin is not the first axis
//! a slice is scattered across the stream, so the reader can fetch several consecutive slices in
//! one region read and serve them from a buffer. [`balance_array_read_buffer`] splits one budget
//! over readers that advance together so they refill at the same cadence.

use gds_dtype::{OutBuffer, SVType, ValueVec};
use gds_error::{GdsResult, gds_bail};

use crate::options::{ArrayReadOptions, default_read_buffer_size};
use crate::{AbstractArray, Selection};

struct SliceBuffer {
    /// The capacity in slices.
    slices: usize,
    values: ValueVec,
    /// The position of the first buffered slice among the selected margin indices.
    first: usize,
    /// The number of slices currently buffered.
    len: usize,
}

/// A cursor over the slices of an array along its margin axis.
pub struct ArrayRead<'a> {
    array: &'a mut dyn AbstractArray,
    margin: usize,
    sv_type: SVType,
    dims: Vec<i32>,
    masks: Vec<Option<Vec<bool>>>,
    dim_cnt_valid: Vec<i32>,
    margin_indices: Vec<i32>,
    index: usize,
    margin_count: usize,
    buffer: Option<SliceBuffer>,
}

impl<'a> ArrayRead<'a> {
    /// Prepare to read `array` along `margin` as values of memory type `sv_type`.
    ///
    /// Every mask of `selection` holds one entry per index of its axis.
    pub fn new(
        array: &'a mut dyn AbstractArray,
        margin: usize,
        sv_type: SVType,
        selection: Option<&Selection<'_>>,
        options: ArrayReadOptions,
    ) -> GdsResult<Self> {
        let dims = array.dims();
        if margin >= dims.len() {
            gds_bail!(
                Bounds: "margin {} of an array with {} dimensions",
                margin,
                dims.len()
            );
        }
        if !sv_type.is_memory_type() {
            gds_bail!(Conversion: "{} cannot be used as a memory type", sv_type);
        }
        if let Some(selection) = selection.filter(|s| s.len() != dims.len()) {
            gds_bail!(
                Bounds: "a selection of rank {} for an array of rank {}",
                selection.len(),
                dims.len()
            );
        }

        let mut masks = Vec::with_capacity(dims.len());
        for (axis, &len) in dims.iter().enumerate() {
            let mask = selection.and_then(|s| s[axis]);
            if let Some(mask) = mask.filter(|m| m.len() != len as usize) {
                gds_bail!(
                    Bounds: "the selection of axis {} has {} entries for a length of {}",
                    axis,
                    mask.len(),
                    len
                );
            }
            masks.push(mask.map(<[bool]>::to_vec));
        }

        #[allow(clippy::cast_possible_truncation)]
        let dim_cnt_valid: Vec<i32> = masks
            .iter()
            .zip(&dims)
            .map(|(mask, &len)| match mask {
                Some(mask) => mask.iter().filter(|&&keep| keep).count() as i32,
                None => len,
            })
            .collect();
        let margin_indices = (0..dims[margin])
            .filter(|&i| masks[margin].as_ref().is_none_or(|m| m[i as usize]))
            .collect();
        let margin_count = product(
            dim_cnt_valid
                .iter()
                .enumerate()
                .filter(|&(axis, _)| axis != margin)
                .map(|(_, &valid)| valid),
        );

        let mut reader = Self {
            array,
            margin,
            sv_type,
            dims,
            masks,
            dim_cnt_valid,
            margin_indices,
            index: 0,
            margin_count,
            buffer: None,
        };
        match options.buffer_size() {
            Some(budget) => reader.alloc_buffer(Some(budget))?,
            None if options.buffer_if_needed() && reader.outer_count() > 1 => {
                reader.alloc_buffer(None)?
            }
            None => {}
        }
        Ok(reader)
    }

    /// Size the slice buffer from a byte budget, or the process default when `None`.
    ///
    /// A budget smaller than one slice leaves the reader unbuffered, reading each slice directly.
    pub fn alloc_buffer(&mut self, budget: Option<u64>) -> GdsResult<()> {
        let budget = budget.unwrap_or_else(default_read_buffer_size);
        let slice = self.margin_size() as u64;
        let count = self.count();
        if count == 0 || slice == 0 {
            self.buffer = None;
            return Ok(());
        }
        if budget < slice {
            log::warn!(
                "a read budget of {} bytes is smaller than one margin slice of {} bytes, reading unbuffered",
                budget,
                slice
            );
            self.buffer = None;
            return Ok(());
        }
        let slices = usize::try_from(budget / slice)
            .unwrap_or(count)
            .min(count);
        self.buffer = Some(SliceBuffer {
            slices,
            values: ValueVec::new(self.sv_type, slices * self.margin_count)?,
            first: 0,
            len: 0,
        });
        log::debug!(
            "margin reader buffers {} slices of {} bytes along axis {}",
            slices,
            slice,
            self.margin
        );
        Ok(())
    }

    /// Read the next slice into `out`, returning the number of values written.
    ///
    /// `out` must be of the reader's memory type and hold [`margin_count`](Self::margin_count)
    /// values.
    pub fn read(&mut self, mut out: OutBuffer<'_>) -> GdsResult<usize> {
        if self.array.dims() != self.dims {
            gds_bail!(
                Consistency: "the array was reshaped while being read along axis {}",
                self.margin
            );
        }
        if self.eof() {
            gds_bail!("read past the last of {} margin slices", self.count());
        }
        if out.sv_type() != self.sv_type {
            gds_bail!(
                "a {} buffer for a reader of {} values",
                out.sv_type(),
                self.sv_type
            );
        }
        if out.len() < self.margin_count {
            gds_bail!(
                "an output of {} values for a slice of {}",
                out.len(),
                self.margin_count
            );
        }

        let outer = self.outer_count();
        let inner = self.inner_count();
        let Self {
            array,
            margin,
            dims,
            masks,
            margin_indices,
            index,
            buffer,
            ..
        } = self;
        let margin = *margin;

        let n = match buffer {
            None => {
                let raw = margin_indices[*index];
                read_margin_range(&mut **array, dims, masks, margin, raw, raw + 1, false, out)?
            }
            Some(buffer) => {
                if *index >= buffer.first + buffer.len {
                    buffer.first = *index;
                    buffer.len = buffer.slices.min(margin_indices.len() - *index);
                    let lo = margin_indices[buffer.first];
                    let hi = margin_indices[buffer.first + buffer.len - 1] + 1;
                    read_margin_range(
                        &mut **array,
                        dims,
                        masks,
                        margin,
                        lo,
                        hi,
                        true,
                        buffer.values.as_out(),
                    )?;
                    log::trace!("buffered {} slices from margin index {}", buffer.len, lo);
                }
                let k = *index - buffer.first;
                for o in 0..outer {
                    out.copy_from(o * inner, &buffer.values, (o * buffer.len + k) * inner, inner)?;
                }
                outer * inner
            }
        };
        *index += 1;
        Ok(n)
    }

    /// Read the next slice into a new buffer.
    pub fn read_values(&mut self) -> GdsResult<ValueVec> {
        let mut values = ValueVec::new(self.sv_type, self.margin_count)?;
        let n = self.read(values.as_out())?;
        values.truncate(n);
        Ok(values)
    }

    /// Whether every slice has been read.
    pub fn eof(&self) -> bool {
        self.index >= self.count()
    }

    /// The array being read.
    pub fn array(&mut self) -> &mut dyn AbstractArray {
        &mut *self.array
    }

    pub fn margin(&self) -> usize {
        self.margin
    }

    pub fn sv_type(&self) -> SVType {
        self.sv_type
    }

    /// The size in bytes of one value in memory.
    pub fn elm_size(&self) -> usize {
        self.sv_type.memory_size()
    }

    /// The number of slices read so far.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The number of slices, one per selected index of the margin.
    pub fn count(&self) -> usize {
        self.margin_indices.len()
    }

    /// The margin index of the next slice, if any.
    pub fn margin_index(&self) -> Option<i32> {
        self.margin_indices.get(self.index).copied()
    }

    /// The number of values in one slice.
    pub fn margin_count(&self) -> usize {
        self.margin_count
    }

    /// The size in bytes of one slice in memory.
    pub fn margin_size(&self) -> usize {
        self.margin_count * self.elm_size()
    }

    /// The number of selected indices of every axis.
    pub fn dim_cnt_valid(&self) -> &[i32] {
        &self.dim_cnt_valid
    }

    /// The capacity of the slice buffer, zero when unbuffered.
    pub fn buffer_slices(&self) -> usize {
        self.buffer.as_ref().map_or(0, |b| b.slices)
    }

    /// The size in bytes of the slice buffer.
    pub fn buffer_size(&self) -> u64 {
        (self.buffer_slices() * self.margin_size()) as u64
    }

    fn outer_count(&self) -> usize {
        product(self.dim_cnt_valid[..self.margin].iter().copied())
    }

    fn inner_count(&self) -> usize {
        product(self.dim_cnt_valid[self.margin + 1..].iter().copied())
    }
}

/// Split `budget` bytes, or the process default, over `readers` in proportion to their slice
/// sizes.
///
/// Every reader is then able to buffer the same number of slices, so readers advanced in
/// lockstep refill together.
pub fn balance_array_read_buffer(readers: &mut [ArrayRead<'_>], budget: Option<u64>) -> GdsResult<()> {
    let budget = budget.unwrap_or_else(default_read_buffer_size);
    let total: u128 = readers.iter().map(|r| r.margin_size() as u128).sum();
    if total == 0 {
        return Ok(());
    }
    for reader in readers.iter_mut() {
        let share = u128::from(budget) * reader.margin_size() as u128 / total;
        reader.alloc_buffer(Some(u64::try_from(share).unwrap_or(budget)))?;
    }
    log::debug!(
        "balanced {} bytes over {} margin readers",
        budget,
        readers.len()
    );
    Ok(())
}

fn product(values: impl Iterator<Item = i32>) -> usize {
    values
        .map(|v| usize::try_from(v).unwrap_or_default())
        .product()
}

/// Read the margin indices `lo..hi` with every other axis whole, under the reader's masks.
#[allow(clippy::too_many_arguments)]
fn read_margin_range(
    array: &mut dyn AbstractArray,
    dims: &[i32],
    masks: &[Option<Vec<bool>>],
    margin: usize,
    lo: i32,
    hi: i32,
    masked_margin: bool,
    out: OutBuffer<'_>,
) -> GdsResult<usize> {
    let mut start = vec![0; dims.len()];
    let mut length = dims.to_vec();
    start[margin] = lo;
    length[margin] = hi - lo;
    let selection: Vec<Option<&[bool]>> = masks
        .iter()
        .enumerate()
        .map(|(axis, mask)| {
            let mask = mask.as_deref();
            if axis != margin {
                mask
            } else if masked_margin {
                mask.map(|m| &m[lo as usize..hi as usize])
            } else {
                None
            }
        })
        .collect();
    array.read_data_ex(Some(&start), Some(&length), Some(&selection), out)
}
