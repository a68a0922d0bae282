//! Cursors over arrays.

use gds_dtype::{InBuffer, OutBuffer, ValueVec};
use gds_error::{GdsResult, gds_bail};

use crate::AbstractArray;

/// Elements moved per round by [`ArrayIterator::copy`].
const COPY_CHUNK: usize = 0x4000;

/// A byte position within an array's stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BaseIterator {
    pub ptr: u64,
}

impl BaseIterator {
    pub fn new(ptr: u64) -> Self {
        Self { ptr }
    }
}

/// A cursor at one element of an array, in row-major order.
///
/// The cursor borrows its array, so it cannot outlive it. Positioning is free; every access is
/// bounds checked against the array's element count at the time of the access.
pub struct ArrayIterator<'a> {
    array: &'a mut dyn AbstractArray,
    index: i64,
}

impl<'a> ArrayIterator<'a> {
    /// A cursor at the first element.
    pub fn begin(array: &'a mut dyn AbstractArray) -> Self {
        Self { array, index: 0 }
    }

    /// A cursor one past the last element.
    pub fn end(array: &'a mut dyn AbstractArray) -> Self {
        let index = array.total_count();
        Self { array, index }
    }

    /// A cursor at the element with the given multi-index.
    pub fn at(array: &'a mut dyn AbstractArray, index: &[i32]) -> GdsResult<Self> {
        let dims = array.dim_items();
        if index.len() != dims.len() {
            gds_bail!(
                Bounds: "a multi-index of rank {} for an array of rank {}",
                index.len(),
                dims.len()
            );
        }
        for (axis, (&i, dim)) in index.iter().zip(dims).enumerate() {
            if i < 0 || i >= dim.dim_len {
                gds_bail!(Bounds: "index {} of axis {} is outside 0..{}", i, axis, dim.dim_len);
            }
        }
        let index = crate::dim::index_offset(dims, index);
        Ok(Self { array, index })
    }

    /// The element offset of the cursor.
    pub fn offset(&self) -> i64 {
        self.index
    }

    pub fn advance(&mut self, delta: i64) {
        self.index += delta;
    }

    pub fn array(&mut self) -> &mut dyn AbstractArray {
        self.array
    }

    pub fn get_integer(&mut self) -> GdsResult<i64> {
        let mut value = [0i64];
        self.array.iter_read(self.index, OutBuffer::from(&mut value))?;
        Ok(value[0])
    }

    pub fn get_float(&mut self) -> GdsResult<f64> {
        let mut value = [0f64];
        self.array.iter_read(self.index, OutBuffer::from(&mut value))?;
        Ok(value[0])
    }

    pub fn get_string(&mut self) -> GdsResult<String> {
        let mut value = [String::new()];
        self.array.iter_read(self.index, OutBuffer::from(&mut value))?;
        let [value] = value;
        Ok(value)
    }

    pub fn set_integer(&mut self, value: i64) -> GdsResult<()> {
        self.array.iter_write(self.index, InBuffer::from(&[value]))?;
        Ok(())
    }

    pub fn set_float(&mut self, value: f64) -> GdsResult<()> {
        self.array.iter_write(self.index, InBuffer::from(&[value]))?;
        Ok(())
    }

    pub fn set_string(&mut self, value: &str) -> GdsResult<()> {
        self.array
            .iter_write(self.index, InBuffer::from(&[value.to_string()]))?;
        Ok(())
    }

    /// Read `out.len()` elements from the cursor onwards and step past them.
    pub fn read_data(&mut self, out: OutBuffer<'_>) -> GdsResult<usize> {
        let n = out.len();
        let read = self.array.iter_read(self.index, out)?;
        self.index += n as i64;
        Ok(read)
    }

    /// Read the elements of the next `sel.len()` whose `sel` entry is set and step past all of
    /// them. Returns the number of elements written to `out`.
    pub fn read_data_ex(&mut self, out: OutBuffer<'_>, sel: &[bool]) -> GdsResult<usize> {
        let read = self.array.iter_read_ex(self.index, out, sel)?;
        self.index += sel.len() as i64;
        Ok(read)
    }

    /// Overwrite the elements from the cursor onwards and step past them.
    pub fn write_data(&mut self, input: InBuffer<'_>) -> GdsResult<usize> {
        let written = self.array.iter_write(self.index, input)?;
        self.index += input.len() as i64;
        Ok(written)
    }

    /// Copy `count` elements from `src` to `dst`, advancing both.
    ///
    /// Values travel in the natural memory type of the source's storage type.
    pub fn copy(dst: &mut Self, src: &mut Self, count: i64) -> GdsResult<()> {
        if count < 0 {
            gds_bail!("cannot copy {} elements", count);
        }
        let total = usize::try_from(count).unwrap_or(usize::MAX);
        let mut buffer = ValueVec::new(src.array.sv_type(), total.min(COPY_CHUNK))?;
        let mut done = 0;
        while done < total {
            buffer.truncate(COPY_CHUNK.min(total - done));
            src.read_data(buffer.as_out())?;
            dst.write_data(buffer.as_in())?;
            done += buffer.len();
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use gds_error::ErrorKind;

    use super::*;
    use crate::{Float32Array, Int16Array, UInt8Array};

    #[test]
    fn scalar_accessors_convert() {
        let mut array = Int16Array::memory(&[2, 3]).unwrap();
        let mut it = ArrayIterator::at(&mut array, &[1, 1]).unwrap();
        assert_eq!(it.offset(), 4);
        it.set_float(-2.5).unwrap();
        assert_eq!(it.get_integer().unwrap(), -3);
        it.set_string("17").unwrap();
        assert_eq!(it.get_float().unwrap(), 17.0);
        it.set_integer(40_000).unwrap();
        assert_eq!(it.get_string().unwrap(), "-25536");
    }

    #[test]
    fn multi_index_is_checked() {
        let mut array = Int16Array::memory(&[2, 3]).unwrap();
        assert!(ArrayIterator::at(&mut array, &[2, 0]).is_err());
        assert!(ArrayIterator::at(&mut array, &[0]).is_err());
        let mut end = array.iter_end();
        assert_eq!(end.offset(), 6);
        assert_eq!(end.get_integer().unwrap_err().kind(), ErrorKind::Bounds);
    }

    #[test]
    fn sequential_reads_advance() {
        let mut array = UInt8Array::memory(&[6]).unwrap();
        array
            .write_data(None, None, InBuffer::from(&[1u8, 2, 3, 4, 5, 6]))
            .unwrap();
        let mut it = array.iter_begin();
        let mut out = [0u32; 2];
        it.read_data(OutBuffer::from(&mut out)).unwrap();
        assert_eq!(out, [1, 2]);
        let n = it
            .read_data_ex(OutBuffer::from(&mut out), &[false, true, true])
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(out, [4, 5]);
        assert_eq!(it.offset(), 5);
        it.write_data(InBuffer::from(&[9i64])).unwrap();
        assert_eq!(it.offset(), 6);
        it.advance(-1);
        assert_eq!(it.get_integer().unwrap(), 9);
    }

    #[test]
    fn copy_between_arrays() {
        let mut src = Float32Array::memory(&[5]).unwrap();
        src.write_data(None, None, InBuffer::from(&[0.4f32, 1.6, 2.5, 3.0, 4.0]))
            .unwrap();
        let mut dst = Int16Array::memory(&[3]).unwrap();
        let mut from = src.iterator(&[1]).unwrap();
        let mut to = dst.iter_begin();
        ArrayIterator::copy(&mut to, &mut from, 3).unwrap();
        assert_eq!(from.offset(), 4);
        assert_eq!(to.offset(), 3);
        assert_eq!(dst.to_vec().unwrap(), vec![2, 3, 3]);
    }
}
