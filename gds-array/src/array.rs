use std::marker::PhantomData;

use gds_dtype::{
    CastInto, InBuffer, NativeType, OutBuffer, SVType, match_each_buffer, match_each_native_type,
};
use gds_error::{GdsResult, gds_bail};
use gds_io::Allocator;

use crate::dim::DimItem;
use crate::{AbstractArray, AllocArray, ArrayMetadata, MetadataSink, Selection};

/// An array stored as elements of the numeric type `T`.
///
/// Every memory type can be read from and written to every storage type, so any buffer is
/// accepted wherever a buffer is taken.
pub struct Array<T: NativeType> {
    base: AllocArray,
    phantom: PhantomData<T>,
}

impl<T: NativeType> Array<T> {
    /// Create a zero-filled array at the start of `alloc`.
    pub fn new(alloc: Allocator, dims: &[i32]) -> GdsResult<Self> {
        Ok(Self::from_base(AllocArray::new(alloc, T::SV_TYPE, dims)?))
    }

    /// Reopen an array previously described by `metadata`.
    pub fn open(alloc: Allocator, metadata: &ArrayMetadata) -> GdsResult<Self> {
        if metadata.sv_type != T::SV_TYPE {
            gds_bail!(
                Consistency: "cannot open a {} array as {}",
                metadata.sv_type,
                T::SV_TYPE
            );
        }
        Ok(Self::from_base(AllocArray::open(alloc, metadata)?))
    }

    /// A zero-filled array over a fresh in-memory stream.
    pub fn memory(dims: &[i32]) -> GdsResult<Self> {
        Self::new(Allocator::memory(), dims)
    }

    fn from_base(base: AllocArray) -> Self {
        Self {
            base,
            phantom: PhantomData,
        }
    }

    pub fn with_metadata_sink(self, sink: impl MetadataSink + 'static) -> Self {
        Self::from_base(self.base.with_metadata_sink(sink))
    }

    pub fn base(&self) -> &AllocArray {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut AllocArray {
        &mut self.base
    }

    pub fn into_base(self) -> AllocArray {
        self.base
    }

    /// Every element addressable by region operations, in storage order.
    pub fn to_vec(&mut self) -> GdsResult<Vec<T>>
    where
        T: CastInto<T>,
    {
        let count = usize::try_from(self.total_array_count()).unwrap_or_default();
        let mut values = vec![T::default(); count];
        let n = self.base.read_region::<T, T>(None, None, None, &mut values)?;
        values.truncate(n);
        Ok(values)
    }
}

impl<T: NativeType> AbstractArray for Array<T> {
    fn sv_type(&self) -> SVType {
        T::SV_TYPE
    }

    fn bit_of(&self) -> u32 {
        self.base.bit_of()
    }

    fn dim_items(&self) -> &[DimItem] {
        self.base.dim_items()
    }

    fn set_dlen(&mut self, axis: usize, len: i32) -> GdsResult<()> {
        self.base.set_dlen(axis, len)
    }

    fn reset_dim(&mut self, lens: &[i32]) -> GdsResult<()> {
        self.base.reset_dim(lens)
    }

    fn total_count(&self) -> i64 {
        self.base.total_count()
    }

    fn clear(&mut self) -> GdsResult<()> {
        self.base.clear()
    }

    fn read_data_ex(
        &mut self,
        start: Option<&[i32]>,
        length: Option<&[i32]>,
        selection: Option<&Selection<'_>>,
        out: OutBuffer<'_>,
    ) -> GdsResult<usize> {
        match_each_buffer!(OutBuffer, out, |v| {
            self.base.read_region::<T, _>(start, length, selection, v)
        })
    }

    fn write_data(
        &mut self,
        start: Option<&[i32]>,
        length: Option<&[i32]>,
        input: InBuffer<'_>,
    ) -> GdsResult<()> {
        match_each_buffer!(InBuffer, input, |v| {
            self.base.write_region::<T, _>(start, length, v)
        })
    }

    fn append(&mut self, input: InBuffer<'_>) -> GdsResult<()> {
        match_each_buffer!(InBuffer, input, |v| self.base.append_values::<T, _>(v))
    }

    fn iter_read(&mut self, index: i64, out: OutBuffer<'_>) -> GdsResult<usize> {
        match_each_buffer!(OutBuffer, out, |v| self.base.read_linear::<T, _>(index, v))
    }

    fn iter_read_ex(&mut self, index: i64, out: OutBuffer<'_>, sel: &[bool]) -> GdsResult<usize> {
        match_each_buffer!(OutBuffer, out, |v| {
            self.base.read_linear_selected::<T, _>(index, v, sel)
        })
    }

    fn iter_write(&mut self, index: i64, input: InBuffer<'_>) -> GdsResult<usize> {
        match_each_buffer!(InBuffer, input, |v| self.base.write_linear::<T, _>(index, v))
    }

    fn synchronize(&mut self) -> GdsResult<()> {
        self.base.synchronize()
    }

    fn close_writer(&mut self) -> GdsResult<()> {
        self.base.close_writer()
    }

    fn stream_size(&mut self) -> GdsResult<u64> {
        self.base.stream_size()
    }
}

macro_rules! array_alias {
    ($($name:ident => $T:ident),+ $(,)?) => {
        paste::paste! {
            $(
                #[doc = "An array stored as `" $T "` elements."]
                pub type [<$name Array>] = Array<$T>;
            )+
        }
    };
}

array_alias!(
    Int8 => i8,
    UInt8 => u8,
    Int16 => i16,
    UInt16 => u16,
    Int32 => i32,
    UInt32 => u32,
    Int64 => i64,
    UInt64 => u64,
    Float32 => f32,
    Float64 => f64,
);

fn check_native(sv_type: SVType) -> GdsResult<()> {
    if !sv_type.is_numeric() {
        gds_bail!(Conversion: "{} values cannot be stored in an allocator array", sv_type);
    }
    Ok(())
}

/// Create a zero-filled array whose storage type is chosen at runtime.
pub fn new_array(
    sv_type: SVType,
    alloc: Allocator,
    dims: &[i32],
) -> GdsResult<Box<dyn AbstractArray>> {
    check_native(sv_type)?;
    match_each_native_type!(sv_type, |$T| {
        Ok(Box::new(Array::<$T>::new(alloc, dims)?) as Box<dyn AbstractArray>)
    })
}

/// Reopen an array whose storage type is recorded in `metadata`.
pub fn open_array(alloc: Allocator, metadata: &ArrayMetadata) -> GdsResult<Box<dyn AbstractArray>> {
    check_native(metadata.sv_type)?;
    match_each_native_type!(metadata.sv_type, |$T| {
        Ok(Box::new(Array::<$T>::open(alloc, metadata)?) as Box<dyn AbstractArray>)
    })
}
