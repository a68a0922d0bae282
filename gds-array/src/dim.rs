use gds_error::{GdsResult, gds_bail};

/// The maximum rank of an array.
pub const MAX_ARRAY_DIM: usize = 256;

/// A fixed-capacity buffer of per-axis values.
pub type ArrayDim = [i32; MAX_ARRAY_DIM];

/// The layout of one axis of an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DimItem {
    /// The number of indices along this axis.
    pub dim_len: i32,
    /// The number of bytes one index of this axis spans.
    pub dim_elm_size: u64,
    /// The number of elements one index of this axis spans.
    pub dim_elm_cnt: i64,
}

/// Check a shape: between one and [`MAX_ARRAY_DIM`] axes, none negative, and an element count
/// that fits an `i64`.
pub fn check_shape(lens: &[i32]) -> GdsResult<()> {
    if lens.is_empty() || lens.len() > MAX_ARRAY_DIM {
        gds_bail!(
            Bounds: "an array has between 1 and {} dimensions, not {}",
            MAX_ARRAY_DIM,
            lens.len()
        );
    }
    if let Some(axis) = lens.iter().position(|&len| len < 0) {
        gds_bail!(Bounds: "dimension {} has negative length {}", axis, lens[axis]);
    }
    if lens
        .iter()
        .try_fold(1i64, |count, &len| count.checked_mul(i64::from(len)))
        .is_none()
    {
        gds_bail!(Bounds: "a shape of {} axes holds more than {} elements", lens.len(), i64::MAX);
    }
    Ok(())
}

/// Row-major layout of `lens`: the last axis varies fastest.
pub fn layout(lens: &[i32], elm_size: usize) -> Vec<DimItem> {
    let mut items = vec![DimItem::default(); lens.len()];
    let mut cnt = 1i64;
    for (item, &len) in items.iter_mut().zip(lens).rev() {
        *item = DimItem {
            dim_len: len,
            dim_elm_size: cnt as u64 * elm_size as u64,
            dim_elm_cnt: cnt,
        };
        cnt *= i64::from(len);
    }
    items
}

/// The number of elements in a shape.
pub fn element_count(lens: &[i32]) -> i64 {
    lens.iter().map(|&len| i64::from(len)).product()
}

/// The byte offset of a multi-index.
pub fn index_ptr(dims: &[DimItem], index: &[i32]) -> u64 {
    dims.iter()
        .zip(index)
        .map(|(dim, &i)| i as u64 * dim.dim_elm_size)
        .sum()
}

/// The element offset of a multi-index.
pub fn index_offset(dims: &[DimItem], index: &[i32]) -> i64 {
    dims.iter()
        .zip(index)
        .map(|(dim, &i)| i64::from(i) * dim.dim_elm_cnt)
        .sum()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn strides_follow_faster_axes() {
        let dims = layout(&[4, 3, 2], 4);
        assert_eq!(
            dims.iter().map(|d| d.dim_elm_cnt).collect::<Vec<_>>(),
            vec![6, 2, 1]
        );
        assert_eq!(dims[0].dim_elm_size, dims[1].dim_elm_size * 3);
        assert_eq!(dims[1].dim_elm_size, dims[2].dim_elm_size * 2);
        assert_eq!(index_ptr(&dims, &[1, 2, 1]), (6 + 4 + 1) * 4);
        assert_eq!(index_offset(&dims, &[3, 0, 1]), 19);
    }

    #[test]
    fn shape_limits() {
        assert!(check_shape(&[]).is_err());
        assert!(check_shape(&[1; MAX_ARRAY_DIM]).is_ok());
        assert!(check_shape(&[1; MAX_ARRAY_DIM + 1]).is_err());
        assert!(check_shape(&[2, -1]).is_err());
        assert!(check_shape(&[i32::MAX; 3]).is_err());
        assert_eq!(element_count(&[0, 5]), 0);
    }
}
