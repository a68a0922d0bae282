//! Per-axis boolean selections.

/// One optional mask per axis. `None` selects every index along that axis.
pub type Selection<'a> = [Option<&'a [bool]>];

/// The effect of a mask on one axis of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSelection {
    /// The first selected index.
    pub start: i32,
    /// The span from the first to the last selected index, inclusive.
    pub length: i32,
    /// The number of selected indices.
    pub valid: i32,
}

impl AxisSelection {
    /// Summarise `mask` over the region `[start, start + length)`. The mask holds one entry per index
    /// of the region.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(start: i32, length: i32, mask: Option<&[bool]>) -> Self {
        let Some(mask) = mask else {
            return Self {
                start,
                length,
                valid: length,
            };
        };
        match (
            mask.iter().position(|&s| s),
            mask.iter().rposition(|&s| s),
        ) {
            (Some(first), Some(last)) => Self {
                start: start + first as i32,
                length: (last - first + 1) as i32,
                valid: mask.iter().filter(|&&s| s).count() as i32,
            },
            _ => Self {
                start,
                length: 0,
                valid: 0,
            },
        }
    }

    /// The offset of the first selected index within the region that started at `region_start`.
    pub fn offset_from(&self, region_start: i32) -> usize {
        usize::try_from(self.start - region_start).unwrap_or_default()
    }
}
