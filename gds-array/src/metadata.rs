//! Array metadata handed to the container layer on flush.

use std::sync::Arc;

use gds_dtype::SVType;
use gds_error::GdsResult;
use parking_lot::Mutex;

/// The persisted description of an array: its storage type, bit width, shape, and length.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArrayMetadata {
    pub sv_type: SVType,
    pub bit_of: u32,
    pub dims: Vec<i32>,
    pub total_count: i64,
}

/// The receiver of an array's metadata whenever it is synchronized while dirty.
pub trait MetadataSink: Send {
    fn flush(&mut self, metadata: &ArrayMetadata) -> GdsResult<()>;
}

/// A sink shared with its creator, keeping the latest flush and the number received.
#[derive(Debug, Clone, Default)]
pub struct SharedMetadata(Arc<Mutex<Flushed>>);

#[derive(Debug, Default)]
struct Flushed {
    latest: Option<ArrayMetadata>,
    count: usize,
}

impl SharedMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently flushed metadata.
    pub fn latest(&self) -> Option<ArrayMetadata> {
        self.0.lock().latest.clone()
    }

    /// The number of flushes received.
    pub fn flush_count(&self) -> usize {
        self.0.lock().count
    }
}

impl MetadataSink for SharedMetadata {
    fn flush(&mut self, metadata: &ArrayMetadata) -> GdsResult<()> {
        let mut flushed = self.0.lock();
        flushed.latest = Some(metadata.clone());
        flushed.count += 1;
        Ok(())
    }
}
