use std::sync::atomic::{AtomicU64, Ordering};

/// The default byte budget of a margin reader's buffer.
pub const ARRAY_READ_MEM_BUFFER_SIZE: u64 = 1 << 30;

static DEFAULT_READ_BUFFER_SIZE: AtomicU64 = AtomicU64::new(ARRAY_READ_MEM_BUFFER_SIZE);

/// The process-wide byte budget used when a reader is not given one.
pub fn default_read_buffer_size() -> u64 {
    DEFAULT_READ_BUFFER_SIZE.load(Ordering::Relaxed)
}

/// Replace the process-wide byte budget of margin readers.
pub fn set_default_read_buffer_size(size: u64) {
    DEFAULT_READ_BUFFER_SIZE.store(size, Ordering::Relaxed);
}

/// Buffering options of an [`ArrayRead`](crate::ArrayRead).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayReadOptions {
    /// The byte budget of the buffer; `None` uses [`default_read_buffer_size`].
    buffer_size: Option<u64>,
    /// Buffer only when the margin is not the slowest-varying axis.
    buffer_if_needed: bool,
}

impl Default for ArrayReadOptions {
    fn default() -> Self {
        Self {
            buffer_size: None,
            buffer_if_needed: true,
        }
    }
}

impl ArrayReadOptions {
    /// Buffer with an explicit byte budget.
    pub fn with_buffer_size(mut self, buffer_size: u64) -> Self {
        self.buffer_size = Some(buffer_size);
        self
    }

    /// Configure whether a reader without an explicit budget buffers when it helps.
    ///
    /// A reader over the first axis reads contiguous slices and gains nothing from a buffer. Over
    /// any other axis each slice is scattered, and buffering several at once turns many small reads
    /// into a few large ones.
    pub fn with_buffer_if_needed(mut self, buffer_if_needed: bool) -> Self {
        self.buffer_if_needed = buffer_if_needed;
        self
    }

    pub fn buffer_size(&self) -> Option<u64> {
        self.buffer_size
    }

    pub fn buffer_if_needed(&self) -> bool {
        self.buffer_if_needed
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn builder() {
        let options = ArrayReadOptions::default();
        assert_eq!(options.buffer_size(), None);
        assert!(options.buffer_if_needed());

        let options = options.with_buffer_size(4096).with_buffer_if_needed(false);
        assert_eq!(options.buffer_size(), Some(4096));
        assert!(!options.buffer_if_needed());
    }
}
