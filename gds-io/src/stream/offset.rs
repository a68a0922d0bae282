use gds_error::GdsResult;

use crate::{ByteStream, StreamAccess};

/// An adapter that offsets all positions by a fixed amount, exposing a window of a larger stream.
pub struct OffsetStream<S> {
    inner: S,
    offset: u64,
}

impl<S: ByteStream> OffsetStream<S> {
    pub fn new(inner: S, offset: u64) -> Self {
        Self { inner, offset }
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ByteStream> ByteStream for OffsetStream<S> {
    fn size(&self) -> GdsResult<u64> {
        Ok(self.inner.size()?.saturating_sub(self.offset))
    }

    fn set_size(&mut self, size: u64) -> GdsResult<()> {
        self.inner.set_size(size + self.offset)
    }

    fn read_exact_at(&mut self, pos: u64, buf: &mut [u8]) -> GdsResult<()> {
        self.inner.read_exact_at(pos + self.offset, buf)
    }

    fn write_all_at(&mut self, pos: u64, buf: &[u8]) -> GdsResult<()> {
        self.inner.write_all_at(pos + self.offset, buf)
    }

    fn flush(&mut self) -> GdsResult<()> {
        self.inner.flush()
    }

    fn access(&self) -> StreamAccess {
        self.inner.access()
    }

    fn close_writer(&mut self) -> GdsResult<()> {
        self.inner.close_writer()
    }
}
