mod buffered;
mod file;
mod memory;
mod offset;
mod pipe;

pub use buffered::*;
pub use file::*;
pub use memory::*;
pub use offset::*;
pub use pipe::*;

use gds_error::GdsResult;

/// Which directions a stream currently permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamAccess {
    pub readable: bool,
    pub writable: bool,
}

impl StreamAccess {
    pub const READ_ONLY: Self = Self {
        readable: true,
        writable: false,
    };
    pub const READ_WRITE: Self = Self {
        readable: true,
        writable: true,
    };
    pub const WRITE_ONLY: Self = Self {
        readable: false,
        writable: true,
    };

    /// The directions permitted by both `self` and `other`.
    pub fn intersect(self, other: Self) -> Self {
        Self {
            readable: self.readable && other.readable,
            writable: self.writable && other.writable,
        }
    }
}

/// A positioned, resizable byte stream.
///
/// Reads must be satisfied in full; a read that runs past [`ByteStream::size`] fails with an
/// `AllocRead` error. Writes past the end extend the stream.
pub trait ByteStream: Send {
    /// The number of bytes in the stream.
    fn size(&self) -> GdsResult<u64>;

    /// Truncate or zero-extend the stream to `size` bytes.
    fn set_size(&mut self, size: u64) -> GdsResult<()>;

    /// Fill `buf` with the bytes starting at `pos`.
    fn read_exact_at(&mut self, pos: u64, buf: &mut [u8]) -> GdsResult<()>;

    /// Write all of `buf` starting at `pos`.
    fn write_all_at(&mut self, pos: u64, buf: &[u8]) -> GdsResult<()>;

    /// Push any buffered writes down to the underlying storage.
    fn flush(&mut self) -> GdsResult<()> {
        Ok(())
    }

    /// The directions this stream currently permits.
    fn access(&self) -> StreamAccess {
        StreamAccess::READ_WRITE
    }

    /// Finish writing. Transforming streams become readable afterwards.
    fn close_writer(&mut self) -> GdsResult<()> {
        self.flush()
    }
}

impl<S: ByteStream + ?Sized> ByteStream for Box<S> {
    fn size(&self) -> GdsResult<u64> {
        S::size(self)
    }

    fn set_size(&mut self, size: u64) -> GdsResult<()> {
        S::set_size(self, size)
    }

    fn read_exact_at(&mut self, pos: u64, buf: &mut [u8]) -> GdsResult<()> {
        S::read_exact_at(self, pos, buf)
    }

    fn write_all_at(&mut self, pos: u64, buf: &[u8]) -> GdsResult<()> {
        S::write_all_at(self, pos, buf)
    }

    fn flush(&mut self) -> GdsResult<()> {
        S::flush(self)
    }

    fn access(&self) -> StreamAccess {
        S::access(self)
    }

    fn close_writer(&mut self) -> GdsResult<()> {
        S::close_writer(self)
    }
}

impl<S: ByteStream + ?Sized> ByteStream for &mut S {
    fn size(&self) -> GdsResult<u64> {
        S::size(self)
    }

    fn set_size(&mut self, size: u64) -> GdsResult<()> {
        S::set_size(self, size)
    }

    fn read_exact_at(&mut self, pos: u64, buf: &mut [u8]) -> GdsResult<()> {
        S::read_exact_at(self, pos, buf)
    }

    fn write_all_at(&mut self, pos: u64, buf: &[u8]) -> GdsResult<()> {
        S::write_all_at(self, pos, buf)
    }

    fn flush(&mut self) -> GdsResult<()> {
        S::flush(self)
    }

    fn access(&self) -> StreamAccess {
        S::access(self)
    }

    fn close_writer(&mut self) -> GdsResult<()> {
        S::close_writer(self)
    }
}
