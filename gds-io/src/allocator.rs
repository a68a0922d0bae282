use std::fmt::{Debug, Formatter};

use gds_dtype::NativeType;
use gds_error::{GdsResult, WRITE_ONLY_MSG, gds_bail, gds_err};

use crate::{BufferedStream, ByteStream, StreamAccess};

/// Bytes moved per round by the bulk operations.
const BLOCK_SIZE: usize = 64 << 10;

enum Backend {
    Uninitialized,
    Direct(Box<dyn ByteStream>),
    Buffered(BufferedStream<Box<dyn ByteStream>>),
}

/// A cursor over a byte stream, with little-endian fixed-width primitives and bulk operations.
///
/// The I/O strategy is chosen when a stream is bound: reads and writes go either straight to the
/// stream or through a [`BufferedStream`]. An unbound allocator fails every operation with an
/// `Allocator` error.
pub struct Allocator {
    backend: Backend,
    position: u64,
    requested: StreamAccess,
    access: StreamAccess,
    scratch: Vec<u8>,
}

impl Debug for Allocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let backend = match self.backend {
            Backend::Uninitialized => "uninitialized",
            Backend::Direct(_) => "direct",
            Backend::Buffered(_) => "buffered",
        };
        f.debug_struct("Allocator")
            .field("backend", &backend)
            .field("position", &self.position)
            .field("access", &self.access)
            .finish()
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator {
    /// An allocator that is not yet bound to a stream.
    pub fn new() -> Self {
        Self {
            backend: Backend::Uninitialized,
            position: 0,
            requested: StreamAccess::READ_WRITE,
            access: StreamAccess {
                readable: false,
                writable: false,
            },
            scratch: Vec::new(),
        }
    }

    /// A read-write allocator over a fresh in-memory stream.
    pub fn memory() -> Self {
        let mut alloc = Self::new();
        alloc.initialize(Box::new(crate::MemoryStream::new()), StreamAccess::READ_WRITE);
        alloc
    }

    /// Bind to `stream`, reading and writing it directly.
    pub fn initialize(&mut self, stream: Box<dyn ByteStream>, mode: StreamAccess) {
        self.bind(Backend::Direct(stream), mode);
        log::debug!(
            "allocator bound directly, readable {} writable {}",
            self.access.readable,
            self.access.writable
        );
    }

    /// Bind to `stream` through a [`BufferedStream`] of `capacity` bytes.
    pub fn initialize_buffered(
        &mut self,
        stream: Box<dyn ByteStream>,
        mode: StreamAccess,
        capacity: usize,
    ) {
        self.bind(
            Backend::Buffered(BufferedStream::with_capacity(stream, capacity)),
            mode,
        );
        log::debug!(
            "allocator bound through a {} byte buffer, readable {} writable {}",
            capacity,
            self.access.readable,
            self.access.writable
        );
    }

    fn bind(&mut self, backend: Backend, mode: StreamAccess) {
        self.backend = backend;
        self.position = 0;
        self.requested = mode;
        self.refresh_access();
    }

    /// Flush and release the stream, returning to the unbound state.
    pub fn free(&mut self) -> GdsResult<()> {
        let result = match &mut self.backend {
            Backend::Uninitialized => Ok(()),
            Backend::Direct(stream) => stream.flush(),
            Backend::Buffered(stream) => stream.flush(),
        };
        self.backend = Backend::Uninitialized;
        self.position = 0;
        self.refresh_access();
        log::debug!("allocator released");
        result
    }

    pub fn is_initialized(&self) -> bool {
        !matches!(self.backend, Backend::Uninitialized)
    }

    pub fn can_read(&self) -> bool {
        self.access.readable
    }

    pub fn can_write(&self) -> bool {
        self.access.writable
    }

    /// Recompute the permitted directions from the requested mode and the stream's current state.
    pub fn refresh_access(&mut self) {
        self.access = match &self.backend {
            Backend::Uninitialized => StreamAccess {
                readable: false,
                writable: false,
            },
            Backend::Direct(stream) => self.requested.intersect(stream.access()),
            Backend::Buffered(stream) => self.requested.intersect(stream.access()),
        };
    }

    /// Change the capacity of a buffered backend; a direct backend is left as is.
    pub fn set_buffer_capacity(&mut self, capacity: usize) -> GdsResult<()> {
        match &mut self.backend {
            Backend::Buffered(stream) if stream.capacity() != capacity => {
                stream.set_capacity(capacity)
            }
            _ => Ok(()),
        }
    }

    fn stream(&mut self) -> GdsResult<&mut dyn ByteStream> {
        match &mut self.backend {
            Backend::Uninitialized => gds_bail!(Allocator: "the allocator is not bound to a stream"),
            Backend::Direct(stream) => Ok(stream.as_mut()),
            Backend::Buffered(stream) => Ok(stream),
        }
    }

    fn stream_ref(&self) -> GdsResult<&dyn ByteStream> {
        match &self.backend {
            Backend::Uninitialized => gds_bail!(Allocator: "the allocator is not bound to a stream"),
            Backend::Direct(stream) => Ok(stream.as_ref()),
            Backend::Buffered(stream) => Ok(stream),
        }
    }

    fn check_read(&self) -> GdsResult<()> {
        if !self.is_initialized() {
            gds_bail!(Allocator: "the allocator is not bound to a stream");
        }
        if !self.access.readable {
            if self.access.writable {
                gds_bail!(AllocRead: "{}", WRITE_ONLY_MSG);
            }
            gds_bail!(AllocRead: "the stream is not open for reading");
        }
        Ok(())
    }

    fn check_write(&self) -> GdsResult<()> {
        if !self.is_initialized() {
            gds_bail!(Allocator: "the allocator is not bound to a stream");
        }
        if !self.access.writable {
            gds_bail!(AllocWrite: "the stream is open read-only");
        }
        Ok(())
    }

    pub fn size(&self) -> GdsResult<u64> {
        self.stream_ref()?.size()
    }

    pub fn set_size(&mut self, size: u64) -> GdsResult<()> {
        self.check_write()?;
        self.stream()?.set_size(size)
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn set_position(&mut self, pos: u64) {
        self.position = pos;
    }

    /// Fill `buf` from the current position, advancing it.
    pub fn read_data(&mut self, buf: &mut [u8]) -> GdsResult<()> {
        self.check_read()?;
        let pos = self.position;
        self.stream()?.read_exact_at(pos, buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    /// Write `buf` at the current position, advancing it.
    pub fn write_data(&mut self, buf: &[u8]) -> GdsResult<()> {
        self.check_write()?;
        let pos = self.position;
        self.stream()?.write_all_at(pos, buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    /// Decode `dst.len()` little-endian values from the current position, advancing it.
    pub fn read_values<T: NativeType>(&mut self, dst: &mut [T]) -> GdsResult<()> {
        let mut scratch = std::mem::take(&mut self.scratch);
        let per_block = (BLOCK_SIZE / size_of::<T>()).max(1);
        let result = dst.chunks_mut(per_block).try_for_each(|chunk| {
            scratch.resize(chunk.len() * size_of::<T>(), 0);
            self.read_data(&mut scratch)?;
            T::decode_le(&scratch, chunk);
            Ok(())
        });
        self.scratch = scratch;
        result
    }

    /// Encode `src` as little-endian values at the current position, advancing it.
    pub fn write_values<T: NativeType>(&mut self, src: &[T]) -> GdsResult<()> {
        let mut scratch = std::mem::take(&mut self.scratch);
        let per_block = (BLOCK_SIZE / size_of::<T>()).max(1);
        let result = src.chunks(per_block).try_for_each(|chunk| {
            scratch.resize(chunk.len() * size_of::<T>(), 0);
            T::encode_le(chunk, &mut scratch);
            self.write_data(&scratch)
        });
        self.scratch = scratch;
        result
    }

    pub fn r8b(&mut self) -> GdsResult<u8> {
        self.read_native()
    }

    pub fn r16b(&mut self) -> GdsResult<u16> {
        self.read_native()
    }

    pub fn r32b(&mut self) -> GdsResult<u32> {
        self.read_native()
    }

    pub fn r64b(&mut self) -> GdsResult<u64> {
        self.read_native()
    }

    pub fn w8b(&mut self, value: u8) -> GdsResult<()> {
        self.write_native(value)
    }

    pub fn w16b(&mut self, value: u16) -> GdsResult<()> {
        self.write_native(value)
    }

    pub fn w32b(&mut self, value: u32) -> GdsResult<()> {
        self.write_native(value)
    }

    pub fn w64b(&mut self, value: u64) -> GdsResult<()> {
        self.write_native(value)
    }

    /// Read one little-endian value at the current position.
    pub fn read_native<T: NativeType>(&mut self) -> GdsResult<T> {
        let mut raw = [0u8; 8];
        let raw = &mut raw[..size_of::<T>()];
        self.read_data(raw)?;
        Ok(T::from_le_slice(raw))
    }

    /// Write one little-endian value at the current position.
    pub fn write_native<T: NativeType>(&mut self, value: T) -> GdsResult<()> {
        let mut raw = [0u8; 8];
        let raw = &mut raw[..size_of::<T>()];
        value.write_le_slice(raw);
        self.write_data(raw)
    }

    /// Copy `len` bytes from `src` to `dst` within the stream. The ranges may overlap.
    pub fn move_data(&mut self, src: u64, dst: u64, len: u64) -> GdsResult<()> {
        self.check_read()?;
        self.check_write()?;
        if src == dst || len == 0 {
            return Ok(());
        }

        let mut block = vec![0u8; BLOCK_SIZE.min(usize::try_from(len).unwrap_or(BLOCK_SIZE))];
        let stream = self.stream()?;
        let mut done = 0u64;
        while done < len {
            let n = block.len().min(usize::try_from(len - done).unwrap_or(usize::MAX));
            // Copy back to front when moving forwards so no source byte is overwritten before it
            // is read.
            let offset = if dst > src { len - done - n as u64 } else { done };
            stream.read_exact_at(src + offset, &mut block[..n])?;
            stream.write_all_at(dst + offset, &block[..n])?;
            done += n as u64;
        }
        Ok(())
    }

    /// Write `len` zero bytes at `pos`. The position is left unchanged.
    pub fn zero_fill(&mut self, pos: u64, len: u64) -> GdsResult<()> {
        self.check_write()?;
        let zeros = vec![0u8; BLOCK_SIZE.min(usize::try_from(len).unwrap_or(BLOCK_SIZE))];
        let stream = self.stream()?;
        let mut done = 0u64;
        while done < len {
            let n = zeros.len().min(usize::try_from(len - done).unwrap_or(usize::MAX));
            stream.write_all_at(pos + done, &zeros[..n])?;
            done += n as u64;
        }
        Ok(())
    }

    /// Write `len` zero bytes at the current position, advancing it.
    pub fn zero_fill_here(&mut self, len: u64) -> GdsResult<()> {
        self.zero_fill(self.position, len)?;
        self.position += len;
        Ok(())
    }

    /// Copy `count` bytes starting at `pos` of this stream to the current position of `dst`.
    pub fn copy_to(&mut self, dst: &mut Allocator, pos: u64, count: u64) -> GdsResult<()> {
        self.check_read()?;
        dst.check_write()?;
        let mut block = vec![0u8; BLOCK_SIZE.min(usize::try_from(count).unwrap_or(BLOCK_SIZE))];
        let mut done = 0u64;
        while done < count {
            let n = block.len().min(usize::try_from(count - done).unwrap_or(usize::MAX));
            self.stream()?.read_exact_at(pos + done, &mut block[..n])?;
            dst.write_data(&block[..n])?;
            done += n as u64;
        }
        Ok(())
    }

    /// Push buffered writes down to the stream.
    pub fn flush(&mut self) -> GdsResult<()> {
        match &mut self.backend {
            Backend::Uninitialized => Ok(()),
            Backend::Direct(stream) => stream.flush(),
            Backend::Buffered(stream) => stream.flush(),
        }
    }

    /// Finalise a write-only stream so it becomes readable.
    pub fn close_writer(&mut self) -> GdsResult<()> {
        self.stream()?.close_writer()?;
        self.refresh_access();
        Ok(())
    }

    /// Run `f` with the position restored afterwards, whether or not it fails.
    pub fn preserving_position<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> GdsResult<R>,
    ) -> GdsResult<R> {
        let pos = self.position;
        let result = f(self);
        self.position = pos;
        result
    }
}

impl TryFrom<Allocator> for Box<dyn ByteStream> {
    type Error = gds_error::GdsError;

    /// Flush and take back the bound stream.
    fn try_from(value: Allocator) -> GdsResult<Self> {
        match value.backend {
            Backend::Uninitialized => Err(gds_err!(Allocator: "the allocator is not bound to a stream")),
            Backend::Direct(stream) => Ok(stream),
            Backend::Buffered(stream) => stream.into_inner(),
        }
    }
}
