use gds_error::GdsResult;

use crate::{ByteStream, StreamAccess};

/// The default capacity of a [`BufferedStream`].
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 << 10;

/// A stream adapter with a write-back buffer and a read-ahead window.
///
/// Writes to consecutive positions are gathered into one pending run. Every read, resize, flush, or
/// write elsewhere pushes the pending run down first, so the inner stream always observes writes
/// in order.
pub struct BufferedStream<S> {
    inner: S,
    capacity: usize,
    pending: Vec<u8>,
    pending_pos: u64,
    cache: Vec<u8>,
    cache_pos: u64,
}

impl<S: ByteStream> BufferedStream<S> {
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_BUFFER_CAPACITY)
    }

    pub fn with_capacity(inner: S, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            pending: Vec::new(),
            pending_pos: 0,
            cache: Vec::new(),
            cache_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the buffer capacity, pushing down pending writes first.
    pub fn set_capacity(&mut self, capacity: usize) -> GdsResult<()> {
        self.drain()?;
        self.cache.clear();
        self.capacity = capacity.max(1);
        Ok(())
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Flush and return the inner stream.
    pub fn into_inner(mut self) -> GdsResult<S> {
        self.drain()?;
        Ok(self.inner)
    }

    fn drain(&mut self) -> GdsResult<()> {
        if !self.pending.is_empty() {
            self.inner.write_all_at(self.pending_pos, &self.pending)?;
            self.pending.clear();
        }
        Ok(())
    }

    fn cached(&self, pos: u64, len: usize) -> Option<&[u8]> {
        let start = usize::try_from(pos.checked_sub(self.cache_pos)?).ok()?;
        self.cache.get(start..start.checked_add(len)?)
    }
}

impl<S: ByteStream> ByteStream for BufferedStream<S> {
    fn size(&self) -> GdsResult<u64> {
        let pending_end = self.pending_pos + self.pending.len() as u64;
        Ok(self.inner.size()?.max(pending_end))
    }

    fn set_size(&mut self, size: u64) -> GdsResult<()> {
        self.drain()?;
        self.cache.clear();
        self.inner.set_size(size)
    }

    fn read_exact_at(&mut self, pos: u64, buf: &mut [u8]) -> GdsResult<()> {
        self.drain()?;
        if let Some(bytes) = self.cached(pos, buf.len()) {
            buf.copy_from_slice(bytes);
            return Ok(());
        }
        if buf.len() >= self.capacity {
            return self.inner.read_exact_at(pos, buf);
        }

        let available = self.inner.size()?.saturating_sub(pos);
        let window = usize::try_from(available).map_or(self.capacity, |a| a.min(self.capacity));
        if window < buf.len() {
            // Let the inner stream report the short read.
            return self.inner.read_exact_at(pos, buf);
        }
        self.cache.resize(window, 0);
        if let Err(err) = self.inner.read_exact_at(pos, &mut self.cache) {
            self.cache.clear();
            return Err(err);
        }
        self.cache_pos = pos;
        buf.copy_from_slice(&self.cache[..buf.len()]);
        log::trace!("read-ahead of {} bytes at {}", window, pos);
        Ok(())
    }

    fn write_all_at(&mut self, pos: u64, buf: &[u8]) -> GdsResult<()> {
        self.cache.clear();
        let pending_end = self.pending_pos + self.pending.len() as u64;
        let contiguous = !self.pending.is_empty() && pos == pending_end;
        if contiguous && self.pending.len() + buf.len() <= self.capacity {
            self.pending.extend_from_slice(buf);
            return Ok(());
        }

        self.drain()?;
        if buf.len() >= self.capacity {
            return self.inner.write_all_at(pos, buf);
        }
        self.pending_pos = pos;
        self.pending.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> GdsResult<()> {
        self.drain()?;
        self.inner.flush()
    }

    fn access(&self) -> StreamAccess {
        self.inner.access()
    }

    fn close_writer(&mut self) -> GdsResult<()> {
        self.drain()?;
        self.cache.clear();
        self.inner.close_writer()
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;
    use crate::MemoryStream;

    #[test]
    fn contiguous_writes_are_gathered() {
        let mut inner = MemoryStream::new();
        {
            let mut stream = BufferedStream::with_capacity(&mut inner, 16);
            stream.write_all_at(0, &[1, 2]).unwrap();
            stream.write_all_at(2, &[3]).unwrap();
            assert_eq!(stream.get_ref().size().unwrap(), 0);
            assert_eq!(stream.size().unwrap(), 3);
            stream.flush().unwrap();
        }
        assert_eq!(inner.as_bytes(), &[1, 2, 3]);
    }

    #[test]
    fn read_sees_pending_writes() {
        let mut stream = BufferedStream::with_capacity(MemoryStream::new(), 16);
        stream.write_all_at(0, &[5, 6, 7]).unwrap();
        let mut buf = [0u8; 2];
        stream.read_exact_at(1, &mut buf).unwrap();
        assert_eq!(buf, [6, 7]);
    }

    #[test]
    fn write_invalidates_read_ahead() {
        let mut stream = BufferedStream::with_capacity(MemoryStream::from(vec![0u8; 8]), 8);
        let mut buf = [9u8; 1];
        stream.read_exact_at(0, &mut buf).unwrap();
        stream.write_all_at(3, &[4]).unwrap();
        stream.read_exact_at(3, &mut buf).unwrap();
        assert_eq!(buf, [4]);
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(64)]
    fn scattered_writes_round_trip(#[case] capacity: usize) {
        let mut stream = BufferedStream::with_capacity(MemoryStream::new(), capacity);
        for i in (0..20u8).rev() {
            stream.write_all_at(u64::from(i) * 2, &[i, i]).unwrap();
        }
        let mut buf = [0u8; 40];
        stream.read_exact_at(0, &mut buf).unwrap();
        let expected: Vec<u8> = (0..20u8).flat_map(|i| [i, i]).collect();
        assert_eq!(buf.to_vec(), expected);
        let inner = stream.into_inner().unwrap();
        assert_eq!(inner.as_bytes(), expected.as_slice());
    }
}
