use bytes::{Bytes, BytesMut};
use gds_error::{GdsResult, gds_bail};

use crate::ByteStream;

/// A growable stream held in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStream {
    data: BytesMut,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Freeze the contents into an immutable, cheaply cloneable buffer.
    pub fn into_bytes(self) -> Bytes {
        self.data.freeze()
    }

    fn range(&self, pos: u64, len: usize) -> GdsResult<std::ops::Range<usize>> {
        let start = usize::try_from(pos).ok();
        match start.and_then(|start| start.checked_add(len).map(|end| start..end)) {
            Some(range) if range.end <= self.data.len() => Ok(range),
            _ => gds_bail!(
                AllocRead: "read of {} bytes at {} runs past the end of a {} byte stream",
                len,
                pos,
                self.data.len()
            ),
        }
    }
}

impl From<Bytes> for MemoryStream {
    fn from(value: Bytes) -> Self {
        Self {
            data: BytesMut::from(value.as_ref()),
        }
    }
}

impl From<Vec<u8>> for MemoryStream {
    fn from(value: Vec<u8>) -> Self {
        Self {
            data: BytesMut::from(value.as_slice()),
        }
    }
}

impl ByteStream for MemoryStream {
    fn size(&self) -> GdsResult<u64> {
        Ok(self.data.len() as u64)
    }

    fn set_size(&mut self, size: u64) -> GdsResult<()> {
        let Ok(size) = usize::try_from(size) else {
            gds_bail!(Allocator: "a memory stream cannot hold {} bytes", size)
        };
        self.data.resize(size, 0);
        Ok(())
    }

    fn read_exact_at(&mut self, pos: u64, buf: &mut [u8]) -> GdsResult<()> {
        let range = self.range(pos, buf.len())?;
        buf.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn write_all_at(&mut self, pos: u64, buf: &[u8]) -> GdsResult<()> {
        let end = pos + buf.len() as u64;
        if end > self.data.len() as u64 {
            self.set_size(end)?;
        }
        let Ok(start) = usize::try_from(pos) else {
            gds_bail!(Allocator: "a memory stream cannot address byte {}", pos)
        };
        self.data[start..start + buf.len()].copy_from_slice(buf);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use gds_error::ErrorKind;

    use super::*;

    #[test]
    fn writes_extend_with_zeros() {
        let mut stream = MemoryStream::new();
        stream.write_all_at(4, &[1, 2]).unwrap();
        assert_eq!(stream.as_bytes(), &[0, 0, 0, 0, 1, 2]);
        assert_eq!(stream.size().unwrap(), 6);
    }

    #[test]
    fn read_past_end() {
        let mut stream = MemoryStream::from(vec![1, 2, 3]);
        let mut buf = [0u8; 2];
        stream.read_exact_at(1, &mut buf).unwrap();
        assert_eq!(buf, [2, 3]);
        let err = stream.read_exact_at(2, &mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AllocRead);
    }

    #[test]
    fn freeze() {
        let mut stream = MemoryStream::with_capacity(8);
        stream.write_all_at(0, b"gds").unwrap();
        stream.set_size(2).unwrap();
        assert_eq!(stream.into_bytes(), Bytes::from_static(b"gd"));
    }
}
