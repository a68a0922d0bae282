use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use gds_error::GdsResult;

use crate::{ByteStream, StreamAccess};

/// A stream over a file on disk.
#[derive(Debug)]
pub struct FileStream {
    file: File,
    access: StreamAccess,
}

impl FileStream {
    /// Create (or truncate) a file for reading and writing.
    pub fn create<P: AsRef<Path>>(path: P) -> GdsResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(file, StreamAccess::READ_WRITE))
    }

    /// Open an existing file for reading and writing.
    pub fn open<P: AsRef<Path>>(path: P) -> GdsResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Self::new(file, StreamAccess::READ_WRITE))
    }

    /// Open an existing file for reading only.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> GdsResult<Self> {
        Ok(Self::new(File::open(path)?, StreamAccess::READ_ONLY))
    }

    pub fn new(file: File, access: StreamAccess) -> Self {
        Self { file, access }
    }

    pub fn into_inner(self) -> File {
        self.file
    }
}

impl ByteStream for FileStream {
    fn size(&self) -> GdsResult<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn set_size(&mut self, size: u64) -> GdsResult<()> {
        Ok(self.file.set_len(size)?)
    }

    fn read_exact_at(&mut self, pos: u64, buf: &mut [u8]) -> GdsResult<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        Ok(self.file.read_exact(buf)?)
    }

    fn write_all_at(&mut self, pos: u64, buf: &[u8]) -> GdsResult<()> {
        self.file.seek(SeekFrom::Start(pos))?;
        Ok(self.file.write_all(buf)?)
    }

    fn flush(&mut self) -> GdsResult<()> {
        Ok(self.file.flush()?)
    }

    fn access(&self) -> StreamAccess {
        self.access
    }
}

#[cfg(test)]
mod test {
    use gds_error::ErrorKind;

    use super::*;

    #[test]
    fn write_reopen_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");

        let mut stream = FileStream::create(&path).unwrap();
        stream.write_all_at(2, &[7, 8, 9]).unwrap();
        stream.flush().unwrap();
        drop(stream);

        let mut stream = FileStream::open_read_only(&path).unwrap();
        assert_eq!(stream.size().unwrap(), 5);
        assert!(!stream.access().writable);
        let mut buf = [1u8; 5];
        stream.read_exact_at(0, &mut buf).unwrap();
        assert_eq!(buf, [0, 0, 7, 8, 9]);
    }

    #[test]
    fn short_read_is_alloc_read() {
        let file = tempfile::tempfile().unwrap();
        let mut stream = FileStream::new(file, StreamAccess::READ_WRITE);
        stream.write_all_at(0, &[1, 2]).unwrap();
        let mut buf = [0u8; 4];
        let err = stream.read_exact_at(0, &mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AllocRead);
    }
}
