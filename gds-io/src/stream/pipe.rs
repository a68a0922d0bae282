use gds_error::{GdsResult, WRITE_ONLY_MSG, gds_bail};

use crate::{ByteStream, StreamAccess};

/// The boundary of a one-way stream transform, such as a compression pipe.
///
/// The pipe accepts writes until [`ByteStream::close_writer`] finalises it, after which it only
/// accepts reads. The transform itself is the identity; codecs live outside this crate and sit
/// behind the same contract.
pub struct PipeStream<S> {
    inner: S,
    finalized: bool,
}

impl<S: ByteStream> PipeStream<S> {
    /// A pipe that is open for writing.
    pub fn writer(inner: S) -> Self {
        Self {
            inner,
            finalized: false,
        }
    }

    /// A pipe over already finalised data.
    pub fn reader(inner: S) -> Self {
        Self {
            inner,
            finalized: true,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn check_read(&self) -> GdsResult<()> {
        if !self.finalized {
            gds_bail!(AllocRead: "{}", WRITE_ONLY_MSG);
        }
        Ok(())
    }

    fn check_write(&self) -> GdsResult<()> {
        if self.finalized {
            gds_bail!(AllocWrite: "the pipe has been finalised and is read-only");
        }
        Ok(())
    }
}

impl<S: ByteStream> ByteStream for PipeStream<S> {
    fn size(&self) -> GdsResult<u64> {
        self.inner.size()
    }

    fn set_size(&mut self, size: u64) -> GdsResult<()> {
        self.check_write()?;
        self.inner.set_size(size)
    }

    fn read_exact_at(&mut self, pos: u64, buf: &mut [u8]) -> GdsResult<()> {
        self.check_read()?;
        self.inner.read_exact_at(pos, buf)
    }

    fn write_all_at(&mut self, pos: u64, buf: &[u8]) -> GdsResult<()> {
        self.check_write()?;
        self.inner.write_all_at(pos, buf)
    }

    fn flush(&mut self) -> GdsResult<()> {
        self.inner.flush()
    }

    fn access(&self) -> StreamAccess {
        let direction = if self.finalized {
            StreamAccess::READ_ONLY
        } else {
            StreamAccess::WRITE_ONLY
        };
        direction.intersect(self.inner.access())
    }

    fn close_writer(&mut self) -> GdsResult<()> {
        if !self.finalized {
            self.inner.close_writer()?;
            self.finalized = true;
            log::debug!("pipe finalised at {} bytes", self.inner.size()?);
        }
        Ok(())
    }
}
