use std::sync::Arc;

use gds::dtype::{InBuffer, OutBuffer, SVType};
use gds::error::{
    ErrorKind, GdsResult, RecordLastError, WRITE_ONLY_MSG, last_error, set_last_error,
};
use gds::io::{
    Allocator, ByteStream, FileStream, LockedAllocator, MemoryStream, OffsetStream, PipeStream,
    StreamAccess,
};
use gds::{AbstractArray, Int32Array, Int64Array, UInt16Array, open_array};

fn pipe_allocator() -> Allocator {
    let mut alloc = Allocator::new();
    alloc.initialize(
        Box::new(PipeStream::writer(MemoryStream::new())),
        StreamAccess::READ_WRITE,
    );
    alloc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipe_is_readable_after_close_writer() {
        let mut array = Int32Array::new(pipe_allocator(), &[0]).unwrap();
        array.append(InBuffer::from(&[1i32, 2, 3])).unwrap();

        // One test owns the global last-error slot so parallel tests do not race on it.
        set_last_error(None);
        let mut out = [0i32; 3];
        let err = array
            .read_data(None, None, OutBuffer::from(&mut out))
            .record_last_error()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AllocRead);
        assert_eq!(last_error(), WRITE_ONLY_MSG);

        array.close_writer().unwrap();
        array.read_data(None, None, OutBuffer::from(&mut out)).unwrap();
        assert_eq!(out, [1, 2, 3]);
        assert!(array.append(InBuffer::from(&[4i32])).is_err());

        let ok: GdsResult<usize> = Ok(1);
        assert!(ok.record_last_error().is_ok());
        assert_eq!(last_error(), WRITE_ONLY_MSG);
        set_last_error(None);
    }

    #[test]
    fn file_backed_array_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.gds");

        let metadata = {
            let mut alloc = Allocator::new();
            alloc.initialize_buffered(
                Box::new(FileStream::create(&path).unwrap()),
                StreamAccess::READ_WRITE,
                256,
            );
            let mut array = UInt16Array::new(alloc, &[0, 4]).unwrap();
            for row in 0..50u16 {
                let values = [row, row + 1, row + 2, row + 3];
                array.append(InBuffer::from(&values)).unwrap();
            }
            array.close_writer().unwrap();
            array.base().metadata()
        };
        assert_eq!(metadata.dims, vec![50, 4]);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 400);

        let mut alloc = Allocator::new();
        alloc.initialize(
            Box::new(FileStream::open_read_only(&path).unwrap()),
            StreamAccess::READ_WRITE,
        );
        assert!(!alloc.can_write());
        let mut array = open_array(alloc, &metadata).unwrap();
        assert_eq!(array.sv_type(), SVType::U16);

        let mut out = [0i64; 4];
        array
            .read_data(Some(&[49, 0]), Some(&[1, 4]), OutBuffer::from(&mut out))
            .unwrap();
        assert_eq!(out, [49, 50, 51, 52]);
        let err = array.write_data(None, None, InBuffer::from(&[0u16; 200])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AllocWrite);
    }

    #[test]
    fn array_after_a_header() {
        let mut stream = MemoryStream::new();
        stream.write_all_at(0, b"GDSHEAD!").unwrap();

        let mut alloc = Allocator::new();
        alloc.initialize(Box::new(OffsetStream::new(stream, 8)), StreamAccess::READ_WRITE);
        let mut array = Int64Array::new(alloc, &[3]).unwrap();
        array.write_data(None, None, InBuffer::from(&[-1i64, 0, 1])).unwrap();
        assert_eq!(array.stream_size().unwrap(), 24);
        assert_eq!(array.to_vec().unwrap(), vec![-1, 0, 1]);
    }

    #[test]
    fn unbound_allocator_is_rejected() {
        let err = Int32Array::new(Allocator::new(), &[2]).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Allocator);
    }

    #[test]
    fn locked_allocator_serialises_threads() {
        let shared = Arc::new(LockedAllocator::new("genotype", Allocator::memory()));
        let handles: Vec<_> = (0..4u32)
            .map(|t| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || -> GdsResult<()> {
                    for i in 0..16u32 {
                        shared.with(|alloc| {
                            alloc.set_position(u64::from(t * 16 + i) * 4);
                            alloc.w32b(t * 100 + i)
                        })?;
                    }
                    Ok(())
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let mut guard = shared.lock();
        assert_eq!(guard.size().unwrap(), 256);
        guard.set_position(4 * 35);
        assert_eq!(guard.r32b().unwrap(), 203);
    }
}
