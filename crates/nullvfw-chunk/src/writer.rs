use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_chunk, ChunkConfig};
use crate::error::{ChunkError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 64 * 1024;

/// Writes complete chunks to any `Write` stream.
pub struct ChunkWriter<T> {
    inner: T,
    buf: BytesMut,
    config: ChunkConfig,
    chunks_written: u64,
}

impl<T: Write> ChunkWriter<T> {
    /// Create a new chunk writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ChunkConfig::default())
    }

    /// Create a new chunk writer with explicit configuration.
    pub fn with_config(inner: T, config: ChunkConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            chunks_written: 0,
        }
    }

    /// Length-prefix `payload` and write it out (blocking).
    pub fn write_chunk(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > self.config.max_payload_size {
            return Err(ChunkError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        encode_chunk(payload, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(ChunkError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ChunkError::Io(err)),
            }
        }

        self.chunks_written += 1;
        tracing::trace!(
            index = self.chunks_written,
            size = payload.len(),
            "chunk written"
        );
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ChunkError::Io(err)),
            }
        }
    }

    /// Number of chunks written so far.
    pub fn chunks_written(&self) -> u64 {
        self.chunks_written
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::decode_chunk;
    use crate::reader::ChunkReader;

    #[test]
    fn write_single_chunk() {
        let mut writer = ChunkWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.write_chunk(b"hello").unwrap();

        let mut wire = BytesMut::from(writer.into_inner().into_inner().as_slice());
        let chunk = decode_chunk(&mut wire, usize::MAX).unwrap().unwrap();
        assert_eq!(chunk.as_ref(), b"hello");
        assert!(wire.is_empty());
    }

    #[test]
    fn written_chunks_read_back_in_order() {
        let mut writer = ChunkWriter::new(Cursor::new(Vec::<u8>::new()));

        writer.write_chunk(b"one").unwrap();
        writer.write_chunk(b"").unwrap();
        writer.write_chunk(b"three").unwrap();
        writer.flush().unwrap();
        assert_eq!(writer.chunks_written(), 3);

        let wire = writer.into_inner().into_inner();
        let mut reader = ChunkReader::new(Cursor::new(wire));
        assert_eq!(reader.read_chunk().unwrap().unwrap().as_ref(), b"one");
        assert!(reader.read_chunk().unwrap().unwrap().is_empty());
        assert_eq!(reader.read_chunk().unwrap().unwrap().as_ref(), b"three");
        assert!(reader.read_chunk().unwrap().is_none());
    }

    #[test]
    fn payload_too_large_rejected() {
        let cfg = ChunkConfig {
            max_payload_size: 4,
        };
        let mut writer = ChunkWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer.write_chunk(b"oversized").unwrap_err();
        assert!(matches!(err, ChunkError::PayloadTooLarge { size: 9, max: 4 }));
        assert!(writer.get_ref().get_ref().is_empty());
    }

    #[test]
    fn handles_interrupted_write_and_flush() {
        let sink = InterruptedOnce {
            write_interrupted: false,
            flush_interrupted: false,
            data: Vec::new(),
        };

        let mut writer = ChunkWriter::new(sink);
        writer.write_chunk(b"retry").unwrap();
        writer.flush().unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.data.len(), 4 + 5);
    }

    #[test]
    fn zero_length_write_is_an_error() {
        let mut writer = ChunkWriter::new(ZeroWriter);
        let err = writer.write_chunk(b"x").unwrap_err();
        assert!(matches!(err, ChunkError::Io(e) if e.kind() == ErrorKind::WriteZero));
    }

    struct InterruptedOnce {
        write_interrupted: bool,
        flush_interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedOnce {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.write_interrupted {
                self.write_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_interrupted {
                self.flush_interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
