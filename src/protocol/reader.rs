//! Line/frame reader
//!
//! Buffered blocking reads over a raw byte source, exposing the two
//! primitives the decoder is built on: read through the next `\n`, and read
//! exactly N bytes.

use std::io::{self, BufRead, BufReader, ErrorKind, Read};

/// Default buffer capacity (16 KB)
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// Buffered reader over a byte source
pub struct LineReader<R> {
    inner: BufReader<R>,
}

impl<R: Read> LineReader<R> {
    /// Wrap a byte source with the default buffer size
    pub fn new(source: R) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, source)
    }

    /// Wrap a byte source with a buffer of `capacity` bytes
    pub fn with_capacity(capacity: usize, source: R) -> Self {
        Self {
            inner: BufReader::with_capacity(capacity, source),
        }
    }

    /// Read up to and including the next `\n` into `buf`
    ///
    /// `buf` is cleared first. End of stream, whether before any byte or in
    /// the middle of a line, is reported as `UnexpectedEof`.
    pub fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<()> {
        buf.clear();
        let read = self.inner.read_until(b'\n', buf)?;
        if read == 0 {
            return Err(io::Error::new(ErrorKind::UnexpectedEof, "stream closed"));
        }
        if buf.last() != Some(&b'\n') {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("stream closed mid-line after {} bytes", buf.len()),
            ));
        }
        Ok(())
    }

    /// Read exactly `len` bytes into a freshly allocated buffer
    pub fn read_exact_vec(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut body = vec![0u8; len];
        self.inner.read_exact(&mut body)?;
        Ok(body)
    }

    /// Bytes already buffered but not yet consumed
    pub fn buffered(&self) -> &[u8] {
        self.inner.buffer()
    }

    /// Get a reference to the underlying source
    pub fn get_ref(&self) -> &R {
        self.inner.get_ref()
    }

    /// Unwrap, discarding any buffered bytes
    pub fn into_inner(self) -> R {
        self.inner.into_inner()
    }
}
