use std::io::{self, Read};

use super::format::StreamFormat;

/// A source of already-decoded PCM bytes, e.g. the output of a decoder.
///
/// A clip pool built from a stream keeps it until the pool is destroyed, and
/// closes it then.
pub trait PcmStream: Read + Send {
    /// Describes the bytes produced by `read`.
    fn format(&self) -> StreamFormat;

    /// Releases the resources held by the stream.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Adapts any reader that yields raw PCM into a `PcmStream`.
pub struct PcmReader<R> {
    reader: R,
    format: StreamFormat,
}

impl<R: Read + Send> PcmReader<R> {
    pub fn new(reader: R, format: StreamFormat) -> Self {
        PcmReader { reader, format }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read + Send> Read for PcmReader<R> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<R: Read + Send> PcmStream for PcmReader<R> {
    #[inline]
    fn format(&self) -> StreamFormat {
        self.format
    }
}
