use std::io::Read;
use std::time::Duration;

use super::format::{SampleFormat, StreamFormat};
use super::stream::PcmStream;
use crate::errors::*;

/// Initial capacity reserved when reading a `PcmStream`.
pub const BUFFER_SIZE: usize = 0x1000;

/// Immutable decoded PCM payload together with its format.
///
/// Every playback handle minted by a clip pool plays from the same buffer.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    data: Vec<u8>,
    format: SampleFormat,
    channels: u16,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Wraps already-decoded bytes. Fails if the format can not be played by
    /// the native engine as-is.
    pub fn new(data: Vec<u8>, format: StreamFormat) -> Result<Self> {
        let sample_format = format.validate()?;

        Ok(SampleBuffer {
            data,
            format: sample_format,
            channels: format.channels,
            sample_rate: format.sample_rate,
        })
    }

    /// Reads `stream` to its end.
    pub fn from_stream<S: PcmStream + ?Sized>(stream: &mut S) -> Result<Self> {
        let format = stream.format();
        format.validate()?;

        let mut data = Vec::with_capacity(BUFFER_SIZE);
        stream.read_to_end(&mut data)?;
        SampleBuffer::new(data, format)
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn format(&self) -> SampleFormat {
        self.format
    }

    #[inline]
    pub fn channels(&self) -> u16 {
        self.channels
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Bytes per PCM frame, one sample for every channel.
    #[inline]
    pub fn frame_size(&self) -> usize {
        self.format.bytes_per_sample() * self.channels as usize
    }

    /// Number of complete PCM frames in this buffer.
    #[inline]
    pub fn frames(&self) -> u64 {
        (self.data.len() / self.frame_size()) as u64
    }

    /// Playback length at the native sample rate.
    pub fn duration(&self) -> Duration {
        let frames = self.frames();
        let rate = u64::from(self.sample_rate);
        let secs = frames / rate;
        let nanos = (frames % rate) * 1_000_000_000 / rate;
        Duration::new(secs, nanos as u32)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assets::format::Encoding;
    use crate::assets::stream::PcmReader;
    use std::io::{self, Cursor};

    #[test]
    fn metadata() {
        let format = StreamFormat::new(Encoding::SignedInt, 16, 2, 8000);
        let buffer = SampleBuffer::new(vec![0; 8000 * 4 + 3], format).unwrap();

        assert_eq!(buffer.format(), SampleFormat::S16);
        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.sample_rate(), 8000);
        assert_eq!(buffer.frame_size(), 4);
        assert_eq!(buffer.frames(), 8000);
        assert_eq!(buffer.duration(), Duration::from_secs(1));
    }

    #[test]
    fn reads_across_blocks() {
        let bytes: Vec<u8> = (0..BUFFER_SIZE * 2 + 17).map(|v| v as u8).collect();
        let format = StreamFormat::new(Encoding::UnsignedInt, 8, 1, 22050);

        let mut stream = PcmReader::new(Cursor::new(bytes.clone()), format);
        let buffer = SampleBuffer::from_stream(&mut stream).unwrap();
        assert_eq!(buffer.data(), &bytes[..]);
    }

    /// Fails every other read with `Interrupted`.
    struct Flaky {
        inner: Cursor<Vec<u8>>,
        interrupt: bool,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "again"));
            }

            let n = buf.len().min(100);
            self.inner.read(&mut buf[..n])
        }
    }

    #[test]
    fn retries_interrupted_reads() {
        let bytes: Vec<u8> = (0..1000).map(|v| v as u8).collect();
        let format = StreamFormat::new(Encoding::UnsignedInt, 8, 1, 22050);
        let flaky = Flaky {
            inner: Cursor::new(bytes.clone()),
            interrupt: false,
        };

        let mut stream = PcmReader::new(flaky, format);
        let buffer = SampleBuffer::from_stream(&mut stream).unwrap();
        assert_eq!(buffer.data(), &bytes[..]);
    }

    #[test]
    fn empty_stream() {
        let format = StreamFormat::new(Encoding::Float, 32, 1, 48000);
        let mut stream = PcmReader::new(io::empty(), format);

        let buffer = SampleBuffer::from_stream(&mut stream).unwrap();
        assert_eq!(buffer.frames(), 0);
        assert_eq!(buffer.duration(), Duration::from_secs(0));
    }

    #[test]
    fn rejects_unsupported_formats() {
        let format = StreamFormat::new(Encoding::Float, 64, 1, 48000);
        assert!(SampleBuffer::new(vec![0; 16], format).is_err());

        let mut stream = PcmReader::new(io::repeat(0), format);
        assert!(SampleBuffer::from_stream(&mut stream).is_err());
    }
}
