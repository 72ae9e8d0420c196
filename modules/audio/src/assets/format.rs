use crate::errors::*;

/// How a decoded sample is encoded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Encoding {
    SignedInt,
    UnsignedInt,
    Float,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// The byte order of the current target.
    #[inline]
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }
}

/// The sample formats the native playback engine understands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    U8,
    S16,
    S24,
    S32,
    F32,
}

impl SampleFormat {
    /// Maps an encoding and a sample width onto a native format.
    pub fn from_encoding(encoding: Encoding, bits: u16) -> Result<Self> {
        match (encoding, bits) {
            (Encoding::UnsignedInt, 8) => Ok(SampleFormat::U8),
            (Encoding::SignedInt, 16) => Ok(SampleFormat::S16),
            (Encoding::SignedInt, 24) => Ok(SampleFormat::S24),
            (Encoding::SignedInt, 32) => Ok(SampleFormat::S32),
            (Encoding::Float, 32) => Ok(SampleFormat::F32),
            _ => Err(Error::UnsupportedFormat(format!("{:?}/{}", encoding, bits))),
        }
    }

    /// The identifier of this format on the native side.
    #[inline]
    pub fn code(self) -> i32 {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::S16 => 2,
            SampleFormat::S24 => 3,
            SampleFormat::S32 => 4,
            SampleFormat::F32 => 5,
        }
    }

    #[inline]
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::S16 => 2,
            SampleFormat::S24 => 3,
            SampleFormat::S32 | SampleFormat::F32 => 4,
        }
    }
}

/// Describes the decoded PCM coming out of a stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StreamFormat {
    pub encoding: Encoding,
    pub bits_per_sample: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_order: ByteOrder,
}

impl StreamFormat {
    /// Creates a native-endian stream format.
    pub fn new(encoding: Encoding, bits_per_sample: u16, channels: u16, sample_rate: u32) -> Self {
        StreamFormat {
            encoding,
            bits_per_sample,
            channels,
            sample_rate,
            byte_order: ByteOrder::native(),
        }
    }

    /// Checks that the native engine can play this format as-is, and returns
    /// the matching `SampleFormat`.
    pub fn validate(&self) -> Result<SampleFormat> {
        if self.byte_order != ByteOrder::native() {
            return Err(Error::ForeignByteOrder(self.byte_order));
        }

        let format = SampleFormat::from_encoding(self.encoding, self.bits_per_sample)?;

        if self.channels == 0 {
            return Err(Error::InvalidChannels);
        }

        if self.sample_rate == 0 {
            return Err(Error::InvalidSampleRate);
        }

        Ok(format)
    }
}
