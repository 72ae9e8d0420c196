pub mod buffer;
pub mod format;
pub mod stream;

pub mod prelude {
    pub use super::buffer::SampleBuffer;
    pub use super::format::{ByteOrder, Encoding, SampleFormat, StreamFormat};
    pub use super::stream::{PcmReader, PcmStream};
}
