use std::fmt;
use std::io;

use failure::Fail;

use crate::assets::format::ByteOrder;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Sample format {} is not supported.", _0)]
    UnsupportedFormat(String),
    #[fail(display = "Only native-endian samples are supported, got {:?}.", _0)]
    ForeignByteOrder(ByteOrder),
    #[fail(display = "The channel count of a sample must be positive.")]
    InvalidChannels,
    #[fail(display = "The sample rate of a sample must be positive.")]
    InvalidSampleRate,
    #[fail(display = "{}", _0)]
    Native(#[cause] NativeError),
    #[fail(display = "{}", _0)]
    IO(#[cause] io::Error),
    #[fail(display = "Malformed audio settings. {}", _0)]
    Settings(#[cause] serde_json::Error),
    #[fail(display = "Failed to start eviction workers. {}", _0)]
    Scheduler(String),
    #[fail(display = "Audio system has not been initialized properly.")]
    NotInitialized,
    #[fail(display = "Duplicated setup of audio system.")]
    AlreadyInitialized,
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IO(err)
    }
}

impl From<NativeError> for Error {
    fn from(err: NativeError) -> Self {
        Error::Native(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Settings(err)
    }
}

/// A failed call into the native playback engine, identified by the result
/// code it returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeError {
    code: i32,
}

impl NativeError {
    pub const ERROR: NativeError = NativeError { code: -1 };
    pub const INVALID_ARGS: NativeError = NativeError { code: -2 };
    pub const INVALID_OPERATION: NativeError = NativeError { code: -3 };
    pub const OUT_OF_MEMORY: NativeError = NativeError { code: -4 };
    pub const OUT_OF_RANGE: NativeError = NativeError { code: -5 };
    pub const FORMAT_NOT_SUPPORTED: NativeError = NativeError { code: -200 };

    #[inline]
    pub fn new(code: i32) -> Self {
        NativeError { code }
    }

    #[inline]
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Returns the symbolic name of the result code, if it is a known one.
    pub fn name(&self) -> Option<&'static str> {
        let name = match self.code {
            0 => "MA_SUCCESS",
            -1 => "MA_ERROR",
            -2 => "MA_INVALID_ARGS",
            -3 => "MA_INVALID_OPERATION",
            -4 => "MA_OUT_OF_MEMORY",
            -5 => "MA_OUT_OF_RANGE",
            -6 => "MA_ACCESS_DENIED",
            -7 => "MA_DOES_NOT_EXIST",
            -8 => "MA_ALREADY_EXISTS",
            -9 => "MA_TOO_MANY_OPEN_FILES",
            -10 => "MA_INVALID_FILE",
            -11 => "MA_TOO_BIG",
            -12 => "MA_PATH_TOO_LONG",
            -13 => "MA_NAME_TOO_LONG",
            -14 => "MA_NOT_DIRECTORY",
            -15 => "MA_IS_DIRECTORY",
            -16 => "MA_DIRECTORY_NOT_EMPTY",
            -17 => "MA_AT_END",
            -18 => "MA_NO_SPACE",
            -19 => "MA_BUSY",
            -20 => "MA_IO_ERROR",
            -21 => "MA_INTERRUPT",
            -22 => "MA_UNAVAILABLE",
            -23 => "MA_ALREADY_IN_USE",
            -24 => "MA_BAD_ADDRESS",
            -25 => "MA_BAD_SEEK",
            -26 => "MA_BAD_PIPE",
            -27 => "MA_DEADLOCK",
            -28 => "MA_TOO_MANY_LINKS",
            -29 => "MA_NOT_IMPLEMENTED",
            -30 => "MA_NO_MESSAGE",
            -31 => "MA_BAD_MESSAGE",
            -32 => "MA_NO_DATA_AVAILABLE",
            -33 => "MA_INVALID_DATA",
            -34 => "MA_TIMEOUT",
            -35 => "MA_NO_NETWORK",
            -36 => "MA_NOT_UNIQUE",
            -37 => "MA_NOT_SOCKET",
            -38 => "MA_NO_ADDRESS",
            -39 => "MA_BAD_PROTOCOL",
            -40 => "MA_PROTOCOL_UNAVAILABLE",
            -41 => "MA_PROTOCOL_NOT_SUPPORTED",
            -42 => "MA_PROTOCOL_FAMILY_NOT_SUPPORTED",
            -43 => "MA_ADDRESS_FAMILY_NOT_SUPPORTED",
            -44 => "MA_SOCKET_NOT_SUPPORTED",
            -45 => "MA_CONNECTION_RESET",
            -46 => "MA_ALREADY_CONNECTED",
            -47 => "MA_NOT_CONNECTED",
            -48 => "MA_CONNECTION_REFUSED",
            -49 => "MA_NO_HOST",
            -50 => "MA_IN_PROGRESS",
            -51 => "MA_CANCELLED",
            -52 => "MA_MEMORY_ALREADY_MAPPED",
            -100 => "MA_CRC_MISMATCH",
            -200 => "MA_FORMAT_NOT_SUPPORTED",
            -201 => "MA_DEVICE_TYPE_NOT_SUPPORTED",
            -202 => "MA_SHARE_MODE_NOT_SUPPORTED",
            -203 => "MA_NO_BACKEND",
            -204 => "MA_NO_DEVICE",
            -205 => "MA_API_NOT_FOUND",
            -206 => "MA_INVALID_DEVICE_CONFIG",
            -207 => "MA_LOOP",
            -208 => "MA_BACKEND_NOT_ENABLED",
            -300 => "MA_DEVICE_NOT_INITIALIZED",
            -301 => "MA_DEVICE_ALREADY_INITIALIZED",
            -302 => "MA_DEVICE_NOT_STARTED",
            -303 => "MA_DEVICE_NOT_STOPPED",
            -400 => "MA_FAILED_TO_INIT_BACKEND",
            -401 => "MA_FAILED_TO_OPEN_BACKEND_DEVICE",
            -402 => "MA_FAILED_TO_START_BACKEND_DEVICE",
            -403 => "MA_FAILED_TO_STOP_BACKEND_DEVICE",
            _ => return None,
        };

        Some(name)
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "Native playback call failed: {}", name),
            None => write!(
                f,
                "Native playback call failed: <unknown result {}>",
                self.code
            ),
        }
    }
}

impl Fail for NativeError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn native_names() {
        assert_eq!(NativeError::new(0).name(), Some("MA_SUCCESS"));
        assert_eq!(NativeError::OUT_OF_MEMORY.name(), Some("MA_OUT_OF_MEMORY"));
        assert_eq!(NativeError::new(-303).name(), Some("MA_DEVICE_NOT_STOPPED"));
        assert_eq!(NativeError::new(-77).name(), None);

        assert_eq!(
            NativeError::new(-77).to_string(),
            "Native playback call failed: <unknown result -77>"
        );
    }

    #[test]
    fn conversions() {
        let err: Error = NativeError::INVALID_ARGS.into();
        assert_eq!(
            err.to_string(),
            "Native playback call failed: MA_INVALID_ARGS"
        );

        let err: Error = io::Error::new(io::ErrorKind::Other, "closed").into();
        assert!(err.cause().is_some());
    }
}
