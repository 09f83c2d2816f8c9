use std::io;
use std::net;

/// Result alias used throughout the wire codec and transport boundary.
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Errors a codec or transport operation can produce.
///
/// `Wait` means "not enough data yet, try again once more arrives" and is
/// never logged as a failure; `Fatal` means the connection or message is
/// unrecoverable.
#[derive(Debug, Eq, PartialEq)]
pub enum NetworkError {
    Wait,
    Fatal(ErrorType),
}

#[derive(Debug, Eq, PartialEq)]
pub enum ErrorType {
    EmptyPayload,
    PayloadTooLarge,
    UnknownMessageId(u8),
    AddrParse,
    Utf8,
    Io(io::ErrorKind),
}

impl From<io::Error> for NetworkError {
    #[inline]
    fn from(io_error: io::Error) -> Self {
        match io_error.kind() {
            io::ErrorKind::WouldBlock => NetworkError::Wait,
            io::ErrorKind::UnexpectedEof => NetworkError::Wait,
            kind => NetworkError::Fatal(ErrorType::Io(kind)),
        }
    }
}

impl From<net::AddrParseError> for NetworkError {
    #[inline]
    fn from(_: net::AddrParseError) -> Self {
        NetworkError::Fatal(ErrorType::AddrParse)
    }
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::Wait => write!(f, "would block"),
            NetworkError::Fatal(kind) => write!(f, "fatal network error: {:?}", kind),
        }
    }
}

impl std::error::Error for NetworkError {}

pub trait ErrorUtils {
    fn has_failed(&self) -> bool;
}

impl<T> ErrorUtils for NetworkResult<T> {
    #[inline]
    fn has_failed(&self) -> bool {
        match self {
            Ok(_) => false,
            Err(NetworkError::Wait) => false,
            _ => true,
        }
    }
}
