use std::error;
use std::fmt;
use std::io;
use std::str::Utf8Error;

use crate::protocol::{Field, Type};
use crate::ObjectPathError;
use crate::SignatureError;

/// Result alias using an [`Error`] as the error type by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error raised by this crate.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    #[inline]
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Self { kind }
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl From<SignatureError> for Error {
    #[inline]
    fn from(error: SignatureError) -> Self {
        Self::new(ErrorKind::Signature(error))
    }
}

impl From<ObjectPathError> for Error {
    #[inline]
    fn from(error: ObjectPathError) -> Self {
        Self::new(ErrorKind::ObjectPath(error))
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(error: io::Error) -> Self {
        Self::new(ErrorKind::Io(error))
    }
}

impl From<Utf8Error> for Error {
    #[inline]
    fn from(error: Utf8Error) -> Self {
        Self::new(ErrorKind::Utf8(error))
    }
}

impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ErrorKind::Io(error) => error.fmt(f),
            ErrorKind::Signature(error) => error.fmt(f),
            ErrorKind::ObjectPath(error) => error.fmt(f),
            ErrorKind::Utf8(error) => error.fmt(f),
            ErrorKind::UnexpectedEof { read, requested } => {
                write!(f, "Unexpected end of stream after {read} bytes ({requested} requested)")
            }
            ErrorKind::ConnectionClosed => write!(f, "Connection closed"),
            ErrorKind::OutOfRange {
                value,
                min,
                max,
                ty,
            } => {
                write!(f, "Value {value} out of range {min}..{max} for type '{}'", ty.char())
            }
            ErrorKind::ValueMismatch { expected, found } => {
                write!(f, "Expected {expected} value, found {found}")
            }
            ErrorKind::StructArity { expected, got } => {
                write!(f, "Struct has {expected} fields, but {got} values were supplied")
            }
            ErrorKind::ValueArity { expected, got } => {
                write!(f, "Signature describes {expected} values, but {got} were supplied")
            }
            ErrorKind::InvalidEndianness(byte) => {
                write!(f, "Invalid endianness marker {byte:#04x}")
            }
            ErrorKind::InvalidProtocolVersion(version) => {
                write!(f, "Unsupported protocol version {version} (only 1 is supported)")
            }
            ErrorKind::InvalidBoolean(value) => {
                write!(f, "Invalid boolean value {value} (only 0 and 1 are valid)")
            }
            ErrorKind::ArrayOverrun { length } => {
                write!(f, "Array element read past the end of its {length} byte body")
            }
            ErrorKind::DuplicateDictKey => write!(f, "Duplicate key in dictionary"),
            ErrorKind::DuplicateHeaderField(field) => {
                write!(f, "Duplicate header field {field:?}")
            }
            ErrorKind::MissingPath => write!(f, "Missing required PATH header"),
            ErrorKind::MissingInterface => write!(f, "Missing required INTERFACE header"),
            ErrorKind::MissingMember => write!(f, "Missing required MEMBER header"),
            ErrorKind::MissingReplySerial => write!(f, "Missing required REPLY_SERIAL header"),
            ErrorKind::MissingErrorName => write!(f, "Missing required ERROR_NAME header"),
            ErrorKind::MissingSignature => {
                write!(f, "Non-empty body requires a SIGNATURE header")
            }
            ErrorKind::ZeroSerial => write!(f, "Zero serial in header"),
            ErrorKind::ZeroReplySerial => write!(f, "Zero REPLY_SERIAL header"),
            ErrorKind::NotNullTerminated => write!(f, "String is not null terminated"),
            ErrorKind::BufferUnderflow => write!(f, "Buffer underflow"),
            ErrorKind::TrailingBytes(len) => {
                write!(f, "{len} bytes left over after decoding")
            }
            ErrorKind::ArrayTooLong(length) => {
                write!(f, "Array of length {length} is too long (max is 67108864)")
            }
            ErrorKind::BodyTooLong(length) => {
                write!(f, "Body of length {length} is too long (max is 134217728)")
            }
            ErrorKind::MissingBus => write!(f, "Missing session bus address"),
            ErrorKind::InvalidAddress(address) => {
                write!(f, "Unsupported d-bus address `{address}`")
            }
            ErrorKind::InvalidSasl => write!(f, "Malformed SASL message"),
            ErrorKind::SaslRejected(line) => {
                write!(f, "Authentication rejected: {line}")
            }
            ErrorKind::ResponseError(error_name, message) => {
                write!(f, "Response error: {error_name}: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(error) => Some(error),
            ErrorKind::Signature(error) => Some(error),
            ErrorKind::ObjectPath(error) => Some(error),
            ErrorKind::Utf8(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) enum ErrorKind {
    Io(io::Error),
    Signature(SignatureError),
    ObjectPath(ObjectPathError),
    Utf8(Utf8Error),
    UnexpectedEof { read: usize, requested: usize },
    ConnectionClosed,
    OutOfRange {
        value: i128,
        min: i128,
        max: i128,
        ty: Type,
    },
    ValueMismatch {
        expected: &'static str,
        found: &'static str,
    },
    StructArity { expected: usize, got: usize },
    ValueArity { expected: usize, got: usize },
    InvalidEndianness(u8),
    InvalidProtocolVersion(u8),
    InvalidBoolean(u32),
    ArrayOverrun { length: u32 },
    DuplicateDictKey,
    DuplicateHeaderField(Field),
    MissingPath,
    MissingInterface,
    MissingMember,
    MissingReplySerial,
    MissingErrorName,
    MissingSignature,
    ZeroSerial,
    ZeroReplySerial,
    NotNullTerminated,
    BufferUnderflow,
    TrailingBytes(usize),
    ArrayTooLong(u32),
    BodyTooLong(u32),
    MissingBus,
    InvalidAddress(Box<str>),
    InvalidSasl,
    SaslRejected(Box<str>),
    ResponseError(Box<str>, Box<str>),
}
