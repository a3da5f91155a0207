pub use self::message_kind::MessageKind;
mod message_kind;


use std::num::NonZeroU32;

use crate::buf::{ReadBuf, MAX_ARRAY_LENGTH, MAX_BODY_LENGTH};
use crate::error::{ErrorKind, Result};
use crate::protocol::{Endianness, Field, Flags, MessageType};
use crate::signature::parse_one;
use crate::value::Value;
use crate::{marshal, BodyBuf, ObjectPath, OwnedSignature, Signature};

/// An owned D-Bus message: a kind, serial, flags, header fields and a body.
///
/// The body is kept as encoded bytes together with its signature and
/// endianness, and is decoded lazily through [`body`] or [`values`].
///
/// [`body`]: Self::body
/// [`values`]: Self::values
///
/// # Examples
///
/// ```
/// use std::num::NonZeroU32;
///
/// use wirebus::{Message, MessageKind, ObjectPath};
///
/// const PATH: &ObjectPath = ObjectPath::new_const("/org/freedesktop/DBus");
///
/// let serial = NonZeroU32::new(1).unwrap();
/// let m = Message::method_call(PATH, "Hello", serial)
///     .with_destination("org.freedesktop.DBus");
///
/// assert!(matches!(m.kind(), MessageKind::MethodCall { .. }));
/// assert_eq!(m.destination(), Some("org.freedesktop.DBus"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The type of the message.
    pub(crate) kind: MessageKind,
    /// Serial of the message. Never zero.
    pub(crate) serial: NonZeroU32,
    /// Flags in the message.
    pub(crate) flags: Flags,
    /// The interface of the message.
    pub(crate) interface: Option<Box<str>>,
    /// The destination of the message.
    pub(crate) destination: Option<Box<str>>,
    /// The sender of the message, set by the bus.
    pub(crate) sender: Option<Box<str>>,
    /// The signature of the body.
    pub(crate) signature: OwnedSignature,
    /// The number of out-of-band file descriptors accompanying the message.
    pub(crate) unix_fds: Option<u32>,
    /// The endianness the body is encoded in.
    pub(crate) endianness: Endianness,
    /// The encoded body.
    pub(crate) body: Box<[u8]>,
}

impl Message {
    fn new(kind: MessageKind, serial: NonZeroU32) -> Self {
        Self {
            kind,
            serial,
            flags: Flags::EMPTY,
            interface: None,
            destination: None,
            sender: None,
            signature: OwnedSignature::empty(),
            unix_fds: None,
            endianness: Endianness::NATIVE,
            body: Box::from([]),
        }
    }

    /// Construct a method call message.
    pub fn method_call(path: &ObjectPath, member: &str, serial: NonZeroU32) -> Self {
        Self::new(
            MessageKind::MethodCall {
                path: path.into(),
                member: member.into(),
            },
            serial,
        )
    }

    /// Construct a method return message replying to the given serial.
    pub fn method_return(serial: NonZeroU32, reply_serial: NonZeroU32) -> Self {
        Self::new(MessageKind::MethodReturn { reply_serial }, serial)
    }

    /// Construct an error message replying to the given serial.
    pub fn error(error_name: &str, serial: NonZeroU32, reply_serial: NonZeroU32) -> Self {
        Self::new(
            MessageKind::Error {
                error_name: error_name.into(),
                reply_serial,
            },
            serial,
        )
    }

    /// Construct a signal message.
    ///
    /// Signals require an interface; set one with [`with_interface`] before
    /// encoding.
    ///
    /// [`with_interface`]: Self::with_interface
    pub fn signal(path: &ObjectPath, member: &str, serial: NonZeroU32) -> Self {
        Self::new(
            MessageKind::Signal {
                path: path.into(),
                member: member.into(),
            },
            serial,
        )
    }

    /// Get the kind of the message.
    pub fn kind(&self) -> &MessageKind {
        &self.kind
    }

    /// Get the serial of the message.
    pub fn serial(&self) -> NonZeroU32 {
        self.serial
    }

    /// Modify the serial of the message.
    pub fn with_serial(self, serial: NonZeroU32) -> Self {
        Self { serial, ..self }
    }

    /// Get the flags of the message.
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Modify the flags of the message.
    pub fn with_flags(self, flags: Flags) -> Self {
        Self { flags, ..self }
    }

    /// Get the interface of the message.
    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    /// Modify the interface of the message.
    pub fn with_interface(self, interface: &str) -> Self {
        Self {
            interface: Some(interface.into()),
            ..self
        }
    }

    /// Get the destination of the message.
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    /// Modify the destination of the message.
    pub fn with_destination(self, destination: &str) -> Self {
        Self {
            destination: Some(destination.into()),
            ..self
        }
    }

    /// Get the sender of the message.
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    /// Modify the sender of the message.
    pub fn with_sender(self, sender: &str) -> Self {
        Self {
            sender: Some(sender.into()),
            ..self
        }
    }

    /// Get the signature of the message body.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Get the number of out-of-band file descriptors accompanying the
    /// message, if the header was present.
    pub fn unix_fds(&self) -> Option<u32> {
        self.unix_fds
    }

    /// Get the endianness the body is encoded in.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Modify the endianness the message is encoded in.
    ///
    /// This applies to the whole frame. Replacing the body through
    /// [`with_body_buf`] also replaces the endianness with that of the
    /// body buffer, so set it afterwards if both are used.
    ///
    /// [`with_body_buf`]: Self::with_body_buf
    pub fn with_endianness(self, endianness: Endianness) -> Self {
        Self { endianness, ..self }
    }

    /// Replace the body and signature of the message with the contents of
    /// the given body buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZeroU32;
    ///
    /// use wirebus::{BodyBuf, Message, ObjectPath, Signature};
    ///
    /// const PATH: &ObjectPath = ObjectPath::new_const("/org/freedesktop/DBus");
    ///
    /// let mut body = BodyBuf::new();
    /// body.write("Hello World!")?;
    ///
    /// let serial = NonZeroU32::new(1).unwrap();
    /// let m = Message::method_call(PATH, "Hello", serial).with_body_buf(&body);
    ///
    /// assert_eq!(m.signature(), Signature::STRING);
    /// # Ok::<_, wirebus::Error>(())
    /// ```
    pub fn with_body_buf(self, body: &BodyBuf) -> Self {
        Self {
            signature: body.signature().to_owned(),
            endianness: body.endianness(),
            body: body.get().into(),
            ..self
        }
    }

    /// Get a read cursor over the body of the message.
    pub fn body(&self) -> ReadBuf<'_> {
        ReadBuf::new(&self.body, self.endianness)
    }

    /// Decode the body into dynamically typed values according to the
    /// body signature.
    ///
    /// The body must be fully consumed by its signature.
    pub fn values(&self) -> Result<Vec<Value>> {
        let mut buf = self.body();
        let values = marshal::read_many(&mut buf, &self.signature)?;

        if !buf.is_empty() {
            return Err(ErrorKind::TrailingBytes(buf.len()).into());
        }

        Ok(values)
    }

    pub(crate) fn message_type(&self) -> MessageType {
        match &self.kind {
            MessageKind::MethodCall { .. } => MessageType::METHOD_CALL,
            MessageKind::MethodReturn { .. } => MessageType::METHOD_RETURN,
            MessageKind::Error { .. } => MessageType::ERROR,
            MessageKind::Signal { .. } => MessageType::SIGNAL,
            MessageKind::Unknown { message_type } => MessageType(*message_type),
        }
    }

    /// Decode one complete message frame.
    ///
    /// The first byte selects the endianness every following multi-byte
    /// value is decoded with. The frame must contain exactly one message.
    pub fn decode(bytes: &[u8]) -> Result<Message> {
        let Some(&marker) = bytes.first() else {
            return Err(ErrorKind::BufferUnderflow.into());
        };

        let Some(endianness) = Endianness::from_marker(marker) else {
            return Err(ErrorKind::InvalidEndianness(marker).into());
        };

        let mut buf = ReadBuf::new(bytes, endianness);

        buf.load::<u8>()?;
        let message_type = MessageType(buf.load::<u8>()?);
        let flags = Flags(buf.load::<u8>()?);
        let version = buf.load::<u8>()?;

        if version != 1 {
            return Err(ErrorKind::InvalidProtocolVersion(version).into());
        }

        let body_length = buf.load::<u32>()?;

        if body_length > MAX_BODY_LENGTH {
            return Err(ErrorKind::BodyTooLong(body_length).into());
        }

        let Some(serial) = NonZeroU32::new(buf.load::<u32>()?) else {
            return Err(ErrorKind::ZeroSerial.into());
        };

        let fields_length = buf.load::<u32>()?;

        if fields_length > MAX_ARRAY_LENGTH {
            return Err(ErrorKind::ArrayTooLong(fields_length).into());
        }

        let mut path = None;
        let mut interface = None;
        let mut member = None;
        let mut error_name = None;
        let mut reply_serial = None;
        let mut destination = None;
        let mut sender = None;
        let mut signature = OwnedSignature::empty();
        let mut unix_fds = None;

        let mut seen = [false; 256];
        let mut fields = buf.read_until(fields_length as usize)?;

        while !fields.is_empty() {
            // Each field is a struct, so it starts on an 8-byte boundary.
            fields.align(8)?;
            let field = Field(fields.load::<u8>()?);
            let value_signature = fields.read::<Signature>()?;

            if seen[field.0 as usize] {
                return Err(ErrorKind::DuplicateHeaderField(field).into());
            }

            seen[field.0 as usize] = true;

            match (field, value_signature.as_str()) {
                (Field::PATH, "o") => {
                    path = Some(Box::<ObjectPath>::from(fields.read::<ObjectPath>()?));
                }
                (Field::INTERFACE, "s") => {
                    interface = Some(Box::<str>::from(fields.read::<str>()?));
                }
                (Field::MEMBER, "s") => {
                    member = Some(Box::<str>::from(fields.read::<str>()?));
                }
                (Field::ERROR_NAME, "s") => {
                    error_name = Some(Box::<str>::from(fields.read::<str>()?));
                }
                (Field::REPLY_SERIAL, "u") => {
                    let Some(value) = NonZeroU32::new(fields.load::<u32>()?) else {
                        return Err(ErrorKind::ZeroReplySerial.into());
                    };

                    reply_serial = Some(value);
                }
                (Field::DESTINATION, "s") => {
                    destination = Some(Box::<str>::from(fields.read::<str>()?));
                }
                (Field::SENDER, "s") => {
                    sender = Some(Box::<str>::from(fields.read::<str>()?));
                }
                (Field::SIGNATURE, "g") => {
                    signature = fields.read::<Signature>()?.to_owned();
                }
                (Field::UNIX_FDS, "u") => {
                    unix_fds = Some(fields.load::<u32>()?);
                }
                _ => {
                    // An unrecognized field; skip its value by signature.
                    let ty = parse_one(value_signature.as_str())?;
                    marshal::read_value(&mut fields, &ty)?;
                }
            }
        }

        buf.align(8)?;
        let body = buf.load_slice(body_length as usize)?;

        if !buf.is_empty() {
            return Err(ErrorKind::TrailingBytes(buf.len()).into());
        }

        if !body.is_empty() && signature.is_empty() {
            return Err(ErrorKind::MissingSignature.into());
        }

        let kind = match message_type {
            MessageType::METHOD_CALL => {
                let Some(path) = path else {
                    return Err(ErrorKind::MissingPath.into());
                };

                let Some(member) = member else {
                    return Err(ErrorKind::MissingMember.into());
                };

                MessageKind::MethodCall { path, member }
            }
            MessageType::METHOD_RETURN => {
                let Some(reply_serial) = reply_serial else {
                    return Err(ErrorKind::MissingReplySerial.into());
                };

                MessageKind::MethodReturn { reply_serial }
            }
            MessageType::ERROR => {
                let Some(error_name) = error_name else {
                    return Err(ErrorKind::MissingErrorName.into());
                };

                let Some(reply_serial) = reply_serial else {
                    return Err(ErrorKind::MissingReplySerial.into());
                };

                MessageKind::Error {
                    error_name,
                    reply_serial,
                }
            }
            MessageType::SIGNAL => {
                let Some(path) = path else {
                    return Err(ErrorKind::MissingPath.into());
                };

                let Some(member) = member else {
                    return Err(ErrorKind::MissingMember.into());
                };

                if interface.is_none() {
                    return Err(ErrorKind::MissingInterface.into());
                }

                MessageKind::Signal { path, member }
            }
            MessageType(other) => MessageKind::Unknown {
                message_type: other,
            },
        };

        Ok(Message {
            kind,
            serial,
            flags,
            interface,
            destination,
            sender,
            signature,
            unix_fds,
            endianness,
            body: body.into(),
        })
    }
}
