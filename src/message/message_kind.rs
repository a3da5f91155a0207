use std::num::NonZeroU32;

use crate::ObjectPath;

/// The kind of a [`Message`], together with the header fields specific to
/// that kind.
///
/// [`Message`]: crate::Message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// A method call. May prompt a reply correlated by serial.
    MethodCall {
        /// The object the call is directed at.
        path: Box<ObjectPath>,
        /// The method being invoked.
        member: Box<str>,
    },
    /// A reply to a method call.
    MethodReturn {
        /// The serial of the call being replied to.
        reply_serial: NonZeroU32,
    },
    /// An error reply to a method call.
    Error {
        /// The name of the error that occurred.
        error_name: Box<str>,
        /// The serial of the call being replied to.
        reply_serial: NonZeroU32,
    },
    /// A signal emission.
    Signal {
        /// The object the signal is emitted from.
        path: Box<ObjectPath>,
        /// The name of the signal.
        member: Box<str>,
    },
    /// A message whose type code this library does not know.
    ///
    /// The message is preserved so it can be inspected or forwarded; the
    /// kind-specific header fields of known types are not interpreted.
    Unknown {
        /// The raw message type code.
        message_type: u8,
    },
}
