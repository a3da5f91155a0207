//! Low level details of the D-Bus wire protocol.

use std::ops::{BitAnd, BitOr, BitXor};

raw_enum! {
    /// The endianness of a message.
    #[repr(u8)]
    pub enum Endianness {
        /// Little endian, the `l` marker.
        LITTLE = b'l',
        /// Big endian, the `B` marker.
        BIG = b'B',
    }
}

impl Endianness {
    /// Native endian.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::LITTLE;
    /// Native endian.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::BIG;

    /// Interpret a marker byte from the head of a message.
    pub(crate) fn from_marker(byte: u8) -> Option<Self> {
        match byte {
            b'l' => Some(Self::LITTLE),
            b'B' => Some(Self::BIG),
            _ => None,
        }
    }
}

raw_enum! {
    /// The type of a message.
    #[repr(u8)]
    pub enum MessageType {
        /// Method call. This message type may prompt a reply.
        METHOD_CALL = 1,
        /// Method reply with returned data.
        METHOD_RETURN = 2,
        /// Error reply.
        ERROR = 3,
        /// Signal emission.
        SIGNAL = 4,
    }
}

raw_set! {
    /// Flags inside of a D-Bus message.
    ///
    /// # Examples
    ///
    /// ```
    /// use wirebus::Flags;
    ///
    /// let flags = Flags::EMPTY;
    /// assert!(!(flags & Flags::NO_REPLY_EXPECTED));
    ///
    /// let flags = Flags::EMPTY | Flags::NO_REPLY_EXPECTED;
    /// assert!(flags & Flags::NO_REPLY_EXPECTED);
    /// assert!(!(flags & Flags::NO_AUTO_START));
    /// ```
    #[repr(u8)]
    pub enum Flags {
        /// An empty set of flags.
        EMPTY = 0,
        /// This message does not expect method return replies or error
        /// replies, even if it is of a type that can have a reply; the reply
        /// should be omitted.
        NO_REPLY_EXPECTED = 1,
        /// The bus must not launch an owner for the destination name in
        /// response to this message.
        NO_AUTO_START = 2,
        /// The caller is prepared to wait for interactive authorization,
        /// which might take a considerable time to complete.
        ALLOW_INTERACTIVE_AUTHORIZATION = 4,
    }
}

impl BitOr<Flags> for Flags {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Flags) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd<Flags> for Flags {
    type Output = bool;

    #[inline]
    fn bitand(self, rhs: Flags) -> Self::Output {
        self.0 & rhs.0 != 0
    }
}

impl BitXor<Flags> for Flags {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Flags) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

raw_enum! {
    /// A header field key.
    #[repr(u8)]
    pub(crate) enum Field {
        /// The object to send a call to, or the object a signal is emitted
        /// from.
        PATH = 1,
        /// The interface to invoke a method call on, or that a signal is
        /// emitted from. Optional for method calls, required for signals.
        INTERFACE = 2,
        /// The member, either the method name or signal name.
        MEMBER = 3,
        /// The name of the error that occurred, for errors.
        ERROR_NAME = 4,
        /// The serial number of the message this message is a reply to.
        REPLY_SERIAL = 5,
        /// The name of the connection this message is intended for.
        DESTINATION = 6,
        /// Unique name of the sending connection, controlled by the bus.
        SENDER = 7,
        /// The signature of the message body. If omitted, the body must be
        /// 0-length.
        SIGNATURE = 8,
        /// The number of Unix file descriptors that accompany the message.
        UNIX_FDS = 9,
    }
}

raw_enum! {
    /// A type code inside of a signature.
    #[repr(u8)]
    pub enum Type {
        /// 8-bit unsigned integer.
        BYTE = b'y',
        /// Boolean value. 0 is FALSE and 1 is TRUE, everything else is
        /// invalid.
        BOOLEAN = b'b',
        /// 16-bit signed integer.
        INT16 = b'n',
        /// 16-bit unsigned integer.
        UINT16 = b'q',
        /// 32-bit signed integer.
        INT32 = b'i',
        /// 32-bit unsigned integer.
        UINT32 = b'u',
        /// 64-bit signed integer.
        INT64 = b'x',
        /// 64-bit unsigned integer.
        UINT64 = b't',
        /// IEEE 754 double.
        DOUBLE = b'd',
        /// UTF-8 string. Nul terminated on the wire, the terminator excluded
        /// from the length prefix.
        STRING = b's',
        /// Name of an object instance, encoded like a string.
        OBJECT_PATH = b'o',
        /// A type signature, length prefixed with a single byte.
        SIGNATURE = b'g',
        /// Array, a 32-bit byte length followed by the element bodies.
        ARRAY = b'a',
        /// Variant; the type of the value is part of the value itself.
        VARIANT = b'v',
        /// Index into an out-of-band array of file descriptors.
        UNIX_FD = b'h',
        /// Start of a struct.
        OPEN_PAREN = b'(',
        /// End of a struct.
        CLOSE_PAREN = b')',
        /// Start of a dict entry.
        OPEN_BRACE = b'{',
        /// End of a dict entry.
        CLOSE_BRACE = b'}',
    }
}

impl Type {
    /// The size of the type on the wire, if it is fixed-size.
    pub(crate) fn size(self) -> Option<usize> {
        match self {
            Type::BYTE => Some(1),
            Type::BOOLEAN => Some(4),
            Type::INT16 | Type::UINT16 => Some(2),
            Type::INT32 | Type::UINT32 | Type::UNIX_FD => Some(4),
            Type::INT64 | Type::UINT64 | Type::DOUBLE => Some(8),
            _ => None,
        }
    }

    /// The natural alignment of the type on the wire.
    pub(crate) fn alignment(self) -> usize {
        match self {
            Type::STRING | Type::OBJECT_PATH | Type::ARRAY => 4,
            Type::SIGNATURE | Type::VARIANT => 1,
            Type::OPEN_PAREN | Type::OPEN_BRACE => 8,
            other => other.size().unwrap_or(1),
        }
    }

    /// Test if the type occupies a fixed number of bytes on the wire.
    pub fn is_fixed(self) -> bool {
        self.size().is_some()
    }

    /// Test if the type is one of the length-prefixed string forms.
    pub fn is_string_like(self) -> bool {
        matches!(self, Type::STRING | Type::OBJECT_PATH | Type::SIGNATURE)
    }

    /// Test if the type is basic, i.e. permitted as a dictionary key.
    pub fn is_basic(self) -> bool {
        self.is_fixed() || self.is_string_like()
    }

    pub(crate) fn char(self) -> char {
        self.0 as char
    }
}

#[cfg(test)]
mod tests {
    use super::Type;

    #[test]
    fn sizes_and_alignments() {
        assert_eq!(Type::BYTE.size(), Some(1));
        assert_eq!(Type::BOOLEAN.size(), Some(4));
        assert_eq!(Type::INT16.size(), Some(2));
        assert_eq!(Type::UINT64.size(), Some(8));
        assert_eq!(Type::UNIX_FD.size(), Some(4));
        assert_eq!(Type::STRING.size(), None);

        assert_eq!(Type::STRING.alignment(), 4);
        assert_eq!(Type::OBJECT_PATH.alignment(), 4);
        assert_eq!(Type::SIGNATURE.alignment(), 1);
        assert_eq!(Type::VARIANT.alignment(), 1);
        assert_eq!(Type::ARRAY.alignment(), 4);
        assert_eq!(Type::OPEN_PAREN.alignment(), 8);
        assert_eq!(Type::OPEN_BRACE.alignment(), 8);
        assert_eq!(Type::DOUBLE.alignment(), 8);
    }

    #[test]
    fn predicates() {
        assert!(Type::BYTE.is_fixed());
        assert!(!Type::STRING.is_fixed());
        assert!(Type::STRING.is_string_like());
        assert!(Type::SIGNATURE.is_string_like());
        assert!(!Type::VARIANT.is_string_like());
        assert!(Type::OBJECT_PATH.is_basic());
        assert!(!Type::ARRAY.is_basic());
        assert!(!Type::VARIANT.is_basic());
    }
}
