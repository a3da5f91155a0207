//! Constants and types associated with the `org.freedesktop.DBus`
//! interface.

use crate::ObjectPath;

/// Well known destination name of the message bus.
pub const DESTINATION: &str = "org.freedesktop.DBus";

/// Well known interface name of the message bus.
pub const INTERFACE: &str = "org.freedesktop.DBus";

/// Well known object path of the message bus.
pub const PATH: &ObjectPath = ObjectPath::new_const("/org/freedesktop/DBus");

raw_set! {
    /// The flags to a `RequestName` call.
    #[repr(u32)]
    pub enum NameFlag {
        /// No flags.
        NONE = 0,
        /// Allow another application which requests the name with
        /// `REPLACE_EXISTING` to take it over.
        ALLOW_REPLACEMENT = 1,
        /// Try to replace the current owner if there is one.
        REPLACE_EXISTING = 2,
        /// Do not queue up for ownership if the name is taken; fail the
        /// request instead.
        DO_NOT_QUEUE = 4,
    }
}

impl std::ops::BitOr<NameFlag> for NameFlag {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: NameFlag) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

raw_enum! {
    /// The reply to a `RequestName` call.
    #[repr(u32)]
    pub enum NameReply {
        /// The caller is now the primary owner of the name.
        PRIMARY_OWNER = 1,
        /// The name already has an owner and the caller has been placed in
        /// the queue for it.
        IN_QUEUE = 2,
        /// The name already has an owner and the request could neither
        /// replace it nor queue behind it.
        EXISTS = 3,
        /// The caller already owns the name.
        ALREADY_OWNER = 4,
    }
}

macro_rules! impl_u32_frame {
    ($($ty:ty),*) => {
        $(
            impl crate::frame::sealed::Sealed for $ty {}

            impl crate::Frame for $ty {
                const SIGNATURE: &'static crate::Signature = crate::Signature::UINT32;

                #[inline]
                fn store_frame(self, out: &mut Vec<u8>, endianness: crate::Endianness) {
                    <u32 as crate::Frame>::store_frame(self.0, out, endianness);
                }

                #[inline]
                fn load_frame(bytes: &[u8], endianness: crate::Endianness) -> Self {
                    Self(<u32 as crate::Frame>::load_frame(bytes, endianness))
                }
            }
        )*
    }
}

impl_u32_frame!(NameFlag, NameReply);
