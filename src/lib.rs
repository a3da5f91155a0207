//! An asynchronous D-Bus client library.
//!
//! The crate is built around a signature-driven marshalling engine for the
//! D-Bus wire format (major version 1), a recursive-descent signature
//! parser, and a connection which multiplexes method calls and replies
//! over a single stream after a SASL `EXTERNAL` handshake.
//!
//! Bodies can be built and decoded two ways: a typed path through
//! [`Frame`], [`Write`] and [`Read`] when the shape is known at compile
//! time, and a dynamic path through [`Value`] driven by signatures which
//! are only known at run time. Both are implemented by the same kernel and
//! produce identical bytes.
//!
//! # Examples
//!
//! ```no_run
//! use std::num::NonZeroU32;
//!
//! use wirebus::{Connection, Message, ObjectPath};
//!
//! const PATH: &ObjectPath = ObjectPath::new_const("/org/freedesktop/DBus");
//!
//! # #[tokio::main(flavor = "current_thread")] async fn main() -> wirebus::Result<()> {
//! let c = Connection::session_bus().await?;
//! println!("unique name: {}", c.unique_name());
//!
//! let m = Message::method_call(PATH, "ListNames", NonZeroU32::MIN)
//!     .with_destination("org.freedesktop.DBus");
//!
//! let reply = c.call(m).await?;
//! let names = reply.values()?;
//! # Ok(()) }
//! ```

#[macro_use]
mod macros;

#[doc(inline)]
pub use self::error::{Error, Result};
mod error;

#[doc(inline)]
pub use self::protocol::{Endianness, Flags, Type};
pub mod protocol;

#[doc(inline)]
pub use self::frame::Frame;
mod frame;

#[doc(inline)]
pub use self::write::Write;
mod write;

#[doc(inline)]
pub use self::read::Read;
mod read;

pub use self::buf::{Alloc, OwnedBuf, ReadBuf};
pub mod buf;

#[doc(inline)]
pub use self::signature::{OwnedSignature, Signature, SignatureError};
pub mod signature;

#[doc(inline)]
pub use self::ty::Ty;
pub mod ty;

#[doc(inline)]
pub use self::value::{Value, Variant};
mod value;

mod marshal;

#[doc(inline)]
pub use self::body_buf::BodyBuf;
mod body_buf;

#[doc(inline)]
pub use self::object_path::{ObjectPath, ObjectPathError};
mod object_path;

pub use self::message::{Message, MessageKind};
mod message;

#[doc(inline)]
pub use self::send_buf::SendBuf;
mod send_buf;

pub mod sasl;

#[doc(inline)]
pub use self::connection::Connection;
mod connection;

pub mod org_freedesktop_dbus;

mod lossy_str;
