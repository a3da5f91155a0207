use std::num::NonZeroU32;

use crate::buf::{ArrayWriter, OwnedBuf, MAX_BODY_LENGTH};
use crate::error::{ErrorKind, Result};
use crate::message::{Message, MessageKind};
use crate::protocol::Field;
use crate::Signature;

/// Buffer used for encoding outgoing messages, which also owns the serial
/// counter of a connection.
///
/// # Examples
///
/// ```
/// use wirebus::SendBuf;
///
/// let mut send = SendBuf::new();
/// assert_eq!(send.next_serial().get(), 1);
/// assert_eq!(send.next_serial().get(), 2);
/// ```
pub struct SendBuf {
    buf: OwnedBuf,
    serial: u32,
}

impl SendBuf {
    /// Construct a new send buffer.
    pub fn new() -> Self {
        Self {
            buf: OwnedBuf::new(),
            serial: 0,
        }
    }

    /// Get the next serial for this send buffer.
    ///
    /// Serials are never zero. The counter wraps around at `u32::MAX`,
    /// skipping zero; collisions with serials of calls which are still
    /// outstanding at that point are not detected.
    pub fn next_serial(&mut self) -> NonZeroU32 {
        loop {
            let Some(serial) = NonZeroU32::new(self.serial.wrapping_add(1)) else {
                self.serial = 1;
                continue;
            };

            self.serial = serial.get();
            break serial;
        }
    }

    /// Take the encoded bytes out of the buffer.
    pub fn take(&mut self) -> Vec<u8> {
        self.buf.take()
    }

    /// Get the encoded bytes.
    pub fn get(&self) -> &[u8] {
        self.buf.get()
    }

    /// Encode one message into the buffer.
    ///
    /// The frame is encoded in the endianness of the message body, since
    /// the body bytes are copied in verbatim.
    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        debug_assert!(self.buf.is_empty(), "messages are encoded one at a time");
        self.buf.set_endianness(message.endianness());

        if !message.body.is_empty() && message.signature.is_empty() {
            return Err(ErrorKind::MissingSignature.into());
        }

        if matches!(message.kind, MessageKind::Signal { .. }) && message.interface.is_none() {
            return Err(ErrorKind::MissingInterface.into());
        }

        let Ok(body_length) = u32::try_from(message.body.len()) else {
            return Err(ErrorKind::BodyTooLong(u32::MAX).into());
        };

        if body_length > MAX_BODY_LENGTH {
            return Err(ErrorKind::BodyTooLong(body_length).into());
        }

        self.buf.store(message.endianness);
        self.buf.store(message.message_type());
        self.buf.store(message.flags);
        self.buf.store(1u8);
        self.buf.store(body_length);
        self.buf.store(message.serial.get());

        let mut array = ArrayWriter::new(&mut self.buf, 8);

        if let MessageKind::MethodCall { path, .. } | MessageKind::Signal { path, .. } =
            &message.kind
        {
            let mut st = array.write_struct();
            st.store(Field::PATH);
            st.write(Signature::OBJECT_PATH);
            st.write(&**path);
        }

        if let Some(destination) = &message.destination {
            let mut st = array.write_struct();
            st.store(Field::DESTINATION);
            st.write(Signature::STRING);
            st.write(&**destination);
        }

        if let Some(interface) = &message.interface {
            let mut st = array.write_struct();
            st.store(Field::INTERFACE);
            st.write(Signature::STRING);
            st.write(&**interface);
        }

        match &message.kind {
            MessageKind::MethodCall { member, .. } | MessageKind::Signal { member, .. } => {
                let mut st = array.write_struct();
                st.store(Field::MEMBER);
                st.write(Signature::STRING);
                st.write(&**member);
            }
            MessageKind::MethodReturn { reply_serial } => {
                let mut st = array.write_struct();
                st.store(Field::REPLY_SERIAL);
                st.write(Signature::UINT32);
                st.store(reply_serial.get());
            }
            MessageKind::Error {
                error_name,
                reply_serial,
            } => {
                let mut st = array.write_struct();
                st.store(Field::ERROR_NAME);
                st.write(Signature::STRING);
                st.write(&**error_name);

                let mut st = array.write_struct();
                st.store(Field::REPLY_SERIAL);
                st.write(Signature::UINT32);
                st.store(reply_serial.get());
            }
            MessageKind::Unknown { .. } => {}
        }

        if let Some(sender) = &message.sender {
            let mut st = array.write_struct();
            st.store(Field::SENDER);
            st.write(Signature::STRING);
            st.write(&**sender);
        }

        if !message.signature.is_empty() {
            let mut st = array.write_struct();
            st.store(Field::SIGNATURE);
            st.write(Signature::SIGNATURE);
            st.write(&*message.signature);
        }

        if let Some(unix_fds) = message.unix_fds {
            let mut st = array.write_struct();
            st.store(Field::UNIX_FDS);
            st.write(Signature::UINT32);
            st.store(unix_fds);
        }

        array.finish();

        // The body starts on the 8-byte boundary that ends the header.
        self.buf.align_for(8);
        self.buf.extend_from_slice(&message.body);
        Ok(())
    }
}

impl Default for SendBuf {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
