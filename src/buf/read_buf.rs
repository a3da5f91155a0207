use std::mem::size_of;

use crate::error::{ErrorKind, Result};
use crate::frame::Frame;
use crate::protocol::Endianness;
use crate::read::Read;

use super::padding_to;

/// A cursor over received wire data.
///
/// The cursor tracks its absolute position from the start of the message it
/// was constructed over, so padding can be skipped even inside of windows
/// produced by [`read_until`].
///
/// [`read_until`]: Self::read_until
///
/// # Examples
///
/// ```
/// use wirebus::{Endianness, ReadBuf};
///
/// let mut buf = ReadBuf::new(b"\x07\x00\x00\x00foo bar\x00", Endianness::LITTLE);
/// assert_eq!(buf.load::<u32>()?, 7);
/// assert_eq!(buf.load::<u8>()?, b'f');
/// # Ok::<_, wirebus::Error>(())
/// ```
#[derive(Clone)]
pub struct ReadBuf<'a> {
    data: &'a [u8],
    at: usize,
    end: usize,
    endianness: Endianness,
}

impl<'a> ReadBuf<'a> {
    /// Construct a new cursor over the given bytes, which are taken to start
    /// at the beginning of a message.
    pub fn new(data: &'a [u8], endianness: Endianness) -> Self {
        Self {
            data,
            at: 0,
            end: data.len(),
            endianness,
        }
    }

    /// Construct an empty cursor.
    pub fn empty() -> ReadBuf<'static> {
        ReadBuf {
            data: &[],
            at: 0,
            end: 0,
            endianness: Endianness::NATIVE,
        }
    }

    /// Get the endianness of the cursor.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// The number of bytes remaining.
    pub fn len(&self) -> usize {
        self.end - self.at
    }

    /// Test if the cursor is at its end.
    pub fn is_empty(&self) -> bool {
        self.at == self.end
    }

    /// The absolute position of the cursor from the start of the message.
    pub(crate) fn pos(&self) -> usize {
        self.at
    }

    /// Get the remaining bytes.
    pub fn get(&self) -> &'a [u8] {
        &self.data[self.at..self.end]
    }

    /// Load a fixed-size value, skipping padding up to its size first.
    pub fn load<T>(&mut self) -> Result<T>
    where
        T: Frame,
    {
        self.align(size_of::<T>())?;
        let bytes = self.load_slice(size_of::<T>())?;
        Ok(T::load_frame(bytes, self.endianness))
    }

    /// Load a boolean, which is stored as a 32-bit integer on the wire.
    ///
    /// Values other than 0 and 1 are rejected.
    pub fn load_bool(&mut self) -> Result<bool> {
        match self.load::<u32>()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ErrorKind::InvalidBoolean(other).into()),
        }
    }

    /// Read a length-prefixed value.
    pub fn read<T>(&mut self) -> Result<&'a T>
    where
        T: ?Sized + Read,
    {
        T::read_from(self)
    }

    /// Read one dynamically typed value under the given signature.
    ///
    /// # Examples
    ///
    /// ```
    /// use wirebus::{Endianness, ReadBuf, Signature, Value};
    ///
    /// let mut buf = ReadBuf::new(&[4, 0, 0, 0, 255, 255, 255, 255], Endianness::LITTLE);
    /// let value = buf.read_value(Signature::new("ai")?)?;
    ///
    /// assert_eq!(value, Value::Array(vec![Value::Int32(-1)]));
    /// # Ok::<_, Box<dyn std::error::Error>>(())
    /// ```
    pub fn read_value(&mut self, signature: &crate::Signature) -> Result<crate::Value> {
        crate::marshal::read_one(self, signature)
    }

    /// Read a sequence of dynamically typed values under the given
    /// signature.
    pub fn read_values(&mut self, signature: &crate::Signature) -> Result<Vec<crate::Value>> {
        crate::marshal::read_many(self, signature)
    }

    /// Skip padding bytes up to the given alignment.
    pub(crate) fn align(&mut self, align: usize) -> Result<()> {
        let padding = padding_to(self.at, align);

        if self.at + padding > self.end {
            return Err(ErrorKind::BufferUnderflow.into());
        }

        self.at += padding;
        Ok(())
    }

    /// Take the next `n` bytes.
    pub(crate) fn load_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.at + n > self.end {
            return Err(ErrorKind::BufferUnderflow.into());
        }

        let bytes = &self.data[self.at..self.at + n];
        self.at += n;
        Ok(bytes)
    }

    /// Take the next `n` bytes followed by a NUL byte which is checked and
    /// discarded.
    pub(crate) fn load_slice_nul(&mut self, n: usize) -> Result<&'a [u8]> {
        let bytes = self.load_slice(n + 1)?;

        if bytes[n] != 0 {
            return Err(ErrorKind::NotNullTerminated.into());
        }

        Ok(&bytes[..n])
    }

    /// Split off a window over the next `n` bytes.
    ///
    /// The window shares the cursor's absolute position, so alignment inside
    /// of it stays correct.
    pub(crate) fn read_until(&mut self, n: usize) -> Result<ReadBuf<'a>> {
        if self.at + n > self.end {
            return Err(ErrorKind::BufferUnderflow.into());
        }

        let window = ReadBuf {
            data: self.data,
            at: self.at,
            end: self.at + n,
            endianness: self.endianness,
        };

        self.at += n;
        Ok(window)
    }
}
