use crate::buf::{OwnedBuf, ReadBuf};
use crate::error::Result;
use crate::frame::Frame;
use crate::marshal;
use crate::protocol::Endianness;
use crate::value::Value;
use crate::write::Write;
use crate::{OwnedSignature, Signature};

/// A buffer used to construct a message body along with its signature.
///
/// Values can be appended through the typed [`store`] and [`write`] calls
/// when the shape is known at compile time, or through [`write_value`] with
/// a run-time signature. Both produce the same bytes.
///
/// [`store`]: Self::store
/// [`write`]: Self::write
/// [`write_value`]: Self::write_value
///
/// # Examples
///
/// ```
/// use wirebus::{BodyBuf, Signature};
///
/// let mut body = BodyBuf::new();
///
/// body.store(10u16)?;
/// body.store(10u32)?;
///
/// assert_eq!(body.signature(), Signature::new("qu")?);
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
pub struct BodyBuf {
    signature: OwnedSignature,
    buf: OwnedBuf,
}

impl BodyBuf {
    /// Construct a new empty body buffer in the native endianness.
    pub fn new() -> Self {
        Self::with_endianness(Endianness::NATIVE)
    }

    /// Construct a new empty body buffer with the specified endianness.
    pub fn with_endianness(endianness: Endianness) -> Self {
        Self {
            signature: OwnedSignature::empty(),
            buf: OwnedBuf::with_endianness(endianness),
        }
    }

    /// Get the signature of the values written so far.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Get the endianness of the buffer.
    pub fn endianness(&self) -> Endianness {
        self.buf.endianness()
    }

    /// Get the bytes written so far.
    pub fn get(&self) -> &[u8] {
        self.buf.get()
    }

    /// Clear the buffer and its signature.
    pub fn clear(&mut self) {
        self.signature.clear();
        self.buf.clear();
    }

    /// Get a read cursor over the written bytes.
    pub fn read(&self) -> ReadBuf<'_> {
        self.buf.read()
    }

    /// Store a fixed-size value and extend the signature accordingly.
    pub fn store<T>(&mut self, frame: T) -> Result<()>
    where
        T: Frame,
    {
        self.signature.extend_from_signature(T::SIGNATURE)?;
        self.buf.store(frame);
        Ok(())
    }

    /// Write a length-prefixed value and extend the signature accordingly.
    pub fn write<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Write,
    {
        self.signature.extend_from_signature(T::SIGNATURE)?;
        value.write_to(&mut self.buf);
        Ok(())
    }

    /// Write one dynamically typed value under the given signature.
    ///
    /// # Examples
    ///
    /// ```
    /// use wirebus::{BodyBuf, Endianness, Signature, Value};
    ///
    /// let mut body = BodyBuf::with_endianness(Endianness::LITTLE);
    /// body.write_value(Signature::new("ai")?, &Value::Array(vec![Value::Int32(-1)]))?;
    ///
    /// assert_eq!(body.signature(), "ai");
    /// assert_eq!(body.get(), &[4, 0, 0, 0, 255, 255, 255, 255]);
    /// # Ok::<_, Box<dyn std::error::Error>>(())
    /// ```
    pub fn write_value(&mut self, signature: &Signature, value: &Value) -> Result<()> {
        self.signature.extend_from_signature(signature)?;
        marshal::write_one(&mut self.buf, signature, value)
    }

    /// Write a sequence of dynamically typed values under the given
    /// signature.
    ///
    /// The number of values must match the number of types in the
    /// signature, otherwise an error naming both counts is raised.
    pub fn write_values(&mut self, signature: &Signature, values: &[Value]) -> Result<()> {
        self.signature.extend_from_signature(signature)?;
        marshal::write_many(&mut self.buf, signature, values)
    }
}

impl Default for BodyBuf {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
