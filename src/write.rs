use crate::buf::OwnedBuf;
use crate::Signature;

pub(crate) mod sealed {
    use crate::{ObjectPath, Signature};

    pub trait Sealed {}

    impl Sealed for [u8] {}
    impl Sealed for str {}
    impl Sealed for Signature {}
    impl Sealed for ObjectPath {}
}

/// A length-prefixed element which can be serialized to a buffer.
pub trait Write: self::sealed::Sealed {
    /// The signature of the type.
    const SIGNATURE: &'static Signature;

    /// Write `self` into `buf`.
    fn write_to(&self, buf: &mut OwnedBuf);
}

/// Write a byte array to the buffer.
///
/// # Examples
///
/// ```
/// use wirebus::{BodyBuf, Signature};
///
/// let mut buf = BodyBuf::new();
/// buf.write(&b"foo"[..])?;
///
/// assert_eq!(buf.signature(), Signature::new("ay")?);
/// assert_eq!(buf.get(), &[3, 0, 0, 0, 102, 111, 111]);
/// # Ok::<_, wirebus::Error>(())
/// ```
impl Write for [u8] {
    const SIGNATURE: &'static Signature = unsafe { Signature::new_unchecked("ay") };

    #[inline]
    fn write_to(&self, buf: &mut OwnedBuf) {
        buf.store(self.len() as u32);
        buf.extend_from_slice(self);
    }
}

/// Write a length-prefixed string to the buffer.
///
/// # Examples
///
/// ```
/// use wirebus::{BodyBuf, Signature};
///
/// let mut buf = BodyBuf::new();
/// buf.write("foo")?;
///
/// assert_eq!(buf.signature(), Signature::STRING);
/// assert_eq!(buf.get(), &[3, 0, 0, 0, 102, 111, 111, 0]);
/// # Ok::<_, wirebus::Error>(())
/// ```
impl Write for str {
    const SIGNATURE: &'static Signature = Signature::STRING;

    #[inline]
    fn write_to(&self, buf: &mut OwnedBuf) {
        buf.store(self.len() as u32);
        buf.extend_from_slice_nul(self.as_bytes());
    }
}
