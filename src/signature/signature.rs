use std::fmt;

use crate::buf::{OwnedBuf, ReadBuf};
use crate::error::Result;
use crate::ty::Ty;
use crate::{OwnedSignature, Read, Write};

use super::{parse_many, SignatureError, SignatureErrorKind, MAX_SIGNATURE};

/// A borrowed, validated D-Bus signature.
///
/// # Examples
///
/// ```
/// use wirebus::Signature;
///
/// assert!(Signature::new("aai").is_ok());
/// assert!(Signature::new("a").is_err());
/// ```
#[derive(PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Signature(str);

impl Signature {
    /// The empty signature.
    pub const EMPTY: &'static Signature = unsafe { Signature::new_unchecked("") };

    /// A single byte.
    pub const BYTE: &'static Signature = unsafe { Signature::new_unchecked("y") };

    /// A boolean.
    pub const BOOLEAN: &'static Signature = unsafe { Signature::new_unchecked("b") };

    /// Signed (two's complement) 16-bit integer.
    pub const INT16: &'static Signature = unsafe { Signature::new_unchecked("n") };

    /// Unsigned 16-bit integer.
    pub const UINT16: &'static Signature = unsafe { Signature::new_unchecked("q") };

    /// Signed (two's complement) 32-bit integer.
    pub const INT32: &'static Signature = unsafe { Signature::new_unchecked("i") };

    /// Unsigned 32-bit integer.
    pub const UINT32: &'static Signature = unsafe { Signature::new_unchecked("u") };

    /// Signed (two's complement) 64-bit integer.
    pub const INT64: &'static Signature = unsafe { Signature::new_unchecked("x") };

    /// Unsigned 64-bit integer.
    pub const UINT64: &'static Signature = unsafe { Signature::new_unchecked("t") };

    /// IEEE 754 double-precision floating point.
    pub const DOUBLE: &'static Signature = unsafe { Signature::new_unchecked("d") };

    /// A UTF-8 string.
    pub const STRING: &'static Signature = unsafe { Signature::new_unchecked("s") };

    /// An object path.
    pub const OBJECT_PATH: &'static Signature = unsafe { Signature::new_unchecked("o") };

    /// A signature.
    pub const SIGNATURE: &'static Signature = unsafe { Signature::new_unchecked("g") };

    /// A variant.
    pub const VARIANT: &'static Signature = unsafe { Signature::new_unchecked("v") };

    /// An index into an out-of-band array of file descriptors.
    pub const UNIX_FD: &'static Signature = unsafe { Signature::new_unchecked("h") };

    /// Construct a new signature, validating it by parsing.
    pub fn new(signature: &str) -> Result<&Signature, SignatureError> {
        parse_many(signature)?;
        // SAFETY: The string was just validated.
        Ok(unsafe { Self::new_unchecked(signature) })
    }

    /// Construct a signature without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the string is a valid signature.
    pub(crate) const unsafe fn new_unchecked(signature: &str) -> &Self {
        &*(signature as *const str as *const Signature)
    }

    /// Test if the signature is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The length of the signature in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get the signature as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the signature into the sequence of types it describes.
    ///
    /// # Examples
    ///
    /// ```
    /// use wirebus::Signature;
    ///
    /// let signature = Signature::new("a{sv}u")?;
    /// assert_eq!(signature.types()?.len(), 2);
    /// # Ok::<_, Box<dyn std::error::Error>>(())
    /// ```
    pub fn types(&self) -> Result<Vec<Ty>, SignatureError> {
        parse_many(&self.0)
    }

    pub(crate) fn ensure_fits(len: usize) -> Result<(), SignatureError> {
        if len > MAX_SIGNATURE {
            return Err(SignatureError::new(SignatureErrorKind::TooLong(len)));
        }

        Ok(())
    }
}

impl fmt::Debug for Signature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signature").field(&self.as_str()).finish()
    }
}

impl Write for Signature {
    const SIGNATURE: &'static Signature = Signature::SIGNATURE;

    #[inline]
    fn write_to(&self, buf: &mut OwnedBuf) {
        buf.store(self.0.len() as u8);
        buf.extend_from_slice_nul(self.0.as_bytes());
    }
}

impl Read for Signature {
    #[inline]
    fn read_from<'de>(buf: &mut ReadBuf<'de>) -> Result<&'de Self> {
        let len = buf.load::<u8>()? as usize;
        let bytes = buf.load_slice_nul(len)?;
        Ok(Signature::new(std::str::from_utf8(bytes)?)?)
    }
}

impl AsRef<Signature> for Signature {
    #[inline]
    fn as_ref(&self) -> &Signature {
        self
    }
}

impl ToOwned for Signature {
    type Owned = OwnedSignature;

    #[inline]
    fn to_owned(&self) -> Self::Owned {
        // SAFETY: Self is already a valid signature.
        unsafe { OwnedSignature::from_string_unchecked(self.0.to_owned()) }
    }
}

impl PartialEq<OwnedSignature> for Signature {
    #[inline]
    fn eq(&self, other: &OwnedSignature) -> bool {
        self.as_str() == other.as_str()
    }
}

impl PartialEq<OwnedSignature> for &Signature {
    #[inline]
    fn eq(&self, other: &OwnedSignature) -> bool {
        self.as_str() == other.as_str()
    }
}

impl PartialEq<str> for Signature {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        &self.0 == other
    }
}

impl PartialEq<&str> for Signature {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        &self.0 == *other
    }
}

impl PartialEq<str> for &Signature {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        &self.0 == other
    }
}
