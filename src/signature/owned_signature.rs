use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use crate::Signature;

use super::SignatureError;

/// An owned D-Bus signature.
///
/// # Examples
///
/// ```
/// use wirebus::{OwnedSignature, Signature};
///
/// let signature = OwnedSignature::new("a{sv}")?;
/// assert_eq!(&*signature, Signature::new("a{sv}")?);
/// # Ok::<_, wirebus::SignatureError>(())
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct OwnedSignature(String);

impl OwnedSignature {
    /// Construct a new empty signature.
    pub const fn empty() -> Self {
        Self(String::new())
    }

    /// Construct a new signature, validating it by parsing.
    pub fn new(signature: &str) -> Result<Self, SignatureError> {
        Ok(Signature::new(signature)?.to_owned())
    }

    /// Construct an owned signature without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the string is a valid signature.
    pub(crate) unsafe fn from_string_unchecked(signature: String) -> Self {
        Self(signature)
    }

    /// Append a complete signature to this one.
    ///
    /// Errors if the result would be longer than the maximum signature
    /// length.
    pub(crate) fn extend_from_signature(
        &mut self,
        signature: &Signature,
    ) -> Result<(), SignatureError> {
        Signature::ensure_fits(self.0.len() + signature.len())?;
        self.0.push_str(signature.as_str());
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

impl Deref for OwnedSignature {
    type Target = Signature;

    #[inline]
    fn deref(&self) -> &Self::Target {
        // SAFETY: The inner string is always a valid signature.
        unsafe { Signature::new_unchecked(self.0.as_str()) }
    }
}

impl Borrow<Signature> for OwnedSignature {
    #[inline]
    fn borrow(&self) -> &Signature {
        self
    }
}

impl AsRef<Signature> for OwnedSignature {
    #[inline]
    fn as_ref(&self) -> &Signature {
        self
    }
}

impl From<&Signature> for OwnedSignature {
    #[inline]
    fn from(signature: &Signature) -> Self {
        signature.to_owned()
    }
}

impl fmt::Debug for OwnedSignature {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OwnedSignature").field(&self.0).finish()
    }
}

impl PartialEq<Signature> for OwnedSignature {
    #[inline]
    fn eq(&self, other: &Signature) -> bool {
        self.as_str() == other.as_str()
    }
}

impl PartialEq<&Signature> for OwnedSignature {
    #[inline]
    fn eq(&self, other: &&Signature) -> bool {
        self.as_str() == other.as_str()
    }
}

impl PartialEq<str> for OwnedSignature {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}
