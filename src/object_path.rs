use std::error;
use std::fmt;
use std::ops::Deref;

use crate::buf::{OwnedBuf, ReadBuf};
use crate::error::Result;
use crate::{Read, Signature, Write};

/// An error raised when validating an object path.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ObjectPathError;

impl fmt::Display for ObjectPathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid object path")
    }
}

impl error::Error for ObjectPathError {}

/// A validated D-Bus object path.
///
/// Paths begin with `/` and consist of components made up of
/// `[A-Za-z0-9_]`, separated by single slashes. The root path `/` is the
/// only path with a trailing slash.
///
/// # Examples
///
/// ```
/// use wirebus::ObjectPath;
///
/// const PATH: &ObjectPath = ObjectPath::new_const("/org/freedesktop/DBus");
///
/// assert!(ObjectPath::new("/").is_ok());
/// assert!(ObjectPath::new("/org//freedesktop").is_err());
/// assert!(ObjectPath::new("org").is_err());
/// ```
#[derive(PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ObjectPath(str);

impl ObjectPath {
    /// Construct a new validated object path in a constant context.
    ///
    /// # Panics
    ///
    /// Panics if the path is not valid.
    #[track_caller]
    pub const fn new_const(path: &str) -> &ObjectPath {
        if !validate(path.as_bytes()) {
            panic!("Invalid D-Bus object path");
        }

        // SAFETY: The path was just validated.
        unsafe { Self::new_unchecked(path) }
    }

    /// Construct a new validated object path.
    pub fn new(path: &str) -> Result<&ObjectPath, ObjectPathError> {
        if !validate(path.as_bytes()) {
            return Err(ObjectPathError);
        }

        // SAFETY: The path was just validated.
        Ok(unsafe { Self::new_unchecked(path) })
    }

    /// Construct an object path without validation.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the string is a valid object path.
    const unsafe fn new_unchecked(path: &str) -> &Self {
        &*(path as *const str as *const ObjectPath)
    }

    /// Get the object path as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

const fn validate(bytes: &[u8]) -> bool {
    if bytes.is_empty() || bytes[0] != b'/' {
        return false;
    }

    // The root path is the only path which ends in a slash.
    if bytes.len() == 1 {
        return true;
    }

    // Scan the components between slashes; each must be non-empty and made
    // up of the permitted character class.
    let mut component = 1;
    let mut at = 1;

    while at <= bytes.len() {
        if at == bytes.len() || bytes[at] == b'/' {
            if at == component {
                return false;
            }

            component = at + 1;
        } else if !bytes[at].is_ascii_alphanumeric() && bytes[at] != b'_' {
            return false;
        }

        at += 1;
    }

    true
}

impl Deref for ObjectPath {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for ObjectPath {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectPath").field(&self.as_str()).finish()
    }
}

impl fmt::Display for ObjectPath {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&ObjectPath> for Box<ObjectPath> {
    fn from(path: &ObjectPath) -> Self {
        let boxed = Box::<str>::from(&path.0);
        // SAFETY: ObjectPath is repr(transparent) over str.
        unsafe { Box::from_raw(Box::into_raw(boxed) as *mut ObjectPath) }
    }
}

impl Clone for Box<ObjectPath> {
    #[inline]
    fn clone(&self) -> Self {
        Box::<ObjectPath>::from(&**self)
    }
}

impl AsRef<ObjectPath> for ObjectPath {
    #[inline]
    fn as_ref(&self) -> &ObjectPath {
        self
    }
}

impl Write for ObjectPath {
    const SIGNATURE: &'static Signature = Signature::OBJECT_PATH;

    #[inline]
    fn write_to(&self, buf: &mut OwnedBuf) {
        self.0.write_to(buf);
    }
}

impl Read for ObjectPath {
    #[inline]
    fn read_from<'de>(buf: &mut ReadBuf<'de>) -> Result<&'de Self> {
        let string = buf.read::<str>()?;
        Ok(ObjectPath::new(string)?)
    }
}

#[cfg(test)]
mod tests {
    use super::ObjectPath;

    #[test]
    fn validation() {
        assert!(ObjectPath::new("/").is_ok());
        assert!(ObjectPath::new("/org/freedesktop/DBus").is_ok());
        assert!(ObjectPath::new("/a_b/c0").is_ok());
        assert!(ObjectPath::new("").is_err());
        assert!(ObjectPath::new("/trailing/").is_err());
        assert!(ObjectPath::new("//double").is_err());
        assert!(ObjectPath::new("relative/path").is_err());
        assert!(ObjectPath::new("/with-dash").is_err());
    }
}
