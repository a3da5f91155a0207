use std::fmt;

/// Formats a byte slice as a string, replacing non-printable and invalid
/// bytes with escapes. Used to render peer-controlled bytes in diagnostics.
pub(crate) struct LossyStr<'a>(&'a [u8]);

impl<'a> LossyStr<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for LossyStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"")?;

        for c in String::from_utf8_lossy(self.0).chars() {
            if c.is_control() {
                write!(f, "{}", c.escape_debug())?;
            } else {
                write!(f, "{c}")?;
            }
        }

        write!(f, "\"")
    }
}
