use crate::frame::Frame;
use crate::write::Write;

use super::OwnedBuf;

/// Writes a struct into an [`OwnedBuf`].
///
/// Constructing the writer pads the buffer to the 8-byte boundary that
/// structs and dict entries start on.
pub(crate) struct StructWriter<'a> {
    buf: &'a mut OwnedBuf,
}

impl<'a> StructWriter<'a> {
    pub(crate) fn new(buf: &'a mut OwnedBuf) -> Self {
        buf.align_for(8);
        Self { buf }
    }

    /// Store a fixed-size field.
    pub(crate) fn store<T>(&mut self, frame: T)
    where
        T: Frame,
    {
        self.buf.store(frame);
    }

    /// Write a length-prefixed field.
    pub(crate) fn write<T>(&mut self, value: &T)
    where
        T: ?Sized + Write,
    {
        value.write_to(self.buf);
    }
}
