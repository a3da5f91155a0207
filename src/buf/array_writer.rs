use crate::frame::Frame;

use super::{Alloc, OwnedBuf, StructWriter};

/// Writes an array into an [`OwnedBuf`].
///
/// The 32-bit length prefix is reserved up front and filled in by
/// [`finish`] with the measured size of the element bodies. Padding emitted
/// between the prefix and the first element is not counted.
///
/// [`finish`]: Self::finish
#[must_use = "arrays must be finalized using ArrayWriter::finish"]
pub(crate) struct ArrayWriter<'a> {
    buf: &'a mut OwnedBuf,
    len: Alloc<u32>,
    start: usize,
}

impl<'a> ArrayWriter<'a> {
    /// Reserve the length prefix and align the buffer for elements of the
    /// given alignment.
    pub(crate) fn new(buf: &'a mut OwnedBuf, align: usize) -> Self {
        let len = buf.alloc::<u32>();
        buf.align_for(align);
        let start = buf.len();
        Self { buf, len, start }
    }

    /// Access the underlying buffer to write an element.
    pub(crate) fn buf(&mut self) -> &mut OwnedBuf {
        self.buf
    }

    /// Store a fixed-size element.
    pub(crate) fn store<T>(&mut self, frame: T)
    where
        T: Frame,
    {
        self.buf.store(frame);
    }

    /// Write a struct element.
    pub(crate) fn write_struct(&mut self) -> StructWriter<'_> {
        StructWriter::new(self.buf)
    }

    /// Finish the array, backfilling the length prefix.
    pub(crate) fn finish(self) {
        let Self { buf, len, start } = self;
        let bytes = (buf.len() - start) as u32;
        buf.store_at(len, bytes);
    }
}
