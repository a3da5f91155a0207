use std::marker::PhantomData;
use std::mem::size_of;

use crate::frame::Frame;
use crate::protocol::Endianness;

use super::{padding_to, ReadBuf};

/// A reserved, aligned slot in an [`OwnedBuf`] which must be filled in
/// exactly once.
///
/// The token is not copyable and [`OwnedBuf::store_at`] consumes it, so a
/// slot cannot be written twice.
#[must_use = "reserved slots must be filled in with OwnedBuf::store_at"]
pub struct Alloc<T> {
    at: usize,
    _marker: PhantomData<T>,
}

/// An append-only buffer holding one message being encoded.
///
/// Positions are measured from the start of the buffer, which coincides with
/// the start of the message, so alignment padding can be computed from the
/// buffer length alone.
///
/// # Examples
///
/// ```
/// use wirebus::{Endianness, OwnedBuf};
///
/// let mut buf = OwnedBuf::with_endianness(Endianness::LITTLE);
/// buf.store(1u8);
/// buf.store(2u32);
///
/// assert_eq!(buf.get(), &[1, 0, 0, 0, 2, 0, 0, 0]);
/// ```
pub struct OwnedBuf {
    data: Vec<u8>,
    endianness: Endianness,
}

impl OwnedBuf {
    /// Construct a new empty buffer in the native endianness.
    pub fn new() -> Self {
        Self::with_endianness(Endianness::NATIVE)
    }

    /// Construct a new empty buffer with the specified endianness.
    pub fn with_endianness(endianness: Endianness) -> Self {
        Self {
            data: Vec::new(),
            endianness,
        }
    }

    /// Get the endianness of the buffer.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Set the endianness of the buffer.
    ///
    /// This does not affect data which has already been written.
    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    /// The number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Test if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the bytes written so far.
    pub fn get(&self) -> &[u8] {
        &self.data
    }

    /// Take the written bytes out of the buffer, leaving it empty.
    pub(crate) fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    pub(crate) fn clear(&mut self) {
        self.data.clear();
    }

    /// Get a read cursor over the written bytes.
    pub fn read(&self) -> ReadBuf<'_> {
        ReadBuf::new(&self.data, self.endianness)
    }

    /// Store a fixed-size value, aligning the buffer to its size first.
    pub fn store<T>(&mut self, frame: T)
    where
        T: Frame,
    {
        self.align_for(size_of::<T>());
        frame.store_frame(&mut self.data, self.endianness);
    }

    /// Reserve an aligned, zeroed slot for a value of type `T` to be filled
    /// in later with [`store_at`].
    ///
    /// [`store_at`]: Self::store_at
    pub fn alloc<T>(&mut self) -> Alloc<T>
    where
        T: Frame,
    {
        self.align_for(size_of::<T>());
        let at = self.data.len();
        self.data.resize(at + size_of::<T>(), 0);

        Alloc {
            at,
            _marker: PhantomData,
        }
    }

    /// Fill in a previously reserved slot.
    pub fn store_at<T>(&mut self, at: Alloc<T>, frame: T)
    where
        T: Frame,
    {
        let mut bytes = Vec::with_capacity(size_of::<T>());
        frame.store_frame(&mut bytes, self.endianness);
        self.data[at.at..at.at + bytes.len()].copy_from_slice(&bytes);
    }

    /// Extend the buffer with a slice.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Extend the buffer with a slice followed by a NUL byte.
    pub fn extend_from_slice_nul(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
        self.data.push(0);
    }

    /// Pad the buffer with zero bytes up to the given alignment.
    pub(crate) fn align_for(&mut self, align: usize) {
        let padding = padding_to(self.data.len(), align);
        self.data.resize(self.data.len() + padding, 0);
    }
}

impl Default for OwnedBuf {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
