use core::fmt;
use generic_array::{ArrayLength, GenericArray};
use log::info;
use pretty_hex::*;

use crate::config::TransferCapacity;

/// Buffer handed to (and returned by) the asynchronous transfer engine.
pub type TransferBuffer = ByteBuffer<TransferCapacity>;

/// Returned when a byte doesn't fit in a [`ByteBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferFull;

/// Fixed capacity byte buffer. The capacity is chosen at build time through a
/// `typenum` type, so no allocator is needed.
#[derive(Clone)]
pub struct ByteBuffer<N: ArrayLength<u8>> {
    len: usize,
    buf: GenericArray<u8, N>,
}

impl<N: ArrayLength<u8>> Default for ByteBuffer<N> {
    fn default() -> Self {
        ByteBuffer {
            len: 0,
            buf: Default::default(),
        }
    }
}

impl<N: ArrayLength<u8>> ByteBuffer<N> {
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates a buffer holding a copy of `bytes`. Anything past the capacity
    /// is left out.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut buffer = Self::new();
        let len = bytes.len().min(buffer.capacity());
        buffer.buf[..len].copy_from_slice(&bytes[..len]);
        buffer.len = len;
        buffer
    }

    /// Returns the capacity of the buffer.
    pub fn capacity(&self) -> usize {
        N::to_usize()
    }

    /// Returns the number of bytes which have currently been stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Returns a slice containing the valid data.
    pub fn data(&self) -> &[u8] {
        &self.buf[0..self.len]
    }

    /// Returns the byte at `idx`, or `None` if it's past the valid data.
    pub fn get(&self, idx: usize) -> Option<u8> {
        self.data().get(idx).copied()
    }

    /// Resets the buffer to start collecting a new set of bytes.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Appends a byte to the end of the buffer.
    pub fn append(&mut self, byte: u8) -> Result<(), BufferFull> {
        if self.len < self.capacity() {
            self.buf[self.len] = byte;
            self.len += 1;
            Ok(())
        } else {
            Err(BufferFull)
        }
    }

    /// Number of bytes preceding the first `terminator`, or the whole length
    /// if there isn't one.
    pub fn payload_len(&self, terminator: u8) -> usize {
        payload_len(self.data(), terminator)
    }

    /// Dumps the contents in a nice hexadecimal format.
    pub fn dump(&self) {
        info!("{:?}", self.data().hex_dump());
    }
}

impl<N: ArrayLength<u8>> fmt::Debug for ByteBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.data().hex_dump())
    }
}

impl<N: ArrayLength<u8>> PartialEq for ByteBuffer<N> {
    fn eq(&self, other: &Self) -> bool {
        self.data() == other.data()
    }
}

impl<N: ArrayLength<u8>> AsRef<[u8]> for ByteBuffer<N> {
    fn as_ref(&self) -> &[u8] {
        self.data()
    }
}

/// Number of bytes of `bytes` preceding the first `terminator`.
pub fn payload_len(bytes: &[u8], terminator: u8) -> usize {
    bytes
        .iter()
        .position(|&byte| byte == terminator)
        .unwrap_or_else(|| bytes.len())
}
