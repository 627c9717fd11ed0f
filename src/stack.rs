//! Bounded LIFO handing received bytes from interrupt context to the
//! foreground loop.

use core::cell::RefCell;
use core::fmt;
use critical_section::Mutex;
use generic_array::{ArrayLength, GenericArray};

use crate::config::StackCapacity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    /// Push on a full stack. Nothing was stored.
    Full,
    /// Pop on an empty stack.
    Empty,
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackError::Full => write!(f, "stack full"),
            StackError::Empty => write!(f, "stack empty"),
        }
    }
}

/// Fixed capacity stack of bytes.
///
/// `sp` is the number of stored bytes: zero when empty, the capacity when
/// full. Push writes at `sp` and then increments it, pop decrements it and
/// then reads.
pub struct BoundedStack<N: ArrayLength<u8> = StackCapacity> {
    items: GenericArray<u8, N>,
    sp: usize,
}

impl<N: ArrayLength<u8>> Default for BoundedStack<N> {
    fn default() -> Self {
        BoundedStack {
            items: Default::default(),
            sp: 0,
        }
    }
}

impl<N: ArrayLength<u8>> BoundedStack<N> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, byte: u8) -> Result<(), StackError> {
        if self.sp == self.capacity() {
            return Err(StackError::Full);
        }
        self.items[self.sp] = byte;
        self.sp += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u8, StackError> {
        if self.sp == 0 {
            return Err(StackError::Empty);
        }
        self.sp -= 1;
        Ok(self.items[self.sp])
    }

    /// Current stack pointer.
    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn capacity(&self) -> usize {
        N::to_usize()
    }

    pub fn is_empty(&self) -> bool {
        self.sp == 0
    }

    pub fn is_full(&self) -> bool {
        self.sp == self.capacity()
    }

    /// Stored bytes, oldest first.
    pub fn contents(&self) -> &[u8] {
        &self.items[..self.sp]
    }
}

impl<N: ArrayLength<u8>> fmt::Debug for BoundedStack<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedStack")
            .field("sp", &self.sp)
            .field("contents", &self.contents())
            .finish()
    }
}

/// [`BoundedStack`] shared between an interrupt handler and the foreground.
///
/// Every push and pop runs inside a critical section, so the read-modify-write
/// of the stack pointer can't be torn by the other side, whatever the word
/// size of the target.
pub struct SharedStack<N: ArrayLength<u8> = StackCapacity> {
    inner: Mutex<RefCell<BoundedStack<N>>>,
}

impl<N: ArrayLength<u8>> Default for SharedStack<N> {
    fn default() -> Self {
        SharedStack {
            inner: Mutex::new(RefCell::new(BoundedStack::new())),
        }
    }
}

impl<N: ArrayLength<u8>> SharedStack<N> {
    pub fn new() -> Self {
        Default::default()
    }

    /// Called from the interrupt handler.
    pub fn push(&self, byte: u8) -> Result<(), StackError> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).push(byte))
    }

    /// Called from the foreground loop.
    pub fn pop(&self) -> Result<u8, StackError> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).pop())
    }

    pub fn sp(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).sp())
    }

    pub fn capacity(&self) -> usize {
        N::to_usize()
    }
}
