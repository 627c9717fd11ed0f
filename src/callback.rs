//! Single slot callback registration per interrupt source, and the mailbox
//! that moves interrupt events to the foreground.

use core::fmt;
use core::marker::PhantomData;
use core::sync::atomic::{AtomicBool, Ordering};
use log::debug;

/// An interrupt source with a dedicated callback slot.
pub trait Source: Copy + fmt::Debug {
    /// Slot number of the source. Must be below the registry size.
    fn index(self) -> usize;
}

/// Handler invoked when its interrupt source fires. Runs in interrupt context
/// (or from a dispatcher), so it must be short and must not block.
pub type Callback<C> = fn(&mut C);

/// One overwritable handler slot per source.
pub struct CallbackRegistry<S, C, const N: usize> {
    slots: [Option<Callback<C>>; N],
    _source: PhantomData<fn(S)>,
}

impl<S: Source, C, const N: usize> CallbackRegistry<S, C, N> {
    pub const fn new() -> Self {
        Self {
            slots: [None; N],
            _source: PhantomData,
        }
    }

    /// Installs `handler` for `source`, replacing whatever was there. Returns
    /// the previous handler.
    pub fn set(&mut self, source: S, handler: Callback<C>) -> Option<Callback<C>> {
        let previous = self.slots[source.index()].replace(handler);
        if previous.is_some() {
            debug!("Replacing {:?} callback", source);
        }
        previous
    }

    pub fn clear(&mut self, source: S) -> Option<Callback<C>> {
        self.slots[source.index()].take()
    }

    pub fn get(&self, source: S) -> Option<Callback<C>> {
        self.slots[source.index()]
    }

    pub fn is_set(&self, source: S) -> bool {
        self.slots[source.index()].is_some()
    }
}

impl<S: Source, C, const N: usize> Default for CallbackRegistry<S, C, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::declare_interior_mutable_const)]
const EMPTY_SLOT: AtomicBool = AtomicBool::new(false);

/// Interrupt-safe single slot mailbox per source.
///
/// Interrupt handlers call [`post`] through a shared reference, so a
/// `Mailbox` can live in a `static`. The foreground takes the events out
/// again, usually through a driver's `dispatch` method. A source that is
/// posted again before its previous event was taken is coalesced into the one
/// pending event, which keeps at most one event per source in flight.
///
/// [`post`]: #method.post
pub struct Mailbox<S, const N: usize> {
    pending: [AtomicBool; N],
    _source: PhantomData<fn(S)>,
}

impl<S: Source, const N: usize> Mailbox<S, N> {
    pub const fn new() -> Self {
        Self {
            pending: [EMPTY_SLOT; N],
            _source: PhantomData,
        }
    }

    /// Posts an event for `source`. Returns `false` if one was already
    /// pending and this one got coalesced.
    ///
    /// Only touches the atomic flag, so it's safe to call from an interrupt
    /// vector. Reporting a coalesced event is left to the caller.
    pub fn post(&self, source: S) -> bool {
        !self.pending[source.index()].swap(true, Ordering::AcqRel)
    }

    /// Takes the pending event for `source`, if there is one.
    pub fn take(&self, source: S) -> bool {
        self.pending[source.index()].swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self, source: S) -> bool {
        self.pending[source.index()].load(Ordering::Acquire)
    }
}

impl<S: Source, const N: usize> Default for Mailbox<S, N> {
    fn default() -> Self {
        Self::new()
    }
}
