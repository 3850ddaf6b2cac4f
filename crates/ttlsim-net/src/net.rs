//! A single tri-state electrical node with handle-based single-driver
//! ownership.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::NetResult;

/// The three-valued state of a [`Net`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetState {
    /// Driven low.
    Low,
    /// Driven high.
    High,
    /// High-impedance: no driver, value undefined.
    Floating,
}

/// A caller attempted to mutate a net it does not own.
///
/// This is the kernel's short-circuit report: because a net admits at most
/// one owner, a second driver racing against the first never corrupts
/// state — it simply fails this check before touching anything.
#[derive(Debug, Clone, thiserror::Error)]
#[error("not the current owner: net is held by handle {current_owner}, caller supplied {supplied}")]
pub struct NotOwner {
    /// The net's actual current owner handle (0 if unowned/floating).
    pub current_owner: u64,
    /// The handle the caller supplied.
    pub supplied: u64,
}

struct NetInner {
    state: Cell<NetState>,
    owner: Cell<u64>,
    next_handle: Cell<u64>,
}

type Listener = Box<dyn FnMut(NetState) -> NetResult<()>>;

/// A single electrical node with three-valued state.
///
/// `Net` is a cheap, `Clone`-able handle (an `Rc` under the hood) — cloning
/// it does not create a new node, it shares the same one. This lets a
/// circuit description pass the same net to many components without any of
/// them owning it outright, the way a real wire has many things soldered to
/// it.
///
/// At most one owner may mutate a net's state at a time, identified by a
/// monotonically increasing, never-reused handle. Handle `0` is the
/// sentinel meaning "no claim" — passing it to [`Net::take_high`] or
/// [`Net::take_low`] on an unowned net mints a fresh handle; passing it
/// while the net is owned by someone else fails with [`NotOwner`].
#[derive(Clone)]
pub struct Net {
    inner: Rc<NetInner>,
    listeners: Rc<RefCell<Vec<Listener>>>,
}

impl fmt::Debug for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Net")
            .field("state", &self.inner.state.get())
            .field("owner", &self.inner.owner.get())
            .finish()
    }
}

impl Default for Net {
    fn default() -> Self {
        Self::new()
    }
}

impl Net {
    /// Create a new, floating, unowned net.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(NetInner {
                state: Cell::new(NetState::Floating),
                owner: Cell::new(0),
                next_handle: Cell::new(0),
            }),
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// The net's current state.
    #[must_use]
    pub fn state(&self) -> NetState {
        self.inner.state.get()
    }

    /// The handle currently authorized to mutate this net, or `0` if the
    /// net is unowned (equivalently, floating).
    #[must_use]
    pub fn owner(&self) -> u64 {
        self.inner.owner.get()
    }

    /// Drive the net high.
    ///
    /// If `handle` matches the current owner, the net is mutated and the
    /// same handle returned. If `handle` is `0` and the net is currently
    /// unowned, a fresh handle is minted, recorded as owner, and returned.
    /// Otherwise this fails with [`NotOwner`] — the net's short-circuit
    /// report.
    pub fn take_high(&self, handle: u64) -> NetResult<u64> {
        self.claim(handle, NetState::High)
    }

    /// Drive the net low. See [`Net::take_high`] for the ownership rules.
    pub fn take_low(&self, handle: u64) -> NetResult<u64> {
        self.claim(handle, NetState::Low)
    }

    fn claim(&self, handle: u64, new_state: NetState) -> NetResult<u64> {
        let owner = self.inner.owner.get();
        let assigned = if handle != 0 {
            if handle != owner {
                return Err(Box::new(NotOwner {
                    current_owner: owner,
                    supplied: handle,
                }));
            }
            handle
        } else {
            if owner != 0 {
                return Err(Box::new(NotOwner {
                    current_owner: owner,
                    supplied: 0,
                }));
            }
            let next = self.inner.next_handle.get() + 1;
            self.inner.next_handle.set(next);
            self.inner.owner.set(next);
            next
        };
        self.inner.state.set(new_state);
        self.notify(new_state)?;
        Ok(assigned)
    }

    /// Release the net to floating. `handle` must match the current owner
    /// (including `0`, which trivially succeeds on an already-floating
    /// net).
    pub fn release_floating(&self, handle: u64) -> NetResult<()> {
        let owner = self.inner.owner.get();
        if handle != owner {
            return Err(Box::new(NotOwner {
                current_owner: owner,
                supplied: handle,
            }));
        }
        self.inner.owner.set(0);
        self.inner.state.set(NetState::Floating);
        self.notify(NetState::Floating)
    }

    /// Register a listener invoked, in registration order, whenever this
    /// net's state changes. Listeners live for the net's lifetime — there
    /// is no removal API.
    ///
    /// A listener that returns `Err` aborts the remaining notifications and
    /// propagates out of whichever `take_high`/`take_low`/`release_floating`
    /// call triggered the transition. This is how a component's timing
    /// checks veto an illegal edge synchronously, from inside the very call
    /// that caused it.
    pub fn add_listener(&self, listener: impl FnMut(NetState) -> NetResult<()> + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    fn notify(&self, state: NetState) -> NetResult<()> {
        for listener in self.listeners.borrow_mut().iter_mut() {
            listener(state)?;
        }
        Ok(())
    }
}
