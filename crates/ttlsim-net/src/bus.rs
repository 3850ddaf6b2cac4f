//! A multi-bit adapter over an ordered collection of [`Net`]s.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::net::{Net, NetState};

/// The aggregate value read off a [`BusMember`].
///
/// Never a magic integer: any constituent net being [`NetState::Floating`]
/// makes the whole bus [`BusValue::Floating`], distinguishing tri-state
/// high-impedance from a legitimate zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusValue {
    /// The unsigned value assembled LSB-first from the constituent nets.
    Value(u64),
    /// At least one constituent net is floating.
    Floating,
}

impl BusValue {
    /// The numeric value, or `None` if floating.
    #[must_use]
    pub fn value(self) -> Option<u64> {
        match self {
            BusValue::Value(v) => Some(v),
            BusValue::Floating => None,
        }
    }
}

/// An error writing to a [`BusMember`].
#[derive(Debug, Error)]
pub enum BusError {
    /// [`BusMember::write`] was called with a negative value.
    #[error("cannot write negative value {0} to a bus")]
    NegativeValue(i64),
    /// A constituent net rejected the write (almost always a [`crate::NotOwner`] short).
    #[error(transparent)]
    Net(#[from] Box<dyn std::error::Error>),
}

fn aggregate(nets: &[Net]) -> BusValue {
    let mut value: u64 = 0;
    for (bit, net) in nets.iter().enumerate() {
        match net.state() {
            NetState::Floating => return BusValue::Floating,
            NetState::High => value |= 1 << bit,
            NetState::Low => {}
        }
    }
    BusValue::Value(value)
}

type BusListener = Box<dyn FnMut(BusValue)>;

/// An adapter over a fixed, LSB-first sequence of [`Net`]s.
///
/// A `BusMember` does not own the underlying nets — multiple independent
/// members may adapt the same nets, each tracking its own per-net ownership
/// handles. This is what lets a driver release a bus to high-Z and later
/// drive it again without the bus "noticing" foreign transitions in
/// between: the handle chain identifies one member's continuous ownership
/// episode, nothing more.
pub struct BusMember {
    nets: Vec<Net>,
    handles: RefCell<Vec<u64>>,
    listeners: Rc<RefCell<Vec<BusListener>>>,
}

impl fmt::Debug for BusMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BusMember")
            .field("width", &self.nets.len())
            .field("value", &self.value())
            .finish()
    }
}

impl BusMember {
    /// Adapt `nets` (LSB first) as a new, unowned bus member.
    #[must_use]
    pub fn new(nets: Vec<Net>) -> Self {
        let handles = RefCell::new(vec![0; nets.len()]);
        let listeners: Rc<RefCell<Vec<BusListener>>> = Rc::new(RefCell::new(Vec::new()));

        let watched = nets.clone();
        for net in &nets {
            let watched = watched.clone();
            let listeners = listeners.clone();
            net.add_listener(move |_state| {
                let value = aggregate(&watched);
                for listener in listeners.borrow_mut().iter_mut() {
                    listener(value);
                }
                Ok(())
            });
        }

        Self {
            nets,
            handles,
            listeners,
        }
    }

    /// The number of nets (bits) in the bus.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nets.len()
    }

    /// `true` if the bus has zero nets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    /// Access the net at bit position `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> &Net {
        &self.nets[index]
    }

    /// Write an unsigned value across the constituent nets, LSB first.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NegativeValue`] if `value` is negative, or
    /// propagates whatever a constituent net's `take_high`/`take_low`
    /// returns (in practice always a [`crate::NotOwner`] short, or a
    /// component's veto from a registered listener).
    pub fn write(&self, value: i64) -> Result<(), BusError> {
        if value < 0 {
            return Err(BusError::NegativeValue(value));
        }
        let value = value as u64;
        let mut handles = self.handles.borrow_mut();
        for (bit, net) in self.nets.iter().enumerate() {
            let want_high = (value >> bit) & 1 == 1;
            let current = handles[bit];
            let new_handle = if want_high {
                net.take_high(current)
            } else {
                net.take_low(current)
            }
            .map_err(BusError::Net)?;
            handles[bit] = new_handle;
        }
        Ok(())
    }

    /// Release every net this member currently holds back to floating, and
    /// clear its stored handles. A subsequent [`BusMember::write`] mints
    /// fresh handles, correctly representing a tri-state output going
    /// high-Z and then driving again.
    pub fn float(&self) {
        let mut handles = self.handles.borrow_mut();
        for (bit, net) in self.nets.iter().enumerate() {
            // A member's stored handle is always either 0 or the handle it
            // was itself assigned, so this release cannot fail.
            let _ = net.release_floating(handles[bit]);
            handles[bit] = 0;
        }
    }

    /// Read the current aggregate value.
    #[must_use]
    pub fn value(&self) -> BusValue {
        aggregate(&self.nets)
    }

    /// Register a listener invoked with the aggregate value whenever any
    /// constituent net changes.
    pub fn add_listener(&self, listener: impl FnMut(BusValue) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }
}

impl Clone for BusMember {
    /// Clones share the underlying nets but get their own handles and
    /// listener list — a genuinely independent member, per [`BusMember`]'s
    /// contract that a bus may have many members.
    fn clone(&self) -> Self {
        Self::new(self.nets.clone())
    }
}
