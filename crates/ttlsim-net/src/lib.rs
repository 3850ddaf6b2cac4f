//! Single-driver tri-state nets and the bus adapters built on them.
//!
//! [`Net`] models one electrical node: three-valued state, at most one
//! owner at a time, ownership identified by a monotonic, never-reused
//! handle rather than object identity. [`BusMember`] adapts an ordered
//! collection of nets into a multi-bit value with the same ownership
//! discipline applied per-bit.
//!
//! # Example
//!
//! ```
//! use ttlsim_net::{BusMember, BusValue, Net};
//!
//! let nets: Vec<Net> = (0..8).map(|_| Net::new()).collect();
//! let bus = BusMember::new(nets);
//! bus.write(0x2A).unwrap();
//! assert_eq!(bus.value(), BusValue::Value(0x2A));
//!
//! bus.float();
//! assert_eq!(bus.value(), BusValue::Floating);
//! ```

#![warn(missing_docs)]

mod bus;
mod net;

pub use bus::{BusError, BusMember, BusValue};
pub use net::{Net, NetState, NotOwner};

/// The result type shared by every fallible operation in this crate:
/// opaque so that a component several layers up (a chip model's timing
/// check, reacting synchronously to a transition) can veto the call with
/// its own error type without this crate knowing it exists.
pub type NetResult<T> = Result<T, Box<dyn std::error::Error>>;
