//! A timing-checked asynchronous SRAM reference component (62256-class).
//!
//! [`Sram`] wires a [`ttlsim_scheduler::Scheduler`] and a pair of
//! [`ttlsim_net::BusMember`]s into a full read/write state machine: address
//! decode, tri-state output enable with propagation delay, and a /WE-clocked
//! write cycle with datasheet setup/hold checks. It is the kernel's
//! acceptance test — its invariants only hold if the scheduler's ordering,
//! the net's single-driver arbitration, and the bus's tri-state aggregation
//! all behave correctly together.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//!
//! use ttlsim_net::{BusMember, Net};
//! use ttlsim_scheduler::Scheduler;
//! use ttlsim_sram::Sram;
//! use ttlsim_time::Timestamp;
//!
//! let scheduler = Rc::new(Scheduler::new());
//! let addr_nets: Vec<Net> = (0..15).map(|_| Net::new()).collect();
//! let data_nets: Vec<Net> = (0..8).map(|_| Net::new()).collect();
//! let cs = Net::new();
//! let oe = Net::new();
//! let we = Net::new();
//!
//! let chip = Sram::reference_62256(
//!     scheduler.clone(),
//!     BusMember::new(addr_nets.clone()),
//!     BusMember::new(data_nets.clone()),
//!     cs.clone(),
//!     oe.clone(),
//!     we.clone(),
//!     None,
//! );
//!
//! chip.poke(312, 42);
//! assert_eq!(chip.peek(312), 42);
//! ```

#![warn(missing_docs)]

pub mod timing;

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use ttlsim_net::{BusMember, BusValue, Net, NetState};
use ttlsim_scheduler::Scheduler;
use ttlsim_time::Timestamp;

/// A datasheet violation detected by the chip model.
///
/// Fatal to the simulation run — recovering from a hardware model caught in
/// an illegal state is not meaningful, so this propagates straight out of
/// whichever `Net`/`BusMember` call triggered it, through [`Scheduler::tick`].
#[derive(Debug, Clone, Error)]
pub enum SramError {
    /// A timing or illegal-control-combination violation, named by message.
    #[error("undefined behavior: {0}")]
    UndefinedBehavior(String),
}

fn undefined_behavior(message: impl Into<String>) -> Box<dyn std::error::Error> {
    let message = message.into();
    log::warn!("{message}");
    Box::new(SramError::UndefinedBehavior(message))
}

#[derive(Debug, Clone, Copy)]
struct Stamps {
    cs: Timestamp,
    oe: Timestamp,
    we: Timestamp,
    addr: Timestamp,
    data: Timestamp,
}

impl Default for Stamps {
    fn default() -> Self {
        Stamps {
            cs: Timestamp::ZERO,
            oe: Timestamp::ZERO,
            we: Timestamp::ZERO,
            addr: Timestamp::ZERO,
            data: Timestamp::ZERO,
        }
    }
}

struct Inner {
    scheduler: Rc<Scheduler>,
    addr: BusMember,
    data: BusMember,
    cs: Net,
    oe: Net,
    we: Net,
    capacity: u64,
    memory: std::cell::RefCell<HashMap<u64, u8>>,
    stamps: Cell<Stamps>,
}

impl Inner {
    fn now(&self) -> Timestamp {
        self.scheduler.now()
    }

    fn stamp(&self) -> Stamps {
        self.stamps.get()
    }

    fn set_cs_stamp(&self, t: Timestamp) {
        let mut s = self.stamps.get();
        s.cs = t;
        self.stamps.set(s);
    }

    fn set_oe_stamp(&self, t: Timestamp) {
        let mut s = self.stamps.get();
        s.oe = t;
        self.stamps.set(s);
    }

    fn set_we_stamp(&self, t: Timestamp) {
        let mut s = self.stamps.get();
        s.we = t;
        self.stamps.set(s);
    }

    fn set_addr_stamp(&self, t: Timestamp) {
        let mut s = self.stamps.get();
        s.addr = t;
        self.stamps.set(s);
    }

    fn set_data_stamp(&self, t: Timestamp) {
        let mut s = self.stamps.get();
        s.data = t;
        self.stamps.set(s);
    }

    fn current_address(&self) -> Option<u64> {
        match self.addr.value() {
            BusValue::Value(v) => Some(v % self.capacity.max(1)),
            BusValue::Floating => None,
        }
    }

    /// Re-checks the three read-delay predicates against current stamps and
    /// drives the data bus only if all three have elapsed. Scheduled
    /// eagerly by every address change, /CS falling edge, and /OE falling
    /// edge; idempotent and safe to fire redundantly at the same instant
    /// (the kernel's canonical stale-work idiom — schedule eagerly, verify
    /// at firing time, never cancel).
    fn put_output_data_if_ready(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.cs.state() != NetState::Low || self.oe.state() != NetState::Low {
            return Ok(());
        }
        let now = self.now();
        let stamps = self.stamp();
        if now - stamps.addr < Timestamp::from_nanos(timing::T_AA) {
            return Ok(());
        }
        if now - stamps.oe < Timestamp::from_nanos(timing::T_OE) {
            return Ok(());
        }
        if now - stamps.cs < Timestamp::from_nanos(timing::T_ACS) {
            return Ok(());
        }
        let Some(addr) = self.current_address() else {
            return Ok(());
        };
        let byte = self.memory.borrow().get(&addr).copied().unwrap_or(0);
        log::debug!("sram: driving data bus with {byte:#04x} from address {addr:#06x}");
        // A rejected write here means another driver is already fighting the
        // chip for the data bus — exactly the short this kernel exists to
        // detect, so it propagates rather than being swallowed.
        self.data.write(i64::from(byte))?;
        Ok(())
    }

    fn release_data_to_floating(&self) {
        if self.oe.state() == NetState::High {
            log::debug!("sram: releasing data bus to floating");
            self.data.float();
        }
    }

    /// The rising edge of /WE while /CS is low and /OE is high ends a write
    /// cycle. Checked in the order the datasheet specifies; the first
    /// violated constraint is the one reported. `we_stamp` is passed
    /// explicitly rather than read from `self` because by the time this
    /// fires (the /WE rising edge) the caller has not yet overwritten the
    /// stored we-stamp with the rising edge's own time — the check needs
    /// the falling edge's time to measure the pulse width.
    fn check_write_end(&self, now: Timestamp, we_stamp: Timestamp) -> Result<(), Box<dyn std::error::Error>> {
        let stamps = self.stamp();
        if now - stamps.cs < Timestamp::from_nanos(timing::T_SCS) {
            return Err(undefined_behavior("insufficient /CS low time"));
        }
        if now - we_stamp < Timestamp::from_nanos(timing::T_WP) {
            return Err(undefined_behavior("insufficient /WE low time"));
        }
        if now - stamps.addr < Timestamp::from_nanos(timing::T_SA) {
            return Err(undefined_behavior("insufficient address setup time"));
        }
        if now - stamps.data < Timestamp::from_nanos(timing::T_SD) {
            return Err(undefined_behavior("insufficient data setup time"));
        }
        let Some(addr) = self.current_address() else {
            return Err(undefined_behavior("address bus floating at end of write"));
        };
        let byte = match self.data.value() {
            BusValue::Value(v) => v as u8,
            BusValue::Floating => return Err(undefined_behavior("data bus floating at end of write")),
        };
        log::debug!("sram: committing {byte:#04x} to address {addr:#06x}");
        self.memory.borrow_mut().insert(addr, byte);
        Ok(())
    }
}

/// A timing-checked asynchronous SRAM: address and data buses, three
/// active-low control nets (`/CS`, `/OE`, `/WE`), and a sparse memory image.
///
/// Cheaply `Clone`-able (an `Rc` handle around shared state), the same way
/// [`ttlsim_net::Net`] is — a circuit description can hold onto a chip after
/// wiring it up without owning it outright.
#[derive(Clone)]
pub struct Sram {
    inner: Rc<Inner>,
}

impl Sram {
    /// Build a chip with the given capacity (bytes), buses, and control
    /// nets, optionally seeded with an initial memory image. Unmapped
    /// addresses read as zero. Addresses are reduced modulo `capacity`, so a
    /// circuit may wire a wider address bus than the chip decodes.
    #[must_use]
    pub fn new(
        scheduler: Rc<Scheduler>,
        addr: BusMember,
        data: BusMember,
        cs: Net,
        oe: Net,
        we: Net,
        capacity: u64,
        image: Option<HashMap<u64, u8>>,
    ) -> Self {
        let inner = Rc::new(Inner {
            scheduler,
            addr,
            data,
            cs,
            oe,
            we,
            capacity,
            memory: std::cell::RefCell::new(image.unwrap_or_default()),
            stamps: Cell::new(Stamps::default()),
        });

        {
            let inner = inner.clone();
            inner.addr.add_listener(move |_value| {
                let now = inner.now();
                inner.set_addr_stamp(now);
                let target = inner.clone();
                inner
                    .scheduler
                    .submit(now + Timestamp::from_nanos(timing::T_AA), move |_| {
                        target.put_output_data_if_ready()
                    });
            });
        }
        {
            let inner = inner.clone();
            inner.data.add_listener(move |_value| {
                let now = inner.now();
                inner.set_data_stamp(now);
            });
        }
        {
            let inner = inner.clone();
            inner.cs.add_listener(move |state| {
                let now = inner.now();
                inner.set_cs_stamp(now);
                if state == NetState::Low {
                    let target = inner.clone();
                    inner
                        .scheduler
                        .submit(now + Timestamp::from_nanos(timing::T_ACS), move |_| {
                            target.put_output_data_if_ready()
                        });
                }
                Ok(())
            });
        }
        {
            let inner = inner.clone();
            inner.oe.add_listener(move |state| {
                let now = inner.now();
                match state {
                    NetState::Low => {
                        let we_already_low = inner.we.state() == NetState::Low;
                        let cs_already_low = inner.cs.state() == NetState::Low;
                        inner.set_oe_stamp(now);
                        if we_already_low && cs_already_low {
                            return Err(undefined_behavior("writes with /OE low are not supported"));
                        }
                        let target = inner.clone();
                        inner
                            .scheduler
                            .submit(now + Timestamp::from_nanos(timing::T_OE), move |_| {
                                target.put_output_data_if_ready()
                            });
                    }
                    NetState::High => {
                        inner.set_oe_stamp(now);
                        let target = inner.clone();
                        inner
                            .scheduler
                            .submit(now + Timestamp::from_nanos(timing::T_OHZ), move |_| {
                                target.release_data_to_floating();
                                Ok(())
                            });
                    }
                    NetState::Floating => inner.set_oe_stamp(now),
                }
                Ok(())
            });
        }
        {
            let inner = inner.clone();
            inner.we.add_listener(move |state| {
                let now = inner.now();
                match state {
                    NetState::Low => {
                        let oe_already_low = inner.oe.state() == NetState::Low;
                        let cs_already_low = inner.cs.state() == NetState::Low;
                        if oe_already_low && cs_already_low {
                            inner.set_we_stamp(now);
                            return Err(undefined_behavior("writes with /OE low are not supported"));
                        }
                        inner.set_we_stamp(now);
                    }
                    NetState::High => {
                        let ends_a_write = inner.cs.state() == NetState::Low && inner.oe.state() == NetState::High;
                        let falling_edge_stamp = inner.stamp().we;
                        inner.set_we_stamp(now);
                        if ends_a_write {
                            inner.check_write_end(now, falling_edge_stamp)?;
                        }
                    }
                    NetState::Floating => inner.set_we_stamp(now),
                }
                Ok(())
            });
        }

        Self { inner }
    }

    /// Build a reference 62256-class part: 32 KiB × 8, wired with the
    /// datasheet timing constants from [`timing`].
    #[must_use]
    pub fn reference_62256(
        scheduler: Rc<Scheduler>,
        addr: BusMember,
        data: BusMember,
        cs: Net,
        oe: Net,
        we: Net,
        image: Option<HashMap<u64, u8>>,
    ) -> Self {
        Self::new(scheduler, addr, data, cs, oe, we, timing::REFERENCE_CAPACITY, image)
    }

    /// Read a byte directly from the memory image, bypassing the bus and
    /// all timing checks. Intended for test setup and for agents (e.g. a
    /// programmer) modeling memory loaded outside simulated time.
    #[must_use]
    pub fn peek(&self, addr: u64) -> u8 {
        let addr = addr % self.inner.capacity.max(1);
        self.inner.memory.borrow().get(&addr).copied().unwrap_or(0)
    }

    /// Write a byte directly into the memory image, bypassing the bus and
    /// all timing checks. See [`Sram::peek`].
    pub fn poke(&self, addr: u64, value: u8) {
        let addr = addr % self.inner.capacity.max(1);
        self.inner.memory.borrow_mut().insert(addr, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_and_poke_bypass_timing_entirely() {
        let scheduler = Rc::new(Scheduler::new());
        let addr_nets: Vec<Net> = (0..15).map(|_| Net::new()).collect();
        let data_nets: Vec<Net> = (0..8).map(|_| Net::new()).collect();
        let chip = Sram::reference_62256(
            scheduler,
            BusMember::new(addr_nets),
            BusMember::new(data_nets),
            Net::new(),
            Net::new(),
            Net::new(),
            None,
        );
        assert_eq!(chip.peek(5), 0);
        chip.poke(5, 77);
        assert_eq!(chip.peek(5), 77);
    }

    #[test]
    fn capacity_of_zero_does_not_divide_by_zero() {
        let scheduler = Rc::new(Scheduler::new());
        let chip = Sram::new(
            scheduler,
            BusMember::new(vec![Net::new()]),
            BusMember::new(vec![Net::new()]),
            Net::new(),
            Net::new(),
            Net::new(),
            0,
            None,
        );
        chip.poke(7, 1);
        assert_eq!(chip.peek(7), 1);
    }
}
