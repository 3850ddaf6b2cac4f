//! A single-queue, virtual-time event scheduler.
//!
//! [`Scheduler`] orders pending work by [`Timestamp`] and dispatches it one
//! event at a time via [`Scheduler::tick`]. There is no cancellation
//! primitive: components that need to abandon stale work are expected to
//! re-verify their own preconditions when the deferred event finally fires
//! (see the `ttlsim-sram` crate's read-readiness check for the canonical
//! example).
//!
//! # Example
//!
//! ```
//! use ttlsim_scheduler::Scheduler;
//! use ttlsim_time::Timestamp;
//!
//! let sched = Scheduler::new();
//! sched.submit(Timestamp::new(0, 10), |_stamp| {
//!     println!("fired");
//!     Ok(())
//! });
//! while !sched.empty() {
//!     sched.tick().unwrap();
//! }
//! ```
//!
//! `submit` and `tick` both take `&self`: pending events live behind a
//! `RefCell` internally, the same interior-mutability discipline
//! `ttlsim-net`'s `Net` and `BusMember` use. This is not just style — a
//! component reacting to a transition from *inside* a handler (the common
//! case: a chip model schedules a follow-up check in response to the very
//! edge that is currently firing) must be able to call `submit` again
//! without first unwinding out of `tick`. Wrapping the whole scheduler in an
//! external `RefCell` instead would make that reentrant call panic, since
//! `tick`'s own borrow would still be held while the handler runs.

#![warn(missing_docs)]

use std::cell::{Cell, RefCell};
use std::fmt;

use ttlsim_time::Timestamp;

/// The result of running one scheduled handler.
///
/// A handler raises by returning `Err`; the error is opaque to the
/// scheduler itself (it never inspects it) and propagates straight out of
/// [`Scheduler::tick`]. This is how the kernel's two fatal error kinds — a
/// net's not-owner short and a chip model's undefined-behavior detection —
/// surface from deep inside a running simulation without the scheduler
/// needing to know either type exists.
pub type EventResult = Result<(), Box<dyn std::error::Error>>;

/// A boxed, one-shot callback invoked with the timestamp it fired at.
pub type Handler = Box<dyn FnOnce(Timestamp) -> EventResult>;

struct Event {
    stamp: Timestamp,
    handler: Handler,
}

/// An ordered, FIFO-tie-broken queue of future work.
///
/// Single-threaded and cooperative: exactly one event fires per call to
/// [`Scheduler::tick`], and `now` only advances inside that call. Pending
/// events and `now` are both behind interior mutability, so a `Scheduler` is
/// typically shared as `Rc<Scheduler>` between the harness driving the loop
/// and the components that submit work into it.
pub struct Scheduler {
    now: Cell<Timestamp>,
    pending: RefCell<Vec<Event>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now.get())
            .field("pending", &self.pending.borrow().len())
            .finish()
    }
}

impl Scheduler {
    /// Create a scheduler with `now` at [`Timestamp::ZERO`] and an empty
    /// queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Cell::new(Timestamp::ZERO),
            pending: RefCell::new(Vec::new()),
        }
    }

    /// Submit a handler to run at `stamp`.
    ///
    /// Inserted at the first position whose existing stamp is strictly
    /// greater than `stamp`, so events sharing a stamp fire in submission
    /// order. Safe to call from inside a handler currently running under
    /// [`Scheduler::tick`] — the pending queue is not borrowed for the
    /// duration of a handler call, only for the instant it takes to insert.
    pub fn submit(&self, stamp: Timestamp, handler: impl FnOnce(Timestamp) -> EventResult + 'static) {
        let mut pending = self.pending.borrow_mut();
        let insert_at = pending
            .iter()
            .position(|e| e.stamp > stamp)
            .unwrap_or(pending.len());
        pending.insert(
            insert_at,
            Event {
                stamp,
                handler: Box::new(handler),
            },
        );
    }

    /// Remove the head event, advance `now` to its stamp, and invoke its
    /// handler.
    ///
    /// The pending queue is only borrowed long enough to remove the head
    /// event; the borrow is released before the handler runs, so the
    /// handler (and anything it calls synchronously) may freely call
    /// [`Scheduler::submit`] again.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty — the scheduler never fails on its own
    /// behalf, so calling `tick` with nothing pending is a caller bug.
    pub fn tick(&self) -> EventResult {
        let event = {
            let mut pending = self.pending.borrow_mut();
            assert!(!pending.is_empty(), "tick() called on an empty scheduler");
            pending.remove(0)
        };
        self.now.set(event.stamp);
        log::trace!("tick: dispatching event at {}", event.stamp);
        (event.handler)(event.stamp)
    }

    /// The virtual instant of the most recently dispatched event, or
    /// [`Timestamp::ZERO`] if nothing has fired yet.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.now.get()
    }

    /// `true` if there is no pending work.
    #[must_use]
    pub fn empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn ordered_dispatch() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sched = Scheduler::new();

        let log2 = log.clone();
        sched.submit(Timestamp::new(2, 10), move |_| {
            log2.borrow_mut().push("h2");
            Ok(())
        });
        let log1 = log.clone();
        sched.submit(Timestamp::new(1, 10), move |_| {
            log1.borrow_mut().push("h1");
            Ok(())
        });

        sched.tick().unwrap();
        sched.tick().unwrap();

        assert_eq!(*log.borrow(), vec!["h1", "h2"]);
        assert_eq!(sched.now(), Timestamp::new(2, 10));
        assert!(sched.empty());
    }

    #[test]
    fn fifo_tie_break() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sched = Scheduler::new();

        let stamp = Timestamp::new(1, 10);
        let a = log.clone();
        sched.submit(stamp, move |_| {
            a.borrow_mut().push("a");
            Ok(())
        });
        let b = log.clone();
        sched.submit(stamp, move |_| {
            b.borrow_mut().push("b");
            Ok(())
        });

        sched.tick().unwrap();
        sched.tick().unwrap();

        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn handler_error_propagates_and_halts() {
        let sched = Scheduler::new();
        sched.submit(Timestamp::ZERO, |_| {
            Err("boom".into())
        });
        sched.submit(Timestamp::new(0, 1), |_| Ok(()));

        let result = sched.tick();
        assert!(result.is_err());
        // The queue is untouched past the failing event; the second event
        // is still pending because the caller's loop is expected to stop.
        assert!(!sched.empty());
    }

    #[test]
    fn rescheduling_at_current_now_runs_after_already_queued_work() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sched = Rc::new(Scheduler::new());

        let log1 = log.clone();
        let sched1 = sched.clone();
        sched.submit(Timestamp::ZERO, move |stamp| {
            log1.borrow_mut().push("first");
            let log1b = log1.clone();
            // Reentrant: this runs from inside the very `tick()` call
            // below, while the scheduler's own handler is executing.
            sched1.submit(stamp, move |_| {
                log1b.borrow_mut().push("rescheduled");
                Ok(())
            });
            Ok(())
        });
        let log2 = log.clone();
        sched.submit(Timestamp::ZERO, move |_| {
            log2.borrow_mut().push("second");
            Ok(())
        });

        while !sched.empty() {
            sched.tick().unwrap();
        }

        assert_eq!(*log.borrow(), vec!["first", "second", "rescheduled"]);
    }

    #[test]
    #[should_panic(expected = "empty scheduler")]
    fn tick_on_empty_queue_panics() {
        let sched = Scheduler::new();
        let _ = sched.tick();
    }
}
