//! Virtual-time arithmetic for discrete-event simulation.
//!
//! A [`Timestamp`] is an ordered pair of seconds and nanoseconds, always kept
//! normalized so that the nanoseconds field stays in `[0, 1_000_000_000)`.
//! Arithmetic never panics or overflows into an error: subtracting a later
//! timestamp from an earlier one simply produces a timestamp with a negative
//! `seconds` field (borrow-and-normalize), because ordering is all the
//! kernel ever needs from the result.
//!
//! # Example
//!
//! ```
//! use ttlsim_time::Timestamp;
//!
//! let a = Timestamp::new(0, 900_000_000);
//! let b = Timestamp::new(0, 200_000_000);
//! let sum = a + b;
//! assert_eq!(sum, Timestamp::new(1, 100_000_000));
//! assert!(b < a);
//! ```

#![warn(missing_docs)]

use std::fmt;
use std::ops::{Add, Sub};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A virtual-time instant with nanosecond resolution.
///
/// Immutable once constructed. The nanoseconds component is always
/// normalized into `[0, 1_000_000_000)`; any carry or borrow is folded into
/// the seconds component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    seconds: i64,
    nanos: u32,
}

impl Timestamp {
    /// The zero instant, used as a scheduler's initial `now`.
    pub const ZERO: Timestamp = Timestamp {
        seconds: 0,
        nanos: 0,
    };

    /// Construct a timestamp from seconds and nanoseconds, normalizing any
    /// carry out of `nanoseconds` into `seconds`.
    #[must_use]
    pub fn new(seconds: i64, nanoseconds: u64) -> Self {
        let carry = (nanoseconds / NANOS_PER_SEC) as i64;
        let nanos = (nanoseconds % NANOS_PER_SEC) as u32;
        Timestamp {
            seconds: seconds + carry,
            nanos,
        }
    }

    /// Construct a timestamp `nanoseconds` after [`Timestamp::ZERO`].
    #[must_use]
    pub fn from_nanos(nanoseconds: u64) -> Self {
        Self::new(0, nanoseconds)
    }

    /// The whole-seconds component.
    #[must_use]
    pub fn seconds(self) -> i64 {
        self.seconds
    }

    /// The nanoseconds-past-the-second component, always in
    /// `[0, 1_000_000_000)`.
    #[must_use]
    pub fn nanos(self) -> u32 {
        self.nanos
    }
}

impl Add for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Timestamp) -> Timestamp {
        let mut seconds = self.seconds + rhs.seconds;
        let mut nanos = u64::from(self.nanos) + u64::from(rhs.nanos);
        if nanos >= NANOS_PER_SEC {
            seconds += 1;
            nanos -= NANOS_PER_SEC;
        }
        Timestamp {
            seconds,
            nanos: nanos as u32,
        }
    }
}

impl Sub for Timestamp {
    type Output = Timestamp;

    /// Borrow-and-normalize subtraction. Never panics: a result earlier than
    /// [`Timestamp::ZERO`] normalizes to a negative `seconds` with a
    /// non-negative `nanos`, preserving total order.
    fn sub(self, rhs: Timestamp) -> Timestamp {
        let mut seconds = self.seconds - rhs.seconds;
        let mut nanos = i64::from(self.nanos) - i64::from(rhs.nanos);
        if nanos < 0 {
            seconds -= 1;
            nanos += NANOS_PER_SEC as i64;
        }
        Timestamp {
            seconds,
            nanos: nanos as u32,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}s", self.seconds, self.nanos)
    }
}
