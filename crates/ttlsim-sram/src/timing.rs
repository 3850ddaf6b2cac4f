//! Datasheet timing constants for the 62256-class asynchronous SRAM.
//!
//! All values are worst-case propagation maxima or minimum setup/hold times,
//! in nanoseconds.

/// Address valid to data valid (read).
pub const T_AA: u64 = 120;
/// /CS low to data valid.
pub const T_ACS: u64 = 120;
/// /OE low to data valid.
pub const T_OE: u64 = 60;
/// /OE high to data high-Z.
pub const T_OHZ: u64 = 40;
/// Minimum /CS low time before the end of a write.
pub const T_SCS: u64 = 85;
/// Minimum address setup time before the end of a write.
pub const T_SA: u64 = 85;
/// Minimum data setup time before the end of a write.
pub const T_SD: u64 = 50;
/// Minimum /WE low pulse width.
pub const T_WP: u64 = 70;

/// The reference part's capacity: 32 KiB.
pub const REFERENCE_CAPACITY: u64 = 32 * 1024;
