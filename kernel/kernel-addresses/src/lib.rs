//! # Physical Memory Address Types
//!
//! A strongly typed wrapper for raw physical addresses plus the alignment
//! helpers used by the physical-memory allocator.
//!
//! ## Overview
//!
//! The kernel tracks physical memory purely by number: the allocator hands
//! out and takes back byte addresses without ever dereferencing them. Using
//! a dedicated [`PhysicalAddress`] type keeps those numbers from being mixed
//! up with sizes, indices, or (future) virtual addresses while remaining a
//! zero-cost wrapper around `u64`.
//!
//! ```rust
//! # use kernel_addresses::PhysicalAddress;
//! let base = PhysicalAddress::new(0x0010_0000);
//! assert!(base.is_aligned_to(4096));
//! assert_eq!((base + 4096) - base, 4096);
//! assert_eq!(PhysicalAddress::new(0x0010_0001).align_up(4096).as_u64(), 0x0010_1000);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

use core::fmt;
use core::ops::{Add, AddAssign, Sub};

/// Align `x` down to the nearest multiple of `a`.
///
/// ### Preconditions
/// - `a` must be **non-zero** and a **power of two**.
///
/// ### Examples
/// ```rust
/// # use kernel_addresses::align_down;
/// assert_eq!(align_down(0,    4096), 0);
/// assert_eq!(align_down(1,    4096), 0);
/// assert_eq!(align_down(4095, 4096), 0);
/// assert_eq!(align_down(4096, 4096), 4096);
/// assert_eq!(align_down(8191, 4096), 4096);
/// ```
#[inline(always)]
#[must_use]
pub const fn align_down(x: u64, a: u64) -> u64 {
    debug_assert!(a.is_power_of_two());
    x & !(a - 1)
}

/// Align `x` up to the nearest multiple of `a`.
///
/// This returns the smallest value `y >= x` such that `y % a == 0`.
///
/// ### Preconditions
/// - `a` must be **non-zero** and a **power of two**.
/// - `x + (a - 1)` must **not overflow** `u64`.
///
/// ### Examples
/// ```rust
/// # use kernel_addresses::align_up;
/// assert_eq!(align_up(0,    4096), 0);
/// assert_eq!(align_up(1,    4096), 4096);
/// assert_eq!(align_up(4095, 4096), 4096);
/// assert_eq!(align_up(4096, 4096), 4096);
/// assert_eq!(align_up(4097, 4096), 8192);
/// ```
#[inline(always)]
#[must_use]
pub const fn align_up(x: u64, a: u64) -> u64 {
    debug_assert!(a.is_power_of_two());
    (x + a - 1) & !(a - 1)
}

/// A raw 64-bit physical memory address.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalAddress(u64);

impl PhysicalAddress {
    /// The all-zero address.
    pub const ZERO: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// The address `offset` bytes past `self`.
    ///
    /// Overflow is a caller bug; addition is unchecked in release builds.
    #[inline]
    #[must_use]
    pub const fn add(self, offset: u64) -> Self {
        debug_assert!(self.0.checked_add(offset).is_some());
        Self(self.0 + offset)
    }

    /// Rounds up to the nearest multiple of `align` (a power of two).
    #[inline]
    #[must_use]
    pub const fn align_up(self, align: u64) -> Self {
        Self(align_up(self.0, align))
    }

    /// Rounds down to the nearest multiple of `align` (a power of two).
    #[inline]
    #[must_use]
    pub const fn align_down(self, align: u64) -> Self {
        Self(align_down(self.0, align))
    }

    /// Whether the address is a multiple of `align` (a power of two).
    #[inline]
    #[must_use]
    pub const fn is_aligned_to(self, align: u64) -> bool {
        debug_assert!(align.is_power_of_two());
        self.0 & (align - 1) == 0
    }
}

impl fmt::Debug for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysicalAddress(0x{:08X})", self.0)
    }
}

impl fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl fmt::LowerHex for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::UpperHex for PhysicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

impl Add<u64> for PhysicalAddress {
    type Output = Self;

    #[inline]
    fn add(self, rhs: u64) -> Self {
        PhysicalAddress::add(self, rhs)
    }
}

impl AddAssign<u64> for PhysicalAddress {
    #[inline]
    fn add_assign(&mut self, rhs: u64) {
        *self = PhysicalAddress::add(*self, rhs);
    }
}

/// Distance in bytes between two addresses; `rhs` must not exceed `self`.
impl Sub<PhysicalAddress> for PhysicalAddress {
    type Output = u64;

    #[inline]
    fn sub(self, rhs: PhysicalAddress) -> u64 {
        debug_assert!(rhs.0 <= self.0);
        self.0 - rhs.0
    }
}

impl From<u64> for PhysicalAddress {
    #[inline]
    fn from(addr: u64) -> Self {
        Self::new(addr)
    }
}

impl From<PhysicalAddress> for u64 {
    #[inline]
    fn from(addr: PhysicalAddress) -> Self {
        addr.as_u64()
    }
}
