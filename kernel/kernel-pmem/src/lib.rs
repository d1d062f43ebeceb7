//! # Physical Memory Region Allocator
//!
//! A bounded, array-backed allocator for one contiguous physical region.
//! The region is described by a table of [`MemoryBlock`] records that
//! always partition `[start, end)` exactly: allocation splits a free block,
//! freeing merges address-adjacent free blocks back together.
//!
//! The allocator is pure bookkeeping. It tracks addresses as numbers and
//! never dereferences them, which keeps this crate `safe` Rust end to end
//! and lets the full allocator run in host unit tests.
//!
//! ## Overview
//!
//! * **First fit, table order.** Requests are rounded up to whole pages and
//!   satisfied by the first free block in the table that is large enough.
//!   The table is kept in allocation-history order, not address order;
//!   splits append their remainder at the end.
//! * **Coalescing by address.** On free, neighbors are found by comparing
//!   block bounds (`a.end() == b.start()`), so merging works no matter
//!   where the entries sit in the table.
//! * **Bounded table.** The table holds at most `CAP` entries. When it is
//!   full, a split would lose the remainder, so the allocator hands out the
//!   entire free block instead (an oversized allocation that `free` later
//!   returns whole).
//!
//! ## Example
//!
//! ```rust
//! use kernel_addresses::PhysicalAddress;
//! use kernel_pmem::RegionAllocator;
//!
//! let base = PhysicalAddress::new(0x0010_0000);
//! let mut pmem = RegionAllocator::<16>::new(base, base + 16 * 4096);
//!
//! // One byte still consumes a page.
//! let a = pmem.allocate(1).unwrap().unwrap();
//! assert_eq!(a, base);
//!
//! // Freeing merges the region back into a single block.
//! pmem.free(a).unwrap();
//! assert_eq!(pmem.block_count(), 1);
//!
//! // Zero-size requests allocate nothing.
//! assert_eq!(pmem.allocate(0).unwrap(), None);
//! ```
//!
//! ## Invariants
//!
//! After construction and after every `allocate`/`free` the table satisfies:
//!
//! 1. every block lies inside `[start, end)`;
//! 2. blocks are pairwise disjoint;
//! 3. block sizes sum to `end - start` (exact coverage, no gaps);
//! 4. no two address-adjacent blocks are both free;
//! 5. the entry count never exceeds `CAP`.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

mod allocator;
mod block;
mod table;

pub use allocator::{FreeError, OutOfMemory, RegionAllocator, RegionStats};
pub use block::MemoryBlock;
