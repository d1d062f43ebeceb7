//! # Boot Paging Structures (32-bit, two-level)
//!
//! This crate models the classic i386 two-level paging hierarchy:
//!
//! - [`PageEntry`]: one PTE mapping a 4 KiB frame.
//! - [`PageTable`]: a 4 KiB-aligned array of 1024 PTEs.
//! - [`PageDirectoryEntry`]: one PDE pointing at a page table.
//! - [`PageDirectory`]: a 4 KiB-aligned array of 1024 PDEs.
//!
//! The kernel currently runs with paging **off**: during boot it
//! zero-initializes a [`PageDirectory`] at a fixed physical address and
//! leaves it vacant. Nothing here installs a directory or touches `CR3`;
//! the types exist so the boot layout is well-defined before translation
//! is ever switched on.
//!
//! ## Invariants & Notes
//!
//! - Both table types are exactly 4096 bytes and 4096-aligned.
//! - Entry constructors don't validate consistency; callers must keep
//!   frame addresses page-aligned.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

use bitfield_struct::bitfield;
use kernel_addresses::PhysicalAddress;

/// Number of entries in a page table or page directory.
pub const ENTRY_COUNT: usize = 1024;

/// A page-table entry mapping one 4 KiB frame.
#[bitfield(u32)]
pub struct PageEntry {
    /// Present (bit 0).
    pub present: bool,
    /// Writable (bit 1).
    pub writable: bool,
    /// User-accessible (bit 2).
    pub user: bool,
    /// Accessed (bit 3), set by hardware.
    pub accessed: bool,
    /// Dirty (bit 4), set by hardware on write.
    pub dirty: bool,
    /// Reserved / OS-available (bits 5..11).
    #[bits(7)]
    __: u8,
    /// Physical frame number (bits 12..31 of the frame base).
    #[bits(20)]
    frame: u32,
}

impl PageEntry {
    /// Frame base as a byte address.
    #[inline]
    #[must_use]
    pub const fn frame_base(self) -> PhysicalAddress {
        PhysicalAddress::new((self.frame() as u64) << 12)
    }

    /// Set the frame base (must be 4 KiB-aligned).
    #[inline]
    #[must_use]
    pub const fn with_frame_base(self, base: PhysicalAddress) -> Self {
        debug_assert!(base.is_aligned_to(4096));
        self.with_frame((base.as_u64() >> 12) as u32)
    }
}

/// A page-directory entry pointing at one [`PageTable`].
#[bitfield(u32)]
pub struct PageDirectoryEntry {
    /// Present (bit 0).
    pub present: bool,
    /// Writable (bit 1).
    pub writable: bool,
    /// User-accessible (bit 2).
    pub user: bool,
    /// Reserved / OS-available (bits 3..11).
    #[bits(9)]
    __: u16,
    /// Physical frame number of the page table (bits 12..31).
    #[bits(20)]
    table_frame: u32,
}

impl PageDirectoryEntry {
    /// Page-table base as a byte address.
    #[inline]
    #[must_use]
    pub const fn table_base(self) -> PhysicalAddress {
        PhysicalAddress::new((self.table_frame() as u64) << 12)
    }

    /// Set the page-table base (must be 4 KiB-aligned).
    #[inline]
    #[must_use]
    pub const fn with_table_base(self, base: PhysicalAddress) -> Self {
        debug_assert!(base.is_aligned_to(4096));
        self.with_table_frame((base.as_u64() >> 12) as u32)
    }
}

/// A 4 KiB-aligned table of 1024 [`PageEntry`] records.
#[repr(C, align(4096))]
#[derive(Clone, Copy)]
pub struct PageTable {
    entries: [PageEntry; ENTRY_COUNT],
}

impl PageTable {
    /// An all-zero table: nothing mapped.
    pub const EMPTY: Self = Self {
        entries: [PageEntry::new(); ENTRY_COUNT],
    };

    /// The entry for `index` (0..1024).
    #[inline]
    #[must_use]
    pub const fn entry(&self, index: usize) -> PageEntry {
        self.entries[index]
    }

    /// Replace the entry for `index` (0..1024).
    #[inline]
    pub const fn set_entry(&mut self, index: usize, entry: PageEntry) {
        self.entries[index] = entry;
    }

    /// Whether no entry is present.
    #[must_use]
    pub fn is_vacant(&self) -> bool {
        self.entries.iter().all(|e| !e.present())
    }
}

/// A 4 KiB-aligned table of 1024 [`PageDirectoryEntry`] records.
#[repr(C, align(4096))]
#[derive(Clone, Copy)]
pub struct PageDirectory {
    entries: [PageDirectoryEntry; ENTRY_COUNT],
}

impl PageDirectory {
    /// An all-zero directory: no tables referenced.
    pub const EMPTY: Self = Self {
        entries: [PageDirectoryEntry::new(); ENTRY_COUNT],
    };

    /// The entry for `index` (0..1024).
    #[inline]
    #[must_use]
    pub const fn entry(&self, index: usize) -> PageDirectoryEntry {
        self.entries[index]
    }

    /// Replace the entry for `index` (0..1024).
    #[inline]
    pub const fn set_entry(&mut self, index: usize, entry: PageDirectoryEntry) {
        self.entries[index] = entry;
    }

    /// Whether no entry is present.
    #[must_use]
    pub fn is_vacant(&self) -> bool {
        self.entries.iter().all(|e| !e.present())
    }
}

const _: () = {
    assert!(size_of::<PageTable>() == 4096);
    assert!(align_of::<PageTable>() == 4096);
    assert!(size_of::<PageDirectory>() == 4096);
    assert!(align_of::<PageDirectory>() == 4096);
};
