//! # Physical Memory Layout

use kernel_addresses::PhysicalAddress;

/// Allocation granularity of the physical-memory allocator, in bytes.
///
/// Every request is rounded up to a multiple of this before a block is
/// carved out.
pub const PAGE_SIZE: u64 = 4096;

/// First byte of the physical region handed to the allocator.
///
/// Everything below 1 MiB is left alone: legacy BIOS structures, the VGA
/// text buffer and the boot page directory all live there.
pub const REGION_BASE: PhysicalAddress = PhysicalAddress::new(0x0010_0000);

/// One past the last byte of the managed region (exclusive).
pub const REGION_END: PhysicalAddress = PhysicalAddress::new(0x0100_0000);

/// Capacity of the allocator's region table.
///
/// The table is a fixed array; once every entry is occupied the allocator
/// stops splitting blocks and hands out oversized ones instead.
pub const MAX_REGIONS: usize = 1024;

/// Physical address of the boot page directory.
///
/// The directory is zero-initialized during memory setup but never
/// populated or loaded; paging stays off.
pub const PAGE_DIRECTORY_BASE: PhysicalAddress = PhysicalAddress::new(0x0009_C000);

const _: () = {
    assert!(PAGE_SIZE.is_power_of_two());
    assert!(REGION_BASE.is_aligned_to(PAGE_SIZE));
    assert!(REGION_END.is_aligned_to(PAGE_SIZE));
    assert!(REGION_BASE.as_u64() < REGION_END.as_u64());
    assert!((REGION_END.as_u64() - REGION_BASE.as_u64()).is_multiple_of(PAGE_SIZE));
    assert!(MAX_REGIONS > 0);
    // The page directory must never be handed out by the allocator.
    assert!(PAGE_DIRECTORY_BASE.as_u64() + PAGE_SIZE <= REGION_BASE.as_u64());
};
