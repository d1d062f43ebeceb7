use core::fmt;
use kernel_addresses::PhysicalAddress;

/// One entry of the region table: a contiguous physical byte range and
/// whether it is currently handed out.
///
/// Live blocks always have a non-zero size; zero-sized blocks exist only as
/// backing storage behind the table's fill line.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MemoryBlock {
    start: PhysicalAddress,
    size: u64,
    used: bool,
}

impl MemoryBlock {
    /// Placeholder for unoccupied table slots.
    pub(crate) const EMPTY: Self = Self {
        start: PhysicalAddress::ZERO,
        size: 0,
        used: false,
    };

    /// A free block covering `[start, start + size)`.
    #[must_use]
    pub(crate) const fn free(start: PhysicalAddress, size: u64) -> Self {
        Self {
            start,
            size,
            used: false,
        }
    }

    /// First byte of the range.
    #[inline]
    #[must_use]
    pub const fn start(&self) -> PhysicalAddress {
        self.start
    }

    /// Length of the range in bytes.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// One past the last byte of the range (exclusive).
    #[inline]
    #[must_use]
    pub const fn end(&self) -> PhysicalAddress {
        self.start.add(self.size)
    }

    /// Whether the block is currently handed out.
    #[inline]
    #[must_use]
    pub const fn is_used(&self) -> bool {
        self.used
    }

    /// Whether the block is available for allocation.
    #[inline]
    #[must_use]
    pub const fn is_free(&self) -> bool {
        !self.used
    }

    /// Whether `addr` falls inside this block's range.
    #[inline]
    #[must_use]
    pub const fn contains(&self, addr: PhysicalAddress) -> bool {
        self.start.as_u64() <= addr.as_u64() && addr.as_u64() < self.end().as_u64()
    }

    pub(crate) const fn set_used(&mut self, used: bool) {
        self.used = used;
    }

    /// Shrink the block to `size` bytes, keeping its start.
    pub(crate) const fn shrink_to(&mut self, size: u64) {
        debug_assert!(size > 0 && size <= self.size);
        self.size = size;
    }

    /// Extend the block by `bytes` (absorbing an adjacent neighbor).
    pub(crate) const fn grow(&mut self, bytes: u64) {
        self.size += bytes;
    }
}

impl fmt::Debug for MemoryBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}..{} ({} bytes)",
            if self.used { "used" } else { "free" },
            self.start,
            self.end(),
            self.size,
        )
    }
}
