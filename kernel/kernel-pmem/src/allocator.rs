use core::fmt;

use kernel_addresses::PhysicalAddress;
use kernel_info::memory::PAGE_SIZE;
use log::debug;

use crate::block::MemoryBlock;
use crate::table::RegionTable;

/// The allocator found no free block able to satisfy a request.
///
/// Whether this is fatal is the caller's decision; the allocator itself
/// stays usable (smaller requests may still succeed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("out of physical memory ({requested} bytes requested)")]
pub struct OutOfMemory {
    /// Byte size of the failed request, page-rounded unless the rounding
    /// itself would overflow `u64`.
    pub requested: u64,
}

/// A rejected `free` call. The table is left untouched in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FreeError {
    /// No block starts at the given address. Either the address was never
    /// returned by `allocate`, or it points into the middle of a block.
    #[error("no allocation starts at {0}")]
    UnknownAddress(PhysicalAddress),
    /// A block starts at the given address but is not handed out; the
    /// caller freed it twice.
    #[error("allocation at {0} was already freed")]
    DoubleFree(PhysicalAddress),
}

/// Byte and block counts over the whole managed region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegionStats {
    pub free_bytes: u64,
    pub used_bytes: u64,
    pub free_blocks: usize,
    pub used_blocks: usize,
}

/// First-fit physical-memory allocator over one contiguous region.
///
/// The region `[start, end)` is partitioned into at most `CAP` blocks, each
/// either free or handed out. `allocate` splits free blocks; `free` merges
/// address-adjacent free blocks back together. See the crate docs for the
/// table invariants.
pub struct RegionAllocator<const CAP: usize> {
    table: RegionTable<CAP>,
    start: PhysicalAddress,
    end: PhysicalAddress,
}

impl<const CAP: usize> RegionAllocator<CAP> {
    /// Set up the allocator for `[start, end)` with a single free block
    /// covering the whole region.
    ///
    /// Both bounds must be page aligned with `start < end`. Creating a
    /// fresh allocator is the only way to reset allocation state.
    #[must_use]
    pub fn new(start: PhysicalAddress, end: PhysicalAddress) -> Self {
        const { assert!(CAP > 0, "region table needs at least one slot") };
        debug_assert!(start.as_u64() < end.as_u64());
        debug_assert!(start.is_aligned_to(PAGE_SIZE));
        debug_assert!(end.is_aligned_to(PAGE_SIZE));

        let mut table = RegionTable::new();
        // Cannot fail: the table is empty and CAP is non-zero.
        let seeded = table.push(MemoryBlock::free(start, end - start));
        debug_assert!(seeded.is_ok());

        Self { table, start, end }
    }

    /// Hand out `size` bytes, rounded up to whole pages.
    ///
    /// Scans the table front to back (allocation-history order) and takes
    /// the first free block that fits. A larger block is split and the
    /// remainder appended to the table as a new free block. When the table
    /// has no slot left for the remainder, the whole block is handed out
    /// instead; `free` later returns it in one piece.
    ///
    /// `allocate(0)` allocates nothing and returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// [`OutOfMemory`] when no free block can satisfy the rounded request,
    /// or when `size` is so large that page rounding would overflow `u64`
    /// (reported unrounded). The table is left unchanged.
    pub fn allocate(&mut self, size: u64) -> Result<Option<PhysicalAddress>, OutOfMemory> {
        if size == 0 {
            return Ok(None);
        }
        let Some(rounded) = size.checked_next_multiple_of(PAGE_SIZE) else {
            return Err(OutOfMemory { requested: size });
        };

        let Some(index) = self
            .table
            .as_slice()
            .iter()
            .position(|b| b.is_free() && b.size() >= rounded)
        else {
            return Err(OutOfMemory { requested: rounded });
        };

        let found = self.table.as_slice()[index];
        if found.size() > rounded {
            let remainder = MemoryBlock::free(found.start().add(rounded), found.size() - rounded);
            if self.table.push(remainder).is_ok() {
                self.table.as_mut_slice()[index].shrink_to(rounded);
            } else {
                debug!(
                    "region table full ({} entries); handing out {} bytes for a {} byte request",
                    CAP,
                    found.size(),
                    rounded
                );
            }
        }
        self.table.as_mut_slice()[index].set_used(true);

        Ok(Some(found.start()))
    }

    /// Return the allocation that starts at `addr`.
    ///
    /// The address must be exactly what `allocate` returned. The freed
    /// block is merged with any free block it abuts in address space.
    ///
    /// # Errors
    ///
    /// * [`FreeError::UnknownAddress`] when no block starts at `addr`.
    /// * [`FreeError::DoubleFree`] when the block starting at `addr` is
    ///   already free.
    ///
    /// Rejected calls leave the table untouched. Note that an address whose
    /// block has since been recycled into a new allocation is
    /// indistinguishable from a valid free and will release that
    /// allocation.
    pub fn free(&mut self, addr: PhysicalAddress) -> Result<(), FreeError> {
        let Some(index) = self.table.as_slice().iter().position(|b| b.start() == addr) else {
            return Err(FreeError::UnknownAddress(addr));
        };
        if self.table.as_slice()[index].is_free() {
            return Err(FreeError::DoubleFree(addr));
        }

        self.table.as_mut_slice()[index].set_used(false);
        self.coalesce_around(index);
        Ok(())
    }

    /// Number of live table entries.
    #[inline]
    #[must_use]
    pub const fn block_count(&self) -> usize {
        self.table.len()
    }

    /// Table capacity (`CAP`).
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        CAP
    }

    /// The managed `[start, end)` bounds.
    #[inline]
    #[must_use]
    pub const fn managed_range(&self) -> (PhysicalAddress, PhysicalAddress) {
        (self.start, self.end)
    }

    /// All live blocks in table order.
    pub fn blocks(&self) -> impl Iterator<Item = &MemoryBlock> {
        self.table.as_slice().iter()
    }

    /// Aggregate byte/block counts.
    #[must_use]
    pub fn stats(&self) -> RegionStats {
        let mut stats = RegionStats::default();
        for block in self.blocks() {
            if block.is_used() {
                stats.used_bytes += block.size();
                stats.used_blocks += 1;
            } else {
                stats.free_bytes += block.size();
                stats.free_blocks += 1;
            }
        }
        stats
    }

    /// Merge the free block at `index` with free address-neighbors.
    ///
    /// Neighbors are located by comparing block bounds, never table
    /// positions: the table is in allocation order, so address-adjacent
    /// blocks can sit anywhere in it. Because the adjacency invariant held
    /// before the free, at most one merge per side is possible.
    fn coalesce_around(&mut self, index: usize) {
        let mut index = index;

        // Absorb the free block that starts where this one ends.
        let end = self.table.as_slice()[index].end();
        if let Some(successor) = self.find_free_block_at(end) {
            let absorbed = self.table.remove(successor);
            if successor < index {
                index -= 1;
            }
            self.table.as_mut_slice()[index].grow(absorbed.size());
        }

        // Fold this block into the free one that ends at its start.
        let start = self.table.as_slice()[index].start();
        if let Some(predecessor) = self.find_free_block_ending_at(start) {
            let absorbed = self.table.remove(index);
            let predecessor = if index < predecessor {
                predecessor - 1
            } else {
                predecessor
            };
            self.table.as_mut_slice()[predecessor].grow(absorbed.size());
        }
    }

    fn find_free_block_at(&self, start: PhysicalAddress) -> Option<usize> {
        self.table
            .as_slice()
            .iter()
            .position(|b| b.is_free() && b.start() == start)
    }

    fn find_free_block_ending_at(&self, end: PhysicalAddress) -> Option<usize> {
        self.table
            .as_slice()
            .iter()
            .position(|b| b.is_free() && b.end() == end)
    }
}

impl<const CAP: usize> fmt::Debug for RegionAllocator<CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RegionAllocator({}..{}, {}/{} entries) ",
            self.start,
            self.end,
            self.table.len(),
            CAP
        )?;
        f.debug_list().entries(self.blocks()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: PhysicalAddress = PhysicalAddress::new(0x0010_0000);

    fn region<const CAP: usize>(pages: u64) -> RegionAllocator<CAP> {
        RegionAllocator::new(BASE, BASE + pages * PAGE_SIZE)
    }

    fn page(n: u64) -> PhysicalAddress {
        BASE + n * PAGE_SIZE
    }

    /// Checks the five table invariants the allocator promises.
    fn assert_invariants<const CAP: usize>(a: &RegionAllocator<CAP>) {
        let blocks: Vec<MemoryBlock> = a.blocks().copied().collect();
        let (start, end) = a.managed_range();

        assert!(blocks.len() <= a.capacity());
        for b in &blocks {
            assert!(b.size() > 0, "zero-sized block: {a:?}");
            assert!(
                b.start() >= start && b.end() <= end,
                "block outside region: {a:?}"
            );
        }
        for (i, x) in blocks.iter().enumerate() {
            for (j, y) in blocks.iter().enumerate() {
                if i == j {
                    continue;
                }
                assert!(
                    x.end() <= y.start() || y.end() <= x.start(),
                    "overlapping blocks: {a:?}"
                );
                if x.end() == y.start() {
                    assert!(
                        !(x.is_free() && y.is_free()),
                        "uncoalesced free neighbors: {a:?}"
                    );
                }
            }
        }
        let covered: u64 = blocks.iter().map(MemoryBlock::size).sum();
        assert_eq!(covered, end - start, "coverage gap: {a:?}");
    }

    fn snapshot<const CAP: usize>(a: &RegionAllocator<CAP>) -> Vec<MemoryBlock> {
        a.blocks().copied().collect()
    }

    #[test]
    fn new_seeds_one_free_block() {
        let a = region::<8>(16);
        assert_invariants(&a);
        assert_eq!(a.block_count(), 1);

        let block = a.blocks().next().unwrap();
        assert_eq!(block.start(), BASE);
        assert_eq!(block.size(), 16 * PAGE_SIZE);
        assert!(block.is_free());
    }

    #[test]
    fn zero_size_allocates_nothing() {
        let mut a = region::<8>(4);
        let before = snapshot(&a);

        assert_eq!(a.allocate(0), Ok(None));
        assert_eq!(snapshot(&a), before);
        assert_invariants(&a);
    }

    #[test]
    fn one_byte_consumes_one_aligned_page() {
        let mut a = region::<8>(4);
        let addr = a.allocate(1).unwrap().unwrap();
        assert_invariants(&a);

        assert_eq!(addr, BASE);
        assert!(addr.is_aligned_to(PAGE_SIZE));

        let block = a.blocks().find(|b| b.start() == addr).unwrap();
        assert!(block.is_used());
        assert_eq!(block.size(), PAGE_SIZE);
    }

    #[test]
    fn odd_sizes_round_up_to_whole_pages() {
        let mut a = region::<8>(4);
        let addr = a.allocate(PAGE_SIZE + 1).unwrap().unwrap();
        assert_invariants(&a);

        let block = a.blocks().find(|b| b.start() == addr).unwrap();
        assert_eq!(block.size(), 2 * PAGE_SIZE);
        assert_eq!(a.stats().used_bytes, 2 * PAGE_SIZE);
    }

    #[test]
    fn split_appends_remainder_at_table_end() {
        let mut a = region::<8>(4);
        a.allocate(PAGE_SIZE).unwrap();
        assert_invariants(&a);

        let blocks = snapshot(&a);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].is_used());
        assert_eq!(blocks[0].size(), PAGE_SIZE);
        assert!(blocks[1].is_free());
        assert_eq!(blocks[1].start(), page(1));
        assert_eq!(blocks[1].size(), 3 * PAGE_SIZE);
    }

    #[test]
    fn exact_fit_does_not_split() {
        let mut a = region::<8>(4);
        let addr = a.allocate(4 * PAGE_SIZE).unwrap().unwrap();
        assert_invariants(&a);

        assert_eq!(addr, BASE);
        assert_eq!(a.block_count(), 1);
        assert!(a.blocks().next().unwrap().is_used());
    }

    #[test]
    fn first_fit_reuses_the_earliest_hole() {
        let mut a = region::<8>(4);
        let first = a.allocate(PAGE_SIZE).unwrap().unwrap();
        let _second = a.allocate(PAGE_SIZE).unwrap().unwrap();
        a.free(first).unwrap();
        assert_invariants(&a);

        let third = a.allocate(PAGE_SIZE).unwrap().unwrap();
        assert_eq!(third, first);
        assert_invariants(&a);
    }

    #[test]
    fn first_fit_follows_table_order_not_address_order() {
        let mut a = region::<8>(6);
        let a0 = a.allocate(2 * PAGE_SIZE).unwrap().unwrap();
        let _b = a.allocate(PAGE_SIZE).unwrap().unwrap();
        let _c = a.allocate(PAGE_SIZE).unwrap().unwrap();
        // table: [a0 used 2p][b used][c used][free 2p @ page 4]
        a.free(a0).unwrap();
        // splitting the front hole appends its remainder at the table end
        let d = a.allocate(PAGE_SIZE).unwrap().unwrap();
        assert_eq!(d, page(0));
        assert_invariants(&a);

        // two one-page-or-larger free blocks exist now: page 4 (2p, table
        // index 3) and page 1 (1p, appended last). Table order wins, so the
        // higher address is handed out first.
        let e = a.allocate(PAGE_SIZE).unwrap().unwrap();
        assert_eq!(e, page(4));
        assert_invariants(&a);
    }

    #[test]
    fn free_merges_with_address_successor() {
        let mut a = region::<8>(3);
        let first = a.allocate(PAGE_SIZE).unwrap().unwrap();
        let second = a.allocate(PAGE_SIZE).unwrap().unwrap();
        // table: [first used][second used][free @ page 2]

        a.free(second).unwrap();
        assert_invariants(&a);

        // second merged with the trailing free block
        let merged = a.blocks().find(|b| b.start() == second).unwrap();
        assert!(merged.is_free());
        assert_eq!(merged.size(), 2 * PAGE_SIZE);
        assert_eq!(a.block_count(), 2);

        let _ = first;
    }

    #[test]
    fn free_merges_with_address_predecessor() {
        let mut a = region::<8>(2);
        let first = a.allocate(PAGE_SIZE).unwrap().unwrap();
        let second = a.allocate(PAGE_SIZE).unwrap().unwrap();
        assert_eq!(a.block_count(), 2);

        a.free(first).unwrap();
        assert_invariants(&a);
        assert_eq!(a.block_count(), 2);

        // freeing the second block folds it into the free predecessor
        a.free(second).unwrap();
        assert_invariants(&a);
        assert_eq!(a.block_count(), 1);

        let block = a.blocks().next().unwrap();
        assert_eq!(block.start(), BASE);
        assert_eq!(block.size(), 2 * PAGE_SIZE);
        assert!(block.is_free());
    }

    #[test]
    fn free_merges_both_neighbors_at_once() {
        let mut a = region::<8>(4);
        let x = a.allocate(PAGE_SIZE).unwrap().unwrap();
        let y = a.allocate(PAGE_SIZE).unwrap().unwrap();
        let z = a.allocate(PAGE_SIZE).unwrap().unwrap();

        a.free(x).unwrap();
        assert_invariants(&a);
        a.free(z).unwrap(); // merges with the trailing free block
        assert_invariants(&a);
        assert_eq!(a.block_count(), 3);

        // y sits between two free blocks; freeing it collapses everything
        a.free(y).unwrap();
        assert_invariants(&a);
        assert_eq!(a.block_count(), 1);
        assert!(a.blocks().next().unwrap().is_free());
    }

    #[test]
    fn merge_works_when_table_order_diverges_from_address_order() {
        let mut a = region::<8>(6);
        let a0 = a.allocate(2 * PAGE_SIZE).unwrap().unwrap();
        let b = a.allocate(PAGE_SIZE).unwrap().unwrap();
        let _c = a.allocate(PAGE_SIZE).unwrap().unwrap();
        a.free(a0).unwrap();
        let d = a.allocate(PAGE_SIZE).unwrap().unwrap();
        // remainder of the front hole (page 1) now lives at the table end

        // freeing d must find that remainder by address, not position
        a.free(d).unwrap();
        assert_invariants(&a);
        let merged = a.blocks().find(|blk| blk.start() == page(0)).unwrap();
        assert!(merged.is_free());
        assert_eq!(merged.size(), 2 * PAGE_SIZE);

        let _ = b;
    }

    #[test]
    fn allocate_free_round_trip_restores_the_region() {
        let mut a = region::<8>(16);
        let addr = a.allocate(5 * PAGE_SIZE).unwrap().unwrap();
        a.free(addr).unwrap();
        assert_invariants(&a);

        assert_eq!(a.block_count(), 1);
        let block = a.blocks().next().unwrap();
        assert!(block.is_free());
        assert_eq!(block.start(), BASE);
        assert_eq!(block.size(), 16 * PAGE_SIZE);
    }

    #[test]
    fn exhaustion_reports_the_rounded_request() {
        let mut a = region::<8>(4);
        assert_eq!(
            a.allocate(5 * PAGE_SIZE),
            Err(OutOfMemory {
                requested: 5 * PAGE_SIZE
            })
        );
        // failed allocation must not disturb the table
        assert_invariants(&a);
        assert_eq!(a.block_count(), 1);

        // consume everything, then fail
        a.allocate(4 * PAGE_SIZE).unwrap();
        let err = a.allocate(1).unwrap_err();
        assert_eq!(err.requested, PAGE_SIZE);
        assert_invariants(&a);
    }

    #[test]
    fn smaller_requests_still_succeed_after_an_oversized_failure() {
        let mut a = region::<8>(4);
        a.allocate(3 * PAGE_SIZE).unwrap();
        assert!(a.allocate(2 * PAGE_SIZE).is_err());
        assert!(a.allocate(PAGE_SIZE).is_ok());
        assert_invariants(&a);
    }

    #[test]
    fn requests_too_large_to_round_are_rejected() {
        let mut a = region::<8>(4);
        let before = snapshot(&a);

        // no whole-page rounding exists for sizes in the top page of u64;
        // they must fail, not wrap around into a bogus tiny allocation
        assert_eq!(
            a.allocate(u64::MAX),
            Err(OutOfMemory {
                requested: u64::MAX
            })
        );
        // the largest size that still rounds is a page multiple already
        let boundary = u64::MAX - (PAGE_SIZE - 1);
        assert_eq!(
            a.allocate(boundary),
            Err(OutOfMemory {
                requested: boundary
            })
        );

        assert_eq!(snapshot(&a), before);
        assert_invariants(&a);

        // normal service continues, one distinct page per request
        let first = a.allocate(PAGE_SIZE).unwrap().unwrap();
        let second = a.allocate(PAGE_SIZE).unwrap().unwrap();
        assert_ne!(first, second);
        assert_invariants(&a);
    }

    #[test]
    fn full_table_hands_out_the_whole_block() {
        let mut a = region::<2>(4);
        let first = a.allocate(PAGE_SIZE).unwrap().unwrap();
        assert_eq!(a.block_count(), 2); // at capacity

        // a split would need a third slot, so the request gets all 3 pages
        let second = a.allocate(PAGE_SIZE).unwrap().unwrap();
        assert_invariants(&a);
        assert_eq!(second, page(1));
        let oversized = a.blocks().find(|b| b.start() == second).unwrap();
        assert!(oversized.is_used());
        assert_eq!(oversized.size(), 3 * PAGE_SIZE);
        assert_eq!(a.stats().free_bytes, 0);

        // the oversized block comes back in one piece and merges
        a.free(second).unwrap();
        a.free(first).unwrap();
        assert_invariants(&a);
        assert_eq!(a.block_count(), 1);
        assert_eq!(a.stats().free_bytes, 4 * PAGE_SIZE);
    }

    #[test]
    fn unknown_address_is_rejected_without_side_effects() {
        let mut a = region::<8>(4);
        a.allocate(PAGE_SIZE).unwrap();
        let before = snapshot(&a);

        // middle of a block
        let inside = PhysicalAddress::new(BASE.as_u64() + 17);
        assert_eq!(a.free(inside), Err(FreeError::UnknownAddress(inside)));
        // outside the region entirely
        let outside = PhysicalAddress::new(0x4000_0000);
        assert_eq!(a.free(outside), Err(FreeError::UnknownAddress(outside)));

        assert_eq!(snapshot(&a), before);
        assert_invariants(&a);
    }

    #[test]
    fn double_free_is_rejected_without_side_effects() {
        let mut a = region::<8>(4);
        let addr = a.allocate(PAGE_SIZE).unwrap().unwrap();
        a.free(addr).unwrap();
        let before = snapshot(&a);

        assert_eq!(a.free(addr), Err(FreeError::DoubleFree(addr)));
        assert_eq!(snapshot(&a), before);
        assert_invariants(&a);
    }

    #[test]
    fn stats_track_bytes_and_blocks() {
        let mut a = region::<8>(8);
        assert_eq!(
            a.stats(),
            RegionStats {
                free_bytes: 8 * PAGE_SIZE,
                used_bytes: 0,
                free_blocks: 1,
                used_blocks: 0,
            }
        );

        let addr = a.allocate(3 * PAGE_SIZE).unwrap().unwrap();
        assert_eq!(
            a.stats(),
            RegionStats {
                free_bytes: 5 * PAGE_SIZE,
                used_bytes: 3 * PAGE_SIZE,
                free_blocks: 1,
                used_blocks: 1,
            }
        );

        a.free(addr).unwrap();
        assert_eq!(a.stats().free_bytes, 8 * PAGE_SIZE);
        assert_eq!(a.stats().used_blocks, 0);
    }

    #[test]
    fn error_messages_name_the_offender() {
        let oom = OutOfMemory { requested: 4096 };
        assert_eq!(format!("{oom}"), "out of physical memory (4096 bytes requested)");

        let unknown = FreeError::UnknownAddress(PhysicalAddress::new(0x123000));
        assert_eq!(format!("{unknown}"), "no allocation starts at 0x00123000");

        let double = FreeError::DoubleFree(PhysicalAddress::new(0x123000));
        assert_eq!(format!("{double}"), "allocation at 0x00123000 was already freed");
    }
}
