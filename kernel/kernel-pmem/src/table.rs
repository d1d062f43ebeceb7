use crate::block::MemoryBlock;

/// Appending to a full table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TableFull;

/// Fixed-capacity sequence of [`MemoryBlock`] records.
///
/// Storage is a plain array plus a fill count: no allocation, no pointer
/// chasing, and every mutation goes through checked operations so the fill
/// line can never silently pass `CAP`.
///
/// Order is meaningful to the caller (allocation scans it front to back)
/// and removal preserves it by shifting the tail down one slot.
pub(crate) struct RegionTable<const CAP: usize> {
    entries: [MemoryBlock; CAP],
    len: usize,
}

impl<const CAP: usize> RegionTable<CAP> {
    pub(crate) const fn new() -> Self {
        Self {
            entries: [MemoryBlock::EMPTY; CAP],
            len: 0,
        }
    }

    #[inline]
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) const fn is_full(&self) -> bool {
        self.len == CAP
    }

    /// Append `block`, or report that the table is out of slots.
    pub(crate) const fn push(&mut self, block: MemoryBlock) -> Result<(), TableFull> {
        if self.is_full() {
            return Err(TableFull);
        }
        self.entries[self.len] = block;
        self.len += 1;
        Ok(())
    }

    /// Remove the entry at `index`, shifting later entries down.
    ///
    /// Panics if `index` is past the fill line.
    pub(crate) fn remove(&mut self, index: usize) -> MemoryBlock {
        assert!(index < self.len, "region table index out of bounds");
        let removed = self.entries[index];
        self.entries.copy_within(index + 1..self.len, index);
        self.len -= 1;
        // keep the vacated slot inert
        self.entries[self.len] = MemoryBlock::EMPTY;
        removed
    }

    /// The occupied prefix of the table.
    #[inline]
    pub(crate) fn as_slice(&self) -> &[MemoryBlock] {
        &self.entries[..self.len]
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [MemoryBlock] {
        &mut self.entries[..self.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_addresses::PhysicalAddress;

    fn block(start: u64, size: u64) -> MemoryBlock {
        MemoryBlock::free(PhysicalAddress::new(start), size)
    }

    #[test]
    fn push_until_full() {
        let mut t = RegionTable::<3>::new();
        assert_eq!(t.len(), 0);

        for i in 0..3 {
            t.push(block(i * 4096, 4096)).unwrap();
        }
        assert!(t.is_full());
        assert_eq!(t.push(block(0x10_0000, 4096)), Err(TableFull));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn remove_preserves_order() {
        let mut t = RegionTable::<4>::new();
        for i in 0..4 {
            t.push(block(i * 4096, 4096)).unwrap();
        }

        let removed = t.remove(1);
        assert_eq!(removed.start().as_u64(), 4096);
        let starts: Vec<u64> = t.as_slice().iter().map(|b| b.start().as_u64()).collect();
        assert_eq!(starts, [0, 2 * 4096, 3 * 4096]);

        // freed capacity is usable again
        t.push(block(0x20_0000, 4096)).unwrap();
        assert!(t.is_full());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn remove_past_fill_line_panics() {
        let mut t = RegionTable::<2>::new();
        t.push(block(0, 4096)).unwrap();
        let _ = t.remove(1);
    }
}
