//! Boot memory management.
//!
//! Owns the two fixed structures the boot contract places in low memory:
//! the declared-but-never-installed page directory at `0x9C000`, zeroed
//! here, and the physical region allocator seeded over
//! `[REGION_BASE, REGION_END)`.

use core::sync::atomic::{AtomicBool, Ordering};

use kernel_addresses::PhysicalAddress;
use kernel_info::memory::{MAX_REGIONS, PAGE_DIRECTORY_BASE, REGION_BASE, REGION_END};
use kernel_paging::PageDirectory;
use kernel_pmem::{RegionAllocator, RegionStats};
use kernel_sync::TicketLock;
use log::{debug, warn};

/// The shared physical allocator; [`init`] seeds it exactly once.
static PHYS: TicketLock<Option<RegionAllocator<MAX_REGIONS>>> = TicketLock::new(None);

/// One-time initialization flag.
static DID_INIT: AtomicBool = AtomicBool::new(false);

/// Brings up boot memory management.
///
/// Zeroes the boot page directory and seeds the allocator with the
/// managed region. Only the first call does anything; a repeat is
/// refused with a warning instead of wiping live allocation state.
pub fn init() {
    if DID_INIT.swap(true, Ordering::AcqRel) {
        warn!("memory::init called again; keeping the live allocator");
        return;
    }

    // SAFETY: The boot contract reserves identity-mapped RAM for the page
    // directory at 0x9C000, below everything the allocator hands out.
    unsafe {
        (PAGE_DIRECTORY_BASE.as_u64() as usize as *mut PageDirectory)
            .write_volatile(PageDirectory::EMPTY);
    }
    debug!("page directory zeroed at {PAGE_DIRECTORY_BASE}");

    PHYS.with_lock(|slot| *slot = Some(RegionAllocator::new(REGION_BASE, REGION_END)));
    debug!("physical allocator manages {REGION_BASE}..{REGION_END}");
}

/// Allocates `size` bytes of physical memory, rounded up to whole pages.
///
/// `Some` carries the page-aligned block start; `None` is the zero-size
/// "nothing allocated" outcome. Running out of physical memory during
/// boot is unrecoverable, so exhaustion panics into the fatal halt path
/// instead of returning.
pub fn allocate(size: u64) -> Option<PhysicalAddress> {
    let outcome = PHYS.with_lock(|slot| slot.as_mut().map(|phys| phys.allocate(size)));
    match outcome {
        Some(Ok(address)) => address,
        Some(Err(error)) => panic!("{error}"),
        None => panic!("memory::allocate called before memory::init"),
    }
}

/// Returns an allocation to the pool.
///
/// A rejected free (an address the allocator never handed out, or one
/// handed back twice) is logged and dropped; allocator state stays
/// intact.
pub fn free(address: PhysicalAddress) {
    let outcome = PHYS.with_lock(|slot| slot.as_mut().map(|phys| phys.free(address)));
    match outcome {
        Some(Ok(())) => {}
        Some(Err(error)) => warn!("free({address}) rejected: {error}"),
        None => warn!("memory::free called before memory::init"),
    }
}

/// Allocator statistics, once [`init`] has run.
pub fn stats() -> Option<RegionStats> {
    PHYS.with_lock(|slot| slot.as_ref().map(RegionAllocator::stats))
}
