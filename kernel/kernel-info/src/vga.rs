//! # VGA Text Mode Geometry

use kernel_addresses::PhysicalAddress;

/// Physical address of the VGA text-mode cell buffer.
pub const VGA_TEXT_BASE: PhysicalAddress = PhysicalAddress::new(0x000B_8000);

/// Visible columns in text mode 3.
pub const VGA_COLUMNS: usize = 80;

/// Visible rows in text mode 3.
pub const VGA_ROWS: usize = 25;

const _: () = {
    // Two bytes per cell; the whole frame must fit the legacy 32 KiB window.
    assert!(VGA_COLUMNS * VGA_ROWS * 2 <= 0x8000);
    assert!(VGA_TEXT_BASE.as_u64() + (VGA_COLUMNS * VGA_ROWS * 2) as u64 <= 0x000C_0000);
};
