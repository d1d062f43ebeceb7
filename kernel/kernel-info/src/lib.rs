//! # Kernel Configuration
//!
//! The authoritative source for the kernel's compile-time configuration:
//! the physical memory layout managed by the allocator and the geometry of
//! the VGA text console.
//!
//! Centralizing these values in one dependency-free spot keeps the
//! allocator, the console, and the boot path in agreement and lets invalid
//! configurations fail at compile time instead of at boot.
//!
//! ## Physical Memory Layout
//!
//! ```text
//! 0x0000_0000 ┌─────────────────────────────────┐
//!             │     Low memory (< 1 MiB)        │
//!             │  (BIOS, VGA text buffer,        │
//!             │   boot page directory)          │
//! REGION_BASE ├─────────────────────────────────┤ 0x0010_0000 (1 MiB)
//!             │       Allocatable RAM           │
//!             │   (managed by kernel-pmem)      │
//! REGION_END  ├─────────────────────────────────┤ 0x0100_0000 (16 MiB)
//!             │          Unmanaged              │
//!             └─────────────────────────────────┘
//! ```
//!
//! All layout values are `const`; there is no runtime configuration.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod memory;
pub mod vga;
