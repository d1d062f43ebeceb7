//! # VGA Text-Mode Console
//!
//! Early boot output for the kernel: a cursor-tracking writer over the
//! legacy VGA text buffer at `0xB8000`, a process-wide console slot
//! behind a ticket lock, and a [`log`] backend that renders records onto
//! it.
//!
//! ## Overview
//!
//! The kernel has no display driver; it talks to the text-mode frame
//! buffer the BIOS leaves behind. [`TextBuffer`] owns that window and
//! implements [`core::fmt::Write`], so anything formattable can be
//! printed. One buffer is installed process-wide via [`install`] and
//! reached through [`with_console`]; [`ConsoleLogger`] plugs the same
//! path into the `log` crate so subsystems just use `log::info!` and
//! friends.
//!
//! Panic paths use [`emergency_console`] instead, which trades locking
//! for the guarantee of producing output.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod attribute;
mod global;
mod logger;
mod text_buffer;

pub use attribute::{Attribute, Color};
pub use global::{emergency_console, install, with_console};
pub use logger::ConsoleLogger;
pub use text_buffer::{CELL_COUNT, TextBuffer};
