//! # Kernel Entry Point
//!
//! The boot loader drops us at [`kernel_main`] in protected mode with a
//! valid stack, flat physical addressing, and the VGA text buffer
//! identity-mapped. Boot order: console, logger, memory management, idle.
//!
//! Hosted builds (anything but `target_os = "none"`) compile the same
//! code behind a stub `main`, which keeps the crate in the workspace
//! build and test matrix.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]
#![allow(unsafe_code)]

mod memory;

use kernel_console::{ConsoleLogger, TextBuffer};
use kernel_info::memory::PAGE_SIZE;
use log::{LevelFilter, debug, info};

/// Boot log verbosity: milestones in release, internals in debug builds.
const MAX_LOG_LEVEL: LevelFilter = if cfg!(debug_assertions) {
    LevelFilter::Debug
} else {
    LevelFilter::Info
};

/// The kernel entry point. Never returns.
#[unsafe(no_mangle)]
pub extern "C" fn kernel_main() -> ! {
    // SAFETY: Per the boot contract the VGA window is mapped and nothing
    // else writes to it.
    kernel_console::install(unsafe { TextBuffer::vga_text_mode() });
    // If a logger is somehow already set the kernel boots on, just mute.
    let _ = ConsoleLogger::new(MAX_LOG_LEVEL).init();

    info!(
        "{} {} initializing",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    memory::init();

    // One page out and back before anything depends on the allocator.
    // Exhaustion this early panics into the fatal halt path.
    if let Some(page) = memory::allocate(PAGE_SIZE) {
        debug!("allocation self-check got {page}");
        memory::free(page);
    }

    if let Some(stats) = memory::stats() {
        info!(
            "memory management initialized: {} bytes free in {} block(s)",
            stats.free_bytes, stats.free_blocks
        );
    }

    halt_loop()
}

/// Paints the fatal banner and stops the machine.
///
/// Runs with the console lock bypassed: whoever held it is never coming
/// back.
#[cfg(target_os = "none")]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    use core::fmt::Write as _;

    use kernel_console::{Attribute, Color};

    // SAFETY: Regular execution is over; nothing else touches the screen
    // after this point.
    let mut console = unsafe { kernel_console::emergency_console() };

    console.set_attribute(Attribute::new(Color::LightRed, Color::Black));
    let _ = console.write_str("\n[ERROR] ");
    console.set_attribute(Attribute::new(Color::White, Color::Black));
    let _ = writeln!(console, "{}", info.message());
    if let Some(location) = info.location() {
        let _ = writeln!(console, "  at {location}");
    }
    let _ = console.write_str("System halted.");

    halt_loop()
}

/// Parks the CPU for good.
fn halt_loop() -> ! {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    // SAFETY: Interrupts stay masked forever; there is nothing left to run.
    unsafe {
        core::arch::asm!("cli", options(nomem, nostack));
    }

    loop {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        // SAFETY: `hlt` waits for an interrupt that can no longer arrive.
        unsafe {
            core::arch::asm!("hlt", options(nomem, nostack, preserves_flags));
        }
        #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
        core::hint::spin_loop();
    }
}

/// The kernel only runs bare-metal; a hosted build stops here.
#[cfg(not(target_os = "none"))]
fn main() {}
