use kernel_sync::TicketLock;

use crate::text_buffer::TextBuffer;

/// The shared boot console, once one has been installed.
static CONSOLE: TicketLock<Option<TextBuffer>> = TicketLock::new(None);

/// Installs `buffer` as the shared console and clears its screen.
///
/// The first installation wins and returns `true`; a later call leaves
/// the existing console in place, drops `buffer`, and returns `false`.
pub fn install(mut buffer: TextBuffer) -> bool {
    CONSOLE.with_lock(|slot| {
        if slot.is_some() {
            return false;
        }
        buffer.clear();
        *slot = Some(buffer);
        true
    })
}

/// Runs `f` against the shared console.
///
/// Returns `None` when no console has been installed yet. The console
/// lock is held for the duration of `f`, so keep the closure short and
/// never log from inside it.
pub fn with_console<R>(f: impl FnOnce(&mut TextBuffer) -> R) -> Option<R> {
    CONSOLE.with_lock(|slot| slot.as_mut().map(f))
}

/// A console for panic paths, bypassing the shared lock.
///
/// # Safety
///
/// This aliases whatever [`TextBuffer`] is installed in the shared
/// console, so it must only be called once no other code will touch the
/// screen again, i.e. from a panic handler that never returns.
#[must_use]
pub unsafe fn emergency_console() -> TextBuffer {
    // SAFETY: The caller guarantees all regular console users are dead,
    // making us the sole writer to the VGA window.
    unsafe { TextBuffer::vga_text_mode() }
}
