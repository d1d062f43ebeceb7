use core::fmt::Write as _;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::attribute::{Attribute, Color};
use crate::global::with_console;
use crate::text_buffer::TextBuffer;

/// A [`log`] backend that renders records onto the shared console.
///
/// Records appear as `[LEVEL] target: message`, with the level tag
/// highlighted for warnings and errors. Records arriving before a console
/// is installed are dropped.
pub struct ConsoleLogger {
    max_level: LevelFilter,
}

impl ConsoleLogger {
    #[must_use]
    pub const fn new(max_level: LevelFilter) -> Self {
        Self { max_level }
    }

    /// Call this once during early init.
    #[allow(
        static_mut_refs,
        clippy::missing_errors_doc,
        clippy::missing_panics_doc
    )]
    pub fn init(self) -> Result<(), SetLoggerError> {
        // log::set_logger expects &'static dyn Log; with no allocator the
        // logger has to live in a static.
        static mut LOGGER: Option<ConsoleLogger> = None;

        let max_level = self.max_level;
        unsafe {
            LOGGER = Some(self);
            log::set_logger(LOGGER.as_ref().unwrap())?;
        }
        log::set_max_level(max_level);
        Ok(())
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        with_console(|console| write_record(console, record));
    }

    fn flush(&self) {
        // cell writes are immediate
    }
}

/// Attribute for the `[LEVEL]` tag, where one applies.
const fn level_attribute(level: Level) -> Option<Attribute> {
    match level {
        Level::Error => Some(Attribute::new(Color::LightRed, Color::Black)),
        Level::Warn => Some(Attribute::new(Color::Yellow, Color::Black)),
        Level::Info | Level::Debug | Level::Trace => None,
    }
}

/// Renders one record as `[LEVEL] target: message\n`.
fn write_record(console: &mut TextBuffer, record: &Record) {
    let saved = console.attribute();
    if let Some(highlight) = level_attribute(record.level()) {
        console.set_attribute(highlight);
    }
    let _ = write!(console, "[{}] ", record.level());
    console.set_attribute(saved);
    let _ = writeln!(console, "{}: {}", record.target(), record.args());
}
