//! The system-wide logger for ARMv7-A builds.
//!
//! The platform hands over whatever can print characters this early
//! (usually a UART it has already set up) as a [`core::fmt::Write`] sink,
//! and every record is written to it as `"{level} - {message}\r\n"`.
//!
//! IRQs are masked on the writing core while it holds the sink, and a record
//! logged by a core that is already in the middle of writing one (from a
//! fault handler, or from the sink itself) is dropped instead of deadlocking.

#![no_std]

use core::{
    fmt::Write,
    sync::atomic::{AtomicU32, Ordering},
};
use arm_regs::{hold_interrupts, RegisterPort};
use cpu::current_cpu;
use log::{LevelFilter, Log, Metadata, Record};
use spin::{Mutex, Once};


/// A character sink that can be shared by every core once it is installed.
pub type Sink = dyn Write + Send;

const NO_WRITER: u32 = u32::MAX;

/// This wraps the platform's character sink.
pub struct SinkLogger {
    port: &'static dyn RegisterPort,
    sink: Mutex<&'static mut Sink>,
    /// The core currently holding `sink`, or [`NO_WRITER`].
    writer: AtomicU32,
    level: LevelFilter,
}

impl SinkLogger {
    pub fn new(port: &'static dyn RegisterPort, sink: &'static mut Sink, level: LevelFilter) -> SinkLogger {
        SinkLogger { port, sink: Mutex::new(sink), writer: AtomicU32::new(NO_WRITER), level }
    }
}

impl Log for SinkLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let _held = hold_interrupts(self.port);
        let cpu = current_cpu(self.port).value();
        if self.writer.load(Ordering::Acquire) == cpu {
            return;
        }

        let mut sink = self.sink.lock();
        self.writer.store(cpu, Ordering::Relaxed);
        // result is discarded because we
        // have no alternative way to signal
        // an issue to the user
        let _ = write!(sink, "{} - {}\r\n", record.level(), record.args());
        self.writer.store(NO_WRITER, Ordering::Release);
    }

    fn flush(&self) {}
}

// Global logger Singleton
static LOGGER: Once<SinkLogger> = Once::new();

/// Initialize the internal global "LOGGER" singleton
/// and sets it as the system-wide logger for the `log` crate.
///
/// `port` is used to mask IRQs on the logging core while a record is written.
/// Records less severe than `level` are discarded.
/// The logger can only be installed once.
pub fn init(port: &'static dyn RegisterPort, sink: &'static mut Sink, level: LevelFilter) -> Result<(), &'static str> {
    let mut installed = false;
    let logger = LOGGER.call_once(|| {
        installed = true;
        SinkLogger::new(port, sink, level)
    });
    if !installed {
        return Err("logger_arm: logger was already initialized");
    }
    log::set_logger(logger).map_err(|_| "logger_arm: couldn't set logger")?;
    log::set_max_level(level);
    Ok(())
}
