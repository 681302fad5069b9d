//! Platform independent driver for HD44780 character LCD controllers.
//!
//! The driver never touches GPIO registers itself. Instead, it talks to the display through
//! the [Hd44780Hardware] capability contract, which is implemented once per platform (see
//! [gpiod::GpiodHardware] for Linux GPIO character devices and [mock::MockHardware] for a
//! recording fake used in tests).
//!
//! See [driver::Hd44780Driver] for the public operations.

pub mod busy;
pub mod config;
pub mod driver;
pub mod glyph;
pub mod gpiod;
pub mod instruction;
pub mod mock;
pub mod transport;
pub mod utf8;

use std::fmt::Debug;
use thiserror::Error;

pub use busy::{BusyProbe, BusyWait, PollingBusyWait};
pub use config::{BusWidth, Geometry, LcdConfig, Timing};
pub use driver::{CursorMode, Hd44780Driver};
pub use glyph::{GlyphMap, GlyphMapping};

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    #[error("invalid argument")]
    InvalidArgument,
    #[error("timed out waiting for the busy flag to clear")]
    Timeout,
    #[error("custom character map is invalid (more than 8 entries)")]
    CustomCharsInvalid,
    #[error("character U+{0:04X} not found in the custom character map")]
    CharacterNotFound(u32),
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for LcdError {
    fn from(err: std::io::Error) -> Self {
        LcdError::Io(err.kind())
    }
}

pub type LcdResult<T> = Result<T, LcdError>;

/// Direction of the data bus lines (D0 ... D7, or D4 ... D7 in 4-bit mode).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BusDirection {
    /// Data lines are high impedance inputs, the display drives them.
    In,
    /// Data lines are push-pull outputs, the host drives them.
    Out,
}

/// One of the three control lines of the display.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ControlPin {
    /// Register select: low selects the instruction register, high the data register.
    Rs,
    /// Read/write: low writes to the display, high reads from it.
    Rw,
    /// Enable: data is latched on the falling edge.
    E,
}

/// Logic level of a control line.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum PinState {
    #[default]
    Low,
    High,
}

impl From<bool> for PinState {
    fn from(value: bool) -> Self {
        if value { PinState::High } else { PinState::Low }
    }
}

impl From<PinState> for bool {
    fn from(state: PinState) -> Self {
        state == PinState::High
    }
}

/// The hardware capabilities the driver needs from its environment.
///
/// Implementations are owned by the caller and borrowed by [driver::Hd44780Driver] for its
/// whole lifetime. None of the methods are expected to fail on a healthy platform, but real
/// backends may report IO errors, which the driver propagates unchanged.
pub trait Hd44780Hardware: Debug {
    /// One-time setup of the three control lines as outputs.
    ///
    /// Invoked at the start of every initialization.
    fn init_common(&mut self) -> LcdResult<()>;

    /// Configures the data lines for reading or writing.
    fn set_bus_direction(&mut self, direction: BusDirection) -> LcdResult<()>;

    /// Drives one of the control lines.
    fn set_control_pin(&mut self, pin: ControlPin, state: PinState) -> LcdResult<()>;

    /// Samples the data lines into a byte, D0 at the least significant bit.
    ///
    /// On a 4-bit bus, D4 ... D7 land on bits 4 ... 7 and the lower nibble is undefined.
    fn read_bus(&mut self) -> LcdResult<u8>;

    /// Drives the data lines from a byte, D0 at the least significant bit.
    ///
    /// On a 4-bit bus, bits 4 ... 7 drive D4 ... D7 and the lower nibble is ignored.
    fn write_bus(&mut self, value: u8) -> LcdResult<()>;

    /// Blocks for the given amount of milliseconds.
    ///
    /// Environments with a scheduler should yield here instead of spinning.
    fn delay_ms(&mut self, ms: u32) -> LcdResult<()>;
}
