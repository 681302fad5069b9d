//! The HD44780 driver: framing, initialization and the high level operations.
//!
//! Every instruction and data write is *framed*: the driver first waits for the busy flag to
//! clear through its [BusyWait] strategy, and only then sets RS and transmits. A timeout aborts
//! the operation in progress before anything is transmitted, and the remaining steps of a
//! multi-step operation are skipped. The driver never retries, that is up to the caller.

use crate::busy::{BusyWait, PollingBusyWait};
use crate::config::{BusWidth, LcdConfig};
use crate::glyph::GlyphMap;
use crate::instruction::{self, ADDRESS_MASK, BUSY_FLAG, CGRAM_CHAR_SIZE, CursorDirection};
use crate::transport::Transport;
use crate::utf8::{Decoder, Symbol};
use crate::{Hd44780Hardware, LcdError, LcdResult, PinState};
use log::{debug, trace, warn};
use std::fmt::{self, Debug, Formatter};

/// Cursor appearance. The display is always on while the cursor is configured.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum CursorMode {
    #[default]
    Off,
    /// Steady underline cursor.
    On,
    /// Blinking block cursor.
    Blink,
}

impl TryFrom<u8> for CursorMode {
    type Error = LcdError;

    fn try_from(value: u8) -> LcdResult<Self> {
        match value {
            0 => Ok(CursorMode::Off),
            1 => Ok(CursorMode::On),
            2 => Ok(CursorMode::Blink),
            _ => Err(LcdError::InvalidArgument),
        }
    }
}

pub struct Hd44780Driver<'a> {
    transport: Transport<'a>,
    busy_wait: Box<dyn BusyWait + 'a>,
    config: &'a LcdConfig,
}

impl<'a> Hd44780Driver<'a> {
    /// Creates a driver for the display described by `config`, waiting on the busy flag with
    /// a [PollingBusyWait] built from the configured timing.
    ///
    /// Nothing is sent to the display until [Self::init] is called.
    pub fn new(hardware: &'a mut dyn Hd44780Hardware, config: &'a LcdConfig) -> Self {
        Hd44780Driver {
            transport: Transport::new(hardware, config.bus_width()),
            busy_wait: Box::new(PollingBusyWait::from(config.timing())),
            config,
        }
    }

    /// Replaces the busy flag wait strategy.
    pub fn with_busy_wait(mut self, busy_wait: impl BusyWait + 'a) -> Self {
        self.busy_wait = Box::new(busy_wait);
        self
    }

    pub fn config(&self) -> &LcdConfig {
        self.config
    }

    fn wait_ready(&mut self) -> LcdResult<()> {
        self.busy_wait.wait_for_busy_clear(&mut self.transport)
    }

    /// Waits for the display and writes an instruction (RS = 0).
    pub fn send_instruction(&mut self, instruction: u8) -> LcdResult<()> {
        self.wait_ready()?;
        trace!("Instruction: {:08b}", instruction);
        self.transport.select_register(PinState::Low)?;
        self.transport.write_byte(instruction)
    }

    /// Waits for the display and writes a data byte (RS = 1) at the address counter.
    pub fn send_data(&mut self, data: u8) -> LcdResult<()> {
        self.wait_ready()?;
        trace!("Data: {:08b}", data);
        self.transport.select_register(PinState::High)?;
        self.transport.write_byte(data)
    }

    /// Reads the busy flag (bit 7) and the address counter (bits 0 ... 6).
    pub fn read_address(&mut self) -> LcdResult<u8> {
        self.transport.read_address()
    }

    /// Reads the byte at the address counter.
    pub fn read_data(&mut self) -> LcdResult<u8> {
        self.transport.read_data()
    }

    /// Checks whether the display is still processing the previous instruction.
    ///
    /// Meant for custom [BusyWait] strategies and diagnostics.
    pub fn is_busy(&mut self) -> LcdResult<bool> {
        Ok(self.read_address()? & BUSY_FLAG != 0)
    }

    /// Brings the display from any state into the configured mode: display on, cursor off,
    /// empty, cursor at the home position, and the glyph map uploaded to CGRAM.
    ///
    /// The synchronization sequence works regardless of the previous state, so calling this
    /// again on an initialized display is safe and yields the same end state. This is also
    /// the only way to turn the display back on after [Self::display_off].
    ///
    /// Wait at least 15 ms after power on before calling this.
    ///
    /// # Errors
    /// - [LcdError::Timeout] if the display stays busy, remaining steps are skipped.
    /// - [LcdError::CustomCharsInvalid] if the glyph map has more than 8 entries. The display
    ///   is initialized, but none of the glyphs are uploaded.
    pub fn init(&mut self) -> LcdResult<()> {
        let timing = self.config.timing();
        let bus_width = self.transport.bus_width();
        debug!("Initializing HD44780 on a {:?} bus", bus_width);

        self.transport.hardware().init_common()?;
        self.transport.select_register(PinState::Low)?;

        // Synchronize. The busy flag can't be checked until the bus width is known.
        let sync = instruction::function_set(BusWidth::EightBit, false, false);
        self.transport.write_operation(sync)?;
        self.transport.delay_ms(timing.init_long_delay_ms)?;
        for _ in 0..2 {
            self.transport.write_operation(sync)?;
            self.transport.delay_ms(timing.init_short_delay_ms)?;
        }

        match bus_width {
            BusWidth::EightBit => {
                self.transport
                    .write_operation(instruction::function_set(BusWidth::EightBit, true, false))?;
            }
            BusWidth::FourBit => {
                self.transport
                    .write_operation(instruction::function_set(BusWidth::FourBit, false, false))?;
                self.transport.delay_ms(timing.init_short_delay_ms)?;
                self.send_instruction(instruction::function_set(BusWidth::FourBit, true, false))?;
            }
        }

        self.display_off()?;
        self.clear()?;
        self.send_instruction(instruction::entry_mode(CursorDirection::Right, false))?;
        self.cursor_cfg(CursorMode::Off)?;
        self.upload_custom_chars()?;

        debug!("HD44780 initialized");
        Ok(())
    }

    fn upload_custom_chars(&mut self) -> LcdResult<()> {
        let config = self.config;
        let glyphs = config.glyphs();
        if !glyphs.fits() {
            warn!(
                "{} custom characters configured, only {} fit",
                glyphs.len(),
                GlyphMap::CAPACITY
            );
            return Err(LcdError::CustomCharsInvalid);
        }

        for (index, glyph) in glyphs.iter().enumerate() {
            debug!("Uploading {:?} to CGRAM slot {}", glyph.code(), index);
            self.def_char(index as u8, glyph.bitmap())?;
        }

        // Point the address counter back at DDRAM, so text doesn't end up in CGRAM
        if !glyphs.is_empty() {
            self.set_ddram_address(0)?;
        }
        Ok(())
    }

    /// Clears the whole display and moves the cursor home.
    pub fn clear(&mut self) -> LcdResult<()> {
        self.send_instruction(instruction::CLEAR_DISPLAY)
    }

    /// Moves the cursor home without clearing the display.
    pub fn return_home(&mut self) -> LcdResult<()> {
        self.send_instruction(instruction::RETURN_HOME)
    }

    /// Turns the display off. Use [Self::init] to turn it on again.
    pub fn display_off(&mut self) -> LcdResult<()> {
        self.send_instruction(instruction::display_control(false, false, false))
    }

    /// Turns the display on with the given cursor.
    pub fn cursor_cfg(&mut self, mode: CursorMode) -> LcdResult<()> {
        let command = match mode {
            CursorMode::Off => instruction::display_control(true, false, false),
            CursorMode::On => instruction::display_control(true, true, false),
            CursorMode::Blink => instruction::display_control(true, true, true),
        };
        self.send_instruction(command)
    }

    fn set_ddram_address(&mut self, address: u8) -> LcdResult<()> {
        self.send_instruction(instruction::set_ddram_address(address)?)
    }

    /// Moves the cursor to the given row (0 is the top) and column (0 is the leftmost).
    ///
    /// # Errors
    /// - [LcdError::InvalidArgument] if the position lies outside of the configured geometry.
    ///   Nothing is sent to the display in that case.
    pub fn set_pos(&mut self, row: u8, column: u8) -> LcdResult<()> {
        let address = self.config.geometry().ddram_address(row, column)?;
        self.set_ddram_address(address)
    }

    /// Defines the custom character in CGRAM slot `index` (`0..8`).
    ///
    /// Leaves the address counter in CGRAM; call [Self::set_pos] before writing text again.
    ///
    /// # Errors
    /// - [LcdError::InvalidArgument] if `index` is not a valid slot, without touching the display.
    pub fn def_char(&mut self, index: u8, pattern: &[u8; 8]) -> LcdResult<()> {
        if index as usize >= GlyphMap::CAPACITY {
            return Err(LcdError::InvalidArgument);
        }
        self.send_instruction(instruction::set_cgram_address(index * CGRAM_CHAR_SIZE)?)?;
        for &row in pattern {
            self.send_data(row)?;
        }
        Ok(())
    }

    /// Shows the custom character of CGRAM slot `index` (`0..8`) at the cursor.
    ///
    /// # Errors
    /// - [LcdError::InvalidArgument] if `index` is not a valid slot, without touching the display.
    pub fn disp_char(&mut self, index: u8) -> LcdResult<()> {
        if index as usize >= GlyphMap::CAPACITY {
            return Err(LcdError::InvalidArgument);
        }
        self.send_data(index)
    }

    /// Writes text starting at the cursor. See [Self::write_bytes].
    pub fn write_text(&mut self, text: &str) -> LcdResult<()> {
        self.write_bytes(text.as_bytes())
    }

    /// Writes UTF-8 encoded text starting at the cursor, stopping at the end of the slice or
    /// at the first NUL byte.
    ///
    /// Single byte characters are written as they are. Longer ones are looked up in the glyph
    /// map and shown with their custom character. The cursor doesn't wrap to the next row on
    /// its own; where it continues depends on how the module maps DDRAM to rows.
    ///
    /// Characters written before an error stay on the display.
    ///
    /// # Errors
    /// - [LcdError::CharacterNotFound] if a character is missing from the glyph map.
    /// - [LcdError::InvalidArgument] if the text holds a malformed or truncated sequence.
    /// - [LcdError::Timeout] if the display stays busy.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> LcdResult<()> {
        for symbol in Decoder::new(bytes) {
            match symbol.inspect_err(|_| warn!("Malformed UTF-8 in {:02X?}", bytes))? {
                Symbol::Ascii(byte) => self.send_data(byte)?,
                Symbol::Scalar(code) => self.write_custom_char(code)?,
            }
        }
        Ok(())
    }

    fn write_custom_char(&mut self, code: u32) -> LcdResult<()> {
        let index = self
            .config
            .glyphs()
            .find_by_code(code)
            .inspect_err(|_| warn!("No custom character for U+{:04X}", code))?;

        // There's no instruction for moving the cursor by one, so remember where the
        // character goes and put the cursor right after it.
        self.wait_ready()?;
        let address = self.transport.read_address()? & ADDRESS_MASK;
        self.disp_char(index)?;
        self.set_ddram_address((address + 1) & ADDRESS_MASK)
    }
}

impl Debug for Hd44780Driver<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hd44780Driver")
            .field("transport", &self.transport)
            .field("busy_wait", &self.busy_wait)
            .field("geometry", &self.config.geometry())
            .finish()
    }
}

impl fmt::Write for Hd44780Driver<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_text(s).map_err(|_| fmt::Error)
    }
}
