//! Bus transport: moves single bytes between the host and the display over a 4-bit or 8-bit
//! parallel bus, toggling the RW and E control lines along the way.
//!
//! Nothing here waits for the busy flag. That is the job of the framing layer in
//! [crate::driver].

use crate::busy::BusyProbe;
use crate::config::BusWidth;
use crate::instruction::BUSY_FLAG;
use crate::{BusDirection, ControlPin, Hd44780Hardware, LcdResult, PinState};
use log::trace;

#[derive(Debug)]
pub struct Transport<'a> {
    hardware: &'a mut dyn Hd44780Hardware,
    bus_width: BusWidth,
}

impl<'a> Transport<'a> {
    pub fn new(hardware: &'a mut dyn Hd44780Hardware, bus_width: BusWidth) -> Self {
        Transport {
            hardware,
            bus_width,
        }
    }

    pub fn bus_width(&self) -> BusWidth {
        self.bus_width
    }

    pub fn hardware(&mut self) -> &mut dyn Hd44780Hardware {
        &mut *self.hardware
    }

    fn config_bus_as_input(&mut self) -> LcdResult<()> {
        self.hardware.set_bus_direction(BusDirection::In)?;
        self.hardware.set_control_pin(ControlPin::Rw, PinState::High)
    }

    fn config_bus_as_output(&mut self) -> LcdResult<()> {
        self.hardware.set_control_pin(ControlPin::Rw, PinState::Low)?;
        self.hardware.set_bus_direction(BusDirection::Out)
    }

    fn read_operation(&mut self) -> LcdResult<u8> {
        self.hardware.set_control_pin(ControlPin::E, PinState::High)?;
        let data = self.hardware.read_bus()?;
        self.hardware.set_control_pin(ControlPin::E, PinState::Low)?;
        Ok(data)
    }

    /// Sets the register select line: `Low` for instructions, `High` for data.
    pub fn select_register(&mut self, rs: PinState) -> LcdResult<()> {
        self.hardware.set_control_pin(ControlPin::Rs, rs)
    }

    /// Puts `value` on the bus and pulses E once, regardless of the bus width.
    ///
    /// Used on its own only by the initialization sequence, where the display still listens
    /// to the upper nibble alone.
    pub fn write_operation(&mut self, value: u8) -> LcdResult<()> {
        trace!("Pulsing: {:08b}", value);
        self.config_bus_as_output()?;
        self.hardware.set_control_pin(ControlPin::E, PinState::High)?;
        self.hardware.write_bus(value)?;
        self.hardware.set_control_pin(ControlPin::E, PinState::Low)
    }

    /// Writes one logical byte: a single pulse on the 8-bit bus, or the high nibble followed by
    /// the low nibble on the 4-bit bus.
    pub fn write_byte(&mut self, value: u8) -> LcdResult<()> {
        trace!("Sending byte: {:08b}, width: {:?}", value, self.bus_width);
        match self.bus_width {
            BusWidth::EightBit => self.write_operation(value),
            BusWidth::FourBit => {
                self.write_operation(value)?;
                self.write_operation(value << 4)
            }
        }
    }

    /// Reads one logical byte with the current register selection.
    pub fn read_byte(&mut self) -> LcdResult<u8> {
        self.config_bus_as_input()?;
        let data = match self.bus_width {
            BusWidth::EightBit => self.read_operation()?,
            BusWidth::FourBit => {
                let high_nibble = self.read_operation()? & 0xF0;
                let low_nibble = self.read_operation()? >> 4;
                high_nibble | low_nibble
            }
        };
        trace!("Read byte: {:08b}", data);
        Ok(data)
    }

    /// Reads the busy flag (bit 7) and address counter (bits 0 ... 6).
    pub fn read_address(&mut self) -> LcdResult<u8> {
        self.select_register(PinState::Low)?;
        self.read_byte()
    }

    /// Reads the byte at the address counter from DDRAM or CGRAM.
    pub fn read_data(&mut self) -> LcdResult<u8> {
        self.select_register(PinState::High)?;
        self.read_byte()
    }

    pub fn delay_ms(&mut self, ms: u32) -> LcdResult<()> {
        self.hardware.delay_ms(ms)
    }
}

impl BusyProbe for Transport<'_> {
    fn is_busy(&mut self) -> LcdResult<bool> {
        Ok(self.read_address()? & BUSY_FLAG != 0)
    }

    fn delay_ms(&mut self, ms: u32) -> LcdResult<()> {
        self.hardware.delay_ms(ms)
    }
}
