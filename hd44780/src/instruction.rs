//! HD44780 instruction encoding.
//!
//! Every instruction is a single byte written with RS set to `0`. The highest set bit selects
//! the instruction, the bits below it are its parameters.

use crate::config::BusWidth;
use crate::{LcdError, LcdResult};

/// Clears the display and sets the cursor to the home position.
///
/// Instruction: `00000001`.
pub const CLEAR_DISPLAY: u8 = 0b00000001;

/// Sets the cursor to the home position and undoes any display shift.
///
/// Instruction: `0000001?`.
pub const RETURN_HOME: u8 = 0b00000010;

/// Busy flag, the most significant bit of the byte read with RS set to `0`.
pub const BUSY_FLAG: u8 = 0b10000000;

/// Address counter, the lower 7 bits of the byte read with RS set to `0`.
pub const ADDRESS_MASK: u8 = 0b01111111;

/// Number of bytes (pixel rows) of one CGRAM character.
pub const CGRAM_CHAR_SIZE: u8 = 8;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing/reading data.
    Left,
    /// Moves the cursor to the right after writing/reading data.
    Right,
}

/// Sets how the cursor moves after every data access.
///
/// Instruction: `000001IS`.
/// `I` is `1` for right cursor direction, `0` for left cursor direction.
/// `S` is `1` for display shift, `0` for no display shift.
pub fn entry_mode(cursor_direction: CursorDirection, shift: bool) -> u8 {
    let mut command = 0b00000100;
    if cursor_direction == CursorDirection::Right {
        command |= 0b00000010;
    }
    if shift {
        command |= 0b00000001;
    }
    command
}

/// Turns the display on or off, and controls the cursor and its blinking.
///
/// Instruction: `00001DCB`.
pub fn display_control(display_on: bool, cursor_on: bool, blink_on: bool) -> u8 {
    let mut command = 0b00001000;
    if display_on {
        command |= 0b00000100;
    }
    if cursor_on {
        command |= 0b00000010;
    }
    if blink_on {
        command |= 0b00000001;
    }
    command
}

/// Selects bus width, line mode and font.
///
/// Instruction: `001DNF??`.
/// `D` is `1` for the 8-bit bus, `0` for the 4-bit bus.
/// `N` is `1` for two (or four) line mode.
/// `F` is `1` for the 5x10 font, `0` for 5x8.
pub fn function_set(bus_width: BusWidth, two_lines: bool, font_5x10: bool) -> u8 {
    let mut command = 0b00100000;
    if bus_width.is_8bit() {
        command |= 0b00010000;
    }
    if two_lines {
        command |= 0b00001000;
    }
    if font_5x10 {
        command |= 0b00000100;
    }
    command
}

/// Points the address counter at CGRAM.
///
/// Instruction: `01AAAAAA`.
///
/// # Errors
/// - [LcdError::InvalidArgument] if the address does not fit in 6 bits.
pub fn set_cgram_address(address: u8) -> LcdResult<u8> {
    if address > 0b00111111 {
        return Err(LcdError::InvalidArgument);
    }
    Ok(0b01000000 | address)
}

/// Points the address counter at DDRAM.
///
/// Instruction: `1AAAAAAA`.
///
/// # Errors
/// - [LcdError::InvalidArgument] if the address does not fit in 7 bits.
pub fn set_ddram_address(address: u8) -> LcdResult<u8> {
    if address > ADDRESS_MASK {
        return Err(LcdError::InvalidArgument);
    }
    Ok(0b10000000 | address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_the_initialization_instructions() {
        assert_eq!(function_set(BusWidth::EightBit, false, false), 0x30);
        assert_eq!(function_set(BusWidth::FourBit, false, false), 0x20);
        assert_eq!(function_set(BusWidth::FourBit, true, false), 0x28);
        assert_eq!(function_set(BusWidth::EightBit, true, false), 0x38);
        assert_eq!(display_control(false, false, false), 0x08);
        assert_eq!(display_control(true, true, true), 0x0F);
        assert_eq!(entry_mode(CursorDirection::Right, false), 0x06);
    }

    #[test]
    fn addresses_are_range_checked() {
        assert_eq!(set_cgram_address(0x38), Ok(0x78));
        assert_eq!(set_cgram_address(0x40), Err(LcdError::InvalidArgument));
        assert_eq!(set_ddram_address(0x67), Ok(0xE7));
        assert_eq!(set_ddram_address(0x80), Err(LcdError::InvalidArgument));
    }
}
