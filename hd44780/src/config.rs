//! Display description supplied by the caller: bus width, geometry, timing and glyph map.

use crate::glyph::{GlyphMap, GlyphMapping};
use crate::{LcdError, LcdResult};

/// Width of the parallel data bus.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum BusWidth {
    /// D4 ... D7 are connected, every byte is sent as two nibbles.
    #[default]
    FourBit,
    /// D0 ... D7 are connected.
    EightBit,
}

impl BusWidth {
    pub fn is_8bit(&self) -> bool {
        matches!(self, BusWidth::EightBit)
    }

    pub fn is_4bit(&self) -> bool {
        matches!(self, BusWidth::FourBit)
    }
}

/// Number of lines and characters per line of the display.
///
/// Lines start at the fixed DDRAM offsets `0x00`, `0x40`, `columns` and `0x40 + columns`,
/// which is how 1, 2 and 4 line modules wire their rows to the controller.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Geometry {
    lines: u8,
    columns: u8,
}

impl Geometry {
    /// Largest number of characters a single DDRAM line can hold.
    pub const MAX_COLUMNS: u8 = 40;
    /// Lines 3 and 4 live in the second half of lines 1 and 2.
    pub const MAX_COLUMNS_4_LINES: u8 = 20;

    /// Creates a new geometry.
    ///
    /// # Errors
    /// - [LcdError::InvalidArgument] if `lines` is not within `1..=4`, `columns` is not within
    ///   `1..=40`, or a 3 or 4 line display is wider than 20 columns.
    pub fn new(lines: u8, columns: u8) -> LcdResult<Self> {
        if !(1..=4).contains(&lines) || !(1..=Self::MAX_COLUMNS).contains(&columns) {
            return Err(LcdError::InvalidArgument);
        }
        if lines > 2 && columns > Self::MAX_COLUMNS_4_LINES {
            return Err(LcdError::InvalidArgument);
        }
        Ok(Self { lines, columns })
    }

    pub fn lines(&self) -> u8 {
        self.lines
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    /// Translates a row and column into a DDRAM address.
    ///
    /// # Errors
    /// - [LcdError::InvalidArgument] if the position lies outside of the display.
    pub fn ddram_address(&self, row: u8, column: u8) -> LcdResult<u8> {
        if row >= self.lines || column >= self.columns {
            return Err(LcdError::InvalidArgument);
        }
        let row_offset = match row {
            0 => 0x00,
            1 => 0x40,
            2 => self.columns,
            3 => 0x40 + self.columns,
            _ => return Err(LcdError::InvalidArgument),
        };
        Ok(row_offset + column)
    }
}

impl Default for Geometry {
    /// The common 2x16 module.
    fn default() -> Self {
        Geometry {
            lines: 2,
            columns: 16,
        }
    }
}

/// Delays and busy flag limits, all in milliseconds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Timing {
    /// Ceiling for waiting on the busy flag.
    pub busy_timeout_ms: u32,
    /// Sleep between two busy flag polls.
    pub busy_tick_ms: u32,
    /// Delay after the first synchronization pattern. The chip needs at least 4.1 ms.
    pub init_long_delay_ms: u32,
    /// Delay after the following synchronization patterns. The chip needs at least 100 us.
    pub init_short_delay_ms: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            busy_timeout_ms: 100,
            busy_tick_ms: 1,
            init_long_delay_ms: 50,
            init_short_delay_ms: 10,
        }
    }
}

/// Everything the driver needs to know about a display.
///
/// Owned by the caller and borrowed by the driver.
#[derive(Clone, Debug, Default)]
pub struct LcdConfig {
    bus_width: BusWidth,
    geometry: Geometry,
    timing: Timing,
    glyphs: GlyphMap,
}

impl LcdConfig {
    pub fn new(bus_width: BusWidth, geometry: Geometry) -> Self {
        Self {
            bus_width,
            geometry,
            timing: Timing::default(),
            glyphs: GlyphMap::default(),
        }
    }

    /// Sets the custom glyph map. Its length is checked during initialization.
    pub fn with_glyphs(mut self, glyphs: impl IntoIterator<Item = GlyphMapping>) -> Self {
        self.glyphs = glyphs.into_iter().collect();
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn bus_width(&self) -> BusWidth {
        self.bus_width
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn glyphs(&self) -> &GlyphMap {
        &self.glyphs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_rejects_unsupported_shapes() {
        assert_eq!(Geometry::new(0, 16), Err(LcdError::InvalidArgument));
        assert_eq!(Geometry::new(5, 16), Err(LcdError::InvalidArgument));
        assert_eq!(Geometry::new(2, 0), Err(LcdError::InvalidArgument));
        assert_eq!(Geometry::new(2, 41), Err(LcdError::InvalidArgument));
        assert_eq!(Geometry::new(4, 40), Err(LcdError::InvalidArgument));
        assert!(Geometry::new(1, 8).is_ok());
        assert!(Geometry::new(2, 40).is_ok());
        assert!(Geometry::new(4, 20).is_ok());
    }

    #[test]
    fn four_line_addresses_follow_the_fixed_table() {
        let geometry = Geometry::new(4, 20).unwrap();
        assert_eq!(geometry.ddram_address(0, 0), Ok(0x00));
        assert_eq!(geometry.ddram_address(1, 0), Ok(0x40));
        assert_eq!(geometry.ddram_address(2, 0), Ok(0x14));
        assert_eq!(geometry.ddram_address(3, 19), Ok(0x67));
    }

    #[test]
    fn every_address_in_range_fits_seven_bits() {
        for (lines, columns) in [(1, 40), (2, 40), (3, 20), (4, 20), (4, 16)] {
            let geometry = Geometry::new(lines, columns).unwrap();
            for row in 0..lines {
                for column in 0..columns {
                    let address = geometry.ddram_address(row, column).unwrap();
                    assert!(address <= 0x7F, "{lines}x{columns} ({row}, {column}) -> {address:#x}");
                }
            }
        }
    }

    #[test]
    fn out_of_range_positions_are_rejected() {
        let geometry = Geometry::new(2, 16).unwrap();
        assert_eq!(geometry.ddram_address(2, 0), Err(LcdError::InvalidArgument));
        assert_eq!(geometry.ddram_address(0, 16), Err(LcdError::InvalidArgument));
    }
}
