//! [Hd44780Hardware] implementation on top of the Linux GPIO character device, using the gpiod
//! library.
//!
//! Control lines are requested as outputs on [Hd44780Hardware::init_common]. The data lines are
//! requested whenever their direction changes, releasing the previous request first.

use crate::config::BusWidth;
use crate::{BusDirection, ControlPin, Hd44780Hardware, LcdError, LcdResult, PinState};
use bitvec::prelude::*;
use log::{debug, trace};
use std::fmt::{Debug, Formatter};
use std::thread;
use std::time::Duration;

/// Line offsets of the data bus.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DataPins {
    /// D4 ... D7.
    FourBit([u32; 4]),
    /// D0 ... D7.
    EightBit([u32; 8]),
}

impl DataPins {
    pub fn bus_width(&self) -> BusWidth {
        match self {
            DataPins::FourBit(_) => BusWidth::FourBit,
            DataPins::EightBit(_) => BusWidth::EightBit,
        }
    }

    pub fn offsets(&self) -> &[u32] {
        match self {
            DataPins::FourBit(offsets) => offsets,
            DataPins::EightBit(offsets) => offsets,
        }
    }

    /// Bit of the bus byte driven by the first line.
    fn first_bit(&self) -> usize {
        match self {
            DataPins::FourBit(_) => 4,
            DataPins::EightBit(_) => 0,
        }
    }
}

/// Line offsets of the display on one GPIO chip.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GpiodPins {
    pub rs: u32,
    pub rw: u32,
    pub e: u32,
    pub data: DataPins,
}

impl GpiodPins {
    fn all(&self) -> impl Iterator<Item = u32> + '_ {
        [self.rs, self.rw, self.e]
            .into_iter()
            .chain(self.data.offsets().iter().copied())
    }

    /// Checks that every offset exists on a chip with `line_count` lines and is used only once.
    ///
    /// # Errors
    /// - [LcdError::InvalidArgument] otherwise.
    pub fn validate(&self, line_count: usize) -> LcdResult<()> {
        let mut used = BitVec::<u8>::repeat(false, line_count);
        for offset in self.all() {
            let index = offset as usize;
            if index >= line_count || used[index] {
                return Err(LcdError::InvalidArgument);
            }
            used.set(index, true);
        }
        Ok(())
    }
}

/// Spreads a bus byte over line levels, starting at bit `first_bit`.
fn to_levels<const N: usize>(value: u8, first_bit: usize) -> [bool; N] {
    let bits = value.view_bits::<Lsb0>();
    let mut levels = [false; N];
    for (i, level) in levels.iter_mut().enumerate() {
        *level = bits[first_bit + i];
    }
    levels
}

/// Collects line levels into a bus byte, starting at bit `first_bit`. Other bits stay low.
fn from_levels(levels: &[bool], first_bit: usize) -> u8 {
    let mut value = 0u8;
    let bits = value.view_bits_mut::<Lsb0>();
    for (i, &level) in levels.iter().enumerate() {
        bits.set(first_bit + i, level);
    }
    value
}

struct ControlLines {
    rs: gpiod::Lines<gpiod::Output>,
    rw: gpiod::Lines<gpiod::Output>,
    e: gpiod::Lines<gpiod::Output>,
}

enum DataLines {
    Released,
    Input(gpiod::Lines<gpiod::Input>),
    Output(gpiod::Lines<gpiod::Output>),
}

pub struct GpiodHardware {
    chip: gpiod::Chip,
    pins: GpiodPins,
    control: Option<ControlLines>,
    data: DataLines,
}

impl GpiodHardware {
    /// Wraps an opened chip. No lines are requested until the display is initialized.
    ///
    /// # Errors
    /// - [LcdError::InvalidArgument] if the pins don't exist on the chip or are used twice.
    pub fn new(chip: gpiod::Chip, pins: GpiodPins) -> LcdResult<Self> {
        pins.validate(chip.num_lines() as usize)?;
        Ok(Self {
            chip,
            pins,
            control: None,
            data: DataLines::Released,
        })
    }

    /// Opens the chip at `path` (for example `/dev/gpiochip0`).
    pub fn open(path: impl AsRef<std::path::Path>, pins: GpiodPins) -> LcdResult<Self> {
        Self::new(gpiod::Chip::new(path.as_ref())?, pins)
    }

    pub fn bus_width(&self) -> BusWidth {
        self.pins.data.bus_width()
    }

    fn request_output(&self, offsets: &[u32]) -> LcdResult<gpiod::Lines<gpiod::Output>> {
        Ok(self.chip.request_lines(
            gpiod::Options::output(offsets.to_vec()).consumer(env!("CARGO_PKG_NAME")),
        )?)
    }

    fn request_input(&self, offsets: &[u32]) -> LcdResult<gpiod::Lines<gpiod::Input>> {
        Ok(self.chip.request_lines(
            gpiod::Options::input(offsets.to_vec()).consumer(env!("CARGO_PKG_NAME")),
        )?)
    }
}

impl Debug for GpiodHardware {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodHardware({}, {:?})", self.chip.name(), self.pins)
    }
}

impl Hd44780Hardware for GpiodHardware {
    fn init_common(&mut self) -> LcdResult<()> {
        if self.control.is_none() {
            debug!("Requesting control lines {:?}", self.pins);
            self.control = Some(ControlLines {
                rs: self.request_output(&[self.pins.rs])?,
                rw: self.request_output(&[self.pins.rw])?,
                e: self.request_output(&[self.pins.e])?,
            });
        }
        Ok(())
    }

    fn set_bus_direction(&mut self, direction: BusDirection) -> LcdResult<()> {
        match (&self.data, direction) {
            (DataLines::Input(_), BusDirection::In) | (DataLines::Output(_), BusDirection::Out) => {
                return Ok(());
            }
            _ => {}
        }

        trace!("Switching data lines to {:?}", direction);
        // The kernel refuses to hand out lines that are still requested
        self.data = DataLines::Released;
        let offsets = self.pins.data.offsets();
        self.data = match direction {
            BusDirection::In => DataLines::Input(self.request_input(offsets)?),
            BusDirection::Out => DataLines::Output(self.request_output(offsets)?),
        };
        Ok(())
    }

    fn set_control_pin(&mut self, pin: ControlPin, state: PinState) -> LcdResult<()> {
        let control = self
            .control
            .as_ref()
            .ok_or_else(|| LcdError::Other("control lines not initialized".to_string()))?;
        let line = match pin {
            ControlPin::Rs => &control.rs,
            ControlPin::Rw => &control.rw,
            ControlPin::E => &control.e,
        };
        line.set_values([bool::from(state)])?;
        Ok(())
    }

    fn read_bus(&mut self) -> LcdResult<u8> {
        let DataLines::Input(lines) = &self.data else {
            return Err(LcdError::Other("data lines are not inputs".to_string()));
        };
        let first_bit = self.pins.data.first_bit();
        let value = match self.pins.data {
            DataPins::FourBit(_) => from_levels(&lines.get_values([false; 4])?, first_bit),
            DataPins::EightBit(_) => from_levels(&lines.get_values([false; 8])?, first_bit),
        };
        Ok(value)
    }

    fn write_bus(&mut self, value: u8) -> LcdResult<()> {
        let DataLines::Output(lines) = &self.data else {
            return Err(LcdError::Other("data lines are not outputs".to_string()));
        };
        let first_bit = self.pins.data.first_bit();
        match self.pins.data {
            DataPins::FourBit(_) => lines.set_values(to_levels::<4>(value, first_bit))?,
            DataPins::EightBit(_) => lines.set_values(to_levels::<8>(value, first_bit))?,
        }
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) -> LcdResult<()> {
        thread::sleep(Duration::from_millis(ms as u64));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pins(data: DataPins) -> GpiodPins {
        GpiodPins {
            rs: 7,
            rw: 8,
            e: 25,
            data,
        }
    }

    #[test]
    fn four_bit_bus_uses_the_upper_nibble() {
        assert_eq!(to_levels::<4>(0b1010_0101, 4), [false, true, false, true]);
        assert_eq!(from_levels(&[true, false, false, true], 4), 0b1001_0000);
    }

    #[test]
    fn eight_bit_bus_starts_at_d0() {
        assert_eq!(
            to_levels::<8>(0b1000_0001, 0),
            [true, false, false, false, false, false, false, true]
        );
        assert_eq!(
            from_levels(&[false, true, false, false, false, false, true, false], 0),
            0b0100_0010
        );
    }

    #[test]
    fn pins_must_exist_and_be_unique() {
        let four = pins(DataPins::FourBit([23, 24, 11, 9]));
        assert_eq!(four.validate(54), Ok(()));
        assert_eq!(four.validate(20), Err(LcdError::InvalidArgument));

        let shared = pins(DataPins::FourBit([23, 24, 7, 9]));
        assert_eq!(shared.validate(54), Err(LcdError::InvalidArgument));
    }

    #[test]
    fn data_pins_report_their_width() {
        assert_eq!(
            DataPins::EightBit([0, 1, 2, 3, 4, 5, 6, 9]).bus_width(),
            BusWidth::EightBit
        );
        assert_eq!(DataPins::FourBit([0, 1, 2, 3]).bus_width(), BusWidth::FourBit);
    }

    #[test]
    fn open_accepts_any_path_type() {
        let pins = pins(DataPins::FourBit([23, 24, 11, 9]));
        assert!(GpiodHardware::open("/nonexistent/gpiochip99", pins).is_err());
        assert!(
            GpiodHardware::open(std::path::PathBuf::from("/nonexistent/gpiochip99"), pins).is_err()
        );
    }
}
