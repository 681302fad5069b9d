//! A recording fake of the hardware.
//!
//! [MockHardware] never fails. It logs every callback as a [BusEvent], so tests (and dry runs
//! of the demo) can inspect the exact pulse trace the driver produced. Reads return scripted
//! bytes from a queue, or an idle byte once the queue is empty. Scripted bytes are split into
//! two pulses on a 4-bit bus, like a real display would send them.

use crate::config::BusWidth;
use crate::{BusDirection, ControlPin, Hd44780Hardware, LcdResult, PinState};
use std::collections::VecDeque;

/// Garbage placed in the undefined lower nibble of 4-bit reads.
const FLOATING_NIBBLE: u8 = 0b1010;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BusEvent {
    InitCommon,
    Direction(BusDirection),
    Pin(ControlPin, PinState),
    /// Value put on the bus.
    Write(u8),
    /// Value sampled from the bus.
    Read(u8),
    Delay(u32),
}

/// One bus pulse, labelled with the register it addressed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Transaction {
    /// Read with RS low: busy flag and address counter.
    AddressRead(u8),
    /// Read with RS high.
    DataRead(u8),
    Instruction(u8),
    Data(u8),
}

#[derive(Debug)]
pub struct MockHardware {
    bus_width: BusWidth,
    events: Vec<BusEvent>,
    reads: VecDeque<u8>,
    pending_low_nibble: Option<u8>,
    idle_read: u8,
}

impl MockHardware {
    /// Creates a mock whose idle reads report a ready display at address `0`.
    pub fn new(bus_width: BusWidth) -> Self {
        MockHardware {
            bus_width,
            events: Vec::new(),
            reads: VecDeque::new(),
            pending_low_nibble: None,
            idle_read: 0x00,
        }
    }

    /// Sets the byte returned once the read queue is empty.
    ///
    /// An idle byte with bit 7 set makes the display look permanently busy.
    pub fn with_idle_read(mut self, value: u8) -> Self {
        self.idle_read = value;
        self
    }

    pub fn set_idle_read(&mut self, value: u8) {
        self.idle_read = value;
    }

    /// Queues one logical byte to be returned by upcoming reads.
    pub fn push_read(&mut self, value: u8) {
        self.reads.push_back(value);
    }

    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Every pulse that wrote to the bus, with the RS level it was written with.
    pub fn writes(&self) -> Vec<(PinState, u8)> {
        let mut rs = PinState::Low;
        let mut writes = Vec::new();
        for event in &self.events {
            match *event {
                BusEvent::Pin(ControlPin::Rs, state) => rs = state,
                BusEvent::Write(value) => writes.push((rs, value)),
                _ => {}
            }
        }
        writes
    }

    /// Every read and write pulse in order, labelled by the RS level at the time.
    ///
    /// Pulses are not joined, so on a 4-bit bus each logical byte shows up twice.
    pub fn transactions(&self) -> Vec<Transaction> {
        let mut rs = PinState::Low;
        let mut transactions = Vec::new();
        for event in &self.events {
            let transaction = match (*event, rs) {
                (BusEvent::Pin(ControlPin::Rs, state), _) => {
                    rs = state;
                    continue;
                }
                (BusEvent::Read(value), PinState::Low) => Transaction::AddressRead(value),
                (BusEvent::Read(value), PinState::High) => Transaction::DataRead(value),
                (BusEvent::Write(value), PinState::Low) => Transaction::Instruction(value),
                (BusEvent::Write(value), PinState::High) => Transaction::Data(value),
                _ => continue,
            };
            transactions.push(transaction);
        }
        transactions
    }

    /// Logical bytes written with RS high.
    ///
    /// On a 4-bit bus the nibble pulses are joined back into bytes.
    pub fn data_bytes(&self) -> Vec<u8> {
        self.bytes_written(PinState::High)
    }

    /// Logical bytes written with RS low.
    ///
    /// On a 4-bit bus the nibble pulses are joined back into bytes, which only lines up when
    /// the trace holds no lone nibbles of the initialization sequence. Clear the events
    /// after [crate::Hd44780Driver::init] before relying on it.
    pub fn instruction_bytes(&self) -> Vec<u8> {
        self.bytes_written(PinState::Low)
    }

    fn bytes_written(&self, rs: PinState) -> Vec<u8> {
        let pulses: Vec<u8> = self
            .writes()
            .into_iter()
            .filter(|&(state, _)| state == rs)
            .map(|(_, value)| value)
            .collect();
        match self.bus_width {
            BusWidth::EightBit => pulses,
            BusWidth::FourBit => pulses
                .chunks(2)
                .map(|pair| (pair[0] & 0xF0) | (pair.get(1).copied().unwrap_or(0) >> 4))
                .collect(),
        }
    }

    /// Number of pulses that sampled the bus.
    pub fn read_pulses(&self) -> usize {
        self.count(|event| matches!(event, BusEvent::Read(_)))
    }

    /// Number of logical bytes read with RS low (busy flag and address reads).
    pub fn address_reads(&self) -> usize {
        let mut rs = PinState::Low;
        let mut pulses = 0;
        for event in &self.events {
            match *event {
                BusEvent::Pin(ControlPin::Rs, state) => rs = state,
                BusEvent::Read(_) if rs == PinState::Low => pulses += 1,
                _ => {}
            }
        }
        match self.bus_width {
            BusWidth::EightBit => pulses,
            BusWidth::FourBit => pulses / 2,
        }
    }

    pub fn delays(&self) -> Vec<u32> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                BusEvent::Delay(ms) => Some(ms),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&BusEvent) -> bool) -> usize {
        self.events.iter().filter(|event| predicate(event)).count()
    }
}

impl Hd44780Hardware for MockHardware {
    fn init_common(&mut self) -> LcdResult<()> {
        self.events.push(BusEvent::InitCommon);
        Ok(())
    }

    fn set_bus_direction(&mut self, direction: BusDirection) -> LcdResult<()> {
        self.events.push(BusEvent::Direction(direction));
        Ok(())
    }

    fn set_control_pin(&mut self, pin: ControlPin, state: PinState) -> LcdResult<()> {
        self.events.push(BusEvent::Pin(pin, state));
        Ok(())
    }

    fn read_bus(&mut self) -> LcdResult<u8> {
        let value = match self.bus_width {
            BusWidth::EightBit => self.reads.pop_front().unwrap_or(self.idle_read),
            BusWidth::FourBit => match self.pending_low_nibble.take() {
                Some(low_nibble) => (low_nibble << 4) | FLOATING_NIBBLE,
                None => {
                    let byte = self.reads.pop_front().unwrap_or(self.idle_read);
                    self.pending_low_nibble = Some(byte & 0x0F);
                    (byte & 0xF0) | FLOATING_NIBBLE
                }
            },
        };
        self.events.push(BusEvent::Read(value));
        Ok(value)
    }

    fn write_bus(&mut self, value: u8) -> LcdResult<()> {
        self.events.push(BusEvent::Write(value));
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) -> LcdResult<()> {
        self.events.push(BusEvent::Delay(ms));
        Ok(())
    }
}
