//! Bounded UTF-8 decoding for text rendering.
//!
//! Input may be NUL terminated; decoding stops at the first NUL byte or at the end of the
//! slice, whichever comes first. A multi-byte sequence is never read past either of them.

use crate::{LcdError, LcdResult};

/// One decoded character.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Symbol {
    /// A single byte character, written to the display as is.
    Ascii(u8),
    /// The scalar value of a 2, 3 or 4 byte sequence.
    Scalar(u32),
}

/// Iterator over the [Symbol]s of a byte sequence.
///
/// Yields [LcdError::InvalidArgument] once for a malformed or truncated sequence and then
/// stops.
#[derive(Clone, Debug)]
pub struct Decoder<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Decoder { bytes, position: 0 }
    }

    /// Offset of the next undecoded byte.
    pub fn position(&self) -> usize {
        self.position
    }

    fn fail(&mut self) -> LcdResult<Symbol> {
        self.position = self.bytes.len();
        Err(LcdError::InvalidArgument)
    }
}

impl Iterator for Decoder<'_> {
    type Item = LcdResult<Symbol>;

    fn next(&mut self) -> Option<Self::Item> {
        let lead = *self.bytes.get(self.position)?;
        if lead == 0 {
            self.position = self.bytes.len();
            return None;
        }

        // Sequence length and payload bits of the lead byte
        let (len, mut code) = match lead {
            0x00..=0x7F => {
                self.position += 1;
                return Some(Ok(Symbol::Ascii(lead)));
            }
            0xC0..=0xDF => (2, (lead & 0x1F) as u32),
            0xE0..=0xEF => (3, (lead & 0x0F) as u32),
            0xF0..=0xF7 => (4, (lead & 0x07) as u32),
            _ => return Some(self.fail()),
        };

        for offset in 1..len {
            match self.bytes.get(self.position + offset) {
                Some(&byte) if byte & 0xC0 == 0x80 => code = (code << 6) | (byte & 0x3F) as u32,
                _ => return Some(self.fail()),
            }
        }

        self.position += len;
        Some(Ok(Symbol::Scalar(code)))
    }
}
