//! User defined characters.
//!
//! The controller has room for 8 custom 5x8 characters in CGRAM. A [GlyphMap] assigns each
//! of them to a Unicode scalar, so text containing that scalar is rendered with the custom
//! character in its slot. The slot of a mapping is its position in the map.

use crate::{LcdError, LcdResult};

/// A Unicode scalar and the 8 pixel rows that render it. Only the lower 5 bits of each row
/// are shown.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct GlyphMapping {
    code: char,
    bitmap: [u8; 8],
}

impl GlyphMapping {
    pub fn new(code: char, bitmap: [u8; 8]) -> Self {
        Self { code, bitmap }
    }

    pub fn code(&self) -> char {
        self.code
    }

    pub fn bitmap(&self) -> &[u8; 8] {
        &self.bitmap
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GlyphMap {
    glyphs: Vec<GlyphMapping>,
}

impl GlyphMap {
    /// Number of CGRAM slots.
    pub const CAPACITY: usize = 8;

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Whether every mapping fits into a CGRAM slot.
    pub fn fits(&self) -> bool {
        self.glyphs.len() <= Self::CAPACITY
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlyphMapping> {
        self.glyphs.iter()
    }

    /// Finds the slot of `code`. The first matching mapping wins.
    ///
    /// # Errors
    /// - [LcdError::CharacterNotFound] if no mapping has this code.
    pub fn find_by_code(&self, code: u32) -> LcdResult<u8> {
        self.glyphs
            .iter()
            .position(|glyph| glyph.code as u32 == code)
            .map(|index| index as u8)
            .ok_or(LcdError::CharacterNotFound(code))
    }
}

impl FromIterator<GlyphMapping> for GlyphMap {
    fn from_iter<T: IntoIterator<Item = GlyphMapping>>(iter: T) -> Self {
        GlyphMap {
            glyphs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARROW: [u8; 8] = [0, 4, 14, 21, 4, 4, 4, 0];

    #[test]
    fn first_match_wins() {
        let map: GlyphMap = [
            GlyphMapping::new('è', [0; 8]),
            GlyphMapping::new('↑', ARROW),
            GlyphMapping::new('↑', [0x1F; 8]),
        ]
        .into_iter()
        .collect();
        assert_eq!(map.find_by_code('è' as u32), Ok(0));
        assert_eq!(map.find_by_code('↑' as u32), Ok(1));
    }

    #[test]
    fn missing_code_is_reported() {
        let map: GlyphMap = [GlyphMapping::new('↑', ARROW)].into_iter().collect();
        assert_eq!(
            map.find_by_code('🍌' as u32),
            Err(LcdError::CharacterNotFound(0x1F34C))
        );
    }

    #[test]
    fn capacity_is_eight() {
        let eight: GlyphMap = (0..8)
            .map(|i| GlyphMapping::new(char::from(b'a' + i), ARROW))
            .collect();
        assert!(eight.fits());
        let nine: GlyphMap = (0..9)
            .map(|i| GlyphMapping::new(char::from(b'a' + i), ARROW))
            .collect();
        assert!(!nine.fits());
    }
}
