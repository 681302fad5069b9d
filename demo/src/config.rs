use charlcd_hd44780::{BusWidth, Geometry, GlyphMapping, LcdConfig, Timing};
use dotenv::var;
use eyre::eyre;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// JSON description of the attached display.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    /// 4 or 8.
    pub bus_width: u8,
    pub lines: u8,
    pub columns: u8,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub glyphs: Vec<GlyphConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub busy_timeout_ms: u32,
    pub busy_tick_ms: u32,
    pub init_long_delay_ms: u32,
    pub init_short_delay_ms: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GlyphConfig {
    pub code: char,
    pub bitmap: [u8; 8],
}

fn config_path() -> PathBuf {
    var("CHARLCD_CONFIG")
        .unwrap_or_else(|_| "lcd.json".to_string())
        .into()
}

impl DisplayConfig {
    /// Loads the description from `CHARLCD_CONFIG` (`lcd.json` by default).
    ///
    /// Returns `None` if the file doesn't exist. A file that exists but doesn't parse is an
    /// error, so it never gets overwritten by the default.
    pub fn try_load() -> eyre::Result<Option<Self>> {
        let config_path = config_path();
        if !config_path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(&config_path)?;
        let reader = std::io::BufReader::new(file);
        Ok(Some(serde_json::from_reader(reader)?))
    }

    pub fn save(&self) -> eyre::Result<()> {
        let file = std::fs::File::create(config_path())?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn bus_width(&self) -> eyre::Result<BusWidth> {
        match self.bus_width {
            4 => Ok(BusWidth::FourBit),
            8 => Ok(BusWidth::EightBit),
            other => Err(eyre!("Unsupported bus width: {}", other)),
        }
    }

    pub fn to_lcd_config(&self) -> eyre::Result<LcdConfig> {
        let geometry = Geometry::new(self.lines, self.columns)
            .map_err(|_| eyre!("Unsupported geometry: {}x{}", self.lines, self.columns))?;
        Ok(LcdConfig::new(self.bus_width()?, geometry)
            .with_timing(self.timing.into())
            .with_glyphs(
                self.glyphs
                    .iter()
                    .map(|glyph| GlyphMapping::new(glyph.code, glyph.bitmap)),
            ))
    }
}

impl Default for DisplayConfig {
    /// A 4x20 module on a 4-bit bus, with a few accented and pictographic characters.
    fn default() -> Self {
        DisplayConfig {
            bus_width: 4,
            lines: 4,
            columns: 20,
            timing: TimingConfig::default(),
            glyphs: vec![
                GlyphConfig {
                    code: 'è',
                    bitmap: [0b01000, 0b00100, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110, 0b00000],
                },
                GlyphConfig {
                    code: '↑',
                    bitmap: [0b00000, 0b00100, 0b01110, 0b10101, 0b00100, 0b00100, 0b00100, 0b00000],
                },
                GlyphConfig {
                    code: '🍌',
                    bitmap: [0b01000, 0b00110, 0b00011, 0b00011, 0b00011, 0b00110, 0b01100, 0b10000],
                },
            ],
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Timing::default().into()
    }
}

impl From<Timing> for TimingConfig {
    fn from(timing: Timing) -> Self {
        TimingConfig {
            busy_timeout_ms: timing.busy_timeout_ms,
            busy_tick_ms: timing.busy_tick_ms,
            init_long_delay_ms: timing.init_long_delay_ms,
            init_short_delay_ms: timing.init_short_delay_ms,
        }
    }
}

impl From<TimingConfig> for Timing {
    fn from(timing: TimingConfig) -> Self {
        Timing {
            busy_timeout_ms: timing.busy_timeout_ms,
            busy_tick_ms: timing.busy_tick_ms,
            init_long_delay_ms: timing.init_long_delay_ms,
            init_short_delay_ms: timing.init_short_delay_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_description_uses_default_timing() {
        let config: DisplayConfig =
            serde_json::from_str(r#"{ "bus_width": 8, "lines": 2, "columns": 16 }"#).unwrap();
        assert!(config.glyphs.is_empty());
        assert_eq!(config.timing, TimingConfig::default());

        let lcd_config = config.to_lcd_config().unwrap();
        assert_eq!(lcd_config.bus_width(), BusWidth::EightBit);
        assert_eq!(lcd_config.geometry().columns(), 16);
        assert_eq!(lcd_config.timing().busy_timeout_ms, 100);
    }

    #[test]
    fn partial_timing_keeps_the_other_defaults() {
        let config: DisplayConfig = serde_json::from_str(
            r#"{ "bus_width": 4, "lines": 4, "columns": 20, "timing": { "busy_tick_ms": 5 } }"#,
        )
        .unwrap();
        let timing = Timing::from(config.timing);
        assert_eq!(timing.busy_tick_ms, 5);
        assert_eq!(timing.busy_timeout_ms, 100);
        assert_eq!(timing.init_long_delay_ms, 50);
    }

    #[test]
    fn glyphs_are_read_in_order() {
        let config: DisplayConfig = serde_json::from_str(
            r#"{
                "bus_width": 4, "lines": 2, "columns": 16,
                "glyphs": [
                    { "code": "↑", "bitmap": [0, 4, 14, 21, 4, 4, 4, 0] },
                    { "code": "è", "bitmap": [8, 4, 14, 17, 31, 16, 14, 0] }
                ]
            }"#,
        )
        .unwrap();
        let lcd_config = config.to_lcd_config().unwrap();
        assert_eq!(lcd_config.glyphs().find_by_code('è' as u32), Ok(1));
        assert_eq!(lcd_config.glyphs().iter().next().unwrap().bitmap()[3], 21);
    }

    #[test]
    fn default_survives_serialization() {
        let json = serde_json::to_string(&DisplayConfig::default()).unwrap();
        let config: DisplayConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, DisplayConfig::default());
        assert_eq!(config.to_lcd_config().unwrap().glyphs().len(), 3);
    }

    #[test]
    fn unsupported_shapes_are_rejected() {
        let mut config = DisplayConfig::default();
        config.bus_width = 6;
        assert!(config.to_lcd_config().is_err());

        let mut config = DisplayConfig::default();
        config.columns = 40;
        assert!(config.to_lcd_config().is_err());
    }
}
