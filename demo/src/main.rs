mod config;

use crate::config::DisplayConfig;
use charlcd_hd44780::gpiod::{DataPins, GpiodHardware, GpiodPins};
use charlcd_hd44780::mock::MockHardware;
use charlcd_hd44780::{CursorMode, Hd44780Driver, Hd44780Hardware, LcdConfig};
use dotenv::{dotenv, var};
use log::{debug, info, warn};
use std::str::FromStr;

const LINES: [&str; 4] = [
    "Bonjour collègues 🍌",
    "dependency free,",
    "utf8 ready, failsafe",
    "HD44780 driver ↑",
];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Backend {
    /// Linux GPIO character device.
    Gpiod,
    /// Records the bus traffic instead of driving a display.
    Mock,
}

impl FromStr for Backend {
    type Err = eyre::Report;

    fn from_str(s: &str) -> eyre::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gpiod" => Ok(Backend::Gpiod),
            "mock" => Ok(Backend::Mock),
            other => Err(eyre::eyre!("Unknown backend: {}", other)),
        }
    }
}

fn parse_pin_bus(pin_str: &str) -> eyre::Result<DataPins> {
    let pins = pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<u32>, _>>()?;
    let invalid = |pins: Vec<u32>| eyre::eyre!("Invalid number of data pins: {}", pins.len());
    match pins.len() {
        4 => Ok(DataPins::FourBit(pins.try_into().map_err(invalid)?)),
        _ => Ok(DataPins::EightBit(pins.try_into().map_err(invalid)?)),
    }
}

fn load_display_config() -> eyre::Result<DisplayConfig> {
    debug!("Trying to load display config...");
    Ok(match DisplayConfig::try_load()? {
        Some(config) => {
            info!("Display config loaded.");
            config
        }
        None => {
            info!("Display config not found. Using default");
            let config = DisplayConfig::default();
            config.save()?;
            info!("Default display config saved.");
            config
        }
    })
}

fn gpiod_hardware(config: &LcdConfig) -> eyre::Result<GpiodHardware> {
    let chip = var("CHARLCD_GPIO_CHIP").unwrap_or_else(|_| "/dev/gpiochip0".to_string());
    let pins = GpiodPins {
        rs: var("CHARLCD_PIN_RS")?.parse()?,
        rw: var("CHARLCD_PIN_RW")?.parse()?,
        e: var("CHARLCD_PIN_E")?.parse()?,
        data: parse_pin_bus(&var("CHARLCD_PINS_DATA")?)?,
    };

    info!(
        "LCD @ {} E: {}, RW: {}, RS: {}, Data: {:?}",
        chip,
        pins.e,
        pins.rw,
        pins.rs,
        pins.data.offsets()
    );

    if pins.data.bus_width() != config.bus_width() {
        return Err(eyre::eyre!(
            "{} data pins given for a {:?} bus",
            pins.data.offsets().len(),
            config.bus_width()
        ));
    }

    Ok(GpiodHardware::open(chip, pins)?)
}

/// Initializes the display and fills it with text, ending with a blinking cursor.
fn showcase(hardware: &mut dyn Hd44780Hardware, config: &LcdConfig) -> eyre::Result<()> {
    let geometry = config.geometry();
    let mut lcd = Hd44780Driver::new(hardware, config);

    lcd.init()?;
    // Initializing an initialized display is fine
    lcd.init()?;
    debug!("{:?} initialized.", lcd);

    lcd.clear()?;
    for (row, text) in LINES.iter().enumerate().take(geometry.lines() as usize) {
        lcd.set_pos(row as u8, 0)?;
        lcd.write_text(text)?;
    }

    lcd.set_pos(geometry.lines() - 1, (geometry.columns() - 1).min(17))?;
    lcd.cursor_cfg(CursorMode::Blink)?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    // Variables may also come from the real environment
    dotenv().ok();
    pretty_env_logger::init();

    info!("charlcd demo starting...");

    let display = load_display_config()?;
    let config = display.to_lcd_config()?;
    let backend: Backend = var("CHARLCD_BACKEND")
        .unwrap_or_else(|_| "mock".to_string())
        .parse()?;

    info!(
        "{:?} backend, {}x{} display, {} custom characters",
        backend,
        config.geometry().lines(),
        config.geometry().columns(),
        config.glyphs().len()
    );

    match backend {
        Backend::Gpiod => {
            let mut hardware = gpiod_hardware(&config)?;
            showcase(&mut hardware, &config)?;
        }
        Backend::Mock => {
            let mut hardware = MockHardware::new(config.bus_width());
            showcase(&mut hardware, &config)?;
            for transaction in hardware.transactions() {
                debug!("{:?}", transaction);
            }
            info!("{} bus events recorded.", hardware.events().len());
            warn!("Nothing was sent to a real display. Set CHARLCD_BACKEND=gpiod to drive one.");
        }
    }

    info!("Done.");
    Ok(())
}
