use std::str::FromStr;
use thiserror::Error;
use ts206_gpio::lcd::ht1621::driver::RAM_ADDRESS_LIMIT;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
    #[error("DATA, RW and CS must be different pins, got {0}, {1}, {2}")]
    SharedPin(usize, usize, usize),
}

/// Which GPIO backend drives the pins.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Backend {
    /// Memory-mapped registers through `/dev/gpiomem`.
    Raw,
    /// The GPIO character device.
    Gpiod,
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Backend::Raw),
            "gpiod" => Ok(Backend::Gpiod),
            _ => Err(()),
        }
    }
}

/// Demo configuration, read from `TS206_*` environment variables (and `.env`).
///
/// Pin numbers are BCM line numbers. The defaults match wiringPi pins 0, 1 and 2.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub backend: Backend,
    pub chip: String,
    pub pin_data: usize,
    pub pin_rw: usize,
    pub pin_cs: usize,
    pub places: u8,
    pub interactive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: Backend::Raw,
            chip: "/dev/gpiochip0".to_string(),
            pin_data: 17,
            pin_rw: 18,
            pin_cs: 27,
            places: 12,
            interactive: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| dotenv::var(key).ok())
    }

    /// Builds the config from any key/value source; missing keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(backend) = parse(&lookup, "TS206_GPIO_BACKEND")? {
            config.backend = backend;
        }
        if let Some(chip) = lookup("TS206_GPIO_CHIP") {
            config.chip = chip;
        }
        if let Some(pin) = parse(&lookup, "TS206_PIN_DATA")? {
            config.pin_data = pin;
        }
        if let Some(pin) = parse(&lookup, "TS206_PIN_RW")? {
            config.pin_rw = pin;
        }
        if let Some(pin) = parse(&lookup, "TS206_PIN_CS")? {
            config.pin_cs = pin;
        }
        if let Some(places) = parse::<u8>(&lookup, "TS206_PLACES")? {
            if places > RAM_ADDRESS_LIMIT {
                return Err(ConfigError::Invalid {
                    key: "TS206_PLACES",
                    value: places.to_string(),
                });
            }
            config.places = places;
        }
        if let Some(interactive) = parse(&lookup, "TS206_INTERACTIVE")? {
            config.interactive = interactive;
        }

        let (data, rw, cs) = (config.pin_data, config.pin_rw, config.pin_cs);
        if data == rw || rw == cs || data == cs {
            return Err(ConfigError::SharedPin(data, rw, cs));
        }

        Ok(config)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => {
            let parsed = value.trim().parse();
            match parsed {
                Ok(parsed) => Ok(Some(parsed)),
                Err(_) => Err(ConfigError::Invalid { key, value }),
            }
        }
    }
}
