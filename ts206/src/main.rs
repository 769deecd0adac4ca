mod config;
mod demo;

use crate::config::{Backend, Config};
use dotenv::dotenv;
use log::{debug, info};
use std::io::stdin;
use std::thread::sleep;
use std::time::Duration;
use ts206_gpio::GpioDriver;
use ts206_gpio::delay::SpinDelay;
use ts206_gpio::gpiod::GpiodDriver;
use ts206_gpio::lcd::ht1621::driver::{GpioHT1621Driver, HT1621Driver};
use ts206_gpio::raw::RawGpioDriver;

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("TS206 demo starting...");

    let config = Config::from_env()?;

    info!(
        "LCD @ DATA: {}, RW: {}, CS: {} ({:?} backend)",
        config.pin_data, config.pin_rw, config.pin_cs, config.backend
    );

    debug!("Initializing GPIO driver...");
    match config.backend {
        Backend::Raw => {
            let gpio = RawGpioDriver::new_gpiomem()?;
            debug!("{:?} initialized.", gpio);
            run(&gpio, &config)
        }
        Backend::Gpiod => {
            let gpio = GpiodDriver::open(&config.chip)?;
            debug!("{:?} initialized.", gpio);
            run(&gpio, &config)
        }
    }
}

fn run(gpio: &impl GpioDriver, config: &Config) -> eyre::Result<()> {
    debug!("Initializing LCD driver...");
    let mut lcd_data_pin = gpio.get_pin(config.pin_data)?;
    let lcd_data_out = lcd_data_pin.as_output()?;
    let mut lcd_rw_pin = gpio.get_pin(config.pin_rw)?;
    let lcd_rw_out = lcd_rw_pin.as_output()?;
    let mut lcd_cs_pin = gpio.get_pin(config.pin_cs)?;
    let lcd_cs_out = lcd_cs_pin.as_output()?;
    let delay = SpinDelay;

    let mut lcd = GpioHT1621Driver::new(&*lcd_data_out, &*lcd_rw_out, &*lcd_cs_out, &delay)?;
    lcd.init()?;

    debug!("{:?} initialized.", lcd);

    let interactive = config.interactive;
    demo::run(&mut lcd, config.places, Duration::from_millis(100), |step| {
        if interactive {
            info!("Showing {}. Press Enter to continue.", step);
            let mut line = String::new();
            stdin().read_line(&mut line)?;
        } else {
            info!("Showing {}.", step);
            sleep(Duration::from_secs(1));
        }
        Ok(())
    })
}
