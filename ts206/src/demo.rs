//! Walk-through of the TS206 energy meter panel.
//!
//! The panel maps one HT1621 byte address to each position:
//!
//! ```text
//!  +-+-+--+--+--+--+--+--+--+
//!  |1|2| 3| 4| 5| 6| 7| 8| 9|
//!  | 0 |  |  |  |  |  |  |  |
//!  +-+-+--+--+--+--+--+--+--+
//! ```
//!
//! Address 0 holds the unit annunciators (kVArh, kWh), the rest are 7-segment digits.
use eyre::eyre;
use log::info;
use std::thread::sleep;
use std::time::Duration;
use ts206_gpio::lcd::ht1621::driver::{Glyph, HT1621Driver, RAM_ADDRESS_LIMIT};

/// Address groups that light up together on the panel.
const GROUPS: [(&str, std::ops::Range<u8>); 4] = [
    ("annunciators", 0..1),
    ("small digits", 1..3),
    ("upper digits", 3..8),
    ("lower digits", 8..12),
];

const ALL_SEGMENTS: u8 = 0xff;

/// Writes `text` starting at `address`, one glyph per position.
///
/// The whole text is checked before anything is sent.
pub fn show_text(lcd: &mut dyn HT1621Driver, address: u8, text: &str) -> eyre::Result<()> {
    let glyphs = text
        .chars()
        .map(|c| Glyph::from_char(c).ok_or_else(|| eyre!("no glyph for {:?}", c)))
        .collect::<eyre::Result<Vec<_>>>()?;
    if address as usize + glyphs.len() > RAM_ADDRESS_LIMIT as usize {
        return Err(eyre!("text {:?} does not fit at {}", text, address));
    }

    for (position, glyph) in (address..).zip(glyphs) {
        lcd.set_glyph(position, glyph, false)?;
    }
    Ok(())
}

/// Runs the demo on an initialized display.
///
/// `pause` is called after every step with a short description of what is shown, and decides
/// how long the step stays visible. `step_delay` spaces out the segment-by-segment sweep.
pub fn run(
    lcd: &mut dyn HT1621Driver,
    places: u8,
    step_delay: Duration,
    mut pause: impl FnMut(&str) -> eyre::Result<()>,
) -> eyre::Result<()> {
    for (name, addresses) in GROUPS {
        lcd.clear(places)?;
        for address in addresses {
            lcd.write(address, ALL_SEGMENTS)?;
        }
        pause(name)?;
    }

    lcd.clear(places)?;
    for address in 0..places {
        lcd.write(address, ALL_SEGMENTS)?;
        sleep(step_delay);
    }
    pause("all segments")?;

    for (address, value) in (1..12).zip(0..=10) {
        lcd.set_digit(address, value)?;
    }
    pause("digits")?;

    for (address, value) in (1..12).zip(0..=10) {
        if address >= 8 {
            lcd.set_digit_with_dot(address, value)?;
        } else {
            lcd.set_digit(address, value)?;
        }
    }
    pause("digits with dots")?;

    show_text(lcd, 0, "   119 HELP ")?;
    pause("text")?;

    lcd.clear(places)?;
    info!("Demo finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts206_gpio::lcd::ht1621::driver::GpioHT1621Driver;
    use ts206_gpio::mock::MockLog;

    const DATA: usize = 0;
    const WR: usize = 1;
    const CS: usize = 2;

    /// Data byte of a decoded write frame.
    fn data_of(frame: &[bool]) -> u8 {
        frame[9..].iter().fold(0, |acc, &bit| (acc << 1) | bit as u8)
    }

    /// Address of a decoded write frame, back on the byte grid.
    fn address_of(frame: &[bool]) -> u8 {
        frame[3..9].iter().fold(0, |acc, &bit| (acc << 1) | bit as u8) >> 1
    }

    #[test]
    fn demo_pauses_after_each_step_and_ends_cleared() {
        let log = MockLog::new();
        let (data, wr, cs, delay) = (log.output(DATA), log.output(WR), log.output(CS), log.delay());
        let mut lcd = GpioHT1621Driver::new(&data, &wr, &cs, &delay).unwrap();
        lcd.init().unwrap();

        let mut steps = Vec::new();
        run(&mut lcd, 12, Duration::ZERO, |step| {
            steps.push(step.to_string());
            log.clear();
            Ok(())
        })
        .unwrap();

        assert_eq!(
            steps,
            [
                "annunciators",
                "small digits",
                "upper digits",
                "lower digits",
                "all segments",
                "digits",
                "digits with dots",
                "text",
            ]
        );
        let frames = log.frames(DATA, WR, CS);
        assert_eq!(frames.len(), 12);
        assert!(frames.iter().all(|frame| data_of(frame) == 0));
    }

    #[test]
    fn text_step_shows_help() {
        let log = MockLog::new();
        let (data, wr, cs, delay) = (log.output(DATA), log.output(WR), log.output(CS), log.delay());
        let mut lcd = GpioHT1621Driver::new(&data, &wr, &cs, &delay).unwrap();
        lcd.init().unwrap();
        log.clear();

        show_text(&mut lcd, 0, "   119 HELP ").unwrap();

        let frames = log.frames(DATA, WR, CS);
        let shown: Vec<(u8, u8)> = frames
            .iter()
            .map(|frame| (address_of(frame), data_of(frame)))
            .collect();
        assert_eq!(shown[3], (3, Glyph::Digit1.pattern()));
        assert_eq!(shown[5], (5, Glyph::Digit9.pattern()));
        assert_eq!(shown[7], (7, Glyph::H.pattern()));
        assert_eq!(shown[10], (10, Glyph::P.pattern()));
        assert_eq!(shown.len(), 12);
    }

    #[test]
    fn unknown_characters_are_rejected_before_writing() {
        let log = MockLog::new();
        let (data, wr, cs, delay) = (log.output(DATA), log.output(WR), log.output(CS), log.delay());
        let mut lcd = GpioHT1621Driver::new(&data, &wr, &cs, &delay).unwrap();
        lcd.init().unwrap();
        log.clear();

        assert!(show_text(&mut lcd, 0, "12X").is_err());
        assert!(show_text(&mut lcd, 120, "HELP HELP").is_err());
        assert!(log.events().is_empty());
    }
}
