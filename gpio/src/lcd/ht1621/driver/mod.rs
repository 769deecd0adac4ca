//! HT1621 LCD driver module.
//!
//! See [HT1621Driver] trait for the command-level interface, and [GpioHT1621Driver] for the
//! implementation that bit-bangs the serial protocol over three GPIO outputs.

mod gpio;

use crate::{GpioError, GpioResult};
use log::debug;
use std::fmt::Debug;
pub use gpio::*;

/// Number of addressable RAM cells. Addresses are `0..RAM_ADDRESS_LIMIT`.
pub const RAM_ADDRESS_LIMIT: u8 = 128;

/// Segment bit that lights the decimal point next to a digit.
pub const DOT_SEGMENT: u8 = 0x08;

/// Mode selectors, left-aligned in a byte. Only the top bits are sent (see [GpioHT1621Driver]).
///
/// `COMMAND_MODE` and `SPECIAL_MODE` are 4 bits wide (the `100` ID plus the first command bit),
/// `WRITE_MODE` is 3 bits wide.
pub const COMMAND_MODE: u8 = 0x80;
pub const SPECIAL_MODE: u8 = 0x90;
pub const WRITE_MODE: u8 = 0xa0;

/// Power-on configuration, in the order the chip needs it: oscillator and bias first, then the
/// system oscillator, then the LCD bias generator.
pub const INIT_SEQUENCE: [Command; 4] = [
    Command::Rc256k,
    Command::Bias(BiasRatio::Third, CommonLines::Four),
    Command::SysEn,
    Command::LcdOn,
];

/// The `HT1621Driver` trait defines the interface for HT1621 segment LCD controllers.
///
/// # Protocol
///
/// Every transfer is a *frame*: CS is pulled low, a mode selector is clocked in followed by its
/// payload, then CS is released. Data is latched on the rising edge of WR, most significant bit
/// first. There is no acknowledgement of any kind, so nothing here can detect a missing or
/// miswired display.
///
/// - Command frame: `100` + 9 command bits (the last one is a don't-care).
/// - Write frame: `101` + 6 address bits + data bits. Further data bits continue at the next
///   address, which is what [HT1621Driver::write_successive] uses.
///
/// # State
///
/// A freshly constructed driver is *bound*: its pins are at idle levels but the chip is not
/// configured. [HT1621Driver::init] sends [INIT_SEQUENCE] and makes it *initialized*. RAM writes
/// are rejected with [GpioError::NotInitialized] before that; commands are always accepted.
///
/// # Sources
///
/// - Holtek Semiconductor Inc., "HT1621 RAM Mapping 32×4 LCD Controller for I/O MCU", Rev. 3.00.
pub trait HT1621Driver: Debug {
    /// Sends [INIT_SEQUENCE] and marks the driver as initialized.
    fn init(&mut self) -> GpioResult<()>;

    /// Whether [HT1621Driver::init] has completed.
    fn is_initialized(&self) -> bool;

    /// Sends a command, picking the mode selector the command requires.
    fn send_command(&mut self, command: Command) -> GpioResult<()> {
        if command.is_special() {
            self.send_special_code(command.code())
        } else {
            self.send_command_code(command.code())
        }
    }

    /// Turns the LCD bias generator on or off. RAM contents are kept.
    fn display_on(&mut self, on: bool) -> GpioResult<()> {
        self.send_command(if on { Command::LcdOn } else { Command::LcdOff })
    }

    /// Writes zero to addresses `0..places`, one frame per address, lowest address first.
    fn clear(&mut self, places: u8) -> GpioResult<()> {
        if places > RAM_ADDRESS_LIMIT {
            return Err(GpioError::InvalidArgument);
        }
        if !self.is_initialized() {
            return Err(GpioError::NotInitialized);
        }
        debug!("Clearing {} places", places);
        for address in 0..places {
            self.write(address, 0)?;
        }
        Ok(())
    }

    /// Shows a glyph at the given address, optionally with its decimal point.
    fn set_glyph(&mut self, address: u8, glyph: Glyph, dot: bool) -> GpioResult<()> {
        let mut pattern = glyph.pattern();
        if dot {
            pattern |= DOT_SEGMENT;
        }
        self.write(address, pattern)
    }

    /// Shows the glyph with pattern-table index `value` (see [Glyph::from_index]).
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if `value` is above 16. Nothing is sent in that case.
    fn set_digit(&mut self, address: u8, value: u8) -> GpioResult<()> {
        self.set_glyph(address, Glyph::from_index(value)?, false)
    }

    /// Same as [HT1621Driver::set_digit], with the decimal point lit.
    fn set_digit_with_dot(&mut self, address: u8, value: u8) -> GpioResult<()> {
        self.set_glyph(address, Glyph::from_index(value)?, true)
    }

    // Low-level frames.
    // Everything above is built on these; implementations own the framing and timing.

    /// Sends `code` verbatim after the 4-bit [COMMAND_MODE] selector.
    fn send_command_code(&mut self, code: u8) -> GpioResult<()>;

    /// Sends `code` verbatim after the 4-bit [SPECIAL_MODE] selector.
    fn send_special_code(&mut self, code: u8) -> GpioResult<()>;

    /// Writes one byte to a RAM address.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if `address` is not below [RAM_ADDRESS_LIMIT].
    /// - `GpioError::NotInitialized` if [HT1621Driver::init] has not run.
    fn write(&mut self, address: u8, data: u8) -> GpioResult<()>;

    /// Writes consecutive bytes starting at `address`, in a single frame.
    ///
    /// An empty slice sends nothing.
    fn write_successive(&mut self, address: u8, data: &[u8]) -> GpioResult<()>;
}

/// LCD bias voltage ratio.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BiasRatio {
    Half,
    Third,
}

/// Number of common (backplane) lines the panel uses.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CommonLines {
    Two,
    Three,
    Four,
}

/// Time base / watchdog clock output frequency.
///
/// The watchdog time-out is 4 s at [TimeBaseFrequency::F1] and halves with every step.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimeBaseFrequency {
    F1,
    F2,
    F4,
    F8,
    F16,
    F32,
    F64,
    F128,
}

impl TimeBaseFrequency {
    /// Output frequency in Hz.
    pub fn hz(&self) -> u8 {
        1 << self.to_index()
    }

    fn to_index(self) -> u8 {
        match self {
            TimeBaseFrequency::F1 => 0,
            TimeBaseFrequency::F2 => 1,
            TimeBaseFrequency::F4 => 2,
            TimeBaseFrequency::F8 => 3,
            TimeBaseFrequency::F16 => 4,
            TimeBaseFrequency::F32 => 5,
            TimeBaseFrequency::F64 => 6,
            TimeBaseFrequency::F128 => 7,
        }
    }
}

/// HT1621 commands.
///
/// Codes follow the datasheet command summary: the byte is `C7..C0` of the 9-bit command, with
/// `C8` carried in the mode selector and don't-care bits sent as `0`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    /// Stops the system oscillator and the LCD bias generator.
    SysDis,
    /// Starts the system oscillator.
    SysEn,
    /// Turns off the LCD bias generator.
    LcdOff,
    /// Turns on the LCD bias generator.
    LcdOn,
    /// Disables the time base output.
    TimerDis,
    /// Disables the watchdog timer.
    WdtDis,
    /// Enables the time base output.
    TimerEn,
    /// Enables the watchdog timer, resetting it.
    WdtEn,
    /// Stops the tone output.
    ToneOff,
    /// Starts the tone output at the frequency picked with [Command::Tone2k] or [Command::Tone4k].
    ToneOn,
    /// Clears the time base generator.
    ClrTimer,
    /// Clears the watchdog stage.
    ClrWdt,
    /// System clock from a 32.768 kHz crystal.
    Xtal32k,
    /// System clock from the internal 256 kHz RC oscillator.
    Rc256k,
    /// System clock from an external 256 kHz source.
    Ext256k,
    /// LCD bias and number of commons.
    Bias(BiasRatio, CommonLines),
    /// Tone output at 4 kHz.
    Tone4k,
    /// Tone output at 2 kHz.
    Tone2k,
    /// Disables the IRQ output.
    IrqDis,
    /// Enables the IRQ output.
    IrqEn,
    /// Sets the time base / watchdog clock frequency.
    TimeBase(TimeBaseFrequency),
    /// Manufacturer test mode. Don't use.
    TestOn,
    /// Leaves test mode.
    TestOff,
}

impl Command {
    /// The 8 command bits sent after the mode selector.
    pub fn code(&self) -> u8 {
        match self {
            Command::SysDis => 0x00,
            Command::SysEn => 0x02,
            Command::LcdOff => 0x04,
            Command::LcdOn => 0x06,
            Command::TimerDis => 0x08,
            Command::WdtDis => 0x0a,
            Command::TimerEn => 0x0c,
            Command::WdtEn => 0x0e,
            Command::ToneOff => 0x10,
            Command::ToneOn => 0x12,
            Command::ClrTimer => 0x18,
            Command::ClrWdt => 0x1c,
            Command::Xtal32k => 0x28,
            Command::Rc256k => 0x30,
            Command::Ext256k => 0x38,
            Command::Bias(ratio, commons) => {
                let mut command = 0b0100_0000;
                command |= match commons {
                    CommonLines::Two => 0b0000_0000,
                    CommonLines::Three => 0b0000_1000,
                    CommonLines::Four => 0b0001_0000,
                };
                if *ratio == BiasRatio::Third {
                    command |= 0b0000_0010;
                }
                command
            }
            Command::Tone4k => 0x80,
            Command::Tone2k => 0xc0,
            Command::IrqDis => 0x00,
            Command::IrqEn => 0x10,
            Command::TimeBase(frequency) => 0b0100_0000 | (frequency.to_index() << 1),
            Command::TestOn => 0xc0,
            Command::TestOff => 0xc6,
        }
    }

    /// Whether the command has `C8` set and has to go after [SPECIAL_MODE].
    pub fn is_special(&self) -> bool {
        matches!(
            self,
            Command::IrqDis
                | Command::IrqEn
                | Command::TimeBase(_)
                | Command::TestOn
                | Command::TestOff
        )
    }
}

/// Symbols of the 7-segment pattern table.
///
/// Pattern bits, MSB first, map to segments `d e f a h c g b`, where `h` is the decimal point:
///
/// ```text
///      a
///    f   b
///      g
///    e   c
///  h   d
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Glyph {
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Dash,
    Underscore,
    H,
    E,
    L,
    P,
    Space,
}

impl Glyph {
    const TABLE: [Glyph; 17] = [
        Glyph::Digit0,
        Glyph::Digit1,
        Glyph::Digit2,
        Glyph::Digit3,
        Glyph::Digit4,
        Glyph::Digit5,
        Glyph::Digit6,
        Glyph::Digit7,
        Glyph::Digit8,
        Glyph::Digit9,
        Glyph::Dash,
        Glyph::Underscore,
        Glyph::H,
        Glyph::E,
        Glyph::L,
        Glyph::P,
        Glyph::Space,
    ];

    /// Converts a pattern-table index to a [Glyph].
    ///
    /// `0..=9` are the digits, then dash, underscore, `H`, `E`, `L`, `P` and space.
    pub fn from_index(index: u8) -> GpioResult<Self> {
        Self::TABLE
            .get(index as usize)
            .copied()
            .ok_or(GpioError::InvalidArgument)
    }

    /// Position of the glyph in the pattern table.
    pub fn index(&self) -> u8 {
        *self as u8
    }

    /// Looks up the glyph for a character, case-insensitively for letters.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0'..='9' => c
                .to_digit(10)
                .and_then(|digit| Self::from_index(digit as u8).ok()),
            '-' => Some(Glyph::Dash),
            '_' => Some(Glyph::Underscore),
            'H' | 'h' => Some(Glyph::H),
            'E' | 'e' => Some(Glyph::E),
            'L' | 'l' => Some(Glyph::L),
            'P' | 'p' => Some(Glyph::P),
            ' ' => Some(Glyph::Space),
            _ => None,
        }
    }

    /// Segment bitmask, without the decimal point.
    pub fn pattern(&self) -> u8 {
        match self {
            Glyph::Digit0 => 0xf5,
            Glyph::Digit1 => 0x05,
            Glyph::Digit2 => 0xd3,
            Glyph::Digit3 => 0x97,
            Glyph::Digit4 => 0x27,
            Glyph::Digit5 => 0xb6,
            Glyph::Digit6 => 0xf6,
            Glyph::Digit7 => 0x15,
            Glyph::Digit8 => 0xf7,
            Glyph::Digit9 => 0xb7,
            Glyph::Dash => 0x02,
            Glyph::Underscore => 0x80,
            Glyph::H => 0x67,
            Glyph::E => 0xf2,
            Glyph::L => 0xe0,
            Glyph::P => 0x73,
            Glyph::Space => 0x00,
        }
    }
}
