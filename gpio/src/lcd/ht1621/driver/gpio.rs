use crate::delay::Delay;
use crate::lcd::ht1621::driver::{
    HT1621Driver, COMMAND_MODE, INIT_SEQUENCE, RAM_ADDRESS_LIMIT, SPECIAL_MODE, WRITE_MODE,
};
use crate::{GpioError, GpioOutput, GpioResult};
use log::{debug, trace};

/// GpioHT1621 driver for the HT1621 LCD controller using three GPIO output pins.
///
/// Bits are clocked by hand: for each bit WR goes low, DATA is set, WR goes high (the chip
/// latches on this edge), with a fixed settle time after every transition. The settle time
/// defaults to [GpioHT1621Driver::DEFAULT_BIT_DELAY_US], which is comfortably above the chip's
/// minimum WR half-period even at 2.4 V.
///
/// The driver needs `&mut self` for every frame, so two frames can never interleave on the same
/// pins. Sharing one display between threads means putting the driver behind a lock.
#[derive(Debug)]
pub struct GpioHT1621Driver<'a> {
    pin_data: &'a dyn GpioOutput,
    pin_wr: &'a dyn GpioOutput,
    pin_cs: &'a dyn GpioOutput,
    delay: &'a dyn Delay,
    bit_delay_us: u32,
    initialized: bool,
}

impl<'a> GpioHT1621Driver<'a> {
    pub const DEFAULT_BIT_DELAY_US: u32 = 20;

    /// Creates a new GpioHT1621Driver and drives all three lines to their idle (high) level.
    ///
    /// # Parameters
    ///
    /// - `pin_data`: DATA output pin.
    /// - `pin_wr`: WR output pin, used as the serial clock.
    /// - `pin_cs`: CS output pin, active low.
    /// - `delay`: used to hold every transition, see [Delay].
    ///
    /// The chip still needs [HT1621Driver::init] before RAM can be written.
    pub fn new(
        pin_data: &'a dyn GpioOutput,
        pin_wr: &'a dyn GpioOutput,
        pin_cs: &'a dyn GpioOutput,
        delay: &'a dyn Delay,
    ) -> GpioResult<Self> {
        pin_cs.write(true)?;
        pin_wr.write(true)?;
        pin_data.write(true)?;
        Ok(GpioHT1621Driver {
            pin_data,
            pin_wr,
            pin_cs,
            delay,
            bit_delay_us: Self::DEFAULT_BIT_DELAY_US,
            initialized: false,
        })
    }

    pub fn with_bit_delay(mut self, bit_delay_us: u32) -> Self {
        self.bit_delay_us = bit_delay_us;
        self
    }

    /// Clocks out the top `count` bits of `value`, most significant first.
    ///
    /// This does not touch CS; it is the building block of every frame.
    ///
    /// # Errors
    /// - `GpioError::InvalidArgument` if `count` is not in `1..=8`. No pin is touched then.
    pub fn write_bits(&mut self, mut value: u8, count: u8) -> GpioResult<()> {
        Self::check_width(count)?;
        for _ in 0..count {
            self.pin_wr.write(false)?;
            self.delay.delay_us(self.bit_delay_us);
            self.pin_data.write(value & 0x80 != 0)?;
            self.delay.delay_us(self.bit_delay_us);
            self.pin_wr.write(true)?;
            self.delay.delay_us(self.bit_delay_us);
            value <<= 1;
        }
        Ok(())
    }

    fn check_width(count: u8) -> GpioResult<()> {
        if !(1..=8).contains(&count) {
            return Err(GpioError::InvalidArgument);
        }
        Ok(())
    }

    /// Sends `(value, width)` groups back to back inside one CS assertion.
    ///
    /// All widths are checked before CS is asserted. CS is released even if a pin write fails
    /// halfway, and the first error is returned.
    fn send_frame(&mut self, groups: &[(u8, u8)]) -> GpioResult<()> {
        for &(_, count) in groups {
            Self::check_width(count)?;
        }

        self.pin_cs.write(false)?;
        let sent = groups
            .iter()
            .try_for_each(|&(value, count)| self.write_bits(value, count));
        let released = self.pin_cs.write(true);
        sent.and(released)
    }

    fn check_writable(&self, address: u8) -> GpioResult<()> {
        if address >= RAM_ADDRESS_LIMIT {
            return Err(GpioError::InvalidArgument);
        }
        if !self.initialized {
            return Err(GpioError::NotInitialized);
        }
        Ok(())
    }

    /// Address bits as the chip expects them in the 6-bit field: the byte address is shifted
    /// onto the nibble grid and only the top six bits of the result are sent.
    fn address_bits(address: u8) -> u8 {
        address << 3
    }
}

impl HT1621Driver for GpioHT1621Driver<'_> {
    /// Sends the power-on configuration: internal RC oscillator, 1/3 bias with four commons,
    /// system enable, LCD on.
    ///
    /// The driver only counts as initialized once all four commands went out.
    fn init(&mut self) -> GpioResult<()> {
        debug!("Initializing HT1621");
        self.initialized = false;
        for command in INIT_SEQUENCE {
            self.send_command(command)?;
        }
        self.initialized = true;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn send_command_code(&mut self, code: u8) -> GpioResult<()> {
        trace!("Sending command: {:08b}", code);
        self.send_frame(&[(COMMAND_MODE, 4), (code, 8)])
    }

    fn send_special_code(&mut self, code: u8) -> GpioResult<()> {
        trace!("Sending special command: {:08b}", code);
        self.send_frame(&[(SPECIAL_MODE, 4), (code, 8)])
    }

    fn write(&mut self, address: u8, data: u8) -> GpioResult<()> {
        self.check_writable(address)?;
        trace!("Writing {:08b} @ {}", data, address);
        self.send_frame(&[(WRITE_MODE, 3), (Self::address_bits(address), 6), (data, 8)])
    }

    fn write_successive(&mut self, address: u8, data: &[u8]) -> GpioResult<()> {
        self.check_writable(address)?;
        if data.is_empty() {
            return Ok(());
        }
        trace!("Writing {} bytes @ {}", data.len(), address);

        let mut groups = Vec::with_capacity(data.len() + 2);
        groups.push((WRITE_MODE, 3));
        groups.push((Self::address_bits(address), 6));
        groups.extend(data.iter().map(|&byte| (byte, 8)));
        self.send_frame(&groups)
    }
}
