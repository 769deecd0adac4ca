//! HT1621 RAM-mapped LCD segment driver.
//!
//! The HT1621 drives up to 32 segments × 4 commons from a 32 × 4-bit display RAM. It is talked
//! to over a three-wire, write-clocked serial interface (CS, WR, DATA). See
//! [driver::HT1621Driver] for the command set and [driver::GpioHT1621Driver] for the bit-banged
//! implementation.

pub mod driver;
