//! DS1307 real-time clock
//!
//! Battery-backed calendar clock at I2C address 0x68. Time is kept in seven
//! packed-BCD registers starting at 0x00; bit 7 of the seconds register is
//! the clock-halt (CH) flag, which stops the oscillator while set.
//!
//! The driver always runs the part in 24-hour mode and stores a two-digit
//! year (00-99).

use embedded_hal::i2c::I2c;
use stc8rt_core::hal::{Gpio, I2cPins, Sfr};
use stc8rt_core::{Wire, WireError};

use super::bcd::{bcd_to_dec, dec_to_bcd, is_valid_bcd};

/// Fixed 7-bit bus address
pub const DS1307_ADDRESS: u8 = 0x68;

/// DS1307 register addresses
pub mod reg {
    pub const SECONDS: u8 = 0x00;
    pub const MINUTES: u8 = 0x01;
    pub const HOURS: u8 = 0x02;
    /// Day of week (1-7)
    pub const DAY: u8 = 0x03;
    /// Day of month
    pub const DATE: u8 = 0x04;
    pub const MONTH: u8 = 0x05;
    pub const YEAR: u8 = 0x06;
    /// Square-wave output control
    pub const CONTROL: u8 = 0x07;
}

/// Clock halt flag in the seconds register
pub const CH: u8 = 0x80;

const SECONDS_MASK: u8 = 0x7F;
const MINUTES_MASK: u8 = 0x7F;
/// Clearing bit 6 selects 24-hour mode
const HOURS_MASK: u8 = 0x3F;
const DAY_MASK: u8 = 0x07;
const DATE_MASK: u8 = 0x3F;
const MONTH_MASK: u8 = 0x1F;

/// DS1307 errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RtcError<E> {
    /// Underlying bus error
    Bus(E),
    /// Nothing answering like a DS1307 at the address
    NotPresent,
    /// A calendar field is out of range
    InvalidTime,
}

/// Calendar time as stored by the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    /// Year within the century (0-99)
    pub year: u8,
    /// Month (1-12)
    pub month: u8,
    /// Day of month (1-31)
    pub date: u8,
    /// Day of week (1-7, see [`DateTime::SUNDAY`])
    pub weekday: u8,
    /// Hours (0-23)
    pub hours: u8,
    /// Minutes (0-59)
    pub minutes: u8,
    /// Seconds (0-59)
    pub seconds: u8,
}

impl DateTime {
    pub const SUNDAY: u8 = 1;
    pub const MONDAY: u8 = 2;
    pub const TUESDAY: u8 = 3;
    pub const WEDNESDAY: u8 = 4;
    pub const THURSDAY: u8 = 5;
    pub const FRIDAY: u8 = 6;
    pub const SATURDAY: u8 = 7;

    /// Whether every field is in the range the clock accepts
    ///
    /// Day-of-month is not checked against the month length.
    pub const fn is_valid(&self) -> bool {
        self.year < 100
            && self.month >= 1
            && self.month <= 12
            && self.date >= 1
            && self.date <= 31
            && self.weekday >= Self::SUNDAY
            && self.weekday <= Self::SATURDAY
            && self.hours < 24
            && self.minutes < 60
            && self.seconds < 60
    }

    /// Register image for 0x00-0x06, oscillator running, 24-hour mode
    fn to_registers(self) -> [u8; 7] {
        [
            dec_to_bcd(self.seconds) & SECONDS_MASK,
            dec_to_bcd(self.minutes),
            dec_to_bcd(self.hours) & HOURS_MASK,
            dec_to_bcd(self.weekday),
            dec_to_bcd(self.date),
            dec_to_bcd(self.month),
            dec_to_bcd(self.year),
        ]
    }

    fn from_registers(raw: &[u8; 7]) -> Self {
        Self {
            seconds: bcd_to_dec(raw[0] & SECONDS_MASK),
            minutes: bcd_to_dec(raw[1] & MINUTES_MASK),
            hours: bcd_to_dec(raw[2] & HOURS_MASK),
            weekday: bcd_to_dec(raw[3] & DAY_MASK),
            date: bcd_to_dec(raw[4] & DATE_MASK),
            month: bcd_to_dec(raw[5] & MONTH_MASK),
            year: bcd_to_dec(raw[6]),
        }
    }
}

/// DS1307 driver
pub struct Ds1307<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Ds1307<I2C> {
    /// Wrap a bus without touching it
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_register(&mut self, register: u8) -> Result<u8, RtcError<I2C::Error>> {
        let mut value = [0u8; 1];
        self.i2c
            .write_read(DS1307_ADDRESS, &[register], &mut value)
            .map_err(RtcError::Bus)?;
        Ok(value[0])
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), RtcError<I2C::Error>> {
        self.i2c
            .write(DS1307_ADDRESS, &[register, value])
            .map_err(RtcError::Bus)
    }

    /// Check that a DS1307 answers
    ///
    /// The seconds register must hold valid BCD; an empty bus reads back
    /// 0xFF, which does not.
    pub fn probe(&mut self) -> Result<(), RtcError<I2C::Error>> {
        let seconds = self.read_register(reg::SECONDS)?;
        if is_valid_bcd(seconds & SECONDS_MASK) {
            Ok(())
        } else {
            Err(RtcError::NotPresent)
        }
    }

    /// Write the calendar and start the oscillator
    pub fn set_time(&mut self, time: &DateTime) -> Result<(), RtcError<I2C::Error>> {
        if !time.is_valid() {
            return Err(RtcError::InvalidTime);
        }
        let registers = time.to_registers();
        let mut frame = [0u8; 8];
        frame[0] = reg::SECONDS;
        frame[1..].copy_from_slice(&registers);
        self.i2c
            .write(DS1307_ADDRESS, &frame)
            .map_err(RtcError::Bus)
    }

    /// Read the calendar
    pub fn time(&mut self) -> Result<DateTime, RtcError<I2C::Error>> {
        let mut raw = [0u8; 7];
        self.i2c
            .write_read(DS1307_ADDRESS, &[reg::SECONDS], &mut raw)
            .map_err(RtcError::Bus)?;
        Ok(DateTime::from_registers(&raw))
    }

    /// Whether the oscillator is running (CH clear)
    pub fn is_running(&mut self) -> Result<bool, RtcError<I2C::Error>> {
        Ok(self.read_register(reg::SECONDS)? & CH == 0)
    }

    /// Clear CH, keeping the current seconds
    pub fn start(&mut self) -> Result<(), RtcError<I2C::Error>> {
        let seconds = self.read_register(reg::SECONDS)?;
        self.write_register(reg::SECONDS, seconds & !CH)
    }

    /// Set CH, freezing the calendar
    pub fn stop(&mut self) -> Result<(), RtcError<I2C::Error>> {
        let seconds = self.read_register(reg::SECONDS)?;
        self.write_register(reg::SECONDS, seconds | CH)
    }
}

impl<'a, H: Sfr + Gpio> Ds1307<Wire<'a, H>> {
    /// Start the I2C engine on `pins` and probe for the clock
    pub fn begin(wire: Wire<'a, H>, pins: I2cPins) -> Result<Self, RtcError<WireError>> {
        wire.begin_with_pins(pins);
        let mut rtc = Self::new(wire);
        rtc.probe()?;
        Ok(rtc)
    }
}
