//! GPIO pin abstractions
//!
//! The pin-number-to-port tables and the port mode registers belong to the
//! chip support package. The runtime only needs the four primitives below,
//! plus the numbering of the handful of pins its peripherals route to.

/// Logical pin number
///
/// Numbering is `8 * port + bit`, so P3.2 is pin 26 and P5.4 is pin 44.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin(u8);

impl Pin {
    pub const P3_0: Pin = Pin::new(3, 0);
    pub const P3_1: Pin = Pin::new(3, 1);
    pub const P3_2: Pin = Pin::new(3, 2);
    pub const P3_3: Pin = Pin::new(3, 3);
    pub const P5_4: Pin = Pin::new(5, 4);
    pub const P5_5: Pin = Pin::new(5, 5);

    /// Pin `bit` of port `port`
    pub const fn new(port: u8, bit: u8) -> Self {
        Self(port * 8 + (bit & 0x07))
    }

    /// Port number
    pub const fn port(self) -> u8 {
        self.0 >> 3
    }

    /// Bit position within the port
    pub const fn bit(self) -> u8 {
        self.0 & 0x07
    }

    /// Bit mask within the port register
    pub const fn mask(self) -> u8 {
        1 << self.bit()
    }

    /// Raw pin number
    pub const fn number(self) -> u8 {
        self.0
    }
}

/// Pin drive configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// High-impedance input
    Input,
    /// Push-pull output
    Output,
    /// Input with the internal pull-up enabled
    InputPullUp,
    /// Open-drain output with the internal pull-up enabled (I2C lines)
    OutputOpenDrainPullUp,
    /// Classic 8051 quasi-bidirectional port (UART lines)
    QuasiBidirectional,
}

/// Digital logic level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// The opposite level
    pub const fn toggled(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level == Level::High
    }
}

/// Pin-level I/O primitives
///
/// Implementations map pins to their port registers. Unknown pins must be
/// ignored on write and read as [`Level::Low`].
pub trait Gpio {
    /// Configure the drive mode of a pin
    fn pin_mode(&self, pin: Pin, mode: PinMode);

    /// Drive a pin to a level
    fn digital_write(&self, pin: Pin, level: Level);

    /// Sample a pin
    fn digital_read(&self, pin: Pin) -> Level;

    /// Invert the output latch of a pin
    fn digital_toggle(&self, pin: Pin) {
        let level = self.digital_read(pin);
        self.digital_write(pin, level.toggled());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_numbering() {
        assert_eq!(Pin::P3_2.number(), 26);
        assert_eq!(Pin::P3_2.port(), 3);
        assert_eq!(Pin::P3_2.bit(), 2);
        assert_eq!(Pin::P5_4.mask(), 0x10);
        assert_eq!(Pin::new(5, 5), Pin::P5_5);
    }

    #[test]
    fn test_level_conversions() {
        assert_eq!(Level::from(true), Level::High);
        assert!(!bool::from(Level::Low));
        assert_eq!(Level::High.toggled(), Level::Low);
    }
}
