//! I2C pin routing and configuration
//!
//! The I2C block can be switched between two pin pairs through the I2C_S
//! field of P_SW2. Both lines run open-drain with the internal pull-ups.

use crate::gpio::Pin;

/// I2C pin pair selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cPins {
    /// SCL = P3.2, SDA = P3.3
    #[default]
    P32P33,
    /// SCL = P5.4, SDA = P5.5
    P54P55,
}

impl I2cPins {
    /// Value for the I2C_S field of P_SW2
    pub const fn i2c_s_bits(self) -> u8 {
        match self {
            I2cPins::P32P33 => 0x00,
            I2cPins::P54P55 => 0x20,
        }
    }

    /// Clock line
    pub const fn scl(self) -> Pin {
        match self {
            I2cPins::P32P33 => Pin::P3_2,
            I2cPins::P54P55 => Pin::P5_4,
        }
    }

    /// Data line
    pub const fn sda(self) -> Pin {
        match self {
            I2cPins::P32P33 => Pin::P3_3,
            I2cPins::P54P55 => Pin::P5_5,
        }
    }
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// Pin pair the peripheral is routed to
    pub pins: I2cPins,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self {
        frequency: 100_000,
        pins: I2cPins::P32P33,
    };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self {
        frequency: 400_000,
        pins: I2cPins::P32P33,
    };

    /// Same clock on a different pin pair
    pub const fn with_pins(self, pins: I2cPins) -> Self {
        Self {
            frequency: self.frequency,
            pins,
        }
    }
}
