//! UART1 pin routing and configuration
//!
//! UART1 can be switched between three pin pairs through the S1_S field of
//! P_SW1. Frames are always 8N1 (mode 1).

use crate::gpio::Pin;

/// UART1 pin pair selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartPins {
    /// RX = P3.0, TX = P3.1
    #[default]
    P30P31,
    /// RX = P3.2, TX = P3.3
    P32P33,
    /// RX = P5.4, TX = P5.5
    P54P55,
}

impl UartPins {
    /// Value for the S1_S field of P_SW1
    pub const fn s1_s_bits(self) -> u8 {
        match self {
            UartPins::P30P31 => 0x00,
            UartPins::P32P33 => 0x40,
            UartPins::P54P55 => 0x80,
        }
    }

    /// Receive pin
    pub const fn rx(self) -> Pin {
        match self {
            UartPins::P30P31 => Pin::P3_0,
            UartPins::P32P33 => Pin::P3_2,
            UartPins::P54P55 => Pin::P5_4,
        }
    }

    /// Transmit pin
    pub const fn tx(self) -> Pin {
        match self {
            UartPins::P30P31 => Pin::P3_1,
            UartPins::P32P33 => Pin::P3_3,
            UartPins::P54P55 => Pin::P5_5,
        }
    }
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Pin pair the peripheral is routed to
    pub pins: UartPins,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 9600,
            pins: UartPins::P30P31,
        }
    }
}

impl UartConfig {
    /// Default pins at the given baud rate
    pub const fn baud(baudrate: u32) -> Self {
        Self {
            baudrate,
            pins: UartPins::P30P31,
        }
    }
}
