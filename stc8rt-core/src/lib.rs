//! stc8rt core runtime
//!
//! Interrupt-driven peripheral services for STC8G microcontrollers, exposed
//! through an Arduino-style surface:
//!
//! - [`clock`] - Timer0 millisecond tick, `millis()`/`micros()`, delays
//! - [`serial`] - buffered UART1 with Timer1 as the baud generator
//! - [`i2c`] - hardware I2C master (`Wire`) with a receive buffer
//! - [`exti`] - callbacks on the five external interrupt lines
//! - [`runtime`] - the context owning all of the above, plus the
//!   setup/main-loop entry point
//!
//! State shared with interrupt handlers is either a lock-free
//! single-producer/single-consumer [`ring_buffer::RingBuffer`] or a value
//! behind an `embassy_sync` critical-section mutex.
//!
//! # Features
//!
//! - `defmt` - log setup paths and derive `defmt::Format` on public types
//! - `sim` - host register model for running the runtime in tests

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod log;

pub mod clock;
pub mod config;
pub mod exti;
pub mod i2c;
pub mod ring_buffer;
pub mod runtime;
pub mod serial;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use clock::{elapsed, Clock};
pub use config::{ConfigError, CoreConfig};
pub use exti::{EdgePolicy, ExtLine, InterruptMode};
pub use i2c::{Wire, WireError};
pub use ring_buffer::RingBuffer;
pub use runtime::{App, Runtime};
pub use serial::{Serial, SerialError};

pub use stc8rt_hal as hal;
