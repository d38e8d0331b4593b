//! stc8rt Hardware Abstraction Layer
//!
//! This crate defines the seam between the runtime and the silicon. The
//! runtime never dereferences a register address itself; it asks an [`Sfr`]
//! implementation to read or write a named register. Chip support packages
//! implement [`Sfr`] with the real `MOV`/`MOVX` accesses, the host simulator
//! implements it with a register model.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (setup / main_loop)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  stc8rt-core (clock, serial, i2c, exti) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  stc8rt-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ chip register │       │ host register │
//! │    access     │       │   simulator   │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`sfr::Sfr`] - Special function register access
//! - [`gpio::Gpio`] - Pin mode and digital I/O primitives
//!
//! Pin routing for the peripherals lives in [`uart`] and [`i2c`].

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;
pub mod sfr;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use gpio::{Gpio, Level, Pin, PinMode};
pub use i2c::{I2cConfig, I2cPins};
pub use sfr::{Reg, Sfr, Vector};
pub use uart::{UartConfig, UartPins};
