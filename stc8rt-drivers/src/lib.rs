//! Peripheral drivers
//!
//! Device drivers built on the stc8rt bus engines. Drivers are generic over
//! the `embedded-hal` traits, so they also run on any other HAL; the
//! `begin` constructors tie them to the runtime's own engines.
//!
//! - Real-time clocks (DS1307)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod rtc;
