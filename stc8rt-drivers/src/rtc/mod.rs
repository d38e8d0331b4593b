//! Real-time clock drivers

pub mod bcd;
pub mod ds1307;

pub use ds1307::{DateTime, Ds1307, RtcError, DS1307_ADDRESS};
