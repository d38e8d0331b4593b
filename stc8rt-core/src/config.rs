//! Core clock configuration
//!
//! The system clock frequency is fixed at build time. It can be overridden by
//! setting `STC8RT_F_CPU` (decimal Hz) in the build environment; an invalid
//! value fails the build rather than producing a runtime surprise.

/// Core clock used when nothing else is configured
pub const DEFAULT_CORE_CLOCK_HZ: u32 = 24_000_000;

/// Slowest supported core clock (one whole cycle per microsecond)
pub const MIN_CORE_CLOCK_HZ: u32 = 1_000_000;

/// Fastest supported core clock (one millisecond must fit the 16-bit timer)
pub const MAX_CORE_CLOCK_HZ: u32 = 65_535_000;

/// Clock tick rate (1 ms period)
pub const TICK_HZ: u32 = 1_000;

/// Microseconds per clock tick
pub const TICK_PERIOD_US: u32 = 1_000_000 / TICK_HZ;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Core clock below [`MIN_CORE_CLOCK_HZ`]
    ClockTooSlow(u32),
    /// Core clock above [`MAX_CORE_CLOCK_HZ`]
    ClockTooFast(u32),
}

/// Runtime-wide configuration
///
/// Only constructible through [`CoreConfig::new`] or the presets, so the
/// clock is always inside the supported range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CoreConfig {
    core_clock_hz: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl CoreConfig {
    /// 24 MHz internal oscillator
    pub const DEFAULT: Self = Self {
        core_clock_hz: DEFAULT_CORE_CLOCK_HZ,
    };

    /// Configuration selected by the build environment
    pub const BUILD: Self = Self::from_build_env();

    /// Validate a core clock frequency
    pub const fn new(core_clock_hz: u32) -> Result<Self, ConfigError> {
        if core_clock_hz < MIN_CORE_CLOCK_HZ {
            return Err(ConfigError::ClockTooSlow(core_clock_hz));
        }
        if core_clock_hz > MAX_CORE_CLOCK_HZ {
            return Err(ConfigError::ClockTooFast(core_clock_hz));
        }
        Ok(Self { core_clock_hz })
    }

    /// Read `STC8RT_F_CPU` at compile time, falling back to the default
    pub const fn from_build_env() -> Self {
        match option_env!("STC8RT_F_CPU") {
            None => Self::DEFAULT,
            Some(raw) => match parse_decimal(raw) {
                Some(hz) => match Self::new(hz) {
                    Ok(config) => config,
                    Err(_) => panic!("STC8RT_F_CPU is outside the supported clock range"),
                },
                None => panic!("STC8RT_F_CPU must be a decimal frequency in Hz"),
            },
        }
    }

    /// System clock feeding the timers and the I2C block, in Hz
    pub const fn core_clock_hz(&self) -> u32 {
        self.core_clock_hz
    }

    /// Timer cycles in one clock tick
    pub const fn cycles_per_tick(&self) -> u32 {
        self.core_clock_hz / TICK_HZ
    }

    /// Value loaded into a 16-bit up-counter so it overflows once per tick
    pub const fn timer_reload(&self) -> u16 {
        (65_536 - self.cycles_per_tick()) as u16
    }
}

const fn parse_decimal(raw: &str) -> Option<u32> {
    let bytes = raw.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    let mut value: u32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if !b.is_ascii_digit() {
            return None;
        }
        value = match value.checked_mul(10) {
            Some(v) => match v.checked_add((b - b'0') as u32) {
                Some(v) => v,
                None => return None,
            },
            None => return None,
        };
        i += 1;
    }
    Some(value)
}
