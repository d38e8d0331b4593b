//! Runtime context and application entry
//!
//! [`Runtime`] owns every piece of state the interrupt handlers share with
//! foreground code. It is built in a `const` context so a board crate can
//! place it in a `static` and route each vector to [`Runtime::on_interrupt`]:
//!
//! ```ignore
//! static RT: Runtime<Stc8g> = Runtime::new(Stc8g, CoreConfig::BUILD);
//!
//! #[interrupt(TIMER0)]
//! fn timer0() {
//!     RT.on_interrupt(Vector::Timer0);
//! }
//!
//! fn main() -> ! {
//!     RT.run(Blink::default())
//! }
//! ```

use stc8rt_hal::{Gpio, Level, Pin, PinMode, Sfr, Vector};

use crate::clock::{Clock, MonotonicClock};
use crate::config::CoreConfig;
use crate::exti::{EdgePolicy, ExtLine, Handler, InterruptMode, InterruptTable};
use crate::i2c::{Wire, WireState};
use crate::serial::{Serial, SerialPort};

/// Application hooks
///
/// `setup` runs once, then `main_loop` runs forever.
pub trait App<H> {
    fn setup(&mut self, rt: &Runtime<H>);

    fn main_loop(&mut self, rt: &Runtime<H>);
}

/// Peripheral runtime
pub struct Runtime<H> {
    hw: H,
    config: CoreConfig,
    clock: MonotonicClock,
    serial: SerialPort,
    wire: WireState,
    exti: InterruptTable,
}

impl<H> Runtime<H> {
    pub const fn new(hw: H, config: CoreConfig) -> Self {
        Self {
            hw,
            config,
            clock: MonotonicClock::new(config),
            serial: SerialPort::new(),
            wire: WireState::new(),
            exti: InterruptTable::new(),
        }
    }

    /// Register access backend
    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn clock_state(&self) -> &MonotonicClock {
        &self.clock
    }
}

impl<H: Sfr> Runtime<H> {
    /// Monotonic clock
    pub fn clock(&self) -> Clock<'_, H> {
        Clock::new(&self.clock, &self.hw)
    }

    /// Milliseconds since the clock started (wraps after ~49.7 days)
    pub fn millis(&self) -> u32 {
        self.clock().millis()
    }

    /// Microseconds since the clock started (wraps after ~71.6 minutes)
    pub fn micros(&self) -> u32 {
        self.clock().micros()
    }

    pub fn delay_ms(&self, ms: u32) {
        self.clock().delay_ms(ms);
    }

    /// Bind a callback to an external interrupt line
    ///
    /// Returns the trigger condition the line actually uses.
    pub fn attach_interrupt(
        &self,
        line: ExtLine,
        handler: Handler,
        mode: InterruptMode,
    ) -> EdgePolicy {
        self.exti.attach(&self.hw, line, handler, mode)
    }

    /// Unbind and mask an external interrupt line
    pub fn detach_interrupt(&self, line: ExtLine) {
        self.exti.detach(&self.hw, line);
    }

    pub fn is_attached(&self, line: ExtLine) -> bool {
        self.exti.binding(line).is_bound()
    }

    /// Interrupt entry point
    ///
    /// Board crates call this from each vector. Timer1 only clocks the UART
    /// and never has its interrupt enabled.
    pub fn on_interrupt(&self, vector: Vector) {
        match vector {
            Vector::Timer0 => self.clock.on_overflow(),
            Vector::Uart1 => self.serial.on_interrupt(&self.hw),
            Vector::Timer1 => {}
            Vector::Int0 | Vector::Int1 | Vector::Int2 | Vector::Int3 | Vector::Int4 => {
                if let Some(line) = ExtLine::from_vector(vector) {
                    self.exti.dispatch(&self.hw, line);
                }
            }
        }
    }
}

impl<H: Sfr + Gpio> Runtime<H> {
    /// UART1
    pub fn serial(&self) -> Serial<'_, H> {
        Serial::new(&self.serial, &self.hw, self.config.core_clock_hz())
    }

    /// I2C master
    pub fn wire(&self) -> Wire<'_, H> {
        Wire::new(&self.wire, &self.hw, self.config.core_clock_hz())
    }

    pub fn pin_mode(&self, pin: Pin, mode: PinMode) {
        self.hw.pin_mode(pin, mode);
    }

    pub fn digital_write(&self, pin: Pin, level: Level) {
        self.hw.digital_write(pin, level);
    }

    pub fn digital_read(&self, pin: Pin) -> Level {
        self.hw.digital_read(pin)
    }

    pub fn digital_toggle(&self, pin: Pin) {
        self.hw.digital_toggle(pin);
    }

    /// Run an application: `setup` once, then `main_loop` forever
    pub fn run<A: App<H>>(&self, mut app: A) -> ! {
        info!("stc8rt: {} Hz core clock", self.config.core_clock_hz());
        app.setup(self);
        loop {
            app.main_loop(self);
        }
    }
}
