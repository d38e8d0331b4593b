//! Buffered UART1 transport
//!
//! Timer1 generates the baud clock in 16-bit auto-reload mode. Both
//! directions are interrupt driven through 64-slot ring buffers:
//!
//! - RX: the handler moves each received byte into the RX buffer, dropping
//!   it when the buffer is full.
//! - TX: [`Serial::write`] queues bytes and primes SBUF when the line is
//!   idle; the handler feeds the next queued byte on every transmit-complete.
//!
//! Writers block only while the TX buffer is full.

use core::fmt;

use embedded_io::{ErrorKind, ErrorType};
use portable_atomic::{AtomicBool, Ordering};
use stc8rt_hal::sfr::{auxr, ie, p_sw1, scon, tcon, tmod};
use stc8rt_hal::{Gpio, PinMode, Reg, Sfr, UartConfig, UartPins};

use crate::ring_buffer::RingBuffer;

/// Slots in each serial ring buffer
pub const SERIAL_BUFFER_SIZE: usize = 64;

/// Longest line [`Serial::read_line`] returns
pub const LINE_CAPACITY: usize = 64;

/// Consecutive empty polls after which a string read gives up
pub const READ_IDLE_POLLS: u16 = 10_000;

/// Timer1 reload for a baud rate in 1T mode
///
/// `65536 - round(core_clock / (4 * baud))`. A zero baud rate yields 0
/// (slowest possible rate), one too fast for the clock yields 65535.
pub const fn baud_reload(core_clock_hz: u32, baud: u32) -> u16 {
    if baud == 0 {
        return 0;
    }
    let clock = core_clock_hz as u64;
    let baud = baud as u64;
    let divisor = (clock + 2 * baud) / (4 * baud);
    if divisor == 0 {
        u16::MAX
    } else if divisor >= 65_536 {
        0
    } else {
        (65_536 - divisor) as u16
    }
}

/// Errors from the byte-stream interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// [`Serial::begin`] has not been called
    NotStarted,
}

impl embedded_io::Error for SerialError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// UART1 state shared with the UART interrupt handler
pub struct SerialPort {
    rx: RingBuffer<SERIAL_BUFFER_SIZE>,
    tx: RingBuffer<SERIAL_BUFFER_SIZE>,
    /// A byte is in SBUF and its transmit-complete is still outstanding
    transmitting: AtomicBool,
    active: AtomicBool,
}

impl Default for SerialPort {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialPort {
    pub const fn new() -> Self {
        Self {
            rx: RingBuffer::new(),
            tx: RingBuffer::new(),
            transmitting: AtomicBool::new(false),
            active: AtomicBool::new(false),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn reset(&self) {
        self.rx.reset();
        self.tx.reset();
        self.transmitting.store(false, Ordering::Release);
    }

    /// UART1 interrupt handler
    pub fn on_interrupt<H: Sfr>(&self, hw: &H) {
        if hw.is_set(Reg::Scon, scon::RI) {
            // Full buffer: the byte is lost
            let _ = self.rx.push(hw.read(Reg::Sbuf));
            hw.clear_bits(Reg::Scon, scon::RI);
        }

        if hw.is_set(Reg::Scon, scon::TI) {
            hw.clear_bits(Reg::Scon, scon::TI);
            match self.tx.pop() {
                Some(byte) => hw.write(Reg::Sbuf, byte),
                None => self.transmitting.store(false, Ordering::Release),
            }
        }
    }
}

/// Serial port handle
pub struct Serial<'a, H> {
    port: &'a SerialPort,
    hw: &'a H,
    core_clock_hz: u32,
}

impl<H> Clone for Serial<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H> Copy for Serial<'_, H> {}

impl<'a, H: Sfr + Gpio> Serial<'a, H> {
    pub(crate) fn new(port: &'a SerialPort, hw: &'a H, core_clock_hz: u32) -> Self {
        Self {
            port,
            hw,
            core_clock_hz,
        }
    }

    /// Start UART1 on the default pins
    pub fn begin(&self, baudrate: u32) {
        self.begin_with_config(UartConfig::baud(baudrate));
    }

    /// Start UART1 on a specific pin pair
    pub fn begin_with_pins(&self, baudrate: u32, pins: UartPins) {
        self.begin_with_config(UartConfig { baudrate, pins });
    }

    /// Start UART1
    ///
    /// Restarting an active port discards everything buffered.
    pub fn begin_with_config(&self, config: UartConfig) {
        let hw = self.hw;
        let reload = baud_reload(self.core_clock_hz, config.baudrate);
        debug!(
            "serial begin: {} baud, reload {}",
            config.baudrate, reload
        );

        hw.clear_bits(Reg::Ie, ie::ES);
        self.port.active.store(false, Ordering::Release);

        let pins = config.pins;
        hw.pin_mode(pins.rx(), PinMode::QuasiBidirectional);
        hw.pin_mode(pins.tx(), PinMode::QuasiBidirectional);
        hw.write_field(Reg::PSw1, p_sw1::S1_S_MASK, pins.s1_s_bits());

        hw.write(Reg::Scon, scon::MODE1_RX);

        // Timer1 as the baud generator: 1T, 16-bit auto-reload
        hw.clear_bits(Reg::Tcon, tcon::TR1);
        hw.clear_bits(Reg::Auxr, auxr::S1ST2);
        hw.set_bits(Reg::Auxr, auxr::T1X12);
        hw.clear_bits(Reg::Tmod, tmod::T1_MASK);
        hw.write(Reg::Tl1, reload as u8);
        hw.write(Reg::Th1, (reload >> 8) as u8);
        hw.clear_bits(Reg::Tcon, tcon::TF1);
        hw.set_bits(Reg::Tcon, tcon::TR1);

        self.port.reset();
        self.port.active.store(true, Ordering::Release);

        hw.set_bits(Reg::Ie, ie::ES);
        hw.set_bits(Reg::Ie, ie::EA);
    }

    /// Stop UART1 and discard both buffers
    pub fn end(&self) {
        let hw = self.hw;
        hw.clear_bits(Reg::Ie, ie::ES);
        hw.clear_bits(Reg::Tcon, tcon::TR1);
        hw.clear_bits(Reg::Scon, scon::REN);
        self.port.reset();
        self.port.active.store(false, Ordering::Release);
        debug!("serial end");
    }

    /// Whether the port has been started
    pub fn is_active(&self) -> bool {
        self.port.is_active()
    }

    /// Queue one byte for transmission
    ///
    /// Blocks while the TX buffer is full. Returns the number of bytes
    /// accepted: 0 if the port is not started, 1 otherwise.
    pub fn write(&self, byte: u8) -> usize {
        if !self.port.is_active() {
            return 0;
        }

        while self.port.tx.is_full() {
            core::hint::spin_loop();
        }

        self.hw.clear_bits(Reg::Ie, ie::ES);
        if self.port.transmitting.load(Ordering::Acquire) {
            // Handler is masked and only ever pops, so the slot seen free above is still free
            let _ = self.port.tx.push(byte);
        } else {
            self.hw.write(Reg::Sbuf, byte);
            self.port.transmitting.store(true, Ordering::Release);
        }
        self.hw.set_bits(Reg::Ie, ie::ES);
        1
    }

    /// Queue a byte slice, returning the number of bytes accepted
    pub fn write_bytes(&self, bytes: &[u8]) -> usize {
        bytes.iter().map(|&b| self.write(b)).sum()
    }

    /// Queue the bytes of a string
    pub fn print(&self, text: &str) -> usize {
        self.write_bytes(text.as_bytes())
    }

    /// Queue a string followed by CR LF
    pub fn println(&self, text: &str) -> usize {
        self.print(text) + self.print("\r\n")
    }

    /// Queue the decimal rendering of a number
    pub fn print_number(&self, value: i32) -> usize {
        let mut out = Counting {
            serial: *self,
            written: 0,
        };
        let _ = fmt::write(&mut out, format_args!("{}", value));
        out.written
    }

    /// Bytes waiting in the RX buffer
    pub fn available(&self) -> usize {
        self.port.rx.available()
    }

    /// Take the oldest received byte
    pub fn read(&self) -> Option<u8> {
        self.port.rx.pop()
    }

    /// Look at the oldest received byte without consuming it
    pub fn peek(&self) -> Option<u8> {
        self.port.rx.peek()
    }

    /// Block until every queued byte has left the shift register
    pub fn flush(&self) {
        if !self.port.is_active() {
            return;
        }
        while self.port.transmitting.load(Ordering::Acquire) {
            core::hint::spin_loop();
        }
    }

    /// Read bytes into `buf` until CR or LF, a full buffer, or the line goes idle
    ///
    /// The terminator is consumed but not stored. Returns the number of
    /// bytes stored.
    pub fn read_string(&self, buf: &mut [u8]) -> usize {
        let mut len = 0;
        let mut idle = 0u16;
        while len < buf.len() {
            match self.read() {
                None => {
                    idle += 1;
                    if idle >= READ_IDLE_POLLS {
                        break;
                    }
                }
                Some(b'\r' | b'\n') => break,
                Some(byte) => {
                    idle = 0;
                    buf[len] = byte;
                    len += 1;
                }
            }
        }
        len
    }

    /// Read one line into an owned buffer
    pub fn read_line(&self) -> heapless::Vec<u8, LINE_CAPACITY> {
        let mut buf = [0u8; LINE_CAPACITY];
        let len = self.read_string(&mut buf);
        let mut line = heapless::Vec::new();
        // len never exceeds the capacity
        let _ = line.extend_from_slice(&buf[..len]);
        line
    }
}

/// `fmt::Write` adapter that remembers how many bytes went out
struct Counting<'a, H> {
    serial: Serial<'a, H>,
    written: usize,
}

impl<H: Sfr + Gpio> fmt::Write for Counting<'_, H> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.written += self.serial.print(s);
        Ok(())
    }
}

impl<H: Sfr + Gpio> fmt::Write for Serial<'_, H> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if !self.port.is_active() {
            return Err(fmt::Error);
        }
        self.print(s);
        Ok(())
    }
}

impl<H> ErrorType for Serial<'_, H> {
    type Error = SerialError;
}

impl<H: Sfr + Gpio> embedded_io::Write for Serial<'_, H> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if !self.port.is_active() {
            return Err(SerialError::NotStarted);
        }
        Ok(self.write_bytes(buf))
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if !self.port.is_active() {
            return Err(SerialError::NotStarted);
        }
        Serial::flush(self);
        Ok(())
    }
}

impl<H: Sfr + Gpio> embedded_io::Read for Serial<'_, H> {
    /// Blocks until at least one byte is available, then drains up to `buf.len()`
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.port.is_active() {
            return Err(SerialError::NotStarted);
        }
        while self.port.rx.is_empty() {
            core::hint::spin_loop();
        }
        let mut count = 0;
        while count < buf.len() {
            match self.port.rx.pop() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }
}

impl<H: Sfr + Gpio> embedded_io::ReadReady for Serial<'_, H> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        if !self.port.is_active() {
            return Err(SerialError::NotStarted);
        }
        Ok(!self.port.rx.is_empty())
    }
}
