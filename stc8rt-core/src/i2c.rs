//! I2C master engine
//!
//! Drives the STC8G hardware I2C master through its command register: every
//! bus primitive (START, send byte, receive ACK, receive byte, send ACK/NAK,
//! STOP) is one command followed by a bounded wait for the completion flag.
//!
//! A wait that runs out of iterations is not an error. The primitive carries
//! on with whatever the data register holds, so a wedged bus degrades into
//! garbage bytes instead of a hang. The one exception is [`Wire::request_from`],
//! which stops at the first receive that times out so that only bytes the
//! slave actually clocked out reach the receive buffer.
//!
//! Slave ACK bits are sampled but not checked: a missing device still
//! "succeeds". Use a driver-level probe when presence matters.

use embedded_hal::i2c::{ErrorKind, ErrorType, NoAcknowledgeSource, Operation, SevenBitAddress};
use portable_atomic::{AtomicBool, AtomicU32, Ordering};
use stc8rt_hal::sfr::{i2ccfg, i2cmscr, i2cmsst, p_sw2};
use stc8rt_hal::{Gpio, I2cConfig, I2cPins, PinMode, Reg, Sfr};

use crate::ring_buffer::RingBuffer;

/// Slots in the receive ring buffer
pub const I2C_BUFFER_SIZE: usize = 64;

/// Status polls before a command is considered finished anyway
pub const WAIT_ITERATIONS: u16 = 5_000;

/// Bus clock used until [`Wire::set_clock`] says otherwise
pub const DEFAULT_FREQUENCY: u32 = 100_000;

/// MSSPEED prescale for a bus frequency
///
/// The bus runs at `core_clock / (2 * (2 * MSSPEED + 4))`. Out-of-range
/// requests clamp to the slowest (63) or fastest (0) setting; a zero
/// frequency selects the slowest.
pub const fn i2c_prescale(core_clock_hz: u32, frequency: u32) -> u8 {
    if frequency == 0 {
        return i2ccfg::MSSPEED_MASK;
    }
    let speed = (core_clock_hz / frequency / 2).saturating_sub(4) / 2;
    if speed > i2ccfg::MSSPEED_MASK as u32 {
        i2ccfg::MSSPEED_MASK
    } else {
        speed as u8
    }
}

/// I2C errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WireError {
    /// [`Wire::end_transmission`] without a matching begin
    NotTransmitting,
    /// The slave stopped sending before the requested count
    ShortRead { requested: usize, received: usize },
}

impl WireError {
    /// Arduino-style status code (4 = other error)
    pub const fn code(self) -> u8 {
        match self {
            WireError::NotTransmitting | WireError::ShortRead { .. } => 4,
        }
    }
}

impl embedded_hal::i2c::Error for WireError {
    fn kind(&self) -> ErrorKind {
        match self {
            WireError::NotTransmitting => ErrorKind::Other,
            WireError::ShortRead { .. } => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
        }
    }
}

/// I2C engine state
pub struct WireState {
    rx: RingBuffer<I2C_BUFFER_SIZE>,
    transmitting: AtomicBool,
    clock_hz: AtomicU32,
}

impl Default for WireState {
    fn default() -> Self {
        Self::new()
    }
}

impl WireState {
    pub const fn new() -> Self {
        Self {
            rx: RingBuffer::new(),
            transmitting: AtomicBool::new(false),
            clock_hz: AtomicU32::new(DEFAULT_FREQUENCY),
        }
    }
}

/// I2C master handle
pub struct Wire<'a, H> {
    state: &'a WireState,
    hw: &'a H,
    core_clock_hz: u32,
}

impl<H> Clone for Wire<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H> Copy for Wire<'_, H> {}

impl<'a, H: Sfr + Gpio> Wire<'a, H> {
    pub(crate) fn new(state: &'a WireState, hw: &'a H, core_clock_hz: u32) -> Self {
        Self {
            state,
            hw,
            core_clock_hz,
        }
    }

    // Bus primitives

    fn enable_xfr(&self) {
        self.hw.set_bits(Reg::PSw2, p_sw2::EAXFR);
    }

    /// Poll for command completion and clear the flag
    fn wait(&self) -> bool {
        let mut status = 0;
        for _ in 0..WAIT_ITERATIONS {
            status = self.hw.read(Reg::I2cMsSt);
            if status & i2cmsst::MSIF != 0 {
                self.hw.write(Reg::I2cMsSt, status & !i2cmsst::MSIF);
                return true;
            }
        }
        self.hw.write(Reg::I2cMsSt, status & !i2cmsst::MSIF);
        false
    }

    fn command(&self, cmd: u8) -> bool {
        self.hw.write(Reg::I2cMsCr, cmd & i2cmscr::CMD_MASK);
        self.wait()
    }

    fn start(&self) {
        self.command(i2cmscr::CMD_START);
    }

    fn stop(&self) {
        self.command(i2cmscr::CMD_STOP);
    }

    fn send_byte(&self, byte: u8) {
        self.hw.write(Reg::I2cTxd, byte);
        self.command(i2cmscr::CMD_SEND_DATA);
    }

    /// Clock in the slave's ACK bit; `true` means acknowledged
    fn recv_ack(&self) -> bool {
        self.command(i2cmscr::CMD_RECV_ACK);
        !self.hw.is_set(Reg::I2cMsSt, i2cmsst::MSACKI)
    }

    /// Clock in a data byte; `None` if the slave never completed it
    fn recv_byte(&self) -> Option<u8> {
        if self.command(i2cmscr::CMD_RECV_DATA) {
            Some(self.hw.read(Reg::I2cRxd))
        } else {
            None
        }
    }

    fn send_ack(&self) {
        self.hw.write(Reg::I2cMsSt, 0x00);
        self.command(i2cmscr::CMD_SEND_ACK);
    }

    fn send_nak(&self) {
        self.hw.write(Reg::I2cMsSt, i2cmsst::MSACKO);
        self.command(i2cmscr::CMD_SEND_ACK);
    }

    /// START, then the address byte with the direction bit
    fn address_slave(&self, address: u8, read: bool) {
        self.start();
        self.send_byte((address << 1) | u8::from(read));
        self.recv_ack();
    }

    /// Fill a run of adjacent read operations as one bus read
    ///
    /// Every byte is ACKed except the last one of the run, which gets the
    /// NAK that ends the slave's transfer.
    fn read_run(&self, run: &mut [Operation<'_>]) -> Result<(), WireError> {
        let requested = run
            .iter()
            .map(|operation| match operation {
                Operation::Read(buf) => buf.len(),
                Operation::Write(_) => 0,
            })
            .sum::<usize>();
        let mut received = 0;
        for operation in run.iter_mut() {
            let Operation::Read(buf) = operation else {
                continue;
            };
            for slot in buf.iter_mut() {
                let Some(byte) = self.recv_byte() else {
                    return Err(WireError::ShortRead {
                        requested,
                        received,
                    });
                };
                *slot = byte;
                received += 1;
                if received < requested {
                    self.send_ack();
                } else {
                    self.send_nak();
                }
            }
        }
        Ok(())
    }

    // Public surface

    /// Enable the master on the default pins at the current clock
    pub fn begin(&self) {
        self.begin_with_pins(I2cPins::default());
    }

    /// Enable the master on a specific pin pair at the current clock
    pub fn begin_with_pins(&self, pins: I2cPins) {
        self.begin_with_config(I2cConfig {
            frequency: self.clock(),
            pins,
        });
    }

    /// Enable the master
    pub fn begin_with_config(&self, config: I2cConfig) {
        let hw = self.hw;
        let pins = config.pins;
        hw.pin_mode(pins.scl(), PinMode::OutputOpenDrainPullUp);
        hw.pin_mode(pins.sda(), PinMode::OutputOpenDrainPullUp);
        hw.write_field(Reg::PSw2, p_sw2::I2C_S_MASK, pins.i2c_s_bits());

        self.set_clock(config.frequency);
        hw.write(Reg::I2cMsSt, 0x00);

        self.state.rx.reset();
        self.state.transmitting.store(false, Ordering::Release);
        debug!("wire begin: {} Hz", config.frequency);
    }

    /// Disable the I2C block
    pub fn end(&self) {
        self.enable_xfr();
        self.hw.write(Reg::I2cCfg, 0x00);
        self.state.transmitting.store(false, Ordering::Release);
        debug!("wire end");
    }

    /// Set the bus clock
    ///
    /// Rewrites I2CCFG in a single store, so the enable and master bits are
    /// never observed cleared.
    pub fn set_clock(&self, frequency: u32) {
        self.state.clock_hz.store(frequency, Ordering::Relaxed);
        let speed = i2c_prescale(self.core_clock_hz, frequency);
        self.enable_xfr();
        self.hw
            .write(Reg::I2cCfg, i2ccfg::ENI2C | i2ccfg::MSSL | speed);
    }

    /// Bus clock last requested
    pub fn clock(&self) -> u32 {
        self.state.clock_hz.load(Ordering::Relaxed)
    }

    /// START and address a slave for writing
    pub fn begin_transmission(&self, address: u8) {
        self.state.transmitting.store(true, Ordering::Release);
        self.address_slave(address, false);
    }

    /// Send one byte within a transmission
    ///
    /// Returns 0 without touching the bus when no transmission is open.
    pub fn write(&self, byte: u8) -> usize {
        if !self.state.transmitting.load(Ordering::Acquire) {
            return 0;
        }
        self.send_byte(byte);
        self.recv_ack();
        1
    }

    /// Send a slice within a transmission
    pub fn write_bytes(&self, bytes: &[u8]) -> usize {
        bytes.iter().map(|&b| self.write(b)).sum()
    }

    /// Close a transmission, optionally releasing the bus with STOP
    pub fn end_transmission(&self, send_stop: bool) -> Result<(), WireError> {
        if !self.state.transmitting.swap(false, Ordering::AcqRel) {
            return Err(WireError::NotTransmitting);
        }
        if send_stop {
            self.stop();
        }
        Ok(())
    }

    /// Read up to `quantity` bytes from a slave into the receive buffer
    ///
    /// The request is clamped to the buffer size. Bytes are appended to
    /// whatever is still unread. Returns the number of bytes stored.
    pub fn request_from(&self, address: u8, quantity: u8, send_stop: bool) -> u8 {
        if quantity == 0 {
            return 0;
        }
        let quantity = quantity.min(I2C_BUFFER_SIZE as u8);
        self.address_slave(address, true);

        let mut stored = 0;
        for index in 0..quantity {
            let Some(byte) = self.recv_byte() else {
                warn!("wire: slave {=u8:#x} stalled after {} bytes", address, index);
                break;
            };
            if self.state.rx.push(byte).is_ok() {
                stored += 1;
            }
            if index + 1 < quantity {
                self.send_ack();
            } else {
                self.send_nak();
            }
        }

        if send_stop {
            self.stop();
        }
        stored
    }

    /// Bytes waiting in the receive buffer
    pub fn available(&self) -> usize {
        self.state.rx.available()
    }

    /// Take the oldest received byte
    pub fn read(&self) -> Option<u8> {
        self.state.rx.pop()
    }

    /// Look at the oldest received byte without consuming it
    pub fn peek(&self) -> Option<u8> {
        self.state.rx.peek()
    }
}

impl<H> ErrorType for Wire<'_, H> {
    type Error = WireError;
}

/// Adjacent operations of the same kind share one START and address byte;
/// a change of direction issues a repeated START. Reads bypass the receive
/// ring, so bytes buffered by [`Wire::request_from`] are left alone.
impl<H: Sfr + Gpio> embedded_hal::i2c::I2c<SevenBitAddress> for Wire<'_, H> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }
        let is_read = |operation: &Operation<'_>| matches!(operation, Operation::Read(_));

        let mut first = 0;
        while first < operations.len() {
            let reading = is_read(&operations[first]);
            let end = operations[first..]
                .iter()
                .position(|operation| is_read(operation) != reading)
                .map_or(operations.len(), |offset| first + offset);
            let run = &mut operations[first..end];

            self.address_slave(address, reading);
            if reading {
                if let Err(err) = self.read_run(run) {
                    warn!("wire: slave {=u8:#x} stalled mid-read", address);
                    self.stop();
                    return Err(err);
                }
            } else {
                for operation in run.iter() {
                    if let Operation::Write(bytes) = operation {
                        for &byte in bytes.iter() {
                            self.send_byte(byte);
                            self.recv_ack();
                        }
                    }
                }
            }
            first = end;
        }
        self.stop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::runtime::Runtime;
    use crate::sim::{BusEvent, SimI2cDevice, SimMcu};
    use embedded_hal::i2c::I2c;
    use stc8rt_hal::Pin;

    fn runtime() -> Runtime<SimMcu> {
        Runtime::new(SimMcu::new(), CoreConfig::DEFAULT)
    }

    #[test]
    fn test_prescale_values() {
        assert_eq!(i2c_prescale(24_000_000, 100_000), 58);
        assert_eq!(i2c_prescale(24_000_000, 400_000), 13);
        assert_eq!(i2c_prescale(24_000_000, 1_000), 63);
        assert_eq!(i2c_prescale(24_000_000, 10_000_000), 0);
        assert_eq!(i2c_prescale(24_000_000, 0), 63);
    }

    #[test]
    fn test_begin_enables_master() {
        let rt = runtime();
        rt.wire().begin();

        let hw = rt.hw();
        assert!(hw.is_set(Reg::PSw2, p_sw2::EAXFR));
        assert_eq!(hw.read(Reg::I2cCfg), i2ccfg::ENI2C | i2ccfg::MSSL | 58);
        assert_eq!(hw.read(Reg::PSw2) & p_sw2::I2C_S_MASK, 0);
        assert_eq!(hw.pin_mode_of(Pin::P3_2), Some(PinMode::OutputOpenDrainPullUp));
        assert_eq!(hw.pin_mode_of(Pin::P3_3), Some(PinMode::OutputOpenDrainPullUp));
    }

    #[test]
    fn test_set_clock_keeps_master_enabled() {
        let rt = runtime();
        let wire = rt.wire();
        wire.begin_with_config(I2cConfig::STANDARD.with_pins(I2cPins::P54P55));
        wire.set_clock(400_000);

        assert_eq!(wire.clock(), 400_000);
        assert_eq!(
            rt.hw().read(Reg::I2cCfg),
            i2ccfg::ENI2C | i2ccfg::MSSL | 13
        );
        assert_eq!(rt.hw().read(Reg::PSw2) & p_sw2::I2C_S_MASK, 0x20);

        wire.end();
        assert_eq!(rt.hw().read(Reg::I2cCfg), 0);
    }

    #[test]
    fn test_register_write_transaction() {
        let rt = runtime();
        rt.hw().attach_i2c_device(SimI2cDevice::new(0x68));
        let wire = rt.wire();
        wire.begin();

        wire.begin_transmission(0x68);
        assert_eq!(wire.write(0x02), 1);
        assert_eq!(wire.write_bytes(&[0x42, 0x43]), 2);
        assert_eq!(wire.end_transmission(true), Ok(()));

        assert_eq!(
            rt.hw().bus_log(),
            [
                BusEvent::Start,
                BusEvent::Address(0xD0),
                BusEvent::Write(0x02),
                BusEvent::Write(0x42),
                BusEvent::Write(0x43),
                BusEvent::Stop,
            ]
        );
        let device = rt.hw().i2c_device(0x68).unwrap();
        assert_eq!(device.register(0x02), 0x42);
        assert_eq!(device.register(0x03), 0x43);
    }

    #[test]
    fn test_write_outside_transmission_is_noop() {
        let rt = runtime();
        let wire = rt.wire();
        wire.begin();
        assert_eq!(wire.write(0x55), 0);
        assert!(rt.hw().bus_log().is_empty());
    }

    #[test]
    fn test_end_without_begin() {
        let rt = runtime();
        let wire = rt.wire();
        wire.begin();
        let err = wire.end_transmission(true).unwrap_err();
        assert_eq!(err, WireError::NotTransmitting);
        assert_eq!(err.code(), 4);
        assert!(rt.hw().bus_log().is_empty());
    }

    #[test]
    fn test_repeated_start_keeps_bus() {
        let rt = runtime();
        rt.hw().attach_i2c_device(SimI2cDevice::new(0x50));
        let wire = rt.wire();
        wire.begin();
        wire.begin_transmission(0x50);
        wire.write(0x00);
        assert_eq!(wire.end_transmission(false), Ok(()));
        assert_eq!(rt.hw().bus_log().last(), Some(&BusEvent::Write(0x00)));
    }

    #[test]
    fn test_missing_slave_still_succeeds() {
        let rt = runtime();
        let wire = rt.wire();
        wire.begin();
        wire.begin_transmission(0x27);
        wire.write(0x01);
        assert_eq!(wire.end_transmission(true), Ok(()));
    }

    #[test]
    fn test_request_from_reads_registers() {
        let rt = runtime();
        rt.hw().attach_i2c_device(
            SimI2cDevice::new(0x50).with_registers(0, &[0x11, 0x22, 0x33]),
        );
        let wire = rt.wire();
        wire.begin();

        assert_eq!(wire.request_from(0x50, 3, true), 3);
        assert_eq!(
            rt.hw().bus_log(),
            [
                BusEvent::Start,
                BusEvent::Address(0xA1),
                BusEvent::Read(0x11),
                BusEvent::Ack,
                BusEvent::Read(0x22),
                BusEvent::Ack,
                BusEvent::Read(0x33),
                BusEvent::Nak,
                BusEvent::Stop,
            ]
        );
        assert_eq!(wire.available(), 3);
        assert_eq!(wire.peek(), Some(0x11));
        assert_eq!(wire.read(), Some(0x11));
        assert_eq!(wire.read(), Some(0x22));
        assert_eq!(wire.read(), Some(0x33));
        assert_eq!(wire.read(), None);
    }

    #[test]
    fn test_request_from_stops_when_slave_goes_silent() {
        let rt = runtime();
        rt.hw().attach_i2c_device(
            SimI2cDevice::new(0x68)
                .with_registers(0, &[1, 2, 3, 4, 5, 6, 7])
                .with_read_limit(3),
        );
        let wire = rt.wire();
        wire.begin();

        assert_eq!(wire.request_from(0x68, 7, false), 3);
        assert_eq!(wire.available(), 3);
        // The stalled receive polled exactly up to the cap
        assert_eq!(rt.hw().status_polls(), u32::from(WAIT_ITERATIONS));
        assert_eq!(rt.hw().bus_log().last(), Some(&BusEvent::Ack));
        assert_eq!(wire.read(), Some(1));
        assert_eq!(wire.read(), Some(2));
        assert_eq!(wire.read(), Some(3));
    }

    #[test]
    fn test_request_from_stall_still_releases_bus() {
        let rt = runtime();
        rt.hw().attach_i2c_device(
            SimI2cDevice::new(0x68)
                .with_registers(0, &[1, 2, 3, 4, 5, 6, 7])
                .with_read_limit(3),
        );
        let wire = rt.wire();
        wire.begin();

        assert_eq!(wire.request_from(0x68, 7, true), 3);
        assert_eq!(
            rt.hw().bus_log(),
            [
                BusEvent::Start,
                BusEvent::Address(0xD1),
                BusEvent::Read(1),
                BusEvent::Ack,
                BusEvent::Read(2),
                BusEvent::Ack,
                BusEvent::Read(3),
                BusEvent::Ack,
                BusEvent::Stop,
            ]
        );
        assert_eq!(wire.available(), 3);
    }

    #[test]
    fn test_request_from_zero_touches_nothing() {
        let rt = runtime();
        let wire = rt.wire();
        wire.begin();
        assert_eq!(wire.request_from(0x50, 0, true), 0);
        assert!(rt.hw().bus_log().is_empty());
    }

    #[test]
    fn test_request_from_clamps_to_buffer() {
        let rt = runtime();
        rt.hw().attach_i2c_device(SimI2cDevice::new(0x50));
        let wire = rt.wire();
        wire.begin();
        assert_eq!(wire.request_from(0x50, 200, true), (I2C_BUFFER_SIZE - 1) as u8);
        let reads = rt
            .hw()
            .bus_log()
            .iter()
            .filter(|e| matches!(e, BusEvent::Read(_)))
            .count();
        assert_eq!(reads, I2C_BUFFER_SIZE);
    }

    #[test]
    fn test_request_from_appends() {
        let rt = runtime();
        rt.hw().attach_i2c_device(
            SimI2cDevice::new(0x50).with_registers(0, &[9, 8]),
        );
        let wire = rt.wire();
        wire.begin();
        wire.request_from(0x50, 1, true);
        wire.request_from(0x50, 1, true);
        assert_eq!(wire.available(), 2);
    }

    #[test]
    fn test_embedded_hal_write_read() {
        let rt = runtime();
        rt.hw().attach_i2c_device(
            SimI2cDevice::new(0x68).with_registers(0x10, &[0xAA, 0xBB]),
        );
        let mut wire = rt.wire();
        wire.begin();

        let mut buf = [0u8; 2];
        wire.write_read(0x68, &[0x10], &mut buf).unwrap();
        assert_eq!(buf, [0xAA, 0xBB]);
        assert_eq!(
            &rt.hw().bus_log()[..4],
            [
                BusEvent::Start,
                BusEvent::Address(0xD0),
                BusEvent::Write(0x10),
                BusEvent::Start,
            ]
        );
    }

    #[test]
    fn test_embedded_hal_short_read() {
        let rt = runtime();
        rt.hw()
            .attach_i2c_device(SimI2cDevice::new(0x68).with_read_limit(1));
        let mut wire = rt.wire();
        wire.begin();

        let mut buf = [0u8; 4];
        assert_eq!(
            I2c::read(&mut wire, 0x68, &mut buf),
            Err(WireError::ShortRead {
                requested: 4,
                received: 1
            })
        );
        assert_eq!(wire.available(), 0);
    }

    #[test]
    fn test_adjacent_writes_share_one_address() {
        let rt = runtime();
        rt.hw().attach_i2c_device(SimI2cDevice::new(0x68));
        let mut wire = rt.wire();
        wire.begin();

        let mut operations = [Operation::Write(&[0x02]), Operation::Write(&[0x42])];
        wire.transaction(0x68, &mut operations).unwrap();
        assert_eq!(
            rt.hw().bus_log(),
            [
                BusEvent::Start,
                BusEvent::Address(0xD0),
                BusEvent::Write(0x02),
                BusEvent::Write(0x42),
                BusEvent::Stop,
            ]
        );
        assert_eq!(rt.hw().i2c_device(0x68).unwrap().register(0x02), 0x42);
    }

    #[test]
    fn test_long_read_is_one_transfer() {
        let rt = runtime();
        let pattern: [u8; 64] = core::array::from_fn(|i| i as u8 ^ 0x5A);
        rt.hw()
            .attach_i2c_device(SimI2cDevice::new(0x50).with_registers(0, &pattern));
        let mut wire = rt.wire();
        wire.begin();

        let mut buf = [0u8; 100];
        I2c::read(&mut wire, 0x50, &mut buf).unwrap();
        for (i, &byte) in buf.iter().enumerate() {
            assert_eq!(byte, pattern[i % 64]);
        }

        let log = rt.hw().bus_log();
        let count = |event: BusEvent| log.iter().filter(|&&e| e == event).count();
        assert_eq!(count(BusEvent::Start), 1);
        assert_eq!(count(BusEvent::Nak), 1);
        assert_eq!(count(BusEvent::Ack), 99);
        assert_eq!(log[log.len() - 2], BusEvent::Nak);
        assert_eq!(log.last(), Some(&BusEvent::Stop));
    }

    #[test]
    fn test_adjacent_reads_nak_only_the_last_byte() {
        let rt = runtime();
        rt.hw().attach_i2c_device(
            SimI2cDevice::new(0x50).with_registers(0, &[0x11, 0x22, 0x33]),
        );
        let mut wire = rt.wire();
        wire.begin();

        let (mut head, mut tail) = ([0u8; 1], [0u8; 2]);
        let mut operations = [Operation::Read(&mut head), Operation::Read(&mut tail)];
        wire.transaction(0x50, &mut operations).unwrap();
        assert_eq!((head, tail), ([0x11], [0x22, 0x33]));
        assert_eq!(
            rt.hw().bus_log(),
            [
                BusEvent::Start,
                BusEvent::Address(0xA1),
                BusEvent::Read(0x11),
                BusEvent::Ack,
                BusEvent::Read(0x22),
                BusEvent::Ack,
                BusEvent::Read(0x33),
                BusEvent::Nak,
                BusEvent::Stop,
            ]
        );
    }
}
