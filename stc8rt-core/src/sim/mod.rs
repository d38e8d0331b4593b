//! Host-side register model
//!
//! [`SimMcu`] implements [`Sfr`] and [`Gpio`] with just enough peripheral
//! behaviour to run the runtime off-target:
//!
//! - Timer0 in 16-bit auto-reload mode, advanced explicitly in core cycles
//! - UART1 with a transmit log, an injectable receive queue and loopback
//! - the I2C master command engine talking to [`SimI2cDevice`] slaves
//! - edge latching for the five external interrupt lines
//! - interrupt arbitration in vector priority order
//!
//! Interrupts are never taken on their own. Tests call
//! [`Runtime::service_interrupts`] (or [`Runtime::run_cycles`], which does
//! it at every timer overflow) at the points where the hardware would have
//! preempted the foreground, or spin it on a second thread. A handler runs
//! inside the critical section, so it never lands in the middle of one.
//!
//! Enable with the `sim` feature outside this crate's own tests.

mod i2c_device;

pub use i2c_device::{BusEvent, SimI2cDevice, REGISTER_COUNT};

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use heapless::{Deque, Vec};
use stc8rt_hal::sfr::{auxintif, i2ccfg, i2cmscr, i2cmsst, ie, intclko, p_sw2, scon, tcon};
use stc8rt_hal::{Gpio, Level, Pin, PinMode, Reg, Sfr, Vector};

use crate::exti::ExtLine;
use crate::runtime::Runtime;

const REG_COUNT: usize = 19;
const PIN_COUNT: usize = 64;

pub const TX_LOG_CAPACITY: usize = 256;
pub const RX_QUEUE_CAPACITY: usize = 256;
pub const BUS_LOG_CAPACITY: usize = 256;
pub const MAX_I2C_DEVICES: usize = 4;

/// Handler invocations per [`Runtime::service_interrupts`] call before giving up
pub const SERVICE_LIMIT: usize = 10_000;

/// Signal transition on an external interrupt pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

#[derive(Debug, Clone, Copy)]
enum BusPhase {
    Idle,
    Started,
    Writing(Option<usize>),
    Reading(Option<usize>),
}

#[derive(Debug, Clone, Copy)]
struct PinState {
    mode: Option<PinMode>,
    level: Level,
}

struct State {
    regs: [u8; REG_COUNT],

    t0_count: u16,
    t0_reload: u16,
    cycles_per_counter_read: u32,
    hold_for_service: bool,

    tx_log: Vec<u8, TX_LOG_CAPACITY>,
    rx_queue: Deque<u8, RX_QUEUE_CAPACITY>,
    loopback: bool,

    devices: Vec<SimI2cDevice, MAX_I2C_DEVICES>,
    phase: BusPhase,
    slave_acked: bool,
    bus_log: Vec<BusEvent, BUS_LOG_CAPACITY>,
    status_polls: u32,

    pins: [PinState; PIN_COUNT],
}

impl State {
    fn reg(&self, reg: Reg) -> u8 {
        self.regs[reg as usize]
    }

    fn reg_mut(&mut self, reg: Reg) -> &mut u8 {
        &mut self.regs[reg as usize]
    }

    fn advance_timer0(&mut self, cycles: u32) {
        if self.reg(Reg::Tcon) & tcon::TR0 == 0 {
            return;
        }
        let mut remaining = cycles;
        loop {
            let to_overflow = 0x1_0000 - u32::from(self.t0_count);
            if remaining < to_overflow {
                self.t0_count += remaining as u16;
                return;
            }
            if self.hold_for_service && self.reg(Reg::Tcon) & tcon::TF0 != 0 {
                self.t0_count = 0xFFFF;
                return;
            }
            remaining -= to_overflow;
            self.t0_count = self.t0_reload;
            *self.reg_mut(Reg::Tcon) |= tcon::TF0;
        }
    }

    /// Timer0 byte write: counter and reload while stopped, reload only while running
    fn write_timer0(&mut self, high: bool, value: u8) {
        let running = self.reg(Reg::Tcon) & tcon::TR0 != 0;
        let merge = |word: u16| {
            if high {
                (word & 0x00FF) | (u16::from(value) << 8)
            } else {
                (word & 0xFF00) | u16::from(value)
            }
        };
        self.t0_reload = merge(self.t0_reload);
        if !running {
            self.t0_count = merge(self.t0_count);
        }
    }

    fn latch_rx(&mut self) {
        let scon = self.reg(Reg::Scon);
        if scon & scon::REN == 0 || scon & scon::RI != 0 {
            return;
        }
        if let Some(byte) = self.rx_queue.pop_front() {
            *self.reg_mut(Reg::Sbuf) = byte;
            *self.reg_mut(Reg::Scon) |= scon::RI;
        }
    }

    fn transmit(&mut self, byte: u8) {
        let _ = self.tx_log.push(byte);
        *self.reg_mut(Reg::Scon) |= scon::TI;
        if self.loopback {
            let _ = self.rx_queue.push_back(byte);
        }
        self.latch_rx();
    }

    fn log_bus(&mut self, event: BusEvent) {
        let _ = self.bus_log.push(event);
    }

    /// Execute an I2C master command; returns whether it completes
    fn i2c_command(&mut self, cmd: u8) -> bool {
        match cmd {
            i2cmscr::CMD_START => {
                self.phase = BusPhase::Started;
                self.log_bus(BusEvent::Start);
                true
            }
            i2cmscr::CMD_SEND_DATA => {
                let byte = self.reg(Reg::I2cTxd);
                match self.phase {
                    BusPhase::Started => {
                        let read = byte & 1 != 0;
                        let target = self
                            .devices
                            .iter()
                            .position(|d| d.address() == byte >> 1);
                        if let Some(index) = target {
                            self.devices[index].select(read);
                        }
                        self.slave_acked = target.is_some();
                        self.phase = if read {
                            BusPhase::Reading(target)
                        } else {
                            BusPhase::Writing(target)
                        };
                        self.log_bus(BusEvent::Address(byte));
                    }
                    BusPhase::Writing(Some(index)) => {
                        self.devices[index].receive(byte);
                        self.slave_acked = true;
                        self.log_bus(BusEvent::Write(byte));
                    }
                    _ => {
                        self.slave_acked = false;
                        self.log_bus(BusEvent::Write(byte));
                    }
                }
                true
            }
            i2cmscr::CMD_RECV_ACK => {
                let acked = self.slave_acked;
                let status = self.reg_mut(Reg::I2cMsSt);
                if acked {
                    *status &= !i2cmsst::MSACKI;
                } else {
                    *status |= i2cmsst::MSACKI;
                }
                true
            }
            i2cmscr::CMD_RECV_DATA => {
                let byte = match self.phase {
                    BusPhase::Reading(Some(index)) => match self.devices[index].transmit() {
                        Some(byte) => byte,
                        // Slave holds SCL: the command never completes
                        None => return false,
                    },
                    // Nobody drives SDA, the pull-ups win
                    _ => 0xFF,
                };
                *self.reg_mut(Reg::I2cRxd) = byte;
                self.log_bus(BusEvent::Read(byte));
                true
            }
            i2cmscr::CMD_SEND_ACK => {
                if self.reg(Reg::I2cMsSt) & i2cmsst::MSACKO != 0 {
                    self.log_bus(BusEvent::Nak);
                } else {
                    self.log_bus(BusEvent::Ack);
                }
                true
            }
            i2cmscr::CMD_STOP => {
                self.phase = BusPhase::Idle;
                self.log_bus(BusEvent::Stop);
                true
            }
            _ => false,
        }
    }
}

/// Simulated STC8G
///
/// Register state sits behind a critical-section mutex, so a test may run
/// [`Runtime::service_interrupts`] on a second thread the way the hardware
/// preempts the foreground.
pub struct SimMcu {
    state: Mutex<CriticalSectionRawMutex, RefCell<State>>,
}

impl Default for SimMcu {
    fn default() -> Self {
        Self::new()
    }
}

impl SimMcu {
    /// Power-on state: every register zero, nothing attached
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(State {
                regs: [0; REG_COUNT],
                t0_count: 0,
                t0_reload: 0,
                cycles_per_counter_read: 0,
                hold_for_service: false,
                tx_log: Vec::new(),
                rx_queue: Deque::new(),
                loopback: false,
                devices: Vec::new(),
                phase: BusPhase::Idle,
                slave_acked: false,
                bus_log: Vec::new(),
                status_polls: 0,
                pins: [PinState {
                    mode: None,
                    level: Level::Low,
                }; PIN_COUNT],
            })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        self.state.lock(|state| f(&mut state.borrow_mut()))
    }

    // Timer0

    /// Run Timer0 forward, latching TF0 on every overflow
    pub fn advance_timer0(&self, cycles: u32) {
        self.with(|state| state.advance_timer0(cycles));
    }

    /// Cycles until the next overflow, `None` while the timer is stopped
    pub fn cycles_to_overflow(&self) -> Option<u32> {
        self.with(|state| {
            if state.reg(Reg::Tcon) & tcon::TR0 == 0 {
                None
            } else {
                Some(0x1_0000 - u32::from(state.t0_count))
            }
        })
    }

    /// Let time pass on every TL0 read, so busy-wait loops terminate
    pub fn set_cycles_per_counter_read(&self, cycles: u32) {
        self.with(|state| state.cycles_per_counter_read = cycles);
    }

    /// Stall Timer0 one cycle short of an overflow while the previous one
    /// is still unserviced, so a slow interrupt thread never drops a tick
    pub fn set_hold_for_service(&self, hold: bool) {
        self.with(|state| state.hold_for_service = hold);
    }

    pub fn timer0_count(&self) -> u16 {
        self.with(|state| state.t0_count)
    }

    pub fn timer0_reload(&self) -> u16 {
        self.with(|state| state.t0_reload)
    }

    // UART1

    /// Echo every transmitted byte back into the receiver
    pub fn set_uart_loopback(&self, enabled: bool) {
        self.with(|state| state.loopback = enabled);
    }

    /// Queue bytes on the RX line
    pub fn inject_rx(&self, bytes: &[u8]) {
        self.with(|state| {
            for &byte in bytes {
                let _ = state.rx_queue.push_back(byte);
            }
            state.latch_rx();
        })
    }

    /// Every byte written to SBUF so far
    pub fn tx_log(&self) -> Vec<u8, TX_LOG_CAPACITY> {
        self.with(|state| state.tx_log.clone())
    }

    // I2C

    /// Put a slave on the bus
    pub fn attach_i2c_device(&self, device: SimI2cDevice) {
        self.with(|state| {
            let _ = state.devices.push(device);
        });
    }

    /// Snapshot of the slave at `address`
    pub fn i2c_device(&self, address: u8) -> Option<SimI2cDevice> {
        self.with(|state| {
            state
                .devices
                .iter()
                .find(|d| d.address() == address)
                .cloned()
        })
    }

    /// Every bus event so far
    pub fn bus_log(&self) -> Vec<BusEvent, BUS_LOG_CAPACITY> {
        self.with(|state| state.bus_log.clone())
    }

    pub fn clear_bus_log(&self) {
        self.with(|state| state.bus_log.clear());
    }

    /// Status register reads since the last command was issued
    pub fn status_polls(&self) -> u32 {
        self.with(|state| state.status_polls)
    }

    // External interrupts

    /// Drive an edge onto an external interrupt pin
    pub fn trigger_edge(&self, line: ExtLine, edge: Edge) {
        self.with(|state| {
            let latches = match line.edge_select() {
                Some(falling_only) => {
                    edge == Edge::Falling || state.reg(Reg::Tcon) & falling_only == 0
                }
                None => edge == Edge::Falling,
            };
            if latches {
                let (reg, flag) = line.flag();
                *state.reg_mut(reg) |= flag;
            }
        })
    }

    // GPIO

    pub fn pin_mode_of(&self, pin: Pin) -> Option<PinMode> {
        self.with(|state| {
            state
                .pins
                .get(usize::from(pin.number()))
                .and_then(|p| p.mode)
        })
    }

    // Arbitration

    /// Highest-priority interrupt that is pending and enabled
    ///
    /// Entering Timer0, INT0 or INT1 clears their flag, as the hardware does.
    /// UART and INT2-INT4 flags stay set until the handler clears them.
    pub fn take_pending(&self) -> Option<Vector> {
        self.with(|state| {
            let enabled = state.reg(Reg::Ie);
            if enabled & ie::EA == 0 {
                return None;
            }

            let timer = state.reg(Reg::Tcon);
            for (vector, enable, flag) in [
                (Vector::Int0, ie::EX0, tcon::IE0),
                (Vector::Timer0, ie::ET0, tcon::TF0),
                (Vector::Int1, ie::EX1, tcon::IE1),
            ] {
                if enabled & enable != 0 && timer & flag != 0 {
                    *state.reg_mut(Reg::Tcon) &= !flag;
                    return Some(vector);
                }
            }

            if enabled & ie::ES != 0 && state.reg(Reg::Scon) & (scon::RI | scon::TI) != 0 {
                return Some(Vector::Uart1);
            }

            let aux_enabled = state.reg(Reg::Intclko);
            let aux_flags = state.reg(Reg::Auxintif);
            [
                (Vector::Int2, intclko::EX2, auxintif::INT2IF),
                (Vector::Int3, intclko::EX3, auxintif::INT3IF),
                (Vector::Int4, intclko::EX4, auxintif::INT4IF),
            ]
            .into_iter()
            .find(|&(_, enable, flag)| aux_enabled & enable != 0 && aux_flags & flag != 0)
            .map(|(vector, _, _)| vector)
        })
    }
}

impl Sfr for SimMcu {
    fn read(&self, reg: Reg) -> u8 {
        self.with(|state| {
            if reg.is_extended() && state.reg(Reg::PSw2) & p_sw2::EAXFR == 0 {
                return 0;
            }
            match reg {
                Reg::Tl0 => {
                    let value = state.t0_count as u8;
                    let step = state.cycles_per_counter_read;
                    if step > 0 {
                        state.advance_timer0(step);
                    }
                    value
                }
                Reg::Th0 => (state.t0_count >> 8) as u8,
                Reg::I2cMsSt => {
                    state.status_polls = state.status_polls.saturating_add(1);
                    state.reg(reg)
                }
                _ => state.reg(reg),
            }
        })
    }

    fn write(&self, reg: Reg, value: u8) {
        self.with(|state| {
            if reg.is_extended() && state.reg(Reg::PSw2) & p_sw2::EAXFR == 0 {
                return;
            }
            match reg {
                Reg::Tl0 => state.write_timer0(false, value),
                Reg::Th0 => state.write_timer0(true, value),
                Reg::Sbuf => state.transmit(value),
                Reg::Scon => {
                    *state.reg_mut(reg) = value;
                    state.latch_rx();
                }
                Reg::I2cMsCr => {
                    *state.reg_mut(reg) = value;
                    state.status_polls = 0;
                    let cfg = state.reg(Reg::I2cCfg);
                    let ready = i2ccfg::ENI2C | i2ccfg::MSSL;
                    if cfg & ready == ready && state.i2c_command(value & i2cmscr::CMD_MASK) {
                        *state.reg_mut(Reg::I2cMsSt) |= i2cmsst::MSIF;
                    }
                }
                _ => *state.reg_mut(reg) = value,
            }
        })
    }
}

impl Gpio for SimMcu {
    fn pin_mode(&self, pin: Pin, mode: PinMode) {
        self.with(|state| {
            if let Some(p) = state.pins.get_mut(usize::from(pin.number())) {
                p.mode = Some(mode);
            }
        });
    }

    fn digital_write(&self, pin: Pin, level: Level) {
        self.with(|state| {
            if let Some(p) = state.pins.get_mut(usize::from(pin.number())) {
                p.level = level;
            }
        });
    }

    fn digital_read(&self, pin: Pin) -> Level {
        self.with(|state| {
            state
                .pins
                .get(usize::from(pin.number()))
                .map_or(Level::Low, |p| p.level)
        })
    }
}

impl Runtime<SimMcu> {
    /// Run every pending, enabled handler; returns how many ran
    pub fn service_interrupts(&self) -> usize {
        let mut serviced = 0;
        while serviced < SERVICE_LIMIT {
            // Vector entry and handler run as one step, as on the core
            let entered = self.hw().state.lock(|_| {
                let vector = self.hw().take_pending()?;
                self.on_interrupt(vector);
                Some(vector)
            });
            if entered.is_none() {
                break;
            }
            serviced += 1;
        }
        serviced
    }

    /// Let `cycles` core cycles pass, servicing interrupts at each overflow
    pub fn run_cycles(&self, cycles: u32) {
        let mut remaining = cycles;
        while remaining > 0 {
            let step = self
                .hw()
                .cycles_to_overflow()
                .map_or(remaining, |n| n.min(remaining));
            self.hw().advance_timer0(step);
            remaining -= step;
            self.service_interrupts();
        }
    }
}
