//! Special function register access
//!
//! Names every register the runtime touches, the bit layout of each, and the
//! [`Sfr`] trait through which all accesses flow.

/// Registers used by the runtime
///
/// Core SFRs live in the 0x80-0xFF direct space. The I2C block lives in the
/// extended XFR space at 0xFE80 and is only reachable while
/// [`p_sw2::EAXFR`] is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reg {
    /// Timer control (run bits, overflow flags, INT0/INT1 edge and flags)
    Tcon,
    /// Timer mode
    Tmod,
    /// Timer0 low byte
    Tl0,
    /// Timer1 low byte
    Tl1,
    /// Timer0 high byte
    Th0,
    /// Timer1 high byte
    Th1,
    /// Auxiliary register (1T mode selection, UART1 baud source)
    Auxr,
    /// UART1 control
    Scon,
    /// UART1 data buffer (write: transmit holding, read: receive)
    Sbuf,
    /// Interrupt enable
    Ie,
    /// Peripheral pin switch 1 (UART1 routing)
    PSw1,
    /// Peripheral pin switch 2 (extended SFR access, I2C routing)
    PSw2,
    /// INT2-INT4 enable and clock output control
    Intclko,
    /// Auxiliary interrupt flags (INT2-INT4)
    Auxintif,
    /// I2C configuration
    I2cCfg,
    /// I2C master control (command register)
    I2cMsCr,
    /// I2C master status
    I2cMsSt,
    /// I2C transmit data
    I2cTxd,
    /// I2C receive data
    I2cRxd,
}

impl Reg {
    /// Bus address of the register
    pub const fn address(self) -> u16 {
        match self {
            Reg::Tcon => 0x88,
            Reg::Tmod => 0x89,
            Reg::Tl0 => 0x8A,
            Reg::Tl1 => 0x8B,
            Reg::Th0 => 0x8C,
            Reg::Th1 => 0x8D,
            Reg::Auxr => 0x8E,
            Reg::Scon => 0x98,
            Reg::Sbuf => 0x99,
            Reg::Ie => 0xA8,
            Reg::PSw1 => 0xA2,
            Reg::PSw2 => 0xBA,
            Reg::Intclko => 0x8F,
            Reg::Auxintif => 0xEF,
            Reg::I2cCfg => 0xFE80,
            Reg::I2cMsCr => 0xFE81,
            Reg::I2cMsSt => 0xFE82,
            Reg::I2cTxd => 0xFE86,
            Reg::I2cRxd => 0xFE87,
        }
    }

    /// Whether the register lives in the extended (XFR) space
    pub const fn is_extended(self) -> bool {
        self.address() > 0xFF
    }
}

/// TCON bits
pub mod tcon {
    /// INT0 edge select (1 = falling only, 0 = both edges)
    pub const IT0: u8 = 1 << 0;
    /// INT0 pending flag
    pub const IE0: u8 = 1 << 1;
    /// INT1 edge select (1 = falling only, 0 = both edges)
    pub const IT1: u8 = 1 << 2;
    /// INT1 pending flag
    pub const IE1: u8 = 1 << 3;
    /// Timer0 run
    pub const TR0: u8 = 1 << 4;
    /// Timer0 overflow flag
    pub const TF0: u8 = 1 << 5;
    /// Timer1 run
    pub const TR1: u8 = 1 << 6;
    /// Timer1 overflow flag
    pub const TF1: u8 = 1 << 7;
}

/// TMOD fields
pub mod tmod {
    /// Timer0 nibble (GATE, C/T, M1, M0)
    pub const T0_MASK: u8 = 0x0F;
    /// Timer1 nibble (GATE, C/T, M1, M0)
    pub const T1_MASK: u8 = 0xF0;
}

/// AUXR bits
pub mod auxr {
    /// Timer0 counts every system clock (1T) instead of every 12
    pub const T0X12: u8 = 1 << 7;
    /// Timer1 counts every system clock (1T) instead of every 12
    pub const T1X12: u8 = 1 << 6;
    /// UART1 takes its baud clock from Timer2 instead of Timer1
    pub const S1ST2: u8 = 1 << 0;
}

/// SCON bits
pub mod scon {
    /// Receive complete flag
    pub const RI: u8 = 1 << 0;
    /// Transmit complete flag
    pub const TI: u8 = 1 << 1;
    /// Receiver enable
    pub const REN: u8 = 1 << 4;
    /// Mode 1: 8-bit UART, variable baud, receiver enabled
    pub const MODE1_RX: u8 = 0x50;
}

/// IE bits
pub mod ie {
    /// INT0 enable
    pub const EX0: u8 = 1 << 0;
    /// Timer0 interrupt enable
    pub const ET0: u8 = 1 << 1;
    /// INT1 enable
    pub const EX1: u8 = 1 << 2;
    /// UART1 interrupt enable
    pub const ES: u8 = 1 << 4;
    /// Global interrupt enable
    pub const EA: u8 = 1 << 7;
}

/// INTCLKO bits
pub mod intclko {
    /// INT2 enable
    pub const EX2: u8 = 1 << 4;
    /// INT3 enable
    pub const EX3: u8 = 1 << 5;
    /// INT4 enable
    pub const EX4: u8 = 1 << 6;
}

/// AUXINTIF bits
pub mod auxintif {
    /// INT2 pending flag
    pub const INT2IF: u8 = 1 << 4;
    /// INT3 pending flag
    pub const INT3IF: u8 = 1 << 5;
    /// INT4 pending flag
    pub const INT4IF: u8 = 1 << 6;
}

/// P_SW1 fields
pub mod p_sw1 {
    /// UART1 pin routing field
    pub const S1_S_MASK: u8 = 0xC0;
}

/// P_SW2 fields
pub mod p_sw2 {
    /// Extended SFR access enable
    pub const EAXFR: u8 = 1 << 7;
    /// I2C pin routing field
    pub const I2C_S_MASK: u8 = 0x30;
}

/// I2CCFG bits
pub mod i2ccfg {
    /// I2C peripheral enable
    pub const ENI2C: u8 = 1 << 7;
    /// Master mode select
    pub const MSSL: u8 = 1 << 6;
    /// Bus speed prescale field
    pub const MSSPEED_MASK: u8 = 0x3F;
}

/// I2CMSCR command codes
pub mod i2cmscr {
    /// Generate START
    pub const CMD_START: u8 = 0x01;
    /// Shift out I2CTXD
    pub const CMD_SEND_DATA: u8 = 0x02;
    /// Sample the slave's ACK bit into MSACKI
    pub const CMD_RECV_ACK: u8 = 0x03;
    /// Shift in a byte to I2CRXD
    pub const CMD_RECV_DATA: u8 = 0x04;
    /// Drive MSACKO onto the bus as the master's ACK/NAK
    pub const CMD_SEND_ACK: u8 = 0x05;
    /// Generate STOP
    pub const CMD_STOP: u8 = 0x06;
    /// Command field
    pub const CMD_MASK: u8 = 0x0F;
}

/// I2CMSST bits
pub mod i2cmsst {
    /// Master command complete
    pub const MSIF: u8 = 1 << 6;
    /// ACK bit received from the slave (1 = NAK)
    pub const MSACKI: u8 = 1 << 1;
    /// ACK bit to send (1 = NAK)
    pub const MSACKO: u8 = 1 << 0;
}

/// Interrupt vector numbers
///
/// Numbering follows the 8051 vector table, so the handler for vector `n`
/// sits at code address `0x0003 + 8 * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Vector {
    Int0,
    Timer0,
    Int1,
    Timer1,
    Uart1,
    Int2,
    Int3,
    Int4,
}

impl Vector {
    /// Vector table index
    pub const fn number(self) -> u8 {
        match self {
            Vector::Int0 => 0,
            Vector::Timer0 => 1,
            Vector::Int1 => 2,
            Vector::Timer1 => 3,
            Vector::Uart1 => 4,
            Vector::Int2 => 10,
            Vector::Int3 => 11,
            Vector::Int4 => 16,
        }
    }

    /// Look up a vector by table index
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            0 => Some(Vector::Int0),
            1 => Some(Vector::Timer0),
            2 => Some(Vector::Int1),
            3 => Some(Vector::Timer1),
            4 => Some(Vector::Uart1),
            10 => Some(Vector::Int2),
            11 => Some(Vector::Int3),
            16 => Some(Vector::Int4),
            _ => None,
        }
    }
}

/// Special function register access
///
/// Receivers are `&self`: registers are shared between foreground code and
/// interrupt handlers, so exclusive borrows would be a fiction.
///
/// TCON, SCON and IE are bit-addressable; chip implementations should
/// override [`Sfr::set_bits`] and [`Sfr::clear_bits`] with single-bit
/// `SETB`/`CLR` for those. The default read-modify-write versions are only
/// safe when every other writer of the register is masked.
pub trait Sfr {
    /// Read a register
    fn read(&self, reg: Reg) -> u8;

    /// Write a register
    fn write(&self, reg: Reg, value: u8);

    /// Read-modify-write a register
    fn modify<F>(&self, reg: Reg, f: F)
    where
        F: FnOnce(u8) -> u8,
    {
        let value = self.read(reg);
        self.write(reg, f(value));
    }

    /// Set the bits in `mask`
    fn set_bits(&self, reg: Reg, mask: u8) {
        self.modify(reg, |v| v | mask);
    }

    /// Clear the bits in `mask`
    fn clear_bits(&self, reg: Reg, mask: u8) {
        self.modify(reg, |v| v & !mask);
    }

    /// Replace the bits selected by `mask` with the matching bits of `value`
    fn write_field(&self, reg: Reg, mask: u8, value: u8) {
        self.modify(reg, |v| (v & !mask) | (value & mask));
    }

    /// Check whether any bit in `mask` is set
    fn is_set(&self, reg: Reg, mask: u8) -> bool {
        self.read(reg) & mask != 0
    }
}
