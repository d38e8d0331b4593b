//! External interrupt lines
//!
//! Five lines, INT0 through INT4, each with one callback slot. INT0 and INT1
//! can trigger on both edges or on the falling edge only; INT2-INT4 are
//! falling-edge only in hardware, so any other request is coerced.
//!
//! | Line | Pin  | Enable          | Pending flag       |
//! |------|------|-----------------|--------------------|
//! | INT0 | P3.2 | `IE.EX0`        | `TCON.IE0`         |
//! | INT1 | P3.3 | `IE.EX1`        | `TCON.IE1`         |
//! | INT2 | P5.4 | `INTCLKO.EX2`   | `AUXINTIF.INT2IF`  |
//! | INT3 | P5.5 | `INTCLKO.EX3`   | `AUXINTIF.INT3IF`  |
//! | INT4 | P3.0 | `INTCLKO.EX4`   | `AUXINTIF.INT4IF`  |

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use stc8rt_hal::sfr::{auxintif, ie, intclko, tcon};
use stc8rt_hal::{Pin, Reg, Sfr, Vector};

/// Number of external interrupt lines
pub const LINE_COUNT: usize = 5;

/// Interrupt callback, run in interrupt context
pub type Handler = fn();

/// External interrupt line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExtLine {
    Int0,
    Int1,
    Int2,
    Int3,
    Int4,
}

impl ExtLine {
    pub const ALL: [ExtLine; LINE_COUNT] = [
        ExtLine::Int0,
        ExtLine::Int1,
        ExtLine::Int2,
        ExtLine::Int3,
        ExtLine::Int4,
    ];

    /// Line number (0-4)
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Line by number
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(ExtLine::Int0),
            1 => Some(ExtLine::Int1),
            2 => Some(ExtLine::Int2),
            3 => Some(ExtLine::Int3),
            4 => Some(ExtLine::Int4),
            _ => None,
        }
    }

    /// Line wired to a pin, if any
    pub const fn from_pin(pin: Pin) -> Option<Self> {
        match (pin.port(), pin.bit()) {
            (3, 2) => Some(ExtLine::Int0),
            (3, 3) => Some(ExtLine::Int1),
            (5, 4) => Some(ExtLine::Int2),
            (5, 5) => Some(ExtLine::Int3),
            (3, 0) => Some(ExtLine::Int4),
            _ => None,
        }
    }

    /// Pin the line samples
    pub const fn pin(self) -> Pin {
        match self {
            ExtLine::Int0 => Pin::P3_2,
            ExtLine::Int1 => Pin::P3_3,
            ExtLine::Int2 => Pin::P5_4,
            ExtLine::Int3 => Pin::P5_5,
            ExtLine::Int4 => Pin::P3_0,
        }
    }

    /// Interrupt vector serving the line
    pub const fn vector(self) -> Vector {
        match self {
            ExtLine::Int0 => Vector::Int0,
            ExtLine::Int1 => Vector::Int1,
            ExtLine::Int2 => Vector::Int2,
            ExtLine::Int3 => Vector::Int3,
            ExtLine::Int4 => Vector::Int4,
        }
    }

    /// Line served by a vector
    pub const fn from_vector(vector: Vector) -> Option<Self> {
        match vector {
            Vector::Int0 => Some(ExtLine::Int0),
            Vector::Int1 => Some(ExtLine::Int1),
            Vector::Int2 => Some(ExtLine::Int2),
            Vector::Int3 => Some(ExtLine::Int3),
            Vector::Int4 => Some(ExtLine::Int4),
            _ => None,
        }
    }

    /// Whether the line can also trigger on rising edges
    pub const fn supports_both_edges(self) -> bool {
        matches!(self, ExtLine::Int0 | ExtLine::Int1)
    }

    pub(crate) const fn enable(self) -> (Reg, u8) {
        match self {
            ExtLine::Int0 => (Reg::Ie, ie::EX0),
            ExtLine::Int1 => (Reg::Ie, ie::EX1),
            ExtLine::Int2 => (Reg::Intclko, intclko::EX2),
            ExtLine::Int3 => (Reg::Intclko, intclko::EX3),
            ExtLine::Int4 => (Reg::Intclko, intclko::EX4),
        }
    }

    pub(crate) const fn flag(self) -> (Reg, u8) {
        match self {
            ExtLine::Int0 => (Reg::Tcon, tcon::IE0),
            ExtLine::Int1 => (Reg::Tcon, tcon::IE1),
            ExtLine::Int2 => (Reg::Auxintif, auxintif::INT2IF),
            ExtLine::Int3 => (Reg::Auxintif, auxintif::INT3IF),
            ExtLine::Int4 => (Reg::Auxintif, auxintif::INT4IF),
        }
    }

    pub(crate) const fn edge_select(self) -> Option<u8> {
        match self {
            ExtLine::Int0 => Some(tcon::IT0),
            ExtLine::Int1 => Some(tcon::IT1),
            _ => None,
        }
    }
}

/// Requested trigger condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptMode {
    Low,
    Change,
    Rising,
    Falling,
}

/// Trigger condition the hardware actually applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgePolicy {
    BothEdges,
    FallingEdge,
}

impl EdgePolicy {
    /// Map a requested mode onto what a line can do
    ///
    /// INT0/INT1 have no rising-only or level mode: `Change` and `Rising`
    /// become both edges, `Falling` and `Low` become falling edge.
    pub const fn for_line(line: ExtLine, mode: InterruptMode) -> Self {
        if !line.supports_both_edges() {
            return EdgePolicy::FallingEdge;
        }
        match mode {
            InterruptMode::Change | InterruptMode::Rising => EdgePolicy::BothEdges,
            InterruptMode::Falling | InterruptMode::Low => EdgePolicy::FallingEdge,
        }
    }
}

/// Callback slot contents
#[derive(Debug, Clone, Copy, Default)]
pub enum Binding {
    #[default]
    Unbound,
    Bound { handler: Handler, policy: EdgePolicy },
}

impl Binding {
    pub const fn is_bound(&self) -> bool {
        matches!(self, Binding::Bound { .. })
    }
}

/// Callback table shared with the external interrupt handlers
pub struct InterruptTable {
    bindings: Mutex<CriticalSectionRawMutex, [Cell<Binding>; LINE_COUNT]>,
}

impl Default for InterruptTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptTable {
    pub const fn new() -> Self {
        Self {
            bindings: Mutex::new([const { Cell::new(Binding::Unbound) }; LINE_COUNT]),
        }
    }

    /// Current slot contents for a line
    pub fn binding(&self, line: ExtLine) -> Binding {
        self.bindings.lock(|slots| slots[line.index()].get())
    }

    /// Install a callback and unmask the line
    ///
    /// The slot is filled before the line is unmasked, and any edge latched
    /// while the line was unattended is discarded.
    pub fn attach<H: Sfr>(
        &self,
        hw: &H,
        line: ExtLine,
        handler: Handler,
        mode: InterruptMode,
    ) -> EdgePolicy {
        let policy = EdgePolicy::for_line(line, mode);
        self.bindings.lock(|slots| {
            slots[line.index()].set(Binding::Bound { handler, policy });
        });

        if let Some(it) = line.edge_select() {
            match policy {
                EdgePolicy::BothEdges => hw.clear_bits(Reg::Tcon, it),
                EdgePolicy::FallingEdge => hw.set_bits(Reg::Tcon, it),
            }
        }
        let (flag_reg, flag) = line.flag();
        hw.clear_bits(flag_reg, flag);
        let (enable_reg, enable) = line.enable();
        hw.set_bits(enable_reg, enable);
        hw.set_bits(Reg::Ie, ie::EA);

        debug!("exti: {} attached, {}", line, policy);
        policy
    }

    /// Mask a line and empty its slot
    pub fn detach<H: Sfr>(&self, hw: &H, line: ExtLine) {
        let (enable_reg, enable) = line.enable();
        hw.clear_bits(enable_reg, enable);
        self.bindings.lock(|slots| slots[line.index()].set(Binding::Unbound));
        debug!("exti: {} detached", line);
    }

    /// External interrupt handler for one line
    pub fn dispatch<H: Sfr>(&self, hw: &H, line: ExtLine) {
        if let Binding::Bound { handler, .. } = self.binding(line) {
            handler();
        }
        let (flag_reg, flag) = line.flag();
        hw.clear_bits(flag_reg, flag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::runtime::Runtime;
    use crate::sim::{Edge, SimMcu};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn runtime() -> Runtime<SimMcu> {
        Runtime::new(SimMcu::new(), CoreConfig::DEFAULT)
    }

    #[test]
    fn test_policy_mapping() {
        use InterruptMode::*;
        assert_eq!(EdgePolicy::for_line(ExtLine::Int0, Change), EdgePolicy::BothEdges);
        assert_eq!(EdgePolicy::for_line(ExtLine::Int1, Rising), EdgePolicy::BothEdges);
        assert_eq!(EdgePolicy::for_line(ExtLine::Int0, Falling), EdgePolicy::FallingEdge);
        assert_eq!(EdgePolicy::for_line(ExtLine::Int1, Low), EdgePolicy::FallingEdge);
        for line in [ExtLine::Int2, ExtLine::Int3, ExtLine::Int4] {
            for mode in [Low, Change, Rising, Falling] {
                assert_eq!(EdgePolicy::for_line(line, mode), EdgePolicy::FallingEdge);
            }
        }
    }

    #[test]
    fn test_line_lookup() {
        assert_eq!(ExtLine::from_pin(Pin::P3_2), Some(ExtLine::Int0));
        assert_eq!(ExtLine::from_pin(Pin::P3_0), Some(ExtLine::Int4));
        assert_eq!(ExtLine::from_pin(Pin::new(1, 0)), None);
        for line in ExtLine::ALL {
            assert_eq!(ExtLine::from_index(line.index() as u8), Some(line));
            assert_eq!(ExtLine::from_pin(line.pin()), Some(line));
            assert_eq!(ExtLine::from_vector(line.vector()), Some(line));
        }
        assert_eq!(ExtLine::from_index(5), None);
        assert_eq!(ExtLine::from_vector(Vector::Timer0), None);
    }

    static INT2_CALLS: AtomicU32 = AtomicU32::new(0);

    fn on_int2() {
        INT2_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_falling_edge_dispatch_and_detach() {
        let rt = runtime();
        let policy = rt.attach_interrupt(ExtLine::Int2, on_int2, InterruptMode::Falling);
        assert_eq!(policy, EdgePolicy::FallingEdge);
        assert!(rt.hw().is_set(Reg::Intclko, intclko::EX2));
        assert!(rt.hw().is_set(Reg::Ie, ie::EA));

        rt.hw().trigger_edge(ExtLine::Int2, Edge::Falling);
        rt.service_interrupts();
        assert_eq!(INT2_CALLS.load(Ordering::SeqCst), 1);
        assert!(!rt.hw().is_set(Reg::Auxintif, auxintif::INT2IF));

        rt.detach_interrupt(ExtLine::Int2);
        assert!(!rt.is_attached(ExtLine::Int2));
        assert!(!rt.hw().is_set(Reg::Intclko, intclko::EX2));
        rt.hw().trigger_edge(ExtLine::Int2, Edge::Falling);
        rt.service_interrupts();
        assert_eq!(INT2_CALLS.load(Ordering::SeqCst), 1);
    }

    static INT0_CALLS: AtomicU32 = AtomicU32::new(0);

    fn on_int0() {
        INT0_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_change_mode_sees_both_edges() {
        let rt = runtime();
        let policy = rt.attach_interrupt(ExtLine::Int0, on_int0, InterruptMode::Change);
        assert_eq!(policy, EdgePolicy::BothEdges);
        assert!(!rt.hw().is_set(Reg::Tcon, tcon::IT0));

        rt.hw().trigger_edge(ExtLine::Int0, Edge::Rising);
        rt.service_interrupts();
        rt.hw().trigger_edge(ExtLine::Int0, Edge::Falling);
        rt.service_interrupts();
        assert_eq!(INT0_CALLS.load(Ordering::SeqCst), 2);
        assert!(!rt.hw().is_set(Reg::Tcon, tcon::IE0));
    }

    static INT1_CALLS: AtomicU32 = AtomicU32::new(0);

    fn on_int1() {
        INT1_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_falling_mode_ignores_rising_edge() {
        let rt = runtime();
        rt.attach_interrupt(ExtLine::Int1, on_int1, InterruptMode::Falling);
        assert!(rt.hw().is_set(Reg::Tcon, tcon::IT1));

        rt.hw().trigger_edge(ExtLine::Int1, Edge::Rising);
        rt.service_interrupts();
        assert_eq!(INT1_CALLS.load(Ordering::SeqCst), 0);

        rt.hw().trigger_edge(ExtLine::Int1, Edge::Falling);
        rt.service_interrupts();
        assert_eq!(INT1_CALLS.load(Ordering::SeqCst), 1);
    }

    static INT3_CALLS: AtomicU32 = AtomicU32::new(0);

    fn on_int3() {
        INT3_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_attach_discards_stale_edge() {
        let rt = runtime();
        // Latched while nobody was listening
        rt.hw().set_bits(Reg::Auxintif, auxintif::INT3IF);

        let policy = rt.attach_interrupt(ExtLine::Int3, on_int3, InterruptMode::Rising);
        assert_eq!(policy, EdgePolicy::FallingEdge);
        assert!(rt.is_attached(ExtLine::Int3));
        rt.service_interrupts();
        assert_eq!(INT3_CALLS.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unbound_dispatch_clears_flag() {
        let rt = runtime();
        rt.hw().set_bits(Reg::Auxintif, auxintif::INT4IF);
        rt.on_interrupt(Vector::Int4);
        assert!(!rt.hw().is_set(Reg::Auxintif, auxintif::INT4IF));
    }
}
