//! Monotonic clock service
//!
//! Timer0 runs in 16-bit auto-reload mode at the core clock (1T) and
//! overflows once per millisecond. The overflow handler bumps a millisecond
//! counter; [`Clock::micros`] adds the cycles elapsed in the current period,
//! read from the live counter inside the same critical section.
//!
//! Both counters wrap: `millis()` after ~49.7 days, `micros()` after ~71.6
//! minutes. Always measure intervals with [`elapsed`] (wrapping subtraction),
//! never by comparing two readings directly.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use portable_atomic::{AtomicBool, Ordering};
use stc8rt_hal::sfr::{auxr, ie, tcon, tmod};
use stc8rt_hal::{Reg, Sfr};

use crate::config::{CoreConfig, TICK_PERIOD_US};

/// Time from `since` to `now` on a wrapping counter
///
/// Correct as long as the true interval is shorter than one wrap period.
#[inline]
pub const fn elapsed(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Timer-driven tick counter shared with the Timer0 overflow handler
pub struct MonotonicClock {
    /// Completed ticks; written only by the overflow handler
    ticks: Mutex<CriticalSectionRawMutex, Cell<u32>>,
    started: AtomicBool,
    reload: u16,
    cycles_per_tick: u32,
}

impl MonotonicClock {
    pub const fn new(config: CoreConfig) -> Self {
        Self {
            ticks: Mutex::new(Cell::new(0)),
            started: AtomicBool::new(false),
            reload: config.timer_reload(),
            cycles_per_tick: config.cycles_per_tick(),
        }
    }

    /// Whether Timer0 has been configured
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Timer0 overflow handler
    pub fn on_overflow(&self) {
        self.ticks.lock(|ticks| ticks.set(ticks.get().wrapping_add(1)));
    }

    fn ensure_started<H: Sfr>(&self, hw: &H) {
        if self.is_started() {
            return;
        }

        let configured = self.ticks.lock(|_| {
            if self.started.load(Ordering::Relaxed) {
                return false;
            }
            hw.clear_bits(Reg::Tcon, tcon::TR0);
            // Mode 0: 16-bit auto-reload, timer, ungated
            hw.clear_bits(Reg::Tmod, tmod::T0_MASK);
            hw.set_bits(Reg::Auxr, auxr::T0X12);
            // Loaded while stopped, so this sets both counter and reload
            hw.write(Reg::Tl0, self.reload as u8);
            hw.write(Reg::Th0, (self.reload >> 8) as u8);
            hw.clear_bits(Reg::Tcon, tcon::TF0);
            hw.set_bits(Reg::Ie, ie::ET0);
            hw.set_bits(Reg::Tcon, tcon::TR0);
            self.started.store(true, Ordering::Release);
            true
        });

        // Outside the critical section, which restores the previous EA state on exit
        if configured {
            hw.set_bits(Reg::Ie, ie::EA);
            info!("clock started, reload {}", self.reload);
        }
    }

    /// Consistent (ticks, cycles into the current tick) pair
    fn snapshot<H: Sfr>(&self, hw: &H) -> (u32, u32) {
        self.ensure_started(hw);

        self.ticks.lock(|ticks| {
            // A latched TF0 is an overflow the handler has not counted yet.
            // If it latches while the counter is read, read again so the
            // counter and the flag belong to the same period.
            let flagged = hw.is_set(Reg::Tcon, tcon::TF0);
            let mut counter = read_counter(hw);
            let pending = flagged || hw.is_set(Reg::Tcon, tcon::TF0);
            if pending && !flagged {
                counter = read_counter(hw);
            }

            let count = ticks.get().wrapping_add(u32::from(pending));
            let cycles =
                u32::from(counter.wrapping_sub(self.reload)).min(self.cycles_per_tick - 1);
            (count, cycles)
        })
    }

    #[cfg(test)]
    pub(crate) fn preset_ticks(&self, value: u32) {
        self.ticks.lock(|ticks| ticks.set(value));
    }
}

/// Read TH0:TL0 without tearing across a low-byte carry
fn read_counter<H: Sfr>(hw: &H) -> u16 {
    let high = hw.read(Reg::Th0);
    let low = hw.read(Reg::Tl0);
    let high_again = hw.read(Reg::Th0);
    if high == high_again {
        u16::from_be_bytes([high, low])
    } else {
        u16::from_be_bytes([high_again, hw.read(Reg::Tl0)])
    }
}

/// Clock query surface
pub struct Clock<'a, H> {
    state: &'a MonotonicClock,
    hw: &'a H,
}

impl<'a, H: Sfr> Clock<'a, H> {
    pub(crate) fn new(state: &'a MonotonicClock, hw: &'a H) -> Self {
        Self { state, hw }
    }

    /// Milliseconds since the clock started
    ///
    /// The first call on a fresh runtime starts Timer0.
    pub fn millis(&self) -> u32 {
        self.state.snapshot(self.hw).0
    }

    /// Microseconds since the clock started
    pub fn micros(&self) -> u32 {
        let (ticks, cycles) = self.state.snapshot(self.hw);
        let fraction = cycles * TICK_PERIOD_US / self.state.cycles_per_tick;
        ticks.wrapping_mul(TICK_PERIOD_US).wrapping_add(fraction)
    }

    /// Non-blocking interval check
    ///
    /// Returns `true` and moves `since` to now once at least `interval_us`
    /// has passed since `since`.
    ///
    /// ```ignore
    /// let mut last = 0;
    /// loop {
    ///     if rt.clock().interval_elapsed(&mut last, 500_000) {
    ///         rt.digital_toggle(LED);
    ///     }
    /// }
    /// ```
    pub fn interval_elapsed(&self, since: &mut u32, interval_us: u32) -> bool {
        let now = self.micros();
        if elapsed(now, *since) >= interval_us {
            *since = now;
            true
        } else {
            false
        }
    }

    /// Busy-wait for `us` microseconds
    ///
    /// Relies on the Timer0 interrupt being serviced, so it must not be
    /// called with interrupts disabled.
    pub fn delay_us(&self, us: u32) {
        let start = self.micros();
        while elapsed(self.micros(), start) < us {
            core::hint::spin_loop();
        }
    }

    /// Busy-wait for `ms` milliseconds
    pub fn delay_ms(&self, ms: u32) {
        let mut mark = self.micros();
        for _ in 0..ms {
            while elapsed(self.micros(), mark) < TICK_PERIOD_US {
                core::hint::spin_loop();
            }
            mark = mark.wrapping_add(TICK_PERIOD_US);
        }
    }

    /// Busy-wait for `seconds` seconds
    pub fn delay_s(&self, seconds: u32) {
        for _ in 0..seconds {
            self.delay_ms(1_000);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;
    use crate::sim::SimMcu;
    use proptest::prelude::*;

    fn runtime() -> Runtime<SimMcu> {
        Runtime::new(SimMcu::new(), CoreConfig::DEFAULT)
    }

    #[test]
    fn test_lazy_start_programs_timer0() {
        let rt = runtime();
        assert!(!rt.clock_state().is_started());
        assert_eq!(rt.hw().read(Reg::Ie), 0);

        assert_eq!(rt.millis(), 0);

        let hw = rt.hw();
        assert!(rt.clock_state().is_started());
        assert!(hw.is_set(Reg::Tcon, tcon::TR0));
        assert!(hw.is_set(Reg::Auxr, auxr::T0X12));
        assert_eq!(hw.read(Reg::Tmod) & tmod::T0_MASK, 0);
        assert!(hw.is_set(Reg::Ie, ie::ET0));
        assert!(hw.is_set(Reg::Ie, ie::EA));
        // 65536 - 24_000_000 / 1000
        assert_eq!(hw.timer0_reload(), 41_536);
    }

    #[test]
    fn test_millis_counts_overflows() {
        let rt = runtime();
        rt.millis();
        rt.run_cycles(24_000 * 5);
        assert_eq!(rt.millis(), 5);
        rt.run_cycles(24_000 * 250);
        assert_eq!(rt.millis(), 255);
    }

    #[test]
    fn test_micros_sub_millisecond_precision() {
        let rt = runtime();
        rt.micros();
        rt.run_cycles(24_000 * 3 + 12_000);
        assert_eq!(rt.micros(), 3_500);
        rt.run_cycles(24);
        assert_eq!(rt.micros(), 3_501);
    }

    #[test]
    fn test_pending_overflow_is_not_lost() {
        let rt = runtime();
        rt.micros();
        rt.run_cycles(24_000 - 10);
        let before = rt.micros();

        // Overflow happens while nobody services it
        rt.hw().advance_timer0(20);
        assert!(rt.hw().is_set(Reg::Tcon, tcon::TF0));
        let during = rt.micros();
        assert!(during > before);
        assert_eq!(rt.millis(), 1);

        rt.service_interrupts();
        let after = rt.micros();
        assert!(after >= during);
        assert_eq!(rt.millis(), 1);
    }

    #[test]
    fn test_masked_overflow_past_half_period() {
        let rt = runtime();
        rt.micros();
        rt.run_cycles(24 * 999);
        let before = rt.micros();
        assert_eq!(before, 999);

        // Foreground holds interrupts off for 700 us across the overflow
        rt.hw().clear_bits(Reg::Ie, ie::EA);
        rt.hw().advance_timer0(24 + 24 * 700);
        let during = rt.micros();
        assert_eq!(during, 1_700);

        rt.hw().set_bits(Reg::Ie, ie::EA);
        assert_eq!(rt.service_interrupts(), 1);
        assert_eq!(rt.micros(), during);
        assert_eq!(rt.millis(), 1);
    }

    #[test]
    fn test_readings_never_regress() {
        let rt = runtime();
        let mut last = rt.micros();
        for step in 0..2_000u32 {
            rt.run_cycles(1 + step % 997);
            let now = rt.micros();
            assert!(elapsed(now, last) < 1_000, "regressed from {} to {}", last, now);
            last = now;
        }
    }

    #[test]
    fn test_micros_wraps_cleanly() {
        let rt = runtime();
        rt.micros();
        // 4_294_967 ms * 1000 is 296 us short of 2^32
        rt.clock_state().preset_ticks(4_294_967);
        let before = rt.micros();
        assert_eq!(before, 4_294_967_000);

        rt.run_cycles(24_000);
        let after = rt.micros();
        assert!(after < before);
        assert_eq!(elapsed(after, before), 1_000);
    }

    #[test]
    fn test_interval_elapsed_advances_timestamp() {
        let rt = runtime();
        let clock = rt.clock();
        let mut last = clock.micros();

        rt.run_cycles(24 * 400);
        assert!(!clock.interval_elapsed(&mut last, 1_000));
        assert_eq!(last, 0);

        rt.run_cycles(24 * 700);
        assert!(clock.interval_elapsed(&mut last, 1_000));
        assert_eq!(last, 1_100);
        assert!(!clock.interval_elapsed(&mut last, 1_000));
    }

    #[test]
    fn test_delay_us_with_free_running_timer() {
        let rt = runtime();
        rt.micros();
        // Each counter read moves time forward by 2 us
        rt.hw().set_cycles_per_counter_read(48);
        let start = rt.micros();
        rt.clock().delay_us(300);
        assert!(elapsed(rt.micros(), start) >= 300);
    }

    #[test]
    fn test_delay_ms_tracks_whole_milliseconds() {
        let rt = runtime();
        rt.micros();
        rt.run_cycles(24 * 250);
        // Each counter read moves time forward by 5 us
        rt.hw().set_cycles_per_counter_read(120);
        rt.hw().set_hold_for_service(true);

        let done = AtomicBool::new(false);
        let start = rt.micros();
        let waited = std::thread::scope(|s| {
            s.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    rt.service_interrupts();
                    std::thread::yield_now();
                }
            });
            rt.clock().delay_ms(5);
            let waited = elapsed(rt.micros(), start);
            done.store(true, Ordering::Release);
            waited
        });

        assert!((5_000..5_050).contains(&waited), "waited {} us", waited);
        rt.service_interrupts();
        assert_eq!(rt.millis(), 5);
    }

    #[test]
    fn test_delay_s_and_zero_delays() {
        let rt = runtime();
        rt.micros();
        rt.hw().set_cycles_per_counter_read(240);
        rt.hw().set_hold_for_service(true);

        let clock = rt.clock();
        let start = clock.micros();
        clock.delay_ms(0);
        clock.delay_s(0);
        assert!(elapsed(clock.micros(), start) < 50);

        let done = AtomicBool::new(false);
        let start = clock.micros();
        let waited = std::thread::scope(|s| {
            s.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    rt.service_interrupts();
                    std::thread::yield_now();
                }
            });
            clock.delay_s(1);
            let waited = elapsed(clock.micros(), start);
            done.store(true, Ordering::Release);
            waited
        });
        assert!((1_000_000..1_000_100).contains(&waited), "waited {} us", waited);
    }

    proptest! {
        #[test]
        fn prop_elapsed_survives_wrap(start in any::<u32>(), delta in any::<u32>()) {
            let later = start.wrapping_add(delta);
            prop_assert_eq!(elapsed(later, start), delta);
        }
    }
}
