//! # Time Stamp Counter
//!
//! Frequency estimation (CPUID 15h, then 16h, then a PIT measurement) and a
//! microsecond busy-wait built on it for the INIT/SIPI settle delays.

use crate::cpuid::{CpuidRanges, Leaf15h, Leaf16h};
use crate::ports::{inb, outb};
use kernel_apic::Delay;
use log::debug;

const PIT_CH0_DATA: u16 = 0x40;
const PIT_CMD: u16 = 0x43;
const PIT_INPUT_HZ: u64 = 1_193_182;

/// PIT calibration window.
const PIT_WINDOW_US: u64 = 50_000;

/// Best-effort TSC frequency in Hz.
///
/// # Safety
/// Must run at CPL0 with interrupts masked; the PIT fallback reprograms
/// channel 0.
pub unsafe fn estimate_tsc_hz(ranges: &CpuidRanges) -> u64 {
    if let Some(hz) = unsafe { Leaf15h::read(ranges) }.and_then(|l| l.tsc_hz()) {
        debug!("TSC frequency from CPUID.15H");
        return hz;
    }
    if let Some(hz) = unsafe { Leaf16h::read(ranges) }.and_then(|l| l.base_hz()) {
        debug!("TSC frequency from CPUID.16H base clock");
        return hz;
    }
    debug!("TSC frequency from PIT calibration");
    unsafe { pit_measure_tsc_hz(PIT_WINDOW_US) }
}

/// PIT ticks covering `window_us`, clamped to the 16-bit reload register.
#[allow(clippy::cast_possible_truncation)]
const fn pit_reload_for(window_us: u64) -> u16 {
    let ticks = (PIT_INPUT_HZ * window_us).div_ceil(1_000_000);
    if ticks == 0 {
        1
    } else if ticks > 0xFFFF {
        0xFFFF
    } else {
        ticks as u16
    }
}

/// TSC ticks per second given a delta measured over `pit_ticks` PIT ticks.
fn hz_from_pit_window(tsc_delta: u64, pit_ticks: u16) -> u64 {
    tsc_delta.saturating_mul(PIT_INPUT_HZ) / u64::from(pit_ticks)
}

/// Counts channel 0 down once in mode 0 and measures the TSC across it.
#[allow(clippy::cast_possible_truncation)]
unsafe fn pit_measure_tsc_hz(window_us: u64) -> u64 {
    let reload = pit_reload_for(window_us);

    unsafe {
        // Channel 0, lobyte/hibyte, mode 0 (interrupt on terminal count), binary.
        outb(PIT_CMD, 0b0011_0000);
        outb(PIT_CH0_DATA, reload as u8);
        outb(PIT_CH0_DATA, (reload >> 8) as u8);
    }

    let t0 = rdtsc();
    let mut last = unsafe { read_pit_counter() };
    loop {
        let cur = unsafe { read_pit_counter() };
        // Mode 0 keeps counting past zero and wraps to 0xFFFF.
        if cur > last || cur == 0 {
            break;
        }
        last = cur;
        core::hint::spin_loop();
    }
    let t1 = rdtsc();

    hz_from_pit_window(t1.saturating_sub(t0), reload)
}

unsafe fn read_pit_counter() -> u16 {
    unsafe {
        // Latch channel 0.
        outb(PIT_CMD, 0b0000_0000);
        let lo = u16::from(inb(PIT_CH0_DATA));
        let hi = u16::from(inb(PIT_CH0_DATA));
        (hi << 8) | lo
    }
}

#[inline(always)]
#[allow(clippy::inline_always)]
#[must_use]
pub fn rdtsc() -> u64 {
    let lo: u32;
    let hi: u32;
    unsafe {
        core::arch::asm!(
            "lfence",
            "rdtsc",
            out("eax") lo,
            out("edx") hi,
            options(nomem, nostack, preserves_flags),
        );
    }
    (u64::from(hi) << 32) | u64::from(lo)
}

/// Busy-wait [`Delay`] driven by the TSC.
#[derive(Debug, Clone, Copy)]
pub struct TscDelay {
    ticks_per_us: u64,
}

impl TscDelay {
    /// A frequency below 1 MHz is treated as 1 MHz so delays never vanish.
    #[must_use]
    pub const fn new(tsc_hz: u64) -> Self {
        let ticks_per_us = tsc_hz / 1_000_000;
        Self {
            ticks_per_us: if ticks_per_us == 0 { 1 } else { ticks_per_us },
        }
    }

    #[must_use]
    pub const fn ticks_for(&self, micros: u64) -> u64 {
        self.ticks_per_us.saturating_mul(micros)
    }
}

impl Delay for TscDelay {
    fn delay_us(&mut self, micros: u64) {
        let target = rdtsc().saturating_add(self.ticks_for(micros));
        while rdtsc() < target {
            core::hint::spin_loop();
        }
    }
}
