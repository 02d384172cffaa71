//! Local APIC register offsets (xAPIC MMIO layout).
//!
//! Registers are 32 bits wide and sit on 16-byte boundaries inside a 4 KiB
//! window; only the first 0x400 bytes are populated.

/// Size of the populated part of the register window.
pub const APIC_WINDOW_SIZE: u32 = 0x400;

/// Register stride and required offset alignment.
pub const APIC_REGISTER_ALIGN: u32 = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ApicRegister {
    Id = 0x20,
    Version = 0x30,
    TaskPriority = 0x80,
    ArbitrationPriority = 0x90,
    ProcessorPriority = 0xA0,
    EndOfInterrupt = 0xB0,
    RemoteRead = 0xC0,
    LogicalDestination = 0xD0,
    DestinationFormat = 0xE0,
    SpuriousVector = 0xF0,
    /// First of eight in-service registers.
    InService = 0x100,
    /// First of eight trigger-mode registers.
    TriggerMode = 0x180,
    /// First of eight interrupt-request registers.
    InterruptRequest = 0x200,
    ErrorStatus = 0x280,
    LvtCmci = 0x2F0,
    InterruptCommandLow = 0x300,
    InterruptCommandHigh = 0x310,
    LvtTimer = 0x320,
    LvtThermal = 0x330,
    LvtPerformance = 0x340,
    LvtLint0 = 0x350,
    LvtLint1 = 0x360,
    LvtError = 0x370,
    TimerInitialCount = 0x380,
    TimerCurrentCount = 0x390,
    TimerDivide = 0x3E0,
}

impl ApicRegister {
    /// Byte offset from the window base.
    #[must_use]
    pub const fn offset(self) -> u32 {
        self as u32
    }
}

const _: () = {
    assert!(ApicRegister::TimerDivide.offset() < APIC_WINDOW_SIZE);
    assert!(ApicRegister::InterruptCommandHigh.offset() % APIC_REGISTER_ALIGN == 0);
};
