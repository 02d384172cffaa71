use kernel_registers::msr::Ia32ApicBase;
use log::{debug, info};

/// Access to `IA32_APIC_BASE`.
pub trait ApicBaseMsr {
    fn read_base_msr(&mut self) -> Ia32ApicBase;
    fn write_base_msr(&mut self, value: Ia32ApicBase);
}

/// `RDMSR`/`WRMSR` on the executing processor.
#[cfg(feature = "asm")]
#[derive(Debug)]
pub struct HardwareApicBaseMsr {
    _cpl0: (),
}

#[cfg(feature = "asm")]
impl HardwareApicBaseMsr {
    /// # Safety
    /// The caller must run at CPL0 on a processor that has a local APIC.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _cpl0: () }
    }
}

#[cfg(feature = "asm")]
impl ApicBaseMsr for HardwareApicBaseMsr {
    fn read_base_msr(&mut self) -> Ia32ApicBase {
        use kernel_registers::LoadRegisterUnsafe;
        unsafe { Ia32ApicBase::load_unsafe() }
    }

    fn write_base_msr(&mut self, value: Ia32ApicBase) {
        use kernel_registers::StoreRegisterUnsafe;
        unsafe { value.store_unsafe() }
    }
}

/// What the boot processor learned from `IA32_APIC_BASE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApicBaseState {
    /// Physical address of the register window.
    pub base: u64,
    pub bsp: bool,
    pub x2apic: bool,
    /// Whether [`enable_if_disabled`] had to set the global enable bit.
    pub enabled_by_us: bool,
}

/// Reads the base MSR and sets the global enable bit if it is clear.
///
/// Nothing is written when firmware already enabled the APIC.
pub fn enable_if_disabled<M: ApicBaseMsr + ?Sized>(msr: &mut M) -> ApicBaseState {
    let current = msr.read_base_msr();
    let enabled_by_us = !current.global_enable();
    if enabled_by_us {
        msr.write_base_msr(current.with_global_enable(true));
        info!("local APIC was disabled, enabled it");
    }

    let state = ApicBaseState {
        base: current.base_address(),
        bsp: current.bsp(),
        x2apic: current.x2apic_enable(),
        enabled_by_us,
    };
    debug!(
        "IA32_APIC_BASE: base={:#x} bsp={} x2apic={}",
        state.base, state.bsp, state.x2apic
    );
    state
}
