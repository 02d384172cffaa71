//! Local APIC bring-up on the bootstrap processor.

use crate::cpuid::{CpuidRanges, Leaf01h};
use crate::error::BootError;
use core::ptr::NonNull;
use kernel_acpi::Topology;
use kernel_apic::{ApicBaseState, HardwareApicBaseMsr, LocalApic, MmioApicRegisters, enable_if_disabled};
use kernel_sync::SyncOnceCell;
use log::{info, warn};

/// Vector the APIC raises for spurious interrupts.
pub const SPURIOUS_VECTOR: u8 = 0xFF;

/// Base MSR contents as found (and possibly fixed up) during bring-up.
static APIC_BASE: SyncOnceCell<ApicBaseState> = SyncOnceCell::new();

/// Enables the local APIC of the executing processor and returns a handle to
/// its MMIO register window.
///
/// The window is taken from `IA32_APIC_BASE`; a different address reported by
/// the MADT is logged and ignored.
pub fn init_local_apic(
    ranges: &CpuidRanges,
    topology: &Topology,
) -> Result<LocalApic<MmioApicRegisters>, BootError> {
    let features = unsafe { Leaf01h::read(ranges) }.ok_or(BootError::NoLocalApic)?;
    if !features.has_apic() {
        return Err(BootError::NoLocalApic);
    }

    let mut msr = unsafe { HardwareApicBaseMsr::new() };
    let state = *APIC_BASE
        .set(enable_if_disabled(&mut msr))
        .map_err(|_| BootError::AlreadyInitialized("local APIC base"))?;

    if state.x2apic {
        return Err(BootError::X2ApicMode);
    }
    if state.base != topology.local_apic_address() {
        warn!(
            "MADT reports local APIC at {:#x}, IA32_APIC_BASE says {:#x}; using the MSR",
            topology.local_apic_address(),
            state.base
        );
    }

    let base = usize::try_from(state.base).map_err(|_| BootError::NullApicBase)?;
    let window = NonNull::new(base as *mut u32).ok_or(BootError::NullApicBase)?;
    // SAFETY: the window lies in the loader's identity map and only the BSP
    // touches it until secondaries run their own bring-up.
    let mut apic = LocalApic::new(unsafe { MmioApicRegisters::new(window) });
    apic.software_enable(SPURIOUS_VECTOR);

    let id = apic.id();
    let version = apic.version();
    info!(
        "local APIC id={id} version={:#x} max_lvt={} at {:#x}{}",
        version.version(),
        version.max_lvt_entry(),
        state.base,
        if state.enabled_by_us { " (enabled by kernel)" } else { "" }
    );
    if features.initial_apic_id() != id {
        warn!(
            "CPUID initial APIC id {} differs from APIC id register {id}",
            features.initial_apic_id()
        );
    }

    Ok(apic)
}
