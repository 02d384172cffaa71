//! # Kernel Entry Point
//!
//! Brings up the bootstrap processor: descriptor tables, ACPI topology, the
//! local APIC, and an INIT-SIPI-SIPI wake-up of every other enabled
//! processor. See [`init`] for the sequence.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), no_main)]
#![allow(unsafe_code)]

mod apic;
mod cpuid;
mod error;
mod gdt;
mod idt;
mod init;
mod interrupts;
mod phys_map;
mod ports;
mod privilege;
mod tracing;
mod trampoline;
mod tsc;

use kernel_apic::SmpReport;
use log::info;

#[cfg(not(test))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    log::error!("{info}");
    halt_forever()
}

/// Masks interrupts and halts the executing processor for good.
pub fn halt_forever() -> ! {
    loop {
        unsafe {
            core::arch::asm!("cli", "hlt", options(nomem, nostack));
        }
    }
}

fn kernel_main(report: SmpReport) -> ! {
    info!(
        "Kernel early init is done ({} secondary processors parked), halting.",
        report.woken
    );
    halt_forever()
}
