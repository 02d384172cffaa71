//! # Kernel tracing helpers

use kernel_acpi::Topology;
use kernel_info::boot::KernelBootInfo;
use log::{debug, info};

pub fn trace_boot_info(boot_info: &KernelBootInfo) {
    info!(
        concat!(
            "Boot Info in Kernel:\n",
            "  BI ptr      = {bi:#018x}\n",
            "  kernel base = {base:#018x}, size = {size}, entry = {entry:#018x}\n",
            "  rsdp addr   = {rsdp:#018x}"
        ),
        bi = core::ptr::from_ref(boot_info) as usize,
        base = boot_info.base_address,
        size = boot_info.header.kernel_size,
        entry = boot_info.header.kernel_entry,
        rsdp = boot_info.rsdp_addr,
    );
}

pub fn trace_topology(topology: &Topology) {
    info!(
        "ACPI: {} processors ({} enabled), {} I/O APICs, local APIC at {:#x}{}",
        topology.total_processors(),
        topology.enabled_processors(),
        topology.io_apics().len(),
        topology.local_apic_address(),
        if topology.pcat_compat() { ", dual 8259 present" } else { "" }
    );

    for cpu in topology.processors() {
        debug!(
            "  CPU uid={} apic={} enabled={} online_capable={}",
            cpu.uid, cpu.local_apic_id, cpu.enabled, cpu.online_capable
        );
    }
    for io in topology.io_apics() {
        debug!(
            "  I/O APIC id={} at {:#x}, GSI base {}",
            io.id, io.address, io.gsi_base
        );
    }
    for iso in topology.interrupt_overrides() {
        debug!(
            "  ISA IRQ {} -> GSI {} ({:?}, {:?})",
            iso.source, iso.gsi, iso.polarity, iso.trigger
        );
    }
}

pub fn trace_tsc_frequency(tsc_hz: u64) {
    info!("TSC frequency = {tsc_hz} Hz (~{} MHz)", tsc_hz / 1_000_000);
}
