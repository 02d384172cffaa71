use crate::cpuid::CpuidRanges;
use crate::error::BootError;
use crate::phys_map::IdentityPhysMap;
use crate::tracing::{trace_boot_info, trace_topology, trace_tsc_frequency};
use crate::tsc::{TscDelay, estimate_tsc_hz};
use crate::{apic, gdt, halt_forever, idt, kernel_main, trampoline};
use kernel_acpi::{Topology, discover};
use kernel_apic::{IpiPolicy, IpiSender, SmpReport, start_secondary_processors};
use kernel_info::boot::KernelBootInfo;
use kernel_info::memory::{BOOT_STACK_SIZE, IDENTITY_MAP_LIMIT};
use kernel_qemu::QemuLogger;
use kernel_sync::SyncOnceCell;
use log::{LevelFilter, error, info};

/// 16-byte aligned backing storage for a stack.
#[repr(align(16))]
struct Aligned16<const N: usize>([u8; N]);

/// Stack of the bootstrap processor from the loader handoff onwards.
///
/// Only [`_start_kernel`] touches it, through its symbol.
#[unsafe(link_section = ".bss.boot")]
#[unsafe(no_mangle)]
static mut BOOT_STACK: Aligned16<BOOT_STACK_SIZE> = Aligned16([0; BOOT_STACK_SIZE]);

static LOGGER: QemuLogger = QemuLogger::new(LevelFilter::Debug);

/// Processor and interrupt-controller inventory, frozen before any IPI.
static TOPOLOGY: SyncOnceCell<Topology> = SyncOnceCell::new();

/// The kernel entry point.
///
/// # ABI
/// `sysv64`: the loader passes the [`KernelBootInfo`] pointer in `RDI`.
///
/// # Naked function & Stack
/// Naked so that no prologue runs on the loader's stack before we switch to
/// [`BOOT_STACK`].
#[unsafe(no_mangle)]
#[unsafe(naked)]
pub extern "sysv64" fn _start_kernel(_boot_info: *const KernelBootInfo) {
    core::arch::naked_asm!(
        "cli",
        "mov r12, rdi",
        "lea rax, [rip + {stack_sym}]",
        "add rax, {stack_size}",
        "and rax, -16",
        "mov rsp, rax",
        // Fake return address so RSP % 16 == 8 at the callee, as after a CALL.
        "push 0",
        "xor rbp, rbp",
        "mov rdi, r12",
        "jmp {rust_entry}",
        stack_sym = sym BOOT_STACK,
        stack_size = const BOOT_STACK_SIZE,
        rust_entry = sym kernel_entry_on_boot_stack,
    );
}

/// Kernel entry running on [`BOOT_STACK`].
#[unsafe(no_mangle)]
pub extern "sysv64" fn kernel_entry_on_boot_stack(boot_info: *const KernelBootInfo) -> ! {
    if LOGGER.init().is_err() {
        halt_forever();
    }
    info!("Kernel reporting to QEMU! Initializing bootstrap processor now.");

    // SAFETY: the loader hands over a pointer to a live boot info block or null.
    let Some(bi) = (unsafe { boot_info.as_ref() }) else {
        error!("boot info pointer is null");
        halt_forever();
    };

    match bring_up_bootstrap_processor(bi) {
        Ok(report) => kernel_main(report),
        Err(e) => {
            error!("bring-up failed: {e}");
            halt_forever()
        }
    }
}

fn bring_up_bootstrap_processor(bi: &KernelBootInfo) -> Result<SmpReport, BootError> {
    bi.validate()?;
    trace_boot_info(bi);

    info!("Initializing GDT ...");
    gdt::init();
    info!("Initializing IDT ...");
    idt::init();

    let ranges = unsafe { CpuidRanges::read() };
    info!("Running on {}", ranges.vendor.as_str());

    info!("Discovering ACPI topology ...");
    let rsdp = bi.rsdp().ok_or(BootError::NoRsdp)?;
    let phys = unsafe { IdentityPhysMap::new(IDENTITY_MAP_LIMIT) };
    let topology = TOPOLOGY
        .set(discover(&phys, rsdp)?)
        .map_err(|_| BootError::AlreadyInitialized("topology"))?;
    trace_topology(topology);

    info!("Initializing local APIC ...");
    let mut lapic = apic::init_local_apic(&ranges, topology)?;
    let bsp_apic_id = lapic.id();

    info!("Estimating TSC frequency ...");
    let tsc_hz = unsafe { estimate_tsc_hz(&ranges) };
    trace_tsc_frequency(tsc_hz);
    let mut delay = TscDelay::new(tsc_hz);

    let startup_address = unsafe { trampoline::install_park_trampoline() };

    info!("Waking secondary processors ...");
    let mut sender = IpiSender::new(&mut lapic, IpiPolicy::default());
    Ok(start_secondary_processors(
        &mut sender,
        topology.processors(),
        bsp_apic_id,
        startup_address,
        &mut delay,
    ))
}
