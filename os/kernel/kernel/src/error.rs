use kernel_acpi::AcpiError;
use kernel_info::boot::BootInfoError;

/// Reasons the bootstrap processor stops bring-up and halts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BootError {
    #[error("invalid boot info: {0}")]
    BootInfo(#[from] BootInfoError),
    #[error("the loader handed over no RSDP")]
    NoRsdp,
    #[error("ACPI discovery failed: {0}")]
    Acpi(#[from] AcpiError),
    #[error("CPUID reports no local APIC")]
    NoLocalApic,
    #[error("local APIC is in x2APIC mode; the MMIO window is not accessible")]
    X2ApicMode,
    #[error("local APIC base address is null")]
    NullApicBase,
    #[error("{0} was already initialized")]
    AlreadyInitialized(&'static str),
}
