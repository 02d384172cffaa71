/// A register access rejected before it reached the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ApicError {
    #[error("APIC registers are only accessible 32 bits at a time, not {0} bits")]
    UnsupportedWidth(u32),
    #[error("APIC register offset {0:#x} is not 16-byte aligned")]
    UnalignedRegister(u32),
    #[error("APIC register offset {0:#x} lies outside the register window")]
    RegisterOutOfRange(u32),
}

/// Failure to send an inter-processor interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IpiError {
    /// The destination is the broadcast ID.
    #[error("APIC ID {0:#x} cannot be targeted individually")]
    InvalidApicId(u8),
    #[error("startup address {0:#x} is not 4 KiB aligned")]
    UnalignedStartupAddress(u64),
    #[error("startup address {0:#x} is not below 1 MiB")]
    StartupAddressOutOfRange(u64),
    /// The delivery-status bit stayed set for the whole polling budget.
    #[error("IPI to APIC ID {apic_id:#x} still pending after {polls} polls")]
    DeliveryTimeout { apic_id: u8, polls: u32 },
    #[error(transparent)]
    Apic(#[from] ApicError),
}
