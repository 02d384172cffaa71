//! # Local APIC access and INIT/SIPI wake-up
//!
//! The bootstrap processor talks to its local APIC through a 4 KiB register
//! window whose physical base comes from `IA32_APIC_BASE`. This crate keeps
//! the two halves of that interaction behind traits:
//!
//! * [`ApicBaseMsr`] reads and writes the base MSR ([`enable_if_disabled`]).
//! * [`ApicRegisterAccess`] performs 32-bit register reads and writes;
//!   [`MmioApicRegisters`] is the volatile MMIO implementation.
//!
//! [`LocalApic`] validates every register access before it reaches the
//! backend, and [`IpiSender`] builds interrupt commands on top of it to run the
//! INIT-SIPI-SIPI sequence with bounded delivery polling.
//! [`start_secondary_processors`] drives that sequence over a processor list
//! obtained from ACPI.
//!
//! Instruction-level access (`rdmsr`/`wrmsr`) is gated behind the `asm`
//! feature; everything else runs on the host against fakes.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod access;
mod base;
mod error;
pub mod icr;
mod ipi;
mod local_apic;
pub mod registers;
mod smp;

pub use access::{ApicRegisterAccess, MmioApicRegisters};
#[cfg(feature = "asm")]
pub use base::HardwareApicBaseMsr;
pub use base::{ApicBaseMsr, ApicBaseState, enable_if_disabled};
pub use error::{ApicError, IpiError};
pub use icr::InterruptCommand;
pub use ipi::{
    BROADCAST_APIC_ID, Delay, INIT_SETTLE_US, IpiPolicy, IpiSender, SIPI_SETTLE_US,
    STARTUP_ADDRESS_LIMIT,
};
pub use local_apic::{AccessWidth, ApicVersion, LocalApic, SpuriousVector};
pub use registers::{APIC_WINDOW_SIZE, ApicRegister};
pub use smp::{SmpReport, start_secondary_processors};
