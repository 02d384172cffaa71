//! # ACPI table discovery
//!
//! Walks the firmware tables far enough to learn which processors exist and
//! where their local APICs live:
//!
//! ```text
//! RSDP/XSDP ──> RSDT/XSDT ──> MADT ──> Topology
//!                         └─> (other tables, logged and skipped)
//! ```
//!
//! All table memory is reached through [`PhysMapRo`], so the parser works the
//! same on an identity-mapped boot environment and in host-side tests. Every
//! length and offset taken from firmware is bounds-checked against the mapped
//! slice before it is read.
//!
//! Results are reported as [`AcpiError`]; [`status_code`] folds them into the
//! integer status used across the kernel boundary (`0` on success).
//!
//! ```rust,no_run
//! use kernel_acpi::{PhysMapRo, discover};
//!
//! struct Identity;
//!
//! unsafe impl PhysMapRo for Identity {
//!     fn map_ro(&self, paddr: u64, len: usize) -> Option<&[u8]> {
//!         Some(unsafe { core::slice::from_raw_parts(paddr as *const u8, len) })
//!     }
//! }
//!
//! let topology = discover(&Identity, 0x000F_5A40).expect("ACPI tables");
//! println!("{} CPUs", topology.enabled_processors());
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod checksum;
mod discover;
mod error;
pub mod madt;
pub mod root_table;
pub mod rsdp;
pub mod sdt;
pub mod topology;
mod view;

pub use checksum::{signature_matches, verify_checksum};
pub use discover::discover;
pub use error::{ACPI_FAILURE, ACPI_SUCCESS, AcpiError, status_code};
pub use madt::decode_madt;
pub use topology::{ProcessorRecord, Topology};
pub use view::TableView;

/// Read-only access to physical memory.
///
/// # Safety
/// A returned slice must cover exactly `len` readable bytes starting at
/// `paddr`, and those bytes must not change while the borrow of `self` lives.
/// Return `None` for ranges that cannot be mapped.
pub unsafe trait PhysMapRo {
    fn map_ro(&self, paddr: u64, len: usize) -> Option<&[u8]>;
}
