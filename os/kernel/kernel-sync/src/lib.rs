//! # Kernel synchronization primitives
//!
//! [`SyncOnceCell`] freezes boot-time state (descriptor tables, the ACPI
//! topology, the APIC base) into `static`s that are written once by the
//! bootstrap processor and only read afterwards.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod sync_once_cell;

pub use sync_once_cell::SyncOnceCell;
