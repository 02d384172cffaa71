//! # Kernel Boot Interface
//!
//! Shared contract between the loader and the kernel:
//!
//! * [`boot`]: the [`KernelBootInfo`](boot::KernelBootInfo) handed to the
//!   kernel entry point, and its validation.
//! * [`memory`]: physical layout constants the boot path relies on.
//!
//! Everything here is `#[repr(C)]` or a plain constant so the loader and the
//! kernel agree on the layout without sharing code beyond this crate.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod boot;
pub mod memory;
