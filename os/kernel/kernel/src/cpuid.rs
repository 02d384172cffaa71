//! # CPUID
//!
//! Just the leaves the boot path reads: vendor and maximum leaf (0),
//! feature flags (1), and the two frequency leaves (15h, 16h) used to
//! calibrate the TSC.

#![allow(dead_code)]

mod leaf01h;
mod leaf15h;
mod leaf16h;
mod ranges;

pub use leaf01h::Leaf01h;
pub use leaf15h::Leaf15h;
pub use leaf16h::Leaf16h;
pub use ranges::{CpuVendor, CpuidRanges};

/// Execute CPUID with the given leaf and subleaf.
///
/// # Safety
/// The CPUID instruction must be available.
#[inline(always)]
#[allow(clippy::inline_always)]
pub unsafe fn cpuid(leaf: u32, subleaf: u32) -> CpuidResult {
    let mut eax = leaf;
    let mut ecx = subleaf;
    let ebx: u32;
    let edx: u32;
    unsafe {
        // RBX is reserved by LLVM; shuffle it through a scratch register.
        core::arch::asm!(
            "push rbx",
            "cpuid",
            "mov {ebx_out:e}, ebx",
            "pop rbx",
            ebx_out = lateout(reg) ebx,
            inlateout("eax") eax,
            inlateout("ecx") ecx,
            lateout("edx") edx,
            options(nomem, preserves_flags),
        );
    }
    CpuidResult { eax, ebx, ecx, edx }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[repr(C)]
pub struct CpuidResult {
    pub eax: u32,
    pub ebx: u32,
    pub ecx: u32,
    pub edx: u32,
}
