//! # Model-Specific Registers (MSR)
//!
//! MSRs are selected by a 32-bit index and accessed with the privileged
//! `RDMSR`/`WRMSR` instructions; both move the value through `EDX:EAX`.
//!
//! The one MSR the kernel needs during bring-up is `IA32_APIC_BASE`
//! (`0x1B`), which holds the physical base of the local APIC window together
//! with the BSP flag and the xAPIC/x2APIC enable bits.
//!
//! ## References
//! - Intel SDM Vol. 3, §11.4.4 "Local APIC Status and Location"
//! - Intel SDM Vol. 4, "Model-Specific Registers"

mod ia32_apic_base;

pub use ia32_apic_base::Ia32ApicBase;

/// Identifies a **Model-Specific Register (MSR)** by its architectural index.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Msr(pub u32);

impl Msr {
    #[inline(always)]
    #[allow(clippy::inline_always)]
    const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the underlying raw MSR index.
    #[inline(always)]
    #[allow(clippy::inline_always)]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Write a 64-bit value to the MSR.
    ///
    /// # Safety
    /// - Executes `WRMSR`, which is only valid at **CPL=0**; user mode raises **#GP(0)**.
    /// - The MSR must exist and be writable on the current CPU, and `val` must
    ///   not set reserved bits.
    #[cfg(feature = "asm")]
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    #[doc(alias = "write_model_specific_register")]
    pub unsafe fn store_raw(self, val: u64) {
        let lo = (val & 0xFFFF_FFFF) as u32;
        let hi = (val >> 32) as u32;
        let msr = self.raw();
        unsafe {
            core::arch::asm!(
            "wrmsr",
            in("ecx") msr,
            in("eax") lo,
            in("edx") hi,
            options(nostack, preserves_flags)
            );
        }
    }

    /// Reads the 64-bit value of the MSR.
    ///
    /// # Safety
    /// Same requirements as [`Msr::store_raw`], minus the value constraints.
    #[cfg(feature = "asm")]
    #[inline(always)]
    #[allow(clippy::inline_always)]
    #[doc(alias = "read_model_specific_register")]
    pub unsafe fn load_raw(self) -> u64 {
        let lo: u32;
        let hi: u32;
        let ecx = self.raw();
        unsafe {
            core::arch::asm!(
            "rdmsr",
            in("ecx") ecx,
            out("eax") lo,
            out("edx") hi,
            options(nomem, nostack, preserves_flags)
            );
        }
        (u64::from(hi) << 32) | u64::from(lo)
    }
}
