//! Provides the [`Ia32ApicBase`] type.

use crate::msr::Msr;
#[cfg(feature = "asm")]
use crate::{LoadRegisterUnsafe, StoreRegisterUnsafe};
use bitfield_struct::bitfield;

/// Model-Specific Register: **local APIC base and enable state**.
///
/// ```text
///  63          12  11    10   9   8   7     0
/// +--------------+----+------+---+---+-------+
/// |  base page   | EN | EXTD |   |BSP|       |
/// +--------------+----+------+---+---+-------+
/// ```
///
/// The base field is a page frame number; [`Ia32ApicBase::base_address`]
/// returns it as a physical address. The architectural reset value places the
/// window at `0xFEE0_0000`.
#[bitfield(u64, order = Lsb)]
#[derive(PartialEq, Eq)]
pub struct Ia32ApicBase {
    #[bits(8)]
    __: u8,

    /// Set on the bootstrap processor, clear on application processors. Read-only.
    pub bsp: bool,

    #[bits(1)]
    __: u8,

    /// x2APIC mode (`EXTD`). Requires `global_enable`.
    pub x2apic_enable: bool,

    /// xAPIC global enable (`EN`). Clearing it disables the local APIC until reset.
    pub global_enable: bool,

    /// Physical page number of the APIC register window.
    #[bits(52)]
    pub base_page: u64,
}

impl Ia32ApicBase {
    pub const IA32_APIC_BASE: u32 = 0x1B;
    pub const MSR: Msr = Msr::new(Self::IA32_APIC_BASE);

    /// Physical address of the register window.
    #[must_use]
    pub const fn base_address(&self) -> u64 {
        self.base_page() << 12
    }

    /// Sets the window address; the low 12 bits are dropped.
    #[must_use]
    pub const fn with_base_address(self, addr: u64) -> Self {
        self.with_base_page(addr >> 12)
    }
}

#[cfg(feature = "asm")]
impl LoadRegisterUnsafe for Ia32ApicBase {
    #[inline(always)]
    #[allow(clippy::inline_always)]
    unsafe fn load_unsafe() -> Self {
        let msr = unsafe { Self::MSR.load_raw() };
        Self::from_bits(msr)
    }
}

#[cfg(feature = "asm")]
impl StoreRegisterUnsafe for Ia32ApicBase {
    #[inline(always)]
    #[allow(clippy::inline_always)]
    unsafe fn store_unsafe(self) {
        unsafe { Self::MSR.store_raw(self.into_bits()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reset_value_on_bsp() {
        let reg = Ia32ApicBase::from_bits(0xFEE0_0900);
        assert!(reg.bsp());
        assert!(reg.global_enable());
        assert!(!reg.x2apic_enable());
        assert_eq!(reg.base_address(), 0xFEE0_0000);
    }

    #[test]
    fn enable_bit_round_trips_without_touching_base() {
        let reg = Ia32ApicBase::from_bits(0xFEE0_0000).with_global_enable(true);
        assert_eq!(reg.into_bits(), 0xFEE0_0800);

        let moved = reg.with_base_address(0x1_0000_0FFF);
        assert_eq!(moved.base_address(), 0x1_0000_0000);
        assert!(moved.global_enable());
    }
}
