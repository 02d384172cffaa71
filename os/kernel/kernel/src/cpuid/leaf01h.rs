use crate::cpuid::{CpuidRanges, CpuidResult, cpuid};
use bitfield_struct::bitfield;

pub const LEAF_01H: u32 = 0x01;

/// CPUID.01H feature information, reduced to what SMP bring-up needs.
#[derive(Copy, Clone, Debug)]
pub struct Leaf01h {
    pub ebx: Leaf1Ebx,
    pub ecx: Leaf1Ecx,
    pub edx: Leaf1Edx,
}

impl Leaf01h {
    /// `None` if the processor does not report leaf 1.
    ///
    /// # Safety
    /// The CPUID instruction must be available.
    pub unsafe fn read(ranges: &CpuidRanges) -> Option<Self> {
        if !ranges.has_basic(LEAF_01H) {
            return None;
        }
        Some(Self::from(unsafe { cpuid(LEAF_01H, 0) }))
    }

    #[must_use]
    pub const fn from(r: CpuidResult) -> Self {
        Self {
            ebx: Leaf1Ebx::from_bits(r.ebx),
            ecx: Leaf1Ecx::from_bits(r.ecx),
            edx: Leaf1Edx::from_bits(r.edx),
        }
    }

    /// On-chip local APIC present.
    #[inline]
    #[must_use]
    pub const fn has_apic(&self) -> bool {
        self.edx.apic()
    }

    #[inline]
    #[must_use]
    pub const fn has_x2apic(&self) -> bool {
        self.ecx.x2apic()
    }

    #[inline]
    #[must_use]
    pub const fn has_tsc(&self) -> bool {
        self.edx.tsc()
    }

    /// APIC ID the executing processor was assigned at reset.
    #[inline]
    #[must_use]
    pub const fn initial_apic_id(&self) -> u8 {
        self.ebx.initial_apic_id()
    }
}

#[bitfield(u32)]
pub struct Leaf1Ebx {
    pub brand_index: u8,
    /// CLFLUSH line size in 8-byte units.
    pub clflush_line_size: u8,
    pub logical_processor_count: u8,
    pub initial_apic_id: u8,
}

#[bitfield(u32)]
pub struct Leaf1Ecx {
    #[bits(21)]
    __: u32,
    /// Bit 21.
    pub x2apic: bool,
    #[bits(2)]
    __: u8,
    /// Bit 24.
    pub tsc_deadline: bool,
    #[bits(6)]
    __: u8,
    /// Bit 31.
    pub hypervisor: bool,
}

#[bitfield(u32)]
pub struct Leaf1Edx {
    #[bits(4)]
    __: u8,
    /// Bit 4.
    pub tsc: bool,
    /// Bit 5.
    pub msr: bool,
    #[bits(3)]
    __: u8,
    /// Bit 9.
    pub apic: bool,
    #[bits(22)]
    __: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apic_bits_decode() {
        let leaf = Leaf01h::from(CpuidResult {
            eax: 0x000A_06A4,
            ebx: 0x0300_0800,
            ecx: (1 << 21) | (1 << 31),
            edx: (1 << 9) | (1 << 5) | (1 << 4),
        });
        assert!(leaf.has_apic());
        assert!(leaf.has_x2apic());
        assert!(leaf.has_tsc());
        assert!(leaf.ecx.hypervisor());
        assert!(!leaf.ecx.tsc_deadline());
        assert_eq!(leaf.initial_apic_id(), 3);
        assert_eq!(leaf.ebx.clflush_line_size(), 8);
    }

    #[test]
    fn missing_apic_is_reported() {
        let leaf = Leaf01h::from(CpuidResult {
            edx: !(1 << 9),
            ..CpuidResult::default()
        });
        assert!(!leaf.has_apic());
        assert!(!leaf.has_x2apic());
    }
}
