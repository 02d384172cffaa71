use crate::cpuid::{CpuidRanges, CpuidResult, cpuid};

pub const LEAF_16H: u32 = 0x16;

/// CPUID.16H: advisory base, maximum and bus frequencies in MHz.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Leaf16h {
    pub base_mhz: u32,
    pub max_mhz: u32,
    pub bus_mhz: u32,
}

impl Leaf16h {
    /// # Safety
    /// The CPUID instruction must be available.
    pub unsafe fn read(ranges: &CpuidRanges) -> Option<Self> {
        if !ranges.has_basic(LEAF_16H) {
            return None;
        }
        Some(Self::from(unsafe { cpuid(LEAF_16H, 0) }))
    }

    #[must_use]
    pub const fn from(r: CpuidResult) -> Self {
        Self {
            base_mhz: r.eax,
            max_mhz: r.ebx,
            bus_mhz: r.ecx,
        }
    }

    /// Base frequency in Hz if reported. Often 0 under a hypervisor.
    #[must_use]
    pub fn base_hz(&self) -> Option<u64> {
        (self.base_mhz != 0).then(|| u64::from(self.base_mhz) * 1_000_000)
    }
}
