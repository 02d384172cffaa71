use crate::cpuid::{CpuidRanges, CpuidResult, cpuid};

pub const LEAF_15H: u32 = 0x15;

/// CPUID.15H: TSC to core crystal clock ratio.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Leaf15h {
    pub denom: u32,
    pub numer: u32,
    /// Crystal frequency, 0 if not enumerated.
    pub crystal_hz: u32,
}

impl Leaf15h {
    /// # Safety
    /// The CPUID instruction must be available.
    pub unsafe fn read(ranges: &CpuidRanges) -> Option<Self> {
        if !ranges.has_basic(LEAF_15H) {
            return None;
        }
        Some(Self::from(unsafe { cpuid(LEAF_15H, 0) }))
    }

    #[must_use]
    pub const fn from(r: CpuidResult) -> Self {
        Self {
            denom: r.eax,
            numer: r.ebx,
            crystal_hz: r.ecx,
        }
    }

    /// `crystal_hz * numer / denom`, when all three are reported.
    #[must_use]
    pub fn tsc_hz(&self) -> Option<u64> {
        if self.denom == 0 || self.numer == 0 || self.crystal_hz == 0 {
            return None;
        }
        Some(u64::from(self.crystal_hz) * u64::from(self.numer) / u64::from(self.denom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_times_crystal() {
        let leaf = Leaf15h::from(CpuidResult {
            eax: 2,
            ebx: 188,
            ecx: 24_000_000,
            edx: 0,
        });
        assert_eq!(leaf.tsc_hz(), Some(2_256_000_000));
    }

    #[test]
    fn unknown_crystal_gives_nothing() {
        let leaf = Leaf15h::from(CpuidResult {
            eax: 2,
            ebx: 188,
            ..CpuidResult::default()
        });
        assert_eq!(leaf.tsc_hz(), None);
    }
}
