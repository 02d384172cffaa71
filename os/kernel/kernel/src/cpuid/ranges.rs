use crate::cpuid::{CpuidResult, cpuid};

const LEAF_00H: u32 = 0;
const LEAF_MAX_EXTENDED: u32 = 0x8000_0000;

/// Highest supported basic and extended leaves plus the vendor.
#[derive(Copy, Clone, Debug)]
pub struct CpuidRanges {
    pub max_basic: u32,
    pub max_extended: u32,
    pub vendor: CpuVendor,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CpuVendor {
    Intel,
    Amd,
    Other,
}

impl CpuidRanges {
    /// # Safety
    /// The CPUID instruction must be available.
    pub unsafe fn read() -> Self {
        let basic = unsafe { cpuid(LEAF_00H, 0) };
        let extended = unsafe { cpuid(LEAF_MAX_EXTENDED, 0) };
        Self::from_leaves(basic, extended)
    }

    #[must_use]
    pub fn from_leaves(basic: CpuidResult, extended: CpuidResult) -> Self {
        Self {
            max_basic: basic.eax,
            max_extended: extended.eax,
            vendor: CpuVendor::from_registers(basic.ebx, basic.edx, basic.ecx),
        }
    }

    #[inline]
    #[must_use]
    pub const fn has_basic(&self, leaf: u32) -> bool {
        leaf <= self.max_basic
    }
}

impl CpuVendor {
    /// Decodes the 12-byte vendor string spread over EBX, EDX, ECX.
    #[must_use]
    pub fn from_registers(ebx: u32, edx: u32, ecx: u32) -> Self {
        let (b, d, c) = (ebx.to_le_bytes(), edx.to_le_bytes(), ecx.to_le_bytes());
        let id = [
            b[0], b[1], b[2], b[3], d[0], d[1], d[2], d[3], c[0], c[1], c[2], c[3],
        ];
        match &id {
            b"GenuineIntel" => Self::Intel,
            b"AuthenticAMD" => Self::Amd,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Intel => "Intel",
            Self::Amd => "AMD",
            Self::Other => "Other",
        }
    }
}
