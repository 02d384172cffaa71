//! # Privilege levels
//!
//! Only rings 0 and 3 are used in long mode. [`Rpl`] lives in the low two bits
//! of a segment selector, [`Dpl`] in bits 45..=46 of a descriptor.

/// Requested privilege level of a segment selector.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum Rpl {
    Ring0 = 0,
    Ring3 = 3,
}

impl Rpl {
    /// Decodes the low two bits; the unused rings 1 and 2 read as ring 0.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        if bits & 0b11 == 3 { Self::Ring3 } else { Self::Ring0 }
    }

    #[inline]
    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }
}

/// Descriptor privilege level.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum Dpl {
    Ring0 = 0,
    Ring3 = 3,
}

impl Dpl {
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        if bits & 0b11 == 3 { Self::Ring3 } else { Self::Ring0 }
    }

    #[inline]
    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }
}
