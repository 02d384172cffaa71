//! # 64-bit code and data segment descriptors
//!
//! In long mode base and limit are ignored for code and data segments. What
//! still matters is the type, the S bit, the DPL, the present bit and, for
//! code, `L=1` with `DB=0`.

use crate::privilege::Dpl;
use bitfield_struct::bitfield;

/// Bit layout of a 64-bit code segment descriptor.
#[bitfield(u64)]
pub struct CodeDescBits {
    pub limit_lo: u16,
    pub base_lo: u16,
    pub base_mid: u8,
    /// `0b1010`: execute and read.
    #[bits(4)]
    pub typ: u8,
    pub s: bool,
    #[bits(2)]
    pub dpl: Dpl,
    pub p: bool,
    #[bits(4)]
    pub limit_hi: u8,
    pub avl: bool,
    /// 64-bit code.
    pub l: bool,
    /// Must be clear when `l` is set.
    pub db: bool,
    pub g: bool,
    pub base_hi: u8,
}

/// Bit layout of a data/stack segment descriptor.
#[bitfield(u64)]
pub struct DataDescBits {
    pub limit_lo: u16,
    pub base_lo: u16,
    pub base_mid: u8,
    /// `0b0010`: read and write.
    #[bits(4)]
    pub typ: u8,
    pub s: bool,
    #[bits(2)]
    pub dpl: Dpl,
    pub p: bool,
    #[bits(4)]
    pub limit_hi: u8,
    pub avl: bool,
    pub l: bool,
    pub db: bool,
    pub g: bool,
    pub base_hi: u8,
}

/// One 8-byte GDT entry.
#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Desc64(u64);

impl Desc64 {
    pub const NULL: Self = Self(0);

    /// Present 64-bit code segment with the given privilege.
    #[must_use]
    pub const fn code(dpl: Dpl) -> Self {
        let bits = CodeDescBits::new()
            .with_typ(0b1010)
            .with_s(true)
            .with_dpl(dpl)
            .with_p(true)
            .with_l(true)
            .with_db(false);
        Self(bits.into_bits())
    }

    /// Present read/write data segment with the given privilege.
    #[must_use]
    pub const fn data(dpl: Dpl) -> Self {
        let bits = DataDescBits::new()
            .with_typ(0b0010)
            .with_s(true)
            .with_dpl(dpl)
            .with_p(true);
        Self(bits.into_bits())
    }

    #[inline]
    #[must_use]
    pub const fn to_u64(self) -> u64 {
        self.0
    }
}

const _: () = {
    assert!(size_of::<CodeDescBits>() == 8);
    assert!(size_of::<DataDescBits>() == 8);
    assert!(size_of::<Desc64>() == 8);
};
