//! # Typed segment selectors
//!
//! ```text
//!  15            3 2  1  0
//! +----------------+--+----+
//! |   Index[12:0]  |TI| RPL|
//! +----------------+--+----+
//! ```
//!
//! The kind parameter keeps a data selector out of CS and vice versa.

use crate::privilege::Rpl;
use bitfield_struct::bitfield;
use core::marker::PhantomData;

/// Which descriptor table a selector addresses.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum Table {
    Gdt = 0,
    Ldt = 1,
}

impl Table {
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        if bits == 0 { Self::Gdt } else { Self::Ldt }
    }

    #[inline]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }
}

#[bitfield(u16)]
#[derive(Eq, PartialEq)]
pub struct SegmentSelectorRaw {
    #[bits(2)]
    pub rpl: Rpl,
    #[bits(1)]
    pub ti: Table,
    #[bits(13)]
    pub index: u16,
}

pub trait SelectorKind: Copy {}

/// Code segment (CS) selector.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CodeSel {}

/// Data/stack (DS/ES/SS) selector.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DataSel {}

impl SelectorKind for CodeSel {}
impl SelectorKind for DataSel {}

#[repr(transparent)]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct SegmentSelector<K: SelectorKind>(SegmentSelectorRaw, PhantomData<K>);

impl<K: SelectorKind> SegmentSelector<K> {
    /// A GDT selector for `index` carrying `rpl`.
    #[inline]
    #[must_use]
    pub const fn new(index: u16, rpl: Rpl) -> Self {
        Self(
            SegmentSelectorRaw::new()
                .with_index(index)
                .with_ti(Table::Gdt)
                .with_rpl(rpl),
            PhantomData,
        )
    }

    /// The value the CPU loads.
    #[inline]
    #[must_use]
    pub const fn encode(self) -> u16 {
        self.0.into_bits()
    }
}
