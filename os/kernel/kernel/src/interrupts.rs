//! # x86-64 Interrupt Descriptor Table
//!
//! 256 sixteen-byte gates with a fluent builder:
//!
//! ```ignore
//! idt[8]
//!     .set_handler(df::double_fault_handler)
//!     .selector(KERNEL_CS_SEL)
//!     .gate_interrupt()
//!     .present(true);
//! ```
//!
//! The table is loaded with [`Idt::load`]; see [`crate::idt`] for the global
//! instance.

#![allow(dead_code)]

pub mod df;
pub mod exceptions;

use crate::gdt::KERNEL_CS_SEL;
use crate::gdt::selectors::{CodeSel, SegmentSelector};
use crate::privilege::Dpl;
use bitfield_struct::bitfield;
use core::arch::asm;
use core::ops::{Index, IndexMut};

const _: () = assert!(size_of::<IdtEntry>() == 16);
const _: () = assert!(align_of::<Idt>() == 16);

/// Entry point of a gate. Stubs are naked and never return.
pub type HandlerFn = extern "C" fn();

/// The IST byte and the type/attribute byte of a gate.
#[bitfield(u16)]
pub struct IdtGateAttr {
    /// Interrupt stack table slot; 0 keeps the current stack.
    #[bits(3)]
    pub ist: u8,
    #[bits(5)]
    __zero0: u8,
    /// 0xE interrupt gate, 0xF trap gate.
    #[bits(4)]
    pub typ: u8,
    #[bits(1)]
    pub s: bool,
    #[bits(2)]
    pub dpl: Dpl,
    #[bits(1)]
    pub present: bool,
}

impl IdtGateAttr {
    #[inline]
    #[must_use]
    pub const fn interrupt_gate() -> Self {
        Self::new().with_typ(0xE).with_s(false)
    }

    #[inline]
    #[must_use]
    pub const fn trap_gate() -> Self {
        Self::new().with_typ(0xF).with_s(false)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GateType {
    /// Clears IF on entry.
    InterruptGate,
    TrapGate,
}

#[repr(C, align(16))]
pub struct Idt {
    entries: [IdtEntry; 256],
}

impl Default for Idt {
    fn default() -> Self {
        Self::new()
    }
}

impl Idt {
    /// A table with every gate not present.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [IdtEntry::MISSING; 256],
        }
    }

    /// Loads the table into IDTR.
    ///
    /// # Safety
    /// Must run at CPL0 with every present gate pointing at valid handler code.
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub unsafe fn load(&'static self) {
        let idtr = Idtr {
            limit: (size_of::<Self>() - 1) as u16,
            base: core::ptr::from_ref(self) as u64,
        };
        unsafe {
            asm!("lidt [{}]", in(reg) &raw const idtr, options(readonly, nostack, preserves_flags));
        }
    }
}

impl Index<usize> for Idt {
    type Output = IdtEntry;
    fn index(&self, i: usize) -> &Self::Output {
        &self.entries[i]
    }
}

impl IndexMut<usize> for Idt {
    fn index_mut(&mut self, i: usize) -> &mut Self::Output {
        &mut self.entries[i]
    }
}

/// Operand of `lidt`.
#[repr(C, packed)]
struct Idtr {
    limit: u16,
    base: u64,
}

/// One 16-byte gate descriptor.
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct IdtEntry {
    offset_lo: u16,
    selector: u16,
    attr: u16,
    offset_mid: u16,
    offset_hi: u32,
    zero: u32,
}

impl IdtEntry {
    pub const MISSING: Self = Self {
        offset_lo: 0,
        selector: 0,
        attr: IdtGateAttr::new().into_bits(),
        offset_mid: 0,
        offset_hi: 0,
        zero: 0,
    };

    /// Points the gate at `handler`.
    ///
    /// Defaults: kernel code selector, interrupt gate, DPL 0, no IST, not
    /// present.
    pub fn set_handler(&mut self, handler: HandlerFn) -> IdtEntryBuilder<'_> {
        self.set_handler_addr(handler as usize as u64)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn set_handler_addr(&mut self, addr: u64) -> IdtEntryBuilder<'_> {
        self.offset_lo = addr as u16;
        self.offset_mid = (addr >> 16) as u16;
        self.offset_hi = (addr >> 32) as u32;
        self.selector = KERNEL_CS_SEL.encode();
        self.attr = IdtGateAttr::interrupt_gate().into_bits();
        IdtEntryBuilder { entry: self }
    }

    #[must_use]
    pub fn handler_address(&self) -> u64 {
        u64::from(self.offset_hi) << 32 | u64::from(self.offset_mid) << 16 | u64::from(self.offset_lo)
    }

    #[must_use]
    pub const fn attributes(&self) -> IdtGateAttr {
        IdtGateAttr::from_bits(self.attr)
    }

    #[must_use]
    pub const fn selector(&self) -> u16 {
        self.selector
    }
}

pub struct IdtEntryBuilder<'a> {
    entry: &'a mut IdtEntry,
}

impl IdtEntryBuilder<'_> {
    #[inline]
    pub const fn present(self, p: bool) -> Self {
        self.entry.attr = IdtGateAttr::from_bits(self.entry.attr)
            .with_present(p)
            .into_bits();
        self
    }

    /// Privilege needed to raise the vector with `int n`.
    #[inline]
    pub const fn dpl(self, dpl: Dpl) -> Self {
        self.entry.attr = IdtGateAttr::from_bits(self.entry.attr)
            .with_dpl(dpl)
            .into_bits();
        self
    }

    #[inline]
    pub const fn gate_type(self, gate_type: GateType) -> Self {
        let attr = IdtGateAttr::from_bits(self.entry.attr);
        let attr = match gate_type {
            GateType::InterruptGate => attr.with_typ(0xE),
            GateType::TrapGate => attr.with_typ(0xF),
        };
        self.entry.attr = attr.with_s(false).into_bits();
        self
    }

    #[inline]
    pub const fn gate_interrupt(self) -> Self {
        self.gate_type(GateType::InterruptGate)
    }

    /// # Panics (debug only)
    /// If `idx > 7`.
    #[inline]
    pub fn ist(self, idx: u8) -> Self {
        debug_assert!(idx <= 7);
        self.entry.attr = IdtGateAttr::from_bits(self.entry.attr)
            .with_ist(idx)
            .into_bits();
        self
    }

    #[inline]
    pub const fn selector(self, sel: SegmentSelector<CodeSel>) -> Self {
        self.entry.selector = sel.encode();
        self
    }
}
