//! # Global Descriptor Table
//!
//! Long mode ignores most of segmentation, but CS still selects 64-bit code
//! and the selectors still carry privilege. The bootstrap processor uses one
//! flat table:
//!
//! Index | Selector | Meaning
//! ------|----------|--------
//! 0     | 0x00     | Null
//! 1     | 0x08     | Kernel code (64-bit, DPL=0)
//! 2     | 0x10     | Kernel data (DPL=0)
//! 3     | 0x1b     | User code (64-bit, DPL=3), RPL=3
//! 4     | 0x23     | User data (DPL=3), RPL=3
//!
//! There is no TSS yet; nothing transitions rings and no handler needs an
//! IST stack.

pub mod descriptors;
pub mod selectors;

use crate::gdt::descriptors::Desc64;
use crate::gdt::selectors::{CodeSel, DataSel, SegmentSelector};
use crate::privilege::{Dpl, Rpl};
use kernel_sync::SyncOnceCell;
use log::debug;

pub const KERNEL_CS_SEL: SegmentSelector<CodeSel> = SegmentSelector::new(1, Rpl::Ring0);
pub const KERNEL_DS_SEL: SegmentSelector<DataSel> = SegmentSelector::new(2, Rpl::Ring0);
pub const USER_CS_SEL: SegmentSelector<CodeSel> = SegmentSelector::new(3, Rpl::Ring3);
pub const USER_DS_SEL: SegmentSelector<DataSel> = SegmentSelector::new(4, Rpl::Ring3);

pub const KERNEL_CS: u16 = KERNEL_CS_SEL.encode();
pub const KERNEL_DS: u16 = KERNEL_DS_SEL.encode();
pub const USER_CS: u16 = USER_CS_SEL.encode();
pub const USER_DS: u16 = USER_DS_SEL.encode();

const _: () = {
    assert!(KERNEL_CS == 0x08);
    assert!(KERNEL_DS == 0x10);
    assert!(USER_CS == 0x1b);
    assert!(USER_DS == 0x23);
};

/// Operand of `lgdt`.
#[repr(C, packed)]
struct DescTablePtr {
    /// Table size minus one.
    limit: u16,
    base: u64,
}

#[repr(C, align(16))]
#[derive(Debug)]
pub struct Gdt {
    null: Desc64,
    kcode: Desc64,
    kdata: Desc64,
    ucode: Desc64,
    udata: Desc64,
}

impl Default for Gdt {
    fn default() -> Self {
        Self::new()
    }
}

impl Gdt {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            null: Desc64::NULL,
            kcode: Desc64::code(Dpl::Ring0),
            kdata: Desc64::data(Dpl::Ring0),
            ucode: Desc64::code(Dpl::Ring3),
            udata: Desc64::data(Dpl::Ring3),
        }
    }

    /// Entries in table order.
    #[must_use]
    pub const fn entries(&self) -> [Desc64; 5] {
        [self.null, self.kcode, self.kdata, self.ucode, self.udata]
    }
}

/// `lgdt` limit; alignment padding after the last entry is excluded.
#[allow(clippy::cast_possible_truncation)]
const GDT_LIMIT: u16 = (size_of::<[Desc64; 5]>() - 1) as u16;

/// Lives in writable memory; the CPU sets accessed bits on segment loads.
static GDT: SyncOnceCell<Gdt> = SyncOnceCell::new();

/// Loads the table with `lgdt`.
///
/// # Safety
/// `gdt` must stay mapped for the lifetime of the CPU.
unsafe fn load_gdt(gdt: &'static Gdt) {
    let ptr = DescTablePtr {
        limit: GDT_LIMIT,
        base: core::ptr::from_ref(gdt) as u64,
    };

    unsafe {
        core::arch::asm!(
            "lgdt [{}]",
            in(reg) &raw const ptr,
            options(readonly, nostack, preserves_flags)
        );
    }
}

/// Installs the flat GDT on the executing CPU and reloads every segment
/// register from it.
///
/// Run with interrupts masked.
pub fn init() {
    let gdt = GDT.get_or_init(Gdt::new);

    unsafe {
        load_gdt(gdt);

        core::arch::asm!(
            "mov ds, {0:x}",
            "mov es, {0:x}",
            "mov ss, {0:x}",
            "mov fs, {0:x}",
            "mov gs, {0:x}",
            in(reg) KERNEL_DS,
            options(nostack, preserves_flags)
        );

        // Far return to reload CS.
        core::arch::asm!(
            "push {cs}",
            "lea {tmp}, [rip + 2f]",
            "push {tmp}",
            "retfq",
            "2:",
            cs = in(reg) u64::from(KERNEL_CS),
            tmp = lateout(reg) _,
            options(preserves_flags)
        );
    }

    debug!(
        "GDT loaded, CS={KERNEL_CS:#04x} DS={KERNEL_DS:#04x} entries={:#018x?}",
        gdt.entries().map(Desc64::to_u64)
    );
}
