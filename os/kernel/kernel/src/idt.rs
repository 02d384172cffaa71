//! # Global Interrupt Descriptor Table
//!
//! One table shared by the bootstrap processor, built once and loaded with
//! `lidt`. Load the GDT first so the kernel code selector in every gate is
//! valid.

use crate::interrupts::Idt;
use crate::interrupts::exceptions::{EXCEPTION_VECTORS, install_exception_gates};
use kernel_sync::SyncOnceCell;
use log::debug;

static IDT: SyncOnceCell<Idt> = SyncOnceCell::new();

/// Builds the exception table on first use and loads it on the executing CPU.
pub fn init() {
    let idt = IDT.get_or_init(|| {
        let mut idt = Idt::new();
        install_exception_gates(&mut idt);
        idt
    });

    unsafe {
        idt.load();
    }
    debug!("IDT loaded with {EXCEPTION_VECTORS} exception gates");
}
