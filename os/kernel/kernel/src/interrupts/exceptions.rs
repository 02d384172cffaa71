//! Halting entry stubs for the 32 architectural exception vectors.
//!
//! Each stub masks interrupts, aligns the stack and calls
//! [`exception_halt`] with its vector number. Nothing is recovered.

use crate::gdt::KERNEL_CS_SEL;
use crate::interrupts::df::{DF_VECTOR, DfInterrupt, double_fault_handler};
use crate::interrupts::{HandlerFn, Idt};
use log::error;

pub const EXCEPTION_VECTORS: usize = 32;

const NAMES: [&str; EXCEPTION_VECTORS] = [
    "#DE divide error",
    "#DB debug",
    "NMI",
    "#BP breakpoint",
    "#OF overflow",
    "#BR bound range exceeded",
    "#UD invalid opcode",
    "#NM device not available",
    "#DF double fault",
    "coprocessor segment overrun",
    "#TS invalid TSS",
    "#NP segment not present",
    "#SS stack-segment fault",
    "#GP general protection",
    "#PF page fault",
    "reserved",
    "#MF x87 floating-point",
    "#AC alignment check",
    "#MC machine check",
    "#XM SIMD floating-point",
    "#VE virtualization",
    "#CP control protection",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
    "reserved",
    "#HV hypervisor injection",
    "#VC VMM communication",
    "#SX security",
    "reserved",
];

/// Mnemonic and name of an exception vector.
#[must_use]
pub fn exception_name(vector: u64) -> &'static str {
    usize::try_from(vector)
        .ok()
        .and_then(|v| NAMES.get(v).copied())
        .unwrap_or("not an exception")
}

extern "C" fn exception_halt(vector: u64) -> ! {
    error!("unhandled exception {vector} ({})", exception_name(vector));
    crate::halt_forever()
}

macro_rules! halting_stubs {
    ($($name:ident = $vector:literal),* $(,)?) => {
        $(
            #[unsafe(naked)]
            extern "C" fn $name() {
                core::arch::naked_asm!(
                    "cli",
                    "mov edi, {vector}",
                    "and rsp, -16",
                    "call {halt}",
                    "2: hlt",
                    "jmp 2b",
                    vector = const $vector,
                    halt = sym exception_halt,
                );
            }
        )*

        /// Entry stubs in vector order.
        const STUBS: [HandlerFn; EXCEPTION_VECTORS] = [$($name),*];
    };
}

halting_stubs! {
    vector_0 = 0, vector_1 = 1, vector_2 = 2, vector_3 = 3,
    vector_4 = 4, vector_5 = 5, vector_6 = 6, vector_7 = 7,
    vector_8 = 8, vector_9 = 9, vector_10 = 10, vector_11 = 11,
    vector_12 = 12, vector_13 = 13, vector_14 = 14, vector_15 = 15,
    vector_16 = 16, vector_17 = 17, vector_18 = 18, vector_19 = 19,
    vector_20 = 20, vector_21 = 21, vector_22 = 22, vector_23 = 23,
    vector_24 = 24, vector_25 = 25, vector_26 = 26, vector_27 = 27,
    vector_28 = 28, vector_29 = 29, vector_30 = 30, vector_31 = 31,
}

/// Points all exception vectors at halting stubs; the double fault gets the
/// handler that logs CR2 first.
pub fn install_exception_gates(idt: &mut Idt) {
    for (vector, stub) in STUBS.iter().enumerate() {
        if vector == DF_VECTOR {
            continue;
        }
        idt[vector]
            .set_handler(*stub)
            .selector(KERNEL_CS_SEL)
            .gate_interrupt()
            .present(true);
    }
    idt.init_df_gate(double_fault_handler);
}
