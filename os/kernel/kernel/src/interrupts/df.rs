use crate::gdt::KERNEL_CS_SEL;
use crate::interrupts::{GateType, Idt};
use log::error;

pub const DF_VECTOR: usize = 0x08;

pub trait DfInterrupt {
    fn init_df_gate(&mut self, handler: extern "C" fn()) -> &mut Self;
}

impl DfInterrupt for Idt {
    fn init_df_gate(&mut self, handler: extern "C" fn()) -> &mut Self {
        // Without a TSS there is no IST stack; the fault runs on the current one.
        self[DF_VECTOR]
            .set_handler(handler)
            .selector(KERNEL_CS_SEL)
            .gate_type(GateType::InterruptGate)
            .present(true);
        self
    }
}

/// Logs CR2 and halts.
#[unsafe(naked)]
pub extern "C" fn double_fault_handler() {
    core::arch::naked_asm!(
        "cli",
        "mov rdi, cr2",
        "and rsp, -16",
        "call {rust}",
        "2: hlt",
        "jmp 2b",
        rust = sym df_rust
    );
}

extern "C" fn df_rust(cr2: u64) {
    error!("#DF cr2={cr2:#x}");
}
