//! Real-mode code secondaries run after a STARTUP IPI.
//!
//! For now they only park: there is no protected-mode or long-mode
//! trampoline yet, so a woken processor masks interrupts and halts.

use kernel_info::memory::{AP_STARTUP_PAGE, LOW_MEMORY_LIMIT, PAGE_SIZE};
use log::debug;

/// `cli; hlt; jmp $-1`
pub const PARK_CODE: [u8; 4] = [0xFA, 0xF4, 0xEB, 0xFD];

const _: () = {
    assert!(AP_STARTUP_PAGE.is_multiple_of(PAGE_SIZE));
    assert!(AP_STARTUP_PAGE < LOW_MEMORY_LIMIT);
};

/// Copies [`PARK_CODE`] to [`AP_STARTUP_PAGE`] and returns that address.
///
/// # Safety
/// The page must be identity-mapped, writable and unused by anything else.
#[allow(clippy::cast_possible_truncation)]
pub unsafe fn install_park_trampoline() -> u64 {
    let dst = AP_STARTUP_PAGE as usize as *mut u8;
    for (i, byte) in PARK_CODE.iter().enumerate() {
        unsafe { core::ptr::write_volatile(dst.add(i), *byte) };
    }
    debug!("park trampoline installed at {AP_STARTUP_PAGE:#x}");
    AP_STARTUP_PAGE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_lands_on_hlt() {
        let [cli, hlt, jmp, rel] = PARK_CODE;
        assert_eq!((cli, hlt, jmp), (0xFA, 0xF4, 0xEB));
        let target = PARK_CODE.len().cast_signed() + isize::from(rel.cast_signed());
        assert_eq!(target, 1);
    }
}
