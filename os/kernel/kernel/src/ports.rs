//! # x86 I/O port access
//!
//! Byte-wide `in`/`out` for the legacy devices the boot path touches (the
//! PIT). Neither instruction is a memory fence.

/// Write one byte to an I/O port.
///
/// # Safety
/// Must run at CPL0 (or with I/O permission for `port`), and `port` must be
/// the intended device register in a state that accepts `val`.
#[inline]
pub unsafe fn outb(port: u16, val: u8) {
    unsafe {
        core::arch::asm!("out dx, al", in("dx") port, in("al") val, options(nomem, nostack, preserves_flags));
    }
}

/// Read one byte from an I/O port.
///
/// # Safety
/// Same as [`outb`].
#[inline]
pub unsafe fn inb(port: u16) -> u8 {
    let v: u8;
    unsafe {
        core::arch::asm!("in al, dx", in("dx") port, out("al") v, options(nomem, nostack, preserves_flags));
    }
    v
}
