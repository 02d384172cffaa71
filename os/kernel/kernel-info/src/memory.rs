//! # Memory Layout

/// Size of a small page.
pub const PAGE_SIZE: u64 = 4096;

/// Real-mode addressable memory; STARTUP IPIs can only target code below it.
pub const LOW_MEMORY_LIMIT: u64 = 0x10_0000; // 1 MiB

/// Physical page application processors start executing at.
///
/// Sits above the real-mode IVT and BDA and below the EBDA.
pub const AP_STARTUP_PAGE: u64 = 0x8000;

/// The loader identity-maps physical memory below this address, including
/// the firmware tables and the local APIC window.
pub const IDENTITY_MAP_LIMIT: u64 = 0x1_0000_0000; // 4 GiB

/// Size of the boot processor's initial stack.
pub const BOOT_STACK_SIZE: usize = 64 * 1024;

const _: () = {
    assert!(AP_STARTUP_PAGE.is_multiple_of(PAGE_SIZE));
    assert!(AP_STARTUP_PAGE + PAGE_SIZE <= LOW_MEMORY_LIMIT);
    assert!(BOOT_STACK_SIZE.is_multiple_of(16));
    assert!(LOW_MEMORY_LIMIT <= IDENTITY_MAP_LIMIT);
};
