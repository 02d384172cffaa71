use core::ptr::NonNull;

/// Raw 32-bit access to the local APIC register window.
///
/// Implementations do not validate offsets; [`crate::LocalApic`] does that
/// before calling in.
pub trait ApicRegisterAccess {
    fn read32(&mut self, offset: u32) -> u32;
    fn write32(&mut self, offset: u32, value: u32);
}

/// Volatile MMIO access through a mapped register window.
#[derive(Debug)]
pub struct MmioApicRegisters {
    base: NonNull<u32>,
}

impl MmioApicRegisters {
    /// # Safety
    /// `base` must be the virtual address of the local APIC window, mapped
    /// uncached and valid for the lifetime of the returned value, and nothing
    /// else may access the window concurrently.
    #[must_use]
    pub const unsafe fn new(base: NonNull<u32>) -> Self {
        Self { base }
    }

    #[inline]
    fn slot(&self, offset: u32) -> *mut u32 {
        // Offsets are validated and 16-byte aligned by the caller.
        unsafe { self.base.as_ptr().add(offset as usize / 4) }
    }
}

impl ApicRegisterAccess for MmioApicRegisters {
    #[inline]
    fn read32(&mut self, offset: u32) -> u32 {
        unsafe { core::ptr::read_volatile(self.slot(offset)) }
    }

    #[inline]
    fn write32(&mut self, offset: u32, value: u32) {
        unsafe { core::ptr::write_volatile(self.slot(offset), value) }
    }
}
