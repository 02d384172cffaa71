//! Read-only physical memory access for ACPI discovery.

use kernel_acpi::PhysMapRo;

/// Physical memory the loader left identity-mapped below `limit`.
#[derive(Debug)]
pub struct IdentityPhysMap {
    limit: u64,
}

impl IdentityPhysMap {
    /// # Safety
    /// Every address below `limit` must be mapped readable at the same
    /// virtual address, and firmware tables in that range must not be
    /// modified while the map is in use.
    #[must_use]
    pub const unsafe fn new(limit: u64) -> Self {
        Self { limit }
    }
}

unsafe impl PhysMapRo for IdentityPhysMap {
    fn map_ro(&self, paddr: u64, len: usize) -> Option<&[u8]> {
        let end = paddr.checked_add(u64::try_from(len).ok()?)?;
        if paddr == 0 || end > self.limit {
            return None;
        }
        let ptr = usize::try_from(paddr).ok()? as *const u8;
        // SAFETY: the range is below `limit`, identity-mapped per `new`.
        Some(unsafe { core::slice::from_raw_parts(ptr, len) })
    }
}
