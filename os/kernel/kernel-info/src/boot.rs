//! # Kernel Boot Information

/// `"Escapist"` as a big-endian ASCII tag.
pub const BOOT_MAGIC: u64 = 0x4573_6361_7069_7374;

/// Layout version of [`KernelBootInfo`]; loader and kernel must agree.
pub const BOOT_VERSION: u64 = 0xDEAD_BEEF_ECEB_CAFE;

/// Kernel function pointer.
///
/// # ABI
/// The loader jumps in with the boot info pointer in `rdi` (System V).
pub type KernelEntryFn = extern "sysv64" fn(*const KernelBootInfo) -> !;

/// Identifies the image and the layout of the rest of the handoff.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelBootHeader {
    pub magic: u64,
    pub kernel_version: u64,
    /// Size of the loaded kernel image in bytes.
    pub kernel_size: u64,
    /// Physical address of the entry point.
    pub kernel_entry: u64,
}

/// Information the kernel receives from the loader.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelBootInfo {
    pub header: KernelBootHeader,

    /// Physical address the image was loaded at.
    pub base_address: u64,

    /// RSDP physical address, or 0 if the firmware did not provide one.
    pub rsdp_addr: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BootInfoError {
    #[error("bad boot magic {0:#018x}")]
    BadMagic(u64),
    #[error("boot info version {found:#018x} does not match {expected:#018x}")]
    VersionMismatch { found: u64, expected: u64 },
}

impl KernelBootInfo {
    /// Builds a handoff block carrying the current magic and version.
    #[must_use]
    pub const fn new(kernel_size: u64, kernel_entry: u64, base_address: u64, rsdp_addr: u64) -> Self {
        Self {
            header: KernelBootHeader {
                magic: BOOT_MAGIC,
                kernel_version: BOOT_VERSION,
                kernel_size,
                kernel_entry,
            },
            base_address,
            rsdp_addr,
        }
    }

    /// Checks the magic first, then the layout version.
    ///
    /// # Errors
    /// [`BootInfoError`] naming the first field that does not match.
    pub const fn validate(&self) -> Result<(), BootInfoError> {
        if self.header.magic != BOOT_MAGIC {
            return Err(BootInfoError::BadMagic(self.header.magic));
        }
        if self.header.kernel_version != BOOT_VERSION {
            return Err(BootInfoError::VersionMismatch {
                found: self.header.kernel_version,
                expected: BOOT_VERSION,
            });
        }
        Ok(())
    }

    /// The RSDP address, if one was handed over.
    #[must_use]
    pub const fn rsdp(&self) -> Option<u64> {
        if self.rsdp_addr == 0 {
            None
        } else {
            Some(self.rsdp_addr)
        }
    }
}
