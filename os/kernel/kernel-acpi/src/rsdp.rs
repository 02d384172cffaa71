//! # Root System Description Pointer (RSDP / XSDP)
//!
//! The firmware hands the kernel the physical address of this structure. Its
//! first 20 bytes are the ACPI 1.0 layout and carry their own checksum; ACPI 2.0+
//! appends a length, the 64-bit XSDT address and an extended checksum covering
//! the full 36 bytes.
//!
//! ```text
//! 0        8   9      15  16        20      24          32   33
//! +--------+---+------+---+---------+-------+-----------+----+-----+
//! |"RSD PTR "|cs| OEM  |rev| RSDT(32)| length| XSDT (64) | ecs| rsv |
//! +--------+---+------+---+---------+-------+-----------+----+-----+
//!  \________ revision 0/1 (20 bytes) _______/\_____ revision 2 _____/
//! ```

use crate::checksum::{signature_matches, verify_checksum};
use crate::view::TableView;
use crate::{AcpiError, PhysMapRo};
use log::debug;

/// Signature at offset 0.
pub const RSDP_SIGNATURE: &[u8; 8] = b"RSD PTR ";

/// Size of the ACPI 1.0 structure covered by the first checksum.
pub const RSDP_V1_LEN: usize = 20;

/// Size of the ACPI 2.0+ structure covered by the extended checksum.
pub const XSDP_LEN: usize = 36;

/// Which root table the pointer leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootTableAddress {
    /// ACPI 1.0: RSDT with 32-bit entries.
    Rsdt(u64),
    /// ACPI 2.0+: XSDT with 64-bit entries.
    Xsdt(u64),
}

impl RootTableAddress {
    #[must_use]
    pub const fn address(self) -> u64 {
        match self {
            Self::Rsdt(a) | Self::Xsdt(a) => a,
        }
    }
}

/// A validated root pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootPointer {
    pub rsdp_addr: u64,
    pub oem_id: [u8; 6],
    pub revision: u8,
    pub root: RootTableAddress,
}

impl RootPointer {
    /// Validates the structure at `rsdp_addr`.
    ///
    /// The checksum over the first 20 bytes is checked before the signature.
    /// For revisions 0 and 1 nothing past offset 20 is mapped. Revision 2 maps
    /// the 36-byte form and verifies the extended checksum as well.
    ///
    /// # Errors
    /// * [`AcpiError::InvalidParameter`] for a null or unmappable address.
    /// * [`AcpiError::MismatchChecksum`] / [`AcpiError::MismatchSignature`].
    /// * [`AcpiError::UnsupportedVersion`] for revisions other than 0, 1 and 2.
    pub fn parse<M: PhysMapRo + ?Sized>(map: &M, rsdp_addr: u64) -> Result<Self, AcpiError> {
        if rsdp_addr == 0 {
            return Err(AcpiError::InvalidParameter);
        }

        let v1 = map
            .map_ro(rsdp_addr, RSDP_V1_LEN)
            .ok_or(AcpiError::InvalidParameter)?;
        if !verify_checksum(v1, RSDP_V1_LEN) {
            return Err(AcpiError::MismatchChecksum);
        }
        if !signature_matches(v1, RSDP_SIGNATURE, RSDP_SIGNATURE.len()) {
            return Err(AcpiError::MismatchSignature);
        }

        let view = TableView::new(v1);
        let oem_id = view.tag(9)?;
        let revision = view.u8(15)?;

        let root = match revision {
            0 | 1 => RootTableAddress::Rsdt(u64::from(view.u32(16)?)),
            2 => {
                let full = map
                    .map_ro(rsdp_addr, XSDP_LEN)
                    .ok_or(AcpiError::InvalidParameter)?;
                if !verify_checksum(full, XSDP_LEN) {
                    return Err(AcpiError::MismatchChecksum);
                }
                RootTableAddress::Xsdt(TableView::new(full).u64(24)?)
            }
            _ => return Err(AcpiError::UnsupportedVersion),
        };

        debug!(
            "RSDP at {rsdp_addr:#x}: revision {revision}, OEM {:?}, root {root:x?}",
            core::str::from_utf8(&oem_id).unwrap_or("??????")
        );

        Ok(Self {
            rsdp_addr,
            oem_id,
            revision,
            root,
        })
    }
}
