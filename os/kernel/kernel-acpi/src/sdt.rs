//! The 36-byte System Description Table header shared by every ACPI table.

use crate::checksum::{signature_matches, verify_checksum};
use crate::view::TableView;
use crate::{AcpiError, PhysMapRo};

/// Size of the common table header in bytes.
pub const SDT_HEADER_LEN: usize = 36;

/// Decoded common table header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SdtHeader {
    pub signature: [u8; 4],
    pub length: u32,
    pub revision: u8,
    pub checksum: u8,
    pub oem_id: [u8; 6],
    pub oem_table_id: [u8; 8],
    pub oem_revision: u32,
    pub creator_id: u32,
    pub creator_revision: u32,
}

impl SdtHeader {
    /// Decodes the header from the first [`SDT_HEADER_LEN`] bytes of `view`.
    ///
    /// # Errors
    /// [`AcpiError::MalformedTable`] if fewer than 36 bytes are available.
    pub fn parse(view: &TableView<'_>) -> Result<Self, AcpiError> {
        Ok(Self {
            signature: view.tag(0)?,
            length: view.u32(4)?,
            revision: view.u8(8)?,
            checksum: view.u8(9)?,
            oem_id: view.tag(10)?,
            oem_table_id: view.tag(16)?,
            oem_revision: view.u32(24)?,
            creator_id: view.u32(28)?,
            creator_revision: view.u32(32)?,
        })
    }

    /// Declared table length as a `usize`.
    #[must_use]
    pub fn table_len(&self) -> usize {
        usize::try_from(self.length).unwrap_or(usize::MAX)
    }

    /// The signature as text, for diagnostics.
    #[must_use]
    pub fn signature_str(&self) -> &str {
        core::str::from_utf8(&self.signature).unwrap_or("????")
    }
}

/// A whole table mapped from physical memory, with its header decoded.
#[derive(Debug, Clone, Copy)]
pub struct MappedTable<'a> {
    pub header: SdtHeader,
    pub view: TableView<'a>,
}

/// Maps only the header of the table at `paddr`.
pub(crate) fn map_header<M: PhysMapRo + ?Sized>(
    map: &M,
    paddr: u64,
) -> Result<SdtHeader, AcpiError> {
    if paddr == 0 {
        return Err(AcpiError::InvalidParameter);
    }
    let bytes = map
        .map_ro(paddr, SDT_HEADER_LEN)
        .ok_or(AcpiError::InvalidParameter)?;
    SdtHeader::parse(&TableView::new(bytes))
}

/// Maps the full table at `paddr` and verifies its checksum and signature,
/// in that order.
pub(crate) fn map_table<'m, M: PhysMapRo + ?Sized>(
    map: &'m M,
    paddr: u64,
    signature: &[u8; 4],
) -> Result<MappedTable<'m>, AcpiError> {
    let header = map_header(map, paddr)?;
    let len = header.table_len();
    if len < SDT_HEADER_LEN {
        return Err(AcpiError::MalformedTable);
    }

    let bytes = map.map_ro(paddr, len).ok_or(AcpiError::InvalidParameter)?;
    if !verify_checksum(bytes, len) {
        return Err(AcpiError::MismatchChecksum);
    }
    if !signature_matches(&header.signature, signature, signature.len()) {
        return Err(AcpiError::MismatchSignature);
    }

    Ok(MappedTable {
        header,
        view: TableView::new(bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_fields() {
        let mut raw = [0u8; SDT_HEADER_LEN];
        raw[0..4].copy_from_slice(b"XSDT");
        raw[4..8].copy_from_slice(&44u32.to_le_bytes());
        raw[8] = 1;
        raw[9] = 0xAB;
        raw[10..16].copy_from_slice(b"BOCHS ");
        raw[16..24].copy_from_slice(b"BXPC    ");
        raw[24..28].copy_from_slice(&1u32.to_le_bytes());
        raw[28..32].copy_from_slice(b"BXPC");
        raw[32..36].copy_from_slice(&0x0100_0013u32.to_le_bytes());

        let header = SdtHeader::parse(&TableView::new(&raw)).unwrap();
        assert_eq!(&header.signature, b"XSDT");
        assert_eq!(header.signature_str(), "XSDT");
        assert_eq!(header.length, 44);
        assert_eq!(header.revision, 1);
        assert_eq!(header.checksum, 0xAB);
        assert_eq!(&header.oem_id, b"BOCHS ");
        assert_eq!(&header.oem_table_id, b"BXPC    ");
        assert_eq!(header.creator_revision, 0x0100_0013);
    }

    #[test]
    fn short_header_is_malformed() {
        let raw = [0u8; SDT_HEADER_LEN - 1];
        assert_eq!(
            SdtHeader::parse(&TableView::new(&raw)),
            Err(AcpiError::MalformedTable)
        );
    }
}
