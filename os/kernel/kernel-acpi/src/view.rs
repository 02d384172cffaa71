//! Bounds-checked little-endian reads over a mapped table.

use crate::AcpiError;

/// A byte slice with checked fixed-width reads.
///
/// Every read is an index into the slice; an offset past the end yields
/// [`AcpiError::MalformedTable`] instead of touching memory beyond the mapping.
#[derive(Debug, Clone, Copy)]
pub struct TableView<'a> {
    bytes: &'a [u8],
}

impl<'a> TableView<'a> {
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Returns `len` bytes starting at `offset`.
    pub fn bytes(&self, offset: usize, len: usize) -> Result<&'a [u8], AcpiError> {
        let end = offset.checked_add(len).ok_or(AcpiError::MalformedTable)?;
        self.bytes.get(offset..end).ok_or(AcpiError::MalformedTable)
    }

    /// A sub-view of `len` bytes starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> Result<Self, AcpiError> {
        self.bytes(offset, len).map(Self::new)
    }

    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N], AcpiError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(offset, N)?);
        Ok(out)
    }

    pub fn u8(&self, offset: usize) -> Result<u8, AcpiError> {
        self.bytes.get(offset).copied().ok_or(AcpiError::MalformedTable)
    }

    pub fn u16(&self, offset: usize) -> Result<u16, AcpiError> {
        self.array(offset).map(u16::from_le_bytes)
    }

    pub fn u32(&self, offset: usize) -> Result<u32, AcpiError> {
        self.array(offset).map(u32::from_le_bytes)
    }

    pub fn u64(&self, offset: usize) -> Result<u64, AcpiError> {
        self.array(offset).map(u64::from_le_bytes)
    }

    /// Reads a fixed-size tag such as a table signature.
    pub fn tag<const N: usize>(&self, offset: usize) -> Result<[u8; N], AcpiError> {
        self.array(offset)
    }
}
