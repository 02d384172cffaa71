//! RSDT / XSDT: arrays of physical pointers to the remaining tables.

use crate::rsdp::RootTableAddress;
use crate::sdt::{MappedTable, SDT_HEADER_LEN, map_table};
use crate::view::TableView;
use crate::{AcpiError, PhysMapRo};

pub const RSDT_SIGNATURE: &[u8; 4] = b"RSDT";
pub const XSDT_SIGNATURE: &[u8; 4] = b"XSDT";

/// The only XSDT revision defined so far.
pub const XSDT_REVISION: u8 = 1;

/// A validated root table.
#[derive(Debug, Clone, Copy)]
pub struct RootTable<'a> {
    table: MappedTable<'a>,
    entry_width: usize,
    entry_count: usize,
}

impl<'a> RootTable<'a> {
    /// Maps and validates the root table the RSDP points at.
    ///
    /// Checks run in order: length, checksum, signature, then (XSDT only) the
    /// revision. A table whose payload holds no complete pointer is rejected
    /// with [`AcpiError::MismatchCrosstable`].
    ///
    /// # Errors
    /// See [`AcpiError`]; a payload that is not a whole number of pointers is
    /// [`AcpiError::MalformedTable`].
    pub fn map<M: PhysMapRo + ?Sized>(
        map: &'a M,
        root: RootTableAddress,
    ) -> Result<Self, AcpiError> {
        let (table, entry_width) = match root {
            RootTableAddress::Rsdt(addr) => (map_table(map, addr, RSDT_SIGNATURE)?, 4),
            RootTableAddress::Xsdt(addr) => {
                let table = map_table(map, addr, XSDT_SIGNATURE)?;
                if table.header.revision != XSDT_REVISION {
                    return Err(AcpiError::MismatchRevision);
                }
                (table, 8)
            }
        };

        let payload = table.header.table_len() - SDT_HEADER_LEN;
        let entry_count = payload / entry_width;
        if entry_count == 0 {
            return Err(AcpiError::MismatchCrosstable);
        }
        if payload % entry_width != 0 {
            return Err(AcpiError::MalformedTable);
        }

        Ok(Self {
            table,
            entry_width,
            entry_count,
        })
    }

    #[must_use]
    pub const fn entry_count(&self) -> usize {
        self.entry_count
    }

    #[must_use]
    pub const fn entry_width(&self) -> usize {
        self.entry_width
    }

    #[must_use]
    pub const fn table(&self) -> &MappedTable<'a> {
        &self.table
    }

    /// Physical addresses of the sub-tables, in table order.
    pub fn entries(&self) -> RootEntries<'a> {
        RootEntries {
            view: self.table.view,
            width: self.entry_width,
            next: 0,
            count: self.entry_count,
        }
    }
}

/// Iterator over the pointer array of a [`RootTable`].
pub struct RootEntries<'a> {
    view: TableView<'a>,
    width: usize,
    next: usize,
    count: usize,
}

impl Iterator for RootEntries<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.next >= self.count {
            return None;
        }
        let offset = SDT_HEADER_LEN + self.next * self.width;
        self.next += 1;
        let entry = if self.width == 8 {
            self.view.u64(offset)
        } else {
            self.view.u32(offset).map(u64::from)
        };
        entry.ok()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.count - self.next;
        (left, Some(left))
    }
}
