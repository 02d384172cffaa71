//! # Multiple APIC Description Table (MADT)
//!
//! After the common header the MADT carries the physical address of the local
//! APIC window, a flags word, and then a packed stream of interrupt controller
//! structures, each prefixed by `(type: u8, length: u8)`:
//!
//! ```text
//! 0          36        40      44
//! +----------+---------+-------+------+-----+------+-----+-- ... --+
//! |  header  | LAPIC   | flags | type | len | body | type| len ... |
//! +----------+---------+-------+------+-----+------+-----+-- ... --+
//! ```
//!
//! Entries are laid out back-to-back and the stream ends exactly at
//! `header.length`. Types this module does not know are surfaced as
//! [`InterruptControllerEntry::Unknown`] and skipped by their length; a length
//! that cannot advance the cursor is a hard error.

use crate::sdt::{MappedTable, SdtHeader, map_table};
use crate::topology::{InterruptOverride, IoApicRecord, ProcessorRecord, Topology};
use crate::view::TableView;
use crate::{AcpiError, PhysMapRo};
use bitfield_struct::bitfield;
use log::{debug, trace};

pub const MADT_SIGNATURE: &[u8; 4] = b"APIC";

/// Offset of the first interrupt controller structure.
pub const MADT_ENTRIES_OFFSET: usize = 44;

const ENTRY_HEADER_LEN: usize = 2;

/// MADT flags word (offset 40).
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct MadtFlags {
    /// A dual 8259 PIC is installed and must be masked before using the APICs.
    pub pcat_compat: bool,
    #[bits(31)]
    __: u32,
}

/// Flags of a processor local APIC / x2APIC structure.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct LocalApicFlags {
    /// The processor is usable.
    pub enabled: bool,
    /// The processor may be enabled at runtime (only meaningful if `enabled` is clear).
    pub online_capable: bool,
    #[bits(30)]
    __: u32,
}

/// Interrupt input polarity of an MPS INTI flags word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Whatever the bus defaults to.
    Conforming,
    ActiveHigh,
    Reserved,
    ActiveLow,
}

impl Polarity {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Conforming,
            1 => Self::ActiveHigh,
            2 => Self::Reserved,
            _ => Self::ActiveLow,
        }
    }

    const fn into_bits(self) -> u8 {
        self as u8
    }
}

/// Interrupt input trigger mode of an MPS INTI flags word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    /// Whatever the bus defaults to.
    Conforming,
    Edge,
    Reserved,
    Level,
}

impl TriggerMode {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Conforming,
            1 => Self::Edge,
            2 => Self::Reserved,
            _ => Self::Level,
        }
    }

    const fn into_bits(self) -> u8 {
        self as u8
    }
}

/// MPS INTI flags attached to overrides and NMI structures.
#[bitfield(u16)]
#[derive(PartialEq, Eq)]
pub struct MpsIntiFlags {
    #[bits(2)]
    pub polarity: Polarity,
    #[bits(2)]
    pub trigger: TriggerMode,
    #[bits(12)]
    __: u16,
}

/// Type 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorLocalApic {
    pub uid: u8,
    pub apic_id: u8,
    pub flags: LocalApicFlags,
}

/// Type 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoApic {
    pub id: u8,
    pub address: u32,
    pub gsi_base: u32,
}

/// Type 2: an ISA IRQ routed to a different global system interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptSourceOverride {
    pub bus: u8,
    pub source: u8,
    pub gsi: u32,
    pub flags: MpsIntiFlags,
}

/// Type 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NmiSource {
    pub flags: MpsIntiFlags,
    pub gsi: u32,
}

/// Type 4. A `uid` of `0xFF` applies to all processors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalApicNmi {
    pub uid: u8,
    pub flags: MpsIntiFlags,
    pub lint: u8,
}

/// Type 5: 64-bit replacement for the 32-bit local APIC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalApicAddressOverride {
    pub address: u64,
}

/// Type 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorLocalX2Apic {
    pub x2apic_id: u32,
    pub flags: LocalApicFlags,
    pub uid: u32,
}

/// Type 11 (ARM systems).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GicCpuInterface {
    pub interface: u32,
    pub uid: u32,
    pub flags: u32,
    pub physical_base: u64,
    pub mpidr: u64,
}

/// One decoded interrupt controller structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptControllerEntry<'a> {
    ProcessorLocalApic(ProcessorLocalApic),
    IoApic(IoApic),
    InterruptSourceOverride(InterruptSourceOverride),
    NmiSource(NmiSource),
    LocalApicNmi(LocalApicNmi),
    LocalApicAddressOverride(LocalApicAddressOverride),
    ProcessorLocalX2Apic(ProcessorLocalX2Apic),
    GicCpuInterface(GicCpuInterface),
    /// Any other type, kept only so the stream can be skipped past it.
    Unknown {
        entry_type: u8,
        length: u8,
        raw: &'a [u8],
    },
}

impl<'a> InterruptControllerEntry<'a> {
    pub const PROCESSOR_LOCAL_APIC: u8 = 0;
    pub const IO_APIC: u8 = 1;
    pub const INTERRUPT_SOURCE_OVERRIDE: u8 = 2;
    pub const NMI_SOURCE: u8 = 3;
    pub const LOCAL_APIC_NMI: u8 = 4;
    pub const LOCAL_APIC_ADDRESS_OVERRIDE: u8 = 5;
    pub const PROCESSOR_LOCAL_X2APIC: u8 = 9;
    pub const GIC_CPU_INTERFACE: u8 = 11;

    /// Decodes a single structure. `raw` spans exactly the declared length,
    /// header included.
    ///
    /// # Errors
    /// [`AcpiError::MalformedTable`] if a known structure is shorter than its
    /// fixed layout.
    pub fn decode(raw: &'a [u8]) -> Result<Self, AcpiError> {
        let v = TableView::new(raw);
        let entry_type = v.u8(0)?;
        let length = v.u8(1)?;

        let min_len = match entry_type {
            Self::PROCESSOR_LOCAL_APIC | Self::NMI_SOURCE => 8,
            Self::IO_APIC | Self::LOCAL_APIC_ADDRESS_OVERRIDE => 12,
            Self::INTERRUPT_SOURCE_OVERRIDE => 10,
            Self::LOCAL_APIC_NMI => 6,
            Self::PROCESSOR_LOCAL_X2APIC => 16,
            Self::GIC_CPU_INTERFACE => 80,
            _ => ENTRY_HEADER_LEN,
        };
        if raw.len() < min_len {
            return Err(AcpiError::MalformedTable);
        }

        Ok(match entry_type {
            Self::PROCESSOR_LOCAL_APIC => Self::ProcessorLocalApic(ProcessorLocalApic {
                uid: v.u8(2)?,
                apic_id: v.u8(3)?,
                flags: LocalApicFlags::from_bits(v.u32(4)?),
            }),
            Self::IO_APIC => Self::IoApic(IoApic {
                id: v.u8(2)?,
                address: v.u32(4)?,
                gsi_base: v.u32(8)?,
            }),
            Self::INTERRUPT_SOURCE_OVERRIDE => {
                Self::InterruptSourceOverride(InterruptSourceOverride {
                    bus: v.u8(2)?,
                    source: v.u8(3)?,
                    gsi: v.u32(4)?,
                    flags: MpsIntiFlags::from_bits(v.u16(8)?),
                })
            }
            Self::NMI_SOURCE => Self::NmiSource(NmiSource {
                flags: MpsIntiFlags::from_bits(v.u16(2)?),
                gsi: v.u32(4)?,
            }),
            Self::LOCAL_APIC_NMI => Self::LocalApicNmi(LocalApicNmi {
                uid: v.u8(2)?,
                flags: MpsIntiFlags::from_bits(v.u16(3)?),
                lint: v.u8(5)?,
            }),
            Self::LOCAL_APIC_ADDRESS_OVERRIDE => {
                Self::LocalApicAddressOverride(LocalApicAddressOverride {
                    address: v.u64(4)?,
                })
            }
            Self::PROCESSOR_LOCAL_X2APIC => Self::ProcessorLocalX2Apic(ProcessorLocalX2Apic {
                x2apic_id: v.u32(4)?,
                flags: LocalApicFlags::from_bits(v.u32(8)?),
                uid: v.u32(12)?,
            }),
            Self::GIC_CPU_INTERFACE => Self::GicCpuInterface(GicCpuInterface {
                interface: v.u32(4)?,
                uid: v.u32(8)?,
                flags: v.u32(12)?,
                physical_base: v.u64(32)?,
                mpidr: v.u64(68)?,
            }),
            _ => Self::Unknown {
                entry_type,
                length,
                raw,
            },
        })
    }
}

/// A validated MADT.
#[derive(Debug, Clone, Copy)]
pub struct Madt<'a> {
    pub header: SdtHeader,
    pub local_apic_address: u32,
    pub flags: MadtFlags,
    view: TableView<'a>,
}

impl<'a> Madt<'a> {
    /// Maps the MADT at `paddr` and validates it.
    ///
    /// Checksum and signature are verified before the fixed fields are read,
    /// and no entry is looked at until both pass.
    ///
    /// # Errors
    /// [`AcpiError::InvalidParameter`] for a null address, then checksum,
    /// signature and [`AcpiError::MalformedTable`] for a table too short to
    /// hold the fixed fields.
    pub fn map<M: PhysMapRo + ?Sized>(map: &'a M, paddr: u64) -> Result<Self, AcpiError> {
        Self::from_table(map_table(map, paddr, MADT_SIGNATURE)?)
    }

    /// Reads the fixed fields of an already validated table.
    ///
    /// # Errors
    /// [`AcpiError::MalformedTable`] if the table ends before offset 44.
    pub fn from_table(table: MappedTable<'a>) -> Result<Self, AcpiError> {
        if table.view.len() < MADT_ENTRIES_OFFSET {
            return Err(AcpiError::MalformedTable);
        }
        Ok(Self {
            header: table.header,
            local_apic_address: table.view.u32(36)?,
            flags: MadtFlags::from_bits(table.view.u32(40)?),
            view: table.view,
        })
    }

    /// Iterates the interrupt controller structures.
    #[must_use]
    pub const fn entries(&self) -> MadtEntries<'a> {
        MadtEntries {
            view: self.view,
            cursor: MADT_ENTRIES_OFFSET,
            failed: false,
        }
    }
}

/// Iterator over the entry stream of a [`Madt`].
///
/// Yields at most one error and then stops.
#[derive(Debug, Clone)]
pub struct MadtEntries<'a> {
    view: TableView<'a>,
    cursor: usize,
    failed: bool,
}

impl<'a> MadtEntries<'a> {
    fn step(&mut self) -> Result<InterruptControllerEntry<'a>, AcpiError> {
        let remaining = self.view.len() - self.cursor;
        if remaining < ENTRY_HEADER_LEN {
            return Err(AcpiError::MalformedTable);
        }

        let length = usize::from(self.view.u8(self.cursor + 1)?);
        if length < ENTRY_HEADER_LEN || length > remaining {
            return Err(AcpiError::MalformedTable);
        }

        let raw = self.view.bytes(self.cursor, length)?;
        let entry = InterruptControllerEntry::decode(raw)?;
        self.cursor += length;
        Ok(entry)
    }
}

impl<'a> Iterator for MadtEntries<'a> {
    type Item = Result<InterruptControllerEntry<'a>, AcpiError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor >= self.view.len() {
            return None;
        }
        let item = self.step();
        self.failed = item.is_err();
        Some(item)
    }
}

impl core::iter::FusedIterator for MadtEntries<'_> {}

/// Decodes the MADT at `paddr` into `topology`.
///
/// The topology's counters are reset before the first entry is processed.
/// Processor local APIC structures become [`ProcessorRecord`]s; I/O APICs,
/// interrupt source overrides and the local APIC address override are recorded
/// as well. All other structures are skipped.
///
/// # Errors
/// The first validation or decode failure; the topology is then partially
/// populated and must not be used.
pub fn decode_madt<M: PhysMapRo + ?Sized>(
    map: &M,
    paddr: u64,
    topology: &mut Topology,
) -> Result<(), AcpiError> {
    let madt = Madt::map(map, paddr)?;
    debug!(
        "MADT at {paddr:#x}: length {}, LAPIC {:#x}, PC-AT compatible {}",
        madt.header.length,
        madt.local_apic_address,
        madt.flags.pcat_compat()
    );

    topology.reset(
        u64::from(madt.local_apic_address),
        madt.flags.pcat_compat(),
    );

    for entry in madt.entries() {
        match entry? {
            InterruptControllerEntry::ProcessorLocalApic(lapic) => {
                trace!(
                    "LAPIC uid={} id={} enabled={}",
                    lapic.uid,
                    lapic.apic_id,
                    lapic.flags.enabled()
                );
                topology.record_processor(ProcessorRecord {
                    uid: lapic.uid,
                    local_apic_id: lapic.apic_id,
                    enabled: lapic.flags.enabled(),
                    online_capable: lapic.flags.online_capable(),
                });
            }
            InterruptControllerEntry::IoApic(io) => {
                trace!(
                    "IOAPIC id={} at {:#x}, GSI base {}",
                    io.id, io.address, io.gsi_base
                );
                topology.record_io_apic(IoApicRecord {
                    id: io.id,
                    address: u64::from(io.address),
                    gsi_base: io.gsi_base,
                });
            }
            InterruptControllerEntry::InterruptSourceOverride(iso) => {
                trace!("ISO bus={} irq={} -> GSI {}", iso.bus, iso.source, iso.gsi);
                topology.record_override(InterruptOverride {
                    bus: iso.bus,
                    source: iso.source,
                    gsi: iso.gsi,
                    polarity: iso.flags.polarity(),
                    trigger: iso.flags.trigger(),
                });
            }
            InterruptControllerEntry::LocalApicAddressOverride(over) => {
                debug!("LAPIC address overridden to {:#x}", over.address);
                topology.override_local_apic_address(over.address);
            }
            other => trace!("skipping MADT entry {other:?}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_processor_local_apic() {
        let raw = [0, 8, 3, 7, 0b11, 0, 0, 0];
        let entry = InterruptControllerEntry::decode(&raw).unwrap();
        let InterruptControllerEntry::ProcessorLocalApic(lapic) = entry else {
            panic!("unexpected {entry:?}");
        };
        assert_eq!(lapic.uid, 3);
        assert_eq!(lapic.apic_id, 7);
        assert!(lapic.flags.enabled());
        assert!(lapic.flags.online_capable());
    }

    #[test]
    fn decodes_io_apic_and_override() {
        let mut io = [0u8; 12];
        io[0] = 1;
        io[1] = 12;
        io[2] = 2;
        io[4..8].copy_from_slice(&0xFEC0_0000u32.to_le_bytes());
        io[8..12].copy_from_slice(&24u32.to_le_bytes());
        assert_eq!(
            InterruptControllerEntry::decode(&io),
            Ok(InterruptControllerEntry::IoApic(IoApic {
                id: 2,
                address: 0xFEC0_0000,
                gsi_base: 24
            }))
        );

        let iso = [2, 10, 0, 0, 2, 0, 0, 0, 0b1111, 0];
        let Ok(InterruptControllerEntry::InterruptSourceOverride(iso)) =
            InterruptControllerEntry::decode(&iso)
        else {
            panic!("not an override");
        };
        assert_eq!(iso.gsi, 2);
        assert_eq!(iso.flags.polarity(), Polarity::ActiveLow);
        assert_eq!(iso.flags.trigger(), TriggerMode::Level);
    }

    #[test]
    fn decodes_local_nmi_and_x2apic() {
        let nmi = [4, 6, 0xFF, 0b0101, 0, 1];
        let Ok(InterruptControllerEntry::LocalApicNmi(nmi)) = InterruptControllerEntry::decode(&nmi)
        else {
            panic!("not a local NMI");
        };
        assert_eq!(nmi.uid, 0xFF);
        assert_eq!(nmi.lint, 1);
        assert_eq!(nmi.flags.polarity(), Polarity::ActiveHigh);
        assert_eq!(nmi.flags.trigger(), TriggerMode::Edge);

        let mut x2 = [0u8; 16];
        x2[0] = 9;
        x2[1] = 16;
        x2[4..8].copy_from_slice(&0x100u32.to_le_bytes());
        x2[8] = 1;
        x2[12..16].copy_from_slice(&42u32.to_le_bytes());
        let Ok(InterruptControllerEntry::ProcessorLocalX2Apic(x2)) =
            InterruptControllerEntry::decode(&x2)
        else {
            panic!("not an x2APIC");
        };
        assert_eq!(x2.x2apic_id, 0x100);
        assert_eq!(x2.uid, 42);
        assert!(x2.flags.enabled());
    }

    #[test]
    fn unknown_types_keep_their_bytes() {
        let raw = [0x7F, 5, 1, 2, 3];
        assert_eq!(
            InterruptControllerEntry::decode(&raw),
            Ok(InterruptControllerEntry::Unknown {
                entry_type: 0x7F,
                length: 5,
                raw: &raw
            })
        );
    }

    #[test]
    fn truncated_known_entry_is_malformed() {
        assert_eq!(
            InterruptControllerEntry::decode(&[0, 6, 1, 1, 1, 0]),
            Err(AcpiError::MalformedTable)
        );
        assert_eq!(
            InterruptControllerEntry::decode(&[11, 40]),
            Err(AcpiError::MalformedTable)
        );
    }

    fn madt_over(stream: &[u8]) -> Vec<u8> {
        let mut table = vec![0u8; MADT_ENTRIES_OFFSET];
        table[..4].copy_from_slice(MADT_SIGNATURE);
        table.extend_from_slice(stream);
        let len = u32::try_from(table.len()).unwrap();
        table[4..8].copy_from_slice(&len.to_le_bytes());
        table
    }

    fn entries_of(table: &[u8]) -> MadtEntries<'_> {
        MadtEntries {
            view: TableView::new(table),
            cursor: MADT_ENTRIES_OFFSET,
            failed: false,
        }
    }

    #[test]
    fn stream_stops_exactly_at_length() {
        let table = madt_over(&[
            0, 8, 0, 0, 1, 0, 0, 0, // LAPIC
            0x42, 3, 9, // unknown
            0, 8, 1, 1, 0, 0, 0, 0, // disabled LAPIC
        ]);
        let kinds: Vec<_> = entries_of(&table)
            .map(|e| e.map(|e| core::mem::discriminant(&e)))
            .collect();
        assert_eq!(kinds.len(), 3);
        assert!(kinds.iter().all(Result::is_ok));
    }

    #[test]
    fn zero_length_entry_is_an_error_not_a_loop() {
        let table = madt_over(&[0, 8, 0, 0, 1, 0, 0, 0, 0x42, 0, 0, 0]);
        let items: Vec<_> = entries_of(&table).take(1000).collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert_eq!(items[1], Err(AcpiError::MalformedTable));
    }

    #[test]
    fn overrunning_and_dangling_entries_are_errors() {
        let overrun = madt_over(&[0, 9, 0, 0, 1, 0, 0, 0]);
        assert_eq!(
            entries_of(&overrun).collect::<Vec<_>>(),
            vec![Err(AcpiError::MalformedTable)]
        );

        let dangling = madt_over(&[0, 8, 0, 0, 1, 0, 0, 0, 0x42]);
        let items: Vec<_> = entries_of(&dangling).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1], Err(AcpiError::MalformedTable));
    }
}
