//! Top-level walk: RSDP, then the root table, then the MADT.

use crate::madt::{MADT_SIGNATURE, decode_madt};
use crate::root_table::RootTable;
use crate::rsdp::RootPointer;
use crate::sdt::map_header;
use crate::topology::Topology;
use crate::{AcpiError, PhysMapRo};
use log::{debug, info, warn};

/// Discovers the processor topology starting at the RSDP at `rsdp_addr`.
///
/// Every root table entry is visited in order. Null entries are skipped, tables
/// other than the MADT are only logged, and the first MADT found is decoded.
/// A platform without a MADT yields an empty [`Topology`].
///
/// # Errors
/// The first failure of the RSDP, the root table, a sub-table header that
/// cannot be mapped, or the MADT.
pub fn discover<M: PhysMapRo + ?Sized>(map: &M, rsdp_addr: u64) -> Result<Topology, AcpiError> {
    let rsdp = RootPointer::parse(map, rsdp_addr)?;
    let root = RootTable::map(map, rsdp.root)?;
    debug!(
        "{} at {:#x} with {} entries",
        root.table().header.signature_str(),
        rsdp.root.address(),
        root.entry_count()
    );

    let mut topology = Topology::new();
    let mut found_madt = false;

    for (index, paddr) in root.entries().enumerate() {
        if paddr == 0 {
            warn!("root table entry {index} is null, skipping");
            continue;
        }

        let header = map_header(map, paddr)?;
        if found_madt || &header.signature != MADT_SIGNATURE {
            debug!("table {} at {paddr:#x}", header.signature_str());
            continue;
        }

        decode_madt(map, paddr, &mut topology)?;
        found_madt = true;
    }

    if found_madt {
        info!(
            "ACPI: {} processors ({} enabled), {} I/O APICs, LAPIC at {:#x}",
            topology.total_processors(),
            topology.enabled_processors(),
            topology.io_apics().len(),
            topology.local_apic_address()
        );
    } else {
        warn!("ACPI: no MADT found, topology is empty");
    }

    Ok(topology)
}
