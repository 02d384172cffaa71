use kernel_acpi::{
    ACPI_SUCCESS, AcpiError, PhysMapRo, discover, status_code, topology::ProcessorRecord,
};
use std::cell::RefCell;
use std::sync::mpsc;
use std::time::Duration;

const RSDP_AT: u64 = 0xE_0000;
const ROOT_AT: u64 = 0x7FE_0000;
const MADT_AT: u64 = 0x7FE_1000;
const FACP_AT: u64 = 0x7FE_2000;

/// Sparse physical memory that records every mapping request.
#[derive(Default)]
struct FakeMemory {
    regions: Vec<(u64, Vec<u8>)>,
    requests: RefCell<Vec<(u64, usize)>>,
}

impl FakeMemory {
    fn with(mut self, base: u64, bytes: Vec<u8>) -> Self {
        self.regions.push((base, bytes));
        self
    }

    fn requests_at(&self, base: u64) -> Vec<usize> {
        self.requests
            .borrow()
            .iter()
            .filter(|(addr, _)| *addr == base)
            .map(|(_, len)| *len)
            .collect()
    }
}

unsafe impl PhysMapRo for FakeMemory {
    fn map_ro(&self, paddr: u64, len: usize) -> Option<&[u8]> {
        self.requests.borrow_mut().push((paddr, len));
        self.regions.iter().find_map(|(base, bytes)| {
            let start = usize::try_from(paddr.checked_sub(*base)?).ok()?;
            bytes.get(start..start.checked_add(len)?)
        })
    }
}

fn balance(bytes: &mut [u8], at: usize) {
    bytes[at] = 0;
    let sum = bytes.iter().fold(0u8, |a, &b| a.wrapping_add(b));
    bytes[at] = 0u8.wrapping_sub(sum);
}

fn sdt(signature: &[u8; 4], revision: u8, payload: &[u8]) -> Vec<u8> {
    let mut table = vec![0u8; 36];
    table[..4].copy_from_slice(signature);
    table[8] = revision;
    table[10..16].copy_from_slice(b"BOCHS ");
    table[16..24].copy_from_slice(b"BXPC    ");
    table.extend_from_slice(payload);
    let len = u32::try_from(table.len()).unwrap();
    table[4..8].copy_from_slice(&len.to_le_bytes());
    balance(&mut table, 9);
    table
}

fn rsdp(revision: u8, rsdt: u32, xsdt: u64) -> Vec<u8> {
    let mut raw = vec![0u8; 36];
    raw[..8].copy_from_slice(b"RSD PTR ");
    raw[9..15].copy_from_slice(b"BOCHS ");
    raw[15] = revision;
    raw[16..20].copy_from_slice(&rsdt.to_le_bytes());
    if revision >= 2 {
        raw[20..24].copy_from_slice(&36u32.to_le_bytes());
        raw[24..32].copy_from_slice(&xsdt.to_le_bytes());
    }
    balance(&mut raw[..20], 8);
    if revision >= 2 {
        balance(&mut raw, 32);
    }
    raw
}

fn xsdt(entries: &[u64]) -> Vec<u8> {
    let payload: Vec<u8> = entries.iter().flat_map(|e| e.to_le_bytes()).collect();
    sdt(b"XSDT", 1, &payload)
}

fn rsdt(entries: &[u32]) -> Vec<u8> {
    let payload: Vec<u8> = entries.iter().flat_map(|e| e.to_le_bytes()).collect();
    sdt(b"RSDT", 1, &payload)
}

fn lapic(uid: u8, apic_id: u8, flags: u32) -> Vec<u8> {
    let mut entry = vec![0, 8, uid, apic_id];
    entry.extend_from_slice(&flags.to_le_bytes());
    entry
}

fn io_apic(id: u8, address: u32, gsi_base: u32) -> Vec<u8> {
    let mut entry = vec![1, 12, id, 0];
    entry.extend_from_slice(&address.to_le_bytes());
    entry.extend_from_slice(&gsi_base.to_le_bytes());
    entry
}

fn iso(source: u8, gsi: u32) -> Vec<u8> {
    let mut entry = vec![2, 10, 0, source];
    entry.extend_from_slice(&gsi.to_le_bytes());
    entry.extend_from_slice(&0u16.to_le_bytes());
    entry
}

fn local_nmi() -> Vec<u8> {
    vec![4, 6, 0xFF, 0x05, 0x00, 1]
}

fn madt(entries: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&0xFEE0_0000u32.to_le_bytes());
    payload.extend_from_slice(&1u32.to_le_bytes());
    for entry in entries {
        payload.extend_from_slice(entry);
    }
    sdt(b"APIC", 5, &payload)
}

fn platform(madt_table: Vec<u8>) -> FakeMemory {
    FakeMemory::default()
        .with(RSDP_AT, rsdp(2, 0, ROOT_AT))
        .with(ROOT_AT, xsdt(&[FACP_AT, MADT_AT]))
        .with(FACP_AT, sdt(b"FACP", 6, &[0; 8]))
        .with(MADT_AT, madt_table)
}

#[test]
fn xsdt_walk_counts_processors() {
    let memory = platform(madt(&[lapic(0, 0, 1), lapic(1, 1, 1), lapic(2, 2, 0)]));

    let topology = discover(&memory, RSDP_AT).unwrap();
    assert_eq!(topology.total_processors(), 3);
    assert_eq!(topology.enabled_processors(), 2);
    assert_eq!(
        topology.processor(2),
        Some(&ProcessorRecord {
            uid: 2,
            local_apic_id: 2,
            enabled: false,
            online_capable: false,
        })
    );
    assert_eq!(topology.local_apic_address(), 0xFEE0_0000);
    assert!(topology.pcat_compat());
    assert_eq!(status_code(&Ok::<_, AcpiError>(topology)), ACPI_SUCCESS);
}

#[test]
fn other_entry_types_do_not_count_as_processors() {
    let memory = platform(madt(&[
        lapic(0, 0, 1),
        io_apic(0, 0xFEC0_0000, 0),
        iso(0, 2),
        lapic(1, 1, 0),
        local_nmi(),
        iso(9, 9),
        lapic(2, 4, 1),
        vec![0x7F, 4, 0, 0],
    ]));

    let topology = discover(&memory, RSDP_AT).unwrap();
    assert_eq!(topology.total_processors(), 3);
    assert_eq!(topology.enabled_processors(), 2);
    assert_eq!(topology.io_apics().len(), 1);
    assert_eq!(topology.io_apics()[0].address, 0xFEC0_0000);
    assert_eq!(topology.interrupt_overrides().len(), 2);
    assert_eq!(topology.isa_irq_to_gsi(0), 2);
    assert_eq!(topology.processor_by_apic_id(4).map(|p| p.uid), Some(2));
}

#[test]
fn rsdt_path_uses_32_bit_entries() {
    let memory = FakeMemory::default()
        .with(RSDP_AT, rsdp(0, u32::try_from(ROOT_AT).unwrap(), 0))
        .with(ROOT_AT, rsdt(&[u32::try_from(MADT_AT).unwrap()]))
        .with(MADT_AT, madt(&[lapic(0, 0, 1), lapic(1, 1, 1)]));

    let topology = discover(&memory, RSDP_AT).unwrap();
    assert_eq!(topology.total_processors(), 2);
    assert_eq!(topology.enabled_processors(), 2);
}

#[test]
fn legacy_rsdp_is_never_read_past_twenty_bytes() {
    let mut pointer = rsdp(1, u32::try_from(ROOT_AT).unwrap(), 0);
    pointer[20..].fill(0xCC);
    let memory = FakeMemory::default()
        .with(RSDP_AT, pointer)
        .with(ROOT_AT, rsdt(&[u32::try_from(MADT_AT).unwrap()]))
        .with(MADT_AT, madt(&[lapic(0, 0, 1)]));

    discover(&memory, RSDP_AT).unwrap();
    let reads = memory.requests_at(RSDP_AT);
    assert!(!reads.is_empty());
    assert!(reads.iter().all(|&len| len <= 20), "{reads:?}");
}

#[test]
fn unknown_revision_stops_after_first_mapping() {
    let memory = FakeMemory::default().with(RSDP_AT, rsdp(3, 0, ROOT_AT));

    assert_eq!(
        discover(&memory, RSDP_AT).unwrap_err(),
        AcpiError::UnsupportedVersion
    );
    assert_eq!(memory.requests.borrow().len(), 1);
}

#[test]
fn empty_root_table_is_a_crosstable_mismatch() {
    let memory = FakeMemory::default()
        .with(RSDP_AT, rsdp(2, 0, ROOT_AT))
        .with(ROOT_AT, xsdt(&[]));

    let result = discover(&memory, RSDP_AT);
    assert_eq!(result.as_ref().unwrap_err(), &AcpiError::MismatchCrosstable);
    assert_eq!(status_code(&result), AcpiError::MismatchCrosstable.code());
    assert!(status_code(&result) < 0);
}

#[test]
fn xsdt_revision_is_checked() {
    let memory = FakeMemory::default()
        .with(RSDP_AT, rsdp(2, 0, ROOT_AT))
        .with(ROOT_AT, sdt(b"XSDT", 2, &MADT_AT.to_le_bytes()));

    assert_eq!(
        discover(&memory, RSDP_AT).unwrap_err(),
        AcpiError::MismatchRevision
    );
}

#[test]
fn corrupted_madt_checksum_propagates() {
    let mut table = madt(&[lapic(0, 0, 1)]);
    table[40] ^= 0x01;
    let memory = platform(table);

    assert_eq!(
        discover(&memory, RSDP_AT).unwrap_err(),
        AcpiError::MismatchChecksum
    );
}

#[test]
fn zero_length_entry_terminates() {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let memory = platform(madt(&[lapic(0, 0, 1), vec![0x42, 0, 0, 0]]));
        let _ = tx.send(discover(&memory, RSDP_AT).map(|t| t.total_processors()));
    });

    let result = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("MADT walk did not terminate");
    assert_eq!(result, Err(AcpiError::MalformedTable));
}

#[test]
fn missing_madt_yields_empty_topology() {
    let memory = FakeMemory::default()
        .with(RSDP_AT, rsdp(2, 0, ROOT_AT))
        .with(ROOT_AT, xsdt(&[0, FACP_AT]))
        .with(FACP_AT, sdt(b"FACP", 6, &[0; 8]));

    let topology = discover(&memory, RSDP_AT).unwrap();
    assert_eq!(topology.total_processors(), 0);
    assert_eq!(topology.enabled_processors(), 0);
}

#[test]
fn unmappable_sub_table_is_invalid_parameter() {
    let memory = FakeMemory::default()
        .with(RSDP_AT, rsdp(2, 0, ROOT_AT))
        .with(ROOT_AT, xsdt(&[0xDEAD_0000]));

    assert_eq!(
        discover(&memory, RSDP_AT).unwrap_err(),
        AcpiError::InvalidParameter
    );
}
