//! Processor and interrupt controller inventory built from the MADT.

use crate::madt::{Polarity, TriggerMode};
use log::warn;

/// Processors beyond this many are counted but not stored.
pub const MAX_PROCESSORS: usize = 256;
pub const MAX_IO_APICS: usize = 16;
pub const MAX_INTERRUPT_OVERRIDES: usize = 16;

/// Architectural default for the local APIC window.
pub const DEFAULT_LOCAL_APIC_ADDRESS: u64 = 0xFEE0_0000;

/// One processor local APIC as reported by firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessorRecord {
    /// ACPI processor UID.
    pub uid: u8,
    pub local_apic_id: u8,
    pub enabled: bool,
    pub online_capable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoApicRecord {
    pub id: u8,
    pub address: u64,
    pub gsi_base: u32,
}

/// An ISA IRQ redirected to another global system interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptOverride {
    pub bus: u8,
    pub source: u8,
    pub gsi: u32,
    pub polarity: Polarity,
    pub trigger: TriggerMode,
}

impl Default for InterruptOverride {
    fn default() -> Self {
        Self {
            bus: 0,
            source: 0,
            gsi: 0,
            polarity: Polarity::Conforming,
            trigger: TriggerMode::Conforming,
        }
    }
}

/// Fixed-capacity registry of the platform's interrupt topology.
///
/// `total_processors` counts every processor local APIC structure seen, while
/// only the first [`MAX_PROCESSORS`] are stored. `enabled_processors` never
/// exceeds `total_processors`.
#[derive(Debug, Clone)]
pub struct Topology {
    local_apic_address: u64,
    local_apic_override: Option<u64>,
    pcat_compat: bool,
    total_processors: usize,
    enabled_processors: usize,
    processors: [ProcessorRecord; MAX_PROCESSORS],
    io_apic_count: usize,
    io_apics: [IoApicRecord; MAX_IO_APICS],
    override_count: usize,
    overrides: [InterruptOverride; MAX_INTERRUPT_OVERRIDES],
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}

impl Topology {
    const EMPTY_PROCESSOR: ProcessorRecord = ProcessorRecord {
        uid: 0,
        local_apic_id: 0,
        enabled: false,
        online_capable: false,
    };

    const EMPTY_IO_APIC: IoApicRecord = IoApicRecord {
        id: 0,
        address: 0,
        gsi_base: 0,
    };

    const EMPTY_OVERRIDE: InterruptOverride = InterruptOverride {
        bus: 0,
        source: 0,
        gsi: 0,
        polarity: Polarity::Conforming,
        trigger: TriggerMode::Conforming,
    };

    /// An empty topology; what discovery returns on a platform without a MADT.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            local_apic_address: DEFAULT_LOCAL_APIC_ADDRESS,
            local_apic_override: None,
            pcat_compat: false,
            total_processors: 0,
            enabled_processors: 0,
            processors: [Self::EMPTY_PROCESSOR; MAX_PROCESSORS],
            io_apic_count: 0,
            io_apics: [Self::EMPTY_IO_APIC; MAX_IO_APICS],
            override_count: 0,
            overrides: [Self::EMPTY_OVERRIDE; MAX_INTERRUPT_OVERRIDES],
        }
    }

    /// Number of processor local APIC structures in the MADT.
    #[must_use]
    pub const fn total_processors(&self) -> usize {
        self.total_processors
    }

    /// Number of those with the enabled flag set.
    #[must_use]
    pub const fn enabled_processors(&self) -> usize {
        self.enabled_processors
    }

    /// Processors actually stored, in MADT order.
    #[must_use]
    pub fn processors(&self) -> &[ProcessorRecord] {
        &self.processors[..self.total_processors.min(MAX_PROCESSORS)]
    }

    #[must_use]
    pub fn processor(&self, index: usize) -> Option<&ProcessorRecord> {
        self.processors().get(index)
    }

    #[must_use]
    pub fn processor_by_apic_id(&self, apic_id: u8) -> Option<&ProcessorRecord> {
        self.processors()
            .iter()
            .find(|p| p.local_apic_id == apic_id)
    }

    /// Physical address of the local APIC window, with any 64-bit override applied.
    #[must_use]
    pub fn local_apic_address(&self) -> u64 {
        self.local_apic_override.unwrap_or(self.local_apic_address)
    }

    /// Whether legacy 8259 PICs are present.
    #[must_use]
    pub const fn pcat_compat(&self) -> bool {
        self.pcat_compat
    }

    #[must_use]
    pub fn io_apics(&self) -> &[IoApicRecord] {
        &self.io_apics[..self.io_apic_count]
    }

    #[must_use]
    pub fn interrupt_overrides(&self) -> &[InterruptOverride] {
        &self.overrides[..self.override_count]
    }

    /// The GSI an ISA IRQ is routed to.
    #[must_use]
    pub fn isa_irq_to_gsi(&self, irq: u8) -> u32 {
        self.interrupt_overrides()
            .iter()
            .find(|o| o.bus == 0 && o.source == irq)
            .map_or(u32::from(irq), |o| o.gsi)
    }

    pub(crate) fn reset(&mut self, local_apic_address: u64, pcat_compat: bool) {
        *self = Self::new();
        self.local_apic_address = local_apic_address;
        self.pcat_compat = pcat_compat;
    }

    pub(crate) fn record_processor(&mut self, record: ProcessorRecord) {
        if let Some(slot) = self.processors.get_mut(self.total_processors) {
            *slot = record;
        } else {
            warn!(
                "processor uid={} beyond capacity {MAX_PROCESSORS}, not stored",
                record.uid
            );
        }
        self.total_processors += 1;
        if record.enabled {
            self.enabled_processors += 1;
        }
    }

    pub(crate) fn record_io_apic(&mut self, record: IoApicRecord) {
        if let Some(slot) = self.io_apics.get_mut(self.io_apic_count) {
            *slot = record;
            self.io_apic_count += 1;
        } else {
            warn!("I/O APIC id={} beyond capacity, ignored", record.id);
        }
    }

    pub(crate) fn record_override(&mut self, record: InterruptOverride) {
        if let Some(slot) = self.overrides.get_mut(self.override_count) {
            *slot = record;
            self.override_count += 1;
        } else {
            warn!("override for IRQ {} beyond capacity, ignored", record.source);
        }
    }

    pub(crate) const fn override_local_apic_address(&mut self, address: u64) {
        self.local_apic_override = Some(address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpu(uid: u8, enabled: bool) -> ProcessorRecord {
        ProcessorRecord {
            uid,
            local_apic_id: uid,
            enabled,
            online_capable: false,
        }
    }

    #[test]
    fn counts_and_lookup() {
        let mut topo = Topology::new();
        topo.reset(0xFEE0_0000, true);
        topo.record_processor(cpu(0, true));
        topo.record_processor(cpu(1, false));
        topo.record_processor(cpu(2, true));

        assert_eq!(topo.total_processors(), 3);
        assert_eq!(topo.enabled_processors(), 2);
        assert_eq!(topo.processor(1), Some(&cpu(1, false)));
        assert_eq!(topo.processor_by_apic_id(2), Some(&cpu(2, true)));
        assert!(topo.processor(3).is_none());
        assert!(topo.pcat_compat());
    }

    #[test]
    fn overflow_is_counted_not_stored() {
        let mut topo = Topology::new();
        for i in 0..=MAX_PROCESSORS {
            topo.record_processor(cpu(u8::try_from(i % 256).unwrap(), true));
        }
        assert_eq!(topo.total_processors(), MAX_PROCESSORS + 1);
        assert_eq!(topo.enabled_processors(), MAX_PROCESSORS + 1);
        assert_eq!(topo.processors().len(), MAX_PROCESSORS);
    }

    #[test]
    fn address_override_and_isa_routing() {
        let mut topo = Topology::new();
        topo.reset(0xFEE0_0000, false);
        assert_eq!(topo.local_apic_address(), 0xFEE0_0000);
        topo.override_local_apic_address(0x1_FEE0_0000);
        assert_eq!(topo.local_apic_address(), 0x1_FEE0_0000);

        topo.record_override(InterruptOverride {
            source: 0,
            gsi: 2,
            ..InterruptOverride::default()
        });
        assert_eq!(topo.isa_irq_to_gsi(0), 2);
        assert_eq!(topo.isa_irq_to_gsi(1), 1);
    }

    #[test]
    fn reset_clears_previous_run() {
        let mut topo = Topology::new();
        topo.record_processor(cpu(0, true));
        topo.record_io_apic(IoApicRecord::default());
        topo.reset(0xFEE0_0000, false);
        assert_eq!(topo.total_processors(), 0);
        assert!(topo.io_apics().is_empty());
    }
}
