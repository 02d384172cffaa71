use kernel_acpi::ProcessorRecord;
use kernel_apic::{
    ApicRegister, ApicRegisterAccess, Delay, INIT_SETTLE_US, IpiError, IpiPolicy, IpiSender,
    LocalApic, SIPI_SETTLE_US, start_secondary_processors,
};

const ICR_LOW: u32 = ApicRegister::InterruptCommandLow.offset();
const ICR_HIGH: u32 = ApicRegister::InterruptCommandHigh.offset();
const PENDING: u32 = 1 << 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Read(u32),
    Write(u32, u32),
    Delay(u64),
}

/// Register file that records every access and reports each IPI as pending
/// for a configurable number of status reads.
#[derive(Default)]
struct Recorder {
    ops: Vec<Op>,
    last_low: u32,
    pending_reads: u32,
    busy_for: u32,
    /// APIC IDs whose IPIs never get accepted.
    stuck: Vec<u8>,
    destination: u8,
}

impl Recorder {
    fn busy_for(reads: u32) -> Self {
        Self {
            busy_for: reads,
            ..Self::default()
        }
    }

    fn writes(&self) -> Vec<(u32, u32)> {
        self.ops
            .iter()
            .filter_map(|op| match *op {
                Op::Write(offset, value) => Some((offset, value)),
                _ => None,
            })
            .collect()
    }

    fn status_reads(&self) -> usize {
        self.ops.iter().filter(|op| **op == Op::Read(ICR_LOW)).count()
    }
}

impl ApicRegisterAccess for Recorder {
    fn read32(&mut self, offset: u32) -> u32 {
        self.ops.push(Op::Read(offset));
        if offset != ICR_LOW {
            return 0;
        }
        if self.stuck.contains(&self.destination) || self.pending_reads > 0 {
            self.pending_reads = self.pending_reads.saturating_sub(1);
            self.last_low | PENDING
        } else {
            self.last_low
        }
    }

    fn write32(&mut self, offset: u32, value: u32) {
        self.ops.push(Op::Write(offset, value));
        match offset {
            ICR_HIGH => self.destination = u8::try_from(value >> 24).unwrap(),
            ICR_LOW => {
                self.last_low = value;
                self.pending_reads = self.busy_for;
            }
            _ => {}
        }
    }
}

/// Records delays into a shared op log.
struct Clock(Vec<Op>);

impl Delay for Clock {
    fn delay_us(&mut self, micros: u64) {
        self.0.push(Op::Delay(micros));
    }
}

#[test]
fn init_writes_high_then_low_then_polls() {
    let mut apic = LocalApic::new(Recorder::busy_for(3));
    let mut sender = IpiSender::new(&mut apic, IpiPolicy::default());
    sender.send_init(2).unwrap();

    let rec = apic.into_inner();
    assert_eq!(rec.ops[0], Op::Write(ICR_HIGH, 0x0200_0000));
    assert_eq!(rec.ops[1], Op::Write(ICR_LOW, 0x0000_4500));
    assert!(rec.ops[2..].iter().all(|op| *op == Op::Read(ICR_LOW)));
    assert_eq!(rec.status_reads(), 4, "three pending reads plus the clear one");
}

#[test]
fn startup_vector_comes_from_address() {
    let mut apic = LocalApic::new(Recorder::default());
    IpiSender::new(&mut apic, IpiPolicy::default())
        .send_startup(1, 0x8000)
        .unwrap();

    assert_eq!(
        apic.into_inner().writes(),
        vec![(ICR_HIGH, 0x0100_0000), (ICR_LOW, 0x0000_4608)]
    );
}

#[test]
fn delivery_polling_is_bounded() {
    let mut apic = LocalApic::new(Recorder::busy_for(u32::MAX));
    let policy = IpiPolicy {
        max_delivery_polls: 50,
        ..IpiPolicy::default()
    };
    let result = IpiSender::new(&mut apic, policy).send_init(4);

    assert_eq!(
        result,
        Err(IpiError::DeliveryTimeout {
            apic_id: 4,
            polls: 50
        })
    );
    assert_eq!(apic.into_inner().status_reads(), 50);
}

#[test]
fn invalid_input_writes_nothing() {
    let mut apic = LocalApic::new(Recorder::default());
    let mut sender = IpiSender::new(&mut apic, IpiPolicy::default());
    let mut clock = Clock(Vec::new());

    assert_eq!(sender.send_init(0xFF), Err(IpiError::InvalidApicId(0xFF)));
    assert_eq!(
        sender.send_startup(1, 0x8800),
        Err(IpiError::UnalignedStartupAddress(0x8800))
    );
    assert_eq!(
        sender.send_startup(1, 0x10_0000),
        Err(IpiError::StartupAddressOutOfRange(0x10_0000))
    );
    assert_eq!(
        sender.wake(1, 0x10_0000, &mut clock),
        Err(IpiError::StartupAddressOutOfRange(0x10_0000))
    );

    assert!(clock.0.is_empty());
    assert!(apic.into_inner().ops.is_empty());
}

#[test]
fn init_deassert_follows_when_requested() {
    let mut apic = LocalApic::new(Recorder::default());
    let policy = IpiPolicy {
        init_level_deassert: true,
        ..IpiPolicy::default()
    };
    IpiSender::new(&mut apic, policy).send_init(3).unwrap();

    assert_eq!(
        apic.into_inner().writes(),
        vec![
            (ICR_HIGH, 0x0300_0000),
            (ICR_LOW, 0x0000_4500),
            (ICR_HIGH, 0x0300_0000),
            (ICR_LOW, 0x0000_8500),
        ]
    );
}

#[test]
fn wake_runs_init_sipi_sipi_with_delays() {
    let mut apic = LocalApic::new(Recorder::default());
    let mut clock = Clock(Vec::new());
    IpiSender::new(&mut apic, IpiPolicy::default())
        .wake(1, 0x8000, &mut clock)
        .unwrap();

    assert_eq!(
        clock.0,
        vec![
            Op::Delay(INIT_SETTLE_US),
            Op::Delay(SIPI_SETTLE_US),
            Op::Delay(SIPI_SETTLE_US)
        ]
    );
    let lows: Vec<u32> = apic
        .into_inner()
        .writes()
        .into_iter()
        .filter(|(offset, _)| *offset == ICR_LOW)
        .map(|(_, value)| value)
        .collect();
    assert_eq!(lows, vec![0x4500, 0x4608, 0x4608]);
}

fn cpu(apic_id: u8, enabled: bool) -> ProcessorRecord {
    ProcessorRecord {
        uid: apic_id,
        local_apic_id: apic_id,
        enabled,
        online_capable: !enabled,
    }
}

#[test]
fn secondary_start_skips_bsp_and_disabled() {
    let mut recorder = Recorder::default();
    recorder.stuck.push(3);
    let mut apic = LocalApic::new(recorder);
    let policy = IpiPolicy {
        max_delivery_polls: 10,
        ..IpiPolicy::default()
    };
    let mut sender = IpiSender::new(&mut apic, policy);
    let mut clock = Clock(Vec::new());

    let processors = [cpu(0, true), cpu(1, true), cpu(2, false), cpu(3, true), cpu(4, true)];
    let report = start_secondary_processors(&mut sender, &processors, 0, 0x8000, &mut clock);

    assert_eq!(report.woken, 2);
    assert_eq!(report.skipped_disabled, 1);
    assert_eq!(report.failed, 1);

    let destinations: Vec<u32> = apic
        .into_inner()
        .writes()
        .into_iter()
        .filter(|(offset, _)| *offset == ICR_HIGH)
        .map(|(_, value)| value >> 24)
        .collect();
    assert!(!destinations.contains(&0));
    assert!(!destinations.contains(&2));
    assert_eq!(destinations.iter().filter(|&&d| d == 4).count(), 3);
}
