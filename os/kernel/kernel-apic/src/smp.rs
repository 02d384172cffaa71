use crate::access::ApicRegisterAccess;
use crate::ipi::{Delay, IpiSender};
use kernel_acpi::ProcessorRecord;
use log::{error, info, warn};

/// Outcome of [`start_secondary_processors`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmpReport {
    /// Processors the full INIT-SIPI sequence was delivered to.
    pub woken: usize,
    pub skipped_disabled: usize,
    pub failed: usize,
}

/// Sends the wake-up sequence to every enabled processor except the BSP.
///
/// A failure for one processor is logged and counted; the remaining ones are
/// still attempted. Whether a woken processor actually came up is not checked.
pub fn start_secondary_processors<R, D>(
    sender: &mut IpiSender<'_, R>,
    processors: &[ProcessorRecord],
    bsp_apic_id: u8,
    startup_address: u64,
    delay: &mut D,
) -> SmpReport
where
    R: ApicRegisterAccess,
    D: Delay + ?Sized,
{
    let mut report = SmpReport::default();

    for cpu in processors {
        if cpu.local_apic_id == bsp_apic_id {
            continue;
        }
        if !cpu.enabled {
            warn!(
                "CPU uid={} apic={} disabled by firmware, not starting it",
                cpu.uid, cpu.local_apic_id
            );
            report.skipped_disabled += 1;
            continue;
        }

        match sender.wake(cpu.local_apic_id, startup_address, delay) {
            Ok(()) => report.woken += 1,
            Err(e) => {
                error!("failed to wake APIC {}: {e}", cpu.local_apic_id);
                report.failed += 1;
            }
        }
    }

    info!(
        "SMP: {} woken, {} disabled, {} failed",
        report.woken, report.skipped_disabled, report.failed
    );
    report
}
