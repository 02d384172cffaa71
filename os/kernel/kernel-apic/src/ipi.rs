//! INIT / STARTUP inter-processor interrupts.
//!
//! Every send follows the same pattern: validate the inputs, write the ICR
//! high dword, write the low dword, then poll the delivery-status bit until
//! the local APIC reports the IPI as accepted. Polling is bounded by
//! [`IpiPolicy::max_delivery_polls`].

use crate::access::ApicRegisterAccess;
use crate::error::IpiError;
use crate::icr::InterruptCommand;
use crate::local_apic::LocalApic;
use log::{debug, trace};

/// APIC ID that addresses every processor.
pub const BROADCAST_APIC_ID: u8 = 0xFF;

/// Startup code must live in the first megabyte.
pub const STARTUP_ADDRESS_LIMIT: u64 = 0x10_0000;

const STARTUP_ALIGN: u64 = 0x1000;

/// Wait after INIT before the first STARTUP.
pub const INIT_SETTLE_US: u64 = 10_000;

/// Wait after each STARTUP.
pub const SIPI_SETTLE_US: u64 = 200;

/// A busy-wait source for the wake-up sequence.
pub trait Delay {
    fn delay_us(&mut self, micros: u64);
}

/// Tunables for IPI delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpiPolicy {
    /// Reads of the delivery-status bit before giving up.
    pub max_delivery_polls: u32,
    /// Follow INIT with a level-triggered deassert INIT.
    pub init_level_deassert: bool,
    /// Number of STARTUP IPIs sent by [`IpiSender::wake`].
    pub sipi_attempts: u8,
}

impl Default for IpiPolicy {
    fn default() -> Self {
        Self {
            max_delivery_polls: 100_000,
            init_level_deassert: false,
            sipi_attempts: 2,
        }
    }
}

/// Sends IPIs through a borrowed local APIC.
pub struct IpiSender<'a, R: ApicRegisterAccess> {
    apic: &'a mut LocalApic<R>,
    policy: IpiPolicy,
}

impl<'a, R: ApicRegisterAccess> IpiSender<'a, R> {
    pub const fn new(apic: &'a mut LocalApic<R>, policy: IpiPolicy) -> Self {
        Self { apic, policy }
    }

    #[must_use]
    pub const fn policy(&self) -> &IpiPolicy {
        &self.policy
    }

    /// Sends an INIT IPI to `apic_id`.
    ///
    /// # Errors
    /// [`IpiError::InvalidApicId`] for the broadcast ID, with no register
    /// written; [`IpiError::DeliveryTimeout`] if the IPI is never accepted.
    pub fn send_init(&mut self, apic_id: u8) -> Result<(), IpiError> {
        validate_apic_id(apic_id)?;
        self.deliver(apic_id, InterruptCommand::init(apic_id))?;
        if self.policy.init_level_deassert {
            self.deliver(apic_id, InterruptCommand::init_deassert(apic_id))?;
        }
        Ok(())
    }

    /// Sends a STARTUP IPI that starts `apic_id` at `startup_address`.
    ///
    /// # Errors
    /// The ID and address are checked before any register is written; see
    /// [`IpiError`].
    pub fn send_startup(&mut self, apic_id: u8, startup_address: u64) -> Result<(), IpiError> {
        validate_apic_id(apic_id)?;
        let vector = startup_vector(startup_address)?;
        self.deliver(apic_id, InterruptCommand::startup(apic_id, vector))
    }

    /// INIT, wait, then the configured number of STARTUP IPIs with a short
    /// wait after each.
    ///
    /// # Errors
    /// The first failed send. Inputs are validated before the INIT goes out.
    pub fn wake<D: Delay + ?Sized>(
        &mut self,
        apic_id: u8,
        startup_address: u64,
        delay: &mut D,
    ) -> Result<(), IpiError> {
        validate_apic_id(apic_id)?;
        startup_vector(startup_address)?;

        self.send_init(apic_id)?;
        delay.delay_us(INIT_SETTLE_US);
        for _ in 0..self.policy.sipi_attempts {
            self.send_startup(apic_id, startup_address)?;
            delay.delay_us(SIPI_SETTLE_US);
        }
        debug!("sent INIT-SIPI sequence to APIC {apic_id} (entry {startup_address:#x})");
        Ok(())
    }

    fn deliver(&mut self, apic_id: u8, cmd: InterruptCommand) -> Result<(), IpiError> {
        trace!(
            "ICR <- {:#010x}:{:#010x} ({:?})",
            cmd.high(),
            cmd.low(),
            cmd.delivery_mode()
        );
        self.apic.send_command(cmd);

        for _ in 0..self.policy.max_delivery_polls {
            if !self.apic.delivery_pending() {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(IpiError::DeliveryTimeout {
            apic_id,
            polls: self.policy.max_delivery_polls,
        })
    }
}

const fn validate_apic_id(apic_id: u8) -> Result<(), IpiError> {
    if apic_id == BROADCAST_APIC_ID {
        return Err(IpiError::InvalidApicId(apic_id));
    }
    Ok(())
}

/// The SIPI vector is the page number of the startup code.
#[allow(clippy::cast_possible_truncation)]
const fn startup_vector(startup_address: u64) -> Result<u8, IpiError> {
    if startup_address % STARTUP_ALIGN != 0 {
        return Err(IpiError::UnalignedStartupAddress(startup_address));
    }
    if startup_address >= STARTUP_ADDRESS_LIMIT {
        return Err(IpiError::StartupAddressOutOfRange(startup_address));
    }
    Ok((startup_address >> 12) as u8)
}
