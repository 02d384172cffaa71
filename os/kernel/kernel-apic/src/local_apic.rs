use crate::access::ApicRegisterAccess;
use crate::error::ApicError;
use crate::icr::InterruptCommand;
use crate::registers::{APIC_REGISTER_ALIGN, APIC_WINDOW_SIZE, ApicRegister};
use bitfield_struct::bitfield;

/// Width of a requested register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessWidth {
    Bits8,
    Bits16,
    Bits32,
    Bits64,
}

impl AccessWidth {
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bits8 => 8,
            Self::Bits16 => 16,
            Self::Bits32 => 32,
            Self::Bits64 => 64,
        }
    }
}

/// Version register (`0x30`).
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct ApicVersion {
    /// `0x1x` for integrated APICs.
    pub version: u8,
    __: u8,
    /// Number of LVT entries minus one.
    pub max_lvt_entry: u8,
    pub eoi_broadcast_suppression: bool,
    #[bits(7)]
    __: u8,
}

/// Spurious-interrupt vector register (`0xF0`).
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct SpuriousVector {
    pub vector: u8,
    /// APIC software enable.
    pub apic_enable: bool,
    pub focus_check_disabled: bool,
    #[bits(2)]
    __: u8,
    pub suppress_eoi_broadcast: bool,
    #[bits(19)]
    __: u32,
}

/// The local APIC of the executing processor.
#[derive(Debug)]
pub struct LocalApic<R> {
    regs: R,
}

impl<R: ApicRegisterAccess> LocalApic<R> {
    pub const fn new(regs: R) -> Self {
        Self { regs }
    }

    pub fn into_inner(self) -> R {
        self.regs
    }

    pub const fn registers(&self) -> &R {
        &self.regs
    }

    fn check(offset: u32, width: AccessWidth) -> Result<(), ApicError> {
        if width != AccessWidth::Bits32 {
            return Err(ApicError::UnsupportedWidth(width.bits()));
        }
        if offset % APIC_REGISTER_ALIGN != 0 {
            return Err(ApicError::UnalignedRegister(offset));
        }
        if offset >= APIC_WINDOW_SIZE {
            return Err(ApicError::RegisterOutOfRange(offset));
        }
        Ok(())
    }

    /// Reads the register at `offset`.
    ///
    /// # Errors
    /// Anything but a 32-bit access to an aligned offset inside the window is
    /// rejected without touching the hardware.
    pub fn register_read(&mut self, offset: u32, width: AccessWidth) -> Result<u32, ApicError> {
        Self::check(offset, width)?;
        Ok(self.regs.read32(offset))
    }

    /// Writes `value` to the register at `offset`.
    ///
    /// # Errors
    /// Same checks as [`LocalApic::register_read`].
    pub fn register_write(
        &mut self,
        offset: u32,
        width: AccessWidth,
        value: u32,
    ) -> Result<(), ApicError> {
        Self::check(offset, width)?;
        self.regs.write32(offset, value);
        Ok(())
    }

    pub fn read(&mut self, reg: ApicRegister) -> u32 {
        self.regs.read32(reg.offset())
    }

    pub fn write(&mut self, reg: ApicRegister, value: u32) {
        self.regs.write32(reg.offset(), value);
    }

    /// xAPIC ID of this processor.
    #[allow(clippy::cast_possible_truncation)]
    pub fn id(&mut self) -> u8 {
        (self.read(ApicRegister::Id) >> 24) as u8
    }

    pub fn version(&mut self) -> ApicVersion {
        ApicVersion::from_bits(self.read(ApicRegister::Version))
    }

    /// Sets the software enable bit and the spurious vector.
    pub fn software_enable(&mut self, spurious_vector: u8) {
        let svr = SpuriousVector::from_bits(self.read(ApicRegister::SpuriousVector))
            .with_vector(spurious_vector)
            .with_apic_enable(true);
        self.write(ApicRegister::SpuriousVector, svr.into_bits());
    }

    /// Latches and returns the error status. ESR must be written before it
    /// is read.
    pub fn clear_errors(&mut self) -> u32 {
        self.write(ApicRegister::ErrorStatus, 0);
        self.read(ApicRegister::ErrorStatus)
    }

    pub fn end_of_interrupt(&mut self) {
        self.write(ApicRegister::EndOfInterrupt, 0);
    }

    /// Writes the high dword, then the low dword, which sends the IPI.
    pub fn send_command(&mut self, cmd: InterruptCommand) {
        self.write(ApicRegister::InterruptCommandHigh, cmd.high());
        self.write(ApicRegister::InterruptCommandLow, cmd.low());
    }

    /// Whether the last IPI is still waiting to be accepted.
    pub fn delivery_pending(&mut self) -> bool {
        self.read(ApicRegister::InterruptCommandLow) & InterruptCommand::DELIVERY_PENDING != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Window {
        regs: [u32; 0x40],
        touched: usize,
    }

    impl Window {
        const fn new() -> Self {
            Self {
                regs: [0; 0x40],
                touched: 0,
            }
        }
    }

    impl ApicRegisterAccess for Window {
        fn read32(&mut self, offset: u32) -> u32 {
            self.touched += 1;
            self.regs[offset as usize / 0x10]
        }

        fn write32(&mut self, offset: u32, value: u32) {
            self.touched += 1;
            self.regs[offset as usize / 0x10] = value;
        }
    }

    #[test]
    fn invalid_accesses_never_reach_hardware() {
        let mut apic = LocalApic::new(Window::new());
        assert_eq!(
            apic.register_read(0x20, AccessWidth::Bits64),
            Err(ApicError::UnsupportedWidth(64))
        );
        assert_eq!(
            apic.register_write(0x24, AccessWidth::Bits32, 1),
            Err(ApicError::UnalignedRegister(0x24))
        );
        assert_eq!(
            apic.register_read(0x400, AccessWidth::Bits32),
            Err(ApicError::RegisterOutOfRange(0x400))
        );
        assert_eq!(apic.registers().touched, 0);
    }

    #[test]
    fn id_version_and_enable() {
        let mut window = Window::new();
        window.regs[0x2] = 0x0500_0000;
        window.regs[0x3] = 0x0105_0014;
        window.regs[0xF] = 0x0000_00FF;
        let mut apic = LocalApic::new(window);

        assert_eq!(apic.id(), 5);
        let version = apic.version();
        assert_eq!(version.version(), 0x14);
        assert_eq!(version.max_lvt_entry(), 5);
        assert!(version.eoi_broadcast_suppression());

        apic.software_enable(0xEF);
        assert_eq!(apic.register_read(0xF0, AccessWidth::Bits32), Ok(0x1EF));
    }

    #[test]
    fn command_splits_into_dwords() {
        let mut apic = LocalApic::new(Window::new());
        apic.send_command(InterruptCommand::init(7));
        let regs = apic.into_inner().regs;
        assert_eq!(regs[0x31], 0x0700_0000);
        assert_eq!(regs[0x30], 0x4500);
    }
}
