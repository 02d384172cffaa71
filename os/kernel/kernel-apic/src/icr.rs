//! # Interrupt Command Register (ICR)
//!
//! The ICR is a 64-bit register split over two 32-bit MMIO slots: the high
//! dword (destination) at `0x310` and the low dword at `0x300`. Writing the low
//! dword sends the IPI, so the high dword has to be written first.
//!
//! ```text
//!  63      56 55          20 19 18 17 16 15 14 13 12 11 10   8 7        0
//! +----------+--------------+-----+-----+--+--+--+--+--+------+----------+
//! |   dest   |   reserved   | shr | rsv |TM|LV|  |DS|DM| mode |  vector  |
//! +----------+--------------+-----+-----+--+--+--+--+--+------+----------+
//! ```

use bitfield_struct::bitfield;

/// Delivery mode (bits 8..10).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeliveryMode {
    Fixed = 0b000,
    LowestPriority = 0b001,
    Smi = 0b010,
    Reserved = 0b011,
    Nmi = 0b100,
    Init = 0b101,
    Startup = 0b110,
    ExtInt = 0b111,
}

impl DeliveryMode {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0b000 => Self::Fixed,
            0b001 => Self::LowestPriority,
            0b010 => Self::Smi,
            0b011 => Self::Reserved,
            0b100 => Self::Nmi,
            0b101 => Self::Init,
            0b110 => Self::Startup,
            _ => Self::ExtInt,
        }
    }

    const fn into_bits(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DestinationMode {
    Physical = 0,
    Logical = 1,
}

impl DestinationMode {
    const fn from_bits(bits: u8) -> Self {
        if bits & 1 == 0 {
            Self::Physical
        } else {
            Self::Logical
        }
    }

    const fn into_bits(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Level {
    Deassert = 0,
    Assert = 1,
}

impl Level {
    const fn from_bits(bits: u8) -> Self {
        if bits & 1 == 0 {
            Self::Deassert
        } else {
            Self::Assert
        }
    }

    const fn into_bits(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TriggerMode {
    Edge = 0,
    Level = 1,
}

impl TriggerMode {
    const fn from_bits(bits: u8) -> Self {
        if bits & 1 == 0 {
            Self::Edge
        } else {
            Self::Level
        }
    }

    const fn into_bits(self) -> u8 {
        self as u8
    }
}

/// Destination shorthand (bits 18..19). Anything but `None` ignores the
/// destination field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Shorthand {
    None = 0b00,
    SelfOnly = 0b01,
    AllIncludingSelf = 0b10,
    AllExcludingSelf = 0b11,
}

impl Shorthand {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::None,
            0b01 => Self::SelfOnly,
            0b10 => Self::AllIncludingSelf,
            _ => Self::AllExcludingSelf,
        }
    }

    const fn into_bits(self) -> u8 {
        self as u8
    }
}

#[bitfield(u64, order = Lsb)]
#[derive(PartialEq, Eq)]
pub struct InterruptCommand {
    pub vector: u8,

    #[bits(3)]
    pub delivery_mode: DeliveryMode,

    #[bits(1)]
    pub destination_mode: DestinationMode,

    /// Set by hardware while the IPI has not been accepted yet.
    pub delivery_pending: bool,

    #[bits(1)]
    __: u8,

    #[bits(1)]
    pub level: Level,

    #[bits(1)]
    pub trigger: TriggerMode,

    #[bits(2)]
    __: u8,

    #[bits(2)]
    pub shorthand: Shorthand,

    #[bits(36)]
    __: u64,

    /// Physical APIC ID of the target.
    pub destination: u8,
}

impl InterruptCommand {
    /// Delivery-status bit within the low dword.
    pub const DELIVERY_PENDING: u32 = 1 << 12;

    /// Asserting, edge-triggered INIT to `apic_id`.
    #[must_use]
    pub const fn init(apic_id: u8) -> Self {
        Self::new()
            .with_delivery_mode(DeliveryMode::Init)
            .with_destination_mode(DestinationMode::Physical)
            .with_level(Level::Assert)
            .with_trigger(TriggerMode::Edge)
            .with_shorthand(Shorthand::None)
            .with_destination(apic_id)
    }

    /// Level-triggered INIT deassert, for processors that still expect it.
    #[must_use]
    pub const fn init_deassert(apic_id: u8) -> Self {
        Self::init(apic_id)
            .with_level(Level::Deassert)
            .with_trigger(TriggerMode::Level)
    }

    /// STARTUP IPI; the target begins executing at `vector << 12`.
    #[must_use]
    pub const fn startup(apic_id: u8, vector: u8) -> Self {
        Self::init(apic_id)
            .with_delivery_mode(DeliveryMode::Startup)
            .with_vector(vector)
    }

    /// The dword written to offset `0x300`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn low(self) -> u32 {
        self.into_bits() as u32
    }

    /// The dword written to offset `0x310`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn high(self) -> u32 {
        (self.into_bits() >> 32) as u32
    }
}
