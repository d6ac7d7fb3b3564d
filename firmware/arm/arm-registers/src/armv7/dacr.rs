use bitfield_struct::bitfield;

/// Access control for one of the 16 short-descriptor domains.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DomainAccess {
    /// Any access generates a domain fault.
    NoAccess = 0b00,
    /// Accesses are checked against the descriptor permission bits.
    Client = 0b01,
    /// Reserved encoding.
    Reserved = 0b10,
    /// Accesses are not checked.
    Manager = 0b11,
}

impl DomainAccess {
    #[must_use]
    pub const fn from_bits(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Self::NoAccess,
            0b01 => Self::Client,
            0b10 => Self::Reserved,
            _ => Self::Manager,
        }
    }

    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }
}

/// `DACR` — Domain Access Control Register.
///
/// Firmware places every descriptor in domain 0, so only that domain is
/// modelled; domains 1 to 15 are left as no-access.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct Dacr {
    /// Bits 0–1 — Domain 0.
    #[bits(2)]
    pub domain0: DomainAccess,

    /// Bits 2–31 — Domains 1 to 15.
    #[bits(30, default = 0)]
    _domains_1_15: u32,
}

crate::armv7::cp15_register_asm!(Dacr, "0", "c3", "c0", "0");
