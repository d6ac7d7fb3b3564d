use bitfield_struct::bitfield;

/// `TTBCR` — Translation Table Base Control Register.
///
/// With `N = 0` and `EAE = 0`, `TTBR0` covers the full 4 GiB input range with
/// a 16 KiB, 4096-entry short-descriptor level 1 table.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct Ttbcr {
    /// Bits 0–2 — `N`: width of the `TTBR0` base address field.
    #[bits(3)]
    pub n: u8,

    /// Bit 3 — Reserved.
    #[bits(default = false)]
    _reserved_3: bool,

    /// Bit 4 — `PD0`: disable walks through `TTBR0` (Security Extensions).
    pub pd0: bool,

    /// Bit 5 — `PD1`: disable walks through `TTBR1` (Security Extensions).
    pub pd1: bool,

    /// Bits 6–30 — Reserved.
    #[bits(25, default = 0)]
    _reserved_6_30: u32,

    /// Bit 31 — `EAE`: use the long-descriptor format.
    pub eae: bool,
}

crate::armv7::cp15_register_asm!(Ttbcr, "0", "c2", "c0", "2");
