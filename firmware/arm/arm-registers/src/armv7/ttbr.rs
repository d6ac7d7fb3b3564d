use bitfield_struct::bitfield;

/// Encodings of the `TTBR0.RGN` field (outer cacheability of table walks).
pub mod ttbr_region {
    pub const NON_CACHEABLE: u8 = 0b00;
    pub const WRITE_BACK_ALLOCATE: u8 = 0b01;
    pub const WRITE_THROUGH: u8 = 0b10;
    pub const WRITE_BACK_NO_ALLOCATE: u8 = 0b11;
}

/// `TTBR0` — Translation Table Base Register 0 (short descriptors, `TTBCR.N = 0`).
///
/// Bit 0 is `C` on cores without the Multiprocessing Extensions and
/// `IRGN[1]` on cores with them; bit 6 is `IRGN[0]` only on the latter.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct Ttbr0 {
    /// Bit 0 — `C` / `IRGN[1]`: inner cacheable table walks.
    pub inner_cacheable: bool,

    /// Bit 1 — `S`: shareable table walks.
    pub shareable: bool,

    /// Bit 2 — `IMP`: implementation defined.
    pub imp: bool,

    /// Bits 3–4 — `RGN`: outer cacheability of table walks.
    #[bits(2)]
    pub rgn: u8,

    /// Bit 5 — `NOS`: not outer shareable.
    pub not_outer_shareable: bool,

    /// Bit 6 — `IRGN[0]` (Multiprocessing Extensions).
    pub irgn0: bool,

    /// Bits 7–13 — Must be zero with `TTBCR.N = 0`.
    #[bits(7, default = 0)]
    _reserved_7_13: u8,

    /// Bits 14–31 — Level 1 table base address bits `[31:14]`.
    #[bits(18)]
    pub base: u32,
}

crate::armv7::cp15_register_asm!(Ttbr0, "0", "c2", "c0", "0");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_occupies_bits_14_to_31() {
        let ttbr = Ttbr0::new().with_base(0x8000_4000 >> 14).with_rgn(ttbr_region::WRITE_BACK_ALLOCATE);
        assert_eq!(ttbr.into_bits(), 0x8000_4000 | (1 << 3));
    }
}
