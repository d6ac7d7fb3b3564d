use bitfield_struct::bitfield;

/// Encodings shared by the `TCR_EL1` and `TCR_EL2` fields.
pub mod tcr_field {
    /// `TG0` — 4 KiB translation granule.
    pub const TG0_4K: u8 = 0b00;
    /// `TG0` — 64 KiB translation granule.
    pub const TG0_64K: u8 = 0b01;
    /// `TG0` — 16 KiB translation granule.
    pub const TG0_16K: u8 = 0b10;

    /// `TG1` — 4 KiB translation granule (note: differs from `TG0`).
    pub const TG1_4K: u8 = 0b10;

    /// `SH0` — Non-shareable.
    pub const SH_NON_SHAREABLE: u8 = 0b00;
    /// `SH0` — Outer shareable.
    pub const SH_OUTER_SHAREABLE: u8 = 0b10;
    /// `SH0` — Inner shareable.
    pub const SH_INNER_SHAREABLE: u8 = 0b11;

    /// `IRGN0`/`ORGN0` — Normal memory, non-cacheable.
    pub const RGN_NON_CACHEABLE: u8 = 0b00;
    /// `IRGN0`/`ORGN0` — Write-back, read-allocate, write-allocate.
    pub const RGN_WRITE_BACK_ALLOCATE: u8 = 0b01;
    /// `IRGN0`/`ORGN0` — Write-through, read-allocate, no write-allocate.
    pub const RGN_WRITE_THROUGH: u8 = 0b10;
    /// `IRGN0`/`ORGN0` — Write-back, read-allocate, no write-allocate.
    pub const RGN_WRITE_BACK_NO_ALLOCATE: u8 = 0b11;

    /// `PS`/`IPS` — 32 bits, 4 GiB.
    pub const PA_32_BITS: u8 = 0b000;
    /// `PS`/`IPS` — 36 bits, 64 GiB.
    pub const PA_36_BITS: u8 = 0b001;
    /// `PS`/`IPS` — 40 bits, 1 TiB.
    pub const PA_40_BITS: u8 = 0b010;
    /// `PS`/`IPS` — 42 bits, 4 TiB.
    pub const PA_42_BITS: u8 = 0b011;
    /// `PS`/`IPS` — 44 bits, 16 TiB.
    pub const PA_44_BITS: u8 = 0b100;
    /// `PS`/`IPS` — 48 bits, 256 TiB.
    pub const PA_48_BITS: u8 = 0b101;
}

/// `TCR_EL1` — Translation Control Register for the EL1&0 regime.
///
/// Only the `TTBR0` half is used by firmware; the `TTBR1` walk is disabled
/// through [`epd1`](Self::epd1).
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct TcrEl1 {
    /// Bits 0–5 — `T0SZ`: the input region is `2^(64 - T0SZ)` bytes.
    #[bits(6)]
    pub t0sz: u8,

    /// Bit 6 — Reserved (RES0).
    #[bits(default = false)]
    _reserved_6: bool,

    /// Bit 7 — `EPD0`: disable table walks through `TTBR0_EL1`.
    pub epd0: bool,

    /// Bits 8–9 — `IRGN0`: inner cacheability of table walks.
    #[bits(2)]
    pub irgn0: u8,

    /// Bits 10–11 — `ORGN0`: outer cacheability of table walks.
    #[bits(2)]
    pub orgn0: u8,

    /// Bits 12–13 — `SH0`: shareability of table walks.
    #[bits(2)]
    pub sh0: u8,

    /// Bits 14–15 — `TG0`: granule size for `TTBR0_EL1`.
    #[bits(2)]
    pub tg0: u8,

    /// Bits 16–21 — `T1SZ`.
    #[bits(6)]
    pub t1sz: u8,

    /// Bit 22 — `A1`: ASID is taken from `TTBR1_EL1`.
    pub a1: bool,

    /// Bit 23 — `EPD1`: disable table walks through `TTBR1_EL1`.
    pub epd1: bool,

    /// Bits 24–25 — `IRGN1`.
    #[bits(2)]
    pub irgn1: u8,

    /// Bits 26–27 — `ORGN1`.
    #[bits(2)]
    pub orgn1: u8,

    /// Bits 28–29 — `SH1`.
    #[bits(2)]
    pub sh1: u8,

    /// Bits 30–31 — `TG1`: granule size for `TTBR1_EL1`.
    #[bits(2)]
    pub tg1: u8,

    /// Bits 32–34 — `IPS`: intermediate physical address size.
    #[bits(3)]
    pub ips: u8,

    /// Bit 35 — Reserved (RES0).
    #[bits(default = false)]
    _reserved_35: bool,

    /// Bit 36 — `AS`: 16-bit ASIDs.
    pub asid_16: bool,

    /// Bit 37 — `TBI0`: top byte ignored for `TTBR0` addresses.
    pub tbi0: bool,

    /// Bit 38 — `TBI1`: top byte ignored for `TTBR1` addresses.
    pub tbi1: bool,

    /// Bits 39–63 — Later architecture extensions; kept at 0.
    #[bits(25, default = 0)]
    _reserved_39_63: u32,
}

/// `TCR_EL2` — Translation Control Register for the (non-VHE) EL2 regime.
///
/// Bits 23 and 31 are RES1 and are set by [`TcrEl2::new`].
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct TcrEl2 {
    /// Bits 0–5 — `T0SZ`.
    #[bits(6)]
    pub t0sz: u8,

    /// Bits 6–7 — Reserved (RES0).
    #[bits(2, default = 0)]
    _reserved_6_7: u8,

    /// Bits 8–9 — `IRGN0`.
    #[bits(2)]
    pub irgn0: u8,

    /// Bits 10–11 — `ORGN0`.
    #[bits(2)]
    pub orgn0: u8,

    /// Bits 12–13 — `SH0`.
    #[bits(2)]
    pub sh0: u8,

    /// Bits 14–15 — `TG0`.
    #[bits(2)]
    pub tg0: u8,

    /// Bits 16–18 — `PS`: physical address size.
    #[bits(3)]
    pub ps: u8,

    /// Bit 19 — Reserved (RES0).
    #[bits(default = false)]
    _reserved_19: bool,

    /// Bit 20 — `TBI`: top byte ignored.
    pub tbi: bool,

    /// Bits 21–22 — Hardware flag management; kept at 0.
    #[bits(2, default = 0)]
    _reserved_21_22: u8,

    /// Bit 23 — Reserved (RES1).
    #[bits(default = true)]
    _reserved_one_23: bool,

    /// Bits 24–30 — Hierarchical permission controls; kept at 0.
    #[bits(7, default = 0)]
    _reserved_24_30: u8,

    /// Bit 31 — Reserved (RES1).
    #[bits(default = true)]
    _reserved_one_31: bool,

    /// Bits 32–63 — Reserved (RES0).
    #[bits(32, default = 0)]
    _reserved_32_63: u32,
}

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
impl crate::LoadRegisterUnsafe for TcrEl1 {
    unsafe fn load_unsafe() -> Self {
        let value: u64;
        unsafe {
            core::arch::asm!("mrs {}, tcr_el1", out(reg) value, options(nomem, nostack, preserves_flags));
        }
        Self::from_bits(value)
    }
}

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
impl crate::StoreRegisterUnsafe for TcrEl1 {
    unsafe fn store_unsafe(self) {
        let value = self.into_bits();
        unsafe {
            core::arch::asm!("msr tcr_el1, {}", "isb", in(reg) value, options(nostack, preserves_flags));
        }
    }
}

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
impl crate::LoadRegisterUnsafe for TcrEl2 {
    unsafe fn load_unsafe() -> Self {
        let value: u64;
        unsafe {
            core::arch::asm!("mrs {}, tcr_el2", out(reg) value, options(nomem, nostack, preserves_flags));
        }
        Self::from_bits(value)
    }
}

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
impl crate::StoreRegisterUnsafe for TcrEl2 {
    unsafe fn store_unsafe(self) {
        let value = self.into_bits();
        unsafe {
            core::arch::asm!("msr tcr_el2, {}", "isb", in(reg) value, options(nostack, preserves_flags));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn el2_new_sets_res1_bits() {
        let tcr = TcrEl2::new();
        assert_eq!(tcr.into_bits(), (1 << 31) | (1 << 23));
    }

    #[test]
    fn el2_field_positions() {
        let tcr = TcrEl2::new()
            .with_t0sz(25)
            .with_ps(tcr_field::PA_40_BITS)
            .with_sh0(tcr_field::SH_INNER_SHAREABLE)
            .with_orgn0(tcr_field::RGN_WRITE_BACK_ALLOCATE)
            .with_irgn0(tcr_field::RGN_WRITE_BACK_ALLOCATE);
        let expected = 25 | (2 << 16) | (3 << 12) | (1 << 10) | (1 << 8) | (1 << 31) | (1 << 23);
        assert_eq!(tcr.into_bits(), expected);
    }

    #[test]
    fn el1_field_positions() {
        let tcr = TcrEl1::new()
            .with_t0sz(16)
            .with_ips(tcr_field::PA_48_BITS)
            .with_epd1(true)
            .with_tg1(tcr_field::TG1_4K);
        assert_eq!(tcr.into_bits(), 16 | (5 << 32) | (1 << 23) | (2 << 30));
    }
}
