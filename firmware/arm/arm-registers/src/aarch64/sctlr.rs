use bitfield_struct::bitfield;

/// `SCTLR_ELx` — System Control Register.
///
/// Models the bits touched while switching translation on or off. All other
/// bits are preserved through [`from_bits`](Self::from_bits) /
/// [`into_bits`](Self::into_bits), so a read-modify-write keeps whatever the
/// previous boot stage configured.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct Sctlr {
    /// Bit 0 — `M`: stage 1 address translation enable.
    pub mmu_enable: bool,

    /// Bit 1 — `A`: alignment fault checking.
    pub alignment_check: bool,

    /// Bit 2 — `C`: data and unified cache enable.
    pub data_cache: bool,

    /// Bit 3 — `SA`: stack alignment check.
    pub stack_alignment_check: bool,

    /// Bits 4–11 — Not modelled.
    #[bits(8)]
    _bits_4_11: u8,

    /// Bit 12 — `I`: instruction cache enable.
    pub instruction_cache: bool,

    /// Bits 13–18 — Not modelled.
    #[bits(6)]
    _bits_13_18: u8,

    /// Bit 19 — `WXN`: writable memory is execute-never.
    pub write_execute_never: bool,

    /// Bits 20–63 — Not modelled.
    #[bits(44)]
    _bits_20_63: u64,
}

crate::aarch64::banked_register_asm!(Sctlr, "sctlr");
