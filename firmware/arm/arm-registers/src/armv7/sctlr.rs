use bitfield_struct::bitfield;

/// `SCTLR` — System Control Register (ARMv7).
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct Sctlr {
    /// Bit 0 — `M`: MMU enable.
    pub mmu_enable: bool,

    /// Bit 1 — `A`: alignment fault checking.
    pub alignment_check: bool,

    /// Bit 2 — `C`: data and unified cache enable.
    pub data_cache: bool,

    /// Bits 3–10 — Not modelled.
    #[bits(8)]
    _bits_3_10: u8,

    /// Bit 11 — `Z`: branch prediction enable.
    pub branch_prediction: bool,

    /// Bit 12 — `I`: instruction cache enable.
    pub instruction_cache: bool,

    /// Bit 13 — `V`: high exception vectors.
    pub high_vectors: bool,

    /// Bits 14–27 — Not modelled.
    #[bits(14)]
    _bits_14_27: u16,

    /// Bit 28 — `TRE`: TEX remap enable.
    pub tex_remap: bool,

    /// Bit 29 — `AFE`: access flag enable.
    pub access_flag_enable: bool,

    /// Bit 30 — `TE`: take exceptions in Thumb state.
    pub thumb_exceptions: bool,

    /// Bit 31 — Not modelled.
    _bit_31: bool,
}

crate::armv7::cp15_register_asm!(Sctlr, "0", "c1", "c0", "0");
