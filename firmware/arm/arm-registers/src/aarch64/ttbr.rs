use bitfield_struct::bitfield;

/// `TTBR0_ELx` — Translation Table Base Register 0.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct Ttbr0 {
    /// Bits 0–47 — Physical base address of the root table (`BADDR`, `CnP` at bit 0).
    #[bits(48)]
    pub base_address: u64,

    /// Bits 48–63 — `ASID`.
    #[bits(16)]
    pub asid: u16,
}

crate::aarch64::banked_register_asm!(Ttbr0, "ttbr0");
