use bitfield_struct::bitfield;

/// `MPIDR` — Multiprocessor Affinity Register.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct Mpidr {
    /// Bits 0–23 — Affinity levels 0 to 2.
    #[bits(24)]
    pub affinity: u32,

    /// Bits 24–29 — Not modelled.
    #[bits(6)]
    _bits_24_29: u8,

    /// Bit 30 — `U`: uniprocessor system.
    pub uniprocessor: bool,

    /// Bit 31 — Set when the Multiprocessing Extensions are implemented.
    pub multiprocessing_extensions: bool,
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
impl crate::LoadRegisterUnsafe for Mpidr {
    unsafe fn load_unsafe() -> Self {
        let value: u32;
        unsafe {
            core::arch::asm!("mrc p15, 0, {}, c0, c0, 5", out(reg) value, options(nomem, nostack, preserves_flags));
        }
        Self::from_bits(value)
    }
}
