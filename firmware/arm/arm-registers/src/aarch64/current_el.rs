use bitfield_struct::bitfield;

/// AArch64 exception level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExceptionLevel {
    El0 = 0,
    El1 = 1,
    El2 = 2,
    El3 = 3,
}

impl ExceptionLevel {
    /// Decodes the two-bit `CurrentEL.EL` field.
    #[must_use]
    pub const fn from_bits(value: u8) -> Self {
        match value & 0b11 {
            0 => Self::El0,
            1 => Self::El1,
            2 => Self::El2,
            _ => Self::El3,
        }
    }

    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }
}

/// `CurrentEL`: the exception level the PE is executing at.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct CurrentEl {
    /// Bits 0–1 — Reserved (RES0).
    #[bits(2)]
    _reserved_0_1: u8,

    /// Bits 2–3 — Current exception level.
    #[bits(2)]
    pub el: ExceptionLevel,

    /// Bits 4–63 — Reserved (RES0).
    #[bits(60)]
    _reserved_4_63: u64,
}

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
impl crate::LoadRegisterUnsafe for CurrentEl {
    unsafe fn load_unsafe() -> Self {
        let value: u64;
        unsafe {
            core::arch::asm!("mrs {}, CurrentEL", out(reg) value, options(nomem, nostack, preserves_flags));
        }
        Self::from_bits(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_level_from_bits_2_and_3() {
        assert_eq!(CurrentEl::from_bits(0b1000).el(), ExceptionLevel::El2);
        assert_eq!(CurrentEl::from_bits(0b0100).el(), ExceptionLevel::El1);
        assert_eq!(CurrentEl::from_bits(0b1100).el(), ExceptionLevel::El3);
        assert_eq!(CurrentEl::from_bits(0).el(), ExceptionLevel::El0);
    }
}
