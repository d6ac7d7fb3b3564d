//! # AArch64 Translation Registers
//!
//! Registers used when bringing up stage 1 translation for the current
//! exception level. `TCR_EL1` and `TCR_EL2` have different layouts and get
//! their own types; `MAIR`, `SCTLR` and `TTBR0` share one layout across
//! exception levels and are accessed through the banked traits
//! [`LoadBankedRegisterUnsafe`] / [`StoreBankedRegisterUnsafe`].

/// Implements the banked accessors with `mrs`/`msr` for the given register name prefix.
macro_rules! banked_register_asm {
    ($ty:ty, $name:literal) => {
        #[cfg(all(feature = "asm", target_arch = "aarch64"))]
        impl $crate::aarch64::LoadBankedRegisterUnsafe for $ty {
            unsafe fn load_unsafe_at(el: $crate::aarch64::ExceptionLevel) -> Self {
                use $crate::aarch64::ExceptionLevel;
                let value: u64;
                unsafe {
                    match el {
                        ExceptionLevel::El0 | ExceptionLevel::El1 => core::arch::asm!(
                            concat!("mrs {}, ", $name, "_el1"),
                            out(reg) value,
                            options(nomem, nostack, preserves_flags)
                        ),
                        ExceptionLevel::El2 => core::arch::asm!(
                            concat!("mrs {}, ", $name, "_el2"),
                            out(reg) value,
                            options(nomem, nostack, preserves_flags)
                        ),
                        ExceptionLevel::El3 => core::arch::asm!(
                            concat!("mrs {}, ", $name, "_el3"),
                            out(reg) value,
                            options(nomem, nostack, preserves_flags)
                        ),
                    }
                }
                Self::from_bits(value)
            }
        }

        #[cfg(all(feature = "asm", target_arch = "aarch64"))]
        impl $crate::aarch64::StoreBankedRegisterUnsafe for $ty {
            unsafe fn store_unsafe_at(self, el: $crate::aarch64::ExceptionLevel) {
                use $crate::aarch64::ExceptionLevel;
                let value = self.into_bits();
                unsafe {
                    match el {
                        ExceptionLevel::El0 | ExceptionLevel::El1 => core::arch::asm!(
                            concat!("msr ", $name, "_el1, {}"),
                            "isb",
                            in(reg) value,
                            options(nostack, preserves_flags)
                        ),
                        ExceptionLevel::El2 => core::arch::asm!(
                            concat!("msr ", $name, "_el2, {}"),
                            "isb",
                            in(reg) value,
                            options(nostack, preserves_flags)
                        ),
                        ExceptionLevel::El3 => core::arch::asm!(
                            concat!("msr ", $name, "_el3, {}"),
                            "isb",
                            in(reg) value,
                            options(nostack, preserves_flags)
                        ),
                    }
                }
            }
        }
    };
}

pub(crate) use banked_register_asm;

mod current_el;
mod mair;
mod sctlr;
mod tcr;
mod ttbr;

pub use current_el::{CurrentEl, ExceptionLevel};
pub use mair::{Mair, mair_encoding};
pub use sctlr::Sctlr;
pub use tcr::{TcrEl1, TcrEl2, tcr_field};
pub use ttbr::Ttbr0;

/// Load a register that exists once per exception level (`*_EL1`, `*_EL2`, `*_EL3`).
pub trait LoadBankedRegisterUnsafe: Sized {
    /// # Safety
    /// Must run at `el` or higher. `EL0` selects the `EL1` bank.
    unsafe fn load_unsafe_at(el: ExceptionLevel) -> Self;
}

/// Store a register that exists once per exception level (`*_EL1`, `*_EL2`, `*_EL3`).
pub trait StoreBankedRegisterUnsafe {
    /// # Safety
    /// Must run at `el` or higher. `EL0` selects the `EL1` bank. Writing
    /// translation registers while translation is enabled changes the
    /// memory view of the running code.
    unsafe fn store_unsafe_at(self, el: ExceptionLevel);
}
