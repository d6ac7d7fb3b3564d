//! # ARMv7 (VMSAv7) Translation Registers
//!
//! CP15 registers used with the short-descriptor translation table format.

/// Implements [`LoadRegisterUnsafe`](crate::LoadRegisterUnsafe) and
/// [`StoreRegisterUnsafe`](crate::StoreRegisterUnsafe) through `mrc`/`mcr`.
macro_rules! cp15_register_asm {
    ($ty:ty, $opc1:literal, $crn:literal, $crm:literal, $opc2:literal) => {
        #[cfg(all(feature = "asm", target_arch = "arm"))]
        impl $crate::LoadRegisterUnsafe for $ty {
            unsafe fn load_unsafe() -> Self {
                let value: u32;
                unsafe {
                    core::arch::asm!(
                        concat!("mrc p15, ", $opc1, ", {}, ", $crn, ", ", $crm, ", ", $opc2),
                        out(reg) value,
                        options(nomem, nostack, preserves_flags)
                    );
                }
                Self::from_bits(value)
            }
        }

        #[cfg(all(feature = "asm", target_arch = "arm"))]
        impl $crate::StoreRegisterUnsafe for $ty {
            unsafe fn store_unsafe(self) {
                let value = self.into_bits();
                unsafe {
                    core::arch::asm!(
                        concat!("mcr p15, ", $opc1, ", {}, ", $crn, ", ", $crm, ", ", $opc2),
                        "isb",
                        in(reg) value,
                        options(nostack, preserves_flags)
                    );
                }
            }
        }
    };
}

pub(crate) use cp15_register_asm;

mod dacr;
mod mpidr;
mod sctlr;
mod ttbcr;
mod ttbr;

pub use dacr::{Dacr, DomainAccess};
pub use mpidr::Mpidr;
pub use sctlr::Sctlr;
pub use ttbcr::Ttbcr;
pub use ttbr::{Ttbr0, ttbr_region};
