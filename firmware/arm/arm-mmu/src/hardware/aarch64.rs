//! # AArch64 Stage 1 Regime
//!
//! `TTBR0` translation at EL1 (EL1&0 regime) or EL2 (non-VHE), 4 KiB
//! granule, with the four memory types of [`attr_index`] in `MAIR`.
//!
//! [`attr_index`]: crate::arch::attr_index

use super::{CacheMaintenance, TranslationRegime};
use crate::addresses::PhysicalAddress;
use crate::arch::Aarch64;
use crate::attributes::{Cacheability, RegionAttribute};
use crate::error::{MmuError, UnsupportedError};
use crate::sizer::AddressSpaceConfig;
use arm_registers::aarch64::{ExceptionLevel, Mair, TcrEl1, TcrEl2, Ttbr0, mair_encoding, tcr_field};

/// `MAIR_ELx` value matching the descriptor `AttrIndx` assignment.
pub const MEMORY_ATTRIBUTES: Mair = Mair::new()
    .with_attr0(mair_encoding::DEVICE_NGNRNE)
    .with_attr1(mair_encoding::NORMAL_NON_CACHEABLE)
    .with_attr2(mair_encoding::NORMAL_WRITE_THROUGH)
    .with_attr3(mair_encoding::NORMAL_WRITE_BACK);

/// `PS`/`IPS` encoding of the smallest physical address size covering `max_address`.
///
/// # Errors
/// [`UnsupportedError::AddressRange`] at or above 2⁴⁸.
pub const fn physical_address_size(max_address: u64) -> Result<u8, MmuError> {
    let size = if max_address < 1 << 32 {
        tcr_field::PA_32_BITS
    } else if max_address < 1 << 36 {
        tcr_field::PA_36_BITS
    } else if max_address < 1 << 40 {
        tcr_field::PA_40_BITS
    } else if max_address < 1 << 42 {
        tcr_field::PA_42_BITS
    } else if max_address < 1 << 44 {
        tcr_field::PA_44_BITS
    } else if max_address < 1 << 48 {
        tcr_field::PA_48_BITS
    } else {
        return Err(MmuError::Unsupported(UnsupportedError::AddressRange { max_address }));
    };
    Ok(size)
}

/// Translation control register of the executing exception level.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TranslationControl {
    El1(TcrEl1),
    El2(TcrEl2),
}

impl TranslationControl {
    /// `TCR` for a `TTBR0` walk over `config`, table walks not yet cacheable.
    ///
    /// At EL1 the `TTBR1` walk is disabled.
    ///
    /// # Errors
    /// - [`UnsupportedError::ExceptionLevel`] for EL0 and EL3.
    /// - [`UnsupportedError::AddressRange`] at or above 2⁴⁸.
    pub fn new(el: ExceptionLevel, config: &AddressSpaceConfig, max_address: u64) -> Result<Self, MmuError> {
        let size = physical_address_size(max_address)?;
        match el {
            ExceptionLevel::El1 => Ok(Self::El1(
                TcrEl1::new()
                    .with_t0sz(config.size_field)
                    .with_tg0(tcr_field::TG0_4K)
                    .with_ips(size)
                    .with_epd1(true)
                    .with_tg1(tcr_field::TG1_4K),
            )),
            ExceptionLevel::El2 => Ok(Self::El2(
                TcrEl2::new()
                    .with_t0sz(config.size_field)
                    .with_tg0(tcr_field::TG0_4K)
                    .with_ps(size),
            )),
            ExceptionLevel::El0 | ExceptionLevel::El3 => Err(UnsupportedError::ExceptionLevel(el.into_bits()).into()),
        }
    }

    /// Sets `SH0`, `IRGN0` and `ORGN0` for tables stored in `attribute` memory.
    ///
    /// # Errors
    /// [`UnsupportedError::TableWalkAttribute`] for device memory.
    pub fn with_table_walk(self, attribute: RegionAttribute) -> Result<Self, MmuError> {
        let (sh, rgn) = match attribute.cacheability() {
            Cacheability::WriteBack => (tcr_field::SH_INNER_SHAREABLE, tcr_field::RGN_WRITE_BACK_ALLOCATE),
            Cacheability::WriteThrough => (tcr_field::SH_NON_SHAREABLE, tcr_field::RGN_WRITE_THROUGH),
            Cacheability::Uncached => (tcr_field::SH_NON_SHAREABLE, tcr_field::RGN_NON_CACHEABLE),
            Cacheability::Device => return Err(UnsupportedError::TableWalkAttribute(attribute).into()),
        };
        Ok(match self {
            Self::El1(tcr) => Self::El1(tcr.with_sh0(sh).with_irgn0(rgn).with_orgn0(rgn)),
            Self::El2(tcr) => Self::El2(tcr.with_sh0(sh).with_irgn0(rgn).with_orgn0(rgn)),
        })
    }

    #[must_use]
    pub const fn exception_level(self) -> ExceptionLevel {
        match self {
            Self::El1(_) => ExceptionLevel::El1,
            Self::El2(_) => ExceptionLevel::El2,
        }
    }

    /// Raw register value.
    #[must_use]
    pub const fn bits(self) -> u64 {
        match self {
            Self::El1(tcr) => tcr.into_bits(),
            Self::El2(tcr) => tcr.into_bits(),
        }
    }
}

/// Translation registers of an AArch64 processor.
pub trait Aarch64Cpu: CacheMaintenance {
    fn current_el(&mut self) -> ExceptionLevel;

    /// Writes `TCR_EL1` or `TCR_EL2`, whichever `tcr` is.
    fn write_tcr(&mut self, tcr: TranslationControl);

    fn write_ttbr0(&mut self, el: ExceptionLevel, ttbr: Ttbr0);

    fn write_mair(&mut self, el: ExceptionLevel, mair: Mair);
}

/// [`TranslationRegime`] over an [`Aarch64Cpu`].
#[derive(Debug)]
pub struct Aarch64Regime<C> {
    cpu: C,
}

impl<C: Aarch64Cpu> Aarch64Regime<C> {
    pub const fn new(cpu: C) -> Self {
        Self { cpu }
    }

    pub fn into_inner(self) -> C {
        self.cpu
    }
}

impl<C: Aarch64Cpu> TranslationRegime for Aarch64Regime<C> {
    type Arch = Aarch64;
    type Control = TranslationControl;
    type Cpu = C;

    fn cpu(&mut self) -> &mut C {
        &mut self.cpu
    }

    fn translation_control(&mut self, config: &AddressSpaceConfig, max_address: u64) -> Result<TranslationControl, MmuError> {
        let el = self.cpu.current_el();
        TranslationControl::new(el, config, max_address)
    }

    fn install(&mut self, control: TranslationControl, root: PhysicalAddress) {
        self.cpu.write_tcr(control);
        self.cpu
            .write_ttbr0(control.exception_level(), Ttbr0::new().with_base_address(root.as_u64()));
    }

    fn program_table_walk(
        &mut self,
        control: TranslationControl,
        _root: PhysicalAddress,
        attribute: RegionAttribute,
    ) -> Result<(), MmuError> {
        let control = control.with_table_walk(attribute)?;
        log::debug!("TCR_EL{} = {:#x}", control.exception_level().into_bits(), control.bits());
        self.cpu.write_tcr(control);
        Ok(())
    }

    fn program_memory_attributes(&mut self, control: TranslationControl) {
        self.cpu.write_mair(control.exception_level(), MEMORY_ATTRIBUTES);
    }
}

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
pub use system::SystemCpu;

#[cfg(all(feature = "asm", target_arch = "aarch64"))]
mod system {
    use super::{Aarch64Cpu, TranslationControl};
    use crate::hardware::CacheMaintenance;
    use arm_cache::aarch64 as cache;
    use arm_registers::aarch64::{
        CurrentEl, ExceptionLevel, LoadBankedRegisterUnsafe, Mair, Sctlr, StoreBankedRegisterUnsafe, Ttbr0,
    };
    use arm_registers::{LoadRegisterUnsafe, StoreRegisterUnsafe};

    /// The executing processor.
    #[derive(Debug)]
    pub struct SystemCpu {
        el: ExceptionLevel,
    }

    impl SystemCpu {
        /// # Safety
        /// Must run at EL1 or higher with the code, stack and table memory
        /// identity mapped; the returned value reconfigures translation for
        /// the whole processor.
        #[must_use]
        pub unsafe fn new() -> Self {
            let el = unsafe { CurrentEl::load_unsafe() }.el();
            Self { el }
        }

        fn update_sctlr(&mut self, f: impl FnOnce(Sctlr) -> Sctlr) {
            unsafe {
                let sctlr = Sctlr::load_unsafe_at(self.el);
                f(sctlr).store_unsafe_at(self.el);
            }
        }
    }

    impl CacheMaintenance for SystemCpu {
        fn disable_mmu(&mut self) {
            self.update_sctlr(|s| s.with_mmu_enable(false));
        }

        fn enable_mmu(&mut self) {
            cache::data_synchronization_barrier();
            self.update_sctlr(|s| s.with_mmu_enable(true));
        }

        fn disable_data_cache(&mut self) {
            self.update_sctlr(|s| s.with_data_cache(false));
        }

        fn enable_data_cache(&mut self) {
            self.update_sctlr(|s| s.with_data_cache(true));
        }

        fn disable_instruction_cache(&mut self) {
            self.update_sctlr(|s| s.with_instruction_cache(false));
        }

        fn enable_instruction_cache(&mut self) {
            self.update_sctlr(|s| s.with_instruction_cache(true));
        }

        fn clean_invalidate_data_cache(&mut self) {
            cache::clean_invalidate_data_cache();
        }

        fn invalidate_instruction_cache(&mut self) {
            cache::invalidate_instruction_cache();
        }

        fn invalidate_tlbs(&mut self) {
            cache::invalidate_tlbs(self.el);
        }

        fn disable_alignment_check(&mut self) {
            self.update_sctlr(|s| s.with_alignment_check(false));
        }
    }

    impl Aarch64Cpu for SystemCpu {
        fn current_el(&mut self) -> ExceptionLevel {
            self.el
        }

        fn write_tcr(&mut self, tcr: TranslationControl) {
            unsafe {
                match tcr {
                    TranslationControl::El1(tcr) => tcr.store_unsafe(),
                    TranslationControl::El2(tcr) => tcr.store_unsafe(),
                }
            }
        }

        fn write_ttbr0(&mut self, el: ExceptionLevel, ttbr: Ttbr0) {
            unsafe { ttbr.store_unsafe_at(el) }
        }

        fn write_mair(&mut self, el: ExceptionLevel, mair: Mair) {
            unsafe { mair.store_unsafe_at(el) }
        }
    }
}
