//! # ARMv7 Short-Descriptor Regime
//!
//! `TTBR0` only (`TTBCR.N = 0`), domain 0 in client mode, TEX remap off.

use super::{CacheMaintenance, TranslationRegime};
use crate::addresses::PhysicalAddress;
use crate::arch::Armv7;
use crate::attributes::{Cacheability, RegionAttribute};
use crate::error::{MmuError, UnsupportedError};
use crate::sizer::AddressSpaceConfig;
use arm_registers::armv7::{Dacr, DomainAccess, Ttbcr, Ttbr0, ttbr_region};

/// `TTBR0` for a root at `root` whose tables live in `attribute` memory.
///
/// Processors with the Multiprocessing Extensions encode inner
/// write-back as `IRGN = 0b01` (`IRGN[0]` in bit 6); earlier ones use
/// the single `C` bit.
///
/// # Errors
/// [`UnsupportedError::TableWalkAttribute`] for device memory.
#[allow(clippy::cast_possible_truncation)]
pub fn table_walk_base(root: PhysicalAddress, attribute: RegionAttribute, multiprocessing: bool) -> Result<Ttbr0, MmuError> {
    let ttbr = Ttbr0::new().with_base((root.as_u64() >> 14) as u32);
    let ttbr = match attribute.cacheability() {
        Cacheability::WriteBack if multiprocessing => ttbr
            .with_rgn(ttbr_region::WRITE_BACK_ALLOCATE)
            .with_irgn0(true)
            .with_shareable(true),
        Cacheability::WriteBack => ttbr
            .with_rgn(ttbr_region::WRITE_BACK_ALLOCATE)
            .with_inner_cacheable(true)
            .with_shareable(true),
        Cacheability::WriteThrough => ttbr
            .with_rgn(ttbr_region::WRITE_THROUGH)
            .with_inner_cacheable(true)
            .with_shareable(true),
        Cacheability::Uncached => ttbr.with_rgn(ttbr_region::NON_CACHEABLE),
        Cacheability::Device => return Err(UnsupportedError::TableWalkAttribute(attribute).into()),
    };
    Ok(ttbr)
}

/// Translation registers of an ARMv7-A processor.
pub trait Armv7Cpu: CacheMaintenance {
    /// `MPIDR` bit 31.
    fn has_multiprocessing_extensions(&mut self) -> bool;

    fn write_ttbcr(&mut self, ttbcr: Ttbcr);

    fn write_ttbr0(&mut self, ttbr: Ttbr0);

    fn write_dacr(&mut self, dacr: Dacr);

    /// Sets `SCTLR.TRE`.
    fn set_tex_remap(&mut self, enabled: bool);
}

/// [`TranslationRegime`] over an [`Armv7Cpu`].
#[derive(Debug)]
pub struct Armv7Regime<C> {
    cpu: C,
}

impl<C: Armv7Cpu> Armv7Regime<C> {
    pub const fn new(cpu: C) -> Self {
        Self { cpu }
    }

    pub fn into_inner(self) -> C {
        self.cpu
    }
}

impl<C: Armv7Cpu> TranslationRegime for Armv7Regime<C> {
    type Arch = Armv7;
    type Control = Ttbcr;
    type Cpu = C;

    fn cpu(&mut self) -> &mut C {
        &mut self.cpu
    }

    fn translation_control(&mut self, _config: &AddressSpaceConfig, max_address: u64) -> Result<Ttbcr, MmuError> {
        if max_address > u64::from(u32::MAX) {
            return Err(UnsupportedError::AddressRange { max_address }.into());
        }
        Ok(Ttbcr::new())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn install(&mut self, control: Ttbcr, root: PhysicalAddress) {
        self.cpu.write_ttbcr(control);
        self.cpu
            .write_ttbr0(Ttbr0::new().with_base((root.as_u64() >> 14) as u32));
    }

    fn program_table_walk(&mut self, _control: Ttbcr, root: PhysicalAddress, attribute: RegionAttribute) -> Result<(), MmuError> {
        let multiprocessing = self.cpu.has_multiprocessing_extensions();
        let ttbr = table_walk_base(root, attribute, multiprocessing)?;
        log::debug!("TTBR0 = {:#x}", ttbr.into_bits());
        self.cpu.write_ttbr0(ttbr);
        Ok(())
    }

    fn program_memory_attributes(&mut self, _control: Ttbcr) {
        self.cpu.write_dacr(Dacr::new().with_domain0(DomainAccess::Client));
        self.cpu.set_tex_remap(false);
    }
}

#[cfg(all(feature = "asm", target_arch = "arm"))]
pub use system::SystemCpu;

#[cfg(all(feature = "asm", target_arch = "arm"))]
mod system {
    use super::Armv7Cpu;
    use crate::hardware::CacheMaintenance;
    use arm_cache::armv7 as cache;
    use arm_registers::armv7::{Dacr, Mpidr, Sctlr, Ttbcr, Ttbr0};
    use arm_registers::{LoadRegisterUnsafe, StoreRegisterUnsafe};

    /// The executing processor.
    #[derive(Debug)]
    pub struct SystemCpu(());

    impl SystemCpu {
        /// # Safety
        /// Must run in a privileged mode with the code, stack and table
        /// memory identity mapped.
        #[must_use]
        pub const unsafe fn new() -> Self {
            Self(())
        }

        fn update_sctlr(&mut self, f: impl FnOnce(Sctlr) -> Sctlr) {
            unsafe { f(Sctlr::load_unsafe()).store_unsafe() }
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
            cache::invalidate_tlbs();
        }

        fn disable_alignment_check(&mut self) {
            self.update_sctlr(|s| s.with_alignment_check(false));
        }
    }

    impl Armv7Cpu for SystemCpu {
        fn has_multiprocessing_extensions(&mut self) -> bool {
            unsafe { Mpidr::load_unsafe() }.multiprocessing_extensions()
        }

        fn write_ttbcr(&mut self, ttbcr: Ttbcr) {
            unsafe { ttbcr.store_unsafe() }
        }

        fn write_ttbr0(&mut self, ttbr: Ttbr0) {
            unsafe { ttbr.store_unsafe() }
        }

        fn write_dacr(&mut self, dacr: Dacr) {
            unsafe { dacr.store_unsafe() }
        }

        fn set_tex_remap(&mut self, enabled: bool) {
            self.update_sctlr(|s| s.with_tex_remap(enabled));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: PhysicalAddress = PhysicalAddress::new(0x0010_4000);

    #[test]
    fn write_back_walk_without_mp_extensions() {
        let ttbr = table_walk_base(ROOT, RegionAttribute::WriteBack, false).unwrap();
        assert_eq!(ttbr.into_bits(), 0x0010_4000 | (1 << 3) | 0b10 | 0b1);
    }

    #[test]
    fn write_back_walk_with_mp_extensions() {
        let ttbr = table_walk_base(ROOT, RegionAttribute::NonSecureWriteBack, true).unwrap();
        assert_eq!(ttbr.into_bits(), 0x0010_4000 | (1 << 3) | (1 << 6) | 0b10);
    }

    #[test]
    fn write_through_and_uncached_walks() {
        let ttbr = table_walk_base(ROOT, RegionAttribute::WriteThrough, true).unwrap();
        assert_eq!(ttbr.into_bits(), 0x0010_4000 | (2 << 3) | 0b10 | 0b1);
        let ttbr = table_walk_base(ROOT, RegionAttribute::Uncached, false).unwrap();
        assert_eq!(ttbr.into_bits(), 0x0010_4000);
    }

    #[test]
    fn device_memory_cannot_hold_tables() {
        assert!(table_walk_base(ROOT, RegionAttribute::Device, false).is_err());
    }
}
