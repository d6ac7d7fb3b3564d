//! # CPU Control Surface
//!
//! Everything [`configure`](crate::configure) does to the processor goes
//! through these traits. Real implementations execute system instructions
//! (`asm` feature, matching target only); tests and host tools record or
//! simulate them.

pub mod aarch64;
pub mod armv7;

use crate::addresses::PhysicalAddress;
use crate::arch::Architecture;
use crate::attributes::RegionAttribute;
use crate::error::MmuError;
use crate::sizer::AddressSpaceConfig;
use core::fmt;

/// Cache, TLB and MMU switches of the executing processor.
///
/// Each call takes effect before it returns (the implementation issues the
/// required barriers).
pub trait CacheMaintenance {
    fn disable_mmu(&mut self);
    fn enable_mmu(&mut self);
    fn disable_data_cache(&mut self);
    fn enable_data_cache(&mut self);
    fn disable_instruction_cache(&mut self);
    fn enable_instruction_cache(&mut self);

    /// Cleans and invalidates every data and unified cache level by set/way.
    fn clean_invalidate_data_cache(&mut self);

    fn invalidate_instruction_cache(&mut self);

    /// Invalidates all TLB entries of the current translation regime.
    fn invalidate_tlbs(&mut self);

    fn disable_alignment_check(&mut self);
}

/// Translation registers of one architecture and exception level.
pub trait TranslationRegime {
    /// Table format walked by this regime.
    type Arch: Architecture;

    /// Translation control value computed before the tables are built.
    type Control: Copy + fmt::Debug;

    type Cpu: CacheMaintenance;

    fn cpu(&mut self) -> &mut Self::Cpu;

    /// Computes the translation control for `config`, checking that the
    /// processor runs at a level this regime can configure.
    ///
    /// # Errors
    /// [`UnsupportedError`](crate::UnsupportedError) for an unsupported
    /// exception level or address range.
    fn translation_control(&mut self, config: &AddressSpaceConfig, max_address: u64) -> Result<Self::Control, MmuError>;

    /// Writes the translation control and the root table base.
    fn install(&mut self, control: Self::Control, root: PhysicalAddress);

    /// Sets the cacheability the hardware walker uses to read the tables.
    ///
    /// # Errors
    /// [`UnsupportedError::TableWalkAttribute`](crate::UnsupportedError::TableWalkAttribute)
    /// if tables cannot be walked through memory of that type.
    fn program_table_walk(
        &mut self,
        control: Self::Control,
        root: PhysicalAddress,
        attribute: RegionAttribute,
    ) -> Result<(), MmuError>;

    /// Programs the memory type registers the descriptors refer to.
    fn program_memory_attributes(&mut self, control: Self::Control);
}
