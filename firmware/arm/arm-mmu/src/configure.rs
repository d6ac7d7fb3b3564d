//! # MMU Configuration
//!
//! [`configure`] turns a memory map into live translation:
//!
//! ```text
//!  Unconfigured ─► Sized ─► RootAllocated ─► TablesPopulated ─► RegistersProgrammed ─► Enabled
//!       │            │            │                  │                   │
//!       └── validate └── TCR/TTBCR └── caches off,    └── commit,         └── TLBs, caches,
//!           regions      control       fill regions      walk attributes,     MMU on
//!                                                         MAIR / DACR
//! ```
//!
//! A failure after the root table exists releases every table page again.
//! Translation and caches stay off in that case.

use crate::addresses::PhysicalAddress;
use crate::allocator::PageAllocator;
use crate::arch::Architecture;
use crate::attributes::RegionAttribute;
use crate::error::{MmuError, ParameterError, UnsupportedError};
use crate::hardware::{CacheMaintenance, TranslationRegime};
use crate::mapper::PhysMapper;
use crate::region::{MemoryRegionDescriptor, active_regions};
use crate::table::TranslationTables;
use core::fmt;

/// Progress of a [`configure`] call, reported when it fails.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Unconfigured,
    /// The address space shape and translation control are known.
    Sized,
    RootAllocated,
    TablesPopulated,
    RegistersProgrammed,
    Enabled,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unconfigured => "unconfigured",
            Self::Sized => "sized",
            Self::RootAllocated => "root allocated",
            Self::TablesPopulated => "tables populated",
            Self::RegistersProgrammed => "registers programmed",
            Self::Enabled => "enabled",
        };
        f.write_str(name)
    }
}

/// Translation that [`configure`] enabled.
#[derive(Debug)]
pub struct MmuConfiguration<A: Architecture> {
    tables: TranslationTables<A>,
}

impl<A: Architecture> MmuConfiguration<A> {
    /// Physical address of the root table in `TTBR0`.
    #[must_use]
    pub fn root(&self) -> PhysicalAddress {
        self.tables.root_address()
    }

    #[must_use]
    pub const fn root_size_bytes(&self) -> usize {
        self.tables.root_size_bytes()
    }

    /// The tables the hardware now walks, as staged before commit.
    #[must_use]
    pub const fn tables(&self) -> &TranslationTables<A> {
        &self.tables
    }

    #[must_use]
    pub fn into_tables(self) -> TranslationTables<A> {
        self.tables
    }
}

/// Validates the active regions of `regions` and returns the highest
/// physical or virtual byte address any of them covers.
///
/// # Errors
/// - [`ParameterError::EmptyRegionList`] if the map starts with the sentinel.
/// - The first validation failure of a region.
pub fn max_address(regions: &[MemoryRegionDescriptor]) -> Result<u64, MmuError> {
    let mut max = None;
    for region in active_regions(regions) {
        region.validate()?;
        let last = region.physical_last().max(region.virtual_last());
        max = Some(max.map_or(last, |m: u64| m.max(last)));
    }
    max.ok_or_else(|| ParameterError::EmptyRegionList.into())
}

/// Builds translation tables for `regions` and enables the MMU.
///
/// `regions` ends at the first entry with zero length or at the end of
/// the slice. Later regions take precedence where regions overlap. The
/// region containing the root table decides the table walk cacheability;
/// if several do, the last one wins.
///
/// # Errors
/// - [`MmuError::InvalidParameter`] for an empty or malformed map. Nothing
///   has been allocated or touched.
/// - [`MmuError::Unsupported`] for an out-of-range map, an unsupported
///   exception level, or root table memory that no region maps (or maps as
///   device memory).
/// - [`MmuError::OutOfResources`] if table memory runs out.
pub fn configure<R, P, M>(
    regime: &mut R,
    alloc: &mut P,
    mapper: &M,
    regions: &[MemoryRegionDescriptor],
) -> Result<MmuConfiguration<R::Arch>, MmuError>
where
    R: TranslationRegime,
    P: PageAllocator,
    M: PhysMapper,
{
    let name = <R::Arch as Architecture>::NAME;
    let mut stage = Stage::Unconfigured;

    let prepared = max_address(regions).and_then(|max| {
        let config = R::Arch::address_space(max)?;
        let control = regime.translation_control(&config, max)?;
        Ok((max, config, control))
    });
    let (max, config, control) = prepared.inspect_err(|e| log::error!("{name} MMU configuration failed while {stage}: {e}"))?;
    stage = Stage::Sized;
    log::debug!(
        "{name} address space up to {max:#x}: root level {}, {} entries, size field {}",
        config.root_level,
        config.root_entry_count,
        config.size_field
    );

    let mut tables = TranslationTables::<R::Arch>::new(alloc, config)
        .inspect_err(|e| log::error!("{name} MMU configuration failed while {stage}: {e}"))?;
    stage = Stage::RootAllocated;

    match build(regime, alloc, mapper, &mut tables, control, regions, &mut stage) {
        Ok(()) => {
            log::info!(
                "{name} translation enabled: root {} ({} bytes), {} tables in {} pages",
                tables.root_address(),
                tables.root_size_bytes(),
                tables.len(),
                tables.pages()
            );
            Ok(MmuConfiguration { tables })
        }
        Err(e) => {
            log::error!("{name} MMU configuration failed while {stage}: {e}");
            tables.release(alloc);
            Err(e)
        }
    }
}

fn build<R, P, M>(
    regime: &mut R,
    alloc: &mut P,
    mapper: &M,
    tables: &mut TranslationTables<R::Arch>,
    control: R::Control,
    regions: &[MemoryRegionDescriptor],
    stage: &mut Stage,
) -> Result<(), MmuError>
where
    R: TranslationRegime,
    P: PageAllocator,
    M: PhysMapper,
{
    let root = tables.root_address();

    let cpu = regime.cpu();
    cpu.disable_mmu();
    cpu.disable_data_cache();
    cpu.disable_instruction_cache();
    cpu.clean_invalidate_data_cache();
    cpu.invalidate_instruction_cache();

    // Root installed only once translation and caches are off.
    regime.install(control, root);

    let mut walk_attribute: Option<RegionAttribute> = None;
    for region in active_regions(regions) {
        log::debug!(
            "Mapping {} -> {} ({:#x} bytes) as {:?}",
            region.virtual_base,
            region.physical_base,
            region.length,
            region.attributes
        );
        tables.fill(alloc, region)?;
        if region.contains_physical(root) {
            walk_attribute = Some(region.attributes);
        }
    }
    *stage = Stage::TablesPopulated;

    let walk_attribute = walk_attribute.ok_or(UnsupportedError::TableMemoryNotMapped(root))?;

    // The tables were allocated from `alloc` for this arena and the MMU is off.
    unsafe { tables.commit(mapper) };

    regime.program_table_walk(control, root, walk_attribute)?;
    regime.program_memory_attributes(control);
    *stage = Stage::RegistersProgrammed;

    let cpu = regime.cpu();
    cpu.invalidate_tlbs();
    cpu.disable_alignment_check();
    cpu.enable_instruction_cache();
    cpu.enable_data_cache();
    cpu.enable_mmu();
    *stage = Stage::Enabled;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_address_covers_virtual_and_physical_ranges() {
        let map = [
            MemoryRegionDescriptor::identity(0x4000_0000, 0x4000_0000, RegionAttribute::WriteBack),
            MemoryRegionDescriptor::new(
                PhysicalAddress::new(0x0900_0000),
                crate::VirtualAddress::new(0x1_0000_0000),
                0x1000,
                RegionAttribute::Device,
            ),
            MemoryRegionDescriptor::SENTINEL,
            MemoryRegionDescriptor::identity(0x80_0000_0000, 0x1000, RegionAttribute::Device),
        ];
        assert_eq!(max_address(&map), Ok(0x1_0000_0FFF));
    }

    #[test]
    fn empty_and_malformed_maps_are_rejected() {
        assert_eq!(
            max_address(&[]),
            Err(MmuError::InvalidParameter(ParameterError::EmptyRegionList))
        );
        assert_eq!(
            max_address(&[MemoryRegionDescriptor::SENTINEL]),
            Err(MmuError::InvalidParameter(ParameterError::EmptyRegionList))
        );
        let map = [MemoryRegionDescriptor::identity(0x1000, 0x800, RegionAttribute::WriteBack)];
        assert!(matches!(
            max_address(&map),
            Err(MmuError::InvalidParameter(ParameterError::MisalignedLength { .. }))
        ));
    }

    #[test]
    fn stages_are_ordered() {
        assert!(Stage::Unconfigured < Stage::Sized);
        assert!(Stage::RegistersProgrammed < Stage::Enabled);
        assert_eq!(Stage::TablesPopulated.to_string(), "tables populated");
    }
}
