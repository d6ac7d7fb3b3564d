//! # Region Filler
//!
//! Maps one [`MemoryRegionDescriptor`] with the largest blocks the
//! alignment of its addresses allows.
//!
//! Each step picks the coarsest level whose block size divides both the
//! current virtual and physical address (or the remaining length, at
//! address zero) and fits in the remaining length,
//! locates the first entry, and then writes consecutive entries of that
//! table while they still fit. Walking to a new table, or running into an
//! entry that already points at a finer table, starts the next step.

use crate::addresses::{PAGE_SIZE, PhysicalAddress, VirtualAddress, alignment_of};
use crate::allocator::PageAllocator;
use crate::arch::Architecture;
use crate::descriptor::DescriptorEntry;
use crate::error::{MmuError, UnsupportedError};
use crate::region::MemoryRegionDescriptor;
use crate::table::TranslationTables;

impl<A: Architecture> TranslationTables<A> {
    /// Maps `region`, replacing whatever mapped its range before.
    ///
    /// # Errors
    /// - [`ParameterError`](crate::ParameterError) if the region is malformed
    ///   or outside the root table.
    /// - [`MmuError::OutOfResources`] if a table cannot be allocated. Entries
    ///   written before the failure stay in place.
    /// - [`UnsupportedError::SecurityState`] if leaves would land in an
    ///   existing table whose security state differs from the region's.
    pub fn fill<P: PageAllocator>(&mut self, alloc: &mut P, region: &MemoryRegionDescriptor) -> Result<(), MmuError> {
        region.validate()?;

        let attributes = A::mark_accessed(A::region_attributes(region.attributes));
        let protection = A::table_protection_for(attributes);
        let coarsest = self.config().root_level.max(A::MIN_BLOCK_LEVEL);

        let mut va = region.virtual_base.as_u64();
        let mut pa = region.physical_base.as_u64();
        let mut remaining = region.length;

        while remaining > 0 {
            // At address zero the remaining length bounds the block instead.
            let alignment = alignment_of(va | pa)
                .or_else(|| alignment_of(remaining))
                .unwrap_or(PAGE_SIZE);
            let level = (coarsest..=A::LEAF_LEVEL)
                .find(|&l| A::block_size(l) <= alignment && A::block_size(l) <= remaining)
                .unwrap_or(A::LEAF_LEVEL);

            let slot = self.locate_with(alloc, VirtualAddress::new(va), level, protection)?;
            // Leaves below the root cannot override the NS bit of their table.
            if slot.level > self.config().root_level && slot.inherited.non_secure != protection.non_secure {
                return Err(UnsupportedError::SecurityState {
                    address: VirtualAddress::new(va),
                    requested: region.attributes,
                }
                .into());
            }
            let entries = self.table_mut(slot.table).entries_mut();
            let mut index = slot.index;
            let mut written = 0usize;
            loop {
                entries[index] = A::encode(
                    DescriptorEntry::Block {
                        address: PhysicalAddress::new(pa),
                        attributes,
                    },
                    slot.level,
                );
                va += slot.block_size;
                pa += slot.block_size;
                remaining -= slot.block_size;
                index += 1;
                written += 1;

                if remaining < slot.block_size
                    || index > slot.last_index
                    || A::decode(entries[index], slot.level).is_table()
                {
                    break;
                }
            }
            log::trace!(
                "{written} level {} entries of {:#x} bytes up to {:?}",
                slot.level,
                slot.block_size,
                VirtualAddress::new(va)
            );
        }
        Ok(())
    }
}
