//! # Table Walker
//!
//! Finds (and creates, if needed) the table entry that maps a virtual
//! address at a requested level.
//!
//! On the way down, every level above the target is made to hold a table
//! descriptor:
//!
//! - an **invalid** entry gets a freshly allocated, empty child table;
//! - a **block** entry is split into a child table whose entries reproduce
//!   the block exactly (same output addresses, same attributes);
//! - a **table** entry is simply followed.
//!
//! If the entry at the target level already points to a finer table, the
//! walk continues one level deeper so existing finer mappings are never
//! replaced by a coarse block.

use crate::addresses::VirtualAddress;
use crate::allocator::PageAllocator;
use crate::arch::Architecture;
use crate::descriptor::{DescriptorEntry, TableProtection};
use crate::error::{MmuError, ParameterError};
use crate::table::{TableHandle, TranslationTables};

/// Entry chosen by [`TranslationTables::locate`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlockSlot {
    pub table: TableHandle,
    pub index: usize,
    /// Level of `table`; deeper than requested if a finer table was in the way.
    pub level: u8,
    pub block_size: u64,
    /// Highest valid index of `table`.
    pub last_index: usize,
    /// Union of the table descriptors between the root and `table`.
    pub inherited: TableProtection,
}

impl<A: Architecture> TranslationTables<A> {
    /// Locates the entry mapping `va` at `target_level`.
    ///
    /// # Errors
    /// - [`ParameterError::InvalidLevel`] for a level outside the walk.
    /// - [`ParameterError::OutsideRootTable`] if the root table does not reach `va`.
    /// - [`MmuError::OutOfResources`] if a table cannot be allocated.
    pub fn locate<P: PageAllocator>(
        &mut self,
        alloc: &mut P,
        va: VirtualAddress,
        target_level: u8,
    ) -> Result<BlockSlot, MmuError> {
        self.locate_with(alloc, va, target_level, TableProtection::NONE)
    }

    /// Like [`locate`](Self::locate); tables created for invalid entries
    /// carry `new_table_protection`.
    ///
    /// # Errors
    /// See [`locate`](Self::locate).
    pub fn locate_with<P: PageAllocator>(
        &mut self,
        alloc: &mut P,
        va: VirtualAddress,
        target_level: u8,
        new_table_protection: TableProtection,
    ) -> Result<BlockSlot, MmuError> {
        if target_level < self.config().root_level || target_level > A::LEAF_LEVEL {
            return Err(ParameterError::InvalidLevel { level: target_level }.into());
        }

        let mut handle = TableHandle::ROOT;
        let mut target = target_level;
        let mut inherited = TableProtection::NONE;
        loop {
            let index = self.index_of(handle, va)?;
            let table = self.table(handle);
            let level = table.level();
            let entry = A::decode(table.entries()[index], level);

            if level == target {
                if let DescriptorEntry::Table { address, protection } = entry
                    && level < A::LEAF_LEVEL
                {
                    inherited = inherited.union(protection);
                    handle = self.handle_of(address)?;
                    target += 1;
                    continue;
                }
                return Ok(BlockSlot {
                    table: handle,
                    index,
                    level,
                    block_size: A::block_size(level),
                    last_index: table.entries().len() - 1,
                    inherited,
                });
            }

            handle = match entry {
                DescriptorEntry::Invalid => {
                    let child = self.allocate_table(alloc, level + 1)?;
                    self.link(handle, index, child, new_table_protection);
                    inherited = inherited.union(new_table_protection);
                    child
                }
                DescriptorEntry::Block { address, attributes } => {
                    let child = self.allocate_table(alloc, level + 1)?;
                    let child_size = A::block_size(level + 1);
                    for (i, slot) in self.table_mut(child).entries_mut().iter_mut().enumerate() {
                        *slot = A::encode(
                            DescriptorEntry::Block {
                                address: address + i as u64 * child_size,
                                attributes,
                            },
                            level + 1,
                        );
                    }
                    log::trace!("Split level {level} block at {va:?} into {child:?}");
                    let protection = A::block_protection(attributes);
                    self.link(handle, index, child, protection);
                    inherited = inherited.union(protection);
                    child
                }
                DescriptorEntry::Table { address, protection } => {
                    inherited = inherited.union(protection);
                    self.handle_of(address)?
                }
            };
        }
    }

    fn link(&mut self, parent: TableHandle, index: usize, child: TableHandle, protection: TableProtection) {
        let level = self.table(parent).level();
        let address = self.table(child).base();
        self.table_mut(parent).entries_mut()[index] = A::encode(DescriptorEntry::Table { address, protection }, level);
    }
}
