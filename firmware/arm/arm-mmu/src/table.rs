//! # Translation Table Arena
//!
//! Tables are built in host memory ([`TranslationTables`]) and written to
//! their physical pages in one step by [`TranslationTables::commit`]. Every
//! table knows its physical base so descriptors can point at children
//! before anything is committed.
//!
//! ```text
//!  TableHandle(0) ── root, level = config.root_level
//!  TableHandle(1..) ── children, in allocation order
//!  by_address: child PA ──► TableHandle
//! ```

use crate::addresses::{PAGE_SIZE, PhysicalAddress, VirtualAddress};
use crate::allocator::PageAllocator;
use crate::arch::Architecture;
use crate::attributes::RegionAttribute;
use crate::descriptor::{DescriptorEntry, RawDescriptor, TableProtection};
use crate::error::{MmuError, ParameterError, UnsupportedError};
use crate::mapper::PhysMapper;
use crate::sizer::AddressSpaceConfig;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;
use core::marker::PhantomData;
use uefi::boot::MemoryAttribute;

/// Index of a table in a [`TranslationTables`] arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableHandle(usize);

impl TableHandle {
    /// The root table, allocated first.
    pub const ROOT: Self = Self(0);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One translation table: its physical home and its staged entries.
#[derive(Debug)]
pub struct TranslationTable<D> {
    base: PhysicalAddress,
    level: u8,
    pages: usize,
    entries: Box<[D]>,
}

impl<D: RawDescriptor> TranslationTable<D> {
    #[must_use]
    pub const fn base(&self) -> PhysicalAddress {
        self.base
    }

    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Pages reserved for the table.
    #[must_use]
    pub const fn pages(&self) -> usize {
        self.pages
    }

    #[must_use]
    pub fn entries(&self) -> &[D] {
        &self.entries
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [D] {
        &mut self.entries
    }

    /// Number of non-invalid entries.
    #[must_use]
    pub fn valid_entries(&self) -> usize {
        self.entries.iter().filter(|e| **e != D::INVALID).count()
    }
}

/// Result of walking the tables for one virtual address.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Translation<T> {
    pub physical: PhysicalAddress,
    /// Level of the block or page descriptor.
    pub level: u8,
    pub block_size: u64,
    pub attributes: T,
    /// Protection accumulated from the table descriptors on the way down.
    pub inherited: TableProtection,
}

/// Arena of every table of one address space.
pub struct TranslationTables<A: Architecture> {
    config: AddressSpaceConfig,
    tables: Vec<TranslationTable<A::Descriptor>>,
    by_address: BTreeMap<PhysicalAddress, TableHandle>,
    _arch: PhantomData<A>,
}

impl<A: Architecture> TranslationTables<A> {
    /// Allocates the root table described by `config`.
    ///
    /// # Errors
    /// [`MmuError::OutOfResources`] if the allocator cannot provide the root.
    pub fn new<P: PageAllocator>(alloc: &mut P, config: AddressSpaceConfig) -> Result<Self, MmuError> {
        let mut tables = Self {
            config,
            tables: Vec::new(),
            by_address: BTreeMap::new(),
            _arch: PhantomData,
        };
        tables.push_table(alloc, config.root_level, config.root_entry_count)?;
        Ok(tables)
    }

    /// Allocates an empty (all invalid) table for `level`.
    ///
    /// # Errors
    /// [`MmuError::OutOfResources`] if the allocator is exhausted.
    pub fn allocate_table<P: PageAllocator>(&mut self, alloc: &mut P, level: u8) -> Result<TableHandle, MmuError> {
        if level <= self.config.root_level || level > A::LEAF_LEVEL {
            return Err(ParameterError::InvalidLevel { level }.into());
        }
        self.push_table(alloc, level, A::table_entries(level))
    }

    fn push_table<P: PageAllocator>(
        &mut self,
        alloc: &mut P,
        level: u8,
        entries: usize,
    ) -> Result<TableHandle, MmuError> {
        let bytes = (entries * <A::Descriptor as RawDescriptor>::BYTES) as u64;
        let pages = bytes.div_ceil(PAGE_SIZE).max(1);
        let pages = usize::try_from(pages).map_err(|_| MmuError::OutOfResources { level })?;
        let alignment = A::table_alignment(level).max(PAGE_SIZE);

        let base = alloc
            .allocate_pages(pages, alignment)
            .ok_or(MmuError::OutOfResources { level })?;

        let handle = TableHandle(self.tables.len());
        self.tables.push(TranslationTable {
            base,
            level,
            pages,
            entries: vec![<A::Descriptor as RawDescriptor>::INVALID; entries].into_boxed_slice(),
        });
        self.by_address.insert(base, handle);
        log::trace!("{} level {level} table {} at {base}", A::NAME, handle.0);
        Ok(handle)
    }

    #[must_use]
    pub const fn config(&self) -> AddressSpaceConfig {
        self.config
    }

    /// Physical address of the root table, as written to `TTBR0`.
    #[must_use]
    pub fn root_address(&self) -> PhysicalAddress {
        self.tables[TableHandle::ROOT.0].base
    }

    /// Bytes occupied by the root table descriptors.
    #[must_use]
    pub const fn root_size_bytes(&self) -> usize {
        self.config.root_entry_count * <A::Descriptor as RawDescriptor>::BYTES
    }

    #[must_use]
    pub fn table(&self, handle: TableHandle) -> &TranslationTable<A::Descriptor> {
        &self.tables[handle.0]
    }

    pub(crate) fn table_mut(&mut self, handle: TableHandle) -> &mut TranslationTable<A::Descriptor> {
        &mut self.tables[handle.0]
    }

    /// Table whose physical base is `address`.
    ///
    /// # Errors
    /// [`UnsupportedError::ForeignTable`] if no table of this arena lives there.
    pub fn handle_of(&self, address: PhysicalAddress) -> Result<TableHandle, MmuError> {
        self.by_address
            .get(&address)
            .copied()
            .ok_or_else(|| UnsupportedError::ForeignTable(address).into())
    }

    /// Tables in allocation order, root first.
    pub fn iter(&self) -> impl Iterator<Item = &TranslationTable<A::Descriptor>> {
        self.tables.iter()
    }

    /// Number of tables, the root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Total pages reserved for tables.
    #[must_use]
    pub fn pages(&self) -> usize {
        self.tables.iter().map(|t| t.pages).sum()
    }

    /// Entry index of `va` in a table at `level` with `entries` slots.
    ///
    /// # Errors
    /// [`ParameterError::OutsideRootTable`] if the root table does not reach `va`.
    pub(crate) fn index_of(&self, handle: TableHandle, va: VirtualAddress) -> Result<usize, MmuError> {
        let table = &self.tables[handle.0];
        let entries = table.entries.len();
        let slot = va.as_u64() >> A::level_shift(table.level);
        if handle == TableHandle::ROOT {
            return usize::try_from(slot)
                .ok()
                .filter(|index| *index < entries)
                .ok_or_else(|| {
                    ParameterError::OutsideRootTable {
                        address: va,
                        level: table.level,
                        entries,
                    }
                    .into()
                });
        }
        #[allow(clippy::cast_possible_truncation)]
        let index = (slot as usize) & (entries - 1);
        Ok(index)
    }

    /// Walks the staged tables for `va`.
    ///
    /// Returns `None` if the address faults.
    #[must_use]
    pub fn translate(&self, va: VirtualAddress) -> Option<Translation<A::Attributes>> {
        let mut handle = TableHandle::ROOT;
        let mut inherited = TableProtection::NONE;
        loop {
            let index = self.index_of(handle, va).ok()?;
            let table = &self.tables[handle.0];
            match A::decode(table.entries[index], table.level) {
                DescriptorEntry::Invalid => return None,
                DescriptorEntry::Table { address, protection } => {
                    inherited = inherited.union(protection);
                    handle = self.by_address.get(&address).copied()?;
                }
                DescriptorEntry::Block { address, attributes } => {
                    let block_size = A::block_size(table.level);
                    return Some(Translation {
                        physical: address + (va.as_u64() & (block_size - 1)),
                        level: table.level,
                        block_size,
                        attributes,
                        inherited,
                    });
                }
            }
        }
    }

    /// UEFI capability mask of the page containing `va`.
    ///
    /// # Errors
    /// - [`ParameterError::NotMapped`] if `va` faults.
    /// - [`UnsupportedError::DescriptorAttributes`] if the descriptor uses a
    ///   memory type outside the supported set.
    pub fn capabilities_at(&self, va: VirtualAddress) -> Result<MemoryAttribute, MmuError> {
        let t = self.translate(va).ok_or(ParameterError::NotMapped { address: va })?;
        A::effective_capabilities(t.attributes, t.inherited)
    }

    /// Region attribute of the page containing `va`.
    ///
    /// # Errors
    /// See [`capabilities_at`](Self::capabilities_at).
    pub fn region_attribute_at(&self, va: VirtualAddress) -> Result<RegionAttribute, MmuError> {
        let t = self.translate(va).ok_or(ParameterError::NotMapped { address: va })?;
        A::classify(t.attributes, t.inherited)
    }

    /// Writes every staged table to its physical pages.
    ///
    /// # Safety
    /// `mapper` must give exclusive, writable access to the pages allocated
    /// for this arena, and the MMU must not be walking them.
    pub unsafe fn commit<M: PhysMapper>(&self, mapper: &M) {
        for table in &self.tables {
            let target = unsafe { mapper.table_mut::<A::Descriptor>(table.base, table.entries.len()) };
            target.copy_from_slice(&table.entries);
        }
        log::debug!(
            "Committed {} {} tables ({} pages), root at {}",
            self.tables.len(),
            A::NAME,
            self.pages(),
            self.root_address()
        );
    }

    /// Frees every table page, most recent first.
    pub fn release<P: PageAllocator>(self, alloc: &mut P) {
        for table in self.tables.iter().rev() {
            alloc.free_pages(table.base, table.pages);
        }
        log::debug!("Released {} {} tables", self.tables.len(), A::NAME);
    }
}

impl<A: Architecture> core::fmt::Debug for TranslationTables<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TranslationTables")
            .field("arch", &A::NAME)
            .field("config", &self.config)
            .field("tables", &self.tables.len())
            .field("root", &self.root_address())
            .finish()
    }
}
