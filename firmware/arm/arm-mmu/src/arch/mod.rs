//! # Architecture Profiles
//!
//! The table builder is written once against [`Architecture`]; each profile
//! supplies the table geometry and the descriptor encoding.
//!
//! | | [`Aarch64`] | [`Armv7`] |
//! |---|---|---|
//! | Descriptor | `u64` (long) | `u32` (short) |
//! | Levels | 0 ‒ 3 | 1 ‒ 2 |
//! | Entries per table | 512 | 4096 (L1), 256 (L2) |
//! | Block sizes | 1 GiB, 2 MiB, 4 KiB | 1 MiB, 4 KiB |
//! | Root | sized from the address range | fixed level 1 |

mod aarch64;
mod armv7;

pub use aarch64::{Aarch64, LongDescriptor, attr_index, shareability};
pub use armv7::{Armv7, PageTableDescriptor, SectionDescriptor, ShortAttributes, SmallPageDescriptor};

use crate::attributes::{NON_SECURE, RegionAttribute};
use crate::descriptor::{DescriptorEntry, RawDescriptor, TableProtection};
use crate::error::MmuError;
use crate::sizer::AddressSpaceConfig;
use core::fmt;
use uefi::boot::MemoryAttribute;

/// Table geometry and descriptor encoding of one translation table format.
pub trait Architecture: Sized + 'static {
    /// Storage word of one table entry.
    type Descriptor: RawDescriptor;

    /// Attribute word of a block or page, without address and type bits.
    type Attributes: Copy + Eq + fmt::Debug;

    /// Human readable name used in log output.
    const NAME: &'static str;

    /// Coarsest level at which a block descriptor is permitted.
    const MIN_BLOCK_LEVEL: u8;

    /// Finest level; every valid entry here maps a page.
    const LEAF_LEVEL: u8;

    /// `log2` of the bytes covered by one entry at `level`.
    fn level_shift(level: u8) -> u32;

    /// Entries in a non-root table at `level`.
    fn table_entries(level: u8) -> usize;

    /// Required alignment in bytes of a table at `level`.
    fn table_alignment(level: u8) -> u64;

    /// Shape of the root table able to translate `max_address`.
    ///
    /// # Errors
    /// [`UnsupportedError::AddressRange`](crate::UnsupportedError::AddressRange)
    /// when `max_address` is beyond what the format can translate.
    fn address_space(max_address: u64) -> Result<AddressSpaceConfig, MmuError>;

    fn decode(raw: Self::Descriptor, level: u8) -> DescriptorEntry<Self::Attributes>;

    fn encode(entry: DescriptorEntry<Self::Attributes>, level: u8) -> Self::Descriptor;

    /// Descriptor attributes of a region.
    fn region_attributes(attribute: RegionAttribute) -> Self::Attributes;

    /// Adds the access flag, if the format has one.
    fn mark_accessed(attributes: Self::Attributes) -> Self::Attributes;

    /// Table-level protection a split block needs for what its replicated
    /// leaves cannot encode themselves.
    fn block_protection(attributes: Self::Attributes) -> TableProtection;

    /// Protection a newly created table needs so leaves with `attributes`
    /// beneath it behave as requested.
    fn table_protection_for(attributes: Self::Attributes) -> TableProtection;

    /// Capability mask described by the descriptor attributes alone.
    ///
    /// # Errors
    /// [`UnsupportedError::DescriptorAttributes`](crate::UnsupportedError::DescriptorAttributes)
    /// for memory types outside the four supported classes.
    fn capabilities(attributes: Self::Attributes) -> Result<MemoryAttribute, MmuError>;

    /// Bytes covered by one entry at `level`.
    #[inline]
    fn block_size(level: u8) -> u64 {
        1 << Self::level_shift(level)
    }

    /// Capability mask of a leaf, including protection inherited from the
    /// tables above it.
    ///
    /// # Errors
    /// See [`capabilities`](Self::capabilities).
    fn effective_capabilities(
        attributes: Self::Attributes,
        inherited: TableProtection,
    ) -> Result<MemoryAttribute, MmuError> {
        let mut mask = Self::capabilities(attributes)?;
        if inherited.execute_never || inherited.privileged_execute_never {
            mask |= MemoryAttribute::EXECUTE_PROTECT;
        }
        if inherited.non_secure {
            mask |= NON_SECURE;
        }
        Ok(mask)
    }

    /// Region attribute of a leaf.
    ///
    /// # Errors
    /// See [`capabilities`](Self::capabilities).
    fn classify(
        attributes: Self::Attributes,
        inherited: TableProtection,
    ) -> Result<RegionAttribute, MmuError> {
        RegionAttribute::from_capabilities(Self::effective_capabilities(attributes, inherited)?)
    }
}
