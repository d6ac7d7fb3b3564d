//! # AArch64 Long Descriptors (4 KiB granule)
//!
//! ```text
//! | 63 ‒ 59 | 58 ‒ 55 | 54 | 53  | 52 ‒ 48 | 47 ‒ 12        | 11 | 10 | 9 ‒ 8 | 7 ‒ 6 | 5  | 4 ‒ 2    | 1 | 0 |
//! | table   | SW      | XN | PXN | res     | output address | nG | AF | SH    | AP    | NS | AttrIndx | T | V |
//! ```
//!
//! Bit 1 (`T`) selects a table descriptor at levels 0 to 2 and is required
//! for a page at level 3. Blocks are only permitted at levels 1 and 2.

use super::Architecture;
use crate::attributes::{Cacheability, NON_SECURE, RegionAttribute};
use crate::descriptor::{DescriptorEntry, TableProtection};
use crate::error::{MmuError, UnsupportedError};
use crate::sizer::AddressSpaceConfig;
use bitfield_struct::bitfield;
use uefi::boot::MemoryAttribute;

/// `MAIR` slots referenced by `AttrIndx`.
pub mod attr_index {
    /// Device-nGnRnE.
    pub const DEVICE: u8 = 0;
    /// Normal, non-cacheable.
    pub const NON_CACHEABLE: u8 = 1;
    /// Normal, write-through.
    pub const WRITE_THROUGH: u8 = 2;
    /// Normal, write-back.
    pub const WRITE_BACK: u8 = 3;
}

/// `SH` encodings of a leaf descriptor.
pub mod shareability {
    pub const NON_SHAREABLE: u8 = 0b00;
    pub const OUTER_SHAREABLE: u8 = 0b10;
    pub const INNER_SHAREABLE: u8 = 0b11;
}

/// Translation ranges of 2⁴⁸ bytes and more need 52-bit addressing.
const MAX_INPUT_ADDRESS: u64 = 1 << 48;

/// A level 0 to 3 descriptor. Table and block fields overlay each other; which
/// ones are meaningful depends on [`table_or_page`](Self::table_or_page) and the level.
#[bitfield(u64)]
#[derive(PartialEq, Eq, Hash)]
pub struct LongDescriptor {
    /// Bit 0 — Valid.
    pub valid: bool,

    /// Bit 1 — Table (levels 0‒2) or page (level 3).
    pub table_or_page: bool,

    /// Bits 2–4 — `AttrIndx`: `MAIR` slot.
    #[bits(3)]
    pub attr_index: u8,

    /// Bit 5 — `NS`: output address is in the non-secure physical space.
    pub non_secure: bool,

    /// Bits 6–7 — `AP[2:1]`: bit 7 set means read-only.
    #[bits(2)]
    pub access_permissions: u8,

    /// Bits 8–9 — `SH`: shareability.
    #[bits(2)]
    pub shareability: u8,

    /// Bit 10 — `AF`: access flag; an access with `AF = 0` faults.
    pub access_flag: bool,

    /// Bit 11 — `nG`: not global.
    pub not_global: bool,

    /// Bits 12–47 — Output address bits `[47:12]`.
    #[bits(36)]
    pub output_frame: u64,

    /// Bits 48–51 — Reserved.
    #[bits(4)]
    __reserved_48_51: u8,

    /// Bit 52 — Contiguous hint.
    pub contiguous: bool,

    /// Bit 53 — `PXN`: privileged execute-never.
    pub privileged_execute_never: bool,

    /// Bit 54 — `UXN`/`XN`: execute-never.
    pub execute_never: bool,

    /// Bits 55–58 — Software use.
    #[bits(4)]
    pub software: u8,

    /// Bit 59 — `PXNTable`.
    pub pxn_table: bool,

    /// Bit 60 — `XNTable`.
    pub xn_table: bool,

    /// Bits 61–62 — `APTable`.
    #[bits(2)]
    pub ap_table: u8,

    /// Bit 63 — `NSTable`.
    pub ns_table: bool,
}

impl LongDescriptor {
    /// Strips the address, type and table-only fields, leaving the block attributes.
    #[must_use]
    pub const fn attributes(self) -> Self {
        self.with_valid(false)
            .with_table_or_page(false)
            .with_output_frame(0)
            .with_pxn_table(false)
            .with_xn_table(false)
            .with_ap_table(0)
            .with_ns_table(false)
    }

    #[must_use]
    pub const fn output_address(self) -> crate::PhysicalAddress {
        crate::PhysicalAddress::new(self.output_frame() << 12)
    }

    #[must_use]
    pub const fn is_read_only(self) -> bool {
        self.access_permissions() & 0b10 != 0
    }
}

/// AArch64 stage 1 translation with a 4 KiB granule.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Aarch64;

impl Architecture for Aarch64 {
    type Descriptor = u64;
    type Attributes = LongDescriptor;

    const NAME: &'static str = "AArch64";
    const MIN_BLOCK_LEVEL: u8 = 1;
    const LEAF_LEVEL: u8 = 3;

    #[inline]
    fn level_shift(level: u8) -> u32 {
        12 + 9 * u32::from(Self::LEAF_LEVEL - level)
    }

    #[inline]
    fn table_entries(_level: u8) -> usize {
        512
    }

    #[inline]
    fn table_alignment(_level: u8) -> u64 {
        4096
    }

    fn address_space(max_address: u64) -> Result<AddressSpaceConfig, MmuError> {
        if max_address >= MAX_INPUT_ADDRESS {
            return Err(UnsupportedError::AddressRange { max_address }.into());
        }
        Ok(AddressSpaceConfig::for_max_address(max_address))
    }

    fn decode(raw: u64, level: u8) -> DescriptorEntry<LongDescriptor> {
        let d = LongDescriptor::from_bits(raw);
        if !d.valid() {
            return DescriptorEntry::Invalid;
        }

        let address = d.output_address();
        if level == Self::LEAF_LEVEL {
            // Level 3 encoding `0b01` is reserved.
            return if d.table_or_page() {
                DescriptorEntry::Block {
                    address,
                    attributes: d.attributes(),
                }
            } else {
                DescriptorEntry::Invalid
            };
        }

        if d.table_or_page() {
            DescriptorEntry::Table {
                address,
                protection: TableProtection {
                    execute_never: d.xn_table(),
                    privileged_execute_never: d.pxn_table(),
                    non_secure: d.ns_table(),
                },
            }
        } else if level >= Self::MIN_BLOCK_LEVEL {
            DescriptorEntry::Block {
                address,
                attributes: d.attributes(),
            }
        } else {
            DescriptorEntry::Invalid
        }
    }

    fn encode(entry: DescriptorEntry<LongDescriptor>, level: u8) -> u64 {
        match entry {
            DescriptorEntry::Invalid => 0,
            DescriptorEntry::Table {
                address,
                protection,
            } => LongDescriptor::new()
                .with_valid(true)
                .with_table_or_page(true)
                .with_output_frame(address.as_u64() >> 12)
                .with_xn_table(protection.execute_never)
                .with_pxn_table(protection.privileged_execute_never)
                .with_ns_table(protection.non_secure)
                .into_bits(),
            DescriptorEntry::Block {
                address,
                attributes,
            } => attributes
                .attributes()
                .with_valid(true)
                .with_table_or_page(level == Self::LEAF_LEVEL)
                .with_output_frame(address.as_u64() >> 12)
                .into_bits(),
        }
    }

    fn region_attributes(attribute: RegionAttribute) -> LongDescriptor {
        let d = LongDescriptor::new();
        let d = match attribute.cacheability() {
            Cacheability::WriteBack => d
                .with_attr_index(attr_index::WRITE_BACK)
                .with_shareability(shareability::INNER_SHAREABLE),
            Cacheability::WriteThrough => d
                .with_attr_index(attr_index::WRITE_THROUGH)
                .with_shareability(shareability::INNER_SHAREABLE),
            Cacheability::Uncached => d.with_attr_index(attr_index::NON_CACHEABLE),
            Cacheability::Device => d
                .with_attr_index(attr_index::DEVICE)
                .with_execute_never(true)
                .with_privileged_execute_never(true),
        };
        d.with_non_secure(attribute.is_non_secure())
    }

    fn mark_accessed(attributes: LongDescriptor) -> LongDescriptor {
        attributes.with_access_flag(true)
    }

    fn block_protection(_attributes: LongDescriptor) -> TableProtection {
        // Leaves keep their own NS, XN and PXN bits.
        TableProtection::NONE
    }

    fn table_protection_for(_attributes: LongDescriptor) -> TableProtection {
        TableProtection::NONE
    }

    fn capabilities(attributes: LongDescriptor) -> Result<MemoryAttribute, MmuError> {
        let mut mask = match attributes.attr_index() {
            attr_index::DEVICE => MemoryAttribute::UNCACHEABLE,
            attr_index::NON_CACHEABLE => MemoryAttribute::WRITE_COMBINE,
            attr_index::WRITE_THROUGH => MemoryAttribute::WRITE_THROUGH,
            attr_index::WRITE_BACK => MemoryAttribute::WRITE_BACK,
            _ => {
                return Err(UnsupportedError::DescriptorAttributes(attributes.into_bits()).into());
            }
        };
        if attributes.is_read_only() {
            mask |= MemoryAttribute::WRITE_PROTECT;
        }
        if attributes.execute_never() || attributes.privileged_execute_never() {
            mask |= MemoryAttribute::EXECUTE_PROTECT;
        }
        if attributes.non_secure() {
            mask |= NON_SECURE;
        }
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PhysicalAddress;

    #[test]
    fn level_geometry() {
        assert_eq!(Aarch64::block_size(3), 4 << 10);
        assert_eq!(Aarch64::block_size(2), 2 << 20);
        assert_eq!(Aarch64::block_size(1), 1 << 30);
        assert_eq!(Aarch64::block_size(0), 512 << 30);
    }

    #[test]
    fn write_back_leaf_bits() {
        let attrs = Aarch64::mark_accessed(Aarch64::region_attributes(RegionAttribute::WriteBack));
        let raw = Aarch64::encode(
            DescriptorEntry::Block {
                address: PhysicalAddress::new(0x4020_0000),
                attributes: attrs,
            },
            2,
        );
        // Block, AttrIndx 3, SH inner, AF.
        assert_eq!(raw, 0x4020_0000 | 0b01 | (3 << 2) | (3 << 8) | (1 << 10));
    }

    #[test]
    fn page_and_table_share_the_type_bit() {
        let table = Aarch64::encode(
            DescriptorEntry::Table {
                address: PhysicalAddress::new(0x8000_1000),
                protection: TableProtection::NONE,
            },
            1,
        );
        assert_eq!(table, 0x8000_1000 | 0b11);
        assert!(Aarch64::decode(table, 1).is_table());
        assert!(!Aarch64::decode(table, 3).is_table());
        assert!(matches!(Aarch64::decode(0x8000_1000 | 0b01, 3), DescriptorEntry::Invalid));
        assert!(matches!(Aarch64::decode(0x8000_0000 | 0b01, 0), DescriptorEntry::Invalid));
    }

    #[test]
    fn table_protection_round_trips() {
        let protection = TableProtection {
            execute_never: true,
            privileged_execute_never: true,
            non_secure: true,
        };
        let raw = Aarch64::encode(
            DescriptorEntry::Table {
                address: PhysicalAddress::new(0x1000),
                protection,
            },
            0,
        );
        assert_eq!(raw >> 59, 0b10011);
        assert_eq!(
            Aarch64::decode(raw, 0),
            DescriptorEntry::Table {
                address: PhysicalAddress::new(0x1000),
                protection,
            }
        );
    }

    #[test]
    fn every_region_attribute_classifies_back() {
        for attribute in RegionAttribute::ALL {
            let attrs = Aarch64::mark_accessed(Aarch64::region_attributes(attribute));
            assert_eq!(Aarch64::classify(attrs, TableProtection::NONE), Ok(attribute));
        }
    }

    #[test]
    fn protection_folds_into_capabilities() {
        let attrs = Aarch64::region_attributes(RegionAttribute::WriteBack).with_access_permissions(0b10);
        let mask = Aarch64::capabilities(attrs).unwrap();
        assert_eq!(mask, MemoryAttribute::WRITE_BACK | MemoryAttribute::WRITE_PROTECT);

        let attrs = Aarch64::region_attributes(RegionAttribute::WriteThrough).with_privileged_execute_never(true);
        let mask = Aarch64::capabilities(attrs).unwrap();
        assert_eq!(mask, MemoryAttribute::WRITE_THROUGH | MemoryAttribute::EXECUTE_PROTECT);

        let device = Aarch64::capabilities(Aarch64::region_attributes(RegionAttribute::Device)).unwrap();
        assert_eq!(device, MemoryAttribute::UNCACHEABLE | MemoryAttribute::EXECUTE_PROTECT);
    }

    #[test]
    fn unknown_attr_index_is_unsupported() {
        let attrs = LongDescriptor::new().with_attr_index(5);
        assert!(matches!(
            Aarch64::capabilities(attrs),
            Err(MmuError::Unsupported(UnsupportedError::DescriptorAttributes(_)))
        ));
    }

    #[test]
    fn address_range_is_limited_to_48_bits() {
        assert!(Aarch64::address_space((1 << 48) - 1).is_ok());
        assert!(matches!(
            Aarch64::address_space(1 << 48),
            Err(MmuError::Unsupported(UnsupportedError::AddressRange { .. }))
        ));
    }
}
