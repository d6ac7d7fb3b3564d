//! # ARMv7 Short Descriptors
//!
//! The level 1 table has 4096 entries, each a 1 MiB section or a pointer to
//! a 256-entry level 2 table of 4 KiB small pages. Large pages and
//! supersections are never created.
//!
//! ```text
//! Section      | 31 ‒ 20 base | 19 NS | 18 0 | 17 nG | 16 S | 15 AP2 | 14 ‒ 12 TEX | 11 ‒ 10 AP | 9 | 8 ‒ 5 Domain | 4 XN | 3 C | 2 B | 1 1 | 0 PXN |
//! Page table   | 31 ‒ 10 base                                  | 9 | 8 ‒ 5 Domain | 4 | 3 NS | 2 PXN | 1 0 | 0 1 |
//! Small page   | 31 ‒ 12 base | 11 nG | 10 S | 9 AP2 | 8 ‒ 6 TEX | 5 ‒ 4 AP | 3 C | 2 B | 1 1 | 0 XN |
//! ```
//!
//! Small pages have neither `NS` nor `PXN`; both come from the level 1
//! page table descriptor above them.

use super::Architecture;
use crate::PhysicalAddress;
use crate::attributes::{Cacheability, NON_SECURE, RegionAttribute};
use crate::descriptor::{DescriptorEntry, TableProtection};
use crate::error::{MmuError, UnsupportedError};
use crate::sizer::AddressSpaceConfig;
use bitfield_struct::bitfield;
use uefi::boot::MemoryAttribute;

/// Number of level 1 entries with `TTBCR.N = 0`.
const LEVEL1_ENTRIES: usize = 4096;

/// Number of level 2 entries.
const LEVEL2_ENTRIES: usize = 256;

/// Read/write at any privilege (`AP[2:0] = 0b011`).
const AP_READ_WRITE: u8 = 0b011;

/// Level 1 section descriptor (1 MiB).
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct SectionDescriptor {
    /// Bit 0 — `PXN`.
    pub privileged_execute_never: bool,
    /// Bit 1 — Always set for a section.
    pub section: bool,
    /// Bit 2 — `B`.
    pub bufferable: bool,
    /// Bit 3 — `C`.
    pub cacheable: bool,
    /// Bit 4 — `XN`.
    pub execute_never: bool,
    /// Bits 5–8 — Domain.
    #[bits(4)]
    pub domain: u8,
    /// Bit 9 — Implementation defined.
    pub imp: bool,
    /// Bits 10–11 — `AP[1:0]`.
    #[bits(2)]
    pub ap: u8,
    /// Bits 12–14 — `TEX[2:0]`.
    #[bits(3)]
    pub tex: u8,
    /// Bit 15 — `AP[2]`.
    pub ap2: bool,
    /// Bit 16 — `S`: shareable.
    pub shareable: bool,
    /// Bit 17 — `nG`.
    pub not_global: bool,
    /// Bit 18 — Supersection; always clear.
    #[bits(default = false)]
    _supersection: bool,
    /// Bit 19 — `NS`.
    pub non_secure: bool,
    /// Bits 20–31 — Section base address `[31:20]`.
    #[bits(12)]
    pub base: u16,
}

/// Level 1 descriptor pointing to a level 2 table.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct PageTableDescriptor {
    /// Bit 0 — Always set for a page table.
    pub page_table: bool,
    /// Bit 1 — Always clear for a page table.
    #[bits(default = false)]
    _zero: bool,
    /// Bit 2 — `PXN`.
    pub privileged_execute_never: bool,
    /// Bit 3 — `NS`.
    pub non_secure: bool,
    /// Bit 4 — Should be zero.
    #[bits(default = false)]
    _sbz: bool,
    /// Bits 5–8 — Domain.
    #[bits(4)]
    pub domain: u8,
    /// Bit 9 — Implementation defined.
    pub imp: bool,
    /// Bits 10–31 — Level 2 table base address `[31:10]`.
    #[bits(22)]
    pub base: u32,
}

/// Level 2 small page descriptor (4 KiB).
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct SmallPageDescriptor {
    /// Bit 0 — `XN`.
    pub execute_never: bool,
    /// Bit 1 — Always set for a small page.
    pub small_page: bool,
    /// Bit 2 — `B`.
    pub bufferable: bool,
    /// Bit 3 — `C`.
    pub cacheable: bool,
    /// Bits 4–5 — `AP[1:0]`.
    #[bits(2)]
    pub ap: u8,
    /// Bits 6–8 — `TEX[2:0]`.
    #[bits(3)]
    pub tex: u8,
    /// Bit 9 — `AP[2]`.
    pub ap2: bool,
    /// Bit 10 — `S`.
    pub shareable: bool,
    /// Bit 11 — `nG`.
    pub not_global: bool,
    /// Bits 12–31 — Page base address `[31:12]`.
    #[bits(20)]
    pub base: u32,
}

/// Level-independent attributes of a section or small page.
#[bitfield(u32)]
#[derive(PartialEq, Eq, Hash)]
pub struct ShortAttributes {
    #[bits(3)]
    pub tex: u8,
    pub cacheable: bool,
    pub bufferable: bool,
    /// `AP[2:0]`.
    #[bits(3)]
    pub access_permissions: u8,
    pub execute_never: bool,
    /// Only representable in sections.
    pub privileged_execute_never: bool,
    pub shareable: bool,
    pub not_global: bool,
    /// Only representable in sections.
    pub non_secure: bool,
    #[bits(4)]
    pub domain: u8,
    #[bits(15)]
    __unused: u16,
}

impl ShortAttributes {
    #[must_use]
    pub const fn is_read_only(self) -> bool {
        self.access_permissions() & 0b100 != 0
    }

    fn from_section(d: SectionDescriptor) -> Self {
        Self::new()
            .with_tex(d.tex())
            .with_cacheable(d.cacheable())
            .with_bufferable(d.bufferable())
            .with_access_permissions((u8::from(d.ap2()) << 2) | d.ap())
            .with_execute_never(d.execute_never())
            .with_privileged_execute_never(d.privileged_execute_never())
            .with_shareable(d.shareable())
            .with_not_global(d.not_global())
            .with_non_secure(d.non_secure())
            .with_domain(d.domain())
    }

    fn from_small_page(d: SmallPageDescriptor) -> Self {
        Self::new()
            .with_tex(d.tex())
            .with_cacheable(d.cacheable())
            .with_bufferable(d.bufferable())
            .with_access_permissions((u8::from(d.ap2()) << 2) | d.ap())
            .with_execute_never(d.execute_never())
            .with_shareable(d.shareable())
            .with_not_global(d.not_global())
    }
}

/// ARMv7-A short-descriptor translation (`TTBCR.N = 0`, no LPAE).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Armv7;

impl Architecture for Armv7 {
    type Descriptor = u32;
    type Attributes = ShortAttributes;

    const NAME: &'static str = "ARMv7";
    const MIN_BLOCK_LEVEL: u8 = 1;
    const LEAF_LEVEL: u8 = 2;

    #[inline]
    fn level_shift(level: u8) -> u32 {
        if level == 1 { 20 } else { 12 }
    }

    #[inline]
    fn table_entries(level: u8) -> usize {
        if level == 1 {
            LEVEL1_ENTRIES
        } else {
            LEVEL2_ENTRIES
        }
    }

    #[inline]
    fn table_alignment(level: u8) -> u64 {
        if level == 1 { 16 << 10 } else { 1 << 10 }
    }

    fn address_space(max_address: u64) -> Result<AddressSpaceConfig, MmuError> {
        if max_address > u64::from(u32::MAX) {
            return Err(UnsupportedError::AddressRange { max_address }.into());
        }
        Ok(AddressSpaceConfig {
            root_level: 1,
            root_entry_count: LEVEL1_ENTRIES,
            size_field: 0,
        })
    }

    fn decode(raw: u32, level: u8) -> DescriptorEntry<ShortAttributes> {
        if level == 1 {
            match raw & 0b11 {
                0b00 => DescriptorEntry::Invalid,
                0b01 => {
                    let d = PageTableDescriptor::from_bits(raw);
                    DescriptorEntry::Table {
                        address: PhysicalAddress::new(u64::from(d.base()) << 10),
                        protection: TableProtection {
                            execute_never: false,
                            privileged_execute_never: d.privileged_execute_never(),
                            non_secure: d.non_secure(),
                        },
                    }
                }
                _ => {
                    let d = SectionDescriptor::from_bits(raw);
                    DescriptorEntry::Block {
                        address: PhysicalAddress::new(u64::from(d.base()) << 20),
                        attributes: ShortAttributes::from_section(d),
                    }
                }
            }
        } else {
            // `0b01` would be a 64 KiB large page, which is never written.
            if raw & 0b10 == 0 {
                return DescriptorEntry::Invalid;
            }
            let d = SmallPageDescriptor::from_bits(raw);
            DescriptorEntry::Block {
                address: PhysicalAddress::new(u64::from(d.base()) << 12),
                attributes: ShortAttributes::from_small_page(d),
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn encode(entry: DescriptorEntry<ShortAttributes>, level: u8) -> u32 {
        match entry {
            DescriptorEntry::Invalid => 0,
            DescriptorEntry::Table {
                address,
                protection,
            } => PageTableDescriptor::new()
                .with_page_table(true)
                .with_privileged_execute_never(protection.privileged_execute_never)
                .with_non_secure(protection.non_secure)
                .with_base((address.as_u64() >> 10) as u32)
                .into_bits(),
            DescriptorEntry::Block {
                address,
                attributes: a,
            } if level == 1 => SectionDescriptor::new()
                .with_section(true)
                .with_privileged_execute_never(a.privileged_execute_never())
                .with_bufferable(a.bufferable())
                .with_cacheable(a.cacheable())
                .with_execute_never(a.execute_never())
                .with_domain(a.domain())
                .with_ap(a.access_permissions() & 0b11)
                .with_tex(a.tex())
                .with_ap2(a.is_read_only())
                .with_shareable(a.shareable())
                .with_not_global(a.not_global())
                .with_non_secure(a.non_secure())
                .with_base((address.as_u64() >> 20) as u16)
                .into_bits(),
            DescriptorEntry::Block {
                address,
                attributes: a,
            } => SmallPageDescriptor::new()
                .with_execute_never(a.execute_never())
                .with_small_page(true)
                .with_bufferable(a.bufferable())
                .with_cacheable(a.cacheable())
                .with_ap(a.access_permissions() & 0b11)
                .with_tex(a.tex())
                .with_ap2(a.is_read_only())
                .with_shareable(a.shareable())
                .with_not_global(a.not_global())
                .with_base((address.as_u64() >> 12) as u32)
                .into_bits(),
        }
    }

    fn region_attributes(attribute: RegionAttribute) -> ShortAttributes {
        let a = ShortAttributes::new().with_access_permissions(AP_READ_WRITE);
        let a = match attribute.cacheability() {
            // Outer and inner write-back, write-allocate.
            Cacheability::WriteBack => a
                .with_tex(0b001)
                .with_cacheable(true)
                .with_bufferable(true)
                .with_shareable(true),
            // Outer and inner write-through, no write-allocate.
            Cacheability::WriteThrough => a.with_tex(0b000).with_cacheable(true).with_shareable(true),
            // Normal, outer and inner non-cacheable.
            Cacheability::Uncached => a.with_tex(0b001),
            // Shareable device.
            Cacheability::Device => a.with_tex(0b000).with_bufferable(true).with_execute_never(true),
        };
        a.with_non_secure(attribute.is_non_secure())
    }

    fn mark_accessed(attributes: ShortAttributes) -> ShortAttributes {
        // `SCTLR.AFE` stays clear; `AP[0]` is a permission bit, not an access flag.
        attributes
    }

    fn block_protection(attributes: ShortAttributes) -> TableProtection {
        TableProtection {
            execute_never: false,
            privileged_execute_never: attributes.privileged_execute_never(),
            non_secure: attributes.non_secure(),
        }
    }

    fn table_protection_for(attributes: ShortAttributes) -> TableProtection {
        TableProtection {
            non_secure: attributes.non_secure(),
            ..TableProtection::NONE
        }
    }

    fn capabilities(attributes: ShortAttributes) -> Result<MemoryAttribute, MmuError> {
        let tex_c_b = (
            attributes.tex(),
            attributes.cacheable(),
            attributes.bufferable(),
        );
        let mut mask = match tex_c_b {
            // Strongly-ordered, shareable device, non-shareable device.
            (0b000, false, false | true) | (0b010, false, false) => MemoryAttribute::UNCACHEABLE,
            (0b000, true, false) => MemoryAttribute::WRITE_THROUGH,
            (0b000, true, true) | (0b001, true, true) => MemoryAttribute::WRITE_BACK,
            (0b001, false, false) => MemoryAttribute::WRITE_COMBINE,
            _ => {
                return Err(UnsupportedError::DescriptorAttributes(u64::from(attributes.into_bits())).into());
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

    #[test]
    fn write_back_section_bits() {
        let attrs = Armv7::region_attributes(RegionAttribute::WriteBack);
        let raw = Armv7::encode(
            DescriptorEntry::Block {
                address: PhysicalAddress::new(0x8010_0000),
                attributes: attrs,
            },
            1,
        );
        // Section, B, C, AP[1:0] = 0b11, TEX = 0b001, S.
        let expected = 0x8010_0000 | 0b10 | (1 << 2) | (1 << 3) | (0b11 << 10) | (0b001 << 12) | (1 << 16);
        assert_eq!(raw, expected);
        assert_eq!(
            Armv7::decode(raw, 1),
            DescriptorEntry::Block {
                address: PhysicalAddress::new(0x8010_0000),
                attributes: attrs,
            }
        );
    }

    #[test]
    fn device_small_page_bits() {
        let attrs = Armv7::region_attributes(RegionAttribute::Device);
        let raw = Armv7::encode(
            DescriptorEntry::Block {
                address: PhysicalAddress::new(0x3F20_1000),
                attributes: attrs,
            },
            2,
        );
        // XN, small page, B, AP[1:0] = 0b11.
        assert_eq!(raw, 0x3F20_1000 | 0b1 | 0b10 | (1 << 2) | (0b11 << 4));
    }

    #[test]
    fn non_secure_pages_take_ns_from_the_page_table() {
        let attrs = Armv7::region_attributes(RegionAttribute::NonSecureWriteBack);
        let protection = Armv7::table_protection_for(attrs);
        assert!(protection.non_secure);

        let table = Armv7::encode(
            DescriptorEntry::Table {
                address: PhysicalAddress::new(0x8000_4400),
                protection,
            },
            1,
        );
        assert_eq!(table, 0x8000_4400 | 0b01 | (1 << 3));

        let page = Armv7::encode(
            DescriptorEntry::Block {
                address: PhysicalAddress::new(0x1000),
                attributes: attrs,
            },
            2,
        );
        let DescriptorEntry::Block { attributes, .. } = Armv7::decode(page, 2) else {
            panic!("expected a small page");
        };
        assert_eq!(Armv7::classify(attributes, TableProtection::NONE), Ok(RegionAttribute::WriteBack));
        assert_eq!(
            Armv7::classify(attributes, protection),
            Ok(RegionAttribute::NonSecureWriteBack)
        );
    }

    #[test]
    fn every_region_attribute_classifies_back_as_section() {
        for attribute in RegionAttribute::ALL {
            let raw = Armv7::encode(
                DescriptorEntry::Block {
                    address: PhysicalAddress::new(0x0010_0000),
                    attributes: Armv7::region_attributes(attribute),
                },
                1,
            );
            let DescriptorEntry::Block { attributes, .. } = Armv7::decode(raw, 1) else {
                panic!("expected a section");
            };
            assert_eq!(Armv7::classify(attributes, TableProtection::NONE), Ok(attribute));
        }
    }

    #[test]
    fn read_only_and_reserved_encodings() {
        let ro = Armv7::region_attributes(RegionAttribute::WriteThrough).with_access_permissions(0b111);
        assert_eq!(
            Armv7::capabilities(ro),
            Ok(MemoryAttribute::WRITE_THROUGH | MemoryAttribute::WRITE_PROTECT)
        );

        let reserved = ShortAttributes::new().with_tex(0b011);
        assert!(Armv7::capabilities(reserved).is_err());
    }

    #[test]
    fn only_32_bit_addresses_are_translatable() {
        let config = Armv7::address_space(0xFFFF_FFFF).unwrap();
        assert_eq!((config.root_level, config.root_entry_count), (1, 4096));
        assert!(Armv7::address_space(0x1_0000_0000).is_err());
    }
}
