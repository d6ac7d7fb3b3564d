//! # Address Space Sizing
//!
//! The AArch64 `T0SZ` field selects how many input address bits the
//! `TTBR0` walk resolves. Fewer bits mean the walk starts at a lower level
//! and the root table has fewer entries:
//!
//! | `T0SZ` | Root level | Root entries |
//! |:------:|:----------:|:------------:|
//! | 16–24  | 0 | 512 … 2 |
//! | 25–33  | 1 | 512 … 2 |
//! | 34–39  | 2 | 512 … 16 |
//!
//! [`AddressSpaceConfig::for_max_address`] picks the largest `T0SZ` (the
//! smallest root table) that still covers a given address.

/// Shape of the root translation table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AddressSpaceConfig {
    /// Lookup level the hardware walk starts at.
    pub root_level: u8,
    /// Number of descriptors in the root table.
    pub root_entry_count: usize,
    /// AArch64 `T0SZ`; ARMv7 `TTBCR.N`.
    pub size_field: u8,
}

/// `T0SZ` bounds of one root level.
#[derive(Debug, Copy, Clone)]
struct LevelWidths {
    level: u8,
    min: u8,
    max: u8,
    /// `T0SZ` value at which the root table of this level has two entries.
    largest: u8,
}

/// 4 KiB granule root levels, narrowest `T0SZ` first.
const T0SZ_LEVELS: [LevelWidths; 3] = [
    LevelWidths {
        level: 0,
        min: 16,
        max: 24,
        largest: 24,
    },
    LevelWidths {
        level: 1,
        min: 25,
        max: 33,
        largest: 33,
    },
    LevelWidths {
        level: 2,
        min: 34,
        max: 39,
        largest: 42,
    },
];

/// Smallest `T0SZ` supported with a 4 KiB granule (48-bit input range).
pub const MIN_T0SZ: u8 = T0SZ_LEVELS[0].min;

/// Largest `T0SZ` supported with a 4 KiB granule (25-bit input range).
pub const MAX_T0SZ: u8 = T0SZ_LEVELS[T0SZ_LEVELS.len() - 1].max;

impl AddressSpaceConfig {
    /// Sizes an AArch64 `TTBR0` address space able to translate `max_address`.
    ///
    /// Total over `u64`: results are clamped to `T0SZ` 16..=39, so addresses
    /// at or above 2⁴⁸ yield a 48-bit space (callers reject those ranges
    /// separately) and tiny addresses yield the minimal 16-entry level 2 root.
    #[must_use]
    pub const fn for_max_address(max_address: u64) -> Self {
        let width = 64 - (highest_bit(max_address) + 1);
        let t0sz = if width < MIN_T0SZ {
            MIN_T0SZ
        } else if width > MAX_T0SZ {
            MAX_T0SZ
        } else {
            width
        };

        let mut selected = T0SZ_LEVELS[T0SZ_LEVELS.len() - 1];
        let mut i = 0;
        while i < T0SZ_LEVELS.len() {
            if T0SZ_LEVELS[i].max >= t0sz {
                selected = T0SZ_LEVELS[i];
                break;
            }
            i += 1;
        }

        Self {
            root_level: selected.level,
            root_entry_count: 1 << (selected.largest - t0sz + 1),
            size_field: t0sz,
        }
    }

    /// Size of the input address range in bits (AArch64).
    #[must_use]
    pub const fn input_bits(&self) -> u8 {
        64 - self.size_field
    }
}

/// Index of the highest set bit; `0` for `0`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub const fn highest_bit(value: u64) -> u8 {
    if value == 0 {
        0
    } else {
        (63 - value.leading_zeros()) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_gib_uses_level_1_with_four_entries() {
        let config = AddressSpaceConfig::for_max_address(0xFFFF_FFFF);
        assert_eq!(config.size_field, 32);
        assert_eq!(config.root_level, 1);
        assert_eq!(config.root_entry_count, 4);
    }

    #[test]
    fn full_48_bit_space_uses_level_0() {
        let config = AddressSpaceConfig::for_max_address((1 << 48) - 1);
        assert_eq!(config.size_field, 16);
        assert_eq!(config.root_level, 0);
        assert_eq!(config.root_entry_count, 512);
        assert_eq!(config.input_bits(), 48);
    }

    #[test]
    fn level_boundaries() {
        // 2^39 - 1: T0SZ 25, a full level 1 table.
        let config = AddressSpaceConfig::for_max_address((1 << 39) - 1);
        assert_eq!((config.root_level, config.root_entry_count), (1, 512));

        // 2^39: T0SZ 24, two level 0 entries.
        let config = AddressSpaceConfig::for_max_address(1 << 39);
        assert_eq!((config.root_level, config.root_entry_count), (0, 2));

        // 2^30 - 1: T0SZ 34, a full level 2 table.
        let config = AddressSpaceConfig::for_max_address((1 << 30) - 1);
        assert_eq!((config.root_level, config.root_entry_count), (2, 512));
    }

    #[test]
    fn tiny_addresses_clamp_to_t0sz_39() {
        for max in [0, 1, 0xFFF, 0x1FF_FFFF] {
            let config = AddressSpaceConfig::for_max_address(max);
            assert_eq!(config.size_field, MAX_T0SZ);
            assert_eq!((config.root_level, config.root_entry_count), (2, 16));
        }
    }

    #[test]
    fn root_is_a_power_of_two_no_larger_than_a_page() {
        for bit in 0..48 {
            for max in [1_u64 << bit, (1_u64 << bit) | ((1 << bit) - 1)] {
                let config = AddressSpaceConfig::for_max_address(max);
                assert!(config.root_entry_count.is_power_of_two());
                assert!(config.root_entry_count * 8 <= 4096, "max={max:#x}");
                // The root must reach the requested address.
                assert_eq!(max >> config.input_bits(), 0, "max={max:#x}");
            }
        }
    }
}
