//! # Set/Way Operand Generation
//!
//! `DC CISW` (AArch64) and `DCCISW` (ARMv7) take a single operand encoding
//! the cache level, the set and the way:
//!
//! ```text
//! | 31 ‒ 32-A | L-1 ‒ ... | ... | 3 ‒ 1 | 0 |
//! |    Way    |    Set    |     | Level | 0 |
//! ```
//!
//! with `A = ceil(log2(ways))` and `L = log2(line length in bytes)`.

use bitfield_struct::bitfield;

/// `CLIDR` — Cache Level ID Register.
#[bitfield(u64)]
pub struct Clidr {
    /// Bits 0–20 — `Ctype1` to `Ctype7`, three bits per level.
    #[bits(21)]
    pub cache_types: u32,

    /// Bits 21–23 — `LoUIS`.
    #[bits(3)]
    pub level_of_unification_is: u8,

    /// Bits 24–26 — `LoC`: Level of Coherency.
    #[bits(3)]
    pub level_of_coherency: u8,

    /// Bits 27–29 — `LoUU`.
    #[bits(3)]
    pub level_of_unification_uni: u8,

    /// Bits 30–63 — Not modelled.
    #[bits(34)]
    _bits_30_63: u64,
}

/// Cache implemented at one level, as reported by `CLIDR.Ctype<n>`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CacheType {
    None,
    InstructionOnly,
    DataOnly,
    Separate,
    Unified,
    Reserved,
}

impl CacheType {
    /// Whether set/way data cache maintenance applies to this level.
    #[must_use]
    pub const fn has_data(self) -> bool {
        matches!(self, Self::DataOnly | Self::Separate | Self::Unified)
    }
}

impl Clidr {
    /// Cache type of the zero-based `level` (`0` is L1).
    #[must_use]
    pub fn cache_type(self, level: u8) -> CacheType {
        if level >= 7 {
            return CacheType::None;
        }
        match (self.cache_types() >> (3 * u32::from(level))) & 0b111 {
            0b000 => CacheType::None,
            0b001 => CacheType::InstructionOnly,
            0b010 => CacheType::DataOnly,
            0b011 => CacheType::Separate,
            0b100 => CacheType::Unified,
            _ => CacheType::Reserved,
        }
    }
}

/// `CCSIDR` — Current Cache Size ID Register (32-bit format).
#[bitfield(u32)]
pub struct Ccsidr {
    /// Bits 0–2 — `log2(words per line) - 2`.
    #[bits(3)]
    pub line_size: u8,

    /// Bits 3–12 — Associativity minus one.
    #[bits(10)]
    pub associativity: u16,

    /// Bits 13–27 — Number of sets minus one.
    #[bits(15)]
    pub num_sets: u16,

    /// Bits 28–31 — Write policy support flags.
    #[bits(4)]
    _flags: u8,
}

/// Geometry of a single cache level.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CacheGeometry {
    /// Zero-based cache level.
    pub level: u8,
    /// `log2` of the line length in bytes.
    pub line_shift: u32,
    pub ways: u32,
    pub sets: u32,
}

impl CacheGeometry {
    #[must_use]
    pub fn from_ccsidr(level: u8, ccsidr: Ccsidr) -> Self {
        Self {
            level,
            line_shift: u32::from(ccsidr.line_size()) + 4,
            ways: u32::from(ccsidr.associativity()) + 1,
            sets: u32::from(ccsidr.num_sets()) + 1,
        }
    }

    /// Iterates the `DC CISW` operands covering the whole level.
    #[must_use]
    pub const fn operands(self) -> SetWayOperands {
        SetWayOperands {
            geometry: self,
            way: 0,
            set: 0,
        }
    }
}

/// Iterator over every set/way operand of one cache level.
pub struct SetWayOperands {
    geometry: CacheGeometry,
    way: u32,
    set: u32,
}

impl Iterator for SetWayOperands {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        let g = self.geometry;
        if self.way >= g.ways {
            return None;
        }

        // The way field is left-aligned; a direct-mapped cache has none.
        let way_bits = u32::BITS - (g.ways - 1).leading_zeros();
        let way = if way_bits == 0 {
            0
        } else {
            self.way << (u32::BITS - way_bits)
        };
        let operand = way | (self.set << g.line_shift) | (u32::from(g.level) << 1);

        self.set += 1;
        if self.set == g.sets {
            self.set = 0;
            self.way += 1;
        }
        Some(operand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clidr_reports_levels() {
        // L1 separate, L2 unified, LoC = 2.
        let clidr = Clidr::from_bits((0b100 << 3) | 0b011 | (2 << 24));
        assert_eq!(clidr.cache_type(0), CacheType::Separate);
        assert_eq!(clidr.cache_type(1), CacheType::Unified);
        assert_eq!(clidr.cache_type(2), CacheType::None);
        assert_eq!(clidr.level_of_coherency(), 2);
        assert!(clidr.cache_type(1).has_data());
    }

    #[test]
    fn operands_cover_every_set_and_way() {
        // 32 KiB, 4-way, 64-byte lines: 128 sets.
        let ccsidr = Ccsidr::new()
            .with_line_size(2)
            .with_associativity(3)
            .with_num_sets(127);
        let geometry = CacheGeometry::from_ccsidr(0, ccsidr);
        assert_eq!(geometry.line_shift, 6);

        let ops: Vec<u32> = geometry.operands().collect();
        assert_eq!(ops.len(), 4 * 128);
        assert_eq!(ops[0], 0);
        assert_eq!(ops[1], 1 << 6);
        assert_eq!(ops[128], 1 << 30);
        assert_eq!(ops[ops.len() - 1], (3 << 30) | (127 << 6));
    }

    #[test]
    fn level_is_encoded_in_bits_1_to_3() {
        let ccsidr = Ccsidr::new().with_line_size(2).with_associativity(0).with_num_sets(0);
        let ops: Vec<u32> = CacheGeometry::from_ccsidr(1, ccsidr).operands().collect();
        assert_eq!(ops, [2]);
    }
}
