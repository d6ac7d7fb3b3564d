use bitfield_struct::bitfield;

/// Attribute encodings for a `MAIR_ELx` slot.
pub mod mair_encoding {
    /// Device-nGnRnE memory.
    pub const DEVICE_NGNRNE: u8 = 0x00;
    /// Normal memory, inner and outer non-cacheable.
    pub const NORMAL_NON_CACHEABLE: u8 = 0x44;
    /// Normal memory, inner and outer write-through, read/write-allocate.
    pub const NORMAL_WRITE_THROUGH: u8 = 0xBB;
    /// Normal memory, inner and outer write-back, read/write-allocate.
    pub const NORMAL_WRITE_BACK: u8 = 0xFF;
}

/// `MAIR_ELx` — Memory Attribute Indirection Register.
///
/// Each leaf descriptor selects one of the eight slots through its
/// `AttrIndx` field.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct Mair {
    pub attr0: u8,
    pub attr1: u8,
    pub attr2: u8,
    pub attr3: u8,
    pub attr4: u8,
    pub attr5: u8,
    pub attr6: u8,
    pub attr7: u8,
}

impl Mair {
    /// Returns the encoding held by slot `index` (`0..8`).
    #[must_use]
    pub fn attr(self, index: u8) -> u8 {
        self.into_bits().to_le_bytes()[usize::from(index & 7)]
    }
}

crate::aarch64::banked_register_asm!(Mair, "mair");
