//! # Region Attributes and Capability Masks
//!
//! Three vocabularies describe how a region of memory behaves:
//!
//! | Vocabulary | Type | Used by |
//! |------------|------|---------|
//! | Region attribute | [`RegionAttribute`] | Platform memory maps. |
//! | Capability mask | [`MemoryAttribute`] | Everything outside this crate (the UEFI `EFI_MEMORY_*` bits). |
//! | Descriptor bits | [`Architecture::Attributes`](crate::arch::Architecture::Attributes) | The translation tables. |
//!
//! This module maps region attributes to and from capability masks; the
//! descriptor encodings live with each [architecture profile](crate::arch).
//!
//! | Region | Capability |
//! |--------|------------|
//! | `WriteBack` | `WRITE_BACK` |
//! | `WriteThrough` | `WRITE_THROUGH` |
//! | `Uncached` | `WRITE_COMBINE` |
//! | `Device` | `UNCACHEABLE` |
//!
//! Non-secure variants additionally carry [`NON_SECURE`], a firmware-private
//! bit outside the UEFI-defined range, so the mapping is lossless for all
//! eight region attributes.

use crate::error::{MmuError, UnsupportedError};
use uefi::boot::MemoryAttribute;

/// Marks a capability mask as describing non-secure memory.
pub const NON_SECURE: MemoryAttribute = MemoryAttribute::from_bits_retain(1 << 40);

/// The capability bits that select a cacheability class.
pub const CACHEABILITY_MASK: MemoryAttribute = MemoryAttribute::UNCACHEABLE
    .union(MemoryAttribute::WRITE_COMBINE)
    .union(MemoryAttribute::WRITE_THROUGH)
    .union(MemoryAttribute::WRITE_BACK);

/// Caching class of a region, independent of its security state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Cacheability {
    WriteBack,
    WriteThrough,
    /// Normal memory, non-cacheable.
    Uncached,
    /// Device memory (non-gathering, non-reordering, no early acknowledge).
    Device,
}

/// Platform-neutral classification of a memory region.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RegionAttribute {
    WriteBack,
    NonSecureWriteBack,
    WriteThrough,
    NonSecureWriteThrough,
    Uncached,
    NonSecureUncached,
    Device,
    NonSecureDevice,
}

impl RegionAttribute {
    pub const ALL: [Self; 8] = [
        Self::WriteBack,
        Self::NonSecureWriteBack,
        Self::WriteThrough,
        Self::NonSecureWriteThrough,
        Self::Uncached,
        Self::NonSecureUncached,
        Self::Device,
        Self::NonSecureDevice,
    ];

    #[must_use]
    pub const fn new(cacheability: Cacheability, non_secure: bool) -> Self {
        match (cacheability, non_secure) {
            (Cacheability::WriteBack, false) => Self::WriteBack,
            (Cacheability::WriteBack, true) => Self::NonSecureWriteBack,
            (Cacheability::WriteThrough, false) => Self::WriteThrough,
            (Cacheability::WriteThrough, true) => Self::NonSecureWriteThrough,
            (Cacheability::Uncached, false) => Self::Uncached,
            (Cacheability::Uncached, true) => Self::NonSecureUncached,
            (Cacheability::Device, false) => Self::Device,
            (Cacheability::Device, true) => Self::NonSecureDevice,
        }
    }

    #[must_use]
    pub const fn cacheability(self) -> Cacheability {
        match self {
            Self::WriteBack | Self::NonSecureWriteBack => Cacheability::WriteBack,
            Self::WriteThrough | Self::NonSecureWriteThrough => Cacheability::WriteThrough,
            Self::Uncached | Self::NonSecureUncached => Cacheability::Uncached,
            Self::Device | Self::NonSecureDevice => Cacheability::Device,
        }
    }

    #[must_use]
    pub const fn is_non_secure(self) -> bool {
        matches!(
            self,
            Self::NonSecureWriteBack
                | Self::NonSecureWriteThrough
                | Self::NonSecureUncached
                | Self::NonSecureDevice
        )
    }

    /// Capability mask describing this region.
    #[must_use]
    pub const fn capabilities(self) -> MemoryAttribute {
        let caching = match self.cacheability() {
            Cacheability::WriteBack => MemoryAttribute::WRITE_BACK,
            Cacheability::WriteThrough => MemoryAttribute::WRITE_THROUGH,
            Cacheability::Uncached => MemoryAttribute::WRITE_COMBINE,
            Cacheability::Device => MemoryAttribute::UNCACHEABLE,
        };
        if self.is_non_secure() {
            caching.union(NON_SECURE)
        } else {
            caching
        }
    }

    /// Classifies a capability mask.
    ///
    /// Exactly one cacheability bit must be set. `WRITE_PROTECT`,
    /// `EXECUTE_PROTECT` and other protection bits do not affect the result.
    ///
    /// # Errors
    /// [`UnsupportedError::CapabilityMask`] when no or several cacheability bits are set.
    pub fn from_capabilities(mask: MemoryAttribute) -> Result<Self, MmuError> {
        let caching = mask.intersection(CACHEABILITY_MASK);
        let cacheability = if caching == MemoryAttribute::WRITE_BACK {
            Cacheability::WriteBack
        } else if caching == MemoryAttribute::WRITE_THROUGH {
            Cacheability::WriteThrough
        } else if caching == MemoryAttribute::WRITE_COMBINE {
            Cacheability::Uncached
        } else if caching == MemoryAttribute::UNCACHEABLE {
            Cacheability::Device
        } else {
            return Err(UnsupportedError::CapabilityMask(mask.bits()).into());
        };
        Ok(Self::new(cacheability, mask.contains(NON_SECURE)))
    }
}

impl From<RegionAttribute> for MemoryAttribute {
    fn from(value: RegionAttribute) -> Self {
        value.capabilities()
    }
}

impl TryFrom<MemoryAttribute> for RegionAttribute {
    type Error = MmuError;

    fn try_from(value: MemoryAttribute) -> Result<Self, Self::Error> {
        Self::from_capabilities(value)
    }
}
