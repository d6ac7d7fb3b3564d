use crate::addresses::{PAGE_SIZE, PhysicalAddress, VirtualAddress};
use crate::attributes::RegionAttribute;
use crate::error::{MmuError, ParameterError};

/// One entry of a platform memory map.
///
/// A map is a slice of descriptors terminated by an entry with
/// `length == 0` ([`MemoryRegionDescriptor::SENTINEL`]) or by the end of the
/// slice.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MemoryRegionDescriptor {
    pub physical_base: PhysicalAddress,
    pub virtual_base: VirtualAddress,
    /// Size in bytes; a non-zero multiple of 4 KiB.
    pub length: u64,
    pub attributes: RegionAttribute,
}

impl MemoryRegionDescriptor {
    /// Terminates a memory map.
    pub const SENTINEL: Self = Self::identity(0, 0, RegionAttribute::WriteBack);

    #[must_use]
    pub const fn new(
        physical_base: PhysicalAddress,
        virtual_base: VirtualAddress,
        length: u64,
        attributes: RegionAttribute,
    ) -> Self {
        Self {
            physical_base,
            virtual_base,
            length,
            attributes,
        }
    }

    /// A region mapped at the same virtual and physical address.
    #[must_use]
    pub const fn identity(base: u64, length: u64, attributes: RegionAttribute) -> Self {
        Self::new(
            PhysicalAddress::new(base),
            VirtualAddress::new(base),
            length,
            attributes,
        )
    }

    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        self.length == 0
    }

    /// Checks the length and base alignment and that neither range wraps.
    ///
    /// # Errors
    /// [`MmuError::InvalidParameter`] describing the first violation found.
    pub const fn validate(&self) -> Result<(), MmuError> {
        let virtual_base = self.virtual_base;
        if self.length == 0 {
            return Err(MmuError::InvalidParameter(ParameterError::ZeroLength {
                virtual_base,
            }));
        }
        if self.length % PAGE_SIZE != 0 {
            return Err(MmuError::InvalidParameter(
                ParameterError::MisalignedLength {
                    virtual_base,
                    length: self.length,
                },
            ));
        }
        if !self.virtual_base.is_aligned(PAGE_SIZE) || !self.physical_base.is_aligned(PAGE_SIZE) {
            return Err(MmuError::InvalidParameter(ParameterError::MisalignedBase {
                virtual_base,
                physical_base: self.physical_base,
            }));
        }
        if self.virtual_base.checked_add(self.length - 1).is_none()
            || self.physical_base.checked_add(self.length - 1).is_none()
        {
            return Err(MmuError::InvalidParameter(
                ParameterError::AddressOverflow { virtual_base },
            ));
        }
        Ok(())
    }

    /// Last physical byte covered by the region.
    #[must_use]
    pub const fn physical_last(&self) -> u64 {
        self.physical_base.as_u64() + (self.length - 1)
    }

    /// Last virtual byte covered by the region.
    #[must_use]
    pub const fn virtual_last(&self) -> u64 {
        self.virtual_base.as_u64() + (self.length - 1)
    }

    #[must_use]
    pub const fn contains_physical(&self, address: PhysicalAddress) -> bool {
        address.as_u64() >= self.physical_base.as_u64() && address.as_u64() <= self.physical_last()
    }
}

/// The regions of `map` before the first sentinel.
pub fn active_regions(
    map: &[MemoryRegionDescriptor],
) -> impl Iterator<Item = &MemoryRegionDescriptor> + Clone {
    map.iter().take_while(|region| !region.is_sentinel())
}
