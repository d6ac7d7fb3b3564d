use crate::addresses::{PhysicalAddress, VirtualAddress};
use crate::attributes::RegionAttribute;

/// Errors reported while building translation tables or programming the MMU.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MmuError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] ParameterError),
    #[error("out of resources while allocating a level {level} translation table")]
    OutOfResources { level: u8 },
    #[error("unsupported: {0}")]
    Unsupported(#[from] UnsupportedError),
}

/// Caller errors. Nothing has been allocated when one of these is returned
/// from [`configure`](crate::configure).
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParameterError {
    #[error("the memory map contains no regions")]
    EmptyRegionList,
    #[error("region at {virtual_base} has zero length")]
    ZeroLength { virtual_base: VirtualAddress },
    #[error("region at {virtual_base} has length {length:#x}, not a multiple of 4 KiB")]
    MisalignedLength {
        virtual_base: VirtualAddress,
        length: u64,
    },
    #[error("region base {virtual_base} -> {physical_base} is not 4 KiB aligned")]
    MisalignedBase {
        virtual_base: VirtualAddress,
        physical_base: PhysicalAddress,
    },
    #[error("region at {virtual_base} wraps around the end of the address space")]
    AddressOverflow { virtual_base: VirtualAddress },
    #[error("address {address} is outside the {entries}-entry level {level} root table")]
    OutsideRootTable {
        address: VirtualAddress,
        level: u8,
        entries: usize,
    },
    #[error("level {level} cannot hold a translation entry")]
    InvalidLevel { level: u8 },
    #[error("{address} is not mapped")]
    NotMapped { address: VirtualAddress },
}

/// Requests the hardware or the attribute vocabularies cannot express.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnsupportedError {
    #[error("address {max_address:#x} exceeds the supported translation range")]
    AddressRange { max_address: u64 },
    #[error("translation cannot be configured from exception level {0}")]
    ExceptionLevel(u8),
    #[error("no region maps the translation table memory at {0}")]
    TableMemoryNotMapped(PhysicalAddress),
    #[error("{0:?} memory cannot hold translation tables")]
    TableWalkAttribute(RegionAttribute),
    #[error("descriptor attributes {0:#x} have no capability mapping")]
    DescriptorAttributes(u64),
    #[error("capability mask {0:#x} does not select exactly one cacheability")]
    CapabilityMask(u64),
    #[error("table at {0} was not allocated by this builder")]
    ForeignTable(PhysicalAddress),
    #[error("{requested:?} at {address} conflicts with the security state of its page table")]
    SecurityState {
        address: VirtualAddress,
        requested: RegionAttribute,
    },
}
