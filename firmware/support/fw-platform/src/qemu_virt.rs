//! QEMU `virt` machine, AArch64, started with `-m 1G`.
//!
//! ```text
//! 0x0000_0000 ┌──────────────────────┐
//!             │ Flash (firmware)     │ write-through
//! 0x0800_0000 ├──────────────────────┤
//!             │ GIC, UART, RTC, ...  │ device
//! 0x4000_0000 ├──────────────────────┤
//!             │ RAM                  │ write-back
//! 0x8000_0000 └──────────────────────┘
//! ```

use super::{Platform, Profile};
use arm_mmu::{MemoryRegionDescriptor, PhysicalAddress, RegionAttribute};

pub const FLASH_BASE: u64 = 0x0000_0000;
pub const FLASH_SIZE: u64 = 0x0800_0000;

pub const MMIO_BASE: u64 = 0x0800_0000;
pub const MMIO_SIZE: u64 = 0x3800_0000;

pub const UART_BASE: u64 = 0x0900_0000;

pub const RAM_BASE: u64 = 0x4000_0000;
pub const RAM_SIZE: u64 = 0x4000_0000;

/// The top 2 MiB of RAM hold the translation tables.
pub const TABLE_POOL_BASE: u64 = RAM_BASE + RAM_SIZE - 0x20_0000;

pub const MEMORY_MAP: [MemoryRegionDescriptor; 4] = [
    MemoryRegionDescriptor::identity(FLASH_BASE, FLASH_SIZE, RegionAttribute::WriteThrough),
    MemoryRegionDescriptor::identity(MMIO_BASE, MMIO_SIZE, RegionAttribute::Device),
    MemoryRegionDescriptor::identity(RAM_BASE, RAM_SIZE, RegionAttribute::WriteBack),
    MemoryRegionDescriptor::SENTINEL,
];

pub const QEMU_VIRT: Platform = Platform {
    name: "qemu-virt",
    profile: Profile::Aarch64,
    memory_map: &MEMORY_MAP,
    table_pool_start: PhysicalAddress::new(TABLE_POOL_BASE),
    table_pool_end: PhysicalAddress::new(RAM_BASE + RAM_SIZE),
    uart: UART_BASE,
};
