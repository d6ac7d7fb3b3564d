//! Raspberry Pi 2 Model B (BCM2836), ARMv7-A, `gpu_mem=64`.
//!
//! The VideoCore owns the top of SDRAM; the ARM side sees it uncached so
//! the framebuffer stays coherent with the GPU.

use super::{Platform, Profile};
use arm_mmu::{MemoryRegionDescriptor, PhysicalAddress, RegionAttribute};

pub const RAM_SIZE: u64 = 0x3C00_0000;

pub const VIDEOCORE_BASE: u64 = RAM_SIZE;
pub const VIDEOCORE_SIZE: u64 = 0x0300_0000;

pub const PERIPHERAL_BASE: u64 = 0x3F00_0000;
pub const PERIPHERAL_SIZE: u64 = 0x0100_0000;

pub const UART_BASE: u64 = PERIPHERAL_BASE + 0x20_1000;

/// Per-core mailboxes, timers and interrupt routing.
pub const LOCAL_PERIPHERAL_BASE: u64 = 0x4000_0000;
pub const LOCAL_PERIPHERAL_SIZE: u64 = 0x0004_0000;

/// The last MiB of ARM RAM holds the translation tables.
pub const TABLE_POOL_BASE: u64 = RAM_SIZE - 0x10_0000;

pub const MEMORY_MAP: [MemoryRegionDescriptor; 5] = [
    MemoryRegionDescriptor::identity(0, RAM_SIZE, RegionAttribute::WriteBack),
    MemoryRegionDescriptor::identity(VIDEOCORE_BASE, VIDEOCORE_SIZE, RegionAttribute::Uncached),
    MemoryRegionDescriptor::identity(PERIPHERAL_BASE, PERIPHERAL_SIZE, RegionAttribute::Device),
    MemoryRegionDescriptor::identity(LOCAL_PERIPHERAL_BASE, LOCAL_PERIPHERAL_SIZE, RegionAttribute::Device),
    MemoryRegionDescriptor::SENTINEL,
];

pub const RASPBERRY_PI_2: Platform = Platform {
    name: "rpi2",
    profile: Profile::Armv7,
    memory_map: &MEMORY_MAP,
    table_pool_start: PhysicalAddress::new(TABLE_POOL_BASE),
    table_pool_end: PhysicalAddress::new(RAM_SIZE),
    uart: UART_BASE,
};
