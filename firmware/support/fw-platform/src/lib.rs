//! # Platform Memory Maps
//!
//! Compile-time descriptions of the boards the firmware runs on: the
//! memory map handed to [`arm_mmu::configure`], the physical window reserved
//! for translation tables, and the console UART.
//!
//! | Platform | Architecture | RAM | Console |
//! |----------|--------------|-----|---------|
//! | [`QEMU_VIRT`] | AArch64 | `0x4000_0000`, 1 GiB | PL011 at `0x0900_0000` |
//! | [`RASPBERRY_PI_2`] | ARMv7-A | `0x0000_0000`, 960 MiB | PL011 at `0x3F20_1000` |
//!
//! Maps are sentinel terminated so they can be passed on unchanged to code
//! that only understands the terminated form.

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod qemu_virt;
pub mod rpi2;

use arm_mmu::{BumpPageAllocator, MemoryRegionDescriptor, PhysicalAddress};

pub use qemu_virt::QEMU_VIRT;
pub use rpi2::RASPBERRY_PI_2;

/// Translation scheme a platform's MMU uses.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Profile {
    /// 4 KiB granule long descriptors.
    Aarch64,
    /// Short descriptors.
    Armv7,
}

/// A board the firmware knows how to bring up.
#[derive(Debug, Copy, Clone)]
pub struct Platform {
    pub name: &'static str,
    pub profile: Profile,
    /// Sentinel-terminated memory map.
    pub memory_map: &'static [MemoryRegionDescriptor],
    /// First byte of the window reserved for translation tables.
    pub table_pool_start: PhysicalAddress,
    /// One past the last byte of the table window.
    pub table_pool_end: PhysicalAddress,
    /// PL011 register block.
    pub uart: u64,
}

impl Platform {
    /// A fresh allocator over the table window.
    #[must_use]
    pub const fn table_allocator(&self) -> BumpPageAllocator {
        BumpPageAllocator::new(self.table_pool_start, self.table_pool_end)
    }

    /// Size of the table window in bytes.
    #[must_use]
    pub const fn table_pool_size(&self) -> u64 {
        self.table_pool_end.as_u64() - self.table_pool_start.as_u64()
    }
}

/// Every known platform.
pub const ALL: [&Platform; 2] = [&QEMU_VIRT, &RASPBERRY_PI_2];

/// Looks a platform up by its name.
#[must_use]
pub fn by_name(name: &str) -> Option<&'static Platform> {
    ALL.into_iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arm_mmu::{Architecture, PAGE_SIZE, RegionAttribute, active_regions, max_address};

    #[test]
    fn maps_are_valid_and_terminated() {
        for platform in ALL {
            assert!(max_address(platform.memory_map).is_ok(), "{}", platform.name);
            assert!(platform.memory_map.last().is_some_and(MemoryRegionDescriptor::is_sentinel));
        }
    }

    #[test]
    fn regions_do_not_overlap() {
        for platform in ALL {
            let regions: Vec<_> = active_regions(platform.memory_map).collect();
            for (i, a) in regions.iter().enumerate() {
                for b in &regions[i + 1..] {
                    let disjoint = a.physical_last() < b.physical_base.as_u64()
                        || b.physical_last() < a.physical_base.as_u64();
                    assert!(disjoint, "{}: {a:?} overlaps {b:?}", platform.name);
                }
            }
        }
    }

    #[test]
    fn table_pool_lies_in_write_back_ram() {
        for platform in ALL {
            assert!(platform.table_pool_size() >= 16 * PAGE_SIZE);
            let last = PhysicalAddress::new(platform.table_pool_end.as_u64() - 1);
            let holder = active_regions(platform.memory_map)
                .filter(|r| r.contains_physical(platform.table_pool_start) && r.contains_physical(last))
                .last()
                .expect("table pool is mapped");
            assert_eq!(holder.attributes, RegionAttribute::WriteBack, "{}", platform.name);
        }
    }

    #[test]
    fn uart_is_device_memory() {
        for platform in ALL {
            let uart = PhysicalAddress::new(platform.uart);
            let holder = active_regions(platform.memory_map)
                .find(|r| r.contains_physical(uart))
                .expect("UART is mapped");
            assert_eq!(holder.attributes, RegionAttribute::Device, "{}", platform.name);
        }
    }

    #[test]
    fn armv7_maps_fit_in_32_bits() {
        for platform in ALL.into_iter().filter(|p| p.profile == Profile::Armv7) {
            let max = max_address(platform.memory_map).unwrap();
            assert!(arm_mmu::Armv7::address_space(max).is_ok(), "{}", platform.name);
        }
    }

    #[test]
    fn lookup_ignores_case() {
        assert_eq!(by_name("qemu-virt").map(|p| p.name), Some(QEMU_VIRT.name));
        assert_eq!(by_name("RPI2").map(|p| p.name), Some(RASPBERRY_PI_2.name));
        assert!(by_name("pc").is_none());
    }
}
