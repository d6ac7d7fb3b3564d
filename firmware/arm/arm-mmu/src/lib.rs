//! # ARM MMU Setup for Firmware
//!
//! Builds a stage 1 virtual address space from a platform memory map and
//! switches translation on, for AArch64 (4 KiB granule, long descriptors)
//! and ARMv7-A (short descriptors).
//!
//! ## What you get
//! - [`RegionAttribute`]: the eight memory types a region can have, and their
//!   mapping to UEFI capability masks ([`MemoryAttribute`](uefi::boot::MemoryAttribute)).
//! - [`AddressSpaceConfig`]: the smallest root table covering an address range.
//! - [`TranslationTables`]: an arena of tables with [`locate`](TranslationTables::locate),
//!   [`fill`](TranslationTables::fill) and [`translate`](TranslationTables::translate).
//! - [`configure`]: the whole sequence, from validating the map to enabling the MMU.
//!
//! ## Architecture independence
//!
//! The table walk and the region filler are written once against
//! [`Architecture`]; [`Aarch64`] and [`Armv7`] supply geometry and
//! descriptor encoding. Register programming goes through
//! [`TranslationRegime`], so the whole flow runs on a host against a
//! simulated CPU as well.
//!
//! ```text
//!  memory map ──► configure ──► TranslationRegime ──► TCR / TTBR0 / MAIR (or TTBCR / DACR)
//!                    │
//!                    ├──► TranslationTables::fill ──► locate (allocate, split, descend)
//!                    └──► TranslationTables::commit ──► PhysMapper ──► table pages
//! ```
//!
//! ## Features
//! - `asm`: `SystemCpu` backends executing the real system instructions
//!   (only on `aarch64` / `arm` targets).
//! - `boot-services`: [`BootServicesAllocator`] for table pages.

#![cfg_attr(not(test), no_std)]
#![allow(unsafe_code)]

extern crate alloc;

mod addresses;
mod allocator;
pub mod arch;
mod attributes;
mod configure;
mod descriptor;
mod error;
mod filler;
pub mod hardware;
mod mapper;
mod region;
mod sizer;
mod table;
mod walker;

pub use crate::addresses::{PAGE_SHIFT, PAGE_SIZE, PhysicalAddress, VirtualAddress, align_up, alignment_of};
#[cfg(feature = "boot-services")]
pub use crate::allocator::BootServicesAllocator;
pub use crate::allocator::{BumpPageAllocator, PageAllocator};
pub use crate::arch::{Aarch64, Architecture, Armv7};
pub use crate::attributes::{CACHEABILITY_MASK, Cacheability, NON_SECURE, RegionAttribute};
pub use crate::configure::{MmuConfiguration, Stage, configure, max_address};
pub use crate::descriptor::{DescriptorEntry, RawDescriptor, TableProtection};
pub use crate::error::{MmuError, ParameterError, UnsupportedError};
pub use crate::hardware::{CacheMaintenance, TranslationRegime};
pub use crate::mapper::{IdentityMapper, PhysMapper};
pub use crate::region::{MemoryRegionDescriptor, active_regions};
pub use crate::sizer::{AddressSpaceConfig, MAX_T0SZ, MIN_T0SZ, highest_bit};
pub use crate::table::{TableHandle, Translation, TranslationTable, TranslationTables};
pub use crate::walker::BlockSlot;

/// Re-export of the register types used by the hardware traits.
pub use arm_registers;
