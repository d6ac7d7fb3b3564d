//! # Page Allocation
//!
//! Translation tables live in whole 4 KiB pages handed out by a
//! [`PageAllocator`]. Tables are only freed when a configuration attempt
//! fails, and then in reverse allocation order.

use crate::addresses::{PAGE_SIZE, PhysicalAddress, align_up};

/// Source of physical pages for translation tables.
///
/// Returned memory need not be zeroed; the builder writes every descriptor
/// of a table before the MMU can observe it.
pub trait PageAllocator {
    /// Allocates `count` contiguous pages aligned to `alignment` bytes
    /// (a power of two, at least [`PAGE_SIZE`]).
    ///
    /// Returns `None` when memory is exhausted.
    fn allocate_pages(&mut self, count: usize, alignment: u64) -> Option<PhysicalAddress>;

    /// Returns pages previously obtained from [`allocate_pages`](Self::allocate_pages).
    fn free_pages(&mut self, base: PhysicalAddress, count: usize);
}

impl<T: PageAllocator + ?Sized> PageAllocator for &mut T {
    #[inline]
    fn allocate_pages(&mut self, count: usize, alignment: u64) -> Option<PhysicalAddress> {
        (**self).allocate_pages(count, alignment)
    }

    #[inline]
    fn free_pages(&mut self, base: PhysicalAddress, count: usize) {
        (**self).free_pages(base, count);
    }
}

/// Bump allocator over a fixed physical window.
///
/// Frees roll the cursor back when they release the most recent allocation;
/// once nothing is outstanding the window starts over.
#[derive(Debug, Clone)]
pub struct BumpPageAllocator {
    start: u64,
    next: u64,
    end: u64,
    outstanding: usize,
}

impl BumpPageAllocator {
    /// Hands out pages from `[start, end)`. `start` is rounded up to a page.
    #[must_use]
    pub const fn new(start: PhysicalAddress, end: PhysicalAddress) -> Self {
        let start = align_up(start.as_u64(), PAGE_SIZE);
        Self {
            start,
            next: start,
            end: end.as_u64(),
            outstanding: 0,
        }
    }

    /// Pages allocated and not yet freed.
    #[must_use]
    pub const fn outstanding_pages(&self) -> usize {
        self.outstanding
    }

    /// Bytes still available, ignoring alignment padding.
    #[must_use]
    pub const fn remaining_bytes(&self) -> u64 {
        self.end.saturating_sub(self.next)
    }
}

impl PageAllocator for BumpPageAllocator {
    fn allocate_pages(&mut self, count: usize, alignment: u64) -> Option<PhysicalAddress> {
        let alignment = alignment.max(PAGE_SIZE);
        let base = self.next.checked_add(alignment - 1)? & !(alignment - 1);
        let bytes = (count as u64).checked_mul(PAGE_SIZE)?;
        let end = base.checked_add(bytes)?;
        if count == 0 || end > self.end {
            return None;
        }
        self.next = end;
        self.outstanding += count;
        Some(PhysicalAddress::new(base))
    }

    fn free_pages(&mut self, base: PhysicalAddress, count: usize) {
        self.outstanding = self.outstanding.saturating_sub(count);
        if self.outstanding == 0 {
            self.next = self.start;
        } else if base.as_u64() + count as u64 * PAGE_SIZE == self.next {
            self.next = base.as_u64();
        }
    }
}

#[cfg(feature = "boot-services")]
pub use boot_services::BootServicesAllocator;

#[cfg(feature = "boot-services")]
mod boot_services {
    use super::PageAllocator;
    use crate::addresses::{PAGE_SIZE, PhysicalAddress};
    use core::ptr::NonNull;
    use uefi::boot::{self, AllocateType, MemoryType};

    /// Allocates table pages through UEFI boot services.
    ///
    /// Alignments above one page are met by over-allocating and returning
    /// the unaligned head and the unused tail.
    #[derive(Debug, Copy, Clone)]
    pub struct BootServicesAllocator {
        memory_type: MemoryType,
    }

    impl BootServicesAllocator {
        #[must_use]
        pub const fn new(memory_type: MemoryType) -> Self {
            Self { memory_type }
        }
    }

    impl Default for BootServicesAllocator {
        fn default() -> Self {
            Self::new(MemoryType::BOOT_SERVICES_DATA)
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn release(address: u64, count: usize) {
        if count == 0 {
            return;
        }
        if let Some(ptr) = NonNull::new(address as usize as *mut u8) {
            if let Err(e) = unsafe { boot::free_pages(ptr, count) } {
                log::warn!("Failed to free {count} pages at {address:#x}: {e:?}");
            }
        }
    }

    impl PageAllocator for BootServicesAllocator {
        #[allow(clippy::cast_possible_truncation)]
        fn allocate_pages(&mut self, count: usize, alignment: u64) -> Option<PhysicalAddress> {
            let slack = (alignment.max(PAGE_SIZE) / PAGE_SIZE) as usize - 1;
            let total = count.checked_add(slack)?;
            let ptr = boot::allocate_pages(AllocateType::AnyPages, self.memory_type, total).ok()?;

            let raw = ptr.as_ptr() as u64;
            let base = crate::addresses::align_up(raw, alignment.max(PAGE_SIZE));
            let head = ((base - raw) / PAGE_SIZE) as usize;
            release(raw, head);
            release(base + count as u64 * PAGE_SIZE, slack - head);
            Some(PhysicalAddress::new(base))
        }

        fn free_pages(&mut self, base: PhysicalAddress, count: usize) {
            release(base.as_u64(), count);
        }
    }
}
