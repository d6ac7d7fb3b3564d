#![allow(dead_code)]

use arm_mmu::arm_registers::aarch64::{ExceptionLevel, Mair, Ttbr0 as Ttbr0El};
use arm_mmu::arm_registers::armv7::{Dacr, Ttbcr, Ttbr0};
use arm_mmu::hardware::aarch64::{Aarch64Cpu, TranslationControl};
use arm_mmu::hardware::armv7::Armv7Cpu;
use arm_mmu::{BumpPageAllocator, CacheMaintenance, PAGE_SIZE, PhysMapper, PhysicalAddress, RawDescriptor};
use std::cell::UnsafeCell;

/// One observable CPU operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    DisableMmu,
    EnableMmu,
    DisableDataCache,
    EnableDataCache,
    DisableInstructionCache,
    EnableInstructionCache,
    CleanInvalidateDataCache,
    InvalidateInstructionCache,
    InvalidateTlbs,
    DisableAlignmentCheck,
    Tcr(u64),
    Ttbr0El(ExceptionLevel, u64),
    Mair(ExceptionLevel, u64),
    Ttbcr(u32),
    Ttbr0(u32),
    Dacr(u32),
    TexRemap(bool),
}

/// Records every operation instead of executing it.
#[derive(Debug)]
pub struct RecordingCpu {
    pub el: ExceptionLevel,
    pub multiprocessing: bool,
    pub events: Vec<Event>,
}

impl RecordingCpu {
    pub fn at(el: ExceptionLevel) -> Self {
        Self {
            el,
            multiprocessing: false,
            events: Vec::new(),
        }
    }

    pub fn armv7(multiprocessing: bool) -> Self {
        Self {
            el: ExceptionLevel::El1,
            multiprocessing,
            events: Vec::new(),
        }
    }

    pub fn mmu_enabled(&self) -> bool {
        self.events
            .iter()
            .rev()
            .find_map(|e| match e {
                Event::EnableMmu => Some(true),
                Event::DisableMmu => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl CacheMaintenance for RecordingCpu {
    fn disable_mmu(&mut self) {
        self.events.push(Event::DisableMmu);
    }

    fn enable_mmu(&mut self) {
        self.events.push(Event::EnableMmu);
    }

    fn disable_data_cache(&mut self) {
        self.events.push(Event::DisableDataCache);
    }

    fn enable_data_cache(&mut self) {
        self.events.push(Event::EnableDataCache);
    }

    fn disable_instruction_cache(&mut self) {
        self.events.push(Event::DisableInstructionCache);
    }

    fn enable_instruction_cache(&mut self) {
        self.events.push(Event::EnableInstructionCache);
    }

    fn clean_invalidate_data_cache(&mut self) {
        self.events.push(Event::CleanInvalidateDataCache);
    }

    fn invalidate_instruction_cache(&mut self) {
        self.events.push(Event::InvalidateInstructionCache);
    }

    fn invalidate_tlbs(&mut self) {
        self.events.push(Event::InvalidateTlbs);
    }

    fn disable_alignment_check(&mut self) {
        self.events.push(Event::DisableAlignmentCheck);
    }
}

impl Aarch64Cpu for RecordingCpu {
    fn current_el(&mut self) -> ExceptionLevel {
        self.el
    }

    fn write_tcr(&mut self, tcr: TranslationControl) {
        self.events.push(Event::Tcr(tcr.bits()));
    }

    fn write_ttbr0(&mut self, el: ExceptionLevel, ttbr: Ttbr0El) {
        self.events.push(Event::Ttbr0El(el, ttbr.into_bits()));
    }

    fn write_mair(&mut self, el: ExceptionLevel, mair: Mair) {
        self.events.push(Event::Mair(el, mair.into_bits()));
    }
}

impl Armv7Cpu for RecordingCpu {
    fn has_multiprocessing_extensions(&mut self) -> bool {
        self.multiprocessing
    }

    fn write_ttbcr(&mut self, ttbcr: Ttbcr) {
        self.events.push(Event::Ttbcr(ttbcr.into_bits()));
    }

    fn write_ttbr0(&mut self, ttbr: Ttbr0) {
        self.events.push(Event::Ttbr0(ttbr.into_bits()));
    }

    fn write_dacr(&mut self, dacr: Dacr) {
        self.events.push(Event::Dacr(dacr.into_bits()));
    }

    fn set_tex_remap(&mut self, enabled: bool) {
        self.events.push(Event::TexRemap(enabled));
    }
}

#[repr(align(4096))]
struct Page([u8; 4096]);

/// A window of simulated physical memory starting at `base`.
pub struct TestMemory {
    base: u64,
    pages: Vec<UnsafeCell<Page>>,
}

impl TestMemory {
    pub fn new(base: u64, pages: usize) -> Self {
        let mut v = Vec::with_capacity(pages);
        for _ in 0..pages {
            v.push(UnsafeCell::new(Page([0xA5; 4096])));
        }
        Self { base, pages: v }
    }

    /// Allocator over exactly this window.
    pub fn allocator(&self) -> BumpPageAllocator {
        BumpPageAllocator::new(
            PhysicalAddress::new(self.base),
            PhysicalAddress::new(self.base + self.pages.len() as u64 * PAGE_SIZE),
        )
    }

    pub fn read_u64(&self, at: PhysicalAddress) -> u64 {
        unsafe { self.table_mut::<u64>(at, 1)[0] }
    }

    pub fn read_u32(&self, at: PhysicalAddress) -> u32 {
        unsafe { self.table_mut::<u32>(at, 1)[0] }
    }
}

impl PhysMapper for TestMemory {
    unsafe fn table_mut<'a, D: RawDescriptor>(&self, at: PhysicalAddress, entries: usize) -> &'a mut [D] {
        let offset = usize::try_from(at.as_u64() - self.base).unwrap();
        assert!(offset + entries * D::BYTES <= self.pages.len() * 4096, "{at:?} outside test memory");
        let start = UnsafeCell::raw_get(self.pages.as_ptr()).cast::<u8>();
        unsafe { std::slice::from_raw_parts_mut(start.add(offset).cast::<D>(), entries) }
    }
}
