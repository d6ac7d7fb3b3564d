//! Host stand-ins for the processor and the table memory.

use arm_mmu::arm_registers::aarch64::{ExceptionLevel, Mair, Ttbr0 as Ttbr0El};
use arm_mmu::arm_registers::armv7::{Dacr, Ttbcr, Ttbr0};
use arm_mmu::hardware::aarch64::{Aarch64Cpu, TranslationControl};
use arm_mmu::hardware::armv7::Armv7Cpu;
use arm_mmu::{CacheMaintenance, PAGE_SIZE, PhysMapper, PhysicalAddress, RawDescriptor};
use std::cell::UnsafeCell;

/// A system register write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RegisterWrite {
    pub name: &'static str,
    pub value: u64,
}

/// Remembers register writes and the MMU enable bit.
#[derive(Debug)]
pub struct SimulatedCpu {
    el: ExceptionLevel,
    multiprocessing: bool,
    mmu_enabled: bool,
    writes: Vec<RegisterWrite>,
}

impl SimulatedCpu {
    #[must_use]
    pub const fn new(el: ExceptionLevel) -> Self {
        Self {
            el,
            multiprocessing: true,
            mmu_enabled: false,
            writes: Vec::new(),
        }
    }

    #[must_use]
    pub const fn mmu_enabled(&self) -> bool {
        self.mmu_enabled
    }

    #[must_use]
    pub fn writes(&self) -> &[RegisterWrite] {
        &self.writes
    }

    fn record(&mut self, name: &'static str, value: u64) {
        log::trace!("{name} <- {value:#x}");
        self.writes.push(RegisterWrite { name, value });
    }
}

impl CacheMaintenance for SimulatedCpu {
    fn disable_mmu(&mut self) {
        self.mmu_enabled = false;
    }

    fn enable_mmu(&mut self) {
        self.mmu_enabled = true;
    }

    fn disable_data_cache(&mut self) {}

    fn enable_data_cache(&mut self) {}

    fn disable_instruction_cache(&mut self) {}

    fn enable_instruction_cache(&mut self) {}

    fn clean_invalidate_data_cache(&mut self) {}

    fn invalidate_instruction_cache(&mut self) {}

    fn invalidate_tlbs(&mut self) {}

    fn disable_alignment_check(&mut self) {}
}

impl Aarch64Cpu for SimulatedCpu {
    fn current_el(&mut self) -> ExceptionLevel {
        self.el
    }

    fn write_tcr(&mut self, tcr: TranslationControl) {
        let name = match tcr.exception_level() {
            ExceptionLevel::El1 => "TCR_EL1",
            _ => "TCR_EL2",
        };
        self.record(name, tcr.bits());
    }

    fn write_ttbr0(&mut self, el: ExceptionLevel, ttbr: Ttbr0El) {
        let name = match el {
            ExceptionLevel::El1 => "TTBR0_EL1",
            _ => "TTBR0_EL2",
        };
        self.record(name, ttbr.into_bits());
    }

    fn write_mair(&mut self, el: ExceptionLevel, mair: Mair) {
        let name = match el {
            ExceptionLevel::El1 => "MAIR_EL1",
            _ => "MAIR_EL2",
        };
        self.record(name, mair.into_bits());
    }
}

impl Armv7Cpu for SimulatedCpu {
    fn has_multiprocessing_extensions(&mut self) -> bool {
        self.multiprocessing
    }

    fn write_ttbcr(&mut self, ttbcr: Ttbcr) {
        self.record("TTBCR", u64::from(ttbcr.into_bits()));
    }

    fn write_ttbr0(&mut self, ttbr: Ttbr0) {
        self.record("TTBR0", u64::from(ttbr.into_bits()));
    }

    fn write_dacr(&mut self, dacr: Dacr) {
        self.record("DACR", u64::from(dacr.into_bits()));
    }

    fn set_tex_remap(&mut self, enabled: bool) {
        self.record("SCTLR.TRE", u64::from(enabled));
    }
}

#[repr(C, align(4096))]
struct Page([u8; 4096]);

/// Host memory standing in for the physical table window.
pub struct SimulatedRam {
    base: u64,
    pages: Vec<UnsafeCell<Page>>,
}

impl SimulatedRam {
    #[must_use]
    pub fn new(start: PhysicalAddress, end: PhysicalAddress) -> Self {
        let count = (end.as_u64() - start.as_u64()) / PAGE_SIZE;
        let pages = (0..count).map(|_| UnsafeCell::new(Page([0; 4096]))).collect();
        Self {
            base: start.as_u64(),
            pages,
        }
    }

    const fn len(&self) -> u64 {
        self.pages.len() as u64 * PAGE_SIZE
    }
}

impl PhysMapper for SimulatedRam {
    unsafe fn table_mut<'a, D: RawDescriptor>(&self, at: PhysicalAddress, entries: usize) -> &'a mut [D] {
        let offset = at.as_u64() - self.base;
        assert!(
            offset + (entries * D::BYTES) as u64 <= self.len(),
            "{at} lies outside the simulated table window"
        );
        #[allow(clippy::cast_possible_truncation)]
        let offset = offset as usize;
        let start = UnsafeCell::raw_get(self.pages.as_ptr()).cast::<u8>();
        unsafe { std::slice::from_raw_parts_mut(start.add(offset).cast::<D>(), entries) }
    }
}
