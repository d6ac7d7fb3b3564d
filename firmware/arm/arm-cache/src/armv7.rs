//! # ARMv7 Maintenance Operations (CP15)

use crate::IrqGuard;
use crate::set_way::{CacheGeometry, Ccsidr, Clidr};

/// `DSB`: wait for all outstanding memory accesses and maintenance.
#[inline]
pub fn data_synchronization_barrier() {
    unsafe { core::arch::asm!("dsb sy", options(nostack, preserves_flags)) }
}

/// `ISB`: flush the pipeline.
#[inline]
pub fn instruction_synchronization_barrier() {
    unsafe { core::arch::asm!("isb sy", options(nostack, preserves_flags)) }
}

/// `TLBIALL`: invalidates the entire unified TLB.
#[inline]
pub fn invalidate_tlbs() {
    unsafe { core::arch::asm!("mcr p15, 0, {}, c8, c7, 0", in(reg) 0_u32, options(nostack, preserves_flags)) }
    data_synchronization_barrier();
    instruction_synchronization_barrier();
}

/// `ICIALLU`: invalidates the whole instruction cache and the branch predictor.
#[inline]
pub fn invalidate_instruction_cache() {
    unsafe {
        core::arch::asm!(
            "mcr p15, 0, {zero}, c7, c5, 0",
            "mcr p15, 0, {zero}, c7, c5, 6",
            zero = in(reg) 0_u32,
            options(nostack, preserves_flags)
        );
    }
    data_synchronization_barrier();
    instruction_synchronization_barrier();
}

/// Cleans and invalidates every data or unified cache level up to the Level of Coherency.
///
/// Runs with IRQ and FIQ masked.
pub fn clean_invalidate_data_cache() {
    let _irq = IrqGuard::new();

    let clidr: u32;
    unsafe { core::arch::asm!("mrc p15, 1, {}, c0, c0, 1", out(reg) clidr, options(nomem, nostack, preserves_flags)) }
    let clidr = Clidr::from_bits(u64::from(clidr));

    for level in 0..clidr.level_of_coherency() {
        if !clidr.cache_type(level).has_data() {
            continue;
        }

        let ccsidr: u32;
        unsafe {
            core::arch::asm!(
                "mcr p15, 2, {}, c0, c0, 0",
                "isb sy",
                "mrc p15, 1, {}, c0, c0, 0",
                in(reg) u32::from(level) << 1,
                out(reg) ccsidr,
                options(nostack, preserves_flags)
            );
        }
        let geometry = CacheGeometry::from_ccsidr(level, Ccsidr::from_bits(ccsidr));
        for operand in geometry.operands() {
            unsafe {
                core::arch::asm!("mcr p15, 0, {}, c7, c14, 2", in(reg) operand, options(nostack, preserves_flags));
            }
        }
    }

    data_synchronization_barrier();
    instruction_synchronization_barrier();
}
