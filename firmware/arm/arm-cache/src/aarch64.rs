//! # AArch64 Maintenance Instructions

use crate::IrqGuard;
use crate::set_way::{CacheGeometry, Ccsidr, Clidr};
use arm_registers::aarch64::ExceptionLevel;

/// `DSB SY`: wait for all outstanding memory accesses and maintenance.
#[inline]
pub fn data_synchronization_barrier() {
    unsafe { core::arch::asm!("dsb sy", options(nostack, preserves_flags)) }
}

/// `ISB`: flush the pipeline so later instructions observe prior context changes.
#[inline]
pub fn instruction_synchronization_barrier() {
    unsafe { core::arch::asm!("isb", options(nostack, preserves_flags)) }
}

/// Invalidates all stage 1 TLB entries for the regime of `el`.
#[inline]
pub fn invalidate_tlbs(el: ExceptionLevel) {
    unsafe {
        match el {
            ExceptionLevel::El2 => core::arch::asm!("tlbi alle2", options(nostack, preserves_flags)),
            ExceptionLevel::El3 => core::arch::asm!("tlbi alle3", options(nostack, preserves_flags)),
            ExceptionLevel::El0 | ExceptionLevel::El1 => {
                core::arch::asm!("tlbi vmalle1", options(nostack, preserves_flags));
            }
        }
    }
    data_synchronization_barrier();
    instruction_synchronization_barrier();
}

/// Invalidates the whole instruction cache to the Point of Unification.
#[inline]
pub fn invalidate_instruction_cache() {
    unsafe { core::arch::asm!("ic iallu", options(nostack, preserves_flags)) }
    data_synchronization_barrier();
    instruction_synchronization_barrier();
}

/// Cleans and invalidates every data or unified cache level up to the Level of Coherency.
///
/// Runs with IRQ and FIQ masked.
pub fn clean_invalidate_data_cache() {
    let _irq = IrqGuard::new();

    let clidr: u64;
    unsafe { core::arch::asm!("mrs {}, clidr_el1", out(reg) clidr, options(nomem, nostack, preserves_flags)) }
    let clidr = Clidr::from_bits(clidr);

    for level in 0..clidr.level_of_coherency() {
        if !clidr.cache_type(level).has_data() {
            continue;
        }

        let ccsidr: u64;
        unsafe {
            core::arch::asm!(
                "msr csselr_el1, {}",
                "isb",
                "mrs {}, ccsidr_el1",
                in(reg) u64::from(level) << 1,
                out(reg) ccsidr,
                options(nostack, preserves_flags)
            );
        }
        // The 32-bit CCSIDR format occupies the low word.
        #[allow(clippy::cast_possible_truncation)]
        let geometry = CacheGeometry::from_ccsidr(level, Ccsidr::from_bits(ccsidr as u32));
        for operand in geometry.operands() {
            unsafe {
                core::arch::asm!("dc cisw, {}", in(reg) u64::from(operand), options(nostack, preserves_flags));
            }
        }
    }

    data_synchronization_barrier();
    instruction_synchronization_barrier();
}
