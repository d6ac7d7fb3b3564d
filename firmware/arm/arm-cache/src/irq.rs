//! # Interrupt Masking
//!
//! Set/way maintenance must not be interleaved with an interrupt handler
//! that allocates lines in the cache being cleaned.

/// RAII guard that masks IRQ and FIQ on creation and restores the previous
/// mask on drop.
///
/// # Platform / Privilege
///
/// AArch64 (`DAIF`) or ARMv7 (`CPSR`); requires a privileged mode.
///
/// # Examples
///
/// ```no_run
/// use arm_cache::IrqGuard;
///
/// {
///     let _g = IrqGuard::new();
///     // IRQ and FIQ are masked here
/// }
/// // previous mask restored
/// ```
pub struct IrqGuard {
    /// Interrupt mask bits saved when the guard was created.
    saved: usize,
}

impl Default for IrqGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_arch = "aarch64")]
impl IrqGuard {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        let daif: usize;
        unsafe {
            core::arch::asm!("mrs {}, daif", "msr daifset, #3", out(reg) daif, options(nomem, nostack));
        }
        Self { saved: daif }
    }
}

#[cfg(target_arch = "aarch64")]
impl Drop for IrqGuard {
    fn drop(&mut self) {
        unsafe {
            core::arch::asm!("msr daif, {}", in(reg) self.saved, options(nomem, nostack));
        }
    }
}

#[cfg(target_arch = "arm")]
impl IrqGuard {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        let cpsr: usize;
        unsafe {
            core::arch::asm!("mrs {}, cpsr", "cpsid if", out(reg) cpsr, options(nomem, nostack));
        }
        Self { saved: cpsr }
    }
}

#[cfg(target_arch = "arm")]
impl Drop for IrqGuard {
    fn drop(&mut self) {
        unsafe {
            core::arch::asm!("msr cpsr_c, {}", in(reg) self.saved, options(nomem, nostack));
        }
    }
}
