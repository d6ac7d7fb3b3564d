//! # Typed ARM System Registers
//!
//! Bit-exact models of the AArch64 and ARMv7 (VMSAv7 short-descriptor)
//! registers that control address translation. Every register is a
//! [`bitfield`](bitfield_struct::bitfield) over its native width, so values can
//! be composed and inspected on any host and only the final load/store needs
//! to run on the target CPU.
//!
//! | Module | Registers |
//! |--------|-----------|
//! | [`aarch64`] | `CurrentEL`, `TCR_EL1`, `TCR_EL2`, `MAIR_ELx`, `SCTLR_ELx`, `TTBR0_ELx` |
//! | [`armv7`] | `TTBCR`, `TTBR0`, `DACR`, `SCTLR`, `MPIDR` |
//!
//! The `asm` feature enables the actual `mrs`/`msr` (AArch64) and `mrc`/`mcr`
//! (ARMv7) accessors; they are additionally gated on the matching
//! `target_arch`, so enabling the feature on a host build is harmless.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

#[cfg(feature = "aarch64")]
pub mod aarch64;

#[cfg(feature = "armv7")]
pub mod armv7;

pub trait LoadRegisterUnsafe {
    /// # Safety
    /// The caller must uphold the implementation-specific safety requirements.
    /// For example, the register access might be privileged and require EL1 or higher.
    unsafe fn load_unsafe() -> Self;
}

pub trait StoreRegisterUnsafe {
    /// # Safety
    /// The caller must uphold the implementation-specific safety requirements.
    /// For example, the register access might be privileged and require EL1 or higher.
    unsafe fn store_unsafe(self);
}

pub trait LoadRegister {
    /// # Safety
    /// It is generally safe to load this register even from unprivileged code.
    fn load() -> Self;
}

pub trait StoreRegister {
    /// # Safety
    /// It is generally safe to store this register even from unprivileged code.
    fn store(self);
}

impl<T> LoadRegisterUnsafe for T
where
    T: LoadRegister,
{
    #[inline]
    unsafe fn load_unsafe() -> Self {
        <Self as LoadRegister>::load()
    }
}

impl<T> StoreRegisterUnsafe for T
where
    T: StoreRegister,
{
    #[inline]
    unsafe fn store_unsafe(self) {
        <Self as StoreRegister>::store(self);
    }
}
