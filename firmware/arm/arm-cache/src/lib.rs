//! # ARM Cache and TLB Maintenance
//!
//! The primitives needed around a change of the translation regime:
//!
//! - whole data cache clean and invalidate by set/way, walking every data or
//!   unified cache level up to the Level of Coherency,
//! - instruction cache and TLB invalidation,
//! - memory barriers,
//! - an [`IrqGuard`] masking IRQ and FIQ while set/way maintenance runs.
//!
//! The set/way arithmetic in [`set_way`] is target independent. Everything
//! that executes system instructions is compiled for `aarch64` or `arm` only.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

pub mod set_way;

#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
pub mod irq;

#[cfg(target_arch = "aarch64")]
pub mod aarch64;

#[cfg(target_arch = "arm")]
pub mod armv7;

#[cfg(any(target_arch = "aarch64", target_arch = "arm"))]
pub use irq::IrqGuard;
