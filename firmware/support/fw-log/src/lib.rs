//! # Early Firmware Logging
//!
//! A [`log`] backend for code that runs before any console driver exists.
//! Records are formatted without allocation straight into a
//! [`core::fmt::Write`] sink, usually the [`Pl011`] UART that QEMU `virt`
//! and the Raspberry Pi both expose.
//!
//! ```rust,no_run
//! use fw_log::{FirmwareLogger, Pl011};
//! use log::LevelFilter;
//!
//! static LOGGER: FirmwareLogger<Pl011> =
//!     FirmwareLogger::new(LevelFilter::Debug, unsafe { Pl011::new(0x0900_0000 as *mut u32) });
//!
//! LOGGER.init().expect("logger installed once");
//! log::info!("MMU enabled");
//! ```
//!
//! Each record becomes one line: `[LEVEL] target: message`.
//!
//! ## Features
//! - `enabled` (default): write records. Without it the logger still
//!   filters but never touches the sink.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(unsafe_code)]

mod lock;
mod logger;
mod pl011;

pub use lock::{SpinLock, SpinLockGuard};
pub use logger::FirmwareLogger;
pub use pl011::Pl011;
