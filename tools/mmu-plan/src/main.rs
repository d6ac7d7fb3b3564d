//! Runs the MMU configuration of a platform on the host and prints the
//! resulting table layout and register values.
//!
//! ```text
//! mmu-plan <platform> [el1|el2] [off|error|warn|info|debug|trace]
//! ```

mod plan;
mod sim;

use arm_mmu::arm_registers::aarch64::ExceptionLevel;
use fw_log::FirmwareLogger;
use log::LevelFilter;
use std::fmt;
use std::process::ExitCode;
use std::{env, io};

/// Log sink writing to standard error.
struct Stderr;

impl fmt::Write for Stderr {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        use std::io::Write;
        io::stderr().write_all(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

fn usage() -> ExitCode {
    let names: Vec<_> = fw_platform::ALL.iter().map(|p| p.name).collect();
    eprintln!("usage: mmu-plan <{}> [el1|el2] [off|error|warn|info|debug|trace]", names.join("|"));
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let mut args = env::args().skip(1);
    let Some(platform) = args.next().as_deref().and_then(fw_platform::by_name) else {
        return usage();
    };
    let el = match args.next().as_deref() {
        None | Some("el2") => ExceptionLevel::El2,
        Some("el1") => ExceptionLevel::El1,
        Some(_) => return usage(),
    };
    let Ok(level) = args.next().as_deref().map_or(Ok(LevelFilter::Info), str::parse) else {
        return usage();
    };

    let logger: &'static FirmwareLogger<Stderr> = Box::leak(Box::new(FirmwareLogger::new(level, Stderr)));
    if logger.init().is_err() {
        eprintln!("a logger is already installed");
    }

    match plan::run(platform, el) {
        Ok(report) => {
            print!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {e}", platform.name);
            ExitCode::FAILURE
        }
    }
}
