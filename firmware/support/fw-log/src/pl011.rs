use core::fmt;
use core::hint::spin_loop;
use core::ptr::{read_volatile, write_volatile};

/// `UARTDR`, in words.
const DATA: usize = 0x00;

/// `UARTFR`, in words.
const FLAGS: usize = 0x18 / 4;

/// `UARTFR.TXFF`: transmit FIFO full.
const TRANSMIT_FULL: u32 = 1 << 5;

/// Transmit side of an ARM PL011 UART.
///
/// Assumes the boot stage already set the baud rate and enabled the UART.
/// Line feeds go out as `\r\n`.
pub struct Pl011 {
    base: *mut u32,
}

// Safety: the registers are only touched through `&mut self`.
unsafe impl Send for Pl011 {}

impl Pl011 {
    /// # Safety
    /// `base` must point at the register block of an enabled PL011 that
    /// nothing else writes to concurrently.
    #[must_use]
    pub const unsafe fn new(base: *mut u32) -> Self {
        Self { base }
    }

    pub fn write_byte(&mut self, byte: u8) {
        unsafe {
            while read_volatile(self.base.add(FLAGS)) & TRANSMIT_FULL != 0 {
                spin_loop();
            }
            write_volatile(self.base.add(DATA), u32::from(byte));
        }
    }
}

impl fmt::Write for Pl011 {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            if b == b'\n' {
                self.write_byte(b'\r');
            }
            self.write_byte(b);
        }
        Ok(())
    }
}
