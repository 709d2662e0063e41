use core::arch::asm;
use core::marker::PhantomData;

use super::Io;

/// An x86 I/O port
#[derive(Copy, Clone, Debug)]
pub struct Pio<T> {
    port: u16,
    value: PhantomData<T>,
}

impl<T> Pio<T> {
    pub const fn new(port: u16) -> Self {
        Pio {
            port,
            value: PhantomData,
        }
    }

    pub const fn port(&self) -> u16 {
        self.port
    }
}

/// Byte-wide port access; requires I/O privileges, see `acquire_port_io_rights`.
impl Io for Pio<u8> {
    type Value = u8;

    #[inline(always)]
    fn read(&self) -> u8 {
        let value: u8;
        unsafe {
            asm!("in al, dx", in("dx") self.port, out("al") value, options(nostack, nomem, preserves_flags));
        }
        value
    }

    #[inline(always)]
    fn write(&mut self, value: u8) {
        unsafe {
            asm!("out dx, al", in("dx") self.port, in("al") value, options(nostack, nomem, preserves_flags));
        }
    }
}
