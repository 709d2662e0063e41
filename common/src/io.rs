use core::{
    cmp::PartialEq,
    ops::{BitAnd, BitOr, Not},
};

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod pio;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub use pio::*;

/// A single hardware register.
///
/// Implemented by real port I/O as well as by simulated devices, so that register protocols can
/// be written once against this trait.
pub trait Io {
    /// Value type for IO, usually some unsigned number
    type Value: Copy
        + PartialEq
        + BitAnd<Output = Self::Value>
        + BitOr<Output = Self::Value>
        + Not<Output = Self::Value>;

    fn read(&self) -> Self::Value;
    fn write(&mut self, value: Self::Value);

    /// Check whether all of `flags` are set in the current value
    #[inline(always)]
    fn readf(&self, flags: Self::Value) -> bool {
        (self.read() & flags) == flags
    }
}

/// Read-only IO
///
/// Used where a read and a write at the same address reach different registers, such as a
/// status register that shares its port with a command register.
#[repr(transparent)]
pub struct ReadOnly<I> {
    inner: I,
}

impl<I: Io> ReadOnly<I> {
    pub const fn new(inner: I) -> ReadOnly<I> {
        ReadOnly { inner }
    }

    #[inline(always)]
    pub fn read(&self) -> I::Value {
        self.inner.read()
    }

    #[inline(always)]
    pub fn readf(&self, flags: I::Value) -> bool {
        self.inner.readf(flags)
    }
}

/// Write-only IO
#[repr(transparent)]
pub struct WriteOnly<I> {
    inner: I,
}

impl<I: Io> WriteOnly<I> {
    pub const fn new(inner: I) -> WriteOnly<I> {
        WriteOnly { inner }
    }

    #[inline(always)]
    pub fn write(&mut self, value: I::Value) {
        self.inner.write(value)
    }
}
