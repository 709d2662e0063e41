//! Bounded reads and writes over a controller's 256-byte address space.
//!
//! Ranges are clipped to the space, and a range starting at or past its end transfers nothing.
//! Bytes go through the protocol engine one at a time, and all bytes of one call run under a
//! single hold of the controller's lock.

use common::io::Io;
use log::trace;

use crate::controller::Controller;
use crate::error::{Error, Result};

pub const EC_SPACE_SIZE: usize = 256;

/// The caller's buffer could not be accessed at some position.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Fault;

/// Destination of a read, addressed relative to the start of the transfer.
pub trait ByteSink {
    fn put(&mut self, pos: usize, byte: u8) -> Result<(), Fault>;
}

/// Source of a write, addressed relative to the start of the transfer.
pub trait ByteSource {
    fn get(&self, pos: usize) -> Result<u8, Fault>;
}

impl ByteSink for [u8] {
    fn put(&mut self, pos: usize, byte: u8) -> Result<(), Fault> {
        *self.get_mut(pos).ok_or(Fault)? = byte;
        Ok(())
    }
}

impl ByteSource for [u8] {
    fn get(&self, pos: usize) -> Result<u8, Fault> {
        <[u8]>::get(self, pos).copied().ok_or(Fault)
    }
}

/// Returns the first address and the clipped length, or `None` past the end of the space.
fn clip(offset: u64, len: usize) -> Option<(usize, usize)> {
    let start = usize::try_from(offset)
        .ok()
        .filter(|&start| start < EC_SPACE_SIZE)?;
    Some((start, len.min(EC_SPACE_SIZE - start)))
}

/// A fault after the first byte ends the transfer early instead of failing it.
fn partial(done: usize) -> Result<usize> {
    if done == 0 {
        Err(Error::Fault)
    } else {
        Ok(done)
    }
}

pub fn read<I, S>(controller: &Controller<I>, offset: u64, len: usize, sink: &mut S) -> Result<usize>
where
    I: Io<Value = u8>,
    S: ByteSink + ?Sized,
{
    let Some((start, len)) = clip(offset, len) else {
        return Ok(0);
    };
    trace!("ecd: {} read {} bytes at {:#04x}", controller.name(), len, start);

    controller.with_lock(|ec| {
        for done in 0..len {
            // start + done < EC_SPACE_SIZE
            let byte = ec.read_byte((start + done) as u8)?;
            if sink.put(done, byte).is_err() {
                return partial(done);
            }
        }
        Ok(len)
    })
}

pub fn write<I, S>(controller: &Controller<I>, offset: u64, len: usize, source: &S) -> Result<usize>
where
    I: Io<Value = u8>,
    S: ByteSource + ?Sized,
{
    let Some((start, len)) = clip(offset, len) else {
        return Ok(0);
    };
    trace!("ecd: {} write {} bytes at {:#04x}", controller.name(), len, start);

    controller.with_lock(|ec| {
        for done in 0..len {
            let Ok(byte) = source.get(done) else {
                return partial(done);
            };
            ec.write_byte((start + done) as u8, byte)?;
        }
        Ok(len)
    })
}
