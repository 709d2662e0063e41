use std::time::Duration;

use bitflags::bitflags;
use common::io::{Io, ReadOnly, WriteOnly};
use common::timeout::Timeout;
use log::{debug, trace};

use crate::error::{Error, Result};

/// Deadline for every individual wait of the handshake.
pub const EC_TIMEOUT: Duration = Duration::from_secs(1);

bitflags! {
    pub struct StatusFlags: u8 {
        const OUTPUT_FULL = 1;
        const INPUT_FULL = 1 << 1;
        // Last write went to the command register
        const COMMAND = 1 << 3;
        const BURST = 1 << 4;
        const SCI_EVENT = 1 << 5;
        const SMI_EVENT = 1 << 6;
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Command {
    Read = 0x80,
    Write = 0x81,
}

impl Command {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x80 => Some(Command::Read),
            0x81 => Some(Command::Write),
            _ => None,
        }
    }
}

/// The polled command/data handshake of one embedded controller.
///
/// Status and command share an address: reads return status, writes issue a command.
pub struct Ec<I: Io<Value = u8>> {
    data: I,
    status: ReadOnly<I>,
    command: WriteOnly<I>,
    timeout: Duration,
}

impl<I: Io<Value = u8>> Ec<I> {
    pub fn new(data: I, status: I, command: I) -> Self {
        Ec {
            data,
            status: ReadOnly::new(status),
            command: WriteOnly::new(command),
            timeout: EC_TIMEOUT,
        }
    }

    /// Overrides [`EC_TIMEOUT`]. Only meant for simulated controllers.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn status(&self) -> StatusFlags {
        StatusFlags::from_bits_truncate(self.status.read())
    }

    fn wait_read(&self) -> Result<()> {
        let timeout = Timeout::new(self.timeout);
        loop {
            if self.status().contains(StatusFlags::OUTPUT_FULL) {
                return Ok(());
            }
            timeout.run().map_err(|()| {
                debug!("ecd: timed out waiting for output, status {:?}", self.status());
                Error::Timeout
            })?
        }
    }

    fn wait_write(&self) -> Result<()> {
        let timeout = Timeout::new(self.timeout);
        loop {
            if !self.status().contains(StatusFlags::INPUT_FULL) {
                return Ok(());
            }
            timeout.run().map_err(|()| {
                debug!("ecd: timed out waiting for input, status {:?}", self.status());
                Error::Timeout
            })?
        }
    }

    fn command(&mut self, command: Command) -> Result<()> {
        self.wait_write()?;
        self.command.write(command as u8);
        Ok(())
    }

    fn write(&mut self, data: u8) -> Result<()> {
        self.wait_write()?;
        self.data.write(data);
        Ok(())
    }

    pub fn read_byte(&mut self, addr: u8) -> Result<u8> {
        self.command(Command::Read)?;
        self.write(addr)?;
        self.wait_read()?;
        let value = self.data.read();
        trace!("ecd: read {:#04x} = {:#04x}", addr, value);
        Ok(value)
    }

    pub fn write_byte(&mut self, addr: u8, value: u8) -> Result<()> {
        self.command(Command::Write)?;
        self.write(addr)?;
        self.write(value)?;
        // The controller must consume the value before the next transaction may start
        self.wait_write()?;
        trace!("ecd: write {:#04x} = {:#04x}", addr, value);
        Ok(())
    }
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
impl Ec<common::io::Pio<u8>> {
    pub fn from_ports(ports: crate::controller::Ports) -> Self {
        use common::io::Pio;

        Ec::new(
            Pio::new(ports.data),
            Pio::new(ports.command),
            Pio::new(ports.command),
        )
    }
}
