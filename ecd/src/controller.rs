use std::fmt;
use std::sync::{Arc, Weak};

use common::io::Io;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::access::{self, ByteSink, ByteSource, EC_SPACE_SIZE};
use crate::ec::Ec;
use crate::error::{Error, Result};

/// Location of a controller's two registers.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
pub struct Ports {
    /// Command register on write, status register on read
    pub command: u16,
    pub data: u16,
}

impl fmt::Display for Ports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command {:#04x} data {:#04x}", self.command, self.data)
    }
}

/// One registered embedded controller.
///
/// The protocol engine is only reachable through [`Controller::with_lock`], so at most one
/// transaction runs against the registers at a time.
pub struct Controller<I: Io<Value = u8>> {
    index: usize,
    ports: Ports,
    ec: Mutex<Ec<I>>,
}

impl<I: Io<Value = u8>> Controller<I> {
    pub fn new(index: usize, ports: Ports, ec: Ec<I>) -> Self {
        Controller {
            index,
            ports,
            ec: Mutex::new(ec),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn ports(&self) -> Ports {
        self.ports
    }

    /// Name of the exposed device, `ec0` for the primary controller.
    pub fn name(&self) -> String {
        format!("ec{}", self.index)
    }

    pub fn size(&self) -> usize {
        EC_SPACE_SIZE
    }

    /// Runs `f` with exclusive access to the registers. The lock is released when `f` returns,
    /// whether it succeeded, failed or panicked.
    pub fn with_lock<T>(&self, f: impl FnOnce(&mut Ec<I>) -> T) -> T {
        let mut ec = self.ec.lock();
        f(&mut ec)
    }
}

/// A caller's reference to a registered controller.
///
/// Handles do not keep the controller alive. Once the registry is shut down, every operation on
/// an outstanding handle fails with [`Error::InvalidArgument`].
pub struct Handle<I: Io<Value = u8>> {
    index: usize,
    controller: Weak<Controller<I>>,
}

impl<I: Io<Value = u8>> Handle<I> {
    pub fn new(controller: &Arc<Controller<I>>) -> Self {
        Handle {
            index: controller.index(),
            controller: Arc::downgrade(controller),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn controller(&self) -> Result<Arc<Controller<I>>> {
        self.controller.upgrade().ok_or(Error::InvalidArgument)
    }

    pub fn read(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let len = buf.len();
        self.read_into(offset, len, buf)
    }

    pub fn write(&self, offset: u64, buf: &[u8]) -> Result<usize> {
        self.write_from(offset, buf.len(), buf)
    }

    pub fn read_into<S: ByteSink + ?Sized>(
        &self,
        offset: u64,
        len: usize,
        sink: &mut S,
    ) -> Result<usize> {
        access::read(&*self.controller()?, offset, len, sink)
    }

    pub fn write_from<S: ByteSource + ?Sized>(
        &self,
        offset: u64,
        len: usize,
        source: &S,
    ) -> Result<usize> {
        access::write(&*self.controller()?, offset, len, source)
    }

    /// Reads up to `len` bytes at `offset` into a new buffer, truncated to what was transferred.
    pub fn read_vec(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut data = vec![0; len.min(EC_SPACE_SIZE)];
        let count = self.read(offset, &mut data)?;
        data.truncate(count);
        Ok(data)
    }
}

impl<I: Io<Value = u8>> Clone for Handle<I> {
    fn clone(&self) -> Self {
        Handle {
            index: self.index,
            controller: Weak::clone(&self.controller),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::sim::SimEc;

    const PORTS: Ports = Ports {
        command: 0x66,
        data: 0x62,
    };

    #[test]
    fn identity() {
        let controller = Controller::new(3, PORTS, SimEc::new().ec());
        assert_eq!(controller.index(), 3);
        assert_eq!(controller.name(), "ec3");
        assert_eq!(controller.size(), 256);
        assert_eq!(controller.ports().to_string(), "command 0x66 data 0x62");
    }

    #[test]
    fn lock_released_after_timeout() {
        let sim = SimEc::new();
        let mut ec = sim.ec();
        ec.set_timeout(Duration::from_millis(20));
        let controller = Controller::new(0, PORTS, ec);

        sim.set_stuck(true);
        assert_eq!(
            controller.with_lock(|ec| ec.read_byte(0)),
            Err(Error::Timeout)
        );

        sim.set_stuck(false);
        sim.poke(0, 0x5A);
        assert_eq!(controller.with_lock(|ec| ec.read_byte(0)), Ok(0x5A));
    }

    #[test]
    fn lock_released_after_panic() {
        let controller = Arc::new(Controller::new(0, PORTS, SimEc::new().ec()));

        let poisoner = Arc::clone(&controller);
        let result = thread::spawn(move || poisoner.with_lock(|_| panic!("transaction panicked")))
            .join();
        assert!(result.is_err());

        assert_eq!(controller.with_lock(|ec| ec.read_byte(0)), Ok(0));
    }

    #[test]
    fn handle_outliving_controller() {
        let sim = SimEc::new();
        sim.poke(7, 0x77);
        let controller = Arc::new(Controller::new(0, PORTS, sim.ec()));
        let handle = Handle::new(&controller);

        assert_eq!(handle.read_vec(7, 1).unwrap(), [0x77]);

        drop(controller);
        let mut buf = [0; 1];
        assert_eq!(handle.read(7, &mut buf), Err(Error::InvalidArgument));
        assert_eq!(handle.write(7, &buf), Err(Error::InvalidArgument));
    }
}
