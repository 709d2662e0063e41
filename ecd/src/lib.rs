//! Access to ACPI embedded controllers.
//!
//! Every controller exposes a 256-byte register space behind a polled command/data port
//! handshake. [`Registry`] discovers up to [`MAX_EC_DEVICES`] controllers and hands out
//! [`Handle`]s; reads and writes through a handle are clipped to the space and serialized per
//! controller.

pub mod access;
pub mod config;
pub mod controller;
pub mod ec;
pub mod error;
pub mod files;
pub mod registry;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use access::{ByteSink, ByteSource, Fault, EC_SPACE_SIZE};
pub use controller::{Controller, Handle, Ports};
pub use ec::{Ec, StatusFlags, EC_TIMEOUT};
pub use error::{Error, Result};
pub use registry::{Discovery, Expose, PortList, Registry, MAX_EC_DEVICES};
