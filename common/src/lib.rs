use syscall::error::Result;

pub mod io;
pub mod timeout;

mod logger;

pub use logger::{level_from_env, setup_logging};

/// Raises the I/O privilege level of the calling process so it may use `in`/`out` on any port.
#[cfg(all(target_os = "redox", any(target_arch = "x86", target_arch = "x86_64")))]
pub fn acquire_port_io_rights() -> Result<()> {
    unsafe { syscall::iopl(3)? };
    Ok(())
}

#[cfg(not(all(target_os = "redox", any(target_arch = "x86", target_arch = "x86_64"))))]
pub fn acquire_port_io_rights() -> Result<()> {
    Err(syscall::error::Error::new(syscall::error::ENOSYS))
}
