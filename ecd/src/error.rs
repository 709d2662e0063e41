use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum Error {
    /// No primary controller was discovered; nothing was registered.
    #[error("no embedded controller found")]
    NoDevice,

    /// Exposing the controller with this index failed, and every earlier registration was undone.
    #[error("failed to create device for ec{0}")]
    ResourceCreationFailed(usize),

    /// The request referred to a controller that is not (or no longer) registered.
    #[error("invalid argument")]
    InvalidArgument,

    /// A status flag did not reach the expected state before the deadline.
    #[error("embedded controller timed out")]
    Timeout,

    /// The caller's buffer could not be accessed at the first byte of a transfer.
    #[error("bad address")]
    Fault,
}

impl From<Error> for syscall::Error {
    fn from(err: Error) -> Self {
        syscall::Error::new(match err {
            Error::NoDevice => syscall::ENODEV,
            Error::ResourceCreationFailed(_) => syscall::EIO,
            Error::InvalidArgument => syscall::EINVAL,
            Error::Timeout => syscall::ETIME,
            Error::Fault => syscall::EFAULT,
        })
    }
}
