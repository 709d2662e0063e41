use std::time::{Duration, Instant};

/// A wall-clock deadline for polling loops.
///
/// [`Timeout::run`] issues a CPU spin hint between polls and never yields or sleeps.
pub struct Timeout {
    instant: Instant,
    duration: Duration,
}

impl Timeout {
    #[inline]
    pub fn new(duration: Duration) -> Self {
        Self {
            instant: Instant::now(),
            duration,
        }
    }

    #[inline]
    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    #[inline]
    pub fn run(&self) -> Result<(), ()> {
        if self.instant.elapsed() < self.duration {
            core::hint::spin_loop();
            Ok(())
        } else {
            Err(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires() {
        let timeout = Timeout::new(Duration::from_millis(20));
        let start = Instant::now();
        while timeout.run().is_ok() {}
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn zero_expires_immediately() {
        assert!(Timeout::new(Duration::ZERO).run().is_err());
    }

    #[test]
    fn runs_before_deadline() {
        assert!(Timeout::from_secs(60).run().is_ok());
    }
}
