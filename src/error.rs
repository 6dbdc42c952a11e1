use thiserror::Error;

/// User-initiated abort, raised by any interactive prompt on Escape or Ctrl-C.
///
/// Propagates through the session loop like any other error; the process
/// boundary downcasts it to exit cleanly instead of reporting a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled by the user")]
pub struct Cancelled;

impl Cancelled {
    /// True if `err` is, or wraps, a user cancellation.
    pub fn caused(err: &anyhow::Error) -> bool {
        err.downcast_ref::<Cancelled>().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_detected_through_context_chain() {
        let err = anyhow::Error::from(Cancelled).context("selecting application");
        assert!(Cancelled::caused(&err));
    }

    #[test]
    fn test_other_errors_are_not_cancellation() {
        let err = anyhow::anyhow!("network unreachable");
        assert!(!Cancelled::caused(&err));
    }
}
