//! Logging helpers for `Result` and `Option`.
//!
//! Used where a failure must be recorded but must not stop a batch, such
//! as one integration failing during a scheduler cycle.

use std::fmt::Display;
use tracing::error;

/// Extension trait for logging errors with context.
pub trait ResultExt<T, E> {
    /// Log the error with context if this is an `Err` variant.
    ///
    /// The `Result` is returned unchanged.
    ///
    /// ```ignore
    /// use recall_core::ResultExt;
    ///
    /// let result: Result<i32, &str> = Err("token revoked");
    /// let _ = result.log("listing notion pages");
    /// ```
    fn log<S: ToString>(self, context: S) -> Result<T, E>;

    /// Log the error and turn the result into an `Option`.
    fn log_ok<S: ToString>(self, context: S) -> Option<T>;
}

impl<T, E: Display> ResultExt<T, E> for Result<T, E> {
    #[track_caller]
    fn log<S: ToString>(self, context: S) -> Result<T, E> {
        if let Err(ref e) = self {
            let caller_location = std::panic::Location::caller();
            error!(
                target: "recall",
                error = %e,
                file = %format!("{}:{}", caller_location.file(), caller_location.line()),
                context = %context.to_string(),
                "Operation failed"
            );
        }
        self
    }

    #[track_caller]
    fn log_ok<S: ToString>(self, context: S) -> Option<T> {
        self.log(context).ok()
    }
}

/// Extension trait for logging a missing value.
pub trait OptionExt<T> {
    /// Log if this is a `None` variant.
    fn log_none<S: ToString>(self, context: S) -> Option<T>;
}

impl<T> OptionExt<T> for Option<T> {
    #[track_caller]
    fn log_none<S: ToString>(self, context: S) -> Option<T> {
        if self.is_none() {
            let caller_location = std::panic::Location::caller();
            tracing::warn!(
                target: "recall",
                file = %format!("{}:{}", caller_location.file(), caller_location.line()),
                context = %context.to_string(),
                "Expected value was None"
            );
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_ext_ok() {
        let result: Result<i32, &str> = Ok(42);
        assert_eq!(result.log("listing").unwrap(), 42);
    }

    #[test]
    fn test_result_ext_err() {
        let result: Result<i32, &str> = Err("boom");
        assert!(result.log("listing").is_err());
    }

    #[test]
    fn test_log_ok_discards_error() {
        let result: Result<i32, &str> = Err("boom");
        assert_eq!(result.log_ok("listing"), None);
    }

    #[test]
    fn test_option_ext_none() {
        let opt: Option<i32> = None;
        assert!(opt.log_none("integration lookup").is_none());
    }
}
