// src/fatal.rs

//! Conversion of unrecoverable platform errors into process termination.
//!
//! Internally every fatal condition (missing display, failed driver
//! initialization, unloadable library, broken windowing context, surface that
//! cannot be recreated) is an `anyhow::Error` propagated with `?`. The public
//! window-system facade never hands such an error to the replay engine: it
//! logs the full error chain and exits with status 1.

use log::error;

/// Exit status used when the platform is unusable.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Unwraps a result or terminates the process.
pub trait OrExit<T> {
    fn or_exit(self) -> T;
}

impl<T> OrExit<T> for anyhow::Result<T> {
    fn or_exit(self) -> T {
        match self {
            Ok(value) => value,
            Err(e) => {
                error!("error: {:#}", e);
                std::process::exit(FATAL_EXIT_CODE);
            }
        }
    }
}
