// src/display/mod.rs

//! The display session: the single process-wide connection to the
//! platform's graphics service and the capability flags negotiated with it.

pub mod extensions;
pub mod session;

pub use extensions::{check_extension, Extensions};
pub use session::DisplaySession;
