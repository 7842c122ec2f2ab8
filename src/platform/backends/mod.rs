// src/platform/backends/mod.rs

//! `NativeDriver` implementations.
//!
//! `egl_screen` drives the real platform through run-time loaded EGL and
//! Screen libraries. `mock` is a recording fake used by the tests.

pub mod egl_screen;
#[cfg(test)]
pub mod mock;

pub use egl_screen::EglScreenDriver;
