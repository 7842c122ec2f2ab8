// src/lib.rs

//! EGL window-system backend for the Screen compositor.
//!
//! Exposes the `Visual` / `Drawable` / `Context` / `WindowSystem` abstraction
//! a trace-replay engine drives, implemented on top of EGL and the Screen
//! windowing library loaded at run time.

pub mod config;
pub mod display;
pub mod fatal;
pub mod glws;
pub mod platform;
pub mod profile;

pub use config::{Config, CONFIG};
pub use glws::{
    Context, DamageRect, Drawable, EglContext, EglDrawable, EglScreenBackend, EglVisual, PbufferInfo, Visual,
    WindowSystem,
};
pub use profile::{Api, Profile};
