// src/platform/backends/egl_screen/screen.rs
#![allow(non_camel_case_types)] // Screen C type names

//! Screen windowing constants and run-time resolved entry points.

use anyhow::{Context, Result};
use libc::{c_int, c_void};
use libloading::os::unix::Library;
use log::info;
use std::path::Path;

use super::egl::open_global;
use crate::platform::driver::WindowProperty;

pub type screen_context_t = *mut c_void;
pub type screen_window_t = *mut c_void;

pub const SCREEN_APPLICATION_CONTEXT: c_int = 0;

pub const SCREEN_PROPERTY_FORMAT: c_int = 14;
pub const SCREEN_PROPERTY_POSITION: c_int = 35;
pub const SCREEN_PROPERTY_SIZE: c_int = 40;
pub const SCREEN_PROPERTY_SWAP_INTERVAL: c_int = 46;
pub const SCREEN_PROPERTY_USAGE: c_int = 48;
pub const SCREEN_PROPERTY_VISIBLE: c_int = 51;

pub const SCREEN_USAGE_OPENGL_ES2: c_int = 1 << 5;
pub const SCREEN_USAGE_OPENGL_ES3: c_int = 1 << 11;

pub const SCREEN_FORMAT_RGBA8888: c_int = 8;

/// Maps a backend window property onto its Screen property name.
pub fn property_name(property: WindowProperty) -> c_int {
    match property {
        WindowProperty::Usage => SCREEN_PROPERTY_USAGE,
        WindowProperty::Format => SCREEN_PROPERTY_FORMAT,
        WindowProperty::SwapInterval => SCREEN_PROPERTY_SWAP_INTERVAL,
        WindowProperty::Size => SCREEN_PROPERTY_SIZE,
        WindowProperty::Position => SCREEN_PROPERTY_POSITION,
        WindowProperty::Visible => SCREEN_PROPERTY_VISIBLE,
    }
}

type CreateContextFn = unsafe extern "C" fn(*mut screen_context_t, c_int) -> c_int;
type DestroyContextFn = unsafe extern "C" fn(screen_context_t) -> c_int;
type CreateWindowFn = unsafe extern "C" fn(*mut screen_window_t, screen_context_t) -> c_int;
type DestroyWindowFn = unsafe extern "C" fn(screen_window_t) -> c_int;
type SetWindowPropertyIvFn = unsafe extern "C" fn(screen_window_t, c_int, *const c_int) -> c_int;
type CreateWindowBuffersFn = unsafe extern "C" fn(screen_window_t, c_int) -> c_int;
type DiscardWindowRegionsFn = unsafe extern "C" fn(screen_window_t, c_int, *const c_int) -> c_int;

/// Screen entry points. Every call returns 0 on success and -1 on failure.
pub struct ScreenLibrary {
    _library: Library,
    pub create_context: CreateContextFn,
    pub destroy_context: DestroyContextFn,
    pub create_window: CreateWindowFn,
    pub destroy_window: DestroyWindowFn,
    pub set_window_property_iv: SetWindowPropertyIvFn,
    pub create_window_buffers: CreateWindowBuffersFn,
    pub discard_window_regions: DiscardWindowRegionsFn,
}

macro_rules! resolve {
    ($lib:expr, $name:literal, $ty:ty) => {
        // SAFETY: the type alias matches the libscreen prototype of the symbol.
        *unsafe { $lib.get::<$ty>(concat!($name, "\0").as_bytes()) }
            .with_context(|| format!("missing Screen entry point {}", $name))?
    };
}

impl ScreenLibrary {
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading Screen library {}", path.display());
        let library = open_global(path)?;
        Ok(ScreenLibrary {
            create_context: resolve!(library, "screen_create_context", CreateContextFn),
            destroy_context: resolve!(library, "screen_destroy_context", DestroyContextFn),
            create_window: resolve!(library, "screen_create_window", CreateWindowFn),
            destroy_window: resolve!(library, "screen_destroy_window", DestroyWindowFn),
            set_window_property_iv: resolve!(library, "screen_set_window_property_iv", SetWindowPropertyIvFn),
            create_window_buffers: resolve!(library, "screen_create_window_buffers", CreateWindowBuffersFn),
            discard_window_regions: resolve!(library, "screen_discard_window_regions", DiscardWindowRegionsFn),
            _library: library,
        })
    }
}
