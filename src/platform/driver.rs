// src/platform/driver.rs
//! `NativeDriver` trait - the platform primitives the window-system layer is
//! built from.
//!
//! This trait exposes exactly the EGL and Screen entry points the backend
//! needs, plus loading of client GL libraries. All negotiation and lifecycle
//! logic lives above it (`display`, `glws`), so the trait stays thin:
//! every method maps onto one native call.
//!
//! ## Threading Model
//! Single-threaded. Every call blocks until the driver has completed or
//! failed. Current-binding queries refer to the calling thread.
//!
//! ## Handles
//! Native handles are opaque non-null pointers. "No surface" / "no context"
//! is expressed as `None`.

use anyhow::Result;
use bitflags::bitflags;
use std::ffi::c_void;
use std::path::Path;
use std::ptr::NonNull;

use crate::profile::Api;

macro_rules! native_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(NonNull<c_void>);

        impl $name {
            /// Wraps a raw native handle. Returns `None` for a null handle.
            #[inline]
            pub fn from_raw(raw: *mut c_void) -> Option<Self> {
                NonNull::new(raw).map(Self)
            }

            /// Returns the raw native handle.
            #[inline]
            pub fn as_raw(self) -> *mut c_void {
                self.0.as_ptr()
            }
        }
    };
}

native_handle!(
    /// An initialized EGL display connection.
    DisplayHandle
);
native_handle!(
    /// An EGL frame-buffer configuration.
    ConfigHandle
);
native_handle!(
    /// An EGL window surface.
    SurfaceHandle
);
native_handle!(
    /// An EGL rendering context.
    ContextHandle
);
native_handle!(
    /// A Screen windowing context used to create native windows.
    ScreenContextHandle
);
native_handle!(
    /// A Screen native window.
    WindowHandle
);

bitflags! {
    /// Client APIs a frame-buffer configuration can render with
    /// (`EGL_RENDERABLE_TYPE`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderableType: i32 {
        const OPENGL_ES = 0x0001;
        const OPENVG = 0x0002;
        const OPENGL_ES2 = 0x0004;
        const OPENGL = 0x0008;
        const OPENGL_ES3 = 0x0040;
    }
}

/// Which half of the current binding a surface query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRole {
    Draw,
    Read,
}

/// Integer window properties the backend sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowProperty {
    Usage,
    Format,
    SwapInterval,
    Size,
    Position,
    Visible,
}

/// Minimal platform interface: EGL display/config/surface/context calls,
/// Screen context/window calls and client-library loading.
pub trait NativeDriver {
    // --- EGL display ---

    /// Returns the default display, or `None` if there is none.
    fn get_display(&self) -> Option<DisplayHandle>;

    /// Initializes the display. Returns the driver version on success.
    fn initialize(&self, display: DisplayHandle) -> Option<(i32, i32)>;

    /// Returns the display's space-separated extension string.
    fn query_extensions(&self, display: DisplayHandle) -> String;

    fn terminate(&self, display: DisplayHandle) -> bool;

    /// Selects the client API for the calling thread.
    fn bind_api(&self, api: Api) -> bool;

    // --- Configurations ---

    /// Returns every configuration matching the `EGL_NONE`-terminated
    /// attribute list, in driver order.
    fn choose_configs(&self, display: DisplayHandle, attribs: &[i32]) -> Vec<ConfigHandle>;

    /// Returns the configuration's `EGL_RENDERABLE_TYPE`.
    fn config_renderable_type(&self, display: DisplayHandle, config: ConfigHandle) -> RenderableType;

    // --- Surfaces ---

    fn create_window_surface(
        &self,
        display: DisplayHandle,
        config: ConfigHandle,
        window: WindowHandle,
    ) -> Option<SurfaceHandle>;

    fn destroy_surface(&self, display: DisplayHandle, surface: SurfaceHandle) -> bool;

    /// Returns the surface's actual `(width, height)`.
    fn query_surface_size(&self, display: DisplayHandle, surface: SurfaceHandle) -> (i32, i32);

    fn swap_buffers(&self, display: DisplayHandle, surface: SurfaceHandle) -> bool;

    /// Presents with damage. `rects` is a flat list of `x, y, w, h` quadruples.
    fn swap_buffers_with_damage(
        &self,
        display: DisplayHandle,
        surface: SurfaceHandle,
        rects: &[i32],
    ) -> bool;

    // --- Contexts and current binding ---

    /// Creates a context. `attribs` is `EGL_NONE`-terminated.
    fn create_context(
        &self,
        display: DisplayHandle,
        config: ConfigHandle,
        share: Option<ContextHandle>,
        attribs: &[i32],
    ) -> Option<ContextHandle>;

    fn destroy_context(&self, display: DisplayHandle, context: ContextHandle) -> bool;

    fn make_current(
        &self,
        display: DisplayHandle,
        draw: Option<SurfaceHandle>,
        read: Option<SurfaceHandle>,
        context: Option<ContextHandle>,
    ) -> bool;

    fn current_context(&self) -> Option<ContextHandle>;

    fn current_surface(&self, role: SurfaceRole) -> Option<SurfaceHandle>;

    // --- Synchronization ---

    /// Blocks until client API rendering to current surfaces has completed.
    fn wait_client(&self);

    /// Blocks until native (compositor) rendering has completed.
    fn wait_native(&self);

    // --- Screen ---

    fn create_screen_context(&self) -> Option<ScreenContextHandle>;

    fn destroy_screen_context(&self, context: ScreenContextHandle);

    fn create_window(&self, context: ScreenContextHandle) -> Option<WindowHandle>;

    fn destroy_window(&self, window: WindowHandle);

    fn set_window_property(&self, window: WindowHandle, property: WindowProperty, values: &[i32]) -> bool;

    fn create_window_buffers(&self, window: WindowHandle, count: u32) -> bool;

    /// Marks regions that need not be preserved across the next swap.
    /// `rects` is a flat list of `x, y, w, h` quadruples.
    fn discard_window_regions(&self, window: WindowHandle, rects: &[i32]) -> bool;

    // --- Libraries ---

    /// Loads a shared library into the global symbol namespace so later
    /// `RTLD_NEXT` lookups made by the replay engine resolve against it.
    fn load_library(&self, path: &Path) -> Result<()>;
}
