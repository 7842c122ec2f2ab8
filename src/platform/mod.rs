// src/platform/mod.rs
//
// Native platform layer: the `NativeDriver` trait and its implementations.

pub mod backends;
pub mod driver;

pub use driver::{
    ConfigHandle, ContextHandle, DisplayHandle, NativeDriver, RenderableType, ScreenContextHandle,
    SurfaceHandle, SurfaceRole, WindowHandle, WindowProperty,
};
