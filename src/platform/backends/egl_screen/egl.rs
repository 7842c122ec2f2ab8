// src/platform/backends/egl_screen/egl.rs
#![allow(non_snake_case)] // EGL entry point names

//! EGL constants and the run-time resolved EGL entry points.

use anyhow::{Context, Result};
use libc::{c_char, c_void};
use libloading::os::unix::{Library, RTLD_GLOBAL, RTLD_LAZY};
use log::{debug, info};
use std::ffi::CString;
use std::path::Path;

pub type EGLint = i32;
pub type EGLBoolean = u32;
pub type EGLenum = u32;
pub type EGLDisplay = *mut c_void;
pub type EGLConfig = *mut c_void;
pub type EGLSurface = *mut c_void;
pub type EGLContext = *mut c_void;
pub type EGLNativeWindowType = *mut c_void;

pub const EGL_TRUE: EGLBoolean = 1;
pub const EGL_DEFAULT_DISPLAY: *mut c_void = std::ptr::null_mut();

pub const EGL_NONE: EGLint = 0x3038;
pub const EGL_ALPHA_SIZE: EGLint = 0x3021;
pub const EGL_BLUE_SIZE: EGLint = 0x3022;
pub const EGL_GREEN_SIZE: EGLint = 0x3023;
pub const EGL_RED_SIZE: EGLint = 0x3024;
pub const EGL_DEPTH_SIZE: EGLint = 0x3025;
pub const EGL_STENCIL_SIZE: EGLint = 0x3026;
pub const EGL_SURFACE_TYPE: EGLint = 0x3033;
pub const EGL_RENDERABLE_TYPE: EGLint = 0x3040;
pub const EGL_WINDOW_BIT: EGLint = 0x0004;

pub const EGL_EXTENSIONS: EGLint = 0x3055;
pub const EGL_HEIGHT: EGLint = 0x3056;
pub const EGL_WIDTH: EGLint = 0x3057;
pub const EGL_DRAW: EGLint = 0x3059;
pub const EGL_READ: EGLint = 0x305A;
pub const EGL_CORE_NATIVE_ENGINE: EGLint = 0x305B;

pub const EGL_OPENGL_ES_API: EGLenum = 0x30A0;
pub const EGL_OPENGL_API: EGLenum = 0x30A2;

pub const EGL_CONTEXT_CLIENT_VERSION: EGLint = 0x3098;

// EGL_KHR_create_context
pub const EGL_CONTEXT_MAJOR_VERSION_KHR: EGLint = 0x3098;
pub const EGL_CONTEXT_MINOR_VERSION_KHR: EGLint = 0x30FB;
pub const EGL_CONTEXT_FLAGS_KHR: EGLint = 0x30FC;
pub const EGL_CONTEXT_OPENGL_PROFILE_MASK_KHR: EGLint = 0x30FD;
pub const EGL_CONTEXT_OPENGL_DEBUG_BIT_KHR: EGLint = 0x0001;
pub const EGL_CONTEXT_OPENGL_FORWARD_COMPATIBLE_BIT_KHR: EGLint = 0x0002;
pub const EGL_CONTEXT_OPENGL_CORE_PROFILE_BIT_KHR: EGLint = 0x0001;
pub const EGL_CONTEXT_OPENGL_COMPATIBILITY_PROFILE_BIT_KHR: EGLint = 0x0002;

type GetDisplayFn = unsafe extern "C" fn(*mut c_void) -> EGLDisplay;
type InitializeFn = unsafe extern "C" fn(EGLDisplay, *mut EGLint, *mut EGLint) -> EGLBoolean;
type TerminateFn = unsafe extern "C" fn(EGLDisplay) -> EGLBoolean;
type QueryStringFn = unsafe extern "C" fn(EGLDisplay, EGLint) -> *const c_char;
type BindApiFn = unsafe extern "C" fn(EGLenum) -> EGLBoolean;
type GetConfigsFn = unsafe extern "C" fn(EGLDisplay, *mut EGLConfig, EGLint, *mut EGLint) -> EGLBoolean;
type ChooseConfigFn =
    unsafe extern "C" fn(EGLDisplay, *const EGLint, *mut EGLConfig, EGLint, *mut EGLint) -> EGLBoolean;
type GetConfigAttribFn = unsafe extern "C" fn(EGLDisplay, EGLConfig, EGLint, *mut EGLint) -> EGLBoolean;
type CreateWindowSurfaceFn =
    unsafe extern "C" fn(EGLDisplay, EGLConfig, EGLNativeWindowType, *const EGLint) -> EGLSurface;
type DestroySurfaceFn = unsafe extern "C" fn(EGLDisplay, EGLSurface) -> EGLBoolean;
type QuerySurfaceFn = unsafe extern "C" fn(EGLDisplay, EGLSurface, EGLint, *mut EGLint) -> EGLBoolean;
type SwapBuffersFn = unsafe extern "C" fn(EGLDisplay, EGLSurface) -> EGLBoolean;
type SwapBuffersWithDamageFn =
    unsafe extern "C" fn(EGLDisplay, EGLSurface, *const EGLint, EGLint) -> EGLBoolean;
type CreateContextFn = unsafe extern "C" fn(EGLDisplay, EGLConfig, EGLContext, *const EGLint) -> EGLContext;
type DestroyContextFn = unsafe extern "C" fn(EGLDisplay, EGLContext) -> EGLBoolean;
type MakeCurrentFn = unsafe extern "C" fn(EGLDisplay, EGLSurface, EGLSurface, EGLContext) -> EGLBoolean;
type GetCurrentContextFn = unsafe extern "C" fn() -> EGLContext;
type GetCurrentSurfaceFn = unsafe extern "C" fn(EGLint) -> EGLSurface;
type WaitClientFn = unsafe extern "C" fn() -> EGLBoolean;
type WaitNativeFn = unsafe extern "C" fn(EGLint) -> EGLBoolean;
type GetProcAddressFn = unsafe extern "C" fn(*const c_char) -> *mut c_void;

/// EGL entry points resolved from the EGL library.
///
/// The library is opened with `RTLD_GLOBAL` and kept open for the lifetime of
/// this struct, which keeps every function pointer valid.
pub struct EglLibrary {
    _library: Library,
    pub GetDisplay: GetDisplayFn,
    pub Initialize: InitializeFn,
    pub Terminate: TerminateFn,
    pub QueryString: QueryStringFn,
    pub BindAPI: BindApiFn,
    pub GetConfigs: GetConfigsFn,
    pub ChooseConfig: ChooseConfigFn,
    pub GetConfigAttrib: GetConfigAttribFn,
    pub CreateWindowSurface: CreateWindowSurfaceFn,
    pub DestroySurface: DestroySurfaceFn,
    pub QuerySurface: QuerySurfaceFn,
    pub SwapBuffers: SwapBuffersFn,
    pub CreateContext: CreateContextFn,
    pub DestroyContext: DestroyContextFn,
    pub MakeCurrent: MakeCurrentFn,
    pub GetCurrentContext: GetCurrentContextFn,
    pub GetCurrentSurface: GetCurrentSurfaceFn,
    pub WaitClient: WaitClientFn,
    pub WaitNative: WaitNativeFn,
    pub GetProcAddress: GetProcAddressFn,
    /// `eglSwapBuffersWithDamageKHR` (or the EXT alias), if the driver has it.
    pub SwapBuffersWithDamage: Option<SwapBuffersWithDamageFn>,
}

/// Opens `path` into the global namespace.
pub(crate) fn open_global(path: &Path) -> Result<Library> {
    // SAFETY: loading a shared library runs its initializers; the platform
    // GL/EGL libraries are trusted.
    unsafe { Library::open(Some(path.as_os_str()), RTLD_GLOBAL | RTLD_LAZY) }
        .with_context(|| format!("unable to open {}", path.display()))
}

macro_rules! resolve {
    ($lib:expr, $name:literal, $ty:ty) => {
        // SAFETY: the type alias matches the EGL 1.4 prototype of the symbol.
        *unsafe { $lib.get::<$ty>(concat!($name, "\0").as_bytes()) }
            .with_context(|| format!("missing EGL entry point {}", $name))?
    };
}

impl EglLibrary {
    /// Opens the EGL library and resolves every entry point the backend uses.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading EGL library {}", path.display());
        let library = open_global(path)?;

        let GetProcAddress = resolve!(library, "eglGetProcAddress", GetProcAddressFn);
        let SwapBuffersWithDamage = ["eglSwapBuffersWithDamageKHR", "eglSwapBuffersWithDamageEXT"]
            .iter()
            .find_map(|name| {
                let cname = CString::new(*name).ok()?;
                // SAFETY: eglGetProcAddress accepts any NUL-terminated name.
                let ptr = unsafe { GetProcAddress(cname.as_ptr()) };
                if ptr.is_null() {
                    None
                } else {
                    debug!("Resolved {} via eglGetProcAddress", name);
                    // SAFETY: both names share the same prototype.
                    Some(unsafe { std::mem::transmute::<*mut c_void, SwapBuffersWithDamageFn>(ptr) })
                }
            });

        let egl = EglLibrary {
            GetDisplay: resolve!(library, "eglGetDisplay", GetDisplayFn),
            Initialize: resolve!(library, "eglInitialize", InitializeFn),
            Terminate: resolve!(library, "eglTerminate", TerminateFn),
            QueryString: resolve!(library, "eglQueryString", QueryStringFn),
            BindAPI: resolve!(library, "eglBindAPI", BindApiFn),
            GetConfigs: resolve!(library, "eglGetConfigs", GetConfigsFn),
            ChooseConfig: resolve!(library, "eglChooseConfig", ChooseConfigFn),
            GetConfigAttrib: resolve!(library, "eglGetConfigAttrib", GetConfigAttribFn),
            CreateWindowSurface: resolve!(library, "eglCreateWindowSurface", CreateWindowSurfaceFn),
            DestroySurface: resolve!(library, "eglDestroySurface", DestroySurfaceFn),
            QuerySurface: resolve!(library, "eglQuerySurface", QuerySurfaceFn),
            SwapBuffers: resolve!(library, "eglSwapBuffers", SwapBuffersFn),
            CreateContext: resolve!(library, "eglCreateContext", CreateContextFn),
            DestroyContext: resolve!(library, "eglDestroyContext", DestroyContextFn),
            MakeCurrent: resolve!(library, "eglMakeCurrent", MakeCurrentFn),
            GetCurrentContext: resolve!(library, "eglGetCurrentContext", GetCurrentContextFn),
            GetCurrentSurface: resolve!(library, "eglGetCurrentSurface", GetCurrentSurfaceFn),
            WaitClient: resolve!(library, "eglWaitClient", WaitClientFn),
            WaitNative: resolve!(library, "eglWaitNative", WaitNativeFn),
            GetProcAddress,
            SwapBuffersWithDamage,
            _library: library,
        };
        Ok(egl)
    }
}
