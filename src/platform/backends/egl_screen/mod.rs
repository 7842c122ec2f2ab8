// src/platform/backends/egl_screen/mod.rs

//! Production `NativeDriver`: EGL on top of the Screen windowing system.
//!
//! Both libraries are opened at run time with global symbol visibility, so
//! the replay engine's own `dlsym(RTLD_NEXT, ...)` lookups see the same
//! implementation this backend drives.

pub mod egl;
pub mod screen;

use anyhow::Result;
use libc::{c_int, c_void};
use libloading::os::unix::Library;
use log::{debug, info, trace, warn};
use std::cell::RefCell;
use std::ffi::CStr;
use std::path::{Path, PathBuf};
use std::ptr;

use self::egl::*;
use self::screen::*;
use crate::config::LibraryConfig;
use crate::platform::driver::{
    ConfigHandle, ContextHandle, DisplayHandle, NativeDriver, RenderableType, ScreenContextHandle,
    SurfaceHandle, SurfaceRole, WindowHandle, WindowProperty,
};
use crate::profile::Api;

/// Interprets an `eglGetConfigAttrib(EGL_RENDERABLE_TYPE)` result. A failed
/// query leaves `value` untouched, so it must not be read as API bits.
fn renderable_type_from_query(ok: EGLBoolean, value: EGLint) -> RenderableType {
    if ok == EGL_TRUE {
        RenderableType::from_bits_retain(value)
    } else {
        RenderableType::empty()
    }
}

fn raw_or_null<H>(handle: Option<H>, as_raw: fn(H) -> *mut c_void) -> *mut c_void {
    handle.map_or(ptr::null_mut(), as_raw)
}

/// Drives EGL and Screen through run-time resolved entry points.
pub struct EglScreenDriver {
    egl: EglLibrary,
    screen: ScreenLibrary,
    /// Client libraries kept open for the lifetime of the driver.
    client_libraries: RefCell<Vec<(PathBuf, Library)>>,
}

impl EglScreenDriver {
    /// Opens the EGL and Screen libraries named by `libraries`.
    ///
    /// # Returns
    ///
    /// * `Ok(EglScreenDriver)` with every required entry point resolved.
    /// * `Err(anyhow::Error)` if either library cannot be opened or lacks a symbol.
    pub fn load(libraries: &LibraryConfig) -> Result<Self> {
        let egl = EglLibrary::load(&libraries.egl)?;
        let screen = ScreenLibrary::load(&libraries.screen)?;
        info!("EGL/Screen driver libraries loaded.");
        Ok(Self {
            egl,
            screen,
            client_libraries: RefCell::new(Vec::new()),
        })
    }
}

impl NativeDriver for EglScreenDriver {
    fn get_display(&self) -> Option<DisplayHandle> {
        // SAFETY: EGL_DEFAULT_DISPLAY is always a valid argument.
        DisplayHandle::from_raw(unsafe { (self.egl.GetDisplay)(EGL_DEFAULT_DISPLAY) })
    }

    fn initialize(&self, display: DisplayHandle) -> Option<(i32, i32)> {
        let (mut major, mut minor) = (0, 0);
        // SAFETY: display came from eglGetDisplay; out-params are valid.
        let ok = unsafe { (self.egl.Initialize)(display.as_raw(), &mut major, &mut minor) };
        (ok == EGL_TRUE).then_some((major, minor))
    }

    fn query_extensions(&self, display: DisplayHandle) -> String {
        // SAFETY: display is initialized; the returned string is static.
        let raw = unsafe { (self.egl.QueryString)(display.as_raw(), EGL_EXTENSIONS) };
        if raw.is_null() {
            warn!("eglQueryString(EGL_EXTENSIONS) returned null");
            return String::new();
        }
        // SAFETY: non-null, NUL-terminated, owned by the driver.
        unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned()
    }

    fn terminate(&self, display: DisplayHandle) -> bool {
        // SAFETY: display came from eglGetDisplay.
        unsafe { (self.egl.Terminate)(display.as_raw()) == EGL_TRUE }
    }

    fn bind_api(&self, api: Api) -> bool {
        let api = match api {
            Api::Gl => EGL_OPENGL_API,
            Api::Gles => EGL_OPENGL_ES_API,
        };
        // SAFETY: plain enum argument.
        unsafe { (self.egl.BindAPI)(api) == EGL_TRUE }
    }

    fn choose_configs(&self, display: DisplayHandle, attribs: &[i32]) -> Vec<ConfigHandle> {
        debug_assert_eq!(attribs.last(), Some(&EGL_NONE));
        let mut total: EGLint = 0;
        // SAFETY: null config array with size 0 only queries the count.
        let ok = unsafe { (self.egl.GetConfigs)(display.as_raw(), ptr::null_mut(), 0, &mut total) };
        if ok != EGL_TRUE || total <= 0 {
            return Vec::new();
        }

        let mut configs: Vec<EGLConfig> = vec![ptr::null_mut(); total as usize];
        let mut matched: EGLint = 0;
        // SAFETY: configs has room for `total` entries; attribs is EGL_NONE-terminated.
        let ok = unsafe {
            (self.egl.ChooseConfig)(display.as_raw(), attribs.as_ptr(), configs.as_mut_ptr(), total, &mut matched)
        };
        if ok != EGL_TRUE || matched <= 0 {
            return Vec::new();
        }
        configs.truncate(matched as usize);
        configs.into_iter().filter_map(ConfigHandle::from_raw).collect()
    }

    fn config_renderable_type(&self, display: DisplayHandle, config: ConfigHandle) -> RenderableType {
        let mut value: EGLint = 0;
        // SAFETY: config was returned by eglChooseConfig on this display.
        let ok = unsafe {
            (self.egl.GetConfigAttrib)(display.as_raw(), config.as_raw(), EGL_RENDERABLE_TYPE, &mut value)
        };
        if ok != EGL_TRUE {
            warn!("eglGetConfigAttrib(EGL_RENDERABLE_TYPE) failed for {:?}", config);
        }
        renderable_type_from_query(ok, value)
    }

    fn create_window_surface(
        &self,
        display: DisplayHandle,
        config: ConfigHandle,
        window: WindowHandle,
    ) -> Option<SurfaceHandle> {
        // SAFETY: window is a live screen_window_t; no attribute list.
        SurfaceHandle::from_raw(unsafe {
            (self.egl.CreateWindowSurface)(display.as_raw(), config.as_raw(), window.as_raw(), ptr::null())
        })
    }

    fn destroy_surface(&self, display: DisplayHandle, surface: SurfaceHandle) -> bool {
        // SAFETY: surface is owned by the caller and not used afterwards.
        unsafe { (self.egl.DestroySurface)(display.as_raw(), surface.as_raw()) == EGL_TRUE }
    }

    fn query_surface_size(&self, display: DisplayHandle, surface: SurfaceHandle) -> (i32, i32) {
        let (mut width, mut height) = (0, 0);
        // SAFETY: surface is live; out-params are valid.
        unsafe {
            (self.egl.QuerySurface)(display.as_raw(), surface.as_raw(), EGL_WIDTH, &mut width);
            (self.egl.QuerySurface)(display.as_raw(), surface.as_raw(), EGL_HEIGHT, &mut height);
        }
        (width, height)
    }

    fn swap_buffers(&self, display: DisplayHandle, surface: SurfaceHandle) -> bool {
        // SAFETY: surface is live.
        unsafe { (self.egl.SwapBuffers)(display.as_raw(), surface.as_raw()) == EGL_TRUE }
    }

    fn swap_buffers_with_damage(&self, display: DisplayHandle, surface: SurfaceHandle, rects: &[i32]) -> bool {
        let Some(swap) = self.egl.SwapBuffersWithDamage else {
            warn!("swap with damage requested but no entry point was resolved");
            return false;
        };
        // SAFETY: rects holds rects.len() / 4 quadruples.
        unsafe { swap(display.as_raw(), surface.as_raw(), rects.as_ptr(), (rects.len() / 4) as EGLint) == EGL_TRUE }
    }

    fn create_context(
        &self,
        display: DisplayHandle,
        config: ConfigHandle,
        share: Option<ContextHandle>,
        attribs: &[i32],
    ) -> Option<ContextHandle> {
        debug_assert_eq!(attribs.last(), Some(&EGL_NONE));
        // SAFETY: attribs is EGL_NONE-terminated; share is null or a live context.
        ContextHandle::from_raw(unsafe {
            (self.egl.CreateContext)(
                display.as_raw(),
                config.as_raw(),
                raw_or_null(share, ContextHandle::as_raw),
                attribs.as_ptr(),
            )
        })
    }

    fn destroy_context(&self, display: DisplayHandle, context: ContextHandle) -> bool {
        // SAFETY: context is owned by the caller and not used afterwards.
        unsafe { (self.egl.DestroyContext)(display.as_raw(), context.as_raw()) == EGL_TRUE }
    }

    fn make_current(
        &self,
        display: DisplayHandle,
        draw: Option<SurfaceHandle>,
        read: Option<SurfaceHandle>,
        context: Option<ContextHandle>,
    ) -> bool {
        trace!("eglMakeCurrent({:?}, {:?}, {:?})", draw, read, context);
        // SAFETY: null handles are EGL_NO_SURFACE / EGL_NO_CONTEXT.
        unsafe {
            (self.egl.MakeCurrent)(
                display.as_raw(),
                raw_or_null(draw, SurfaceHandle::as_raw),
                raw_or_null(read, SurfaceHandle::as_raw),
                raw_or_null(context, ContextHandle::as_raw),
            ) == EGL_TRUE
        }
    }

    fn current_context(&self) -> Option<ContextHandle> {
        // SAFETY: no arguments.
        ContextHandle::from_raw(unsafe { (self.egl.GetCurrentContext)() })
    }

    fn current_surface(&self, role: SurfaceRole) -> Option<SurfaceHandle> {
        let which = match role {
            SurfaceRole::Draw => EGL_DRAW,
            SurfaceRole::Read => EGL_READ,
        };
        // SAFETY: plain enum argument.
        SurfaceHandle::from_raw(unsafe { (self.egl.GetCurrentSurface)(which) })
    }

    fn wait_client(&self) {
        // SAFETY: no arguments.
        unsafe { (self.egl.WaitClient)() };
    }

    fn wait_native(&self) {
        // SAFETY: plain enum argument.
        unsafe { (self.egl.WaitNative)(EGL_CORE_NATIVE_ENGINE) };
    }

    fn create_screen_context(&self) -> Option<ScreenContextHandle> {
        let mut ctx: screen_context_t = ptr::null_mut();
        // SAFETY: out-param is valid.
        let rc = unsafe { (self.screen.create_context)(&mut ctx, SCREEN_APPLICATION_CONTEXT) };
        if rc == -1 {
            return None;
        }
        ScreenContextHandle::from_raw(ctx)
    }

    fn destroy_screen_context(&self, context: ScreenContextHandle) {
        // SAFETY: context is owned by the caller and not used afterwards.
        if unsafe { (self.screen.destroy_context)(context.as_raw()) } == -1 {
            warn!("screen_destroy_context failed for {:?}", context);
        }
    }

    fn create_window(&self, context: ScreenContextHandle) -> Option<WindowHandle> {
        let mut window: screen_window_t = ptr::null_mut();
        // SAFETY: context is live; out-param is valid.
        let rc = unsafe { (self.screen.create_window)(&mut window, context.as_raw()) };
        if rc == -1 {
            return None;
        }
        WindowHandle::from_raw(window)
    }

    fn destroy_window(&self, window: WindowHandle) {
        // SAFETY: window is owned by the caller and not used afterwards.
        if unsafe { (self.screen.destroy_window)(window.as_raw()) } == -1 {
            warn!("screen_destroy_window failed for {:?}", window);
        }
    }

    fn set_window_property(&self, window: WindowHandle, property: WindowProperty, values: &[i32]) -> bool {
        // SAFETY: values holds as many integers as the property expects.
        let rc = unsafe {
            (self.screen.set_window_property_iv)(window.as_raw(), property_name(property), values.as_ptr() as *const c_int)
        };
        rc != -1
    }

    fn create_window_buffers(&self, window: WindowHandle, count: u32) -> bool {
        // SAFETY: window is live.
        unsafe { (self.screen.create_window_buffers)(window.as_raw(), count as c_int) != -1 }
    }

    fn discard_window_regions(&self, window: WindowHandle, rects: &[i32]) -> bool {
        // SAFETY: rects holds rects.len() / 4 quadruples.
        unsafe {
            (self.screen.discard_window_regions)(window.as_raw(), (rects.len() / 4) as c_int, rects.as_ptr()) != -1
        }
    }

    fn load_library(&self, path: &Path) -> Result<()> {
        let mut libraries = self.client_libraries.borrow_mut();
        if libraries.iter().any(|(loaded, _)| loaded == path) {
            trace!("{} already loaded", path.display());
            return Ok(());
        }
        let library = egl::open_global(path)?;
        debug!("Loaded client library {}", path.display());
        libraries.push((path.to_path_buf(), library));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn failed_renderable_query_contributes_no_api_bits() {
        assert_eq!(renderable_type_from_query(0, EGL_NONE), RenderableType::empty());
        assert_eq!(
            renderable_type_from_query(EGL_TRUE, 0x4 | 0x8),
            RenderableType::OPENGL_ES2 | RenderableType::OPENGL
        );
    }
}
