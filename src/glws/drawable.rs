// src/glws/drawable.rs

//! Window-backed drawables: a Screen window plus the EGL surface bound to it.

use anyhow::{anyhow, bail, Result};
use log::{debug, info, trace, warn};
use std::cell::Cell;
use std::rc::{Rc, Weak};

use super::visual::EglVisual;
use super::{flatten_rects, DamageRect, Drawable, PbufferInfo};
use crate::display::{DisplaySession, Extensions};
use crate::fatal::OrExit;
use crate::platform::backends::egl_screen::screen::{
    SCREEN_FORMAT_RGBA8888, SCREEN_USAGE_OPENGL_ES2, SCREEN_USAGE_OPENGL_ES3,
};
use crate::platform::driver::{SurfaceHandle, SurfaceRole, WindowHandle, WindowProperty};
use crate::profile::Api;

/// An on-screen rendering target.
///
/// Exclusively owns one Screen window and at most one EGL window surface.
/// The window is only absent after a resize failed to create its
/// replacement; every operation needing it then fails.
/// The visual is only referenced weakly: it must outlive any resize or
/// recreation of this drawable, but the drawable does not keep it alive.
#[derive(Debug)]
pub struct EglDrawable {
    session: Rc<DisplaySession>,
    visual: Weak<EglVisual>,
    width: i32,
    height: i32,
    visible: bool,
    pbuffer: Option<PbufferInfo>,
    window: Option<WindowHandle>,
    surface: Option<SurfaceHandle>,
    /// API this drawable was last made current under. Swaps rebind it.
    api: Cell<Api>,
}

/// Creates a window configured for GL ES rendering and binds a surface to it.
///
/// Window buffer allocation completes asynchronously on the compositor side,
/// so the native wait must happen before the surface is created.
fn create_native(
    session: &DisplaySession,
    visual: &EglVisual,
    width: i32,
    height: i32,
) -> Result<(WindowHandle, Option<SurfaceHandle>)> {
    let driver = session.driver();
    let window = driver
        .create_window(visual.screen_context())
        .ok_or_else(|| anyhow!("screen_create_window failed"))?;
    driver.wait_native();

    let window_config = &session.config().window;
    let properties: [(WindowProperty, &[i32]); 5] = [
        (WindowProperty::Usage, &[SCREEN_USAGE_OPENGL_ES2 | SCREEN_USAGE_OPENGL_ES3]),
        (WindowProperty::Format, &[SCREEN_FORMAT_RGBA8888]),
        (WindowProperty::SwapInterval, &[window_config.swap_interval]),
        (WindowProperty::Size, &[width, height]),
        (WindowProperty::Position, &[0, 0]),
    ];
    for (property, values) in properties {
        if !driver.set_window_property(window, property, values) {
            warn!("Failed to set {:?} = {:?} on window {:?}", property, values, window);
        }
    }

    if !driver.create_window_buffers(window, window_config.buffer_count) {
        warn!(
            "screen_create_window_buffers({}) failed for window {:?}",
            window_config.buffer_count, window
        );
    }

    let surface = driver.create_window_surface(session.display(), visual.config(), window);
    match surface {
        Some(surface) => debug!("Window {:?} bound to surface {:?} ({}x{})", window, surface, width, height),
        None => warn!("eglCreateWindowSurface failed for window {:?}", window),
    }
    Ok((window, surface))
}

impl EglDrawable {
    /// Creates a window of `width` x `height` under `visual` and binds a
    /// surface to it.
    ///
    /// # Returns
    ///
    /// * `Ok(EglDrawable)` once the window exists (the surface may be absent
    ///   if the driver refused it; it is then recreated on demand).
    /// * `Err(anyhow::Error)` if the session is closed or the window cannot
    ///   be created.
    pub fn create(
        visual: &Rc<EglVisual>,
        width: i32,
        height: i32,
        pbuffer: Option<PbufferInfo>,
    ) -> Result<Self> {
        let session = Rc::clone(visual.session());
        session.ensure_open()?;
        info!("Creating drawable with size {}x{}", width, height);

        let (window, surface) = create_native(&session, visual, width, height)?;
        Ok(Self {
            session,
            visual: Rc::downgrade(visual),
            width,
            height,
            visible: false,
            pbuffer,
            window: Some(window),
            surface,
            api: Cell::new(Api::Gles),
        })
    }

    #[inline]
    pub fn window(&self) -> Option<WindowHandle> {
        self.window
    }

    fn live_window(&self) -> Result<WindowHandle> {
        self.window
            .ok_or_else(|| anyhow!("drawable has no window; its last resize failed"))
    }

    #[inline]
    pub fn surface(&self) -> Option<SurfaceHandle> {
        self.surface
    }

    /// The API this drawable was last made current under.
    #[inline]
    pub fn api(&self) -> Api {
        self.api.get()
    }

    #[inline]
    pub(crate) fn set_api(&self, api: Api) {
        self.api.set(api);
    }

    fn visual(&self) -> Result<Rc<EglVisual>> {
        self.visual
            .upgrade()
            .ok_or_else(|| anyhow!("visual released while drawable {:?} is alive", self.window))
    }

    /// The surface's size as reported by the driver.
    pub fn surface_size(&self) -> Option<(i32, i32)> {
        self.surface
            .map(|surface| self.session.driver().query_surface_size(self.session.display(), surface))
    }

    /// Destroys the surface, then the window. The surface must go first: the
    /// window cannot be destroyed while a surface is still attached.
    fn destroy_native(&mut self) {
        let driver = self.session.driver();
        if let Some(surface) = self.surface.take() {
            driver.destroy_surface(self.session.display(), surface);
        }
        driver.wait_client();
        if let Some(window) = self.window.take() {
            driver.destroy_window(window);
        }
        driver.wait_native();
    }

    /// Replaces the surface bound to the window.
    ///
    /// If the surface is current for the calling thread it is unbound first
    /// and the replacement rebound afterwards with the same context. The
    /// replacement is created before the old surface is destroyed so the
    /// driver cannot hand back the old handle; if the driver refuses a second
    /// surface for the window, the old one is destroyed and creation retried
    /// once.
    ///
    /// # Returns
    ///
    /// * `Err(anyhow::Error)` if no replacement surface could be created.
    pub fn recreate(&mut self) -> Result<()> {
        self.session.ensure_open()?;
        let window = self.live_window()?;
        info!("Recreating surface for window {:?}", window);
        let session = Rc::clone(&self.session);
        let driver = session.driver();
        let display = session.display();
        let config = self.visual()?.config();

        let current_context = driver.current_context();
        let rebind = self.surface.is_some()
            && (driver.current_surface(SurfaceRole::Draw) == self.surface
                || driver.current_surface(SurfaceRole::Read) == self.surface);
        if rebind {
            debug!("Surface {:?} is current; unbinding before replacement", self.surface);
            driver.make_current(display, None, None, None);
        }

        let mut old = self.surface.take();
        let mut replacement = driver.create_window_surface(display, config, window);
        if replacement.is_none() {
            if let Some(stale) = old.take() {
                debug!("Driver refused a second surface; destroying {:?} and retrying", stale);
                driver.destroy_surface(display, stale);
                replacement = driver.create_window_surface(display, config, window);
            }
        }
        let replacement = replacement
            .ok_or_else(|| anyhow!("eglCreateWindowSurface failed while recreating window {:?}", window))?;
        self.surface = Some(replacement);

        if rebind && !driver.make_current(display, Some(replacement), Some(replacement), current_context) {
            warn!("Failed to rebind recreated surface {:?}", replacement);
        }

        if let Some(old) = old {
            driver.destroy_surface(display, old);
        }
        debug!("Window {:?} now bound to surface {:?}", window, replacement);
        Ok(())
    }

    /// Destroys and recreates window and surface at the new size.
    ///
    /// Some drivers keep reporting the old surface geometry after a full
    /// destroy/create cycle; a surface recreation is then attempted once
    /// more. A size that still does not match is an error.
    pub fn try_resize(&mut self, width: i32, height: i32) -> Result<()> {
        info!("Resize to {}x{}", width, height);
        if width == self.width && height == self.height {
            debug!("No need to resize");
            return Ok(());
        }
        self.session.ensure_open()?;
        let visual = self.visual()?;

        self.session.driver().wait_client();
        self.destroy_native();
        let (window, surface) = create_native(&self.session, &visual, width, height)?;
        self.window = Some(window);
        self.surface = surface;
        self.width = width;
        self.height = height;

        let mut actual = self.surface_size();
        if actual != Some((width, height)) {
            warn!(
                "Surface not updated ({:?} instead of {}x{}); recreating",
                actual, width, height
            );
            self.recreate()?;
            actual = self.surface_size();
        }

        if actual != Some((width, height)) {
            bail!(
                "surface size {:?} does not match requested {}x{} after recreation",
                actual,
                width,
                height
            );
        }
        Ok(())
    }

    /// Makes the window visible.
    pub fn try_show(&mut self) -> Result<()> {
        if self.visible {
            return Ok(());
        }
        self.session.ensure_open()?;
        let window = self.live_window()?;
        let driver = self.session.driver();

        driver.wait_client();
        if !driver.set_window_property(window, WindowProperty::Visible, &[1]) {
            warn!("Failed to make window {:?} visible", window);
        }
        driver.wait_native();

        self.visible = true;
        debug!("Window {:?} shown", window);
        Ok(())
    }

    /// Rebinds the last API and presents the surface.
    pub fn try_swap_buffers(&self) -> Result<()> {
        self.session.ensure_open()?;
        self.session.bind_api(self.api.get())?;
        match self.surface {
            Some(surface) => {
                if !self.session.driver().swap_buffers(self.session.display(), surface) {
                    warn!("eglSwapBuffers failed for surface {:?}", surface);
                }
            }
            None => warn!("swap_buffers on window {:?} without a surface", self.window),
        }
        Ok(())
    }

    /// Presents with damage, or does nothing if the display lacks
    /// `EGL_KHR_swap_buffers_with_damage`.
    pub fn try_swap_buffers_with_damage(&self, rects: &[DamageRect]) -> Result<()> {
        if !self.session.has_extension(Extensions::SWAP_BUFFERS_WITH_DAMAGE) {
            trace!("EGL_KHR_swap_buffers_with_damage unavailable; skipping swap");
            return Ok(());
        }
        self.session.ensure_open()?;
        self.session.bind_api(self.api.get())?;
        let Some(surface) = self.surface else {
            warn!("swap_buffers_with_damage on window {:?} without a surface", self.window);
            return Ok(());
        };
        let flat = flatten_rects(rects);
        if !self
            .session
            .driver()
            .swap_buffers_with_damage(self.session.display(), surface, &flat)
        {
            warn!("eglSwapBuffersWithDamage failed for surface {:?}", surface);
        }
        Ok(())
    }
}

impl Drawable for EglDrawable {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn pbuffer(&self) -> Option<&PbufferInfo> {
        self.pbuffer.as_ref()
    }

    fn resize(&mut self, width: i32, height: i32) {
        self.try_resize(width, height).or_exit()
    }

    fn show(&mut self) {
        self.try_show().or_exit()
    }

    fn set_damage_region(&mut self, rects: &[DamageRect]) {
        if !self.session.is_open() {
            warn!("set_damage_region after display shutdown ignored");
            return;
        }
        let Some(window) = self.window else {
            warn!("set_damage_region on a drawable without a window ignored");
            return;
        };
        let flat = flatten_rects(rects);
        if !self.session.driver().discard_window_regions(window, &flat) {
            warn!("screen_discard_window_regions failed for window {:?}", window);
        }
    }

    fn swap_buffers(&mut self) {
        self.try_swap_buffers().or_exit()
    }

    fn swap_buffers_with_damage(&mut self, rects: &[DamageRect]) {
        self.try_swap_buffers_with_damage(rects).or_exit()
    }
}

impl Drop for EglDrawable {
    fn drop(&mut self) {
        if !self.session.is_open() {
            warn!(
                "Drawable (window {:?}) dropped after display shutdown; native resources not released.",
                self.window
            );
            return;
        }
        debug!("Destroying drawable window {:?}", self.window);
        self.destroy_native();
    }
}
