// src/glws/backend.rs

//! The `WindowSystem` facade over EGL/Screen.
//!
//! Every operation here delegates to the module that implements it and turns
//! fatal errors into process termination via [`OrExit`]. Nothing below this
//! layer exits the process.

use anyhow::Result;
use log::info;
use std::rc::Rc;

use super::context::{create_context, EglContext};
use super::drawable::EglDrawable;
use super::visual::{select_visual, EglVisual};
use super::{binding, pbuffer, PbufferInfo, WindowSystem};
use crate::config::Config;
use crate::display::DisplaySession;
use crate::fatal::OrExit;
use crate::platform::backends::EglScreenDriver;
use crate::platform::driver::NativeDriver;
use crate::profile::Profile;

/// Window-system backend for EGL on the Screen compositor.
pub struct EglScreenBackend {
    session: Rc<DisplaySession>,
}

impl EglScreenBackend {
    /// Loads the EGL and Screen libraries named by `config` and opens the
    /// display. Terminates the process if the platform is unusable.
    pub fn initialize(config: Config) -> Self {
        Self::try_initialize(config).or_exit()
    }

    pub fn try_initialize(config: Config) -> Result<Self> {
        let driver = EglScreenDriver::load(&config.libraries)?;
        Self::try_with_driver(Rc::new(driver), config)
    }

    /// Opens the display through an explicit driver.
    pub fn with_driver(driver: Rc<dyn NativeDriver>, config: Config) -> Self {
        Self::try_with_driver(driver, config).or_exit()
    }

    pub fn try_with_driver(driver: Rc<dyn NativeDriver>, config: Config) -> Result<Self> {
        let session = DisplaySession::initialize(driver, config)?;
        info!("EGL/Screen window system ready.");
        Ok(Self { session })
    }

    /// Terminates the display. Entities still alive afterwards release
    /// nothing when dropped.
    pub fn shutdown(&self) {
        self.session.shutdown();
    }

    #[inline]
    pub fn session(&self) -> &Rc<DisplaySession> {
        &self.session
    }
}

impl WindowSystem for EglScreenBackend {
    type Visual = EglVisual;
    type Drawable = EglDrawable;
    type Context = EglContext;

    fn process_events(&self) -> bool {
        self.session.process_pending_events()
    }

    fn create_visual(&self, double_buffer: bool, samples: u32, profile: Profile) -> Option<Rc<EglVisual>> {
        select_visual(&self.session, double_buffer, samples, profile)
            .or_exit()
            .map(Rc::new)
    }

    fn create_drawable(
        &self,
        visual: &Rc<EglVisual>,
        width: i32,
        height: i32,
        pbuffer: Option<PbufferInfo>,
    ) -> EglDrawable {
        EglDrawable::create(visual, width, height, pbuffer).or_exit()
    }

    fn create_context(&self, visual: &Rc<EglVisual>, share: Option<&EglContext>, debug: bool) -> Option<EglContext> {
        create_context(visual, share, debug).or_exit()
    }

    fn make_current(
        &self,
        drawable: Option<&EglDrawable>,
        readable: Option<&EglDrawable>,
        context: Option<&EglContext>,
    ) -> bool {
        binding::make_current(&self.session, drawable, readable, context).or_exit()
    }

    fn bind_tex_image(&self, target: &EglDrawable, buffer: i32) -> bool {
        pbuffer::bind_tex_image(target, buffer)
    }

    fn release_tex_image(&self, target: &EglDrawable, buffer: i32) -> bool {
        pbuffer::release_tex_image(target, buffer)
    }

    fn set_pbuffer_attrib(&self, target: &EglDrawable, attribs: &[i32]) -> bool {
        pbuffer::set_pbuffer_attrib(target, attribs)
    }
}
