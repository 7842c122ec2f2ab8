// src/glws/context.rs

//! Rendering-context negotiation.

use anyhow::Result;
use log::{debug, info, warn};
use std::rc::{Rc, Weak};

use super::attributes::Attributes;
use super::visual::EglVisual;
use super::{Context, Visual};
use crate::display::{DisplaySession, Extensions};
use crate::platform::backends::egl_screen::egl::{
    EGLint, EGL_CONTEXT_CLIENT_VERSION, EGL_CONTEXT_FLAGS_KHR, EGL_CONTEXT_MAJOR_VERSION_KHR,
    EGL_CONTEXT_MINOR_VERSION_KHR, EGL_CONTEXT_OPENGL_COMPATIBILITY_PROFILE_BIT_KHR,
    EGL_CONTEXT_OPENGL_CORE_PROFILE_BIT_KHR, EGL_CONTEXT_OPENGL_DEBUG_BIT_KHR,
    EGL_CONTEXT_OPENGL_FORWARD_COMPATIBLE_BIT_KHR, EGL_CONTEXT_OPENGL_PROFILE_MASK_KHR,
};
use crate::platform::driver::ContextHandle;
use crate::profile::{Api, Profile};

/// A rendering context created against a visual's configuration.
#[derive(Debug)]
pub struct EglContext {
    session: Rc<DisplaySession>,
    visual: Weak<EglVisual>,
    handle: ContextHandle,
    profile: Profile,
    shared: bool,
}

impl EglContext {
    #[inline]
    pub fn handle(&self) -> ContextHandle {
        self.handle
    }

    /// The visual this context was created for, if it is still alive.
    pub fn visual(&self) -> Option<Rc<EglVisual>> {
        self.visual.upgrade()
    }
}

impl Context for EglContext {
    fn profile(&self) -> Profile {
        self.profile
    }

    fn is_shared(&self) -> bool {
        self.shared
    }
}

impl Drop for EglContext {
    fn drop(&mut self) {
        if !self.session.is_open() {
            warn!("Context {:?} dropped after display shutdown; not destroyed.", self.handle);
            return;
        }
        debug!("Destroying context {:?}", self.handle);
        if !self.session.driver().destroy_context(self.session.display(), self.handle) {
            warn!("eglDestroyContext failed for {:?}", self.handle);
        }
    }
}

/// Builds the `eglCreateContext` attribute list for `profile`.
///
/// Returns `None` when the profile cannot be expressed: desktop GL 3.2 and
/// later needs `EGL_KHR_create_context` to request a profile mask.
pub fn context_attributes(profile: &Profile, create_context: bool, debug: bool) -> Option<Vec<EGLint>> {
    let mut attribs = Attributes::new();
    let mut flags = 0;

    match profile.api {
        Api::Gl if create_context => {
            let mask = if profile.core {
                EGL_CONTEXT_OPENGL_CORE_PROFILE_BIT_KHR
            } else {
                EGL_CONTEXT_OPENGL_COMPATIBILITY_PROFILE_BIT_KHR
            };
            attribs
                .add(EGL_CONTEXT_MAJOR_VERSION_KHR, profile.major as EGLint)
                .add(EGL_CONTEXT_MINOR_VERSION_KHR, profile.minor as EGLint)
                .add(EGL_CONTEXT_OPENGL_PROFILE_MASK_KHR, mask);
            if profile.forward_compatible {
                flags |= EGL_CONTEXT_OPENGL_FORWARD_COMPATIBLE_BIT_KHR;
            }
        }
        Api::Gl => {
            if profile.version_greater_or_equal(3, 2) {
                return None;
            }
        }
        Api::Gles if create_context => {
            attribs
                .add(EGL_CONTEXT_MAJOR_VERSION_KHR, profile.major as EGLint)
                .add(EGL_CONTEXT_MINOR_VERSION_KHR, profile.minor as EGLint);
        }
        Api::Gles => {
            attribs.add(EGL_CONTEXT_CLIENT_VERSION, profile.major as EGLint);
        }
    }

    if debug {
        flags |= EGL_CONTEXT_OPENGL_DEBUG_BIT_KHR;
    }
    // Context flags only exist with EGL_KHR_create_context.
    if flags != 0 && create_context {
        attribs.add(EGL_CONTEXT_FLAGS_KHR, flags);
    }
    Some(attribs.end())
}

/// Creates a context for `visual`'s profile, optionally sharing objects
/// with `share`.
///
/// The client library for the profile is loaded into the global namespace
/// first. Some drivers reject the debug flag for GL ES contexts, so a failed
/// debug request is retried once without it.
///
/// # Returns
///
/// * `Ok(Some(EglContext))` on success.
/// * `Ok(None)` if the profile cannot be expressed or the driver refuses it.
/// * `Err(anyhow::Error)` if the client library cannot be loaded or the API
///   cannot be bound.
pub fn create_context(
    visual: &Rc<EglVisual>,
    share: Option<&EglContext>,
    debug: bool,
) -> Result<Option<EglContext>> {
    let session = visual.session();
    session.ensure_open()?;
    let profile = visual.profile();

    let library = session.config().libraries.client_library(&profile);
    session.load_client_library(library)?;

    let create_context = session.has_extension(Extensions::CREATE_CONTEXT);
    let mut debug = debug;
    loop {
        let Some(attribs) = context_attributes(&profile, create_context, debug) else {
            warn!("EGL_KHR_create_context not supported; cannot create {} context", profile);
            return Ok(None);
        };

        session.bind_api(profile.api)?;
        let handle = session.driver().create_context(
            session.display(),
            visual.config(),
            share.map(EglContext::handle),
            &attribs,
        );

        match handle {
            Some(handle) => {
                info!(
                    "Created {} context {:?} (debug: {}, shared: {})",
                    profile,
                    handle,
                    debug,
                    share.is_some()
                );
                return Ok(Some(EglContext {
                    session: Rc::clone(session),
                    visual: Rc::downgrade(visual),
                    handle,
                    profile,
                    shared: share.is_some(),
                }));
            }
            None if debug => {
                debug!("eglCreateContext rejected debug {} context; retrying without debug", profile);
                debug = false;
            }
            None => {
                warn!("eglCreateContext failed for {}", profile);
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::glws::visual::select_visual;
    use crate::platform::backends::egl_screen::egl::EGL_NONE;
    use crate::platform::backends::mock::{Call, MockDriver};
    use std::path::PathBuf;
    use test_log::test;

    fn visual_for(driver: &Rc<MockDriver>, profile: Profile) -> Rc<EglVisual> {
        let session = DisplaySession::initialize(driver.clone(), Config::default()).unwrap();
        let visual = select_visual(&session, true, 0, profile).unwrap().expect("visual expected");
        driver.clear_calls();
        Rc::new(visual)
    }

    fn created_attribs(driver: &MockDriver) -> Vec<Vec<i32>> {
        driver
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::CreateContext { attribs, .. } => Some(attribs),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn gles_attributes_with_and_without_extension() {
        assert_eq!(
            context_attributes(&Profile::gles(3, 1), true, false),
            Some(vec![EGL_CONTEXT_MAJOR_VERSION_KHR, 3, EGL_CONTEXT_MINOR_VERSION_KHR, 1, EGL_NONE])
        );
        assert_eq!(
            context_attributes(&Profile::gles(2, 0), false, false),
            Some(vec![EGL_CONTEXT_CLIENT_VERSION, 2, EGL_NONE])
        );
    }

    #[test]
    fn gl_attributes_carry_profile_mask_and_flags() {
        let profile = Profile {
            forward_compatible: true,
            ..Profile::gl_core(4, 5)
        };
        assert_eq!(
            context_attributes(&profile, true, true),
            Some(vec![
                EGL_CONTEXT_MAJOR_VERSION_KHR,
                4,
                EGL_CONTEXT_MINOR_VERSION_KHR,
                5,
                EGL_CONTEXT_OPENGL_PROFILE_MASK_KHR,
                EGL_CONTEXT_OPENGL_CORE_PROFILE_BIT_KHR,
                EGL_CONTEXT_FLAGS_KHR,
                EGL_CONTEXT_OPENGL_FORWARD_COMPATIBLE_BIT_KHR | EGL_CONTEXT_OPENGL_DEBUG_BIT_KHR,
                EGL_NONE,
            ])
        );
        let compat = context_attributes(&Profile::gl(2, 1), true, false).unwrap();
        assert_eq!(compat[5], EGL_CONTEXT_OPENGL_COMPATIBILITY_PROFILE_BIT_KHR);
    }

    #[test]
    fn legacy_gl_needs_extension_from_3_2() {
        assert_eq!(context_attributes(&Profile::gl(3, 1), false, false), Some(vec![EGL_NONE]));
        assert_eq!(context_attributes(&Profile::gl(3, 2), false, false), None);
        assert_eq!(context_attributes(&Profile::gl_core(3, 3), false, false), None);
    }

    #[test]
    fn debug_flag_requires_extension() {
        assert_eq!(
            context_attributes(&Profile::gles(2, 0), false, true),
            Some(vec![EGL_CONTEXT_CLIENT_VERSION, 2, EGL_NONE])
        );
    }

    #[test]
    fn create_loads_client_library_and_binds_api_first() {
        let driver = Rc::new(MockDriver::new());
        let visual = visual_for(&driver, Profile::gles(2, 0));
        let context = create_context(&visual, None, false).unwrap().expect("context expected");

        let calls = driver.calls();
        assert_eq!(calls[0], Call::LoadLibrary(PathBuf::from("libGLESv2.so.2")));
        assert_eq!(calls[1], Call::BindApi(Api::Gles));
        assert!(matches!(
            &calls[2],
            Call::CreateContext { share: None, api: Some(Api::Gles), .. }
        ));
        assert_eq!(context.profile(), Profile::gles(2, 0));
        assert!(!context.is_shared());
        assert!(context.visual().is_some());
    }

    #[test]
    fn client_library_follows_profile() {
        let driver = Rc::new(MockDriver::new());
        let gles1 = visual_for(&driver, Profile::gles(1, 1));
        create_context(&gles1, None, false).unwrap();
        let gl = visual_for(&driver, Profile::gl(2, 1));
        create_context(&gl, None, false).unwrap();
        assert_eq!(
            driver.state().loaded_libraries,
            vec![PathBuf::from("libGLESv1_CM.so.1"), PathBuf::from("libGL.so.1")]
        );
    }

    #[test]
    fn library_load_failure_is_fatal() {
        let driver = Rc::new(MockDriver::new());
        let visual = visual_for(&driver, Profile::gles(2, 0));
        driver.state().library_load_fails = true;
        assert!(create_context(&visual, None, false).is_err());
        assert_eq!(driver.count(|c| matches!(c, Call::CreateContext { .. })), 0);
    }

    #[test]
    fn bind_failure_is_fatal() {
        let driver = Rc::new(MockDriver::new());
        let visual = visual_for(&driver, Profile::gles(2, 0));
        driver.state().bind_api_fails = true;
        assert!(create_context(&visual, None, false).is_err());
    }

    #[test]
    fn gl_3_2_without_extension_makes_no_native_context_call() {
        let driver = Rc::new(MockDriver::new().with_extensions(""));
        let visual = visual_for(&driver, Profile::gl(3, 2));
        assert!(create_context(&visual, None, false).unwrap().is_none());
        assert_eq!(driver.count(|c| matches!(c, Call::CreateContext { .. })), 0);
        assert_eq!(driver.count(|c| matches!(c, Call::BindApi(_))), 0);
    }

    #[test]
    fn debug_context_retried_without_debug_flag() {
        let driver = Rc::new(MockDriver::new());
        let visual = visual_for(&driver, Profile::gles(2, 0));
        driver.state().reject_debug_contexts = true;

        let context = create_context(&visual, None, true).unwrap();
        assert!(context.is_some());

        let attempts = created_attribs(&driver);
        assert_eq!(attempts.len(), 2);
        assert!(attempts[0].contains(&EGL_CONTEXT_FLAGS_KHR));
        assert!(!attempts[1].contains(&EGL_CONTEXT_FLAGS_KHR));
    }

    #[test]
    fn refused_context_is_none_after_single_retry() {
        let driver = Rc::new(MockDriver::new());
        let visual = visual_for(&driver, Profile::gles(2, 0));
        driver.state().context_creation_fails = true;

        assert!(create_context(&visual, None, true).unwrap().is_none());
        assert_eq!(created_attribs(&driver).len(), 2);

        driver.clear_calls();
        assert!(create_context(&visual, None, false).unwrap().is_none());
        assert_eq!(created_attribs(&driver).len(), 1);
    }

    #[test]
    fn shared_context_passes_share_handle() {
        let driver = Rc::new(MockDriver::new());
        let visual = visual_for(&driver, Profile::gles(2, 0));
        let first = create_context(&visual, None, false).unwrap().unwrap();
        let second = create_context(&visual, Some(&first), false).unwrap().unwrap();
        assert!(second.is_shared());
        assert_eq!(
            driver.count(|c| matches!(c, Call::CreateContext { share: Some(h), .. } if *h == first.handle())),
            1
        );
    }

    #[test]
    fn drop_destroys_native_context() {
        let driver = Rc::new(MockDriver::new());
        let visual = visual_for(&driver, Profile::gles(2, 0));
        let context = create_context(&visual, None, false).unwrap().unwrap();
        let handle = context.handle();
        assert_eq!(driver.live_contexts(), 1);
        drop(context);
        assert_eq!(driver.count(|c| *c == Call::DestroyContext(handle)), 1);
        assert_eq!(driver.live_contexts(), 0);
    }
}
