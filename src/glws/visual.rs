// src/glws/visual.rs

//! Pixel-format (EGL config) selection.

use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use std::rc::Rc;

use super::attributes::Attributes;
use super::Visual;
use crate::display::{DisplaySession, Extensions};
use crate::platform::backends::egl_screen::egl::{
    EGL_ALPHA_SIZE, EGL_BLUE_SIZE, EGL_DEPTH_SIZE, EGL_GREEN_SIZE, EGL_RED_SIZE, EGL_RENDERABLE_TYPE,
    EGL_STENCIL_SIZE, EGL_SURFACE_TYPE, EGL_WINDOW_BIT,
};
use crate::platform::driver::{ConfigHandle, RenderableType, ScreenContextHandle};
use crate::profile::{Api, Profile};

/// Weights of the extra APIs a configuration supports beyond the requested
/// one, highest first.
const SCORE_WEIGHTS: [(RenderableType, u32); 4] = [
    (RenderableType::OPENGL_ES2, 1 << 4),
    (RenderableType::OPENGL_ES3, 1 << 3),
    (RenderableType::OPENGL_ES, 1 << 2),
    (RenderableType::OPENGL, 1 << 1),
];

/// An EGL configuration plus the Screen context windows are created under.
///
/// Owns the Screen context; dropping the visual destroys it.
#[derive(Debug)]
pub struct EglVisual {
    session: Rc<DisplaySession>,
    profile: Profile,
    config: ConfigHandle,
    screen_context: ScreenContextHandle,
}

impl EglVisual {
    pub(crate) fn new(
        session: Rc<DisplaySession>,
        profile: Profile,
        config: ConfigHandle,
        screen_context: ScreenContextHandle,
    ) -> Self {
        Self {
            session,
            profile,
            config,
            screen_context,
        }
    }

    #[inline]
    pub fn config(&self) -> ConfigHandle {
        self.config
    }

    #[inline]
    pub fn screen_context(&self) -> ScreenContextHandle {
        self.screen_context
    }

    #[inline]
    pub(crate) fn session(&self) -> &Rc<DisplaySession> {
        &self.session
    }
}

impl Visual for EglVisual {
    fn profile(&self) -> Profile {
        self.profile
    }
}

impl Drop for EglVisual {
    fn drop(&mut self) {
        if !self.session.is_open() {
            warn!(
                "Visual ({:?}) dropped after display shutdown; Screen context not destroyed.",
                self.screen_context
            );
            return;
        }
        debug!("Destroying Screen context {:?}", self.screen_context);
        self.session.driver().destroy_screen_context(self.screen_context);
    }
}

/// Returns the renderable-type bits a configuration must have for `profile`,
/// or `None` if the profile cannot be served by this display.
pub fn required_renderable_type(profile: &Profile, extensions: Extensions) -> Option<RenderableType> {
    let create_context = extensions.contains(Extensions::CREATE_CONTEXT);
    match profile.api {
        Api::Gl => {
            if profile.core && !create_context {
                return None;
            }
            Some(RenderableType::OPENGL)
        }
        Api::Gles => match profile.major {
            1 => Some(RenderableType::OPENGL_ES),
            // ES3 configs cannot be expressed without EGL_KHR_create_context.
            3 if create_context => Some(RenderableType::OPENGL_ES3),
            2 | 3 => Some(RenderableType::OPENGL_ES2),
            _ => None,
        },
    }
}

/// Scores the APIs a configuration supports on top of the requested ones.
pub fn score_config(renderable: RenderableType, requested: RenderableType) -> u32 {
    let extra = renderable.difference(requested);
    SCORE_WEIGHTS
        .iter()
        .filter(|(bit, _)| extra.contains(*bit))
        .map(|(_, weight)| weight)
        .sum()
}

/// Picks the highest scoring configuration. Ties keep the earliest one.
///
/// The replay engine may later ask for a different API against a visual
/// chosen now, so the configuration usable by the most APIs wins.
pub fn pick_config(
    candidates: &[(ConfigHandle, RenderableType)],
    requested: RenderableType,
) -> Option<ConfigHandle> {
    let mut best: Option<(ConfigHandle, u32)> = None;
    for (config, renderable) in candidates {
        debug_assert!(renderable.contains(requested));
        let score = score_config(*renderable, requested);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((*config, score));
        }
    }
    best.map(|(config, _)| config)
}

/// Chooses a configuration for `profile` and opens a Screen context for it.
///
/// # Returns
///
/// * `Ok(Some(EglVisual))` on success.
/// * `Ok(None)` if the profile is unsupported or no configuration matches.
/// * `Err(anyhow::Error)` if the session is closed or the Screen context
///   cannot be created.
pub fn select_visual(
    session: &Rc<DisplaySession>,
    double_buffer: bool,
    samples: u32,
    profile: Profile,
) -> Result<Option<EglVisual>> {
    session.ensure_open()?;
    debug!(
        "Selecting visual for {} (double_buffer: {}, samples: {})",
        profile, double_buffer, samples
    );

    let Some(required) = required_renderable_type(&profile, session.extensions()) else {
        warn!("No EGL configuration can serve {} on this display", profile);
        return Ok(None);
    };

    let mut attribs = Attributes::new();
    attribs
        .add(EGL_SURFACE_TYPE, EGL_WINDOW_BIT)
        .add(EGL_RED_SIZE, 8)
        .add(EGL_GREEN_SIZE, 8)
        .add(EGL_BLUE_SIZE, 8)
        .add(EGL_ALPHA_SIZE, 8)
        .add(EGL_DEPTH_SIZE, 24)
        .add(EGL_STENCIL_SIZE, 8)
        .add(EGL_RENDERABLE_TYPE, required.bits());
    let attribs = attribs.end();

    let driver = session.driver();
    let display = session.display();
    let candidates: Vec<(ConfigHandle, RenderableType)> = driver
        .choose_configs(display, &attribs)
        .into_iter()
        .map(|config| (config, driver.config_renderable_type(display, config)))
        .collect();
    debug!("{} candidate configuration(s) for {:?}", candidates.len(), required);

    let Some(config) = pick_config(&candidates, required) else {
        warn!("No EGL configuration matches {}", profile);
        return Ok(None);
    };

    let screen_context = driver
        .create_screen_context()
        .ok_or_else(|| anyhow!("screen_create_context failed"))?;

    info!("Visual for {}: config {:?}, Screen context {:?}", profile, config, screen_context);
    Ok(Some(EglVisual::new(session.clone(), profile, config, screen_context)))
}
