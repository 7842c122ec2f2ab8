// src/glws/binding.rs

use anyhow::Result;
use log::{debug, trace, warn};

use super::context::EglContext;
use super::drawable::EglDrawable;
use super::Context;
use crate::display::DisplaySession;

/// Binds (drawable, readable, context) on the calling thread.
///
/// Without a drawable or a context everything is unbound. A missing readable
/// reads from the drawable. On success both drawables remember the context's
/// API so later swaps can rebind it.
///
/// # Returns
///
/// * `Ok(bool)` with the driver's verdict.
/// * `Err(anyhow::Error)` if the session is closed or the API cannot be bound.
pub fn make_current(
    session: &DisplaySession,
    drawable: Option<&EglDrawable>,
    readable: Option<&EglDrawable>,
    context: Option<&EglContext>,
) -> Result<bool> {
    session.ensure_open()?;
    let driver = session.driver();

    let (Some(drawable), Some(context)) = (drawable, context) else {
        trace!("make_current: unbinding");
        return Ok(driver.make_current(session.display(), None, None, None));
    };
    let readable = readable.unwrap_or(drawable);

    let api = context.profile().api;
    session.bind_api(api)?;

    let ok = driver.make_current(
        session.display(),
        drawable.surface(),
        readable.surface(),
        Some(context.handle()),
    );
    if ok {
        drawable.set_api(api);
        readable.set_api(api);
        debug!(
            "Context {:?} current on window {:?} (read {:?})",
            context.handle(),
            drawable.window(),
            readable.window()
        );
    } else {
        warn!("eglMakeCurrent failed for context {:?}", context.handle());
    }
    Ok(ok)
}
