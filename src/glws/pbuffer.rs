// src/glws/pbuffer.rs

//! Pixel-buffer texture operations.
//!
//! Screen has no pbuffer-to-texture path, so these only validate the target
//! and report success.

use log::{debug, error};

use super::drawable::EglDrawable;
use super::Drawable;

pub fn bind_tex_image(pbuffer: &EglDrawable, buffer: i32) -> bool {
    error!("bind_tex_image (buffer {}) not implemented for EGL/Screen", buffer);
    debug_assert!(pbuffer.pbuffer().is_some(), "bind_tex_image on a non-pbuffer drawable");
    true
}

pub fn release_tex_image(pbuffer: &EglDrawable, buffer: i32) -> bool {
    error!("release_tex_image (buffer {}) not implemented for EGL/Screen", buffer);
    debug_assert!(pbuffer.pbuffer().is_some(), "release_tex_image on a non-pbuffer drawable");
    true
}

pub fn set_pbuffer_attrib(pbuffer: &EglDrawable, attribs: &[i32]) -> bool {
    debug!("set_pbuffer_attrib({:?}): nothing to do", attribs);
    debug_assert!(pbuffer.pbuffer().is_some(), "set_pbuffer_attrib on a non-pbuffer drawable");
    true
}
