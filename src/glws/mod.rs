// src/glws/mod.rs

//! Window-system abstraction consumed by the trace-replay engine.
//!
//! The replay engine only sees the traits in this module:
//!
//! * [`Visual`] - a negotiated pixel format plus the profile it was chosen for.
//! * [`Drawable`] - an on-screen rendering target.
//! * [`Context`] - a rendering context.
//! * [`WindowSystem`] - the factory and binding operations tying them together.
//!
//! This backend provides exactly one implementation of each: [`EglVisual`],
//! [`EglDrawable`], [`EglContext`] and [`EglScreenBackend`].
//!
//! ## Error contract
//! Recoverable failures (no matching configuration, context creation refused,
//! `make_current` refused) are reported as `None` / `false`. Everything else
//! means the platform is unusable and terminates the process; no error value
//! crosses this boundary.

pub mod attributes;
pub mod backend;
pub mod binding;
pub mod context;
pub mod drawable;
pub mod pbuffer;
pub mod visual;


use std::rc::Rc;

use crate::profile::Profile;

pub use backend::EglScreenBackend;
pub use context::EglContext;
pub use drawable::EglDrawable;
pub use visual::EglVisual;

/// Metadata marking a drawable as an off-screen pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PbufferInfo {
    pub texture_format: i32,
    pub texture_target: i32,
    pub texture_mipmap: bool,
}

/// A rectangle in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DamageRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }
}

/// Flattens rectangles into the `x, y, w, h` quadruples native calls expect.
pub(crate) fn flatten_rects(rects: &[DamageRect]) -> Vec<i32> {
    rects
        .iter()
        .flat_map(|r| [r.x, r.y, r.width, r.height])
        .collect()
}

/// A pixel-format configuration negotiated for a rendering profile.
pub trait Visual {
    fn profile(&self) -> Profile;
}

/// An on-screen (or pixel-buffer) rendering target.
pub trait Drawable {
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn visible(&self) -> bool;
    fn pbuffer(&self) -> Option<&PbufferInfo>;

    /// Resizes the target. A no-op when the size is unchanged.
    fn resize(&mut self, width: i32, height: i32);

    /// Makes the target visible. A no-op when already visible.
    fn show(&mut self);

    /// Hints regions whose contents need not survive the next swap.
    fn set_damage_region(&mut self, rects: &[DamageRect]);

    fn swap_buffers(&mut self);

    /// Presents with damage when the platform supports it; otherwise does nothing.
    fn swap_buffers_with_damage(&mut self, rects: &[DamageRect]);
}

/// A rendering context.
pub trait Context {
    fn profile(&self) -> Profile;

    /// Whether the context was created sharing objects with another context.
    fn is_shared(&self) -> bool;
}

/// Factory and binding operations of a window-system backend.
pub trait WindowSystem {
    type Visual: Visual;
    type Drawable: Drawable;
    type Context: Context;

    /// Drains platform events. Returns `false` when the caller should stop.
    fn process_events(&self) -> bool;

    fn create_visual(&self, double_buffer: bool, samples: u32, profile: Profile) -> Option<Rc<Self::Visual>>;

    fn create_drawable(
        &self,
        visual: &Rc<Self::Visual>,
        width: i32,
        height: i32,
        pbuffer: Option<PbufferInfo>,
    ) -> Self::Drawable;

    fn create_context(
        &self,
        visual: &Rc<Self::Visual>,
        share: Option<&Self::Context>,
        debug: bool,
    ) -> Option<Self::Context>;

    /// Binds `drawable`/`readable`/`context` on the calling thread, or unbinds
    /// everything when `drawable` or `context` is `None`.
    fn make_current(
        &self,
        drawable: Option<&Self::Drawable>,
        readable: Option<&Self::Drawable>,
        context: Option<&Self::Context>,
    ) -> bool;

    fn bind_tex_image(&self, pbuffer: &Self::Drawable, buffer: i32) -> bool;

    fn release_tex_image(&self, pbuffer: &Self::Drawable, buffer: i32) -> bool;

    fn set_pbuffer_attrib(&self, pbuffer: &Self::Drawable, attribs: &[i32]) -> bool;
}
