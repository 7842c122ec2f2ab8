// src/glws/attributes.rs

use crate::platform::backends::egl_screen::egl::{EGLint, EGL_NONE};

/// Builder for `EGL_NONE`-terminated `(name, value)` attribute lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: Vec<EGLint>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: EGLint, value: EGLint) -> &mut Self {
        debug_assert!(name != EGL_NONE, "EGL_NONE is reserved for the terminator");
        self.values.push(name);
        self.values.push(value);
        self
    }

    /// Returns the value stored for `name`, if any.
    pub fn get(&self, name: EGLint) -> Option<EGLint> {
        self.values
            .chunks_exact(2)
            .find_map(|pair| (pair[0] == name).then_some(pair[1]))
    }

    /// Consumes the builder and returns the terminated list.
    pub fn end(mut self) -> Vec<EGLint> {
        self.values.push(EGL_NONE);
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::backends::egl_screen::egl::{EGL_DEPTH_SIZE, EGL_RED_SIZE};
    use test_log::test;

    #[test]
    fn end_appends_terminator() {
        let mut attribs = Attributes::new();
        attribs.add(EGL_RED_SIZE, 8).add(EGL_DEPTH_SIZE, 24);
        assert_eq!(attribs.get(EGL_DEPTH_SIZE), Some(24));
        assert_eq!(attribs.get(EGL_NONE), None);
        assert_eq!(attribs.end(), vec![EGL_RED_SIZE, 8, EGL_DEPTH_SIZE, 24, EGL_NONE]);
    }

    #[test]
    fn empty_list_is_just_the_terminator() {
        assert_eq!(Attributes::new().end(), vec![EGL_NONE]);
    }
}
