// src/profile.rs

//! Rendering profiles requested by the replay engine.
//!
//! A `Profile` names the client API (desktop OpenGL or OpenGL ES), the
//! requested version and the core/forward-compatible flags. Visuals carry the
//! profile they were selected for and contexts copy it at creation time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The client rendering API a profile targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Api {
    /// Desktop ("classic") OpenGL.
    Gl,
    /// OpenGL ES.
    #[default]
    Gles,
}

/// A requested rendering profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub api: Api,
    pub major: u32,
    pub minor: u32,
    /// Core profile (desktop GL only). Compatibility profile otherwise.
    pub core: bool,
    pub forward_compatible: bool,
}

impl Default for Profile {
    fn default() -> Self {
        Profile::gles(2, 0)
    }
}

impl Profile {
    /// An OpenGL ES profile of the given version.
    pub fn gles(major: u32, minor: u32) -> Self {
        Profile {
            api: Api::Gles,
            major,
            minor,
            core: false,
            forward_compatible: false,
        }
    }

    /// A desktop OpenGL compatibility profile of the given version.
    pub fn gl(major: u32, minor: u32) -> Self {
        Profile {
            api: Api::Gl,
            major,
            minor,
            core: false,
            forward_compatible: false,
        }
    }

    /// A desktop OpenGL core profile of the given version.
    pub fn gl_core(major: u32, minor: u32) -> Self {
        Profile {
            core: true,
            ..Profile::gl(major, minor)
        }
    }

    /// Returns `true` if the requested version is at least `major.minor`.
    pub fn version_greater_or_equal(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) >= (major, minor)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.api {
            Api::Gl => {
                write!(f, "OpenGL {}.{}", self.major, self.minor)?;
                if self.core {
                    write!(f, " core")?;
                }
                if self.forward_compatible {
                    write!(f, " forward-compatible")?;
                }
                Ok(())
            }
            Api::Gles => write!(f, "OpenGL ES {}.{}", self.major, self.minor),
        }
    }
}
