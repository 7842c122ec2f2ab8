// src/config.rs

//! Configuration for the EGL/Screen window-system backend.
//!
//! Settings are grouped into sections that can be deserialized from a JSON
//! file. Every section has sensible defaults so an empty file (or no file at
//! all) yields a working configuration for a stock QNX-style target.
//!
//! Two environment variables override the library paths after loading:
//!
//! * `SDL_VIDEO_EGL_DRIVER` replaces the EGL library path.
//! * `SDL_VIDEO_GL_DRIVER` replaces every client GL / GL ES library path.

use anyhow::{Context, Result};
use log::{debug, info};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::profile::{Api, Profile};

/// Environment variable overriding the EGL library path.
pub const EGL_DRIVER_ENV: &str = "SDL_VIDEO_EGL_DRIVER";
/// Environment variable overriding the client GL / GL ES library path.
pub const GL_DRIVER_ENV: &str = "SDL_VIDEO_GL_DRIVER";

/// Process-wide default configuration, with environment overrides applied.
pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

// --- Top-Level Configuration Structure ---

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Shared libraries loaded at run time.
    pub libraries: LibraryConfig,
    /// Native window parameters applied to every drawable.
    pub window: WindowConfig,
    /// Settings for the `glws-demo` binary.
    pub demo: DemoConfig,
}

impl Config {
    /// Builds the default configuration and applies environment overrides.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Parses a JSON configuration string. Environment overrides are not applied.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse configuration JSON")
    }

    /// Loads a JSON configuration file and applies environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        let mut config = Self::from_json_str(&text)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Replaces library paths with the values of `SDL_VIDEO_EGL_DRIVER` and
    /// `SDL_VIDEO_GL_DRIVER` when those are set.
    pub fn apply_env_overrides(&mut self) {
        self.libraries.apply_overrides(
            std::env::var_os(EGL_DRIVER_ENV).map(PathBuf::from),
            std::env::var_os(GL_DRIVER_ENV).map(PathBuf::from),
        );
    }
}

// --- Library Configuration ---

/// Paths of the shared libraries the backend opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// EGL implementation.
    pub egl: PathBuf,
    /// Screen windowing library.
    pub screen: PathBuf,
    /// Desktop OpenGL client library.
    pub gl: PathBuf,
    /// OpenGL ES 1.x client library.
    pub gles1: PathBuf,
    /// OpenGL ES 2.0+ client library.
    pub gles2: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        LibraryConfig {
            egl: PathBuf::from("libEGL.so.1"),
            screen: PathBuf::from("libscreen.so.1"),
            gl: PathBuf::from("libGL.so.1"),
            gles1: PathBuf::from("libGLESv1_CM.so.1"),
            gles2: PathBuf::from("libGLESv2.so.2"),
        }
    }
}

impl LibraryConfig {
    fn apply_overrides(&mut self, egl: Option<PathBuf>, gl: Option<PathBuf>) {
        if let Some(egl) = egl {
            debug!("{} overrides EGL library: {}", EGL_DRIVER_ENV, egl.display());
            self.egl = egl;
        }
        if let Some(gl) = gl {
            debug!("{} overrides client libraries: {}", GL_DRIVER_ENV, gl.display());
            self.gl = gl.clone();
            self.gles1 = gl.clone();
            self.gles2 = gl;
        }
    }

    /// Returns the client library that must be loaded before creating a
    /// context for `profile`.
    pub fn client_library(&self, profile: &Profile) -> &Path {
        match profile.api {
            Api::Gl => &self.gl,
            Api::Gles if profile.major >= 2 => &self.gles2,
            Api::Gles => &self.gles1,
        }
    }
}

// --- Window Configuration ---

/// Native window parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Number of window buffers to allocate.
    pub buffer_count: u32,
    /// Swap interval set on the window.
    pub swap_interval: i32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            buffer_count: 2,
            swap_interval: 1,
        }
    }
}

// --- Demo Configuration ---

/// Settings for the demo binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub profile: Profile,
    pub width: i32,
    pub height: i32,
    /// Number of frames to present before exiting.
    pub frames: u32,
    pub debug_context: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            profile: Profile::gles(2, 0),
            width: 800,
            height: 600,
            frames: 60,
            debug_context: false,
        }
    }
}
