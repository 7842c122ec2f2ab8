// src/display/session.rs

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, trace, warn};
use std::cell::Cell;
use std::rc::Rc;

use super::extensions::Extensions;
use crate::config::Config;
use crate::platform::driver::{DisplayHandle, NativeDriver};
use crate::profile::Api;

/// The process-wide connection to the platform's display.
///
/// Created by [`DisplaySession::initialize`] and shared (`Rc`) with every
/// visual, drawable and context built on top of it. The driver version and
/// extension flags are recorded once during initialization and never change.
///
/// After [`shutdown`](DisplaySession::shutdown) every entity that still holds
/// the session is invalid: lifecycle operations fail with a fatal error and
/// destructors skip their native calls.
pub struct DisplaySession {
    driver: Rc<dyn NativeDriver>,
    display: DisplayHandle,
    version: (i32, i32),
    extension_string: String,
    extensions: Extensions,
    config: Config,
    open: Cell<bool>,
}

impl std::fmt::Debug for DisplaySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplaySession")
            .field("display", &self.display)
            .field("version", &self.version)
            .field("extensions", &self.extensions)
            .field("open", &self.open.get())
            .finish()
    }
}

impl DisplaySession {
    /// Opens the default display and negotiates with the driver.
    ///
    /// # Arguments
    ///
    /// * `driver`: The native driver; its libraries must already be loaded.
    /// * `config`: Library paths and window parameters used by later calls.
    ///
    /// # Returns
    ///
    /// * `Ok(Rc<DisplaySession>)` once the display is initialized.
    /// * `Err(anyhow::Error)` if there is no display or it cannot be
    ///   initialized. Both are unrecoverable for the caller.
    pub fn initialize(driver: Rc<dyn NativeDriver>, config: Config) -> Result<Rc<Self>> {
        info!("Opening EGL display connection.");

        let display = driver
            .get_display()
            .ok_or_else(|| anyhow!("unable to get EGL display"))?;
        debug!("EGL display: {:?}", display);

        let version = driver
            .initialize(display)
            .ok_or_else(|| anyhow!("unable to initialize EGL display"))?;

        let extension_string = driver.query_extensions(display);
        let extensions = Extensions::parse(&extension_string);
        debug!("EGL extensions: {}", extension_string);

        info!(
            "EGL {}.{} initialized (create_context: {}, swap_with_damage: {})",
            version.0,
            version.1,
            extensions.contains(Extensions::CREATE_CONTEXT),
            extensions.contains(Extensions::SWAP_BUFFERS_WITH_DAMAGE)
        );

        Ok(Rc::new(Self {
            driver,
            display,
            version,
            extension_string,
            extensions,
            config,
            open: Cell::new(true),
        }))
    }

    /// Terminates the display connection. Idempotent.
    pub fn shutdown(&self) {
        if !self.open.replace(false) {
            debug!("EGL display already terminated. Shutdown skipped.");
            return;
        }
        info!("Terminating EGL display connection {:?}", self.display);
        if !self.driver.terminate(self.display) {
            warn!("eglTerminate reported failure for {:?}", self.display);
        }
    }

    /// Drains pending platform events. Never requests an exit.
    pub fn process_pending_events(&self) -> bool {
        trace!("process_pending_events: no event source on this platform");
        true
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    /// Fails if the session was shut down.
    pub fn ensure_open(&self) -> Result<()> {
        if !self.is_open() {
            bail!("EGL display used after shutdown");
        }
        Ok(())
    }

    #[inline]
    pub fn has_extension(&self, extension: Extensions) -> bool {
        self.extensions.contains(extension)
    }

    #[inline]
    pub fn extensions(&self) -> Extensions {
        self.extensions
    }

    /// The raw extension string as reported by the driver.
    #[inline]
    pub fn extension_string(&self) -> &str {
        &self.extension_string
    }

    #[inline]
    pub fn version(&self) -> (i32, i32) {
        self.version
    }

    #[inline]
    pub fn display(&self) -> DisplayHandle {
        self.display
    }

    #[inline]
    pub fn driver(&self) -> &dyn NativeDriver {
        self.driver.as_ref()
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Selects the client API for the calling thread.
    ///
    /// Must precede context creation, `make_current` and buffer swaps, which
    /// are all validated against the bound API. A refusal means the driver
    /// cannot serve the API at all.
    pub fn bind_api(&self, api: Api) -> Result<()> {
        if self.driver.bind_api(api) {
            trace!("bound API {:?}", api);
            Ok(())
        } else {
            Err(anyhow!("eglBindAPI({:?}) failed", api))
        }
    }

    /// Loads a client library into the global symbol namespace.
    pub fn load_client_library(&self, path: &std::path::Path) -> Result<()> {
        self.driver
            .load_library(path)
            .with_context(|| format!("unable to open {}", path.display()))
    }
}
