// src/platform/backends/mock.rs

//! Recording fake of the EGL/Screen platform for tests.
//!
//! `MockDriver` keeps a small model of the native state (live windows,
//! surfaces and contexts, the current binding, the bound API) and appends
//! every mutating call to a log that tests assert against. Knobs on
//! `MockState` reproduce driver quirks: stale surface geometry after resize,
//! refusal to allocate a second surface for a window, rejection of debug
//! contexts.

use anyhow::{bail, Result};
use std::cell::{RefCell, RefMut};
use std::collections::{HashMap, VecDeque};
use std::ffi::c_void;
use std::path::{Path, PathBuf};

use crate::platform::backends::egl_screen::egl::{
    EGL_CONTEXT_FLAGS_KHR, EGL_CONTEXT_OPENGL_DEBUG_BIT_KHR, EGL_NONE, EGL_RENDERABLE_TYPE,
};
use crate::platform::driver::{
    ConfigHandle, ContextHandle, DisplayHandle, NativeDriver, RenderableType, ScreenContextHandle,
    SurfaceHandle, SurfaceRole, WindowHandle, WindowProperty,
};
use crate::profile::Api;

pub const DEFAULT_EXTENSIONS: &str = "EGL_KHR_create_context EGL_KHR_swap_buffers_with_damage EGL_KHR_image_base";

/// One recorded native call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetDisplay,
    Initialize,
    Terminate,
    BindApi(Api),
    ChooseConfigs(Vec<i32>),
    CreateWindowSurface { window: WindowHandle, surface: Option<SurfaceHandle> },
    DestroySurface(SurfaceHandle),
    SwapBuffers { surface: SurfaceHandle, api: Option<Api> },
    SwapBuffersWithDamage { surface: SurfaceHandle, api: Option<Api>, rects: Vec<i32> },
    CreateContext { attribs: Vec<i32>, share: Option<ContextHandle>, api: Option<Api> },
    DestroyContext(ContextHandle),
    MakeCurrent { draw: Option<SurfaceHandle>, read: Option<SurfaceHandle>, context: Option<ContextHandle> },
    WaitClient,
    WaitNative,
    CreateScreenContext,
    DestroyScreenContext(ScreenContextHandle),
    CreateWindow(WindowHandle),
    DestroyWindow(WindowHandle),
    SetWindowProperty { window: WindowHandle, property: WindowProperty, values: Vec<i32> },
    CreateWindowBuffers { window: WindowHandle, count: u32 },
    DiscardWindowRegions { window: WindowHandle, rects: Vec<i32> },
    LoadLibrary(PathBuf),
}

/// Model of the native state plus behaviour knobs.
#[derive(Debug)]
pub struct MockState {
    pub calls: Vec<Call>,
    pub has_display: bool,
    pub initialize_succeeds: bool,
    pub extensions: String,
    pub configs: Vec<(ConfigHandle, RenderableType)>,
    pub screen_context_fails: bool,
    pub window_creation_fails: bool,
    pub library_load_fails: bool,
    pub bind_api_fails: bool,
    /// Number of upcoming surface creations that fail unconditionally.
    pub fail_next_surface_creations: usize,
    /// Refuse a new surface while the window still has a live one.
    pub refuse_second_surface: bool,
    /// Sizes reported by the next surfaces created, instead of the window size.
    pub stale_surface_sizes: VecDeque<(i32, i32)>,
    pub reject_debug_contexts: bool,
    pub context_creation_fails: bool,
    pub make_current_fails: bool,
    pub bound_api: Option<Api>,
    pub current: (Option<SurfaceHandle>, Option<SurfaceHandle>, Option<ContextHandle>),
    pub windows: HashMap<WindowHandle, HashMap<WindowProperty, Vec<i32>>>,
    pub surfaces: HashMap<SurfaceHandle, (WindowHandle, (i32, i32))>,
    pub contexts: Vec<ContextHandle>,
    pub screen_contexts: Vec<ScreenContextHandle>,
    pub loaded_libraries: Vec<PathBuf>,
    next_handle: usize,
}

impl MockState {
    fn handle(&mut self) -> *mut c_void {
        self.next_handle += 0x10;
        self.next_handle as *mut c_void
    }

    fn surface_for(&self, window: WindowHandle) -> Option<SurfaceHandle> {
        self.surfaces
            .iter()
            .find_map(|(surface, (owner, _))| (*owner == window).then_some(*surface))
    }
}

pub struct MockDriver {
    state: RefCell<MockState>,
}

impl MockDriver {
    /// A healthy driver advertising `DEFAULT_EXTENSIONS` and a single
    /// configuration usable by every API.
    pub fn new() -> Self {
        let mut state = MockState {
            calls: Vec::new(),
            has_display: true,
            initialize_succeeds: true,
            extensions: DEFAULT_EXTENSIONS.to_string(),
            configs: Vec::new(),
            screen_context_fails: false,
            window_creation_fails: false,
            library_load_fails: false,
            bind_api_fails: false,
            fail_next_surface_creations: 0,
            refuse_second_surface: false,
            stale_surface_sizes: VecDeque::new(),
            reject_debug_contexts: false,
            context_creation_fails: false,
            make_current_fails: false,
            bound_api: None,
            current: (None, None, None),
            windows: HashMap::new(),
            surfaces: HashMap::new(),
            contexts: Vec::new(),
            screen_contexts: Vec::new(),
            loaded_libraries: Vec::new(),
            next_handle: 0x1000,
        };
        let all = RenderableType::OPENGL_ES
            | RenderableType::OPENGL_ES2
            | RenderableType::OPENGL_ES3
            | RenderableType::OPENGL;
        let config = ConfigHandle::from_raw(state.handle()).expect("non-null handle");
        state.configs.push((config, all));
        Self {
            state: RefCell::new(state),
        }
    }

    pub fn with_extensions(self, extensions: &str) -> Self {
        self.state().extensions = extensions.to_string();
        self
    }

    /// Replaces the advertised configurations. Returns their handles in order.
    pub fn set_configs(&self, renderable: &[RenderableType]) -> Vec<ConfigHandle> {
        let mut state = self.state();
        state.configs.clear();
        let mut handles = Vec::new();
        for bits in renderable {
            let config = ConfigHandle::from_raw(state.handle()).expect("non-null handle");
            state.configs.push((config, *bits));
            handles.push(config);
        }
        handles
    }

    pub fn state(&self) -> RefMut<'_, MockState> {
        self.state.borrow_mut()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn live_surfaces(&self) -> usize {
        self.state.borrow().surfaces.len()
    }

    pub fn live_windows(&self) -> usize {
        self.state.borrow().windows.len()
    }

    pub fn live_contexts(&self) -> usize {
        self.state.borrow().contexts.len()
    }

    pub fn current(&self) -> (Option<SurfaceHandle>, Option<SurfaceHandle>, Option<ContextHandle>) {
        self.state.borrow().current
    }

    pub fn window_property(&self, window: WindowHandle, property: WindowProperty) -> Option<Vec<i32>> {
        self.state
            .borrow()
            .windows
            .get(&window)
            .and_then(|props| props.get(&property).cloned())
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn attrib_value(attribs: &[i32], name: i32) -> Option<i32> {
    attribs
        .chunks(2)
        .take_while(|pair| pair[0] != EGL_NONE)
        .find_map(|pair| (pair[0] == name).then(|| pair.get(1).copied()).flatten())
}

impl NativeDriver for MockDriver {
    fn get_display(&self) -> Option<DisplayHandle> {
        self.record(Call::GetDisplay);
        let mut state = self.state();
        if !state.has_display {
            return None;
        }
        DisplayHandle::from_raw(state.handle())
    }

    fn initialize(&self, _display: DisplayHandle) -> Option<(i32, i32)> {
        self.record(Call::Initialize);
        self.state.borrow().initialize_succeeds.then_some((1, 5))
    }

    fn query_extensions(&self, _display: DisplayHandle) -> String {
        self.state.borrow().extensions.clone()
    }

    fn terminate(&self, _display: DisplayHandle) -> bool {
        self.record(Call::Terminate);
        true
    }

    fn bind_api(&self, api: Api) -> bool {
        self.record(Call::BindApi(api));
        let mut state = self.state();
        if state.bind_api_fails {
            return false;
        }
        state.bound_api = Some(api);
        true
    }

    fn choose_configs(&self, _display: DisplayHandle, attribs: &[i32]) -> Vec<ConfigHandle> {
        self.record(Call::ChooseConfigs(attribs.to_vec()));
        let required = attrib_value(attribs, EGL_RENDERABLE_TYPE)
            .map(RenderableType::from_bits_retain)
            .unwrap_or_default();
        self.state
            .borrow()
            .configs
            .iter()
            .filter(|(_, bits)| bits.contains(required))
            .map(|(config, _)| *config)
            .collect()
    }

    fn config_renderable_type(&self, _display: DisplayHandle, config: ConfigHandle) -> RenderableType {
        self.state
            .borrow()
            .configs
            .iter()
            .find_map(|(c, bits)| (*c == config).then_some(*bits))
            .unwrap_or_default()
    }

    fn create_window_surface(
        &self,
        _display: DisplayHandle,
        _config: ConfigHandle,
        window: WindowHandle,
    ) -> Option<SurfaceHandle> {
        let surface = {
            let mut state = self.state();
            let refused = state.refuse_second_surface && state.surface_for(window).is_some();
            if state.fail_next_surface_creations > 0 {
                state.fail_next_surface_creations -= 1;
                None
            } else if refused || !state.windows.contains_key(&window) {
                None
            } else {
                let size = state
                    .stale_surface_sizes
                    .pop_front()
                    .or_else(|| {
                        state.windows[&window]
                            .get(&WindowProperty::Size)
                            .map(|v| (v[0], v[1]))
                    })
                    .unwrap_or((0, 0));
                let surface = SurfaceHandle::from_raw(state.handle()).expect("non-null handle");
                state.surfaces.insert(surface, (window, size));
                Some(surface)
            }
        };
        self.record(Call::CreateWindowSurface { window, surface });
        surface
    }

    fn destroy_surface(&self, _display: DisplayHandle, surface: SurfaceHandle) -> bool {
        self.record(Call::DestroySurface(surface));
        self.state().surfaces.remove(&surface).is_some()
    }

    fn query_surface_size(&self, _display: DisplayHandle, surface: SurfaceHandle) -> (i32, i32) {
        self.state
            .borrow()
            .surfaces
            .get(&surface)
            .map(|(_, size)| *size)
            .unwrap_or((0, 0))
    }

    fn swap_buffers(&self, _display: DisplayHandle, surface: SurfaceHandle) -> bool {
        let api = self.state.borrow().bound_api;
        self.record(Call::SwapBuffers { surface, api });
        self.state.borrow().surfaces.contains_key(&surface)
    }

    fn swap_buffers_with_damage(&self, _display: DisplayHandle, surface: SurfaceHandle, rects: &[i32]) -> bool {
        let api = self.state.borrow().bound_api;
        self.record(Call::SwapBuffersWithDamage {
            surface,
            api,
            rects: rects.to_vec(),
        });
        self.state.borrow().surfaces.contains_key(&surface)
    }

    fn create_context(
        &self,
        _display: DisplayHandle,
        _config: ConfigHandle,
        share: Option<ContextHandle>,
        attribs: &[i32],
    ) -> Option<ContextHandle> {
        let api = self.state.borrow().bound_api;
        self.record(Call::CreateContext {
            attribs: attribs.to_vec(),
            share,
            api,
        });
        let mut state = self.state();
        let debug = attrib_value(attribs, EGL_CONTEXT_FLAGS_KHR)
            .is_some_and(|flags| flags & EGL_CONTEXT_OPENGL_DEBUG_BIT_KHR != 0);
        if state.context_creation_fails || (debug && state.reject_debug_contexts) {
            return None;
        }
        let context = ContextHandle::from_raw(state.handle())?;
        state.contexts.push(context);
        Some(context)
    }

    fn destroy_context(&self, _display: DisplayHandle, context: ContextHandle) -> bool {
        self.record(Call::DestroyContext(context));
        let mut state = self.state();
        let before = state.contexts.len();
        state.contexts.retain(|c| *c != context);
        before != state.contexts.len()
    }

    fn make_current(
        &self,
        _display: DisplayHandle,
        draw: Option<SurfaceHandle>,
        read: Option<SurfaceHandle>,
        context: Option<ContextHandle>,
    ) -> bool {
        self.record(Call::MakeCurrent { draw, read, context });
        let mut state = self.state();
        if state.make_current_fails {
            return false;
        }
        state.current = (draw, read, context);
        true
    }

    fn current_context(&self) -> Option<ContextHandle> {
        self.state.borrow().current.2
    }

    fn current_surface(&self, role: SurfaceRole) -> Option<SurfaceHandle> {
        let current = self.state.borrow().current;
        match role {
            SurfaceRole::Draw => current.0,
            SurfaceRole::Read => current.1,
        }
    }

    fn wait_client(&self) {
        self.record(Call::WaitClient);
    }

    fn wait_native(&self) {
        self.record(Call::WaitNative);
    }

    fn create_screen_context(&self) -> Option<ScreenContextHandle> {
        self.record(Call::CreateScreenContext);
        let mut state = self.state();
        if state.screen_context_fails {
            return None;
        }
        let context = ScreenContextHandle::from_raw(state.handle())?;
        state.screen_contexts.push(context);
        Some(context)
    }

    fn destroy_screen_context(&self, context: ScreenContextHandle) {
        self.record(Call::DestroyScreenContext(context));
        self.state().screen_contexts.retain(|c| *c != context);
    }

    fn create_window(&self, _context: ScreenContextHandle) -> Option<WindowHandle> {
        let window = {
            let mut state = self.state();
            if state.window_creation_fails {
                return None;
            }
            let window = WindowHandle::from_raw(state.handle())?;
            state.windows.insert(window, HashMap::new());
            window
        };
        self.record(Call::CreateWindow(window));
        Some(window)
    }

    fn destroy_window(&self, window: WindowHandle) {
        self.record(Call::DestroyWindow(window));
        self.state().windows.remove(&window);
    }

    fn set_window_property(&self, window: WindowHandle, property: WindowProperty, values: &[i32]) -> bool {
        self.record(Call::SetWindowProperty {
            window,
            property,
            values: values.to_vec(),
        });
        match self.state().windows.get_mut(&window) {
            Some(props) => {
                props.insert(property, values.to_vec());
                true
            }
            None => false,
        }
    }

    fn create_window_buffers(&self, window: WindowHandle, count: u32) -> bool {
        self.record(Call::CreateWindowBuffers { window, count });
        self.state.borrow().windows.contains_key(&window)
    }

    fn discard_window_regions(&self, window: WindowHandle, rects: &[i32]) -> bool {
        self.record(Call::DiscardWindowRegions {
            window,
            rects: rects.to_vec(),
        });
        true
    }

    fn load_library(&self, path: &Path) -> Result<()> {
        self.record(Call::LoadLibrary(path.to_path_buf()));
        let mut state = self.state();
        if state.library_load_fails {
            bail!("unable to open {}", path.display());
        }
        state.loaded_libraries.push(path.to_path_buf());
        Ok(())
    }
}
